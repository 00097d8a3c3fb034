//! Async orchestration of queue fetches.
//!
//! [`QueueStore`] owns the process-wide [`QueueState`]; every change goes
//! through [`QueueStore::dispatch`], which applies the reducer under a lock.
//!
//! [`QueueRunner`] reacts to dispatched actions:
//! - list fetches (request, next, previous, reset, page size) keep a single
//!   live task; a new one aborts the previous one
//! - counts, current-item fetches and per-item bulk updates run side by side
//!
//! A generation counter guards against an aborted list task publishing a
//! result it had already received.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use jiff::Zoned;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::error::{QueueError, Result};
use crate::filter::Filter;
use crate::filter::personal::{
    load_personal_filters, personal_filters_from_profile, store_personal_filters,
};
use crate::query::build_search;
use crate::remote::{ITEM_INCLUDES, Profile, SearchRequest, SearchResponse, SubmissionApi};
use crate::settings::AppSettings;

use super::bulk::{BULK_INCLUDES, BulkAction, BulkResults, FollowUp, follow_up};
use super::{CountValue, QueueAction, QueueState, reduce_queue_state};

/// Page size used when only the count of a search is wanted
const COUNT_PAGE_LIMIT: u32 = 1;

/// Shared handle to the queue state
#[derive(Debug, Clone, Default)]
pub struct QueueStore {
    state: Arc<Mutex<QueueState>>,
}

impl QueueStore {
    pub fn new(state: QueueState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Apply one action atomically
    pub fn dispatch(&self, action: QueueAction) {
        let mut state = self.state.lock();
        let current = std::mem::take(&mut *state);
        *state = reduce_queue_state(current, action);
    }

    /// Apply an action only if `guard` still holds once the lock is taken
    fn dispatch_if(&self, guard: impl FnOnce() -> bool, action: QueueAction) -> bool {
        let mut state = self.state.lock();
        if !guard() {
            return false;
        }
        let current = std::mem::take(&mut *state);
        *state = reduce_queue_state(current, action);
        true
    }

    pub fn snapshot(&self) -> QueueState {
        self.state.lock().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&QueueState) -> R) -> R {
        f(&self.state.lock())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

type Notifications = Arc<Mutex<Vec<Notification>>>;

enum Effect {
    None,
    List,
    Item(String),
}

/// One run of the list fetch for the state at spawn time
struct ListTask<A> {
    api: Arc<A>,
    store: QueueStore,
    settings: Arc<AppSettings>,
    profile: Arc<Profile>,
    clock: fn() -> Zoned,
    generation: Arc<AtomicU64>,
    expected: u64,
}

impl<A: SubmissionApi> ListTask<A> {
    fn publish(&self, action: QueueAction) -> bool {
        self.store.dispatch_if(
            || self.generation.load(Ordering::SeqCst) == self.expected,
            action,
        )
    }

    async fn run(self) {
        loop {
            let (filter, page_token, limit, has_previous) = self.store.read(|s| {
                (
                    s.current_filter.clone(),
                    s.page_token.clone(),
                    s.limit,
                    s.has_previous_page(),
                )
            });
            let Some(filter) = filter else {
                return;
            };

            let query = build_search(&filter, &self.settings, &self.profile, &(self.clock)());
            if query.invalid_assignment {
                tracing::debug!(
                    "Filter '{}' does not narrow by assignment, skipping search",
                    filter.display_name()
                );
                self.publish(QueueAction::SetListCount {
                    filter,
                    count: CountValue::Exact(0),
                });
                self.publish(QueueAction::FetchListSuccess {
                    submissions: Vec::new(),
                    next_page_token: None,
                });
                return;
            }

            let request = SearchRequest {
                kapp: self.settings.kapp.clone(),
                search: query.search,
                limit,
                count: page_token.is_none(),
                page_token,
            };
            tracing::debug!("Searching queue: {}", request.search.q);

            let response = match self.api.search_submissions(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Failed to fetch queue list: {e}");
                    self.publish(QueueAction::FetchListFailure(e.to_string()));
                    return;
                }
            };

            if let Some(count) = response.count {
                self.publish(QueueAction::SetListCount {
                    filter,
                    count: CountValue::from_response(count, response.count_page_token.as_deref()),
                });
            }

            if response.submissions.is_empty() && has_previous {
                // Items left the filter since the page was loaded
                tracing::debug!("Page came back empty, stepping back a page");
                if !self.publish(QueueAction::FetchListPrevious) {
                    return;
                }
                continue;
            }

            self.publish(QueueAction::FetchListSuccess {
                submissions: response.submissions,
                next_page_token: response.next_page_token,
            });
            return;
        }
    }
}

/// Drives the backend on behalf of the queue state
pub struct QueueRunner<A: SubmissionApi + 'static> {
    api: Arc<A>,
    store: QueueStore,
    settings: Arc<AppSettings>,
    profile: Arc<Profile>,
    clock: fn() -> Zoned,
    list_generation: Arc<AtomicU64>,
    list_task: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    notifications: Notifications,
}

impl<A: SubmissionApi + 'static> QueueRunner<A> {
    pub fn new(api: Arc<A>, store: QueueStore, settings: AppSettings, profile: Profile) -> Self {
        store.dispatch(QueueAction::SetPersonalFilters(
            personal_filters_from_profile(&profile),
        ));
        Self {
            api,
            store,
            settings: Arc::new(settings),
            profile: Arc::new(profile),
            clock: Zoned::now,
            list_generation: Arc::new(AtomicU64::new(0)),
            list_task: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            notifications: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Use a fixed clock for date range queries
    pub fn with_clock(mut self, clock: fn() -> Zoned) -> Self {
        self.clock = clock;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn state(&self) -> QueueState {
        self.store.snapshot()
    }

    /// Apply an action and start whatever fetch it calls for
    pub fn dispatch(&self, action: QueueAction) {
        let effect = match &action {
            // Paging past either end leaves the state alone
            QueueAction::FetchListNext if !self.store.read(QueueState::has_next_page) => {
                Effect::None
            }
            QueueAction::FetchListPrevious if !self.store.read(QueueState::has_previous_page) => {
                Effect::None
            }
            a if a.is_list_fetch() => Effect::List,
            QueueAction::FetchCurrentItem(id) => Effect::Item(id.clone()),
            _ => Effect::None,
        };
        if matches!(effect, Effect::List) {
            self.list_generation.fetch_add(1, Ordering::SeqCst);
        }

        self.store.dispatch(action);

        match effect {
            Effect::List => self.spawn_list_fetch(),
            Effect::Item(id) => self.spawn_item_fetch(id),
            Effect::None => {}
        }
    }

    fn spawn_list_fetch(&self) {
        let task = ListTask {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
            settings: Arc::clone(&self.settings),
            profile: Arc::clone(&self.profile),
            clock: self.clock,
            generation: Arc::clone(&self.list_generation),
            expected: self.list_generation.load(Ordering::SeqCst),
        };
        let handle = tokio::spawn(task.run());
        if let Some(previous) = self.list_task.lock().replace(handle) {
            previous.abort();
        }
    }

    fn spawn_item_fetch(&self, id: String) {
        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let notifications = Arc::clone(&self.notifications);
        let handle = tokio::spawn(async move {
            match api.fetch_submission(&id, ITEM_INCLUDES).await {
                Ok(item) => store.dispatch(QueueAction::SetCurrentItem(Some(item))),
                Err(e) => {
                    tracing::error!("Failed to load submission {id}: {e}");
                    notifications
                        .lock()
                        .push(Notification::error(format!("Could not load {id}: {e}")));
                    store.dispatch(QueueAction::CurrentItemFailure(e.to_string()));
                }
            }
        });
        self.track(handle);
    }

    /// Refresh the result count of `filter` alongside any list fetch
    pub fn fetch_count(&self, filter: Filter) {
        let query = build_search(&filter, &self.settings, &self.profile, &(self.clock)());
        if query.invalid_assignment {
            self.store.dispatch(QueueAction::SetListCount {
                filter,
                count: CountValue::Exact(0),
            });
            return;
        }

        let request = SearchRequest {
            kapp: self.settings.kapp.clone(),
            search: query.search,
            limit: COUNT_PAGE_LIMIT,
            page_token: None,
            count: true,
        };
        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            match api.search_submissions(&request).await {
                Ok(SearchResponse {
                    count: Some(count),
                    count_page_token,
                    ..
                }) => store.dispatch(QueueAction::SetListCount {
                    filter,
                    count: CountValue::from_response(count, count_page_token.as_deref()),
                }),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Failed to count '{}': {e}", filter.display_name());
                }
            }
        });
        self.track(handle);
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }

    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }

    /// Drain pending notifications
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }

    /// Update every item, keep `keep` selected afterwards and refresh the list
    pub async fn run_bulk(
        &self,
        ids: Vec<String>,
        action: &BulkAction,
        keep: FollowUp,
    ) -> BulkResults {
        let values = Arc::new(action.values());
        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let api = Arc::clone(&self.api);
                let values = Arc::clone(&values);
                let task_id = id.clone();
                let handle = tokio::spawn(async move {
                    api.update_submission(&task_id, &values, BULK_INCLUDES)
                        .await
                });
                (id, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|e| {
                Err(if e.is_cancelled() {
                    QueueError::Cancelled
                } else {
                    QueueError::Other(e.to_string())
                })
            });
            outcomes.push((id, outcome));
        }
        let results = BulkResults::collect(outcomes);

        let summary = format!(
            "{} of {} item(s) updated ({})",
            results.success.len(),
            results.total(),
            action.label()
        );
        if results.error.is_empty() {
            self.notify(Notification::info(summary));
        } else {
            self.notify(Notification::error(summary));
        }

        self.dispatch(QueueAction::SetSelectedList(Some(follow_up(&results, keep))));
        if self.store.read(|s| s.current_filter.is_some()) {
            self.dispatch(QueueAction::FetchListRequest(None));
        }
        results
    }

    /// Reload personal filters from the profile
    pub async fn reload_personal_filters(&self) -> Result<Vec<Filter>> {
        let filters = load_personal_filters(self.api.as_ref()).await?;
        self.store
            .dispatch(QueueAction::SetPersonalFilters(filters.clone()));
        Ok(filters)
    }

    /// Persist the full personal filter list and adopt it
    pub async fn save_personal_filters(&self, filters: Vec<Filter>) -> Result<()> {
        store_personal_filters(self.api.as_ref(), &filters).await?;
        self.store.dispatch(QueueAction::SetPersonalFilters(filters));
        Ok(())
    }

    /// Wait for the live list task and every side task to finish
    pub async fn wait_idle(&self) {
        loop {
            let list = self.list_task.lock().take();
            let tasks = std::mem::take(&mut *self.tasks.lock());
            if list.is_none() && tasks.is_empty() {
                return;
            }
            for handle in list.into_iter().chain(tasks) {
                if let Err(e) = handle.await
                    && !e.is_cancelled()
                {
                    tracing::warn!("Queue task failed: {e}");
                }
            }
        }
    }
}

impl<A: SubmissionApi + 'static> Drop for QueueRunner<A> {
    fn drop(&mut self) {
        if let Some(handle) = self.list_task.lock().take() {
            handle.abort();
        }
        for handle in self.tasks.lock().drain(..) {
            handle.abort();
        }
    }
}
