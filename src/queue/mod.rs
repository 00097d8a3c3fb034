//! Queue list state: the active filter, paging tokens, counts, the item
//! being viewed and the bulk selection.
//!
//! [`reduce_queue_state`] is a pure reducer. Network effects live in
//! [`runner`], which dispatches the actions defined here.

pub mod bulk;
pub mod runner;
pub mod selection;

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::filter::Filter;
use crate::remote::Submission;
use crate::types::DEFAULT_LIMIT;

pub use bulk::{BulkAction, BulkFailure, BulkResults, FollowUp, follow_up};
pub use runner::{Notification, NotificationLevel, QueueRunner, QueueStore};
pub use selection::{AssignAvailability, WorkAvailability, assign_availability, work_availability};

/// Number of items matching a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountValue {
    Exact(u64),
    /// The backend stopped counting at this many
    AtLeast(u64),
}

impl CountValue {
    /// Interpret a count response; a continuation token means it was capped
    pub fn from_response(count: u64, count_page_token: Option<&str>) -> Self {
        match count_page_token {
            Some(token) if !token.is_empty() => CountValue::AtLeast(count),
            _ => CountValue::Exact(count),
        }
    }
}

impl fmt::Display for CountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountValue::Exact(n) => write!(f, "{n}"),
            CountValue::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

impl Serialize for CountValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueState {
    /// Filter driving the list, `None` until the first request
    pub current_filter: Option<Filter>,
    /// Last filter applied from the filter menu
    pub adhoc_filter: Option<Filter>,
    pub personal_filters: Vec<Filter>,
    /// Current page, `None` until loaded
    pub data: Option<Vec<Submission>>,
    pub limit: u32,
    pub page_token: Option<String>,
    pub next_page_token: Option<String>,
    /// Tokens of the pages behind the current one; `None` is the first page
    pub previous_page_tokens: Vec<Option<String>>,
    pub loading: bool,
    pub paging: bool,
    pub error: Option<String>,
    pub counts: HashMap<Filter, CountValue>,
    pub current_item: Option<Submission>,
    pub current_item_loading: bool,
    /// `None` outside selection mode
    pub selected_list: Option<Vec<String>>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            current_filter: None,
            adhoc_filter: None,
            personal_filters: Vec::new(),
            data: None,
            limit: DEFAULT_LIMIT,
            page_token: None,
            next_page_token: None,
            previous_page_tokens: Vec::new(),
            loading: false,
            paging: false,
            error: None,
            counts: HashMap::new(),
            current_item: None,
            current_item_loading: false,
            selected_list: None,
        }
    }
}

impl QueueState {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn has_previous_page(&self) -> bool {
        !self.previous_page_tokens.is_empty()
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page_token.is_some()
    }

    pub fn count_for(&self, filter: &Filter) -> Option<CountValue> {
        self.counts.get(filter).copied()
    }

    pub fn is_selection_mode(&self) -> bool {
        self.selected_list.is_some()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_list
            .as_ref()
            .is_some_and(|ids| ids.iter().any(|s| s == id))
    }

    /// Selected items present on the current page, in selection order
    pub fn selected_items(&self) -> Vec<&Submission> {
        let (Some(ids), Some(data)) = (&self.selected_list, &self.data) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| data.iter().find(|s| &s.id == id))
            .collect()
    }

    fn reset_list(&mut self, filter: Option<Filter>) {
        self.current_filter = filter;
        self.data = None;
        self.page_token = None;
        self.next_page_token = None;
        self.previous_page_tokens.clear();
        self.error = None;
        self.paging = false;
        self.loading = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueAction {
    /// Load the list for a filter; `None` or an equal filter refreshes in place
    FetchListRequest(Option<Filter>),
    FetchListSuccess {
        submissions: Vec<Submission>,
        next_page_token: Option<String>,
    },
    FetchListFailure(String),
    FetchListPrevious,
    FetchListNext,
    /// Like a changed request, even when the filter is unchanged
    FetchListReset(Option<Filter>),
    SetListLimit(u32),
    SetListCount {
        filter: Filter,
        count: CountValue,
    },
    FetchCurrentItem(String),
    SetCurrentItem(Option<Submission>),
    CurrentItemFailure(String),
    ToggleSelectionMode,
    ToggleSelectedItem {
        id: String,
        extend_range: bool,
    },
    SetSelectedList(Option<Vec<String>>),
    SetAdhocFilter(Filter),
    SetPersonalFilters(Vec<Filter>),
}

impl QueueAction {
    /// Actions after which the list has to be fetched again
    pub fn is_list_fetch(&self) -> bool {
        matches!(
            self,
            QueueAction::FetchListRequest(_)
                | QueueAction::FetchListPrevious
                | QueueAction::FetchListNext
                | QueueAction::FetchListReset(_)
                | QueueAction::SetListLimit(_)
        )
    }
}

pub fn reduce_queue_state(mut state: QueueState, action: QueueAction) -> QueueState {
    match action {
        QueueAction::FetchListRequest(filter) => match filter {
            Some(filter) if state.current_filter.as_ref() != Some(&filter) => {
                state.reset_list(Some(filter));
            }
            _ => {}
        },
        QueueAction::FetchListSuccess {
            submissions,
            next_page_token,
        } => {
            state.data = Some(submissions);
            state.next_page_token = next_page_token;
            state.loading = false;
            state.paging = false;
            state.error = None;
        }
        QueueAction::FetchListFailure(error) => {
            state.error = Some(error);
            state.loading = false;
            state.paging = false;
        }
        QueueAction::FetchListPrevious => {
            if let Some(token) = state.previous_page_tokens.pop() {
                state.page_token = token;
                state.next_page_token = None;
                state.paging = true;
            }
        }
        QueueAction::FetchListNext => {
            if let Some(next) = state.next_page_token.take() {
                let current = state.page_token.replace(next);
                state.previous_page_tokens.push(current);
                state.paging = true;
            }
        }
        QueueAction::FetchListReset(filter) => {
            let filter = filter.or_else(|| state.current_filter.take());
            state.reset_list(filter);
        }
        QueueAction::SetListLimit(limit) => {
            state.limit = limit;
            let filter = state.current_filter.take();
            state.reset_list(filter);
        }
        QueueAction::SetListCount { filter, count } => {
            state.counts.insert(filter, count);
        }
        QueueAction::FetchCurrentItem(id) => {
            if state.current_item.as_ref().is_some_and(|item| item.id != id) {
                state.current_item = None;
            }
            state.current_item_loading = true;
        }
        QueueAction::SetCurrentItem(item) => {
            state.current_item = item;
            state.current_item_loading = false;
        }
        QueueAction::CurrentItemFailure(_) => {
            state.current_item_loading = false;
        }
        QueueAction::ToggleSelectionMode => {
            state.selected_list = selection::toggle_selection_mode(state.selected_list.take());
        }
        QueueAction::ToggleSelectedItem { id, extend_range } => {
            let page = state.data.as_deref().unwrap_or_default();
            state.selected_list =
                selection::toggle_selected_item(state.selected_list.take(), page, &id, extend_range);
        }
        QueueAction::SetSelectedList(list) => {
            state.selected_list = list;
        }
        QueueAction::SetAdhocFilter(filter) => {
            state.adhoc_filter = Some(filter);
        }
        QueueAction::SetPersonalFilters(filters) => {
            state.personal_filters = filters;
        }
    }
    state
}
