//! Handlers behind the `kq` subcommands.
//!
//! Every command builds a JSON value and, for terminal use, a text rendering;
//! [`CommandOutput`] prints whichever the user asked for.

mod bulk;
mod config;
mod filters;
mod list;
mod query;
mod show;

pub use bulk::{cmd_assign, cmd_work};
pub use config::{cmd_config_set, cmd_config_show};
pub use filters::{cmd_filters_ls, cmd_filters_rm, cmd_filters_save};
pub use list::{ListOptions, cmd_list, fetch_pages};
pub use query::cmd_query;
pub use show::cmd_show;

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::Value;

use crate::cli::{Criteria, OutputOptions};
use crate::config::Config;
use crate::error::{QueueError, Result};
use crate::filter::{Filter, FilterMenuState, MenuVariant, find_filter};
use crate::queue::{Notification, NotificationLevel, QueueRunner, QueueState, QueueStore};
use crate::remote::SubmissionApi;
use crate::remote::kinetic::KineticClient;
use crate::settings::AppSettings;

/// Filter used when a command is given neither a name nor criteria
pub const DEFAULT_FILTER: &str = "Mine";

/// Output of a command in both of its renderings
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print JSON when requested (or when there is no text rendering)
    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => {
                let text = text.trim_end();
                if !text.is_empty() {
                    println!("{text}");
                }
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Sign in and build a runner for the current user
pub async fn connect(config: &Config, limit: u32) -> Result<QueueRunner<KineticClient>> {
    let client = KineticClient::from_config(config)?;
    let profile = client.fetch_profile().await?;
    tracing::debug!(
        "Signed in as {} ({} team(s))",
        profile.username,
        profile.teams.len()
    );

    let settings = AppSettings::new(config, &profile);
    let store = QueueStore::new(QueueState::with_limit(limit));
    Ok(QueueRunner::new(Arc::new(client), store, settings, profile))
}

/// Open the filter menu on a named filter (or a blank ad hoc one) and apply
/// the criteria as edits.
pub fn edit_filter(
    name: Option<&str>,
    criteria: &Criteria,
    my_teams: &[String],
    personal: &[Filter],
) -> Result<FilterMenuState> {
    let base = match name {
        Some(name) => find_filter(name, my_teams, personal)
            .ok_or_else(|| QueueError::FilterNotFound(name.to_string()))?,
        None => Filter::adhoc(),
    };
    criteria.check_sort(&base)?;
    let actions = criteria.menu_actions(&base);
    Ok(FilterMenuState::open(base).apply_all(actions))
}

/// The filter a listing command runs
///
/// A named filter without criteria runs as saved. Anything else goes through
/// the menu and must pass validation.
pub fn resolve_filter(
    name: Option<&str>,
    criteria: &Criteria,
    my_teams: &[String],
    personal: &[Filter],
) -> Result<Filter> {
    if criteria.is_empty() {
        let name = name.unwrap_or(DEFAULT_FILTER);
        return find_filter(name, my_teams, personal)
            .ok_or_else(|| QueueError::FilterNotFound(name.to_string()));
    }
    edit_filter(name, criteria, my_teams, personal)?.apply(MenuVariant::Strict)
}

/// Print queued notifications to stderr and return the first error message
pub fn report_notifications<A: SubmissionApi + 'static>(
    runner: &QueueRunner<A>,
    output: OutputOptions,
) -> Option<String> {
    let notifications = runner.take_notifications();
    let first_error = notifications
        .iter()
        .find(|n| n.level == NotificationLevel::Error)
        .map(|n| n.message.clone());

    if !output.json {
        for Notification { level, message } in notifications {
            match level {
                NotificationLevel::Info => eprintln!("{}", message.green()),
                NotificationLevel::Error => eprintln!("{}", message.red()),
            }
        }
    }

    first_error
}
