//! Personal filter commands.
//!
//! - `filters ls`: Built-in, team and personal filters
//! - `filters save`: Save criteria as a personal filter
//! - `filters rm`: Delete a personal filter

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, connect, edit_filter};
use crate::cli::{Criteria, OutputOptions};
use crate::config::Config;
use crate::display::{format_filter_summary, format_filter_with_count};
use crate::error::{QueueError, Result};
use crate::filter::personal::{
    add_personal_filter, remove_personal_filter, update_personal_filter,
};
use crate::filter::{
    Filter, FilterMenuAction, FilterMenuState, MenuVariant, default_filters, reduce_filter_menu,
    team_filters,
};
use crate::types::FilterType;

/// List every filter the user can run
pub async fn cmd_filters_ls(counts: bool, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let runner = connect(&config, config.page_size).await?;

    let filters: Vec<Filter> = default_filters()
        .into_iter()
        .chain(team_filters(&runner.settings().my_teams))
        .chain(runner.state().personal_filters)
        .collect();

    if counts {
        for filter in &filters {
            runner.fetch_count(filter.clone());
        }
        runner.wait_idle().await;
    }
    let state = runner.state();

    let json_output = json!(
        filters
            .iter()
            .map(|f| json!({
                "name": f.name,
                "type": f.filter_type.to_string(),
                "count": state.count_for(f),
                "filter": f,
            }))
            .collect::<Vec<_>>()
    );

    let mut text_output = String::new();
    for (heading, filter_type) in [
        ("Default", FilterType::Default),
        ("Teams", FilterType::Team),
        ("Personal", FilterType::Custom),
    ] {
        let group: Vec<&Filter> = filters
            .iter()
            .filter(|f| f.filter_type == filter_type)
            .collect();
        text_output.push_str(&format!("{}\n", heading.cyan().bold()));
        if group.is_empty() {
            text_output.push_str(&format!("  {}\n", "(none)".dimmed()));
        }
        for filter in group {
            text_output.push_str(&format!(
                "  {}  {}\n",
                format_filter_with_count(filter, state.count_for(filter)),
                format_filter_summary(filter).dimmed()
            ));
        }
        text_output.push('\n');
    }

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Save criteria, optionally starting from another filter, as a personal filter
///
/// Starting from a personal filter with the same name updates it in place.
pub async fn cmd_filters_save(
    name: &str,
    from: Option<&str>,
    criteria: &Criteria,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let runner = connect(&config, config.page_size).await?;
    let personal = runner.state().personal_filters;

    let menu = edit_filter(from, criteria, &runner.settings().my_teams, &personal)?;
    let menu = reduce_filter_menu(menu, FilterMenuAction::SetFilterName(name.to_string()));
    let saved = menu.save(MenuVariant::Strict, &personal)?;

    let editing = menu
        .initial_filter
        .as_ref()
        .filter(|f| f.filter_type == FilterType::Custom);
    let (next, updated) = match editing {
        Some(original) => (
            update_personal_filter(&personal, &original.name, saved.clone())?,
            true,
        ),
        None => (add_personal_filter(&personal, saved.clone())?, false),
    };
    runner.save_personal_filters(next).await?;

    let action = if updated { "Updated" } else { "Saved" };
    let text_output = format!(
        "{} filter {}\n  {}",
        action,
        saved.name.cyan(),
        format_filter_summary(&saved).dimmed()
    );

    CommandOutput::new(json!({
        "action": action.to_lowercase(),
        "filter": saved,
    }))
    .with_text(text_output)
    .print(output)
}

/// Delete a personal filter
pub async fn cmd_filters_rm(name: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let runner = connect(&config, config.page_size).await?;
    let personal = runner.state().personal_filters;

    let existing = personal
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| QueueError::FilterNotFound(name.to_string()))?;
    let target = FilterMenuState::open(existing).delete_target()?;

    let next = remove_personal_filter(&personal, &target.name)?;
    runner.save_personal_filters(next).await?;

    CommandOutput::new(json!({
        "action": "deleted",
        "name": target.name,
    }))
    .with_text(format!("Deleted filter {}", target.name.cyan()))
    .print(output)
}
