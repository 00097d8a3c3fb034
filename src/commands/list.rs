use std::collections::HashSet;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, connect, report_notifications, resolve_filter};
use crate::cli::{Criteria, OutputOptions};
use crate::config::Config;
use crate::display::{format_filter_with_count, submission_table};
use crate::error::{QueueError, Result};
use crate::filter::Filter;
use crate::queue::{QueueAction, QueueRunner};
use crate::remote::{Submission, SubmissionApi};
use crate::types::FilterType;

/// Options for `kq list`
pub struct ListOptions {
    pub filter: Option<String>,
    pub criteria: Criteria,
    pub limit: Option<u32>,
    pub pages: u32,
}

/// Fetch up to `max_pages` pages of `filter`, dropping items already seen
///
/// Returns the items and the number of pages fetched.
pub async fn fetch_pages<A: SubmissionApi + 'static>(
    runner: &QueueRunner<A>,
    filter: Filter,
    max_pages: u32,
) -> Result<(Vec<Submission>, u32)> {
    runner.dispatch(QueueAction::FetchListRequest(Some(filter)));
    runner.wait_idle().await;

    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut pages = 1;
    loop {
        let state = runner.state();
        if let Some(error) = &state.error {
            return Err(QueueError::Other(error.clone()));
        }
        let has_next_page = state.has_next_page();
        for item in state.data.unwrap_or_default() {
            if seen.insert(item.id.clone()) {
                items.push(item);
            }
        }
        if pages >= max_pages.max(1) || !has_next_page {
            return Ok((items, pages));
        }
        runner.dispatch(QueueAction::FetchListNext);
        runner.wait_idle().await;
        pages += 1;
    }
}

/// Run a filter and print one or more pages of the queue
pub async fn cmd_list(opts: ListOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let runner = connect(&config, opts.limit.unwrap_or(config.page_size)).await?;

    let personal = runner.state().personal_filters;
    let filter = resolve_filter(
        opts.filter.as_deref(),
        &opts.criteria,
        &runner.settings().my_teams,
        &personal,
    )?;
    if filter.filter_type == FilterType::Adhoc {
        runner.dispatch(QueueAction::SetAdhocFilter(filter.clone()));
    }

    let (items, pages) = fetch_pages(&runner, filter.clone(), opts.pages).await?;
    report_notifications(&runner, output);

    let state = runner.state();
    let count = state.count_for(&filter);

    let json_output = json!({
        "filter": filter,
        "count": count,
        "limit": state.limit,
        "pages": pages,
        "next_page_token": state.next_page_token,
        "items": items,
    });

    let mut text_output = String::new();
    if items.is_empty() {
        text_output.push_str("No submissions found.\n");
    } else {
        text_output.push_str(&submission_table(&items, &[]));
        text_output.push('\n');
    }
    text_output.push_str(&format!(
        "\n{} {}\n",
        format_filter_with_count(&filter, count).cyan(),
        format!("showing {} item(s)", items.len()).dimmed()
    ));
    if state.has_next_page() {
        text_output.push_str(&format!(
            "{}\n",
            "More items available, use --pages to fetch them".dimmed()
        ));
    }

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}
