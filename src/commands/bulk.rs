//! Bulk assign and work commands.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use owo_colors::OwoColorize;
use serde_json::{Value, json};

use super::{CommandOutput, connect, report_notifications};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::{QueueError, Result};
use crate::queue::{
    BulkAction, BulkResults, FollowUp, QueueRunner, assign_availability, work_availability,
};
use crate::remote::kinetic::KineticClient;
use crate::remote::{ITEM_INCLUDES, Submission, SubmissionApi};

/// Load the selected items with their forms, as availability needs them
async fn load_selection(
    runner: &QueueRunner<KineticClient>,
    ids: &[String],
) -> Result<Vec<Submission>> {
    let api = runner.api();
    try_join_all(ids.iter().map(|id| api.fetch_submission(id, ITEM_INCLUDES))).await
}

/// Assign submissions to a team, and optionally a team member
pub async fn cmd_assign(
    ids: Vec<String>,
    team: String,
    individual: Option<String>,
    keep: FollowUp,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let runner = connect(&config, config.page_size).await?;

    let items = load_selection(&runner, &ids).await?;
    let selected: Vec<&Submission> = items.iter().collect();
    let availability = assign_availability(&selected, &runner.settings().all_teams);

    if !availability.available {
        return Err(QueueError::Other(
            availability
                .warning
                .unwrap_or("Assignment is not available for the selected items")
                .to_string(),
        ));
    }
    if !availability.teams.contains(&team) {
        return Err(QueueError::Other(format!(
            "Team '{team}' cannot be assigned to every selected item. Choose one of: {}",
            availability.teams.join(", ")
        )));
    }
    if let Some(warning) = availability.warning
        && !output.json
    {
        eprintln!("{}", warning.yellow());
    }

    let action = BulkAction::Assign { team, individual };
    let results = runner.run_bulk(ids, &action, keep).await;
    finish_bulk(&runner, &action, &results, output)
}

/// Set field values on submissions assigned to the current user
pub async fn cmd_work(
    ids: Vec<String>,
    values: Vec<(String, String)>,
    keep: FollowUp,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let runner = connect(&config, config.page_size).await?;

    let items = load_selection(&runner, &ids).await?;
    let selected: Vec<&Submission> = items.iter().collect();
    let availability = work_availability(&selected, &runner.profile().username);

    if !availability.visible {
        return Err(QueueError::Other(
            "Bulk work is not enabled for the forms of the selected items".to_string(),
        ));
    }
    if let Some(reason) = availability.reason {
        return Err(QueueError::Other(reason.to_string()));
    }

    let values: BTreeMap<String, Value> = values
        .into_iter()
        .map(|(field, value)| (field, Value::String(value)))
        .collect();
    let action = BulkAction::Work { values };
    let results = runner.run_bulk(ids, &action, keep).await;
    finish_bulk(&runner, &action, &results, output)
}

fn finish_bulk(
    runner: &QueueRunner<KineticClient>,
    action: &BulkAction,
    results: &BulkResults,
    output: OutputOptions,
) -> Result<()> {
    report_notifications(runner, output);
    let follow_up = runner.state().selected_list.unwrap_or_default();

    let json_output = json!({
        "action": action.label(),
        "success": results.success_ids(),
        "error": results.error,
        "follow_up": follow_up,
    });

    let mut text_output = String::new();
    for failure in &results.error {
        text_output.push_str(&format!(
            "{} {}: {}\n",
            "failed".red(),
            failure.id,
            failure.message
        ));
    }
    if !follow_up.is_empty() {
        text_output.push_str(&format!(
            "{} {}\n",
            "Follow up:".cyan(),
            follow_up.join(" ")
        ));
    }

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)?;

    if results.error.is_empty() {
        Ok(())
    } else {
        Err(QueueError::Other(format!(
            "{} of {} item(s) could not be updated",
            results.error.len(),
            results.total()
        )))
    }
}
