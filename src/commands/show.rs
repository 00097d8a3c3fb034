use super::{CommandOutput, connect};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::display::format_submission_detail;
use crate::error::{QueueError, Result};
use crate::queue::{NotificationLevel, QueueAction};

/// Display a single submission
pub async fn cmd_show(id: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let runner = connect(&config, config.page_size).await?;

    runner.dispatch(QueueAction::FetchCurrentItem(id.to_string()));
    runner.wait_idle().await;

    let failure = runner
        .take_notifications()
        .into_iter()
        .find(|n| n.level == NotificationLevel::Error);
    if let Some(failure) = failure {
        return Err(QueueError::Other(failure.message));
    }
    let item = runner
        .state()
        .current_item
        .ok_or_else(|| QueueError::SubmissionNotFound(id.to_string()))?;

    CommandOutput::new(serde_json::to_value(&item)?)
        .with_text(format_submission_detail(&item))
        .print(output)
}
