//! Terminal rendering of queue data.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::filter::Filter;
use crate::queue::CountValue;
use crate::remote::Submission;
use crate::types::{Assignment, Status};

pub fn format_status_colored(status: Option<Status>) -> String {
    let Some(status) = status else {
        return "[-]".dimmed().to_string();
    };
    let badge = format!("[{status}]");
    match status {
        Status::Open => badge.yellow().to_string(),
        Status::Pending => badge.cyan().to_string(),
        Status::Complete => badge.green().to_string(),
        Status::Cancelled => badge.dimmed().to_string(),
    }
}

/// Filter name with its result count, e.g. `Mine (12+)`
pub fn format_filter_with_count(filter: &Filter, count: Option<CountValue>) -> String {
    match count {
        Some(count) => format!("{} ({})", filter.display_name(), count),
        None => filter.display_name().to_string(),
    }
}

/// One-line description of a filter's criteria
pub fn format_filter_summary(filter: &Filter) -> String {
    let mut parts = Vec::new();
    match filter.assignments {
        Assignment::Mine => parts.push("assigned to me".to_string()),
        Assignment::Unassigned => parts.push("unassigned".to_string()),
        Assignment::Any => {}
    }
    if filter.created_by_me {
        parts.push("created by me".to_string());
    }
    if !filter.teams.is_empty() {
        let teams: Vec<&str> = filter.teams.iter().map(String::as_str).collect();
        parts.push(format!("teams: {}", teams.join(", ")));
    }
    if !filter.status.is_empty() {
        let status: Vec<String> = filter.status.iter().map(|s| s.to_string()).collect();
        parts.push(format!("status: {}", status.join(", ")));
    }
    let range = &filter.date_range;
    if !range.preset.is_empty() {
        parts.push(format!("{} within {}", range.timeline, range.preset));
    } else if range.custom {
        let bound = |d: Option<jiff::civil::Date>| d.map(|d| d.to_string()).unwrap_or_default();
        parts.push(format!(
            "{} {}..{}",
            range.timeline,
            bound(range.start),
            bound(range.end)
        ));
    }
    parts.push(format!("sort: {} {}", filter.sort_by, filter.sort_direction));
    parts.join("; ")
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// A row in the queue list table
#[derive(Tabled)]
struct SubmissionRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Team")]
    team: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Created")]
    created: String,
}

/// Render a page of submissions; `selected` ids are marked with `*`
pub fn submission_table(items: &[Submission], selected: &[String]) -> String {
    let rows: Vec<SubmissionRow> = items
        .iter()
        .map(|item| SubmissionRow {
            marker: if selected.contains(&item.id) { "*" } else { "" },
            id: item.id.clone(),
            title: item.title().to_string(),
            status: or_dash(item.status().map(|s| s.to_string()).as_deref()),
            team: or_dash(item.assigned_team()),
            assignee: or_dash(item.assigned_individual()),
            due: or_dash(item.due_date()),
            created: item
                .created_at
                .map(|ts| ts.strftime("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Multi-line detail view of a single submission
pub fn format_submission_detail(item: &Submission) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        item.id.cyan(),
        format_status_colored(item.status())
    ));
    out.push_str(&format!("{}\n\n", item.title().bold()));

    if let Some(form) = &item.form {
        out.push_str(&format!("{}: {} ({})\n", "Form".cyan(), form.name, form.slug));
    }
    out.push_str(&format!("{}: {}\n", "Team".cyan(), or_dash(item.assigned_team())));
    out.push_str(&format!(
        "{}: {}\n",
        "Assignee".cyan(),
        or_dash(item.assigned_individual())
    ));
    if let Some(created_by) = &item.created_by {
        out.push_str(&format!("{}: {}\n", "Created by".cyan(), created_by));
    }
    for (label, ts) in [
        ("Created", item.created_at),
        ("Updated", item.updated_at),
        ("Closed", item.closed_at),
    ] {
        if let Some(ts) = ts {
            out.push_str(&format!("{}: {}\n", label.cyan(), ts));
        }
    }

    if !item.values.is_empty() {
        out.push_str(&format!("\n{}\n", "Values:".cyan().bold()));
        for (field, value) in &item.values {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "-".dimmed().to_string(),
                other => other.to_string(),
            };
            out.push_str(&format!("  {}: {}\n", field, rendered));
        }
    }

    out
}
