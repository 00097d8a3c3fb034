use jiff::Zoned;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, resolve_filter};
use crate::cli::{Criteria, OutputOptions};
use crate::config::Config;
use crate::error::Result;
use crate::query::build_search;
use crate::remote::Profile;
use crate::settings::AppSettings;

/// Print the search a filter would run
///
/// Works offline: the user comes from config and team membership from
/// `member_of` (or `all_teams`), so personal filters are not available.
pub fn cmd_query(
    filter_name: Option<&str>,
    criteria: &Criteria,
    member_of: Vec<String>,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;

    let mut profile = Profile::new(config.username().unwrap_or_default());
    profile.teams = if member_of.is_empty() {
        config.all_teams.clone().unwrap_or_default()
    } else {
        member_of
    };
    let settings = AppSettings::new(&config, &profile);

    let filter = resolve_filter(filter_name, criteria, &settings.my_teams, &[])?;
    let query = build_search(&filter, &settings, &profile, &Zoned::now());

    let json_output = json!({
        "kapp": settings.kapp,
        "filter": filter,
        "search": query.search,
        "invalid_assignment": query.invalid_assignment,
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}: {}\n", "kapp".cyan(), settings.kapp));
    text_output.push_str(&format!("{}: {}\n", "filter".cyan(), filter.display_name()));
    text_output.push_str(&format!("{}: {}\n", "q".cyan(), query.search.q));
    text_output.push_str(&format!(
        "{}: {} {}\n",
        "orderBy".cyan(),
        query.search.order_by,
        query.search.direction
    ));
    text_output.push_str(&format!(
        "{}: {}\n",
        "include".cyan(),
        query.search.include.join(",")
    ));
    if query.invalid_assignment {
        text_output.push_str(&format!(
            "\n{}\n",
            "No assignment constraint applies; this filter returns no items.".yellow()
        ));
    }

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}
