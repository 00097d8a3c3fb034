use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use jiff::civil::Date;
use std::collections::BTreeSet;
use std::io;
use std::str::FromStr;

use crate::filter::{DateRangeValue, Filter, FilterMenuAction};
use crate::queue::FollowUp;
use crate::types::{
    Assignment, SortDirection, SortField, Status, Timeline, VALID_LIMITS, VALID_STATUSES,
};

const VALID_TIMELINES: &[&str] = &["createdAt", "updatedAt", "closedAt"];
const VALID_SORT_FIELDS: &[&str] = &["createdAt", "updatedAt", "closedAt", "dueDate"];
const VALID_DIRECTIONS: &[&str] = &["ASC", "DESC"];
const VALID_FOLLOW_UPS: &[&str] = &["all", "successes", "failures"];

#[derive(Parser)]
#[command(name = "kq")]
#[command(about = "Work the Kinetic Data queue from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options shared by commands
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

/// Filter criteria, applied to the filter menu as edits
#[derive(Args, Debug, Clone, Default)]
pub struct Criteria {
    /// Restrict to a team (repeatable)
    #[arg(long = "team", value_name = "TEAM")]
    pub teams: Vec<String>,

    /// Restrict to a status (repeatable): Open, Pending, Cancelled, Complete
    #[arg(long, value_parser = parse_status)]
    pub status: Vec<Status>,

    /// Only items assigned to me
    #[arg(long, conflicts_with = "unassigned")]
    pub mine: bool,

    /// Only items nobody is assigned to
    #[arg(long)]
    pub unassigned: bool,

    /// Only items I created
    #[arg(long)]
    pub created_by_me: bool,

    /// Relative date window, e.g. 7days
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub preset: Option<String>,

    /// Start of a custom date range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<Date>,

    /// End of a custom date range, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<Date>,

    /// Timestamp the date range applies to: createdAt, updatedAt, closedAt
    #[arg(long, value_parser = parse_timeline)]
    pub timeline: Option<Timeline>,

    /// Sort field: createdAt, updatedAt, closedAt, dueDate (not with a date range)
    #[arg(long, value_parser = parse_sort_field, conflicts_with_all = ["preset", "start", "end"])]
    pub sort: Option<SortField>,

    /// Sort direction: ASC or DESC
    #[arg(long, value_parser = parse_direction)]
    pub direction: Option<SortDirection>,
}

impl Criteria {
    /// True when no criteria flag was given
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
            && self.status.is_empty()
            && !self.mine
            && !self.unassigned
            && !self.created_by_me
            && !self.has_date_range()
            && self.timeline.is_none()
            && self.sort.is_none()
            && self.direction.is_none()
    }

    /// True when these flags constrain the date range
    pub fn has_date_range(&self) -> bool {
        self.preset.is_some() || self.start.is_some() || self.end.is_some()
    }

    /// Reject a sort field that would fight an active date range
    ///
    /// While a range is active the sort follows its timeline.
    pub fn check_sort(&self, base: &Filter) -> crate::error::Result<()> {
        if self.sort.is_some() && (self.has_date_range() || base.date_range.is_active()) {
            return Err(crate::error::QueueError::Other(
                "--sort cannot be used while a date range is active; \
                 results are sorted by the range's --timeline"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Menu edits that add these criteria to `base`
    ///
    /// Teams and statuses already on `base` are left alone, since toggling
    /// them would remove them. Repeated values are applied once.
    pub fn menu_actions(&self, base: &Filter) -> Vec<FilterMenuAction> {
        let mut actions = Vec::new();

        let mut teams = BTreeSet::new();
        for team in &self.teams {
            if !base.teams.contains(team) && teams.insert(team) {
                actions.push(FilterMenuAction::ToggleTeam(team.clone()));
            }
        }
        let mut statuses = BTreeSet::new();
        for status in &self.status {
            if !base.status.contains(status) && statuses.insert(*status) {
                actions.push(FilterMenuAction::ToggleStatus(*status));
            }
        }

        if self.mine {
            actions.push(FilterMenuAction::ToggleAssignment(Assignment::Mine));
        } else if self.unassigned {
            actions.push(FilterMenuAction::ToggleAssignment(Assignment::Unassigned));
        }
        if self.created_by_me {
            actions.push(FilterMenuAction::ToggleCreatedByMe(true));
        }

        if let Some(timeline) = self.timeline {
            actions.push(FilterMenuAction::SetDateRangeTimeline(timeline));
        }
        if let Some(preset) = &self.preset {
            actions.push(FilterMenuAction::SetDateRange(DateRangeValue::Preset(
                preset.clone(),
            )));
        } else if self.start.is_some() || self.end.is_some() {
            actions.push(FilterMenuAction::SetDateRange(DateRangeValue::Custom {
                start: self.start,
                end: self.end,
            }));
        }

        if let Some(sort) = self.sort {
            actions.push(FilterMenuAction::SetSortedBy(sort));
        }
        if let Some(direction) = self.direction {
            actions.push(FilterMenuAction::SetSortDirection(direction));
        }

        actions
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the queue through a filter
    #[command(visible_alias = "ls")]
    List {
        /// Start from a named filter (default, team or personal)
        #[arg(short, long)]
        filter: Option<String>,

        #[command(flatten)]
        criteria: Criteria,

        /// Items per page: 10, 25, 50 or 100 (default from config)
        #[arg(short, long, value_parser = parse_limit)]
        limit: Option<u32>,

        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the search a filter would run, without contacting the server
    Query {
        /// Start from a named filter (default, team or personal)
        #[arg(short, long)]
        filter: Option<String>,

        #[command(flatten)]
        criteria: Criteria,

        /// Team the user belongs to (repeatable, default: all_teams from config)
        #[arg(long = "member-of", value_name = "TEAM")]
        member_of: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display a single submission
    #[command(visible_alias = "s")]
    Show {
        /// Submission ID
        #[arg(value_parser = parse_submission_id)]
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage personal filters
    Filters {
        #[command(subcommand)]
        action: FiltersAction,
    },

    /// Assign submissions to a team and optionally a team member
    Assign {
        /// Submission IDs
        #[arg(required = true, value_parser = parse_submission_id)]
        ids: Vec<String>,

        /// Team to assign to
        #[arg(short, long)]
        team: String,

        /// Team member to assign to (default: nobody)
        #[arg(short, long)]
        individual: Option<String>,

        /// Items to report for a follow-up action: all, successes, failures
        #[arg(long, default_value = "failures", value_parser = parse_follow_up)]
        keep: FollowUp,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set field values on submissions assigned to me
    Work {
        /// Submission IDs
        #[arg(required = true, value_parser = parse_submission_id)]
        ids: Vec<String>,

        /// Field value as FIELD=VALUE (repeatable)
        #[arg(long = "set", required = true, value_parser = parse_field_value)]
        values: Vec<(String, String)>,

        /// Items to report for a follow-up action: all, successes, failures
        #[arg(long, default_value = "failures", value_parser = parse_follow_up)]
        keep: FollowUp,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum FiltersAction {
    /// List default, team and personal filters
    Ls {
        /// Include result counts (one search per filter)
        #[arg(long)]
        counts: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save criteria as a personal filter
    Save {
        /// Name of the personal filter
        name: String,

        /// Start from a named filter (default, team or personal)
        #[arg(short, long)]
        from: Option<String>,

        #[command(flatten)]
        criteria: Criteria,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a personal filter
    Rm {
        /// Name of the personal filter
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Display current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a configuration value
    Set {
        /// Key: server, kapp, username, password, page_size, timeout_secs, all_teams
        key: String,

        /// Value to set
        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            ListOptions, cmd_assign, cmd_config_set, cmd_config_show, cmd_filters_ls,
            cmd_filters_rm, cmd_filters_save, cmd_list, cmd_query, cmd_show, cmd_work,
        };

        match self {
            Commands::List {
                filter,
                criteria,
                limit,
                pages,
                json,
            } => {
                let opts = ListOptions {
                    filter,
                    criteria,
                    limit,
                    pages,
                };
                cmd_list(opts, OutputOptions { json }).await
            }

            Commands::Query {
                filter,
                criteria,
                member_of,
                json,
            } => cmd_query(filter.as_deref(), &criteria, member_of, OutputOptions { json }),

            Commands::Show { id, json } => cmd_show(&id, OutputOptions { json }).await,

            Commands::Filters { action } => match action {
                FiltersAction::Ls { counts, json } => {
                    cmd_filters_ls(counts, OutputOptions { json }).await
                }
                FiltersAction::Save {
                    name,
                    from,
                    criteria,
                    json,
                } => {
                    cmd_filters_save(&name, from.as_deref(), &criteria, OutputOptions { json })
                        .await
                }
                FiltersAction::Rm { name, json } => {
                    cmd_filters_rm(&name, OutputOptions { json }).await
                }
            },

            Commands::Assign {
                ids,
                team,
                individual,
                keep,
                json,
            } => cmd_assign(ids, team, individual, keep, OutputOptions { json }).await,

            Commands::Work {
                ids,
                values,
                keep,
                json,
            } => cmd_work(ids, values, keep, OutputOptions { json }).await,

            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(OutputOptions { json }),
                ConfigAction::Set { key, value, json } => {
                    cmd_config_set(&key, &value, OutputOptions { json })
                }
            },

            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

/// Generic validation helper for parsing values with a standard error message format.
fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> Result<T, String>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_status(s: &str) -> Result<Status, String> {
    parse_with_validation(
        s,
        |v| Status::from_str(v).map_err(|_| String::new()),
        "status",
        VALID_STATUSES,
    )
}

fn parse_timeline(s: &str) -> Result<Timeline, String> {
    parse_with_validation(
        s,
        |v| Timeline::parse_lenient(v).map_err(|_| String::new()),
        "timeline",
        VALID_TIMELINES,
    )
}

fn parse_sort_field(s: &str) -> Result<SortField, String> {
    parse_with_validation(
        s,
        |v| {
            if v.trim().eq_ignore_ascii_case("dueDate") {
                return Ok(SortField::DueDate);
            }
            if v.trim().eq_ignore_ascii_case("completedAt") {
                return Ok(SortField::ClosedAt);
            }
            v.parse().map_err(|_| String::new())
        },
        "sort field",
        VALID_SORT_FIELDS,
    )
}

fn parse_direction(s: &str) -> Result<SortDirection, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "direction",
        VALID_DIRECTIONS,
    )
}

fn parse_follow_up(s: &str) -> Result<FollowUp, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "follow-up",
        VALID_FOLLOW_UPS,
    )
}

fn parse_limit(s: &str) -> Result<u32, String> {
    let valid: Vec<String> = VALID_LIMITS.iter().map(|l| l.to_string()).collect();
    let valid: Vec<&str> = valid.iter().map(String::as_str).collect();
    parse_with_validation(
        s,
        |v| {
            v.trim()
                .parse::<u32>()
                .ok()
                .filter(|l| VALID_LIMITS.contains(l))
                .ok_or_else(String::new)
        },
        "limit",
        &valid,
    )
}

fn parse_date(s: &str) -> Result<Date, String> {
    s.trim()
        .parse::<Date>()
        .map_err(|_| format!("Invalid date '{s}'. Expected YYYY-MM-DD"))
}

fn parse_submission_id(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("ID cannot be empty".to_string());
    }

    if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("ID must contain only alphanumeric characters and hyphens".to_string());
    }

    Ok(s.to_string())
}

fn parse_field_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid field value '{s}'. Expected FIELD=VALUE")),
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "kq", &mut io::stdout());
}
