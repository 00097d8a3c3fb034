//! Translate a queue [`Filter`] into a backend search.
//!
//! [`build_search`] is pure: the current user, their teams and the clock are
//! all explicit inputs. The rules are applied in a fixed order and each one
//! contributes an AND-ed predicate:
//!
//! 1. created by me
//! 2. assigned to me
//! 3. unassigned (only when the user has teams or also filters on created by me)
//! 4. assigned team, restricted to the user's own teams
//! 5. status
//! 6. date range
//!
//! When none of rules 1-4 applies the query would be unconstrained, so the
//! result is flagged with `invalid_assignment` and callers short-circuit to
//! an empty list instead of searching.

pub mod kql;

use jiff::civil::Date;
use jiff::{ToSpan, Timestamp, Zoned, tz::TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::filter::Filter;
use crate::remote::Profile;
use crate::settings::AppSettings;
use crate::types::{Assignment, SortDirection, SortField};

pub use kql::{KqlQuery, Predicate};

/// Relations loaded with every submission in the list
pub const SEARCH_INCLUDES: &[&str] = &["details", "form", "form.kapp", "values"];

/// Days used when a preset cannot be parsed
pub const FALLBACK_PRESET_DAYS: i64 = 7;

pub const FIELD_CREATED_BY: &str = "createdBy";
pub const FIELD_ASSIGNED_INDIVIDUAL: &str = "values[Assigned Individual]";
pub const FIELD_ASSIGNED_TEAM: &str = "values[Assigned Team]";
pub const FIELD_STATUS: &str = "values[Status]";

static PRESET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)days$").expect("preset pattern is valid"));

/// Search parameters sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Search {
    pub q: String,
    pub order_by: SortField,
    pub direction: SortDirection,
    pub include: Vec<String>,
}

/// Result of translating a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub search: Search,
    /// No assignment-related predicate narrows the query
    pub invalid_assignment: bool,
}

/// Number of days in a `<N>days` preset, falling back to a week when malformed
pub fn preset_days(preset: &str) -> i64 {
    PRESET_RE
        .captures(preset.trim())
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid date range preset '{preset}', defaulting to {FALLBACK_PRESET_DAYS} days"
            );
            FALLBACK_PRESET_DAYS
        })
}

/// Midnight of `date` in `tz`, as an instant
fn start_of(date: Date, tz: &TimeZone) -> Option<Timestamp> {
    date.to_zoned(tz.clone()).ok().map(|z| z.timestamp())
}

/// Build the backend search for `filter` on behalf of the signed-in user
pub fn build_search(
    filter: &Filter,
    settings: &AppSettings,
    profile: &Profile,
    now: &Zoned,
) -> SearchQuery {
    let username = profile.username.as_str();
    let mut query = KqlQuery::new();
    let mut assignment_satisfied = false;
    let has_teams = !settings.my_teams.is_empty();

    if filter.created_by_me {
        query = query.eq(FIELD_CREATED_BY, username);
        assignment_satisfied = true;
    }

    match filter.assignments {
        Assignment::Mine => {
            query = query.eq(FIELD_ASSIGNED_INDIVIDUAL, username);
            assignment_satisfied = true;
        }
        Assignment::Unassigned if has_teams || filter.created_by_me => {
            query = query.is_null(FIELD_ASSIGNED_INDIVIDUAL);
        }
        _ => {}
    }

    let narrows_by_team = !filter.teams.is_empty()
        || (filter.assignments != Assignment::Mine && !filter.created_by_me);
    if has_teams && narrows_by_team {
        let teams: Vec<String> = if filter.teams.is_empty() {
            settings.my_teams.clone()
        } else {
            filter
                .teams
                .iter()
                .filter(|t| settings.my_teams.contains(t))
                .cloned()
                .collect()
        };
        query = query.in_list(FIELD_ASSIGNED_TEAM, teams);
        assignment_satisfied = true;
    }

    if !filter.status.is_empty() {
        let statuses = filter.status.iter().map(|s| s.to_string()).collect();
        query = query.eq_or_in(FIELD_STATUS, statuses);
    }

    let range = &filter.date_range;
    let field = range.timeline.field();
    let tz = now.time_zone();
    if range.custom {
        if let (Some(start), Some(end)) = (range.start, range.end) {
            let low = start_of(start, tz);
            let high = end
                .checked_add(1.day())
                .ok()
                .and_then(|next| start_of(next, tz));
            match (low, high) {
                (Some(low), Some(high)) => {
                    query = query.between(field, low.to_string(), high.to_string());
                }
                _ => tracing::warn!("Date range {start}..{end} is out of bounds, ignoring"),
            }
        }
    } else if !range.preset.is_empty() {
        let days = preset_days(&range.preset);
        let since = now.date().saturating_sub(days.days());
        match start_of(since, tz) {
            Some(ts) => query = query.gteq(field, ts.to_string()),
            None => tracing::warn!("Date preset '{}' is out of bounds, ignoring", range.preset),
        }
    }

    SearchQuery {
        search: Search {
            q: query.build(),
            order_by: filter.sort_by,
            direction: filter.sort_direction,
            include: SEARCH_INCLUDES.iter().map(|s| s.to_string()).collect(),
        },
        invalid_assignment: !assignment_satisfied,
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::filter::DateRangeValue;
    use crate::types::{Status, Timeline};

    fn settings(teams: &[&str]) -> AppSettings {
        AppSettings {
            kapp: "queue".to_string(),
            my_teams: teams.iter().map(|t| t.to_string()).collect(),
            all_teams: teams.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn now() -> Zoned {
        date(2024, 3, 15)
            .at(13, 45, 0, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap()
    }

    fn build(filter: &Filter, teams: &[&str]) -> SearchQuery {
        build_search(filter, &settings(teams), &Profile::new("alice"), &now())
    }

    #[test]
    fn test_unconstrained_without_teams_is_invalid() {
        let result = build(&Filter::adhoc(), &[]);
        assert!(result.invalid_assignment);
        assert_eq!(result.search.q, "");
    }

    #[test]
    fn test_no_facets_with_teams_defaults_to_all_my_teams() {
        let result = build(&Filter::adhoc(), &["HR", "IT"]);
        assert!(!result.invalid_assignment);
        assert_eq!(result.search.q, r#"values[Assigned Team] IN ("HR", "IT")"#);
    }

    #[test]
    fn test_created_by_me() {
        let result = build(&Filter::adhoc().with_created_by_me(true), &["IT"]);
        assert!(!result.invalid_assignment);
        assert_eq!(result.search.q, r#"createdBy = "alice""#);
    }

    #[test]
    fn test_mine_skips_team_predicate() {
        let result = build(&Filter::adhoc().with_assignment(Assignment::Mine), &["IT"]);
        assert_eq!(result.search.q, r#"values[Assigned Individual] = "alice""#);
    }

    #[test]
    fn test_mine_with_explicit_teams_keeps_team_predicate() {
        let filter = Filter::adhoc()
            .with_assignment(Assignment::Mine)
            .toggle_team("IT");
        let result = build(&filter, &["IT", "HR"]);
        assert_eq!(
            result.search.q,
            r#"values[Assigned Individual] = "alice" AND values[Assigned Team] IN ("IT")"#
        );
    }

    #[test]
    fn test_unassigned_requires_teams_or_created_by_me() {
        let filter = Filter::adhoc().with_assignment(Assignment::Unassigned);
        let without = build(&filter, &[]);
        assert!(without.invalid_assignment);
        assert_eq!(without.search.q, "");

        let with_teams = build(&filter, &["IT"]);
        assert_eq!(
            with_teams.search.q,
            r#"values[Assigned Individual] = null AND values[Assigned Team] IN ("IT")"#
        );

        let created = build(&filter.clone().with_created_by_me(true), &[]);
        assert!(!created.invalid_assignment);
        assert_eq!(
            created.search.q,
            r#"createdBy = "alice" AND values[Assigned Individual] = null"#
        );
    }

    #[test]
    fn test_explicit_teams_intersect_with_membership() {
        let filter = Filter::adhoc().toggle_team("IT").toggle_team("Legal");
        let result = build(&filter, &["HR", "IT"]);
        assert_eq!(result.search.q, r#"values[Assigned Team] IN ("IT")"#);
    }

    #[test]
    fn test_explicit_teams_ignored_without_membership() {
        let filter = Filter::adhoc().toggle_team("IT");
        let result = build(&filter, &[]);
        assert!(result.invalid_assignment);
    }

    #[test]
    fn test_status_single_and_multiple() {
        let one = build(
            &Filter::adhoc().with_created_by_me(true).with_status([Status::Open]),
            &[],
        );
        assert_eq!(
            one.search.q,
            r#"createdBy = "alice" AND values[Status] = "Open""#
        );

        let two = build(
            &Filter::adhoc()
                .with_created_by_me(true)
                .with_status([Status::Pending, Status::Open]),
            &[],
        );
        assert_eq!(
            two.search.q,
            r#"createdBy = "alice" AND values[Status] IN ("Open", "Pending")"#
        );
    }

    #[test]
    fn test_custom_range_includes_whole_end_day() {
        let filter = Filter::adhoc()
            .with_created_by_me(true)
            .with_timeline(Timeline::ClosedAt)
            .with_date_range(DateRangeValue::Custom {
                start: Some(date(2024, 2, 1)),
                end: Some(date(2024, 2, 29)),
            });
        let result = build(&filter, &[]);
        assert_eq!(
            result.search.q,
            r#"createdBy = "alice" AND closedAt BETWEEN ("2024-02-01T00:00:00Z", "2024-03-01T00:00:00Z")"#
        );
        assert_eq!(result.search.order_by, SortField::ClosedAt);
    }

    #[test]
    fn test_incomplete_custom_range_adds_nothing() {
        let filter = Filter::adhoc()
            .with_created_by_me(true)
            .with_date_range(DateRangeValue::Custom {
                start: Some(date(2024, 2, 1)),
                end: None,
            });
        assert_eq!(build(&filter, &[]).search.q, r#"createdBy = "alice""#);
    }

    #[test]
    fn test_preset_counts_back_from_start_of_today() {
        let filter = Filter::adhoc()
            .with_created_by_me(true)
            .with_date_range(DateRangeValue::Preset("30days".into()));
        assert_eq!(
            build(&filter, &[]).search.q,
            r#"createdBy = "alice" AND createdAt >= "2024-02-14T00:00:00Z""#
        );
    }

    #[test]
    fn test_malformed_preset_defaults_to_seven_days() {
        assert_eq!(preset_days("fortnight"), 7);
        assert_eq!(preset_days("14days"), 14);
        let filter = Filter::adhoc()
            .with_created_by_me(true)
            .with_timeline(Timeline::UpdatedAt)
            .with_date_range(DateRangeValue::Preset("lots".into()));
        assert_eq!(
            build(&filter, &[]).search.q,
            r#"createdBy = "alice" AND updatedAt >= "2024-03-08T00:00:00Z""#
        );
    }

    #[test]
    fn test_search_carries_sort_and_includes() {
        let filter = Filter::adhoc()
            .with_created_by_me(true)
            .with_sort_by(SortField::DueDate)
            .with_sort_direction(SortDirection::Asc);
        let result = build(&filter, &[]);
        assert_eq!(result.search.order_by, SortField::DueDate);
        assert_eq!(result.search.direction, SortDirection::Asc);
        assert_eq!(
            result.search.include,
            vec!["details", "form", "form.kapp", "values"]
        );
    }
}
