//! Queue filter value model.
//!
//! A [`Filter`] is a plain immutable value: every update helper consumes the
//! filter and returns a new one, and equality/hashing are structural so a
//! filter can key the per-filter result counts.

pub mod menu;
pub mod personal;
pub mod validation;

use std::collections::BTreeSet;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::types::{Assignment, FilterType, SortDirection, SortField, Status, Timeline};

pub use menu::{FilterMenuAction, FilterMenuState, MenuSection, MenuVariant, reduce_filter_menu};
pub use validation::{ValidationErrors, validate_filter, validate_filter_name};

/// Date constraint of a filter. `preset` and `custom` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default)]
    pub timeline: Timeline,
    /// Empty, or a relative window such as `7days`
    #[serde(default)]
    pub preset: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default, with = "optional_date")]
    pub start: Option<Date>,
    #[serde(default, with = "optional_date")]
    pub end: Option<Date>,
}

impl DateRange {
    /// True when a preset or custom range constrains the results
    pub fn is_active(&self) -> bool {
        !self.preset.is_empty() || self.custom
    }
}

/// A value assigned to a filter's date range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRangeValue {
    /// Remove any constraint
    Clear,
    /// Relative window, e.g. `30days`
    Preset(String),
    /// Absolute range; either bound may still be missing while editing
    Custom {
        start: Option<Date>,
        end: Option<Date>,
    },
}

impl DateRangeValue {
    pub fn is_empty(&self) -> bool {
        match self {
            DateRangeValue::Clear => true,
            DateRangeValue::Preset(p) => p.is_empty(),
            DateRangeValue::Custom { .. } => false,
        }
    }
}

/// Saved or ad hoc query criteria for the queue list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(rename = "type", default)]
    pub filter_type: FilterType,
    #[serde(default)]
    pub name: String,
    /// Empty means any team
    #[serde(default)]
    pub teams: BTreeSet<String>,
    #[serde(default)]
    pub assignments: Assignment,
    #[serde(default)]
    pub created_by_me: bool,
    /// Empty means any status
    #[serde(default)]
    pub status: BTreeSet<Status>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            filter_type: FilterType::Default,
            name: String::new(),
            teams: BTreeSet::new(),
            assignments: Assignment::Any,
            created_by_me: false,
            status: BTreeSet::new(),
            date_range: DateRange::default(),
            sort_by: SortField::CreatedAt,
            sort_direction: SortDirection::Desc,
        }
    }
}

impl Filter {
    /// Create an empty filter of the given type and name
    pub fn new(filter_type: FilterType, name: impl Into<String>) -> Self {
        Self {
            filter_type,
            name: name.into(),
            ..Default::default()
        }
    }

    /// An unsaved filter representing the current in-session query
    pub fn adhoc() -> Self {
        Self::new(FilterType::Adhoc, "")
    }

    pub fn with_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add the team if absent, remove it if present
    pub fn toggle_team(mut self, team: &str) -> Self {
        if !self.teams.remove(team) {
            self.teams.insert(team.to_string());
        }
        self
    }

    /// Add the status if absent, remove it if present
    pub fn toggle_status(mut self, status: Status) -> Self {
        if !self.status.remove(&status) {
            self.status.insert(status);
        }
        self
    }

    pub fn with_teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams = teams.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status<I>(mut self, status: I) -> Self
    where
        I: IntoIterator<Item = Status>,
    {
        self.status = status.into_iter().collect();
        self
    }

    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments = assignment;
        self
    }

    pub fn with_created_by_me(mut self, created_by_me: bool) -> Self {
        self.created_by_me = created_by_me;
        self
    }

    /// Change the date range timeline, keeping the sort on the constrained field
    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.date_range.timeline = timeline;
        if self.date_range.is_active() {
            self.sort_by = timeline.into();
        }
        self
    }

    /// Assign a date range. A non-empty value forces the sort onto the timeline.
    pub fn with_date_range(mut self, value: DateRangeValue) -> Self {
        let forces_sort = !value.is_empty();
        match value {
            DateRangeValue::Clear => {
                self.date_range.preset.clear();
                self.date_range.custom = false;
                self.date_range.start = None;
                self.date_range.end = None;
            }
            DateRangeValue::Preset(preset) => {
                self.date_range.preset = preset;
                self.date_range.custom = false;
                self.date_range.start = None;
                self.date_range.end = None;
            }
            DateRangeValue::Custom { start, end } => {
                self.date_range.preset.clear();
                self.date_range.custom = true;
                self.date_range.start = start;
                self.date_range.end = end;
            }
        }
        if forces_sort {
            self.sort_by = self.date_range.timeline.into();
        }
        self
    }

    pub fn with_sort_by(mut self, sort_by: SortField) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_sort_direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = direction;
        self
    }

    /// Name shown to the user; ad hoc filters have none of their own
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Adhoc"
        } else {
            &self.name
        }
    }
}

/// Built-in filters every user gets
pub fn default_filters() -> Vec<Filter> {
    vec![
        Filter::new(FilterType::Default, "Mine")
            .with_assignment(Assignment::Mine)
            .with_status([Status::Open]),
        Filter::new(FilterType::Default, "Unassigned")
            .with_assignment(Assignment::Unassigned)
            .with_status([Status::Open]),
        Filter::new(FilterType::Default, "Created By Me")
            .with_created_by_me(true)
            .with_status([Status::Open, Status::Pending]),
    ]
}

/// One filter per team the user belongs to
pub fn team_filters(my_teams: &[String]) -> Vec<Filter> {
    my_teams
        .iter()
        .map(|team| {
            Filter::new(FilterType::Team, team.clone())
                .with_teams([team.clone()])
                .with_status([Status::Open])
        })
        .collect()
}

/// Resolve a filter by name across defaults, team filters and personal filters
///
/// Matching is case-insensitive. Personal filters shadow nothing: built-ins
/// are searched first.
pub fn find_filter(name: &str, my_teams: &[String], personal: &[Filter]) -> Option<Filter> {
    default_filters()
        .into_iter()
        .chain(team_filters(my_teams))
        .chain(personal.iter().cloned())
        .find(|f| f.name.eq_ignore_ascii_case(name))
}

mod optional_date {
    use jiff::civil::Date;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse::<Date>().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
