use serde::{Deserialize, Serialize};

use crate::error::QueueError;

/// Directory holding local configuration
pub const CONFIG_DIR: &str = ".kinetic";

/// Page sizes the list supports
pub const VALID_LIMITS: &[u32] = &[10, 25, 50, 100];

pub const DEFAULT_LIMIT: u32 = 25;

/// Submission status values the queue understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    Pending,
    Cancelled,
    Complete,
}

enum_display_fromstr!(
    Status,
    QueueError::invalid_status,
    {
        Open => "Open",
        Pending => "Pending",
        Cancelled => "Cancelled",
        Complete => "Complete",
    }
);

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Open,
        Status::Pending,
        Status::Cancelled,
        Status::Complete,
    ];

    /// Closed statuses only make sense to search within a date range
    pub fn is_closed(&self) -> bool {
        matches!(self, Status::Cancelled | Status::Complete)
    }
}

pub const VALID_STATUSES: &[&str] = &["Open", "Pending", "Cancelled", "Complete"];

/// Assignment facet of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Assignment {
    #[default]
    #[serde(rename = "")]
    Any,
    #[serde(rename = "mine")]
    Mine,
    #[serde(rename = "unassigned")]
    Unassigned,
}

enum_display_fromstr!(
    Assignment,
    QueueError::invalid_assignment,
    {
        Any => "",
        Mine => "mine",
        Unassigned => "unassigned",
    }
);

/// Timestamp field a date range applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeline {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "closedAt", alias = "completedAt")]
    ClosedAt,
}

enum_display_fromstr!(
    Timeline,
    QueueError::invalid_timeline,
    {
        CreatedAt => "createdAt",
        UpdatedAt => "updatedAt",
        ClosedAt => "closedAt",
    }
);

impl Timeline {
    /// Parse a timeline, accepting the legacy `completedAt` spelling
    pub fn parse_lenient(s: &str) -> Result<Self, QueueError> {
        if s.eq_ignore_ascii_case("completedAt") {
            return Ok(Timeline::ClosedAt);
        }
        s.parse()
    }

    /// Field name used in search expressions
    pub fn field(&self) -> &'static str {
        match self {
            Timeline::CreatedAt => "createdAt",
            Timeline::UpdatedAt => "updatedAt",
            Timeline::ClosedAt => "closedAt",
        }
    }
}

/// Sortable submission fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "closedAt", alias = "completedAt")]
    ClosedAt,
    #[serde(rename = "values[Due Date]")]
    DueDate,
}

enum_display_fromstr!(
    SortField,
    QueueError::invalid_sort_field,
    {
        CreatedAt => "createdAt",
        UpdatedAt => "updatedAt",
        ClosedAt => "closedAt",
        DueDate => "values[Due Date]",
    }
);

impl From<Timeline> for SortField {
    fn from(timeline: Timeline) -> Self {
        match timeline {
            Timeline::CreatedAt => SortField::CreatedAt,
            Timeline::UpdatedAt => SortField::UpdatedAt,
            Timeline::ClosedAt => SortField::ClosedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

enum_display_fromstr!(
    SortDirection,
    QueueError::invalid_sort_direction,
    {
        Asc => "ASC",
        Desc => "DESC",
    }
);

/// Where a filter came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Default,
    Team,
    Custom,
    Adhoc,
}

enum_display_fromstr!(
    FilterType,
    QueueError::invalid_filter_type,
    {
        Default => "default",
        Team => "team",
        Custom => "custom",
        Adhoc => "adhoc",
    }
);

/// Validate a page size against the supported set
pub fn validate_limit(limit: u32) -> Result<u32, QueueError> {
    if VALID_LIMITS.contains(&limit) {
        Ok(limit)
    } else {
        Err(QueueError::InvalidLimit(limit))
    }
}
