use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("filter '{0}' not found")]
    FilterNotFound(String),

    #[error("a personal filter named '{0}' already exists")]
    DuplicateFilter(String),

    #[error("submission '{0}' not found")]
    SubmissionNotFound(String),

    #[error("invalid status '{0}'")]
    InvalidStatus(String),

    #[error("invalid assignment '{0}'")]
    InvalidAssignment(String),

    #[error("invalid timeline '{0}'")]
    InvalidTimeline(String),

    #[error("invalid sort field '{0}'")]
    InvalidSortField(String),

    #[error("invalid sort direction '{0}'")]
    InvalidSortDirection(String),

    #[error("invalid filter type '{0}'")]
    InvalidFilterType(String),

    #[error("invalid follow-up '{0}', expected all, successes or failures")]
    InvalidFollowUp(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid page size {0}, expected one of 10, 25, 50, 100")]
    InvalidLimit(u32),

    #[error("invalid filter: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("task was cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl QueueError {
    pub fn invalid_status(s: String) -> Self {
        QueueError::InvalidStatus(s)
    }

    pub fn invalid_assignment(s: String) -> Self {
        QueueError::InvalidAssignment(s)
    }

    pub fn invalid_timeline(s: String) -> Self {
        QueueError::InvalidTimeline(s)
    }

    pub fn invalid_sort_field(s: String) -> Self {
        QueueError::InvalidSortField(s)
    }

    pub fn invalid_sort_direction(s: String) -> Self {
        QueueError::InvalidSortDirection(s)
    }

    pub fn invalid_filter_type(s: String) -> Self {
        QueueError::InvalidFilterType(s)
    }

    pub fn invalid_follow_up(s: String) -> Self {
        QueueError::InvalidFollowUp(s)
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
