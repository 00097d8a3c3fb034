#[macro_use]
pub mod macros;

pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod query;
pub mod queue;
pub mod remote;
pub mod settings;
pub mod types;

pub use config::Config;
pub use error::{QueueError, Result};
pub use filter::{
    DateRange, DateRangeValue, Filter, FilterMenuAction, FilterMenuState, MenuVariant,
    default_filters, find_filter, reduce_filter_menu, team_filters,
};
pub use query::{Search, SearchQuery, build_search};
pub use queue::{
    BulkAction, BulkResults, CountValue, FollowUp, QueueAction, QueueRunner, QueueState,
    QueueStore, reduce_queue_state,
};
pub use remote::kinetic::KineticClient;
pub use remote::{Profile, SearchRequest, SearchResponse, Submission, SubmissionApi};
pub use settings::AppSettings;
pub use types::{Assignment, FilterType, SortDirection, SortField, Status, Timeline};
