//! Per-session application settings derived from config and the profile.

use crate::config::Config;
use crate::remote::Profile;

/// What the queue needs to know about the app and the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    /// Kapp whose submissions make up the queue
    pub kapp: String,
    /// Teams the user belongs to
    pub my_teams: Vec<String>,
    /// Every team work can be assigned to
    pub all_teams: Vec<String>,
}

impl AppSettings {
    pub fn new(config: &Config, profile: &Profile) -> Self {
        let my_teams = profile.teams.clone();
        let all_teams = config
            .all_teams
            .clone()
            .unwrap_or_else(|| my_teams.clone());
        Self {
            kapp: config.kapp.clone(),
            my_teams,
            all_teams,
        }
    }
}
