//! Runtime settings for match hosting.

use goban_rules::MatchConfig;
use std::time::Duration;

/// Matches untouched for this long are removed by the sweeper.
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// How often the sweeper runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Settings shared by the registry and the action service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Inactivity after which a match is swept
    pub match_timeout: Duration,
    /// Period of the background sweep
    pub sweep_interval: Duration,
    /// Board, komi and clock used by [`crate::GameService::create_default_match`]
    pub match_defaults: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            match_timeout: DEFAULT_MATCH_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            match_defaults: MatchConfig::default(),
        }
    }
}
