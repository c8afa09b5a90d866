//! # Match Registry
//!
//! Owns every live match. The directory itself is a [`DashMap`], so
//! creating, looking up and removing matches never waits on a match's
//! contents; each match sits behind its own async mutex, so actions on one
//! match are serialized while different matches proceed independently.
//!
//! ## Expiry
//!
//! Every entry carries a last-activity stamp, separate from anything inside
//! the match, that mutating operations refresh. A background task started by
//! [`MatchRegistry::start_sweeper`] periodically removes entries idle for
//! longer than the configured timeout. Removal only drops the directory's
//! reference: a caller already holding an [`Arc<MatchEntry>`] keeps a valid
//! match until it lets go.

use crate::config::{ServerConfig, DEFAULT_SWEEP_INTERVAL};
use crate::error::ServerError;
use crate::ids::MatchId;
use dashmap::DashMap;
use goban_rules::{Match, MatchConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// ============================================================================
// Entries
// ============================================================================

/// A registered match plus its expiry bookkeeping.
#[derive(Debug)]
pub struct MatchEntry {
    id: MatchId,
    state: Mutex<Match>,
    epoch: Instant,
    /// Milliseconds since `epoch` of the last mutating operation.
    last_activity_ms: AtomicU64,
}

impl MatchEntry {
    fn new(id: MatchId, state: Match, epoch: Instant, now: Instant) -> Self {
        let entry = Self {
            id,
            state: Mutex::new(state),
            epoch,
            last_activity_ms: AtomicU64::new(0),
        };
        entry.touch(now);
        entry
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Waits for exclusive access to the match.
    pub async fn lock(&self) -> MutexGuard<'_, Match> {
        self.state.lock().await
    }

    /// Records activity at `now`. The stamp never moves backwards.
    pub fn touch(&self, now: Instant) {
        let offset = now.saturating_duration_since(self.epoch).as_millis() as u64;
        self.last_activity_ms.fetch_max(offset, Ordering::AcqRel);
    }

    pub fn last_activity(&self) -> Instant {
        self.epoch + Duration::from_millis(self.last_activity_ms.load(Ordering::Acquire))
    }

    /// How long the match has been idle as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity())
    }
}

fn sweep_entries(
    matches: &DashMap<MatchId, Arc<MatchEntry>>,
    now: Instant,
    timeout: Duration,
) -> Vec<MatchId> {
    let mut removed = Vec::new();
    matches.retain(|id, entry| {
        let keep = entry.idle_for(now) <= timeout;
        if !keep {
            removed.push(*id);
        }
        keep
    });
    removed
}

// ============================================================================
// Registry
// ============================================================================

/// Directory of live matches with background expiry.
pub struct MatchRegistry {
    matches: Arc<DashMap<MatchId, Arc<MatchEntry>>>,
    config: ServerConfig,
    epoch: Instant,
    shutdown_signal: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MatchRegistry {
    /// Creates an empty registry.
    ///
    /// A zero sweep interval cannot drive a timer and is replaced by
    /// [`DEFAULT_SWEEP_INTERVAL`].
    pub fn new(mut config: ServerConfig) -> Self {
        if config.sweep_interval.is_zero() {
            warn!(
                "⚠️ Sweep interval must be non-zero, using {:?}",
                DEFAULT_SWEEP_INTERVAL
            );
            config.sweep_interval = DEFAULT_SWEEP_INTERVAL;
        }
        let (shutdown_signal, _) = watch::channel(false);
        Self {
            matches: Arc::new(DashMap::new()),
            config,
            epoch: Instant::now(),
            shutdown_signal,
            sweeper: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates and registers a match.
    ///
    /// # Arguments
    ///
    /// * `config` - Board, clock and seat settings, plus an optional seed
    ///
    /// # Returns
    ///
    /// The new match id, or `InvalidConfig` when the settings are rejected.
    /// A seed that cannot be replayed is logged and the match starts from an
    /// empty board instead.
    pub fn create(&self, config: MatchConfig) -> Result<MatchId, ServerError> {
        let now = Instant::now();
        let mut state = Match::new(&config, now)?;

        if let Some(seed) = &config.seed {
            if let Err(e) = state.apply_seed(seed, now) {
                warn!("⚠️ Seed for {} vs {} rejected, starting fresh: {}", config.black, config.white, e);
                state = Match::new(&config, now)?;
            }
        }

        let id = MatchId::new();
        let entry = Arc::new(MatchEntry::new(id, state, self.epoch, now));
        self.matches.insert(id, entry);
        info!(
            "🎮 Match {} created: {} (black) vs {} (white) on {}x{}",
            id, config.black, config.white, config.board_size, config.board_size
        );
        Ok(id)
    }

    /// Looks up a match. Does not count as activity.
    pub fn get(&self, id: MatchId) -> Result<Arc<MatchEntry>, ServerError> {
        self.matches
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ServerError::NotFound(id))
    }

    /// Runs `f` with exclusive access to a match.
    ///
    /// Activity is recorded only when `f` succeeds, matching the action
    /// path where refused actions leave the match untouched.
    pub async fn with_match<F, R>(&self, id: MatchId, f: F) -> Result<R, ServerError>
    where
        F: FnOnce(&mut Match) -> Result<R, ServerError>,
    {
        let entry = self.get(id)?;
        let mut state = entry.lock().await;
        let result = f(&mut *state)?;
        entry.touch(Instant::now());
        Ok(result)
    }

    /// Deletes a match. Returns `false` if it was not registered.
    pub fn remove(&self, id: MatchId) -> bool {
        let removed = self.matches.remove(&id).is_some();
        if removed {
            info!("🗑️ Match {} removed", id);
        }
        removed
    }

    pub fn contains(&self, id: MatchId) -> bool {
        self.matches.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn ids(&self) -> Vec<MatchId> {
        self.matches.iter().map(|entry| *entry.key()).collect()
    }

    /// Removes every match idle for longer than the timeout as of `now`.
    pub fn sweep(&self, now: Instant) -> Vec<MatchId> {
        let removed = sweep_entries(&self.matches, now, self.config.match_timeout);
        if !removed.is_empty() {
            info!("🧹 Swept {} inactive matches", removed.len());
        }
        removed
    }

    /// Starts the periodic sweep task. Calling it again while running is a no-op.
    pub async fn start_sweeper(&self) {
        let mut slot = self.sweeper.lock().await;
        if slot.is_some() {
            debug!("Sweeper already running");
            return;
        }

        let matches = Arc::clone(&self.matches);
        let timeout = self.config.match_timeout;
        let period = self.config.sweep_interval;
        let mut shutdown = self.shutdown_signal.subscribe();

        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = sweep_entries(&matches, Instant::now(), timeout);
                        if !removed.is_empty() {
                            info!("🧹 Swept {} inactive matches", removed.len());
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
            debug!("Sweeper stopped");
        }));
        info!("🕒 Match sweeper started (every {:?}, timeout {:?})", period, timeout);
    }

    /// Stops the sweep task and waits for it to finish.
    pub async fn shutdown(&self) {
        self.shutdown_signal.send_replace(true);
        if let Some(handle) = self.sweeper.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Sweeper task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goban_rules::{Color, MatchSeed, Move, Point, RecordedMove};

    fn registry() -> MatchRegistry {
        MatchRegistry::new(ServerConfig::default())
    }

    fn config() -> MatchConfig {
        MatchConfig {
            board_size: 9,
            ..MatchConfig::between("alice", "bob")
        }
    }

    #[test]
    fn create_and_get() {
        let registry = registry();
        let id = registry.create(config()).unwrap();
        assert_eq!(registry.get(id).unwrap().id(), id);
        assert!(matches!(
            registry.get(MatchId::new()),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let registry = registry();
        let err = registry
            .create(MatchConfig::between("alice", "alice"))
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn bad_seed_falls_back_to_empty_board() {
        let registry = registry();
        let seed = MatchSeed::Moves(vec![
            RecordedMove::place(Color::Black, 2, 2),
            RecordedMove::place(Color::White, 2, 2),
        ]);
        let id = registry
            .create(MatchConfig {
                seed: Some(seed),
                ..config()
            })
            .unwrap();

        let entry = registry.get(id).unwrap();
        let state = entry.lock().await;
        assert!(state.game().moves().is_empty());
        assert_eq!(state.game().board().get(Point::new(2, 2)), None);
    }

    #[tokio::test]
    async fn good_seed_is_replayed() {
        let registry = registry();
        let seed = MatchSeed::Moves(vec![RecordedMove::place(Color::Black, 2, 2)]);
        let id = registry
            .create(MatchConfig {
                seed: Some(seed),
                ..config()
            })
            .unwrap();
        let to_move = registry
            .with_match(id, |state| Ok(state.game().to_move()))
            .await
            .unwrap();
        assert_eq!(to_move, Color::White);
    }

    #[test]
    fn sweep_removes_only_stale_matches() {
        let registry = registry();
        let t0 = Instant::now();
        let stale = registry.create(config()).unwrap();
        let fresh = registry.create(config()).unwrap();
        registry.get(fresh).unwrap().touch(t0 + Duration::from_secs(20 * 60));

        let removed = registry.sweep(t0 + Duration::from_secs(31 * 60));
        assert_eq!(removed, vec![stale]);
        assert!(matches!(registry.get(stale), Err(ServerError::NotFound(_))));
        assert!(registry.get(fresh).is_ok());
    }

    #[tokio::test]
    async fn swept_entry_stays_usable_for_holders() {
        let registry = registry();
        let id = registry.create(config()).unwrap();
        let held = registry.get(id).unwrap();

        registry.sweep(Instant::now() + Duration::from_secs(3600));
        assert!(!registry.contains(id));

        let mut state = held.lock().await;
        state
            .play(Color::Black, Move::Place(Point::new(0, 0)), Instant::now())
            .unwrap();
    }

    #[tokio::test]
    async fn sweeper_runs_in_background_and_stops() {
        let registry = MatchRegistry::new(ServerConfig {
            match_timeout: Duration::ZERO,
            sweep_interval: Duration::from_millis(20),
            ..ServerConfig::default()
        });
        let id = registry.create(config()).unwrap();
        registry.start_sweeper().await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!registry.contains(id));

        tokio::time::timeout(Duration::from_secs(1), registry.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn zero_sweep_interval_falls_back_to_default() {
        let registry = MatchRegistry::new(ServerConfig {
            sweep_interval: Duration::ZERO,
            ..ServerConfig::default()
        });
        assert_eq!(registry.config().sweep_interval, DEFAULT_SWEEP_INTERVAL);

        registry.start_sweeper().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let running = registry
            .sweeper
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        assert!(running);

        tokio::time::timeout(Duration::from_secs(1), registry.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn refused_closure_does_not_count_as_activity() {
        let registry = registry();
        let id = registry.create(config()).unwrap();
        let entry = registry.get(id).unwrap();
        let before = entry.last_activity();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let err = registry
            .with_match(id, |state| {
                state.play(Color::White, Move::Pass, Instant::now())?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Game(_)));
        assert_eq!(entry.last_activity(), before);

        registry
            .with_match(id, |state| {
                state.play(Color::Black, Move::Pass, Instant::now())?;
                Ok(())
            })
            .await
            .unwrap();
        assert!(entry.last_activity() > before);
    }

    #[tokio::test]
    async fn matches_are_locked_independently() {
        let registry = Arc::new(registry());
        let a = registry.create(config()).unwrap();
        let b = registry.create(config()).unwrap();

        let entry_a = registry.get(a).unwrap();
        let _guard = entry_a.lock().await;

        // b is reachable while a is held.
        let played = tokio::time::timeout(
            Duration::from_secs(1),
            registry.with_match(b, |state| {
                Ok(state.play(Color::Black, Move::Pass, Instant::now()).is_ok())
            }),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(played);
    }
}
