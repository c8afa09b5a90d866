//! # Game Service
//!
//! Entry point for the transport collaborator. Actions arrive here already
//! attributed to an identity; the service resolves the match, checks the
//! caller's seat, applies the action under the match lock and pushes the
//! resulting snapshot to every subscriber of the match.
//!
//! The snapshot is broadcast before the match lock is released, so
//! subscribers always observe updates of one match in the order they were
//! applied.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::fanout::ConnectionFanout;
use crate::ids::{ChannelId, ConnectionId, MatchId};
use crate::protocol::{ClientAction, MatchSnapshot, ServerMessage};
use crate::registry::MatchRegistry;
use goban_rules::{GameError, IllegalMove, MatchConfig, Move, Point};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shared handle used by every connection task.
#[derive(Clone)]
pub struct GameService {
    registry: Arc<MatchRegistry>,
    fanout: Arc<ConnectionFanout>,
}

impl GameService {
    pub fn new(registry: Arc<MatchRegistry>, fanout: Arc<ConnectionFanout>) -> Self {
        Self { registry, fanout }
    }

    /// Builds a service with its own registry and fanout.
    pub fn with_config(config: ServerConfig) -> Self {
        Self::new(
            Arc::new(MatchRegistry::new(config)),
            Arc::new(ConnectionFanout::new()),
        )
    }

    pub fn registry(&self) -> &Arc<MatchRegistry> {
        &self.registry
    }

    pub fn fanout(&self) -> &Arc<ConnectionFanout> {
        &self.fanout
    }

    /// Creates a match from explicit settings and announces it to the lobby.
    pub fn create_match(&self, config: MatchConfig) -> Result<MatchId, ServerError> {
        let black = config.black.clone();
        let white = config.white.clone();
        let match_id = self.registry.create(config)?;
        self.fanout.broadcast(
            &ChannelId::Lobby,
            &ServerMessage::LobbyUpdate {
                data: json!({
                    "event": "match_created",
                    "matchId": match_id,
                    "blackId": black,
                    "whiteId": white,
                }),
            },
            None,
        );
        Ok(match_id)
    }

    /// Creates a match between two identities using the configured defaults.
    pub fn create_default_match(
        &self,
        black: impl Into<String>,
        white: impl Into<String>,
    ) -> Result<MatchId, ServerError> {
        let config = MatchConfig {
            black: black.into(),
            white: white.into(),
            seed: None,
            ..self.registry.config().match_defaults.clone()
        };
        self.create_match(config)
    }

    /// Subscribes a connection to a match and sends it the current snapshot.
    pub async fn join_match(
        &self,
        connection: ConnectionId,
        match_id: MatchId,
        identity: &str,
    ) -> Result<MatchSnapshot, ServerError> {
        let entry = self.registry.get(match_id)?;
        let channel = ChannelId::Match(match_id);
        self.fanout.join(channel.clone(), connection, identity);

        let state = entry.lock().await;
        let snapshot = MatchSnapshot::capture(match_id, &state);
        self.fanout.broadcast(
            &channel,
            &ServerMessage::GameUpdate(snapshot.clone()),
            Some(connection),
        );
        Ok(snapshot)
    }

    /// Applies an action on behalf of `identity`.
    ///
    /// # Arguments
    ///
    /// * `identity` - Verified identity of the caller
    /// * `action` - The decoded action
    ///
    /// # Returns
    ///
    /// The snapshot that was broadcast, or why the action was refused. A
    /// refused action leaves the match unchanged and broadcasts nothing.
    pub async fn handle_action(
        &self,
        identity: &str,
        action: ClientAction,
    ) -> Result<MatchSnapshot, ServerError> {
        let match_id = action.match_id();
        let entry = self.registry.get(match_id)?;
        let mut state = entry.lock().await;

        let color = state.color_of(identity).ok_or_else(|| {
            ServerError::Forbidden(format!("{identity} is not playing in match {match_id}"))
        })?;
        let now = Instant::now();

        match &action {
            ClientAction::Move { x, y, .. } => {
                let mv = match (x, y) {
                    (None, None) => Move::Pass,
                    (Some(x), Some(y)) => Move::Place(wire_point(*x, *y)?),
                    _ => {
                        return Err(ServerError::InvalidAction(
                            "a move needs both coordinates or neither".to_string(),
                        ))
                    }
                };
                let outcome = state.play(color, mv, now)?;
                debug!("{} played {} in {}: {:?}", identity, mv, match_id, outcome);
            }
            ClientAction::Resign { color: claimed, .. } => {
                if *claimed != color {
                    return Err(ServerError::Forbidden(format!(
                        "{identity} plays {color} and cannot resign for {claimed}"
                    )));
                }
                state.resign(color)?;
            }
            ClientAction::MarkDeadStone { x, y, .. } => {
                let point = wire_point(*x, *y)?;
                let dead = state.mark_dead_stone(point, color)?;
                debug!("{} marked {} {} in {}", identity, point, if dead { "dead" } else { "alive" }, match_id);
            }
            ClientAction::ConfirmScoring { .. } => {
                let score = state.finalize_score()?;
                info!("📊 Match {} scored: black {} white {}", match_id, score.black, score.white);
            }
        }
        entry.touch(now);

        let snapshot = MatchSnapshot::capture(match_id, &state);
        let report = self.fanout.broadcast(
            &ChannelId::Match(match_id),
            &ServerMessage::GameUpdate(snapshot.clone()),
            None,
        );
        drop(state);

        debug!(
            "{} for {} delivered to {} subscribers ({} dropped)",
            action.kind(),
            match_id,
            report.delivered,
            report.dropped
        );
        Ok(snapshot)
    }

    /// Applies an action arriving on `connection` and reports refusals back
    /// to that connection as [`ServerMessage::ActionRejected`].
    pub async fn handle_connection_action(
        &self,
        connection: ConnectionId,
        action: ClientAction,
    ) -> Result<MatchSnapshot, ServerError> {
        let match_id = action.match_id();
        let result = match self.fanout.identity(&ChannelId::Match(match_id), connection) {
            Some(identity) => self.handle_action(&identity, action).await,
            None => Err(ServerError::Forbidden(format!(
                "{connection} has not joined match {match_id}"
            ))),
        };

        if let Err(e) = &result {
            warn!("Action from {} rejected: {}", connection, e);
            self.fanout.send_to(
                connection,
                ServerMessage::ActionRejected {
                    match_id: Some(match_id),
                    reason: e.to_string(),
                },
            );
        }
        result
    }

    /// Archival record text for a match.
    pub async fn export_record(&self, match_id: MatchId) -> Result<String, ServerError> {
        let entry = self.registry.get(match_id)?;
        let state = entry.lock().await;
        Ok(state.to_record().to_string())
    }

    /// Deletes a match and closes its channel, notifying every subscriber.
    pub fn remove_match(&self, match_id: MatchId) -> bool {
        self.fanout.close_channel(&ChannelId::Match(match_id));
        self.registry.remove(match_id)
    }

    /// Stops background work and closes every subscription.
    pub async fn shutdown(&self) {
        info!("🛑 Shutting down game service ({} live matches)", self.registry.len());
        self.registry.shutdown().await;
        self.fanout.close_all();
        info!("✅ Game service stopped");
    }
}

fn wire_point(x: i64, y: i64) -> Result<Point, GameError> {
    Point::from_signed(x, y).ok_or(GameError::IllegalMove(IllegalMove::OutOfBounds))
}
