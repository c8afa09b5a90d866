//! # Identifiers
//!
//! Typed identifiers for matches, transport connections and subscription
//! channels.
//!
//! ## Key Types
//!
//! - [`MatchId`] - Random UUID assigned when a match is created
//! - [`ConnectionId`] - Process-unique id handed out per transport connection
//! - [`ChannelId`] - Something a connection can subscribe to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Unique identifier for a live match.
///
/// Wraps a UUID so match ids cannot be confused with other identifiers.
/// Serializes as the bare UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

impl MatchId {
    /// Creates a new random match ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one transport connection.
///
/// Ids come from a process-wide counter and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A subscription channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ChannelId {
    /// Global lobby feed.
    Lobby,
    /// A pre-match room managed by the matchmaking collaborator.
    Room(String),
    /// Live updates for one match.
    Match(MatchId),
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Lobby => write!(f, "lobby"),
            ChannelId::Room(room) => write!(f, "room:{room}"),
            ChannelId::Match(id) => write!(f, "match:{id}"),
        }
    }
}

impl From<MatchId> for ChannelId {
    fn from(id: MatchId) -> Self {
        ChannelId::Match(id)
    }
}
