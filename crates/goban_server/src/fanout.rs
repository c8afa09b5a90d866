//! # Connection Fanout
//!
//! Tracks which connections are subscribed to which channels and delivers
//! [`ServerMessage`]s to them.
//!
//! The transport collaborator registers one unbounded sender per connection
//! and drains the matching receiver into its socket, so sending never blocks
//! the caller. A connection whose receiver is gone is dropped from the
//! channel being broadcast to; delivery to the remaining members continues.
//!
//! ## Tables
//!
//! - channel → ordered members, each a connection id with the identity it
//!   joined as (a connection appears at most once per channel)
//! - connection → outbound sender
//!
//! Identities live inside the channel entry, so the same connection may act
//! under different identities in different channels, and the reconnect
//! check and the insert of a join happen under one shard lock. A channel
//! entry guard is never held while another channel entry is looked up.

use crate::ids::{ChannelId, ConnectionId};
use crate::protocol::ServerMessage;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sending half registered for each connection.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Result of [`ConnectionFanout::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Added to the channel, possibly replacing an older connection with the
    /// same identity.
    Joined { evicted: Option<ConnectionId> },
    /// The connection was already a member; nothing changed.
    AlreadyMember,
}

/// Counts from one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone)]
struct Member {
    connection: ConnectionId,
    identity: String,
}

/// Subscription tables plus per-connection senders.
#[derive(Debug, Default)]
pub struct ConnectionFanout {
    channels: DashMap<ChannelId, Vec<Member>>,
    senders: DashMap<ConnectionId, Outbound>,
}

impl ConnectionFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the outbound sender of a new transport connection.
    pub fn register(&self, connection: ConnectionId, sender: Outbound) {
        self.senders.insert(connection, sender);
        debug!("Registered outbound sender for {}", connection);
    }

    /// Subscribes `connection` to `channel` as `identity`.
    ///
    /// If another connection with the same identity is already in the
    /// channel (a refreshed tab, a reconnect) it is evicted first. Joining
    /// again with the same connection is a no-op so clients may retry.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel to join
    /// * `connection` - Joining connection
    /// * `identity` - Display identity the connection acts as in this channel
    ///
    /// # Returns
    ///
    /// Whether the connection was added and which connection, if any, it replaced.
    pub fn join(
        &self,
        channel: ChannelId,
        connection: ConnectionId,
        identity: impl Into<String>,
    ) -> JoinOutcome {
        let identity = identity.into();
        let evicted = {
            let mut members = self.channels.entry(channel.clone()).or_default();
            if members.iter().any(|m| m.connection == connection) {
                return JoinOutcome::AlreadyMember;
            }
            let stale = members
                .iter()
                .find(|m| m.identity == identity)
                .map(|m| m.connection);
            if let Some(old) = stale {
                members.retain(|m| m.connection != old);
            }
            members.push(Member {
                connection,
                identity: identity.clone(),
            });
            stale
        };

        match evicted {
            Some(old) => info!("🔁 {} replaced {} as {} in {}", connection, old, identity, channel),
            None => debug!("{} joined {} as {}", connection, channel, identity),
        }
        JoinOutcome::Joined { evicted }
    }

    /// Unsubscribes `connection` from `channel`.
    ///
    /// When this empties the channel it is deleted and a
    /// [`ServerMessage::ChannelClosed`] notice goes to the leaving connection
    /// and, for non-lobby channels, to the lobby.
    ///
    /// # Returns
    ///
    /// `true` if the connection was a member.
    pub fn leave(&self, channel: &ChannelId, connection: ConnectionId) -> bool {
        let (was_member, emptied) = match self.channels.get_mut(channel) {
            Some(mut members) => {
                let before = members.len();
                members.retain(|m| m.connection != connection);
                (members.len() != before, members.is_empty())
            }
            None => (false, false),
        };
        if !was_member {
            return false;
        }

        if emptied && self.channels.remove_if(channel, |_, members| members.is_empty()).is_some() {
            info!("📪 Channel {} closed", channel);
            let notice = ServerMessage::ChannelClosed {
                channel: channel.clone(),
            };
            self.send_to(connection, notice.clone());
            self.notify_lobby(channel, &notice);
        }
        true
    }

    /// Deletes `channel` and sends every member a
    /// [`ServerMessage::ChannelClosed`] notice. Non-lobby closures are also
    /// announced to the lobby.
    ///
    /// # Returns
    ///
    /// How many members were notified.
    pub fn close_channel(&self, channel: &ChannelId) -> usize {
        let Some((channel, members)) = self.channels.remove(channel) else {
            return 0;
        };
        let notice = ServerMessage::ChannelClosed {
            channel: channel.clone(),
        };
        let notified = members
            .iter()
            .filter(|m| self.send_to(m.connection, notice.clone()))
            .count();
        self.notify_lobby(&channel, &notice);
        info!("📪 Channel {} closed ({} members notified)", channel, notified);
        notified
    }

    /// Removes a closed connection from every channel and forgets it.
    ///
    /// Channels emptied this way are deleted without notice.
    pub fn disconnect_all(&self, connection: ConnectionId) {
        let mut emptied = Vec::new();
        for mut entry in self.channels.iter_mut() {
            let before = entry.len();
            entry.retain(|m| m.connection != connection);
            if entry.len() != before && entry.is_empty() {
                emptied.push(entry.key().clone());
            }
        }
        for channel in &emptied {
            self.channels.remove_if(channel, |_, members| members.is_empty());
        }

        self.senders.remove(&connection);
        debug!("{} disconnected, {} channels emptied", connection, emptied.len());
    }

    /// Delivers `message` to every member of `channel`, or only to `target`.
    ///
    /// A target that is not a member receives nothing. Members whose
    /// delivery fails are removed from the channel.
    pub fn broadcast(
        &self,
        channel: &ChannelId,
        message: &ServerMessage,
        target: Option<ConnectionId>,
    ) -> DeliveryReport {
        let recipients: Vec<ConnectionId> = match self.channels.get(channel) {
            Some(members) => members
                .iter()
                .map(|m| m.connection)
                .filter(|member| target.map_or(true, |t| t == *member))
                .collect(),
            None => {
                debug!("Broadcast to empty channel {}", channel);
                return DeliveryReport::default();
            }
        };

        let mut report = DeliveryReport::default();
        for connection in recipients {
            if self.send_to(connection, message.clone()) {
                report.delivered += 1;
            } else {
                report.dropped += 1;
                warn!("⚠️ Delivery to {} failed, dropping it from {}", connection, channel);
                self.drop_member(channel, connection);
            }
        }
        report
    }

    /// Sends directly to one connection regardless of channel membership.
    pub fn send_to(&self, connection: ConnectionId, message: ServerMessage) -> bool {
        match self.senders.get(&connection) {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Current members of `channel`, in join order.
    pub fn members(&self, channel: &ChannelId) -> Vec<ConnectionId> {
        self.channels
            .get(channel)
            .map(|members| members.iter().map(|m| m.connection).collect())
            .unwrap_or_default()
    }

    /// Identity `connection` joined `channel` as.
    pub fn identity(&self, channel: &ChannelId, connection: ConnectionId) -> Option<String> {
        self.channels.get(channel).and_then(|members| {
            members
                .iter()
                .find(|m| m.connection == connection)
                .map(|m| m.identity.clone())
        })
    }

    pub fn is_member(&self, channel: &ChannelId, connection: ConnectionId) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|members| members.iter().any(|m| m.connection == connection))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Tells every subscriber its channels are gone and clears all tables.
    pub fn close_all(&self) {
        let channels: Vec<ChannelId> = self.channels.iter().map(|e| e.key().clone()).collect();
        for channel in channels {
            if let Some((channel, members)) = self.channels.remove(&channel) {
                for member in members {
                    self.send_to(
                        member.connection,
                        ServerMessage::ChannelClosed {
                            channel: channel.clone(),
                        },
                    );
                }
            }
        }
        self.senders.clear();
    }

    fn notify_lobby(&self, channel: &ChannelId, notice: &ServerMessage) {
        if *channel != ChannelId::Lobby {
            self.broadcast(&ChannelId::Lobby, notice, None);
        }
    }

    fn drop_member(&self, channel: &ChannelId, connection: ConnectionId) {
        if let Some(mut members) = self.channels.get_mut(channel) {
            members.retain(|m| m.connection != connection);
        }
        self.channels.remove_if(channel, |_, members| members.is_empty());
        if self
            .senders
            .get(&connection)
            .is_some_and(|sender| sender.is_closed())
        {
            self.senders.remove(&connection);
        }
    }
}
