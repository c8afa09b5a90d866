//! # Goban Server
//!
//! Hosting layer for live Go matches: a concurrent registry of matches with
//! background expiry, a subscription fanout that pushes match snapshots to
//! connected viewers, and a service that turns player actions into rule
//! operations.
//!
//! ## Architecture
//!
//! ```text
//! transport ──ClientAction──▶ GameService ──▶ MatchRegistry ──▶ Match (locked)
//!                                   │
//!                                   └──GameUpdate──▶ ConnectionFanout ──▶ connections
//! ```
//!
//! No part of this crate opens sockets. The transport collaborator registers
//! an outbound channel per connection with [`ConnectionFanout::register`],
//! decodes inbound JSON with [`ClientAction::from_json`] and calls
//! [`GameService::handle_connection_action`].

pub mod config;
pub mod error;
pub mod fanout;
pub mod ids;
pub mod protocol;
pub mod registry;
pub mod service;

pub use config::{ServerConfig, DEFAULT_MATCH_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
pub use error::ServerError;
pub use fanout::{ConnectionFanout, DeliveryReport, JoinOutcome, Outbound};
pub use ids::{ChannelId, ConnectionId, MatchId};
pub use protocol::{ClientAction, ClockView, MatchSnapshot, ScoringData, ServerMessage};
pub use registry::{MatchEntry, MatchRegistry};
pub use service::GameService;
