//! # Realtime Module
//!
//! Abstract pub/sub channel the multiplayer session runs on, plus an
//! in-process implementation.
//!
//! A transport hands out named channels. A channel carries typed events
//! (`"chat"`, `"player-action"`, `"combat"`) with a JSON payload and the
//! sender's identity, and tracks presence: the members currently subscribed
//! and their last published metadata. Inbound traffic is drained with
//! [`RealtimeChannel::poll`] in transport order.

pub mod hub;
pub mod metadata;
pub mod session;

pub use hub::*;
pub use metadata::*;
pub use session::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failures reported by a realtime transport.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport cannot be reached
    #[error("realtime transport unavailable")]
    Unavailable,

    /// The operation needs an active subscription
    #[error("channel is not subscribed")]
    NotSubscribed,

    /// The transport refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The channel has been shut down
    #[error("channel closed")]
    Closed,
}

/// Identity attached to a subscription or a publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub user_id: String,
    pub metadata: Value,
}

impl Subscriber {
    pub fn new(user_id: impl Into<String>, metadata: Value) -> Self {
        Self {
            user_id: user_id.into(),
            metadata,
        }
    }
}

/// A message as delivered to subscribers and returned by history queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: String,
    /// Event name, e.g. `"chat"`
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    pub user_id: String,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Epoch milliseconds
    pub timestamp: u64,
}

/// One member of a channel's presence list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMember {
    pub user_id: String,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub joined_at: u64,
    pub last_seen: u64,
}

/// Something that arrived on a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Message(InboundMessage),
    /// Full membership snapshot
    Presence(Vec<PresenceMember>),
}

/// Whether an outbound operation actually reached the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped(SkipReason),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }
}

/// Why an outbound operation was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Chat text was empty or whitespace
    EmptyMessage,
    /// No channel is subscribed
    NotConnected,
}

/// A source of named channels.
pub trait RealtimeTransport {
    type Channel: RealtimeChannel;

    fn channel(&self, name: &str) -> Result<Self::Channel, TransportError>;
}

/// One pub/sub channel handle.
pub trait RealtimeChannel {
    fn name(&self) -> &str;

    /// Joins the channel's presence with `subscriber`'s metadata and starts
    /// receiving events.
    fn subscribe(&mut self, subscriber: Subscriber) -> Result<(), TransportError>;

    fn publish(
        &mut self,
        event_type: &str,
        data: Value,
        sender: &Subscriber,
    ) -> Result<(), TransportError>;

    /// Most recent messages, oldest first.
    fn get_messages(&self, limit: usize) -> Result<Vec<InboundMessage>, TransportError>;

    /// Drains everything received since the last poll.
    fn poll(&mut self) -> Vec<ChannelEvent>;

    fn unsubscribe(&mut self) -> Result<(), TransportError>;
}
