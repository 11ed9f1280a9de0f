//! # Local Hub
//!
//! In-process [`RealtimeTransport`]. Every clone of a [`LocalHub`] shares the
//! same channels, so several sessions in one process see each other exactly
//! as they would over a network service.
//!
//! Each channel keeps its presence list in join order, a bounded message
//! history and a `tokio::sync::broadcast` fan-out. Receivers are drained
//! with `try_recv`, so no async runtime is needed.

use super::{
    ChannelEvent, InboundMessage, PresenceMember, RealtimeChannel, RealtimeTransport, Subscriber,
    TransportError,
};
use crate::{new_id, now_millis};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Messages retained per channel for history queries
pub const HUB_HISTORY_LIMIT: usize = 200;

/// Events buffered per receiver before it starts lagging
const FANOUT_CAPACITY: usize = 256;

#[derive(Debug)]
struct ChannelState {
    members: Vec<PresenceMember>,
    history: VecDeque<InboundMessage>,
    sender: broadcast::Sender<ChannelEvent>,
}

impl ChannelState {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(FANOUT_CAPACITY);
        Self {
            members: Vec::new(),
            history: VecDeque::new(),
            sender,
        }
    }

    fn broadcast_presence(&self) {
        // No receivers left is fine: nobody needs the snapshot
        let _ = self.sender.send(ChannelEvent::Presence(self.members.clone()));
    }
}

#[derive(Debug)]
struct HubState {
    available: bool,
    history_limit: usize,
    channels: HashMap<String, ChannelState>,
}

/// Shared in-memory pub/sub service.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use shadowrealm::{ChannelEvent, LocalHub, RealtimeChannel, RealtimeTransport, Subscriber};
///
/// let hub = LocalHub::new();
/// let mut channel = hub.channel("mmo-world").unwrap();
/// let me = Subscriber::new("user-1", json!({ "characterName": "Ayla" }));
/// channel.subscribe(me.clone()).unwrap();
/// channel.publish("chat", json!({ "text": "hi" }), &me).unwrap();
///
/// let events = channel.poll();
/// assert!(matches!(events[0], ChannelEvent::Presence(_)));
/// assert!(matches!(&events[1], ChannelEvent::Message(m) if m.event_type == "chat"));
/// ```
#[derive(Debug, Clone)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::with_history_limit(HUB_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                available: true,
                history_limit,
                channels: HashMap::new(),
            })),
        }
    }

    /// Takes the hub offline (`false`) or brings it back. While offline
    /// every operation fails with [`TransportError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
        info!(
            "Local hub is now {}",
            if available { "available" } else { "unavailable" }
        );
    }

    pub fn is_available(&self) -> bool {
        self.lock().available
    }

    /// Current presence list of a channel.
    pub fn members(&self, channel: &str) -> Vec<PresenceMember> {
        self.lock()
            .channels
            .get(channel)
            .map(|state| state.members.clone())
            .unwrap_or_default()
    }

    /// Number of messages retained on a channel.
    pub fn history_len(&self, channel: &str) -> usize {
        self.lock()
            .channels
            .get(channel)
            .map_or(0, |state| state.history.len())
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // A panic while holding the lock cannot leave the maps half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the hub if it is reachable.
    fn reachable(&self) -> Result<MutexGuard<'_, HubState>, TransportError> {
        let state = self.lock();
        if state.available {
            Ok(state)
        } else {
            Err(TransportError::Unavailable)
        }
    }
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeTransport for LocalHub {
    type Channel = LocalChannel;

    fn channel(&self, name: &str) -> Result<LocalChannel, TransportError> {
        self.reachable()?
            .channels
            .entry(name.to_string())
            .or_insert_with(ChannelState::new);
        Ok(LocalChannel {
            hub: self.clone(),
            name: name.to_string(),
            user_id: None,
            receiver: None,
        })
    }
}

/// A handle on one channel of a [`LocalHub`]. Dropping it leaves the
/// channel.
#[derive(Debug)]
pub struct LocalChannel {
    hub: LocalHub,
    name: String,
    user_id: Option<String>,
    receiver: Option<broadcast::Receiver<ChannelEvent>>,
}

impl LocalChannel {
    pub fn is_subscribed(&self) -> bool {
        self.receiver.is_some()
    }
}

impl RealtimeChannel for LocalChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscribe(&mut self, subscriber: Subscriber) -> Result<(), TransportError> {
        if self.is_subscribed() {
            self.unsubscribe()?;
        }

        let mut hub = self.hub.reachable()?;
        let channel = hub
            .channels
            .entry(self.name.clone())
            .or_insert_with(ChannelState::new);

        // Subscribe before announcing so the new member sees its own join
        let receiver = channel.sender.subscribe();
        let now = now_millis();
        let member = PresenceMember {
            user_id: subscriber.user_id.clone(),
            metadata: Some(subscriber.metadata),
            joined_at: now,
            last_seen: now,
        };
        // Presence is keyed by user: a second join replaces the first
        match channel
            .members
            .iter_mut()
            .find(|m| m.user_id == member.user_id)
        {
            Some(existing) => *existing = member,
            None => channel.members.push(member),
        }
        channel.broadcast_presence();
        debug!(
            "{} joined {} ({} present)",
            subscriber.user_id,
            self.name,
            channel.members.len()
        );
        drop(hub);

        self.user_id = Some(subscriber.user_id);
        self.receiver = Some(receiver);
        Ok(())
    }

    fn publish(
        &mut self,
        event_type: &str,
        data: Value,
        sender: &Subscriber,
    ) -> Result<(), TransportError> {
        if !self.is_subscribed() {
            return Err(TransportError::NotSubscribed);
        }
        let mut hub = self.hub.reachable()?;
        let limit = hub.history_limit;
        let channel = hub
            .channels
            .get_mut(&self.name)
            .ok_or(TransportError::Closed)?;

        let message = InboundMessage {
            id: new_id("msg"),
            event_type: event_type.to_string(),
            data,
            user_id: sender.user_id.clone(),
            metadata: Some(sender.metadata.clone()),
            timestamp: now_millis(),
        };
        if let Some(member) = channel
            .members
            .iter_mut()
            .find(|m| m.user_id == sender.user_id)
        {
            member.last_seen = message.timestamp;
        }

        channel.history.push_back(message.clone());
        while channel.history.len() > limit {
            channel.history.pop_front();
        }
        let _ = channel.sender.send(ChannelEvent::Message(message));
        Ok(())
    }

    fn get_messages(&self, limit: usize) -> Result<Vec<InboundMessage>, TransportError> {
        let hub = self.hub.reachable()?;
        let history = hub
            .channels
            .get(&self.name)
            .map(|channel| &channel.history);
        Ok(history
            .map(|history| {
                let skip = history.len().saturating_sub(limit);
                history.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default())
    }

    fn poll(&mut self) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        let Some(receiver) = self.receiver.as_mut() else {
            return events;
        };
        loop {
            match receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Dropped {} events on {}: receiver lagged", skipped, self.name);
                    continue;
                }
                Err(TryRecvError::Closed) => {
                    warn!("Channel {} closed", self.name);
                    self.receiver = None;
                    break;
                }
            }
        }
        events
    }

    fn unsubscribe(&mut self) -> Result<(), TransportError> {
        let Some(user_id) = self.user_id.take() else {
            return Ok(());
        };
        self.receiver = None;

        let mut hub = self.hub.reachable()?;
        if let Some(channel) = hub.channels.get_mut(&self.name) {
            channel.members.retain(|m| m.user_id != user_id);
            channel.broadcast_presence();
            debug!(
                "{} left {} ({} present)",
                user_id,
                self.name,
                channel.members.len()
            );
        }
        Ok(())
    }
}

impl Drop for LocalChannel {
    fn drop(&mut self) {
        if let Err(e) = self.unsubscribe() {
            debug!("Leaving {} on drop failed: {}", self.name, e);
        }
    }
}
