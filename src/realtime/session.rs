//! # Multiplayer Session
//!
//! Joins the shared world channel for the local player and projects what
//! arrives on it: the online player list (rebuilt from every presence
//! snapshot) and the bounded chat history.
//!
//! Outbound operations never apply their effect locally. A chat message
//! shows up in [`MultiplayerSession::chat`] only once the transport echoes
//! it back through [`MultiplayerSession::poll`].

use super::metadata::{
    action_sender_metadata, chat_sender_metadata, player_from_member, stats_sender_metadata,
    PresenceMetadata,
};
use super::{
    ChannelEvent, Delivery, InboundMessage, PresenceMember, RealtimeChannel, RealtimeTransport,
    SkipReason, Subscriber, TransportError,
};
use crate::{
    config, now_millis, CharacterStore, ChatChannel, ChatHistory, ChatMessage, KeyValueStore,
    Player, RealmError, RealmResult, StatsUpdate, WorldBounds,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Event names used on the world channel.
pub mod events {
    pub const CHAT: &str = "chat";
    pub const PLAYER_ACTION: &str = "player-action";
    pub const COMBAT: &str = "combat";
}

/// Tunables for a [`MultiplayerSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub channel_name: String,
    /// Chat messages kept locally and fetched on connect
    pub history_limit: usize,
    pub world_bounds: WorldBounds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_name: config::DEFAULT_CHANNEL.to_string(),
            history_limit: config::CHAT_HISTORY_LIMIT,
            world_bounds: WorldBounds::default(),
        }
    }
}

impl SessionConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> RealmResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RealmResult<()> {
        if !self.world_bounds.is_valid() {
            return Err(RealmError::InvalidState(format!(
                "world bounds must be finite and non-negative, got {} x {}",
                self.world_bounds.width, self.world_bounds.height
            )));
        }
        Ok(())
    }
}

/// What [`MultiplayerSession::poll`] observed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ChatReceived(ChatMessage),
    PlayerAction { user_id: String, data: Value },
    CombatSignal { user_id: String, data: Value },
    /// The online list was replaced; carries the new size
    PresenceChanged { online: usize },
}

/// Converts a `chat` event into a [`ChatMessage`].
pub fn chat_message_from(message: &InboundMessage) -> ChatMessage {
    let meta = message.metadata.as_ref();
    let meta_str = |key: &str| {
        meta.and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let data_str = |key: &str| message.data.get(key).and_then(Value::as_str);

    ChatMessage {
        id: message.id.clone(),
        player_id: meta_str("playerId").unwrap_or_else(|| message.user_id.clone()),
        player_name: meta_str("characterName").unwrap_or_else(|| "Unknown".to_string()),
        message: data_str("text").unwrap_or_default().to_string(),
        channel: data_str("channel").map(ChatChannel::parse).unwrap_or_default(),
        target_player_id: data_str("targetPlayerId").map(str::to_string),
        created_at: message.timestamp,
    }
}

/// The local player's presence on the shared world channel.
///
/// # Examples
///
/// ```
/// use shadowrealm::{
///     CharacterClass, CharacterDraft, ChatChannel, LocalHub, MemoryStore, MultiplayerSession,
///     Player,
/// };
///
/// let player = Player::create("user-1", CharacterDraft::new("Ayla", CharacterClass::Healer), 0).unwrap();
/// let mut session = MultiplayerSession::new(LocalHub::new(), MemoryStore::new(), player);
/// session.connect("mmo-world").unwrap();
/// assert!(session.is_connected());
///
/// session.send_chat_message("hello", ChatChannel::Global).unwrap();
/// assert!(session.chat().is_empty());
/// session.poll();
/// assert_eq!(session.chat().last().unwrap().message, "hello");
/// assert_eq!(session.online_players().len(), 1);
/// ```
pub struct MultiplayerSession<T: RealtimeTransport, S: KeyValueStore> {
    transport: T,
    characters: CharacterStore<S>,
    config: SessionConfig,
    player: Player,
    channel: Option<T::Channel>,
    /// `(player id, channel name)` of the live subscription
    subscription: Option<(String, String)>,
    is_connected: bool,
    online_players: Vec<Player>,
    chat: ChatHistory,
}

impl<T: RealtimeTransport, S: KeyValueStore> MultiplayerSession<T, S> {
    pub fn new(transport: T, store: S, player: Player) -> Self {
        Self::with_config(transport, store, player, SessionConfig::default())
    }

    pub fn with_config(transport: T, store: S, player: Player, config: SessionConfig) -> Self {
        Self {
            transport,
            characters: CharacterStore::new(store),
            chat: ChatHistory::with_capacity(config.history_limit),
            config,
            player,
            channel: None,
            subscription: None,
            is_connected: false,
            online_players: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn online_players(&self) -> &[Player] {
        &self.online_players
    }

    pub fn chat(&self) -> &ChatHistory {
        &self.chat
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn characters(&self) -> &CharacterStore<S> {
        &self.characters
    }

    /// Name of the subscribed channel, if any.
    pub fn channel_name(&self) -> Option<&str> {
        self.subscription.as_ref().map(|(_, name)| name.as_str())
    }

    /// Joins `channel_name`, leaving any other channel first.
    ///
    /// Calling it again for the same player and channel while connected does
    /// nothing. On failure the session is left disconnected; the caller may
    /// keep playing offline.
    pub fn connect(&mut self, channel_name: &str) -> RealmResult<()> {
        let key = (self.player.id.clone(), channel_name.to_string());
        if self.is_connected && self.subscription.as_ref() == Some(&key) {
            debug!("Already connected to {}", channel_name);
            return Ok(());
        }
        self.release_channel();

        match self.open(channel_name) {
            Ok((channel, history)) => {
                let chat_history = history
                    .iter()
                    .filter(|m| m.event_type == events::CHAT)
                    .map(chat_message_from);
                self.chat.clear();
                self.chat.extend(chat_history);
                self.channel = Some(channel);
                self.subscription = Some(key);
                self.is_connected = true;
                info!(
                    "{} connected to {} ({} chat messages loaded)",
                    self.player.character_name,
                    channel_name,
                    self.chat.len()
                );
                Ok(())
            }
            Err(e) => {
                self.subscription = None;
                self.is_connected = false;
                warn!("Failed to connect to {}: {}", channel_name, e);
                Err(e.into())
            }
        }
    }

    fn open(&self, channel_name: &str) -> Result<(T::Channel, Vec<InboundMessage>), TransportError> {
        let mut channel = self.transport.channel(channel_name)?;
        channel.subscribe(self.presence_subscriber())?;
        match channel.get_messages(self.config.history_limit) {
            Ok(history) => Ok((channel, history)),
            Err(e) => {
                let _ = channel.unsubscribe();
                Err(e)
            }
        }
    }

    /// Leaves the channel. Other players learn about it from presence only.
    pub fn disconnect(&mut self) {
        if let Some((_, name)) = &self.subscription {
            info!("{} leaving {}", self.player.character_name, name);
        }
        self.release_channel();
        self.subscription = None;
        self.is_connected = false;
    }

    fn release_channel(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.unsubscribe() {
                warn!("Failed to unsubscribe from {}: {}", channel.name(), e);
            }
        }
    }

    /// Publishes a chat message. Empty text is not sent.
    pub fn send_chat_message(&mut self, text: &str, channel: ChatChannel) -> RealmResult<Delivery> {
        if text.trim().is_empty() {
            return Ok(Delivery::Skipped(SkipReason::EmptyMessage));
        }
        let data = json!({
            "text": text,
            "channel": channel.as_str(),
            "timestamp": now_millis(),
        });
        let sender = self.sender(chat_sender_metadata(&self.player));
        self.publish(events::CHAT, data, &sender)
    }

    /// Moves the local player, saves the character and broadcasts the move.
    ///
    /// The position is clamped into the world bounds. Moving and saving
    /// happen even while disconnected.
    pub fn update_player_position(&mut self, x: f64, y: f64) -> RealmResult<Delivery> {
        let pos = self.player.set_position(x, y, &self.config.world_bounds);
        self.player.last_seen = now_millis();
        self.characters.save_best_effort(&self.player);

        let data = json!({
            "action": "move",
            "positionX": pos.x,
            "positionY": pos.y,
            "timestamp": now_millis(),
        });
        let sender = self.presence_subscriber();
        self.publish(events::PLAYER_ACTION, data, &sender)
    }

    /// Announces a skill use. Nothing is validated locally.
    pub fn use_skill(&mut self, skill_id: &str, target_id: Option<&str>) -> RealmResult<Delivery> {
        let mut data = json!({
            "action": "skill",
            "skillId": skill_id,
            "timestamp": now_millis(),
        });
        if let Some(target) = target_id {
            data["targetId"] = json!(target);
        }
        let sender = self.sender(action_sender_metadata(&self.player));
        self.publish(events::PLAYER_ACTION, data, &sender)
    }

    /// Applies a partial stats change locally, saves it and broadcasts the
    /// changed fields.
    pub fn update_player_stats(&mut self, stats: StatsUpdate) -> RealmResult<Delivery> {
        self.player.apply_stats(&stats);
        self.player.last_seen = now_millis();
        self.characters.save_best_effort(&self.player);

        // Broadcast what was stored, not what was asked for
        let stats = StatsUpdate {
            health: stats.health.map(|_| self.player.health),
            mana: stats.mana.map(|_| self.player.mana),
            level: stats.level.map(|_| self.player.level),
        };

        let data = json!({
            "action": "stats-update",
            "stats": serde_json::to_value(stats)?,
            "timestamp": now_millis(),
        });
        let sender = self.sender(stats_sender_metadata(&self.player, &stats));
        self.publish(events::PLAYER_ACTION, data, &sender)
    }

    /// Challenges another player. This is a signal only; no combat state
    /// is created.
    pub fn initiate_combat(&mut self, target_player_id: &str) -> RealmResult<Delivery> {
        let data = json!({
            "action": "initiate",
            "attackerId": self.player.id,
            "defenderId": target_player_id,
            "timestamp": now_millis(),
        });
        let sender = self.sender(action_sender_metadata(&self.player));
        self.publish(events::COMBAT, data, &sender)
    }

    /// Drains the channel and applies everything that arrived, in order.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let inbound = match self.channel.as_mut() {
            Some(channel) => channel.poll(),
            None => return Vec::new(),
        };
        inbound
            .into_iter()
            .filter_map(|event| match event {
                ChannelEvent::Message(message) => self.on_message(message),
                ChannelEvent::Presence(members) => Some(self.on_presence(&members)),
            })
            .collect()
    }

    fn on_message(&mut self, message: InboundMessage) -> Option<SessionEvent> {
        match message.event_type.as_str() {
            events::CHAT => {
                let chat = chat_message_from(&message);
                debug!("[{}] {}: {}", chat.channel.as_str(), chat.player_name, chat.message);
                self.chat.push(chat.clone());
                Some(SessionEvent::ChatReceived(chat))
            }
            events::PLAYER_ACTION => {
                debug!("Player action from {}: {}", message.user_id, message.data);
                Some(SessionEvent::PlayerAction {
                    user_id: message.user_id,
                    data: message.data,
                })
            }
            events::COMBAT => {
                debug!("Combat signal from {}: {}", message.user_id, message.data);
                Some(SessionEvent::CombatSignal {
                    user_id: message.user_id,
                    data: message.data,
                })
            }
            other => {
                debug!("Ignoring unknown event {:?}", other);
                None
            }
        }
    }

    fn on_presence(&mut self, members: &[PresenceMember]) -> SessionEvent {
        self.online_players = members.iter().map(player_from_member).collect();
        debug!("{} players online", self.online_players.len());
        SessionEvent::PresenceChanged {
            online: self.online_players.len(),
        }
    }

    fn sender(&self, metadata: Value) -> Subscriber {
        Subscriber::new(self.player.user_id.clone(), metadata)
    }

    fn presence_subscriber(&self) -> Subscriber {
        self.sender(PresenceMetadata::from_player(&self.player).to_value())
    }

    fn publish(&mut self, event_type: &str, data: Value, sender: &Subscriber) -> RealmResult<Delivery> {
        let Some(channel) = self.channel.as_mut() else {
            return Ok(Delivery::Skipped(SkipReason::NotConnected));
        };
        match channel.publish(event_type, data, sender) {
            Ok(()) => Ok(Delivery::Sent),
            Err(e) => {
                warn!("Failed to publish {}: {}", event_type, e);
                self.is_connected = false;
                Err(e.into())
            }
        }
    }
}

impl<T: RealtimeTransport, S: KeyValueStore> Drop for MultiplayerSession<T, S> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharacterClass, CharacterDraft, LocalHub, MemoryStore, RealmError};
    use std::sync::Arc;

    type LocalSession = MultiplayerSession<LocalHub, Arc<MemoryStore>>;

    fn player(user: &str, name: &str) -> Player {
        Player::create(user, CharacterDraft::new(name, CharacterClass::Dps), 0).unwrap()
    }

    fn session(hub: &LocalHub, user: &str, name: &str) -> LocalSession {
        MultiplayerSession::new(hub.clone(), Arc::new(MemoryStore::new()), player(user, name))
    }

    #[test]
    fn test_chat_arrives_only_through_transport() {
        let hub = LocalHub::new();
        let mut ayla = session(&hub, "u1", "Ayla");
        let mut brakka = session(&hub, "u2", "Brakka");
        ayla.connect("mmo-world").unwrap();
        brakka.connect("mmo-world").unwrap();

        let delivery = ayla.send_chat_message("well met", ChatChannel::Global).unwrap();
        assert_eq!(delivery, Delivery::Sent);
        assert!(ayla.chat().is_empty());

        ayla.poll();
        brakka.poll();
        for s in [&ayla, &brakka] {
            let last = s.chat().last().unwrap();
            assert_eq!(last.message, "well met");
            assert_eq!(last.player_name, "Ayla");
            assert_eq!(last.player_id, ayla.player().id);
        }
    }

    #[test]
    fn test_empty_chat_is_skipped() {
        let hub = LocalHub::new();
        let mut s = session(&hub, "u1", "Ayla");
        s.connect("mmo-world").unwrap();
        let delivery = s.send_chat_message("   ", ChatChannel::Global).unwrap();
        assert_eq!(delivery, Delivery::Skipped(SkipReason::EmptyMessage));
        assert_eq!(hub.history_len("mmo-world"), 0);
    }

    #[test]
    fn test_send_without_channel_is_skipped() {
        let hub = LocalHub::new();
        let mut s = session(&hub, "u1", "Ayla");
        let delivery = s.send_chat_message("hello", ChatChannel::Guild).unwrap();
        assert_eq!(delivery, Delivery::Skipped(SkipReason::NotConnected));
    }

    #[test]
    fn test_presence_replaces_online_list() {
        let hub = LocalHub::new();
        let mut a = session(&hub, "u1", "Ayla");
        let mut b = session(&hub, "u2", "Brakka");
        a.connect("mmo-world").unwrap();
        b.connect("mmo-world").unwrap();
        a.poll();
        assert_eq!(a.online_players().len(), 2);

        b.disconnect();
        let events = a.poll();
        assert_eq!(events, vec![SessionEvent::PresenceChanged { online: 1 }]);
        assert_eq!(a.online_players()[0].character_name, "Ayla");
    }

    #[test]
    fn test_connect_failure_leaves_session_offline() {
        let hub = LocalHub::new();
        hub.set_available(false);
        let mut s = session(&hub, "u1", "Ayla");
        let result = s.connect("mmo-world");
        assert!(matches!(
            result,
            Err(RealmError::Transport(TransportError::Unavailable))
        ));
        assert!(!s.is_connected());

        hub.set_available(true);
        s.connect("mmo-world").unwrap();
        assert!(s.is_connected());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let hub = LocalHub::new();
        let mut s = session(&hub, "u1", "Ayla");
        s.connect("mmo-world").unwrap();
        s.poll();
        s.connect("mmo-world").unwrap();
        assert!(s.poll().is_empty());
        assert_eq!(hub.members("mmo-world").len(), 1);
    }

    #[test]
    fn test_switching_channels_leaves_the_old_one() {
        let hub = LocalHub::new();
        let mut s = session(&hub, "u1", "Ayla");
        s.connect("mmo-world").unwrap();
        s.connect("guild-hall").unwrap();
        assert!(hub.members("mmo-world").is_empty());
        assert_eq!(hub.members("guild-hall").len(), 1);
        assert_eq!(s.channel_name(), Some("guild-hall"));
    }

    #[test]
    fn test_history_loaded_on_connect() {
        let hub = LocalHub::new();
        let mut a = session(&hub, "u1", "Ayla");
        a.connect("mmo-world").unwrap();
        a.send_chat_message("first", ChatChannel::Global).unwrap();
        a.use_skill("fireball", None).unwrap();
        a.send_chat_message("second", ChatChannel::Faction).unwrap();

        let mut late = session(&hub, "u2", "Late");
        late.connect("mmo-world").unwrap();
        let texts: Vec<&str> = late.chat().iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
        assert_eq!(late.chat().last().unwrap().channel, ChatChannel::Faction);
    }

    #[test]
    fn test_position_is_clamped_and_saved() {
        let hub = LocalHub::new();
        let store = Arc::new(MemoryStore::new());
        let mut s = MultiplayerSession::new(hub.clone(), store.clone(), player("u1", "Ayla"));

        let delivery = s.update_player_position(-50.0, 9_000.0).unwrap();
        assert_eq!(delivery, Delivery::Skipped(SkipReason::NotConnected));
        assert_eq!((s.player().position_x, s.player().position_y), (0.0, 600.0));

        let saved = CharacterStore::new(store).load("u1").unwrap().unwrap();
        assert_eq!(saved.position_y, 600.0);
    }

    #[test]
    fn test_move_is_broadcast_with_full_metadata() {
        let hub = LocalHub::new();
        let mut a = session(&hub, "u1", "Ayla");
        let mut b = session(&hub, "u2", "Brakka");
        a.connect("mmo-world").unwrap();
        b.connect("mmo-world").unwrap();
        b.poll();

        a.update_player_position(120.0, 80.0).unwrap();
        let events = b.poll();
        let SessionEvent::PlayerAction { user_id, data } = &events[0] else {
            panic!("expected a player action");
        };
        assert_eq!(user_id, "u1");
        assert_eq!(data["action"], "move");
        assert_eq!(data["positionX"], 120.0);
        assert_eq!(hub.members("mmo-world").len(), 2);
    }

    #[test]
    fn test_stats_update_applies_and_persists() {
        let hub = LocalHub::new();
        let store = Arc::new(MemoryStore::new());
        let mut s = MultiplayerSession::new(hub, store.clone(), player("u1", "Ayla"));
        s.connect("mmo-world").unwrap();
        s.poll();

        s.update_player_stats(StatsUpdate { health: Some(40), mana: None, level: Some(2) })
            .unwrap();
        assert_eq!(s.player().health, 40);
        assert_eq!(s.player().level, 2);

        let events = s.poll();
        let SessionEvent::PlayerAction { data, .. } = &events[0] else {
            panic!("expected a player action");
        };
        assert_eq!(data["stats"], json!({ "health": 40, "level": 2 }));
        let saved = CharacterStore::new(store).load("u1").unwrap().unwrap();
        assert_eq!(saved.health, 40);
    }

    #[test]
    fn test_stats_broadcast_matches_stored_values() {
        let hub = LocalHub::new();
        let mut s = session(&hub, "u1", "Ayla");
        s.connect("mmo-world").unwrap();
        s.poll();

        s.update_player_stats(StatsUpdate { health: Some(5000), mana: None, level: Some(0) })
            .unwrap();
        assert_eq!(s.player().health, 100);
        assert_eq!(s.player().level, 1);

        let events = s.poll();
        let SessionEvent::PlayerAction { data, .. } = &events[0] else {
            panic!("expected a player action");
        };
        assert_eq!(data["stats"], json!({ "health": 100, "level": 1 }));
    }

    #[test]
    fn test_invalid_world_bounds_rejected() {
        let mut config = SessionConfig::default();
        assert!(config.validate().is_ok());
        config.world_bounds = WorldBounds::new(-1.0, 600.0);
        assert!(matches!(config.validate(), Err(RealmError::InvalidState(_))));
        config.world_bounds = WorldBounds::new(800.0, f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_bounds_do_not_panic_on_move() {
        let hub = LocalHub::new();
        let config = SessionConfig {
            world_bounds: WorldBounds::new(-1.0, 600.0),
            ..SessionConfig::default()
        };
        let mut s = MultiplayerSession::with_config(
            hub,
            Arc::new(MemoryStore::new()),
            player("u1", "Ayla"),
            config,
        );
        s.update_player_position(10.0, 10.0).unwrap();
        assert_eq!(s.player().position_x, 0.0);
        assert_eq!(s.player().position_y, 10.0);
    }

    #[test]
    fn test_combat_signal_changes_nothing() {
        let hub = LocalHub::new();
        let mut a = session(&hub, "u1", "Ayla");
        let mut b = session(&hub, "u2", "Brakka");
        a.connect("mmo-world").unwrap();
        b.connect("mmo-world").unwrap();
        b.poll();

        let defender = b.player().id.clone();
        a.initiate_combat(&defender).unwrap();
        let events = b.poll();
        let SessionEvent::CombatSignal { data, .. } = &events[0] else {
            panic!("expected a combat signal");
        };
        assert_eq!(data["defenderId"], json!(defender));
        assert_eq!(b.player().health, b.player().max_health);
    }

    #[test]
    fn test_publish_failure_marks_disconnected() {
        let hub = LocalHub::new();
        let mut s = session(&hub, "u1", "Ayla");
        s.connect("mmo-world").unwrap();
        hub.set_available(false);
        assert!(s.send_chat_message("anyone?", ChatChannel::Global).is_err());
        assert!(!s.is_connected());
        hub.set_available(true);
    }

    #[test]
    fn test_drop_leaves_channel() {
        let hub = LocalHub::new();
        {
            let mut s = session(&hub, "u1", "Ayla");
            s.connect("mmo-world").unwrap();
            assert_eq!(hub.members("mmo-world").len(), 1);
        }
        assert!(hub.members("mmo-world").is_empty());
    }

    #[test]
    fn test_chat_mapping_fallbacks() {
        let message = InboundMessage {
            id: "m1".to_string(),
            event_type: "chat".to_string(),
            data: json!({ "text": "hi", "channel": "shouting" }),
            user_id: "u9".to_string(),
            metadata: None,
            timestamp: 77,
        };
        let chat = chat_message_from(&message);
        assert_eq!(chat.player_id, "u9");
        assert_eq!(chat.player_name, "Unknown");
        assert_eq!(chat.channel, ChatChannel::Global);
        assert_eq!(chat.created_at, 77);
    }
}
