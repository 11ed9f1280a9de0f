//! # Chat
//!
//! Chat messages and the bounded client-side history.

use crate::config;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Logical chat audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    #[default]
    Global,
    Guild,
    Faction,
    Whisper,
}

impl ChatChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Guild => "guild",
            Self::Faction => "faction",
            Self::Whisper => "whisper",
        }
    }

    /// Parses a wire channel name. Unknown names fall back to global.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowrealm::ChatChannel;
    ///
    /// assert_eq!(ChatChannel::parse("guild"), ChatChannel::Guild);
    /// assert_eq!(ChatChannel::parse("party"), ChatChannel::Global);
    /// ```
    pub fn parse(value: &str) -> Self {
        match value {
            "guild" => Self::Guild,
            "faction" => Self::Faction,
            "whisper" => Self::Whisper,
            _ => Self::Global,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub player_id: String,
    pub player_name: String,
    pub message: String,
    pub channel: ChatChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_player_id: Option<String>,
    /// Epoch milliseconds
    pub created_at: u64,
}

/// The most recent chat messages in arrival order.
///
/// Pushing past the capacity evicts the oldest message.
///
/// # Examples
///
/// ```
/// use shadowrealm::{ChatChannel, ChatHistory, ChatMessage};
///
/// let mut history = ChatHistory::with_capacity(2);
/// for i in 0..3 {
///     history.push(ChatMessage {
///         id: format!("m{}", i),
///         player_id: "p".to_string(),
///         player_name: "Ayla".to_string(),
///         message: format!("hello {}", i),
///         channel: ChatChannel::Global,
///         target_player_id: None,
///         created_at: i,
///     });
/// }
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.iter().next().unwrap().id, "m1");
/// ```
#[derive(Debug, Clone)]
pub struct ChatHistory {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::with_capacity(config::CHAT_HISTORY_LIMIT)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        if self.capacity == 0 {
            return;
        }
        while self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn extend<I: IntoIterator<Item = ChatMessage>>(&mut self, messages: I) {
        for message in messages {
            self.push(message);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages on one channel, oldest first.
    pub fn on_channel(&self, channel: ChatChannel) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|message| message.channel == channel)
            .collect()
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(n: u64, channel: ChatChannel) -> ChatMessage {
        ChatMessage {
            id: format!("msg_{}", n),
            player_id: "player_1".to_string(),
            player_name: "Thorn".to_string(),
            message: format!("message {}", n),
            channel,
            target_player_id: None,
            created_at: n,
        }
    }

    #[test]
    fn test_history_keeps_last_fifty() {
        let mut history = ChatHistory::new();
        for n in 0..51 {
            history.push(message(n, ChatChannel::Global));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.iter().next().map(|m| m.created_at), Some(1));
        assert_eq!(history.last().map(|m| m.created_at), Some(50));
    }

    #[test]
    fn test_channel_filter() {
        let mut history = ChatHistory::new();
        history.push(message(1, ChatChannel::Global));
        history.push(message(2, ChatChannel::Guild));
        history.push(message(3, ChatChannel::Guild));
        let guild = history.on_channel(ChatChannel::Guild);
        assert_eq!(guild.len(), 2);
        assert_eq!(guild[0].created_at, 2);
    }

    #[test]
    fn test_channel_wire_names() {
        for channel in [
            ChatChannel::Global,
            ChatChannel::Guild,
            ChatChannel::Faction,
            ChatChannel::Whisper,
        ] {
            assert_eq!(ChatChannel::parse(channel.as_str()), channel);
        }
        assert_eq!(ChatChannel::parse(""), ChatChannel::Global);
    }
}
