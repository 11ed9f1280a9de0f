//! # Notifications Module
//!
//! Short-lived events surfaced to the player: PvP challenges, guild invites,
//! system messages and achievements.
//!
//! The queue runs on a virtual clock. Hosts call
//! [`NotificationQueue::advance`] with the elapsed frame time and
//! notifications with an auto-close delay expire on their own.

use crate::{new_id, RealmError, RealmResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Auto-close delay of system messages
pub const SYSTEM_MESSAGE_DURATION: Duration = Duration::from_secs(5);

/// Auto-close delay of achievements
pub const ACHIEVEMENT_DURATION: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    CombatChallenge,
    GuildInvite,
    System,
    Achievement,
}

/// How an action button is emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionVariant {
    #[default]
    Default,
    Destructive,
    Outline,
}

/// A button on a notification. Its callback runs at most once.
pub struct NotificationAction {
    pub id: String,
    pub label: String,
    pub variant: ActionVariant,
    callback: Box<dyn FnOnce() + Send>,
}

impl NotificationAction {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        callback: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            variant: ActionVariant::Default,
            callback: Box::new(callback),
        }
    }

    pub fn with_variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }
}

impl fmt::Debug for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

/// Everything but the id of a notification.
#[derive(Debug)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub from_player: Option<String>,
    pub actions: Vec<NotificationAction>,
    /// `None` keeps the notification until it is dismissed
    pub auto_close: Option<Duration>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            from_player: None,
            actions: Vec::new(),
            auto_close: None,
        }
    }
}

#[derive(Debug)]
pub struct GameNotification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub from_player: Option<String>,
    pub actions: Vec<NotificationAction>,
    pub auto_close: Option<Duration>,
    /// Queue time at which this notification was added
    created_at: Duration,
}

impl GameNotification {
    fn expires_at(&self) -> Option<Duration> {
        self.auto_close.map(|delay| self.created_at + delay)
    }
}

/// Pending notifications in the order they were added.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use shadowrealm::NotificationQueue;
///
/// let mut queue = NotificationQueue::new();
/// queue.show_system_message("Server", "Maintenance at noon");
/// assert_eq!(queue.len(), 1);
///
/// queue.advance(Duration::from_secs(5));
/// assert!(queue.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NotificationQueue {
    notifications: Vec<GameNotification>,
    clock: Duration,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameNotification> {
        self.notifications.iter()
    }

    pub fn get(&self, id: &str) -> Option<&GameNotification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Queues a notification and returns its id.
    pub fn add(&mut self, draft: NotificationDraft) -> String {
        let notification = GameNotification {
            id: new_id("notification"),
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            from_player: draft.from_player,
            actions: draft.actions,
            auto_close: draft.auto_close,
            created_at: self.clock,
        };
        debug!("Notification {:?}: {}", notification.kind, notification.title);
        let id = notification.id.clone();
        self.notifications.push(notification);
        id
    }

    /// Removes a notification. Returns whether it was present.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        before != self.notifications.len()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    /// Runs one of a notification's actions and dismisses the notification.
    pub fn activate(&mut self, id: &str, action_id: &str) -> RealmResult<()> {
        let index = self
            .notifications
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| RealmError::InvalidAction(format!("no notification {}", id)))?;
        if !self.notifications[index].actions.iter().any(|a| a.id == action_id) {
            return Err(RealmError::InvalidAction(format!(
                "notification {} has no action {}",
                id, action_id
            )));
        }

        let notification = self.notifications.remove(index);
        if let Some(action) = notification.actions.into_iter().find(|a| a.id == action_id) {
            debug!("Activating {} on {}", action.label, id);
            (action.callback)();
        }
        Ok(())
    }

    /// Moves the queue clock forward and drops expired notifications.
    /// Returns the ids that expired.
    pub fn advance(&mut self, dt: Duration) -> Vec<String> {
        self.clock += dt;
        let now = self.clock;
        let mut expired = Vec::new();
        self.notifications.retain(|n| match n.expires_at() {
            Some(at) if at <= now => {
                expired.push(n.id.clone());
                false
            }
            _ => true,
        });
        expired
    }

    pub fn show_combat_challenge(
        &mut self,
        from_player: &str,
        on_accept: impl FnOnce() + Send + 'static,
        on_decline: impl FnOnce() + Send + 'static,
    ) -> String {
        let mut draft = NotificationDraft::new(
            NotificationKind::CombatChallenge,
            "PvP Challenge!",
            format!("{} has challenged you to combat!", from_player),
        );
        draft.from_player = Some(from_player.to_string());
        draft.actions = vec![
            NotificationAction::new("accept", "Accept", on_accept)
                .with_variant(ActionVariant::Destructive),
            NotificationAction::new("decline", "Decline", on_decline)
                .with_variant(ActionVariant::Outline),
        ];
        self.add(draft)
    }

    pub fn show_guild_invite(
        &mut self,
        guild_name: &str,
        from_player: &str,
        on_join: impl FnOnce() + Send + 'static,
        on_decline: impl FnOnce() + Send + 'static,
    ) -> String {
        let mut draft = NotificationDraft::new(
            NotificationKind::GuildInvite,
            "Guild Invitation",
            format!("You've been invited to join \"{}\"", guild_name),
        );
        draft.from_player = Some(from_player.to_string());
        draft.actions = vec![
            NotificationAction::new("join", "Join", on_join),
            NotificationAction::new("decline", "Decline", on_decline)
                .with_variant(ActionVariant::Outline),
        ];
        self.add(draft)
    }

    pub fn show_system_message(&mut self, title: &str, message: &str) -> String {
        let mut draft = NotificationDraft::new(NotificationKind::System, title, message);
        draft.auto_close = Some(SYSTEM_MESSAGE_DURATION);
        self.add(draft)
    }

    pub fn show_achievement(&mut self, title: &str, message: &str) -> String {
        let mut draft = NotificationDraft::new(NotificationKind::Achievement, title, message);
        draft.auto_close = Some(ACHIEVEMENT_DURATION);
        self.add(draft)
    }
}
