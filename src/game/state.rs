//! # Session Context Module
//!
//! Ties the signed-in user to their saved character.
//!
//! The context is constructed explicitly and passed by reference to whatever
//! needs it. Authentication itself is an external capability consumed through
//! [`AuthProvider`]; the context only reacts to auth state changes, loading
//! the user's saved character on sign-in and dropping it on sign-out.

use crate::{
    now_millis, CharacterDraft, CharacterStore, KeyValueStore, Player, RealmError, RealmResult,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Snapshot reported by the auth provider on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_loading: false,
        }
    }
}

/// External authentication capability.
pub trait AuthProvider {
    /// Next pending auth state change, if any.
    fn poll_state(&mut self) -> Option<AuthState>;

    fn login(&mut self) -> RealmResult<()>;

    fn logout(&mut self) -> RealmResult<()>;
}

/// In-memory provider that signs a fixed user in and out.
#[derive(Debug, Clone)]
pub struct LocalAuth {
    user: User,
    signed_in: bool,
    pending: VecDeque<AuthState>,
}

impl LocalAuth {
    /// Starts signed out, with the initial "finished loading" change queued.
    pub fn new(user: User) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(AuthState::signed_out());
        Self {
            user,
            signed_in: false,
            pending,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }
}

impl AuthProvider for LocalAuth {
    fn poll_state(&mut self) -> Option<AuthState> {
        self.pending.pop_front()
    }

    fn login(&mut self) -> RealmResult<()> {
        if self.signed_in {
            return Ok(());
        }
        self.signed_in = true;
        self.pending.push_back(AuthState::signed_in(self.user.clone()));
        Ok(())
    }

    fn logout(&mut self) -> RealmResult<()> {
        if !self.signed_in {
            return Ok(());
        }
        self.signed_in = false;
        self.pending.push_back(AuthState::signed_out());
        Ok(())
    }
}

/// Which top-level screen the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    SignIn,
    CharacterCreation,
    InGame,
}

/// The signed-in user and their active character.
#[derive(Debug)]
pub struct GameContext<S: KeyValueStore> {
    characters: CharacterStore<S>,
    user: Option<User>,
    is_loading: bool,
    player: Option<Player>,
}

impl<S: KeyValueStore> GameContext<S> {
    pub fn new(store: S) -> Self {
        Self {
            characters: CharacterStore::new(store),
            user: None,
            is_loading: true,
            player: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn characters(&self) -> &CharacterStore<S> {
        &self.characters
    }

    pub fn screen(&self) -> Screen {
        match (&self.user, &self.player) {
            _ if self.is_loading => Screen::Loading,
            (None, _) => Screen::SignIn,
            (Some(_), None) => Screen::CharacterCreation,
            (Some(_), Some(_)) => Screen::InGame,
        }
    }

    /// Applies every pending change from `auth`. Returns how many were
    /// applied.
    pub fn sync(&mut self, auth: &mut dyn AuthProvider) -> usize {
        let mut applied = 0;
        while let Some(state) = auth.poll_state() {
            self.on_auth_state_changed(state);
            applied += 1;
        }
        applied
    }

    /// Reacts to an auth state change.
    ///
    /// A signed-in user gets their saved character loaded and marked online.
    /// An unreadable save is logged and treated as no character.
    pub fn on_auth_state_changed(&mut self, state: AuthState) {
        self.is_loading = state.is_loading;
        self.user = state.user;

        let Some(user) = self.user.as_ref() else {
            self.player = None;
            return;
        };
        if self.is_loading {
            return;
        }
        if self.player.as_ref().is_some_and(|p| p.user_id == user.id) {
            return;
        }

        self.player = match self.characters.load(&user.id) {
            Ok(Some(mut player)) => {
                player.is_online = true;
                player.last_seen = now_millis();
                info!("Loaded character {} for {}", player.character_name, user.id);
                Some(player)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to load saved character: {}", e);
                None
            }
        };
    }

    /// Creates, saves and activates a new character for the signed-in user.
    pub fn create_character(&mut self, draft: CharacterDraft) -> RealmResult<&Player> {
        let user = self
            .user
            .as_ref()
            .ok_or_else(|| RealmError::Auth("no signed-in user".to_string()))?;
        let player = Player::create(&user.id, draft, now_millis())?;
        self.characters.save(&player)?;
        info!(
            "Created {} {}",
            player.character_class.as_str(),
            player.character_name
        );
        Ok(self.player.insert(player))
    }

    /// Writes the active character back to storage.
    pub fn save_player(&self) -> RealmResult<()> {
        if let Some(player) = &self.player {
            self.characters.save(player)?;
        }
        Ok(())
    }

    /// Drops the active character and signs out.
    pub fn logout(&mut self, auth: &mut dyn AuthProvider) -> RealmResult<()> {
        self.player = None;
        auth.logout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharacterClass, MemoryStore};
    use std::sync::Arc;

    fn signed_in_context() -> (GameContext<Arc<MemoryStore>>, LocalAuth) {
        let mut context = GameContext::new(Arc::new(MemoryStore::new()));
        let mut auth = LocalAuth::new(User::new("user_1"));
        auth.login().unwrap();
        context.sync(&mut auth);
        (context, auth)
    }

    #[test]
    fn test_screen_flow() {
        let mut context = GameContext::new(MemoryStore::new());
        assert_eq!(context.screen(), Screen::Loading);

        let mut auth = LocalAuth::new(User::new("user_1"));
        assert_eq!(context.sync(&mut auth), 1);
        assert_eq!(context.screen(), Screen::SignIn);

        auth.login().unwrap();
        context.sync(&mut auth);
        assert_eq!(context.screen(), Screen::CharacterCreation);

        context
            .create_character(CharacterDraft::new("Mira", CharacterClass::Healer))
            .unwrap();
        assert_eq!(context.screen(), Screen::InGame);

        context.logout(&mut auth).unwrap();
        context.sync(&mut auth);
        assert_eq!(context.screen(), Screen::SignIn);
    }

    #[test]
    fn test_saved_character_reloads_online() {
        let store = Arc::new(MemoryStore::new());
        let mut first = GameContext::new(store.clone());
        let mut auth = LocalAuth::new(User::new("user_1"));
        auth.login().unwrap();
        first.sync(&mut auth);
        let id = first
            .create_character(CharacterDraft::new("Mira", CharacterClass::Healer))
            .unwrap()
            .id
            .clone();
        if let Some(player) = first.player_mut() {
            player.is_online = false;
        }
        first.save_player().unwrap();

        let mut second = GameContext::new(store);
        second.on_auth_state_changed(AuthState::signed_in(User::new("user_1")));
        let player = second.player().unwrap();
        assert_eq!(player.id, id);
        assert!(player.is_online);
    }

    #[test]
    fn test_create_requires_user() {
        let mut context = GameContext::new(MemoryStore::new());
        let result = context.create_character(CharacterDraft::new("Mira", CharacterClass::Dps));
        assert!(matches!(result, Err(RealmError::Auth(_))));
    }

    #[test]
    fn test_corrupt_save_is_ignored() {
        let (mut context, _auth) = signed_in_context();
        context
            .characters()
            .inner()
            .set("mmo_character_user_2", "garbage")
            .unwrap();
        context.on_auth_state_changed(AuthState::signed_in(User::new("user_2")));
        assert!(context.player().is_none());
        assert_eq!(context.screen(), Screen::CharacterCreation);
    }
}
