//! Multiplayer session tests over the in-process hub.

use shadowrealm::{
    CharacterClass, CharacterDraft, CharacterStore, ChatChannel, Delivery, JsonFileStore,
    LocalHub, MemoryStore, MultiplayerSession, Player, RealmError, RealmResult, SessionConfig,
    SessionEvent, SkipReason,
};
use std::sync::Arc;

type Session = MultiplayerSession<LocalHub, Arc<MemoryStore>>;

fn join(hub: &LocalHub, user: &str, name: &str) -> Session {
    let player = Player::create(user, CharacterDraft::new(name, CharacterClass::Dps), 0).unwrap();
    let mut session = MultiplayerSession::new(hub.clone(), Arc::new(MemoryStore::new()), player);
    session.connect("mmo-world").unwrap();
    session
}

fn names(session: &Session) -> Vec<String> {
    session
        .online_players()
        .iter()
        .map(|p| p.character_name.clone())
        .collect()
}

#[test]
fn test_chat_echo_is_not_synchronous() -> RealmResult<()> {
    let hub = LocalHub::new();
    let mut ayla = join(&hub, "u1", "Ayla");

    assert_eq!(
        ayla.send_chat_message(" \t ", ChatChannel::Global)?,
        Delivery::Skipped(SkipReason::EmptyMessage)
    );
    ayla.poll();
    assert!(ayla.chat().is_empty());

    assert_eq!(ayla.send_chat_message("hello", ChatChannel::Global)?, Delivery::Sent);
    assert!(ayla.chat().is_empty());

    let events = ayla.poll();
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::ChatReceived(m) if m.message == "hello")));
    assert_eq!(ayla.chat().len(), 1);
    Ok(())
}

#[test]
fn test_presence_snapshots_replace_not_merge() {
    let hub = LocalHub::new();
    let mut watcher = join(&hub, "u0", "Watcher");
    let mut b = join(&hub, "u1", "Brakka");
    let c = join(&hub, "u2", "Cyr");
    watcher.poll();
    assert_eq!(names(&watcher), ["Watcher", "Brakka", "Cyr"]);

    b.disconnect();
    drop(c);
    watcher.poll();
    assert_eq!(names(&watcher), ["Watcher"]);
}

#[test]
fn test_chat_history_is_capped() {
    let hub = LocalHub::new();
    let mut talker = join(&hub, "u1", "Talker");
    for i in 0..60 {
        talker
            .send_chat_message(&format!("message {}", i), ChatChannel::Global)
            .unwrap();
    }
    talker.poll();
    assert_eq!(talker.chat().len(), 50);
    assert_eq!(talker.chat().iter().next().unwrap().message, "message 10");

    let mut late = join(&hub, "u2", "Late");
    late.poll();
    assert_eq!(late.chat().len(), 50);
    assert_eq!(late.chat().last().unwrap().message, "message 59");
}

#[test]
fn test_remote_projection_tracks_metadata() {
    let hub = LocalHub::new();
    let mut watcher = join(&hub, "u0", "Watcher");
    let mut mover = join(&hub, "u1", "Mover");
    mover.update_player_position(10.0, 20.0).unwrap();

    // Presence metadata is what the player had when joining
    watcher.poll();
    let projected = watcher
        .online_players()
        .iter()
        .find(|p| p.user_id == "u1")
        .cloned()
        .unwrap();
    assert_eq!(projected.id, mover.player().id);
    assert_eq!((projected.position_x, projected.position_y), (400.0, 300.0));

    // Rejoining republishes the current metadata
    mover.disconnect();
    mover.connect("mmo-world").unwrap();
    watcher.poll();
    let projected = watcher
        .online_players()
        .iter()
        .find(|p| p.user_id == "u1")
        .cloned()
        .unwrap();
    assert_eq!((projected.position_x, projected.position_y), (10.0, 20.0));
}

#[test]
fn test_offline_play_keeps_working() {
    let hub = LocalHub::new();
    hub.set_available(false);
    let player = Player::create("u1", CharacterDraft::new("Solo", CharacterClass::Tank), 0).unwrap();
    let store = Arc::new(MemoryStore::new());
    let mut session = MultiplayerSession::new(hub.clone(), store.clone(), player);

    assert!(session.connect("mmo-world").is_err());
    assert!(!session.is_connected());
    assert_eq!(
        session.update_player_position(50.0, 60.0).unwrap(),
        Delivery::Skipped(SkipReason::NotConnected)
    );
    let saved = CharacterStore::new(store).load("u1").unwrap().unwrap();
    assert_eq!(saved.position_x, 50.0);
}

#[test]
fn test_file_backed_session() -> RealmResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("characters.json");
    let player = Player::create("u1", CharacterDraft::new("Ayla", CharacterClass::Healer), 0)?;
    {
        let store = JsonFileStore::open(&path)?;
        let mut session = MultiplayerSession::new(LocalHub::new(), store, player.clone());
        session.update_player_position(123.0, 45.0)?;
    }

    let reopened = CharacterStore::new(JsonFileStore::open(&path)?);
    let saved = reopened.load("u1")?.expect("character should be saved");
    assert_eq!(saved.id, player.id);
    assert_eq!((saved.position_x, saved.position_y), (123.0, 45.0));
    Ok(())
}

#[test]
fn test_session_config_from_file() -> RealmResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{ "channelName": "guild-hall", "historyLimit": 5 }"#)?;

    let config = SessionConfig::load(&path)?;
    assert_eq!(config.channel_name, "guild-hall");
    assert_eq!(config.history_limit, 5);
    assert_eq!(config.world_bounds.width, 800.0);
    Ok(())
}

#[test]
fn test_session_config_rejects_negative_bounds() -> RealmResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{ "worldBounds": { "width": -1.0, "height": 600.0 } }"#)?;

    assert!(matches!(SessionConfig::load(&path), Err(RealmError::InvalidState(_))));
    Ok(())
}
