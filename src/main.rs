//! # Shadowrealm Headless Client
//!
//! Generates the world, signs a local user in, joins the in-process world
//! channel together with a few bot players and lets the autoplay bot run a
//! dungeon. Useful for soak-testing the client core without a frontend.

use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shadowrealm::{
    AuthProvider, AutoplayState, CharacterClass, CharacterDraft, ChatChannel, DungeonEvent,
    DungeonPhase, DungeonRun, GameContext, GameMap, GenerationConfig, Generator, LocalAuth,
    LocalHub, MemoryStore, MultiplayerSession, NotificationQueue, Player, RealmError,
    RealmResult, RngRoller, SessionConfig, SessionEvent, StatsUpdate, User, WorldGenerator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Simulated time per tick
const TICK: Duration = Duration::from_millis(500);

/// Command line arguments for the headless client.
#[derive(Parser, Debug)]
#[command(name = "shadowrealm")]
#[command(about = "Headless multiplayer dungeon RPG client")]
#[command(version)]
struct Args {
    /// Random seed for world generation and combat rolls
    #[arg(short, long)]
    seed: Option<u64>,

    /// Index of the dungeon to run (0-based)
    #[arg(short, long, default_value_t = 0)]
    dungeon: usize,

    /// Number of bot players joining the world channel
    #[arg(long, default_value_t = 2)]
    bots: usize,

    /// JSON session config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides it
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Stop after this many ticks
    #[arg(long, default_value_t = 2_000)]
    max_ticks: u32,
}

type LocalSession = MultiplayerSession<LocalHub, Arc<MemoryStore>>;

fn main() -> RealmResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting Shadowrealm v{}", shadowrealm::VERSION);

    let session_config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let seed = args.seed.unwrap_or(12345);

    let map = generate_world(seed)?;
    let store = Arc::new(MemoryStore::new());
    let hub = LocalHub::new();

    let hero = sign_in(store.clone())?;
    let mut session =
        MultiplayerSession::with_config(hub.clone(), store.clone(), hero, session_config.clone());
    if let Err(e) = session.connect(&session_config.channel_name) {
        warn!("Playing offline: {}", e);
    }

    let mut bots = spawn_bots(&hub, &session_config, args.bots)?;
    session.poll();
    info!("{} players online", session.online_players().len());

    run_dungeon(&args, &map, &mut session, seed)?;

    for bot in bots.iter_mut() {
        bot.disconnect();
    }
    for event in session.poll() {
        if let SessionEvent::ChatReceived(message) = event {
            info!("[{}] {}: {}", message.channel.as_str(), message.player_name, message.message);
        }
    }
    info!(
        "Session over: {} players online, {} chat messages",
        session.online_players().len(),
        session.chat().len()
    );
    Ok(())
}

/// Initializes `env_logger`, letting `RUST_LOG` take precedence.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

fn generate_world(seed: u64) -> RealmResult<GameMap> {
    info!("Generating world with seed: {}", seed);
    let config = GenerationConfig::new(seed);
    let mut rng = shadowrealm::generation::utils::create_rng(&config);
    WorldGenerator::new().generate(&config, &mut rng)
}

/// Signs the local user in and creates their character.
fn sign_in(store: Arc<MemoryStore>) -> RealmResult<Player> {
    let mut auth = LocalAuth::new(User::new("local-user"));
    let mut context = GameContext::new(store);
    context.sync(&mut auth);

    auth.login()?;
    context.sync(&mut auth);
    if context.player().is_none() {
        context.create_character(CharacterDraft::new("Wanderer", CharacterClass::Tank))?;
    }
    context
        .player()
        .cloned()
        .ok_or_else(|| RealmError::InvalidState("no character after sign-in".to_string()))
}

fn spawn_bots(hub: &LocalHub, config: &SessionConfig, count: usize) -> RealmResult<Vec<LocalSession>> {
    let classes = CharacterClass::all();
    let mut bots = Vec::with_capacity(count);
    for index in 0..count {
        let draft = CharacterDraft::new(format!("Bot {}", index + 1), classes[index % classes.len()]);
        let player = Player::create(&format!("bot-{}", index + 1), draft, shadowrealm::now_millis())?;
        let mut bot = MultiplayerSession::with_config(
            hub.clone(),
            Arc::new(MemoryStore::new()),
            player,
            config.clone(),
        );
        bot.connect(&config.channel_name)?;
        bot.send_chat_message("Hello, adventurers!", ChatChannel::Global)?;
        bot.update_player_position(100.0 + 60.0 * index as f64, 200.0)?;
        bots.push(bot);
    }
    Ok(bots)
}

fn run_dungeon(args: &Args, map: &GameMap, session: &mut LocalSession, seed: u64) -> RealmResult<()> {
    let dungeon = map
        .dungeons
        .get(args.dungeon)
        .cloned()
        .ok_or_else(|| RealmError::InvalidAction(format!("no dungeon #{}", args.dungeon)))?;
    info!("Entering {} (level {})", dungeon.name, dungeon.level);

    let mut run = DungeonRun::new(dungeon, session.player());
    let bot = AutoplayState::new();
    let mut roller = RngRoller::new(StdRng::seed_from_u64(seed));
    let mut notifications = NotificationQueue::new();

    for tick in 0..args.max_ticks {
        let mut events = bot.step(&mut run, &mut roller);
        events.extend(run.advance(TICK));
        notifications.advance(TICK);

        for event in &events {
            let shown = match event {
                DungeonEvent::BossDefeated { loot, .. } => Some(notifications.show_achievement(
                    "Boss Slain",
                    &format!("You looted {} items from the chest", loot.len()),
                )),
                DungeonEvent::PlayerDefeated => Some(
                    notifications.show_system_message("Defeated", "Respawning outside the dungeon"),
                ),
                DungeonEvent::FloorAdvanced { floor_number } => {
                    info!("Floor {} reached", floor_number);
                    None
                }
                _ => None,
            };
            if let Some(notification) = shown.as_deref().and_then(|id| notifications.get(id)) {
                info!("{}: {}", notification.title, notification.message);
            }
        }

        if run.phase() == DungeonPhase::Exited {
            info!("Run finished after {} ticks", tick + 1);
            break;
        }
    }

    let vitals = run.vitals();
    session.update_player_stats(StatsUpdate {
        health: Some(vitals.health().max(1)),
        mana: Some(vitals.mana()),
        level: None,
    })?;
    info!(
        "Collected {} items; {} at {}/{} health",
        run.collected_loot().len(),
        session.player().character_name,
        session.player().health,
        session.player().max_health
    );
    Ok(())
}
