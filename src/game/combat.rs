//! # Dungeon Combat
//!
//! The single-player dungeon state machine: target selection, attack and
//! retaliation rounds, the three generic combat skills, floor progression and
//! the deferred exits that follow defeat or completion.
//!
//! Everything the player does inside a dungeon goes through [`DungeonRun`].
//! Invalid intent (attacking with no target, casting without mana) never
//! fails; it is reported through the combat log like the game UI shows it.

use super::{
    now_millis, Boss, CombatRoller, DeferredTransition, Dungeon, Enemy, Foe, Item, Player,
    TransitionScheduler, Vitals,
};
use crate::{config, RealmError, RealmResult};
use log::{debug, info};
use std::time::Duration;

/// Which foe the player is fighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    Enemy(String),
    Boss,
}

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DungeonPhase {
    /// On a floor with no target selected
    Exploring,
    /// A target is selected and attacks are allowed
    InCombat,
    /// Every foe on the current floor is down
    FloorCleared,
    /// Player health reached zero; ejection is pending
    Defeated,
    /// Last floor cleared; exit is pending
    DungeonComplete,
    /// The run is over
    Exited,
}

impl DungeonPhase {
    /// Phases in which the player can still act.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Exploring | Self::InCombat | Self::FloorCleared)
    }
}

/// The three generic skills available inside a dungeon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillCast {
    Heal,
    Damage,
    Shield,
}

/// Observations a run reports back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum DungeonEvent {
    EnemyDefeated { enemy_id: String, loot: Vec<Item> },
    BossDefeated { boss_id: String, loot: Vec<Item> },
    PlayerDefeated,
    FloorComplete { floor_id: String },
    FloorAdvanced { floor_number: u32 },
    DungeonCompleted,
    DungeonExited,
}

/// One player's pass through a dungeon.
///
/// The run works on its own copy of the dungeon and of the player's
/// resources; [`DungeonRun::apply_vitals_to`] hands the resources back.
/// Deferred transitions are driven by [`DungeonRun::advance`] and are
/// dropped together with the run.
///
/// # Examples
///
/// ```
/// use shadowrealm::{
///     CharacterClass, CharacterDraft, DungeonGenerator, DungeonPhase, DungeonRun,
///     GenerationConfig, Generator, Player, TargetRef,
/// };
/// use shadowrealm::generation::utils::create_rng;
///
/// let config = GenerationConfig::for_testing(1);
/// let mut rng = create_rng(&config);
/// let dungeons = DungeonGenerator::new().generate(&config, &mut rng).unwrap();
/// let player = Player::create("user_1", CharacterDraft::new("Ayla", CharacterClass::Tank), 0).unwrap();
///
/// let mut run = DungeonRun::new(dungeons[0].clone(), &player);
/// let first = run.enemies()[0].id.clone();
/// run.start_combat(TargetRef::Enemy(first)).unwrap();
/// assert_eq!(run.phase(), DungeonPhase::InCombat);
/// ```
#[derive(Debug)]
pub struct DungeonRun {
    dungeon: Dungeon,
    player_id: String,
    floor_index: usize,
    enemies: Vec<Enemy>,
    boss: Option<Boss>,
    target: Option<TargetRef>,
    vitals: Vitals,
    log: Vec<String>,
    loot_received: Vec<Item>,
    collected: Vec<Item>,
    show_loot: bool,
    phase: DungeonPhase,
    scheduler: TransitionScheduler,
}

impl DungeonRun {
    /// Enters `dungeon` on its first floor with the player's current
    /// resources.
    pub fn new(mut dungeon: Dungeon, player: &Player) -> Self {
        dungeon.enter(&player.id);
        info!("{} entered {}", player.character_name, dungeon.name);
        let mut run = Self {
            dungeon,
            player_id: player.id.clone(),
            floor_index: 0,
            enemies: Vec::new(),
            boss: None,
            target: None,
            vitals: player.vitals(),
            log: Vec::new(),
            loot_received: Vec::new(),
            collected: Vec::new(),
            show_loot: false,
            phase: DungeonPhase::Exploring,
            scheduler: TransitionScheduler::new(),
        };
        run.load_floor();
        run
    }

    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    pub fn phase(&self) -> DungeonPhase {
        self.phase
    }

    /// Zero-based index of the current floor.
    pub fn floor_index(&self) -> usize {
        self.floor_index
    }

    pub fn floor_count(&self) -> usize {
        self.dungeon.floors.len()
    }

    pub fn is_last_floor(&self) -> bool {
        self.floor_index + 1 >= self.dungeon.floors.len()
    }

    /// Enemies still standing on the current floor.
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    pub fn target(&self) -> Option<&TargetRef> {
        self.target.as_ref()
    }

    pub fn combat_log(&self) -> &[String] {
        &self.log
    }

    /// Items from the most recent defeat.
    pub fn loot_received(&self) -> &[Item] {
        &self.loot_received
    }

    /// Every item received during this run.
    pub fn collected_loot(&self) -> &[Item] {
        &self.collected
    }

    pub fn is_loot_shown(&self) -> bool {
        self.show_loot
    }

    pub fn dismiss_loot(&mut self) {
        self.show_loot = false;
    }

    pub fn vitals(&self) -> Vitals {
        self.vitals
    }

    /// Copies the run's health and mana back onto the owning player.
    pub fn apply_vitals_to(&self, player: &mut Player) {
        player.apply_vitals(&self.vitals);
    }

    /// Whether a deferred transition is still waiting to fire.
    pub fn has_pending_transition(&self) -> bool {
        self.scheduler.pending_count() > 0
    }

    /// Selects a live foe on the current floor and enters combat.
    ///
    /// Switching targets mid-combat is allowed and restarts the log.
    pub fn start_combat(&mut self, target: TargetRef) -> RealmResult<()> {
        if !matches!(self.phase, DungeonPhase::Exploring | DungeonPhase::InCombat) {
            return Err(RealmError::InvalidAction(format!(
                "cannot start combat while {:?}",
                self.phase
            )));
        }
        let name = match self.foe(&target) {
            Some(foe) if foe.is_alive() => foe.name().to_string(),
            Some(foe) => {
                return Err(RealmError::InvalidAction(format!(
                    "{} is already defeated",
                    foe.name()
                )))
            }
            None => {
                return Err(RealmError::InvalidAction(format!(
                    "no such target on this floor: {:?}",
                    target
                )))
            }
        };
        debug!("Combat started with {}", name);
        self.log = vec![format!("Combat started with {}!", name)];
        self.target = Some(target);
        self.phase = DungeonPhase::InCombat;
        Ok(())
    }

    /// Leaves combat without resolving it.
    pub fn abandon_combat(&mut self) {
        if self.phase == DungeonPhase::InCombat {
            self.target = None;
            self.phase = DungeonPhase::Exploring;
        }
    }

    /// Plays one attack round: the player strikes and a surviving target
    /// strikes back.
    pub fn attack(&mut self, roller: &mut dyn CombatRoller) -> Vec<DungeonEvent> {
        let mut events = Vec::new();
        if self.phase != DungeonPhase::InCombat {
            return events;
        }
        let Some(target) = self.target.clone() else {
            return events;
        };

        let damage = roller.roll(25, 75);
        let Some((name, attack_power, alive)) = self.hit(&target, damage) else {
            return events;
        };
        self.log(format!("You deal {} damage to {}!", damage, name));

        if !alive {
            events.extend(self.resolve_defeat(target, &name));
            return events;
        }

        let retaliation = roller.roll(10, 10 + attack_power);
        self.vitals.take_damage(retaliation);
        self.log(format!("{} deals {} damage to you!", name, retaliation));

        if !self.vitals.is_alive() {
            self.log("You have been defeated! Respawning outside dungeon...".to_string());
            info!("Player defeated by {}", name);
            self.target = None;
            self.phase = DungeonPhase::Defeated;
            self.scheduler
                .schedule(DeferredTransition::ExitDungeon, config::DEFEAT_EXIT_DELAY);
            events.push(DungeonEvent::PlayerDefeated);
        }
        events
    }

    /// Casts one of the generic dungeon skills for a flat mana cost.
    pub fn cast_skill(&mut self, skill: SkillCast, roller: &mut dyn CombatRoller) -> Vec<DungeonEvent> {
        let mut events = Vec::new();
        if !self.phase.is_active() {
            return events;
        }
        if self.vitals.mana() < config::DUNGEON_SKILL_MANA_COST {
            self.log("Not enough mana!".to_string());
            return events;
        }

        match skill {
            SkillCast::Heal => {
                self.vitals.spend_mana(config::DUNGEON_SKILL_MANA_COST);
                let amount = roller.roll(20, 50);
                self.vitals.heal(amount);
                self.log(format!("You heal for {} health!", amount));
            }
            SkillCast::Damage => {
                let Some(target) = self.target.clone() else {
                    self.log("No target selected!".to_string());
                    return events;
                };
                self.vitals.spend_mana(config::DUNGEON_SKILL_MANA_COST);
                let damage = roller.roll(40, 120);
                if let Some((name, _, alive)) = self.hit(&target, damage) {
                    self.log(format!("Skill deals {} damage to {}!", damage, name));
                    if !alive {
                        events.extend(self.resolve_defeat(target, &name));
                    }
                }
            }
            SkillCast::Shield => {
                self.vitals.spend_mana(config::DUNGEON_SKILL_MANA_COST);
                self.log("You cast a protective shield!".to_string());
            }
        }
        events
    }

    /// Whether every foe on the current floor is down.
    pub fn is_floor_clear(&self) -> bool {
        self.enemies.iter().all(|enemy| enemy.health == 0)
            && self.boss.as_ref().map_or(true, |boss| boss.health == 0)
    }

    pub fn can_proceed(&self) -> bool {
        matches!(self.phase, DungeonPhase::Exploring | DungeonPhase::FloorCleared)
            && self.is_floor_clear()
    }

    /// Completes the current floor and moves on, or completes the dungeon
    /// on the last floor. Does nothing while foes remain.
    pub fn proceed_to_next_floor(&mut self) -> Vec<DungeonEvent> {
        let mut events = Vec::new();
        if !self.can_proceed() {
            return events;
        }

        let Some(floor) = self.dungeon.floors.get_mut(self.floor_index) else {
            return events;
        };
        floor.is_cleared = true;
        events.push(DungeonEvent::FloorComplete {
            floor_id: floor.id.clone(),
        });
        self.scheduler.cancel(DeferredTransition::AdvanceFloor);

        if self.is_last_floor() {
            self.log("Dungeon completed! Congratulations!".to_string());
            info!("{} completed", self.dungeon.name);
            self.phase = DungeonPhase::DungeonComplete;
            self.scheduler
                .schedule(DeferredTransition::ExitDungeon, config::COMPLETION_EXIT_DELAY);
            events.push(DungeonEvent::DungeonCompleted);
        } else {
            events.push(self.enter_next_floor());
        }
        events
    }

    /// Moves the run's clock forward and fires due transitions.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<DungeonEvent> {
        let mut events = Vec::new();
        for transition in self.scheduler.advance(elapsed) {
            match transition {
                DeferredTransition::AdvanceFloor => {
                    if self.phase.is_active() && !self.is_last_floor() {
                        events.push(self.enter_next_floor());
                    }
                }
                DeferredTransition::ExitDungeon => {
                    events.extend(self.exit());
                }
            }
        }
        events
    }

    /// Leaves the dungeon now, cancelling anything pending.
    pub fn exit(&mut self) -> Vec<DungeonEvent> {
        if self.phase == DungeonPhase::Exited {
            return Vec::new();
        }
        self.scheduler.cancel_all();
        self.dungeon.leave(&self.player_id);
        self.target = None;
        self.phase = DungeonPhase::Exited;
        info!("Left {}", self.dungeon.name);
        vec![DungeonEvent::DungeonExited]
    }

    fn log(&mut self, line: String) {
        self.log.push(line);
    }

    fn load_floor(&mut self) {
        match self.dungeon.floors.get(self.floor_index) {
            Some(floor) => {
                self.enemies = floor.enemies.clone();
                self.boss = floor.boss.clone();
            }
            None => {
                self.enemies.clear();
                self.boss = None;
            }
        }
    }

    fn enter_next_floor(&mut self) -> DungeonEvent {
        self.floor_index += 1;
        self.load_floor();
        self.target = None;
        self.log.clear();
        self.phase = DungeonPhase::Exploring;
        let floor_number = self.floor_index as u32 + 1;
        debug!("Advanced to floor {}", floor_number);
        DungeonEvent::FloorAdvanced { floor_number }
    }

    fn foe(&self, target: &TargetRef) -> Option<&dyn Foe> {
        match target {
            TargetRef::Enemy(id) => self
                .enemies
                .iter()
                .find(|enemy| &enemy.id == id)
                .map(|enemy| enemy as &dyn Foe),
            TargetRef::Boss => self.boss.as_ref().map(|boss| boss as &dyn Foe),
        }
    }

    fn foe_mut(&mut self, target: &TargetRef) -> Option<&mut dyn Foe> {
        match target {
            TargetRef::Enemy(id) => self
                .enemies
                .iter_mut()
                .find(|enemy| &enemy.id == id)
                .map(|enemy| enemy as &mut dyn Foe),
            TargetRef::Boss => self.boss.as_mut().map(|boss| boss as &mut dyn Foe),
        }
    }

    /// Returns the target's name, attack power and whether it survived.
    fn hit(&mut self, target: &TargetRef, damage: u32) -> Option<(String, u32, bool)> {
        let foe = self.foe_mut(target)?;
        foe.apply_damage(damage);
        Some((foe.name().to_string(), foe.attack_power(), foe.is_alive()))
    }

    fn resolve_defeat(&mut self, target: TargetRef, name: &str) -> Vec<DungeonEvent> {
        let mut events = Vec::new();
        let loot = match &target {
            TargetRef::Boss => {
                let player_id = self.player_id.clone();
                self.boss
                    .as_mut()
                    .and_then(|boss| boss.chest.open(&player_id, now_millis()))
                    .unwrap_or_default()
            }
            TargetRef::Enemy(id) => match self.enemies.iter().position(|enemy| &enemy.id == id) {
                Some(index) => self.enemies.remove(index).loot_table,
                None => Vec::new(),
            },
        };

        self.log(format!("{} has been defeated!", name));
        self.log(format!("You received {} items!", loot.len()));
        info!("{} defeated, {} items received", name, loot.len());

        self.collected.extend(loot.iter().cloned());
        self.loot_received = loot.clone();
        self.show_loot = true;
        self.target = None;

        match target {
            TargetRef::Boss => {
                let boss_id = self.boss.as_ref().map(|boss| boss.id.clone()).unwrap_or_default();
                events.push(DungeonEvent::BossDefeated { boss_id, loot });
                if !self.is_last_floor() {
                    self.scheduler
                        .schedule(DeferredTransition::AdvanceFloor, config::BOSS_ADVANCE_DELAY);
                }
            }
            TargetRef::Enemy(enemy_id) => {
                events.push(DungeonEvent::EnemyDefeated { enemy_id, loot });
            }
        }

        self.phase = if self.is_floor_clear() {
            DungeonPhase::FloorCleared
        } else {
            DungeonPhase::Exploring
        };
        events
    }
}

impl Drop for DungeonRun {
    fn drop(&mut self) {
        if self.scheduler.pending_count() > 0 {
            debug!(
                "Dropping run in {} with {} pending transitions",
                self.dungeon.name,
                self.scheduler.pending_count()
            );
            self.scheduler.cancel_all();
        }
    }
}
