//! # Autoplay Module
//!
//! A simple bot that plays a [`DungeonRun`] on its own. Used by the headless
//! demo and for soak-testing the combat machine.

use super::{CombatRoller, DungeonEvent, DungeonPhase, DungeonRun, Foe, SkillCast, TargetRef};
use crate::config;
use log::debug;

/// Health ratio below which the bot heals
pub const DEFAULT_HEAL_THRESHOLD: f64 = 0.35;

/// One decision of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoplayAction {
    Target(TargetRef),
    Attack,
    Cast(SkillCast),
    Proceed,
}

/// Autoplay settings.
///
/// # Examples
///
/// ```
/// use shadowrealm::AutoplayState;
///
/// let mut bot = AutoplayState::new();
/// assert!(bot.enabled);
/// assert!(!bot.toggle());
/// ```
#[derive(Debug, Clone)]
pub struct AutoplayState {
    pub enabled: bool,
    pub heal_threshold: f64,
    /// Use the damage skill whenever a heal's worth of mana would remain
    pub use_skills: bool,
}

impl AutoplayState {
    pub fn new() -> Self {
        Self {
            enabled: true,
            heal_threshold: DEFAULT_HEAL_THRESHOLD,
            use_skills: true,
        }
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Picks the next action, or `None` when there is nothing to do (the
    /// bot is off, or the run is waiting on a deferred exit).
    pub fn next_action(&self, run: &DungeonRun) -> Option<AutoplayAction> {
        if !self.enabled || !run.phase().is_active() {
            return None;
        }

        let vitals = run.vitals();
        let cost = config::DUNGEON_SKILL_MANA_COST;
        if vitals.health_ratio() < self.heal_threshold && vitals.mana() >= cost {
            return Some(AutoplayAction::Cast(SkillCast::Heal));
        }
        if run.can_proceed() {
            return Some(AutoplayAction::Proceed);
        }

        if run.phase() == DungeonPhase::InCombat && run.target().is_some() {
            if self.use_skills && vitals.mana() >= cost * 2 {
                return Some(AutoplayAction::Cast(SkillCast::Damage));
            }
            return Some(AutoplayAction::Attack);
        }

        // Weakest enemy first, the boss once the floor is otherwise empty
        let weakest = run
            .enemies()
            .iter()
            .filter(|enemy| enemy.is_alive())
            .min_by_key(|enemy| enemy.health);
        match weakest {
            Some(enemy) => Some(AutoplayAction::Target(TargetRef::Enemy(enemy.id.clone()))),
            None if run.boss().is_some_and(|boss| boss.is_alive()) => {
                Some(AutoplayAction::Target(TargetRef::Boss))
            }
            None => None,
        }
    }

    /// Decides and performs one action.
    pub fn step(&self, run: &mut DungeonRun, roller: &mut dyn CombatRoller) -> Vec<DungeonEvent> {
        let Some(action) = self.next_action(run) else {
            return Vec::new();
        };
        debug!("Autoplay: {:?}", action);
        match action {
            AutoplayAction::Target(target) => {
                if let Err(e) = run.start_combat(target) {
                    debug!("Autoplay could not engage: {}", e);
                }
                Vec::new()
            }
            AutoplayAction::Attack => run.attack(roller),
            AutoplayAction::Cast(skill) => run.cast_skill(skill, roller),
            AutoplayAction::Proceed => run.proceed_to_next_floor(),
        }
    }
}

impl Default for AutoplayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CharacterClass, CharacterDraft, Dungeon, DungeonFloor, Enemy, MapPosition, Player,
        ScriptedRolls,
    };
    use std::time::Duration;

    fn enemy(id: &str, health: u32) -> Enemy {
        Enemy {
            id: id.to_string(),
            name: format!("Rat {}", id),
            level: 1,
            health,
            max_health: health,
            damage: 5,
            position: MapPosition::origin(),
            is_alive: true,
            loot_table: Vec::new(),
        }
    }

    fn run_with(enemies: Vec<Enemy>) -> DungeonRun {
        let floor = DungeonFloor {
            id: "floor_1".to_string(),
            dungeon_id: "dungeon_01".to_string(),
            floor_number: 1,
            enemies,
            boss: None,
            is_cleared: false,
            required_level: 1,
        };
        let dungeon = Dungeon {
            id: "dungeon_01".to_string(),
            name: "Rat Cellar".to_string(),
            level: 1,
            position: MapPosition::origin(),
            floors: vec![floor],
            is_active: true,
            players_inside: Vec::new(),
            created_at: 0,
        };
        let player =
            Player::create("user_1", CharacterDraft::new("Ayla", CharacterClass::Tank), 0).unwrap();
        DungeonRun::new(dungeon, &player)
    }

    #[test]
    fn test_targets_weakest_enemy() {
        let run = run_with(vec![enemy("big", 90), enemy("small", 30)]);
        let bot = AutoplayState::new();
        assert_eq!(
            bot.next_action(&run),
            Some(AutoplayAction::Target(TargetRef::Enemy("small".to_string())))
        );
    }

    #[test]
    fn test_attacks_when_mana_is_short() {
        let mut run = run_with(vec![enemy("a", 500)]);
        run.start_combat(TargetRef::Enemy("a".to_string())).unwrap();
        let bot = AutoplayState::new();
        // Tank starts with 60 mana: two damage skills, then plain attacks
        assert_eq!(bot.next_action(&run), Some(AutoplayAction::Cast(SkillCast::Damage)));
        bot.step(&mut run, &mut ScriptedRolls::default());
        bot.step(&mut run, &mut ScriptedRolls::default());
        assert_eq!(bot.next_action(&run), Some(AutoplayAction::Attack));
    }

    #[test]
    fn test_heals_when_low() {
        let mut run = run_with(vec![enemy("a", 5_000)]);
        run.start_combat(TargetRef::Enemy("a".to_string())).unwrap();
        let mut bot = AutoplayState::new();
        bot.use_skills = false;
        // Each retaliation rolls the top of [10, 15): 14 damage per round
        let mut rolls = ScriptedRolls::new(std::iter::repeat(u32::MAX).take(40));
        while run.vitals().health_ratio() >= DEFAULT_HEAL_THRESHOLD {
            run.attack(&mut rolls);
        }
        assert_eq!(bot.next_action(&run), Some(AutoplayAction::Cast(SkillCast::Heal)));
    }

    #[test]
    fn test_clears_floor_and_completes() {
        let mut run = run_with(vec![enemy("a", 40), enemy("b", 60)]);
        let bot = AutoplayState::new();
        let mut rolls = ScriptedRolls::new(std::iter::repeat(74).take(200));
        let mut completed = false;
        for _ in 0..50 {
            let events = bot.step(&mut run, &mut rolls);
            if events.contains(&DungeonEvent::DungeonCompleted) {
                completed = true;
                break;
            }
        }
        assert!(completed);
        assert_eq!(bot.next_action(&run), None);
        run.advance(Duration::from_secs(3));
        assert_eq!(run.phase(), DungeonPhase::Exited);
    }

    #[test]
    fn test_disabled_bot_does_nothing() {
        let mut run = run_with(vec![enemy("a", 10)]);
        let mut bot = AutoplayState::new();
        bot.toggle();
        assert!(bot.step(&mut run, &mut ScriptedRolls::default()).is_empty());
        assert_eq!(run.phase(), DungeonPhase::Exploring);
    }
}
