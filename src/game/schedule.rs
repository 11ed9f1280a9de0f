//! # Transition Scheduler
//!
//! Deferred state transitions driven by an explicit clock. Owned by the
//! dungeon run, so dropping or exiting the run cancels everything pending.

use std::time::Duration;

/// A transition a dungeon run performs after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTransition {
    /// Move to the next floor after a boss falls
    AdvanceFloor,
    /// Leave the dungeon (after defeat or completion)
    ExitDungeon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    due: Duration,
    seq: u64,
    transition: DeferredTransition,
}

/// Cancellable timer queue with a virtual clock.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use shadowrealm::{DeferredTransition, TransitionScheduler};
///
/// let mut scheduler = TransitionScheduler::new();
/// scheduler.schedule(DeferredTransition::ExitDungeon, Duration::from_secs(2));
/// assert!(scheduler.advance(Duration::from_secs(1)).is_empty());
/// assert_eq!(
///     scheduler.advance(Duration::from_secs(1)),
///     vec![DeferredTransition::ExitDungeon]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransitionScheduler {
    now: Duration,
    next_seq: u64,
    pending: Vec<Pending>,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on this scheduler's clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, transition: DeferredTransition, delay: Duration) {
        let pending = Pending {
            due: self.now + delay,
            seq: self.next_seq,
            transition,
        };
        self.next_seq += 1;
        self.pending.push(pending);
    }

    /// Moves the clock forward and returns every transition that fell due,
    /// earliest first (ties in scheduling order).
    pub fn advance(&mut self, elapsed: Duration) -> Vec<DeferredTransition> {
        self.now += elapsed;
        let now = self.now;
        let (mut due, rest): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|pending| pending.due <= now);
        self.pending = rest;
        due.sort_by_key(|pending| (pending.due, pending.seq));
        due.into_iter().map(|pending| pending.transition).collect()
    }

    /// Drops every pending instance of `transition`.
    pub fn cancel(&mut self, transition: DeferredTransition) {
        self.pending.retain(|pending| pending.transition != transition);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, transition: DeferredTransition) -> bool {
        self.pending.iter().any(|pending| pending.transition == transition)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_fire_in_due_order() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(DeferredTransition::ExitDungeon, Duration::from_secs(3));
        scheduler.schedule(DeferredTransition::AdvanceFloor, Duration::from_secs(2));
        let fired = scheduler.advance(Duration::from_secs(5));
        assert_eq!(
            fired,
            vec![DeferredTransition::AdvanceFloor, DeferredTransition::ExitDungeon]
        );
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(DeferredTransition::AdvanceFloor, Duration::from_secs(2));
        assert!(scheduler.is_pending(DeferredTransition::AdvanceFloor));
        scheduler.cancel_all();
        assert!(scheduler.advance(Duration::from_secs(10)).is_empty());
    }
}
