//! Delayed-action queue.
//!
//! Bot think-time and side-show response delays go through this queue
//! instead of ambient timers: the table runtime feeds it a millisecond
//! clock on every tick, and tests feed it a fake one to drive schedules
//! deterministically.

use crate::game::Intent;

/// An intent parked until its due time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScheduledIntent {
    pub due_at_ms: u64,
    /// Caller-chosen fingerprint of the situation that produced the
    /// schedule. Used to avoid queueing the same turn twice.
    pub tag: u64,
    pub intent: Intent,
}

#[derive(Debug, Default)]
pub struct ActionQueue {
    items: Vec<ScheduledIntent>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an intent until `due_at_ms`. A tag already in the queue is
    /// silently ignored; the first schedule for a situation wins.
    pub fn schedule(&mut self, due_at_ms: u64, tag: u64, intent: Intent) {
        if self.contains(tag) {
            return;
        }
        self.items.push(ScheduledIntent {
            due_at_ms,
            tag,
            intent,
        });
    }

    pub fn contains(&self, tag: u64) -> bool {
        self.items.iter().any(|item| item.tag == tag)
    }

    /// Remove and return every intent due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Intent> {
        let mut due: Vec<ScheduledIntent> = Vec::new();
        self.items.retain(|item| {
            if item.due_at_ms <= now_ms {
                due.push(item.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|item| item.due_at_ms);
        due.into_iter().map(|item| item.intent).collect()
    }

    /// Drop schedules whose situation no longer exists (e.g. the turn
    /// moved on before the bot "finished thinking").
    pub fn retain_tags(&mut self, keep: impl Fn(u64) -> bool) {
        self.items.retain(|item| keep(item.tag));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_intents_come_out_earliest_first() {
        let mut queue = ActionQueue::new();
        queue.schedule(300, 1, Intent::Chaal { seat: 1 });
        queue.schedule(100, 2, Intent::See { seat: 2 });
        queue.schedule(900, 3, Intent::Fold { seat: 3 });

        let due = queue.take_due(500);
        assert_eq!(due, vec![Intent::See { seat: 2 }, Intent::Chaal { seat: 1 }]);
        assert_eq!(queue.len(), 1);

        // Nothing further until the clock reaches the last deadline.
        assert!(queue.take_due(899).is_empty());
        assert_eq!(queue.take_due(900), vec![Intent::Fold { seat: 3 }]);
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_tags_are_ignored() {
        let mut queue = ActionQueue::new();
        queue.schedule(100, 7, Intent::Chaal { seat: 0 });
        queue.schedule(200, 7, Intent::Fold { seat: 0 });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.take_due(1000), vec![Intent::Chaal { seat: 0 }]);
    }

    #[test]
    fn stale_schedules_can_be_retired_by_tag() {
        let mut queue = ActionQueue::new();
        queue.schedule(100, 1, Intent::Chaal { seat: 0 });
        queue.schedule(100, 2, Intent::Chaal { seat: 1 });
        queue.retain_tags(|tag| tag == 2);
        assert_eq!(queue.take_due(1000), vec![Intent::Chaal { seat: 1 }]);
    }
}
