//! The authoritative Housie game document and its transitions.
//!
//! Like the betting table, the whole game is one document advanced by pure
//! transitions, so it works identically against the in-memory store and the
//! replicated one.

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ticket::{Ticket, TicketId};
use super::winners::{
    PrizesConfig, Winners, all_prizes_claimed, default_prizes, detect_winners, full_house_complete,
};

/// Numbers called in this game, 1 through 90.
pub const TOTAL_NUMBERS: u8 = 90;

pub const DEFAULT_TICKET_COUNT: usize = 100;
pub const DEFAULT_ACTIVE_TICKET_LIMIT: usize = 100;

/// Seconds between calls when auto play is on.
pub const AUTO_CALL_INTERVAL_SECS: i64 = 5;

/// A partial settings write from the admin surface. `None` fields are left
/// untouched; `scheduled_start_at` is doubly optional so the schedule can
/// be cleared.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SettingsUpdate {
    pub prizes_config: Option<PrizesConfig>,
    pub active_ticket_limit: Option<usize>,
    pub scheduled_start_at: Option<Option<DateTime<Utc>>>,
    pub is_auto_playing: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HousieState {
    /// Append-only, no duplicates, values in 1..=90.
    pub called_numbers: Vec<u8>,
    pub current_number: Option<u8>,
    pub previous_number: Option<u8>,
    /// Remaining numbers to call; a permutation of the complement of
    /// `called_numbers`.
    pub shuffled_queue: Vec<u8>,
    pub tickets: Vec<Ticket>,
    pub winners: Winners,
    pub prizes_config: PrizesConfig,
    /// Only the first N tickets are in play.
    pub active_ticket_limit: usize,
    pub is_game_over: bool,
    pub is_auto_playing: bool,
    pub last_call_at: Option<DateTime<Utc>>,
    pub scheduled_start_at: Option<DateTime<Utc>>,
}

impl HousieState {
    /// A fresh game: full shuffled queue, fresh unbooked tickets, no
    /// winners.
    pub fn new(ticket_count: usize, rng: &mut impl Rng) -> Self {
        let mut queue: Vec<u8> = (1..=TOTAL_NUMBERS).collect();
        queue.shuffle(rng);
        let tickets = (1..=ticket_count as TicketId)
            .map(|id| Ticket::generate(id, rng))
            .collect();
        Self {
            called_numbers: Vec::new(),
            current_number: None,
            previous_number: None,
            shuffled_queue: queue,
            tickets,
            winners: Winners::new(),
            prizes_config: default_prizes(),
            active_ticket_limit: DEFAULT_ACTIVE_TICKET_LIMIT,
            is_game_over: false,
            is_auto_playing: false,
            last_call_at: None,
            scheduled_start_at: None,
        }
    }

    /// The tickets currently in play.
    pub fn active_tickets(&self) -> &[Ticket] {
        let limit = self.active_ticket_limit.min(self.tickets.len());
        &self.tickets[..limit]
    }

    pub fn called_set(&self) -> BTreeSet<u8> {
        self.called_numbers.iter().copied().collect()
    }

    /// Call the next number and re-run winner detection. A finished game or
    /// an empty queue makes this a no-op.
    #[must_use]
    pub fn call_next(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if next.is_game_over || next.shuffled_queue.is_empty() {
            return next;
        }

        let number = next.shuffled_queue.remove(0);
        next.previous_number = next.current_number;
        next.current_number = Some(number);
        next.called_numbers.push(number);
        next.last_call_at = Some(now);

        let called = next.called_set();
        next.winners = detect_winners(
            next.active_tickets(),
            &called,
            &next.winners,
            &next.prizes_config,
        );

        next.is_game_over = full_house_complete(&next.winners, &next.prizes_config)
            || next.shuffled_queue.is_empty()
            || all_prizes_claimed(&next.winners, &next.prizes_config);
        next
    }

    #[must_use]
    pub fn update_settings(&self, update: &SettingsUpdate) -> Self {
        let mut next = self.clone();
        if let Some(prizes) = &update.prizes_config {
            next.prizes_config = prizes.clone();
        }
        if let Some(limit) = update.active_ticket_limit {
            next.active_ticket_limit = limit.max(1);
        }
        if let Some(scheduled) = update.scheduled_start_at {
            next.scheduled_start_at = scheduled;
        }
        if let Some(auto) = update.is_auto_playing {
            next.is_auto_playing = auto;
        }
        next
    }

    /// Book unowned tickets under a name. Returns the new state plus the
    /// ids actually booked and the ids that were already owned.
    #[must_use]
    pub fn book_tickets(&self, ids: &[TicketId], owner: &str) -> (Self, Vec<TicketId>, Vec<TicketId>) {
        let mut next = self.clone();
        let mut booked = Vec::new();
        let mut already_owned = Vec::new();
        for &id in ids {
            let Some(ticket) = next.tickets.iter_mut().find(|t| t.id == id) else {
                continue;
            };
            if ticket.owner.is_none() {
                ticket.owner = Some(owner.to_string());
                booked.push(id);
            } else {
                already_owned.push(id);
            }
        }
        (next, booked, already_owned)
    }

    /// Release bookings by ticket id, by owner name, or both. Returns the
    /// new state and how many tickets were released.
    #[must_use]
    pub fn unbook_tickets(&self, ids: &[TicketId], owner: Option<&str>) -> (Self, usize) {
        let mut next = self.clone();
        let mut released = 0;
        for ticket in &mut next.tickets {
            let by_id = ids.contains(&ticket.id);
            let by_owner = owner.is_some_and(|name| ticket.owner.as_deref() == Some(name));
            if (by_id || by_owner) && ticket.owner.is_some() {
                ticket.owner = None;
                released += 1;
            }
        }
        (next, released)
    }

    /// Whether the auto-play cadence is due for another call.
    pub fn auto_call_due(&self, now: DateTime<Utc>, interval_secs: i64) -> bool {
        if !self.is_auto_playing || self.is_game_over || self.shuffled_queue.is_empty() {
            return false;
        }
        match self.last_call_at {
            Some(last) => now - last >= chrono::Duration::seconds(interval_secs),
            None => true,
        }
    }

    /// Whether a configured start time has arrived for a game that hasn't
    /// begun calling yet.
    pub fn scheduled_start_due(&self, now: DateTime<Utc>) -> bool {
        self.called_numbers.is_empty()
            && !self.is_game_over
            && self.scheduled_start_at.is_some_and(|start| now >= start)
    }
}
