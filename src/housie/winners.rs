//! Prize classification and winner detection.
//!
//! Runs after every number call. Idempotent and monotonic: re-running with
//! the same inputs never removes a recorded winner and never records the
//! same ticket twice for one prize.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::ticket::{NUMBERS_PER_TICKET, Ticket, TicketId};

/// Marks needed before a ticket qualifies for Early Seven.
pub const EARLY_SEVEN_MARKS: usize = 7;

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prize {
    EarlySeven,
    TopLine,
    MiddleLine,
    BottomLine,
    FullHouse,
}

impl Prize {
    pub const ALL: [Self; 5] = [
        Self::EarlySeven,
        Self::TopLine,
        Self::MiddleLine,
        Self::BottomLine,
        Self::FullHouse,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::EarlySeven => "Early Seven",
            Self::TopLine => "Top Line",
            Self::MiddleLine => "Middle Line",
            Self::BottomLine => "Bottom Line",
            Self::FullHouse => "Full House",
        }
    }
}

/// Winner count configured for one prize. A count of zero disables the
/// prize entirely.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PrizeConfig {
    pub label: String,
    pub count: u32,
}

impl PrizeConfig {
    pub fn new(label: &str, count: u32) -> Self {
        Self {
            label: label.to_string(),
            count,
        }
    }
}

pub type PrizesConfig = BTreeMap<Prize, PrizeConfig>;
/// Prize key to winning ticket ids, append-only and capped per prize.
pub type Winners = BTreeMap<Prize, Vec<TicketId>>;

/// One winner per prize, every prize enabled.
pub fn default_prizes() -> PrizesConfig {
    Prize::ALL
        .iter()
        .map(|prize| (*prize, PrizeConfig::new(prize.label(), 1)))
        .collect()
}

fn quota(prizes: &PrizesConfig, prize: Prize) -> u32 {
    prizes.get(&prize).map_or(1, |cfg| cfg.count)
}

fn qualifies(prize: Prize, ticket: &Ticket, called: &BTreeSet<u8>) -> bool {
    match prize {
        Prize::EarlySeven => ticket.marked_count(called) >= EARLY_SEVEN_MARKS,
        Prize::TopLine => ticket.row_complete(0, called),
        Prize::MiddleLine => ticket.row_complete(1, called),
        Prize::BottomLine => ticket.row_complete(2, called),
        Prize::FullHouse => ticket.marked_count(called) == NUMBERS_PER_TICKET,
    }
}

/// Fold newly-qualifying tickets into the winners mapping, in ticket order,
/// until each prize's quota closes it.
pub fn detect_winners(
    tickets: &[Ticket],
    called: &BTreeSet<u8>,
    previous: &Winners,
    prizes: &PrizesConfig,
) -> Winners {
    let mut winners = previous.clone();
    for prize in Prize::ALL {
        let quota = quota(prizes, prize);
        if quota == 0 {
            continue;
        }
        let recorded = winners.entry(prize).or_default();
        for ticket in tickets {
            if recorded.len() >= quota as usize {
                break;
            }
            if recorded.contains(&ticket.id) {
                continue;
            }
            if qualifies(prize, ticket, called) {
                recorded.push(ticket.id);
            }
        }
    }
    winners
}

/// Whether the full-house quota has been met, which ends the game.
pub fn full_house_complete(winners: &Winners, prizes: &PrizesConfig) -> bool {
    let quota = quota(prizes, Prize::FullHouse);
    quota > 0
        && winners
            .get(&Prize::FullHouse)
            .is_some_and(|w| w.len() >= quota as usize)
}

/// Whether every enabled prize has reached its quota.
pub fn all_prizes_claimed(winners: &Winners, prizes: &PrizesConfig) -> bool {
    let mut any_enabled = false;
    for prize in Prize::ALL {
        let quota = quota(prizes, prize);
        if quota == 0 {
            continue;
        }
        any_enabled = true;
        let closed = winners
            .get(&prize)
            .is_some_and(|w| w.len() >= quota as usize);
        if !closed {
            return false;
        }
    }
    any_enabled
}
