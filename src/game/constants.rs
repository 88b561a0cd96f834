//! Game-wide constants.

use super::entities::Rupees;

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// Cards dealt to each player at the start of a hand.
pub const HAND_SIZE: usize = 3;

/// Maximum number of seats at a table.
pub const MAX_PLAYERS: usize = 4;

/// Minimum number of joined players required to deal a hand.
pub const MIN_PLAYERS: usize = 2;

/// Default stack a player sits down with when no stack is configured.
pub const DEFAULT_STARTING_CHIPS: Rupees = 10_000;

/// Boot amounts offered by the hub, one table per amount.
pub const BOOT_AMOUNTS: [Rupees; 4] = [10, 50, 100, 500];

/// Seconds a player has to act before being force-folded.
pub const DEFAULT_TURN_SECS: u32 = 30;

/// Seconds a side-show target has to respond before the request is denied.
pub const SIDE_SHOW_RESPONSE_SECS: u32 = 10;
