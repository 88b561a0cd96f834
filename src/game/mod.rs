//! Teen Patti engine: entities, hand evaluation, and the table state machine.
//!
//! The table is modeled as a single authoritative document ([`TableState`])
//! advanced by a pure transition function over a closed [`Intent`] set.
//! Everything above this module (the store, the table runtime, bots) speaks
//! to the game exclusively through that transition.

pub mod constants;
pub mod entities;
pub mod eval;
pub mod state_machine;

pub use entities::{Card, Deck, Player, PlayerStatus, Rupees, SeatIndex, Suit};
pub use eval::{HandCategory, HandRank, evaluate_hand};
pub use state_machine::{
    GamePhase, Intent, SideShowRequest, SideShowResult, TableState, WinnerInfo,
};
