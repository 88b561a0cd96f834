//! Housie (90-ball number calling) engine: tickets, winner detection, the
//! authoritative game document, and the caller runtime.

pub mod caller;
pub mod state;
pub mod ticket;
pub mod winners;

pub use caller::{CallerMessage, CallerResponse, HousieCaller, HousieConfig, HousieHandle};
pub use state::{HousieState, SettingsUpdate, TOTAL_NUMBERS};
pub use ticket::{Ticket, TicketGrid, TicketId};
pub use winners::{Prize, PrizeConfig, PrizesConfig, Winners, detect_winners};
