//! # Game Hub
//!
//! Engines for two casual multiplayer browser games: a Teen Patti betting
//! table and a Housie (90-ball) number caller.
//!
//! Both games share one architectural rule: the entire game is a single
//! authoritative document, advanced only by pure transition functions, and
//! fanned out to every viewer on change. The same transitions run in two
//! deployment shapes:
//!
//! - **Single process**: bots plus one human against the in-memory store.
//! - **Shared replicated**: multiple browsers against a Postgres-backed
//!   store, every transition an optimistic compare-and-swap transaction.
//!
//! ## Core Modules
//!
//! - [`game`]: Teen Patti entities, hand evaluation, and the table state
//!   machine
//! - [`housie`]: ticket generation, winner detection, and the caller
//! - [`bot`]: the pure bot policy and its delayed-action queue
//! - [`store`]: the transactional document store abstraction
//! - [`table`]: the actor that drives a betting table end to end
//!
//! ## Example
//!
//! ```
//! use game_hub::game::{Intent, TableState};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let now = chrono::Utc::now();
//!
//! let table = TableState::new(10, None);
//! let table = table.apply(
//!     &Intent::Join {
//!         unique_id: "guest".into(),
//!         name: "Guest".into(),
//!         chips: 10_000,
//!         is_bot: false,
//!     },
//!     now,
//!     &mut rng,
//! );
//! assert_eq!(table.players.len(), 1);
//! ```

pub mod bot;
pub mod game;
pub mod housie;
pub mod store;
pub mod table;

pub use game::{
    GamePhase, HandCategory, HandRank, Intent, TableState, evaluate_hand,
    state_machine::{SideShowRequest, SideShowResult, WinnerInfo},
};
pub use housie::{HousieCaller, HousieConfig, HousieState};
pub use store::{MemoryStore, PgStore, Store, StoreConfig};
pub use table::{TableActor, TableConfig, TableHandle};
