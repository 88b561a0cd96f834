//! Bot players: a pure decision policy and the delayed-action queue the
//! table runtime uses to pace them.

pub mod decision;
pub mod scheduler;

pub use decision::{BotAction, BotContext, BotPolicy, BotPolicyConfig, strength_tier};
pub use scheduler::{ActionQueue, ScheduledIntent};

/// Call signs bots sit down with.
pub const BOT_NAMES: [&str; 15] = [
    "Viper", "Maverick", "Goose", "Iceman", "Rooster", "Phoenix", "Bob", "Alice", "Charlie",
    "Delta", "Rocky", "Ace", "King", "Queen", "Jack",
];
