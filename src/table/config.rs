//! Table configuration models.

use serde::{Deserialize, Serialize};

use crate::game::constants::{
    DEFAULT_STARTING_CHIPS, DEFAULT_TURN_SECS, MAX_PLAYERS, MIN_PLAYERS, SIDE_SHOW_RESPONSE_SECS,
};
use crate::game::entities::Rupees;

/// Configuration for one betting table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableConfig {
    /// Table name, shown in logs.
    pub name: String,

    /// Base stake unit for this table.
    pub boot_amount: Rupees,

    /// Maximum number of seats.
    pub max_players: usize,

    /// Seconds a player has before their turn is force-folded.
    pub turn_duration_secs: u32,

    /// Seconds a side-show target has to answer before a deny.
    pub side_show_response_secs: u32,

    /// Session length in minutes; `None` leaves the table open-ended.
    /// When set, the session clock starts at table creation.
    pub session_minutes: Option<u32>,

    /// Whether the table fills empty seats with bots.
    pub bots_enabled: bool,

    /// Target total seat count when bots are enabled.
    pub target_bot_count: usize,

    pub bot_starting_chips: Rupees,

    /// Argon2id hash of the admin/reset code, if one is configured.
    pub admin_code_hash: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            boot_amount: 10,
            max_players: MAX_PLAYERS,
            turn_duration_secs: DEFAULT_TURN_SECS,
            side_show_response_secs: SIDE_SHOW_RESPONSE_SECS,
            session_minutes: None,
            bots_enabled: false,
            target_bot_count: MAX_PLAYERS,
            bot_starting_chips: DEFAULT_STARTING_CHIPS,
            admin_code_hash: None,
        }
    }
}

impl TableConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.boot_amount == 0 {
            return Err("Boot amount must be positive".to_string());
        }
        if self.max_players < MIN_PLAYERS || self.max_players > MAX_PLAYERS {
            return Err(format!(
                "Max players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            ));
        }
        if self.turn_duration_secs == 0 {
            return Err("Turn duration must be positive".to_string());
        }
        if self.bots_enabled && self.target_bot_count > self.max_players {
            return Err("Bot target cannot exceed the seat count".to_string());
        }
        Ok(())
    }

    /// When the session ends for a table created at `created_at`.
    pub fn session_end_from(
        &self,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Option<chrono::DateTime<chrono::Utc>> {
        self.session_minutes
            .map(|mins| created_at + chrono::Duration::minutes(i64::from(mins)))
    }

    /// Check a submitted admin code against the configured hash. Tables
    /// without a configured code reject everything.
    pub fn verify_admin_code(&self, code: &str) -> bool {
        use argon2::{Argon2, PasswordHash, PasswordVerifier};

        let Some(hash) = &self.admin_code_hash else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(hash) else {
            log::error!("invalid admin code hash for table {}", self.name);
            return false;
        };
        Argon2::default()
            .verify_password(code.as_bytes(), &parsed)
            .is_ok()
    }

    /// Hash an admin code for storage in the config.
    pub fn hash_admin_code(code: &str) -> Result<String, String> {
        use argon2::password_hash::{SaltString, rand_core::OsRng};
        use argon2::{Argon2, PasswordHasher};

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(code.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| format!("failed to hash admin code: {err}"))
    }
}
