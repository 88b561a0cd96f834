//! Bot decision-making for the betting table.
//!
//! The policy is a pure function of the bot's private hand, the visible
//! table context, and a caller-supplied source of randomness. The table
//! runtime and any test harness call it the same way; nothing in here
//! reads a clock or touches shared state.

use rand::Rng;

use crate::game::entities::{Player, Rupees};
use crate::game::eval::{HandCategory, HandRank, evaluate_hand, pair_value};

/// What a bot chooses to do with its turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BotAction {
    See,
    Chaal,
    Fold,
    SideShow,
}

/// Visible table context a bot decides from.
#[derive(Clone, Copy, Debug)]
pub struct BotContext {
    /// Players still contesting the pot.
    pub active_players: usize,
    pub pot: Rupees,
    pub boot_amount: Rupees,
    /// How many times the action has wrapped around the table this hand.
    pub betting_round: u32,
}

/// Tuning knobs for the bot policy. All chances are probabilities in
/// `[0.0, 1.0]`; all ratios are fractions of the bot's starting stack.
#[derive(Clone, Debug)]
pub struct BotPolicyConfig {
    /// Chance a blind bot looks at its cards in round one.
    pub base_see_chance: f64,
    /// Added see-chance per elapsed betting round.
    pub see_chance_per_round: f64,
    /// Pot size (as a fraction of starting stack) past which a blind bot
    /// gets nervous enough to consider looking.
    pub nervous_pot_ratio: f64,
    pub nervous_see_chance: f64,
    /// Side-show request chance indexed by hand strength tier (0-5).
    pub side_show_chance_by_tier: [f64; 6],
    /// Bluff chance on a high card when only two players remain.
    pub heads_up_bluff_chance: f64,
    /// Bluff chance on a high card in a multiway pot.
    pub multiway_bluff_chance: f64,
    /// Bluffing only happens while the pot is below this fraction of the
    /// bot's starting stack.
    pub bluff_pot_ratio: f64,
    /// Pairs below this card value count as weak.
    pub weak_pair_value: u32,
    /// Pot fraction past which a weak pair considers folding.
    pub weak_pair_pot_ratio: f64,
    pub weak_pair_fold_chance: f64,
    /// Chance of accepting a side show with a hand below a pair.
    pub weak_accept_chance: f64,
    /// Base thinking time before a turn action, in milliseconds.
    pub base_think_ms: u64,
    pub think_variance_ms: u64,
    /// Base delay before answering a side-show request.
    pub base_response_ms: u64,
    pub response_variance_ms: u64,
}

impl Default for BotPolicyConfig {
    fn default() -> Self {
        Self {
            base_see_chance: 0.10,
            see_chance_per_round: 0.15,
            nervous_pot_ratio: 0.25,
            nervous_see_chance: 0.30,
            side_show_chance_by_tier: [0.0, 0.0, 0.2, 0.3, 0.5, 0.6],
            heads_up_bluff_chance: 0.25,
            multiway_bluff_chance: 0.10,
            bluff_pot_ratio: 0.30,
            weak_pair_value: 8,
            weak_pair_pot_ratio: 0.50,
            weak_pair_fold_chance: 0.40,
            weak_accept_chance: 0.20,
            base_think_ms: 1000,
            think_variance_ms: 1500,
            base_response_ms: 1000,
            response_variance_ms: 1000,
        }
    }
}

/// Hand strength tier used by the policy: 0 invalid, 1 high card up to
/// 5 for a trio or straight flush.
pub fn strength_tier(rank: &HandRank) -> u8 {
    match rank.category {
        HandCategory::Invalid => 0,
        HandCategory::HighCard => 1,
        HandCategory::Pair => 2,
        HandCategory::Flush => 3,
        HandCategory::Straight => 4,
        HandCategory::StraightFlush | HandCategory::Trio => 5,
    }
}

/// The bot policy. Stateless; construct once and share.
#[derive(Clone, Debug, Default)]
pub struct BotPolicy {
    pub config: BotPolicyConfig,
}

impl BotPolicy {
    pub fn new(config: BotPolicyConfig) -> Self {
        Self { config }
    }

    /// Pick a turn action for a bot.
    pub fn decide(&self, player: &Player, ctx: &BotContext, rng: &mut impl Rng) -> BotAction {
        let cfg = &self.config;
        let stack = f64::from(player.initial_chips);

        if !player.is_seen {
            if player.chips < ctx.boot_amount {
                return BotAction::Fold;
            }
            // More likely to look as the rounds wear on.
            let see_chance =
                cfg.base_see_chance + f64::from(ctx.betting_round) * cfg.see_chance_per_round;
            if rng.random_bool(see_chance.min(1.0)) {
                return BotAction::See;
            }
            // A swelling pot makes a blind bot nervous enough to look.
            if stack > 0.0
                && f64::from(ctx.pot) > stack * cfg.nervous_pot_ratio
                && rng.random_bool(cfg.nervous_see_chance)
            {
                return BotAction::See;
            }
            return BotAction::Chaal;
        }

        if player.chips < ctx.boot_amount * 2 {
            return BotAction::Fold;
        }

        let rank = evaluate_hand(&player.cards);
        let tier = strength_tier(&rank);

        if ctx.active_players > 2
            && tier >= 2
            && rng.random_bool(cfg.side_show_chance_by_tier[usize::from(tier.min(5))])
        {
            return BotAction::SideShow;
        }

        match tier {
            1 => {
                let bluff_chance = if ctx.active_players <= 2 {
                    cfg.heads_up_bluff_chance
                } else {
                    cfg.multiway_bluff_chance
                };
                if stack > 0.0
                    && f64::from(ctx.pot) < stack * cfg.bluff_pot_ratio
                    && rng.random_bool(bluff_chance)
                {
                    return BotAction::Chaal;
                }
                BotAction::Fold
            }
            2 => {
                // A low pair bails out of a big pot some of the time.
                if stack > 0.0
                    && pair_value(&rank) < cfg.weak_pair_value
                    && f64::from(ctx.pot) > stack * cfg.weak_pair_pot_ratio
                    && rng.random_bool(cfg.weak_pair_fold_chance)
                {
                    return BotAction::Fold;
                }
                BotAction::Chaal
            }
            _ => BotAction::Chaal,
        }
    }

    /// Whether a bot accepts an incoming side-show request: always with a
    /// pair or better, occasionally with less.
    pub fn accept_side_show(&self, player: &Player, rng: &mut impl Rng) -> bool {
        let rank = evaluate_hand(&player.cards);
        strength_tier(&rank) >= 2 || rng.random_bool(self.config.weak_accept_chance)
    }

    /// Randomized thinking time before acting on a turn.
    pub fn think_delay_ms(&self, rng: &mut impl Rng) -> u64 {
        self.config.base_think_ms + rng.random_range(0..=self.config.think_variance_ms)
    }

    /// Randomized delay before answering a side-show request.
    pub fn response_delay_ms(&self, rng: &mut impl Rng) -> u64 {
        self.config.base_response_ms + rng.random_range(0..=self.config.response_variance_ms)
    }
}
