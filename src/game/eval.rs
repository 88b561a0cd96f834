//! Three-card hand evaluation.
//!
//! A hand ranks into one of six categories, strongest first: Trio,
//! Straight Flush, Straight, Flush, Pair, High Card. Each category owns a
//! 100,000-wide score band, and the tie-break value inside the band is
//! derived from the card values sorted descending, so any two hands compare
//! with a single integer comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::HAND_SIZE;
use super::entities::{Card, Value};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum HandCategory {
    /// Sentinel for a malformed hand (not exactly three cards).
    Invalid,
    HighCard,
    Pair,
    Flush,
    Straight,
    StraightFlush,
    Trio,
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Invalid => "Invalid Hand",
            Self::HighCard => "High Card",
            Self::Pair => "Pair",
            Self::Flush => "Flush",
            Self::Straight => "Straight",
            Self::StraightFlush => "Straight Flush",
            Self::Trio => "Trio",
        };
        write!(f, "{repr}")
    }
}

/// Score band offsets per category.
pub const TRIO_BASE: u32 = 600_000;
pub const STRAIGHT_FLUSH_BASE: u32 = 500_000;
pub const STRAIGHT_BASE: u32 = 400_000;
pub const FLUSH_BASE: u32 = 300_000;
pub const PAIR_BASE: u32 = 200_000;
pub const HIGH_CARD_BASE: u32 = 100_000;

/// A totally-ordered evaluation of a three-card hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandRank {
    pub score: u32,
    pub category: HandCategory,
}

impl HandRank {
    const INVALID: Self = Self {
        score: 0,
        category: HandCategory::Invalid,
    };
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score.cmp(&other.score)
    }
}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Evaluate a three-card hand. Anything other than exactly three cards
/// yields the invalid sentinel; this never panics.
pub fn evaluate_hand(cards: &[Card]) -> HandRank {
    if cards.len() != HAND_SIZE {
        return HandRank::INVALID;
    }

    let mut v: [Value; 3] = [cards[0].0, cards[1].0, cards[2].0];
    v.sort_unstable_by(|a, b| b.cmp(a));
    let [v0, v1, v2] = v.map(u32::from);

    let is_flush = cards.iter().all(|c| c.1 == cards[0].1);
    // Three consecutive values, or the special low run where the ace
    // plays below the two.
    let is_straight = (v0 == v1 + 1 && v1 == v2 + 1) || (v0 == 14 && v1 == 3 && v2 == 2);

    if v0 == v1 && v1 == v2 {
        return HandRank {
            score: TRIO_BASE + v0,
            category: HandCategory::Trio,
        };
    }
    if is_flush && is_straight {
        return HandRank {
            score: STRAIGHT_FLUSH_BASE + v0,
            category: HandCategory::StraightFlush,
        };
    }
    if is_straight {
        return HandRank {
            score: STRAIGHT_BASE + v0,
            category: HandCategory::Straight,
        };
    }
    if is_flush {
        return HandRank {
            score: FLUSH_BASE + v0 * 100 + v1 * 10 + v2,
            category: HandCategory::Flush,
        };
    }
    if v0 == v1 || v1 == v2 {
        let pair = if v0 == v1 { v0 } else { v1 };
        return HandRank {
            score: PAIR_BASE + pair * 100 + v2,
            category: HandCategory::Pair,
        };
    }
    HandRank {
        score: HIGH_CARD_BASE + v0 * 100 + v1 * 10 + v2,
        category: HandCategory::HighCard,
    }
}

/// The pair's card value, recovered from a pair-band score.
pub fn pair_value(rank: &HandRank) -> u32 {
    (rank.score - PAIR_BASE) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit::{Club, Diamond, Heart, Spade};

    #[test]
    fn trio_outranks_everything() {
        let rank = evaluate_hand(&[Card(2, Spade), Card(2, Heart), Card(2, Diamond)]);
        assert_eq!(rank.category, HandCategory::Trio);
        assert!(rank.score >= TRIO_BASE);
    }

    #[test]
    fn straight_flush_is_recognized() {
        let rank = evaluate_hand(&[Card(2, Spade), Card(3, Spade), Card(4, Spade)]);
        assert_eq!(rank.category, HandCategory::StraightFlush);
    }

    #[test]
    fn ace_low_run_is_a_straight_flush() {
        let rank = evaluate_hand(&[Card(14, Spade), Card(2, Spade), Card(3, Spade)]);
        assert_eq!(rank.category, HandCategory::StraightFlush);
    }

    #[test]
    fn ace_low_run_offsuit_is_a_straight() {
        let rank = evaluate_hand(&[Card(14, Spade), Card(2, Heart), Card(3, Spade)]);
        assert_eq!(rank.category, HandCategory::Straight);
    }

    #[test]
    fn pair_with_kicker() {
        let rank = evaluate_hand(&[Card(13, Spade), Card(13, Heart), Card(3, Diamond)]);
        assert_eq!(rank.category, HandCategory::Pair);
        assert_eq!(pair_value(&rank), 13);
    }

    #[test]
    fn high_card_fallback() {
        let rank = evaluate_hand(&[Card(2, Club), Card(7, Diamond), Card(11, Spade)]);
        assert_eq!(rank.category, HandCategory::HighCard);
    }

    #[test]
    fn categories_order_consistently() {
        let trio = evaluate_hand(&[Card(2, Spade), Card(2, Heart), Card(2, Diamond)]);
        let straight_flush = evaluate_hand(&[Card(3, Club), Card(4, Club), Card(5, Club)]);
        let straight = evaluate_hand(&[Card(9, Club), Card(10, Heart), Card(11, Club)]);
        let flush = evaluate_hand(&[Card(2, Heart), Card(8, Heart), Card(12, Heart)]);
        let pair = evaluate_hand(&[Card(14, Spade), Card(14, Heart), Card(9, Club)]);
        let high = evaluate_hand(&[Card(14, Spade), Card(12, Heart), Card(9, Club)]);
        let scores = [trio, straight_flush, straight, flush, pair, high].map(|r| r.score);
        let sorted = {
            let mut s = scores;
            s.sort_unstable_by(|a, b| b.cmp(a));
            s
        };
        assert_eq!(scores, sorted, "category bands must be strictly ordered");
    }

    #[test]
    fn higher_card_wins_within_high_card_band() {
        let ace_high = evaluate_hand(&[Card(14, Spade), Card(9, Heart), Card(4, Club)]);
        let king_high = evaluate_hand(&[Card(13, Spade), Card(9, Diamond), Card(4, Heart)]);
        assert!(ace_high > king_high);
    }

    #[test]
    fn wrong_card_count_is_the_invalid_sentinel() {
        assert_eq!(evaluate_hand(&[]).category, HandCategory::Invalid);
        let two = [Card(2, Spade), Card(3, Heart)];
        assert_eq!(evaluate_hand(&two).category, HandCategory::Invalid);
        assert_eq!(evaluate_hand(&two).score, 0);
    }
}
