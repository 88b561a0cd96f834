use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{DECK_SIZE, HAND_SIZE};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values. Two is 2, ace is 14 (aces play high,
/// except in the special A-3-2 run).
pub type Value = u8;

/// A card is a tuple of a value and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            14 => write!(f, "A{}", self.1),
            11 => write!(f, "J{}", self.1),
            12 => write!(f, "Q{}", self.1),
            13 => write!(f, "K{}", self.1),
            v => write!(f, "{v}{}", self.1),
        }
    }
}

/// A full deck of cards. Instantiated fresh for each deal and shuffled
/// with a caller-supplied source of randomness so tests can seed it.
#[derive(Debug)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
    deck_idx: usize,
}

impl Deck {
    pub fn shuffled(rng: &mut impl Rng) -> Self {
        let mut deck = Self::default();
        deck.cards.shuffle(rng);
        deck
    }

    pub fn deal_card(&mut self) -> Card {
        let card = self.cards[self.deck_idx];
        self.deck_idx += 1;
        card
    }

    /// Deal a full Teen Patti hand.
    pub fn deal_hand(&mut self) -> Vec<Card> {
        (0..HAND_SIZE).map(|_| self.deal_card()).collect()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = [Card(2, Suit::Club); DECK_SIZE];
        for (i, value) in (2u8..=14u8).enumerate() {
            for (j, suit) in [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart]
                .into_iter()
                .enumerate()
            {
                cards[4 * i + j] = Card(value, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Type alias for whole rupees. All stakes and player stacks are whole
/// rupees; fractional stakes don't exist at these tables.
pub type Rupees = u32;

/// Type alias for seat positions. Seat order is turn order.
pub type SeatIndex = usize;

/// Where a player is in the table lifecycle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// Seat reserved but the player hasn't confirmed yet.
    Waiting,
    /// In the lobby, ready for the next deal.
    Joined,
    /// Dealt into the current hand.
    Playing,
}

/// A player at a table. Owned exclusively by the table state; mutated only
/// through [`TableState::apply`](super::state_machine::TableState::apply).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    /// Stable per-table seat index.
    pub seat: SeatIndex,
    /// Per-session identity, assigned at join time.
    pub unique_id: String,
    pub name: String,
    pub is_bot: bool,
    /// Empty between hands, exactly three cards while playing.
    pub cards: Vec<Card>,
    pub chips: Rupees,
    /// Stack snapshot at hand start, for net-win reporting.
    pub initial_chips: Rupees,
    pub is_folded: bool,
    /// Whether the player has looked at their own cards this hand.
    /// Monotonic within a hand: false to true, never back.
    pub is_seen: bool,
    pub status: PlayerStatus,
}

impl Player {
    pub fn new(seat: SeatIndex, unique_id: &str, name: &str, chips: Rupees) -> Self {
        Self {
            seat,
            unique_id: unique_id.to_string(),
            name: name.to_string(),
            is_bot: false,
            cards: Vec::new(),
            chips,
            initial_chips: chips,
            is_folded: false,
            is_seen: false,
            status: PlayerStatus::Joined,
        }
    }

    pub fn bot(seat: SeatIndex, unique_id: &str, name: &str, chips: Rupees) -> Self {
        Self {
            is_bot: true,
            ..Self::new(seat, unique_id, name, chips)
        }
    }

    /// Active means still contesting the pot this hand.
    pub fn is_active(&self) -> bool {
        !self.is_folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    #[test]
    fn deck_is_a_permutation_of_all_fifty_two_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        let deck = Deck::shuffled(&mut rng);
        let unique: BTreeSet<_> = deck.cards().iter().copied().collect();
        assert_eq!(unique.len(), DECK_SIZE);
        for value in 2u8..=14 {
            for suit in [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart] {
                assert!(unique.contains(&Card(value, suit)), "missing {value}{suit}");
            }
        }
    }

    #[test]
    fn deal_hand_returns_three_distinct_cards() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut deck = Deck::shuffled(&mut rng);
        let hand = deck.deal_hand();
        assert_eq!(hand.len(), HAND_SIZE);
        let unique: BTreeSet<_> = hand.iter().copied().collect();
        assert_eq!(unique.len(), HAND_SIZE);
    }
}
