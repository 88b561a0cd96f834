//! Teen Patti table state machine.
//!
//! The whole table lives in a single [`TableState`] document. Every change,
//! whether it comes from a human, a bot, or a timer, is expressed as an
//! [`Intent`] and applied through [`TableState::apply`], which is a pure
//! function of the current state: it returns a fresh state and never touches
//! ambient context, so a transactional store can re-invoke it safely when a
//! concurrent writer wins the race.
//!
//! Illegal intents (wrong turn, wrong phase, folded actor, stale duplicates)
//! leave the state untouched rather than erroring. The presentation layer is
//! expected to gate affordances, but the engine must survive anything a stale
//! client can throw at it.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_TURN_SECS, MAX_PLAYERS, MIN_PLAYERS};
use super::entities::{Deck, Player, PlayerStatus, Rupees, SeatIndex};
use super::eval::evaluate_hand;

pub const LAST_REMAINING: &str = "Last remaining player";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Accepting joins, pre-deal.
    Lobby,
    /// Turn-based wagering in progress.
    Betting,
    /// Hand resolved; terminal until the next deal.
    Showdown,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WinnerInfo {
    pub seat: SeatIndex,
    pub hand_name: String,
}

/// A pending private card comparison. While one of these is outstanding,
/// only the target's response may move the game forward.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SideShowRequest {
    pub initiator: SeatIndex,
    pub target: SeatIndex,
    pub amount: Rupees,
}

/// Outcome of a resolved side show. Carries seat indices only; the loser's
/// cards are never published, viewers involved in the comparison resolve
/// them from their own private view.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SideShowResult {
    pub initiator: SeatIndex,
    pub target: SeatIndex,
    pub winner: SeatIndex,
    pub loser: SeatIndex,
}

/// Everything that can happen to a table. Closed set with exhaustive
/// handling; a new action cannot be silently mis-dispatched.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Intent {
    Join {
        unique_id: String,
        name: String,
        chips: Rupees,
        is_bot: bool,
    },
    Leave {
        unique_id: String,
    },
    Deal,
    See {
        seat: SeatIndex,
    },
    Chaal {
        seat: SeatIndex,
    },
    Fold {
        seat: SeatIndex,
    },
    Show {
        seat: SeatIndex,
    },
    SideShowRequest {
        seat: SeatIndex,
    },
    SideShowResponse {
        seat: SeatIndex,
        accepted: bool,
    },
    TurnTimeout,
    PlayAgain,
    /// Play-again that also lifts a session-expiry lock. The admin code
    /// check happens at the table runtime; the engine only applies it.
    AdminReset,
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum TurnAction {
    Chaal,
    Fold,
    Show,
}

/// The authoritative table document. Every viewer derives its UI purely
/// from the latest snapshot of this.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableState {
    /// Seat order is turn order.
    pub players: Vec<Player>,
    pub pot: Rupees,
    /// Base stake unit. Blind calls cost 1x, seen calls 2x.
    pub boot_amount: Rupees,
    pub game_phase: GamePhase,
    /// Index into `players` of the seat to act.
    pub current_player_index: usize,
    pub is_game_over: bool,
    pub winner_info: Option<WinnerInfo>,
    /// Whether hands still held at game over become publicly visible.
    pub showdown_reveal: bool,
    pub side_show_request: Option<SideShowRequest>,
    pub side_show_result: Option<SideShowResult>,
    pub turn_time_left: u32,
    pub turn_duration: u32,
    /// Counts how many times the action has wrapped around the table
    /// this hand. Feeds the bot policy.
    pub betting_round: u32,
    /// Hands dealt over the table's lifetime.
    pub hands_played: u32,
    /// When set and passed, dealing locks between hands until an
    /// administrative reset. A hand in progress is never interrupted.
    pub session_end_time: Option<DateTime<Utc>>,
}

impl TableState {
    pub fn new(boot_amount: Rupees, session_end_time: Option<DateTime<Utc>>) -> Self {
        Self {
            players: Vec::new(),
            pot: 0,
            boot_amount,
            game_phase: GamePhase::Lobby,
            current_player_index: 0,
            is_game_over: false,
            winner_info: None,
            showdown_reveal: false,
            side_show_request: None,
            side_show_result: None,
            turn_time_left: DEFAULT_TURN_SECS,
            turn_duration: DEFAULT_TURN_SECS,
            betting_round: 0,
            hands_played: 0,
            session_end_time,
        }
    }

    /// Apply one intent, returning the next authoritative state. Pure: the
    /// input state is untouched, and an illegal intent returns an identical
    /// copy. `now` and `rng` are the only outside inputs (session checks and
    /// the deal shuffle), injected so tests can pin them.
    #[must_use]
    pub fn apply(&self, intent: &Intent, now: DateTime<Utc>, rng: &mut impl Rng) -> Self {
        let mut next = self.clone();
        match intent {
            Intent::Join {
                unique_id,
                name,
                chips,
                is_bot,
            } => next.join(unique_id, name, *chips, *is_bot),
            Intent::Leave { unique_id } => next.leave(unique_id),
            Intent::Deal => next.deal(now, rng),
            Intent::See { seat } => next.see(*seat),
            Intent::Chaal { seat } => next.turn_action(*seat, TurnAction::Chaal),
            Intent::Fold { seat } => next.turn_action(*seat, TurnAction::Fold),
            Intent::Show { seat } => next.turn_action(*seat, TurnAction::Show),
            Intent::SideShowRequest { seat } => next.request_side_show(*seat),
            Intent::SideShowResponse { seat, accepted } => {
                next.respond_side_show(*seat, *accepted);
            }
            Intent::TurnTimeout => next.turn_timeout(),
            Intent::PlayAgain => next.play_again(),
            Intent::AdminReset => {
                if next.is_game_over {
                    next.reset_for_next_hand();
                    next.session_end_time = None;
                }
            }
        }
        next
    }

    /// One second of wall clock elapsed. Returns the next state, or `None`
    /// when the timer isn't running (not betting, hand over, or a side-show
    /// response outstanding). Reaching zero force-folds the player to act.
    #[must_use]
    pub fn tick_turn_timer(&self, now: DateTime<Utc>, rng: &mut impl Rng) -> Option<Self> {
        if self.game_phase != GamePhase::Betting
            || self.is_game_over
            || self.side_show_request.is_some()
        {
            return None;
        }
        let mut next = self.clone();
        next.turn_time_left = next.turn_time_left.saturating_sub(1);
        if next.turn_time_left == 0 {
            next = next.apply(&Intent::TurnTimeout, now, rng);
        }
        Some(next)
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn player_by_seat(&self, seat: SeatIndex) -> Option<&Player> {
        self.players.iter().find(|p| p.seat == seat)
    }

    pub fn player_by_unique_id(&self, unique_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.unique_id == unique_id)
    }

    pub fn is_session_expired(&self, now: DateTime<Utc>) -> bool {
        self.session_end_time.is_some_and(|end| now > end)
    }

    /// What a chaal costs the given player right now.
    pub fn chaal_stake(&self, player: &Player) -> Rupees {
        if player.is_seen {
            self.boot_amount * 2
        } else {
            self.boot_amount
        }
    }

    fn index_of_seat(&self, seat: SeatIndex) -> Option<usize> {
        self.players.iter().position(|p| p.seat == seat)
    }

    /// Who a side-show request from the current player would be aimed at:
    /// the nearest still-active predecessor in seat order.
    pub fn side_show_target(&self) -> Option<&Player> {
        self.side_show_target_index().map(|idx| &self.players[idx])
    }

    fn side_show_target_index(&self) -> Option<usize> {
        let len = self.players.len();
        if len == 0 {
            return None;
        }
        let current = self.current_player_index;
        let mut scan = current;
        for _ in 0..len {
            scan = (scan + len - 1) % len;
            if scan == current {
                break;
            }
            if !self.players[scan].is_folded {
                return Some(scan);
            }
        }
        None
    }

    fn join(&mut self, unique_id: &str, name: &str, chips: Rupees, is_bot: bool) {
        if self.game_phase != GamePhase::Lobby
            || self.players.len() >= MAX_PLAYERS
            || self.players.iter().any(|p| p.unique_id == unique_id)
        {
            return;
        }
        let seat = self.players.iter().map(|p| p.seat + 1).max().unwrap_or(0);
        let player = if is_bot {
            Player::bot(seat, unique_id, name, chips)
        } else {
            Player::new(seat, unique_id, name, chips)
        };
        self.players.push(player);
    }

    /// A player leaving mid-hand folds first, then vacates the seat.
    fn leave(&mut self, unique_id: &str) {
        let Some(idx) = self.players.iter().position(|p| p.unique_id == unique_id) else {
            return;
        };

        let seat = self.players[idx].seat;
        if self
            .side_show_request
            .as_ref()
            .is_some_and(|r| r.initiator == seat || r.target == seat)
        {
            self.side_show_request = None;
        }

        if self.game_phase == GamePhase::Betting
            && !self.is_game_over
            && !self.players[idx].is_folded
        {
            self.players[idx].is_folded = true;
            if self.active_count() <= 1 {
                // An abandonment win reveals nothing.
                self.showdown_reveal = false;
                self.resolve_last_remaining();
            } else if self.current_player_index == idx {
                self.advance_turn();
            }
        }

        self.players.remove(idx);
        if idx < self.current_player_index {
            self.current_player_index -= 1;
        } else if self.current_player_index >= self.players.len() {
            self.current_player_index = 0;
        }
    }

    fn deal(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) {
        if self.game_phase != GamePhase::Lobby || self.is_game_over {
            return;
        }
        if self.is_session_expired(now) {
            return;
        }
        let boot = self.boot_amount;
        let dealt = self
            .players
            .iter()
            .filter(|p| !p.is_folded && p.chips >= boot)
            .count();
        if dealt < MIN_PLAYERS {
            return;
        }

        let mut deck = Deck::shuffled(rng);
        let mut contribution = 0;
        for player in &mut self.players {
            if player.is_folded {
                continue;
            }
            if player.chips < boot {
                // Can't cover the boot: sits this hand out.
                player.is_folded = true;
                continue;
            }
            player.initial_chips = player.chips;
            player.cards = deck.deal_hand();
            player.chips -= boot;
            contribution += boot;
            player.is_seen = false;
            player.status = PlayerStatus::Playing;
        }
        self.pot += contribution;
        self.game_phase = GamePhase::Betting;
        self.current_player_index = self
            .players
            .iter()
            .position(|p| !p.is_folded)
            .unwrap_or(0);
        self.is_game_over = false;
        self.winner_info = None;
        self.showdown_reveal = false;
        self.side_show_request = None;
        self.side_show_result = None;
        self.turn_time_left = self.turn_duration;
        self.betting_round = 1;
        self.hands_played += 1;
    }

    /// Looking at your own cards is free: it neither advances the turn nor
    /// consumes it, and the turn timer starts over so the player still gets
    /// a full window to pick a real action.
    fn see(&mut self, seat: SeatIndex) {
        if self.game_phase != GamePhase::Betting || self.is_game_over {
            return;
        }
        let idx = self.current_player_index;
        match self.players.get_mut(idx) {
            Some(p) if p.seat == seat && !p.is_folded => {
                p.is_seen = true;
                self.turn_time_left = self.turn_duration;
            }
            _ => {}
        }
    }

    fn turn_action(&mut self, seat: SeatIndex, action: TurnAction) {
        if self.game_phase != GamePhase::Betting
            || self.is_game_over
            || self.side_show_request.is_some()
        {
            return;
        }
        let idx = self.current_player_index;
        let Some(player) = self.players.get(idx) else {
            return;
        };
        if player.seat != seat || player.is_folded {
            return;
        }

        let mut action = action;
        let stake = match action {
            TurnAction::Chaal => self.chaal_stake(player),
            TurnAction::Show => {
                if self.active_count() != 2 {
                    return;
                }
                self.chaal_stake(player) * 2
            }
            TurnAction::Fold => 0,
        };

        if matches!(action, TurnAction::Chaal | TurnAction::Show) {
            if self.players[idx].chips >= stake {
                self.players[idx].chips -= stake;
                self.pot += stake;
            } else {
                // Can't cover the stake: the action becomes a fold.
                action = TurnAction::Fold;
            }
        }
        if action == TurnAction::Fold {
            self.players[idx].is_folded = true;
        }

        if self.active_count() <= 1 {
            self.showdown_reveal = true;
            self.resolve_last_remaining();
        } else if action == TurnAction::Show {
            self.resolve_show();
        } else {
            self.advance_turn();
        }
    }

    /// Two-player endgame: both hands go face up and the better one takes
    /// the pot. Equal scores favor the earlier active seat.
    fn resolve_show(&mut self) {
        let contenders: Vec<usize> = (0..self.players.len())
            .filter(|&i| self.players[i].is_active())
            .collect();
        let &[first, second] = contenders.as_slice() else {
            return;
        };
        let first_rank = evaluate_hand(&self.players[first].cards);
        let second_rank = evaluate_hand(&self.players[second].cards);
        let (winner, rank) = if first_rank.score >= second_rank.score {
            (first, first_rank)
        } else {
            (second, second_rank)
        };
        self.showdown_reveal = true;
        self.finish_hand(Some(winner), &rank.category.to_string());
    }

    fn resolve_last_remaining(&mut self) {
        let winner = (0..self.players.len()).find(|&i| self.players[i].is_active());
        self.finish_hand(winner, LAST_REMAINING);
    }

    fn finish_hand(&mut self, winner: Option<usize>, hand_name: &str) {
        self.is_game_over = true;
        self.game_phase = GamePhase::Showdown;
        if let Some(idx) = winner {
            self.players[idx].chips += self.pot;
            self.winner_info = Some(WinnerInfo {
                seat: self.players[idx].seat,
                hand_name: hand_name.to_string(),
            });
        }
        self.pot = 0;
    }

    fn advance_turn(&mut self) {
        let len = self.players.len();
        if len == 0 {
            return;
        }
        let prev = self.current_player_index;
        let mut next = prev;
        let mut guard = 0;
        loop {
            next = (next + 1) % len;
            guard += 1;
            if !self.players[next].is_folded || guard >= len * 2 {
                break;
            }
        }
        if next <= prev {
            // Wrapped past the top of the order: a new betting round.
            self.betting_round += 1;
        }
        self.current_player_index = next;
        self.turn_time_left = self.turn_duration;
    }

    /// Ask the nearest seen, still-active predecessor for a private card
    /// comparison. Suspends normal turn progression until answered.
    fn request_side_show(&mut self, seat: SeatIndex) {
        if self.game_phase != GamePhase::Betting
            || self.is_game_over
            || self.side_show_request.is_some()
        {
            return;
        }
        let idx = self.current_player_index;
        let Some(player) = self.players.get(idx) else {
            return;
        };
        if player.seat != seat || player.is_folded || !player.is_seen {
            return;
        }
        if self.active_count() <= 2 {
            return;
        }

        let Some(target) = self.side_show_target_index() else {
            return;
        };
        // Both sides must have seen their cards for a comparison.
        if !self.players[target].is_seen {
            return;
        }

        let amount = self.chaal_stake(&self.players[idx]) * 2;
        self.side_show_request = Some(SideShowRequest {
            initiator: self.players[idx].seat,
            target: self.players[target].seat,
            amount,
        });
    }

    /// Only the named target may answer. Denial just clears the request and
    /// hands the turn back to the initiator, who paid nothing. Acceptance
    /// charges the initiator, compares hands privately, and folds the loser;
    /// ties go to the target.
    fn respond_side_show(&mut self, seat: SeatIndex, accepted: bool) {
        let Some(request) = self.side_show_request.clone() else {
            return;
        };
        if request.target != seat {
            return;
        }
        self.side_show_request = None;
        if !accepted {
            return;
        }

        let (Some(initiator), Some(target)) = (
            self.index_of_seat(request.initiator),
            self.index_of_seat(request.target),
        ) else {
            return;
        };
        if self.players[initiator].chips < request.amount {
            return;
        }
        self.players[initiator].chips -= request.amount;
        self.pot += request.amount;

        let initiator_rank = evaluate_hand(&self.players[initiator].cards);
        let target_rank = evaluate_hand(&self.players[target].cards);
        let (winner, loser) = if initiator_rank.score > target_rank.score {
            (initiator, target)
        } else {
            (target, initiator)
        };
        self.players[loser].is_folded = true;
        self.side_show_result = Some(SideShowResult {
            initiator: request.initiator,
            target: request.target,
            winner: self.players[winner].seat,
            loser: self.players[loser].seat,
        });

        if self.active_count() <= 1 {
            // The losing hand was only ever shown privately; no reveal.
            self.resolve_last_remaining();
        } else {
            self.advance_turn();
        }
    }

    fn turn_timeout(&mut self) {
        if self.game_phase != GamePhase::Betting
            || self.is_game_over
            || self.side_show_request.is_some()
        {
            return;
        }
        let Some(player) = self.current_player() else {
            return;
        };
        let seat = player.seat;
        self.turn_action(seat, TurnAction::Fold);
    }

    fn play_again(&mut self) {
        if !self.is_game_over {
            return;
        }
        self.reset_for_next_hand();
    }

    /// Back to the lobby for another hand: balances carry over, everything
    /// hand-scoped clears.
    fn reset_for_next_hand(&mut self) {
        self.game_phase = GamePhase::Lobby;
        self.is_game_over = false;
        self.pot = 0;
        self.current_player_index = 0;
        self.winner_info = None;
        self.showdown_reveal = false;
        self.side_show_request = None;
        self.side_show_result = None;
        self.betting_round = 0;
        for player in &mut self.players {
            player.cards.clear();
            player.is_folded = false;
            player.is_seen = false;
            player.status = PlayerStatus::Joined;
        }
    }
}
