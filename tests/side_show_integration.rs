/// Integration tests for the side-show sub-protocol: requesting a private
/// comparison, the response window semantics, and resolution accounting.
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;

use game_hub::game::entities::{Card, Suit};
use game_hub::game::{GamePhase, Intent, TableState};

const BOOT: u32 = 10;
const STACK: u32 = 10_000;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

/// Four players dealt in, everyone seen, seat 0 to act. Seat 0's nearest
/// active predecessor is seat 3.
fn seen_table() -> TableState {
    let mut state = TableState::new(BOOT, None);
    let mut rng = rng();
    let now = Utc::now();
    for i in 0..4 {
        state = state.apply(
            &Intent::Join {
                unique_id: format!("p{i}"),
                name: format!("Player {i}"),
                chips: STACK,
                is_bot: false,
            },
            now,
            &mut rng,
        );
    }
    let mut state = state.apply(&Intent::Deal, now, &mut rng);
    for player in &mut state.players {
        player.is_seen = true;
    }
    state
}

fn requested() -> TableState {
    seen_table().apply(&Intent::SideShowRequest { seat: 0 }, Utc::now(), &mut rng())
}

fn total_chips(state: &TableState) -> u32 {
    state.pot + state.players.iter().map(|p| p.chips).sum::<u32>()
}

#[test]
fn a_request_targets_the_nearest_active_predecessor() {
    let state = requested();
    let request = state.side_show_request.as_ref().expect("pending request");
    assert_eq!(request.initiator, 0);
    assert_eq!(request.target, 3);
    // Twice the seen chaal.
    assert_eq!(request.amount, 4 * BOOT);
    // Nothing is paid until the target accepts.
    assert_eq!(state.pot, 4 * BOOT);
    assert_eq!(state.players[0].chips, STACK - BOOT);
    assert_eq!(state.current_player_index, 0);
}

#[test]
fn a_folded_predecessor_is_skipped() {
    let now = Utc::now();
    let mut rng = rng();
    let mut state = seen_table();
    state.players[3].is_folded = true;
    let after = state.apply(&Intent::SideShowRequest { seat: 0 }, now, &mut rng);
    let request = after.side_show_request.as_ref().expect("pending request");
    assert_eq!(request.target, 2);
}

#[test]
fn a_blind_initiator_cannot_request() {
    let now = Utc::now();
    let mut rng = rng();
    let mut state = seen_table();
    state.players[0].is_seen = false;
    let after = state.apply(&Intent::SideShowRequest { seat: 0 }, now, &mut rng);
    assert_eq!(after, state);
}

#[test]
fn a_blind_target_cannot_be_asked() {
    let now = Utc::now();
    let mut rng = rng();
    let mut state = seen_table();
    state.players[3].is_seen = false;
    let after = state.apply(&Intent::SideShowRequest { seat: 0 }, now, &mut rng);
    assert_eq!(after, state);
}

#[test]
fn requests_need_more_than_two_active_players() {
    let now = Utc::now();
    let mut rng = rng();
    let mut state = seen_table();
    state.players[1].is_folded = true;
    state.players[2].is_folded = true;
    let after = state.apply(&Intent::SideShowRequest { seat: 0 }, now, &mut rng);
    assert_eq!(after, state);
}

#[test]
fn turn_actions_are_suspended_while_a_request_is_pending() {
    let state = requested();
    let now = Utc::now();
    let mut rng = rng();
    for intent in [
        Intent::Chaal { seat: 0 },
        Intent::Fold { seat: 0 },
        Intent::Show { seat: 0 },
        Intent::SideShowRequest { seat: 0 },
        Intent::TurnTimeout,
    ] {
        assert_eq!(state.apply(&intent, now, &mut rng), state, "{intent:?}");
    }
}

#[test]
fn the_timer_pauses_while_a_request_is_pending() {
    let state = requested();
    assert!(state.tick_turn_timer(Utc::now(), &mut rng()).is_none());
}

#[test]
fn only_the_target_may_respond() {
    let state = requested();
    let after = state.apply(
        &Intent::SideShowResponse {
            seat: 2,
            accepted: true,
        },
        Utc::now(),
        &mut rng(),
    );
    assert_eq!(after, state);
    assert!(after.side_show_request.is_some());
}

#[test]
fn denial_clears_the_request_and_costs_nothing() {
    let state = requested();
    let after = state.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: false,
        },
        Utc::now(),
        &mut rng(),
    );
    assert!(after.side_show_request.is_none());
    assert!(after.side_show_result.is_none());
    assert_eq!(after.pot, state.pot);
    assert_eq!(after.players[0].chips, state.players[0].chips);
    // Still the initiator's turn; they must pick another action.
    assert_eq!(after.current_player_index, 0);
    assert!(after.players.iter().all(|p| !p.is_folded));

    let follow_up = after.apply(&Intent::Chaal { seat: 0 }, Utc::now(), &mut rng());
    assert_eq!(follow_up.current_player_index, 1);
}

#[test]
fn acceptance_charges_the_initiator_and_folds_the_weaker_hand() {
    let mut state = requested();
    // Initiator holds a pair of kings, target a trio of twos.
    state.players[0].cards = vec![
        Card(13, Suit::Spade),
        Card(13, Suit::Heart),
        Card(4, Suit::Diamond),
    ];
    state.players[3].cards = vec![
        Card(2, Suit::Spade),
        Card(2, Suit::Heart),
        Card(2, Suit::Diamond),
    ];

    let after = state.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: true,
        },
        Utc::now(),
        &mut rng(),
    );

    assert!(after.side_show_request.is_none());
    let result = after.side_show_result.as_ref().expect("result recorded");
    assert_eq!(result.initiator, 0);
    assert_eq!(result.target, 3);
    assert_eq!(result.winner, 3);
    assert_eq!(result.loser, 0);

    // Only the initiator pays, and only the loser folds.
    assert_eq!(after.players[0].chips, STACK - BOOT - 4 * BOOT);
    assert_eq!(after.players[3].chips, STACK - BOOT);
    assert_eq!(after.pot, 4 * BOOT + 4 * BOOT);
    assert!(after.players[0].is_folded);
    assert!(!after.players[3].is_folded);

    // The comparison stays private: no public reveal, game continues.
    assert!(!after.showdown_reveal);
    assert!(!after.is_game_over);
    assert_eq!(after.current_player_index, 1);
    assert_eq!(total_chips(&after), 4 * STACK);
}

#[test]
fn the_initiator_wins_with_the_stronger_hand() {
    let mut state = requested();
    state.players[0].cards = vec![
        Card(14, Suit::Spade),
        Card(14, Suit::Heart),
        Card(14, Suit::Diamond),
    ];
    state.players[3].cards = vec![
        Card(13, Suit::Spade),
        Card(13, Suit::Heart),
        Card(4, Suit::Diamond),
    ];

    let after = state.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: true,
        },
        Utc::now(),
        &mut rng(),
    );

    let result = after.side_show_result.as_ref().expect("result recorded");
    assert_eq!(result.winner, 0);
    assert_eq!(result.loser, 3);
    assert!(after.players[3].is_folded);
    assert!(!after.players[0].is_folded);
    assert_eq!(after.current_player_index, 1);
}

#[test]
fn an_exact_tie_goes_to_the_target() {
    let mut state = requested();
    state.players[0].cards = vec![
        Card(9, Suit::Spade),
        Card(7, Suit::Heart),
        Card(5, Suit::Diamond),
    ];
    state.players[3].cards = vec![
        Card(9, Suit::Club),
        Card(7, Suit::Diamond),
        Card(5, Suit::Heart),
    ];

    let after = state.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: true,
        },
        Utc::now(),
        &mut rng(),
    );
    let result = after.side_show_result.as_ref().expect("result recorded");
    assert_eq!(result.winner, 3);
    assert_eq!(result.loser, 0);
}

#[test]
fn an_initiator_who_cannot_cover_the_cost_resolves_nothing() {
    let mut state = requested();
    state.players[0].chips = 3 * BOOT;

    let after = state.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: true,
        },
        Utc::now(),
        &mut rng(),
    );
    // The request is spent, but no comparison happened.
    assert!(after.side_show_request.is_none());
    assert!(after.side_show_result.is_none());
    assert_eq!(after.pot, state.pot);
    assert!(after.players.iter().all(|p| !p.is_folded));
}

#[test]
fn a_stale_duplicate_response_is_ignored() {
    let state = requested();
    let now = Utc::now();
    let mut rng = rng();
    let resolved = state.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: false,
        },
        now,
        &mut rng,
    );
    let replayed = resolved.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: true,
        },
        now,
        &mut rng,
    );
    assert_eq!(replayed, resolved);
}

#[test]
fn play_again_clears_side_show_remnants() {
    let now = Utc::now();
    let mut rng = rng();
    let mut state = requested();
    state.players[0].cards = vec![
        Card(13, Suit::Spade),
        Card(13, Suit::Heart),
        Card(4, Suit::Diamond),
    ];
    state.players[3].cards = vec![
        Card(2, Suit::Spade),
        Card(2, Suit::Heart),
        Card(2, Suit::Diamond),
    ];
    let mut state = state.apply(
        &Intent::SideShowResponse {
            seat: 3,
            accepted: true,
        },
        now,
        &mut rng,
    );
    assert!(state.side_show_result.is_some());

    // Fold the hand out and start a new one.
    state = state.apply(&Intent::Fold { seat: 1 }, now, &mut rng);
    state = state.apply(&Intent::Fold { seat: 2 }, now, &mut rng);
    assert!(state.is_game_over);
    let again = state.apply(&Intent::PlayAgain, now, &mut rng);
    assert!(again.side_show_result.is_none());
    assert!(again.side_show_request.is_none());
    assert_eq!(again.game_phase, GamePhase::Lobby);
}
