/// Integration tests for the number-calling game: winner detection across
/// prize categories, quota handling, idempotence, and full games driven
/// through `HousieState`.
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;

use game_hub::housie::winners::default_prizes;
use game_hub::housie::{HousieState, Prize, Ticket, Winners, detect_winners};

fn ticket(id: u32, seed: u64) -> Ticket {
    let mut rng = StdRng::seed_from_u64(seed);
    Ticket::generate(id, &mut rng)
}

fn row_numbers(ticket: &Ticket, row: usize) -> Vec<u8> {
    ticket.grid[row].iter().filter_map(|cell| *cell).collect()
}

#[test]
fn a_completed_top_row_wins_top_line_only() {
    let ticket = ticket(1, 31);
    let called: BTreeSet<u8> = row_numbers(&ticket, 0).into_iter().collect();
    let winners = detect_winners(
        std::slice::from_ref(&ticket),
        &called,
        &Winners::new(),
        &default_prizes(),
    );

    assert_eq!(winners[&Prize::TopLine], vec![1]);
    assert!(winners[&Prize::MiddleLine].is_empty());
    assert!(winners[&Prize::BottomLine].is_empty());
    assert!(winners[&Prize::FullHouse].is_empty());
    // Five marks is short of early seven.
    assert!(winners[&Prize::EarlySeven].is_empty());
}

#[test]
fn seven_marks_anywhere_win_early_seven() {
    let ticket = ticket(1, 32);
    let called: BTreeSet<u8> = ticket.numbers().take(7).collect();
    let winners = detect_winners(
        std::slice::from_ref(&ticket),
        &called,
        &Winners::new(),
        &default_prizes(),
    );
    assert_eq!(winners[&Prize::EarlySeven], vec![1]);

    let called: BTreeSet<u8> = ticket.numbers().take(6).collect();
    let winners = detect_winners(
        std::slice::from_ref(&ticket),
        &called,
        &Winners::new(),
        &default_prizes(),
    );
    assert!(winners[&Prize::EarlySeven].is_empty());
}

#[test]
fn all_fifteen_marks_win_full_house() {
    let ticket = ticket(1, 33);
    let called: BTreeSet<u8> = ticket.numbers().collect();
    let winners = detect_winners(
        std::slice::from_ref(&ticket),
        &called,
        &Winners::new(),
        &default_prizes(),
    );
    assert_eq!(winners[&Prize::FullHouse], vec![1]);
    // A full ticket also completes every line.
    assert_eq!(winners[&Prize::TopLine], vec![1]);
    assert_eq!(winners[&Prize::MiddleLine], vec![1]);
    assert_eq!(winners[&Prize::BottomLine], vec![1]);
}

#[test]
fn detection_is_idempotent() {
    let tickets = [ticket(1, 34), ticket(2, 35)];
    let called: BTreeSet<u8> = tickets[0].numbers().collect();
    let prizes = default_prizes();

    let first = detect_winners(&tickets, &called, &Winners::new(), &prizes);
    let second = detect_winners(&tickets, &called, &first, &prizes);
    assert_eq!(first, second);
}

#[test]
fn recorded_winners_are_monotonic_as_calls_continue() {
    let tickets = [ticket(1, 36), ticket(2, 37)];
    let prizes = default_prizes();

    // Ticket 1 takes top line first.
    let called_first: BTreeSet<u8> = row_numbers(&tickets[0], 0).into_iter().collect();
    let winners = detect_winners(&tickets, &called_first, &Winners::new(), &prizes);
    assert_eq!(winners[&Prize::TopLine], vec![1]);

    // Ticket 2 completes its top line later; the quota of one is closed,
    // and ticket 1 stays recorded.
    let mut called_later = called_first.clone();
    called_later.extend(row_numbers(&tickets[1], 0));
    let winners = detect_winners(&tickets, &called_later, &winners, &prizes);
    assert_eq!(winners[&Prize::TopLine], vec![1]);
}

#[test]
fn a_larger_quota_records_winners_in_ticket_order() {
    let tickets = [ticket(1, 38), ticket(2, 39)];
    let mut prizes = default_prizes();
    prizes.get_mut(&Prize::TopLine).expect("top line").count = 2;

    let mut called: BTreeSet<u8> = row_numbers(&tickets[0], 0).into_iter().collect();
    called.extend(row_numbers(&tickets[1], 0));
    let winners = detect_winners(&tickets, &called, &Winners::new(), &prizes);
    assert_eq!(winners[&Prize::TopLine], vec![1, 2]);
}

#[test]
fn a_disabled_prize_is_never_awarded() {
    let ticket = ticket(1, 40);
    let mut prizes = default_prizes();
    prizes.get_mut(&Prize::EarlySeven).expect("early seven").count = 0;

    let called: BTreeSet<u8> = ticket.numbers().collect();
    let winners = detect_winners(
        std::slice::from_ref(&ticket),
        &called,
        &Winners::new(),
        &prizes,
    );
    assert!(!winners.contains_key(&Prize::EarlySeven));
    assert_eq!(winners[&Prize::FullHouse], vec![1]);
}

#[test]
fn a_full_game_runs_to_completion_with_consistent_winners() {
    let mut rng = StdRng::seed_from_u64(41);
    let mut state = HousieState::new(4, &mut rng);
    let now = Utc::now();

    let mut calls = 0;
    while !state.is_game_over {
        let next = state.call_next(now);
        assert_eq!(next.called_numbers.len(), state.called_numbers.len() + 1);
        state = next;
        calls += 1;
        assert!(calls <= 90, "game must end by queue exhaustion");
    }

    // Quotas hold for every enabled prize.
    for (prize, recorded) in &state.winners {
        let quota = state.prizes_config[prize].count as usize;
        assert!(recorded.len() <= quota, "{prize:?} exceeded its quota");
    }

    // Re-running detection changes nothing once the game is over.
    let called = state.called_set();
    let again = detect_winners(
        state.active_tickets(),
        &called,
        &state.winners,
        &state.prizes_config,
    );
    assert_eq!(again, state.winners);

    // Calling into a finished game is a no-op.
    let after = state.call_next(now);
    assert_eq!(after, state);
}

#[test]
fn tickets_beyond_the_active_limit_never_win() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut state = HousieState::new(3, &mut rng);
    state.active_ticket_limit = 1;
    let now = Utc::now();

    while !state.is_game_over {
        state = state.call_next(now);
    }
    for recorded in state.winners.values() {
        assert!(
            recorded.iter().all(|&id| id == 1),
            "only the active ticket may win: {:?}",
            state.winners
        );
    }
}

#[test]
fn settings_updates_merge_partially() {
    let mut rng = StdRng::seed_from_u64(43);
    let state = HousieState::new(2, &mut rng);
    let update = game_hub::housie::SettingsUpdate {
        active_ticket_limit: Some(1),
        is_auto_playing: Some(true),
        ..Default::default()
    };
    let after = state.update_settings(&update);
    assert_eq!(after.active_ticket_limit, 1);
    assert!(after.is_auto_playing);
    assert_eq!(after.prizes_config, state.prizes_config);
    assert_eq!(after.scheduled_start_at, state.scheduled_start_at);
}

#[test]
fn auto_call_cadence_respects_the_interval() {
    let mut rng = StdRng::seed_from_u64(44);
    let state = HousieState::new(2, &mut rng);
    let update = game_hub::housie::SettingsUpdate {
        is_auto_playing: Some(true),
        ..Default::default()
    };
    let state = state.update_settings(&update);
    let now = Utc::now();

    // Never called yet: due immediately.
    assert!(state.auto_call_due(now, 5));

    let called = state.call_next(now);
    assert!(!called.auto_call_due(now + chrono::Duration::seconds(3), 5));
    assert!(called.auto_call_due(now + chrono::Duration::seconds(5), 5));
}

#[test]
fn scheduled_start_fires_only_before_the_first_call() {
    let mut rng = StdRng::seed_from_u64(45);
    let state = HousieState::new(2, &mut rng);
    let start = Utc::now();
    let update = game_hub::housie::SettingsUpdate {
        scheduled_start_at: Some(Some(start)),
        ..Default::default()
    };
    let state = state.update_settings(&update);

    assert!(!state.scheduled_start_due(start - chrono::Duration::seconds(10)));
    assert!(state.scheduled_start_due(start + chrono::Duration::seconds(1)));

    let started = state.call_next(start);
    assert!(!started.scheduled_start_due(start + chrono::Duration::seconds(10)));
}
