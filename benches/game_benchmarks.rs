use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use game_hub::game::entities::{Card, Suit};
use game_hub::game::evaluate_hand;
use game_hub::housie::winners::default_prizes;
use game_hub::housie::{Ticket, Winners, detect_winners};

fn bench_hand_evaluation(c: &mut Criterion) {
    let hands = [
        vec![Card(14, Suit::Spade), Card(14, Suit::Heart), Card(14, Suit::Club)],
        vec![Card(14, Suit::Spade), Card(2, Suit::Spade), Card(3, Suit::Spade)],
        vec![Card(13, Suit::Spade), Card(13, Suit::Heart), Card(4, Suit::Club)],
        vec![Card(2, Suit::Club), Card(7, Suit::Diamond), Card(11, Suit::Spade)],
    ];
    c.bench_function("evaluate_hand", |b| {
        b.iter(|| {
            for hand in &hands {
                black_box(evaluate_hand(black_box(hand)));
            }
        });
    });
}

fn bench_ticket_generation(c: &mut Criterion) {
    c.bench_function("ticket_generate", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        let mut id = 0;
        b.iter(|| {
            id += 1;
            black_box(Ticket::generate(id, &mut rng));
        });
    });
}

fn bench_winner_detection(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let tickets: Vec<Ticket> = (1..=100).map(|id| Ticket::generate(id, &mut rng)).collect();
    let called: std::collections::BTreeSet<u8> = (1..=45).collect();
    let prizes = default_prizes();
    c.bench_function("detect_winners_100_tickets", |b| {
        b.iter(|| {
            black_box(detect_winners(
                black_box(&tickets),
                black_box(&called),
                &Winners::new(),
                &prizes,
            ));
        });
    });
}

criterion_group!(
    benches,
    bench_hand_evaluation,
    bench_ticket_generation,
    bench_winner_detection
);
criterion_main!(benches);
