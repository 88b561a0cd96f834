//! Housie ticket generation.
//!
//! A ticket is a 3x9 grid. Each row carries exactly five numbers, each
//! column one or two, and no 2x2 corner of the grid may be completely
//! blank. Column `c` draws its values from the decade `10c+1..=10c+10`
//! (the last column reaching 90), ascending down the column.
//!
//! Layout search is rejection sampling over shuffled row masks with a
//! bounded retry count and a known-valid fallback, so generation can
//! never hang.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TICKET_ROWS: usize = 3;
pub const TICKET_COLS: usize = 9;
pub const FILLED_PER_ROW: usize = 5;
pub const NUMBERS_PER_TICKET: usize = TICKET_ROWS * FILLED_PER_ROW;

/// Attempts at a random layout before falling back to the static one.
const LAYOUT_ATTEMPTS: usize = 64;
/// Attempts at a random row mask before falling back to the alternating one.
const ROW_ATTEMPTS: usize = 32;

pub type TicketId = u32;
pub type TicketGrid = [[Option<u8>; TICKET_COLS]; TICKET_ROWS];
type Layout = [[bool; TICKET_COLS]; TICKET_ROWS];

/// A known-valid layout used when the random search exhausts its budget.
const FALLBACK_LAYOUT: Layout = [
    [true, false, true, false, true, false, true, false, true],
    [false, true, false, true, false, true, false, true, true],
    [true, true, true, true, true, false, false, false, false],
];

const ALTERNATING_ROW: [bool; TICKET_COLS] = [
    true, false, true, false, true, false, true, false, true,
];

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    pub grid: TicketGrid,
    /// Name the ticket is booked under, if anyone has claimed it.
    pub owner: Option<String>,
}

impl Ticket {
    pub fn generate(id: TicketId, rng: &mut impl Rng) -> Self {
        let layout = random_layout(rng);
        let mut grid: TicketGrid = [[None; TICKET_COLS]; TICKET_ROWS];

        for col in 0..TICKET_COLS {
            let count = (0..TICKET_ROWS).filter(|&row| layout[row][col]).count();
            if count == 0 {
                continue;
            }
            let low = (col * 10 + 1) as u8;
            let high = (col * 10 + 10) as u8;
            let mut pool: Vec<u8> = (low..=high).collect();
            pool.shuffle(rng);
            let mut values: Vec<u8> = pool[..count].to_vec();
            values.sort_unstable();

            let mut next = 0;
            for row in 0..TICKET_ROWS {
                if layout[row][col] {
                    grid[row][col] = Some(values[next]);
                    next += 1;
                }
            }
        }

        Self {
            id,
            grid,
            owner: None,
        }
    }

    /// All fifteen numbers on the ticket, in grid order.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.grid.iter().flatten().filter_map(|cell| *cell)
    }

    /// How many of the ticket's numbers have been called.
    pub fn marked_count(&self, called: &BTreeSet<u8>) -> usize {
        self.numbers().filter(|n| called.contains(n)).count()
    }

    /// Whether every filled cell in the given row has been called.
    pub fn row_complete(&self, row: usize, called: &BTreeSet<u8>) -> bool {
        self.grid[row]
            .iter()
            .filter_map(|cell| *cell)
            .all(|n| called.contains(&n))
    }
}

fn random_layout(rng: &mut impl Rng) -> Layout {
    for _ in 0..LAYOUT_ATTEMPTS {
        let layout = [
            random_row_mask(rng),
            random_row_mask(rng),
            random_row_mask(rng),
        ];
        if column_sums_ok(&layout) && no_blank_block(&layout) {
            return layout;
        }
    }
    FALLBACK_LAYOUT
}

fn random_row_mask(rng: &mut impl Rng) -> [bool; TICKET_COLS] {
    for _ in 0..ROW_ATTEMPTS {
        let mut mask = [
            true, true, true, true, true, false, false, false, false,
        ];
        mask.shuffle(rng);
        if !has_triple_run(&mask) {
            return mask;
        }
    }
    ALTERNATING_ROW
}

/// Three equal consecutive cells make a row read as clumped; reject.
fn has_triple_run(mask: &[bool; TICKET_COLS]) -> bool {
    mask.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

/// Every column must hold one or two numbers, never zero or three.
fn column_sums_ok(layout: &Layout) -> bool {
    (0..TICKET_COLS).all(|col| {
        let filled = (0..TICKET_ROWS).filter(|&row| layout[row][col]).count();
        (1..=2).contains(&filled)
    })
}

/// No 2x2 block of four blanks anywhere in the grid.
fn no_blank_block(layout: &Layout) -> bool {
    for row in 0..TICKET_ROWS - 1 {
        for col in 0..TICKET_COLS - 1 {
            if !layout[row][col]
                && !layout[row][col + 1]
                && !layout[row + 1][col]
                && !layout[row + 1][col + 1]
            {
                return false;
            }
        }
    }
    true
}
