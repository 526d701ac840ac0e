//! 5-of-7 hand evaluation and winner determination.
//!
//! Classification inspects rank multiplicities, suit uniformity and a
//! straight run-check (ace-low wheel included). Ordering is total: the
//! category plus five packed tie-break ranks decide every comparison,
//! so kickers are always honored.

use crate::cards::{Card, Rank};
use crate::hand::{validate_holdem, Board, HandError, HoleCards};
use core::cmp::Ordering;

/// Poker hand category from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Category {
    HighCard = 0,
    Pair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

/// Compact, comparable hand strength. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandValue(u64);

impl HandValue {
    /// Pack a category and five rank tiebreakers into a comparable value.
    /// Layout (most significant first): category (8 bits), then each
    /// tie-break rank in 6 bits, primary first.
    fn from_parts(category: Category, ranks_desc: &[Rank; 5]) -> Self {
        const CAT_SHIFT: u32 = 48;
        const RANK_STRIDE: u32 = 6;
        let mut v: u64 = (category as u64) << CAT_SHIFT;
        for (i, r) in ranks_desc.iter().enumerate() {
            let offset = CAT_SHIFT - RANK_STRIDE * (i as u32 + 1);
            v |= (*r as u64) << offset;
        }
        HandValue(v)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Evaluation of one five-card hand. `value` drives ordering.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    pub category: Category,
    pub best_five: [Card; 5],
    value: HandValue,
}

impl Evaluation {
    pub const fn value(&self) -> HandValue {
        self.value
    }
}

impl Ord for Evaluation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialOrd for Evaluation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Evaluation {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Evaluation {}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvalError {
    #[error("invalid hand: {0}")]
    InvalidHand(#[from] HandError),
    #[error("not enough cards to evaluate")]
    NotEnoughCards,
}

/// Straight detection over five distinct-or-not ranks, wheel-aware.
/// Returns the straight's top rank (Five for A-2-3-4-5).
fn straight_top(ranks_desc: &[Rank; 5]) -> Option<Rank> {
    let consecutive =
        (0..4).all(|i| ranks_desc[i].value() == ranks_desc[i + 1].value() + 1);
    if consecutive {
        return Some(ranks_desc[0]);
    }
    if ranks_desc[0] == Rank::Ace
        && ranks_desc[1] == Rank::Five
        && ranks_desc[2] == Rank::Four
        && ranks_desc[3] == Rank::Three
        && ranks_desc[4] == Rank::Two
    {
        return Some(Rank::Five);
    }
    None
}

/// Evaluate exactly five cards: detect the category and encode tie-breaks.
pub fn evaluate_five(cards: &[Card; 5]) -> Evaluation {
    let mut sorted = *cards;
    sorted.sort_by(|a, b| b.rank().cmp(&a.rank()).then(b.suit().cmp(&a.suit())));
    let ranks_desc = [
        sorted[0].rank(),
        sorted[1].rank(),
        sorted[2].rank(),
        sorted[3].rank(),
        sorted[4].rank(),
    ];

    // Rank groups sorted by (count desc, rank desc): AAAKQ -> [(A,3),(K,1),(Q,1)]
    let mut counts = [0u8; 15];
    for r in ranks_desc {
        counts[r.value() as usize] += 1;
    }
    let mut groups: Vec<(Rank, u8)> = Rank::ALL
        .iter()
        .copied()
        .filter_map(|r| {
            let n = counts[r.value() as usize];
            (n > 0).then_some((r, n))
        })
        .collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

    let is_flush = sorted.iter().all(|c| c.suit() == sorted[0].suit());
    let straight = straight_top(&ranks_desc);

    // Tie-break ranks: group ranks repeated by multiplicity, high groups first.
    let mut tiebreak = [Rank::Two; 5];
    for (slot, rank) in tiebreak
        .iter_mut()
        .zip(groups.iter().flat_map(|&(r, n)| std::iter::repeat(r).take(n as usize)))
    {
        *slot = rank;
    }

    let (category, tiebreak) = match (straight, is_flush, groups.as_slice()) {
        (Some(top), true, _) => (Category::StraightFlush, [top; 5]),
        (_, _, [(_, 4), ..]) => (Category::FourOfAKind, tiebreak),
        (_, _, [(_, 3), (_, 2)]) => (Category::FullHouse, tiebreak),
        (None, true, _) => (Category::Flush, ranks_desc),
        (Some(top), false, _) => (Category::Straight, [top; 5]),
        (_, _, [(_, 3), ..]) => (Category::ThreeOfAKind, tiebreak),
        (_, _, [(_, 2), (_, 2), ..]) => (Category::TwoPair, tiebreak),
        (_, _, [(_, 2), ..]) => (Category::Pair, tiebreak),
        _ => (Category::HighCard, ranks_desc),
    };

    Evaluation { category, best_five: sorted, value: HandValue::from_parts(category, &tiebreak) }
}

/// The 21 ways to choose 5 cards out of 7, as index sets.
const CHOOSE_7_5: [[usize; 5]; 21] = [
    [0, 1, 2, 3, 4],
    [0, 1, 2, 3, 5],
    [0, 1, 2, 3, 6],
    [0, 1, 2, 4, 5],
    [0, 1, 2, 4, 6],
    [0, 1, 2, 5, 6],
    [0, 1, 3, 4, 5],
    [0, 1, 3, 4, 6],
    [0, 1, 3, 5, 6],
    [0, 1, 4, 5, 6],
    [0, 2, 3, 4, 5],
    [0, 2, 3, 4, 6],
    [0, 2, 3, 5, 6],
    [0, 2, 4, 5, 6],
    [0, 3, 4, 5, 6],
    [1, 2, 3, 4, 5],
    [1, 2, 3, 4, 6],
    [1, 2, 3, 5, 6],
    [1, 2, 4, 5, 6],
    [1, 3, 4, 5, 6],
    [2, 3, 4, 5, 6],
];

/// Evaluate seven cards: best value over all 21 five-card subsets.
pub fn evaluate_seven(cards: &[Card; 7]) -> Evaluation {
    let mut best: Option<Evaluation> = None;
    for indices in &CHOOSE_7_5 {
        let five = [
            cards[indices[0]],
            cards[indices[1]],
            cards[indices[2]],
            cards[indices[3]],
            cards[indices[4]],
        ];
        let eval = evaluate_five(&five);
        if best.as_ref().map_or(true, |b| eval > *b) {
            best = Some(eval);
        }
    }
    // 21 iterations always produce a value
    best.unwrap_or_else(|| evaluate_five(&[cards[0], cards[1], cards[2], cards[3], cards[4]]))
}

/// Evaluate a player's best hand from 2 hole cards and a full 5-card board.
pub fn evaluate_holdem(hole: &HoleCards, board: &Board) -> Result<Evaluation, EvalError> {
    validate_holdem(hole, board)?;
    let community = board.as_slice();
    if community.len() < 5 {
        return Err(EvalError::NotEnoughCards);
    }
    let seven = [
        hole.first(),
        hole.second(),
        community[0],
        community[1],
        community[2],
        community[3],
        community[4],
    ];
    Ok(evaluate_seven(&seven))
}

/// Determine the winning id set among `(id, hole)` contenders on a shared
/// board. Ids whose best hands compare equal all win; order follows the
/// input order.
pub fn best_hands<'a, I>(contenders: I, board: &Board) -> Result<Vec<&'a str>, EvalError>
where
    I: IntoIterator<Item = (&'a str, &'a HoleCards)>,
{
    let mut best: Option<Evaluation> = None;
    let mut winners: Vec<&'a str> = Vec::new();
    for (id, hole) in contenders {
        let eval = evaluate_holdem(hole, board)?;
        match best {
            Some(b) if eval > b => {
                best = Some(eval);
                winners.clear();
                winners.push(id);
            }
            Some(b) if eval == b => winners.push(id),
            Some(_) => {}
            None => {
                best = Some(eval);
                winners.push(id);
            }
        }
    }
    Ok(winners)
}
