//! Sorted-sequence book - price levels in a contiguous sorted vector.
//!
//! Each side keeps `(price, level)` pairs best-first (bids descending, asks
//! ascending); inserts binary-search for their position. Levels are located
//! by price rather than by stored offset, so erasing an intermediate level
//! shifts no index entries - the trade-off is an O(log L) search on cancel
//! in exchange for contiguous top-of-book scans while matching.

use crate::book::{Book, SideBook};
use crate::level::PriceLevel;
use crate::order::{Price, Side};

/// Sorted-vector side container, best price at index zero.
pub struct VecSide {
    levels: Vec<(Price, PriceLevel)>,
    side: Side,
}

impl VecSide {
    pub(crate) fn new(side: Side) -> Self {
        Self {
            levels: Vec::new(),
            side,
        }
    }

    pub(crate) fn side(&self) -> Side {
        self.side
    }

    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub(crate) fn contains(&self, price: Price) -> bool {
        self.position(price).is_ok()
    }

    /// Price of the worst-ranked level (the back of the sequence).
    pub(crate) fn worst_price(&self) -> Option<Price> {
        self.levels.last().map(|(p, _)| *p)
    }

    /// Insert an already-built level at its sorted position.
    pub(crate) fn insert_level(&mut self, price: Price, level: PriceLevel) {
        match self.position(price) {
            Ok(_) => debug_assert!(false, "level already present"),
            Err(at) => self.levels.insert(at, (price, level)),
        }
    }

    /// Remove and return the worst-ranked level (hybrid demotion path).
    pub(crate) fn pop_worst(&mut self) -> Option<(Price, PriceLevel)> {
        self.levels.pop()
    }

    /// Binary search for `price` in this side's ranking.
    fn position(&self, price: Price) -> Result<usize, usize> {
        self.levels.binary_search_by(|probe| match self.side {
            // Bids are stored descending, asks ascending.
            Side::Buy => price.cmp(&probe.0),
            Side::Sell => probe.0.cmp(&price),
        })
    }
}

impl SideBook for VecSide {
    #[inline]
    fn best(&self) -> Option<Price> {
        self.levels.first().map(|(p, _)| *p)
    }

    #[inline]
    fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.position(price).ok().map(|at| &self.levels[at].1)
    }

    #[inline]
    fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        match self.position(price) {
            Ok(at) => Some(&mut self.levels[at].1),
            Err(_) => None,
        }
    }

    #[inline]
    fn get_or_insert(&mut self, price: Price) -> &mut PriceLevel {
        let at = match self.position(price) {
            Ok(at) => at,
            Err(at) => {
                self.levels.insert(at, (price, PriceLevel::new()));
                at
            }
        };
        &mut self.levels[at].1
    }

    #[inline]
    fn remove_level(&mut self, price: Price) {
        if let Ok(at) = self.position(price) {
            self.levels.remove(at);
        }
    }

    fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// Order book backed by sorted vectors on both sides.
pub type VectorBook = Book<VecSide>;

impl Book<VecSide> {
    /// Create a sorted-sequence book with the given order capacity.
    pub fn new(capacity: u32) -> Self {
        Book::from_sides(capacity, VecSide::new(Side::Buy), VecSide::new(Side::Sell))
    }
}
