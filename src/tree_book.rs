//! Tree-ordered book - price levels in an ordered map.
//!
//! Each side keeps its levels in a `BTreeMap` keyed by price; best price is
//! the map's last key for bids and first key for asks. O(log L) level
//! insert/delete, O(1) order append and cancel via the arena FIFO.

use std::collections::BTreeMap;

use crate::book::{Book, SideBook};
use crate::level::PriceLevel;
use crate::order::{Price, Side};

/// Ordered-map side container.
pub struct TreeSide {
    levels: BTreeMap<Price, PriceLevel>,
    side: Side,
}

impl TreeSide {
    pub(crate) fn new(side: Side) -> Self {
        Self {
            levels: BTreeMap::new(),
            side,
        }
    }

    pub(crate) fn contains(&self, price: Price) -> bool {
        self.levels.contains_key(&price)
    }

    /// Insert an already-built level (hybrid demotion path).
    pub(crate) fn insert_level(&mut self, price: Price, level: PriceLevel) {
        debug_assert!(!self.levels.contains_key(&price));
        self.levels.insert(price, level);
    }

    /// Remove and return the best-ranked level (hybrid promotion path).
    pub(crate) fn pop_best(&mut self) -> Option<(Price, PriceLevel)> {
        match self.side {
            Side::Buy => self.levels.pop_last(),
            Side::Sell => self.levels.pop_first(),
        }
    }
}

impl SideBook for TreeSide {
    #[inline]
    fn best(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.last_key_value().map(|(p, _)| *p),
            Side::Sell => self.levels.first_key_value().map(|(p, _)| *p),
        }
    }

    #[inline]
    fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    #[inline]
    fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    #[inline]
    fn get_or_insert(&mut self, price: Price) -> &mut PriceLevel {
        self.levels.entry(price).or_insert_with(PriceLevel::new)
    }

    #[inline]
    fn remove_level(&mut self, price: Price) {
        self.levels.remove(&price);
    }

    fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// Order book backed by ordered maps on both sides.
pub type TreeBook = Book<TreeSide>;

impl Book<TreeSide> {
    /// Create a tree-ordered book with the given order capacity.
    pub fn new(capacity: u32) -> Self {
        Book::from_sides(
            capacity,
            TreeSide::new(Side::Buy),
            TreeSide::new(Side::Sell),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::OrderBook;
    use crate::order::Order;

    #[test]
    fn test_empty_book_sentinels() {
        let book = TreeBook::new(16);
        assert_eq!(book.best_bid(), 0);
        assert_eq!(book.best_ask(), Price::MAX);
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_best_price_ordering() {
        let mut book = TreeBook::new(16);
        book.add_order(Order::limit(1, Side::Buy, 100, 10));
        book.add_order(Order::limit(2, Side::Buy, 105, 10));
        book.add_order(Order::limit(3, Side::Buy, 95, 10));
        book.add_order(Order::limit(4, Side::Sell, 110, 10));
        book.add_order(Order::limit(5, Side::Sell, 108, 10));

        assert_eq!(book.best_bid(), 105);
        assert_eq!(book.best_ask(), 108);
    }

    #[test]
    fn test_cancel_best_recomputes_top() {
        let mut book = TreeBook::new(16);
        book.add_order(Order::limit(1, Side::Buy, 105, 10));
        book.add_order(Order::limit(2, Side::Buy, 100, 10));

        book.cancel_order(1);
        assert_eq!(book.best_bid(), 100);

        book.cancel_order(2);
        assert_eq!(book.best_bid(), 0);
        assert_eq!(book.bids().level_count(), 0);
    }

    #[test]
    fn test_match_walks_levels_in_price_order() {
        let mut book = TreeBook::new(16);
        book.add_order(Order::limit(1, Side::Sell, 102, 5));
        book.add_order(Order::limit(2, Side::Sell, 100, 5));
        book.add_order(Order::limit(3, Side::Sell, 101, 5));
        book.add_order(Order::limit(4, Side::Buy, 102, 12));

        let trades = book.match_orders();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].price, 100);
        assert_eq!(trades[1].price, 101);
        assert_eq!(trades[2].price, 102);
        assert_eq!(trades[2].quantity, 2);
        assert_eq!(book.order_quantity(1), Some(3));
    }
}
