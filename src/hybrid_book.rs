//! Hybrid tier book - a small sorted hot tier over an ordered cold map.
//!
//! The hot tier holds at most `max_hot_levels` of the best-ranked levels in
//! a contiguous sorted vector; everything deeper lives in the cold map.
//! Promotion is lazy: a cold level moves to hot only when matching needs a
//! best price and the hot tier has drained. No price appears in both tiers
//! of the same side.

use crate::book::{Book, SideBook};
use crate::level::PriceLevel;
use crate::order::{Price, Side};
use crate::tree_book::TreeSide;
use crate::vec_book::VecSide;

/// Default hot-tier depth per side.
pub const DEFAULT_HOT_LEVELS: usize = 20;

/// Tiered side container: sorted hot vector plus cold ordered map.
pub struct HybridSide {
    hot: VecSide,
    cold: TreeSide,
    max_hot: usize,
}

impl HybridSide {
    fn new(side: Side, max_hot: usize) -> Self {
        Self {
            hot: VecSide::new(side),
            cold: TreeSide::new(side),
            max_hot,
        }
    }

    /// Number of levels currently in the hot tier.
    pub fn hot_level_count(&self) -> usize {
        self.hot.len()
    }

    /// Number of levels currently in the cold tier.
    pub fn cold_level_count(&self) -> usize {
        self.cold.level_count()
    }

    /// Whether `price` is held in the hot tier.
    pub fn is_hot(&self, price: Price) -> bool {
        self.hot.contains(price)
    }

    /// Whether `price` is held in the cold tier.
    pub fn is_cold(&self, price: Price) -> bool {
        self.cold.contains(price)
    }

    /// A new level is hot when the hot tier has room, or when it ranks
    /// strictly better than the current worst hot level.
    fn close_to_spread(&self, price: Price) -> bool {
        if self.hot.is_empty() || self.hot.len() < self.max_hot {
            return true;
        }
        let worst = self.hot.worst_price().expect("non-empty hot tier");
        match self.hot.side() {
            Side::Buy => price > worst,
            Side::Sell => price < worst,
        }
    }

    /// Move the worst hot level down to the cold map.
    fn demote_worst(&mut self) {
        if let Some((price, level)) = self.hot.pop_worst() {
            self.cold.insert_level(price, level);
        }
    }
}

impl SideBook for HybridSide {
    #[inline]
    fn best(&self) -> Option<Price> {
        self.hot.best().or_else(|| self.cold.best())
    }

    #[inline]
    fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.hot.level(price).or_else(|| self.cold.level(price))
    }

    #[inline]
    fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        if self.hot.contains(price) {
            self.hot.level_mut(price)
        } else {
            self.cold.level_mut(price)
        }
    }

    fn get_or_insert(&mut self, price: Price) -> &mut PriceLevel {
        // Existing levels stay where they are: no eager promotion.
        if self.hot.contains(price) {
            return self.hot.level_mut(price).expect("hot level present");
        }
        if self.cold.contains(price) {
            return self.cold.level_mut(price).expect("cold level present");
        }

        if self.close_to_spread(price) {
            if self.hot.len() >= self.max_hot {
                self.demote_worst();
            }
            self.hot.insert_level(price, PriceLevel::new());
            self.hot.level_mut(price).expect("just inserted")
        } else {
            self.cold.get_or_insert(price)
        }
    }

    #[inline]
    fn remove_level(&mut self, price: Price) {
        if self.hot.contains(price) {
            self.hot.remove_level(price);
        } else {
            self.cold.remove_level(price);
        }
    }

    /// Lazy promotion: refill the hot tier from the cold map when matching
    /// finds it drained.
    fn prepare_best(&mut self) {
        if self.hot.is_empty() {
            if let Some((price, level)) = self.cold.pop_best() {
                self.hot.insert_level(price, level);
            }
        }
    }

    fn level_count(&self) -> usize {
        self.hot.len() + self.cold.level_count()
    }
}

/// Order book with hot/cold tiered sides.
pub type HybridBook = Book<HybridSide>;

impl Book<HybridSide> {
    /// Create a hybrid book with the default hot-tier depth.
    pub fn new(capacity: u32) -> Self {
        Self::with_hot_levels(capacity, DEFAULT_HOT_LEVELS)
    }

    /// Create a hybrid book bounding each side's hot tier to `max_hot` levels.
    pub fn with_hot_levels(capacity: u32, max_hot: usize) -> Self {
        Book::from_sides(
            capacity,
            HybridSide::new(Side::Buy, max_hot),
            HybridSide::new(Side::Sell, max_hot),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::OrderBook;
    use crate::order::Order;

    #[test]
    fn test_hot_tier_bounded() {
        let mut book = HybridBook::with_hot_levels(256, 4);

        // 10 distinct bid levels; only 4 may stay hot.
        for i in 0..10u64 {
            book.add_order(Order::limit(i + 1, Side::Buy, 100 + i, 10));
        }

        assert!(book.bids().hot_level_count() <= 4);
        assert_eq!(
            book.bids().hot_level_count() + book.bids().cold_level_count(),
            10
        );
        assert_eq!(book.best_bid(), 109);
    }

    #[test]
    fn test_no_price_in_both_tiers() {
        let mut book = HybridBook::with_hot_levels(256, 3);
        for i in 0..8u64 {
            book.add_order(Order::limit(i + 1, Side::Sell, 100 + i, 10));
        }

        for price in 100..108 {
            assert!(
                !(book.asks().is_hot(price) && book.asks().is_cold(price)),
                "price {} present in both tiers",
                price
            );
        }
    }

    #[test]
    fn test_hot_tier_holds_best_ranked_levels() {
        let mut book = HybridBook::with_hot_levels(256, 3);
        // Insert asks from worst to best; each better price displaces the
        // worst hot level.
        for (id, price) in [(1u64, 110u64), (2, 108), (3, 106), (4, 104), (5, 102)] {
            book.add_order(Order::limit(id, Side::Sell, price, 10));
        }

        assert_eq!(book.asks().hot_level_count(), 3);
        for price in [102, 104, 106] {
            assert!(book.asks().is_hot(price), "expected {} hot", price);
        }
        for price in [108, 110] {
            assert!(book.asks().is_cold(price), "expected {} cold", price);
        }
    }

    #[test]
    fn test_existing_cold_level_gets_no_eager_promotion() {
        let mut book = HybridBook::with_hot_levels(256, 2);
        for (id, price) in [(1u64, 100u64), (2, 101), (3, 102)] {
            book.add_order(Order::limit(id, Side::Buy, price, 10));
        }
        // 100 was demoted to cold; appending at 100 must keep it cold.
        book.add_order(Order::limit(4, Side::Buy, 100, 5));

        assert!(book.bids().is_cold(100));
        assert_eq!(book.order_count(), 4);
    }

    #[test]
    fn test_lazy_promotion_during_match() {
        let mut book = HybridBook::with_hot_levels(256, 1);
        book.add_order(Order::limit(1, Side::Sell, 102, 10));
        book.add_order(Order::limit(2, Side::Sell, 100, 10)); // displaces 102 to cold

        assert!(book.asks().is_cold(102));

        // Consume the hot level, then the promoted cold level.
        book.add_order(Order::limit(3, Side::Buy, 102, 20));
        let trades = book.match_orders();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, 100);
        assert_eq!(trades[1].price, 102);
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_promotion_preserves_live_orders() {
        let mut book = HybridBook::with_hot_levels(1024, 2);

        // Build a deep book, then cancel the hot levels so later queries
        // reach demoted-then-promoted ones.
        for i in 0..20u64 {
            book.add_order(Order::limit(i + 1, Side::Buy, 100 + i, 10));
        }
        assert_eq!(book.order_count(), 20);

        // Cancel the two best (hot) levels.
        book.cancel_order(20);
        book.cancel_order(19);
        assert_eq!(book.order_count(), 18);

        // Matching promotes from cold and trades through it.
        book.add_order(Order::limit(100, Side::Sell, 117, 10));
        let trades = book.match_orders();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buy_order_id, 18);
        assert_eq!(book.order_count(), 17);
    }

    #[test]
    fn test_top_of_book_falls_back_to_cold() {
        let mut book = HybridBook::with_hot_levels(256, 1);
        book.add_order(Order::limit(1, Side::Buy, 100, 10));
        book.add_order(Order::limit(2, Side::Buy, 105, 10)); // 100 demoted

        book.cancel_order(2);
        // Hot drained; best bid reads through to the cold map.
        assert_eq!(book.best_bid(), 100);
    }
}
