//! Indexed-array book - dense per-tick level arrays for bounded price ranges.
//!
//! Each side pre-allocates one level per admissible tick plus an occupancy
//! bitmap and a cached best index. Price-to-slot is a single subtract and
//! divide; the only non-constant operation is the bitmap rescan when the
//! cached top level drains.

use thiserror::Error;

use crate::book::{Book, SideBook};
use crate::level::PriceLevel;
use crate::order::{Price, Side};

/// Rejected indexed-array configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookConfigError {
    #[error("min_price must be less than max_price")]
    InvalidRange,
    #[error("tick_size must be greater than zero")]
    ZeroTick,
    #[error("price range must be evenly divisible by tick_size")]
    MisalignedRange,
}

/// Dense array side container.
pub struct ArraySide {
    levels: Vec<PriceLevel>,
    occupied: Vec<bool>,
    min_price: Price,
    max_price: Price,
    tick_size: Price,
    /// Cached index of the best occupied level.
    best: Option<usize>,
    side: Side,
}

impl ArraySide {
    fn new(side: Side, min_price: Price, max_price: Price, tick_size: Price) -> Self {
        let num_levels = ((max_price - min_price) / tick_size + 1) as usize;
        Self {
            levels: vec![PriceLevel::new(); num_levels],
            occupied: vec![false; num_levels],
            min_price,
            max_price,
            tick_size,
            best: None,
            side,
        }
    }

    #[inline]
    pub(crate) fn price_to_index(&self, price: Price) -> usize {
        ((price - self.min_price) / self.tick_size) as usize
    }

    #[inline]
    pub(crate) fn index_to_price(&self, index: usize) -> Price {
        self.min_price + index as Price * self.tick_size
    }

    /// Rescan the occupancy bitmap after the cached top level drained at
    /// `from`: bids scan downward, asks scan upward.
    fn rescan_best(&mut self, from: usize) {
        self.best = match self.side {
            Side::Buy => (0..from).rev().find(|&i| self.occupied[i]),
            Side::Sell => (from + 1..self.occupied.len()).find(|&i| self.occupied[i]),
        };
    }
}

impl SideBook for ArraySide {
    #[inline]
    fn best(&self) -> Option<Price> {
        self.best.map(|i| self.index_to_price(i))
    }

    #[inline]
    fn level(&self, price: Price) -> Option<&PriceLevel> {
        if !self.accepts(price) {
            return None;
        }
        let at = self.price_to_index(price);
        self.occupied[at].then(|| &self.levels[at])
    }

    #[inline]
    fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        if !self.accepts(price) {
            return None;
        }
        let at = self.price_to_index(price);
        if self.occupied[at] {
            Some(&mut self.levels[at])
        } else {
            None
        }
    }

    #[inline]
    fn get_or_insert(&mut self, price: Price) -> &mut PriceLevel {
        let at = self.price_to_index(price);
        if !self.occupied[at] {
            self.occupied[at] = true;
            // The cached top only moves toward better prices on insert.
            self.best = Some(match (self.best, self.side) {
                (None, _) => at,
                (Some(best), Side::Buy) => best.max(at),
                (Some(best), Side::Sell) => best.min(at),
            });
        }
        &mut self.levels[at]
    }

    #[inline]
    fn remove_level(&mut self, price: Price) {
        let at = self.price_to_index(price);
        debug_assert!(self.levels[at].is_empty());
        self.occupied[at] = false;
        if self.best == Some(at) {
            self.rescan_best(at);
        }
    }

    #[inline]
    fn accepts(&self, price: Price) -> bool {
        price >= self.min_price
            && price <= self.max_price
            && (price - self.min_price) % self.tick_size == 0
    }

    fn level_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }
}

/// Order book backed by dense per-tick arrays on both sides.
pub type ArrayBook = Book<ArraySide>;

impl Book<ArraySide> {
    /// Create an indexed-array book covering `[min_price, max_price]` at
    /// `tick_size` granularity.
    pub fn with_range(
        capacity: u32,
        min_price: Price,
        max_price: Price,
        tick_size: Price,
    ) -> Result<Self, BookConfigError> {
        if min_price >= max_price {
            return Err(BookConfigError::InvalidRange);
        }
        if tick_size == 0 {
            return Err(BookConfigError::ZeroTick);
        }
        if (max_price - min_price) % tick_size != 0 {
            return Err(BookConfigError::MisalignedRange);
        }

        Ok(Book::from_sides(
            capacity,
            ArraySide::new(Side::Buy, min_price, max_price, tick_size),
            ArraySide::new(Side::Sell, min_price, max_price, tick_size),
        ))
    }
}
