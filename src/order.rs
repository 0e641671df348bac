//! Order and trade value types shared by the decoder, queue and books.
//!
//! Orders are inputs from the network thread.
//! Trades are outputs of a matching pass.

/// External order identifier, assigned by the client.
pub type OrderId = u64;

/// Fixed-point price in integer ticks.
pub type Price = u64;

/// Order quantity.
pub type Quantity = u64;

/// Cycle-counter timestamp.
pub type Timestamp = u64;

/// Order side (buy = bid, sell = ask)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type carried on the wire (tag 40).
///
/// Matching treats both types identically: a market order is booked at the
/// price it carries, exactly like a limit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OrderType {
    /// Limit order - rests in the book if not fully matched (default)
    #[default]
    Limit = 0,
    /// Market order
    Market = 1,
}

/// A single incoming order, as produced by the FIX decoder.
///
/// `Copy` so it can live by value in the SPSC queue cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    /// External order ID (client-assigned)
    pub id: OrderId,
    /// Fixed-point price in ticks
    pub price: Price,
    /// Order quantity
    pub quantity: Quantity,
    /// Order side
    pub side: Side,
    /// Order type (Limit, Market)
    pub order_type: OrderType,
    /// Arrival timestamp; zero when unset
    pub timestamp: Timestamp,
}

impl Order {
    /// Create a limit order (most common case)
    #[inline]
    pub const fn limit(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            id,
            price,
            quantity,
            side,
            order_type: OrderType::Limit,
            timestamp: 0,
        }
    }
}

/// An executed trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trade {
    /// Buy-side order ID
    pub buy_order_id: OrderId,
    /// Sell-side order ID
    pub sell_order_id: OrderId,
    /// Execution price (the resting ask-side price)
    pub price: Price,
    /// Executed quantity
    pub quantity: Quantity,
}
