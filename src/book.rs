//! Order-book contract and the generic book core.
//!
//! All four variants share this structure: one arena of order nodes, an
//! id -> location index, and two side containers of price levels. A variant
//! is defined entirely by its [`SideBook`] implementation - how one side
//! stores levels and finds its best price. The engine is generic over
//! [`OrderBook`], so the per-order call site is monomorphised rather than
//! paying an indirect call.

use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::level::PriceLevel;
use crate::order::{Order, OrderId, Price, Quantity, Side, Trade};

/// The behavioural contract every book variant satisfies.
pub trait OrderBook {
    /// Insert at the back of the queue for `(side, price)`, creating the
    /// level if absent. No matching happens here.
    fn add_order(&mut self, order: Order);

    /// Remove the order if present; silent no-op if unknown.
    fn cancel_order(&mut self, id: OrderId);

    /// Replace quantity in place, preserving queue position. Zero behaves as
    /// cancel; unknown id is a silent no-op.
    fn modify_order(&mut self, id: OrderId, new_quantity: Quantity);

    /// Run matching to quiescence, returning trades in production order.
    fn match_orders(&mut self) -> Vec<Trade>;

    /// Number of live orders.
    fn order_count(&self) -> usize;

    /// Best bid price, or `0` when there are no bids.
    fn best_bid(&self) -> Price;

    /// Best ask price, or `Price::MAX` when there are no asks.
    fn best_ask(&self) -> Price;
}

/// One side's container of price levels.
///
/// Implementations order their levels so that `best` is the highest price
/// for the bid side and the lowest for the ask side.
pub trait SideBook {
    /// Best price on this side, if any level is live.
    fn best(&self) -> Option<Price>;

    /// Access a live level.
    fn level(&self, price: Price) -> Option<&PriceLevel>;

    /// Mutable access to a live level.
    fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel>;

    /// Get or create the level for `price`.
    fn get_or_insert(&mut self, price: Price) -> &mut PriceLevel;

    /// Drop a drained level and refresh this side's best price.
    fn remove_level(&mut self, price: Price);

    /// Whether this side admits `price` (range/tick constraints).
    fn accepts(&self, _price: Price) -> bool {
        true
    }

    /// Hook invoked before `best` is read during matching; the hybrid tier
    /// uses it to promote a cold level when the hot tier has drained.
    fn prepare_best(&mut self) {}

    /// Number of live price levels.
    fn level_count(&self) -> usize;
}

/// Location of a live order: which side, which level, which node.
#[derive(Clone, Copy, Debug)]
pub struct OrderRef {
    pub node: ArenaIndex,
    pub side: Side,
    pub price: Price,
}

/// Generic book core parameterised by the side-container representation.
pub struct Book<S> {
    arena: Arena,
    bids: S,
    asks: S,
    orders: FxHashMap<OrderId, OrderRef>,
}

impl<S: SideBook> Book<S> {
    /// Assemble a book from two side containers and an order capacity.
    pub(crate) fn from_sides(capacity: u32, bids: S, asks: S) -> Self {
        Self {
            arena: Arena::new(capacity),
            bids,
            asks,
            orders: FxHashMap::with_capacity_and_hasher(capacity as usize, Default::default()),
        }
    }

    /// Pre-fault arena pages ahead of measurement.
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    /// Look up a live order's location.
    #[inline]
    pub fn get_order(&self, id: OrderId) -> Option<&OrderRef> {
        self.orders.get(&id)
    }

    #[inline]
    pub fn contains_order(&self, id: OrderId) -> bool {
        self.orders.contains_key(&id)
    }

    /// Remaining quantity of a live order.
    pub fn order_quantity(&self, id: OrderId) -> Option<Quantity> {
        self.orders.get(&id).map(|r| self.arena.get(r.node).quantity)
    }

    /// Total quantity and order count resting at a price level.
    pub fn depth_at(&self, side: Side, price: Price) -> (Quantity, u32) {
        let level = match side {
            Side::Buy => self.bids.level(price),
            Side::Sell => self.asks.level(price),
        };
        level.map(|l| (l.total_quantity, l.count)).unwrap_or((0, 0))
    }

    /// The bid-side container (variant-specific inspection).
    pub fn bids(&self) -> &S {
        &self.bids
    }

    /// The ask-side container (variant-specific inspection).
    pub fn asks(&self) -> &S {
        &self.asks
    }
}

impl<S: SideBook> OrderBook for Book<S> {
    fn add_order(&mut self, order: Order) {
        // A zero-quantity order can never trade; inserting it would stall
        // the match loop at the front of its level.
        if order.quantity == 0 {
            debug!(order_id = order.id, "dropping zero-quantity order");
            return;
        }

        // Last-insert wins only once the prior id has been cleared.
        if self.orders.contains_key(&order.id) {
            warn!(order_id = order.id, "duplicate order id; dropping");
            return;
        }

        let admissible = match order.side {
            Side::Buy => self.bids.accepts(order.price),
            Side::Sell => self.asks.accepts(order.price),
        };
        if !admissible {
            warn!(
                order_id = order.id,
                price = order.price,
                "price outside book range; dropping"
            );
            return;
        }

        let node = match self.arena.alloc() {
            Some(node) => node,
            None => {
                error!(order_id = order.id, "order arena exhausted; dropping");
                return;
            }
        };
        self.arena.get_mut(node).set(&order);

        let level = match order.side {
            Side::Buy => self.bids.get_or_insert(order.price),
            Side::Sell => self.asks.get_or_insert(order.price),
        };
        level.push_back(&mut self.arena, node);

        self.orders.insert(
            order.id,
            OrderRef {
                node,
                side: order.side,
                price: order.price,
            },
        );
    }

    fn cancel_order(&mut self, id: OrderId) {
        let entry = match self.orders.remove(&id) {
            Some(entry) => entry,
            None => return,
        };

        let level = match entry.side {
            Side::Buy => self.bids.level_mut(entry.price),
            Side::Sell => self.asks.level_mut(entry.price),
        };
        if let Some(level) = level {
            let drained = level.remove(&mut self.arena, entry.node);
            if drained {
                match entry.side {
                    Side::Buy => self.bids.remove_level(entry.price),
                    Side::Sell => self.asks.remove_level(entry.price),
                }
            }
        }

        self.arena.free(entry.node);
    }

    fn modify_order(&mut self, id: OrderId, new_quantity: Quantity) {
        if new_quantity == 0 {
            self.cancel_order(id);
            return;
        }

        let entry = match self.orders.get(&id) {
            Some(entry) => *entry,
            None => return,
        };

        // In-place update: queue position is preserved even on size-up.
        let old = self.arena.get(entry.node).quantity;
        self.arena.get_mut(entry.node).quantity = new_quantity;

        let level = match entry.side {
            Side::Buy => self.bids.level_mut(entry.price),
            Side::Sell => self.asks.level_mut(entry.price),
        };
        if let Some(level) = level {
            level.replace_quantity(old, new_quantity);
        }
    }

    fn match_orders(&mut self) -> Vec<Trade> {
        let mut trades = Vec::new();

        loop {
            self.bids.prepare_best();
            self.asks.prepare_best();

            let (best_bid, best_ask) = match (self.bids.best(), self.asks.best()) {
                (Some(bid), Some(ask)) => (bid, ask),
                _ => break,
            };
            if best_bid < best_ask {
                break;
            }

            let bid_node = self
                .bids
                .level(best_bid)
                .map(PriceLevel::peek_head)
                .unwrap_or(NULL_INDEX);
            let ask_node = self
                .asks
                .level(best_ask)
                .map(PriceLevel::peek_head)
                .unwrap_or(NULL_INDEX);
            debug_assert!(bid_node != NULL_INDEX && ask_node != NULL_INDEX);

            let (buy_id, bid_quantity) = {
                let node = self.arena.get(bid_node);
                (node.order_id, node.quantity)
            };
            let (sell_id, ask_quantity) = {
                let node = self.arena.get(ask_node);
                (node.order_id, node.quantity)
            };

            // Execution price is the resting ask-side price.
            let quantity = bid_quantity.min(ask_quantity);
            trades.push(Trade {
                buy_order_id: buy_id,
                sell_order_id: sell_id,
                price: best_ask,
                quantity,
            });

            self.arena.get_mut(bid_node).quantity -= quantity;
            self.arena.get_mut(ask_node).quantity -= quantity;

            if bid_quantity == quantity {
                let level = self.bids.level_mut(best_bid).expect("live bid level");
                level.pop_front(&mut self.arena);
                let drained = level.is_empty();
                self.orders.remove(&buy_id);
                self.arena.free(bid_node);
                if drained {
                    self.bids.remove_level(best_bid);
                }
            } else {
                self.bids
                    .level_mut(best_bid)
                    .expect("live bid level")
                    .subtract_quantity(quantity);
            }

            if ask_quantity == quantity {
                let level = self.asks.level_mut(best_ask).expect("live ask level");
                level.pop_front(&mut self.arena);
                let drained = level.is_empty();
                self.orders.remove(&sell_id);
                self.arena.free(ask_node);
                if drained {
                    self.asks.remove_level(best_ask);
                }
            } else {
                self.asks
                    .level_mut(best_ask)
                    .expect("live ask level")
                    .subtract_quantity(quantity);
            }
        }

        trades
    }

    fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn best_bid(&self) -> Price {
        self.bids.best().unwrap_or(0)
    }

    fn best_ask(&self) -> Price {
        self.asks.best().unwrap_or(Price::MAX)
    }
}

impl<S: SideBook> std::fmt::Debug for Book<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("best_bid", &self.bids.best())
            .field("best_ask", &self.asks.best())
            .field("bid_levels", &self.bids.level_count())
            .field("ask_levels", &self.asks.level_count())
            .field("order_count", &self.orders.len())
            .finish()
    }
}
