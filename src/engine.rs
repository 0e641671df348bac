//! Matching engine loop - sole consumer of the order queue.
//!
//! For each popped order the loop measures the duration of insert + match in
//! cycle-counter ticks and feeds the metrics collector. The loop spins
//! without yielding; CPU pinning is the caller's responsibility.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::book::OrderBook;
use crate::clock;
use crate::metrics::MetricsCollector;
use crate::order::Order;
use crate::queue::Consumer;

/// The engine thread: drains the SPSC queue into an order book.
pub struct MatchingEngine<B> {
    input: Consumer<Order>,
    book: B,
    metrics: MetricsCollector,
}

impl<B: OrderBook> MatchingEngine<B> {
    pub fn new(input: Consumer<Order>, book: B) -> Self {
        Self {
            input,
            book,
            metrics: MetricsCollector::new(),
        }
    }

    /// Spin until `running` is cleared, draining the queue.
    pub fn run(&mut self, running: &AtomicBool) {
        info!("matching engine loop started");
        while running.load(Ordering::Relaxed) {
            while self.poll() {}
            std::hint::spin_loop();
        }
        info!(
            orders = self.metrics.order_count(),
            trades = self.metrics.trade_count(),
            "matching engine loop stopped"
        );
    }

    /// Pop and process at most one order; returns whether one was available.
    #[inline]
    pub fn poll(&mut self) -> bool {
        match self.input.pop() {
            Some(order) => {
                self.process_order(order);
                true
            }
            None => false,
        }
    }

    /// Insert one order, match to quiescence, record the latency sample.
    #[inline]
    pub fn process_order(&mut self, order: Order) {
        let start = clock::cycles();

        self.book.add_order(order);
        let trades = self.book.match_orders();

        let end = clock::cycles();

        self.metrics.record_latency(end.wrapping_sub(start));
        self.metrics.increment_orders();
        self.metrics.increment_trades(trades.len() as u64);
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn book(&self) -> &B {
        &self.book
    }
}
