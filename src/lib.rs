//! # FIX-LOB
//!
//! A single-instrument limit order book matching engine with FIX 4.2 TCP
//! ingress, built as a low-latency benchmark scaffold.
//!
//! ## Architecture
//!
//! ```text
//! [TCP Client] --> [Gateway Thread] --> [SPSC Ring Queue] --> [Engine Thread]
//!                   (FIX decode)                               (book + match)
//! ```
//!
//! ## Design Principles
//!
//! - **Single-Writer**: the engine thread owns the book exclusively (no locks)
//! - **Arena Allocation**: resting orders live in a pre-allocated slab;
//!   no heap allocation in the hot path
//! - **Interchangeable Books**: four price-level representations behind one
//!   monomorphised contract

pub mod arena;
pub mod array_book;
pub mod book;
pub mod clock;
pub mod engine;
pub mod fix;
pub mod gateway;
pub mod hybrid_book;
pub mod level;
pub mod metrics;
pub mod order;
pub mod queue;
pub mod tree_book;
pub mod vec_book;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderNode, NULL_INDEX};
pub use array_book::{ArrayBook, BookConfigError};
pub use book::{Book, OrderBook, SideBook};
pub use engine::MatchingEngine;
pub use gateway::{GatewayError, OrderGateway};
pub use hybrid_book::{HybridBook, DEFAULT_HOT_LEVELS};
pub use level::PriceLevel;
pub use metrics::{LatencyStats, MetricsCollector};
pub use order::{Order, OrderId, OrderType, Price, Quantity, Side, Timestamp, Trade};
pub use tree_book::TreeBook;
pub use vec_book::VectorBook;
