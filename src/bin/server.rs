//! Benchmark server: FIX TCP ingress feeding one matching engine thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fix_lob::queue::{self, Consumer};
use fix_lob::{
    ArrayBook, HybridBook, MatchingEngine, Order, OrderBook, OrderGateway, TreeBook, VectorBook,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BookKind {
    /// Ordered-map price levels
    Tree,
    /// Sorted-vector price levels
    Vector,
    /// Dense per-tick arrays (bounded price range)
    Array,
    /// Hot/cold tiered levels
    Hybrid,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "FIX order book benchmark server")]
struct Args {
    /// TCP port to listen on
    #[arg(long, default_value_t = 12345)]
    port: u16,

    /// Order book representation
    #[arg(long, value_enum, default_value_t = BookKind::Tree)]
    book: BookKind,

    /// SPSC queue capacity (power of two)
    #[arg(long, default_value_t = 1024)]
    queue_capacity: usize,

    /// Maximum resting orders
    #[arg(long, default_value_t = 1_000_000)]
    order_capacity: u32,

    /// Array book: lowest admissible price
    #[arg(long, default_value_t = 1)]
    min_price: u64,

    /// Array book: highest admissible price
    #[arg(long, default_value_t = 200)]
    max_price: u64,

    /// Array book: price increment
    #[arg(long, default_value_t = 1)]
    tick_size: u64,

    /// Hybrid book: hot levels per side
    #[arg(long, default_value_t = fix_lob::DEFAULT_HOT_LEVELS)]
    hot_levels: usize,

    /// Write latency samples to this CSV file on exit
    #[arg(long)]
    latency_csv: Option<PathBuf>,

    /// Pin the engine thread to the last CPU core
    #[arg(long)]
    pin_core: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    anyhow::ensure!(
        args.queue_capacity.is_power_of_two(),
        "--queue-capacity must be a power of two"
    );

    let running = Arc::new(AtomicBool::new(true));
    let interrupt_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        eprintln!("interrupt received, stopping...");
        interrupt_flag.store(false, Ordering::Relaxed);
    })?;

    let (tx, rx) = queue::spsc::<Order>(args.queue_capacity);

    let mut gateway = OrderGateway::new(args.port, tx, Arc::clone(&running));
    gateway.start()?;
    info!(port = args.port, book = ?args.book, "server started");

    match args.book {
        BookKind::Tree => {
            let mut book = TreeBook::new(args.order_capacity);
            book.warm_up();
            serve(book, rx, &running, &args)?;
        }
        BookKind::Vector => {
            let mut book = VectorBook::new(args.order_capacity);
            book.warm_up();
            serve(book, rx, &running, &args)?;
        }
        BookKind::Array => {
            let mut book = ArrayBook::with_range(
                args.order_capacity,
                args.min_price,
                args.max_price,
                args.tick_size,
            )?;
            book.warm_up();
            serve(book, rx, &running, &args)?;
        }
        BookKind::Hybrid => {
            let mut book = HybridBook::with_hot_levels(args.order_capacity, args.hot_levels);
            book.warm_up();
            serve(book, rx, &running, &args)?;
        }
    }

    gateway.stop();
    Ok(())
}

/// Run the engine loop on the current thread, then report.
fn serve<B: OrderBook>(
    book: B,
    rx: Consumer<Order>,
    running: &AtomicBool,
    args: &Args,
) -> Result<()> {
    if args.pin_core {
        pin_last_core();
    }

    let mut engine = MatchingEngine::new(rx, book);
    engine.run(running);

    let metrics = engine.metrics();
    let stats = metrics.get_stats();

    println!("=== Final Statistics ===");
    println!("Total Orders: {}", metrics.order_count());
    println!("Total Trades: {}", metrics.trade_count());
    println!(
        "Latency (cycles): p50={} p99={} p99.9={} max={} mean={:.1}",
        stats.p50, stats.p99, stats.p999, stats.max, stats.mean
    );

    if let Some(path) = &args.latency_csv {
        metrics.export_csv(path)?;
        info!(path = %path.display(), "latency samples exported");
    }

    Ok(())
}

/// Pin to the last available core; it is typically the quietest.
fn pin_last_core() {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(last) = core_ids.last() {
            if core_affinity::set_for_current(*last) {
                info!(core = last.id, "engine thread pinned");
            }
        }
    }
}
