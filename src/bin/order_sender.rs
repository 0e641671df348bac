//! Benchmark client: pre-generates FIX NewOrderSingle messages and streams
//! them to the server, reporting send-side throughput and latency.

use std::io::Write;
use std::net::TcpStream;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use hdrhistogram::Histogram;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fix_lob::fix;
use fix_lob::{OrderType, Side};

#[derive(Parser, Debug)]
#[command(author, version, about = "FIX order benchmark client")]
struct Args {
    /// Number of orders to send
    #[arg(default_value_t = 1_000_000)]
    count: u64,

    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 12345)]
    port: u16,

    /// RNG seed for the synthetic order stream
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Pre-generate every message so the timed phase measures pure network
    // throughput, not formatting.
    println!("Preparing {} orders in memory...", args.count);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut orders = Vec::with_capacity(args.count as usize);
    for id in 0..args.count {
        let side = if rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };
        let price = rng.gen_range(90..=110);
        let quantity = rng.gen_range(1..=100);
        orders.push(fix::encode_new_order_single(
            id,
            side,
            price,
            quantity,
            OrderType::Limit,
        ));
    }

    println!("Connecting to {}:{}...", args.host, args.port);
    let mut stream = TcpStream::connect((args.host.as_str(), args.port))
        .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
    stream.set_nodelay(true).context("failed to set TCP_NODELAY")?;

    println!("Sending...");
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 1_000_000_000, 3)?;
    let start = Instant::now();

    for wire in &orders {
        let sent_at = Instant::now();
        stream.write_all(wire).context("send failed")?;
        histogram
            .record(sent_at.elapsed().as_nanos() as u64)
            .unwrap_or(());
    }

    let elapsed = start.elapsed();
    let throughput = args.count as f64 / elapsed.as_secs_f64();

    println!("Sent {} orders in {:.3}s", args.count, elapsed.as_secs_f64());
    println!("Throughput: {:.0} orders/s", throughput);
    println!("--- Send latency (ns) ---");
    println!("P50:    {:6}", histogram.value_at_quantile(0.50));
    println!("P99:    {:6}", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6}", histogram.value_at_quantile(0.999));
    println!("Max:    {:6}", histogram.max());

    Ok(())
}
