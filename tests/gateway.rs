//! End-to-end: TCP client -> gateway -> SPSC queue -> engine -> book.

use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fix_lob::queue;
use fix_lob::{fix, MatchingEngine, Order, OrderBook, OrderGateway, OrderType, Side, TreeBook};

/// Wait until `progress` reaches `target` or the deadline passes.
fn await_count(progress: &AtomicU64, target: u64) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while progress.load(Ordering::Relaxed) < target {
        assert!(
            Instant::now() < deadline,
            "engine saw {} of {} orders before timeout",
            progress.load(Ordering::Relaxed),
            target
        );
        thread::yield_now();
    }
}

#[test]
fn orders_flow_end_to_end() {
    const PAIRS: u64 = 500;

    let (tx, rx) = queue::spsc::<Order>(1024);
    let running = Arc::new(AtomicBool::new(true));

    let mut gateway = OrderGateway::new(0, tx, Arc::clone(&running));
    gateway.start().expect("gateway start");
    let addr = gateway.local_addr().expect("bound address");

    let progress = Arc::new(AtomicU64::new(0));
    let engine_progress = Arc::clone(&progress);
    let engine_running = Arc::clone(&running);
    let engine_thread = thread::spawn(move || {
        let mut engine = MatchingEngine::new(rx, TreeBook::new(10_000));
        while engine_running.load(Ordering::Relaxed) {
            if engine.poll() {
                engine_progress.store(engine.metrics().order_count(), Ordering::Relaxed);
            } else {
                thread::yield_now();
            }
        }
        engine
    });

    // Each pair crosses at the same price: one trade per pair.
    let mut client = TcpStream::connect(addr).expect("connect");
    for i in 0..PAIRS {
        let price = 100 + (i % 10);
        let buy = fix::encode_new_order_single(i * 2 + 1, Side::Buy, price, 10, OrderType::Limit);
        let sell = fix::encode_new_order_single(i * 2 + 2, Side::Sell, price, 10, OrderType::Limit);
        client.write_all(&buy).expect("send buy");
        client.write_all(&sell).expect("send sell");
    }
    client.flush().expect("flush");

    await_count(&progress, PAIRS * 2);

    running.store(false, Ordering::Relaxed);
    drop(client);
    gateway.stop();
    let engine = engine_thread.join().expect("engine thread");

    assert_eq!(engine.metrics().order_count(), PAIRS * 2);
    assert_eq!(engine.metrics().trade_count(), PAIRS);
    assert_eq!(engine.metrics().sample_count(), (PAIRS * 2) as usize);
    assert_eq!(engine.book().order_count(), 0);
}

#[test]
fn non_order_frames_are_skipped_on_the_wire() {
    let (tx, rx) = queue::spsc::<Order>(256);
    let running = Arc::new(AtomicBool::new(true));

    let mut gateway = OrderGateway::new(0, tx, Arc::clone(&running));
    gateway.start().expect("gateway start");
    let addr = gateway.local_addr().expect("bound address");

    let progress = Arc::new(AtomicU64::new(0));
    let engine_progress = Arc::clone(&progress);
    let engine_running = Arc::clone(&running);
    let engine_thread = thread::spawn(move || {
        let mut engine = MatchingEngine::new(rx, TreeBook::new(1_000));
        while engine_running.load(Ordering::Relaxed) {
            if engine.poll() {
                engine_progress.store(engine.metrics().order_count(), Ordering::Relaxed);
            } else {
                thread::yield_now();
            }
        }
        engine
    });

    let mut client = TcpStream::connect(addr).expect("connect");

    // Heartbeat (35=0) between two orders; only the orders must count.
    let mut wire = Vec::new();
    wire.extend_from_slice(&fix::encode_new_order_single(
        1,
        Side::Buy,
        100,
        5,
        OrderType::Limit,
    ));
    wire.extend_from_slice(b"8=FIX.4.2\x019=5\x0135=0\x0110=000\x01");
    wire.extend_from_slice(&fix::encode_new_order_single(
        2,
        Side::Buy,
        101,
        5,
        OrderType::Limit,
    ));
    client.write_all(&wire).expect("send");

    await_count(&progress, 2);

    running.store(false, Ordering::Relaxed);
    drop(client);
    gateway.stop();
    let engine = engine_thread.join().expect("engine thread");

    assert_eq!(engine.metrics().order_count(), 2);
    assert_eq!(engine.book().order_count(), 2);
    assert_eq!(engine.book().best_bid(), 101);
}
