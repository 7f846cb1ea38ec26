//! End-to-end echo latency benchmark for Huddle.
//!
//! Measures WebSocket round-trip time against a running server with real
//! network I/O. By default it uses the open `/socket` endpoint; pass a
//! `ws://.../session/{id}/connect/{client}` URL to measure a session relay.

use futures_util::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const DEFAULT_URL: &str = "ws://127.0.0.1:8080/socket";
const ROUNDS_PER_CLIENT: usize = 10_000;
const PAYLOAD_SIZE: usize = 64;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let url = args.get(1).cloned().unwrap_or_else(|| DEFAULT_URL.to_string());
    let num_clients: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(8);

    println!("Huddle end-to-end echo benchmark");
    println!("  Make sure the server is running: cargo run --release --bin huddle");
    println!("  URL: {}", url);
    println!(
        "  Clients: {}, rounds per client: {}, payload: {}B",
        num_clients, ROUNDS_PER_CLIENT, PAYLOAD_SIZE
    );
    println!();

    let start = Instant::now();
    let mut clients = JoinSet::new();
    for client_id in 0..num_clients {
        let url = url.clone();
        clients.spawn(async move { (client_id, run_client(&url).await) });
    }

    let mut samples = Vec::with_capacity(num_clients * ROUNDS_PER_CLIENT);
    while let Some(joined) = clients.join_next().await {
        match joined {
            Ok((_, Ok(mut latencies))) => samples.append(&mut latencies),
            Ok((client_id, Err(e))) => eprintln!("Client {} error: {}", client_id, e),
            Err(e) => eprintln!("Client task failed: {}", e),
        }
    }
    let elapsed = start.elapsed();

    if samples.is_empty() {
        eprintln!("No samples collected");
        return;
    }

    samples.sort_unstable();
    let percentile = |p: f64| samples[((samples.len() - 1) as f64 * p) as usize];

    println!("Round trips: {}", samples.len());
    println!(
        "Throughput:  {:.0} echoes/sec",
        samples.len() as f64 / elapsed.as_secs_f64()
    );
    println!("p50:         {:?}", percentile(0.50));
    println!("p99:         {:?}", percentile(0.99));
    println!("max:         {:?}", percentile(1.0));
}

async fn run_client(url: &str) -> Result<Vec<Duration>, Box<dyn std::error::Error + Send + Sync>> {
    let (ws, _) = connect_async(url).await?;
    let (mut sender, mut receiver) = ws.split();

    let payload = Message::Binary(vec![0u8; PAYLOAD_SIZE]);
    let mut latencies = Vec::with_capacity(ROUNDS_PER_CLIENT);

    for _ in 0..ROUNDS_PER_CLIENT {
        let sent_at = Instant::now();
        sender.send(payload.clone()).await?;

        loop {
            match receiver.next().await {
                Some(Ok(Message::Binary(_))) => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err("connection closed".into()),
            }
        }

        latencies.push(sent_at.elapsed());
    }

    sender.close().await?;
    Ok(latencies)
}
