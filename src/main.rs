use std::str::FromStr;

use depthline::DepthlineError;
use depthline::config::fetch_config;
use depthline::feed::{FeedController, FeedHandle};
use depthline::market::BucketSize;
use depthline::view::DepthView;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), DepthlineError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;
    let (handle, task) = FeedController::spawn(&app_config);

    let mut views = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                log_view(&view);
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !run_command(&handle, line.trim()) {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read stdin: {e}");
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown();
    if let Err(e) = task.await {
        warn!("Feed controller task failed: {e}");
    }

    Ok(())
}

/// Applies one stdin command. Returns `false` when the session should end.
fn run_command(handle: &FeedHandle, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("symbol"), Some(symbol)) => {
            handle.set_symbol(symbol.to_uppercase());
        }
        (Some("bucket"), Some(raw)) => {
            match Decimal::from_str(raw).map_err(|e| e.to_string()).and_then(|step| {
                BucketSize::new(step).map_err(|e| e.to_string())
            }) {
                Ok(bucket_size) => {
                    handle.set_bucket_size(bucket_size);
                }
                Err(e) => warn!("Invalid bucket size {raw}: {e}"),
            }
        }
        (Some("quit" | "exit"), None) => return false,
        (None, _) => {}
        _ => warn!("Unknown command: {line} (expected `symbol SYM`, `bucket STEP` or `quit`)"),
    }
    true
}

fn log_view(view: &DepthView) {
    let best_bid = view.best_bid().map(|level| level.display_price.as_str());
    let best_ask = view.best_ask().map(|level| level.display_price.as_str());
    let spread = view
        .spread
        .map(|spread| spread.value.to_string())
        .unwrap_or_else(|| "-".to_string());

    info!(
        symbol = %view.symbol,
        bucket = %view.bucket_size,
        connected = view.connected,
        best_bid = best_bid.unwrap_or("-"),
        best_ask = best_ask.unwrap_or("-"),
        %spread,
        trades = view.trades.len(),
        "Depth view"
    );
}
