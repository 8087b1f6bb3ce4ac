//! CanFlow Binary - live CAN-bus statistics dashboard
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin canflow -- ip:192.168.4.1:3333   # TCP
//! cargo run --release --bin canflow -- /dev/ttyUSB0          # serial line
//! cargo run --release --bin canflow -- capture.jsonl         # replay (read-only)
//! ```
//!
//! ## Environment Variables
//!
//! - CANFLOW_WINDOW_DEPTH - Samples kept per payload slot (default: 50)
//! - CANFLOW_HISTORY_LIMIT - Decoded records kept per identifier (default: 1000)
//! - CANFLOW_REFRESH_MS - Dashboard redraw interval (default: 100)
//! - CANFLOW_TOP_ROWS - Rows shown per table (default: 20)
//! - CANFLOW_SERIAL_BAUD - Serial baud rate (default: 115200)
//! - CANFLOW_SERIAL_TIMEOUT_MS - Serial read timeout (default: 1000)
//! - RUST_LOG - Logging level (optional, default: info)

use canflow::pipeline::{run_event_loop, ExitReason, Session};
use canflow::ui::TerminalRenderer;
use canflow::{Config, IngestionPipeline, Transport};
use std::env;

fn parse_source_from_args() -> Option<String> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [source] => Some(source.clone()),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr; the dashboard owns stdout's alternate screen
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let Some(source) = parse_source_from_args() else {
        eprintln!("usage: canflow <ip:host:port | serial-device | replay-file>");
        std::process::exit(2);
    };

    let config = Config::from_env()?;

    log::info!("🚀 Starting CanFlow...");
    log::info!("📊 Configuration:");
    log::info!("   Source: {}", source);
    log::info!("   Window depth: {}", config.window_depth);
    log::info!("   History limit: {}", config.history_limit);
    log::info!("   Refresh: {}ms", config.refresh_ms);
    log::info!("   Log filter: {}", config.rust_log.as_deref().unwrap_or("info"));

    let transport = match Transport::open(&source, &config).await {
        Ok(transport) => transport,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };
    if transport.kind().is_read_only() {
        log::info!("📖 Replay file opened read-only, mode commands disabled");
    }

    let mut session = Session::new(IngestionPipeline::from_config(&config), transport);
    let mut renderer = TerminalRenderer::new(config.top_rows)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let reason = run_event_loop(&mut session, &mut renderer, config.refresh_interval(), shutdown).await;

    // Leave the alternate screen before printing anything else
    drop(renderer);

    let state = session.pipeline.state();
    match reason? {
        ExitReason::Quit => log::info!("✅ Stopped by operator"),
        ExitReason::Shutdown => log::info!("✅ Stopped by signal"),
    }
    log::info!(
        "   {} errors in {} packets with {} ids",
        state.errors(),
        state.total_packets(),
        state.identifier_count()
    );

    Ok(())
}
