//! Event loop - transport readiness, render timer and shutdown on one task
//!
//! Main loop:
//! 1. Reads one line from the source when streaming and feeds it to the engine
//! 2. On each render deadline, drains operator commands, redraws, re-arms
//! 3. Stops on Quit or when the shutdown future resolves (Ctrl-C)
//!
//! Every state mutation happens inside a select handler on this one task, so
//! nothing is shared and nothing needs a lock. Pausing only disables the
//! read branch; unread data stays buffered in the source.

use super::control::{Command, StatusLine, PAUSED_INDICATOR, READ_ONLY_INDICATOR};
use super::engine::{IngestionPipeline, Snapshot};
use crate::transport::LineSource;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// What the renderer gets to see on each tick
pub struct DashboardView<'a> {
    pub snapshot: Snapshot<'a>,
    pub indicators: &'a [String],
    pub source: String,
    pub exhausted: bool,
}

/// Output side of the loop (terminal dashboard, or a recorder in tests)
pub trait Renderer {
    fn render(&mut self, view: &DashboardView<'_>) -> std::io::Result<()>;

    /// Commands entered since the last tick; must not block
    fn poll_commands(&mut self) -> std::io::Result<Vec<Command>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    Shutdown,
}

/// Engine, status line and source driven by the event loop
pub struct Session<S: LineSource> {
    pub pipeline: IngestionPipeline,
    pub status: StatusLine,
    pub source: S,
    exhausted: bool,
}

impl<S: LineSource> Session<S> {
    pub fn new(pipeline: IngestionPipeline, source: S) -> Self {
        let mut status = StatusLine::new();
        if source.is_read_only() {
            status.toggle(READ_ONLY_INDICATOR);
        }
        Self {
            pipeline,
            status,
            source,
            exhausted: false,
        }
    }

    /// Whether the source reported end of data
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Apply one operator command; returns false when the loop should stop
    pub async fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::TogglePause => {
                self.pipeline.toggle();
                let paused = !self.pipeline.is_streaming();
                self.status.set(PAUSED_INDICATOR, paused);
                log::info!("{} ingestion", if paused { "⏸️  Paused" } else { "▶️  Resumed" });
            }
            Command::SelectMode(mode) => {
                if self.source.is_read_only() {
                    log::debug!("Ignoring mode {} on read-only source", mode.value());
                    return true;
                }
                match self.source.send_control(&mode.control_frame()).await {
                    Ok(()) => self.status.toggle(&mode.indicator()),
                    Err(e) => log::warn!("Failed to select mode {}: {}", mode.value(), e),
                }
            }
        }
        true
    }

    pub fn view(&self) -> DashboardView<'_> {
        DashboardView {
            snapshot: self.pipeline.snapshot(),
            indicators: self.status.indicators(),
            source: self.source.describe(),
            exhausted: self.exhausted,
        }
    }
}

/// Run until Quit or shutdown
///
/// The render deadline is re-armed after each redraw rather than ticking on a
/// fixed schedule, so a slow redraw never queues up extra ticks.
pub async fn run_event_loop<S, R, F>(
    session: &mut Session<S>,
    renderer: &mut R,
    refresh: Duration,
    shutdown: F,
) -> std::io::Result<ExitReason>
where
    S: LineSource,
    R: Renderer,
    F: Future<Output = ()>,
{
    log::info!("🚀 Starting ingestion from {}", session.source.describe());
    session.pipeline.attach();

    tokio::pin!(shutdown);
    let render_deadline = sleep(refresh);
    tokio::pin!(render_deadline);

    loop {
        let reading = session.pipeline.is_streaming() && !session.exhausted;

        tokio::select! {
            _ = &mut shutdown => {
                log::info!("🛑 Shutdown requested");
                return Ok(ExitReason::Shutdown);
            }

            line = session.source.next_line(), if reading => {
                match line {
                    Ok(Some(line)) => {
                        // Failures are counted inside the engine
                        let _ = session.pipeline.ingest_line(&line);
                    }
                    Ok(None) => {
                        log::info!("📭 Source exhausted: {}", session.source.describe());
                        session.exhausted = true;
                    }
                    Err(e) => {
                        log::error!("❌ Source read error: {}", e);
                        session.exhausted = true;
                    }
                }
            }

            _ = &mut render_deadline => {
                for command in renderer.poll_commands()? {
                    if !session.apply(command).await {
                        log::info!("👋 Quit requested");
                        return Ok(ExitReason::Quit);
                    }
                }

                renderer.render(&session.view())?;
                render_deadline.as_mut().reset(Instant::now() + refresh);
            }
        }
    }
}
