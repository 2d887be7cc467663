//! `ecosim run` — one-shot simulation run.
//!
//! Starts the configured engine, sends `init` with the `[simulation]`
//! section, advances the requested number of ticks while sampling snapshots
//! into a ring buffer, stops the engine and prints the requested series.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokio::sync::mpsc;

use eco_domain::config::Config;
use eco_engine_client::{EngineSession, SessionBuilder, SessionEvent, SnapshotKind};
use eco_snapshots::{SeriesPoint, SnapshotBuffer};

/// What to do during a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub steps: u32,
    /// Request a snapshot after every `snapshot_every` steps; `0` never.
    pub snapshot_every: u32,
    pub kind: SnapshotKind,
    pub series: Vec<String>,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: String,
    pub final_tick: u64,
    pub snapshots_received: usize,
    pub snapshots_retained: usize,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub path: String,
    pub points: Vec<SeriesPoint>,
}

/// Spawn a session from `config` and drive it through one run.
pub async fn run(config: &Config, opts: &RunOptions) -> anyhow::Result<RunReport> {
    let (errors, _) = super::config::tally(&config.validate());
    if errors > 0 {
        anyhow::bail!("configuration has {errors} error(s); run `ecosim config validate`");
    }

    let buffer = Arc::new(SnapshotBuffer::new(config.snapshots.capacity));
    buffer.configure_downsample(config.snapshots.downsample);

    let (session, events) = SessionBuilder::from_config(&config.engine)
        .snapshot_buffer(buffer.clone())
        .spawn();

    let outcome = drive(&session, events, config, opts).await;
    if let Err(e) = session.shutdown().await {
        tracing::debug!(error = %e, "session already closed");
    }
    let snapshots_received = outcome?;

    let final_tick = session.status().current_tick;
    let series = opts
        .series
        .iter()
        .map(|path| Series {
            path: path.clone(),
            points: buffer.extract_series(path, i64::MIN, i64::MAX),
        })
        .collect();

    Ok(RunReport {
        session_id: session.id().to_string(),
        final_tick,
        snapshots_received,
        snapshots_retained: buffer.size(),
        series,
    })
}

/// Start, init, step and stop. Returns the number of snapshots received.
async fn drive(
    session: &EngineSession,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    config: &Config,
    opts: &RunOptions,
) -> anyhow::Result<usize> {
    session
        .send_init(&config.simulation)
        .context("simulation config rejected")?;
    session.start()?;
    next_event(&mut events, |e| *e == SessionEvent::Started)
        .await
        .context("engine did not start")?;
    tracing::info!(session_id = %session.id(), steps = opts.steps, "engine running");

    let mut snapshots = 0;
    for step in 1..=opts.steps {
        session.send_step(1)?;
        next_event(&mut events, |e| matches!(e, SessionEvent::Stepped { .. }))
            .await
            .with_context(|| format!("step {step} failed"))?;

        if opts.snapshot_every > 0 && step % opts.snapshot_every == 0 {
            session.request_snapshot(opts.kind)?;
            next_event(&mut events, |e| matches!(e, SessionEvent::Snapshot(_)))
                .await
                .with_context(|| format!("snapshot after step {step} failed"))?;
            snapshots += 1;
        }
    }

    session.stop().await?;
    tracing::info!(snapshots, "engine stopped");
    Ok(snapshots)
}

/// Wait for the first event matching `want`, logging everything else.
///
/// Fatal session errors and the end of the event stream abort the wait.
async fn next_event<F>(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    want: F,
) -> anyhow::Result<SessionEvent>
where
    F: Fn(&SessionEvent) -> bool,
{
    while let Some(event) = events.recv().await {
        if want(&event) {
            return Ok(event);
        }
        match event {
            SessionEvent::Error { kind, message } if kind.is_fatal() => {
                anyhow::bail!("{kind}: {message}");
            }
            SessionEvent::Error { kind, message } => {
                tracing::warn!(kind = %kind, message = %message, "engine reported a problem");
            }
            SessionEvent::Log(line) => tracing::info!(target: "ecosim::engine", "{line}"),
            SessionEvent::Stopped => anyhow::bail!("engine stopped unexpectedly"),
            SessionEvent::ConnectionFailed(reason) => {
                tracing::error!(reason = %reason, "giving up on engine connection");
            }
            other => tracing::debug!(event = ?other, "session event"),
        }
    }
    anyhow::bail!("session ended")
}

// ── Output ───────────────────────────────────────────────────────────

/// Plain-text rendering: a summary line, then one block per series.
pub fn render_text(report: &RunReport) -> String {
    let mut out = format!(
        "session {}: tick {}, {} snapshot(s) received, {} retained\n",
        report.session_id, report.final_tick, report.snapshots_received, report.snapshots_retained,
    );
    for series in &report.series {
        out.push_str(&format!("\n{}\n", series.path));
        if series.points.is_empty() {
            out.push_str("  (no samples)\n");
        }
        for p in &series.points {
            out.push_str(&format!("  {:>8}  {}\n", p.sequence, p.value));
        }
    }
    out
}
