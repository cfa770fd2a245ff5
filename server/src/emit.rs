//! Snapshot sinks for the headless host.

use std::io::Write;

use anyhow::Result;
use fragfall_shared::{FragmentView, TickReport};
use serde::Serialize;

/// One line of the JSONL stream.
#[derive(Serialize)]
struct SnapshotLine<'a> {
    tick: u64,
    fragments: &'a [FragmentView],
}

/// Where per-tick snapshots go.
pub trait SnapshotSink {
    fn emit(&mut self, report: &TickReport, fragments: &[FragmentView]) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes every snapshot as one JSON object per line.
pub struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SnapshotSink for JsonLines<W> {
    fn emit(&mut self, report: &TickReport, fragments: &[FragmentView]) -> Result<()> {
        let line = SnapshotLine {
            tick: report.tick,
            fragments,
        };
        serde_json::to_writer(&mut self.out, &line)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Logs a one-line summary every `every` ticks and whenever something split.
pub struct Summary {
    every: u64,
    splits: usize,
    despawned: usize,
}

impl Summary {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            splits: 0,
            despawned: 0,
        }
    }
}

impl SnapshotSink for Summary {
    fn emit(&mut self, report: &TickReport, fragments: &[FragmentView]) -> Result<()> {
        self.splits += report.resolve.splits;
        self.despawned += report.despawned.len();

        if report.resolve.splits > 0 {
            tracing::debug!(
                tick = report.tick,
                splits = report.resolve.splits,
                spawned = ?report.resolve.spawned,
                "split"
            );
        }
        if report.tick % self.every == 0 {
            tracing::info!(
                tick = report.tick,
                live = fragments.len(),
                splits = self.splits,
                despawned = self.despawned,
                "progress"
            );
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        tracing::info!(
            splits = self.splits,
            despawned = self.despawned,
            "run finished"
        );
        Ok(())
    }
}
