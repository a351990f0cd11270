use serde_json::json;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::prelude::*;
use crate::types::{SweepStats, WorkerId};

/// Sink for one JSON line per worker per sweep.
#[derive(Debug)]
pub(crate) struct SweepTrace {
    file: File,
}

impl SweepTrace {
    pub(crate) fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("writing trace to: {:?}", path);

        let file = File::create(path)
            .with_context(|| format!("failed to create trace file {:?}", path))?;

        Ok(Self { file })
    }

    pub(crate) fn record(
        &mut self,
        worker: WorkerId,
        sweep: usize,
        stats: &SweepStats,
        elapsed: Duration,
    ) {
        let line = json!({
            "sweep": sweep,
            "worker": worker.get(),
            "changed": stats.changed,
            "columns_changed": stats.columns_changed,
            "elapsed": elapsed.as_secs_f64(),
        });

        if let Err(e) = serde_json::to_writer(&self.file, &line) {
            warn!("writing trace failed: {}", e);
        }

        let _ = self.file.write(&[b'\n']);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::Value as Json;

    #[test]
    fn test_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");

        let mut trace = SweepTrace::new(&path).unwrap();
        let stats = SweepStats {
            changed: true,
            columns_changed: 12,
        };
        trace.record(WorkerId::new(1), 1, &stats, Duration::from_millis(5));
        trace.record(WorkerId::new(0), 2, &default(), Duration::from_millis(1));
        drop(trace);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines = content
            .lines()
            .map(|l| serde_json::from_str::<Json>(l).unwrap())
            .collect_vec();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["worker"], 1);
        assert_eq!(lines[0]["columns_changed"], 12);
        assert_eq!(lines[0]["changed"], true);
        assert_eq!(lines[1]["sweep"], 2);
        assert_eq!(lines[1]["changed"], false);
    }
}
