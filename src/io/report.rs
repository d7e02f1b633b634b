use std::{fs::File, io::BufWriter, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Timing record persisted after a run, e.g. `{"mean": 0.0123}`. Solvers never read it back.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingReport {
    /// Elapsed wall-clock time of the search in seconds
    pub mean: f64,
}

impl TimingReport {
    pub fn from_elapsed(elapsed: Duration) -> Self {
        Self {
            mean: elapsed.as_secs_f64(),
        }
    }

    pub fn try_write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}
