//! Per-model conversion statistics and text reports

use std::io::{self, Write};

use nurbs_kernel::{Face, Solid, SurfaceKind};
use serde::{Deserialize, Serialize};

/// Original geometry of a failed conversion, kept for dumping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailedGeometry {
    Face(Face),
    Solid(Solid),
}

/// Face counts per surface type, failure messages and failed geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStatistics {
    counts: [usize; SurfaceKind::ALL.len()],
    failures: Vec<String>,
    failed_geometry: Vec<(String, FailedGeometry)>,
}

impl ConversionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one face of the given type
    pub fn record_face(&mut self, kind: SurfaceKind) {
        self.counts[kind.index()] += 1;
    }

    /// Record a failure message together with the untouched input geometry
    pub fn record_failure(
        &mut self,
        identifier: impl Into<String>,
        message: impl Into<String>,
        geometry: FailedGeometry,
    ) {
        self.failures.push(message.into());
        self.failed_geometry.push((identifier.into(), geometry));
    }

    /// Add the counts of `local` and append its failures after ours
    pub fn merge(&mut self, local: ConversionStatistics) {
        for (total, count) in self.counts.iter_mut().zip(local.counts) {
            *total += count;
        }
        self.failures.extend(local.failures);
        self.failed_geometry.extend(local.failed_geometry);
    }

    pub fn count(&self, kind: SurfaceKind) -> usize {
        self.counts[kind.index()]
    }

    pub fn total_faces(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn failed_geometry(&self) -> &[(String, FailedGeometry)] {
        &self.failed_geometry
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Stats:` followed by one `{Tag} {count}` line per surface type
    pub fn write_stats_report(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Stats:")?;
        for kind in SurfaceKind::ALL {
            writeln!(out, "{kind} {}", self.count(kind))?;
        }
        Ok(())
    }

    /// `Fails: {n}` followed by one message per line
    pub fn write_fails_report(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Fails: {}", self.failures.len())?;
        for message in &self.failures {
            writeln!(out, "{message}")?;
        }
        Ok(())
    }
}
