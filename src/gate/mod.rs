use crate::config::MarkerPolicy;
use crate::extract::PeriodKey;
use anyhow::{Context, Result};
use glob::glob;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Marker store deciding whether this period's notification already went out.
/// A marker's presence is the whole signal; its content mirrors the sent HTML
/// body for audit.
///
/// Invocations are expected to run as discrete, non-overlapping scheduled
/// jobs; concurrent runs against the same store are out of scope and not
/// locked against.
pub struct SendGate {
    dir: PathBuf,
    policy: MarkerPolicy,
}

impl SendGate {
    pub fn new(dir: impl Into<PathBuf>, policy: MarkerPolicy) -> Result<Self> {
        let gate = SendGate {
            dir: dir.into(),
            policy,
        };
        gate.ensure()?;
        Ok(gate)
    }

    /// Create the store directory if missing. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating marker directory {}", self.dir.display()))
    }

    /// Marker file name for `period`. Content-sensitive naming needs the
    /// extracted value and yields `None` until it is known.
    pub fn marker_name(&self, period: &PeriodKey, value: Option<&str>) -> Option<String> {
        let month = period.month.to_lowercase();
        match self.policy {
            MarkerPolicy::Monthly => Some(format!("{}_rates.html", month)),
            MarkerPolicy::ContentSensitive => {
                value.map(|v| format!("{}_{}.html", month, v.replace('.', "_")))
            }
        }
    }

    pub fn already_sent(&self, period: &PeriodKey, value: Option<&str>) -> bool {
        self.marker_name(period, value)
            .map_or(false, |name| self.dir.join(name).exists())
    }

    /// Persist the marker for `period`, mirroring the sent body.
    pub fn mark_sent(&self, period: &PeriodKey, value: Option<&str>, body: &str) -> Result<()> {
        let name = self
            .marker_name(period, value)
            .context("content-sensitive marker requires the extracted value")?;
        let path = self.dir.join(&name);
        fs::write(&path, body).with_context(|| format!("writing marker {}", path.display()))?;
        info!(marker = %name, "send marker written");
        Ok(())
    }

    /// Names of all markers currently on disk, sorted.
    pub fn markers(&self) -> Result<Vec<String>> {
        let pattern = format!("{}/*.html", self.dir.display());
        let mut names = Vec::new();
        for entry in glob(&pattern).context("invalid marker glob pattern")? {
            let path = entry.context("reading marker directory entry")?;
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete every marker and recreate the empty store. Total, not selective.
    pub fn purge(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)
                .with_context(|| format!("purging marker directory {}", self.dir.display()))?;
        }
        info!(dir = %self.dir.display(), "marker store purged");
        self.ensure()
    }
}
