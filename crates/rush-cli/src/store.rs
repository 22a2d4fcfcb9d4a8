use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rush_ledger::Ledger;

/// JSON snapshot file holding the ledger between invocations.
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> anyhow::Result<Ledger> {
        let text = std::fs::read_to_string(&self.path).with_context(|| {
            format!("reading state {} (run `rush init` first)", self.path.display())
        })?;
        let ledger = Ledger::from_json(&text)
            .with_context(|| format!("loading state {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "state loaded");
        Ok(ledger)
    }

    /// Replace the state file. The snapshot is written to a sibling temp
    /// file and renamed over the old one.
    pub fn save(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let json = ledger.to_json()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("writing state {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), bytes = json.len(), "state saved");
        Ok(())
    }

    /// Load, apply `f`, and save only if `f` succeeds.
    pub fn update<T>(&self, f: impl FnOnce(&Ledger) -> anyhow::Result<T>) -> anyhow::Result<T> {
        let ledger = self.load()?;
        let value = f(&ledger)?;
        self.save(&ledger)?;
        Ok(value)
    }
}
