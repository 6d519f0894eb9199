use crate::models::CyclesState;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Versioned so an incompatible snapshot shape gets a fresh slot.
pub const STATE_FILE: &str = "cycles-state-1.0.0.json";

#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn get_base_dir() -> Result<PathBuf> {
        let mut path =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        path.push(".pomo");
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn new() -> Result<Self> {
        let path = Self::get_base_dir()?;
        Ok(Self::from_path(path.join(STATE_FILE)))
    }

    pub fn from_path(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<CyclesState> {
        if !self.path.exists() {
            return Ok(CyclesState::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&data)?;
        Ok(state)
    }

    /// Like [`Storage::load`], but an unreadable or corrupted slot yields the
    /// empty snapshot.
    pub fn load_or_default(&self) -> CyclesState {
        match self.load() {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(
                    path = %self.path().display(),
                    error = %err,
                    "stored cycles are unreadable, starting with empty history"
                );
                CyclesState::default()
            }
        }
    }

    pub fn save(&self, state: &CyclesState) -> Result<()> {
        let data = serde_json::to_string(state)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
