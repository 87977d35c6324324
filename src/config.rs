use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const CONFIG_PATH_VAR: &str = "FALLING_BLOCKS_CONFIG";

/// Rows kept above the visible field for spawn overshoot and rotation overflow.
pub const MARGIN_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Blocks that fit side by side.
    pub columns: usize,
    /// Visible rows; the grid adds `MARGIN_ROWS` on top.
    pub rows: usize,
    /// Seconds between gravity steps.
    pub wait_time_secs: f32,
    pub cell_side_len: f32,
    /// Fixed seed for the shape stream, random when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: 10,
            rows: 30,
            wait_time_secs: 1.0,
            cell_side_len: 20.0,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn grid_height(&self) -> usize {
        self.rows + MARGIN_ROWS
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_secs_f32(self.wait_time_secs)
    }

    pub fn validate(self) -> Result<Self> {
        // the widest spawn offsets reach one column left and two right of the anchor
        if self.columns < 4 {
            bail!("columns must be at least 4, got {}", self.columns);
        }
        if self.rows == 0 {
            bail!("rows must be positive");
        }
        if !(self.wait_time_secs.is_finite() && self.wait_time_secs > 0.0) {
            bail!("wait_time_secs must be positive, got {}", self.wait_time_secs);
        }
        if !(self.cell_side_len.is_finite() && self.cell_side_len > 0.0) {
            bail!("cell_side_len must be positive, got {}", self.cell_side_len);
        }
        Ok(self)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(text).context("parsing game config")?;
        config.validate()
    }

    /// Reads the file named by `FALLING_BLOCKS_CONFIG`, or falls back to defaults.
    pub fn load() -> Result<Self> {
        let Some(path) = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from) else {
            return Ok(GameConfig::default());
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config in {}", path.display()))
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::GameConfig;

    #[test]
    fn missing_fields_take_defaults() {
        let config = GameConfig::from_json(r#"{"columns": 12}"#).unwrap();
        assert_eq!(config.columns, 12);
        assert_eq!(config.rows, 30);
        assert_eq!(config.grid_height(), 33);
        assert_eq!(config.wait_time(), Duration::from_secs(1));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(GameConfig::from_json("{}").unwrap(), GameConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(GameConfig::from_json(r#"{"columns": 3}"#).is_err());
        assert!(GameConfig::from_json(r#"{"rows": 0}"#).is_err());
        assert!(GameConfig::from_json(r#"{"wait_time_secs": 0.0}"#).is_err());
        assert!(GameConfig::from_json(r#"{"wait_time_secs": -1.0}"#).is_err());
        assert!(GameConfig::from_json("not json").is_err());
    }
}
