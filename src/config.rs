// Engine settings, read once at startup from
// <config dir>/padseq/config.json (or --config <path>).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sequencer::presets::PresetPattern;
use crate::sequencer::scheduler::ClickTones;
use crate::sequencer::state::{CountInBars, PlayMode, RecordQuantize};
use crate::sequencer::tempo::clamp_bpm;

const APP_DIR: &str = "padseq";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lookahead_ms: u64,
    pub tick_interval_ms: u64,
    pub default_bpm: u16,
    pub count_in_bars: CountInBars,
    pub tap_reset_ms: u64,
    pub tap_history: usize,
    pub play_mode: PlayMode,
    pub record_quantize: RecordQuantize,
    pub accent_hz: f32,
    pub beat_hz: f32,
    pub click_ms: u64,
    // appended to the built-in presets
    pub presets: Vec<PresetPattern>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_ms: 100,
            tick_interval_ms: 25,
            default_bpm: 120,
            count_in_bars: CountInBars::Off,
            tap_reset_ms: 2000,
            tap_history: 8,
            play_mode: PlayMode::OneShot,
            record_quantize: RecordQuantize::Current,
            accent_hz: 1000.0,
            beat_hz: 800.0,
            click_ms: 50,
            presets: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads `path`, or the default location when `path` is `None`. A missing
    /// file at the default location just means defaults; an explicit path
    /// has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };
        if !required && !path.exists() {
            log::debug!(target: "config", "no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        let config = Self::from_json(&data).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        log::info!(target: "config", "loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(data)?;
        Ok(config.sanitized())
    }

    // Pull every value back into a range the scheduler can live with.
    pub fn sanitized(mut self) -> Self {
        self.tick_interval_ms = self.tick_interval_ms.clamp(1, 250);
        // the window has to outlast the gap between ticks or steps get late
        self.lookahead_ms = self.lookahead_ms.clamp(self.tick_interval_ms + 1, 1000);
        self.default_bpm = clamp_bpm(self.default_bpm as i64);
        self.tap_history = self.tap_history.clamp(2, 64);
        self.tap_reset_ms = self.tap_reset_ms.max(1);
        self.click_ms = self.click_ms.clamp(1, 500);
        if !(self.accent_hz.is_finite() && self.accent_hz > 0.0) {
            self.accent_hz = 1000.0;
        }
        if !(self.beat_hz.is_finite() && self.beat_hz > 0.0) {
            self.beat_hz = 800.0;
        }
        self
    }

    pub fn lookahead_secs(&self) -> f64 {
        self.lookahead_ms as f64 / 1000.0
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn tap_reset(&self) -> Duration {
        Duration::from_millis(self.tap_reset_ms)
    }

    pub fn click_tones(&self) -> ClickTones {
        ClickTones {
            accent_hz: self.accent_hz,
            beat_hz: self.beat_hz,
            duration: self.click_ms as f64 / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let c = EngineConfig::from_json("{}").unwrap();
        assert_eq!(c, EngineConfig::default());
        assert_eq!(c.lookahead_secs(), 0.1);
        assert_eq!(c.tick_interval(), Duration::from_millis(25));
        assert_eq!(c.click_tones(), ClickTones::default());
    }

    #[test]
    fn partial_config_overrides() {
        let c = EngineConfig::from_json(
            r#"{"default_bpm": 90, "play_mode": "hold", "count_in_bars": 2,
                "presets": [{"name": "mine", "category": "x", "steps_by_pad": {"1": [3]}}]}"#,
        )
        .unwrap();
        assert_eq!(c.default_bpm, 90);
        assert_eq!(c.play_mode, PlayMode::Hold);
        assert_eq!(c.count_in_bars, CountInBars::Two);
        assert_eq!(c.presets.len(), 1);
        assert_eq!(c.lookahead_ms, 100);
    }

    #[test]
    fn out_of_range_values_are_pulled_in() {
        let c = EngineConfig::from_json(
            r#"{"default_bpm": 999, "tick_interval_ms": 50, "lookahead_ms": 10, "tap_history": 0, "accent_hz": -3}"#,
        )
        .unwrap();
        assert_eq!(c.default_bpm, 300);
        assert_eq!(c.lookahead_ms, 51);
        assert_eq!(c.tap_history, 2);
        assert_eq!(c.accent_hz, 1000.0);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(EngineConfig::from_json(r#"{"count_in_bars": 3}"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = EngineConfig::load(Some(Path::new("/definitely/not/here/config.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
