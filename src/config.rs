//! Runtime configuration handed to `start_vignette()` from JS.
//!
//! Every field has a default so the host page may pass `undefined`, `{}` or a
//! partial object. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VignetteConfig {
    /// Key for the generative text service. Without one every reflection is a fallback.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub retry: RetryConfig,
    pub pacing: PacingConfig,
    pub scene: SceneConfig,
    /// One of trace / debug / info / warn / error.
    pub log_level: String,
}

impl Default for VignetteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.8,
            top_p: 0.9,
            retry: RetryConfig::default(),
            pacing: PacingConfig::default(),
            scene: SceneConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Backoff policy for rate-limited generation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay.
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_jitter_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacingConfig {
    /// Minimum time between minigame success and the purified screen.
    pub purify_dwell_ms: u64,
    pub dialogue_dismiss_ms: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            purify_dwell_ms: 1500,
            dialogue_dismiss_ms: 5000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub petal_count: usize,
    pub spark_target: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            petal_count: 60,
            spark_target: 30,
            canvas_width: 960,
            canvas_height: 600,
        }
    }
}

impl VignetteConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read the config object passed from the host page.
    #[cfg(target_arch = "wasm32")]
    pub fn from_js(value: wasm_bindgen::JsValue) -> Result<Self, ConfigError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_wasm_bindgen::from_value(value)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature",
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "top_p",
                reason: format!("{} is outside (0.0, 1.0]", self.top_p),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.scene.petal_count == 0 {
            return Err(ConfigError::Invalid {
                field: "scene.petal_count",
                reason: "at least one petal is required".to_string(),
            });
        }
        if self.scene.canvas_width == 0 || self.scene.canvas_height == 0 {
            return Err(ConfigError::Invalid {
                field: "scene.canvas_width",
                reason: "canvas dimensions must be non-zero".to_string(),
            });
        }
        if !(self.pacing.dialogue_dismiss_ms.is_finite() && self.pacing.dialogue_dismiss_ms > 0.0) {
            return Err(ConfigError::Invalid {
                field: "pacing.dialogue_dismiss_ms",
                reason: format!("{} is not a positive finite duration", self.pacing.dialogue_dismiss_ms),
            });
        }
        self.max_level()?;
        Ok(())
    }

    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::Invalid {
                field: "log_level",
                reason: format!("unknown level `{}`", self.log_level),
            })
    }

    /// Key with surrounding whitespace removed; blank keys count as missing.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let cfg = VignetteConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, VignetteConfig::default());
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.pacing.purify_dwell_ms, 1500);
        assert_eq!(cfg.scene.spark_target, 30);
    }

    #[test]
    fn test_partial_nested_override_keeps_sibling_defaults() {
        let cfg = VignetteConfig::from_json_str(r#"{"retry":{"base_delay_ms":10},"log_level":"debug"}"#)
            .unwrap();
        assert_eq!(cfg.retry.base_delay_ms, 10);
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.max_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_unknown_field_is_a_parse_error() {
        let err = VignetteConfig::from_json_str(r#"{"temprature":0.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_out_of_range_sampling_is_rejected() {
        let err = VignetteConfig::from_json_str(r#"{"top_p":1.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "top_p", .. }));
        let err = VignetteConfig::from_json_str(r#"{"temperature":-1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "temperature", .. }));
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let err = VignetteConfig::from_json_str(r#"{"log_level":"loud"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "log_level", .. }));
    }

    #[test]
    fn test_non_finite_dismiss_time_is_rejected() {
        let mut cfg = VignetteConfig::default();
        for bad in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            cfg.pacing.dialogue_dismiss_ms = bad;
            let err = cfg.validate().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { field: "pacing.dialogue_dismiss_ms", .. }), "{bad} accepted");
        }
        cfg.pacing.dialogue_dismiss_ms = 5000.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let mut cfg = VignetteConfig::default();
        cfg.api_key = Some("   ".into());
        assert_eq!(cfg.api_key(), None);
        cfg.api_key = Some(" abc ".into());
        assert_eq!(cfg.api_key(), Some("abc"));
    }
}
