//! Reflection generation with rate-limit backoff and canned fallbacks.
//!
//! `ReflectionGenerator::generate` never fails: whatever happens on the wire,
//! the caller gets a non-empty line of verse back. Transport and timers sit
//! behind small traits so the retry policy can be exercised natively.

pub mod gemini;

use std::cell::RefCell;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{RetryConfig, VignetteConfig};
use crate::error::GenerationError;

/// Canned reflections used when the service is unavailable.
pub const FALLBACK_REFLECTIONS: &[&str] = &[
    "凡所有相，皆是虚妄。若见诸相非相，即见如来。",
    "一花一世界，一叶一菩提。",
    "大千世界，瞬息万变，唯心不动。",
    "本来无一物，何处惹尘埃。",
    "假作真时真亦假，无为有处有还无。",
];

/// One-shot request handed to a [`TextService`].
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
}

pub fn build_prompt(context: &str) -> String {
    format!(
        "You are a Zen master reflecting on a moment from \"Dream of the Red Chamber\" (红楼梦). \
         The moment is: {context}. \
         Provide a short, poetic philosophical reflection in Chinese (max 20 words), \
         similar to verses from the Diamond Sutra or Zhuangzi."
    )
}

/// External generative-text backend.
#[async_trait(?Send)]
pub trait TextService {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Timer used for backoff waits and pacing delays.
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, ms: u64);
}

pub struct ReflectionGenerator<S, Z> {
    service: S,
    sleeper: Z,
    model: String,
    temperature: f64,
    top_p: f64,
    retry: RetryConfig,
    rng: RefCell<StdRng>,
}

impl<S: TextService, Z: Sleeper> ReflectionGenerator<S, Z> {
    pub fn new(service: S, sleeper: Z, config: &VignetteConfig) -> Self {
        Self::with_rng(service, sleeper, config, StdRng::from_entropy())
    }

    pub fn with_rng(service: S, sleeper: Z, config: &VignetteConfig, rng: StdRng) -> Self {
        Self {
            service,
            sleeper,
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            retry: config.retry.clone(),
            rng: RefCell::new(rng),
        }
    }

    pub fn request_for(&self, context: &str) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            prompt: build_prompt(context),
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    /// Delay before retry number `attempt + 1` (attempt is zero-based):
    /// `base * 2^attempt` plus uniform jitter below `max_jitter_ms`.
    pub fn backoff_delay(&self, attempt: u32) -> u64 {
        let exponential = self
            .retry
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let jitter = if self.retry.max_jitter_ms > 0 {
            self.rng.borrow_mut().gen_range(0..self.retry.max_jitter_ms)
        } else {
            0
        };
        exponential.saturating_add(jitter)
    }

    pub fn fallback(&self) -> &'static str {
        let idx = self.rng.borrow_mut().gen_range(0..FALLBACK_REFLECTIONS.len());
        FALLBACK_REFLECTIONS[idx]
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Produce a reflection for `context`. Always resolves to non-empty text.
    pub async fn generate(&self, context: &str) -> String {
        let request = self.request_for(context);

        for attempt in 0..=self.retry.max_retries {
            match self.service.complete(&request).await {
                Ok(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        tracing::warn!(attempt = attempt + 1, "empty reflection from service");
                        break;
                    }
                    if attempt > 0 {
                        tracing::info!(attempt = attempt + 1, "reflection generated after retry");
                    }
                    return trimmed.to_string();
                }
                Err(e) if e.is_rate_limited() && attempt < self.retry.max_retries => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay,
                        error = %e,
                        "rate limited, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(e) if e.is_rate_limited() => {
                    tracing::info!(
                        attempts = attempt + 1,
                        error = %e,
                        "quota exhausted; a personal API key would lift the limit"
                    );
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "reflection generation failed");
                    break;
                }
            }
        }

        self.fallback().to_string()
    }
}
