//! Dust Dream core crate.
//!
//! A single-scene narrative vignette: a spirit drifts through Daiyu's garden,
//! reads fragments of verse, breathes in resonance with her grief and earns a
//! generated reflection for its session-local collection.
//!
//! Everything except the `web` host compiles and tests natively; the browser
//! entry point is `start_vignette()`.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod minigame;
pub mod narrative;
pub mod reflection;
pub mod scene;
pub mod vignette;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::VignetteConfig;
pub use narrative::{AppOrchestrator, CollectionItem, NarrativeState};
pub use reflection::ReflectionGenerator;
pub use vignette::Vignette;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Narrative text shown on the full-screen cards. Opaque data, never parsed.
// -----------------------------------------------------------------------------

pub const TITLE: &str = "葬花 · 尘缘";

pub const INTRO_LINES: &[&str] = &[
    "扮演一缕游离的神识，",
    "在注定的悲剧中捕捉那一瞬的微尘。",
    "见证、共振、然后离去。",
];

pub const RESONANCE_HINT: &str = "( 保持神识与宿命的同频，直至化尘 )";

pub const ENDING_QUOTE: &str = "“好便了，了便好。若不了，便不好；若要好，须是了。”";

pub const EMPTY_COLLECTION: &str = "尚无尘缘入梦...";

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

/// Mount the vignette into the page. `config` is an optional plain object
/// matching [`VignetteConfig`]; `undefined` uses the defaults.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_vignette(config: JsValue) -> Result<(), JsValue> {
    let config =
        VignetteConfig::from_js(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    web::init_logging(&config);
    web::start(config)
}
