//! Browser host: canvas, DOM overlays, input listeners and the three loops.
//!
//! State lives in a thread-local (the page is single-threaded). The frame loop
//! runs on `requestAnimationFrame`; particles tick on a 16 ms interval; the
//! purification future runs on the microtask executor and writes its result
//! back through the same thread-local.

mod render;

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_timers::callback::Interval;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

use crate::config::VignetteConfig;
use crate::narrative::{NarrativeState, PurificationRequest};
use crate::reflection::gemini::GeminiClient;
use crate::reflection::{ReflectionGenerator, Sleeper};
use crate::scene::{PARTICLE_TICK_MS, Point};
use crate::vignette::Vignette;

type Generator = ReflectionGenerator<GeminiClient, TimerSleeper>;

/// `gloo-timers` backed sleeper for backoff and pacing waits.
pub struct TimerSleeper;

#[async_trait(?Send)]
impl Sleeper for TimerSleeper {
    async fn sleep(&self, ms: u64) {
        TimeoutFuture::new(ms.min(u32::MAX as u64) as u32).await;
    }
}

/// Runtime page state.
struct WebState {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    vignette: Vignette,
    overlay: render::OverlayCache,
    // Dropping the interval cancels the particle loop.
    _particles: Interval,
}

thread_local! {
    static VIGNETTE: RefCell<Option<WebState>> = const { RefCell::new(None) };
}

pub(crate) fn init_logging(config: &VignetteConfig) {
    use std::sync::Once;
    static INIT: Once = Once::new();
    let level = config.max_level().unwrap_or(tracing::Level::INFO);
    INIT.call_once(|| {
        tracing_wasm::set_as_global_default_with_config(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(level)
                .build(),
        );
    });
}

fn performance_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Client coordinates -> 0..100 viewport percentages.
fn viewport_percent(client_x: f64, client_y: f64) -> Point {
    let (w, h) = window()
        .map(|w| {
            let iw = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
            let ih = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
            (iw.max(1.0), ih.max(1.0))
        })
        .unwrap_or((1.0, 1.0));
    Point::new(client_x / w * 100.0, client_y / h * 100.0)
}

fn with_state(f: impl FnOnce(&mut WebState)) {
    VIGNETTE.with(|cell| {
        if let Some(state) = cell.borrow_mut().as_mut() {
            f(state);
        }
    });
}

pub(crate) fn start(config: VignetteConfig) -> Result<(), JsValue> {
    if VIGNETTE.with(|cell| cell.borrow().is_some()) {
        tracing::warn!("vignette already running; ignoring second start");
        return Ok(());
    }

    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

    // Create / reuse the full-viewport canvas
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id("dd-canvas") {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id("dd-canvas");
        c.set_attribute("style", "position:fixed; inset:0; width:100vw; height:100vh; background:#0b0b10; z-index:10; cursor:none;").ok();
        body.append_child(&c)?;
        c
    };
    canvas.set_width(config.scene.canvas_width);
    canvas.set_height(config.scene.canvas_height);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    ctx.set_text_align("center");

    render::ensure_overlays(&doc, &body)?;

    let generator: Rc<Generator> = Rc::new(ReflectionGenerator::new(
        GeminiClient::from_config(&config),
        TimerSleeper,
        &config,
    ));
    if config.api_key().is_none() {
        tracing::info!("no API key configured; reflections will use the canned verses");
    }

    let particles = Interval::new(PARTICLE_TICK_MS, || {
        let now = performance_now();
        with_state(|s| s.vignette.particle_tick(now));
    });

    VIGNETTE.with(|cell| {
        cell.replace(Some(WebState {
            canvas: canvas.clone(),
            ctx,
            vignette: Vignette::new(&config),
            overlay: render::OverlayCache::default(),
            _particles: particles,
        }))
    });

    install_listeners(&win, &doc, &canvas)?;
    start_frame_loop(generator);
    tracing::info!("vignette started");
    Ok(())
}

fn install_listeners(
    win: &web_sys::Window,
    doc: &web_sys::Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    // Spirit cursor follows the pointer
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let at = viewport_percent(evt.client_x() as f64, evt.client_y() as f64);
            with_state(|s| s.vignette.pointer_move(at));
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Points of interest
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let at = viewport_percent(evt.client_x() as f64, evt.client_y() as f64);
            let now = performance_now();
            with_state(|s| {
                s.vignette.activate_at(at, now);
            });
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Press / release: mouse and touch are treated identically
    for (event, pressed) in [
        ("mousedown", true),
        ("touchstart", true),
        ("mouseup", false),
        ("touchend", false),
        ("touchcancel", false),
    ] {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            with_state(|s| {
                if pressed {
                    s.vignette.press_start();
                } else {
                    s.vignette.press_end();
                }
            });
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Overlay buttons (delegated through data-action)
    if let Some(overlay) = doc.get_element_by_id(render::OVERLAY_ID) {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let action = evt
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                .and_then(|el| el.closest("[data-action]").ok().flatten())
                .and_then(|el| el.get_attribute("data-action"));
            if let Some(action) = action {
                evt.stop_propagation();
                with_state(|s| match action.as_str() {
                    "start" => s.vignette.start(),
                    "advance" => s.vignette.advance(),
                    "gallery" => s.vignette.toggle_gallery(),
                    other => tracing::debug!(action = other, "unknown overlay action"),
                });
            }
        }) as Box<dyn FnMut(_)>);
        overlay.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Escape closes the gallery
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if evt.key() == "Escape" {
                with_state(|s| {
                    if s.vignette.orchestrator().is_gallery_open() {
                        s.vignette.toggle_gallery();
                    }
                });
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_frame_loop(generator: Rc<Generator>) {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        let mut pending: Option<PurificationRequest> = None;
        with_state(|state| {
            pending = state.vignette.frame(ts);
            render::render(state, ts);
        });
        // spawn outside the state borrow
        if let Some(request) = pending {
            spawn_purification(request, generator.clone());
        }
        if let Some(w) = window() {
            if let Some(cb) = f.borrow().as_ref() {
                let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
            }
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        if let Some(cb) = g.borrow().as_ref() {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }
}

fn spawn_purification(request: PurificationRequest, generator: Rc<Generator>) {
    wasm_bindgen_futures::spawn_local(async move {
        let reflection = request.resolve(&generator).await;
        let timestamp = js_sys::Date::now() as i64;
        with_state(|s| {
            let before = s.vignette.state();
            s.vignette.complete_purification(reflection, timestamp);
            if before != NarrativeState::Resonance {
                tracing::warn!(state = ?before, "reflection arrived after the scene moved on");
            }
        });
    });
}
