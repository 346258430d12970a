// Canvas painting and DOM overlay upkeep for the browser host.

use std::f64::consts::{PI, TAU};

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlElement, window};

use super::WebState;
use crate::minigame::BreathingMinigame;
use crate::narrative::{NarrativeState, POINTS_OF_INTEREST};
use crate::scene::{Parallax, Point};
use crate::vignette::Vignette;

pub(super) const OVERLAY_ID: &str = "dd-overlay";
const DIALOGUE_ID: &str = "dd-dialogue";

const SERIF: &str = "'Noto Serif SC', 'SimSun', serif";

/// Remembers what the DOM currently shows so overlays are rebuilt only when
/// the screen actually changes.
#[derive(Default)]
pub(super) struct OverlayCache {
    screen: Option<ScreenKey>,
    dialogue: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct ScreenKey {
    state: NarrativeState,
    gallery: bool,
    purifying: bool,
    collected: usize,
}

impl ScreenKey {
    fn of(v: &Vignette) -> Self {
        let o = v.orchestrator();
        Self {
            state: o.state(),
            gallery: o.is_gallery_open(),
            purifying: o.is_purifying(),
            collected: o.collection().len(),
        }
    }
}

pub(super) fn ensure_overlays(doc: &Document, body: &HtmlElement) -> Result<(), JsValue> {
    if doc.get_element_by_id(OVERLAY_ID).is_none() {
        let div = doc.create_element("div")?;
        div.set_id(OVERLAY_ID);
        div.set_attribute("style", &format!("position:fixed; inset:0; pointer-events:none; z-index:30; color:#e8e2d6; font-family:{SERIF};"))?;
        body.append_child(&div)?;
    }
    if doc.get_element_by_id(DIALOGUE_ID).is_none() {
        let div = doc.create_element("div")?;
        div.set_id(DIALOGUE_ID);
        div.set_attribute("style", &dialogue_style(false))?;
        body.append_child(&div)?;
    }
    Ok(())
}

fn dialogue_style(visible: bool) -> String {
    let (opacity, shift) = if visible { (1.0, 0) } else { (0.0, 16) };
    format!(
        "position:fixed; bottom:12%; left:50%; transform:translate(-50%, {shift}px); max-width:min(680px, 86vw); \
         padding:18px 28px; background:rgba(10,10,14,0.72); border:1px solid rgba(255,255,255,0.12); \
         border-radius:4px; color:#f1ece2; font-family:{SERIF}; font-size:20px; letter-spacing:3px; line-height:1.8; \
         text-align:center; pointer-events:none; z-index:35; opacity:{opacity}; transition:opacity 0.7s, transform 0.7s;"
    )
}

pub(super) fn render(state: &mut WebState, now: f64) {
    paint_scene(&state.ctx, &state.vignette, state.canvas.width() as f64, state.canvas.height() as f64, now);
    if let Err(e) = sync_overlays(&mut state.overlay, &state.vignette) {
        tracing::error!(error = ?e, "overlay update failed");
    }
}

// --- Canvas -----------------------------------------------------------------

fn paint_scene(ctx: &CanvasRenderingContext2d, v: &Vignette, w: f64, h: f64, now: f64) {
    let state = v.state();
    let purified = state == NarrativeState::Purified;
    let parallax = v.scene().parallax();

    // Sky backdrop, warmer once purified
    let sky = ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
    let (top, bottom) = if purified { ("#2b1f2e", "#6b4a4f") } else { ("#0d0f18", "#2a2733") };
    sky.add_color_stop(0.0, top).ok();
    sky.add_color_stop(1.0, bottom).ok();
    ctx.set_fill_style_canvas_gradient(&sky);
    ctx.fill_rect(0.0, 0.0, w, h);

    paint_sky_layer(ctx, parallax, w, h, now);
    paint_far_layer(ctx, parallax, w, h);
    paint_mid_layer(ctx, v, parallax, w, h, now);
    paint_near_layer(ctx, parallax, w, h);
    paint_petals(ctx, v, w, h, purified);

    if !v.cursor_frozen() {
        paint_spirit(ctx, v.cursor(), w, h, now);
    }
    if let Some(game) = v.minigame() {
        paint_minigame(ctx, game, w, h);
    }
}

fn pct(p: Point, w: f64, h: f64) -> (f64, f64) {
    (p.x * w / 100.0, p.y * h / 100.0)
}

fn paint_sky_layer(ctx: &CanvasRenderingContext2d, p: &Parallax, w: f64, h: f64, now: f64) {
    // Slow god rays
    ctx.save();
    ctx.translate(-p.sky.x, -p.sky.y).ok();
    ctx.translate(w * 0.7, -h * 0.1).ok();
    ctx.rotate(-15.0_f64.to_radians()).ok();
    for i in 0..8 {
        let sway = ((now / 4000.0) + i as f64).sin() * 0.02;
        ctx.set_global_alpha(0.04 + sway.abs());
        ctx.set_fill_style_str("#fff3d6");
        ctx.fill_rect(-w * 0.4 + i as f64 * w * 0.1, 0.0, w * 0.03, h * 1.3);
    }
    ctx.set_global_alpha(1.0);
    ctx.restore();
}

fn paint_far_layer(ctx: &CanvasRenderingContext2d, p: &Parallax, w: f64, h: f64) {
    // Silent pavilion silhouette
    ctx.save();
    ctx.translate(-p.far.x, -p.far.y).ok();
    ctx.set_fill_style_str("rgba(20,18,28,0.85)");
    ctx.fill_rect(w * 0.08, h * 0.38, w * 0.22, h * 0.3);
    ctx.begin_path();
    ctx.move_to(w * 0.04, h * 0.4);
    ctx.line_to(w * 0.19, h * 0.28);
    ctx.line_to(w * 0.34, h * 0.4);
    ctx.close_path();
    ctx.fill();
    ctx.restore();
}

fn paint_mid_layer(ctx: &CanvasRenderingContext2d, v: &Vignette, p: &Parallax, w: f64, h: f64, now: f64) {
    ctx.save();
    ctx.translate(-p.mid.x, -p.mid.y).ok();

    // Ground
    ctx.set_fill_style_str("#1b1a20");
    ctx.fill_rect(-w * 0.1, h * 0.7, w * 1.2, h * 0.4);

    // Blossom tree
    ctx.set_fill_style_str("#2a1d1a");
    ctx.fill_rect(w * 0.78, h * 0.3, w * 0.025, h * 0.42);
    ctx.set_fill_style_str("rgba(214,150,170,0.35)");
    for (cx, cy, r) in [(0.79, 0.28, 0.08), (0.73, 0.33, 0.06), (0.85, 0.34, 0.06)] {
        ctx.begin_path();
        ctx.arc(w * cx, h * cy, w * r, 0.0, TAU).ok();
        ctx.fill();
    }

    // Daiyu kneeling by the flower mound
    let (fx, fy) = pct(Point::new(65.0, 65.0), w, h);
    let state = v.state();
    if state == NarrativeState::Exploring {
        let pulse = (now / 900.0).sin() * 0.5 + 0.5;
        ctx.set_fill_style_str(&format!("rgba(255,220,235,{:.3})", 0.08 + pulse * 0.1));
        ctx.begin_path();
        ctx.arc(fx, fy - 20.0, 46.0 + pulse * 8.0, 0.0, TAU).ok();
        ctx.fill();
    }
    ctx.set_fill_style_str("#d9d3cc");
    ctx.fill_rect(fx - 6.0, fy - 44.0, 12.0, 12.0); // head
    ctx.set_fill_style_str("#7e8aa3");
    ctx.fill_rect(fx - 10.0, fy - 32.0, 20.0, 30.0); // robe
    ctx.set_fill_style_str("rgba(0,0,0,0.35)");
    ctx.fill_rect(fx - 16.0, fy - 2.0, 32.0, 4.0); // shadow

    // Purification sparks
    for s in v.scene().sparks() {
        let (sx, sy) = (fx + (s.x - 65.0) * 10.0, fy - 20.0 + (s.y - 65.0) * 10.0);
        ctx.set_global_alpha(s.life.clamp(0.0, 1.0));
        ctx.set_fill_style_str("#ffffff");
        ctx.begin_path();
        ctx.arc(sx, sy, 1.5 + s.life * 2.0, 0.0, TAU).ok();
        ctx.fill();
    }
    ctx.set_global_alpha(1.0);

    // Points of interest
    if state == NarrativeState::Exploring && !v.orchestrator().is_gallery_open() {
        ctx.set_font(&format!("14px {SERIF}"));
        for poi in POINTS_OF_INTEREST {
            let (px, py) = pct(poi.position(), w, h);
            let breathe = ((now / 600.0) + poi.x).sin() * 0.5 + 0.5;
            ctx.set_stroke_style_str(&format!("rgba(255,255,255,{:.3})", 0.35 + breathe * 0.4));
            ctx.set_line_width(1.5);
            ctx.begin_path();
            ctx.arc(px, py, 8.0 + breathe * 3.0, 0.0, TAU).ok();
            ctx.stroke();
            ctx.set_fill_style_str("rgba(240,232,220,0.85)");
            ctx.fill_text(poi.label, px, py - 18.0).ok();
        }
    }
    ctx.restore();
}

fn paint_near_layer(ctx: &CanvasRenderingContext2d, p: &Parallax, w: f64, h: f64) {
    // Foreground shadows, slightly oversized so edges never show
    ctx.save();
    ctx.translate(-p.near.x, -p.near.y).ok();
    ctx.translate(w / 2.0, h / 2.0).ok();
    ctx.scale(1.15, 1.15).ok();
    ctx.translate(-w / 2.0, -h / 2.0).ok();
    ctx.set_fill_style_str("rgba(4,4,8,0.75)");
    ctx.begin_path();
    ctx.ellipse(w * 0.02, h * 0.98, w * 0.22, h * 0.2, 0.0, 0.0, TAU).ok();
    ctx.fill();
    ctx.begin_path();
    ctx.ellipse(w * 0.98, h * 1.0, w * 0.18, h * 0.16, 0.0, 0.0, TAU).ok();
    ctx.fill();
    ctx.restore();
}

fn paint_petals(ctx: &CanvasRenderingContext2d, v: &Vignette, w: f64, h: f64, purified: bool) {
    let (color, alpha) = if purified { ("#ffd1dc", 0.7) } else { ("#d4d4d4", 0.4) };
    ctx.set_fill_style_str(color);
    ctx.set_global_alpha(alpha);
    for petal in v.scene().petals() {
        let (x, y) = pct(Point::new(petal.x, petal.y), w, h);
        ctx.begin_path();
        ctx.ellipse(x, y, petal.size / 2.0, petal.size * 0.35, petal.rotation.to_radians(), 0.0, TAU)
            .ok();
        ctx.fill();
    }
    ctx.set_global_alpha(1.0);
}

fn paint_spirit(ctx: &CanvasRenderingContext2d, at: Point, w: f64, h: f64, now: f64) {
    let (x, y) = pct(at, w, h);
    let flicker = (now / 180.0).sin() * 1.5;
    ctx.set_fill_style_str("rgba(255,255,255,0.12)");
    ctx.begin_path();
    ctx.arc(x, y, 16.0 + flicker, 0.0, TAU).ok();
    ctx.fill();
    ctx.set_fill_style_str("rgba(255,255,255,0.9)");
    ctx.begin_path();
    ctx.arc(x, y, 3.5, 0.0, TAU).ok();
    ctx.fill();
}

fn paint_minigame(ctx: &CanvasRenderingContext2d, game: &BreathingMinigame, w: f64, h: f64) {
    ctx.set_fill_style_str("rgba(0,0,0,0.72)");
    ctx.fill_rect(0.0, 0.0, w, h);

    let shake = game.shake();
    let jitter = |s: f64| (js_sys::Math::random() - 0.5) * s;
    let (cx, cy) = (w / 2.0 + jitter(shake), h / 2.0 + jitter(shake));
    let cycle = game.cycle();
    let progress = game.progress();

    // Breathing light
    ctx.set_shadow_color("white");
    ctx.set_shadow_blur(20.0 + progress * 0.5);
    ctx.set_fill_style_str(if game.is_pressing() { "rgba(255,255,255,0.4)" } else { "rgba(255,255,255,0.1)" });
    ctx.begin_path();
    ctx.arc(cx, cy, 40.0 * cycle.scale(), 0.0, TAU).ok();
    ctx.fill();
    ctx.set_shadow_blur(0.0);

    // Ring reacts to the press
    let ring = if game.is_pressing() { 63.0 } else { 60.0 };
    ctx.set_stroke_style_str("rgba(255,255,255,0.3)");
    ctx.set_line_width(1.0);
    ctx.begin_path();
    ctx.arc(cx, cy, ring, 0.0, TAU).ok();
    ctx.stroke();

    // Radial progress
    ctx.set_stroke_style_str("rgba(255,255,255,0.12)");
    ctx.begin_path();
    ctx.arc(cx, cy, 140.0, 0.0, TAU).ok();
    ctx.stroke();
    ctx.set_stroke_style_str("#ffffff");
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.arc(cx, cy, 140.0, -PI / 2.0, -PI / 2.0 + TAU * progress / 100.0).ok();
    ctx.stroke();

    ctx.set_fill_style_str("rgba(255,255,255,0.8)");
    ctx.set_font("16px 'Fira Code', monospace");
    ctx.fill_text(&format!("{}%", progress.floor() as i64), cx, cy + 175.0).ok();
    ctx.set_font(&format!("24px {SERIF}"));
    ctx.fill_text(cycle.phase.prompt(), cx, cy - 175.0).ok();
}

// --- DOM overlays ----------------------------------------------------------

fn sync_overlays(cache: &mut OverlayCache, v: &Vignette) -> Result<(), JsValue> {
    let doc = window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let text = v.orchestrator().dialogue().text().map(str::to_string);
    if text != cache.dialogue {
        if let Some(el) = doc.get_element_by_id(DIALOGUE_ID) {
            if let Some(t) = text.as_deref() {
                el.set_text_content(Some(t));
            }
            el.set_attribute("style", &dialogue_style(text.is_some()))?;
        }
        cache.dialogue = text;
    }

    let key = ScreenKey::of(v);
    if cache.screen == Some(key) {
        return Ok(());
    }
    if let Some(overlay) = doc.get_element_by_id(OVERLAY_ID) {
        overlay.set_inner_html("");
        build_screen(&doc, &overlay, v, key)?;
    }
    cache.screen = Some(key);
    Ok(())
}

const CARD: &str = "position:absolute; inset:0; display:flex; flex-direction:column; align-items:center; \
                    justify-content:center; gap:22px; background:rgba(5,5,9,0.82); pointer-events:auto; text-align:center;";
const BUTTON: &str = "pointer-events:auto; cursor:pointer; background:transparent; color:#f1ece2; \
                      border:1px solid rgba(255,255,255,0.35); padding:10px 28px; font-size:16px; letter-spacing:6px;";

fn node(doc: &Document, tag: &str, style: &str, text: Option<&str>) -> Result<Element, JsValue> {
    let el = doc.create_element(tag)?;
    el.set_attribute("style", style)?;
    if let Some(t) = text {
        el.set_text_content(Some(t));
    }
    Ok(el)
}

fn button(doc: &Document, label: &str, action: &str) -> Result<Element, JsValue> {
    let el = node(doc, "button", BUTTON, Some(label))?;
    el.set_attribute("data-action", action)?;
    Ok(el)
}

fn build_screen(doc: &Document, overlay: &Element, v: &Vignette, key: ScreenKey) -> Result<(), JsValue> {
    match key.state {
        NarrativeState::Intro => {
            let card = node(doc, "div", CARD, None)?;
            card.append_child(&node(doc, "h1", "font-weight:300; letter-spacing:12px; font-size:40px; margin:0;", Some(crate::TITLE))?)?;
            let lines = node(doc, "p", "line-height:2.2; opacity:0.8; font-size:17px; margin:0;", None)?;
            for line in crate::INTRO_LINES {
                lines.append_child(&node(doc, "span", "display:block;", Some(line))?)?;
            }
            card.append_child(&lines)?;
            card.append_child(&button(doc, "入 梦", "start")?)?;
            overlay.append_child(&card)?;
        }
        NarrativeState::Exploring if key.gallery => {
            let panel = node(doc, "div", &format!("{CARD} justify-content:flex-start; padding-top:8vh; overflow-y:auto;"), None)?;
            panel.append_child(&node(doc, "h2", "font-weight:300; letter-spacing:10px;", Some("太虚幻境 · 尘缘录"))?)?;
            let items = v.orchestrator().collection();
            if items.is_empty() {
                panel.append_child(&node(doc, "div", "opacity:0.5; letter-spacing:4px;", Some(crate::EMPTY_COLLECTION))?)?;
            }
            for item in items {
                let entry = node(doc, "div", "width:min(560px, 86vw); border:1px solid rgba(255,255,255,0.1); padding:16px 20px; text-align:left;", None)?;
                entry.append_child(&node(doc, "div", "font-size:13px; opacity:0.6; letter-spacing:4px;", Some(&item.title))?)?;
                entry.append_child(&node(doc, "p", "font-size:18px; line-height:1.8; margin:10px 0;", Some(&item.reflection))?)?;
                let date = js_sys::Date::new(&JsValue::from_f64(item.timestamp as f64))
                    .to_locale_date_string("zh-CN", &JsValue::UNDEFINED);
                entry.append_child(&node(doc, "div", "font-size:12px; opacity:0.4; text-align:right;", date.as_string().as_deref())?)?;
                panel.append_child(&entry)?;
            }
            panel.append_child(&button(doc, "[ 返回梦境 ]", "gallery")?)?;
            overlay.append_child(&panel)?;
        }
        NarrativeState::Exploring => {
            let nav = node(doc, "div", "position:absolute; top:20px; right:24px; pointer-events:auto;", None)?;
            nav.append_child(&button(doc, &format!("尘缘 · {}", key.collected), "gallery")?)?;
            overlay.append_child(&nav)?;
        }
        NarrativeState::Resonance => {
            let hint = if key.purifying { "化尘中……" } else { crate::RESONANCE_HINT };
            overlay.append_child(&node(
                doc,
                "div",
                "position:absolute; bottom:10%; width:100%; text-align:center; opacity:0.6; letter-spacing:4px; font-size:14px;",
                Some(hint),
            )?)?;
        }
        NarrativeState::Purified => {
            let card = node(doc, "div", CARD, None)?;
            let reflection = v.orchestrator().latest_reflection().unwrap_or_default();
            card.append_child(&node(doc, "p", "font-size:26px; letter-spacing:6px; line-height:2; max-width:80vw; margin:0;", Some(reflection))?)?;
            card.append_child(&button(doc, "归 去", "advance")?)?;
            overlay.append_child(&card)?;
        }
        NarrativeState::Ending => {
            let card = node(doc, "div", CARD, None)?;
            card.append_child(&node(doc, "p", "font-size:20px; letter-spacing:4px; opacity:0.85; max-width:80vw; margin:0;", Some(crate::ENDING_QUOTE))?)?;
            card.append_child(&button(doc, "重 拾 残 梦", "advance")?)?;
            overlay.append_child(&card)?;
        }
    }
    Ok(())
}
