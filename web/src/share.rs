//! "Copy Card": redraws a revealed card on an offscreen canvas and puts it on the clipboard as a PNG.

use js_sys::{Array, Object, Promise, Reflect};
use powercard_core::{Card, ColorScheme, Power, Px2, Rank};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, CanvasRenderingContext2d, ClipboardItem, HtmlCanvasElement, HtmlImageElement};

const PNG: &str = "image/png";
const BACKDROP: &str = "#25453b";
const PADDING: f64 = 16.0;
const SCREENSHOT_HEIGHT: f64 = 170.0;
const BAR_HEIGHT: f64 = 10.0;
const LINE_HEIGHT: f64 = 18.0;
const ADVANTAGE_CHARS_PER_LINE: usize = 34;

/// Filled part of a power bar `track` pixels wide.
pub(crate) fn bar_width(power: Power, track: f64) -> f64 {
    track * f64::from(power.min(10)) / 10.0
}

/// Greedy word wrap at `max_chars` per line. A single longer word gets a line of its own.
pub(crate) fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
        if !line.is_empty() && needed > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn js_error(message: &str) -> JsValue {
    JsValue::from_str(message)
}

fn offscreen_canvas((width, height): Px2) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| js_error("no document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("not a canvas"))?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

async fn load_image(src: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_src(src);
    JsFuture::from(image.decode()).await?;
    Ok(image)
}

fn draw_card(
    ctx: &CanvasRenderingContext2d,
    card: &Card,
    screenshot: &HtmlImageElement,
    (width, height): Px2,
) -> Result<(), JsValue> {
    let (width, height) = (f64::from(width), f64::from(height));
    let inner = width - 2.0 * PADDING;
    let scheme = ColorScheme::from_url(card.source_url().as_str());

    ctx.set_fill_style_str(BACKDROP);
    ctx.fill_rect(0.0, 0.0, width, height);
    ctx.set_fill_style_str(&scheme.bg());
    ctx.fill_rect(4.0, 4.0, width - 8.0, height - 8.0);

    ctx.set_text_baseline("alphabetic");
    ctx.set_text_align("left");
    ctx.set_fill_style_str(&scheme.text());
    ctx.set_font("bold 18px sans-serif");
    ctx.fill_text_with_max_width(card.site_name(), PADDING, 34.0, inner)?;

    ctx.set_font("bold 14px sans-serif");
    ctx.set_text_align("center");
    for (i, &rank) in Rank::ALL.iter().enumerate() {
        let x = PADDING + 10.0 + 24.0 * i as f64;
        if rank == card.rank() {
            ctx.set_fill_style_str(&scheme.primary());
            ctx.fill_rect(x - 10.0, 42.0, 20.0, 20.0);
            ctx.set_fill_style_str(&scheme.lighter());
        } else {
            ctx.set_fill_style_str(&scheme.dark());
        }
        ctx.fill_text(rank.as_str(), x, 57.0)?;
    }

    let top = 72.0;
    ctx.draw_image_with_html_image_element_and_dw_and_dh(
        screenshot,
        PADDING,
        top,
        inner,
        SCREENSHOT_HEIGHT,
    )?;

    let mut y = top + SCREENSHOT_HEIGHT + 30.0;
    ctx.set_text_align("left");
    for (label, power) in [("Attack", card.attack_power()), ("Defence", card.defence_power())] {
        ctx.set_font("13px sans-serif");
        ctx.set_fill_style_str(&scheme.text());
        ctx.fill_text(&format!("{label} {power}"), PADDING, y)?;
        ctx.set_fill_style_str(&scheme.darker());
        ctx.fill_rect(PADDING, y + 6.0, inner, BAR_HEIGHT);
        ctx.set_fill_style_str(&scheme.primary());
        ctx.fill_rect(PADDING, y + 6.0, bar_width(power, inner), BAR_HEIGHT);
        y += 40.0;
    }

    ctx.set_fill_style_str(&scheme.light());
    ctx.set_font("11px sans-serif");
    ctx.fill_text("Hidden advantage", PADDING, y)?;
    ctx.set_fill_style_str(&scheme.text());
    ctx.set_font("italic 14px sans-serif");
    for line in wrap_words(card.hidden_advantage(), ADVANTAGE_CHARS_PER_LINE) {
        y += LINE_HEIGHT;
        ctx.fill_text(&line, PADDING, y)?;
    }
    Ok(())
}

async fn png_blob(canvas: &HtmlCanvasElement) -> Result<Blob, JsValue> {
    let promise = Promise::new(&mut |resolve, reject| {
        let callback = Closure::once_into_js(move |blob: JsValue| {
            let _ = resolve.call1(&JsValue::NULL, &blob);
        });
        if let Err(err) = canvas.to_blob_with_type(callback.unchecked_ref(), PNG) {
            let _ = reject.call1(&JsValue::NULL, &err);
        }
    });
    JsFuture::from(promise)
        .await?
        .dyn_into::<Blob>()
        .map_err(|_| js_error("canvas produced no image"))
}

/// Draws `card` at `size` and writes it to the clipboard.
pub(crate) async fn copy_card(card: &Card, size: Px2) -> Result<(), JsValue> {
    let canvas = offscreen_canvas(size)?;
    let ctx = canvas
        .get_context("2d")?
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or_else(|| js_error("no 2d context"))?;
    let screenshot = load_image(card.screenshot().as_data_uri()).await?;
    draw_card(&ctx, card, &screenshot, size)?;

    let blob = png_blob(&canvas).await?;
    log::debug!("copying {} ({} bytes)", card.site_name(), blob.size());

    let record = Object::new();
    Reflect::set(&record, &JsValue::from_str(PNG), &blob)?;
    let item = ClipboardItem::new_with_record_from_str_to_blob_promise(&record)?;
    let clipboard = web_sys::window().ok_or_else(|| js_error("no window"))?.navigator().clipboard();
    JsFuture::from(clipboard.write(&Array::of1(&item))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_fill_a_tenth_per_point() {
        assert_eq!(bar_width(1, 280.0), 28.0);
        assert_eq!(bar_width(10, 280.0), 280.0);
        assert_eq!(bar_width(0, 280.0), 0.0);
    }

    #[test]
    fn advantage_wraps_on_word_boundaries() {
        let lines = wrap_words("Turns all users into data scientists for 10 glorious seconds", 20);
        assert_eq!(lines, ["Turns all users into", "data scientists for", "10 glorious seconds"]);
        assert!(lines.iter().all(|line| line.chars().count() <= 20));
    }

    #[test]
    fn long_words_and_blank_text() {
        assert_eq!(wrap_words("a supercalifragilistic b", 8), ["a", "supercalifragilistic", "b"]);
        assert!(wrap_words("   ", 8).is_empty());
    }
}
