use powercard_core::{Point, Px2};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent};

const COATING_FILL: &str = "#1a1a1a";
const COATING_STROKE: &str = "#2c2c2c";
const PATTERN_STEP: u32 = 20;
const PATTERN_LENGTH: f64 = 10.0;

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

/// Resizes the canvas to the surface and covers it with the scratch coating.
pub(crate) fn paint_coating(canvas: &HtmlCanvasElement, (width, height): Px2) {
    canvas.set_width(width);
    canvas.set_height(height);
    let Some(ctx) = context_2d(canvas) else {
        log::error!("no 2d context for the scratch canvas");
        return;
    };

    if let Err(err) = ctx.set_global_composite_operation("source-over") {
        log::error!("failed to set composite operation: {:?}", err);
    }
    ctx.set_fill_style_str(COATING_FILL);
    ctx.fill_rect(0.0, 0.0, f64::from(width), f64::from(height));

    ctx.set_stroke_style_str(COATING_STROKE);
    ctx.set_line_width(1.0);
    for x in (0..width).step_by(PATTERN_STEP as usize) {
        for y in (0..height).step_by(PATTERN_STEP as usize) {
            let (x, y) = (f64::from(x), f64::from(y));
            ctx.begin_path();
            ctx.move_to(x, y);
            ctx.line_to(x + PATTERN_LENGTH, y + PATTERN_LENGTH);
            ctx.stroke();
        }
    }
}

/// Cuts a transparent disc out of the coating.
pub(crate) fn erase(canvas: &HtmlCanvasElement, center: Point, radius: f64) {
    let Some(ctx) = context_2d(canvas) else {
        return;
    };
    if let Err(err) = ctx.set_global_composite_operation("destination-out") {
        log::error!("failed to set composite operation: {:?}", err);
        return;
    }
    ctx.begin_path();
    if let Err(err) = ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU) {
        log::error!("failed to trace brush: {:?}", err);
        return;
    }
    ctx.fill();
}

/// Bounding box of the canvas in client coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    fn of(canvas: &HtmlCanvasElement) -> Self {
        let rect = canvas.get_bounding_client_rect();
        Self {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    /// Maps a client position into surface pixels, accounting for CSS scaling of the canvas.
    pub(crate) fn to_surface(self, (client_x, client_y): (f64, f64), (width, height): Px2) -> Point {
        let point = Point::new(client_x, client_y).relative_to(Point::new(self.left, self.top));
        let scale = |extent: f64, size: u32| {
            if extent > 0.0 {
                f64::from(size) / extent
            } else {
                1.0
            }
        };
        Point::new(
            point.x * scale(self.width, width),
            point.y * scale(self.height, height),
        )
    }
}

pub(crate) fn mouse_point(canvas: &HtmlCanvasElement, e: &MouseEvent, size: Px2) -> Point {
    ClientRect::of(canvas).to_surface((f64::from(e.client_x()), f64::from(e.client_y())), size)
}

/// Position of the first active touch, if any.
pub(crate) fn touch_point(canvas: &HtmlCanvasElement, e: &TouchEvent, size: Px2) -> Option<Point> {
    let touch = e.touches().get(0)?;
    Some(ClientRect::of(canvas).to_surface((f64::from(touch.client_x()), f64::from(touch.client_y())), size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_position_is_made_relative_to_canvas() {
        let rect = ClientRect {
            left: 100.0,
            top: 40.0,
            width: 320.0,
            height: 470.0,
        };

        assert_eq!(rect.to_surface((150.0, 90.0), (320, 470)), Point::new(50.0, 50.0));
    }

    #[test]
    fn css_scaling_is_undone() {
        let rect = ClientRect {
            left: 0.0,
            top: 0.0,
            width: 160.0,
            height: 235.0,
        };

        assert_eq!(rect.to_surface((80.0, 47.0), (320, 470)), Point::new(160.0, 94.0));
    }

    #[test]
    fn collapsed_canvas_does_not_divide_by_zero() {
        let rect = ClientRect {
            left: 10.0,
            top: 10.0,
            width: 0.0,
            height: 0.0,
        };

        assert_eq!(rect.to_surface((15.0, 20.0), (320, 470)), Point::new(5.0, 10.0));
    }
}
