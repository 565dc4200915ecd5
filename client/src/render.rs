use web_sys::CanvasRenderingContext2d;

use maskpaint_shared::{Point, Stroke};

use crate::state::State;

pub fn draw_dot(ctx: &CanvasRenderingContext2d, point: Point, color: &str, width: u32) {
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    let _ = ctx.arc(
        point.x as f64,
        point.y as f64,
        width as f64 / 2.0,
        0.0,
        std::f64::consts::PI * 2.0,
    );
    ctx.fill();
}

pub fn draw_segment(
    ctx: &CanvasRenderingContext2d,
    from: Point,
    to: Point,
    color: &str,
    width: u32,
) {
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width as f64);
    ctx.begin_path();
    ctx.move_to(from.x as f64, from.y as f64);
    ctx.line_to(to.x as f64, to.y as f64);
    ctx.stroke();
}

/// Draws a whole stroke as one path so translucent colors do not darken
/// where segments overlap.
pub fn draw_stroke(ctx: &CanvasRenderingContext2d, stroke: &Stroke) {
    let color = stroke.color.to_rgba_css();
    let Some((first, rest)) = stroke.points.split_first() else {
        return;
    };
    if rest.is_empty() {
        draw_dot(ctx, *first, &color, stroke.width);
        return;
    }
    ctx.set_stroke_style_str(&color);
    ctx.set_line_width(stroke.width as f64);
    ctx.begin_path();
    ctx.move_to(first.x as f64, first.y as f64);
    for point in rest {
        ctx.line_to(point.x as f64, point.y as f64);
    }
    ctx.stroke();
}

/// Draws the newest piece of the stroke under the pointer.
pub fn draw_stroke_tail(ctx: &CanvasRenderingContext2d, stroke: &Stroke) {
    let color = stroke.color.to_rgba_css();
    match stroke.points.as_slice() {
        [] => {}
        [only] => draw_dot(ctx, *only, &color, stroke.width),
        [.., from, to] => draw_segment(ctx, *from, *to, &color, stroke.width),
    }
}

pub fn redraw(state: &State) {
    let ctx = &state.ctx;
    ctx.clear_rect(
        0.0,
        0.0,
        state.canvas.width() as f64,
        state.canvas.height() as f64,
    );
    let Some(surface) = state.session.surface() else {
        return;
    };
    for stroke in surface.strokes() {
        draw_stroke(ctx, stroke);
    }
    if let Some(active) = surface.active_stroke() {
        draw_stroke(ctx, active);
    }
}
