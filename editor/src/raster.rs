//! CPU rasterizer for freehand strokes.
//!
//! Strokes are round-capped, round-joined polylines. Each stroke first
//! accumulates a coverage buffer over its bounding box (max over segments)
//! and is then blended onto the target once, so a stroke crossing itself
//! does not build up alpha at the overlap.

use image::{Rgba, RgbaImage};
use maskpaint_shared::{Dimensions, Point, Stroke};

/// Paint `strokes` onto a fresh transparent raster of `size`.
pub fn rasterize(strokes: &[Stroke], size: Dimensions) -> RgbaImage {
    let mut canvas = RgbaImage::new(size.width, size.height);
    for stroke in strokes {
        paint_stroke(&mut canvas, stroke);
    }
    canvas
}

pub fn paint_stroke(canvas: &mut RgbaImage, stroke: &Stroke) {
    let points: Vec<Point> = stroke
        .points
        .iter()
        .copied()
        .filter(|point| point.is_finite())
        .collect();
    if points.is_empty() || canvas.width() == 0 || canvas.height() == 0 {
        return;
    }
    let radius = stroke.width.max(1) as f32 / 2.0;

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for point in &points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    let Some((x0, x1)) = pixel_span(min_x, max_x, radius, canvas.width()) else {
        return;
    };
    let Some((y0, y1)) = pixel_span(min_y, max_y, radius, canvas.height()) else {
        return;
    };
    let box_width = (x1 - x0) as usize;
    let mut coverage = vec![0.0f32; box_width * (y1 - y0) as usize];

    let segments: Vec<(Point, Point)> = if points.len() == 1 {
        vec![(points[0], points[0])]
    } else {
        points.windows(2).map(|pair| (pair[0], pair[1])).collect()
    };
    for (from, to) in segments {
        let Some((sx0, sx1)) = pixel_span(from.x.min(to.x), from.x.max(to.x), radius, canvas.width())
        else {
            continue;
        };
        let Some((sy0, sy1)) = pixel_span(from.y.min(to.y), from.y.max(to.y), radius, canvas.height())
        else {
            continue;
        };
        for y in sy0..sy1 {
            for x in sx0..sx1 {
                let distance = distance_to_segment(x as f32 + 0.5, y as f32 + 0.5, from, to);
                let value = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if value <= 0.0 {
                    continue;
                }
                let index = (y - y0) as usize * box_width + (x - x0) as usize;
                if value > coverage[index] {
                    coverage[index] = value;
                }
            }
        }
    }

    let color = stroke.color.to_rgba();
    for y in y0..y1 {
        for x in x0..x1 {
            let value = coverage[(y - y0) as usize * box_width + (x - x0) as usize];
            if value > 0.0 {
                blend_pixel(canvas.get_pixel_mut(x, y), color, value);
            }
        }
    }
}

/// Half-open pixel range touched by `[min, max]` grown by `radius`, clipped
/// to `[0, limit)`.
fn pixel_span(min: f32, max: f32, radius: f32, limit: u32) -> Option<(u32, u32)> {
    let start = (min - radius - 1.0).floor().max(0.0);
    let end = (max + radius + 1.0).ceil().min(limit as f32);
    if end <= start {
        return None;
    }
    Some((start as u32, end as u32))
}

pub fn distance_to_segment(px: f32, py: f32, from: Point, to: Point) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        return ((px - from.x).powi(2) + (py - from.y).powi(2)).sqrt();
    }
    let t = (((px - from.x) * dx + (py - from.y) * dy) / length_sq).clamp(0.0, 1.0);
    let proj_x = from.x + t * dx;
    let proj_y = from.y + t * dy;
    ((px - proj_x).powi(2) + (py - proj_y).powi(2)).sqrt()
}

/// Source-over blend of a straight-alpha color scaled by `coverage`.
fn blend_pixel(pixel: &mut Rgba<u8>, color: [u8; 4], coverage: f32) {
    let src_alpha = color[3] as f32 / 255.0 * coverage;
    if src_alpha <= 0.0 {
        return;
    }
    let dst_alpha = pixel[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    for channel in 0..3 {
        let src = color[channel] as f32;
        let dst = pixel[channel] as f32;
        let value = (src * src_alpha + dst * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

pub fn is_fully_transparent(image: &RgbaImage) -> bool {
    image.pixels().all(|pixel| pixel[3] == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maskpaint_shared::Color;

    fn stroke(color: Color, width: u32, points: &[(f32, f32)]) -> Stroke {
        Stroke {
            color,
            width,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    #[test]
    fn empty_stroke_list_is_transparent() {
        let raster = rasterize(&[], Dimensions::new(20, 10));
        assert_eq!(raster.dimensions(), (20, 10));
        assert!(is_fully_transparent(&raster));
    }

    #[test]
    fn segment_covers_its_centerline_only() {
        let raster = rasterize(
            &[stroke(Color::RED, 4, &[(2.0, 10.0), (18.0, 10.0)])],
            Dimensions::new(20, 20),
        );
        assert_eq!(raster.get_pixel(10, 9).0, [255, 0, 0, 255]);
        assert_eq!(raster.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(raster.get_pixel(10, 2)[3], 0);
        assert_eq!(raster.get_pixel(10, 17)[3], 0);
    }

    #[test]
    fn single_point_draws_a_disc() {
        let raster = rasterize(
            &[stroke(Color::BLUE, 10, &[(15.0, 15.0)])],
            Dimensions::new(30, 30),
        );
        assert_eq!(raster.get_pixel(15, 15).0, [0, 0, 255, 255]);
        assert_eq!(raster.get_pixel(17, 13).0, [0, 0, 255, 255]);
        assert_eq!(raster.get_pixel(25, 25)[3], 0);
    }

    #[test]
    fn strokes_outside_the_surface_are_clipped() {
        let raster = rasterize(
            &[stroke(Color::BLACK, 6, &[(-50.0, -50.0), (-20.0, -40.0)])],
            Dimensions::new(10, 10),
        );
        assert!(is_fully_transparent(&raster));
        let partial = rasterize(
            &[stroke(Color::BLACK, 6, &[(-5.0, 5.0), (5.0, 5.0)])],
            Dimensions::new(10, 10),
        );
        assert_eq!(partial.get_pixel(0, 5)[3], 255);
    }

    #[test]
    fn self_overlap_does_not_accumulate_alpha() {
        let translucent = Color {
            r: 0,
            g: 0,
            b: 0,
            a: 128,
        };
        let raster = rasterize(
            &[stroke(translucent, 6, &[(2.0, 10.0), (18.0, 10.0), (2.0, 10.0)])],
            Dimensions::new(20, 20),
        );
        assert_eq!(raster.get_pixel(10, 10)[3], 128);
    }

    #[test]
    fn later_strokes_paint_over_earlier_ones() {
        let raster = rasterize(
            &[
                stroke(Color::RED, 6, &[(0.0, 5.0), (10.0, 5.0)]),
                stroke(Color::GREEN, 6, &[(5.0, 0.0), (5.0, 10.0)]),
            ],
            Dimensions::new(10, 10),
        );
        assert_eq!(raster.get_pixel(5, 5).0, [0, 255, 0, 255]);
        assert_eq!(raster.get_pixel(1, 5).0, [255, 0, 0, 255]);
    }

    #[test]
    fn distance_to_degenerate_segment_is_point_distance() {
        let point = Point::new(0.0, 0.0);
        assert_eq!(distance_to_segment(3.0, 4.0, point, point), 5.0);
    }
}
