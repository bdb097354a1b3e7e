//! Perspective-correct scanline triangle filler
//!
//! Vertices are sorted top to bottom and the triangle is walked as two
//! spans (top to middle, middle to bottom). Along each edge, and then
//! across each row, `1/z` and every `attribute/z` are stepped linearly in
//! screen space; dividing by the stepped `1/z` at the pixel gives the
//! perspective-correct value.
//!
//! Coverage samples pixel centers with half-open ranges on both axes, so two
//! triangles sharing an edge never both claim a pixel. Edge values are always
//! evaluated from the edge's own top endpoint, which makes a shared edge
//! produce bit-identical x positions in both triangles.

use std::ops::{Add, Mul, Sub};
use super::point::{Point, Triangle};

/// Linear stepper: `begin + step * at`
#[derive(Debug, Clone, Copy)]
pub struct Slope<T> {
    begin: T,
    step: T,
}

impl<T> Slope<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    /// Stepper going from `from` to `to` over `steps` units
    pub fn new(from: T, to: T, steps: f32) -> Self {
        Self {
            begin: from,
            step: (to - from) * (1.0 / steps),
        }
    }

    #[inline]
    pub fn get(&self, at: f32) -> T {
        self.begin + self.step * at
    }
}

/// One triangle edge, top to bottom, carrying all interpolants
struct Edge {
    y_top: f32,
    x: Slope<f32>,
    inv_z: Slope<f32>,
    attrs: Slope<Point>,
}

impl Edge {
    fn new(top: &Point, bottom: &Point) -> Self {
        let dy = bottom.position.y - top.position.y;
        let (top_inv_z, bottom_inv_z) = (1.0 / top.position.z, 1.0 / bottom.position.z);
        Self {
            y_top: top.position.y,
            x: Slope::new(top.position.x, bottom.position.x, dy),
            inv_z: Slope::new(top_inv_z, bottom_inv_z, dy),
            attrs: Slope::new(*top * top_inv_z, *bottom * bottom_inv_z, dy),
        }
    }

    #[inline]
    fn at(&self, y: f32) -> (f32, f32, Point) {
        let t = y - self.y_top;
        (self.x.get(t), self.inv_z.get(t), self.attrs.get(t))
    }
}

/// First pixel index whose center is at or after `v`
#[inline]
fn first_center(v: f32) -> i64 {
    (v - 0.5).ceil() as i64
}

/// Rasterize one screen-space triangle.
///
/// Vertex positions are `(pixel x, pixel y, view depth)` with depth > 0.
/// `plot(x, y, depth, point)` is called once per covered pixel with the
/// perspective-corrected attributes; `point.position` holds the pixel center
/// and depth. Zero-height and zero-area triangles produce no pixels.
pub fn rasterize_triangle<F>(tri: &Triangle, width: usize, height: usize, mut plot: F)
where
    F: FnMut(usize, usize, f32, &Point),
{
    let mut v = tri.points;
    v.sort_by(|a, b| {
        a.position.y
            .total_cmp(&b.position.y)
            .then(a.position.x.total_cmp(&b.position.x))
    });
    let [v0, v1, v2] = v;

    if v0.position.y == v2.position.y {
        return;
    }

    // Which side of the long edge is the middle vertex on
    let long = v2.position - v0.position;
    let mid = v1.position - v0.position;
    let cross = mid.x * long.y - mid.y * long.x;
    if cross == 0.0 {
        return;
    }
    let long_on_left = cross > 0.0;

    let material = tri.points[0].material;
    let long_edge = Edge::new(&v0, &v2);

    let spans = [(v0, v1), (v1, v2)];
    for (top, bottom) in spans {
        if bottom.position.y <= top.position.y {
            continue;
        }
        let short_edge = Edge::new(&top, &bottom);
        let (left, right) = if long_on_left {
            (&long_edge, &short_edge)
        } else {
            (&short_edge, &long_edge)
        };

        let y_start = first_center(top.position.y).max(0);
        let y_end = first_center(bottom.position.y).min(height as i64);

        for y in y_start..y_end {
            let yc = y as f32 + 0.5;
            let (xl, inv_zl, attrs_l) = left.at(yc);
            let (xr, inv_zr, attrs_r) = right.at(yc);
            if xr <= xl {
                continue;
            }

            let row_width = xr - xl;
            let inv_z = Slope::new(inv_zl, inv_zr, row_width);
            let attrs = Slope::new(attrs_l, attrs_r, row_width);

            let x_start = first_center(xl).max(0);
            let x_end = first_center(xr).min(width as i64);

            for x in x_start..x_end {
                let t = x as f32 + 0.5 - xl;
                let z = 1.0 / inv_z.get(t);
                let mut p = attrs.get(t) * z;
                p.position.x = x as f32 + 0.5;
                p.position.y = yc;
                p.position.z = z;
                p.material = material;
                plot(x as usize, y as usize, z, &p);
            }
        }
    }
}
