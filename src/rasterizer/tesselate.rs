//! Polygon to triangle reduction
//!
//! Clipped polygons are cut into triangles by repeatedly removing an ear
//! from a doubly linked ring of vertex indices. At each step three local
//! cuts are scored and the one whose new diagonal spans the least
//! horizontal distance wins, which keeps long thin spans away from the
//! scanline filler. When no cut at the current vertex is a valid ear the
//! walk moves on to the next vertex.

use super::math::Vec3;

/// Largest polygon handled by the ring; bigger ones fall back to a fan
pub const MAX_TESS_VERTICES: usize = 32;

/// Fixed-size doubly linked index ring
struct Ring {
    next: [usize; MAX_TESS_VERTICES],
    prev: [usize; MAX_TESS_VERTICES],
}

impl Ring {
    fn new(n: usize) -> Self {
        let mut ring = Self {
            next: [0; MAX_TESS_VERTICES],
            prev: [0; MAX_TESS_VERTICES],
        };
        for i in 0..n {
            ring.next[i] = (i + 1) % n;
            ring.prev[i] = (i + n - 1) % n;
        }
        ring
    }

    fn unlink(&mut self, i: usize) {
        let (p, n) = (self.prev[i], self.next[i]);
        self.next[p] = n;
        self.prev[n] = p;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cut {
    /// cur, next, next-next; drops next
    Forward,
    /// prev-prev, prev, cur; drops prev
    Backward,
    /// prev, cur, next; drops cur
    Middle,
}

/// Triangulate a polygon given by its vertex positions.
///
/// Triangles are index triples into `positions`, in the polygon's own
/// winding. A polygon of `n >= 3` vertices yields `n - 2` triangles.
pub fn tesselate(positions: &[Vec3], out: &mut Vec<[usize; 3]>) {
    out.clear();
    let n = positions.len();
    if n < 3 {
        return;
    }
    if n > MAX_TESS_VERTICES {
        fan(n, out);
        return;
    }

    let winding = signed_area(positions).signum();
    let mut ring = Ring::new(n);
    let mut cur = 0;
    let mut remaining = n;

    // Vertices tried since the last emitted ear
    let mut attempts = 0;
    while remaining > 3 {
        let n1 = ring.next[cur];
        let n2 = ring.next[n1];
        let m1 = ring.prev[cur];
        let m2 = ring.prev[m1];

        let candidates = [
            (Cut::Forward, [cur, n1, n2], (cur, n2)),
            (Cut::Backward, [m2, m1, cur], (m2, cur)),
            (Cut::Middle, [m1, cur, n1], (m1, n1)),
        ];

        let mut best = None;
        let mut best_cost = f32::INFINITY;
        for (cut, tri, (a, b)) in candidates {
            if winding != 0.0 && orientation(positions, tri) * winding <= 0.0 {
                continue; // reflex or flat ear
            }
            if !ear_is_empty(positions, &ring, cur, remaining, tri, winding) {
                continue;
            }
            let cost = diagonal_cost(positions[a], positions[b]);
            if cost < best_cost {
                best_cost = cost;
                best = Some((cut, tri));
            }
        }

        let (cut, tri) = match best {
            Some(ear) => ear,
            None if attempts < remaining => {
                cur = n1;
                attempts += 1;
                continue;
            }
            // Nothing clips cleanly anywhere (self-intersecting input)
            None => (Cut::Forward, [cur, n1, n2]),
        };

        out.push(tri);
        match cut {
            Cut::Forward => ring.unlink(n1),
            Cut::Backward => ring.unlink(m1),
            Cut::Middle => {
                ring.unlink(cur);
                cur = n1;
            }
        }
        remaining -= 1;
        attempts = 0;
    }

    let n1 = ring.next[cur];
    out.push([cur, n1, ring.next[n1]]);
}

/// No other remaining vertex lies strictly inside `tri`
fn ear_is_empty(
    positions: &[Vec3],
    ring: &Ring,
    start: usize,
    remaining: usize,
    tri: [usize; 3],
    winding: f32,
) -> bool {
    let [a, b, c] = tri;
    let mut v = start;
    for _ in 0..remaining {
        if !tri.contains(&v)
            && orientation(positions, [a, b, v]) * winding > 0.0
            && orientation(positions, [b, c, v]) * winding > 0.0
            && orientation(positions, [c, a, v]) * winding > 0.0
        {
            return false;
        }
        v = ring.next[v];
    }
    true
}

/// Naive fan from vertex 0
fn fan(n: usize, out: &mut Vec<[usize; 3]>) {
    out.extend((1..n - 1).map(|i| [0, i, i + 1]));
}

/// Extra weight on the horizontal extent of a diagonal
const HORIZONTAL_WEIGHT: f32 = 4.0;

/// Squared diagonal length with the x extent stretched, so diagonals that
/// run across scanlines lose to ones that run along the y axis
fn diagonal_cost(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    HORIZONTAL_WEIGHT * dx * dx + dy * dy
}

fn orientation(positions: &[Vec3], [a, b, c]: [usize; 3]) -> f32 {
    let ab = positions[b] - positions[a];
    let ac = positions[c] - positions[a];
    ab.x * ac.y - ab.y * ac.x
}

/// Twice the signed XY area (shoelace)
pub fn signed_area(positions: &[Vec3]) -> f32 {
    let n = positions.len();
    (0..n)
        .map(|i| {
            let a = positions[i];
            let b = positions[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}
