//! Exact arithmetic on integer coordinates.
//!
//! Every predicate the sweep makes a decision on (slope comparisons, turn
//! directions, areas) is computed here in 128-bit integers, so it is exact
//! for all coordinates up to [`HI_RANGE`] in magnitude. Floating point only
//! appears when computing the position of a new vertex, and those results are
//! rounded back onto the integer grid.

use crate::geom::IntPoint;

/// The largest coordinate magnitude accepted by the clipper.
///
/// Differences of two such coordinates fit in an `i64`, and products of two
/// differences fit in an `i128` with room for a few additions.
pub const HI_RANGE: i64 = 0x3FFF_FFFF_FFFF_FFFF;

/// Multiplies two 64-bit integers without overflow.
#[inline]
pub fn mul_wide(a: i64, b: i64) -> i128 {
    i128::from(a) * i128::from(b)
}

/// Whether both coordinates of `p` are within [`HI_RANGE`].
pub fn in_range(p: &IntPoint) -> bool {
    p.x.unsigned_abs() <= HI_RANGE as u64 && p.y.unsigned_abs() <= HI_RANGE as u64
}

/// The cross product of `a - o` and `b - o`.
///
/// With `y` pointing down, this is positive when `o -> a -> b` turns clockwise
/// on screen.
pub fn cross(o: IntPoint, a: IntPoint, b: IntPoint) -> i128 {
    mul_wide(a.x - o.x, b.y - o.y) - mul_wide(a.y - o.y, b.x - o.x)
}

/// Whether the line through `p1` and `p2` is parallel to the one through `p3` and `p4`.
///
/// Degenerate (zero-length) lines are parallel to everything. All four
/// points must be within [`HI_RANGE`].
pub fn slopes_equal4(p1: IntPoint, p2: IntPoint, p3: IntPoint, p4: IntPoint) -> bool {
    mul_wide(p1.y - p2.y, p3.x - p4.x) == mul_wide(p1.x - p2.x, p3.y - p4.y)
}

/// Whether `p1`, `p2` and `p3` are collinear.
pub fn slopes_equal3(p1: IntPoint, p2: IntPoint, p3: IntPoint) -> bool {
    slopes_equal4(p1, p2, p2, p3)
}

/// Twice the signed area of a closed ring, given as consecutive vertices.
///
/// The sign follows the orientation convention used throughout the crate: a
/// ring that is counter-clockwise in a y-up coordinate system has positive area.
///
/// For vertices within [`HI_RANGE`] the result is exact. Partial sums can
/// leave the `i128` range when the ring winds around the origin several
/// times, so they wrap; the final sum always fits.
pub fn area2<'a>(ring: impl IntoIterator<Item = &'a IntPoint>) -> i128 {
    let mut ring = ring.into_iter();
    let Some(first) = ring.next() else {
        return 0;
    };
    let mut prev = first;
    let mut a = 0i128;
    for p in ring.chain(std::iter::once(first)) {
        let term = (i128::from(prev.x) + i128::from(p.x)) * (i128::from(prev.y) - i128::from(p.y));
        a = a.wrapping_add(term);
        prev = p;
    }
    a.wrapping_neg()
}

/// Rounds to the nearest integer, with ties going away from zero.
#[inline]
pub fn round(v: f64) -> i64 {
    if v < 0.0 {
        (v - 0.5) as i64
    } else {
        (v + 0.5) as i64
    }
}

/// Where a point is relative to a closed ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Containment {
    /// Strictly outside.
    Outside,
    /// Strictly inside.
    Inside,
    /// On one of the ring's edges or vertices.
    OnBoundary,
}

/// Tests a point against a closed ring, given as consecutive vertices.
///
/// This is the crossing-number test with an exact on-edge check, so it
/// agrees with even-odd filling of the ring.
pub fn point_in_ring(pt: IntPoint, ring: impl IntoIterator<Item = IntPoint>) -> Containment {
    let mut ring = ring.into_iter();
    let Some(first) = ring.next() else {
        return Containment::Outside;
    };
    let mut inside = false;
    let mut ip = first;
    for np in ring.chain(std::iter::once(first)) {
        if let Some(c) = crossing_step(pt, ip, np, &mut inside) {
            return c;
        }
        ip = np;
    }
    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// Processes the ring edge `ip -> np` for [`point_in_ring`], returning early on the boundary.
fn crossing_step(
    pt: IntPoint,
    ip: IntPoint,
    np: IntPoint,
    inside: &mut bool,
) -> Option<Containment> {
    if np.y == pt.y && (np.x == pt.x || (ip.y == pt.y && ((np.x > pt.x) == (ip.x < pt.x)))) {
        return Some(Containment::OnBoundary);
    }
    if (ip.y < pt.y) != (np.y < pt.y) {
        if ip.x >= pt.x {
            if np.x > pt.x {
                *inside = !*inside;
            } else {
                let d = cross(pt, ip, np);
                if d == 0 {
                    return Some(Containment::OnBoundary);
                } else if (d > 0) == (np.y > ip.y) {
                    *inside = !*inside;
                }
            }
        } else if np.x > pt.x {
            let d = cross(pt, ip, np);
            if d == 0 {
                return Some(Containment::OnBoundary);
            } else if (d > 0) == (np.y > ip.y) {
                *inside = !*inside;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn p(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    #[test]
    fn wide_extremes() {
        assert_eq!(mul_wide(i64::MIN, i64::MIN), 1i128 << 126);
        assert_eq!(mul_wide(i64::MAX, -1), -(i64::MAX as i128));
        let big = p(HI_RANGE, HI_RANGE);
        let neg = p(-HI_RANGE, -HI_RANGE);
        assert!(in_range(&big));
        assert!(in_range(&neg));
        assert!(!in_range(&p(HI_RANGE + 1, 0)));
        assert!(!in_range(&p(0, i64::MIN)));
        assert!(slopes_equal3(neg, p(0, 0), big));
        assert!(!slopes_equal3(neg, p(1, 0), big));
    }

    #[test]
    fn ring_area() {
        let square = [p(0, 0), p(0, 10), p(10, 10), p(10, 0)];
        assert_eq!(area2(&square), -200);
        let mut rev = square;
        rev.reverse();
        assert_eq!(area2(&rev), 200);
        assert_eq!(area2(std::iter::empty()), 0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round(2.5), 3);
        assert_eq!(round(-2.5), -3);
        assert_eq!(round(2.49), 2);
        assert_eq!(round(-0.2), 0);
    }

    #[test]
    fn containment() {
        let square = [p(0, 0), p(10, 0), p(10, 10), p(0, 10)];
        assert_eq!(point_in_ring(p(5, 5), square), Containment::Inside);
        assert_eq!(point_in_ring(p(15, 5), square), Containment::Outside);
        assert_eq!(point_in_ring(p(10, 5), square), Containment::OnBoundary);
        assert_eq!(point_in_ring(p(0, 0), square), Containment::OnBoundary);
        assert_eq!(point_in_ring(p(5, 0), square), Containment::OnBoundary);
        assert_eq!(point_in_ring(p(5, -1), square), Containment::Outside);
        let tri = [p(0, 0), p(10, 10), p(0, 10)];
        assert_eq!(point_in_ring(p(5, 5), tri), Containment::OnBoundary);
        assert_eq!(point_in_ring(p(2, 6), tri), Containment::Inside);
        assert_eq!(point_in_ring(p(6, 2), tri), Containment::Outside);
    }

    proptest! {
        #[test]
        fn mul_wide_matches_checked(a in any::<i64>(), b in any::<i64>()) {
            if let Some(prod) = a.checked_mul(b) {
                prop_assert_eq!(mul_wide(a, b), prod as i128);
            }
            prop_assert_eq!(mul_wide(a, b), mul_wide(b, a));
        }

        #[test]
        fn cross_is_antisymmetric(
            ox in -HI_RANGE..=HI_RANGE, oy in -HI_RANGE..=HI_RANGE,
            ax in -HI_RANGE..=HI_RANGE, ay in -HI_RANGE..=HI_RANGE,
            bx in -HI_RANGE..=HI_RANGE, by in -HI_RANGE..=HI_RANGE,
        ) {
            let (o, a, b) = (p(ox, oy), p(ax, ay), p(bx, by));
            prop_assert_eq!(cross(o, a, b), -cross(o, b, a));
            prop_assert_eq!(cross(o, a, b) == 0, slopes_equal3(a, o, b));
        }

        #[test]
        fn reversing_negates_area(pts in prop::collection::vec((-1000i64..1000, -1000i64..1000), 0..12)) {
            let ring: Vec<_> = pts.into_iter().map(IntPoint::from).collect();
            let mut rev = ring.clone();
            rev.reverse();
            prop_assert_eq!(area2(&ring), -area2(&rev));
        }
    }
}
