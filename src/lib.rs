//! Exact boolean operations on integer polygons.
//!
//! This crate computes intersections, unions, differences and exclusive-ors
//! of sets of polygons with integer coordinates, using Vatti's scanbeam
//! algorithm. All the decisions the algorithm makes (which edge is to the left
//! of which, whether three points are collinear, which ring contains which)
//! are made in exact 128-bit arithmetic, so the output is always consistent
//! with itself. The only inexact step is computing where two edges cross, and
//! those points are rounded to the nearest integer.
//!
//! The main entry point is [`Clipper`]:
//!
//! ```
//! use scanclip::{ClipType, Clipper, FillRule, IntPoint, PolyType};
//!
//! let triangle = [IntPoint::new(0, 0), IntPoint::new(100, 0), IntPoint::new(0, 100)];
//! let square = [
//!     IntPoint::new(0, 0),
//!     IntPoint::new(25, 0),
//!     IntPoint::new(25, 25),
//!     IntPoint::new(0, 25),
//! ];
//!
//! let mut clipper = Clipper::new();
//! clipper.add_path(&triangle, PolyType::Subject, true)?;
//! clipper.add_path(&square, PolyType::Clip, true)?;
//! let difference = clipper.execute(ClipType::Difference, FillRule::NonZero, FillRule::NonZero)?;
//! assert_eq!(difference.len(), 1);
//! # Ok::<(), scanclip::Error>(())
//! ```
//!
//! Closed paths are polygons, and each one contributes to the winding number
//! of the points it surrounds; the [`FillRule`] decides which winding numbers
//! count as inside. Open paths (polylines) can also be clipped, but only as
//! subjects, and only with [`Clipper::execute_tree`], which returns a
//! [`PolyTree`] recording which output contours are holes in which others.
//!
//! Coordinates must be at most [`HI_RANGE`] in magnitude.

#![deny(missing_docs)]

#[macro_use]
mod handle;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
mod clipper;
mod geom;
mod num;
pub mod pool;
mod tree;

#[cfg(any(test, feature = "generators"))]
pub mod generators;

pub use clipper::{ClipOptions, Clipper, ZFill};
pub use geom::{paths_to_bez_path, IntPoint, IntRect, Path, Paths};
pub use num::HI_RANGE;
pub use tree::{NodeIdx, PolyNode, PolyTree};

/// The boolean operation to compute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(any(test, feature = "arbitrary"), derive(::arbitrary::Arbitrary))]
pub enum ClipType {
    /// Regions inside both the subject and the clip.
    #[default]
    Intersection,
    /// Regions inside the subject or the clip.
    Union,
    /// Regions inside the subject but not the clip.
    Difference,
    /// Regions inside exactly one of the subject and the clip.
    Xor,
}

/// Which side of the operation a path belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(any(test, feature = "arbitrary"), derive(::arbitrary::Arbitrary))]
pub enum PolyType {
    /// The paths being clipped. Open paths can only be subjects.
    #[default]
    Subject,
    /// The paths doing the clipping.
    Clip,
}

/// How winding numbers decide what is inside a set of paths.
///
/// Every path contributes `+1` or `-1` to the winding number of the points
/// it surrounds, depending on its orientation. Paths with positive signed
/// area (see [`Clipper::execute`]) contribute `+1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(any(test, feature = "arbitrary"), derive(::arbitrary::Arbitrary))]
pub enum FillRule {
    /// Points with an odd winding number are inside.
    #[default]
    EvenOdd,
    /// Points with a non-zero winding number are inside.
    NonZero,
    /// Points with a positive winding number are inside.
    Positive,
    /// Points with a negative winding number are inside.
    Negative,
}

/// The ways in which adding paths or clipping can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A coordinate's magnitude was larger than [`HI_RANGE`].
    CoordinateOutOfRange(IntPoint),
    /// An open path was added as a clip path. Open paths can only be subjects.
    OpenClipPath,
    /// Open paths were added, but flat output was requested. Open paths can
    /// only be returned in a [`PolyTree`].
    OpenPathsNeedPolyTree,
    /// The crossings in one scanbeam could not be processed in an order that
    /// only ever swaps adjacent edges.
    IntersectionOrder,
    /// The sweep ended up in an inconsistent state.
    Sweep(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CoordinateOutOfRange(p) => {
                write!(f, "coordinate out of range: ({}, {})", p.x, p.y)
            }
            Error::OpenClipPath => write!(f, "open paths must be subjects"),
            Error::OpenPathsNeedPolyTree => {
                write!(f, "open paths can only be returned in a polygon tree")
            }
            Error::IntersectionOrder => write!(f, "failed to order intersections"),
            Error::Sweep(msg) => write!(f, "inconsistent sweep: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Computes a boolean operation on two sets of closed paths, using the same
/// fill rule for both.
///
/// ```
/// use scanclip::{clip_paths, ClipType, FillRule, IntPoint};
///
/// let square = |x: i64, y: i64| {
///     vec![
///         IntPoint::new(x, y),
///         IntPoint::new(x + 10, y),
///         IntPoint::new(x + 10, y + 10),
///         IntPoint::new(x, y + 10),
///     ]
/// };
/// let out = clip_paths(&[square(0, 0)], &[square(5, 5)], ClipType::Intersection, FillRule::NonZero)?;
/// assert_eq!(out.len(), 1);
/// assert_eq!(out[0].len(), 4);
/// # Ok::<(), scanclip::Error>(())
/// ```
pub fn clip_paths(
    subject: &[Path],
    clip: &[Path],
    clip_type: ClipType,
    fill: FillRule,
) -> Result<Paths, Error> {
    let mut clipper = Clipper::new();
    clipper.add_paths(subject, PolyType::Subject, true)?;
    clipper.add_paths(clip, PolyType::Clip, true)?;
    clipper.execute(clip_type, fill, fill)
}

/// Like [`clip_paths`], but the subject paths may be open and the result is a
/// [`PolyTree`].
pub fn clip_tree(
    subject: &[Path],
    subject_closed: bool,
    clip: &[Path],
    clip_type: ClipType,
    fill: FillRule,
) -> Result<PolyTree, Error> {
    let mut clipper = Clipper::new();
    clipper.add_paths(subject, PolyType::Subject, subject_closed)?;
    clipper.add_paths(clip, PolyType::Clip, true)?;
    clipper.execute_tree(clip_type, fill, fill)
}

/// Removes self-intersections from a set of closed paths.
///
/// The result covers the same region as `paths` under `fill`, and no ring in
/// it touches itself or another ring except at isolated vertices.
pub fn simplify_polygons(paths: &[Path], fill: FillRule) -> Result<Paths, Error> {
    let mut clipper = Clipper::with_options(ClipOptions {
        strictly_simple: true,
        ..ClipOptions::default()
    });
    clipper.add_paths(paths, PolyType::Subject, true)?;
    clipper.execute(ClipType::Union, fill, fill)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;
    use crate::num::{self, area2};

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Path {
        vec![
            IntPoint::new(x0, y0),
            IntPoint::new(x1, y0),
            IntPoint::new(x1, y1),
            IntPoint::new(x0, y1),
        ]
    }

    fn reversed(mut path: Path) -> Path {
        path.reverse();
        path
    }

    /// The total signed area of a solution: outer rings count positively and
    /// holes negatively.
    fn total_area2(paths: &[Path]) -> i128 {
        paths.iter().map(|p| area2(p)).sum()
    }

    #[test]
    fn overlapping_squares() {
        let a = [rect(0, 0, 1000, 1000)];
        let b = [rect(500, 500, 1500, 1500)];

        let inter = clip_paths(&a, &b, ClipType::Intersection, FillRule::EvenOdd).unwrap();
        assert_eq!(inter.len(), 1);
        assert_eq!(inter[0].len(), 4);
        assert_eq!(
            IntRect::bounding(inter[0].iter().copied()),
            Some(IntRect {
                left: 500,
                top: 500,
                right: 1000,
                bottom: 1000
            })
        );
        assert_eq!(area2(&inter[0]), 2 * 250_000);

        let union = clip_paths(&a, &b, ClipType::Union, FillRule::EvenOdd).unwrap();
        assert_eq!(union.len(), 1);
        assert_eq!(union[0].len(), 8);
        assert_eq!(area2(&union[0]), 2 * 1_750_000);
    }

    #[test]
    fn square_with_hole_and_a_neighbour() {
        let subject = [
            rect(0, 0, 100, 100),
            reversed(rect(25, 25, 75, 75)),
            rect(200, 0, 300, 100),
        ];
        let tree = clip_tree(&subject, true, &[], ClipType::Union, FillRule::NonZero).unwrap();

        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.total(), 3);
        let holder = tree
            .children()
            .iter()
            .copied()
            .find(|&n| tree[n].child_count() > 0)
            .unwrap();
        let hole = tree[holder].children()[0];
        assert_eq!(tree[holder].child_count(), 1);
        assert!(tree.is_hole(hole));
        assert!(!tree.is_hole(holder));
        assert_eq!(area2(tree.contour(hole)), -2 * 2500);
        for &n in tree.children() {
            assert!(area2(tree.contour(n)) > 0);
        }
    }

    #[test]
    fn open_path_minus_polygon() {
        let line = vec![IntPoint::new(-50, 50), IntPoint::new(150, 50)];
        let tree = clip_tree(
            &[line],
            false,
            &[rect(0, 0, 100, 100)],
            ClipType::Difference,
            FillRule::NonZero,
        )
        .unwrap();

        assert_eq!(tree.closed_paths().len(), 0);
        let mut pieces = tree.open_paths();
        assert_eq!(pieces.len(), 2);
        for &n in tree.children() {
            assert!(tree[n].is_open());
            assert!(!tree.is_hole(n));
        }

        for p in &mut pieces {
            p.sort_by_key(|p| p.x);
        }
        pieces.sort_by_key(|p| p[0].x);
        assert_eq!(
            pieces,
            vec![
                vec![IntPoint::new(-50, 50), IntPoint::new(0, 50)],
                vec![IntPoint::new(100, 50), IntPoint::new(150, 50)],
            ]
        );
    }

    /// A single path that crosses itself at (60, 20) and goes around the
    /// square (20, 20)-(60, 60) twice.
    fn loop_twice() -> Path {
        [(0, 0), (60, 0), (60, 60), (20, 60), (20, 20), (80, 20), (80, 80), (0, 80)]
            .into_iter()
            .map(IntPoint::from)
            .collect()
    }

    /// Whether `pt` is inside an odd number of rings.
    fn covered(paths: &[Path], pt: IntPoint) -> bool {
        paths
            .iter()
            .filter(|p| num::point_in_ring(pt, p.iter().copied()) == num::Containment::Inside)
            .count()
            % 2
            == 1
    }

    #[test]
    fn self_overlapping_path() {
        let subject = [loop_twice()];
        let doubled = IntPoint::new(40, 40);
        let single = IntPoint::new(10, 10);

        let non_zero = clip_paths(&subject, &[], ClipType::Union, FillRule::NonZero).unwrap();
        assert_eq!(non_zero.len(), 1);
        assert_eq!(non_zero[0].len(), 6);
        assert_eq!(total_area2(&non_zero), 2 * 6000);
        assert!(covered(&non_zero, doubled));
        assert!(covered(&non_zero, single));

        let even_odd = clip_paths(&subject, &[], ClipType::Union, FillRule::EvenOdd).unwrap();
        assert_eq!(total_area2(&even_odd), 2 * 4400);
        assert!(!covered(&even_odd, doubled));
        assert!(covered(&even_odd, single));

        // Split at the crossing, the even-odd solution is the notched square
        // and the doubly covered square as its hole.
        let simple = simplify_polygons(&subject, FillRule::EvenOdd).unwrap();
        assert_eq!(simple.len(), 2);
        let mut areas: Vec<_> = simple.iter().map(|p| area2(p)).collect();
        areas.sort();
        assert_eq!(areas, [-2 * 1600, 2 * 6000]);
    }

    #[test]
    fn spiral_near_coordinate_limit() {
        // A strip winding four times around (18, 18).
        const SPIRAL: [(i64, i64); 34] = [
            (0, 1), (35, 1), (35, 35), (5, 35), (5, 5), (31, 5), (31, 31), (9, 31),
            (9, 9), (27, 9), (27, 27), (13, 27), (13, 13), (23, 13), (23, 23), (17, 23),
            (17, 16), (15, 16), (15, 25), (25, 25), (25, 11), (11, 11), (11, 29), (29, 29),
            (29, 7), (7, 7), (7, 33), (33, 33), (33, 3), (3, 3), (3, 37), (37, 37),
            (37, -1), (0, -1),
        ];
        let k = HI_RANGE / 19;
        let ring: Path = SPIRAL
            .iter()
            .map(|&(x, y)| IntPoint::new((x - 18) * k, (y - 18) * k))
            .collect();
        assert!(ring.iter().all(num::in_range));

        let out = clip_paths(&[ring], &[], ClipType::Union, FillRule::NonZero).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), SPIRAL.len());
        assert_eq!(area2(&out[0]), 1408 * i128::from(k) * i128::from(k));
    }

    #[test]
    fn signed_fill_rules() {
        let subject = [rect(0, 0, 10, 10)];
        assert!(area2(&subject[0]) > 0);
        let positive = clip_paths(&subject, &[], ClipType::Union, FillRule::Positive).unwrap();
        assert_eq!(positive.len(), 1);
        let negative = clip_paths(&subject, &[], ClipType::Union, FillRule::Negative).unwrap();
        assert!(negative.is_empty());

        let flipped = [reversed(rect(0, 0, 10, 10))];
        let negative = clip_paths(&flipped, &[], ClipType::Union, FillRule::Negative).unwrap();
        assert_eq!(negative.len(), 1);
    }

    #[test]
    fn reversed_solution() {
        let mut clipper = Clipper::with_options(ClipOptions {
            reverse_solution: true,
            ..ClipOptions::default()
        });
        clipper
            .add_path(&rect(0, 0, 10, 10), PolyType::Subject, true)
            .unwrap();
        let out = clipper
            .execute(ClipType::Union, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(area2(&out[0]), -200);
    }

    #[test]
    fn errors() {
        let mut clipper = Clipper::new();
        let far = IntPoint::new(HI_RANGE + 1, 0);
        assert_matches!(
            clipper.add_path(
                &[IntPoint::new(0, 0), far, IntPoint::new(0, 10)],
                PolyType::Subject,
                true
            ),
            Err(Error::CoordinateOutOfRange(p)) if p == far
        );
        assert_matches!(
            clipper.add_path(&rect(0, 0, 1, 1), PolyType::Clip, false),
            Err(Error::OpenClipPath)
        );
        assert_matches!(
            clipper.add_path(&rect(0, 0, 1, 1), PolyType::Subject, false),
            Ok(true)
        );
        assert_matches!(
            clipper.execute(ClipType::Union, FillRule::EvenOdd, FillRule::EvenOdd),
            Err(Error::OpenPathsNeedPolyTree)
        );
    }

    #[test]
    fn degenerate_input_is_ignored() {
        let mut clipper = Clipper::new();
        let line = [IntPoint::new(0, 0), IntPoint::new(10, 10)];
        let flat = [IntPoint::new(0, 0), IntPoint::new(5, 5), IntPoint::new(10, 10)];
        assert_matches!(clipper.add_path(&line, PolyType::Subject, true), Ok(false));
        assert_matches!(clipper.add_path(&flat, PolyType::Subject, true), Ok(false));
        assert_eq!(clipper.bounds(), None);
        let out = clipper
            .execute(ClipType::Union, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn repeated_execution_stops_allocating() {
        let (outer, inner) = crate::generators::checkerboard(4);
        let mut clipper = Clipper::new();
        clipper.add_paths(&outer, PolyType::Subject, true).unwrap();
        clipper.add_paths(&inner, PolyType::Clip, true).unwrap();
        let created = clipper.edges_created();

        let first = clipper
            .execute(ClipType::Xor, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        let mut tree = PolyTree::new();
        for _ in 0..3 {
            let again = clipper
                .execute(ClipType::Xor, FillRule::NonZero, FillRule::NonZero)
                .unwrap();
            assert_eq!(total_area2(&again), total_area2(&first));
            clipper
                .execute_into(ClipType::Xor, FillRule::NonZero, FillRule::NonZero, &mut tree)
                .unwrap();
            assert_eq!(total_area2(&tree.closed_paths()), total_area2(&first));
        }
        assert_eq!(clipper.edges_created(), created);

        clipper.clear();
        clipper
            .add_path(&rect(0, 0, 1, 1), PolyType::Subject, true)
            .unwrap();
        assert_eq!(clipper.edges_created(), created);
    }

    #[test]
    fn simplify_splits_a_figure_eight() {
        let bowtie = vec![
            IntPoint::new(0, 0),
            IntPoint::new(10, 10),
            IntPoint::new(10, 0),
            IntPoint::new(0, 10),
        ];
        let out = simplify_polygons(&[bowtie], FillRule::EvenOdd).unwrap();
        assert_eq!(out.len(), 2);
        for ring in &out {
            assert_eq!(ring.len(), 3);
            assert_eq!(area2(ring), 50);
        }
    }

    #[test]
    fn random_inputs_dont_panic() {
        arbtest::arbtest(|u| {
            let subject = crate::arbitrary::paths(4, 8, u)?;
            let clip = crate::arbitrary::paths(4, 8, u)?;
            let clip_type: ClipType = u.arbitrary()?;
            let fill: FillRule = u.arbitrary()?;

            match clip_tree(&subject, true, &clip, clip_type, fill) {
                Ok(tree) => {
                    for n in tree.iter() {
                        assert!(tree.contour(n).len() >= 3);
                        assert_eq!(tree.is_hole(n), tree.depth(n) % 2 == 1);
                    }
                }
                Err(e) => assert_matches!(e, Error::IntersectionOrder),
            }
            Ok(())
        })
        .budget_ms(500);
    }

    fn rects() -> impl Strategy<Value = Vec<Path>> {
        prop::collection::vec(
            (0i64..50, 0i64..50, 1i64..30, 1i64..30)
                .prop_map(|(x, y, w, h)| rect(x, y, x + w, y + h)),
            1..5,
        )
    }

    fn area_of(a: &[Path], b: &[Path], clip_type: ClipType) -> i128 {
        total_area2(&clip_paths(a, b, clip_type, FillRule::NonZero).unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn rectangle_area_identities(a in rects(), b in rects()) {
            let area_a = area_of(&a, &[], ClipType::Union);
            let area_b = area_of(&b, &[], ClipType::Union);
            let inter = area_of(&a, &b, ClipType::Intersection);
            let union = area_of(&a, &b, ClipType::Union);
            let xor = area_of(&a, &b, ClipType::Xor);
            let diff = area_of(&a, &b, ClipType::Difference);

            prop_assert!(inter <= area_a.min(area_b));
            prop_assert!(union >= area_a.max(area_b));
            prop_assert_eq!(xor, union - inter);
            prop_assert_eq!(diff, area_a - inter);
            prop_assert_eq!(inter, area_of(&b, &a, ClipType::Intersection));
            prop_assert_eq!(union, area_of(&b, &a, ClipType::Union));
            prop_assert_eq!(xor, area_of(&b, &a, ClipType::Xor));
            prop_assert_eq!(area_of(&a, &a, ClipType::Union), area_a);
            prop_assert_eq!(area_of(&a, &a, ClipType::Intersection), area_a);
        }
    }
}
