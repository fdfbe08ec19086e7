//! Utilities for fuzz and/or property testing using `arbitrary`.
//!
//! Random coordinates almost never produce the coincidences that make
//! clipping hard (shared vertices, collinear edges, horizontals), so the
//! generators here snap to a coarse grid and like to reuse earlier values.

// `#[derive(arbitrary::Arbitrary)]` at the crate root emits paths like
// `arbitrary::Result`, which resolve to this module rather than the
// external crate; re-export what the derive needs.
#[doc(hidden)]
pub use ::arbitrary::{details, size_hint, Arbitrary, MaxRecursionReached, Result, Unstructured};

use crate::{IntPoint, Path, Paths};

/// Generate an arbitrary coordinate in `start..=end`.
pub fn coord_in_range(
    start: i64,
    end: i64,
    u: &mut Unstructured<'_>,
) -> Result<i64, arbitrary::Error> {
    u.int_in_range(start..=end)
}

fn coord(u: &mut Unstructured<'_>) -> Result<i64, arbitrary::Error> {
    let coarse: bool = u.arbitrary()?;
    if coarse {
        Ok(coord_in_range(-8, 8, u)? * 16)
    } else {
        coord_in_range(-1000, 1000, u)
    }
}

/// Generate a coordinate with a good chance of being equal to `orig`.
fn another_coord(orig: i64, u: &mut Unstructured<'_>) -> Result<i64, arbitrary::Error> {
    let same: bool = u.arbitrary()?;
    if same {
        Ok(orig)
    } else {
        coord(u)
    }
}

/// Generate an arbitrary point.
pub fn point(u: &mut Unstructured<'_>) -> Result<IntPoint, arbitrary::Error> {
    Ok(IntPoint::new(coord(u)?, coord(u)?))
}

/// Generate a point that has a chance of sharing coordinates with `prev`,
/// making horizontal and vertical edges (and duplicate vertices) common.
pub fn another_point(prev: IntPoint, u: &mut Unstructured<'_>) -> Result<IntPoint, arbitrary::Error> {
    Ok(IntPoint::new(
        another_coord(prev.x, u)?,
        another_coord(prev.y, u)?,
    ))
}

/// Generate a path with up to `max_len` vertices.
pub fn path(max_len: usize, u: &mut Unstructured<'_>) -> Result<Path, arbitrary::Error> {
    let len = u.int_in_range(0..=max_len)?;
    let mut ret = Vec::with_capacity(len);
    let mut prev = point(u)?;
    for _ in 0..len {
        ret.push(prev);
        prev = another_point(prev, u)?;
    }
    Ok(ret)
}

/// Generate up to `max_paths` paths, each with up to `max_len` vertices.
pub fn paths(
    max_paths: usize,
    max_len: usize,
    u: &mut Unstructured<'_>,
) -> Result<Paths, arbitrary::Error> {
    let count = u.int_in_range(0..=max_paths)?;
    (0..count).map(|_| path(max_len, u)).collect()
}
