//! Integer points, rectangles and paths.

/// A two-dimensional point with integer coordinates.
///
/// The documentation and method naming assume that larger `y` values are
/// further down, and the sweep works from the bottom (largest `y`) up.
///
/// Points also carry a `z` value that is never used for geometry: it is
/// ignored by equality and hashing, copied from input vertices to output
/// vertices, and set by the [z-fill callback](crate::Clipper::set_z_fill) at
/// intersections.
#[derive(Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct IntPoint {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
    /// User data riding along with the point.
    #[serde(default)]
    pub z: i64,
}

impl PartialEq for IntPoint {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for IntPoint {}

impl std::hash::Hash for IntPoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
    }
}

impl std::fmt::Debug for IntPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.z == 0 {
            write!(f, "({}, {})", self.x, self.y)
        } else {
            write!(f, "({}, {}; {})", self.x, self.y, self.z)
        }
    }
}

impl IntPoint {
    /// Create a new point with `z = 0`.
    pub const fn new(x: i64, y: i64) -> Self {
        IntPoint { x, y, z: 0 }
    }

    /// Create a new point carrying user data in `z`.
    pub const fn with_z(x: i64, y: i64, z: i64) -> Self {
        IntPoint { x, y, z }
    }

    /// Convert to a `kurbo` point, for rendering or measuring.
    ///
    /// Coordinates beyond 2^53 lose precision.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x as f64, self.y as f64)
    }
}

impl From<(i64, i64)> for IntPoint {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// A sequence of vertices. Closed paths have an implicit closing edge.
pub type Path = Vec<IntPoint>;

/// A collection of paths.
pub type Paths = Vec<Path>;

/// An axis-aligned rectangle, inclusive of its boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IntRect {
    /// The smallest `x` coordinate.
    pub left: i64,
    /// The smallest `y` coordinate.
    pub top: i64,
    /// The largest `x` coordinate.
    pub right: i64,
    /// The largest `y` coordinate.
    pub bottom: i64,
}

impl IntRect {
    /// The smallest rectangle containing all the points, or `None` if there are none.
    pub fn bounding(points: impl IntoIterator<Item = IntPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut ret = IntRect {
            left: first.x,
            top: first.y,
            right: first.x,
            bottom: first.y,
        };
        for p in points {
            ret.left = ret.left.min(p.x);
            ret.right = ret.right.max(p.x);
            ret.top = ret.top.min(p.y);
            ret.bottom = ret.bottom.max(p.y);
        }
        Some(ret)
    }

    /// Whether `p` is inside or on the boundary of this rectangle.
    pub fn contains(&self, p: IntPoint) -> bool {
        self.left <= p.x && p.x <= self.right && self.top <= p.y && p.y <= self.bottom
    }

    /// Convert to a `kurbo` rectangle.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            self.left as f64,
            self.top as f64,
            self.right as f64,
            self.bottom as f64,
        )
    }
}

/// Convert paths to a single `kurbo::BezPath`, optionally closing each one.
pub fn paths_to_bez_path<'a>(
    paths: impl IntoIterator<Item = &'a Path>,
    closed: bool,
) -> kurbo::BezPath {
    let mut ret = kurbo::BezPath::new();
    for path in paths {
        let mut points = path.iter();
        let Some(first) = points.next() else {
            continue;
        };
        ret.move_to(first.to_kurbo());
        for p in points {
            ret.line_to(p.to_kurbo());
        }
        if closed {
            ret.close_path();
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    #[test]
    fn z_is_not_geometry() {
        assert_eq!(IntPoint::with_z(1, 2, 7), IntPoint::new(1, 2));
        let mut set = std::collections::HashSet::new();
        set.insert(IntPoint::with_z(1, 2, 7));
        assert!(set.contains(&IntPoint::new(1, 2)));
        assert_eq!(format!("{:?}", IntPoint::with_z(1, 2, 7)), "(1, 2; 7)");
        assert_eq!(format!("{:?}", IntPoint::new(-1, 2)), "(-1, 2)");
    }

    #[test]
    fn bounding_rect() {
        assert_eq!(IntRect::bounding([]), None);
        let r = IntRect::bounding([(3, -1).into(), (0, 5).into(), (2, 2).into()]).unwrap();
        assert_eq!(
            r,
            IntRect {
                left: 0,
                top: -1,
                right: 3,
                bottom: 5
            }
        );
        assert!(r.contains(IntPoint::new(3, 5)));
        assert!(!r.contains(IntPoint::new(4, 5)));
    }

    #[test]
    fn bez_path_area() {
        let square: Path = vec![(0, 0).into(), (10, 0).into(), (10, 10).into(), (0, 10).into()];
        let bez = paths_to_bez_path([&square], true);
        assert_eq!(bez.area().abs(), 100.0);
        assert_eq!(bez.bounding_box(), kurbo::Rect::new(0.0, 0.0, 10.0, 10.0));
    }
}
