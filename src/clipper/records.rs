//! The records the sweep allocates from its pools.

use crate::{geom::IntPoint, pool::Recycle, tree::NodeIdx, PolyType};

/// The `dx` of a horizontal edge.
pub(crate) const HORIZONTAL: f64 = -1.0e40;

impl_handle!(
    /// A handle to an [`Edge`].
    EdgeIdx,
    "e"
);

impl_handle!(
    /// A handle to an [`OutRec`].
    OutRecIdx,
    "r"
);

impl_handle!(
    /// A handle to an [`OutPt`].
    OutPtIdx,
    "p"
);

/// Which side of an output polygon an edge is currently building.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Side {
    #[default]
    Left,
    Right,
}

/// Which way a horizontal edge, or a run of output points, goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    LeftToRight,
    RightToLeft,
}

/// The output polygon an edge contributes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum OutSlot {
    /// Not currently contributing.
    #[default]
    Unassigned,
    /// The phantom closing edge of an open path, which never contributes.
    Skip,
    Rec(OutRecIdx),
}

impl OutSlot {
    pub(crate) fn rec(self) -> Option<OutRecIdx> {
        match self {
            OutSlot::Rec(r) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn is_assigned(self) -> bool {
        matches!(self, OutSlot::Rec(_))
    }
}

/// One edge of an input path.
///
/// `bot` is the end with the larger `y`; `curr` tracks where the edge meets
/// the current scanline.
#[derive(Clone, Debug, Default)]
pub(crate) struct Edge {
    pub bot: IntPoint,
    pub curr: IntPoint,
    pub top: IntPoint,
    /// Horizontal change per unit of `y`, or [`HORIZONTAL`].
    pub dx: f64,
    pub poly_type: PolyType,
    pub side: Side,
    /// +1 or -1 for closed paths depending on direction, 0 for open paths.
    pub wind_delta: i32,
    pub wind_cnt: i32,
    /// Winding count of the other polygon type.
    pub wind_cnt2: i32,
    pub out: OutSlot,
    /// Ring neighbours in the input path.
    pub next: EdgeIdx,
    pub prev: EdgeIdx,
    /// The next edge in the same bound.
    pub next_in_lml: Option<EdgeIdx>,
    pub next_in_ael: Option<EdgeIdx>,
    pub prev_in_ael: Option<EdgeIdx>,
    pub next_in_sel: Option<EdgeIdx>,
    pub prev_in_sel: Option<EdgeIdx>,
}

impl Recycle for Edge {}

impl Edge {
    pub(crate) fn is_horizontal(&self) -> bool {
        self.dx == HORIZONTAL
    }

    pub(crate) fn set_dx(&mut self) {
        let dy = self.top.y - self.bot.y;
        self.dx = if dy == 0 {
            HORIZONTAL
        } else {
            (self.top.x - self.bot.x) as f64 / dy as f64
        };
    }

    /// The `x` coordinate at which this edge crosses the scanline `y`.
    pub(crate) fn top_x(&self, y: i64) -> i64 {
        if y == self.top.y {
            self.top.x
        } else {
            self.bot.x + crate::num::round(self.dx * (y - self.bot.y) as f64)
        }
    }

    /// Whether `curr` is at `y` and this edge ends there.
    pub(crate) fn is_maxima(&self, y: i64) -> bool {
        self.top.y == y && self.next_in_lml.is_none()
    }

    pub(crate) fn is_intermediate(&self, y: i64) -> bool {
        self.top.y == y && self.next_in_lml.is_some()
    }

    pub(crate) fn reverse_horizontal(&mut self) {
        std::mem::swap(&mut self.top.x, &mut self.bot.x);
        std::mem::swap(&mut self.top.z, &mut self.bot.z);
    }
}

/// A local minimum of some input path: the two bounds that start there.
///
/// For open paths one of the bounds may be missing.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LocalMinima {
    pub y: i64,
    pub left_bound: Option<EdgeIdx>,
    pub right_bound: Option<EdgeIdx>,
}

/// An output polygon under construction.
#[derive(Clone, Debug, Default)]
pub(crate) struct OutRec {
    pub is_hole: bool,
    pub is_open: bool,
    /// The nearest enclosing record, before holes are fixed up.
    pub first_left: Option<OutRecIdx>,
    /// Any point of the ring; `None` once the record has been merged away.
    pub pts: Option<OutPtIdx>,
    pub bottom_pt: Option<OutPtIdx>,
    pub poly_node: Option<NodeIdx>,
    /// Set when this record was merged into another one.
    pub merged_into: Option<OutRecIdx>,
}

impl Recycle for OutRec {}

/// A vertex of an output ring.
#[derive(Clone, Debug, Default)]
pub(crate) struct OutPt {
    /// The record owning this ring.
    pub rec: OutRecIdx,
    pub pt: IntPoint,
    pub next: OutPtIdx,
    pub prev: OutPtIdx,
}

impl Recycle for OutPt {}

/// Two output points that should be merged once the sweep is done.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Join {
    pub op1: OutPtIdx,
    pub op2: OutPtIdx,
    pub off_pt: IntPoint,
}

/// A horizontal output segment that may later be joined with another edge.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GhostJoin {
    pub op: OutPtIdx,
    pub off_pt: IntPoint,
}

/// A pending crossing of two active edges within the current scanbeam.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IntersectNode {
    pub edge1: EdgeIdx,
    pub edge2: EdgeIdx,
    pub pt: IntPoint,
}
