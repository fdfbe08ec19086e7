//! The scanbeam clipping engine.
//!
//! A [`Clipper`] collects subject and clip paths with [`Clipper::add_path`],
//! then computes a boolean combination of them with [`Clipper::execute`] or
//! [`Clipper::execute_tree`]. The same clipper can be executed many times,
//! with different operations and fill rules, until [`Clipper::clear`] is called.
//!
//! Internally, each input path is split at its local minima into pairs of
//! monotone chains of edges ("bounds"). The sweep then moves a horizontal line
//! from the largest `y` to the smallest, stopping at every vertex `y` (the
//! gaps between stops are "scanbeams"). It keeps the edges crossing the
//! current scanbeam sorted by `x` in the active edge list, maintains winding
//! counts for every active edge, and emits output vertices wherever an edge
//! bounds the result region.
//!
//! All records live in [`Pool`]s owned by the clipper. Input edges survive
//! until [`Clipper::clear`]; output records are reclaimed at the end of every
//! execution, so repeated executions stop allocating once they reach a steady
//! state.

mod ael;
mod build;
mod joins;
mod output;
mod records;
mod sweep;
mod winding;

use std::collections::BinaryHeap;

use crate::{
    geom::{IntPoint, IntRect, Path, Paths},
    pool::Pool,
    tree::PolyTree,
    ClipType, Error, FillRule, PolyType,
};

use records::{
    Edge, EdgeIdx, GhostJoin, IntersectNode, Join, LocalMinima, OutPt, OutPtIdx, OutRec, OutRecIdx,
};

/// The callback that assigns `z` to vertices created at intersections.
///
/// It receives the endpoints of the two crossing edges (`bot1`, `top1`,
/// `bot2`, `top2`) and the new vertex, whose `x` and `y` are already set.
pub type ZFill = Box<dyn FnMut(IntPoint, IntPoint, IntPoint, IntPoint, &mut IntPoint) + Send>;

/// Options that change the shape of the output, but not the region it covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClipOptions {
    /// Reverse the orientation of every output ring.
    pub reverse_solution: bool,
    /// Split output rings that touch themselves at a vertex.
    pub strictly_simple: bool,
    /// Keep vertices in the middle of straight runs.
    pub preserve_collinear: bool,
}

/// Computes boolean operations on integer polygons and polylines.
pub struct Clipper {
    options: ClipOptions,

    edges: Pool<EdgeIdx, Edge>,
    minima: Vec<LocalMinima>,
    current_lm: usize,
    has_open_paths: bool,

    scanbeam: BinaryHeap<i64>,
    maxima: Vec<i64>,
    active_edges: Option<EdgeIdx>,
    sorted_edges: Option<EdgeIdx>,
    intersections: Vec<IntersectNode>,

    out_recs: Pool<OutRecIdx, OutRec>,
    out_pts: Pool<OutPtIdx, OutPt>,
    joins: Vec<Join>,
    ghost_joins: Vec<GhostJoin>,

    clip_type: ClipType,
    subj_fill: FillRule,
    clip_fill: FillRule,
    using_poly_tree: bool,
    z_fill: Option<ZFill>,
}

impl Default for Clipper {
    fn default() -> Self {
        Self::with_options(ClipOptions::default())
    }
}

impl std::fmt::Debug for Clipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clipper")
            .field("options", &self.options)
            .field("edges", &self.edges.len())
            .field("minima", &self.minima.len())
            .field("has_open_paths", &self.has_open_paths)
            .field("z_fill", &self.z_fill.is_some())
            .finish()
    }
}

impl Clipper {
    /// Creates an empty clipper with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty clipper.
    pub fn with_options(options: ClipOptions) -> Self {
        Clipper {
            options,
            edges: Pool::new(),
            minima: Vec::new(),
            current_lm: 0,
            has_open_paths: false,
            scanbeam: BinaryHeap::new(),
            maxima: Vec::new(),
            active_edges: None,
            sorted_edges: None,
            intersections: Vec::new(),
            out_recs: Pool::new(),
            out_pts: Pool::new(),
            joins: Vec::new(),
            ghost_joins: Vec::new(),
            clip_type: ClipType::default(),
            subj_fill: FillRule::default(),
            clip_fill: FillRule::default(),
            using_poly_tree: false,
            z_fill: None,
        }
    }

    /// The current options.
    pub fn options(&self) -> ClipOptions {
        self.options
    }

    /// Changes the options used by subsequent executions.
    ///
    /// `preserve_collinear` also affects paths added after this call.
    pub fn set_options(&mut self, options: ClipOptions) {
        self.options = options;
    }

    /// Installs a callback that sets `z` on vertices created at intersections.
    pub fn set_z_fill(
        &mut self,
        z_fill: impl FnMut(IntPoint, IntPoint, IntPoint, IntPoint, &mut IntPoint) + Send + 'static,
    ) {
        self.z_fill = Some(Box::new(z_fill));
    }

    /// Removes the z-fill callback; intersection vertices get `z = 0`.
    pub fn clear_z_fill(&mut self) {
        self.z_fill = None;
    }

    /// Whether any open path has been added since the last [`Clipper::clear`].
    pub fn has_open_paths(&self) -> bool {
        self.has_open_paths
    }

    /// Adds several paths of the same type.
    ///
    /// Returns `Ok(true)` if at least one of them was accepted. An error
    /// leaves the paths added before the failing one in place.
    pub fn add_paths(
        &mut self,
        paths: &[Path],
        poly_type: PolyType,
        closed: bool,
    ) -> Result<bool, Error> {
        let mut any = false;
        for path in paths {
            any |= self.add_path(path, poly_type, closed)?;
        }
        Ok(any)
    }

    /// Removes every added path.
    ///
    /// Storage is kept around for the next set of paths.
    pub fn clear(&mut self) {
        self.edges.reclaim_all();
        self.minima.clear();
        self.current_lm = 0;
        self.has_open_paths = false;
    }

    /// Removes every added path and gives back all pooled storage.
    pub fn release_memory(&mut self) {
        self.clear();
        self.edges.release();
        self.out_recs.release();
        self.out_pts.release();
        self.minima = Vec::new();
        self.scanbeam = BinaryHeap::new();
        self.maxima = Vec::new();
        self.intersections = Vec::new();
        self.joins = Vec::new();
        self.ghost_joins = Vec::new();
    }

    /// The bounding box of all added vertices, or `None` if nothing was added.
    pub fn bounds(&self) -> Option<IntRect> {
        IntRect::bounding(self.edges.iter().flat_map(|(_, e)| [e.bot, e.top]))
    }

    /// The number of input edges ever allocated.
    ///
    /// Exposed so that callers can check that a long-lived clipper has stopped
    /// allocating.
    pub fn edges_created(&self) -> usize {
        self.edges.created()
    }

    /// Computes `clip_type` of the subject and clip paths, as a flat list of rings.
    ///
    /// Outer rings have positive signed area (in a y-up frame) and holes
    /// negative, unless `reverse_solution` is set. Fails with
    /// [`Error::OpenPathsNeedPolyTree`] if any open path was added.
    pub fn execute(
        &mut self,
        clip_type: ClipType,
        subj_fill: FillRule,
        clip_fill: FillRule,
    ) -> Result<Paths, Error> {
        if self.has_open_paths {
            return Err(Error::OpenPathsNeedPolyTree);
        }
        self.run(clip_type, subj_fill, clip_fill, false, |c| c.build_result())
    }

    /// Computes `clip_type` of the subject and clip paths, as a tree of contours.
    pub fn execute_tree(
        &mut self,
        clip_type: ClipType,
        subj_fill: FillRule,
        clip_fill: FillRule,
    ) -> Result<PolyTree, Error> {
        let mut tree = PolyTree::new();
        self.execute_into(clip_type, subj_fill, clip_fill, &mut tree)?;
        Ok(tree)
    }

    /// Like [`Clipper::execute_tree`], but reuses the nodes of an existing tree.
    ///
    /// The tree is cleared first, even if execution fails.
    pub fn execute_into(
        &mut self,
        clip_type: ClipType,
        subj_fill: FillRule,
        clip_fill: FillRule,
        tree: &mut PolyTree,
    ) -> Result<(), Error> {
        tree.clear();
        self.run(clip_type, subj_fill, clip_fill, true, |c| c.build_tree(tree))
    }

    fn run<T>(
        &mut self,
        clip_type: ClipType,
        subj_fill: FillRule,
        clip_fill: FillRule,
        using_poly_tree: bool,
        build: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, Error> {
        self.clip_type = clip_type;
        self.subj_fill = subj_fill;
        self.clip_fill = clip_fill;
        self.using_poly_tree = using_poly_tree;
        log::debug!(
            "executing {clip_type:?} ({subj_fill:?}/{clip_fill:?}) on {} edges",
            self.edges.len()
        );

        let result = self.execute_internal().map(|()| build(self));
        if let Err(e) = &result {
            log::warn!("clipping failed: {e}");
        }

        self.dispose_output();
        result
    }

    fn dispose_output(&mut self) {
        log::debug!(
            "sweep produced {} output records and {} output points",
            self.out_recs.len(),
            self.out_pts.len()
        );
        self.out_recs.reclaim_all();
        self.out_pts.reclaim_all();
        self.joins.clear();
        self.ghost_joins.clear();
        self.intersections.clear();
        self.scanbeam.clear();
        self.maxima.clear();
        self.active_edges = None;
        self.sorted_edges = None;
    }

    /// Dump the current state of the sweep as an SVG, for debugging.
    ///
    /// Input edges are drawn in grey, active edges in red and the output
    /// rings built so far in blue.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self) -> svg::Document {
        use svg::node::element::{path::Data, Path as SvgPath};

        let mut doc = svg::Document::new();
        let Some(bounds) = self.bounds() else {
            return doc;
        };
        let bbox = bounds.to_kurbo();
        let stroke_width = 1.0 + bbox.width().max(bbox.height()) / 500.0;
        doc = doc.set(
            "viewBox",
            (
                bbox.min_x() - stroke_width,
                bbox.min_y() - stroke_width,
                bbox.width() + 2.0 * stroke_width,
                bbox.height() + 2.0 * stroke_width,
            ),
        );

        let segment = |a: IntPoint, b: IntPoint, color: &str| {
            let data = Data::new()
                .move_to((a.x as f64, a.y as f64))
                .line_to((b.x as f64, b.y as f64));
            SvgPath::new()
                .set("d", data)
                .set("stroke", color)
                .set("stroke-width", stroke_width)
                .set("fill", "none")
        };

        for (_, edge) in self.edges.iter() {
            doc = doc.add(segment(edge.bot, edge.top, "grey"));
        }
        let mut e = self.active_edges;
        while let Some(idx) = e {
            let edge = &self.edges[idx];
            doc = doc.add(segment(edge.bot, edge.top, "red"));
            e = edge.next_in_ael;
        }
        for (_, rec) in self.out_recs.iter() {
            let Some(start) = rec.pts else {
                continue;
            };
            let mut op = start;
            loop {
                let next = self.out_pts[op].next;
                doc = doc.add(segment(self.out_pts[op].pt, self.out_pts[next].pt, "blue"));
                op = next;
                if op == start {
                    break;
                }
            }
        }
        doc
    }
}
