//! Building output rings, and turning them into paths or a tree.

use super::build::pt2_is_between_pt1_and_pt3;
use super::records::{EdgeIdx, OutPtIdx, OutRecIdx, OutSlot, Side, HORIZONTAL};
use super::Clipper;
use crate::{
    geom::{IntPoint, Paths},
    num::{self, slopes_equal3, Containment},
    tree::PolyTree,
};

/// The inverse slope between two points, or [`HORIZONTAL`].
fn get_dx(p1: IntPoint, p2: IntPoint) -> f64 {
    if p1.y == p2.y {
        HORIZONTAL
    } else {
        (p2.x - p1.x) as f64 / (p2.y - p1.y) as f64
    }
}

impl Clipper {
    pub(super) fn create_out_rec(&mut self) -> OutRecIdx {
        self.out_recs.claim()
    }

    /// The first point of a live ring.
    pub(super) fn ring(&self, rec: OutRecIdx) -> OutPtIdx {
        self.out_recs[rec]
            .pts
            .expect("output record is still referenced after being merged")
    }

    fn new_out_pt(&mut self, rec: OutRecIdx, pt: IntPoint) -> OutPtIdx {
        let op = self.out_pts.claim_with(|o| {
            o.rec = rec;
            o.pt = pt;
        });
        self.out_pts[op].next = op;
        self.out_pts[op].prev = op;
        op
    }

    /// Appends a vertex to the output ring of `e`, starting a new ring if `e`
    /// has none.
    ///
    /// A ring's first point is its left end and the point before it is its
    /// right end; the edge's side decides which end grows.
    pub(super) fn add_out_pt(&mut self, e: EdgeIdx, pt: IntPoint) -> OutPtIdx {
        let Some(rec) = self.edges[e].out.rec() else {
            let rec = self.create_out_rec();
            let is_open = self.edges[e].wind_delta == 0;
            self.out_recs[rec].is_open = is_open;
            let op = self.new_out_pt(rec, pt);
            self.out_recs[rec].pts = Some(op);
            if !is_open {
                self.set_hole_state(e, rec);
            }
            self.edges[e].out = OutSlot::Rec(rec);
            return op;
        };

        let op = self.ring(rec);
        let to_front = self.edges[e].side == Side::Left;
        let op_prev = self.out_pts[op].prev;
        if to_front && pt == self.out_pts[op].pt {
            return op;
        } else if !to_front && pt == self.out_pts[op_prev].pt {
            return op_prev;
        }

        let new_op = self.out_pts.claim_with(|o| {
            o.rec = rec;
            o.pt = pt;
            o.next = op;
            o.prev = op_prev;
        });
        self.out_pts[op_prev].next = new_op;
        self.out_pts[op].prev = new_op;
        if to_front {
            self.out_recs[rec].pts = Some(new_op);
        }
        new_op
    }

    /// The most recently added point at the edge's end of its ring.
    pub(super) fn get_last_out_pt(&self, e: EdgeIdx) -> Option<OutPtIdx> {
        let rec = self.edges[e].out.rec()?;
        let op = self.out_recs[rec].pts?;
        Some(match self.edges[e].side {
            Side::Left => op,
            Side::Right => self.out_pts[op].prev,
        })
    }

    /// Starts a new ring where two bounds meet at a local minimum.
    pub(super) fn add_local_min_poly(
        &mut self,
        e1: EdgeIdx,
        e2: EdgeIdx,
        pt: IntPoint,
    ) -> OutPtIdx {
        let (result, e, prev_e);
        if self.edges[e2].is_horizontal() || self.edges[e1].dx > self.edges[e2].dx {
            result = self.add_out_pt(e1, pt);
            self.edges[e2].out = self.edges[e1].out;
            self.edges[e1].side = Side::Left;
            self.edges[e2].side = Side::Right;
            e = e1;
            prev_e = if self.edges[e].prev_in_ael == Some(e2) {
                self.edges[e2].prev_in_ael
            } else {
                self.edges[e].prev_in_ael
            };
        } else {
            result = self.add_out_pt(e2, pt);
            self.edges[e1].out = self.edges[e2].out;
            self.edges[e1].side = Side::Right;
            self.edges[e2].side = Side::Left;
            e = e2;
            prev_e = if self.edges[e].prev_in_ael == Some(e1) {
                self.edges[e1].prev_in_ael
            } else {
                self.edges[e].prev_in_ael
            };
        }

        if let Some(prev_e) = prev_e {
            let (p, q) = (&self.edges[prev_e], &self.edges[e]);
            if p.out.is_assigned() && p.top.y < pt.y && q.top.y < pt.y {
                let x_prev = p.top_x(pt.y);
                let x_e = q.top_x(pt.y);
                if x_prev == x_e
                    && q.wind_delta != 0
                    && p.wind_delta != 0
                    && num::slopes_equal4(
                        IntPoint::new(x_prev, pt.y),
                        p.top,
                        IntPoint::new(x_e, pt.y),
                        q.top,
                    )
                {
                    let off = q.top;
                    let op = self.add_out_pt(prev_e, pt);
                    self.add_join(result, op, off);
                }
            }
        }
        result
    }

    /// Closes off the output where two bounds meet at a local maximum.
    pub(super) fn add_local_max_poly(&mut self, e1: EdgeIdx, e2: EdgeIdx, pt: IntPoint) {
        self.add_out_pt(e1, pt);
        if self.edges[e2].wind_delta == 0 {
            self.add_out_pt(e2, pt);
        }
        let (out1, out2) = (self.edges[e1].out, self.edges[e2].out);
        if out1 == out2 {
            self.edges[e1].out = OutSlot::Unassigned;
            self.edges[e2].out = OutSlot::Unassigned;
        } else if let (Some(r1), Some(r2)) = (out1.rec(), out2.rec()) {
            if r1 < r2 {
                self.append_polygon(e1, e2);
            } else {
                self.append_polygon(e2, e1);
            }
        }
    }

    /// Joins the ring of `e2` onto the ring of `e1`.
    fn append_polygon(&mut self, e1: EdgeIdx, e2: EdgeIdx) {
        let (Some(rec1), Some(rec2)) = (self.edges[e1].out.rec(), self.edges[e2].out.rec()) else {
            return;
        };

        let hole_state_rec = if self.outrec1_right_of_outrec2(rec1, rec2) {
            rec2
        } else if self.outrec1_right_of_outrec2(rec2, rec1) {
            rec1
        } else {
            self.get_lowermost_rec(rec1, rec2)
        };

        let p1_lft = self.ring(rec1);
        let p1_rt = self.out_pts[p1_lft].prev;
        let p2_lft = self.ring(rec2);
        let p2_rt = self.out_pts[p2_lft].prev;

        let side1 = self.edges[e1].side;
        let side2 = self.edges[e2].side;
        match (side1, side2) {
            (Side::Left, Side::Left) => {
                // z y x a b c
                self.reverse_poly_pt_links(p2_lft);
                self.link(p2_lft, p1_lft);
                self.link(p1_rt, p2_rt);
                self.out_recs[rec1].pts = Some(p2_rt);
            }
            (Side::Left, Side::Right) => {
                // x y z a b c
                self.link(p2_rt, p1_lft);
                self.link(p1_rt, p2_lft);
                self.out_recs[rec1].pts = Some(p2_lft);
            }
            (Side::Right, Side::Right) => {
                // a b c z y x
                self.reverse_poly_pt_links(p2_lft);
                self.link(p1_rt, p2_rt);
                self.link(p2_lft, p1_lft);
            }
            (Side::Right, Side::Left) => {
                // a b c x y z
                self.link(p1_rt, p2_lft);
                self.link(p2_rt, p1_lft);
            }
        }

        self.out_recs[rec1].bottom_pt = None;
        if hole_state_rec == rec2 {
            if self.out_recs[rec2].first_left != Some(rec1) {
                self.out_recs[rec1].first_left = self.out_recs[rec2].first_left;
            }
            self.out_recs[rec1].is_hole = self.out_recs[rec2].is_hole;
        }
        let r2 = &mut self.out_recs[rec2];
        r2.pts = None;
        r2.bottom_pt = None;
        r2.first_left = Some(rec1);
        r2.merged_into = Some(rec1);

        self.edges[e1].out = OutSlot::Unassigned;
        self.edges[e2].out = OutSlot::Unassigned;

        let mut e = self.active_edges;
        while let Some(idx) = e {
            if self.edges[idx].out == OutSlot::Rec(rec2) {
                self.edges[idx].out = OutSlot::Rec(rec1);
                self.edges[idx].side = side1;
                break;
            }
            e = self.edges[idx].next_in_ael;
        }
        log::trace!("merged output {rec2:?} into {rec1:?}");
    }

    /// Makes `b` follow `a`.
    pub(super) fn link(&mut self, a: OutPtIdx, b: OutPtIdx) {
        self.out_pts[a].next = b;
        self.out_pts[b].prev = a;
    }

    /// Decides whether a new ring is a hole by looking at the output edges to its left.
    fn set_hole_state(&mut self, e: EdgeIdx, rec: OutRecIdx) {
        let mut e2 = self.edges[e].prev_in_ael;
        let mut e_tmp: Option<EdgeIdx> = None;
        while let Some(idx) = e2 {
            let edge = &self.edges[idx];
            if edge.out.is_assigned() && edge.wind_delta != 0 {
                match e_tmp {
                    None => e_tmp = Some(idx),
                    Some(t) if self.edges[t].out == edge.out => e_tmp = None,
                    Some(_) => {}
                }
            }
            e2 = edge.prev_in_ael;
        }
        match e_tmp.and_then(|t| self.edges[t].out.rec()) {
            None => {
                self.out_recs[rec].first_left = None;
                self.out_recs[rec].is_hole = false;
            }
            Some(fl) => {
                self.out_recs[rec].first_left = Some(fl);
                self.out_recs[rec].is_hole = !self.out_recs[fl].is_hole;
            }
        }
    }

    /// Whether `rec2` is somewhere in the `first_left` chain of `rec1`.
    pub(super) fn outrec1_right_of_outrec2(&self, rec1: OutRecIdx, rec2: OutRecIdx) -> bool {
        let mut r = self.out_recs[rec1].first_left;
        while let Some(idx) = r {
            if idx == rec2 {
                return true;
            }
            r = self.out_recs[idx].first_left;
        }
        false
    }

    /// Of two rings, the one whose bottom point is lowest (then leftmost).
    pub(super) fn get_lowermost_rec(&mut self, rec1: OutRecIdx, rec2: OutRecIdx) -> OutRecIdx {
        let bp1 = self.bottom_pt(rec1);
        let bp2 = self.bottom_pt(rec2);
        let (p1, p2) = (self.out_pts[bp1].pt, self.out_pts[bp2].pt);
        if p1.y > p2.y {
            rec1
        } else if p1.y < p2.y {
            rec2
        } else if p1.x < p2.x {
            rec1
        } else if p1.x > p2.x {
            rec2
        } else if self.out_pts[bp1].next == bp1 {
            rec2
        } else if self.out_pts[bp2].next == bp2 || self.first_is_bottom_pt(bp1, bp2) {
            rec1
        } else {
            rec2
        }
    }

    fn bottom_pt(&mut self, rec: OutRecIdx) -> OutPtIdx {
        if let Some(bp) = self.out_recs[rec].bottom_pt {
            return bp;
        }
        let bp = self.get_bottom_pt(self.ring(rec));
        self.out_recs[rec].bottom_pt = Some(bp);
        bp
    }

    fn get_bottom_pt(&self, mut pp: OutPtIdx) -> OutPtIdx {
        let pts = &self.out_pts;
        let mut dups: Option<OutPtIdx> = None;
        let mut p = pts[pp].next;
        while p != pp {
            let (pt, best) = (pts[p].pt, pts[pp].pt);
            if pt.y > best.y {
                pp = p;
                dups = None;
            } else if pt.y == best.y && pt.x <= best.x {
                if pt.x < best.x {
                    dups = None;
                    pp = p;
                } else if pts[p].next != pp && pts[p].prev != pp {
                    dups = Some(p);
                }
            }
            p = pts[p].next;
        }
        if let Some(mut d) = dups {
            // There are at least two vertices at the bottom point.
            while d != p {
                if !self.first_is_bottom_pt(p, d) {
                    pp = d;
                }
                d = pts[d].next;
                while pts[d].pt != pts[pp].pt {
                    d = pts[d].next;
                }
            }
        }
        pp
    }

    /// Breaks ties between two rings sharing their bottom point.
    fn first_is_bottom_pt(&self, btm1: OutPtIdx, btm2: OutPtIdx) -> bool {
        let pts = &self.out_pts;
        let neighbour_dx = |btm: OutPtIdx, forward: bool| {
            let step = |p: OutPtIdx| if forward { pts[p].next } else { pts[p].prev };
            let mut p = step(btm);
            while pts[p].pt == pts[btm].pt && p != btm {
                p = step(p);
            }
            get_dx(pts[btm].pt, pts[p].pt).abs()
        };
        let dx1p = neighbour_dx(btm1, false);
        let dx1n = neighbour_dx(btm1, true);
        let dx2p = neighbour_dx(btm2, false);
        let dx2n = neighbour_dx(btm2, true);

        if dx1p.max(dx1n) == dx2p.max(dx2n) && dx1p.min(dx1n) == dx2p.min(dx2n) {
            self.ring_area2(btm1) > 0
        } else {
            (dx1p >= dx2p && dx1p >= dx2n) || (dx1n >= dx2p && dx1n >= dx2n)
        }
    }

    /// Follows merges to the record that now owns a ring.
    pub(super) fn get_out_rec(&self, mut rec: OutRecIdx) -> OutRecIdx {
        while let Some(into) = self.out_recs[rec].merged_into {
            rec = into;
        }
        rec
    }

    pub(super) fn reverse_poly_pt_links(&mut self, start: OutPtIdx) {
        let mut p = start;
        loop {
            let op = &mut self.out_pts[p];
            let next = op.next;
            op.next = op.prev;
            op.prev = next;
            p = next;
            if p == start {
                break;
            }
        }
    }

    /// Twice the signed area of a ring, as it will be emitted.
    pub(super) fn ring_area2(&self, start: OutPtIdx) -> i128 {
        // Rings are emitted walking backwards.
        let ring = std::iter::successors(Some(start), |&op| {
            Some(self.out_pts[op].prev).filter(|&prev| prev != start)
        });
        num::area2(ring.map(|op| &self.out_pts[op].pt))
    }

    pub(super) fn point_count(&self, start: Option<OutPtIdx>) -> usize {
        let Some(start) = start else {
            return 0;
        };
        let mut count = 0;
        let mut p = start;
        loop {
            count += 1;
            p = self.out_pts[p].next;
            if p == start {
                break;
            }
        }
        count
    }

    /// Tests a point against an output ring.
    pub(super) fn point_in_out_ring(&self, pt: IntPoint, start: OutPtIdx) -> Containment {
        let ring = std::iter::successors(Some(start), |&op| {
            Some(self.out_pts[op].next).filter(|&next| next != start)
        });
        num::point_in_ring(pt, ring.map(|op| self.out_pts[op].pt))
    }

    /// Whether the ring at `inner` lies inside the ring at `outer`, judged by
    /// its first vertex that isn't on the boundary.
    pub(super) fn poly2_contains_poly1(&self, inner: OutPtIdx, outer: OutPtIdx) -> bool {
        let mut op = inner;
        loop {
            match self.point_in_out_ring(self.out_pts[op].pt, outer) {
                Containment::Inside => return true,
                Containment::Outside => return false,
                Containment::OnBoundary => {}
            }
            op = self.out_pts[op].next;
            if op == inner {
                break;
            }
        }
        true
    }

    pub(super) fn update_out_pt_idxs(&mut self, rec: OutRecIdx) {
        let start = self.ring(rec);
        let mut op = start;
        loop {
            self.out_pts[op].rec = rec;
            op = self.out_pts[op].prev;
            if op == start {
                break;
            }
        }
    }

    /// Gives every closed ring the orientation that matches its hole state.
    pub(super) fn fix_orientations(&mut self) {
        for rec in self.out_recs.handles() {
            let r = &self.out_recs[rec];
            let Some(pts) = r.pts else {
                continue;
            };
            if r.is_open {
                continue;
            }
            if (r.is_hole ^ self.options.reverse_solution) == (self.ring_area2(pts) > 0) {
                self.reverse_poly_pt_links(pts);
            }
        }
    }

    /// Removes duplicate points of an open output path.
    pub(super) fn fixup_out_polyline(&mut self, rec: OutRecIdx) {
        let mut pp = self.ring(rec);
        let mut last_pp = self.out_pts[pp].prev;
        while pp != last_pp {
            pp = self.out_pts[pp].next;
            let prev = self.out_pts[pp].prev;
            if self.out_pts[pp].pt == self.out_pts[prev].pt {
                if pp == last_pp {
                    last_pp = prev;
                }
                let next = self.out_pts[pp].next;
                self.link(prev, next);
                pp = prev;
            }
        }
        if pp == self.out_pts[pp].prev {
            self.out_recs[rec].pts = None;
        }
    }

    /// Removes duplicate points and collinear vertices of a closed output ring.
    pub(super) fn fixup_out_polygon(&mut self, rec: OutRecIdx) {
        let preserve_col = self.options.preserve_collinear || self.options.strictly_simple;
        let mut last_ok: Option<OutPtIdx> = None;
        self.out_recs[rec].bottom_pt = None;
        let mut pp = self.ring(rec);
        loop {
            let (prev, next) = (self.out_pts[pp].prev, self.out_pts[pp].next);
            if prev == pp || prev == next {
                self.out_recs[rec].pts = None;
                return;
            }
            let (pt_prev, pt, pt_next) = (
                self.out_pts[prev].pt,
                self.out_pts[pp].pt,
                self.out_pts[next].pt,
            );
            if pt == pt_next
                || pt == pt_prev
                || (slopes_equal3(pt_prev, pt, pt_next)
                    && (!preserve_col || !pt2_is_between_pt1_and_pt3(pt_prev, pt, pt_next)))
            {
                last_ok = None;
                self.link(prev, next);
                pp = prev;
            } else if Some(pp) == last_ok {
                break;
            } else {
                if last_ok.is_none() {
                    last_ok = Some(pp);
                }
                pp = next;
            }
        }
        self.out_recs[rec].pts = Some(pp);
    }

    /// Collects every surviving ring, walking each one backwards.
    pub(super) fn build_result(&mut self) -> Paths {
        let mut polys = Paths::with_capacity(self.out_recs.len());
        for (_, rec) in self.out_recs.iter() {
            let Some(pts) = rec.pts else {
                continue;
            };
            let mut p = self.out_pts[pts].prev;
            let cnt = self.point_count(Some(p));
            if cnt < 2 {
                continue;
            }
            let mut path = Vec::with_capacity(cnt);
            for _ in 0..cnt {
                path.push(self.out_pts[p].pt);
                p = self.out_pts[p].prev;
            }
            polys.push(path);
        }
        log::debug!("built {} output paths", polys.len());
        polys
    }

    /// Links every hole to the outer ring that directly contains it.
    fn fix_hole_linkage(&mut self, rec: OutRecIdx) {
        let r = &self.out_recs[rec];
        let Some(fl) = r.first_left else {
            return;
        };
        if r.is_hole != self.out_recs[fl].is_hole && self.out_recs[fl].pts.is_some() {
            return;
        }
        let mut orfl = Some(fl);
        while let Some(idx) = orfl {
            let o = &self.out_recs[idx];
            if o.is_hole != r.is_hole && o.pts.is_some() {
                break;
            }
            orfl = o.first_left;
        }
        self.out_recs[rec].first_left = orfl;
    }

    /// Collects every surviving ring into a tree.
    pub(super) fn build_tree(&mut self, tree: &mut PolyTree) {
        for rec in self.out_recs.handles() {
            let r = &self.out_recs[rec];
            let cnt = self.point_count(r.pts);
            let Some(pts) = r.pts else {
                continue;
            };
            if (r.is_open && cnt < 2) || (!r.is_open && cnt < 3) {
                continue;
            }
            self.fix_hole_linkage(rec);
            let mut op = self.out_pts[pts].prev;
            let node = tree.new_node(std::iter::from_fn(|| {
                let pt = self.out_pts[op].pt;
                op = self.out_pts[op].prev;
                Some(pt)
            })
            .take(cnt));
            self.out_recs[rec].poly_node = Some(node);
        }

        for rec in self.out_recs.handles() {
            let r = &self.out_recs[rec];
            let Some(node) = r.poly_node else {
                continue;
            };
            if r.is_open {
                tree.set_open(node);
                tree.add_child(None, node);
            } else if let Some(parent) = r.first_left.and_then(|fl| self.out_recs[fl].poly_node) {
                tree.add_child(Some(parent), node);
            } else {
                tree.add_child(None, node);
            }
        }
        log::debug!("built a tree of {} nodes", tree.len());
    }

    /// Checks that every live ring is consistently linked and owned.
    #[cfg(feature = "slow-asserts")]
    pub(super) fn check_rings(&self) {
        for (rec, r) in self.out_recs.iter() {
            let Some(start) = r.pts else {
                continue;
            };
            let mut op = start;
            loop {
                let next = self.out_pts[op].next;
                assert_eq!(self.out_pts[next].prev, op, "ring of {rec:?} broken at {op:?}");
                op = next;
                if op == start {
                    break;
                }
            }
        }
    }
}
