//! Merging output rings along shared edges, after the sweep.
//!
//! While sweeping, whenever two output rings run along the same line we
//! record a [`Join`] between a vertex of each. Once the sweep is done those
//! joins either glue two rings into one or, when both vertices belong to the
//! same ring, split it into two. Either way, the hole and containment
//! information of every affected ring has to be patched up.

use super::records::{Direction, GhostJoin, Join, OutPtIdx, OutRecIdx};
use super::Clipper;
use crate::{geom::IntPoint, num::slopes_equal3, pool::Handle};

/// Whether the open intervals `[a1, a2]` and `[b1, b2]` overlap, in either orientation.
pub(super) fn horz_segments_overlap(a1: i64, a2: i64, b1: i64, b2: i64) -> bool {
    let (a1, a2) = (a1.min(a2), a1.max(a2));
    let (b1, b2) = (b1.min(b2), b1.max(b2));
    a1 < b2 && b1 < a2
}

/// The overlap of two horizontal extents, if it has positive length.
fn get_overlap(a1: i64, a2: i64, b1: i64, b2: i64) -> Option<(i64, i64)> {
    let (left, right) = if a1 < a2 {
        if b1 < b2 {
            (a1.max(b1), a2.min(b2))
        } else {
            (a1.max(b2), a2.min(b1))
        }
    } else if b1 < b2 {
        (a2.max(b1), a1.min(b2))
    } else {
        (a2.max(b2), a1.min(b1))
    };
    (left < right).then_some((left, right))
}

impl Clipper {
    pub(super) fn add_join(&mut self, op1: OutPtIdx, op2: OutPtIdx, off_pt: IntPoint) {
        self.joins.push(Join { op1, op2, off_pt });
    }

    pub(super) fn add_ghost_join(&mut self, op: OutPtIdx, off_pt: IntPoint) {
        self.ghost_joins.push(GhostJoin { op, off_pt });
    }

    /// Inserts a copy of `op` into its ring, after it or before it.
    fn dup_out_pt(&mut self, op: OutPtIdx, insert_after: bool) -> OutPtIdx {
        let (rec, pt) = (self.out_pts[op].rec, self.out_pts[op].pt);
        let dup = self.out_pts.claim_with(|o| {
            o.rec = rec;
            o.pt = pt;
        });
        if insert_after {
            let next = self.out_pts[op].next;
            self.link(dup, next);
            self.link(op, dup);
        } else {
            let prev = self.out_pts[op].prev;
            self.link(prev, dup);
            self.link(dup, op);
        }
        dup
    }

    /// Splices two horizontal runs together at `pt`.
    #[allow(clippy::too_many_arguments)]
    fn join_horz(
        &mut self,
        mut op1: OutPtIdx,
        mut op1b: OutPtIdx,
        mut op2: OutPtIdx,
        mut op2b: OutPtIdx,
        pt: IntPoint,
        discard_left: bool,
    ) -> bool {
        let dir = |c: &Self, a: OutPtIdx, b: OutPtIdx| {
            if c.out_pts[a].pt.x > c.out_pts[b].pt.x {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            }
        };
        let dir1 = dir(self, op1, op1b);
        let dir2 = dir(self, op2, op2b);
        if dir1 == dir2 {
            return false;
        }

        // When discarding the left side, op1b should end up to the left of
        // op1; otherwise to the right. Likewise for op2 and op2b.
        (op1, op1b) = self.split_at_horz(op1, dir1, pt, discard_left);
        (op2, op2b) = self.split_at_horz(op2, dir2, pt, discard_left);

        if (dir1 == Direction::LeftToRight) == discard_left {
            self.link(op2, op1);
            self.link(op1b, op2b);
        } else {
            self.link(op1, op2);
            self.link(op2b, op1b);
        }
        true
    }

    fn split_at_horz(
        &mut self,
        mut op: OutPtIdx,
        dir: Direction,
        pt: IntPoint,
        discard_left: bool,
    ) -> (OutPtIdx, OutPtIdx) {
        let insert_after = match dir {
            Direction::LeftToRight => {
                loop {
                    let next = self.out_pts[op].next;
                    let (np, p) = (self.out_pts[next].pt, self.out_pts[op].pt);
                    if np.x <= pt.x && np.x >= p.x && np.y == pt.y {
                        op = next;
                    } else {
                        break;
                    }
                }
                if discard_left && self.out_pts[op].pt.x != pt.x {
                    op = self.out_pts[op].next;
                }
                !discard_left
            }
            Direction::RightToLeft => {
                loop {
                    let next = self.out_pts[op].next;
                    let (np, p) = (self.out_pts[next].pt, self.out_pts[op].pt);
                    if np.x >= pt.x && np.x <= p.x && np.y == pt.y {
                        op = next;
                    } else {
                        break;
                    }
                }
                if !discard_left && self.out_pts[op].pt.x != pt.x {
                    op = self.out_pts[op].next;
                }
                discard_left
            }
        };
        let mut opb = self.dup_out_pt(op, insert_after);
        if self.out_pts[opb].pt != pt {
            op = opb;
            self.out_pts[op].pt = pt;
            opb = self.dup_out_pt(op, insert_after);
        }
        (op, opb)
    }

    /// Performs one join, returning the two (possibly new) join points.
    ///
    /// There are three kinds of join:
    /// 1. horizontal joins, where both points are somewhere along collinear
    ///    horizontal edges and `off_pt` is on the same horizontal;
    /// 2. non-horizontal joins, where both points are at the bottom of the
    ///    overlapping segment and `off_pt` is above them;
    /// 3. strictly-simple joins, where edges touch without being collinear,
    ///    and both points and `off_pt` coincide.
    fn join_points(
        &mut self,
        j: Join,
        rec1: OutRecIdx,
        rec2: OutRecIdx,
    ) -> Option<(OutPtIdx, OutPtIdx)> {
        let (mut op1, mut op2) = (j.op1, j.op2);
        let pt1 = self.out_pts[op1].pt;
        let pt2 = self.out_pts[op2].pt;
        let is_horizontal = pt1.y == j.off_pt.y;

        if is_horizontal && j.off_pt == pt1 && j.off_pt == pt2 {
            // strictly simple join
            if rec1 != rec2 {
                return None;
            }
            let skip_dups = |c: &Self, start: OutPtIdx| {
                let mut b = c.out_pts[start].next;
                while b != start && c.out_pts[b].pt == j.off_pt {
                    b = c.out_pts[b].next;
                }
                c.out_pts[b].pt.y > j.off_pt.y
            };
            let reverse1 = skip_dups(self, op1);
            let reverse2 = skip_dups(self, op2);
            if reverse1 == reverse2 {
                return None;
            }
            return Some(self.splice_join(op1, op2, reverse1));
        }

        if is_horizontal {
            // We don't know yet where the horizontals overlap, so find the
            // extent of each.
            let mut op1b = op1;
            loop {
                let prev = self.out_pts[op1].prev;
                if self.out_pts[prev].pt.y == self.out_pts[op1].pt.y && prev != op1b && prev != op2
                {
                    op1 = prev;
                } else {
                    break;
                }
            }
            loop {
                let next = self.out_pts[op1b].next;
                if self.out_pts[next].pt.y == self.out_pts[op1b].pt.y && next != op1 && next != op2
                {
                    op1b = next;
                } else {
                    break;
                }
            }
            let next = self.out_pts[op1b].next;
            if next == op1 || next == op2 {
                // a flat ring
                return None;
            }

            let mut op2b = op2;
            loop {
                let prev = self.out_pts[op2].prev;
                if self.out_pts[prev].pt.y == self.out_pts[op2].pt.y && prev != op2b && prev != op1b
                {
                    op2 = prev;
                } else {
                    break;
                }
            }
            loop {
                let next = self.out_pts[op2b].next;
                if self.out_pts[next].pt.y == self.out_pts[op2b].pt.y && next != op2 && next != op1
                {
                    op2b = next;
                } else {
                    break;
                }
            }
            let next = self.out_pts[op2b].next;
            if next == op2 || next == op1 {
                return None;
            }

            let (p1, p1b) = (self.out_pts[op1].pt, self.out_pts[op1b].pt);
            let (p2, p2b) = (self.out_pts[op2].pt, self.out_pts[op2b].pt);
            let (left, right) = get_overlap(p1.x, p1b.x, p2.x, p2b.x)?;

            // Joining overlapping edges leaves a spike to clean up. Keep op1
            // and op2 off the discarded side, since other joins may still
            // refer to them.
            let within = |x: i64| x >= left && x <= right;
            let (pt, discard_left) = if within(p1.x) {
                (p1, p1.x > p1b.x)
            } else if within(p2.x) {
                (p2, p2.x > p2b.x)
            } else if within(p1b.x) {
                (p1b, p1b.x > p1.x)
            } else {
                (p2b, p2b.x > p2.x)
            };
            return self
                .join_horz(op1, op1b, op2, op2b, pt, discard_left)
                .then_some((op1, op2));
        }

        // Non-horizontal: both rings must leave the join point towards off_pt.
        let (op1b, reverse1) = self.join_direction(op1, j.off_pt)?;
        let (op2b, reverse2) = self.join_direction(op2, j.off_pt)?;
        if op1b == op1 || op2b == op2 || op1b == op2b || (rec1 == rec2 && reverse1 == reverse2) {
            return None;
        }
        Some(self.splice_join(op1, op2, reverse1))
    }

    /// Finds the neighbour of `op` heading up towards `off_pt`, and whether
    /// it's the previous one.
    fn join_direction(&self, op: OutPtIdx, off_pt: IntPoint) -> Option<(OutPtIdx, bool)> {
        let pt = self.out_pts[op].pt;
        let neighbour = |forward: bool| {
            let step = |p: OutPtIdx| {
                if forward {
                    self.out_pts[p].next
                } else {
                    self.out_pts[p].prev
                }
            };
            let mut b = step(op);
            while self.out_pts[b].pt == pt && b != op {
                b = step(b);
            }
            b
        };
        let heads_away = |b: OutPtIdx| {
            let bp = self.out_pts[b].pt;
            bp.y > pt.y || !slopes_equal3(pt, bp, off_pt)
        };

        let b = neighbour(true);
        if !heads_away(b) {
            return Some((b, false));
        }
        let b = neighbour(false);
        if heads_away(b) {
            return None;
        }
        Some((b, true))
    }

    /// Cuts both rings at `op1` and `op2` and cross-links them.
    fn splice_join(&mut self, op1: OutPtIdx, op2: OutPtIdx, reverse1: bool) -> (OutPtIdx, OutPtIdx) {
        if reverse1 {
            let op1b = self.dup_out_pt(op1, false);
            let op2b = self.dup_out_pt(op2, true);
            self.link(op2, op1);
            self.link(op1b, op2b);
            (op1, op1b)
        } else {
            let op1b = self.dup_out_pt(op1, true);
            let op2b = self.dup_out_pt(op2, false);
            self.link(op1, op2);
            self.link(op2b, op1b);
            (op1, op1b)
        }
    }

    /// Skips over records that were merged away.
    fn parse_first_left(&self, mut fl: Option<OutRecIdx>) -> Option<OutRecIdx> {
        while let Some(idx) = fl {
            if self.out_recs[idx].pts.is_some() {
                break;
            }
            fl = self.out_recs[idx].first_left;
        }
        fl
    }

    /// After `old` split off `new`, moves the rings that `new` contains over to it.
    fn fixup_first_lefts1(&mut self, old: OutRecIdx, new: OutRecIdx) {
        let new_pts = self.ring(new);
        for rec in self.out_recs.handles() {
            let Some(pts) = self.out_recs[rec].pts else {
                continue;
            };
            if self.parse_first_left(self.out_recs[rec].first_left) == Some(old)
                && self.poly2_contains_poly1(pts, new_pts)
            {
                self.out_recs[rec].first_left = Some(new);
            }
        }
    }

    /// After a ring split into an inner and an outer part, reassigns the rings
    /// that either part (or the outer part's container) might now contain.
    fn fixup_first_lefts2(&mut self, inner: OutRecIdx, outer: OutRecIdx) {
        let orfl = self.out_recs[outer].first_left;
        let inner_pts = self.ring(inner);
        let outer_pts = self.ring(outer);
        for rec in self.out_recs.handles() {
            let Some(pts) = self.out_recs[rec].pts else {
                continue;
            };
            if rec == outer || rec == inner {
                continue;
            }
            let first_left = self.out_recs[rec].first_left;
            let fl = self.parse_first_left(first_left);
            if fl != orfl && fl != Some(inner) && fl != Some(outer) {
                continue;
            }
            if self.poly2_contains_poly1(pts, inner_pts) {
                self.out_recs[rec].first_left = Some(inner);
            } else if self.poly2_contains_poly1(pts, outer_pts) {
                self.out_recs[rec].first_left = Some(outer);
            } else if first_left == Some(inner) || first_left == Some(outer) {
                self.out_recs[rec].first_left = orfl;
            }
        }
    }

    /// After `old` was merged into `new`, moves its children over without testing.
    fn fixup_first_lefts3(&mut self, old: OutRecIdx, new: OutRecIdx) {
        for rec in self.out_recs.handles() {
            if self.out_recs[rec].pts.is_some()
                && self.parse_first_left(self.out_recs[rec].first_left) == Some(old)
            {
                self.out_recs[rec].first_left = Some(new);
            }
        }
    }

    /// Sets the hole state of two rings that used to be one.
    fn classify_split(&mut self, rec1: OutRecIdx, rec2: OutRecIdx, fix_orientation: bool) {
        let pts1 = self.ring(rec1);
        let pts2 = self.ring(rec2);
        if self.poly2_contains_poly1(pts2, pts1) {
            // rec1 contains rec2
            self.out_recs[rec2].is_hole = !self.out_recs[rec1].is_hole;
            self.out_recs[rec2].first_left = Some(rec1);
            if self.using_poly_tree {
                self.fixup_first_lefts2(rec2, rec1);
            }
            if fix_orientation {
                self.orient(rec2);
            }
        } else if self.poly2_contains_poly1(pts1, pts2) {
            // rec2 contains rec1
            self.out_recs[rec2].is_hole = self.out_recs[rec1].is_hole;
            self.out_recs[rec1].is_hole = !self.out_recs[rec2].is_hole;
            self.out_recs[rec2].first_left = self.out_recs[rec1].first_left;
            self.out_recs[rec1].first_left = Some(rec2);
            if self.using_poly_tree {
                self.fixup_first_lefts2(rec1, rec2);
            }
            if fix_orientation {
                self.orient(rec1);
            }
        } else {
            // separate
            self.out_recs[rec2].is_hole = self.out_recs[rec1].is_hole;
            self.out_recs[rec2].first_left = self.out_recs[rec1].first_left;
            if self.using_poly_tree {
                self.fixup_first_lefts1(rec1, rec2);
            }
        }
    }

    fn orient(&mut self, rec: OutRecIdx) {
        let pts = self.ring(rec);
        if (self.out_recs[rec].is_hole ^ self.options.reverse_solution)
            == (self.ring_area2(pts) > 0)
        {
            self.reverse_poly_pt_links(pts);
        }
    }

    pub(super) fn join_common_edges(&mut self) {
        let joins = std::mem::take(&mut self.joins);
        for &join in &joins {
            let rec1 = self.get_out_rec(self.out_pts[join.op1].rec);
            let mut rec2 = self.get_out_rec(self.out_pts[join.op2].rec);

            let (r1, r2) = (&self.out_recs[rec1], &self.out_recs[rec2]);
            if r1.pts.is_none() || r2.pts.is_none() || r1.is_open || r2.is_open {
                continue;
            }

            // The fragment with the correct hole state, decided before joining.
            let hole_state_rec = if rec1 == rec2 {
                rec1
            } else if self.outrec1_right_of_outrec2(rec1, rec2) {
                rec2
            } else if self.outrec1_right_of_outrec2(rec2, rec1) {
                rec1
            } else {
                self.get_lowermost_rec(rec1, rec2)
            };

            let Some((op1, op2)) = self.join_points(join, rec1, rec2) else {
                log::trace!("dropped join at {:?}", join.off_pt);
                continue;
            };

            if rec1 == rec2 {
                // We split one ring into two.
                self.out_recs[rec1].pts = Some(op1);
                self.out_recs[rec1].bottom_pt = None;
                rec2 = self.create_out_rec();
                self.out_recs[rec2].pts = Some(op2);
                self.update_out_pt_idxs(rec2);
                self.classify_split(rec1, rec2, true);
            } else {
                // We joined two rings together.
                let r2 = &mut self.out_recs[rec2];
                r2.pts = None;
                r2.bottom_pt = None;
                r2.merged_into = Some(rec1);

                self.out_recs[rec1].is_hole = self.out_recs[hole_state_rec].is_hole;
                if hole_state_rec == rec2 {
                    self.out_recs[rec1].first_left = self.out_recs[rec2].first_left;
                }
                self.out_recs[rec2].first_left = Some(rec1);
                if self.using_poly_tree {
                    self.fixup_first_lefts3(rec2, rec1);
                }
            }
        }
        self.joins = joins;
        self.joins.clear();
    }

    /// Splits every ring that touches itself at a vertex into separate rings.
    pub(super) fn do_simple_polygons(&mut self) {
        let mut i = 0;
        while i < self.out_recs.len() {
            let rec = OutRecIdx::from_slot(i);
            i += 1;
            let Some(start) = self.out_recs[rec].pts else {
                continue;
            };
            if self.out_recs[rec].is_open {
                continue;
            }
            let mut op = start;
            loop {
                let mut op2 = self.out_pts[op].next;
                while Some(op2) != self.out_recs[rec].pts {
                    if self.out_pts[op].pt == self.out_pts[op2].pt
                        && self.out_pts[op2].next != op
                        && self.out_pts[op2].prev != op
                    {
                        let op3 = self.out_pts[op].prev;
                        let op4 = self.out_pts[op2].prev;
                        self.link(op4, op);
                        self.link(op3, op2);

                        self.out_recs[rec].pts = Some(op);
                        let rec2 = self.create_out_rec();
                        self.out_recs[rec2].pts = Some(op2);
                        self.update_out_pt_idxs(rec2);
                        self.classify_split(rec, rec2, false);
                        op2 = op;
                    }
                    op2 = self.out_pts[op2].next;
                }
                op = self.out_pts[op].next;
                if Some(op) == self.out_recs[rec].pts {
                    break;
                }
            }
        }
    }
}
