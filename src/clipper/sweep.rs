//! The scanbeam loop.
//!
//! Each iteration handles one scanbeam, the horizontal strip between two
//! consecutive vertex heights. Within a beam no edge starts or ends, so the
//! only events are crossings between active edges. At the top of the beam,
//! edges end at maxima, continue at intermediate vertices, or turn into
//! horizontals, and new bounds start at local minima.

use super::ael::List;
use super::joins::horz_segments_overlap;
use super::records::{Direction, Edge, EdgeIdx, IntersectNode, OutPtIdx, OutSlot};
use super::Clipper;
use crate::{geom::IntPoint, num, ClipType, Error, FillRule, PolyType};

/// The winding count as seen by a fill rule: for the positive and negative
/// rules only counts of the right sign matter.
fn weighted(rule: FillRule, wind: i32) -> i32 {
    match rule {
        FillRule::Positive => wind,
        FillRule::Negative => -wind,
        FillRule::EvenOdd | FillRule::NonZero => wind.abs(),
    }
}

fn is_zero_or_one(w: i32) -> bool {
    w == 0 || w == 1
}

fn horz_direction(e: &Edge) -> (Direction, i64, i64) {
    if e.bot.x < e.top.x {
        (Direction::LeftToRight, e.bot.x, e.top.x)
    } else {
        (Direction::RightToLeft, e.top.x, e.bot.x)
    }
}

/// Where two edges cross, rounded to the grid and clamped to the current beam.
fn intersect_point(e1: &Edge, e2: &Edge) -> IntPoint {
    if e1.dx == e2.dx {
        let y = e1.curr.y;
        return IntPoint::new(e1.top_x(y), y);
    }
    let (mut x, mut y) = if e1.dx == 0.0 {
        let x = e1.bot.x;
        if e2.is_horizontal() {
            (x, e2.bot.y)
        } else {
            let b2 = e2.bot.y as f64 - e2.bot.x as f64 / e2.dx;
            (x, num::round(x as f64 / e2.dx + b2))
        }
    } else if e2.dx == 0.0 {
        let x = e2.bot.x;
        if e1.is_horizontal() {
            (x, e1.bot.y)
        } else {
            let b1 = e1.bot.y as f64 - e1.bot.x as f64 / e1.dx;
            (x, num::round(x as f64 / e1.dx + b1))
        }
    } else {
        let b1 = e1.bot.x as f64 - e1.bot.y as f64 * e1.dx;
        let b2 = e2.bot.x as f64 - e2.bot.y as f64 * e2.dx;
        let q = (b2 - b1) / (e1.dx - e2.dx);
        let x = if e1.dx.abs() < e2.dx.abs() {
            num::round(e1.dx * q + b1)
        } else {
            num::round(e2.dx * q + b2)
        };
        (x, num::round(q))
    };

    if y < e1.top.y || y < e2.top.y {
        y = e1.top.y.max(e2.top.y);
        x = if e1.dx.abs() < e2.dx.abs() {
            e1.top_x(y)
        } else {
            e2.top_x(y)
        };
    }
    // Never below the bottom of the beam; the steeper edge gives the better x.
    if y > e1.curr.y {
        y = e1.curr.y;
        x = if e1.dx.abs() > e2.dx.abs() {
            e2.top_x(y)
        } else {
            e1.top_x(y)
        };
    }
    IntPoint::new(x, y)
}

impl Clipper {
    /// Runs the sweep and tidies up the output rings.
    pub(super) fn execute_internal(&mut self) -> Result<(), Error> {
        self.reset();
        self.maxima.clear();
        self.sorted_edges = None;

        let Some(mut bot_y) = self.pop_scanbeam() else {
            return Ok(());
        };
        self.insert_local_minima_into_ael(bot_y);
        while let Some(top_y) = self.pop_scanbeam() {
            log::trace!("scanbeam {bot_y} -> {top_y}");
            self.process_horizontals()?;
            self.ghost_joins.clear();
            self.process_intersections(top_y)?;
            self.process_edges_at_top_of_scanbeam(top_y)?;
            bot_y = top_y;
            self.insert_local_minima_into_ael(bot_y);
            #[cfg(feature = "slow-asserts")]
            self.check_lists();
        }
        debug_assert!(!self.has_local_minima());

        self.fix_orientations();
        if !self.joins.is_empty() {
            self.join_common_edges();
        }
        for rec in self.out_recs.handles() {
            let r = &self.out_recs[rec];
            if r.pts.is_none() {
                continue;
            }
            if r.is_open {
                self.fixup_out_polyline(rec);
            } else {
                self.fixup_out_polygon(rec);
            }
        }
        if self.options.strictly_simple {
            self.do_simple_polygons();
        }
        #[cfg(feature = "slow-asserts")]
        self.check_rings();

        self.joins.clear();
        self.ghost_joins.clear();
        Ok(())
    }

    /// Pops the next scanline, skipping duplicates.
    fn pop_scanbeam(&mut self) -> Option<i64> {
        let y = self.scanbeam.pop()?;
        while self.scanbeam.peek() == Some(&y) {
            self.scanbeam.pop();
        }
        Some(y)
    }

    fn insert_local_minima_into_ael(&mut self, bot_y: i64) {
        while let Some(lm) = self.pop_local_minima(bot_y) {
            let (lb, rb) = (lm.left_bound, lm.right_bound);
            let mut op1 = None;
            match (lb, rb) {
                (Some(lb), Some(rb)) => {
                    self.insert_edge_into_ael(lb, None);
                    self.insert_edge_into_ael(rb, Some(lb));
                    self.set_winding_count(lb);
                    let (wind_cnt, wind_cnt2) = (self.edges[lb].wind_cnt, self.edges[lb].wind_cnt2);
                    self.edges[rb].wind_cnt = wind_cnt;
                    self.edges[rb].wind_cnt2 = wind_cnt2;
                    if self.is_contributing(lb) {
                        let bot = self.edges[lb].bot;
                        op1 = Some(self.add_local_min_poly(lb, rb, bot));
                    }
                    self.scanbeam.push(self.edges[lb].top.y);
                }
                (Some(e), None) | (None, Some(e)) => {
                    self.insert_edge_into_ael(e, None);
                    self.set_winding_count(e);
                    if self.is_contributing(e) {
                        let bot = self.edges[e].bot;
                        op1 = Some(self.add_out_pt(e, bot));
                    }
                    if lb.is_some() {
                        self.scanbeam.push(self.edges[e].top.y);
                    }
                }
                (None, None) => {}
            }

            if let Some(rb) = rb {
                let r = &self.edges[rb];
                if r.is_horizontal() {
                    if let Some(next) = r.next_in_lml {
                        self.scanbeam.push(self.edges[next].top.y);
                    }
                    self.add_edge_to_sel(rb);
                } else {
                    self.scanbeam.push(r.top.y);
                }
            }

            let (Some(lb), Some(rb)) = (lb, rb) else {
                continue;
            };
            let Some(op1) = op1 else {
                // Neither bound contributes, but edges in between still need
                // their winding counts updated.
                self.intersect_between_bounds(lb, rb);
                continue;
            };

            // A horizontal right bound may overlap a horizontal output segment
            // from the previous beam; those need joining later.
            let r = &self.edges[rb];
            if r.is_horizontal() && r.wind_delta != 0 {
                let (bot_x, top_x) = (r.bot.x, r.top.x);
                for i in 0..self.ghost_joins.len() {
                    let gj = self.ghost_joins[i];
                    if horz_segments_overlap(self.out_pts[gj.op].pt.x, gj.off_pt.x, bot_x, top_x) {
                        self.add_join(gj.op, op1, gj.off_pt);
                    }
                }
            }

            let l = &self.edges[lb];
            if let Some(prev) = l.prev_in_ael {
                let p = &self.edges[prev];
                if l.out.is_assigned()
                    && p.curr.x == l.bot.x
                    && p.out.is_assigned()
                    && num::slopes_equal4(p.bot, p.top, l.curr, l.top)
                    && l.wind_delta != 0
                    && p.wind_delta != 0
                {
                    let (bot, top) = (l.bot, l.top);
                    let op2 = self.add_out_pt(prev, bot);
                    self.add_join(op1, op2, top);
                }
            }

            if self.edges[lb].next_in_ael != Some(rb) {
                let r = &self.edges[rb];
                if let Some(prev) = r.prev_in_ael {
                    let p = &self.edges[prev];
                    if r.out.is_assigned()
                        && p.out.is_assigned()
                        && num::slopes_equal4(p.curr, p.top, r.curr, r.top)
                        && r.wind_delta != 0
                        && p.wind_delta != 0
                    {
                        let (bot, top) = (r.bot, r.top);
                        let op2 = self.add_out_pt(prev, bot);
                        self.add_join(op1, op2, top);
                    }
                }
            }
            self.intersect_between_bounds(lb, rb);
        }
    }

    /// Crosses the right bound of a new minimum with every edge that ended
    /// up between it and the left bound.
    fn intersect_between_bounds(&mut self, lb: EdgeIdx, rb: EdgeIdx) {
        let pt = self.edges[lb].curr;
        let mut e = self.edges[lb].next_in_ael;
        while let Some(idx) = e {
            if idx == rb {
                break;
            }
            // The right bound is to the right of `idx` above the crossing.
            self.intersect_edges(rb, idx, pt);
            e = self.edges[idx].next_in_ael;
        }
    }

    /// Fills in the `z` of a new vertex on both edges.
    fn set_z(&mut self, pt: &mut IntPoint, e1: EdgeIdx, e2: EdgeIdx) {
        if pt.z != 0 {
            return;
        }
        let Some(z_fill) = self.z_fill.as_mut() else {
            return;
        };
        let (a, b) = (&self.edges[e1], &self.edges[e2]);
        if let Some(end) = [a.bot, a.top, b.bot, b.top].into_iter().find(|end| *end == *pt) {
            pt.z = end.z;
        } else {
            z_fill(a.bot, a.top, b.bot, b.top, pt);
        }
    }

    /// Updates winding counts and output where `e1` and `e2` cross at `pt`.
    ///
    /// `e1` must be the edge that is on the right above the crossing.
    fn intersect_edges(&mut self, e1: EdgeIdx, e2: EdgeIdx, mut pt: IntPoint) {
        let e1_contributing = self.edges[e1].out.is_assigned();
        let e2_contributing = self.edges[e2].out.is_assigned();
        self.set_z(&mut pt, e1, e2);

        let (d1, d2) = (self.edges[e1].wind_delta, self.edges[e2].wind_delta);
        if d1 == 0 || d2 == 0 {
            self.intersect_open(e1, e2, pt);
            return;
        }

        let (t1, t2) = (self.edges[e1].poly_type, self.edges[e2].poly_type);
        if t1 == t2 {
            if self.is_even_odd_fill(e1) {
                let w1 = self.edges[e1].wind_cnt;
                self.edges[e1].wind_cnt = self.edges[e2].wind_cnt;
                self.edges[e2].wind_cnt = w1;
            } else {
                let a = &mut self.edges[e1];
                a.wind_cnt = if a.wind_cnt + d2 == 0 {
                    -a.wind_cnt
                } else {
                    a.wind_cnt + d2
                };
                let b = &mut self.edges[e2];
                b.wind_cnt = if b.wind_cnt - d1 == 0 {
                    -b.wind_cnt
                } else {
                    b.wind_cnt - d1
                };
            }
        } else {
            let (e1_even_odd, e2_even_odd) = (self.is_even_odd_fill(e1), self.is_even_odd_fill(e2));
            let a = &mut self.edges[e1];
            a.wind_cnt2 = if e2_even_odd {
                i32::from(a.wind_cnt2 == 0)
            } else {
                a.wind_cnt2 + d2
            };
            let b = &mut self.edges[e2];
            b.wind_cnt2 = if e1_even_odd {
                i32::from(b.wind_cnt2 == 0)
            } else {
                b.wind_cnt2 - d1
            };
        }

        let (fill1, alt_fill1) = self.fill_rules(t1);
        let (fill2, alt_fill2) = self.fill_rules(t2);
        let e1_wc = weighted(fill1, self.edges[e1].wind_cnt);
        let e2_wc = weighted(fill2, self.edges[e2].wind_cnt);

        if e1_contributing && e2_contributing {
            if !is_zero_or_one(e1_wc)
                || !is_zero_or_one(e2_wc)
                || (t1 != t2 && self.clip_type != ClipType::Xor)
            {
                self.add_local_max_poly(e1, e2, pt);
            } else {
                self.add_out_pt(e1, pt);
                self.add_out_pt(e2, pt);
                self.swap_sides_and_outs(e1, e2, true);
            }
        } else if e1_contributing {
            if is_zero_or_one(e2_wc) {
                self.add_out_pt(e1, pt);
                self.swap_sides_and_outs(e1, e2, true);
            }
        } else if e2_contributing {
            if is_zero_or_one(e1_wc) {
                self.add_out_pt(e2, pt);
                self.swap_sides_and_outs(e1, e2, true);
            }
        } else if is_zero_or_one(e1_wc) && is_zero_or_one(e2_wc) {
            // Neither edge is contributing, so a new output polygon may start here.
            let e1_wc2 = weighted(alt_fill1, self.edges[e1].wind_cnt2);
            let e2_wc2 = weighted(alt_fill2, self.edges[e2].wind_cnt2);
            if t1 != t2 {
                self.add_local_min_poly(e1, e2, pt);
            } else if e1_wc == 1 && e2_wc == 1 {
                let starts = match self.clip_type {
                    ClipType::Intersection => e1_wc2 > 0 && e2_wc2 > 0,
                    ClipType::Union => e1_wc2 <= 0 && e2_wc2 <= 0,
                    ClipType::Difference => match t1 {
                        PolyType::Clip => e1_wc2 > 0 && e2_wc2 > 0,
                        PolyType::Subject => e1_wc2 <= 0 && e2_wc2 <= 0,
                    },
                    ClipType::Xor => true,
                };
                if starts {
                    self.add_local_min_poly(e1, e2, pt);
                }
            } else {
                self.swap_sides_and_outs(e1, e2, false);
            }
        }
    }

    /// Crossings involving an open path. Two open paths never interact; an
    /// open path toggles its output on and off as it crosses the boundary of
    /// the region it's being clipped against.
    fn intersect_open(&mut self, e1: EdgeIdx, e2: EdgeIdx, pt: IntPoint) {
        let (a, b) = (&self.edges[e1], &self.edges[e2]);
        if a.wind_delta == 0 && b.wind_delta == 0 {
            return;
        }
        let union = self.clip_type == ClipType::Union;
        let toggled = if a.poly_type == b.poly_type {
            // Only unions clip open subjects against closed subjects.
            if !union {
                None
            } else if a.wind_delta == 0 {
                b.out.is_assigned().then_some(e1)
            } else {
                a.out.is_assigned().then_some(e2)
            }
        } else if a.wind_delta == 0 && b.wind_cnt.abs() == 1 && (!union || b.wind_cnt2 == 0) {
            Some(e1)
        } else if b.wind_delta == 0 && a.wind_cnt.abs() == 1 && (!union || a.wind_cnt2 == 0) {
            Some(e2)
        } else {
            None
        };

        if let Some(open) = toggled {
            let was_contributing = self.edges[open].out.is_assigned();
            self.add_out_pt(open, pt);
            if was_contributing {
                self.edges[open].out = OutSlot::Unassigned;
            }
        }
    }

    fn swap_sides_and_outs(&mut self, e1: EdgeIdx, e2: EdgeIdx, outs: bool) {
        let (s1, s2) = (self.edges[e1].side, self.edges[e2].side);
        self.edges[e1].side = s2;
        self.edges[e2].side = s1;
        if outs {
            let (o1, o2) = (self.edges[e1].out, self.edges[e2].out);
            self.edges[e1].out = o2;
            self.edges[e2].out = o1;
        }
    }

    fn process_horizontals(&mut self) -> Result<(), Error> {
        while let Some(e) = self.pop_edge_from_sel() {
            self.process_horizontal(e)?;
        }
        Ok(())
    }

    fn next_in_ael_dir(&self, e: EdgeIdx, dir: Direction) -> Option<EdgeIdx> {
        match dir {
            Direction::LeftToRight => self.edges[e].next_in_ael,
            Direction::RightToLeft => self.edges[e].prev_in_ael,
        }
    }

    /// Joins a new horizontal output point with any queued horizontal that overlaps it.
    fn join_overlapping_horizontals(&mut self, horz: EdgeIdx, op: OutPtIdx) {
        let (bot_x, top_x) = (self.edges[horz].bot.x, self.edges[horz].top.x);
        let mut e = self.sorted_edges;
        while let Some(idx) = e {
            let other = &self.edges[idx];
            let next = other.next_in_sel;
            if other.out.is_assigned()
                && horz_segments_overlap(bot_x, top_x, other.bot.x, other.top.x)
            {
                let off_pt = other.top;
                if let Some(op2) = self.get_last_out_pt(idx) {
                    self.add_join(op2, op, off_pt);
                }
            }
            e = next;
        }
    }

    /// Sweeps a horizontal edge (and any horizontals following it in its
    /// bound) across the edges it touches.
    ///
    /// Horizontals are processed as if they were very slightly tilted, so
    /// they cross every edge whose current `x` lies within their extent.
    fn process_horizontal(&mut self, mut horz: EdgeIdx) -> Result<(), Error> {
        let is_open = self.edges[horz].wind_delta == 0;
        let (mut dir, mut left, mut right) = horz_direction(&self.edges[horz]);

        let mut last_horz = horz;
        while let Some(next) = self.edges[last_horz].next_in_lml {
            if !self.edges[next].is_horizontal() {
                break;
            }
            last_horz = next;
        }
        let max_pair = if self.edges[last_horz].next_in_lml.is_none() {
            self.get_maxima_pair(last_horz)
        } else {
            None
        };

        // Cursors into the sorted maxima: one walking forwards and one
        // backwards from the end, only the one matching `dir` in use.
        let n_maxima = self.maxima.len();
        let (mut max_fwd, mut max_rev) = (n_maxima, n_maxima);
        if n_maxima > 0 {
            let bot_x = self.edges[horz].bot.x;
            let last_top_x = self.edges[last_horz].top.x;
            match dir {
                Direction::LeftToRight => {
                    max_fwd = self.maxima.iter().position(|&x| x > bot_x).unwrap_or(n_maxima);
                    if max_fwd < n_maxima && self.maxima[max_fwd] >= last_top_x {
                        max_fwd = n_maxima;
                    }
                }
                Direction::RightToLeft => {
                    max_rev = self
                        .maxima
                        .iter()
                        .rev()
                        .position(|&x| x <= bot_x)
                        .unwrap_or(n_maxima);
                    if max_rev < n_maxima && self.maxima[n_maxima - 1 - max_rev] <= last_top_x {
                        max_rev = n_maxima;
                    }
                }
            }
        }

        let mut op1 = None;
        loop {
            let is_last_horz = horz == last_horz;
            let mut e = self.next_in_ael_dir(horz, dir);
            while let Some(ei) = e {
                // Add vertices wherever a maximum touches the horizontal, so
                // that strictly simple output can split there.
                let curr_x = self.edges[ei].curr.x;
                let horz_y = self.edges[horz].bot.y;
                loop {
                    let x = match dir {
                        Direction::LeftToRight if max_fwd < n_maxima => self.maxima[max_fwd],
                        Direction::RightToLeft if max_rev < n_maxima => {
                            self.maxima[n_maxima - 1 - max_rev]
                        }
                        _ => break,
                    };
                    let passed = match dir {
                        Direction::LeftToRight => x < curr_x,
                        Direction::RightToLeft => x > curr_x,
                    };
                    if !passed {
                        break;
                    }
                    if self.edges[horz].out.is_assigned() && !is_open {
                        self.add_out_pt(horz, IntPoint::new(x, horz_y));
                    }
                    match dir {
                        Direction::LeftToRight => max_fwd += 1,
                        Direction::RightToLeft => max_rev += 1,
                    }
                }

                if (dir == Direction::LeftToRight && curr_x > right)
                    || (dir == Direction::RightToLeft && curr_x < left)
                {
                    break;
                }

                // Stop at the end of an intermediate horizontal if the next
                // edge of the bound is to the left of `ei` above it.
                let h = &self.edges[horz];
                if curr_x == h.top.x {
                    if let Some(next) = h.next_in_lml {
                        if self.edges[ei].dx < self.edges[next].dx {
                            break;
                        }
                    }
                }

                if self.edges[horz].out.is_assigned() && !is_open {
                    let mut curr = self.edges[ei].curr;
                    match dir {
                        Direction::LeftToRight => self.set_z(&mut curr, horz, ei),
                        Direction::RightToLeft => self.set_z(&mut curr, ei, horz),
                    }
                    self.edges[ei].curr = curr;
                    let op = self.add_out_pt(horz, curr);
                    op1 = Some(op);
                    self.join_overlapping_horizontals(horz, op);
                    let bot = self.edges[horz].bot;
                    self.add_ghost_join(op, bot);
                }

                if Some(ei) == max_pair && is_last_horz {
                    if self.edges[horz].out.is_assigned() {
                        let top = self.edges[horz].top;
                        self.add_local_max_poly(horz, ei, top);
                    }
                    self.delete_from(horz, List::Active);
                    self.delete_from(ei, List::Active);
                    return Ok(());
                }

                let pt = IntPoint::new(curr_x, self.edges[horz].curr.y);
                match dir {
                    Direction::LeftToRight => self.intersect_edges(horz, ei, pt),
                    Direction::RightToLeft => self.intersect_edges(ei, horz, pt),
                }
                let e_next = self.next_in_ael_dir(ei, dir);
                self.swap_positions(horz, ei, List::Active);
                e = e_next;
            }

            match self.edges[horz].next_in_lml {
                Some(next) if self.edges[next].is_horizontal() => {}
                _ => break,
            }
            horz = self.update_edge_into_ael(horz)?;
            if self.edges[horz].out.is_assigned() {
                let bot = self.edges[horz].bot;
                self.add_out_pt(horz, bot);
            }
            (dir, left, right) = horz_direction(&self.edges[horz]);
        }

        if self.edges[horz].out.is_assigned() && op1.is_none() {
            if let Some(op) = self.get_last_out_pt(horz) {
                self.join_overlapping_horizontals(horz, op);
                let top = self.edges[horz].top;
                self.add_ghost_join(op, top);
            }
        }

        let top = self.edges[horz].top;
        if self.edges[horz].next_in_lml.is_none() {
            if self.edges[horz].out.is_assigned() {
                self.add_out_pt(horz, top);
            }
            self.delete_from(horz, List::Active);
        } else if self.edges[horz].out.is_assigned() {
            let op = self.add_out_pt(horz, top);
            horz = self.update_edge_into_ael(horz)?;
            // `horz` is no longer horizontal here.
            if let Some(other) = self.collinear_neighbour(horz, false) {
                let (bot, top) = (self.edges[horz].bot, self.edges[horz].top);
                let op2 = self.add_out_pt(other, bot);
                self.add_join(op, op2, top);
            }
        } else {
            self.update_edge_into_ael(horz)?;
        }
        Ok(())
    }

    /// An output edge next to `e` that starts where `e` starts and runs
    /// along the same line.
    ///
    /// `e` must have just been promoted, so that its `curr` is its `bot`. The
    /// neighbour's line is taken through its `curr` if `from_curr` is set,
    /// and through its `bot` otherwise.
    fn collinear_neighbour(&self, e: EdgeIdx, from_curr: bool) -> Option<EdgeIdx> {
        let edge = &self.edges[e];
        if edge.wind_delta == 0 {
            return None;
        }
        [edge.prev_in_ael, edge.next_in_ael]
            .into_iter()
            .flatten()
            .find(|&o| {
                let other = &self.edges[o];
                let start = if from_curr { other.curr } else { other.bot };
                other.curr == edge.bot
                    && other.wind_delta != 0
                    && other.out.is_assigned()
                    && other.curr.y > other.top.y
                    && num::slopes_equal4(edge.curr, edge.top, start, other.top)
            })
    }

    /// The other edge ending at the same maximum as `e`.
    fn get_maxima_pair(&self, e: EdgeIdx) -> Option<EdgeIdx> {
        let edge = &self.edges[e];
        [edge.next, edge.prev].into_iter().find(|&o| {
            let other = &self.edges[o];
            other.top == edge.top && other.next_in_lml.is_none()
        })
    }

    /// Like [`Clipper::get_maxima_pair`], but only if the pair is in the AEL
    /// (or is a horizontal waiting to be processed).
    fn get_maxima_pair_ex(&self, e: EdgeIdx) -> Option<EdgeIdx> {
        let pair = self.get_maxima_pair(e)?;
        let p = &self.edges[pair];
        if p.out == OutSlot::Skip || (p.next_in_ael == p.prev_in_ael && !p.is_horizontal()) {
            None
        } else {
            Some(pair)
        }
    }

    fn process_edges_at_top_of_scanbeam(&mut self, top_y: i64) -> Result<(), Error> {
        let mut e = self.active_edges;
        while let Some(mut idx) = e {
            // Maxima are treated like bent horizontals, unless their pair
            // really is a horizontal (in which case the horizontal handles them).
            let mut is_maxima_edge = self.edges[idx].is_maxima(top_y);
            if is_maxima_edge {
                if let Some(pair) = self.get_maxima_pair_ex(idx) {
                    is_maxima_edge = !self.edges[pair].is_horizontal();
                }
            }

            if is_maxima_edge {
                if self.options.strictly_simple {
                    self.maxima.push(self.edges[idx].top.x);
                }
                let prev = self.edges[idx].prev_in_ael;
                self.do_maxima(idx)?;
                e = match prev {
                    Some(p) => self.edges[p].next_in_ael,
                    None => self.active_edges,
                };
                continue;
            }

            let edge = &self.edges[idx];
            let next_is_horizontal = edge
                .next_in_lml
                .is_some_and(|n| self.edges[n].is_horizontal());
            if edge.is_intermediate(top_y) && next_is_horizontal {
                idx = self.update_edge_into_ael(idx)?;
                if self.edges[idx].out.is_assigned() {
                    let bot = self.edges[idx].bot;
                    self.add_out_pt(idx, bot);
                }
                self.add_edge_to_sel(idx);
            } else {
                let edge = &mut self.edges[idx];
                edge.curr.x = edge.top_x(top_y);
                edge.curr.y = top_y;
                edge.curr.z = if top_y == edge.top.y {
                    edge.top.z
                } else if top_y == edge.bot.y {
                    edge.bot.z
                } else {
                    0
                };
            }

            // Edges touching at a vertex both get an output point there, so
            // the rings can later be split apart.
            if self.options.strictly_simple {
                let edge = &self.edges[idx];
                if let Some(prev) = edge.prev_in_ael {
                    let p = &self.edges[prev];
                    if edge.out.is_assigned()
                        && edge.wind_delta != 0
                        && p.out.is_assigned()
                        && p.curr.x == edge.curr.x
                        && p.wind_delta != 0
                    {
                        let mut pt = edge.curr;
                        self.set_z(&mut pt, prev, idx);
                        let op = self.add_out_pt(prev, pt);
                        let op2 = self.add_out_pt(idx, pt);
                        self.add_join(op, op2, pt);
                    }
                }
            }
            e = self.edges[idx].next_in_ael;
        }

        self.maxima.sort_unstable();
        self.process_horizontals()?;
        self.maxima.clear();

        // Promote edges ending at intermediate vertices to the next edge of their bound.
        let mut e = self.active_edges;
        while let Some(mut idx) = e {
            if self.edges[idx].is_intermediate(top_y) {
                let op = if self.edges[idx].out.is_assigned() {
                    let top = self.edges[idx].top;
                    Some(self.add_out_pt(idx, top))
                } else {
                    None
                };
                idx = self.update_edge_into_ael(idx)?;
                if let Some(op) = op {
                    if let Some(other) = self.collinear_neighbour(idx, true) {
                        let (bot, top) = (self.edges[idx].bot, self.edges[idx].top);
                        let op2 = self.add_out_pt(other, bot);
                        self.add_join(op, op2, top);
                    }
                }
            }
            e = self.edges[idx].next_in_ael;
        }
        Ok(())
    }

    /// Closes off the bound ending at `e`, crossing it with every edge
    /// between it and its pair.
    fn do_maxima(&mut self, e: EdgeIdx) -> Result<(), Error> {
        let top = self.edges[e].top;
        let Some(pair) = self.get_maxima_pair_ex(e) else {
            if self.edges[e].out.is_assigned() {
                self.add_out_pt(e, top);
            }
            self.delete_from(e, List::Active);
            return Ok(());
        };

        let mut next = self.edges[e].next_in_ael;
        while let Some(n) = next {
            if n == pair {
                break;
            }
            self.intersect_edges(e, n, top);
            self.swap_positions(e, n, List::Active);
            next = self.edges[e].next_in_ael;
        }

        let (out, pair_out) = (self.edges[e].out, self.edges[pair].out);
        if out == OutSlot::Unassigned && pair_out == OutSlot::Unassigned {
            self.delete_from(e, List::Active);
            self.delete_from(pair, List::Active);
        } else if out.is_assigned() && pair_out.is_assigned() {
            self.add_local_max_poly(e, pair, top);
            self.delete_from(e, List::Active);
            self.delete_from(pair, List::Active);
        } else if self.edges[e].wind_delta == 0 {
            for edge in [e, pair] {
                if self.edges[edge].out.is_assigned() {
                    self.add_out_pt(edge, top);
                    self.edges[edge].out = OutSlot::Unassigned;
                }
                self.delete_from(edge, List::Active);
            }
        } else {
            return Err(Error::Sweep("maxima pair has a single output"));
        }
        Ok(())
    }

    fn process_intersections(&mut self, top_y: i64) -> Result<(), Error> {
        if self.active_edges.is_none() {
            return Ok(());
        }
        self.build_intersect_list(top_y);
        let result = match self.intersections.len() {
            0 => Ok(()),
            1 => {
                self.process_intersect_list();
                Ok(())
            }
            _ => self
                .fixup_intersection_order()
                .map(|()| self.process_intersect_list()),
        };
        self.intersections.clear();
        self.sorted_edges = None;
        result
    }

    /// Finds every crossing in the current beam by bubble sorting the
    /// active edges by their `x` at the top of the beam.
    fn build_intersect_list(&mut self, top_y: i64) {
        self.sorted_edges = self.active_edges;
        let mut e = self.active_edges;
        while let Some(idx) = e {
            let edge = &mut self.edges[idx];
            edge.prev_in_sel = edge.prev_in_ael;
            edge.next_in_sel = edge.next_in_ael;
            edge.curr.x = edge.top_x(top_y);
            e = edge.next_in_ael;
        }

        loop {
            let Some(mut e) = self.sorted_edges else {
                break;
            };
            let mut modified = false;
            while let Some(next) = self.edges[e].next_in_sel {
                let (a, b) = (&self.edges[e], &self.edges[next]);
                if a.curr.x > b.curr.x {
                    let mut pt = intersect_point(a, b);
                    if pt.y < top_y {
                        pt = IntPoint::new(a.top_x(top_y), top_y);
                    }
                    self.intersections.push(IntersectNode {
                        edge1: e,
                        edge2: next,
                        pt,
                    });
                    self.swap_positions(e, next, List::Sorted);
                    modified = true;
                } else {
                    e = next;
                }
            }
            // The last edge is in its final place; drop it from the next pass.
            match self.edges[e].prev_in_sel {
                Some(prev) => self.edges[prev].next_in_sel = None,
                None => break,
            }
            if !modified {
                break;
            }
        }
        self.sorted_edges = None;
    }

    /// Orders the crossings so that every one of them is between edges that
    /// are adjacent at the time it's processed.
    fn fixup_intersection_order(&mut self) -> Result<(), Error> {
        self.copy_ael_to_sel();
        self.intersections.sort_by(|a, b| b.pt.y.cmp(&a.pt.y));
        let n = self.intersections.len();
        for i in 0..n {
            if !self.edges_adjacent(self.intersections[i]) {
                let j = (i + 1..n)
                    .find(|&j| self.edges_adjacent(self.intersections[j]))
                    .ok_or(Error::IntersectionOrder)?;
                self.intersections.swap(i, j);
            }
            let node = self.intersections[i];
            self.swap_positions(node.edge1, node.edge2, List::Sorted);
        }
        Ok(())
    }

    fn edges_adjacent(&self, node: IntersectNode) -> bool {
        let e = &self.edges[node.edge1];
        e.next_in_sel == Some(node.edge2) || e.prev_in_sel == Some(node.edge2)
    }

    fn process_intersect_list(&mut self) {
        for i in 0..self.intersections.len() {
            let node = self.intersections[i];
            self.intersect_edges(node.edge1, node.edge2, node.pt);
            self.swap_positions(node.edge1, node.edge2, List::Active);
        }
        self.intersections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Path;

    fn edge(bot: (i64, i64), top: (i64, i64)) -> Edge {
        let mut e = Edge {
            bot: bot.into(),
            top: top.into(),
            ..Edge::default()
        };
        e.curr = e.bot;
        e.set_dx();
        e
    }

    fn rect(l: i64, t: i64, r: i64, b: i64) -> Path {
        vec![
            IntPoint::new(l, t),
            IntPoint::new(r, t),
            IntPoint::new(r, b),
            IntPoint::new(l, b),
        ]
    }

    #[test]
    fn crossing_diagonals() {
        let a = edge((0, 10), (10, 0));
        let b = edge((10, 10), (0, 0));
        assert_eq!(intersect_point(&a, &b), IntPoint::new(5, 5));
        assert_eq!(intersect_point(&b, &a), IntPoint::new(5, 5));
    }

    #[test]
    fn crossing_a_vertical() {
        let v = edge((4, 10), (4, 0));
        let d = edge((0, 10), (10, 0));
        assert_eq!(intersect_point(&v, &d), IntPoint::new(4, 6));
        assert_eq!(intersect_point(&d, &v), IntPoint::new(4, 6));
    }

    #[test]
    fn crossing_is_clamped_to_the_beam() {
        // Nearly parallel edges whose lines meet below the current beam.
        let mut a = edge((0, 100), (10, 0));
        let mut b = edge((1, 100), (12, 0));
        a.curr = IntPoint::new(5, 50);
        b.curr = IntPoint::new(7, 50);
        assert_eq!(intersect_point(&a, &b), IntPoint::new(5, 50));
    }

    #[test]
    fn scanbeam_pops_each_y_once() {
        let mut c = Clipper::new();
        for y in [3, 1, 3, 2, 1, 3] {
            c.scanbeam.push(y);
        }
        assert_eq!(c.pop_scanbeam(), Some(3));
        assert_eq!(c.pop_scanbeam(), Some(2));
        assert_eq!(c.pop_scanbeam(), Some(1));
        assert_eq!(c.pop_scanbeam(), None);
    }

    #[test]
    fn weighted_counts() {
        assert_eq!(weighted(FillRule::NonZero, -2), 2);
        assert_eq!(weighted(FillRule::Positive, -2), -2);
        assert_eq!(weighted(FillRule::Negative, -2), 2);
    }

    #[test]
    fn overlapping_rectangles() {
        let mut c = Clipper::new();
        c.add_path(&rect(0, 0, 10, 10), PolyType::Subject, true).unwrap();
        c.add_path(&rect(5, 5, 15, 15), PolyType::Clip, true).unwrap();

        let out = c
            .execute(ClipType::Intersection, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(num::area2(&out[0]), 50);

        let out = c
            .execute(ClipType::Difference, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(num::area2(&out[0]), 150);
    }

    #[test]
    fn crossing_bowtie() {
        // Both lobes are covered once, whatever the fill rule.
        let bowtie = vec![
            IntPoint::new(0, 0),
            IntPoint::new(10, 10),
            IntPoint::new(10, 0),
            IntPoint::new(0, 10),
        ];
        let mut c = Clipper::new();
        c.add_path(&bowtie, PolyType::Subject, true).unwrap();
        let out = c
            .execute(ClipType::Union, FillRule::EvenOdd, FillRule::EvenOdd)
            .unwrap();
        assert_eq!(out.len(), 2);
        for ring in &out {
            assert_eq!(ring.len(), 3);
            assert_eq!(num::area2(ring), 50);
        }
    }

    #[test]
    fn touching_rectangles_are_joined() {
        let mut c = Clipper::new();
        c.add_path(&rect(0, 0, 10, 10), PolyType::Subject, true).unwrap();
        c.add_path(&rect(10, 0, 20, 10), PolyType::Subject, true).unwrap();
        let out = c
            .execute(ClipType::Union, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 4);
        assert_eq!(num::area2(&out[0]), 400);
    }

    #[test]
    fn z_fill_marks_crossings() {
        let mut c = Clipper::new();
        c.set_z_fill(|_, _, _, _, pt| pt.z = 7);
        c.add_path(&rect(0, 0, 10, 10), PolyType::Subject, true).unwrap();
        c.add_path(&rect(5, 5, 15, 15), PolyType::Clip, true).unwrap();
        let out = c
            .execute(ClipType::Intersection, FillRule::NonZero, FillRule::NonZero)
            .unwrap();
        let marked: Vec<_> = out[0].iter().filter(|p| p.z == 7).copied().collect();
        assert_eq!(marked.len(), 2);
        assert!(marked.contains(&IntPoint::new(10, 5)));
        assert!(marked.contains(&IntPoint::new(5, 10)));
    }
}
