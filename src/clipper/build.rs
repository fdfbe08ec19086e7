//! Turning input paths into bounds and local minima.

use super::records::{EdgeIdx, LocalMinima, OutSlot, Side};
use super::Clipper;
use crate::{
    geom::IntPoint,
    num::{self, slopes_equal3},
    Error, PolyType,
};

/// Whether `p2` lies strictly between `p1` and `p3` on their common line.
pub(super) fn pt2_is_between_pt1_and_pt3(p1: IntPoint, p2: IntPoint, p3: IntPoint) -> bool {
    if p1 == p3 || p1 == p2 || p3 == p2 {
        false
    } else if p1.x != p3.x {
        (p2.x > p1.x) == (p2.x < p3.x)
    } else {
        (p2.y > p1.y) == (p2.y < p3.y)
    }
}

impl Clipper {
    /// Adds a path, as either a subject or a clip.
    ///
    /// Closed paths get an implicit edge from the last vertex to the first.
    /// Only subjects may be open.
    ///
    /// Consecutive duplicate vertices are dropped, and so are collinear
    /// vertices of closed paths (unless `preserve_collinear` is set, in which
    /// case only the vertices where the path doubles back on itself go).
    /// Returns `Ok(false)` if nothing usable is left: fewer than three
    /// vertices of a closed path, fewer than two of an open one, or a closed
    /// path with no height.
    pub fn add_path(
        &mut self,
        path: &[IntPoint],
        poly_type: PolyType,
        closed: bool,
    ) -> Result<bool, Error> {
        if !closed && poly_type == PolyType::Clip {
            return Err(Error::OpenClipPath);
        }
        let Some(mut high) = path.len().checked_sub(1) else {
            return Ok(false);
        };
        if closed {
            while high > 0 && path[high] == path[0] {
                high -= 1;
            }
        }
        while high > 0 && path[high] == path[high - 1] {
            high -= 1;
        }
        if (closed && high < 2) || (!closed && high < 1) {
            return Ok(false);
        }
        let pts = &path[..=high];
        if let Some(&bad) = pts.iter().find(|p| !num::in_range(p)) {
            return Err(Error::CoordinateOutOfRange(bad));
        }

        let Some(ring) = self.reduce_ring(pts, closed) else {
            return Ok(false);
        };
        let start_y = pts[ring[0]].y;
        let is_flat = ring.iter().all(|&i| pts[i].y == start_y);
        if is_flat && closed {
            return Ok(false);
        }

        let n = ring.len();
        let ids: Vec<EdgeIdx> = ring
            .iter()
            .map(|&i| self.edges.claim_with(|e| e.curr = pts[i]))
            .collect();
        for (k, &id) in ids.iter().enumerate() {
            let e = &mut self.edges[id];
            e.next = ids[(k + 1) % n];
            e.prev = ids[(k + n - 1) % n];
        }
        let start = ids[0];

        if !closed {
            self.has_open_paths = true;
            let last = self.edges[start].prev;
            self.edges[last].out = OutSlot::Skip;
        }

        for &id in &ids {
            self.init_edge(id, poly_type);
        }

        if is_flat {
            self.add_flat_open_path(start);
        } else {
            self.add_bounds(start, closed);
        }
        log::trace!(
            "added {} path of {n} edges as {poly_type:?}",
            if closed { "closed" } else { "open" }
        );
        Ok(true)
    }

    /// Removes duplicate and collinear vertices, returning the surviving
    /// indices in ring order, or `None` if the path collapses.
    fn reduce_ring(&self, pts: &[IntPoint], closed: bool) -> Option<Vec<usize>> {
        fn unlink(i: usize, next: &mut [usize], prev: &mut [usize]) {
            let (p, nx) = (prev[i], next[i]);
            next[p] = nx;
            prev[nx] = p;
        }

        let n = pts.len();
        let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
        let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
        let mut e_start = 0;
        let mut e = 0;
        let mut loop_stop = 0;
        loop {
            if pts[e] == pts[next[e]] && (closed || next[e] != e_start) {
                if e == next[e] {
                    break;
                }
                if e == e_start {
                    e_start = next[e];
                }
                let nx = next[e];
                unlink(e, &mut next, &mut prev);
                e = nx;
                loop_stop = e;
                continue;
            }
            if prev[e] == next[e] {
                break;
            }
            if closed
                && slopes_equal3(pts[prev[e]], pts[e], pts[next[e]])
                && (!self.options.preserve_collinear
                    || !pt2_is_between_pt1_and_pt3(pts[prev[e]], pts[e], pts[next[e]]))
            {
                if e == e_start {
                    e_start = next[e];
                }
                let p = prev[e];
                unlink(e, &mut next, &mut prev);
                e = p;
                loop_stop = e;
                continue;
            }
            e = next[e];
            if e == loop_stop || (!closed && next[e] == e_start) {
                break;
            }
        }

        if (!closed && e == next[e]) || (closed && prev[e] == next[e]) {
            return None;
        }

        let mut ring = vec![e_start];
        let mut i = next[e_start];
        while i != e_start {
            ring.push(i);
            i = next[i];
        }
        Some(ring)
    }

    fn init_edge(&mut self, e: EdgeIdx, poly_type: PolyType) {
        let next_curr = self.edges[self.edges[e].next].curr;
        let edge = &mut self.edges[e];
        if edge.curr.y >= next_curr.y {
            edge.bot = edge.curr;
            edge.top = next_curr;
        } else {
            edge.top = edge.curr;
            edge.bot = next_curr;
        }
        edge.set_dx();
        edge.poly_type = poly_type;
    }

    /// An open path with no height becomes a single right bound.
    fn add_flat_open_path(&mut self, start: EdgeIdx) {
        let mut e = start;
        let start_prev = self.edges[e].prev;
        self.edges[start_prev].out = OutSlot::Skip;
        let lm = LocalMinima {
            y: self.edges[e].bot.y,
            left_bound: None,
            right_bound: Some(e),
        };
        self.edges[e].side = Side::Right;
        self.edges[e].wind_delta = 0;
        loop {
            let prev = self.edges[e].prev;
            if self.edges[e].bot.x != self.edges[prev].top.x {
                self.edges[e].reverse_horizontal();
            }
            let next = self.edges[e].next;
            if self.edges[next].out == OutSlot::Skip {
                break;
            }
            self.edges[e].next_in_lml = Some(next);
            e = next;
        }
        self.minima.push(lm);
    }

    fn add_bounds(&mut self, start: EdgeIdx, closed: bool) {
        let mut e = start;
        let start_prev = self.edges[e].prev;
        if self.edges[start_prev].bot == self.edges[start_prev].top {
            e = self.edges[e].next;
        }
        let mut e_min: Option<EdgeIdx> = None;
        loop {
            e = self.find_next_loc_min(e);
            if Some(e) == e_min {
                break;
            }
            if e_min.is_none() {
                e_min = Some(e);
            }

            let e_prev = self.edges[e].prev;
            let (left, right, left_is_forward) = if self.edges[e].dx < self.edges[e_prev].dx {
                (e_prev, e, false)
            } else {
                (e, e_prev, true)
            };
            let wind_delta = if !closed {
                0
            } else if self.edges[left].next == right {
                -1
            } else {
                1
            };
            self.edges[left].wind_delta = wind_delta;
            self.edges[right].wind_delta = -wind_delta;
            let y = self.edges[e].bot.y;

            let mut after_left = self.process_bound(left, left_is_forward);
            if self.edges[after_left].out == OutSlot::Skip {
                after_left = self.process_bound(after_left, left_is_forward);
            }
            let mut after_right = self.process_bound(right, !left_is_forward);
            if self.edges[after_right].out == OutSlot::Skip {
                after_right = self.process_bound(after_right, !left_is_forward);
            }

            let mut lm = LocalMinima {
                y,
                left_bound: Some(left),
                right_bound: Some(right),
            };
            if self.edges[left].out == OutSlot::Skip {
                lm.left_bound = None;
            } else if self.edges[right].out == OutSlot::Skip {
                lm.right_bound = None;
            }
            self.minima.push(lm);

            e = if left_is_forward {
                after_left
            } else {
                after_right
            };
        }
    }

    fn find_next_loc_min(&self, mut e: EdgeIdx) -> EdgeIdx {
        let edges = &self.edges;
        loop {
            while edges[e].bot != edges[edges[e].prev].bot || edges[e].curr == edges[e].top {
                e = edges[e].next;
            }
            if !edges[e].is_horizontal() && !edges[edges[e].prev].is_horizontal() {
                break;
            }
            while edges[edges[e].prev].is_horizontal() {
                e = edges[e].prev;
            }
            let e2 = e;
            while edges[e].is_horizontal() {
                e = edges[e].next;
            }
            if edges[e].top.y == edges[edges[e].prev].bot.y {
                // just an intermediate horizontal
                continue;
            }
            if edges[edges[e2].prev].bot.x < edges[e].bot.x {
                e = e2;
            }
            break;
        }
        e
    }

    /// Links up one bound starting at `e`, returning the edge after it.
    fn process_bound(&mut self, mut e: EdgeIdx, next_is_forward: bool) -> EdgeIdx {
        let mut result = e;

        if self.edges[e].out == OutSlot::Skip {
            // The phantom edge of an open path: skip it, unless the edges
            // after it form a bound on their own.
            let mut e2;
            if next_is_forward {
                e2 = e;
                while self.edges[e2].top.y == self.edges[self.edges[e2].next].bot.y {
                    e2 = self.edges[e2].next;
                }
                while e2 != e && self.edges[e2].is_horizontal() {
                    e2 = self.edges[e2].prev;
                }
            } else {
                e2 = e;
                while self.edges[e2].top.y == self.edges[self.edges[e2].prev].bot.y {
                    e2 = self.edges[e2].prev;
                }
                while e2 != e && self.edges[e2].is_horizontal() {
                    e2 = self.edges[e2].next;
                }
            }
            if e2 == e {
                result = if next_is_forward {
                    self.edges[e2].next
                } else {
                    self.edges[e2].prev
                };
            } else {
                e = if next_is_forward {
                    self.edges[e].next
                } else {
                    self.edges[e].prev
                };
                let lm = LocalMinima {
                    y: self.edges[e].bot.y,
                    left_bound: None,
                    right_bound: Some(e),
                };
                self.edges[e].wind_delta = 0;
                result = self.process_bound(e, next_is_forward);
                self.minima.push(lm);
            }
            return result;
        }

        if self.edges[e].is_horizontal() {
            // Horizontals at the start of a bound are ordered so that they
            // continue on from the previous edge.
            let start = if next_is_forward {
                self.edges[e].prev
            } else {
                self.edges[e].next
            };
            if self.edges[start].is_horizontal() {
                if self.edges[start].bot.x != self.edges[e].bot.x
                    && self.edges[start].top.x != self.edges[e].bot.x
                {
                    self.edges[e].reverse_horizontal();
                }
            } else if self.edges[start].bot.x != self.edges[e].bot.x {
                self.edges[e].reverse_horizontal();
            }
        }

        let e_start = e;
        if next_is_forward {
            while self.edges[result].top.y == self.edges[self.edges[result].next].bot.y
                && self.edges[self.edges[result].next].out != OutSlot::Skip
            {
                result = self.edges[result].next;
            }
            if self.edges[result].is_horizontal()
                && self.edges[self.edges[result].next].out != OutSlot::Skip
            {
                // Don't end a bound on a horizontal edge that also starts the
                // next bound.
                let mut horz = result;
                while self.edges[self.edges[horz].prev].is_horizontal() {
                    horz = self.edges[horz].prev;
                }
                let horz_prev = self.edges[horz].prev;
                let result_next = self.edges[result].next;
                if self.edges[horz_prev].top.x > self.edges[result_next].top.x {
                    result = horz_prev;
                }
            }
            while e != result {
                let next = self.edges[e].next;
                self.edges[e].next_in_lml = Some(next);
                if self.edges[e].is_horizontal()
                    && e != e_start
                    && self.edges[e].bot.x != self.edges[self.edges[e].prev].top.x
                {
                    self.edges[e].reverse_horizontal();
                }
                e = next;
            }
            if self.edges[e].is_horizontal()
                && e != e_start
                && self.edges[e].bot.x != self.edges[self.edges[e].prev].top.x
            {
                self.edges[e].reverse_horizontal();
            }
            self.edges[result].next
        } else {
            while self.edges[result].top.y == self.edges[self.edges[result].prev].bot.y
                && self.edges[self.edges[result].prev].out != OutSlot::Skip
            {
                result = self.edges[result].prev;
            }
            if self.edges[result].is_horizontal()
                && self.edges[self.edges[result].prev].out != OutSlot::Skip
            {
                let mut horz = result;
                while self.edges[self.edges[horz].next].is_horizontal() {
                    horz = self.edges[horz].next;
                }
                let horz_next = self.edges[horz].next;
                let result_prev = self.edges[result].prev;
                if self.edges[horz_next].top.x == self.edges[result_prev].top.x
                    || self.edges[horz_next].top.x > self.edges[result_prev].top.x
                {
                    result = horz_next;
                }
            }
            while e != result {
                let prev = self.edges[e].prev;
                self.edges[e].next_in_lml = Some(prev);
                if self.edges[e].is_horizontal()
                    && e != e_start
                    && self.edges[e].bot.x != self.edges[self.edges[e].next].top.x
                {
                    self.edges[e].reverse_horizontal();
                }
                e = prev;
            }
            if self.edges[e].is_horizontal()
                && e != e_start
                && self.edges[e].bot.x != self.edges[self.edges[e].next].top.x
            {
                self.edges[e].reverse_horizontal();
            }
            self.edges[result].prev
        }
    }

    /// Prepares the minima and scanbeam for a new sweep.
    pub(super) fn reset(&mut self) {
        // Stable, so that minima at the same height keep their insertion order.
        self.minima.sort_by(|a, b| b.y.cmp(&a.y));
        self.current_lm = 0;
        self.scanbeam.clear();
        for lm in &self.minima {
            self.scanbeam.push(lm.y);
            if let Some(e) = lm.left_bound {
                let edge = &mut self.edges[e];
                edge.curr = edge.bot;
                edge.side = Side::Left;
                edge.out = OutSlot::Unassigned;
            }
            if let Some(e) = lm.right_bound {
                let edge = &mut self.edges[e];
                edge.curr = edge.bot;
                edge.side = Side::Right;
                edge.out = OutSlot::Unassigned;
            }
        }
        self.active_edges = None;
        self.sorted_edges = None;
    }

    pub(super) fn pop_local_minima(&mut self, y: i64) -> Option<LocalMinima> {
        let lm = *self.minima.get(self.current_lm)?;
        if lm.y != y {
            return None;
        }
        self.current_lm += 1;
        Some(lm)
    }

    pub(super) fn has_local_minima(&self) -> bool {
        self.current_lm < self.minima.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    #[test]
    fn degenerate_paths_are_rejected() {
        let mut c = Clipper::new();
        assert_eq!(c.add_path(&[], PolyType::Subject, true), Ok(false));
        assert_eq!(
            c.add_path(&[p(0, 0), p(1, 1)], PolyType::Subject, true),
            Ok(false)
        );
        assert_eq!(
            c.add_path(&[p(0, 0), p(5, 5), p(10, 10)], PolyType::Subject, true),
            Ok(false)
        );
        assert_eq!(
            c.add_path(&[p(0, 0), p(0, 0), p(0, 0)], PolyType::Subject, false),
            Ok(false)
        );
        assert_eq!(
            c.add_path(&[p(0, 3), p(5, 3), p(9, 3)], PolyType::Subject, true),
            Ok(false)
        );
        assert!(c.edges.is_empty());
        assert!(c.bounds().is_none());
    }

    #[test]
    fn open_clip_is_an_error() {
        let mut c = Clipper::new();
        assert_eq!(
            c.add_path(&[p(0, 0), p(1, 1)], PolyType::Clip, false),
            Err(Error::OpenClipPath)
        );
    }

    #[test]
    fn out_of_range() {
        let mut c = Clipper::new();
        let bad = p(num::HI_RANGE + 1, 0);
        assert_eq!(
            c.add_path(&[p(0, 0), bad, p(0, 10)], PolyType::Subject, true),
            Err(Error::CoordinateOutOfRange(bad))
        );
        assert!(c.edges.is_empty());
    }

    #[test]
    fn square_has_one_minimum() {
        let mut c = Clipper::new();
        let square = [p(0, 0), p(10, 0), p(10, 10), p(0, 10)];
        assert_eq!(c.add_path(&square, PolyType::Subject, true), Ok(true));
        assert_eq!(c.edges.len(), 4);
        assert_eq!(c.minima.len(), 1);
        assert_eq!(c.minima[0].y, 10);
        let left = c.minima[0].left_bound.unwrap();
        let right = c.minima[0].right_bound.unwrap();
        assert_eq!(c.edges[left].bot, p(0, 10));
        assert_eq!(c.edges[right].bot.y, 10);
        assert_eq!(c.edges[left].wind_delta, -c.edges[right].wind_delta);
    }

    #[test]
    fn collinear_vertices_are_dropped() {
        let mut c = Clipper::new();
        let square = [p(0, 0), p(5, 0), p(10, 0), p(10, 10), p(0, 10), p(0, 10)];
        assert_eq!(c.add_path(&square, PolyType::Subject, true), Ok(true));
        assert_eq!(c.edges.len(), 4);

        let mut c = Clipper::new();
        c.set_options(crate::ClipOptions {
            preserve_collinear: true,
            ..Default::default()
        });
        assert_eq!(c.add_path(&square, PolyType::Subject, true), Ok(true));
        assert_eq!(c.edges.len(), 5);
    }

    #[test]
    fn spikes_are_dropped_even_when_preserving() {
        let mut c = Clipper::new();
        c.set_options(crate::ClipOptions {
            preserve_collinear: true,
            ..Default::default()
        });
        let spiky = [p(0, 0), p(10, 0), p(20, 0), p(10, 0), p(10, 10)];
        assert_eq!(c.add_path(&spiky, PolyType::Subject, true), Ok(true));
        assert!(c.edges.len() <= 4);
    }

    #[test]
    fn open_path_minima() {
        let mut c = Clipper::new();
        let zigzag = [p(0, 0), p(10, 10), p(20, 0), p(30, 10)];
        assert_eq!(c.add_path(&zigzag, PolyType::Subject, false), Ok(true));
        assert!(c.has_open_paths());
        let skipped = c.edges.iter().filter(|(_, e)| e.out == OutSlot::Skip).count();
        assert_eq!(skipped, 1);
        assert!(c
            .minima
            .iter()
            .all(|lm| lm.left_bound.is_some() || lm.right_bound.is_some()));
        for (_, e) in c.edges.iter() {
            if e.out != OutSlot::Skip {
                assert_eq!(e.wind_delta, 0);
            }
        }
    }

    #[test]
    fn flat_open_path() {
        let mut c = Clipper::new();
        let line = [p(0, 5), p(10, 5), p(20, 5)];
        assert_eq!(c.add_path(&line, PolyType::Subject, false), Ok(true));
        assert_eq!(c.minima.len(), 1);
        assert!(c.minima[0].left_bound.is_none());
        assert_eq!(
            c.bounds(),
            Some(crate::IntRect {
                left: 0,
                top: 5,
                right: 20,
                bottom: 5
            })
        );
    }

    #[test]
    fn between() {
        assert!(pt2_is_between_pt1_and_pt3(p(0, 0), p(1, 0), p(2, 0)));
        assert!(!pt2_is_between_pt1_and_pt3(p(0, 0), p(3, 0), p(2, 0)));
        assert!(pt2_is_between_pt1_and_pt3(p(0, 2), p(0, 1), p(0, 0)));
        assert!(!pt2_is_between_pt1_and_pt3(p(0, 0), p(0, 0), p(2, 0)));
    }
}
