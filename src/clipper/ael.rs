//! The active edge list and the sorted edge list.
//!
//! Both are intrusive doubly linked lists threaded through the edge pool. The
//! active edge list (AEL) holds every edge crossing the current scanbeam,
//! ordered by `x`; the sorted edge list (SEL) is scratch space for horizontal
//! processing and intersection sorting. They share their manipulation code.

use super::records::{Edge, EdgeIdx};
use super::Clipper;
use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum List {
    Active,
    Sorted,
}

impl List {
    fn next(self, e: &Edge) -> Option<EdgeIdx> {
        match self {
            List::Active => e.next_in_ael,
            List::Sorted => e.next_in_sel,
        }
    }

    fn prev(self, e: &Edge) -> Option<EdgeIdx> {
        match self {
            List::Active => e.prev_in_ael,
            List::Sorted => e.prev_in_sel,
        }
    }

    fn set_next(self, e: &mut Edge, v: Option<EdgeIdx>) {
        match self {
            List::Active => e.next_in_ael = v,
            List::Sorted => e.next_in_sel = v,
        }
    }

    fn set_prev(self, e: &mut Edge, v: Option<EdgeIdx>) {
        match self {
            List::Active => e.prev_in_ael = v,
            List::Sorted => e.prev_in_sel = v,
        }
    }
}

/// Whether `e2` belongs before `e1` in the active edge list, given that both
/// start on the current scanline.
fn e2_inserts_before_e1(e1: &Edge, e2: &Edge) -> bool {
    if e2.curr.x == e1.curr.x {
        if e2.top.y > e1.top.y {
            e2.top.x < e1.top_x(e2.top.y)
        } else {
            e1.top.x > e2.top_x(e1.top.y)
        }
    } else {
        e2.curr.x < e1.curr.x
    }
}

impl Clipper {
    fn head(&self, list: List) -> Option<EdgeIdx> {
        match list {
            List::Active => self.active_edges,
            List::Sorted => self.sorted_edges,
        }
    }

    fn set_head(&mut self, list: List, v: Option<EdgeIdx>) {
        match list {
            List::Active => self.active_edges = v,
            List::Sorted => self.sorted_edges = v,
        }
    }

    /// Inserts `edge` into the AEL, searching forward from `start` if given.
    pub(super) fn insert_edge_into_ael(&mut self, edge: EdgeIdx, start: Option<EdgeIdx>) {
        let Some(head) = self.active_edges else {
            self.edges[edge].prev_in_ael = None;
            self.edges[edge].next_in_ael = None;
            self.active_edges = Some(edge);
            return;
        };
        if start.is_none() && e2_inserts_before_e1(&self.edges[head], &self.edges[edge]) {
            self.edges[edge].prev_in_ael = None;
            self.edges[edge].next_in_ael = Some(head);
            self.edges[head].prev_in_ael = Some(edge);
            self.active_edges = Some(edge);
            return;
        }
        let mut s = start.unwrap_or(head);
        while let Some(next) = self.edges[s].next_in_ael {
            if e2_inserts_before_e1(&self.edges[next], &self.edges[edge]) {
                break;
            }
            s = next;
        }
        let next = self.edges[s].next_in_ael;
        self.edges[edge].next_in_ael = next;
        if let Some(next) = next {
            self.edges[next].prev_in_ael = Some(edge);
        }
        self.edges[edge].prev_in_ael = Some(s);
        self.edges[s].next_in_ael = Some(edge);
    }

    pub(super) fn delete_from(&mut self, e: EdgeIdx, list: List) {
        let prev = list.prev(&self.edges[e]);
        let next = list.next(&self.edges[e]);
        if prev.is_none() && next.is_none() && self.head(list) != Some(e) {
            // already deleted
            return;
        }
        match prev {
            Some(p) => list.set_next(&mut self.edges[p], next),
            None => self.set_head(list, next),
        }
        if let Some(n) = next {
            list.set_prev(&mut self.edges[n], prev);
        }
        list.set_next(&mut self.edges[e], None);
        list.set_prev(&mut self.edges[e], None);
    }

    pub(super) fn swap_positions(&mut self, e1: EdgeIdx, e2: EdgeIdx, list: List) {
        let detached = |c: &Self, e: EdgeIdx| {
            list.next(&c.edges[e]).is_none() && list.prev(&c.edges[e]).is_none()
        };
        if detached(self, e1) || detached(self, e2) {
            return;
        }

        let e1_next = list.next(&self.edges[e1]);
        let e1_prev = list.prev(&self.edges[e1]);
        let e2_next = list.next(&self.edges[e2]);
        let e2_prev = list.prev(&self.edges[e2]);

        if e1_next == Some(e2) {
            if let Some(n) = e2_next {
                list.set_prev(&mut self.edges[n], Some(e1));
            }
            if let Some(p) = e1_prev {
                list.set_next(&mut self.edges[p], Some(e2));
            }
            list.set_prev(&mut self.edges[e2], e1_prev);
            list.set_next(&mut self.edges[e2], Some(e1));
            list.set_prev(&mut self.edges[e1], Some(e2));
            list.set_next(&mut self.edges[e1], e2_next);
        } else if e2_next == Some(e1) {
            if let Some(n) = e1_next {
                list.set_prev(&mut self.edges[n], Some(e2));
            }
            if let Some(p) = e2_prev {
                list.set_next(&mut self.edges[p], Some(e1));
            }
            list.set_prev(&mut self.edges[e1], e2_prev);
            list.set_next(&mut self.edges[e1], Some(e2));
            list.set_prev(&mut self.edges[e2], Some(e1));
            list.set_next(&mut self.edges[e2], e1_next);
        } else {
            list.set_next(&mut self.edges[e1], e2_next);
            if let Some(n) = e2_next {
                list.set_prev(&mut self.edges[n], Some(e1));
            }
            list.set_prev(&mut self.edges[e1], e2_prev);
            if let Some(p) = e2_prev {
                list.set_next(&mut self.edges[p], Some(e1));
            }
            list.set_next(&mut self.edges[e2], e1_next);
            if let Some(n) = e1_next {
                list.set_prev(&mut self.edges[n], Some(e2));
            }
            list.set_prev(&mut self.edges[e2], e1_prev);
            if let Some(p) = e1_prev {
                list.set_next(&mut self.edges[p], Some(e2));
            }
        }

        if list.prev(&self.edges[e1]).is_none() {
            self.set_head(list, Some(e1));
        } else if list.prev(&self.edges[e2]).is_none() {
            self.set_head(list, Some(e2));
        }
    }

    /// Replaces `e` in the AEL by the next edge of its bound, which inherits
    /// its output slot, side and winding counts.
    pub(super) fn update_edge_into_ael(&mut self, e: EdgeIdx) -> Result<EdgeIdx, Error> {
        let edge = &self.edges[e];
        let Some(next) = edge.next_in_lml else {
            return Err(Error::Sweep("advanced past the end of a bound"));
        };
        let (out, side, wind_delta, wind_cnt, wind_cnt2) = (
            edge.out,
            edge.side,
            edge.wind_delta,
            edge.wind_cnt,
            edge.wind_cnt2,
        );
        let (prev_in_ael, next_in_ael) = (edge.prev_in_ael, edge.next_in_ael);

        match prev_in_ael {
            Some(p) => self.edges[p].next_in_ael = Some(next),
            None => self.active_edges = Some(next),
        }
        if let Some(n) = next_in_ael {
            self.edges[n].prev_in_ael = Some(next);
        }

        let n = &mut self.edges[next];
        n.out = out;
        n.side = side;
        n.wind_delta = wind_delta;
        n.wind_cnt = wind_cnt;
        n.wind_cnt2 = wind_cnt2;
        n.curr = n.bot;
        n.prev_in_ael = prev_in_ael;
        n.next_in_ael = next_in_ael;
        if !n.is_horizontal() {
            let top_y = n.top.y;
            self.scanbeam.push(top_y);
        }
        Ok(next)
    }

    pub(super) fn add_edge_to_sel(&mut self, e: EdgeIdx) {
        let head = self.sorted_edges;
        self.edges[e].prev_in_sel = None;
        self.edges[e].next_in_sel = head;
        if let Some(h) = head {
            self.edges[h].prev_in_sel = Some(e);
        }
        self.sorted_edges = Some(e);
    }

    pub(super) fn pop_edge_from_sel(&mut self) -> Option<EdgeIdx> {
        let e = self.sorted_edges?;
        self.delete_from(e, List::Sorted);
        Some(e)
    }

    pub(super) fn copy_ael_to_sel(&mut self) {
        self.sorted_edges = self.active_edges;
        let mut e = self.active_edges;
        while let Some(idx) = e {
            let edge = &mut self.edges[idx];
            edge.prev_in_sel = edge.prev_in_ael;
            edge.next_in_sel = edge.next_in_ael;
            e = edge.next_in_ael;
        }
    }

    /// Iterates over the AEL from left to right.
    #[cfg(test)]
    pub(super) fn active(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        std::iter::successors(self.active_edges, |&e| self.edges[e].next_in_ael)
    }

    /// Checks that the AEL and SEL are consistently linked.
    #[cfg(feature = "slow-asserts")]
    pub(super) fn check_lists(&self) {
        for list in [List::Active, List::Sorted] {
            let mut prev = None;
            let mut e = self.head(list);
            while let Some(idx) = e {
                assert_eq!(list.prev(&self.edges[idx]), prev, "{list:?} link broken at {idx:?}");
                prev = Some(idx);
                e = list.next(&self.edges[idx]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geom::IntPoint, PolyType};

    fn ael(c: &Clipper) -> Vec<EdgeIdx> {
        c.active().collect()
    }

    fn clipper_with_verticals(xs: &[i64]) -> (Clipper, Vec<EdgeIdx>) {
        let mut c = Clipper::new();
        let ids = xs
            .iter()
            .map(|&x| {
                c.edges.claim_with(|e| {
                    e.bot = IntPoint::new(x, 10);
                    e.curr = e.bot;
                    e.top = IntPoint::new(x, 0);
                    e.poly_type = PolyType::Subject;
                    e.set_dx();
                })
            })
            .collect();
        (c, ids)
    }

    #[test]
    fn insertion_sorts_by_x() {
        let (mut c, ids) = clipper_with_verticals(&[5, 1, 3, 7]);
        for &e in &ids {
            c.insert_edge_into_ael(e, None);
        }
        assert_eq!(ael(&c), vec![ids[1], ids[2], ids[0], ids[3]]);
    }

    #[test]
    fn ties_are_broken_by_direction() {
        let mut c = Clipper::new();
        let left_leaning = c.edges.claim_with(|e| {
            e.bot = IntPoint::new(0, 10);
            e.curr = e.bot;
            e.top = IntPoint::new(-5, 0);
            e.set_dx();
        });
        let right_leaning = c.edges.claim_with(|e| {
            e.bot = IntPoint::new(0, 10);
            e.curr = e.bot;
            e.top = IntPoint::new(5, 0);
            e.set_dx();
        });
        c.insert_edge_into_ael(right_leaning, None);
        c.insert_edge_into_ael(left_leaning, None);
        assert_eq!(ael(&c), vec![left_leaning, right_leaning]);
    }

    #[test]
    fn swap_and_delete() {
        let (mut c, ids) = clipper_with_verticals(&[0, 1, 2, 3]);
        for &e in &ids {
            c.insert_edge_into_ael(e, None);
        }
        c.swap_positions(ids[0], ids[1], List::Active);
        assert_eq!(ael(&c), vec![ids[1], ids[0], ids[2], ids[3]]);
        c.swap_positions(ids[3], ids[1], List::Active);
        assert_eq!(ael(&c), vec![ids[3], ids[0], ids[2], ids[1]]);
        c.delete_from(ids[3], List::Active);
        assert_eq!(ael(&c), vec![ids[0], ids[2], ids[1]]);
        // A deleted edge is ignored.
        c.delete_from(ids[3], List::Active);
        c.swap_positions(ids[3], ids[0], List::Active);
        assert_eq!(ael(&c), vec![ids[0], ids[2], ids[1]]);
    }

    #[test]
    fn sel_mirrors_ael() {
        let (mut c, ids) = clipper_with_verticals(&[0, 1, 2]);
        for &e in &ids {
            c.insert_edge_into_ael(e, None);
        }
        c.copy_ael_to_sel();
        c.swap_positions(ids[1], ids[2], List::Sorted);
        assert_eq!(c.pop_edge_from_sel(), Some(ids[0]));
        assert_eq!(c.pop_edge_from_sel(), Some(ids[2]));
        c.add_edge_to_sel(ids[0]);
        assert_eq!(c.pop_edge_from_sel(), Some(ids[0]));
        assert_eq!(c.pop_edge_from_sel(), Some(ids[1]));
        assert_eq!(c.pop_edge_from_sel(), None);
        // The AEL is untouched.
        assert_eq!(ael(&c), ids);
    }

    #[test]
    fn update_needs_a_successor() {
        let (mut c, ids) = clipper_with_verticals(&[0]);
        c.insert_edge_into_ael(ids[0], None);
        assert_eq!(
            c.update_edge_into_ael(ids[0]),
            Err(Error::Sweep("advanced past the end of a bound"))
        );
    }
}
