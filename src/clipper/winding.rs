//! Winding counts and the contribution test.

use super::records::EdgeIdx;
use super::Clipper;
use crate::{ClipType, FillRule, PolyType};

/// Whether a region with winding count `wind` (as tracked in `wind_cnt2`)
/// is inside a polygon set filled with `rule`.
fn inside_other(rule: FillRule, wind: i32) -> bool {
    match rule {
        FillRule::EvenOdd | FillRule::NonZero => wind != 0,
        FillRule::Positive => wind > 0,
        FillRule::Negative => wind < 0,
    }
}

impl Clipper {
    /// The fill rules for an edge's own polygon type and for the other one.
    pub(super) fn fill_rules(&self, poly_type: PolyType) -> (FillRule, FillRule) {
        match poly_type {
            PolyType::Subject => (self.subj_fill, self.clip_fill),
            PolyType::Clip => (self.clip_fill, self.subj_fill),
        }
    }

    pub(super) fn is_even_odd_fill(&self, e: EdgeIdx) -> bool {
        self.fill_rules(self.edges[e].poly_type).0 == FillRule::EvenOdd
    }

    pub(super) fn is_even_odd_alt_fill(&self, e: EdgeIdx) -> bool {
        self.fill_rules(self.edges[e].poly_type).1 == FillRule::EvenOdd
    }

    /// Computes `wind_cnt` and `wind_cnt2` for an edge just inserted into the AEL.
    pub(super) fn set_winding_count(&mut self, edge: EdgeIdx) {
        let this = &self.edges[edge];
        let (poly_type, wind_delta) = (this.poly_type, this.wind_delta);

        // The closest preceding edge of the same type that isn't open.
        let mut e = this.prev_in_ael;
        while let Some(idx) = e {
            let other = &self.edges[idx];
            if other.poly_type == poly_type && other.wind_delta != 0 {
                break;
            }
            e = other.prev_in_ael;
        }

        let (wind_cnt, mut wind_cnt2, mut e) = match e {
            None => {
                let wind_cnt = if wind_delta == 0 {
                    if self.fill_rules(poly_type).0 == FillRule::Negative {
                        -1
                    } else {
                        1
                    }
                } else {
                    wind_delta
                };
                (wind_cnt, 0, self.active_edges)
            }
            Some(prev) => {
                let p = &self.edges[prev];
                let wind_cnt = if wind_delta == 0 && self.clip_type != ClipType::Union {
                    1
                } else if self.is_even_odd_fill(edge) {
                    if wind_delta == 0 {
                        // An open path inside a closed polygon of the same
                        // type gets 0, outside it gets 1.
                        let mut inside = true;
                        let mut e2 = p.prev_in_ael;
                        while let Some(idx) = e2 {
                            let q = &self.edges[idx];
                            if q.poly_type == p.poly_type && q.wind_delta != 0 {
                                inside = !inside;
                            }
                            e2 = q.prev_in_ael;
                        }
                        if inside {
                            0
                        } else {
                            1
                        }
                    } else {
                        wind_delta
                    }
                } else if p.wind_cnt * p.wind_delta < 0 {
                    // The previous edge takes the count towards zero, so we're
                    // outside that polygon.
                    if p.wind_cnt.abs() > 1 {
                        if p.wind_delta * wind_delta < 0 {
                            p.wind_cnt
                        } else {
                            p.wind_cnt + wind_delta
                        }
                    } else if wind_delta == 0 {
                        1
                    } else {
                        wind_delta
                    }
                } else if wind_delta == 0 {
                    if p.wind_cnt < 0 {
                        p.wind_cnt - 1
                    } else {
                        p.wind_cnt + 1
                    }
                } else if p.wind_delta * wind_delta < 0 {
                    p.wind_cnt
                } else {
                    p.wind_cnt + wind_delta
                };
                (wind_cnt, p.wind_cnt2, p.next_in_ael)
            }
        };

        let even_odd_alt = self.is_even_odd_alt_fill(edge);
        while let Some(idx) = e {
            if idx == edge {
                break;
            }
            let other = &self.edges[idx];
            if even_odd_alt {
                if other.wind_delta != 0 {
                    wind_cnt2 = if wind_cnt2 == 0 { 1 } else { 0 };
                }
            } else {
                wind_cnt2 += other.wind_delta;
            }
            e = other.next_in_ael;
        }

        let this = &mut self.edges[edge];
        this.wind_cnt = wind_cnt;
        this.wind_cnt2 = wind_cnt2;
    }

    /// Whether the edge bounds the result region.
    pub(super) fn is_contributing(&self, e: EdgeIdx) -> bool {
        let edge = &self.edges[e];
        let (rule, other_rule) = self.fill_rules(edge.poly_type);

        let on_boundary_of_own = match rule {
            // An open path flagged as inside a polygon of its own type.
            FillRule::EvenOdd => !(edge.wind_delta == 0 && edge.wind_cnt != 1),
            FillRule::NonZero => edge.wind_cnt.abs() == 1,
            FillRule::Positive => edge.wind_cnt == 1,
            FillRule::Negative => edge.wind_cnt == -1,
        };
        if !on_boundary_of_own {
            return false;
        }

        let inside = inside_other(other_rule, edge.wind_cnt2);
        match self.clip_type {
            ClipType::Intersection => inside,
            ClipType::Union => !inside,
            ClipType::Difference => match edge.poly_type {
                PolyType::Subject => !inside,
                PolyType::Clip => inside,
            },
            // Closed edges always bound a xor; open ones only outside the clip.
            ClipType::Xor => edge.wind_delta != 0 || !inside,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IntPoint;

    fn vertical(c: &mut Clipper, x: i64, poly_type: PolyType, wind_delta: i32) -> EdgeIdx {
        let e = c.edges.claim_with(|e| {
            e.bot = IntPoint::new(x, 10);
            e.curr = e.bot;
            e.top = IntPoint::new(x, 0);
            e.set_dx();
            e.poly_type = poly_type;
            e.wind_delta = wind_delta;
        });
        c.insert_edge_into_ael(e, None);
        c.set_winding_count(e);
        e
    }

    #[test]
    fn nested_non_zero() {
        let mut c = Clipper::new();
        c.subj_fill = FillRule::NonZero;
        let a = vertical(&mut c, 0, PolyType::Subject, 1);
        let b = vertical(&mut c, 10, PolyType::Subject, 1);
        let k = vertical(&mut c, 20, PolyType::Clip, -1);
        assert_eq!(c.edges[a].wind_cnt, 1);
        assert_eq!(c.edges[b].wind_cnt, 2);
        assert_eq!(c.edges[k].wind_cnt, -1);
        assert_eq!(c.edges[k].wind_cnt2, 2);

        c.clip_type = ClipType::Union;
        assert!(c.is_contributing(a));
        assert!(!c.is_contributing(b));
        assert!(!c.is_contributing(k));
        c.clip_type = ClipType::Intersection;
        assert!(c.is_contributing(k));
    }

    #[test]
    fn even_odd_alternates() {
        let mut c = Clipper::new();
        let a = vertical(&mut c, 0, PolyType::Clip, 1);
        let b = vertical(&mut c, 5, PolyType::Clip, 1);
        let s = vertical(&mut c, 10, PolyType::Subject, 1);
        assert_eq!(c.edges[a].wind_cnt, 1);
        assert_eq!(c.edges[b].wind_cnt, 1);
        assert_eq!(c.edges[s].wind_cnt2, 0);
        c.clip_type = ClipType::Difference;
        assert!(c.is_contributing(s));
    }

    #[test]
    fn open_edges() {
        let mut c = Clipper::new();
        c.clip_type = ClipType::Intersection;
        let k = vertical(&mut c, 0, PolyType::Clip, 1);
        let o = vertical(&mut c, 5, PolyType::Subject, 0);
        assert_eq!(c.edges[o].wind_cnt, 1);
        assert_eq!(c.edges[o].wind_cnt2, 1);
        assert!(c.is_contributing(o));
        c.clip_type = ClipType::Difference;
        assert!(!c.is_contributing(o));
        // No subject around the clip edge.
        assert!(!c.is_contributing(k));
    }

    #[test]
    fn negative_fill() {
        assert!(inside_other(FillRule::Negative, -2));
        assert!(!inside_other(FillRule::Negative, 1));
        assert!(inside_other(FillRule::Positive, 1));
        assert!(inside_other(FillRule::EvenOdd, 1));
        assert!(!inside_other(FillRule::NonZero, 0));
    }
}
