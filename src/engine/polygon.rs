use glam::DVec3;
use smallvec::SmallVec;

use super::{plane::Plane, types::PixelColor};

/// Vertices closer than this to a cutting plane count as lying on it.
const NEAR_ZERO: f64 = 0.01;

pub type PolyPoints = SmallVec<[DVec3; 8]>;

/// Convex wall fragment.  Insertion order is the winding order and is never
/// rearranged by clipping.
#[derive(Clone, Debug, PartialEq)]
pub struct WallPolygon {
    pub points: PolyPoints,
    pub color: PixelColor,
}

impl WallPolygon {
    pub fn new(color: PixelColor) -> Self {
        Self {
            points: PolyPoints::new(),
            color,
        }
    }

    /// Floor-to-ceiling quad between the left and right wall edges, wound
    /// left-bottom, left-top, right-top, right-bottom.
    pub fn quad(left: (DVec3, DVec3), right: (DVec3, DVec3), color: PixelColor) -> Self {
        let mut poly = Self::new(color);
        poly.points.extend([left.0, left.1, right.1, right.0]);
        poly
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep only the part in front of (`keep_front`) or behind `plane`.
    pub fn crop(self, plane: &Plane, keep_front: bool) -> WallPolygon {
        self.split(plane, keep_front).0
    }

    /// Cut along `plane`.  Returns `(kept, other)` where `kept` is the front
    /// part if `keep_front` is set.  Pieces with fewer than three vertices
    /// come back empty.
    pub fn split(self, plane: &Plane, keep_front: bool) -> (WallPolygon, WallPolygon) {
        let mut front = WallPolygon::new(self.color);
        let mut back = WallPolygon::new(self.color);

        if let Some(&last) = self.points.last() {
            let mut v1 = last;
            let mut side1 = plane.distance(v1);

            for &v2 in &self.points {
                let side2 = plane.distance(v2);

                if side2 > NEAR_ZERO {
                    if side1 < -NEAR_ZERO {
                        if let Some(v) = crossing(plane, v1, v2) {
                            front.points.push(v);
                            back.points.push(v);
                        }
                    }
                    front.points.push(v2);
                } else if side2 < -NEAR_ZERO {
                    if side1 > NEAR_ZERO {
                        if let Some(v) = crossing(plane, v1, v2) {
                            front.points.push(v);
                            back.points.push(v);
                        }
                    }
                    back.points.push(v2);
                } else {
                    // on the plane: belongs to both halves
                    front.points.push(v2);
                    back.points.push(v2);
                }

                v1 = v2;
                side1 = side2;
            }
        }

        for half in [&mut front, &mut back] {
            if half.points.len() < 3 {
                half.points.clear();
            }
        }

        if keep_front { (front, back) } else { (back, front) }
    }
}

#[inline]
fn crossing(plane: &Plane, v1: DVec3, v2: DVec3) -> Option<DVec3> {
    plane.intersection(v1, v2).map(|u| v1 + (v2 - v1) * u)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    fn wall(bottom: f64, top: f64) -> WallPolygon {
        WallPolygon::quad(
            (dvec3(0.0, 0.0, bottom), dvec3(0.0, 0.0, top)),
            (dvec3(64.0, 0.0, bottom), dvec3(64.0, 0.0, top)),
            PixelColor::WHITE,
        )
    }

    fn z_range(p: &WallPolygon) -> (f64, f64) {
        p.points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), v| {
            (lo.min(v.z), hi.max(v.z))
        })
    }

    #[test]
    fn crop_keeps_requested_side() {
        let below = wall(0.0, 128.0).crop(&Plane::floor(32.0), false);
        assert_eq!(below.len(), 4);
        assert_eq!(z_range(&below), (0.0, 32.0));

        let above = wall(0.0, 128.0).crop(&Plane::floor(32.0), true);
        assert_eq!(z_range(&above), (32.0, 128.0));
    }

    #[test]
    fn crop_preserves_winding() {
        let p = wall(0.0, 128.0).crop(&Plane::ceiling(96.0), true);
        // still left-bottom, left-top, right-top, right-bottom
        assert_eq!(p.points[0], dvec3(0.0, 0.0, 0.0));
        assert_eq!(p.points[1], dvec3(0.0, 0.0, 96.0));
        assert_eq!(p.points[2], dvec3(64.0, 0.0, 96.0));
        assert_eq!(p.points[3], dvec3(64.0, 0.0, 0.0));
    }

    #[test]
    fn crop_entirely_outside_is_empty() {
        let p = wall(0.0, 32.0).crop(&Plane::floor(64.0), true);
        assert!(p.is_empty());
    }

    #[test]
    fn touching_edge_does_not_leave_a_sliver() {
        // top edge lies exactly on the plane
        let (kept, other) = wall(0.0, 64.0).split(&Plane::floor(64.0), false);
        assert_eq!(kept.len(), 4);
        assert!(other.is_empty());
    }

    #[test]
    fn sloped_cut_produces_pentagon() {
        let slope = Plane::from_points(
            dvec3(0.0, 0.0, 40.0),
            dvec3(0.0, 64.0, 40.0),
            dvec3(64.0, 0.0, 140.0),
            true,
        );
        let p = wall(0.0, 128.0).crop(&slope, false);
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn split_halves_share_the_cut() {
        let (lo, hi) = wall(0.0, 128.0).split(&Plane::floor(48.0), false);
        assert_eq!(z_range(&lo), (0.0, 48.0));
        assert_eq!(z_range(&hi), (48.0, 128.0));
        assert_eq!(lo.color, hi.color);
    }
}
