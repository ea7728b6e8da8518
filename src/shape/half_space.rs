//! Support mapping based HalfSpace shape.
use crate::math::{Point, Real, Vector};
use na::Unit;

/// A half-space delimited by an infinite plane.
///
/// The half-space contains every point `x` such that `normal · x <= bias`. The normal points
/// toward the outside of the half-space.
#[derive(PartialEq, Debug, Clone, Copy)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HalfSpace {
    /// The halfspace planar boundary's outward normal.
    pub normal: Unit<Vector<Real>>,
    /// The offset of the planar boundary along the normal.
    pub bias: Real,
}

impl HalfSpace {
    /// Builds a new halfspace from its outward normal and the offset of its boundary.
    #[inline]
    pub fn new(normal: Unit<Vector<Real>>, bias: Real) -> HalfSpace {
        HalfSpace { normal, bias }
    }

    /// Builds the halfspace with the given outward normal, and with a boundary passing
    /// through `point`.
    #[inline]
    pub fn from_point_and_normal(point: &Point<Real>, normal: Unit<Vector<Real>>) -> HalfSpace {
        HalfSpace {
            normal,
            bias: normal.dot(&point.coords),
        }
    }

    /// The signed distance from `pt` to the boundary of this half-space.
    ///
    /// Negative inside, positive outside.
    #[inline]
    pub fn signed_distance(&self, pt: &Point<Real>) -> Real {
        self.normal.dot(&pt.coords) - self.bias
    }

    /// The complementary half-space, sharing the same boundary.
    #[inline]
    pub fn flipped(&self) -> HalfSpace {
        HalfSpace {
            normal: -self.normal,
            bias: -self.bias,
        }
    }

    /// The orthogonal projection of `pt` on the boundary of this half-space.
    #[inline]
    pub fn project_on_boundary(&self, pt: &Point<Real>) -> Point<Real> {
        pt - *self.normal * self.signed_distance(pt)
    }
}

#[cfg(test)]
mod test {
    use super::HalfSpace;
    use crate::math::{Point, Vector};

    #[test]
    fn half_space_signed_distance() {
        let hs = HalfSpace::from_point_and_normal(&Point::new(0.0, 0.0, 2.0), Vector::z_axis());
        assert_eq!(hs.signed_distance(&Point::new(5.0, 1.0, 3.0)), 1.0);
        assert_eq!(hs.signed_distance(&Point::origin()), -2.0);
        assert_eq!(hs.flipped().signed_distance(&Point::origin()), 2.0);
        assert_eq!(
            hs.project_on_boundary(&Point::new(1.0, 1.0, 7.0)),
            Point::new(1.0, 1.0, 2.0)
        );
    }
}
