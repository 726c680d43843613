use nalgebra::{
    allocator::Allocator, Const, DefaultAllocator, DimName, Matrix4, OPoint, OVector, Point3,
    Vector4,
};

use crate::misc::FloatingPoint;

/// Represents a ray in D dimensions.
/// The direction is expected to be normalized; distances are measured along it.
#[derive(Clone, Debug)]
pub struct Ray<T: FloatingPoint, D>
where
    D: DimName,
    DefaultAllocator: Allocator<D>,
{
    pub(crate) origin: OPoint<T, D>,
    pub(crate) direction: OVector<T, D>,
}

/// 3D ray alias
pub type Ray3D<T> = Ray<T, Const<3>>;

impl<T: FloatingPoint, D> Ray<T, D>
where
    D: DimName,
    DefaultAllocator: Allocator<D>,
{
    pub fn new(origin: OPoint<T, D>, direction: OVector<T, D>) -> Self {
        Self { origin, direction }
    }

    pub fn origin(&self) -> &OPoint<T, D> {
        &self.origin
    }

    pub fn direction(&self) -> &OVector<T, D> {
        &self.direction
    }

    pub fn point_at(&self, t: T) -> OPoint<T, D> {
        &self.origin + &self.direction * t
    }

    /// Finds the distance along the ray to a sphere.
    /// Returns the entry distance, or the exit distance when the origin lies inside the sphere.
    /// Hits at (or behind) the origin are rejected.
    /// # Example
    /// ```
    /// use curve_scene::prelude::*;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let ray = Ray::new(Point3::origin(), Vector3::z());
    /// let hit = ray.intersect_sphere(&Point3::new(0., 0., 5.), 1.);
    /// assert_eq!(hit, Some(4.));
    /// assert!(ray.intersect_sphere(&Point3::new(0., 0., -5.), 1.).is_none());
    /// ```
    pub fn intersect_sphere(&self, center: &OPoint<T, D>, radius: T) -> Option<T> {
        let eps = T::default_epsilon();
        let diff = center - &self.origin;
        let t0 = diff.dot(&self.direction);
        let d2 = diff.dot(&diff) - t0 * t0;
        let r2 = radius * radius;

        // The ray passes outside the sphere.
        if d2 > r2 {
            return None;
        }

        let t1 = (r2 - d2).sqrt();
        let distance = if t0 > t1 + eps { t0 - t1 } else { t0 + t1 };
        if distance > eps {
            Some(distance)
        } else {
            None
        }
    }
}

impl<T: FloatingPoint> Ray3D<T> {
    /// Build a picking ray through a point given in normalized device coordinates.
    /// The near and far points are un-projected by the inverse view-projection matrix,
    /// the ray starts at `eye` and points from the near point towards the far point.
    /// Returns `None` if the matrix is singular or the projection degenerates.
    pub fn try_pick(view_projection: &Matrix4<T>, ndc_x: T, ndc_y: T, eye: Point3<T>) -> Option<Self> {
        let inv = view_projection.try_inverse()?;
        let near = inv * Vector4::new(ndc_x, ndc_y, -T::one(), T::one());
        let far = inv * Vector4::new(ndc_x, ndc_y, T::one(), T::one());

        let eps = T::default_epsilon();
        if near.w.abs() < eps || far.w.abs() < eps {
            return None;
        }

        let dir = far.xyz() / far.w - near.xyz() / near.w;
        let norm = dir.norm();
        if norm < eps {
            return None;
        }

        Some(Self::new(eye, dir / norm))
    }
}
