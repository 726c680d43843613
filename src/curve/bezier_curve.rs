use nalgebra::Point3;

use crate::misc::FloatingPoint;

/// Default number of sampled intervals of a Bezier curve
pub const DEFAULT_BEZIER_RESOLUTION: usize = 64;

/// Polynomial Bezier curve defined by all of its control points,
/// its degree is the number of control points - 1
#[derive(Clone, Debug)]
pub struct BezierCurve<T: FloatingPoint> {
    control_points: Vec<Point3<T>>,
    resolution: usize,
    samples: Vec<Point3<T>>,
}

impl<T: FloatingPoint> Default for BezierCurve<T> {
    fn default() -> Self {
        Self {
            control_points: vec![],
            resolution: DEFAULT_BEZIER_RESOLUTION,
            samples: vec![],
        }
    }
}

impl<T: FloatingPoint> BezierCurve<T> {
    pub fn new(control_points: Vec<Point3<T>>) -> Self {
        let mut curve = Self::default();
        curve.set_control_points(control_points);
        curve
    }

    pub fn control_points(&self) -> &[Point3<T>] {
        &self.control_points
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Polyline produced by the last rebuild
    pub fn samples(&self) -> &[Point3<T>] {
        &self.samples
    }

    pub fn set_control_points(&mut self, control_points: Vec<Point3<T>>) {
        self.control_points = control_points;
        self.rebuild();
    }

    /// Set the number of sampled intervals (at least 2)
    pub fn set_resolution(&mut self, resolution: usize) {
        self.resolution = resolution.max(2);
        self.rebuild();
    }

    /// Evaluate the curve at `t` in [0, 1]
    pub fn point_at(&self, t: T) -> Point3<T> {
        de_casteljau(&self.control_points, t)
    }

    /// Resample the curve into `resolution + 1` points, nothing with less than 2 control points
    pub fn rebuild(&mut self) {
        self.samples = sample_bezier(&self.control_points, self.resolution);
    }
}

/// Sample `resolution + 1` evenly spaced points of a Bezier curve
/// Returns nothing with less than 2 control points
pub fn sample_bezier<T: FloatingPoint>(control_points: &[Point3<T>], resolution: usize) -> Vec<Point3<T>> {
    if control_points.len() < 2 {
        return vec![];
    }
    let resolution = resolution.max(1);
    let inv = T::one() / T::from_usize(resolution).unwrap();
    (0..=resolution)
        .map(|i| de_casteljau(control_points, T::from_usize(i).unwrap() * inv))
        .collect()
}

/// Evaluate a Bezier curve of any degree by repeated linear interpolation
/// Returns the origin for an empty control polygon
/// # Example
/// ```
/// use curve_scene::prelude::*;
/// use nalgebra::Point3;
/// let pts = [Point3::new(0., 0., 0.), Point3::new(1., 2., 0.), Point3::new(2., 0., 0.)];
/// assert_eq!(de_casteljau(&pts, 0.5), Point3::new(1., 1., 0.));
/// ```
pub fn de_casteljau<T: FloatingPoint>(control_points: &[Point3<T>], t: T) -> Point3<T> {
    let mut tmp = control_points.to_vec();
    let n = tmp.len();
    for r in 1..n {
        for i in 0..(n - r) {
            tmp[i] = tmp[i].lerp(&tmp[i + 1], t);
        }
    }
    tmp.first().copied().unwrap_or_else(Point3::origin)
}

/// Build a line list connecting consecutive control points
/// each segment contributes its two end points
pub fn control_lines<T: FloatingPoint>(control_points: &[Point3<T>]) -> Vec<Point3<T>> {
    control_points
        .windows(2)
        .flat_map(|pair| [pair[0], pair[1]])
        .collect()
}
