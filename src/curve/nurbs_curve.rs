use nalgebra::{Point3, Point4};
use simba::scalar::SupersetOf;

use crate::curve::rational::{dehomogenize, evaluate_point, homogenize, insert_knot_once};
use crate::knot::{KnotMultiplicity, KnotVector};
use crate::misc::FloatingPoint;

/// Default number of sampled intervals of a rebuilt curve
pub const DEFAULT_RESOLUTION: usize = 96;

/// NURBS curve representation for interactive editing
///
/// Unlike a strictly validated curve, every setter accepts transiently invalid states
/// (too few control points for the degree, knot vectors of the wrong length).
/// Such a curve simply evaluates to nothing until it becomes valid again.
/// The number of weights always equals the number of control points.
#[derive(Clone, Debug)]
pub struct NurbsCurve<T: FloatingPoint> {
    degree: usize,
    control_points: Vec<Point3<T>>,
    /// one weight per control point
    weights: Vec<T>,
    /// the length of the knot vector is equal to the `# of control points + degree + 1`
    /// whenever the curve is rebuilt
    knots: KnotVector<T>,
    /// knots are regenerated as an open uniform vector on every rebuild
    generated_knots: bool,
    /// number of sampled intervals
    resolution: usize,
    /// sampled polyline from the last rebuild
    samples: Vec<Point3<T>>,
}

impl<T: FloatingPoint> Default for NurbsCurve<T> {
    fn default() -> Self {
        Self::new(3)
    }
}

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Create an empty curve of the given degree (clamped to at least 1)
    pub fn new(degree: usize) -> Self {
        Self {
            degree: degree.max(1),
            control_points: vec![],
            weights: vec![],
            knots: KnotVector::new(vec![]),
            generated_knots: true,
            resolution: DEFAULT_RESOLUTION,
            samples: vec![],
        }
    }

    /// Create a curve and check every structural requirement up front
    /// # Failures
    /// - if the degree is zero
    /// - if the number of control points is less than the degree + 1
    /// - if the number of weights differs from the number of control points
    /// - if the number of knots is not equal to the number of control points + the degree + 1
    /// - if the knots are decreasing somewhere
    ///
    /// # Example
    /// ```
    /// use curve_scene::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let control_points = vec![
    ///     Point3::new(0., 0., 0.),
    ///     Point3::new(1., 1., 0.),
    ///     Point3::new(2., -1., 0.),
    ///     Point3::new(3., 0., 0.),
    /// ];
    /// let knots = vec![0., 0., 0., 0., 1., 1., 1., 1.];
    /// let nurbs = NurbsCurve::try_new(3, control_points.clone(), vec![1.; 4], knots);
    /// assert!(nurbs.is_ok());
    ///
    /// let invalid = NurbsCurve::try_new(3, control_points, vec![1.; 4], vec![0., 1.]);
    /// assert!(invalid.is_err());
    /// ```
    pub fn try_new(
        degree: usize,
        control_points: Vec<Point3<T>>,
        weights: Vec<T>,
        knots: Vec<T>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(degree > 0, "Degree must be at least 1");
        anyhow::ensure!(
            control_points.len() > degree,
            "Too few control points for curve"
        );
        anyhow::ensure!(
            weights.len() == control_points.len(),
            "Invalid number of weights, got {}, expected {}",
            weights.len(),
            control_points.len()
        );
        let knots = KnotVector::new(knots);
        knots.try_validate(control_points.len(), degree)?;

        let mut curve = Self {
            degree,
            control_points,
            weights,
            knots,
            generated_knots: false,
            resolution: DEFAULT_RESOLUTION,
            samples: vec![],
        };
        curve.rebuild();
        Ok(curve)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn control_points(&self) -> &[Point3<T>] {
        &self.control_points
    }

    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Polyline produced by the last rebuild
    pub fn samples(&self) -> &[Point3<T>] {
        &self.samples
    }

    /// Check if there are enough control points for the degree
    pub fn is_evaluable(&self) -> bool {
        self.control_points.len() > self.degree
    }

    pub fn set_degree(&mut self, degree: usize) {
        self.degree = degree.max(1);
        self.rebuild();
    }

    /// Replace the control points
    /// weights are resized to match, new entries default to 1
    pub fn set_control_points(&mut self, control_points: Vec<Point3<T>>) {
        self.control_points = control_points;
        self.weights.resize(self.control_points.len(), T::one());
        self.rebuild();
    }

    /// Reset every weight to 1 and overwrite the leading ones with `weights`
    /// extra weights beyond the number of control points are ignored
    pub fn set_weights(&mut self, weights: &[T]) {
        self.weights = vec![T::one(); self.control_points.len()];
        self.weights
            .iter_mut()
            .zip(weights.iter())
            .for_each(|(dst, src)| *dst = *src);
        self.rebuild();
    }

    /// Use an explicit knot vector
    /// an unsorted vector is sorted; a vector of the wrong length is replaced by a generated one on rebuild
    pub fn set_knot_vector(&mut self, knots: Vec<T>) {
        let mut knots = KnotVector::new(knots);
        if !knots.is_sorted() {
            log::warn!("knot vector is not sorted, sorting it");
            knots.sort();
        }
        self.knots = knots;
        self.generated_knots = false;
        self.rebuild();
    }

    /// Go back to an open uniform knot vector generated from the degree and the number of control points
    pub fn use_open_uniform_knots(&mut self) {
        self.generated_knots = true;
        self.rebuild();
    }

    /// Check if the knot vector is generated rather than explicit
    pub fn has_generated_knots(&self) -> bool {
        self.generated_knots
    }

    /// Set the number of sampled intervals (at least 2)
    pub fn set_resolution(&mut self, resolution: usize) {
        self.resolution = resolution.max(2);
        self.rebuild();
    }

    /// Get the parameter domain of the curve
    pub fn knots_domain(&self) -> Option<(T, T)> {
        if !self.is_evaluable() || self.knots.len() != self.expected_knot_count() {
            return None;
        }
        Some(self.knots.domain(self.degree))
    }

    /// Evaluate the curve at a given parameter
    pub fn point_at(&self, u: T) -> Point3<T> {
        evaluate_point(
            u,
            &self.control_points,
            &self.weights,
            self.degree,
            &self.knots,
        )
    }

    /// Resample the curve into `resolution + 1` points
    pub fn rebuild(&mut self) {
        self.samples.clear();
        if !self.is_evaluable() {
            return;
        }
        self.ensure_knot_vector();
        self.samples = self.sample_with(self.resolution, None);
    }

    /// Sample the curve as a non-rational B-spline (every weight is 1)
    /// Returns `samples + 1` points, `samples` is clamped to at least 2
    pub fn sample_bspline(&self, samples: usize) -> Vec<Point3<T>> {
        if !self.is_evaluable() {
            return vec![];
        }
        let unit = vec![T::one(); self.control_points.len()];
        self.sample_with(samples.max(2), Some(unit.as_slice()))
    }

    /// Sample `divs + 1` points over the domain
    /// the last parameter is pulled back by the tolerance to stay off the terminal knot
    fn sample_with(&self, divs: usize, weights: Option<&[T]>) -> Vec<Point3<T>> {
        let knots = self.resolved_knots();
        let (start, end) = knots.domain(self.degree);
        if end - start < T::tolerance() {
            return vec![];
        }

        let weights = weights.unwrap_or(self.weights.as_slice());
        let step = (end - start) / T::from_usize(divs).unwrap();
        (0..=divs)
            .map(|i| {
                let u = if i == divs {
                    end - T::tolerance()
                } else {
                    start + step * T::from_usize(i).unwrap()
                };
                evaluate_point(u, &self.control_points, weights, self.degree, &knots)
            })
            .collect()
    }

    /// Decompose the curve into the control polygons of its Bezier segments
    ///
    /// Every interior knot is raised to a multiplicity of `degree` by knot insertion,
    /// then every non-degenerate knot span yields the `degree + 1` control points it depends on.
    /// Consecutive pieces of a continuous curve share their boundary point.
    /// Returns an empty list when the curve cannot be evaluated.
    /// The extraction assumes a clamped knot vector (the generated open uniform one is).
    ///
    /// # Example
    /// ```
    /// use curve_scene::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let mut curve = NurbsCurve::new(2);
    /// curve.set_control_points((0..5).map(|i| Point3::new(i as f64, 0., 0.)).collect());
    /// let segments = curve.try_decompose_bezier_segments();
    /// assert_eq!(segments.len(), 3);
    /// assert!(segments.iter().all(|s| s.len() == 3));
    /// ```
    pub fn try_decompose_bezier_segments(&self) -> Vec<Vec<Point3<T>>> {
        if !self.is_evaluable() {
            return vec![];
        }

        let p = self.degree;
        let mut knots = self.resolved_knots();
        let mut control_points: Vec<Point4<T>> = self
            .control_points
            .iter()
            .enumerate()
            .map(|(i, pt)| homogenize(pt, self.weights.get(i).copied().unwrap_or(T::one())))
            .collect();

        let mut idx = p + 1;
        while idx + p + 1 < knots.len() {
            let u = knots[idx];
            let mult = KnotMultiplicity::new(u, knots.multiplicity_of(u));
            let missing = mult.missing(p);
            if missing > 0 {
                let before = knots.len();
                for _ in 0..missing {
                    insert_knot_once(u, p, &mut knots, &mut control_points);
                }
                // the insertion shifted the knots after idx, count again at the same position
                if knots.len() != before {
                    continue;
                }
            }
            idx += mult.multiplicity().max(1);
        }

        // the span [knots[k], knots[k + 1]) is controlled by control_points[k - p..=k]
        let m = knots.len() - 1;
        (p..(m - p))
            .filter(|k| (knots[k + 1] - knots[*k]).abs() > T::tolerance())
            .filter_map(|k| {
                control_points
                    .get((k - p)..=k)
                    .map(|segment| segment.iter().map(dehomogenize).collect())
            })
            .collect()
    }

    /// Cast the curve to a curve with another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> NurbsCurve<F> {
        NurbsCurve {
            degree: self.degree,
            control_points: self.control_points.iter().map(|p| p.cast()).collect(),
            weights: self.weights.iter().map(|w| nalgebra::convert(*w)).collect(),
            knots: self.knots.cast(),
            generated_knots: self.generated_knots,
            resolution: self.resolution,
            samples: self.samples.iter().map(|p| p.cast()).collect(),
        }
    }

    fn expected_knot_count(&self) -> usize {
        self.control_points.len() + self.degree + 1
    }

    /// Regenerate the knot vector if it is generated or if its length does not fit
    fn ensure_knot_vector(&mut self) {
        if self.generated_knots {
            self.knots = KnotVector::open_uniform(self.control_points.len(), self.degree);
        } else if self.knots.len() != self.expected_knot_count() {
            log::warn!(
                "knot vector has {} knots, expected {}; using an open uniform one",
                self.knots.len(),
                self.expected_knot_count()
            );
            self.knots = KnotVector::open_uniform(self.control_points.len(), self.degree);
            self.generated_knots = true;
        }
    }

    /// Get the stored knots if they are current, an open uniform vector otherwise
    fn resolved_knots(&self) -> KnotVector<T> {
        if self.knots.len() == self.expected_knot_count() {
            self.knots.clone()
        } else {
            KnotVector::open_uniform(self.control_points.len(), self.degree)
        }
    }
}
