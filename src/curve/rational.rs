use nalgebra::{Point3, Point4, Vector3};

use crate::{knot::KnotVector, misc::FloatingPoint};

/// Lift a point to homogeneous coordinates `(x * w, y * w, z * w, w)`
/// A weight whose magnitude is below the tolerance is clamped to the tolerance.
pub fn homogenize<T: FloatingPoint>(point: &Point3<T>, weight: T) -> Point4<T> {
    let w = clamp_weight(weight);
    Point4::new(point.x * w, point.y * w, point.z * w, w)
}

/// Project a homogeneous point back to cartesian coordinates
pub fn dehomogenize<T: FloatingPoint>(point: &Point4<T>) -> Point3<T> {
    let w = clamp_weight(point.w);
    Point3::new(point.x / w, point.y / w, point.z / w)
}

fn clamp_weight<T: FloatingPoint>(weight: T) -> T {
    if weight.abs() < T::tolerance() {
        T::tolerance()
    } else {
        weight
    }
}

/// Evaluate a rational curve at parameter `u`
///
/// Missing weights count as 1. If `knots` does not have `control_points.len() + degree + 1`
/// entries an open uniform knot vector is used instead.
/// Returns the origin when there are too few control points or the rational denominator vanishes.
/// # Example
/// ```
/// use curve_scene::prelude::*;
/// use nalgebra::Point3;
/// use approx::assert_relative_eq;
///
/// let points = vec![
///     Point3::new(0., 0., 0.),
///     Point3::new(1., 2., 0.),
///     Point3::new(2., 0., 0.),
/// ];
/// let knots = KnotVector::open_uniform(points.len(), 2);
/// let p = evaluate_point(0.5, &points, &[1., 1., 1.], 2, &knots);
/// assert_relative_eq!(p, Point3::new(1., 1., 0.));
/// ```
pub fn evaluate_point<T: FloatingPoint>(
    u: T,
    control_points: &[Point3<T>],
    weights: &[T],
    degree: usize,
    knots: &KnotVector<T>,
) -> Point3<T> {
    if control_points.len() < degree + 1 {
        return Point3::origin();
    }

    let fallback;
    let knots = if knots.len() == control_points.len() + degree + 1 {
        knots
    } else {
        fallback = KnotVector::open_uniform(control_points.len(), degree);
        &fallback
    };

    let n = control_points.len() - 1;
    let knot_span_index = knots.find_knot_span_index(n, degree, u);
    let basis = knots.basis_functions(knot_span_index, u, degree);

    let mut numerator = Vector3::<T>::zeros();
    let mut denominator = T::zero();
    for (j, b) in basis.iter().enumerate() {
        let idx = knot_span_index - degree + j;
        let w = weights.get(idx).copied().unwrap_or(T::one());
        let coeff = *b * w;
        numerator += control_points[idx].coords * coeff;
        denominator += coeff;
    }

    if denominator.abs() < T::tolerance() {
        return Point3::origin();
    }

    Point3::from(numerator / denominator)
}

/// Insert the knot `u` once (Boehm's algorithm) into a curve with homogeneous control points
///
/// The knot vector and the control points both grow by one entry and the curve keeps its shape.
/// Nothing happens when `u` is not strictly inside the curve domain,
/// when the knot already has a multiplicity of `degree` or more,
/// or when the knot vector does not match the control points.
pub fn insert_knot_once<T: FloatingPoint>(
    u: T,
    degree: usize,
    knots: &mut KnotVector<T>,
    control_points: &mut Vec<Point4<T>>,
) {
    let p = degree;
    if p == 0 || control_points.len() < p + 1 || knots.len() != control_points.len() + p + 1 {
        return;
    }

    let n = control_points.len() - 1;
    if u <= knots[p] || u >= knots[n + 1] {
        return;
    }

    let k = knots.find_knot_span_index(n, p, u);
    let s = knots.multiplicity_of(u);
    if s >= p {
        return;
    }

    let src = knots.as_slice();
    let mut inserted_knots = Vec::with_capacity(src.len() + 1);
    inserted_knots.extend_from_slice(&src[..=k]);
    inserted_knots.push(u);
    inserted_knots.extend_from_slice(&src[(k + 1)..]);

    // control points k - p + 1 ..= k - s are replaced by p - s affine combinations
    let l = k - p + 1;
    let blended = (0..(p - s)).map(|i| {
        let denom = src[i + k + 1] - src[l + i];
        let alpha = if denom != T::zero() {
            (u - src[l + i]) / denom
        } else {
            T::zero()
        };
        control_points[k - p + i].lerp(&control_points[k - p + i + 1], alpha)
    });

    let refined: Vec<_> = control_points[..=(k - p)]
        .iter()
        .cloned()
        .chain(blended)
        .chain(control_points[(k - s)..].iter().cloned())
        .collect();

    *knots = KnotVector::new(inserted_knots);
    *control_points = refined;
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Point4};

    use super::*;

    fn homogeneous(points: &[Point3<f64>], weights: &[f64]) -> Vec<Point4<f64>> {
        points
            .iter()
            .zip(weights.iter())
            .map(|(p, w)| homogenize(p, *w))
            .collect()
    }

    fn evaluate_homogeneous(
        u: f64,
        degree: usize,
        knots: &KnotVector<f64>,
        control_points: &[Point4<f64>],
    ) -> Point3<f64> {
        let points: Vec<_> = control_points.iter().map(dehomogenize).collect();
        let weights: Vec<_> = control_points.iter().map(|p| p.w).collect();
        evaluate_point(u, &points, &weights, degree, knots)
    }

    #[test]
    fn homogenize_clamps_small_weights() {
        let p = homogenize(&Point3::new(1., 2., 3.), 0.);
        assert_relative_eq!(p.w, f64::tolerance());
        assert_relative_eq!(dehomogenize(&p), Point3::new(1., 2., 3.), epsilon = 1e-9);
    }

    #[test]
    fn evaluation_interpolates_end_points() {
        let points = vec![
            Point3::new(0., 0., 0.),
            Point3::new(1., 1., 0.),
            Point3::new(2., -1., 0.),
            Point3::new(3., 0., 1.),
        ];
        let knots = KnotVector::open_uniform(points.len(), 2);
        let weights = [1., 2., 0.5, 1.];
        assert_relative_eq!(
            evaluate_point(0., &points, &weights, 2, &knots),
            points[0]
        );
        assert_relative_eq!(
            evaluate_point(1., &points, &weights, 2, &knots),
            points[3]
        );
    }

    #[test]
    fn evaluation_degrades_gracefully() {
        let points = vec![Point3::new(1., 1., 1.), Point3::new(2., 2., 2.)];
        let knots = KnotVector::open_uniform(points.len(), 3);
        assert_eq!(
            evaluate_point(0.5, &points, &[1., 1.], 3, &knots),
            Point3::origin()
        );

        // weights cancelling each other out
        let points = vec![Point3::new(1., 0., 0.), Point3::new(0., 1., 0.)];
        let knots = KnotVector::open_uniform(points.len(), 1);
        assert_eq!(
            evaluate_point(0.5, &points, &[1., -1.], 1, &knots),
            Point3::origin()
        );
    }

    #[test]
    fn evaluation_falls_back_to_open_uniform_knots() {
        let points = vec![
            Point3::new(0., 0., 0.),
            Point3::new(1., 2., 0.),
            Point3::new(2., 0., 0.),
        ];
        let wrong = KnotVector::new(vec![0., 1.]);
        let right = KnotVector::open_uniform(points.len(), 2);
        assert_relative_eq!(
            evaluate_point(0.3, &points, &[], 2, &wrong),
            evaluate_point(0.3, &points, &[1., 1., 1.], 2, &right)
        );
    }

    #[test]
    fn knot_insertion_keeps_shape() {
        let points = vec![
            Point3::new(0., 0., 0.),
            Point3::new(1., 3., 0.),
            Point3::new(3., 2., 1.),
            Point3::new(4., -1., 0.),
            Point3::new(6., 0., 2.),
        ];
        let weights = [1., 0.5, 2., 1., 1.5];
        let degree = 3;
        let original_knots = KnotVector::open_uniform(points.len(), degree);
        let original = homogeneous(&points, &weights);

        let mut knots = original_knots.clone();
        let mut control_points = original.clone();
        insert_knot_once(0.3, degree, &mut knots, &mut control_points);
        assert_eq!(knots.len(), original_knots.len() + 1);
        assert_eq!(control_points.len(), original.len() + 1);
        assert!(knots.is_sorted());

        for i in 0..=20 {
            let u = i as f64 / 20. * (1. - 1e-9);
            assert_relative_eq!(
                evaluate_homogeneous(u, degree, &knots, &control_points),
                evaluate_homogeneous(u, degree, &original_knots, &original),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn knot_insertion_stops_at_degree_multiplicity() {
        let points: Vec<_> = (0..4).map(|i| Point3::new(i as f64, 0., 0.)).collect();
        let degree = 2;
        let mut knots = KnotVector::open_uniform(points.len(), degree);
        let mut control_points = homogeneous(&points, &[1.; 4]);

        insert_knot_once(0.5, degree, &mut knots, &mut control_points);
        insert_knot_once(0.5, degree, &mut knots, &mut control_points);
        assert_eq!(knots.multiplicity_of(0.5), 2);
        assert_eq!(control_points.len(), 5);

        // end knots are never inserted
        insert_knot_once(0., degree, &mut knots, &mut control_points);
        insert_knot_once(1., degree, &mut knots, &mut control_points);
        assert_eq!(control_points.len(), 5);
    }
}
