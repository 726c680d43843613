use std::ops::Index;

use itertools::Itertools;
use nalgebra::convert;
use simba::scalar::SupersetOf;

use crate::prelude::{FloatingPoint, KnotMultiplicity};

/// Knot vector representation
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Create an open uniform (clamped) knot vector for `n` control points
    /// the first and last `degree + 1` knots are 0 and 1, the interior knots are evenly spaced
    /// # Example
    /// ```
    /// use curve_scene::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::open_uniform(5, 2);
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 1. / 3., 2. / 3., 1., 1., 1.]);
    /// ```
    pub fn open_uniform(n: usize, degree: usize) -> Self {
        let count = n + degree + 1;
        let knots = (0..count)
            .map(|i| {
                if i <= degree {
                    T::zero()
                } else if i >= n {
                    T::one()
                } else {
                    T::from_usize(i - degree).unwrap() / T::from_usize(n - degree).unwrap()
                }
            })
            .collect();
        Self(knots)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Get the domain of the knot vector by degree
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    /// Check if the knots are in non-decreasing order
    pub fn is_sorted(&self) -> bool {
        self.0.iter().tuple_windows().all(|(a, b)| a <= b)
    }

    /// Sort the knots in ascending order
    pub fn sort(&mut self) {
        self.0
            .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    }

    /// Check that the knot vector fits a curve with `control_count` control points
    pub fn try_validate(&self, control_count: usize, degree: usize) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.len() == control_count + degree + 1,
            "Invalid number of knots, got {}, expected {}",
            self.len(),
            control_count + degree + 1
        );
        anyhow::ensure!(self.is_sorted(), "Knots must be in non-decreasing order");
        Ok(())
    }

    /// Get the multiplicity of each knot
    /// # Example
    /// ```
    /// use curve_scene::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let knot_multiplicity = knots.multiplicity();
    /// assert_eq!(knot_multiplicity[0].multiplicity(), 3);
    /// assert_eq!(knot_multiplicity[1].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[2].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[3].multiplicity(), 3);
    /// ```
    pub fn multiplicity(&self) -> Vec<KnotMultiplicity<T>> {
        let mut mult = vec![];
        let Some(first) = self.0.first() else {
            return mult;
        };

        let mut current = KnotMultiplicity::new(*first, 0);
        self.0.iter().for_each(|knot| {
            if (*knot - *current.knot()).abs() > T::tolerance() {
                mult.push(current.clone());
                current = KnotMultiplicity::new(*knot, 0);
            }
            current.increment_multiplicity();
        });
        mult.push(current);

        mult
    }

    /// Count the knots lying within the tolerance of `knot`
    pub fn multiplicity_of(&self, knot: T) -> usize {
        self.0
            .iter()
            .filter(|k| (**k - knot).abs() < T::tolerance())
            .count()
    }

    /// Check if the knot vector is clamped
    /// `clamped` means the first and last knots have a multiplicity greater than the degree
    /// e.g. [0, 0, 0, 1, 2, 3, 3, 3] with degree 2 is clamped
    pub fn is_clamped(&self, degree: usize) -> bool {
        let multiplicity = self.multiplicity();
        match (multiplicity.first(), multiplicity.last()) {
            (Some(start), Some(end)) => {
                start.multiplicity() > degree && end.multiplicity() > degree
            }
            _ => false,
        }
    }

    /// Count the non-degenerate knot spans inside the domain of a curve of the given degree
    pub fn span_count(&self, degree: usize) -> usize {
        if self.len() < 2 * degree + 2 {
            return 0;
        }
        let m = self.len() - 1;
        (degree..(m - degree))
            .filter(|i| (self.0[i + 1] - self.0[*i]).abs() > T::tolerance())
            .count()
    }

    /// Find the knot span index by binary search
    /// `n` is the index of the last control point
    ///
    /// # Example
    /// ```
    /// use curve_scene::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let idx = knots.find_knot_span_index(4, 2, 2.5);
    /// assert_eq!(idx, 4);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        if u >= self[n + 1] {
            return n;
        }

        if u <= self[degree] {
            return degree;
        }

        // binary search
        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || self[mid + 1] <= u {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            let next = (low + high) / 2;
            if mid == next {
                break;
            }
            mid = next;
        }

        mid
    }

    /// Compute the non-vanishing basis functions
    /// A zero-length knot interval contributes nothing instead of dividing by zero
    pub fn basis_functions(&self, knot_span_index: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis_functions = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis_functions[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom != T::zero() {
                    basis_functions[r] / denom
                } else {
                    T::zero()
                };
                basis_functions[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis_functions[j] = saved;
        }

        basis_functions
    }

    /// Cast the knot vector to another floating point type
    /// # Example
    /// ```
    /// use curve_scene::prelude::*;
    /// let knots: KnotVector<f64> = KnotVector::new(vec![1., 2., 3., 4., 5., 6.]);
    /// let knots2 = knots.cast::<f32>();
    /// assert_eq!(knots2.first(), 1.0);
    /// ```
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> KnotVector<F> {
        KnotVector::new(self.0.iter().map(|v| convert(*v)).collect())
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
