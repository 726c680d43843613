use nalgebra::Vector3;

use crate::curve::{DEFAULT_BEZIER_RESOLUTION, DEFAULT_RESOLUTION};
use crate::misc::FloatingPoint;
use crate::scene::Color;

/// Options of a curve editing session
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveEditOption<T: FloatingPoint> {
    /// tag carried by every control point entity
    control_tag: String,
    /// tag carried by every Bezier piece entity
    piece_tag: String,
    bezier_name: String,
    bspline_name: String,
    nurbs_name: String,
    control_lines_name: String,
    /// piece entities are named `<prefix><index>`
    piece_prefix: String,
    /// desired degree of the NURBS curve, lowered while there are too few control points
    degree: usize,
    /// sampled intervals of the NURBS curve and the B-spline preview
    resolution: usize,
    /// sampled intervals of the polynomial curve and of every piece
    bezier_resolution: usize,
    /// radius of the sphere drawn for a control point
    marker_radius: T,
    /// bounding radius used to pick a control point
    pick_radius: T,
    /// maximum distance of a pick ray
    pick_distance: T,
    control_color: Color,
    highlight_color: Color,
    bezier_color: Color,
    bspline_color: Color,
    nurbs_color: Color,
    control_lines_color: Color,
    piece_color: Color,
}

impl<T: FloatingPoint> Default for CurveEditOption<T> {
    fn default() -> Self {
        Self {
            control_tag: "curve_control".to_string(),
            piece_tag: "curve_piece".to_string(),
            bezier_name: "bezier_curve".to_string(),
            bspline_name: "bspline_curve".to_string(),
            nurbs_name: "nurbs_curve".to_string(),
            control_lines_name: "control_lines".to_string(),
            piece_prefix: "nurbs_piece_".to_string(),
            degree: 3,
            resolution: DEFAULT_RESOLUTION,
            bezier_resolution: DEFAULT_BEZIER_RESOLUTION,
            marker_radius: T::from_f64(0.06).unwrap(),
            pick_radius: T::from_f64(0.5).unwrap(),
            pick_distance: T::from_f64(1000.).unwrap(),
            control_color: Vector3::new(1., 1., 0.),
            highlight_color: Vector3::new(0., 1., 0.),
            bezier_color: Vector3::new(1., 1., 0.),
            bspline_color: Vector3::new(0., 1., 1.),
            nurbs_color: Vector3::new(1., 0., 1.),
            control_lines_color: Vector3::new(0.5, 0.5, 0.5),
            piece_color: Vector3::new(1., 0.5, 0.),
        }
    }
}

impl<T: FloatingPoint> CurveEditOption<T> {
    pub fn control_tag(&self) -> &str {
        &self.control_tag
    }

    pub fn piece_tag(&self) -> &str {
        &self.piece_tag
    }

    pub fn bezier_name(&self) -> &str {
        &self.bezier_name
    }

    pub fn bspline_name(&self) -> &str {
        &self.bspline_name
    }

    pub fn nurbs_name(&self) -> &str {
        &self.nurbs_name
    }

    pub fn control_lines_name(&self) -> &str {
        &self.control_lines_name
    }

    pub fn piece_prefix(&self) -> &str {
        &self.piece_prefix
    }

    /// Name of the piece entity at `index`
    pub fn piece_name(&self, index: usize) -> String {
        format!("{}{}", self.piece_prefix, index)
    }

    /// Parse the index back from a piece entity name
    pub fn piece_index(&self, name: &str) -> Option<usize> {
        name.strip_prefix(self.piece_prefix.as_str())?.parse().ok()
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn bezier_resolution(&self) -> usize {
        self.bezier_resolution
    }

    pub fn marker_radius(&self) -> T {
        self.marker_radius
    }

    pub fn pick_radius(&self) -> T {
        self.pick_radius
    }

    pub fn pick_distance(&self) -> T {
        self.pick_distance
    }

    pub fn control_color(&self) -> &Color {
        &self.control_color
    }

    pub fn highlight_color(&self) -> &Color {
        &self.highlight_color
    }

    pub fn bezier_color(&self) -> &Color {
        &self.bezier_color
    }

    pub fn bspline_color(&self) -> &Color {
        &self.bspline_color
    }

    pub fn nurbs_color(&self) -> &Color {
        &self.nurbs_color
    }

    pub fn control_lines_color(&self) -> &Color {
        &self.control_lines_color
    }

    pub fn piece_color(&self) -> &Color {
        &self.piece_color
    }

    pub fn with_control_tag(mut self, tag: impl Into<String>) -> Self {
        self.control_tag = tag.into();
        self
    }

    pub fn with_piece_tag(mut self, tag: impl Into<String>) -> Self {
        self.piece_tag = tag.into();
        self
    }

    pub fn with_piece_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.piece_prefix = prefix.into();
        self
    }

    /// Set the desired degree (at least 1)
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree.max(1);
        self
    }

    /// Set the sampled intervals of the NURBS curve and the B-spline preview (at least 2)
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution.max(2);
        self
    }

    /// Set the sampled intervals of the polynomial curve and of every piece (at least 2)
    pub fn with_bezier_resolution(mut self, resolution: usize) -> Self {
        self.bezier_resolution = resolution.max(2);
        self
    }

    pub fn with_marker_radius(mut self, radius: T) -> Self {
        self.marker_radius = radius;
        self
    }

    pub fn with_pick_radius(mut self, radius: T) -> Self {
        self.pick_radius = radius;
        self
    }

    pub fn with_pick_distance(mut self, distance: T) -> Self {
        self.pick_distance = distance;
        self
    }

    pub fn with_control_color(mut self, color: Color) -> Self {
        self.control_color = color;
        self
    }

    pub fn with_nurbs_color(mut self, color: Color) -> Self {
        self.nurbs_color = color;
        self
    }
}
