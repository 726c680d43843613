use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

use crate::curve::de_casteljau;
use crate::misc::FloatingPoint;
use crate::scene::Renderer;

/// Source of entity identifiers, unique for the lifetime of the process
static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier of an entity
/// identifiers increase monotonically in creation order and are never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u64);

impl EntityId {
    fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of entity kinds, used for naming and scene statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    /// Static geometry: markers, curves, helper lines
    Geometry,
    /// Object moving along a Bezier path
    Bezier,
    /// Light source marker
    Light,
    #[default]
    Other,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Geometry => "Geometry",
            EntityKind::Bezier => "Bezier",
            EntityKind::Light => "Light",
            EntityKind::Other => "Object",
        }
    }
}

/// How a renderer connects the points of a polyline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    Points,
    /// consecutive points are connected
    LineStrip,
    /// every pair of points is an independent segment
    LineList,
}

/// RGB color in [0, 1]
pub type Color = Vector3<f32>;

/// Geometric payload owned by an entity
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<T: FloatingPoint> {
    /// Sphere marker centered on the entity
    Sphere { radius: T, color: Color },
    /// Ordered points in the entity's local space
    Polyline {
        points: Vec<Point3<T>>,
        primitive: Primitive,
        color: Color,
    },
}

impl<T: FloatingPoint> Shape<T> {
    pub fn polyline(points: Vec<Point3<T>>, primitive: Primitive, color: Color) -> Self {
        Shape::Polyline {
            points,
            primitive,
            color,
        }
    }

    /// Points of a polyline, nothing for a sphere
    pub fn points(&self) -> &[Point3<T>] {
        match self {
            Shape::Sphere { .. } => &[],
            Shape::Polyline { points, .. } => points,
        }
    }

    pub fn color(&self) -> &Color {
        match self {
            Shape::Sphere { color, .. } | Shape::Polyline { color, .. } => color,
        }
    }
}

/// Moves an entity along a Bezier path, looping every time unit
#[derive(Debug, Clone, PartialEq)]
pub struct PathAnimation<T: FloatingPoint> {
    control_points: Vec<Point3<T>>,
    time: T,
}

impl<T: FloatingPoint> PathAnimation<T> {
    pub fn new(control_points: Vec<Point3<T>>) -> Self {
        Self {
            control_points,
            time: T::zero(),
        }
    }

    pub fn control_points(&self) -> &[Point3<T>] {
        &self.control_points
    }

    pub fn time(&self) -> T {
        self.time
    }

    /// Advance the time, wrapping it into [0, 1]
    /// Returns the new position, or `None` with less than 2 control points
    pub fn advance(&mut self, dt: T) -> Option<Point3<T>> {
        self.time += dt;
        if self.time > T::one() {
            self.time -= self.time.floor();
        }
        if self.control_points.len() < 2 {
            return None;
        }
        Some(de_casteljau(&self.control_points, self.time))
    }
}

/// A scene object with a transform, two state flags and an optional payload
///
/// The bounding sphere is centered on the position and only approximates the payload.
#[derive(Debug, Clone)]
pub struct Entity<T: FloatingPoint> {
    id: EntityId,
    name: String,
    kind: EntityKind,
    position: Point3<T>,
    /// euler angles in degrees
    rotation: Vector3<T>,
    scale: Vector3<T>,
    bounding_radius: T,
    /// gates the update hook
    active: bool,
    /// gates drawing, independent of `active`
    visible: bool,
    shape: Option<Shape<T>>,
    animation: Option<PathAnimation<T>>,
}

impl<T: FloatingPoint> Entity<T> {
    /// Create an active and visible entity with a fresh identifier
    /// the name defaults to `<kind>_<id>`
    pub fn new(kind: EntityKind, position: Point3<T>) -> Self {
        let id = EntityId::next();
        Self {
            id,
            name: format!("{}_{}", kind.name(), id),
            kind,
            position,
            rotation: Vector3::zeros(),
            scale: Vector3::from_element(T::one()),
            bounding_radius: T::from_f64(0.5).unwrap(),
            active: true,
            visible: true,
            shape: None,
            animation: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_shape(mut self, shape: Shape<T>) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_bounding_radius(mut self, radius: T) -> Self {
        self.bounding_radius = radius;
        self
    }

    pub fn with_animation(mut self, animation: PathAnimation<T>) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn position(&self) -> &Point3<T> {
        &self.position
    }

    pub fn set_position(&mut self, position: Point3<T>) {
        self.position = position;
    }

    /// Move the entity by an offset
    pub fn translate(&mut self, offset: &Vector3<T>) {
        self.position += offset;
    }

    pub fn rotation(&self) -> &Vector3<T> {
        &self.rotation
    }

    /// Set the euler angles (x, y, z) in degrees
    pub fn set_rotation(&mut self, rotation: Vector3<T>) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> &Vector3<T> {
        &self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3<T>) {
        self.scale = scale;
    }

    pub fn bounding_radius(&self) -> T {
        self.bounding_radius
    }

    pub fn set_bounding_radius(&mut self, radius: T) {
        self.bounding_radius = radius;
    }

    pub fn bounding_center(&self) -> &Point3<T> {
        &self.position
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn shape(&self) -> Option<&Shape<T>> {
        self.shape.as_ref()
    }

    pub fn set_shape(&mut self, shape: Option<Shape<T>>) {
        self.shape = shape;
    }

    pub fn animation(&self) -> Option<&PathAnimation<T>> {
        self.animation.as_ref()
    }

    /// Compose the model matrix as `translate * rot_y * rot_x * rot_z * scale`
    /// # Example
    /// ```
    /// use curve_scene::prelude::*;
    /// use nalgebra::{Point3, Vector3};
    /// use approx::assert_relative_eq;
    ///
    /// let mut entity = Entity::new(EntityKind::Geometry, Point3::new(1., 2., 3.));
    /// entity.set_rotation(Vector3::new(0., 90., 0.));
    /// let model = entity.model_matrix();
    /// let p = model.transform_point(&Point3::new(1., 0., 0.));
    /// assert_relative_eq!(p, Point3::new(1., 2., 2.), epsilon = 1e-12);
    /// ```
    pub fn model_matrix(&self) -> Matrix4<T> {
        let to_radians = |deg: T| deg * T::pi() / T::from_f64(180.).unwrap();
        let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), to_radians(self.rotation.y));
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), to_radians(self.rotation.x));
        let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), to_radians(self.rotation.z));

        Matrix4::new_translation(&self.position.coords)
            * yaw.to_homogeneous()
            * pitch.to_homogeneous()
            * roll.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Per-frame update hook
    pub fn update(&mut self, dt: T) {
        if let Some(position) = self.animation.as_mut().and_then(|a| a.advance(dt)) {
            self.position = position;
        }
    }

    /// Hand the payload to a renderer, nothing without a payload
    pub fn draw<R: Renderer<T> + ?Sized>(&self, renderer: &mut R) {
        if let Some(shape) = &self.shape {
            renderer.draw(&self.model_matrix(), shape);
        }
    }

    /// Check if the bounding spheres of two entities touch
    pub fn collides_with(&self, other: &Self) -> bool {
        let distance = (other.bounding_center() - self.bounding_center()).norm();
        distance <= self.bounding_radius + other.bounding_radius
    }
}
