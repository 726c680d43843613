use nalgebra::Point3;

use crate::curve::{control_lines, sample_bezier, BezierCurve, NurbsCurve};
use crate::misc::{FloatingPoint, Ray3D};
use crate::scene::{Color, Entity, EntityId, EntityKind, EntityStore, Primitive, Shape};
use crate::session::CurveEditOption;

/// Result of a delete command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// the control point under the ray was removed
    Removed(EntityId),
    /// the ray hit an entity which is not a control point, nothing was removed
    Rejected(EntityId),
    /// the ray hit nothing
    Missed,
}

/// Result of a grab toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOutcome {
    Grabbed(EntityId),
    Released(EntityId),
    /// the ray hit an entity which is not a control point
    Rejected(EntityId),
    Missed,
}

/// A control point locked for dragging, with the marker highlighting it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grab {
    target: EntityId,
    highlight: EntityId,
}

/// Interactive curve editing on top of an entity store
///
/// Control points are tagged entities of the store. After every edit the control points are
/// collected in ascending id order and fed to the display curves:
/// the polynomial Bezier curve through all of them, the B-spline preview, the NURBS curve,
/// the control polygon and one entity per Bezier piece of the NURBS curve.
///
/// # Example
/// ```
/// use curve_scene::prelude::*;
/// use nalgebra::Point3;
///
/// let mut store = EntityStore::new();
/// let mut session = CurveEditSession::<f64>::default();
/// for p in [(0., 0., 0.), (1., 1., 0.), (2., -1., 0.), (3., 0., 0.)] {
///     session.create_control_point(&mut store, Point3::new(p.0, p.1, p.2));
/// }
/// assert_eq!(session.nurbs().degree(), 3);
/// assert_eq!(store.by_tag(session.option().piece_tag()).len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct CurveEditSession<T: FloatingPoint> {
    option: CurveEditOption<T>,
    bezier: BezierCurve<T>,
    nurbs: NurbsCurve<T>,
    grab: Option<Grab>,
}

impl<T: FloatingPoint> Default for CurveEditSession<T> {
    fn default() -> Self {
        Self::new(CurveEditOption::default())
    }
}

impl<T: FloatingPoint> CurveEditSession<T> {
    pub fn new(option: CurveEditOption<T>) -> Self {
        let mut bezier = BezierCurve::default();
        bezier.set_resolution(option.bezier_resolution());
        let mut nurbs = NurbsCurve::new(option.degree());
        nurbs.set_resolution(option.resolution());
        Self {
            option,
            bezier,
            nurbs,
            grab: None,
        }
    }

    pub fn option(&self) -> &CurveEditOption<T> {
        &self.option
    }

    pub fn bezier(&self) -> &BezierCurve<T> {
        &self.bezier
    }

    pub fn nurbs(&self) -> &NurbsCurve<T> {
        &self.nurbs
    }

    pub fn desired_degree(&self) -> usize {
        self.option.degree()
    }

    /// Degree actually used for `count` control points: the desired degree clamped to `[1, count - 1]`
    pub fn effective_degree(&self, count: usize) -> usize {
        self.option.degree().min(count.saturating_sub(1)).max(1)
    }

    /// The grabbed control point, if any
    pub fn grabbed(&self) -> Option<EntityId> {
        self.grab.map(|g| g.target)
    }

    /// The highlight marker of the grabbed control point, if any
    pub fn highlight(&self) -> Option<EntityId> {
        self.grab.map(|g| g.highlight)
    }

    /// Positions of the control points in ascending id order
    pub fn control_points(&self, store: &EntityStore<T>) -> Vec<Point3<T>> {
        let mut controls = store.by_tag(self.option.control_tag());
        controls.sort_by_key(|e| e.id());
        controls.iter().map(|e| *e.position()).collect()
    }

    /// Check if an entity is one of the control points
    pub fn is_control_point(&self, store: &EntityStore<T>, id: EntityId) -> bool {
        store.has_tag(id, self.option.control_tag())
    }

    /// Place a new control point and recompute the curves
    pub fn create_control_point(&mut self, store: &mut EntityStore<T>, position: Point3<T>) -> EntityId {
        let mut entity = Entity::new(EntityKind::Geometry, position)
            .with_shape(Shape::Sphere {
                radius: self.option.marker_radius(),
                color: *self.option.control_color(),
            })
            .with_bounding_radius(self.option.pick_radius());
        entity.set_name(format!("{}_{}", self.option.control_tag(), entity.id()));
        let name = entity.name().to_string();

        let id = store.add(entity);
        store.tag(id, self.option.control_tag());
        log::info!(
            "created control point {} at ({:.3}, {:.3}, {:.3})",
            name,
            position.x,
            position.y,
            position.z
        );

        self.update_curves(store);
        id
    }

    /// Delete the control point hit by the ray
    ///
    /// An entity which is not a control point is left untouched and the curves are not recomputed.
    pub fn delete_control_point(&mut self, store: &mut EntityStore<T>, ray: &Ray3D<T>) -> DeleteOutcome {
        let Some(hit) = store.ray_cast(ray, self.option.pick_distance()) else {
            return DeleteOutcome::Missed;
        };
        let id = hit.id();
        if !self.is_control_point(store, id) {
            log::info!("hit entity is not a control point: {}", hit.name());
            return DeleteOutcome::Rejected(id);
        }
        log::info!("removing control point {}", hit.name());
        self.remove_control_point(store, id);
        DeleteOutcome::Removed(id)
    }

    /// Remove a control point by id and recompute the curves
    /// Returns false if the entity is not a control point
    pub fn remove_control_point(&mut self, store: &mut EntityStore<T>, id: EntityId) -> bool {
        if !self.is_control_point(store, id) {
            return false;
        }
        if self.grabbed() == Some(id) {
            self.release_grab(store);
        }
        store.remove_by_id(id);
        self.update_curves(store);
        true
    }

    /// Grab the control point hit by the ray, or release the grabbed one
    ///
    /// Grabbing spawns an untagged light marker at the control point which follows it while dragging.
    pub fn toggle_grab(&mut self, store: &mut EntityStore<T>, ray: &Ray3D<T>) -> GrabOutcome {
        if let Some(target) = self.release_grab(store) {
            return GrabOutcome::Released(target);
        }

        let Some(hit) = store.ray_cast(ray, self.option.pick_distance()) else {
            return GrabOutcome::Missed;
        };
        let target = hit.id();
        let position = *hit.position();
        if !self.is_control_point(store, target) {
            return GrabOutcome::Rejected(target);
        }

        let highlight = store.add(
            Entity::new(EntityKind::Light, position)
                .with_shape(Shape::Sphere {
                    radius: self.option.marker_radius(),
                    color: *self.option.highlight_color(),
                })
                .with_bounding_radius(self.option.marker_radius()),
        );
        self.grab = Some(Grab { target, highlight });
        log::info!("grabbed control point {}", target);
        GrabOutcome::Grabbed(target)
    }

    /// Release the grabbed control point and remove its highlight
    pub fn release_grab(&mut self, store: &mut EntityStore<T>) -> Option<EntityId> {
        let grab = self.grab.take()?;
        store.remove_by_id(grab.highlight);
        log::info!("released control point {}", grab.target);
        Some(grab.target)
    }

    /// Move the grabbed control point one unit along the line of sight
    /// away from the eye for a positive offset, towards it for a negative one
    /// Returns whether anything moved
    pub fn scroll(&mut self, store: &mut EntityStore<T>, eye: &Point3<T>, offset: T) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };
        if offset == T::zero() {
            return false;
        }
        let Some(position) = store.get(grab.target).map(|e| *e.position()) else {
            return false;
        };

        let delta = position - eye;
        let len = delta.norm();
        if len < T::default_epsilon() {
            return false;
        }
        let step = if offset > T::zero() {
            delta / len
        } else {
            -delta / len
        };
        self.move_grabbed(store, position + step)
    }

    /// Set the position of the grabbed control point and its highlight
    /// Returns whether anything moved
    pub fn move_grabbed(&mut self, store: &mut EntityStore<T>, position: Point3<T>) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };
        let Some(target) = store.get_mut(grab.target) else {
            return false;
        };
        target.set_position(position);
        if let Some(highlight) = store.get_mut(grab.highlight) {
            highlight.set_position(position);
        }
        self.update_curves(store);
        true
    }

    /// Change the desired degree (at least 1) and recompute the curves
    pub fn set_desired_degree(&mut self, store: &mut EntityStore<T>, degree: usize) {
        self.option = self.option.clone().with_degree(degree);
        self.update_curves(store);
    }

    /// Set the leading weights of the NURBS curve, the others are 1
    pub fn set_weights(&mut self, store: &mut EntityStore<T>, weights: &[T]) {
        self.nurbs.set_weights(weights);
        self.update_curves(store);
    }

    /// Per-frame step: update the store, keep the highlight on the grabbed point and recompute the curves
    pub fn tick(&mut self, store: &mut EntityStore<T>, dt: T) -> usize {
        store.update_all(dt);

        if let Some(grab) = self.grab {
            match store.get(grab.target).map(|e| *e.position()) {
                Some(position) => {
                    if let Some(highlight) = store.get_mut(grab.highlight) {
                        highlight.set_position(position);
                    }
                }
                None => {
                    self.release_grab(store);
                }
            }
        }

        self.update_curves(store)
    }

    /// Feed the control points to every display curve and reconcile the Bezier piece entities
    /// Returns the number of Bezier pieces
    pub fn update_curves(&mut self, store: &mut EntityStore<T>) -> usize {
        let points = self.control_points(store);
        let degree = self.effective_degree(points.len());

        self.bezier.set_control_points(points.clone());
        self.nurbs.set_degree(degree);
        self.nurbs.set_control_points(points.clone());

        let option = &self.option;
        sync_display(
            store,
            option.bezier_name(),
            self.bezier.samples().to_vec(),
            Primitive::LineStrip,
            *option.bezier_color(),
        );
        sync_display(
            store,
            option.bspline_name(),
            self.nurbs.sample_bspline(option.resolution()),
            Primitive::LineStrip,
            *option.bspline_color(),
        );
        sync_display(
            store,
            option.nurbs_name(),
            self.nurbs.samples().to_vec(),
            Primitive::LineStrip,
            *option.nurbs_color(),
        );
        sync_display(
            store,
            option.control_lines_name(),
            control_lines(&points),
            Primitive::LineList,
            *option.control_lines_color(),
        );

        let segments = self.nurbs.try_decompose_bezier_segments();
        self.reconcile_pieces(store, &segments);
        segments.len()
    }

    /// Make the piece entities match the segments: drop the surplus ones, update or create the rest
    fn reconcile_pieces(&self, store: &mut EntityStore<T>, segments: &[Vec<Point3<T>>]) {
        let option = &self.option;
        let stale: Vec<_> = store
            .by_tag(option.piece_tag())
            .iter()
            .filter(|e| {
                option
                    .piece_index(e.name())
                    .map_or(true, |index| index >= segments.len())
            })
            .map(|e| e.id())
            .collect();
        let removed = stale.len();
        stale.into_iter().for_each(|id| {
            store.remove_by_id(id);
        });

        for (index, segment) in segments.iter().enumerate() {
            let name = option.piece_name(index);
            let shape = Shape::polyline(
                sample_bezier(segment, option.bezier_resolution()),
                Primitive::LineStrip,
                *option.piece_color(),
            );
            match store.get_by_name_mut(&name) {
                Some(piece) => piece.set_shape(Some(shape)),
                None => {
                    let id = store.add(
                        Entity::new(EntityKind::Geometry, Point3::origin())
                            .with_name(name)
                            .with_shape(shape)
                            .with_bounding_radius(T::zero()),
                    );
                    store.tag(id, option.piece_tag());
                }
            }
        }

        if removed > 0 {
            log::debug!(
                "reconciled bezier pieces: {} kept, {} removed",
                segments.len(),
                removed
            );
        }
    }
}

/// Create or update a named display entity holding a polyline
/// display entities get a zero bounding radius
fn sync_display<T: FloatingPoint>(
    store: &mut EntityStore<T>,
    name: &str,
    points: Vec<Point3<T>>,
    primitive: Primitive,
    color: Color,
) {
    let shape = Shape::polyline(points, primitive, color);
    match store.get_by_name_mut(name) {
        Some(entity) => entity.set_shape(Some(shape)),
        None => {
            store.add(
                Entity::new(EntityKind::Geometry, Point3::origin())
                    .with_name(name)
                    .with_shape(shape)
                    .with_bounding_radius(T::zero()),
            );
        }
    }
}
