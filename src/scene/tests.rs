use approx::assert_relative_eq;
use nalgebra::{Matrix4, Point3, Vector3};

use super::*;
use crate::misc::Ray;

fn geometry(x: f64, y: f64, z: f64) -> Entity<f64> {
    Entity::new(EntityKind::Geometry, Point3::new(x, y, z))
}

#[derive(Default)]
struct RecordingRenderer {
    drawn: Vec<(Matrix4<f64>, Shape<f64>)>,
}

impl Renderer<f64> for RecordingRenderer {
    fn draw(&mut self, model: &Matrix4<f64>, shape: &Shape<f64>) {
        self.drawn.push((*model, shape.clone()));
    }
}

#[test]
fn ids_increase_in_creation_order() {
    let a = geometry(0., 0., 0.);
    let b = geometry(0., 0., 0.);
    assert!(a.id() < b.id());
    assert_eq!(a.name(), format!("Geometry_{}", a.id()));
    let light = Entity::<f64>::new(EntityKind::Light, Point3::origin());
    assert!(light.name().starts_with("Light_"));
}

#[test]
fn ray_cast_on_empty_store_misses() {
    let store = EntityStore::<f64>::new();
    let ray = Ray::new(Point3::origin(), Vector3::z());
    assert!(store.ray_cast(&ray, 1000.).is_none());
}

#[test]
fn ray_cast_picks_nearest_visible() {
    let mut store = EntityStore::new();
    let far = store.add(geometry(0., 0., 10.));
    let near = store.add(geometry(0., 0., 5.));
    let ray = Ray::new(Point3::origin(), Vector3::z());
    assert_eq!(store.ray_cast(&ray, 1000.).map(|e| e.id()), Some(near));

    store.get_mut(near).unwrap().set_visible(false);
    assert_eq!(store.ray_cast(&ray, 1000.).map(|e| e.id()), Some(far));

    store.get_mut(far).unwrap().set_active(false);
    assert!(store.ray_cast(&ray, 1000.).is_none());

    // behind the origin
    let ray = Ray::new(Point3::new(0., 0., 20.), Vector3::z());
    store.get_mut(far).unwrap().set_active(true);
    assert!(store.ray_cast(&ray, 1000.).is_none());
}

#[test]
fn ray_cast_tie_goes_to_first_entity() {
    let mut store = EntityStore::new();
    let first = store.add(geometry(0., 0., 5.));
    store.add(geometry(0., 0., 5.));
    let ray = Ray::new(Point3::origin(), Vector3::z());
    assert_eq!(store.ray_cast(&ray, 1000.).map(|e| e.id()), Some(first));
}

#[test]
fn tags_follow_removal() {
    let mut store = EntityStore::new();
    let a = store.add(geometry(0., 0., 0.));
    let b = store.add(geometry(1., 0., 0.));

    assert!(store.tag(b, "x"));
    assert!(store.tag(a, "x"));
    assert!(store.tag(a, "x"));
    assert!(store.tag(a, "y"));
    assert_eq!(store.tags_of(a), &["x".to_string(), "y".to_string()]);

    let ids: Vec<_> = store.by_tag("x").iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![a, b]);

    assert!(store.remove_by_id(a));
    assert!(!store.remove_by_id(a));
    assert!(store.tags_of(a).is_empty());
    let ids: Vec<_> = store.by_tag("x").iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![b]);
}

#[test]
fn tagging_missing_entity_fails() {
    let mut store = EntityStore::<f64>::new();
    let orphan = geometry(0., 0., 0.);
    assert!(!store.tag(orphan.id(), "x"));
    assert!(store.by_tag("x").is_empty());
}

#[test]
fn untag_and_clear() {
    let mut store = EntityStore::new();
    let a = store.add(geometry(0., 0., 0.));
    store.tag(a, "x");
    store.tag(a, "y");
    assert!(store.untag(a, "x"));
    assert!(!store.untag(a, "x"));
    assert!(!store.has_tag(a, "x"));
    assert!(store.has_tag(a, "y"));
    store.clear_tags();
    assert!(store.by_tag("y").is_empty());
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_by_name_and_all() {
    let mut store = EntityStore::new();
    let a = store.add(geometry(0., 0., 0.).with_name("marker"));
    store.add(geometry(0., 0., 0.).with_name("marker"));
    store.tag(a, "x");
    assert_eq!(store.get_by_name("marker").map(|e| e.id()), Some(a));
    assert!(store.remove_by_name("marker"));
    assert_eq!(store.len(), 1);
    assert!(store.by_tag("x").is_empty());
    assert!(!store.remove_by_name("missing"));

    store.remove_all();
    assert!(store.is_empty());
}

#[test]
fn frustum_uses_radius_as_ndc_tolerance() {
    let mut store = EntityStore::new();
    let inside = store.add(geometry(0.5, 0., 0.));
    let margin = store.add(geometry(1.4, 0., 0.));
    store.add(geometry(2., 0., 0.));
    let hidden = store.add(geometry(0., 0., 0.));
    store.get_mut(hidden).unwrap().set_visible(false);

    let vp = Matrix4::identity();
    let ids: Vec<_> = store.frustum_cull(&vp).iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![inside, margin]);

    assert!(EntityStore::is_point_in_frustum(&Point3::new(0.5, 0., 0.), &vp));
    assert!(!EntityStore::is_point_in_frustum(&Point3::new(1.4, 0., 0.), &vp));
    assert!(!EntityStore::is_point_in_frustum(
        &Point3::new(0., 0., 0.),
        &Matrix4::zeros()
    ));
}

#[test]
fn radius_query_and_collisions() {
    let mut store = EntityStore::new();
    let a = store.add(geometry(0., 0., 0.));
    let b = store.add(geometry(0.9, 0., 0.));
    let c = store.add(geometry(3., 0., 0.));
    let inactive = store.add(geometry(0.5, 0., 0.));
    store.get_mut(inactive).unwrap().set_active(false);

    let ids: Vec<_> = store
        .within_radius(&Point3::origin(), 1.)
        .iter()
        .map(|e| e.id())
        .collect();
    assert_eq!(ids, vec![a, b]);

    let ea = store.get(a).unwrap();
    let ec = store.get(c).unwrap();
    assert!(EntityStore::check_collision(ea, store.get(b).unwrap()));
    assert!(!EntityStore::check_collision(ea, ec));

    let ids: Vec<_> = store.collisions_with(ea).iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![b]);
}

#[test]
fn stats_count_kinds_and_flags() {
    let mut store = EntityStore::new();
    store.add(geometry(0., 0., 0.));
    let hidden = store.add(geometry(0., 0., 0.));
    store.add(Entity::new(EntityKind::Light, Point3::origin()));
    store.add(Entity::new(EntityKind::Bezier, Point3::origin()));
    store.add(Entity::new(EntityKind::Other, Point3::origin()));
    store.get_mut(hidden).unwrap().set_visible(false);
    store.get_mut(hidden).unwrap().set_active(false);

    let stats = store.stats();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.active, 4);
    assert_eq!(stats.visible, 4);
    assert_eq!(stats.count_of(EntityKind::Geometry), 2);
    assert_eq!(stats.light, 1);
    assert_eq!(stats.bezier, 1);
    assert_eq!(stats.other, 1);
    assert_eq!(store.by_kind(EntityKind::Geometry).len(), 2);
    assert_eq!(store.active().len(), 4);
    assert_eq!(store.visible().len(), 4);
}

#[test]
fn update_skips_inactive_entities() {
    let path = vec![Point3::new(0., 0., 0.), Point3::new(2., 0., 0.)];
    let mut store = EntityStore::new();
    let moving = store.add(
        Entity::new(EntityKind::Bezier, Point3::origin())
            .with_animation(PathAnimation::new(path.clone())),
    );
    let frozen = store.add(
        Entity::new(EntityKind::Bezier, Point3::origin()).with_animation(PathAnimation::new(path)),
    );
    store.get_mut(frozen).unwrap().set_active(false);

    store.update_all(0.25);
    assert_relative_eq!(*store.get(moving).unwrap().position(), Point3::new(0.5, 0., 0.));
    assert_eq!(*store.get(frozen).unwrap().position(), Point3::origin());

    // time wraps around after one unit
    store.update_all(1.0);
    assert_relative_eq!(*store.get(moving).unwrap().position(), Point3::new(0.5, 0., 0.), epsilon = 1e-12);
}

#[test]
fn draw_requires_active_and_visible() {
    let color = Vector3::new(1., 0., 0.);
    let line = Shape::polyline(
        vec![Point3::origin(), Point3::new(1., 0., 0.)],
        Primitive::LineStrip,
        color,
    );
    let mut store = EntityStore::new();
    store.add(geometry(1., 2., 3.).with_shape(line.clone()));
    let hidden = store.add(geometry(0., 0., 0.).with_shape(line.clone()));
    let inactive = store.add(geometry(0., 0., 0.).with_shape(line.clone()));
    store.add(geometry(0., 0., 0.));
    store.get_mut(hidden).unwrap().set_visible(false);
    store.get_mut(inactive).unwrap().set_active(false);

    let mut renderer = RecordingRenderer::default();
    store.draw_all(&mut renderer);
    assert_eq!(renderer.drawn.len(), 1);
    let (model, shape) = &renderer.drawn[0];
    assert_eq!(shape, &line);
    assert_relative_eq!(
        model.transform_point(&Point3::origin()),
        Point3::new(1., 2., 3.)
    );
}

#[test]
fn model_matrix_applies_scale_before_rotation() {
    let mut entity = geometry(0., 0., 0.);
    entity.set_scale(Vector3::new(2., 1., 1.));
    entity.set_rotation(Vector3::new(0., 0., 90.));
    let p = entity.model_matrix().transform_point(&Point3::new(1., 0., 0.));
    assert_relative_eq!(p, Point3::new(0., 2., 0.), epsilon = 1e-12);

    entity.translate(&Vector3::new(1., 1., 1.));
    assert_eq!(*entity.position(), Point3::new(1., 1., 1.));
}
