use std::collections::BTreeMap;
use std::fmt;

use nalgebra::{Matrix4, Point3};

use crate::misc::{FloatingPoint, Ray3D};
use crate::scene::{Entity, EntityId, EntityKind, Renderer};

/// Owns the entities of a scene and the tags attached to them
///
/// Entities keep their insertion order. Tags live in a separate relation keyed by entity id,
/// removing an entity drops its tags as well.
/// Every query is a linear scan over the entities.
#[derive(Clone, Debug)]
pub struct EntityStore<T: FloatingPoint> {
    entities: Vec<Entity<T>>,
    tags: BTreeMap<EntityId, Vec<String>>,
}

impl<T: FloatingPoint> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            entities: vec![],
            tags: BTreeMap::new(),
        }
    }
}

impl<T: FloatingPoint> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity and return its id
    pub fn add(&mut self, entity: Entity<T>) -> EntityId {
        let id = entity.id();
        log::debug!("add entity {} ({})", entity.name(), id);
        self.entities.push(entity);
        id
    }

    /// Remove the entity with the given id together with its tags
    pub fn remove_by_id(&mut self, id: EntityId) -> bool {
        match self.entities.iter().position(|e| e.id() == id) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Remove the first entity with the given name together with its tags
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.entities.iter().position(|e| e.name() == name) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    fn remove_at(&mut self, index: usize) {
        let entity = self.entities.remove(index);
        self.tags.remove(&entity.id());
        log::debug!("remove entity {} ({})", entity.name(), entity.id());
    }

    pub fn remove_all(&mut self) {
        self.entities.clear();
        self.tags.clear();
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity<T>> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity<T>> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Entity<T>> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut Entity<T>> {
        self.entities.iter_mut().find(|e| e.name() == name)
    }

    /// Entities in insertion order
    pub fn entities(&self) -> &[Entity<T>] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Run the update hook of every active entity
    pub fn update_all(&mut self, dt: T) {
        self.entities
            .iter_mut()
            .filter(|e| e.is_active())
            .for_each(|e| e.update(dt));
    }

    /// Draw every entity which is both active and visible
    pub fn draw_all<R: Renderer<T> + ?Sized>(&self, renderer: &mut R) {
        self.entities
            .iter()
            .filter(|e| e.is_active() && e.is_visible())
            .for_each(|e| e.draw(renderer));
    }

    pub fn by_kind(&self, kind: EntityKind) -> Vec<&Entity<T>> {
        self.entities.iter().filter(|e| e.kind() == kind).collect()
    }

    pub fn active(&self) -> Vec<&Entity<T>> {
        self.entities.iter().filter(|e| e.is_active()).collect()
    }

    pub fn visible(&self) -> Vec<&Entity<T>> {
        self.entities.iter().filter(|e| e.is_visible()).collect()
    }

    /// Find the nearest active and visible entity whose bounding sphere is hit by the ray
    /// closer than `max_distance`
    ///
    /// When several entities are hit at exactly the same distance, the first one in insertion order wins.
    /// # Example
    /// ```
    /// use curve_scene::prelude::*;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let mut store = EntityStore::new();
    /// let near = store.add(Entity::new(EntityKind::Geometry, Point3::new(0., 0., 5.)));
    /// store.add(Entity::new(EntityKind::Geometry, Point3::new(0., 0., 10.)));
    ///
    /// let ray = Ray::new(Point3::origin(), Vector3::z());
    /// assert_eq!(store.ray_cast(&ray, 100.).map(|e| e.id()), Some(near));
    /// assert!(store.ray_cast(&ray, 1.).is_none());
    /// ```
    pub fn ray_cast(&self, ray: &Ray3D<T>, max_distance: T) -> Option<&Entity<T>> {
        let mut closest = max_distance;
        let mut hit = None;
        for entity in self
            .entities
            .iter()
            .filter(|e| e.is_active() && e.is_visible())
        {
            if let Some(distance) =
                ray.intersect_sphere(entity.bounding_center(), entity.bounding_radius())
            {
                if distance < closest {
                    closest = distance;
                    hit = Some(entity);
                }
            }
        }
        hit
    }

    /// Select the active and visible entities whose center lies in the view frustum
    ///
    /// The center is projected to normalized device coordinates and compared against
    /// `[-1 - radius, 1 + radius]` on every axis, the bounding radius acting as a flat NDC tolerance.
    /// This is an approximation of a sphere-frustum test.
    /// Centers projecting to `w = 0` are culled.
    pub fn frustum_cull(&self, view_projection: &Matrix4<T>) -> Vec<&Entity<T>> {
        self.entities
            .iter()
            .filter(|e| e.is_active() && e.is_visible())
            .filter(|e| {
                Self::project_to_ndc(e.bounding_center(), view_projection)
                    .is_some_and(|ndc| {
                        let limit = T::one() + e.bounding_radius();
                        ndc.iter().all(|c| c.abs() <= limit)
                    })
            })
            .collect()
    }

    /// Check if a point lies inside the view frustum (`[-1, 1]` on every NDC axis)
    pub fn is_point_in_frustum(point: &Point3<T>, view_projection: &Matrix4<T>) -> bool {
        Self::project_to_ndc(point, view_projection)
            .is_some_and(|ndc| ndc.iter().all(|c| c.abs() <= T::one()))
    }

    fn project_to_ndc(point: &Point3<T>, view_projection: &Matrix4<T>) -> Option<Point3<T>> {
        let clip = view_projection * point.to_homogeneous();
        if clip.w.abs() < T::default_epsilon() {
            return None;
        }
        Some(Point3::from(clip.xyz() / clip.w))
    }

    /// Select the active entities whose center is within `radius` of `center`
    pub fn within_radius(&self, center: &Point3<T>, radius: T) -> Vec<&Entity<T>> {
        let r2 = radius * radius;
        self.entities
            .iter()
            .filter(|e| e.is_active())
            .filter(|e| (e.bounding_center() - center).norm_squared() <= r2)
            .collect()
    }

    /// Check if the bounding spheres of two entities touch
    pub fn check_collision(a: &Entity<T>, b: &Entity<T>) -> bool {
        a.collides_with(b)
    }

    /// Select the other active entities colliding with `entity`
    pub fn collisions_with(&self, entity: &Entity<T>) -> Vec<&Entity<T>> {
        self.entities
            .iter()
            .filter(|e| e.is_active() && e.id() != entity.id())
            .filter(|e| e.collides_with(entity))
            .collect()
    }

    /// Attach a tag to an entity
    /// Returns false if there is no entity with that id, tagging twice is a no-op
    pub fn tag(&mut self, id: EntityId, tag: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let tags = self.tags.entry(id).or_default();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
            log::debug!("tag entity {} with {}", id, tag);
        }
        true
    }

    /// Detach a tag from an entity
    /// Returns whether the tag was attached
    pub fn untag(&mut self, id: EntityId, tag: &str) -> bool {
        let Some(tags) = self.tags.get_mut(&id) else {
            return false;
        };
        let before = tags.len();
        tags.retain(|t| t != tag);
        let removed = tags.len() != before;
        if tags.is_empty() {
            self.tags.remove(&id);
        }
        removed
    }

    /// Entities carrying `tag`, in ascending id order
    /// Tagged ids without an entity are skipped
    pub fn by_tag(&self, tag: &str) -> Vec<&Entity<T>> {
        self.ids_by_tag(tag)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Ids carrying `tag`, in ascending order
    pub fn ids_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.tags
            .iter()
            .filter(|(_, tags)| tags.iter().any(|t| t == tag))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn tags_of(&self, id: EntityId) -> &[String] {
        self.tags.get(&id).map(|t| t.as_slice()).unwrap_or(&[])
    }

    pub fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.tags_of(id).iter().any(|t| t == tag)
    }

    /// Drop every tag, entities are kept
    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    pub fn stats(&self) -> SceneStats {
        self.entities
            .iter()
            .fold(SceneStats::default(), |mut stats, e| {
                stats.total += 1;
                if e.is_active() {
                    stats.active += 1;
                }
                if e.is_visible() {
                    stats.visible += 1;
                }
                match e.kind() {
                    EntityKind::Geometry => stats.geometry += 1,
                    EntityKind::Bezier => stats.bezier += 1,
                    EntityKind::Light => stats.light += 1,
                    EntityKind::Other => stats.other += 1,
                }
                stats
            })
    }

    /// Dump every entity and the scene statistics to the log
    pub fn log_debug_info(&self) {
        log::info!("=== scene: {} entities ===", self.entities.len());
        for e in self.entities.iter() {
            let p = e.position();
            log::info!(
                "{} ({}) kind: {} position: ({:.3}, {:.3}, {:.3}) active: {} visible: {} tags: {:?}",
                e.name(),
                e.id(),
                e.kind().name(),
                p.x,
                p.y,
                p.z,
                e.is_active(),
                e.is_visible(),
                self.tags_of(e.id())
            );
        }
        log::info!("{}", self.stats());
    }
}

/// Entity counts of a scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub total: usize,
    pub active: usize,
    pub visible: usize,
    pub geometry: usize,
    pub bezier: usize,
    pub light: usize,
    pub other: usize,
}

impl SceneStats {
    pub fn count_of(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Geometry => self.geometry,
            EntityKind::Bezier => self.bezier,
            EntityKind::Light => self.light,
            EntityKind::Other => self.other,
        }
    }
}

impl fmt::Display for SceneStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {} active: {} visible: {} geometry: {} bezier: {} light: {} other: {}",
            self.total,
            self.active,
            self.visible,
            self.geometry,
            self.bezier,
            self.light,
            self.other
        )
    }
}
