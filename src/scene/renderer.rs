use nalgebra::Matrix4;

use crate::misc::FloatingPoint;
use crate::scene::Shape;

/// Sink for the drawable payloads of a scene
///
/// The store never talks to a graphics API, it hands every drawable shape
/// together with the model matrix of its entity to an implementor of this trait.
pub trait Renderer<T: FloatingPoint> {
    fn draw(&mut self, model: &Matrix4<T>, shape: &Shape<T>);
}
