pub mod entity;
pub mod entity_store;
pub mod renderer;
pub use entity::*;
pub use entity_store::*;
pub use renderer::*;

#[cfg(test)]
mod tests;
