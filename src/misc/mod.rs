pub mod floating_point;
pub mod ray;

pub use floating_point::*;
pub use ray::*;
