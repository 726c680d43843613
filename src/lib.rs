#![allow(clippy::needless_range_loop)]

mod curve;
mod knot;
mod misc;
mod scene;
mod session;

pub mod prelude {
    pub use crate::curve::*;
    pub use crate::knot::*;
    pub use crate::misc::*;
    pub use crate::scene::*;
    pub use crate::session::*;
}
