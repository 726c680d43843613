pub mod bezier_curve;
pub mod nurbs_curve;
pub mod rational;
pub use bezier_curve::*;
pub use nurbs_curve::*;
pub use rational::*;
