pub mod curve_edit_option;
pub mod curve_edit_session;
pub use curve_edit_option::*;
pub use curve_edit_session::*;
