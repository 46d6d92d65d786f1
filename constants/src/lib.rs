//! Design constants shared by the viewer crates.

pub mod lighting;
pub mod overlay;
pub mod path;
pub mod session;
pub mod stage;
