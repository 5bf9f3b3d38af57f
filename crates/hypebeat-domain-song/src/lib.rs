pub mod catalog;
pub mod model;

pub use catalog::*;
pub use model::*;
