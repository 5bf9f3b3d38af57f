pub mod challenge;
pub mod grade;
pub mod judgment;
pub mod score;

pub use challenge::*;
pub use grade::*;
pub use judgment::*;
pub use score::*;
