pub mod clock;
pub mod storage;
pub mod synth;
pub mod types;
pub mod visual;

pub use clock::*;
pub use storage::*;
pub use synth::*;
pub use types::*;
pub use visual::*;
