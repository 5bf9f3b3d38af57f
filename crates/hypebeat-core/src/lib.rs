pub mod clock;
pub mod diagnostics;
pub mod ipc;
pub mod lane;
pub mod local_storage;
pub mod observer;
pub mod scheduler;
pub mod session;

pub use clock::*;
pub use diagnostics::*;
pub use ipc::*;
pub use lane::*;
pub use local_storage::*;
pub use observer::*;
pub use scheduler::*;
pub use session::*;
