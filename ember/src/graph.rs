mod conditional;
mod context;
mod instance;
mod module;
mod signal;

pub use conditional::*;
pub use context::*;
pub use instance::*;
pub use module::*;
pub use signal::*;
