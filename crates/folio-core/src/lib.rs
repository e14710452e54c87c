pub mod config;
pub mod context;
pub mod fallback;
pub mod session;

pub use config::*;
pub use context::*;
pub use fallback::*;
pub use session::*;
