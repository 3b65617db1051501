/// Configuration management
pub mod session;

pub use session::*;
