// artistdb Core - Domain Model & Ports
// NO infrastructure dependencies (hexagonal architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, ErrorKind, Result, RowError, WriteErrors};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
