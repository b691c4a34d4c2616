//! Configuration schema and loader (§4.E, §12).

mod error;
mod loader;
mod schema;

pub use error::{ConfigurationError, ConfigurationResult};
pub use loader::{load, ResolvedConfig};
pub use schema::{ExtensionConfig, GroupSpec, RootConfig, SetSpec};
