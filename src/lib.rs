// Account Service - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod account;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod seed;
pub mod store;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use account::{Account, AccountFields, AccountType, UnknownAccountType};
pub use codec::Format;
pub use config::{AppConfig, ServerConfig, StoreBackend, StoreConfig};
pub use error::{CodecError, ConfigError, StoreError};
pub use store::{AccountStore, MemoryAccountStore, SqliteAccountStore, StoreResult};

#[cfg(feature = "server")]
pub use api::{router, ApiError, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
