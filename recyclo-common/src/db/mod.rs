//! SQLite persistence

pub mod init;
pub mod logs;
pub mod schema_sync;
pub mod table_schemas;

pub use init::*;
pub use logs::*;
pub use schema_sync::*;
pub use table_schemas::*;
