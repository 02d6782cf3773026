pub mod args;
pub mod db;
pub mod error;
pub mod handle;
pub mod model;
pub mod util;

pub use db::DbHandle;
pub use error::{Result, SyncError};
pub use handle::service::SyncService;
pub use model::descriptor::{ConnectionDescriptor, EngineKind, RemoteForm};
pub use model::result::{CompareStatus, SyncStatus, TableComparisonResult, TableSyncResult};
