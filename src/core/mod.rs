pub mod engine;
pub mod index;
pub mod queue;
pub mod resolver;
pub mod scheduler;
pub mod session;

pub use engine::SyncEngine;
pub use index::RemoteIndex;
pub use queue::{TaskKind, TransferDirection, TransferQueue, TransferTask};
pub use resolver::{estimate_time_offset, SyncAction, TimestampPolicy};
pub use scheduler::AutoSyncScheduler;
pub use session::{SyncEvent, SyncReport, SyncSession, SyncStatus};
