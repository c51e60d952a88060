//! Persistence for Rally.
//!
//! Records are plain data ([`SessionRecord`], [`UserRecord`]). A
//! [`StoreBackend`] reads and writes them; views ([`SessionView`],
//! [`UserView`]) wrap one record and write every mutation through to the
//! backend before returning. The [`Driver`] picks a backend and hands out
//! views.

pub mod backend;
pub mod driver;
pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod snapshot;
pub mod view;

pub use backend::{SharedStore, StoreBackend};
pub use driver::Driver;
pub use error::{Result, StoreError};
pub use file::{JsonFileStore, StoreDocument};
pub use memory::MemoryStore;
pub use record::{SessionRecord, UserRecord};
pub use snapshot::SnapshotStore;
pub use view::{SessionView, UserView, WeakSessionView};
