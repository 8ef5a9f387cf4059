pub mod coordinator;
pub mod remote;

pub use coordinator::{SyncCoordinator, TickReport};
pub use remote::{HttpRemote, RemoteStore};
