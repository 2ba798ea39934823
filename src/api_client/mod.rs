pub mod parser;
pub mod payload;
mod remote;
mod sync_error;

pub use remote::*;
pub use sync_error::{ErrorKind, SyncError};
