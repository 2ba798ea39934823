pub mod api_client;
pub mod configuration;
pub mod foundation;
pub mod logging;
pub mod process;
pub mod startup;

pub use api_client::{InnertubeClient, RemoteApi, SyncError};
pub use configuration::*;
pub use foundation::database::*;
pub use process::{QueueBuilder, Reconciler};
