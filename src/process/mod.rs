pub mod intent;
pub mod queue;
pub mod reconcile;
pub mod transport;

pub use intent::{apply_intent, resolve_intent, IntentLoader, IntentTarget};
pub use queue::{AsMediaItem, QueueBuilder, QueueError};
pub use reconcile::{ArtistPage, Reconciler};
pub use transport::{InMemoryTransport, MediaItem, Transport};
