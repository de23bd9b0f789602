pub mod entry;
pub mod feed;
pub mod queue;

pub use entry::Entry;
pub use feed::{FeedDoc, FeedFormat};
pub use queue::{EntryState, QueueEntry, UrlQueue};
