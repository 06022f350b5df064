// Queue module exports

pub mod store;

pub use store::{QueueStats, QueueStore};
