mod store;
mod writer;

pub use store::MutationQueueStore;
pub use writer::QueueWriter;
