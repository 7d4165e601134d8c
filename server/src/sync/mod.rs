pub mod sync_batch;
pub mod sync_batcher;
