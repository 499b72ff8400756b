pub mod dataset;
pub mod memory_store;
