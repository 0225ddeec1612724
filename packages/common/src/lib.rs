pub mod backend;
pub mod docstore;
pub mod storage;

pub use backend::{Backend, NotConfigured};
