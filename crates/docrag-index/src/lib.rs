//! docrag-index
//!
//! Flat, exact nearest-neighbor vector store over document chunks.
//! Corpora are small (one user's locally loaded documents), so a
//! brute-force squared-L2 scan beats an approximate index on both
//! correctness and simplicity.

pub mod snapshot;
pub mod store;

pub use store::VectorStore;
