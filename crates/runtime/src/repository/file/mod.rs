//! File-backed repository implementations.

mod state;

pub use state::FileStateRepository;
