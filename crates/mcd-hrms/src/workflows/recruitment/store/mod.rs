//! Storage backends for candidate records.

mod memory;
mod sqlite;

pub use memory::MemoryCandidateRepository;
pub use sqlite::SqliteCandidateRepository;
