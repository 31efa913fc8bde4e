mod repo;
mod repo_types;

pub use repo::HistoryStore;
pub use repo_types::{HistoryEntry, MealTime};

#[cfg(test)]
pub(crate) use repo::tests::temp_store;
