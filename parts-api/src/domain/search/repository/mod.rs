//! Part repository implementations.

#[cfg(test)]
mod mock;
mod sqlite;

#[cfg(test)]
pub use mock::MockPartRepository;
pub(crate) use sqlite::push_filter_predicates;
pub use sqlite::SqlitePartRepository;
