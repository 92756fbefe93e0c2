//! Query builder: filter values to a storage-neutral query.

mod builder;
mod types;

pub use builder::{QueryBuilder, DEFAULT_LIMIT, MAX_LIMIT};
pub use types::{escape_like, Predicate, Query, SortKey, Window};
