//! Resource types and their static schema tables.

mod patch;
mod schema;
mod user;

pub use patch::Patch;
pub use schema::{Attribute, Resource, ResourceSchema, ValueType};
pub use user::{user_rules, User, UserFilter, USER_FILTER_FIELDS, USER_SCHEMA, USER_STATUSES};

/// Page of search results with the total count over the whole filter.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SearchResult<T> {
    pub list: Vec<T>,
    pub total: u64,
}
