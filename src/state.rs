//! Shared application state, built once at startup and cloned into every handler.

use crate::config::SearchConfig;
use crate::error::ConfigError;
use crate::filter::FilterModel;
use crate::model::{user_rules, USER_FILTER_FIELDS, USER_SCHEMA};
use crate::query::QueryBuilder;
use crate::service::{UserService, Validator};
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub queries: Arc<QueryBuilder>,
    pub validator: Arc<Validator>,
}

impl AppState {
    /// Resolve the user filter model and validation rules; any error here is fatal.
    pub fn new(store: Arc<dyn DocumentStore>, search: &SearchConfig) -> Result<Self, ConfigError> {
        let model = FilterModel::build(&USER_SCHEMA, USER_FILTER_FIELDS, search.strict)?;
        let queries = QueryBuilder::new(Arc::new(model)).with_limits(search.default_limit, search.max_limit);
        let validator = Validator::new(&USER_SCHEMA, user_rules())?;
        Ok(AppState {
            users: Arc::new(UserService::new(store)),
            queries: Arc::new(queries),
            validator: Arc::new(validator),
        })
    }
}
