//! UserService: thin orchestration over `Repository<User>`.

use crate::error::AppError;
use crate::model::{Patch, SearchResult, User};
use crate::query::Query;
use crate::repository::Repository;
use crate::store::{CreateOutcome, DeleteOutcome, DocumentStore, WriteOutcome};
use std::sync::Arc;

pub struct UserService {
    repo: Repository<User>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        UserService {
            repo: Repository::new(store),
        }
    }

    pub async fn all(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.all().await?)
    }

    pub async fn load(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.repo.load(id).await?)
    }

    /// Insert `user`, generating an id when it has none. Returns the stored user.
    pub async fn create(&self, mut user: User) -> Result<(CreateOutcome, User), AppError> {
        if user.id.trim().is_empty() {
            user.id = uuid::Uuid::new_v4().simple().to_string();
        }
        let outcome = self.repo.create(&user).await?;
        Ok((outcome, user))
    }

    pub async fn update(&self, user: &User) -> Result<WriteOutcome, AppError> {
        Ok(self.repo.update(user).await?)
    }

    pub async fn patch(&self, id: &str, patch: &Patch) -> Result<WriteOutcome, AppError> {
        Ok(self.repo.patch(id, patch).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, AppError> {
        Ok(self.repo.delete(id).await?)
    }

    pub async fn search(&self, query: &Query) -> Result<SearchResult<User>, AppError> {
        let (list, total) = self.repo.search(query).await?;
        Ok(SearchResult { list, total })
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        Ok(self.repo.ping().await?)
    }
}
