use std::sync::Arc;

use marquee_model::{UserId, UserRecord};
use tracing::info;

use crate::database::LocalStore;
use crate::error::{Result, SyncError};

/// Local accounts that own relations and episode watches.
#[derive(Clone, Debug)]
pub struct UserStore {
    store: Arc<dyn LocalStore>,
}

impl UserStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SyncError::InvalidInput(
                "username must not be empty".into(),
            ));
        }
        let user = self.store.insert_user(username, password).await?;
        info!("Created local user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>> {
        self.store.find_user_by_username(username.trim()).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        self.store.get_user(id).await
    }
}
