//! Account creation.

use crate::error::{ProvisionError, ProvisionResult};
use crate::record::IdentityRecord;
use roster_client::models::CreateUserRequest;
use roster_client::AdminApi;
use std::sync::Arc;
use tracing::{info, warn};

/// Creates one platform account per identity record.
///
/// Creation is not retried: a second attempt after an ambiguous failure could
/// create a duplicate account.
#[derive(Clone)]
pub struct AccountCreator {
    api: Arc<dyn AdminApi>,
}

impl AccountCreator {
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self { api }
    }

    /// Create the account and return the id the platform assigned.
    pub async fn create(&self, record: &IdentityRecord) -> ProvisionResult<String> {
        let request = CreateUserRequest {
            name: record.name.clone(),
            email: record.email.clone(),
            password: record.password.clone(),
        };

        match self.api.create_user(&request).await {
            Ok(user) => {
                info!(name = %record.name, email = %record.email, user_id = %user.id, "Account created");
                Ok(user.id)
            }
            Err(source) => {
                warn!(name = %record.name, email = %record.email, error = %source, "Account creation failed");
                Err(ProvisionError::RemoteCreate {
                    name: record.name.clone(),
                    source,
                })
            }
        }
    }
}
