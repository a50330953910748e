use async_trait::async_trait;
use marquee_model::{NewUser, User, UserUpdate};
use uuid::Uuid;

use crate::error::Result;

// Accounts and their credentials
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a user with its password hash. A duplicate email yields
    /// `DomainError::Conflict` and writes nothing.
    async fn create_user(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<User>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_user(&self, id: Uuid, update: &UserUpdate) -> Result<User>;
    async fn delete_user(&self, id: Uuid) -> Result<()>;

    async fn get_password_hash(&self, user_id: Uuid) -> Result<Option<String>>;
    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<()>;
}
