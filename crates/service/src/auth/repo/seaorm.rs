use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

/// Resolve role/area names for a stored user row.
async fn to_auth_user(db: &DatabaseConnection, u: models::user::Model) -> Result<AuthUser, AuthError> {
    let role = models::role::Entity::find_by_id(u.role_id)
        .one(db)
        .await
        .map_err(|e| AuthError::Repository(e.to_string()))?
        .ok_or_else(|| AuthError::Repository("role row missing".into()))?;
    let area = models::area::Entity::find_by_id(u.area_id)
        .one(db)
        .await
        .map_err(|e| AuthError::Repository(e.to_string()))?
        .ok_or_else(|| AuthError::Repository("area row missing".into()))?;
    Ok(AuthUser { id: u.id, email: u.email, name: u.name, role: role.name, area: area.name })
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find()
            .filter(models::user::Column::Email.eq(email.to_string()))
            .filter(models::user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        match res {
            Some(u) => Ok(Some(to_auth_user(&self.db, u).await?)),
            None => Ok(None),
        }
    }

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: &str,
        area: &str,
    ) -> Result<AuthUser, AuthError> {
        let role_row = models::role::find_by_name(&self.db, role)
            .await
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        let area_row = models::area::find_by_name(&self.db, area)
            .await
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        let created = models::user::create(&self.db, role_row.id, area_row.id, email, name)
            .await
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(AuthUser {
            id: created.id,
            email: created.email,
            name: created.name,
            role: role_row.name,
            area: area_row.name,
        })
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials {
            user_id: c.user_id,
            password_hash: c.password_hash,
            password_algorithm: c.password_algorithm,
        }))
    }

    async fn upsert_password(
        &self,
        user_id: Uuid,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(Credentials {
            user_id: c.user_id,
            password_hash: c.password_hash,
            password_algorithm: c.password_algorithm,
        })
    }
}
