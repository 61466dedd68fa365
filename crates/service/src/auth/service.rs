use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument};

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub password_algorithm: String,
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self {
        Self { repo, cfg }
    }

    /// Register a new user with a hashed password.
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let user = self
            .repo
            .create_user(&input.email, &input.name, &input.role, &input.area)
            .await?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let _cred = self
            .repo
            .upsert_password(user.id, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and optionally issue a token.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self
            .repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self
            .repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default()
            .verify_password(input.password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(AuthError::Unauthorized);
        }

        let mut tok = None;
        if let Some(secret) = &self.cfg.jwt_secret {
            tok = Some(token::issue(
                secret,
                user.id,
                &user.email,
                &user.role,
                &user.area,
                self.cfg.token_ttl_hours,
            )?);
        }

        Ok(AuthSession { user, token: tok })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc(secret: Option<&str>) -> AuthService<MockAuthRepository> {
        AuthService::new(
            Arc::new(MockAuthRepository::default()),
            AuthConfig {
                jwt_secret: secret.map(Into::into),
                token_ttl_hours: 1,
                password_algorithm: "argon2".into(),
            },
        )
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            email: email.into(),
            name: "Test".into(),
            password: "Secret123".into(),
            role: "staff".into(),
            area: "design".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_token() {
        let svc = svc(Some("secret"));
        let user = svc.register(register_input("u@example.com")).await.unwrap();
        assert_eq!(user.email, "u@example.com");

        let session = svc
            .login(LoginInput { email: "u@example.com".into(), password: "Secret123".into() })
            .await
            .unwrap();
        assert!(session.token.is_some());
        let claims = token::verify("secret", session.token.as_deref().unwrap()).unwrap();
        assert_eq!(claims.sub, "u@example.com");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let svc = svc(None);
        svc.register(register_input("dup@example.com")).await.unwrap();
        let err = svc.register(register_input("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let svc = svc(None);
        let mut input = register_input("short@example.com");
        input.password = "short".into();
        assert!(matches!(svc.register(input).await.unwrap_err(), AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let svc = svc(None);
        svc.register(register_input("w@example.com")).await.unwrap();
        let err = svc
            .login(LoginInput { email: "w@example.com".into(), password: "nope-nope".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }
}
