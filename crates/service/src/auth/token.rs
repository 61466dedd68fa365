//! JWT claims shared between the auth service (issuing) and the server's
//! bearer middleware and WebSocket handshake (verifying).

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthError;
use crate::actor::Actor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// user email
    pub sub: String,
    /// user id
    pub uid: String,
    pub role: String,
    pub area: String,
    pub exp: usize,
}

impl Claims {
    pub fn actor(&self) -> Result<Actor, AuthError> {
        let id = Uuid::parse_str(&self.uid).map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(Actor { id, email: self.sub.clone(), role: self.role.clone(), area: self.area.clone() })
    }
}

pub fn issue(
    secret: &str,
    user_id: Uuid,
    email: &str,
    role: &str,
    area: &str,
    ttl_hours: i64,
) -> Result<String, AuthError> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: email.to_string(),
        uid: user_id.to_string(),
        role: role.to_string(),
        area: area.to_string(),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

pub fn verify(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AuthError::TokenError(e.to_string()))?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_roundtrip() {
        let uid = Uuid::new_v4();
        let token = issue("s3cret", uid, "a@example.com", "staff", "design", 1).unwrap();
        let claims = verify("s3cret", &token).unwrap();
        assert_eq!(claims.sub, "a@example.com");
        assert_eq!(claims.role, "staff");
        let actor = claims.actor().unwrap();
        assert_eq!(actor.id, uid);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = issue("right", Uuid::new_v4(), "a@b.c", "staff", "design", 1).unwrap();
        assert!(verify("wrong", &token).is_err());
    }
}
