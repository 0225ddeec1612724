use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::Session;

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: String, // User document id
    pub sid: Uuid,   // Server-side session id
    pub exp: usize,  // Expiration timestamp
}

/// Sign a token for an open session. It expires with the session.
pub fn sign(secret: &str, session: &Session) -> Result<String> {
    let claims = Claims {
        sub: session.username.clone(),
        uid: session.user_id.clone(),
        sid: session.id,
        exp: session.expires_at.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a token. Does not check that the session is still live.
pub fn verify(secret: &str, token: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
