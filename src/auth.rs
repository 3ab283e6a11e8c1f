// =============================================================================
// Green City Backend - Authentication & Authorization
// =============================================================================

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::db::{Role, User};
use crate::error::AppError;
use crate::AppState;

// -----------------------------------------------------------------------------
// Password Hashing
// -----------------------------------------------------------------------------

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hash a password with PBKDF2-HMAC-SHA256. The stored value is
/// hex(salt || derived key) so verification can recover the salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut derived);

    let mut stored = Vec::with_capacity(SALT_LEN + KEY_LEN);
    stored.extend_from_slice(&salt);
    stored.extend_from_slice(&derived);
    hex::encode(stored)
}

/// Verify a password against a stored salt||key hash. The final comparison
/// is constant-time.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Ok(bytes) = hex::decode(stored) else {
        return false;
    };
    if bytes.len() != SALT_LEN + KEY_LEN {
        return false;
    }
    let (salt, expected) = bytes.split_at(SALT_LEN);

    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut derived);

    derived.as_slice().ct_eq(expected).into()
}

// -----------------------------------------------------------------------------
// JWT Claims
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role: Role,
    pub iat: i64, // Issued at
    pub exp: i64, // Expiry timestamp
}

/// Generate a signed JWT for a user.
pub fn generate_token(user: &User, secret: &str, expiry_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours);

    let claims = Claims {
        sub: user.id.clone(),
        role: user.role,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal)
}

/// Validate a JWT and extract its claims. Every failure mode (malformed,
/// bad signature, expired) maps to the same error so responses don't reveal
/// which check tripped.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

// -----------------------------------------------------------------------------
// Authorization Gate (Extractors)
// -----------------------------------------------------------------------------

/// Authenticated user resolved from the bearer token. The token subject is
/// re-checked against the users table, so a deleted account is rejected even
/// while its token is formally valid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::MissingToken)?;

        let claims = validate_token(token, &state.config.jwt_secret)?;

        let user = state
            .db
            .find_user_by_id(&claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok(AuthUser(user))
    }
}

/// Authenticated user with the admin role. Composes on top of [`AuthUser`]:
/// same 401 behavior, plus a 403 when the resolved role is not admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}

// -----------------------------------------------------------------------------
// Request/Response Types
// -----------------------------------------------------------------------------

/// Fields are `Option` so a missing field reports as a 400 with a clear
/// message rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// Register a new user. Self-service registration only allows the teacher
/// and civilian roles.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let (username, password, role) = match (
        req.username.filter(|s| !s.is_empty()),
        req.password.filter(|s| !s.is_empty()),
        req.role.filter(|s| !s.is_empty()),
    ) {
        (Some(u), Some(p), Some(r)) => (u, p, r),
        _ => {
            return Err(AppError::Validation(
                "Username, password, and role are required".into(),
            ))
        }
    };

    let role = Role::parse_registerable(&role).ok_or_else(|| {
        AppError::Validation("Invalid role. Must be teacher or civilian.".into())
    })?;

    if state.db.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let password_hash = hash_password(&password);
    let user_id = uuid::Uuid::new_v4().to_string();
    state
        .db
        .create_user(&user_id, &username, &password_hash, role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User registered successfully" })),
    ))
}

/// Login with username and password. An unknown username and a wrong
/// password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (Some(username), Some(password)) = (req.username, req.password) else {
        return Err(AppError::InvalidCredentials);
    };

    let user = state
        .db
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&user.password_hash, &password) {
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_token(&user, &state.config.jwt_secret, state.config.jwt_expiry_hours)?;

    Ok(Json(LoginResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u-1".into(),
            username: "alice".into(),
            password_hash: hash_password("pw123"),
            role,
        }
    }

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("pw123");
        assert!(verify_password(&stored, "pw123"));
        assert!(!verify_password(&stored, "pw124"));
        assert!(!verify_password(&stored, ""));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        assert_ne!(hash_password("pw123"), hash_password("pw123"));
    }

    #[test]
    fn test_verify_rejects_garbage_stored_value() {
        assert!(!verify_password("not hex", "pw123"));
        assert!(!verify_password("abcd", "pw123"));
    }

    #[test]
    fn test_token_round_trip() {
        let user = user(Role::Civilian);
        let token = generate_token(&user, "secret", 24).unwrap();
        let claims = validate_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, Role::Civilian);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_wrong_secret_rejected() {
        let token = generate_token(&user(Role::Admin), "secret", 24).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Issued two hours in the past, well beyond the default leeway.
        let token = generate_token(&user(Role::Civilian), "secret", -2).unwrap();
        assert!(matches!(
            validate_token(&token, "secret"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(matches!(
            validate_token("not.a.jwt", "secret"),
            Err(AppError::InvalidToken)
        ));
    }
}
