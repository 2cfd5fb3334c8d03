//! Authentication service for registration, login and refresh-token rotation.

use chrono::{Duration, Utc};
use domain::models::user::User;
use persistence::repositories::{SessionRepository, UserRepository};
use shared::crypto::sha256_hex;
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use shared::password::{check_password_strength, hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Access and refresh token pair issued on login, registration and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub tokens: TokenPair,
}

/// Service handling credential checks and session bookkeeping.
///
/// Refresh tokens are single use: each refresh replaces the session's stored
/// token hash, so replaying an old refresh token fails.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
            jwt,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthResult, AuthError> {
        check_password_strength(password).map_err(AuthError::WeakPassword)?;

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let entity = self
            .users
            .create_user(email, &password_hash, display_name.trim())
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    AuthError::EmailAlreadyExists
                }
                _ => AuthError::Database(e),
            })?;

        let user: User = entity.into();
        let tokens = self.start_session(user.id).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(AuthResult { user, tokens })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let entity = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = entity
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, hash)? {
            tracing::info!(user_id = %entity.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let user: User = entity.into();
        let tokens = self.start_session(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AuthResult { user, tokens })
    }

    /// Exchanges a refresh token for a new pair and rotates the session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;

        let old_hash = sha256_hex(&claims.jti);
        let session = self
            .sessions
            .find_by_refresh_hash(&old_hash)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if session.user_id != user_id || session.is_expired(Utc::now()) {
            return Err(AuthError::InvalidRefreshToken);
        }

        if self.users.find_by_id(user_id).await?.is_none() {
            self.sessions.delete(session.id).await?;
            return Err(AuthError::UserNotFound);
        }

        let (access_token, _) = self.jwt.generate_access_token(user_id)?;
        let (new_refresh, new_jti) = self.jwt.generate_refresh_token(user_id)?;

        let rotated = self
            .sessions
            .rotate(
                session.id,
                &old_hash,
                &sha256_hex(&new_jti),
                self.refresh_expiry(),
            )
            .await?;
        if !rotated {
            return Err(AuthError::InvalidRefreshToken);
        }

        tracing::debug!(user_id = %user_id, session_id = %session.id, "Session refreshed");
        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh,
            expires_in: self.jwt.access_token_expiry_secs,
        })
    }

    /// Ends the session behind `refresh_token`, or every session of the user
    /// when `all_devices` is set.
    pub async fn logout(
        &self,
        user_id: Uuid,
        refresh_token: Option<&str>,
        all_devices: bool,
    ) -> Result<u64, AuthError> {
        if all_devices {
            let ended = self.sessions.delete_all_for_user(user_id).await?;
            tracing::info!(user_id = %user_id, sessions = ended, "Logged out everywhere");
            return Ok(ended);
        }

        let Some(token) = refresh_token else {
            return Ok(0);
        };
        let claims = self
            .jwt
            .validate_refresh_token(token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        if extract_user_id(&claims).ok() != Some(user_id) {
            return Err(AuthError::InvalidRefreshToken);
        }

        let Some(session) = self
            .sessions
            .find_by_refresh_hash(&sha256_hex(&claims.jti))
            .await?
        else {
            return Ok(0);
        };
        let ended = u64::from(self.sessions.delete(session.id).await?);
        tracing::info!(user_id = %user_id, "Logged out");
        Ok(ended)
    }

    async fn start_session(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.jwt.generate_access_token(user_id)?;
        let (refresh_token, refresh_jti) = self.jwt.generate_refresh_token(user_id)?;

        self.sessions
            .create(user_id, &sha256_hex(&refresh_jti), self.refresh_expiry())
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_expiry_secs,
        })
    }

    fn refresh_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::seconds(self.jwt.refresh_token_expiry_secs)
    }
}
