//! Identity Gateway
//!
//! Login and registration are the same call: an unseen username gets an
//! account with the starting balance and the supplied password, a known one
//! must present the matching password. Either way the caller gets a bearer
//! token.

use std::sync::Arc;

use merchmarket_db::{DbAccount, DbError, Store};
use tracing::{debug, info, warn};

use crate::error::{AuthError, AuthResult};
use crate::jwt::JwtService;
use crate::password::PasswordService;
use crate::types::IssuedToken;

/// Outcome of a successful authentication
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: IssuedToken,
    /// Whether this call created the account
    pub registered: bool,
}

/// Authenticates username/password pairs against the account store
#[derive(Clone)]
pub struct IdentityGateway {
    store: Arc<dyn Store>,
    jwt: JwtService,
    password: PasswordService,
    initial_balance: i64,
}

impl IdentityGateway {
    pub fn new(
        store: Arc<dyn Store>,
        jwt: JwtService,
        password: PasswordService,
        initial_balance: i64,
    ) -> Self {
        Self {
            store,
            jwt,
            password,
            initial_balance,
        }
    }

    /// Authenticate, creating the account on first sight
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<Authenticated> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }

        let existing = self
            .store
            .find_account_by_username(username)
            .await
            .map_err(AuthError::AccountLookupFailed)?;

        let registered = match existing {
            Some(account) => {
                self.check_password(&account, password).await?;
                false
            }
            None => self.register(username, password).await?,
        };

        let token = self.jwt.issue(username)?;

        info!(
            username = %username,
            registered,
            expires_at = %token.expires_at,
            "User authenticated"
        );

        Ok(Authenticated { token, registered })
    }

    /// Create the account. Returns `false` when a concurrent login created it
    /// first and the password matched that account.
    async fn register(&self, username: &str, password: &str) -> AuthResult<bool> {
        let hash = self.hash(password).await?;

        match self
            .store
            .create_account(username, &hash, self.initial_balance)
            .await
        {
            Ok(account) => {
                info!(
                    account_id = account.id,
                    username = %account.username,
                    balance = account.balance,
                    "Account created on first login"
                );
                Ok(true)
            }
            Err(DbError::Duplicate(_)) => {
                debug!(username = %username, "Account created concurrently, re-reading");
                let account = self
                    .store
                    .find_account_by_username(username)
                    .await
                    .map_err(AuthError::AccountLookupFailed)?
                    .ok_or_else(|| {
                        AuthError::Internal(format!("account {} vanished after insert", username))
                    })?;
                self.check_password(&account, password).await?;
                Ok(false)
            }
            Err(e) => Err(AuthError::AccountCreationFailed(e)),
        }
    }

    async fn check_password(&self, account: &DbAccount, password: &str) -> AuthResult<()> {
        let service = self.password.clone();
        let password = password.to_string();
        let hash = account.password_hash.clone();

        let matches = tokio::task::spawn_blocking(move || service.verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;

        if matches {
            Ok(())
        } else {
            warn!(username = %account.username, "Password mismatch");
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn hash(&self, password: &str) -> AuthResult<String> {
        let service = self.password.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || service.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
    }
}
