//! Session lifecycle manager: register, login, refresh, logout, and the
//! password-reset and password-change flows.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use gatehouse_core::config::AuthConfig;
use gatehouse_database::{IdentityStore, LedgerError, RefreshTokenLedger};
use gatehouse_entity::identity::{CreateIdentity, Identity, PublicIdentity, normalize_email};
use gatehouse_entity::token::{ClientMetadata, RefreshTokenRecord};

use crate::jwt::TokenCodec;
use crate::notify::Notifier;
use crate::password::PasswordHasher;
use crate::token::SecureTokenGenerator;

use super::error::LifecycleError;

/// Plaintext hashed once and verified against when a login names an
/// unknown account, so that path costs the same as a wrong password.
const DUMMY_PASSWORD: &str = "gatehouse-timing-equalizer";

/// Longest accepted email address.
const MAX_EMAIL_LEN: usize = 254;

/// A freshly issued access and refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived, single-use refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Result of a successful registration or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// Issued tokens.
    pub tokens: TokenPair,
    /// The authenticated identity.
    pub user: PublicIdentity,
}

/// Tunables of the reset flow.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// How long a reset token stays redeemable.
    pub reset_token_ttl: Duration,
    /// Entropy of reset tokens, in bytes.
    pub reset_token_bytes: usize,
}

impl LifecycleSettings {
    /// Builds settings from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            reset_token_ttl: Duration::try_minutes(config.reset_token_ttl_minutes)
                .unwrap_or(Duration::MAX),
            reset_token_bytes: config.reset_token_bytes,
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Orchestrates every credential flow over the identity store, the
/// refresh-token ledger, the token codec, and the password hasher.
#[derive(Clone)]
pub struct SessionLifecycle {
    identities: Arc<dyn IdentityStore>,
    ledger: Arc<dyn RefreshTokenLedger>,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
    notifier: Option<Arc<dyn Notifier>>,
    settings: LifecycleSettings,
    dummy_hash: Arc<OnceCell<String>>,
}

impl std::fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("codec", &self.codec)
            .field("notifier", &self.notifier.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl SessionLifecycle {
    /// Creates a lifecycle manager without a notification channel.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        ledger: Arc<dyn RefreshTokenLedger>,
        codec: Arc<TokenCodec>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            identities,
            ledger,
            codec,
            hasher: PasswordHasher::new(),
            notifier: None,
            settings,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Attaches a notification channel. Without one, forgot-password is a
    /// silent no-op.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The token codec, for validating access tokens at the edge.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Runs `fut` with a deadline. On timeout the future is dropped and no
    /// tokens are returned.
    pub async fn with_deadline<T, F>(deadline: StdDuration, fut: F) -> Result<T, LifecycleError>
    where
        F: Future<Output = Result<T, LifecycleError>>,
    {
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "Lifecycle operation timed out");
                Err(LifecycleError::DeadlineExceeded)
            }
        }
    }

    /// Creates an account and signs it in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        client: &ClientMetadata,
    ) -> Result<AuthSession, LifecycleError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        PasswordHasher::validate(password)?;

        if self.identities.find_by_email(&email).await?.is_some() {
            debug!("Registration rejected: email already registered");
            return Err(LifecycleError::Conflict);
        }

        let password_hash = self.hash_password(password).await?;

        // A concurrent registration can still win between the lookup and
        // this insert; the store's uniqueness error is the final word.
        let identity = self
            .identities
            .create(&Identity::from_create(CreateIdentity {
                email,
                password_hash,
            }))
            .await?;

        let tokens = self.issue_pair(&identity, client).await?;

        info!(user_id = %identity.id, "Identity registered");

        Ok(AuthSession {
            tokens,
            user: identity.to_public(),
        })
    }

    /// Authenticates with email and password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientMetadata,
    ) -> Result<AuthSession, LifecycleError> {
        let email = normalize_email(email);

        let Some(mut identity) = self.identities.find_by_email(&email).await? else {
            let dummy = self.dummy_hash().await?;
            let _ = self.verify_password(password, &dummy).await?;
            debug!("Login failed: unknown email");
            return Err(LifecycleError::Unauthorized);
        };

        if !identity.is_active {
            info!(user_id = %identity.id, "Login rejected: account disabled");
            return Err(LifecycleError::Forbidden);
        }

        if !self
            .verify_password(password, &identity.password_hash)
            .await?
        {
            info!(user_id = %identity.id, "Login failed: wrong password");
            return Err(LifecycleError::Unauthorized);
        }

        let now = Utc::now();
        match self.identities.update_last_login(identity.id, now).await {
            Ok(()) => identity.last_login_at = Some(now),
            Err(e) => warn!(user_id = %identity.id, error = %e, "Failed to record last login"),
        }

        let tokens = self.issue_pair(&identity, client).await?;

        info!(user_id = %identity.id, "Login succeeded");

        Ok(AuthSession {
            tokens,
            user: identity.to_public(),
        })
    }

    /// Redeems a refresh token for a new pair. Each refresh token is
    /// redeemable exactly once.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client: &ClientMetadata,
    ) -> Result<TokenPair, LifecycleError> {
        let claims = self.codec.validate_refresh(refresh_token).map_err(|e| {
            debug!(error = %e, "Refresh token rejected by codec");
            LifecycleError::Unauthorized
        })?;

        let digest = SecureTokenGenerator::hash(refresh_token);

        let record = match self.ledger.get_by_hash(&digest).await {
            Ok(record) => record,
            Err(LedgerError::Revoked) => {
                warn!(
                    user_id = %claims.user_id,
                    "Revoked refresh token presented, possible replay"
                );
                return Err(LifecycleError::Unauthorized);
            }
            Err(LedgerError::NotFound) => {
                debug!(user_id = %claims.user_id, "Refresh token not in ledger");
                return Err(LifecycleError::Unauthorized);
            }
            Err(e) => return Err(e.into()),
        };

        if record.user_id != claims.user_id {
            warn!(
                record_id = %record.id,
                "Refresh token subject does not match ledger owner"
            );
            return Err(LifecycleError::Unauthorized);
        }

        let identity = self
            .identities
            .find_by_id(record.user_id)
            .await?
            .ok_or(LifecycleError::Unauthorized)?;
        if !identity.is_active {
            return Err(LifecycleError::Forbidden);
        }

        let (tokens, replacement) = self.mint_pair(&identity, client)?;

        match self.ledger.rotate(&digest, &replacement).await {
            Ok(_) => {}
            Err(LedgerError::NotFound) | Err(LedgerError::Revoked) => {
                warn!(
                    user_id = %identity.id,
                    record_id = %record.id,
                    "Refresh rotation lost to a concurrent redemption"
                );
                return Err(LifecycleError::Unauthorized);
            }
            Err(e) => return Err(e.into()),
        }

        debug!(
            user_id = %identity.id,
            retired = %record.id,
            issued = %replacement.id,
            "Refresh token rotated"
        );

        Ok(tokens)
    }

    /// Revokes every refresh token of the user. Returns the number revoked.
    pub async fn logout(&self, user_id: Uuid) -> Result<u64, LifecycleError> {
        let revoked = self.ledger.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked = revoked, "Logged out");
        Ok(revoked)
    }

    /// Starts a password reset.
    ///
    /// Always succeeds, whether or not the account exists. Every failure,
    /// storage errors included, is logged and swallowed so the outcome never
    /// depends on the account.
    pub async fn forgot_password(&self, email: &str) -> Result<(), LifecycleError> {
        let Some(notifier) = self.notifier.as_ref() else {
            debug!("Forgot-password ignored: no notification channel configured");
            return Ok(());
        };

        let email = normalize_email(email);
        let found = match self.identities.find_by_email(&email).await {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "Forgot-password lookup failed");
                return Ok(());
            }
        };
        let identity = match found {
            Some(identity) if identity.is_active => identity,
            Some(identity) => {
                debug!(user_id = %identity.id, "Forgot-password ignored: account disabled");
                return Ok(());
            }
            None => {
                debug!("Forgot-password ignored: unknown email");
                return Ok(());
            }
        };

        let raw = match SecureTokenGenerator::generate(self.settings.reset_token_bytes) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Failed to generate reset token");
                return Ok(());
            }
        };
        let Some(expires_at) = Utc::now().checked_add_signed(self.settings.reset_token_ttl) else {
            error!("Reset token lifetime overflows the calendar");
            return Ok(());
        };

        if let Err(e) = self
            .identities
            .set_reset_token(identity.id, &SecureTokenGenerator::hash(&raw), expires_at)
            .await
        {
            error!(user_id = %identity.id, error = %e, "Failed to store reset token");
            return Ok(());
        }

        if let Err(e) = notifier.send_password_reset(&identity.email, &raw).await {
            warn!(user_id = %identity.id, error = %e, "Reset notification not delivered");
        }

        info!(user_id = %identity.id, "Password reset issued");
        Ok(())
    }

    /// Completes a password reset with the token from [`forgot_password`].
    ///
    /// [`forgot_password`]: Self::forgot_password
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), LifecycleError> {
        PasswordHasher::validate(new_password)?;
        if token.is_empty() {
            return Err(LifecycleError::InvalidToken);
        }

        let digest = SecureTokenGenerator::hash(token);
        let identity = self
            .identities
            .find_by_reset_token_hash(&digest)
            .await?
            .ok_or(LifecycleError::InvalidToken)?;

        if !identity.reset_token_is_live(Utc::now()) {
            return Err(LifecycleError::ExpiredToken);
        }
        if !identity.is_active {
            return Err(LifecycleError::Forbidden);
        }

        let password_hash = self.hash_password(new_password).await?;

        if !self
            .identities
            .complete_password_reset(identity.id, &password_hash, &digest)
            .await?
        {
            // Consumed or superseded between lookup and update.
            return Err(LifecycleError::InvalidToken);
        }

        let revoked = self.ledger.revoke_all_for_user(identity.id).await?;
        info!(user_id = %identity.id, revoked = revoked, "Password reset completed");

        self.notify_password_changed(&identity).await;
        Ok(())
    }

    /// Changes the password of an authenticated user.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), LifecycleError> {
        let identity = self
            .identities
            .find_by_id(user_id)
            .await?
            .ok_or(LifecycleError::Unauthorized)?;

        if !self
            .verify_password(current_password, &identity.password_hash)
            .await?
        {
            info!(user_id = %user_id, "Password change rejected: wrong current password");
            return Err(LifecycleError::Unauthorized);
        }

        if current_password == new_password {
            return Err(LifecycleError::SamePassword);
        }

        let password_hash = self.hash_password(new_password).await?;
        self.identities
            .update_password(user_id, &password_hash)
            .await?;

        info!(user_id = %user_id, "Password changed");

        self.notify_password_changed(&identity).await;
        Ok(())
    }

    /// Signs a pair and persists its refresh record.
    async fn issue_pair(
        &self,
        identity: &Identity,
        client: &ClientMetadata,
    ) -> Result<TokenPair, LifecycleError> {
        let (tokens, record) = self.mint_pair(identity, client)?;
        self.ledger.create(&record).await?;
        Ok(tokens)
    }

    /// Signs a pair and builds, but does not store, its refresh record.
    fn mint_pair(
        &self,
        identity: &Identity,
        client: &ClientMetadata,
    ) -> Result<(TokenPair, RefreshTokenRecord), LifecycleError> {
        let (access_token, access_expires_at) = self
            .codec
            .issue_access_token(identity.id, &identity.email)?;
        let (refresh_token, refresh_expires_at) = self
            .codec
            .issue_refresh_token(identity.id, &identity.email)?;

        let record = RefreshTokenRecord::new(
            identity.id,
            SecureTokenGenerator::hash(&refresh_token),
            refresh_expires_at,
            client,
        );

        Ok((
            TokenPair {
                access_token,
                refresh_token,
                access_expires_at,
                refresh_expires_at,
            },
            record,
        ))
    }

    async fn notify_password_changed(&self, identity: &Identity) {
        let Some(notifier) = self.notifier.as_ref() else {
            return;
        };
        if let Err(e) = notifier.send_password_changed(&identity.email).await {
            warn!(
                user_id = %identity.id,
                error = %e,
                "Password-changed notification not delivered"
            );
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, LifecycleError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| LifecycleError::Internal(format!("hashing task failed: {e}")))?
            .map_err(LifecycleError::from)
    }

    async fn verify_password(&self, password: &str, digest: &str) -> Result<bool, LifecycleError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| LifecycleError::Internal(format!("verification task failed: {e}")))
    }

    async fn dummy_hash(&self) -> Result<String, LifecycleError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .await
            .cloned()
    }
}

/// Rejects addresses that cannot possibly be deliverable.
fn validate_email(email: &str) -> Result<(), LifecycleError> {
    let invalid = || LifecycleError::Validation("invalid email address".to_string());

    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}
