//! Account service: registration, login, credentials, profile, favorites
//! and history
//!
//! Users live in the relational store regardless of which [`EntityStore`]
//! backend serves poems. Favorites and history reference poems and authors
//! by [`TargetRef`] only; the referenced entity is not checked.
//!
//! [`EntityStore`]: crate::store::EntityStore

pub mod credentials;
pub mod password;
pub mod repository;
pub mod types;

pub use credentials::{extract_bearer, Claims, CredentialIssuer, JwtIssuer};
pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::{NewUser, ProfileChanges, UserRepository};
pub use types::{
    AuthResponse, IssuedCredential, LoginRequest, PublicProfile, RefreshRequest, RegisterRequest,
    UpdateProfileRequest, User, UserStatus, UserTarget,
};

use chrono::Utc;
use shici_common::{Error, Page, PageRequest, Result, TargetKind, TargetRef};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub const USERNAME_LENGTH: RangeInclusive<usize> = 3..=50;
pub const PASSWORD_LENGTH: RangeInclusive<usize> = 6..=50;
pub const MAX_GENDER: i64 = 2;

#[derive(Clone)]
pub struct AccountService {
    users: UserRepository,
    hasher: Arc<dyn PasswordHasher>,
    credentials: Arc<dyn CredentialIssuer>,
    /// Verified against on unknown-username logins so they cost one hash too
    dummy_digest: Arc<OnceCell<String>>,
}

impl AccountService {
    pub fn new(
        users: UserRepository,
        hasher: Arc<dyn PasswordHasher>,
        credentials: Arc<dyn CredentialIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            credentials,
            dummy_digest: Arc::new(OnceCell::new()),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let username = request.username.trim();
        check_length("username", username, USERNAME_LENGTH)?;
        check_length("password", &request.password, PASSWORD_LENGTH)?;

        let email = non_blank(request.email);
        let phone = non_blank(request.phone);

        if self.users.find_by_username(username).await?.is_some() {
            return Err(Error::AlreadyExists(format!("username {} already registered", username)));
        }
        if let Some(email) = &email {
            if self.users.email_taken(email, None).await? {
                return Err(Error::Conflict("email already in use".into()));
            }
        }
        if let Some(phone) = &phone {
            if self.users.phone_taken(phone, None).await? {
                return Err(Error::Conflict("phone already in use".into()));
            }
        }

        let password_hash = self.hash_password(request.password).await?;
        let nickname = non_blank(request.nickname).unwrap_or_else(|| username.to_string());

        // The unique indexes still catch a concurrent registration of the same name
        let user = self
            .users
            .create(NewUser {
                username,
                password_hash: &password_hash,
                nickname: &nickname,
                email: email.as_deref(),
                phone: phone.as_deref(),
            })
            .await?;

        info!("Registered user {} ({})", user.username, user.id);

        let credential = self.credentials.issue(user.id, &user.username)?;
        let now = Utc::now();
        self.users.touch_last_login(user.id, now).await?;
        let user = User {
            last_login_at: Some(now),
            ..user
        };

        Ok(AuthResponse {
            token: credential.token,
            expires_at: credential.expires_at,
            user,
        })
    }

    /// Unknown username and wrong password fail identically. Status is only
    /// consulted once the password has matched.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let user = match self.users.find_by_username(request.username.trim()).await? {
            Some(user) => user,
            None => {
                let digest = self
                    .dummy_digest
                    .get_or_try_init(|| self.hash_password("shici-unknown-user".to_string()))
                    .await?
                    .clone();
                self.verify_password(digest, request.password).await?;
                return Err(Error::InvalidCredentials);
            }
        };

        if !self.verify_password(user.password_hash.clone(), request.password).await? {
            debug!("Password mismatch for user {}", user.id);
            return Err(Error::InvalidCredentials);
        }
        if user.status != UserStatus::Active {
            return Err(Error::Disabled);
        }

        let credential = self.credentials.issue(user.id, &user.username)?;

        let users = self.users.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            if let Err(e) = users.touch_last_login(user_id, Utc::now()).await {
                warn!("Failed to record login time for user {}: {}", user_id, e);
            }
        });

        Ok(AuthResponse {
            token: credential.token,
            expires_at: credential.expires_at,
            user,
        })
    }

    /// Re-issue only inside the near-expiry window
    pub async fn refresh_credential(&self, token: &str) -> Result<IssuedCredential> {
        let claims = self.credentials.validate(token)?;
        let remaining = claims.expires_at() - Utc::now();
        if remaining > self.credentials.refresh_window() {
            return Err(Error::RefreshTooEarly);
        }

        let user = self.credential_owner(claims.user_id).await?;
        debug!("Refreshing credential for user {}", user.id);
        self.credentials.issue(user.id, &user.username)
    }

    /// Validate a bearer credential and return the active user behind it
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.credentials.validate(token)?;
        self.credential_owner(claims.user_id).await
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<User> {
        self.active_user(user_id).await
    }

    pub async fn get_public_profile(&self, user_id: i64) -> Result<PublicProfile> {
        self.active_user(user_id).await.map(PublicProfile::from)
    }

    /// Only non-blank fields overwrite. Contact uniqueness ignores the user's own row.
    pub async fn update_profile(&self, user_id: i64, request: UpdateProfileRequest) -> Result<User> {
        self.active_user(user_id).await?;

        if let Some(gender) = request.gender {
            if !(0..=MAX_GENDER).contains(&gender) {
                return Err(Error::InvalidInput(format!("gender must be 0..={}", MAX_GENDER)));
            }
        }

        let changes = ProfileChanges {
            nickname: non_blank(request.nickname),
            avatar_url: non_blank(request.avatar_url),
            email: non_blank(request.email),
            phone: non_blank(request.phone),
            gender: request.gender,
            province: non_blank(request.province),
            city: non_blank(request.city),
        };

        if let Some(email) = &changes.email {
            if self.users.email_taken(email, Some(user_id)).await? {
                return Err(Error::Conflict("email already in use".into()));
            }
        }
        if let Some(phone) = &changes.phone {
            if self.users.phone_taken(phone, Some(user_id)).await? {
                return Err(Error::Conflict("phone already in use".into()));
            }
        }

        self.users.update_profile(user_id, &changes).await?;
        self.active_user(user_id).await
    }

    pub async fn set_status(&self, user_id: i64, status: UserStatus) -> Result<()> {
        if !self.users.set_status(user_id, status).await? {
            return Err(Error::NotFound(format!("user {}", user_id)));
        }
        info!("User {} status set to {:?}", user_id, status);
        Ok(())
    }

    pub async fn add_favorite(&self, user_id: i64, target: TargetRef) -> Result<UserTarget> {
        check_target(&target)?;
        self.users.add_favorite(user_id, &target).await
    }

    pub async fn remove_favorite(&self, user_id: i64, target: TargetRef) -> Result<()> {
        if !self.users.remove_favorite(user_id, &target).await? {
            return Err(Error::NotFound(format!("favorite {} {}", target.kind().as_str(), target.id())));
        }
        Ok(())
    }

    pub async fn list_favorites(
        &self,
        user_id: i64,
        kind: Option<TargetKind>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<UserTarget>> {
        self.users
            .list_favorites(user_id, kind, PageRequest::new(page, page_size))
            .await
    }

    pub async fn record_history(&self, user_id: i64, target: TargetRef) -> Result<UserTarget> {
        check_target(&target)?;
        self.users.add_history(user_id, &target).await
    }

    pub async fn list_history(
        &self,
        user_id: i64,
        kind: Option<TargetKind>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<UserTarget>> {
        self.users
            .list_history(user_id, kind, PageRequest::new(page, page_size))
            .await
    }

    /// The active user a valid credential names
    async fn credential_owner(&self, user_id: i64) -> Result<User> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.status == UserStatus::Active => Ok(user),
            Some(_) => Err(Error::Disabled),
            None => Err(Error::InvalidToken("unknown user".into())),
        }
    }

    async fn active_user(&self, user_id: i64) -> Result<User> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.status == UserStatus::Active => Ok(user),
            _ => Err(Error::NotFound(format!("user {}", user_id))),
        }
    }

    // Argon2 is CPU-bound; keep it off the async workers
    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, digest: String, password: String) -> Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| Error::Internal(format!("password verification task failed: {}", e)))?
    }
}

fn check_length(field: &str, value: &str, range: RangeInclusive<usize>) -> Result<()> {
    let len = value.chars().count();
    if !range.contains(&len) {
        return Err(Error::InvalidInput(format!(
            "{} must be {}-{} characters",
            field,
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_target(target: &TargetRef) -> Result<()> {
    if target.id().trim().is_empty() {
        return Err(Error::InvalidInput("target id is required".into()));
    }
    Ok(())
}
