use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::{config::AppConfig, error::ApiError, notify::Notifier};

use super::{
    jwt::{Claims, JwtKeys},
    password::{hash_password, verify_password},
    reset::generate_reset_token,
    store::CredentialStore,
    user::{NewUser, PublicUser, Role},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Self-registration. The stored role is Staff no matter what the request
/// carried; elevated accounts only come from an admin (`users` module).
pub async fn register(
    store: &dyn CredentialStore,
    keys: &JwtKeys,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(String, PublicUser), ApiError> {
    let name = name.trim();
    let email = email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("all fields are required".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if store.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(password)?;
    let user = store
        .create(NewUser {
            name: name.to_string(),
            email,
            password_hash,
            role: Role::Staff,
        })
        .await?;

    let token = keys.sign(&user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((token, PublicUser::from(&user)))
}

/// Credential check. Unknown email and wrong password are deliberately
/// indistinguishable to the caller.
pub async fn login(
    store: &dyn CredentialStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<(String, PublicUser), ApiError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("email and password are required".into()));
    }

    let Some(user) = store.find_by_email(&email).await? else {
        warn!(%email, "login failed: unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login failed: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, PublicUser::from(&user)))
}

/// Live lookup behind `GET /auth/me`; the one place claims are re-checked
/// against the store, so a deleted account stops resolving.
pub async fn current_user(
    store: &dyn CredentialStore,
    claims: &Claims,
) -> Result<PublicUser, ApiError> {
    let user = store
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(PublicUser::from(&user))
}

/// First half of the admin-mediated reset: mint a fresh token on the account
/// (overwriting any outstanding one) and route it to the administrator, not
/// the requesting user. Unknown addresses are disclosed on purpose so the
/// requester learns the email is wrong before involving the admin.
pub async fn request_password_reset(
    store: &dyn CredentialStore,
    notifier: &dyn Notifier,
    config: &AppConfig,
    email: &str,
) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }

    let Some(mut user) = store.find_by_email(&email).await? else {
        return Err(ApiError::UnknownEmail);
    };

    let token = generate_reset_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(config.reset_token_ttl_minutes);
    user.reset_token = Some(token.clone());
    user.reset_token_expires_at = Some(expires_at);
    store.save(&user).await?;

    let delivered = notifier
        .notify(
            &config.admin_email,
            "Password reset request",
            &format!(
                "{} <{}> requested a password reset.\n\
                 Reset token: {}\n\
                 The token expires in {} minutes.",
                user.name, user.email, token, config.reset_token_ttl_minutes
            ),
        )
        .await;
    if !delivered {
        warn!(user_id = %user.id, "reset token not delivered to administrator");
    }

    info!(user_id = %user.id, "password reset requested");
    Ok("Password reset request has been sent to the administrator. \
        You will receive your new password via email once the administrator resets it."
        .to_string())
}

/// Second half: an Admin redeems the token, the hash rotates, the token is
/// cleared (single use) and the new plaintext goes to the affected user. The
/// plaintext is also returned so the admin can relay it over another channel.
pub async fn admin_complete_password_reset(
    store: &dyn CredentialStore,
    notifier: &dyn Notifier,
    acting: &Claims,
    token: &str,
    email: &str,
    new_password: &str,
) -> Result<(String, String), ApiError> {
    acting.authorize(&[Role::Admin])?;

    if token.is_empty() || email.is_empty() || new_password.is_empty() {
        return Err(ApiError::Validation(
            "token, email and new password are required".into(),
        ));
    }
    if new_password.len() < 6 {
        return Err(ApiError::Validation(
            "password must be at least 6 characters long".into(),
        ));
    }

    let email = email.trim().to_lowercase();
    let Some(mut user) = store.find_by_reset_token(&email, token).await? else {
        warn!(%email, "reset attempted with invalid or expired token");
        return Err(ApiError::InvalidOrExpiredToken);
    };

    user.password_hash = hash_password(new_password)?;
    user.reset_token = None;
    user.reset_token_expires_at = None;
    store.save(&user).await?;

    let delivered = notifier
        .notify(
            &user.email,
            "Your password has been reset",
            &format!(
                "Hello {},\n\
                 your password has been reset by the administrator.\n\
                 Your new password: {}\n\
                 Please log in and change it.",
                user.name, new_password
            ),
        )
        .await;
    if !delivered {
        warn!(user_id = %user.id, "new password not delivered to user");
    }

    info!(user_id = %user.id, admin = %acting.sub, "password reset completed");
    Ok((
        "Password reset successfully. The new password has been sent to the user via email."
            .to_string(),
        new_password.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use time::Duration;
    use uuid::Uuid;

    use crate::auth::store::memory::MemoryCredentialStore;
    use crate::config::JwtConfig;
    use crate::notify::testing::RecordingNotifier;

    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "unit-test-secret".into(),
            expires_in_days: 7,
        })
    }

    fn config() -> AppConfig {
        AppConfig {
            database_url: String::new(),
            jwt: JwtConfig {
                secret: "unit-test-secret".into(),
                expires_in_days: 7,
            },
            admin_email: "admin@uni.edu".into(),
            reset_token_ttl_minutes: 60,
        }
    }

    fn claims_for(role: Role) -> Claims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Claims {
            sub: Uuid::new_v4(),
            email: "acting@uni.edu".into(),
            role,
            iat: now as usize,
            exp: (now + 3600) as usize,
        }
    }

    async fn register_jane(store: &MemoryCredentialStore) -> (String, PublicUser) {
        register(store, &keys(), "Jane Doe", "jane@x.edu", "secret1")
            .await
            .expect("registration should succeed")
    }

    #[tokio::test]
    async fn registration_always_stores_staff_role() {
        let store = MemoryCredentialStore::default();
        let (token, user) = register_jane(&store).await;

        assert_eq!(user.role, Role::Staff);
        assert_eq!(store.snapshot_by_email("jane@x.edu").unwrap().role, Role::Staff);

        // The role travels inside the token too.
        let claims = keys().verify(&token).unwrap();
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.email, "jane@x.edu");
    }

    #[tokio::test]
    async fn registration_validates_input_and_duplicates() {
        let store = MemoryCredentialStore::default();

        let err = register(&store, &keys(), "", "jane@x.edu", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = register(&store, &keys(), "Jane", "not-an-email", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        register_jane(&store).await;
        // Duplicate detection is case-insensitive.
        let err = register(&store, &keys(), "Jane Again", "JANE@X.EDU", "other1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryCredentialStore::default();
        register_jane(&store).await;

        let wrong_password = login(&store, &keys(), "jane@x.edu", "wrong")
            .await
            .unwrap_err();
        let unknown_email = login(&store, &keys(), "nobody@x.edu", "secret1")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.status(), unknown_email.status());
    }

    #[tokio::test]
    async fn login_returns_token_with_embedded_role() {
        let store = MemoryCredentialStore::default();
        register_jane(&store).await;

        let (token, user) = login(&store, &keys(), "jane@x.edu", "secret1")
            .await
            .expect("login should succeed");
        assert_eq!(user.role, Role::Staff);
        assert_eq!(keys().verify(&token).unwrap().role, Role::Staff);
    }

    #[tokio::test]
    async fn reset_token_routes_to_admin_and_rotates_password() {
        let store = MemoryCredentialStore::default();
        let notifier = RecordingNotifier::default();
        register_jane(&store).await;

        request_password_reset(&store, &notifier, &config(), "jane@x.edu")
            .await
            .expect("request should succeed");

        // The token goes to the administrator, never to Jane.
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "admin@uni.edu");
        let stored = store.snapshot_by_email("jane@x.edu").unwrap();
        let token = stored.reset_token.clone().expect("token persisted");
        assert!(sent[0].body.contains(&token));
        assert!(sent[0].body.contains("Jane Doe"));

        // Expiry is one hour out.
        let expires_at = stored.reset_token_expires_at.expect("expiry persisted");
        let ttl = expires_at - OffsetDateTime::now_utc();
        assert!(ttl > Duration::minutes(59) && ttl <= Duration::minutes(60));

        let (_, new_password) = admin_complete_password_reset(
            &store,
            &notifier,
            &claims_for(Role::Admin),
            &token,
            "jane@x.edu",
            "newpass1",
        )
        .await
        .expect("reset should succeed");
        assert_eq!(new_password, "newpass1");

        // The new plaintext is sent to the affected user.
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].to, "jane@x.edu");
        assert!(sent[1].body.contains("newpass1"));

        // Old password is dead, new one works.
        assert!(matches!(
            login(&store, &keys(), "jane@x.edu", "secret1")
                .await
                .unwrap_err(),
            ApiError::InvalidCredentials
        ));
        login(&store, &keys(), "jane@x.edu", "newpass1")
            .await
            .expect("new password should log in");

        // Single use: the same token is now invalid.
        let err = admin_complete_password_reset(
            &store,
            &notifier,
            &claims_for(Role::Admin),
            &token,
            "jane@x.edu",
            "another1",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn second_request_invalidates_first_token() {
        let store = MemoryCredentialStore::default();
        let notifier = RecordingNotifier::default();
        register_jane(&store).await;

        request_password_reset(&store, &notifier, &config(), "jane@x.edu")
            .await
            .unwrap();
        let first = store
            .snapshot_by_email("jane@x.edu")
            .unwrap()
            .reset_token
            .unwrap();

        request_password_reset(&store, &notifier, &config(), "jane@x.edu")
            .await
            .unwrap();
        let second = store
            .snapshot_by_email("jane@x.edu")
            .unwrap()
            .reset_token
            .unwrap();
        assert_ne!(first, second);

        // The first token no longer satisfies the lookup predicate even
        // though its expiry has not elapsed.
        let err = admin_complete_password_reset(
            &store,
            &notifier,
            &claims_for(Role::Admin),
            &first,
            "jane@x.edu",
            "newpass1",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let store = MemoryCredentialStore::default();
        let notifier = RecordingNotifier::default();
        register_jane(&store).await;

        request_password_reset(&store, &notifier, &config(), "jane@x.edu")
            .await
            .unwrap();
        let token = store
            .snapshot_by_email("jane@x.edu")
            .unwrap()
            .reset_token
            .unwrap();

        store.mutate_by_email("jane@x.edu", |u| {
            u.reset_token_expires_at = Some(OffsetDateTime::now_utc() - Duration::seconds(1));
        });

        let err = admin_complete_password_reset(
            &store,
            &notifier,
            &claims_for(Role::Admin),
            &token,
            "jane@x.edu",
            "newpass1",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn reset_completion_requires_admin_role() {
        let store = MemoryCredentialStore::default();
        let notifier = RecordingNotifier::default();
        register_jane(&store).await;

        request_password_reset(&store, &notifier, &config(), "jane@x.edu")
            .await
            .unwrap();
        let token = store
            .snapshot_by_email("jane@x.edu")
            .unwrap()
            .reset_token
            .unwrap();

        // Even with a valid token and email, non-admins are refused.
        for role in [Role::InventoryManager, Role::Staff] {
            let err = admin_complete_password_reset(
                &store,
                &notifier,
                &claims_for(role),
                &token,
                "jane@x.edu",
                "newpass1",
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(_)));
        }

        // The refusal happened before any mutation: the token still works.
        admin_complete_password_reset(
            &store,
            &notifier,
            &claims_for(Role::Admin),
            &token,
            "jane@x.edu",
            "newpass1",
        )
        .await
        .expect("admin should still be able to redeem the token");
    }

    #[tokio::test]
    async fn reset_request_discloses_unknown_email() {
        let store = MemoryCredentialStore::default();
        let notifier = RecordingNotifier::default();

        let err = request_password_reset(&store, &notifier, &config(), "nobody@x.edu")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownEmail));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn reset_rejects_short_password() {
        let store = MemoryCredentialStore::default();
        let notifier = RecordingNotifier::default();
        register_jane(&store).await;

        request_password_reset(&store, &notifier, &config(), "jane@x.edu")
            .await
            .unwrap();
        let token = store
            .snapshot_by_email("jane@x.edu")
            .unwrap()
            .reset_token
            .unwrap();

        let err = admin_complete_password_reset(
            &store,
            &notifier,
            &claims_for(Role::Admin),
            &token,
            "jane@x.edu",
            "short",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn current_user_fails_after_deletion() {
        let store = MemoryCredentialStore::default();
        let (token, user) = register_jane(&store).await;
        let claims = keys().verify(&token).unwrap();

        assert_eq!(
            current_user(&store, &claims).await.unwrap().email,
            "jane@x.edu"
        );

        store.delete(user.id).await.unwrap();
        assert!(matches!(
            current_user(&store, &claims).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("jane@x.edu"));
        assert!(is_valid_email("a.b+c@dept.uni.edu"));
        assert!(!is_valid_email("jane@x"));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("jane @x.edu"));
    }
}
