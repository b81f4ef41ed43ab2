use std::sync::Arc;

use tracing::{info, warn};

use super::{
    dto::{AccessToken, TokenPair, TOKEN_TYPE},
    jwt::{JwtKeys, TokenKind},
    password::{verify_dummy, verify_password_blocking},
};
use crate::{
    error::AppError,
    users::{User, UserService},
};

/// Credential checks and token issuance on top of [`UserService`].
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    keys: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(users: UserService, keys: Arc<JwtKeys>) -> Self {
        Self { users, keys }
    }

    /// Unknown username and wrong password fail identically.
    pub async fn authenticate_and_issue_tokens(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AppError> {
        // registration stores the trimmed username
        let username = username.trim();
        let user = match self.users.get_by_username(username).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                let password = password.to_string();
                let _ = tokio::task::spawn_blocking(move || verify_dummy(&password)).await;
                warn!("login with unknown username");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !verify_password_blocking(password.to_string(), user.hashed_password.clone()).await? {
            warn!(user_id = user.id, "login with invalid password");
            return Err(AppError::InvalidCredentials);
        }
        ensure_active(&user)?;

        let access_token = self.keys.issue_access(user.id, Some(&user.username))?;
        let refresh_token = self.keys.issue_refresh(user.id)?;

        info!(user_id = user.id, "user logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken, AppError> {
        let claims = self
            .keys
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                warn!(error = %e, "refresh token rejected");
                AppError::InvalidToken(e)
            })?;

        let user = self.users.get_by_id(claims.user_id()?).await?;
        ensure_active(&user)?;

        let access_token = self.keys.issue_access(user.id, Some(&user.username))?;
        info!(user_id = user.id, "access token refreshed");
        Ok(AccessToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Resolves the user behind a bearer access token.
    pub async fn current_user(&self, access_token: &str) -> Result<User, AppError> {
        let claims = self
            .keys
            .verify(access_token, TokenKind::Access)
            .map_err(|e| {
                warn!(error = %e, "access token rejected");
                AppError::InvalidToken(e)
            })?;
        let user = self.users.get_by_id(claims.user_id()?).await?;
        ensure_active(&user)?;
        Ok(user)
    }
}

fn ensure_active(user: &User) -> Result<(), AppError> {
    if user.is_active {
        Ok(())
    } else {
        warn!(user_id = user.id, "inactive account");
        Err(AppError::AccountInactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{tests::test_config, TokenError};
    use crate::repo::{MemoryRepository, Repository};
    use crate::users::dto::RegisterRequest;

    struct Fixture {
        repo: Arc<MemoryRepository<User>>,
        users: UserService,
        auth: AuthService,
        keys: Arc<JwtKeys>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::<User>::new());
        let users = UserService::new(repo.clone());
        let keys = Arc::new(JwtKeys::new(&test_config("auth-secret")));
        let auth = AuthService::new(users.clone(), keys.clone());
        Fixture {
            repo,
            users,
            auth,
            keys,
        }
    }

    async fn register_alice(f: &Fixture) -> User {
        f.users
            .register(RegisterRequest {
                first_name: "Alice".into(),
                last_name: "Liddell".into(),
                username: "alice".into(),
                email: "alice@x.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_issues_a_usable_token_pair() {
        let f = fixture();
        let alice = register_alice(&f).await;

        let pair = f
            .auth
            .authenticate_and_issue_tokens("alice", "secret123")
            .await
            .unwrap();
        assert_eq!(pair.token_type, "bearer");

        let claims = f.keys.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), alice.id);
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert!(f.keys.verify(&pair.refresh_token, TokenKind::Refresh).is_ok());

        let me = f.auth.current_user(&pair.access_token).await.unwrap();
        assert_eq!(me.id, alice.id);
    }

    #[tokio::test]
    async fn login_ignores_surrounding_whitespace_in_the_username() {
        let f = fixture();
        let alice = register_alice(&f).await;

        let pair = f
            .auth
            .authenticate_and_issue_tokens("  alice\t", "secret123")
            .await
            .unwrap();
        let claims = f.keys.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), alice.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let f = fixture();
        register_alice(&f).await;

        let wrong = f
            .auth
            .authenticate_and_issue_tokens("alice", "secret124")
            .await
            .unwrap_err();
        let unknown = f
            .auth
            .authenticate_and_issue_tokens("mallory", "secret123")
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn inactive_accounts_cannot_login_or_refresh() {
        let f = fixture();
        let alice = register_alice(&f).await;
        let pair = f
            .auth
            .authenticate_and_issue_tokens("alice", "secret123")
            .await
            .unwrap();

        f.users.deactivate(alice.id).await.unwrap();
        assert!(matches!(
            f.auth.authenticate_and_issue_tokens("alice", "secret123").await,
            Err(AppError::AccountInactive)
        ));
        assert!(matches!(
            f.auth.refresh_access_token(&pair.refresh_token).await,
            Err(AppError::AccountInactive)
        ));
        assert!(matches!(
            f.auth.current_user(&pair.access_token).await,
            Err(AppError::AccountInactive)
        ));
    }

    #[tokio::test]
    async fn inactive_account_with_wrong_password_is_still_invalid_credentials() {
        let f = fixture();
        let alice = register_alice(&f).await;
        f.users.deactivate(alice.id).await.unwrap();
        assert!(matches!(
            f.auth.authenticate_and_issue_tokens("alice", "nope-nope").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn refresh_mints_a_new_access_token_for_the_same_subject() {
        let f = fixture();
        let alice = register_alice(&f).await;
        let pair = f
            .auth
            .authenticate_and_issue_tokens("alice", "secret123")
            .await
            .unwrap();

        let refreshed = f.auth.refresh_access_token(&pair.refresh_token).await.unwrap();
        let claims = f
            .keys
            .verify(&refreshed.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(claims.user_id().unwrap(), alice.id);
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens_tampered_and_foreign_tokens() {
        let f = fixture();
        register_alice(&f).await;
        let pair = f
            .auth
            .authenticate_and_issue_tokens("alice", "secret123")
            .await
            .unwrap();

        assert!(matches!(
            f.auth.refresh_access_token(&pair.access_token).await,
            Err(AppError::InvalidToken(TokenError::WrongKind { .. }))
        ));

        let mut tampered = pair.refresh_token.clone();
        tampered.push('x');
        assert!(matches!(
            f.auth.refresh_access_token(&tampered).await,
            Err(AppError::InvalidToken(TokenError::Malformed(_)))
        ));

        let foreign = JwtKeys::new(&test_config("someone-else")).issue_refresh(1).unwrap();
        assert!(matches!(
            f.auth.refresh_access_token(&foreign).await,
            Err(AppError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn refresh_with_expired_token_fails() {
        let f = fixture();
        let alice = register_alice(&f).await;
        let mut cfg = test_config("auth-secret");
        cfg.refresh_ttl_seconds = -10;
        let expired = JwtKeys::new(&cfg).issue_refresh(alice.id).unwrap();

        assert!(matches!(
            f.auth.refresh_access_token(&expired).await,
            Err(AppError::InvalidToken(TokenError::Expired))
        ));
    }

    #[tokio::test]
    async fn refresh_after_user_deletion_is_not_found() {
        let f = fixture();
        let alice = register_alice(&f).await;
        let pair = f
            .auth
            .authenticate_and_issue_tokens("alice", "secret123")
            .await
            .unwrap();

        assert!(f.repo.delete(alice.id).await.unwrap());
        assert!(matches!(
            f.auth.refresh_access_token(&pair.refresh_token).await,
            Err(AppError::NotFound(_))
        ));
    }
}
