//! Session lifecycle: anonymous, authenticating, authenticated.
//!
//! The profile is loaded after authentication succeeds; if that load fails
//! the session stays authenticated with no profile rather than bouncing the
//! user back to anonymous. Callers may retry the profile fetch on its own.

use std::future::Future;

use rizq_core::{Result, RizqError};
use rizq_database::model::profile::Profile;
use tracing::warn;

use crate::auth::{AuthProvider, AuthUser, Credentials};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated {
        user: AuthUser,
        profile: Option<Profile>,
    },
}

/// Explicit session object passed to whoever needs the current identity.
/// No global singleton; one context per page session.
#[derive(Debug)]
pub struct SessionContext<P> {
    provider: P,
    state: SessionState,
    token: Option<String>,
}

impl<P: AuthProvider> SessionContext<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: SessionState::Anonymous,
            token: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Exchange credentials for a session, then load the profile.
    /// A failed sign-in lands back in `Anonymous`; a failed profile load
    /// degrades to an authenticated session without a profile.
    pub async fn sign_in<F, Fut>(
        &mut self,
        credentials: &Credentials,
        load_profile: F,
    ) -> Result<&SessionState>
    where
        F: FnOnce(AuthUser) -> Fut,
        Fut: Future<Output = Result<Option<Profile>>>,
    {
        self.state = SessionState::Authenticating;

        let session = match self.provider.sign_in(credentials).await {
            Ok(session) => session,
            Err(e) => {
                self.state = SessionState::Anonymous;
                self.token = None;
                return Err(e);
            }
        };

        let profile = match load_profile(session.user.clone()).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %session.user.id, error = %e, "profile load failed after sign-in; continuing without profile");
                None
            }
        };

        self.token = Some(session.access_token);
        self.state = SessionState::Authenticated {
            user: session.user,
            profile,
        };
        Ok(&self.state)
    }

    /// Rebuild session state from a stored token, e.g. on app relaunch.
    pub async fn resume<F, Fut>(&mut self, token: &str, load_profile: F) -> Result<&SessionState>
    where
        F: FnOnce(AuthUser) -> Fut,
        Fut: Future<Output = Result<Option<Profile>>>,
    {
        self.state = SessionState::Authenticating;

        let Some(session) = self.provider.get_session(token).await? else {
            self.state = SessionState::Anonymous;
            self.token = None;
            return Ok(&self.state);
        };

        let profile = match load_profile(session.user.clone()).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %session.user.id, error = %e, "profile load failed on resume; continuing without profile");
                None
            }
        };

        self.token = Some(session.access_token);
        self.state = SessionState::Authenticated {
            user: session.user,
            profile,
        };
        Ok(&self.state)
    }

    /// Retry the profile fetch for an already-authenticated session.
    pub async fn refresh_profile<F, Fut>(&mut self, load_profile: F) -> Result<&SessionState>
    where
        F: FnOnce(AuthUser) -> Fut,
        Fut: Future<Output = Result<Option<Profile>>>,
    {
        let SessionState::Authenticated { user, .. } = &self.state else {
            return Err(RizqError::auth("no authenticated session to refresh"));
        };

        let user = user.clone();
        let profile = load_profile(user.clone()).await?;
        self.state = SessionState::Authenticated { user, profile };
        Ok(&self.state)
    }

    /// Revoke the token and drop to anonymous. The local state is cleared
    /// even when the provider call fails; the token may simply be expired.
    pub async fn sign_out(&mut self) -> Result<()> {
        let token = self.token.take();
        self.state = SessionState::Anonymous;

        if let Some(token) = token {
            self.provider.sign_out(&token).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rizq_core::{Result, RizqError};
    use rizq_database::model::profile::Profile;
    use uuid::Uuid;

    use super::{SessionContext, SessionState};
    use crate::auth::{AuthProvider, AuthSession, AuthUser, Credentials};

    struct MockProvider {
        user_id: Uuid,
        accept_password: &'static str,
    }

    impl MockProvider {
        fn session(&self, token: &str) -> AuthSession {
            AuthSession {
                user: AuthUser {
                    id: self.user_id,
                    email: Some("test@rizq.app".to_owned()),
                    display_name: None,
                },
                access_token: token.to_owned(),
                expires_at: None,
            }
        }
    }

    impl AuthProvider for MockProvider {
        async fn get_session(&self, token: &str) -> Result<Option<AuthSession>> {
            if token == "live-token" {
                Ok(Some(self.session(token)))
            } else {
                Ok(None)
            }
        }

        async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession> {
            if credentials.password == self.accept_password {
                Ok(self.session("live-token"))
            } else {
                Err(RizqError::auth("invalid credentials"))
            }
        }

        async fn sign_out(&self, _token: &str) -> Result<()> {
            Ok(())
        }
    }

    fn provider() -> MockProvider {
        MockProvider {
            user_id: Uuid::new_v4(),
            accept_password: "correct",
        }
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            email: "test@rizq.app".to_owned(),
            password: password.to_owned(),
        }
    }

    fn profile_for(user_id: Uuid) -> Profile {
        Profile {
            user_id,
            display_name: Some("Tester".to_owned()),
            streak: 2,
            total_xp: 150,
            level: 2,
            last_active_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sign_in_reaches_authenticated_with_profile() {
        let mock = provider();
        let user_id = mock.user_id;
        let mut session = SessionContext::new(mock);

        session
            .sign_in(&credentials("correct"), |user| async move {
                Ok(Some(profile_for(user.id)))
            })
            .await
            .unwrap();

        match session.state() {
            SessionState::Authenticated { user, profile } => {
                assert_eq!(user.id, user_id);
                assert!(profile.is_some());
            }
            other => panic!("expected authenticated state, got {other:?}"),
        }
        assert_eq!(session.token(), Some("live-token"));
    }

    #[tokio::test]
    async fn failed_sign_in_returns_to_anonymous() {
        let mut session = SessionContext::new(provider());

        let result = session
            .sign_in(&credentials("wrong"), |_| async { Ok(None) })
            .await;

        assert!(matches!(result, Err(RizqError::Auth(_))));
        assert_eq!(*session.state(), SessionState::Anonymous);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn profile_load_failure_degrades_not_bounces() {
        let mut session = SessionContext::new(provider());

        session
            .sign_in(&credentials("correct"), |_| async {
                Err(RizqError::server(500, "profiles table on fire"))
            })
            .await
            .unwrap();

        match session.state() {
            SessionState::Authenticated { profile, .. } => assert!(profile.is_none()),
            other => panic!("expected degraded authenticated state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_profile_recovers_a_degraded_session() {
        let mock = provider();
        let user_id = mock.user_id;
        let mut session = SessionContext::new(mock);

        session
            .sign_in(&credentials("correct"), |_| async {
                Err(RizqError::server(500, "temporary"))
            })
            .await
            .unwrap();

        session
            .refresh_profile(|user| async move { Ok(Some(profile_for(user.id))) })
            .await
            .unwrap();

        match session.state() {
            SessionState::Authenticated { user, profile } => {
                assert_eq!(user.id, user_id);
                assert!(profile.is_some());
            }
            other => panic!("expected recovered state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resume_with_dead_token_is_anonymous() {
        let mut session = SessionContext::new(provider());

        session
            .resume("stale-token", |_| async { Ok(None) })
            .await
            .unwrap();

        assert_eq!(*session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn sign_out_clears_state_and_token() {
        let mut session = SessionContext::new(provider());
        session
            .sign_in(&credentials("correct"), |_| async { Ok(None) })
            .await
            .unwrap();

        session.sign_out().await.unwrap();

        assert_eq!(*session.state(), SessionState::Anonymous);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn refresh_without_session_is_an_auth_error() {
        let mut session = SessionContext::new(provider());
        let result = session.refresh_profile(|_| async { Ok(None) }).await;
        assert!(matches!(result, Err(RizqError::Auth(_))));
    }
}
