use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::AuthApi;
use crate::client::SessionListener;
use crate::error::{messages, ApiError, ApiResult, ErrorKind};

use super::session::Role;
use super::token_store::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    AdminDashboard,
    UserDashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/auth",
            Route::AdminDashboard => "/admin",
            Route::UserDashboard => "/user",
        }
    }

    pub fn dashboard_for(role: Role) -> Self {
        match role {
            Role::Admin => Route::AdminDashboard,
            Role::User => Route::UserDashboard,
        }
    }
}

/// Whatever owns the active view. The guard only ever asks it to move.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Enforces the Authenticated/Anonymous transitions and their side effects.
///
/// Subscribe it to the request client so a 401 anywhere forces a logout:
/// `client.subscribe(guard.clone())`.
pub struct SessionGuard {
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
}

impl SessionGuard {
    pub fn new(store: TokenStore, navigator: Arc<dyn Navigator>) -> Arc<Self> {
        let initial = if store.is_authenticated() { SessionState::Authenticated } else { SessionState::Anonymous };
        let (state, _) = watch::channel(initial);
        Arc::new(Self { store, navigator, state })
    }

    pub fn state(&self) -> SessionState { *self.state.borrow() }

    /// Receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<SessionState> { self.state.subscribe() }

    pub fn store(&self) -> &TokenStore { &self.store }

    /// Authenticated -> Anonymous: clear credentials and send the view to the login surface.
    pub fn logout(&self) {
        self.store.clear();
        self.state.send_replace(SessionState::Anonymous);
        info!(target: "session", "session ended, redirecting to {}", Route::Login.path());
        self.navigator.navigate(Route::Login);
    }

    /// Login flow: call the backend, persist the session, land on the role's dashboard.
    pub async fn sign_in(&self, auth: &AuthApi, email: &str, password: &str) -> ApiResult<Role> {
        let tokens = auth.login(email, password).await?;
        let role = Role::from_login_email(email);
        self.store.save(&tokens, role);
        self.state.send_replace(SessionState::Authenticated);
        info!(target: "session", role = %role, "login succeeded");
        self.navigator.navigate(Route::dashboard_for(role));
        Ok(role)
    }

    /// Revoke the refresh token server-side when possible, then always log out locally.
    pub async fn sign_out(&self, auth: &AuthApi) {
        if let Some(refresh) = self.store.refresh_token() {
            if let Err(e) = auth.logout(&refresh).await {
                // a 401 has already been turned into a logout by the listener
                if e.is_unauthorized() && self.state() == SessionState::Anonymous && !self.store.is_authenticated() {
                    return;
                }
                warn!(target: "session", "backend logout failed, clearing local session anyway: {}", e);
            }
        }
        self.logout();
    }

    /// Exchange the stored refresh token for a new pair, keeping the stored role.
    /// Never called implicitly; a 401 still forces a logout.
    pub async fn refresh(&self, auth: &AuthApi) -> ApiResult<()> {
        let Some(refresh) = self.store.refresh_token() else {
            return Err(ApiError::new(ErrorKind::Unauthorized, messages::UNAUTHORIZED));
        };
        let tokens = auth.refresh(&refresh).await?;
        let role = self.store.role().unwrap_or(Role::User);
        self.store.save(&tokens, role);
        self.state.send_replace(SessionState::Authenticated);
        Ok(())
    }

    /// Route guard for a dashboard. Redirects to login and returns false when the
    /// session is missing or belongs to another role.
    pub fn require_role(&self, role: Role) -> bool {
        if self.store.is_authenticated() && self.store.role() == Some(role) {
            return true;
        }
        self.navigator.navigate(Route::Login);
        false
    }

    /// Landing-page behaviour: an existing session goes straight to its dashboard.
    pub fn resume(&self) -> Option<Route> {
        if !self.store.is_authenticated() {
            return None;
        }
        let route = self.store.role().map(Route::dashboard_for)?;
        self.navigator.navigate(route);
        Some(route)
    }
}

impl SessionListener for SessionGuard {
    fn on_unauthenticated(&self) {
        warn!(target: "session", "request rejected with 401, forcing logout");
        self.logout();
    }
}
