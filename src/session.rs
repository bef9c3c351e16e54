use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

use crate::accounts::AccountStore;
use crate::err::Error;
use crate::events::{Navigator, Notification, NotificationSink, Route};
use crate::models::{Identity, RegisterAccount, Role};

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticated(Identity),
}

pub struct SessionManager {
    accounts: Arc<AccountStore>,
    state: RwLock<SessionState>,
    notifier: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    latency: Duration,
}

impl SessionManager {
    pub fn new(
        accounts: Arc<AccountStore>,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        latency: Duration,
    ) -> Self {
        Self {
            accounts,
            state: RwLock::new(SessionState::Anonymous),
            notifier,
            navigator,
            latency,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    #[cfg(test)]
    pub fn identity(&self) -> Option<Identity> {
        match &*self.state.read() {
            SessionState::Authenticated(identity) => Some(identity.clone()),
            SessionState::Anonymous => None,
        }
    }

    // Concurrent attempts are not serialized; the last one to resolve wins.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<Identity, Error> {
        tokio::time::sleep(self.latency).await;

        let identity = match self.accounts.find_account(email, password, role) {
            Some(identity) => identity,
            None => {
                log::info!("rejected login for `{}` as {:?}", email, role);
                self.notifier
                    .notify(Notification::destructive("Login Failed", "Invalid credentials"));
                return Err(Error::invalid_credentials());
            }
        };

        *self.state.write() = SessionState::Authenticated(identity.clone());
        log::info!("account {} logged in", identity.id);
        self.notifier.notify(Notification::info(
            "Login Successful",
            format!("Welcome back, {}!", identity.name),
        ));
        self.navigator.navigate(role.dashboard());
        Ok(identity)
    }

    pub async fn register(&self, data: RegisterAccount) -> Result<Identity, Error> {
        tokio::time::sleep(self.latency).await;

        let role = data.role;
        let identity = self.accounts.append_account(data)?;

        *self.state.write() = SessionState::Authenticated(identity.clone());
        self.notifier.notify(Notification::info(
            "Registration Successful",
            "Your account has been created successfully!",
        ));
        self.navigator.navigate(role.dashboard());
        Ok(identity)
    }

    pub fn logout(&self) {
        let previous = std::mem::replace(&mut *self.state.write(), SessionState::Anonymous);
        if let SessionState::Authenticated(identity) = previous {
            log::info!("account {} logged out", identity.id);
        }
        self.notifier.notify(Notification::info(
            "Logged Out",
            "You have been successfully logged out.",
        ));
        self.navigator.navigate(Route::Landing);
    }
}
