use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequest, RequestParts};
use axum::{async_trait, Extension};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

use crate::accounts::AccountStore;
use crate::certificates::{CertificateLedger, Verifier};
use crate::config::Settings;
use crate::err::Error;
use crate::events::{Event, Outbox};
use crate::guard;
use crate::models::{AccountId, Identity, Role};
use crate::recruiter::VerificationDesk;
use crate::session::SessionManager;

pub const WORKSPACE_HEADER: &str = "x-workspace";

enum Dashboard {
    Student {
        owner: AccountId,
        ledger: CertificateLedger,
    },
    Recruiter {
        owner: AccountId,
        desk: VerificationDesk,
    },
}

/// One browser tab: a session, the events raised on its behalf and whichever
/// dashboard is mounted for the signed-in account.
pub struct Workspace {
    pub id: String,
    outbox: Arc<Outbox>,
    session: SessionManager,
    dashboard: Mutex<Option<Dashboard>>,
    verifier: Arc<dyn Verifier>,
    settings: Arc<Settings>,
    expires_at: Mutex<DateTime<Utc>>,
}

impl Workspace {
    fn new(
        id: String,
        accounts: Arc<AccountStore>,
        verifier: Arc<dyn Verifier>,
        settings: Arc<Settings>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let outbox = Arc::new(Outbox::new());
        let session = SessionManager::new(
            accounts,
            outbox.clone(),
            outbox.clone(),
            settings.auth_latency,
        );
        Self {
            id,
            outbox,
            session,
            dashboard: Mutex::new(None),
            verifier,
            settings,
            expires_at: Mutex::new(expires_at),
        }
    }

    fn expires_at(&self) -> DateTime<Utc> {
        *self.expires_at.lock()
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.gt(&self.expires_at())
    }

    fn touch(&self, expires_at: DateTime<Utc>) {
        *self.expires_at.lock() = expires_at;
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn drain_events(&self) -> Vec<Event> {
        self.outbox.drain()
    }

    /// Signs out and unmounts the dashboard. Resolutions still pending for the
    /// unmounted dashboard complete against state nobody can see any more.
    pub fn logout(&self) {
        self.session.logout();
        self.dashboard.lock().take();
    }

    // Session is read under the dashboard lock; logout unmounts under it too.
    pub fn student(&self) -> Result<(Identity, CertificateLedger), Error> {
        let mut slot = self.dashboard.lock();
        let identity = guard::require(&self.session.state(), Role::Student)?;
        let ledger = self.certificates_for(&mut slot, identity.id);
        Ok((identity, ledger))
    }

    pub fn recruiter(&self) -> Result<(Identity, VerificationDesk), Error> {
        let mut slot = self.dashboard.lock();
        let identity = guard::require(&self.session.state(), Role::Recruiter)?;
        let desk = self.desk_for(&mut slot, identity.id);
        Ok((identity, desk))
    }

    #[cfg(test)]
    fn is_mounted(&self) -> bool {
        self.dashboard.lock().is_some()
    }

    fn certificates_for(
        &self,
        slot: &mut Option<Dashboard>,
        account: AccountId,
    ) -> CertificateLedger {
        if let Some(Dashboard::Student { owner, ledger }) = &*slot {
            if *owner == account {
                return ledger.clone();
            }
        }

        let mut ledger = CertificateLedger::new(
            self.outbox.clone(),
            self.verifier.clone(),
            self.settings.verification_delay,
        );
        if self.settings.seed_demo_records {
            ledger = ledger.with_samples();
        }
        log::debug!("workspace {} mounted student dashboard for {}", self.id, account);
        *slot = Some(Dashboard::Student {
            owner: account,
            ledger: ledger.clone(),
        });
        ledger
    }

    fn desk_for(
        &self,
        slot: &mut Option<Dashboard>,
        account: AccountId,
    ) -> VerificationDesk {
        if let Some(Dashboard::Recruiter { owner, desk }) = &*slot {
            if *owner == account {
                return desk.clone();
            }
        }

        let mut desk = VerificationDesk::new(
            self.outbox.clone(),
            self.verifier.clone(),
            self.settings.search_delay,
        );
        if self.settings.seed_demo_records {
            desk = desk.with_samples();
        }
        log::debug!("workspace {} mounted recruiter dashboard for {}", self.id, account);
        *slot = Some(Dashboard::Recruiter {
            owner: account,
            desk: desk.clone(),
        });
        desk
    }
}

pub struct Workspaces {
    accounts: Arc<AccountStore>,
    verifier: Arc<dyn Verifier>,
    settings: Arc<Settings>,
    ttl: Duration,
    open: RwLock<HashMap<String, Arc<Workspace>>>,
}

impl Workspaces {
    pub fn new(accounts: Arc<AccountStore>, verifier: Arc<dyn Verifier>, settings: Settings) -> Self {
        let ttl = Duration::from_std(settings.workspace_ttl).unwrap_or_else(|_| Duration::days(2));
        Self {
            accounts,
            verifier,
            settings: Arc::new(settings),
            ttl,
            open: RwLock::new(HashMap::new()),
        }
    }

    pub fn open(&self) -> Arc<Workspace> {
        self.open_at(Utc::now())
    }

    fn open_at(&self, now: DateTime<Utc>) -> Arc<Workspace> {
        let id_bytes: [u8; 32] = thread_rng().gen();

        let mut hasher: Sha256 = Digest::new();
        hasher.update(&id_bytes);
        let id = hex::encode(hasher.finalize());

        let workspace = Arc::new(Workspace::new(
            id.clone(),
            self.accounts.clone(),
            self.verifier.clone(),
            self.settings.clone(),
            now + self.ttl,
        ));

        let mut open = self.open.write();
        make_room(&mut open, now, self.settings.max_workspaces);
        open.insert(id.clone(), workspace.clone());
        log::info!("opened workspace {}", id);
        workspace
    }

    /// Looks up a live workspace and extends its lifetime. An expired one is
    /// dropped on the spot.
    pub fn get(&self, id: &str) -> Option<Arc<Workspace>> {
        self.get_at(id, Utc::now())
    }

    fn get_at(&self, id: &str, now: DateTime<Utc>) -> Option<Arc<Workspace>> {
        let workspace = self.open.read().get(id).cloned()?;
        if workspace.is_expired(now) {
            self.open.write().remove(id);
            log::info!("workspace {} expired", id);
            return None;
        }
        workspace.touch(now + self.ttl);
        Some(workspace)
    }

    pub fn close(&self, id: &str) -> bool {
        let closed = self.open.write().remove(id).is_some();
        if closed {
            log::info!("closed workspace {}", id);
        }
        closed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.open.read().len()
    }
}

fn make_room(open: &mut HashMap<String, Arc<Workspace>>, now: DateTime<Utc>, capacity: usize) {
    open.retain(|id, workspace| {
        let live = !workspace.is_expired(now);
        if !live {
            log::info!("workspace {} expired", id);
        }
        live
    });

    while open.len() >= capacity {
        let idle = open
            .iter()
            .min_by_key(|(_, workspace)| workspace.expires_at())
            .map(|(id, _)| id.clone());
        match idle {
            Some(id) => {
                open.remove(&id);
                log::warn!("evicted workspace {}, {} already open", id, capacity);
            }
            None => break,
        }
    }
}

/// Resolves the workspace named by the `x-workspace` header. Reaching a
/// workspace route without one is a client bug and is answered with
/// `NoSessionContext`.
pub struct CurrentWorkspace(pub Arc<Workspace>);

#[async_trait]
impl<B: Send> FromRequest<B> for CurrentWorkspace {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(workspaces) = Extension::<Arc<Workspaces>>::from_request(req)
            .await
            .map_err(|err| Error::InternalError {
                kind: "MissingExtension",
                message: err.to_string(),
            })?;

        let id = req
            .headers()
            .get(WORKSPACE_HEADER)
            .and_then(|value| value.to_str().ok());

        match id.and_then(|id| workspaces.get(id)) {
            Some(workspace) => Ok(CurrentWorkspace(workspace)),
            None => {
                log::error!(
                    "request to {} outside any workspace (header {:?})",
                    req.uri(),
                    id
                );
                Err(Error::no_session_context(format!(
                    "`{}` header is missing or names no open workspace",
                    WORKSPACE_HEADER
                )))
            }
        }
    }
}
