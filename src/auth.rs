use std::sync::Arc;

use axum::Extension;
use serde::Serialize;

use crate::err::Body;
use crate::events::{Event, Route};
use crate::models::{Identity, LoginAccount, RegisterAccount};
use crate::session::SessionState;
use crate::workspace::{CurrentWorkspace, Workspaces};
use crate::{breaks, proceeds, Payload};

pub async fn open_workspace(
    Extension(workspaces): Extension<Arc<Workspaces>>,
) -> Payload<OpenedWorkspace> {
    let workspace = workspaces.open();
    proceeds(OpenedWorkspace {
        workspace_id: workspace.id.clone(),
    })
}

pub async fn close_workspace(
    Extension(workspaces): Extension<Arc<Workspaces>>,
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> Payload<ClosedWorkspace> {
    proceeds(ClosedWorkspace {
        workspace_id: workspace.id.clone(),
        closed: workspaces.close(&workspace.id),
    })
}

pub async fn login(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Body(login): Body<LoginAccount>,
) -> Payload<SignedIn> {
    match workspace
        .session()
        .login(&login.email, &login.password, login.role)
        .await
    {
        Ok(identity) => proceeds(SignedIn::from(identity)),
        Err(err) => breaks(err),
    }
}

pub async fn register(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Body(account): Body<RegisterAccount>,
) -> Payload<SignedIn> {
    let identity = workspace.session().register(account).await?;
    proceeds(SignedIn::from(identity))
}

pub async fn logout(CurrentWorkspace(workspace): CurrentWorkspace) -> Payload<SignedOut> {
    workspace.logout();
    proceeds(SignedOut {
        redirect: Route::Landing,
    })
}

pub async fn me(CurrentWorkspace(workspace): CurrentWorkspace) -> Payload<SessionView> {
    proceeds(SessionView {
        session: workspace.session().state(),
    })
}

pub async fn events(CurrentWorkspace(workspace): CurrentWorkspace) -> Payload<Events> {
    proceeds(Events {
        events: workspace.drain_events(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenedWorkspace {
    pub workspace_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosedWorkspace {
    pub workspace_id: String,
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub identity: Identity,
    pub redirect: Route,
}

impl From<Identity> for SignedIn {
    fn from(identity: Identity) -> Self {
        Self {
            redirect: identity.role.dashboard(),
            identity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedOut {
    pub redirect: Route,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session: SessionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct Events {
    pub events: Vec<Event>,
}
