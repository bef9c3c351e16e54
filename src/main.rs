pub mod accounts;
pub mod auth;
pub mod certificates;
pub mod config;
pub mod dashboard;
pub mod err;
pub mod events;
pub mod guard;
pub mod models;
pub mod ocr;
pub mod recruiter;
pub mod session;
pub mod workspace;

use std::sync::Arc;

use axum::handler::Handler;
use axum::{routing::delete, routing::get, routing::post, Extension, Router};
use serde::Serialize;
use tower::ServiceBuilder;

use crate::accounts::AccountStore;
use crate::certificates::{CoinFlip, Verifier};
use crate::config::Settings;
use crate::err::{Error, Fine, Maybe, Nothing};
use crate::workspace::Workspaces;

pub type Payload<T> = axum::response::Result<Maybe<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V> where V: Serialize {
    Ok(Fine(value))
}

pub fn breaks<V>(err: Error) -> Payload<V> where V: Serialize {
    Ok(Nothing(err))
}

pub fn router(workspaces: Arc<Workspaces>) -> Router {
    Router::new()
        .route("/workspaces", post(auth::open_workspace))
        .route("/workspace", delete(auth::close_workspace))
        .route("/workspace/events", get(auth::events))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/student-dashboard", get(dashboard::student_dashboard))
        .route("/student/certificates", post(dashboard::upload_certificates))
        .route(
            "/student/certificates/:id",
            get(dashboard::view_certificate).delete(dashboard::remove_certificate),
        )
        .route(
            "/student/certificates/:id/download",
            get(dashboard::download_certificate),
        )
        .route("/recruiter-dashboard", get(dashboard::recruiter_dashboard))
        .route("/recruiter/search", post(dashboard::search))
        .fallback(err::handler404.into_service())
        .layer(ServiceBuilder::new().layer(Extension(workspaces)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = Settings::from_env()?;
    let addr = settings.bind;

    let accounts = Arc::new(AccountStore::with_demo_accounts()?);
    let verifier: Arc<dyn Verifier> = Arc::new(CoinFlip::new(settings.verified_probability));
    let workspaces = Arc::new(Workspaces::new(accounts, verifier, settings));
    let app = router(workspaces);

    log::info!("Starting CertDesk HTTP Server on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
