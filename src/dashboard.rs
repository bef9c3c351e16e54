use std::str::FromStr;

use axum::extract::Path;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::certificates::Download;
use crate::err::{Body, Error};
use crate::models::{Certificate, CertificateStats, FileDescriptor, Identity};
use crate::recruiter::DeskSnapshot;
use crate::workspace::CurrentWorkspace;
use crate::{breaks, proceeds, Payload};

pub async fn student_dashboard(
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> Payload<StudentDashboard> {
    let (identity, ledger) = workspace.student()?;
    proceeds(StudentDashboard {
        identity,
        certificates: ledger.certificates(),
        stats: ledger.stats(),
    })
}

pub async fn upload_certificates(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Body(upload): Body<UploadCertificates>,
) -> Payload<Uploaded> {
    let (_, ledger) = workspace.student()?;

    let mut uploaded = Uploaded::default();
    for outcome in ledger.upload(&upload.files) {
        match outcome {
            Ok(cert) => uploaded.accepted.push(cert),
            Err(err) => uploaded.rejected.push(err),
        }
    }
    proceeds(uploaded)
}

pub async fn view_certificate(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Path(id): Path<String>,
) -> Payload<Certificate> {
    let (_, ledger) = workspace.student()?;
    let id = Uuid::from_str(&id)?;
    match ledger.view(id) {
        Some(cert) => proceeds(cert),
        None => breaks(Error::certificate_not_found(id)),
    }
}

pub async fn download_certificate(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Path(id): Path<String>,
) -> Payload<Download> {
    let (_, ledger) = workspace.student()?;
    let id = Uuid::from_str(&id)?;
    match ledger.download(id) {
        Ok(download) => proceeds(download),
        Err(err) => breaks(err),
    }
}

pub async fn remove_certificate(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Path(id): Path<String>,
) -> Payload<Removed> {
    let (_, ledger) = workspace.student()?;
    let id = Uuid::from_str(&id)?;
    proceeds(Removed {
        certificate_id: id,
        removed: ledger.remove(id),
    })
}

pub async fn recruiter_dashboard(
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> Payload<RecruiterDashboard> {
    let (identity, desk) = workspace.recruiter()?;
    proceeds(RecruiterDashboard {
        identity,
        desk: desk.snapshot(),
    })
}

pub async fn search(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Body(search): Body<Search>,
) -> Payload<Searching> {
    let (_, desk) = workspace.recruiter()?;
    match desk.search_for(search.query.clone()) {
        Ok(()) => proceeds(Searching {
            query: search.query,
            searching: desk.is_searching(),
        }),
        Err(err) => breaks(err),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadCertificates {
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Uploaded {
    pub accepted: Vec<Certificate>,
    pub rejected: Vec<Error>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub identity: Identity,
    pub certificates: Vec<Certificate>,
    pub stats: CertificateStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct Removed {
    pub certificate_id: Uuid,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecruiterDashboard {
    pub identity: Identity,
    #[serde(flatten)]
    pub desk: DeskSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Searching {
    pub query: String,
    pub searching: bool,
}
