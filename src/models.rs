use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::events::Route;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Recruiter,
}

impl Role {
    pub fn dashboard(&self) -> Route {
        match self {
            Role::Student => Route::StudentDashboard,
            Role::Recruiter => Route::RecruiterDashboard,
        }
    }
}

pub type AccountId = u64;

/// Account data as seen by everything outside the account store.
#[skip_serializing_none]
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Identity {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub institution: Option<String>,
    pub registration_number: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub institution: Option<String>,
    pub registration_number: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Shared by certificates and recruiter checks. Leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Verified,
    Failed,
}

impl Status {
    pub fn is_final(&self) -> bool {
        match self {
            Status::Pending => false,
            Status::Verified | Status::Failed => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Outcome {
    Verified,
    Failed,
}

impl From<Outcome> for Status {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Verified => Status::Verified,
            Outcome::Failed => Status::Failed,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct OcrData {
    pub student_name: String,
    pub roll_number: String,
    pub marks: String,
    pub year: String,
    pub department: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Certificate {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub institution: String,
    pub issue_date: NaiveDate,
    pub status: Status,
    pub upload_date: NaiveDate,
    pub certificate_number: Option<String>,
    pub grade: Option<String>,
    pub file_url: Option<String>,
    pub extracted_text: Option<String>,
    pub ocr_data: Option<OcrData>,
}

impl Certificate {
    /// Moves a pending record to its final status. Returns `false` and leaves
    /// the record untouched when it was already resolved.
    pub fn resolve(&mut self, outcome: Outcome) -> bool {
        if self.status.is_final() {
            return false;
        }
        self.status = outcome.into();
        true
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct VerificationResult {
    pub id: u64,
    pub student_name: String,
    pub certificate_name: String,
    pub institution: String,
    pub status: Status,
    pub verification_date: NaiveDate,
    pub details: Option<String>,
}

/// A file handed over by the client. Contents are never read.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub object_url: Option<String>,
}

impl FileDescriptor {
    #[cfg(test)]
    pub fn new<N: Into<String>, T: Into<String>>(name: N, mime_type: T) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            object_url: None,
        }
    }

    #[cfg(test)]
    pub fn with_object_url<S: Into<String>>(mut self, url: S) -> Self {
        self.object_url = Some(url.into());
        self
    }

    pub fn is_supported(&self) -> bool {
        self.mime_type == "application/pdf" || self.mime_type.starts_with("image/")
    }

    /// File name without its last extension: `diploma.final.pdf` becomes `diploma.final`.
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) if dot + 1 < self.name.len() && !self.name[dot..].contains('/') => {
                &self.name[..dot]
            }
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct CertificateStats {
    pub total: usize,
    pub verified: usize,
    pub pending: usize,
    pub failed: usize,
}

impl CertificateStats {
    pub fn of(records: &[Certificate]) -> Self {
        records.iter().fold(Self::default(), |mut stats, cert| {
            stats.total += 1;
            match cert.status {
                Status::Pending => stats.pending += 1,
                Status::Verified => stats.verified += 1,
                Status::Failed => stats.failed += 1,
            }
            stats
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct VerificationStats {
    pub total_checks: usize,
    pub verified: usize,
    pub failed: usize,
    pub success_rate: u32,
}

impl VerificationStats {
    pub fn of(results: &[VerificationResult]) -> Self {
        let total_checks = results.len();
        let verified = results
            .iter()
            .filter(|r| r.status == Status::Verified)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == Status::Failed)
            .count();
        let success_rate = if total_checks > 0 {
            (verified as f64 / total_checks as f64 * 100.0).round() as u32
        } else {
            0
        };
        Self {
            total_checks,
            verified,
            failed,
            success_rate,
        }
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
