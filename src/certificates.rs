//! An accepted upload is appended as `Pending` right away; a spawned task
//! resolves it after the verification delay. Those tasks are tracked by
//! certificate id and aborted when the record is removed, and a resolution
//! always re-finds its record by id, so a removed record never comes back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::err::Error;
use crate::events::{Notification, NotificationSink};
use crate::models::{
    today, Certificate, CertificateStats, FileDescriptor, OcrData, Outcome, Status,
};
use crate::ocr;

pub const PENDING_INSTITUTION: &str = "Pending Verification";
pub const VERIFIED_INSTITUTION: &str = "Jharkhand University";

/// Source of verification outcomes.
pub trait Verifier: Send + Sync {
    fn verify(&self) -> Outcome;
}

#[derive(Debug, Clone, Copy)]
pub struct CoinFlip {
    verified_probability: f64,
}

impl CoinFlip {
    pub fn new(verified_probability: f64) -> Self {
        Self {
            verified_probability: verified_probability.clamp(0.0, 1.0),
        }
    }
}

impl Verifier for CoinFlip {
    fn verify(&self) -> Outcome {
        if rand::thread_rng().gen_bool(self.verified_probability) {
            Outcome::Verified
        } else {
            Outcome::Failed
        }
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct Always(pub Outcome);

#[cfg(test)]
impl Verifier for Always {
    fn verify(&self) -> Outcome {
        self.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Download {
    pub url: String,
    pub file_name: String,
}

#[derive(Default)]
struct Collection {
    records: Vec<Certificate>,
    in_flight: HashMap<Uuid, JoinHandle<()>>,
}

#[derive(Clone)]
pub struct CertificateLedger {
    collection: Arc<Mutex<Collection>>,
    notifier: Arc<dyn NotificationSink>,
    verifier: Arc<dyn Verifier>,
    delay: Duration,
}

impl CertificateLedger {
    pub fn new(
        notifier: Arc<dyn NotificationSink>,
        verifier: Arc<dyn Verifier>,
        delay: Duration,
    ) -> Self {
        Self {
            collection: Arc::new(Mutex::new(Collection::default())),
            notifier,
            verifier,
            delay,
        }
    }

    pub fn with_samples(self) -> Self {
        self.collection.lock().records.extend(sample_certificates());
        self
    }

    pub fn certificates(&self) -> Vec<Certificate> {
        self.collection.lock().records.clone()
    }

    pub fn stats(&self) -> CertificateStats {
        CertificateStats::of(&self.collection.lock().records)
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.collection.lock().in_flight.len()
    }

    /// Processes every file in order; one rejected file does not stop the rest.
    pub fn upload(&self, files: &[FileDescriptor]) -> Vec<Result<Certificate, Error>> {
        files.iter().map(|file| self.upload_one(file)).collect()
    }

    pub fn upload_one(&self, file: &FileDescriptor) -> Result<Certificate, Error> {
        if !file.is_supported() {
            log::info!("rejected `{}` ({})", file.name, file.mime_type);
            self.notifier.notify(Notification::destructive(
                "Invalid File Type",
                "Please upload PDF or image files only.",
            ));
            return Err(Error::unsupported_file_type(file.mime_type.clone()));
        }

        let scan = ocr::simulate(&file.name, &mut rand::thread_rng());
        let uploaded = today();
        let certificate = Certificate {
            id: Uuid::new_v4(),
            name: file.stem().to_string(),
            kind: "Document".to_string(),
            institution: PENDING_INSTITUTION.to_string(),
            issue_date: uploaded,
            status: Status::Pending,
            upload_date: uploaded,
            certificate_number: None,
            grade: None,
            file_url: file.object_url.clone(),
            extracted_text: Some(scan.extracted_text),
            ocr_data: Some(scan.ocr_data),
        };

        {
            let mut collection = self.collection.lock();
            collection.records.push(certificate.clone());
            let handle = self.spawn_resolution(certificate.id, file.name.clone());
            collection.in_flight.insert(certificate.id, handle);
        }

        log::info!("certificate {} pending for `{}`", certificate.id, file.name);
        self.notifier.notify(Notification::info(
            "Certificate Uploaded",
            format!("{} has been uploaded. OCR processing complete.", file.name),
        ));
        Ok(certificate)
    }

    fn spawn_resolution(&self, id: Uuid, file_name: String) -> JoinHandle<()> {
        let collection = self.collection.clone();
        let notifier = self.notifier.clone();
        let verifier = self.verifier.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let resolved = {
                let mut collection = collection.lock();
                collection.in_flight.remove(&id);
                match collection.records.iter_mut().find(|cert| cert.id == id) {
                    Some(cert) => {
                        let applied = cert.resolve(verifier.verify());
                        if applied && cert.ocr_data.is_some() {
                            cert.institution = VERIFIED_INSTITUTION.to_string();
                        }
                        if applied {
                            log::info!("certificate {} resolved as {:?}", id, cert.status);
                        }
                        applied
                    }
                    None => {
                        log::debug!("certificate {} is gone, skipping resolution", id);
                        false
                    }
                }
            };

            if resolved {
                notifier.notify(Notification::info(
                    "Verification Complete",
                    format!("{} verification process completed.", file_name),
                ));
            }
        })
    }

    /// Removes the record and cancels its pending resolution. Returns whether
    /// a record was removed; removing an unknown id changes nothing.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = {
            let mut collection = self.collection.lock();
            if let Some(handle) = collection.in_flight.remove(&id) {
                handle.abort();
            }
            let index = collection.records.iter().position(|cert| cert.id == id);
            index.map(|index| collection.records.remove(index))
        };

        match removed {
            Some(cert) => {
                log::info!("certificate {} removed", id);
                self.notifier.notify(Notification::destructive(
                    "Certificate Deleted",
                    format!("{} has been removed.", cert.name),
                ));
                true
            }
            None => {
                log::debug!("certificate {} already absent", id);
                self.notifier.notify(Notification::destructive(
                    "Certificate Deleted",
                    format!("{} has been removed.", id),
                ));
                false
            }
        }
    }

    pub fn view(&self, id: Uuid) -> Option<Certificate> {
        self.collection
            .lock()
            .records
            .iter()
            .find(|cert| cert.id == id)
            .cloned()
    }

    pub fn download(&self, id: Uuid) -> Result<Download, Error> {
        let cert = self.view(id).ok_or_else(|| Error::certificate_not_found(id))?;
        let url = cert.file_url.ok_or_else(|| Error::no_file_available(id))?;

        self.notifier.notify(Notification::info(
            "Download Started",
            format!("{} is being downloaded.", cert.name),
        ));
        Ok(Download {
            url,
            file_name: format!("{}.pdf", cert.name),
        })
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn sample_certificates() -> Vec<Certificate> {
    vec![
        Certificate {
            id: Uuid::new_v4(),
            name: "Bachelor of Technology".to_string(),
            kind: "Degree".to_string(),
            institution: "Jharkhand University".to_string(),
            issue_date: date(2023, 5, 15),
            status: Status::Verified,
            upload_date: date(2024, 1, 10),
            certificate_number: Some("JU/2023/BTech/001".to_string()),
            grade: Some("First Class".to_string()),
            file_url: None,
            extracted_text: Some(
                "This is to certify that Rahul Kumar Singh has successfully completed..."
                    .to_string(),
            ),
            ocr_data: Some(OcrData {
                student_name: "Rahul Kumar Singh".to_string(),
                roll_number: "JU201945".to_string(),
                marks: "85%".to_string(),
                year: "2023".to_string(),
                department: "Computer Science".to_string(),
            }),
        },
        Certificate {
            id: Uuid::new_v4(),
            name: "Data Science Certificate".to_string(),
            kind: "Professional Certificate".to_string(),
            institution: "Coursera".to_string(),
            issue_date: date(2023, 12, 1),
            status: Status::Pending,
            upload_date: date(2024, 1, 15),
            certificate_number: Some("CRS-DS-2023-456".to_string()),
            grade: None,
            file_url: None,
            extracted_text: Some(
                "Certificate of Completion for Data Science Specialization...".to_string(),
            ),
            ocr_data: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Outbox, Variant};

    const DELAY: Duration = Duration::from_secs(3);

    fn ledger(verifier: impl Verifier + 'static) -> (CertificateLedger, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::new());
        let ledger = CertificateLedger::new(outbox.clone(), Arc::new(verifier), DELAY);
        (ledger, outbox)
    }

    fn pdf(name: &str) -> FileDescriptor {
        FileDescriptor::new(name, "application/pdf")
    }

    async fn past_delay() {
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn upload_is_pending_then_resolves() {
        let (ledger, outbox) = ledger(CoinFlip::new(0.7));

        let cert = ledger.upload_one(&pdf("diploma.pdf")).unwrap();
        assert_eq!(cert.name, "diploma");
        assert_eq!(cert.kind, "Document");
        assert_eq!(cert.status, Status::Pending);
        assert_eq!(cert.institution, PENDING_INSTITUTION);
        assert!(cert.extracted_text.is_some());
        assert_eq!(ledger.certificates(), vec![cert.clone()]);
        assert_eq!(ledger.in_flight(), 1);

        past_delay().await;

        let resolved = ledger.view(cert.id).unwrap();
        assert!(matches!(resolved.status, Status::Verified | Status::Failed));
        assert_eq!(resolved.institution, VERIFIED_INSTITUTION);
        assert_eq!(ledger.in_flight(), 0);

        let titles: Vec<String> = outbox.notifications().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Certificate Uploaded", "Verification Complete"]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_resolves_before_the_delay() {
        let (ledger, _) = ledger(Always(Outcome::Verified));
        let cert = ledger.upload_one(&pdf("early.pdf")).unwrap();

        tokio::time::sleep(DELAY - Duration::from_millis(10)).await;
        assert_eq!(ledger.view(cert.id).unwrap().status, Status::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_type_creates_nothing() {
        let (ledger, outbox) = ledger(Always(Outcome::Verified));

        let err = ledger
            .upload_one(&FileDescriptor::new("notes.txt", "text/plain"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType { .. }));
        assert!(ledger.certificates().is_empty());
        assert_eq!(ledger.in_flight(), 0);

        let notifications = outbox.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Invalid File Type");
        assert_eq!(notifications[0].variant, Variant::Destructive);
    }

    #[tokio::test(start_paused = true)]
    async fn removal_mid_flight_is_final() {
        let (ledger, outbox) = ledger(Always(Outcome::Verified));
        let cert = ledger.upload_one(&pdf("gone.pdf")).unwrap();

        assert!(ledger.remove(cert.id));
        assert_eq!(ledger.in_flight(), 0);

        past_delay().await;
        past_delay().await;

        assert!(ledger.view(cert.id).is_none());
        assert!(ledger.certificates().is_empty());
        assert!(outbox
            .notifications()
            .iter()
            .all(|n| n.title != "Verification Complete"));
    }

    #[tokio::test(start_paused = true)]
    async fn batch_keeps_order_and_resolves_each() {
        let (ledger, _) = ledger(Always(Outcome::Failed));
        let results = ledger.upload(&[
            pdf("one.pdf"),
            FileDescriptor::new("two.docx", "application/msword"),
            FileDescriptor::new("three.jpg", "image/jpeg"),
        ]);

        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());

        let names: Vec<String> = ledger.certificates().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["one", "three"]);

        let first = results[0].as_ref().unwrap().id;
        assert!(ledger.remove(first));

        past_delay().await;

        let left = ledger.certificates();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "three");
        assert_eq!(left[0].status, Status::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_status_never_changes() {
        let (ledger, _) = ledger(CoinFlip::new(0.5));
        let cert = ledger.upload_one(&pdf("stable.pdf")).unwrap();

        past_delay().await;
        let first = ledger.view(cert.id).unwrap().status;
        assert!(first.is_final());

        for _ in 0..5 {
            past_delay().await;
            assert_eq!(ledger.view(cert.id).unwrap().status, first);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn download_needs_a_file() {
        let (ledger, outbox) = ledger(Always(Outcome::Verified));

        let with_file = ledger
            .upload_one(&pdf("degree.pdf").with_object_url("blob:local/1"))
            .unwrap();
        let download = ledger.download(with_file.id).unwrap();
        assert_eq!(download.url, "blob:local/1");
        assert_eq!(download.file_name, "degree.pdf");
        assert_eq!(outbox.notifications().last().unwrap().title, "Download Started");

        let without = ledger.upload_one(&pdf("bare.pdf")).unwrap();
        assert!(matches!(
            ledger.download(without.id),
            Err(Error::NoFileAvailable { .. })
        ));
        assert!(matches!(
            ledger.download(Uuid::new_v4()),
            Err(Error::CertificateNotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn removing_unknown_id_is_a_noop() {
        let (ledger, outbox) = ledger(Always(Outcome::Verified));
        ledger.upload_one(&pdf("keep.pdf")).unwrap();

        assert!(!ledger.remove(Uuid::new_v4()));
        assert_eq!(ledger.certificates().len(), 1);
        assert_eq!(ledger.in_flight(), 1);
        assert_eq!(outbox.notifications().last().unwrap().title, "Certificate Deleted");
    }

    #[test]
    fn samples_match_dashboard_seed() {
        let (ledger, _) = ledger(Always(Outcome::Verified));
        let ledger = ledger.with_samples();
        let stats = ledger.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.verified, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn coin_flip_extremes_are_deterministic() {
        for _ in 0..100 {
            assert_eq!(CoinFlip::new(1.0).verify(), Outcome::Verified);
            assert_eq!(CoinFlip::new(0.0).verify(), Outcome::Failed);
        }
        assert_eq!(CoinFlip::new(7.0).verify(), Outcome::Verified);
    }
}
