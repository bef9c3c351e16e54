use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::Serialize;

use crate::certificates::Verifier;
use crate::err::Error;
use crate::events::{Notification, NotificationSink};
use crate::models::{today, Status, VerificationResult, VerificationStats};

pub const SEARCH_CERTIFICATE: &str = "Bachelor of Science";
pub const SEARCH_INSTITUTION: &str = "Birla Institute of Technology";

#[derive(Default)]
struct Desk {
    /// Oldest first.
    results: Vec<VerificationResult>,
    query: String,
    searching: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeskSnapshot {
    pub query: String,
    pub searching: bool,
    pub results: Vec<VerificationResult>,
    pub stats: VerificationStats,
}

#[derive(Clone)]
pub struct VerificationDesk {
    desk: Arc<Mutex<Desk>>,
    notifier: Arc<dyn NotificationSink>,
    verifier: Arc<dyn Verifier>,
    delay: Duration,
}

impl VerificationDesk {
    pub fn new(
        notifier: Arc<dyn NotificationSink>,
        verifier: Arc<dyn Verifier>,
        delay: Duration,
    ) -> Self {
        Self {
            desk: Arc::new(Mutex::new(Desk::default())),
            notifier,
            verifier,
            delay,
        }
    }

    pub fn with_samples(self) -> Self {
        self.desk.lock().results.extend(sample_results());
        self
    }

    pub fn set_query<S: Into<String>>(&self, query: S) {
        self.desk.lock().query = query.into();
    }

    pub fn query(&self) -> String {
        self.desk.lock().query.clone()
    }

    pub fn is_searching(&self) -> bool {
        self.desk.lock().searching > 0
    }

    /// Newest first.
    pub fn results(&self) -> Vec<VerificationResult> {
        self.desk.lock().results.iter().rev().cloned().collect()
    }

    pub fn stats(&self) -> VerificationStats {
        VerificationStats::of(&self.desk.lock().results)
    }

    pub fn snapshot(&self) -> DeskSnapshot {
        DeskSnapshot {
            query: self.query(),
            searching: self.is_searching(),
            results: self.results(),
            stats: self.stats(),
        }
    }

    pub fn search_for<S: Into<String>>(&self, query: S) -> Result<(), Error> {
        self.set_query(query);
        self.search()
    }

    /// Starts a check for the current query. The result lands after the search
    /// delay, at which point the query is cleared.
    pub fn search(&self) -> Result<(), Error> {
        let query = {
            let mut desk = self.desk.lock();
            if desk.query.trim().is_empty() {
                drop(desk);
                self.notifier.notify(Notification::destructive(
                    "Enter Student Name",
                    "Please enter a student name to search.",
                ));
                return Err(Error::empty_query());
            }
            desk.searching += 1;
            desk.query.clone()
        };
        log::info!("verification search started for `{}`", query);

        let desk = self.desk.clone();
        let notifier = self.notifier.clone();
        let verifier = self.verifier.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut desk = desk.lock();
                let result = VerificationResult {
                    id: desk.results.len() as u64 + 1,
                    student_name: query.clone(),
                    certificate_name: SEARCH_CERTIFICATE.to_string(),
                    institution: SEARCH_INSTITUTION.to_string(),
                    status: verifier.verify().into(),
                    verification_date: today(),
                    details: Some("Verification completed".to_string()),
                };
                log::info!("verification {} for `{}`: {:?}", result.id, query, result.status);
                desk.results.push(result);
                desk.searching = desk.searching.saturating_sub(1);
                desk.query.clear();
            }
            notifier.notify(Notification::info(
                "Verification Complete",
                format!("Certificate verification for {} has been completed.", query),
            ));
        });
        Ok(())
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn sample_results() -> Vec<VerificationResult> {
    vec![
        VerificationResult {
            id: 2,
            student_name: "Jane Smith".to_string(),
            certificate_name: "Master of Business Administration".to_string(),
            institution: "IIM Ranchi".to_string(),
            status: Status::Failed,
            verification_date: date(2024, 1, 14),
            details: Some("Certificate number not found in database".to_string()),
        },
        VerificationResult {
            id: 1,
            student_name: "John Doe".to_string(),
            certificate_name: "Bachelor of Technology".to_string(),
            institution: "Jharkhand University".to_string(),
            status: Status::Verified,
            verification_date: date(2024, 1, 15),
            details: Some("Certificate verified against institutional database".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::{Always, CoinFlip};
    use crate::events::{Outbox, Variant};
    use crate::models::Outcome;

    const DELAY: Duration = Duration::from_secs(2);

    fn desk(verifier: impl Verifier + 'static) -> (VerificationDesk, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::new());
        let desk = VerificationDesk::new(outbox.clone(), Arc::new(verifier), DELAY);
        (desk, outbox)
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_is_rejected() {
        let (desk, outbox) = desk(Always(Outcome::Verified));

        for blank in ["", "   ", "\t\n"] {
            let err = desk.search_for(blank).unwrap_err();
            assert!(matches!(err, Error::EmptyQuery { .. }));
        }
        assert!(!desk.is_searching());

        tokio::time::sleep(DELAY * 2).await;
        assert!(desk.results().is_empty());

        let notifications = outbox.notifications();
        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].title, "Enter Student Name");
        assert_eq!(notifications[0].variant, Variant::Destructive);
    }

    #[tokio::test(start_paused = true)]
    async fn search_appends_after_delay_and_clears_query() {
        let (desk, outbox) = desk(Always(Outcome::Failed));

        desk.search_for("Priya Sharma").unwrap();
        assert!(desk.is_searching());
        assert!(desk.results().is_empty());
        assert_eq!(desk.query(), "Priya Sharma");

        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;

        let results = desk.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
        assert_eq!(results[0].student_name, "Priya Sharma");
        assert_eq!(results[0].certificate_name, SEARCH_CERTIFICATE);
        assert_eq!(results[0].institution, SEARCH_INSTITUTION);
        assert_eq!(results[0].status, Status::Failed);
        assert!(!desk.is_searching());
        assert_eq!(desk.query(), "");
        assert_eq!(
            outbox.notifications()[0].description,
            "Certificate verification for Priya Sharma has been completed."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn results_list_newest_first_with_stats() {
        let (desk, _) = desk(Always(Outcome::Verified));
        let desk = desk.with_samples();

        desk.search_for("Amit Patel").unwrap();
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;

        let names: Vec<String> = desk.results().into_iter().map(|r| r.student_name).collect();
        assert_eq!(names, vec!["Amit Patel", "John Doe", "Jane Smith"]);
        assert_eq!(desk.results()[0].id, 3);

        let stats = desk.stats();
        assert_eq!(stats.total_checks, 3);
        assert_eq!(stats.verified, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate, 67);
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_are_never_pending() {
        let (desk, _) = desk(CoinFlip::new(0.7));
        for i in 0..20 {
            desk.search_for(format!("Student {}", i)).unwrap();
        }
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;

        let results = desk.results();
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.status.is_final()));
    }
}
