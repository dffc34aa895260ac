use crate::embedded;
use crate::error::{Result, ScrapeError};
use crate::failure_scraper::ClusterUi;
use crate::fetch::{fetch_document, Fetch};
use crate::types::{Anchor, ClusterEndpoint, Generation, JobDescriptor, TaskKind};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde_json::Value;
use tracing::{debug, info};

/// Position of the logs link inside an `attemptsTableData` tuple
const LOGS_COLUMN: usize = 4;

/// The JobHistory server UI, which ships its tables as JSON assigned to
/// script variables.
#[derive(Debug, Clone)]
pub struct JobHistory {
    endpoint: ClusterEndpoint,
}

impl JobHistory {
    pub fn new(endpoint: ClusterEndpoint) -> Self {
        Self { endpoint }
    }

    /// Job listing page; also the root for attempt and log URLs
    pub fn history_url(&self) -> String {
        format!("{}/jobhistory", self.endpoint.base_url())
    }

    pub fn attempts_url(&self, job_id: &str, kind: TaskKind) -> String {
        format!(
            "{}/attempts/{}/{}/FAILED",
            self.history_url(),
            job_id,
            kind.short_code()
        )
    }

    /// All jobs on the history page, most recent first
    pub fn jobs(&self, fetcher: &dyn Fetch) -> Result<Vec<JobDescriptor>> {
        let document = fetch_document(fetcher, &self.history_url())?;
        embedded::extract(&document, "jobs", "jobsTableData")
    }

    /// Most recent failed job of the configured user
    pub fn latest_failed_job(&self, fetcher: &dyn Fetch) -> Result<Option<JobDescriptor>> {
        let user = self.endpoint.hadoop_user();
        let jobs = self.jobs(fetcher)?;
        debug!("{} jobs listed on the JobHistory server", jobs.len());

        Ok(jobs
            .into_iter()
            .find(|job| job.user == user && job.is_failed()))
    }
}

impl ClusterUi for JobHistory {
    fn generation(&self) -> Generation {
        Generation::V2
    }

    fn locate_failed_job(&self, fetcher: &dyn Fetch) -> Result<Option<String>> {
        let job = self.latest_failed_job(fetcher)?;
        if let Some(job) = &job {
            if let Some(url) = job.detail_url(self.endpoint.base_url()) {
                debug!("Job details at {}", url);
            }
        }
        Ok(job.map(|job| job.job.id))
    }

    fn select_failed_attempt(
        &self,
        fetcher: &dyn Fetch,
        job_id: &str,
        kind: TaskKind,
        rng: &mut dyn RngCore,
    ) -> Result<Option<String>> {
        let url = self.attempts_url(job_id, kind);
        let document = fetch_document(fetcher, &url)?;
        let attempts = embedded::extract_rows(&document, "attempts", "attemptsTableData")?;

        let Some(attempt) = attempts.choose(rng) else {
            debug!("No failed {} attempts for {}", kind, job_id);
            return Ok(None);
        };

        let fragment = attempt
            .get(LOGS_COLUMN)
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::malformed(format!("attempt row has no logs column: {:?}", attempt)))?;
        let href = Anchor::parse_fragment(fragment)
            .and_then(|anchor| anchor.href)
            .ok_or_else(|| ScrapeError::malformed(format!("no link in logs column '{}'", fragment)))?;

        let log_url = format!("{}{}", self.endpoint.base_url(), href);
        info!("Scraping job attempt URL: {}", log_url);
        Ok(Some(log_url))
    }
}
