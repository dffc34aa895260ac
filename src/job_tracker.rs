use crate::error::{Result, ScrapeError};
use crate::failure_scraper::ClusterUi;
use crate::fetch::{fetch_document, Fetch};
use crate::table::{cell_text, HeaderCells, HtmlTable};
use crate::types::{Anchor, ClusterEndpoint, Generation, TaskKind};
use rand::seq::SliceRandom;
use rand::RngCore;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, info};

/// Columns at the end of every failed-job row that carry no job data
const TRAILER_COLUMNS: usize = 2;

/// The JobTracker web UI (`jobtracker.jsp` and friends), which renders
/// everything as plain HTML tables.
#[derive(Debug, Clone)]
pub struct JobTracker {
    endpoint: ClusterEndpoint,
}

impl JobTracker {
    pub fn new(endpoint: ClusterEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn jobtracker_url(&self) -> String {
        format!("{}/jobtracker.jsp", self.endpoint.base_url())
    }

    pub fn job_detail_url(&self, job_id: &str) -> String {
        format!("{}/jobdetails.jsp?jobid={}", self.endpoint.base_url(), job_id)
    }

    pub fn failures_url(&self, job_id: &str, kind: TaskKind) -> String {
        format!(
            "{}/jobfailures.jsp?jobid={}&kind={}&cause=failed",
            self.endpoint.base_url(),
            job_id,
            kind.as_str()
        )
    }

    /// Rows of the "Failed Jobs" table, oldest first, keyed by lower-cased heading
    pub fn failed_jobs(&self, fetcher: &dyn Fetch) -> Result<Vec<HashMap<String, String>>> {
        let url = self.jobtracker_url();
        let document = fetch_document(fetcher, &url)?;
        let table = failed_jobs_table(&document).ok_or_else(|| {
            ScrapeError::wrong_shape(&url, "no table after #failed_jobs (is this a JobTracker UI?)")
        })?;

        let table = HtmlTable::parse(table, HeaderCells::Td);
        let jobs = table
            .rows()
            .iter()
            .map(|cells| {
                let keep = cells.len().saturating_sub(TRAILER_COLUMNS);
                table.zip_row(cells[..keep].iter().map(|cell| cell_text(*cell)))
            })
            .collect();

        Ok(jobs)
    }
}

impl ClusterUi for JobTracker {
    fn generation(&self) -> Generation {
        Generation::V1
    }

    fn locate_failed_job(&self, fetcher: &dyn Fetch) -> Result<Option<String>> {
        let user = self.endpoint.hadoop_user();
        let jobs = self.failed_jobs(fetcher)?;
        debug!("{} failed jobs listed on the JobTracker", jobs.len());

        // Newest submissions are at the bottom
        let Some(job) = jobs
            .iter()
            .rev()
            .find(|job| job.get("user").map(String::as_str) == Some(user))
        else {
            return Ok(None);
        };

        let id = job.get("jobid").cloned().ok_or_else(|| {
            ScrapeError::wrong_shape(&self.jobtracker_url(), "failed jobs table has no jobid column")
        })?;
        debug!("Job details at {}", self.job_detail_url(&id));
        Ok(Some(id))
    }

    fn select_failed_attempt(
        &self,
        fetcher: &dyn Fetch,
        job_id: &str,
        kind: TaskKind,
        rng: &mut dyn RngCore,
    ) -> Result<Option<String>> {
        let url = self.failures_url(job_id, kind);
        let document = fetch_document(fetcher, &url)?;

        let Some(table) = first_table(&document) else {
            debug!("No {} failures table for {}", kind, job_id);
            return Ok(None);
        };

        let records = HtmlTable::parse(table, HeaderCells::Th).records();
        let Some(attempt) = records.choose(rng) else {
            return Ok(None);
        };

        let logs = attempt
            .get("logs")
            .ok_or_else(|| ScrapeError::wrong_shape(&url, "failures table has no logs column"))?;
        let href = Anchor::find_in(*logs)
            .and_then(|anchor| anchor.href)
            .ok_or_else(|| ScrapeError::wrong_shape(&url, "logs cell has no link"))?;

        info!("Scraping job attempt URL: {}", href);
        Ok(Some(href))
    }
}

/// The first element after `#failed_jobs`, or a table nested inside it.
fn failed_jobs_table(document: &Html) -> Option<ElementRef<'_>> {
    let anchor_selector = Selector::parse("[id=\"failed_jobs\"]").ok()?;
    let table_selector = Selector::parse("table").ok()?;

    let anchor = document.select(&anchor_selector).next()?;
    let sibling = anchor.next_siblings().find_map(ElementRef::wrap)?;

    if sibling.value().name() == "table" {
        Some(sibling)
    } else {
        sibling.select(&table_selector).next()
    }
}

fn first_table(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("table").ok()?;
    document.select(&selector).next()
}
