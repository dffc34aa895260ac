use crate::error::{Result, ScrapeError};
use crate::fetch::Fetch;
use crate::job_history::JobHistory;
use crate::job_tracker::JobTracker;
use crate::logs;
use crate::types::{ClusterEndpoint, FetchResult, Generation, LogOutput, TaskKind};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::info;

/// What every generation of the cluster web UI has to provide
pub trait ClusterUi {
    fn generation(&self) -> Generation;

    /// Id of the most recent failed job of the configured user, if any
    fn locate_failed_job(&self, fetcher: &dyn Fetch) -> Result<Option<String>>;

    /// Log URL of one failed attempt of `kind`, picked at random, or `None`
    /// when no attempt of that kind failed
    fn select_failed_attempt(
        &self,
        fetcher: &dyn Fetch,
        job_id: &str,
        kind: TaskKind,
        rng: &mut dyn RngCore,
    ) -> Result<Option<String>>;
}

/// The UI implementation for a generation
pub fn ui_for(generation: Generation, endpoint: ClusterEndpoint) -> Box<dyn ClusterUi> {
    match generation {
        Generation::V1 => Box::new(JobTracker::new(endpoint)),
        Generation::V2 => Box::new(JobHistory::new(endpoint)),
    }
}

/// Collects stdout/stderr of failed map and reduce attempts for a job.
pub struct FailureScraper<F, R = StdRng> {
    ui: Box<dyn ClusterUi>,
    fetcher: F,
    rng: R,
    hadoop_user: String,
}

impl<F: Fetch> FailureScraper<F, StdRng> {
    pub fn new(generation: Generation, endpoint: ClusterEndpoint, fetcher: F) -> Self {
        Self::with_rng(generation, endpoint, fetcher, StdRng::from_entropy())
    }
}

impl<F: Fetch, R: RngCore> FailureScraper<F, R> {
    /// Same as [`FailureScraper::new`] with a caller-provided random source
    pub fn with_rng(generation: Generation, endpoint: ClusterEndpoint, fetcher: F, rng: R) -> Self {
        let hadoop_user = endpoint.hadoop_user().to_string();
        Self {
            ui: ui_for(generation, endpoint),
            fetcher,
            rng,
            hadoop_user,
        }
    }

    /// Output of a failed map and a failed reduce attempt of `job_id`, or of
    /// the user's latest failed job when no id is given.
    pub fn fetch_output(&mut self, job_id: Option<&str>) -> Result<FetchResult> {
        let job_id = match job_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => self
                .ui
                .locate_failed_job(&self.fetcher)?
                .ok_or_else(|| ScrapeError::NoJobsForUser {
                    user: self.hadoop_user.clone(),
                })?,
        };

        info!("Obtaining failing output for: {} ({:?} UI)", job_id, self.ui.generation());

        let mapper = self.attempt_output(&job_id, TaskKind::Map)?;
        let reducer = self.attempt_output(&job_id, TaskKind::Reduce)?;

        Ok(FetchResult {
            job_id,
            mapper,
            reducer,
        })
    }

    fn attempt_output(&mut self, job_id: &str, kind: TaskKind) -> Result<LogOutput> {
        match self
            .ui
            .select_failed_attempt(&self.fetcher, job_id, kind, &mut self.rng)?
        {
            Some(url) => logs::fetch_and_clean(&self.fetcher, &url),
            None => Ok(LogOutput::not_failed(kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;

    const JT: &str = "http://jobtracker:50030";
    const JH: &str = "http://historyserver:19888";

    fn endpoint(base: &str) -> ClusterEndpoint {
        ClusterEndpoint::new(base, "alice").unwrap()
    }

    fn seeded<F: Fetch>(generation: Generation, base: &str, fetcher: F) -> FailureScraper<F> {
        FailureScraper::with_rng(generation, endpoint(base), fetcher, StdRng::seed_from_u64(11))
    }

    const EMPTY_FAILURES: &str = "<html><body><p>No failed tasks</p></body></html>";

    fn empty_attempts() -> &'static str {
        "<table id=\"attempts\"><thead><tr><th>Attempt</th></tr></thead>\
         <script>var attemptsTableData=[]</script></table>"
    }

    #[test]
    fn test_ui_for_generation() {
        assert_eq!(ui_for(Generation::V1, endpoint(JT)).generation(), Generation::V1);
        assert_eq!(ui_for(Generation::V2, endpoint(JH)).generation(), Generation::V2);
    }

    #[test]
    fn test_no_failed_attempts_yield_sentinels_without_log_fetch() {
        let fetcher = FakeFetcher::new()
            .page(&format!("{JT}/jobfailures.jsp?jobid=job_9&kind=map&cause=failed"), EMPTY_FAILURES)
            .page(&format!("{JT}/jobfailures.jsp?jobid=job_9&kind=reduce&cause=failed"), EMPTY_FAILURES);
        let requests = fetcher.requests();
        let mut scraper = seeded(Generation::V1, JT, fetcher);

        let result = scraper.fetch_output(Some("job_9")).unwrap();
        assert_eq!(result.job_id, "job_9");
        assert_eq!(result.mapper, LogOutput::not_failed(TaskKind::Map));
        assert_eq!(result.reducer, LogOutput::not_failed(TaskKind::Reduce));
        assert_eq!(requests.borrow().len(), 2);
    }

    #[test]
    fn test_no_jobs_for_user() {
        let fetcher = FakeFetcher::new().page(
            &format!("{JH}/jobhistory"),
            "<table id=\"jobs\"><thead></thead><script>var jobsTableData=[]</script></table>",
        );
        let requests = fetcher.requests();
        let mut scraper = seeded(Generation::V2, JH, fetcher);

        let err = scraper.fetch_output(None).unwrap_err();
        assert!(matches!(err, ScrapeError::NoJobsForUser { ref user } if user == "alice"));
        assert_eq!(requests.borrow().len(), 1);
    }

    #[test]
    fn test_blank_job_id_triggers_lookup() {
        let fetcher = FakeFetcher::new().page(
            &format!("{JH}/jobhistory"),
            "<table id=\"jobs\"><thead></thead><script>var jobsTableData=[]</script></table>",
        );
        let mut scraper = seeded(Generation::V2, JH, fetcher);
        assert!(matches!(
            scraper.fetch_output(Some("  ")),
            Err(ScrapeError::NoJobsForUser { .. })
        ));
    }

    #[test]
    fn test_job_tracker_end_to_end() {
        let jobtracker = "<html><body><h2 id=\"failed_jobs\">Failed Jobs</h2><table>\
            <tr><td>Jobid</td><td>User</td><td>Name</td><td>x</td><td>y</td></tr>\
            <tr><td>job_7</td><td>alice</td><td>wc</td><td>-</td><td>-</td></tr>\
            </table></body></html>";
        let failures = "<table><tr><th>Attempt</th><th>Logs</th></tr>\
            <tr><td>attempt_7_m_0</td><td><a href=\"http://tt1:50060/tasklog?attemptid=attempt_7_m_0\">All</a></td></tr>\
            </table>";
        let log_page = "<pre>banner\nbanner\nmap says hi\nbye</pre><pre>banner\nbanner\nValueError: nope\n</pre>";

        let fetcher = FakeFetcher::new()
            .page(&format!("{JT}/jobtracker.jsp"), jobtracker)
            .page(&format!("{JT}/jobfailures.jsp?jobid=job_7&kind=map&cause=failed"), failures)
            .page(&format!("{JT}/jobfailures.jsp?jobid=job_7&kind=reduce&cause=failed"), EMPTY_FAILURES)
            .page("http://tt1:50060/tasklog?attemptid=attempt_7_m_0", log_page);
        let requests = fetcher.requests();
        let mut scraper = seeded(Generation::V1, JT, fetcher);

        let result = scraper.fetch_output(None).unwrap();
        assert_eq!(result.job_id, "job_7");
        assert_eq!(result.mapper.stdout.as_deref(), Some("map says hi\nbye"));
        assert_eq!(result.mapper.stderr.as_deref(), Some("ValueError: nope\n"));
        assert_eq!(result.reducer, LogOutput::not_failed(TaskKind::Reduce));
        assert_eq!(requests.borrow().len(), 4);
    }

    #[test]
    fn test_job_history_end_to_end() {
        let jobs = "<table id=\"jobs\"><thead><tr><th>Submit</th></tr></thead><script>var jobsTableData=[\
            [\"s\",\"s\",\"e\",\"<a href='/jobhistory/job/job_42'>job_42</a>\",\"etl\",\"alice\",\"q\",\"FAILED\",\"1\",\"0\",\"1\",\"0\"]\
            ]</script></table>";
        let reduce_attempts = "<table id=\"attempts\"><thead><tr><th>Attempt</th></tr></thead><script>var attemptsTableData=[\
            [\"a\",\"FAILED\",\"boom\",\"node\",\"<a href='/jobhistory/logs/n1:1/c_1/attempt_42_r_0/alice'>logs</a>\"]\
            ]</script></table>";
        let log_page = "<pre>Log Type: stdout\nLog Length: 0\n</pre><pre>Log Type: stderr\nLog Length: 9\nException\nat Foo</pre>";

        let fetcher = FakeFetcher::new()
            .page(&format!("{JH}/jobhistory"), jobs)
            .page(&format!("{JH}/jobhistory/attempts/job_42/m/FAILED"), empty_attempts())
            .page(&format!("{JH}/jobhistory/attempts/job_42/r/FAILED"), reduce_attempts)
            .page(&format!("{JH}/jobhistory/logs/n1:1/c_1/attempt_42_r_0/alice"), log_page);
        let requests = fetcher.requests();
        let mut scraper = seeded(Generation::V2, JH, fetcher);

        let result = scraper.fetch_output(None).unwrap();
        assert_eq!(result.job_id, "job_42");
        assert_eq!(result.mapper, LogOutput::not_failed(TaskKind::Map));
        assert_eq!(result.reducer.stdout.as_deref(), Some("Log Type: stdout\nLog Length: 0\n"));
        assert_eq!(result.reducer.stderr.as_deref(), Some("Exception\nat Foo"));
        assert_eq!(
            requests.borrow().as_slice(),
            [
                format!("{JH}/jobhistory"),
                format!("{JH}/jobhistory/attempts/job_42/m/FAILED"),
                format!("{JH}/jobhistory/attempts/job_42/r/FAILED"),
                format!("{JH}/jobhistory/logs/n1:1/c_1/attempt_42_r_0/alice"),
            ]
        );
    }

    #[test]
    fn test_wrong_generation_surfaces_error() {
        let fetcher = FakeFetcher::new().page(
            &format!("{JH}/jobtracker.jsp"),
            "<table id=\"jobs\"><script>var jobsTableData=[]</script></table>",
        );
        let mut scraper = seeded(Generation::V1, JH, fetcher);
        assert!(matches!(
            scraper.fetch_output(None),
            Err(ScrapeError::WrongDocumentShape { .. })
        ));
    }
}
