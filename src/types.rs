use crate::error::{Result, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use serde::{de, Deserialize, Deserializer};
use std::fmt;
use url::Url;

/// HTTP basic-auth credentials for the cluster web UI
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the web UI lives and whose jobs we are after
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEndpoint {
    base_url: String,
    hadoop_user: String,
}

impl ClusterEndpoint {
    /// Validates the base URL and strips any trailing slash.
    pub fn new(base_url: &str, hadoop_user: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ScrapeError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScrapeError::InvalidUrl {
                url: base_url.to_string(),
                reason: "URL must use HTTP or HTTPS protocol".to_string(),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            hadoop_user: hadoop_user.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn hadoop_user(&self) -> &str {
        &self.hadoop_user
    }
}

/// Which generation of the cluster web UI we are talking to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    /// JobTracker pages rendering everything as HTML tables
    V1,
    /// JobHistory pages embedding table data as JSON in script blocks
    #[default]
    V2,
}

impl Generation {
    /// `"1"` selects the table-based UI, anything else the JSON-based one.
    pub fn from_setting(value: &str) -> Self {
        if value.trim() == "1" {
            Generation::V1
        } else {
            Generation::V2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Map,
    Reduce,
}

impl TaskKind {
    /// Spelling used by the JobTracker failure pages
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Map => "map",
            TaskKind::Reduce => "reduce",
        }
    }

    /// Spelling used by the JobHistory attempt pages
    pub fn short_code(&self) -> &'static str {
        match self {
            TaskKind::Map => "m",
            TaskKind::Reduce => "r",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visible text and target of an `<a>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: Option<String>,
}

impl Anchor {
    /// First anchor at or below `element`.
    pub fn find_in(element: ElementRef<'_>) -> Option<Self> {
        let selector = Selector::parse("a").ok()?;
        let anchor = if element.value().name() == "a" {
            element
        } else {
            element.select(&selector).next()?
        };
        Some(Self {
            text: anchor.text().collect::<String>().trim().to_string(),
            href: anchor.value().attr("href").map(|h| h.to_string()),
        })
    }

    /// First anchor inside a serialized HTML fragment such as `<a href='/x'>x</a>`.
    pub fn parse_fragment(fragment: &str) -> Option<Self> {
        let html = Html::parse_fragment(fragment);
        Self::find_in(html.root_element())
    }
}

/// Job id plus relative link to its detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReference {
    pub id: String,
    pub link: Option<String>,
}

impl JobReference {
    /// Reads the embedded anchor; plain text without markup is taken as the id.
    pub fn from_fragment(fragment: &str) -> Self {
        match Anchor::parse_fragment(fragment) {
            Some(anchor) => Self {
                id: anchor.text,
                link: anchor.href,
            },
            None => Self {
                id: fragment.trim().to_string(),
                link: None,
            },
        }
    }
}

/// One row of the JobHistory `jobsTableData` array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobDescriptor {
    pub submit_time: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(deserialize_with = "job_reference")]
    pub job: JobReference,
    pub job_name: String,
    pub user: String,
    pub queue: String,
    pub state: String,
    #[serde(deserialize_with = "count")]
    pub map_total: u32,
    #[serde(deserialize_with = "count")]
    pub map_completed: u32,
    #[serde(deserialize_with = "count")]
    pub reduce_total: u32,
    #[serde(deserialize_with = "count")]
    pub reduce_completed: u32,
}

impl JobDescriptor {
    pub fn job_id(&self) -> &str {
        &self.job.id
    }

    pub fn is_failed(&self) -> bool {
        self.state == "FAILED"
    }

    /// Absolute URL of the job detail page, if the row linked to one
    pub fn detail_url(&self, base_url: &str) -> Option<String> {
        self.job
            .link
            .as_ref()
            .map(|link| format!("{}{}", base_url.trim_end_matches('/'), link))
    }
}

fn job_reference<'de, D>(deserializer: D) -> std::result::Result<JobReference, D::Error>
where
    D: Deserializer<'de>,
{
    let fragment = String::deserialize(deserializer)?;
    Ok(JobReference::from_fragment(&fragment))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Number(i64),
    Text(String),
}

/// Counters show up both as `"3"` and `3` depending on the UI version.
fn count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Number(n) => u32::try_from(n).map_err(de::Error::custom),
        StringOrNumber::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Accepts `hadoop_version = 1` as well as `hadoop_version = "1"`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Number(n) => n.to_string(),
        StringOrNumber::Text(s) => s,
    })
}

/// stdout and stderr of one task attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogOutput {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl LogOutput {
    pub fn new(stdout: Option<String>, stderr: Option<String>) -> Self {
        Self { stdout, stderr }
    }

    /// Placeholder used when a task kind had no failed attempts
    pub fn not_failed(kind: TaskKind) -> Self {
        let label = match kind {
            TaskKind::Map => "NOT FAILED MAPPER TASKS",
            TaskKind::Reduce => "NOT FAILED REDUCER TASKS",
        };
        Self {
            stdout: Some(label.to_string()),
            stderr: Some(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub job_id: String,
    pub mapper: LogOutput,
    pub reducer: LogOutput,
}
