use crate::error::Result;
use crate::fetch::{fetch_document, Fetch};
use crate::types::LogOutput;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Lines of log-engine banner at the top of every `pre` block.
///
/// Tied to the log page layout of the cluster UIs we scrape; not configurable.
const BANNER_LINES: usize = 2;

/// Fetch an attempt's log page and return its cleaned stdout and stderr.
pub fn fetch_and_clean(fetcher: &dyn Fetch, url: &str) -> Result<LogOutput> {
    debug!("Fetching attempt logs from {}", url);
    let document = fetch_document(fetcher, url)?;
    let output = extract_output(&document);
    if output.stdout.is_none() {
        warn!("Log page {} did not contain stdout and stderr blocks", url);
    }
    Ok(output)
}

/// First `pre` block is stdout, second is stderr. Anything less yields nothing.
pub fn extract_output(document: &Html) -> LogOutput {
    let Ok(selector) = Selector::parse("pre") else {
        return LogOutput::default();
    };

    let blocks: Vec<String> = document
        .select(&selector)
        .map(|pre| pre.text().collect::<String>())
        .collect();

    match blocks.as_slice() {
        [stdout, stderr, ..] => LogOutput::new(Some(clean_output(stdout)), Some(clean_output(stderr))),
        _ => LogOutput::default(),
    }
}

/// Drop the banner from a log block; short blocks are returned untouched.
pub fn clean_output(output: &str) -> String {
    let lines: Vec<&str> = output.split('\n').collect();
    if lines.len() > BANNER_LINES + 1 {
        lines[BANNER_LINES..].join("\n")
    } else {
        output.to_string()
    }
}
