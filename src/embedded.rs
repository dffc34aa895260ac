//! Table data that the JobHistory UI ships as a JavaScript literal, e.g.
//!
//! ```html
//! <table id="jobs"><thead>...</thead>
//!   <script type="text/javascript">var jobsTableData=[["..", ".."], ...]</script>
//! </table>
//! ```
//!
//! Pattern matching on script text is brittle, so everything that depends on
//! it goes through this module.

use crate::error::{Result, ScrapeError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Raw tuples of `var <variable>=[[...], ...]` attached to the element `#<table_id>`.
pub fn extract_rows(document: &Html, table_id: &str, variable: &str) -> Result<Vec<Vec<Value>>> {
    extract(document, table_id, variable)
}

/// Like [`extract_rows`], deserializing every tuple into `T`.
///
/// An empty array is a valid, empty result. A missing element, a missing
/// assignment or a tuple that does not fit `T` is an error.
pub fn extract<T: DeserializeOwned>(document: &Html, table_id: &str, variable: &str) -> Result<Vec<T>> {
    let anchor = find_by_id(document, table_id)?
        .ok_or_else(|| ScrapeError::malformed(format!("no element with id '{}'", table_id)))?;

    let pattern = Regex::new(&format!(r"var\s+{}\s*=\s*", regex::escape(variable)))
        .map_err(|e| ScrapeError::malformed(format!("bad pattern for '{}': {}", variable, e)))?;

    // Everything after the `=`; the literal may span lines and be followed by more code
    let rest = candidates(anchor)
        .find_map(|candidate| {
            let text = candidate.text().collect::<String>();
            pattern.find(&text).map(|m| text[m.end()..].to_string())
        })
        .ok_or_else(|| {
            ScrapeError::malformed(format!("'var {}=' not found next to #{}", variable, table_id))
        })?;

    // JavaScript string escapes allow \' which JSON does not
    let rest = rest.replace("\\'", "'");

    match serde_json::Deserializer::from_str(&rest).into_iter::<Vec<T>>().next() {
        Some(Ok(rows)) => Ok(rows),
        Some(Err(e)) => Err(ScrapeError::malformed(format!("could not parse {}: {}", variable, e))),
        None => Err(ScrapeError::malformed(format!("no value assigned to {}", variable))),
    }
}

fn find_by_id<'a>(document: &'a Html, id: &str) -> Result<Option<ElementRef<'a>>> {
    let selector = Selector::parse(&format!("[id=\"{}\"]", id))
        .map_err(|e| ScrapeError::malformed(format!("bad id '{}': {}", id, e)))?;
    Ok(document.select(&selector).next())
}

/// Siblings after the element's `thead`, then siblings after the element itself.
fn candidates<'a>(anchor: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let after_header = anchor
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "thead")
        .into_iter()
        .flat_map(|thead| thead.next_siblings().filter_map(ElementRef::wrap));

    let after_anchor = anchor.next_siblings().filter_map(ElementRef::wrap);

    after_header.chain(after_anchor)
}
