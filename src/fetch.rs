use crate::error::Result;
use crate::types::Credentials;
use reqwest::blocking::Client;
use scraper::Html;
use tracing::debug;

/// Source of raw page bodies. The HTTP implementation is the only production
/// one; tests plug in canned pages.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<String>;
}

/// Fetch a page and parse it into a queryable document
pub fn fetch_document(fetcher: &dyn Fetch, url: &str) -> Result<Html> {
    let body = fetcher.get(url)?;
    Ok(Html::parse_document(&body))
}

/// Blocking HTTP fetcher sending basic-auth credentials with every request
pub struct HttpFetcher {
    client: Client,
    credentials: Credentials,
}

impl HttpFetcher {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self { client, credentials }
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()?
            .error_for_status()?;

        Ok(response.text()?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::ScrapeError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Serves canned HTML per URL and remembers every request.
    #[derive(Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        requests: Rc<RefCell<Vec<String>>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        /// Shared handle to the request log, usable after the fetcher is moved.
        pub fn requests(&self) -> Rc<RefCell<Vec<String>>> {
            Rc::clone(&self.requests)
        }
    }

    impl Fetch for FakeFetcher {
        fn get(&self, url: &str) -> Result<String> {
            self.requests.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::wrong_shape(url, "no canned page"))
        }
    }
}
