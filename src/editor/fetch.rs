//! Blocking HTTP fetcher for the `getUrl` command.

use std::time::Duration;

use crate::editor::engine::UrlFetcher;

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(HttpFetcher { client })
    }
}

impl UrlFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(body)
    }
}
