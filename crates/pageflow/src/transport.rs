use std::time::Duration;

use async_trait::async_trait;
use pageflow_core::query::QueryState;
use pageflow_core::view::Page;

use crate::error::Error;

/// Performs the request/response exchange for one query.
///
/// Any exchange that accepts a `QueryState` (sort specification, zero-based
/// page index, page size, filter) and answers with a `Page` will do. Timeouts
/// are the transport's business and surface as an ordinary `Err`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn fetch(&self, query: &QueryState) -> Result<Page, Error>;
}

/// JSON over HTTP: `POST <endpoint>` with the query state as body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, query: &QueryState) -> Result<Page, Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout.as_millis() as u64)
                } else {
                    Error::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        response.json::<Page>().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout.as_millis() as u64)
            } else {
                Error::Decode(e.to_string())
            }
        })
    }
}
