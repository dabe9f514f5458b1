use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::document::Document;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid retrieval URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request for {id} failed with status {status}")]
    Status { id: String, status: u16 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No document for identifier: {0}")]
    NotFound(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Retrieves the raw export for a case identifier. The only blocking
/// operation the pipeline depends on; everything downstream is a pure
/// transform over the fetched text.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, id: &str) -> FetchResult<Document>;
}

/// Fetches exports over HTTP from a caller-owned templated URL.
pub struct HttpFetcher {
    client: Client,
    url_template: String,
}

impl HttpFetcher {
    /// Placeholder replaced with the case identifier.
    pub const ID_PLACEHOLDER: &'static str = "{id}";

    pub fn new(url_template: String) -> FetchResult<Self> {
        if !url_template.contains(Self::ID_PLACEHOLDER) {
            return Err(FetchError::InvalidUrl(url_template));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent(random_user_agent())
            .build()?;

        Ok(Self {
            client,
            url_template,
        })
    }

    fn url_for(&self, id: &str) -> FetchResult<Url> {
        let raw = self.url_template.replace(Self::ID_PLACEHOLDER, id);
        Url::parse(&raw).map_err(|_| FetchError::InvalidUrl(raw))
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &str) -> FetchResult<Document> {
        let url = self.url_for(id)?;
        tracing::debug!(%url, "fetching case export");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        Ok(Document::new(id.to_string(), content))
    }
}

/// Reads exports from `<root>/<id>.html`. Used for offline runs against
/// saved exports and in tests.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait::async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, id: &str) -> FetchResult<Document> {
        let path = self.root.join(format!("{id}.html"));
        if !path.exists() {
            return Err(FetchError::NotFound(id.to_string()));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Document::new(id.to_string(), content))
    }
}

fn random_user_agent() -> String {
    use rand::Rng;

    let agents = [
        "Mozilla/5.0 (Windows NT 10.0; rv:128.0) Gecko/20100101 Firefox/128.0",
        "Mozilla/5.0 (Windows NT 10.0; rv:115.0) Gecko/20100101 Firefox/115.0",
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:128.0) Gecko/20100101 Firefox/128.0",
    ];

    let mut rng = rand::rng();
    agents[rng.random_range(0..agents.len())].to_string()
}
