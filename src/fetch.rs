use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

// Resolves a page name from the configured page list to its raw markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, page: &str) -> Result<String>;
}

fn fetch_error(page: &str, message: impl fmt::Display) -> Error {
    Error::Fetch {
        page: page.to_string(),
        message: message.to_string(),
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryFetcher {
    pages: HashMap<String, String>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: &str, markup: &str) {
        self.pages.insert(page.to_string(), markup.to_string());
    }
}

#[async_trait]
impl PageFetcher for InMemoryFetcher {
    async fn fetch(&self, page: &str) -> Result<String> {
        self.pages
            .get(page)
            .cloned()
            .ok_or_else(|| fetch_error(page, "no markup registered for page"))
    }
}

#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PageFetcher for DirFetcher {
    async fn fetch(&self, page: &str) -> Result<String> {
        let rel = Path::new(page);
        if rel.is_absolute()
            || rel
                .components()
                .any(|part| matches!(part, Component::ParentDir))
        {
            return Err(fetch_error(page, "path escapes the page directory"));
        }
        tokio::fs::read_to_string(self.root.join(rel))
            .await
            .map_err(|err| fetch_error(page, err))
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpFetcher {
    pub fn new(base: &str) -> Result<Self> {
        let base = reqwest::Url::parse(base).map_err(|err| fetch_error(base, err))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, page: &str) -> Result<String> {
        let url = self
            .base
            .join(page)
            .map_err(|err| fetch_error(page, err))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| fetch_error(page, err))?
            .error_for_status()
            .map_err(|err| fetch_error(page, err))?;
        response.text().await.map_err(|err| fetch_error(page, err))
    }
}
