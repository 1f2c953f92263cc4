//! Maps a vault's `domain` to the base URL of that domain's VaultMesh
//! server. Defaults cover the project's own domains plus a
//! loopback entry for local development.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DomainResolver {
    base_urls: HashMap<String, String>,
}

impl DomainResolver {
    pub fn new(base_urls: HashMap<String, String>) -> Self {
        Self { base_urls }
    }

    pub fn with_defaults() -> Self {
        let mut base_urls = HashMap::new();
        base_urls.insert("keypears.com".to_string(), "https://keypears.com".to_string());
        base_urls.insert("passapples.com".to_string(), "https://passapples.com".to_string());
        base_urls.insert("localhost".to_string(), "http://127.0.0.1:8787".to_string());
        Self { base_urls }
    }

    pub fn resolve(&self, domain: &str) -> Option<&str> {
        self.base_urls.get(domain).map(String::as_str)
    }

    pub fn insert(&mut self, domain: impl Into<String>, base_url: impl Into<String>) {
        self.base_urls.insert(domain.into(), base_url.into());
    }
}

impl Default for DomainResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}
