use std::fmt;

use thiserror::Error;

use crate::provider::types::ProviderMessage;

pub type Result<T> = std::result::Result<T, Error>;

/// Messages returned by Dyn alongside a non-success status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Messages(pub Vec<ProviderMessage>);

impl fmt::Display for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no details from provider");
        }
        let parts: Vec<String> = self.0.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Every failure aborts the run; nothing here is retried.
#[derive(Error, Debug)]
pub enum Error {
    #[error("dyn: invalid API base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("dyn: could not build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("dyn: request {method} {url} failed")]
    Transport {
        method: reqwest::Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("dyn: could not decode response from {url} (HTTP {status})")]
    Decode {
        url: String,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("dyn: login was not successful: {0}")]
    Auth(Messages),

    #[error("dyn: expected exactly 1 CNAME record for {fqdn}, found {count}: {found:?}", count = .found.len())]
    AmbiguousRecord { fqdn: String, found: Vec<String> },

    #[error("dyn: could not get CNAME record for {fqdn}: {msgs}")]
    Lookup { fqdn: String, msgs: Messages },

    #[error("dyn: failed to create CNAME for {fqdn}: {msgs}")]
    Create { fqdn: String, msgs: Messages },

    #[error("dyn: failed to update CNAME at {path}: {msgs}")]
    Update { path: String, msgs: Messages },

    #[error("dyn: failed to publish zone {zone}: {msgs}")]
    Publish { zone: String, msgs: Messages },
}
