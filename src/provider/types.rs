//! Dyn REST API request and response bodies.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// TTL applied to every CNAME written by this tool.
pub const CNAME_TTL: u32 = 600;

/// Error code Dyn uses when a record lookup matches nothing.
pub const NOT_FOUND_CODE: &str = "NOT_FOUND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
    Incomplete,
    #[serde(other)]
    Unknown,
}

/// Envelope shared by every Dyn response. `data` is only given a concrete
/// shape once the status says it succeeded, since failures send `{}` or null.
#[derive(Debug, Deserialize)]
pub struct DynResponse {
    pub status: Status,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub msgs: Vec<ProviderMessage>,
}

impl DynResponse {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn into_data<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(self.data)
    }
}

/// Dyn usually sends structured messages, but plain strings show up too.
/// Anything else is kept as raw JSON so the envelope still decodes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProviderMessage {
    Text(String),
    Detail(MessageDetail),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageDetail {
    #[serde(rename = "INFO", default)]
    pub info: Option<String>,
    #[serde(rename = "SOURCE", default)]
    pub source: Option<String>,
    #[serde(rename = "ERR_CD", default)]
    pub err_cd: Option<String>,
    #[allow(dead_code)]
    #[serde(rename = "LVL", default)]
    pub level: Option<String>,
}

impl ProviderMessage {
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ProviderMessage::Text(_) => None,
            ProviderMessage::Detail(detail) => detail.err_cd.as_deref(),
            ProviderMessage::Other(value) => value.get("ERR_CD").and_then(|v| v.as_str()),
        }
    }
}

impl fmt::Display for ProviderMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderMessage::Text(text) => f.write_str(text),
            ProviderMessage::Detail(detail) => {
                if let Some(code) = &detail.err_cd {
                    write!(f, "[{}] ", code)?;
                }
                if let Some(source) = &detail.source {
                    write!(f, "{}: ", source)?;
                }
                f.write_str(detail.info.as_deref().unwrap_or("-"))
            }
            ProviderMessage::Other(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SessionRequest {
    pub customer_name: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SessionData {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CnameRdata {
    pub cname: String,
}

/// Body for both creating and updating a CNAME record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CnameRecordRequest {
    pub rdata: CnameRdata,
    pub ttl: u32,
}

impl CnameRecordRequest {
    pub fn new(host: &str) -> Self {
        Self {
            rdata: CnameRdata {
                cname: host.to_string(),
            },
            ttl: CNAME_TTL,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishRequest {
    pub publish: String,
}

impl Default for PublishRequest {
    fn default() -> Self {
        Self {
            publish: "true".to_string(),
        }
    }
}
