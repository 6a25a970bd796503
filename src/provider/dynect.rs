use std::fmt;

use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::types::{
    CnameRecordRequest, DynResponse, ProviderMessage, PublishRequest, SessionData,
    SessionRequest, NOT_FOUND_CODE,
};
use crate::config::{Credentials, Settings};
use crate::error::{Error, Messages, Result};

const AUTH_TOKEN_HEADER: &str = "Auth-Token";

/// Absolute API path of one CNAME record, as handed back by a lookup,
/// e.g. `/REST/CNAMERecord/ft.com/www.ft.com/12345/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPath(String);

impl RecordPath {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.starts_with('/') {
            Self(path)
        } else {
            Self(format!("/{}", path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(RecordPath),
    NotFound,
}

/// Unauthenticated handle on the Dyn API. The only thing it can do is log
/// in; every other call lives on [`Session`].
pub struct DynClient {
    http: Client,
    base_url: Url,
}

impl DynClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let base_url = Url::parse(&settings.api_base).map_err(|e| Error::BaseUrl {
            url: settings.api_base.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::BaseUrl {
                url: settings.api_base.clone(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(Error::Client)?;

        Ok(Self { http, base_url })
    }

    /// Appends each segment percent-encoded, so a `/`, `?` or `#` inside a
    /// zone or fqdn stays inside its own segment. End with `""` for a
    /// trailing slash.
    fn segment_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Resolves an absolute API path handed back by Dyn itself.
    fn record_url(&self, record: &RecordPath) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), record.as_str());
        url.set_path(&path);
        url
    }

    pub async fn authenticate(self, credentials: &Credentials) -> Result<Session> {
        info!(
            "Logging in to Dyn as {}/{}",
            credentials.customer_name, credentials.user_name
        );

        let body = SessionRequest {
            customer_name: credentials.customer_name.clone(),
            user_name: credentials.user_name.clone(),
            password: credentials.password.clone(),
        };
        let url = self.segment_url(&["REST", "Session", ""]);
        let reply = self
            .execute(Method::POST, url, None, Some(&body), false)
            .await?;

        if !reply.is_success() {
            return Err(Error::Auth(reply.messages()));
        }

        let data: SessionData = reply.data()?;
        if data.token.is_empty() {
            return Err(Error::Auth(Messages(vec![ProviderMessage::Text(
                "provider returned an empty session token".to_string(),
            )])));
        }

        info!("Logged in to Dyn");
        Ok(Session {
            client: self,
            token: data.token,
        })
    }

    async fn execute<B: serde::Serialize>(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: Option<&B>,
        log_body: bool,
    ) -> Result<Reply> {
        debug!("{} {}", method, url);

        let mut request: RequestBuilder = self
            .http
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let url = url.to_string();
        let response = request.send().await.map_err(|source| Error::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|source| Error::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;

        debug!("{} {} -> HTTP {}", method, url, status);
        if log_body {
            debug!("Response body: {}", text);
        }

        let body: DynResponse = serde_json::from_str(&text).map_err(|source| Error::Decode {
            url: url.clone(),
            status,
            source,
        })?;

        Ok(Reply { url, status, body })
    }
}

/// Logged-in handle. Holds the token for the rest of the run.
pub struct Session {
    client: DynClient,
    token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.client.base_url.as_str())
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl Session {
    #[cfg(test)]
    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn lookup_record(&self, zone: &str, fqdn: &str) -> Result<Lookup> {
        let url = self
            .client
            .segment_url(&["REST", "CNAMERecord", zone, fqdn, ""]);
        let reply = self.send(Method::GET, url, None::<&()>).await?;

        let lookup = lookup_outcome(fqdn, reply)?;
        match &lookup {
            Lookup::Found(record) => info!("Found CNAME record for {} at {}", fqdn, record),
            Lookup::NotFound => info!("No CNAME record for {} in zone {}", fqdn, zone),
        }
        Ok(lookup)
    }

    pub async fn create_record(&self, zone: &str, fqdn: &str, host: &str) -> Result<()> {
        info!("Creating CNAME {} -> {}", fqdn, host);

        let url = self
            .client
            .segment_url(&["REST", "CNAMERecord", zone, fqdn, ""]);
        let body = CnameRecordRequest::new(host);
        let reply = self.send(Method::POST, url, Some(&body)).await?;

        if !reply.is_success() {
            return Err(Error::Create {
                fqdn: fqdn.to_string(),
                msgs: reply.messages(),
            });
        }
        Ok(())
    }

    pub async fn update_record(&self, record: &RecordPath, host: &str) -> Result<()> {
        info!("Updating CNAME at {} -> {}", record, host);

        let body = CnameRecordRequest::new(host);
        let url = self.client.record_url(record);
        let reply = self.send(Method::PUT, url, Some(&body)).await?;

        if !reply.is_success() {
            return Err(Error::Update {
                path: record.to_string(),
                msgs: reply.messages(),
            });
        }
        Ok(())
    }

    pub async fn publish(&self, zone: &str) -> Result<()> {
        info!("Publishing zone {}", zone);

        let url = self.client.segment_url(&["REST", "Zone", zone, ""]);
        let reply = self
            .send(Method::PUT, url, Some(&PublishRequest::default()))
            .await?;

        if !reply.is_success() {
            return Err(Error::Publish {
                zone: zone.to_string(),
                msgs: reply.messages(),
            });
        }
        Ok(())
    }

    async fn send<B: serde::Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Reply> {
        self.client
            .execute(method, url, Some(self.token.as_str()), body, true)
            .await
    }
}

/// A decoded envelope plus where it came from, for error reporting.
struct Reply {
    url: String,
    status: u16,
    body: DynResponse,
}

impl Reply {
    fn is_success(&self) -> bool {
        self.body.is_success()
    }

    fn data<T: DeserializeOwned>(self) -> Result<T> {
        let Reply { url, status, body } = self;
        body.into_data()
            .map_err(|source| Error::Decode { url, status, source })
    }

    fn messages(self) -> Messages {
        Messages(self.body.msgs)
    }
}

fn lookup_outcome(fqdn: &str, reply: Reply) -> Result<Lookup> {
    if reply.is_success() {
        let mut paths: Vec<String> = reply.data()?;
        if paths.len() != 1 {
            return Err(Error::AmbiguousRecord {
                fqdn: fqdn.to_string(),
                found: paths,
            });
        }
        return Ok(Lookup::Found(RecordPath::new(paths.remove(0))));
    }

    let msgs = reply.messages();
    if is_not_found(&msgs) {
        Ok(Lookup::NotFound)
    } else {
        Err(Error::Lookup {
            fqdn: fqdn.to_string(),
            msgs,
        })
    }
}

/// True only when NOT_FOUND is the sole error code reported. Anything else
/// alongside it (bad token, bad zone) has to surface as an error.
fn is_not_found(msgs: &Messages) -> bool {
    let codes: Vec<&str> = msgs.0.iter().filter_map(|m| m.error_code()).collect();
    !codes.is_empty() && codes.iter().all(|code| *code == NOT_FOUND_CODE)
}
