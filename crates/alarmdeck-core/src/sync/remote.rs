//! Remote alarm service client.
//!
//! The backend is an external collaborator reached through four endpoints
//! (`GET/POST /alarms`, `PUT/DELETE /alarms/{id}`). The coordinator only
//! talks to the [`RemoteStore`] trait so the engine stays testable without
//! a network; [`HttpRemote`] is the production implementation.

use chrono::{DateTime, Utc};
use url::Url;

use crate::alarm::Alarm;
use crate::error::SyncError;

/// Remote canonical store for alarm records. All calls are opportunistic:
/// the caller tolerates failure and retries on a later tick.
pub trait RemoteStore {
    /// Fetch the full remote collection.
    fn fetch_all(&self) -> Result<Vec<Alarm>, SyncError>;

    /// Upsert a single alarm remotely.
    fn push(&self, alarm: &Alarm) -> Result<(), SyncError>;

    /// Delete an alarm remotely. Absence is success.
    fn delete(&self, id: &str) -> Result<(), SyncError>;
}

/// Wire shape of `GET /alarms`: either a bare array or the persisted
/// envelope, depending on backend version.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum FetchResponse {
    Envelope {
        alarms: Vec<Alarm>,
        #[serde(rename = "lastUpdated")]
        #[allow(dead_code)]
        last_updated: Option<DateTime<Utc>>,
    },
    Bare(Vec<Alarm>),
}

/// reqwest-backed remote store.
///
/// Owns a small current-thread runtime so callers do not need to be async;
/// remote calls are the only suspension points in the engine and are always
/// allowed to fail.
pub struct HttpRemote {
    base: Url,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpRemote {
    /// Build a client for the given base URL (e.g. `http://127.0.0.1:8420`).
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let base = Url::parse(base_url)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            base,
            client: reqwest::Client::new(),
            runtime,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        Ok(self.base.join(path)?)
    }
}

impl RemoteStore for HttpRemote {
    fn fetch_all(&self) -> Result<Vec<Alarm>, SyncError> {
        let url = self.endpoint("alarms")?;
        let response: FetchResponse = self.runtime.block_on(async {
            let resp = self.client.get(url).send().await?;
            if !resp.status().is_success() {
                return Err(SyncError::Status(resp.status().as_u16()));
            }
            Ok(resp.json().await?)
        })?;
        Ok(match response {
            FetchResponse::Envelope { alarms, .. } => alarms,
            FetchResponse::Bare(alarms) => alarms,
        })
    }

    fn push(&self, alarm: &Alarm) -> Result<(), SyncError> {
        let put_url = self.endpoint(&format!("alarms/{}", alarm.id))?;
        let post_url = self.endpoint("alarms")?;
        self.runtime.block_on(async {
            let resp = self.client.put(put_url).json(alarm).send().await?;
            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                // Not known remotely yet; create it.
                let resp = self.client.post(post_url).json(alarm).send().await?;
                if !resp.status().is_success() {
                    return Err(SyncError::Status(resp.status().as_u16()));
                }
                return Ok(());
            }
            if !resp.status().is_success() {
                return Err(SyncError::Status(resp.status().as_u16()));
            }
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("alarms/{id}"))?;
        self.runtime.block_on(async {
            let resp = self.client.delete(url).send().await?;
            if resp.status() == reqwest::StatusCode::NOT_FOUND || resp.status().is_success() {
                Ok(())
            } else {
                Err(SyncError::Status(resp.status().as_u16()))
            }
        })
    }
}
