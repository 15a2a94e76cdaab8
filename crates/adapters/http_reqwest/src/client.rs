//! `reqwest` implementation of [`SensorDbService`].

use std::future::Future;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use sensordb_app::ports::SensorDbService;
use sensordb_domain::device::Device;
use sensordb_domain::device_type::DeviceType;
use sensordb_domain::error::{NotFoundError, SensorDbError};
use sensordb_domain::id::LogEntryId;
use sensordb_domain::location::Location;
use sensordb_domain::log_entry::{LogDetail, LogEntrySummary};
use sensordb_domain::servlet::{
    DeviceTypesResponse, DevicesResponse, ErrorBody, LOG_ID_PARAM, LocationsResponse,
    LogEntriesResponse, LogResponse, action,
};

use crate::config::HttpServiceConfig;
use crate::error::HttpError;

/// Sensor database client talking to the servlet over HTTP.
#[derive(Debug, Clone)]
pub struct ReqwestSensorDbService {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestSensorDbService {
    /// Build a client for the servlet at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidBaseUrl`] when the URL is not an absolute
    /// `http`/`https` URL, or [`HttpError::Request`] when the TLS backend
    /// cannot be initialised.
    pub fn new(config: &HttpServiceConfig) -> Result<Self, HttpError> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, base_url })
    }

    /// The normalised base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn action_url(&self, action: &str) -> Result<Url, HttpError> {
        self.base_url
            .join(action)
            .map_err(|err| HttpError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: err.to_string(),
            })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SensorDbError> {
        let url = self.action_url(action)?;
        debug!(%url, "requesting sensor database");

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let resp = request.send().await.map_err(HttpError::from)?;
        let resp = check_response(resp).await?;
        let body = resp.json::<T>().await.map_err(HttpError::from)?;
        Ok(body)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, HttpError> {
    let invalid = |reason: String| HttpError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut normalized = raw.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    Ok(url)
}

/// Turn a non-2xx response into [`SensorDbError::Rejected`], preferring the
/// servlet's own error message.
async fn check_response(resp: Response) -> Result<Response, SensorDbError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("HTTP {status}"),
    };
    Err(SensorDbError::Rejected(message))
}

impl SensorDbService for ReqwestSensorDbService {
    fn get_locations(&self) -> impl Future<Output = Result<Vec<Location>, SensorDbError>> {
        async move {
            let body: LocationsResponse = self.get(action::GET_LOCATIONS, &[]).await?;
            Ok(body.locations)
        }
    }

    fn get_device_types(&self) -> impl Future<Output = Result<Vec<DeviceType>, SensorDbError>> {
        async move {
            let body: DeviceTypesResponse = self.get(action::GET_DEVICE_TYPES, &[]).await?;
            Ok(body.device_types)
        }
    }

    fn get_devices(&self) -> impl Future<Output = Result<Vec<Device>, SensorDbError>> {
        async move {
            let body: DevicesResponse = self.get(action::GET_DEVICES, &[]).await?;
            Ok(body.devices)
        }
    }

    fn get_list_of_log_entries(
        &self,
    ) -> impl Future<Output = Result<Vec<LogEntrySummary>, SensorDbError>> {
        async move {
            let body: LogEntriesResponse =
                self.get(action::GET_LIST_OF_LOG_ENTRIES, &[]).await?;
            Ok(body.log_entries)
        }
    }

    fn get_log(&self, id: &LogEntryId) -> impl Future<Output = Result<LogDetail, SensorDbError>> {
        async move {
            let body: LogResponse = self
                .get(action::GET_LOG, &[(LOG_ID_PARAM, id.as_str())])
                .await?;
            body.log.ok_or_else(|| {
                NotFoundError {
                    entity: "log",
                    id: id.to_string(),
                }
                .into()
            })
        }
    }
}
