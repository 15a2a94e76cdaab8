//! HTTP client wrapping `gloo-net` for calls to the database servlet.

use std::future::Future;

use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

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

/// Error returned by the transport.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<gloo_net::Error> for ApiError {
    fn from(err: gloo_net::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl From<ApiError> for SensorDbError {
    fn from(err: ApiError) -> Self {
        Self::Service(Box::new(err))
    }
}

/// Check the HTTP response status and extract an error if non-2xx.
async fn check_response(resp: Response) -> Result<Response, SensorDbError> {
    if resp.ok() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("HTTP {}", resp.status()),
    };
    Err(SensorDbError::Rejected(message))
}

/// Sensor database client using the browser's `fetch`.
#[derive(Debug, Clone)]
pub struct GlooSensorDbService {
    base_url: String,
}

impl GlooSensorDbService {
    /// `base_url` may be relative to the page; a trailing `/` is added if missing.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SensorDbError> {
        let url = format!("{}{action}", self.base_url);
        let request = Request::get(&url).query(query.iter().copied());
        let resp = request.send().await.map_err(ApiError::from)?;
        let resp = check_response(resp).await?;
        let body = resp.json::<T>().await.map_err(ApiError::from)?;
        Ok(body)
    }
}

impl SensorDbService for GlooSensorDbService {
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
