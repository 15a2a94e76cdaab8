//! # sensordb-adapter-http-reqwest
//!
//! Implements [`SensorDbService`](sensordb_app::ports::SensorDbService) by
//! calling the sensorDb database servlet over HTTP.

pub mod client;
pub mod config;
pub mod error;

pub use client::ReqwestSensorDbService;
pub use config::HttpServiceConfig;
pub use error::HttpError;
