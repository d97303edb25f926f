/// InfluxDB sink
///
/// Writes points with the InfluxDB 1.x line protocol over HTTP, one point
/// per request with millisecond timestamp precision. The database is
/// created up front; CREATE DATABASE is idempotent on the InfluxDB side.

use reqwest::Client;
use serde::Deserialize;

use crate::core::config::InfluxConfig;
use crate::core::error::CollectError;
use crate::core::series::SeriesPoint;
use crate::utils::constants::{HTTP_TIMEOUT, INFLUX_PORT};

/// Error body returned by the InfluxDB HTTP API.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

pub struct InfluxSink {
    http: Client,
    base_url: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxSink {
    pub fn new(config: &InfluxConfig) -> Result<Self, CollectError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| CollectError::SinkConnectivity(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url(&config.address),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn credentials(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(username) = &self.username {
            params.push(("u", username.clone()));
        }
        if let Some(password) = &self.password {
            params.push(("p", password.clone()));
        }
        params
    }

    /// Creates the target database if it does not exist yet.
    pub async fn ensure_database(&self) -> Result<(), CollectError> {
        let mut params = vec![("q", format!("CREATE DATABASE \"{}\"", self.database))];
        params.extend(self.credentials());

        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| CollectError::SinkConnectivity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollectError::SinkConnectivity(api_error(response).await));
        }
        Ok(())
    }

    /// Writes one point with millisecond timestamp precision.
    pub async fn write_point(&self, point: &SeriesPoint) -> Result<(), CollectError> {
        let mut params = vec![
            ("db", self.database.clone()),
            ("precision", "ms".to_string()),
        ];
        params.extend(self.credentials());

        let response = self
            .http
            .post(format!("{}/write", self.base_url))
            .query(&params)
            .body(line_protocol(point))
            .send()
            .await
            .map_err(|e| CollectError::SinkConnectivity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollectError::SinkConnectivity(api_error(response).await));
        }
        Ok(())
    }
}

/// Extracts the error message InfluxDB returns as a JSON body.
async fn api_error(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(body) => format!("{} (HTTP {})", body.error, status.as_u16()),
        Err(_) => format!("HTTP {}", status.as_u16()),
    }
}

/// `http://host:8086` unless the configured address already carries a
/// scheme or a port.
fn base_url(address: &str) -> String {
    let with_scheme = if address.contains("://") {
        address.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", address.trim_end_matches('/'))
    };

    let host = &with_scheme[with_scheme.find("://").map(|i| i + 3).unwrap_or(0)..];
    if host.contains(':') {
        with_scheme
    } else {
        format!("{}:{}", with_scheme, INFLUX_PORT)
    }
}

/// One line-protocol line: `measurement,tags fields [timestamp]`.
fn line_protocol(point: &SeriesPoint) -> String {
    let mut line = escape_measurement(&point.measurement);

    for (key, value) in &point.tags {
        line.push(',');
        line.push_str(&escape_tag(key));
        line.push('=');
        line.push_str(&escape_tag(value));
    }

    line.push(' ');
    let fields: Vec<String> = point
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}i", escape_tag(key), value))
        .collect();
    line.push_str(&fields.join(","));

    if let Some(timestamp) = point.timestamp {
        line.push(' ');
        line.push_str(&timestamp.to_string());
    }

    line
}

fn escape_measurement(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
        .replace('=', "\\=")
}
