//! Blocking HTTP client for the remote modeling service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ServiceConfig;
use crate::domain::table::Table;
use crate::infrastructure::document::decode_tables;
use crate::infrastructure::error::ServiceError;
use crate::infrastructure::traits::ModelingService;

/// Runs processes as `GET <base_url>/<process>?<params>` with basic auth.
pub struct RestModelingService {
    config: ServiceConfig,
    client: Client,
}

impl RestModelingService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(concat!("dtviz/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Request {
                process: "<client>".to_string(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    pub fn process_url(&self, process: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), process)
    }
}

impl ModelingService for RestModelingService {
    #[instrument(level = "debug", skip(self, params))]
    fn run(&self, process: &str, params: &[(String, String)]) -> Result<Vec<Table>, ServiceError> {
        let url = self.process_url(process);
        debug!("GET {} with {} parameters", url, params.len());

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .query(params)
            .send()
            .map_err(|e| ServiceError::Request {
                process: process.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                process: process.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| ServiceError::decode(process, e.to_string()))?;
        decode_tables(process, body)
    }
}

/// Serves a saved document from disk for every process.
///
/// Lets the dashboard be driven offline from a captured service response.
pub struct DocumentFileService {
    path: PathBuf,
}

impl DocumentFileService {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ModelingService for DocumentFileService {
    fn run(&self, process: &str, params: &[(String, String)]) -> Result<Vec<Table>, ServiceError> {
        debug!(
            "{}: answering from {} (ignoring {} parameters)",
            process,
            self.path.display(),
            params.len()
        );
        let content = std::fs::read_to_string(&self.path).map_err(|e| ServiceError::Request {
            process: process.to_string(),
            message: format!("read {}: {e}", self.path.display()),
        })?;
        let body: Value = serde_json::from_str(&content)
            .map_err(|e| ServiceError::decode(process, format!("{}: {e}", self.path.display())))?;
        decode_tables(process, body)
    }
}

/// Flatten a request body into query parameters.
///
/// Top-level string fields pass through unchanged; anything else, nested
/// objects included, is sent as its JSON text.
pub fn query_params(process: &str, body: &impl Serialize) -> Result<Vec<(String, String)>, ServiceError> {
    let value = serde_json::to_value(body).map_err(|e| ServiceError::Request {
        process: process.to_string(),
        message: format!("cannot encode parameters: {e}"),
    })?;
    let Value::Object(fields) = value else {
        return Err(ServiceError::Request {
            process: process.to_string(),
            message: "parameters must be an object".to_string(),
        });
    };
    Ok(fields
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, s),
            other => (key, other.to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_base_url_with_slash_when_building_process_url_then_joins_once() {
        let service = RestModelingService::new(ServiceConfig {
            base_url: "http://localhost:9000/api/rest/process/".into(),
            ..ServiceConfig::default()
        })
        .unwrap();
        assert_eq!(
            service.process_url("EDAR_Cartuja_Prediccion_JSON"),
            "http://localhost:9000/api/rest/process/EDAR_Cartuja_Prediccion_JSON"
        );
    }

    #[test]
    fn given_nested_body_when_building_query_then_objects_are_json_encoded() {
        let body = json!({"Modelo": "Calidad_Agua", "Variables_influyentes": {"pH": 7.2}, "n": 4});
        let params = query_params("P", &body).unwrap();
        assert_eq!(
            params,
            vec![
                ("Modelo".to_string(), "Calidad_Agua".to_string()),
                ("Variables_influyentes".to_string(), r#"{"pH":7.2}"#.to_string()),
                ("n".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn given_saved_document_when_running_then_decodes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, r#"[[{"a": 1}], []]"#).unwrap();

        let tables = DocumentFileService::new(&path).run("P", &[]).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 1);

        let missing = DocumentFileService::new(dir.path().join("nope.json")).run("P", &[]);
        assert!(matches!(missing, Err(ServiceError::Request { .. })));
    }

    #[test]
    fn given_scalar_body_when_building_query_then_errors() {
        assert!(query_params("P", &json!(3)).is_err());
    }
}
