/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! JSON-RPC client for the telemetry provider's `apiv1` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::api::{Address, Call, Coordinate, TelemetryApi};
use crate::error::{Error, Result};

const AUTH_ERROR_NAMES: &[&str] = &[
    "InvalidUserException",
    "DbUnavailableException",
    "InvalidMyAdminUserException",
];

/// Connection settings for [`GeotabClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host name or URL of the API server (e.g. `my.geotab.com`).
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

/// Credentials issued by `Authenticate` and echoed on every later call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    pub database: String,
    pub user_name: String,
    pub session_id: String,
}

#[derive(Debug, Clone)]
struct Session {
    credentials: SessionCredentials,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateResult {
    credentials: SessionCredentials,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    errors: Vec<RpcErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    name: String,
}

/// Telemetry API client speaking JSON-RPC over HTTPS.
pub struct GeotabClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: RwLock<Option<Session>>,
}

impl GeotabClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        api_url(&config.server)?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            session: RwLock::new(None),
        })
    }

    async fn session(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    async fn post(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        let body = json!({ "method": method, "params": params });
        tracing::debug!(url = %url, method = %method, "Sending RPC request");

        let response = self.http.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Value = response.json().await?;
        decode_envelope(envelope)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, mut params: Value) -> Result<T> {
        let session = self.session().await?;
        if let Value::Object(ref mut map) = params {
            map.insert(
                "credentials".to_string(),
                serde_json::to_value(&session.credentials)?,
            );
        }
        let result = self.post(&session.url, method, params).await?;
        Ok(serde_json::from_value(result)?)
    }
}

#[async_trait]
impl TelemetryApi for GeotabClient {
    async fn authenticate(&self) -> Result<()> {
        let url = api_url(&self.config.server)?;
        let params = json!({
            "database": self.config.database,
            "userName": self.config.username,
            "password": self.config.password,
        });

        let result = self.post(&url, "Authenticate", params).await.map_err(|e| match e {
            Error::Rpc { name, message } => Error::Auth(format!("{name}: {message}")),
            other => other,
        })?;
        let auth: AuthenticateResult = serde_json::from_value(result)?;

        // "ThisServer" means the database lives on the server we asked.
        let url = match auth.path.as_deref() {
            Some(path) if !path.is_empty() && path != "ThisServer" => api_url(path)?,
            _ => url,
        };

        tracing::info!(
            database = %auth.credentials.database,
            url = %url,
            "Authenticated with telemetry API"
        );

        *self.session.write().await = Some(Session {
            credentials: auth.credentials,
            url,
        });
        Ok(())
    }

    async fn get(&self, type_name: &str, search: Option<Value>) -> Result<Vec<Value>> {
        let mut params = json!({ "typeName": type_name });
        if let Some(search) = search {
            params["search"] = search;
        }
        self.call("Get", params).await
    }

    async fn get_addresses(&self, coordinates: &[Coordinate]) -> Result<Vec<Address>> {
        if coordinates.is_empty() {
            return Ok(Vec::new());
        }
        self.call("GetAddresses", json!({ "coordinates": coordinates }))
            .await
    }

    async fn multi_call(&self, calls: Vec<Call>) -> Result<Vec<Value>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        self.call("ExecuteMultiCall", json!({ "calls": calls })).await
    }
}

/// Build the `apiv1` endpoint URL for a server name or URL.
pub fn api_url(server: &str) -> Result<String> {
    let server = server.trim().trim_end_matches('/');
    if server.is_empty() {
        return Err(Error::InvalidServer);
    }
    let base = if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    };
    if base.ends_with("/apiv1") {
        Ok(base)
    } else {
        Ok(format!("{}/apiv1", base))
    }
}

fn decode_envelope(envelope: Value) -> Result<Value> {
    let envelope: RpcEnvelope = serde_json::from_value(envelope)?;
    if let Some(err) = envelope.error {
        return Err(rpc_error(err));
    }
    envelope.result.ok_or(Error::EmptyResponse)
}

fn rpc_error(body: RpcErrorBody) -> Error {
    let first = body.errors.first();
    let name = first
        .map(|d| d.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or(body.name);
    let message = first
        .map(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or(body.message);

    if AUTH_ERROR_NAMES.contains(&name.as_str()) {
        Error::Auth(message)
    } else {
        Error::Rpc { name, message }
    }
}
