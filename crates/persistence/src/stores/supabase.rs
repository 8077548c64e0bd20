//! SupabaseStore - PostgREST tables over HTTPS

use std::collections::HashMap;
use std::time::Duration;

use contracts::{
    Alert, ContractError, LatestValue, LogEntry, NewAlert, NewLogEntry, ReadingStore,
    LATEST_VALUE_ID,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::PersistenceError;

/// Environment variable consulted when `service_key` is not in params
pub const SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Configuration for SupabaseStore
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Service key sent as `apikey` and bearer token
    pub service_key: String,
    pub log_table: String,
    pub latest_table: String,
    pub alert_table: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Create config from params map, falling back to the environment for the key
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, PersistenceError> {
        Self::from_params_with_key(params, std::env::var(SERVICE_KEY_ENV).ok())
    }

    fn from_params_with_key(
        params: &HashMap<String, String>,
        env_key: Option<String>,
    ) -> Result<Self, PersistenceError> {
        let url = params
            .get("url")
            .filter(|url| !url.trim().is_empty())
            .ok_or(PersistenceError::missing("supabase", "url"))?
            .trim_end_matches('/')
            .to_string();

        let service_key = params
            .get("service_key")
            .cloned()
            .or(env_key)
            .filter(|key| !key.is_empty())
            .ok_or(PersistenceError::missing("supabase", "service_key"))?;

        let timeout_ms = match params.get("timeout_ms") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                PersistenceError::invalid("supabase", "timeout_ms", e.to_string())
            })?,
            None => 10_000,
        };

        let table = |key: &str, default: &str| {
            params
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            url,
            service_key,
            log_table: table("log_table", "sensor_logs"),
            latest_table: table("latest_table", "sensor_latest"),
            alert_table: table("alert_table", "sensor_alerts"),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}

/// Store backed by a hosted Postgres exposed through PostgREST
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    name: String,
    config: SupabaseConfig,
    tenant: Option<String>,
    client: Client,
}

impl SupabaseStore {
    /// Build the HTTP client (no request is made here)
    pub fn new(
        name: impl Into<String>,
        config: SupabaseConfig,
        tenant: Option<String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let connection_err = |message: String| ContractError::storage_connection(&name, message);

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.service_key)
            .map_err(|e| connection_err(format!("invalid service key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|e| connection_err(format!("invalid service key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| connection_err(e.to_string()))?;

        debug!(store = %name, url = %config.url, "SupabaseStore ready");

        Ok(Self {
            name,
            config,
            tenant,
            client,
        })
    }

    /// Create from params (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
        tenant: Option<String>,
    ) -> Result<Self, PersistenceError> {
        let config = SupabaseConfig::from_params(params)?;
        Ok(Self::new(name, config, tenant)?)
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        target: &str,
        body: &B,
        prefer: &str,
    ) -> Result<T, ContractError> {
        let write_err = |message: String| ContractError::storage_write(&self.name, target, message);

        let rows: Vec<T> = self
            .send(
                self.client
                    .post(self.config.table_url(table))
                    .header("Prefer", prefer)
                    .json(body),
            )
            .await
            .map_err(write_err)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| write_err("empty representation returned".to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, ContractError> {
        let mut request = self
            .client
            .get(self.config.table_url(table))
            .query(&[("select", "*")])
            .query(filters);
        if let Some(tenant) = &self.tenant {
            request = request.query(&[("tenant_id", format!("eq.{tenant}"))]);
        }

        self.send(request)
            .await
            .map_err(|message| ContractError::storage_read(&self.name, message))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, String> {
        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {status}: {body}"));
        }
        response.json().await.map_err(|e| e.to_string())
    }
}

impl ReadingStore for SupabaseStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "supabase_append_log", skip(self, entry))]
    async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, ContractError> {
        self.insert(
            &self.config.log_table,
            "log",
            &entry,
            "return=representation",
        )
        .await
    }

    #[instrument(name = "supabase_upsert_latest", skip(self, value))]
    async fn upsert_latest(&self, value: LatestValue) -> Result<LatestValue, ContractError> {
        let table = format!("{}?on_conflict=id", self.config.latest_table);
        self.insert(
            &table,
            "latest",
            &value,
            "resolution=merge-duplicates,return=representation",
        )
        .await
    }

    #[instrument(name = "supabase_append_alert", skip(self, alert))]
    async fn append_alert(&self, alert: NewAlert) -> Result<Alert, ContractError> {
        self.insert(
            &self.config.alert_table,
            "alert",
            &alert,
            "return=representation",
        )
        .await
    }

    async fn latest(&self) -> Result<Option<LatestValue>, ContractError> {
        let rows: Vec<LatestValue> = self
            .select(
                &self.config.latest_table,
                &[("id", format!("eq.{LATEST_VALUE_ID}"))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>, ContractError> {
        self.select(
            &self.config.log_table,
            &[
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, ContractError> {
        self.select(
            &self.config.alert_table,
            &[
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn config_defaults() {
        let config = SupabaseConfig::from_params_with_key(
            &params(&[("url", "https://demo.supabase.co/"), ("service_key", "secret")]),
            None,
        )
        .unwrap();
        assert_eq!(config.url, "https://demo.supabase.co");
        assert_eq!(config.log_table, "sensor_logs");
        assert_eq!(config.latest_table, "sensor_latest");
        assert_eq!(config.alert_table, "sensor_alerts");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(
            config.table_url("sensor_logs"),
            "https://demo.supabase.co/rest/v1/sensor_logs"
        );
    }

    #[test]
    fn key_falls_back_to_environment_value() {
        let config = SupabaseConfig::from_params_with_key(
            &params(&[("url", "https://demo.supabase.co")]),
            Some("from-env".into()),
        )
        .unwrap();
        assert_eq!(config.service_key, "from-env");

        let err = SupabaseConfig::from_params_with_key(
            &params(&[("url", "https://demo.supabase.co")]),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::MissingParam {
                param: "service_key",
                ..
            }
        ));
    }

    #[test]
    fn url_is_required_and_timeout_parsed() {
        assert!(SupabaseConfig::from_params_with_key(&params(&[]), Some("k".into())).is_err());

        let err = SupabaseConfig::from_params_with_key(
            &params(&[("url", "https://x"), ("timeout_ms", "soon")]),
            Some("k".into()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::InvalidParam {
                param: "timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn store_builds_without_network() {
        let config = SupabaseConfig::from_params_with_key(
            &params(&[("url", "https://demo.supabase.co"), ("log_table", "logs")]),
            Some("k".into()),
        )
        .unwrap();
        let store = SupabaseStore::new("supabase", config, Some("profile-1".into())).unwrap();
        assert_eq!(store.name(), "supabase");
        assert_eq!(store.config.log_table, "logs");
    }
}
