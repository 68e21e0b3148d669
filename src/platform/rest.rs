//! REST client for the incident-response platform

use async_trait::async_trait;
use lru::LruCache;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, trace};

use super::{IncidentMutation, IncidentPlatform};
use crate::config::PlatformConfig;
use crate::models::{IncidentId, IncidentRecord};
use crate::{ActionError, ActionResult};

#[derive(Debug, Deserialize)]
struct SessionInfo {
    #[serde(default)]
    orgs: Vec<OrgSummary>,
}

#[derive(Debug, Deserialize)]
struct OrgSummary {
    id: i64,
    name: String,
}

/// Definition of an incident field, as served by the type endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

/// One selectable value of a select field
#[derive(Debug, Clone, Deserialize)]
pub struct FieldValue {
    pub value: Value,
    pub label: String,
}

impl FieldDefinition {
    pub fn label_for(&self, code: &Value) -> Option<&str> {
        self.values
            .iter()
            .find(|v| codes_match(&v.value, code))
            .map(|v| v.label.as_str())
    }
}

/// Select codes arrive as numbers from some sources and as strings from others
fn codes_match(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<i64>().ok() == n.as_i64()
        }
        _ => false,
    }
}

/// [`IncidentPlatform`] backed by the platform's REST API.
///
/// Authenticates every call with the API key pair. The organization id is looked
/// up once by name; incident field definitions are kept in a small LRU cache.
pub struct RestPlatformClient {
    base_url: String,
    org_name: String,
    credentials: Option<(String, String)>,
    client: Client,
    org_id: OnceCell<i64>,
    field_cache: Mutex<LruCache<String, Arc<FieldDefinition>>>,
}

impl RestPlatformClient {
    pub fn new(config: &PlatformConfig) -> ActionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        let credentials = match (&config.api_key_id, &config.api_key_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        };

        let capacity = NonZeroUsize::new(config.label_cache_size).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            org_name: config.org.clone(),
            credentials,
            client,
            org_id: OnceCell::new(),
            field_cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/rest{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        match &self.credentials {
            Some((id, secret)) => builder.basic_auth(id, Some(secret)),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> ActionResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} failed with status {}: {}", what, status, body);
            return Err(ActionError::platform(
                format!("{} returned {}: {}", what, status, body),
                Some(status.as_u16()),
            ));
        }

        Ok(response.json::<T>().await?)
    }

    /// Numeric id of the configured organization
    pub async fn org_id(&self) -> ActionResult<i64> {
        let id = self
            .org_id
            .get_or_try_init(|| async {
                let session: SessionInfo = self
                    .send_json(self.request(Method::GET, "/session"), "GET /rest/session")
                    .await?;

                let org = session
                    .orgs
                    .into_iter()
                    .find(|org| org.name == self.org_name)
                    .ok_or_else(|| {
                        ActionError::configuration(format!(
                            "Organization '{}' is not available to this API key",
                            self.org_name
                        ))
                    })?;

                info!("Resolved organization '{}' to id {}", self.org_name, org.id);
                Ok::<i64, ActionError>(org.id)
            })
            .await?;

        Ok(*id)
    }

    /// Fetch an incident field definition, served from cache when possible
    pub async fn field_definition(&self, field_name: &str) -> ActionResult<Arc<FieldDefinition>> {
        {
            let mut cache = self.field_cache.lock().await;
            if let Some(definition) = cache.get(field_name) {
                trace!("Field definition cache hit: {}", field_name);
                return Ok(definition.clone());
            }
        }

        let org_id = self.org_id().await?;
        let path = format!("/orgs/{}/types/incident/fields/{}", org_id, field_name);
        let definition: FieldDefinition = self
            .send_json(self.request(Method::GET, &path), &format!("GET {}", path))
            .await?;

        let definition = Arc::new(definition);
        let mut cache = self.field_cache.lock().await;
        cache.put(field_name.to_string(), definition.clone());
        Ok(definition)
    }

    fn incident_path(org_id: i64, incident_id: &IncidentId) -> String {
        format!("/orgs/{}/incidents/{}", org_id, incident_id)
    }
}

#[async_trait]
impl IncidentPlatform for RestPlatformClient {
    async fn fetch_and_mutate(&self, incident_id: &IncidentId, mutation: &IncidentMutation) -> ActionResult<Value> {
        let org_id = self.org_id().await?;
        let path = Self::incident_path(org_id, incident_id);

        let mut record: IncidentRecord = self
            .send_json(self.request(Method::GET, &path), &format!("GET {}", path))
            .await?;

        mutation.apply(&mut record);
        debug!("Writing {} on incident {}", mutation.field(), incident_id);

        let response = self
            .request(Method::PUT, &path)
            .header(CONTENT_TYPE, "application/json")
            .json(&record)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("PUT {} failed with status {}: {}", path, status, body);
            return Err(ActionError::platform(
                format!("PUT {} returned {}: {}", path, status, body),
                Some(status.as_u16()),
            ));
        }

        if body.trim().is_empty() {
            Ok(Value::Object(record))
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }

    async fn resolve_label(&self, field_name: &str, code: &Value) -> ActionResult<Option<String>> {
        let definition = self.field_definition(field_name).await?;
        Ok(definition.label_for(code).map(str::to_string))
    }
}
