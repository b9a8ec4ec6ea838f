//! Firestore document storage over the REST API

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::auth::{ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
use super::value::{decode_fields, decode_value, encode_fields};
use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: usize = 300;
const COUNT_ALIAS: &str = "count";

/// Firestore connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirestoreConfig {
    /// Google Cloud project; taken from the credentials when unset
    pub project_id: Option<String>,
    /// Service-account key file, used when the environment variable is unset
    pub credentials_path: String,
    /// Environment variable holding the service-account JSON
    pub credentials_env: String,
    /// `host:port` of a Firestore emulator; `FIRESTORE_EMULATOR_HOST` also applies
    pub emulator_host: Option<String>,
    /// REST API root
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            credentials_path: "./admin.json".to_string(),
            credentials_env: "FIREBASE_CREDENTIALS".to_string(),
            emulator_host: None,
            base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl FirestoreConfig {
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<String>) -> Self {
        self.credentials_path = path.into();
        self
    }

    fn resolved_emulator_host(&self) -> Option<String> {
        self.emulator_host
            .clone()
            .or_else(|| std::env::var("FIRESTORE_EMULATOR_HOST").ok())
            .filter(|host| !host.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct RunAggregationQueryResponse {
    result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregationResult {
    #[serde(default)]
    aggregate_fields: Map<String, Value>,
}

/// Firestore-backed storage for one collection
///
/// Each entity is one document whose ID is the entity key. Documents hold the
/// entity's serialized fields; the document ID is re-attached under
/// [`StorageEntity::KEY_FIELD`] when reading.
pub struct FirestoreStorage<E>
where
    E: StorageEntity,
{
    http: reqwest::Client,
    documents_url: Url,
    collection: String,
    auth: Arc<dyn TokenProvider>,
    _phantom: PhantomData<E>,
}

impl<E> Debug for FirestoreStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStorage")
            .field("documents_url", &self.documents_url.as_str())
            .field("collection", &self.collection)
            .finish()
    }
}

impl<E> FirestoreStorage<E>
where
    E: StorageEntity,
{
    /// Creates a storage client for `collection` in the project's default database
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        project_id: &str,
        collection: impl Into<String>,
        auth: Arc<dyn TokenProvider>,
    ) -> Result<Self, DomainError> {
        let root = format!(
            "{}/projects/{}/databases/(default)/documents",
            base_url.trim_end_matches('/'),
            project_id
        );
        let documents_url = Url::parse(&root).map_err(|e| {
            DomainError::configuration(format!("Invalid Firestore URL '{}': {}", root, e))
        })?;

        Ok(Self {
            http,
            documents_url,
            collection: collection.into(),
            auth,
            _phantom: PhantomData,
        })
    }

    /// Builds a client from configuration, using the emulator when one is configured
    pub fn connect(config: &FirestoreConfig, collection: &str) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        if let Some(host) = config.resolved_emulator_host() {
            let project_id = config.project_id.clone().ok_or_else(|| {
                DomainError::configuration("storage.firestore.project_id is required with the emulator")
            })?;
            info!(host = %host, project_id = %project_id, "Using Firestore emulator");

            return Self::new(
                http,
                &format!("http://{}/v1", host),
                &project_id,
                collection,
                Arc::new(StaticTokenProvider::emulator()),
            );
        }

        let key = ServiceAccountKey::load(&config.credentials_env, &config.credentials_path)?;
        let project_id = config
            .project_id
            .clone()
            .unwrap_or_else(|| key.project_id.clone());
        info!(project_id = %project_id, client_email = %key.client_email, "Using Firestore");

        let auth = ServiceAccountTokenProvider::new(key, http.clone())?;
        Self::new(http, &config.base_url, &project_id, collection, Arc::new(auth))
    }

    fn collection_url(&self) -> Result<Url, DomainError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::configuration("Firestore URL cannot be a base"))?
            .push(&self.collection);
        Ok(url)
    }

    fn document_url(&self, key: &str) -> Result<Url, DomainError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| DomainError::configuration("Firestore URL cannot be a base"))?
            .push(key);
        Ok(url)
    }

    /// `{documents}:{rpc}`, e.g. `runQuery` or `runAggregationQuery`
    fn documents_rpc_url(&self, rpc: &str) -> Result<Url, DomainError> {
        let url = format!("{}:{}", self.documents_url, rpc);
        Url::parse(&url)
            .map_err(|e| DomainError::configuration(format!("Invalid Firestore URL: {}", e)))
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, DomainError> {
        let authorization = self.auth.authorization().await?;
        Ok(self
            .http
            .request(method, url)
            .header("Authorization", authorization))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::storage(format!("Firestore request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::storage(format!(
                "Firestore HTTP {}: {}",
                status, body
            )));
        }

        Ok(response)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, DomainError> {
        response
            .json()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to parse Firestore response: {}", e)))
    }

    fn decode_document(document: FirestoreDocument) -> Result<E, DomainError> {
        let key = document
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let mut fields = decode_fields(&document.fields)?;
        fields.insert(E::KEY_FIELD.to_string(), Value::String(key));

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| DomainError::storage(format!("Failed to deserialize entity: {}", e)))
    }
}

#[async_trait]
impl<E> Storage<E> for FirestoreStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let url = self.document_url(key.as_str())?;
        let response = self
            .request(Method::GET, url)
            .await?
            .send()
            .await
            .map_err(|e| DomainError::storage(format!("Firestore request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::storage(format!(
                "Firestore HTTP {}: {}",
                status, body
            )));
        }

        let document: FirestoreDocument = Self::read_json(response).await?;
        Self::decode_document(document).map(Some)
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let mut entities = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &LIST_PAGE_SIZE.to_string());

                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.request(Method::GET, url).await?).await?;
            let page: ListDocumentsResponse = Self::read_json(response).await?;

            for document in page.documents {
                entities.push(Self::decode_document(document)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(collection = %self.collection, count = entities.len(), "Listed Firestore documents");
        Ok(entities)
    }

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        let data = serde_json::to_value(&entity).map_err(|e| {
            DomainError::storage(format!("Failed to serialize entity: {}", e))
        })?;
        let object = data
            .as_object()
            .ok_or_else(|| DomainError::storage("Entity must serialize to a JSON object"))?;

        let url = self.document_url(entity.key().as_str())?;
        let body = serde_json::json!({ "fields": encode_fields(object) });

        // PATCH without an update mask replaces the whole document, creating it if absent
        self.send(self.request(Method::PATCH, url).await?.json(&body))
            .await?;

        Ok(entity)
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Vec<E>, DomainError> {
        let body = serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value }
                    }
                }
            }
        });

        let url = self.documents_rpc_url("runQuery")?;
        let response = self
            .send(self.request(Method::POST, url).await?.json(&body))
            .await?;
        let rows: Vec<RunQueryResponse> = Self::read_json(response).await?;

        rows.into_iter()
            .filter_map(|row| row.document)
            .map(Self::decode_document)
            .collect()
    }

    /// Server-side COUNT aggregation; no documents are transferred
    async fn count(&self) -> Result<usize, DomainError> {
        let body = serde_json::json!({
            "structuredAggregationQuery": {
                "structuredQuery": {
                    "from": [{ "collectionId": self.collection }]
                },
                "aggregations": [{ "alias": COUNT_ALIAS, "count": {} }]
            }
        });

        let url = self.documents_rpc_url("runAggregationQuery")?;
        let response = self
            .send(self.request(Method::POST, url).await?.json(&body))
            .await?;
        let rows: Vec<RunAggregationQueryResponse> = Self::read_json(response).await?;

        let value = rows
            .into_iter()
            .filter_map(|row| row.result)
            .find_map(|result| result.aggregate_fields.get(COUNT_ALIAS).cloned())
            .ok_or_else(|| DomainError::storage("Firestore aggregation returned no count"))?;

        decode_value(&value)?
            .as_u64()
            .map(|count| count as usize)
            .ok_or_else(|| DomainError::storage(format!("Invalid Firestore count: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::serial_key::{KeyPlan, SerialKey, SerialKeyRecord};

    const DOCS_PATH: &str = "/v1/projects/demo/databases/(default)/documents";

    async fn storage(server: &MockServer) -> FirestoreStorage<SerialKeyRecord> {
        FirestoreStorage::new(
            reqwest::Client::new(),
            &format!("{}/v1", server.uri()),
            "demo",
            "serial_keys",
            Arc::new(StaticTokenProvider::emulator()),
        )
        .unwrap()
    }

    fn record(key: &str, customer: &str) -> SerialKeyRecord {
        SerialKeyRecord::issue(
            SerialKey::new(key).unwrap(),
            customer,
            KeyPlan::Monthly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    fn document(key: &str, customer: &str) -> Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/serial_keys/{}", key),
            "fields": {
                "serial_key": { "stringValue": key },
                "customer": { "stringValue": customer },
                "create": { "stringValue": "2024-01-01" },
                "end": { "stringValue": "2024-01-31" }
            },
            "createTime": "2024-01-01T00:00:00.000000Z",
            "updateTime": "2024-01-01T00:00:00.000000Z"
        })
    }

    #[tokio::test]
    async fn test_save_patches_document() {
        let server = MockServer::start().await;
        let key = "MAAA-1111-2222-3333";

        Mock::given(method("PATCH"))
            .and(path(format!("{}/serial_keys/{}", DOCS_PATH, key)))
            .and(header("authorization", "Bearer owner"))
            .and(body_partial_json(json!({
                "fields": {
                    "serial_key": { "stringValue": key },
                    "customer": { "stringValue": "Acme" },
                    "create": { "stringValue": "2024-01-01" },
                    "end": { "stringValue": "2024-01-31" }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(document(key, "Acme")))
            .expect(1)
            .mount(&server)
            .await;

        let saved = storage(&server).await.save(record(key, "Acme")).await.unwrap();
        assert_eq!(saved.customer(), "Acme");
    }

    #[tokio::test]
    async fn test_get_existing_document() {
        let server = MockServer::start().await;
        let key = "MAAA-1111-2222-3333";

        Mock::given(method("GET"))
            .and(path(format!("{}/serial_keys/{}", DOCS_PATH, key)))
            .respond_with(ResponseTemplate::new(200).set_body_json(document(key, "Acme")))
            .mount(&server)
            .await;

        let found = storage(&server)
            .await
            .get(&SerialKey::new(key).unwrap())
            .await
            .unwrap();
        assert_eq!(found, Some(record(key, "Acme")));
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "status": "NOT_FOUND" }
            })))
            .mount(&server)
            .await;

        let found = storage(&server)
            .await
            .get(&SerialKey::new("MZZZ-1111-2222-3333").unwrap())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_follows_page_tokens() {
        let server = MockServer::start().await;
        let collection = format!("{}/serial_keys", DOCS_PATH);

        Mock::given(method("GET"))
            .and(path(collection.clone()))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [
                    document("MAAA-1111-2222-3333", "Acme"),
                    document("MBBB-1111-2222-3333", "Globex")
                ],
                "nextPageToken": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(collection))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [document("YCCC-1111-2222-3333", "Initech")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let all = storage(&server).await.list().await.unwrap();
        let keys: Vec<&str> = all.iter().map(|r| r.serial_key().as_str()).collect();

        assert_eq!(
            keys,
            vec!["MAAA-1111-2222-3333", "MBBB-1111-2222-3333", "YCCC-1111-2222-3333"]
        );
    }

    #[tokio::test]
    async fn test_list_empty_collection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let all = storage(&server).await.list().await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_document_id_overrides_stored_key_field() {
        let server = MockServer::start().await;
        let mut doc = document("MAAA-1111-2222-3333", "Acme");
        doc["fields"]
            .as_object_mut()
            .unwrap()
            .remove("serial_key");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documents": [doc] })))
            .mount(&server)
            .await;

        let all = storage(&server).await.list().await.unwrap();
        assert_eq!(all[0].serial_key().as_str(), "MAAA-1111-2222-3333");
    }

    #[tokio::test]
    async fn test_find_by_field_runs_equality_query() {
        let server = MockServer::start().await;
        let key = "MAAA-1111-2222-3333";

        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", DOCS_PATH)))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "serial_keys" }],
                    "where": {
                        "fieldFilter": {
                            "field": { "fieldPath": "serial_key" },
                            "op": "EQUAL",
                            "value": { "stringValue": key }
                        }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "document": document(key, "Acme"), "readTime": "2024-01-02T00:00:00Z" }
            ])))
            .mount(&server)
            .await;

        let found = storage(&server)
            .await
            .find_by_field("serial_key", key)
            .await
            .unwrap();
        assert_eq!(found, vec![record(key, "Acme")]);
    }

    #[tokio::test]
    async fn test_find_by_field_no_results() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "readTime": "2024-01-02T00:00:00Z" }
            ])))
            .mount(&server)
            .await;

        let found = storage(&server)
            .await
            .find_by_field("serial_key", "MZZZ-0000-0000-0000")
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_count_uses_aggregation_without_listing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{}:runAggregationQuery", DOCS_PATH)))
            .and(body_partial_json(json!({
                "structuredAggregationQuery": {
                    "structuredQuery": { "from": [{ "collectionId": "serial_keys" }] },
                    "aggregations": [{ "alias": "count", "count": {} }]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "result": { "aggregateFields": { "count": { "integerValue": "300" } } },
                    "readTime": "2024-01-02T00:00:00Z"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let count = storage(&server).await.count().await.unwrap();
        assert_eq!(count, 300);
    }

    #[tokio::test]
    async fn test_count_without_result_is_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{}:runAggregationQuery", DOCS_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "readTime": "2024-01-02T00:00:00Z" }
            ])))
            .mount(&server)
            .await;

        let result = storage(&server).await.count().await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_list_keeps_documents_with_legacy_ids() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/serial_keys", DOCS_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [
                    document("MAAA-1111-2222-3333", "Acme"),
                    document("legacy-key-1", "Globex")
                ]
            })))
            .mount(&server)
            .await;

        let all = storage(&server).await.list().await.unwrap();
        let keys: Vec<&str> = all.iter().map(|r| r.serial_key().as_str()).collect();

        assert_eq!(keys, vec!["MAAA-1111-2222-3333", "legacy-key-1"]);
        assert_eq!(all[1].customer(), "Globex");
    }

    #[tokio::test]
    async fn test_server_error_becomes_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let result = storage(&server).await.list().await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[test]
    fn test_connect_with_emulator_requires_project() {
        let config = FirestoreConfig::default().with_emulator_host("localhost:8085");
        let result = FirestoreStorage::<SerialKeyRecord>::connect(&config, "serial_keys");
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_connect_with_emulator() {
        let config = FirestoreConfig::default()
            .with_emulator_host("localhost:8085")
            .with_project_id("demo");
        let storage = FirestoreStorage::<SerialKeyRecord>::connect(&config, "serial_keys").unwrap();

        assert_eq!(
            storage.documents_url.as_str(),
            "http://localhost:8085/v1/projects/demo/databases/(default)/documents"
        );
    }
}
