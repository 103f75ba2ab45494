//! Blocking Pinecone control-plane and data-plane clients.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::records::VectorRecord;

/// Default control-plane root.
pub const DEFAULT_PINECONE_CONTROL: &str = "https://api.pinecone.io";

/// API version pinned on every request.
pub const PINECONE_API_VERSION: &str = "2024-07";

/// Index listing and creation.
pub trait IndexCatalog {
    /// Names of every index in the project.
    fn list_index_names(&self) -> Result<Vec<String>>;
    /// Creates a serverless index.
    fn create_index(&self, spec: &IndexSpec) -> Result<()>;
    /// Whether the named index reports ready.
    fn is_ready(&self, name: &str) -> Result<bool>;
}

/// Destination for vector batches.
pub trait VectorSink {
    /// Upserts `records`, returning the count the service acknowledged.
    fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;
}

/// Parameters fixed at index creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Vector dimensionality.
    pub dimension: usize,
    /// Similarity metric; always `cosine` for this pipeline.
    pub metric: String,
    /// Serverless cloud provider.
    pub cloud: String,
    /// Serverless region.
    pub region: String,
}

impl IndexSpec {
    /// Cosine-metric serverless spec.
    pub fn cosine(name: &str, dimension: usize, cloud: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            metric: "cosine".to_string(),
            cloud: cloud.to_string(),
            region: region.to_string(),
        }
    }
}

/// Description returned by the control plane.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDescription {
    /// Index name.
    pub name: String,
    /// Data-plane host, without scheme.
    #[serde(default)]
    pub host: String,
    /// Vector dimensionality.
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Similarity metric.
    #[serde(default)]
    pub metric: Option<String>,
    /// Readiness status.
    #[serde(default)]
    pub status: IndexStatus,
}

/// Readiness block of an index description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexStatus {
    /// True once the index accepts traffic.
    #[serde(default)]
    pub ready: bool,
    /// Lifecycle state, e.g. `Initializing` or `Ready`.
    #[serde(default)]
    pub state: String,
}

/// Control-plane client.
#[derive(Clone)]
pub struct PineconeClient {
    client: Client,
    control_url: String,
    api_key: String,
    timeout: Duration,
}

impl PineconeClient {
    /// Builds a control-plane client.
    pub fn new(api_key: &str, control_url: &str, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Pinecone API key");
        let client = build_client(api_key, timeout)?;
        Ok(Self {
            client,
            control_url: control_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            timeout,
        })
    }

    /// Fetches the description of `name`.
    pub fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.control_url, name);
        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("failed to describe Pinecone index '{name}'"))?;
        let resp = ensure_success(resp, "describe index")?;
        resp.json()
            .context("failed to parse Pinecone index description")
    }

    /// Opens a data-plane handle for `name`, resolving its host.
    pub fn index(&self, name: &str) -> Result<PineconeIndex> {
        let description = self.describe_index(name)?;
        anyhow::ensure!(
            !description.host.trim().is_empty(),
            "Pinecone index '{}' has no host yet",
            name
        );
        PineconeIndex::new(&self.api_key, &description.host, self.timeout)
    }
}

impl IndexCatalog for PineconeClient {
    fn list_index_names(&self) -> Result<Vec<String>> {
        let url = format!("{}/indexes", self.control_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .context("failed to list Pinecone indexes")?;
        let resp = ensure_success(resp, "list indexes")?;
        let parsed: IndexList = resp.json().context("failed to parse Pinecone index list")?;
        Ok(parsed.indexes.into_iter().map(|index| index.name).collect())
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        anyhow::ensure!(spec.dimension > 0, "index dimension must be positive");
        let url = format!("{}/indexes", self.control_url);
        let body = CreateIndexRequest::from(spec);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .with_context(|| format!("failed to create Pinecone index '{}'", spec.name))?;
        ensure_success(resp, "create index")?;
        Ok(())
    }

    fn is_ready(&self, name: &str) -> Result<bool> {
        Ok(self.describe_index(name)?.status.ready)
    }
}

/// Data-plane client bound to one index host.
#[derive(Clone)]
pub struct PineconeIndex {
    client: Client,
    base_url: String,
}

impl PineconeIndex {
    /// Builds a data-plane client; `host` may omit the scheme.
    pub fn new(api_key: &str, host: &str, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Pinecone API key");
        let host = host.trim().trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Ok(Self {
            client: build_client(api_key, timeout)?,
            base_url,
        })
    }

    /// Nearest neighbours of `vector`.
    pub fn query(&self, vector: &[f32], top_k: usize, include_metadata: bool) -> Result<Vec<QueryMatch>> {
        anyhow::ensure!(top_k > 0, "top_k must be positive");
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata,
        };
        let resp = self
            .client
            .post(format!("{}/query", self.base_url))
            .json(&body)
            .send()
            .context("failed to query Pinecone index")?;
        let resp = ensure_success(resp, "query")?;
        let parsed: QueryResponse = resp.json().context("failed to parse Pinecone query response")?;
        Ok(parsed.matches)
    }
}

impl VectorSink for PineconeIndex {
    fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let body = UpsertRequest { vectors: records };
        let resp = self
            .client
            .post(format!("{}/vectors/upsert", self.base_url))
            .json(&body)
            .send()
            .with_context(|| format!("failed to upsert {} vectors", records.len()))?;
        let resp = ensure_success(resp, "upsert")?;
        let parsed: UpsertResponse = resp.json().context("failed to parse Pinecone upsert response")?;
        Ok(parsed.upserted_count)
    }
}

/// One match from a query.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryMatch {
    /// Vector identifier.
    pub id: String,
    /// Similarity score.
    #[serde(default)]
    pub score: f32,
    /// Stored metadata, when requested.
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl QueryMatch {
    /// The `text` metadata field, if present and a string.
    pub fn text(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get("text"))
            .and_then(|value| value.as_str())
    }
}

fn build_client(api_key: &str, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "api-key",
        HeaderValue::from_str(api_key.trim()).context("invalid Pinecone API key")?,
    );
    headers.insert(
        "x-pinecone-api-version",
        HeaderValue::from_static(PINECONE_API_VERSION),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .context("failed to build Pinecone HTTP client")
}

fn ensure_success(resp: Response, action: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    anyhow::bail!("Pinecone {} failed ({}): {}", action, status, body)
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: ServerlessEnvelope<'a>,
}

#[derive(Serialize)]
struct ServerlessEnvelope<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

impl<'a> From<&'a IndexSpec> for CreateIndexRequest<'a> {
    fn from(spec: &'a IndexSpec) -> Self {
        Self {
            name: &spec.name,
            dimension: spec.dimension,
            metric: &spec.metric,
            spec: ServerlessEnvelope {
                serverless: ServerlessSpec {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        }
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}
