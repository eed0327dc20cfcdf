use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DbErr;
use serde_json::Value;
use tempfile::TempDir;

use ::common::storage::filesystem::FilesystemObjectStore;
use ::common::storage::{ObjectStore, StorageError};
use ::common::{RetryConfig, StorageAppConfig};
use server::config::{AppConfig, CorsConfig, DatabaseConfig, IngestConfig, ServerConfig};
use server::ingest::IngestPipeline;
use server::ingest::category::CategorySchema;
use server::ingest::model::{ComponentRecord, EvidenceRecord, NewComponent, NewEvidence};
use server::repository::ComponentStore;
use server::state::AppState;

pub mod routes {
    pub const COMPONENTS: &str = "/api/v1/components";
    pub const ADD_COMPONENT: &str = "/add-component";
    pub const HEALTH: &str = "/health";
}

pub const PUBLIC_URL: &str = "http://objects.test";

/// In-memory relational store with switchable failures.
#[derive(Default)]
pub struct MemoryRecords {
    pub components: Mutex<Vec<ComponentRecord>>,
    pub evidence: Mutex<Vec<EvidenceRecord>>,
    pub fail_component: bool,
    pub fail_evidence: bool,
    pub fail_ping: bool,
}

#[async_trait]
impl ComponentStore for MemoryRecords {
    async fn lookup_period_name(&self, period_id: i32) -> Result<Option<String>, DbErr> {
        Ok(match period_id {
            2025 => Some("FY25".to_string()),
            2026 => Some("FY26".to_string()),
            _ => None,
        })
    }

    async fn insert_component(&self, new: NewComponent) -> Result<ComponentRecord, DbErr> {
        if self.fail_component {
            return Err(DbErr::Custom("component table unavailable".into()));
        }
        let mut components = self.components.lock().unwrap();
        let record = ComponentRecord::from_new(components.len() as i32 + 1, new);
        components.push(record.clone());
        Ok(record)
    }

    async fn insert_evidence_batch(
        &self,
        rows: Vec<NewEvidence>,
    ) -> Result<Vec<EvidenceRecord>, DbErr> {
        if self.fail_evidence {
            return Err(DbErr::Custom("evidence table unavailable".into()));
        }
        let mut evidence = self.evidence.lock().unwrap();
        let mut created = Vec::new();
        for row in rows {
            let record = EvidenceRecord {
                id: evidence.len() as i32 + 1,
                component_id: row.component_id,
                evidence_file_name: row.evidence_file_name,
                evidence_file_url: row.evidence_file_url,
                category: row.category.label().to_string(),
                created_by: row.created_by,
                created_date: row.created_date,
            };
            evidence.push(record.clone());
            created.push(record);
        }
        Ok(created)
    }

    async fn ping(&self) -> Result<(), DbErr> {
        if self.fail_ping {
            return Err(DbErr::Custom("connection refused".into()));
        }
        Ok(())
    }
}

/// Filesystem store that rejects writes whose path contains a marker.
pub struct FaultyStore {
    inner: FilesystemObjectStore,
    fail_on: Vec<String>,
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_object(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail_on.iter().any(|m| path.contains(m.as_str())) {
            return Err(StorageError::Status {
                path: path.to_string(),
                status: 503,
            });
        }
        self.inner.put_object(path, data, content_type).await
    }

    fn object_url(&self, path: &str) -> String {
        self.inner.object_url(path)
    }
}

/// Knobs for [`TestApp::spawn_with`].
#[derive(Default)]
pub struct TestOptions {
    pub records: MemoryRecords,
    /// Object paths containing any of these markers fail to upload.
    pub fail_uploads_on: Vec<String>,
    pub ingest: Option<IngestConfig>,
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub records: Arc<MemoryRecords>,
    objects_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let objects_dir = tempfile::tempdir().expect("Failed to create object store dir");
        let inner = FilesystemObjectStore::new(objects_dir.path().to_path_buf(), PUBLIC_URL)
            .await
            .expect("Failed to create filesystem object store");
        let objects = Arc::new(FaultyStore {
            inner,
            fail_on: options.fail_uploads_on,
        });
        let records = Arc::new(options.records);

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig::default(),
                body_limit_bytes: 10 * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
            },
            storage: StorageAppConfig {
                retry: RetryConfig::default(),
                ..Default::default()
            },
            ingest: options.ingest.unwrap_or_default(),
        };

        let schema = CategorySchema::standard(&app_config.ingest.file_field_suffix)
            .expect("Standard schema must be valid");
        let pipeline = IngestPipeline::new(
            Arc::new(schema),
            objects,
            records.clone(),
            app_config.ingest.upload_concurrency,
        );
        let state = AppState {
            config: app_config,
            pipeline: Arc::new(pipeline),
            records: records.clone(),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            records,
            objects_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn objects_root(&self) -> &Path {
        self.objects_dir.path()
    }

    /// Local path of a stored object.
    pub fn object_file(&self, object_path: &str) -> PathBuf {
        self.objects_root().join(object_path)
    }

    pub async fn post_form(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub fn component_count(&self) -> usize {
        self.records.components.lock().unwrap().len()
    }

    pub fn evidence_count(&self) -> usize {
        self.records.evidence.lock().unwrap().len()
    }

    /// Object paths currently stored, relative to the root, sorted.
    pub fn stored_objects(&self) -> Vec<String> {
        let mut found = Vec::new();
        collect_files(self.objects_root(), self.objects_root(), &mut found);
        found.sort();
        found
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == ".tmp") {
                continue;
            }
            collect_files(root, &path, out);
        } else {
            let relative = path.strip_prefix(root).unwrap();
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

/// The required attributes of the worked example.
pub fn base_form() -> Form {
    Form::new()
        .text("cm_code", "CM1")
        .text("year", "2025")
        .text("sku_code", "SKU1")
        .text("component_code", "COMP1")
}

pub fn file_part(name: &str, bytes: Vec<u8>, mime: &str) -> Part {
    Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str(mime)
        .expect("Failed to set MIME type")
}

pub fn pdf(name: &str) -> Part {
    file_part(name, format!("%PDF-1.7 {name}").into_bytes(), "application/pdf")
}
