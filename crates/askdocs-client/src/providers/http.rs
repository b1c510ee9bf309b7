//! HTTP implementation of the backend contracts

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::BackendConfig;
use crate::error::{Error, Operation, Result};
use crate::types::{
    IndexSummary, QueryRequest, QueryResponse, UploadPayload, UploadResponse, UploadTask,
};

use super::backend::RagBackend;

/// Client for the AskDocs HTTP API
///
/// No timeout and no retries are configured: every request runs on the
/// transport defaults and fails once.
pub struct HttpBackend {
    /// HTTP client
    client: Client,
    /// Endpoint configuration
    config: BackendConfig,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct HealthBody {
    #[serde(default)]
    status: Option<String>,
}

impl HttpBackend {
    /// Create a new backend client
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn file_part(filename: &str, bytes: &[u8], mime: &str) -> Result<Part> {
        Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| Error::request(Operation::Upload, e))
    }

    fn upload_form(task: &UploadTask) -> Result<Form> {
        let mut form = match &task.payload {
            UploadPayload::File { filename, bytes } => {
                let mime = mime_guess::from_path(filename).first_or_octet_stream();
                Form::new().part("file", Self::file_part(filename, bytes, mime.essence_str())?)
            }
            UploadPayload::Text(text) => Form::new().text("text", text.clone()),
        };

        form = form.text("title", task.title.clone());
        if let Some(namespace) = &task.namespace {
            form = form.text("namespace", namespace.to_string());
        }
        Ok(form)
    }

    /// Read a JSON body, turning non-2xx responses into backend errors
    async fn read_json<T: DeserializeOwned>(
        response: Response,
        operation: Operation,
        fallback: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(operation, e))?;

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| fallback.to_string());
            tracing::warn!("{} rejected with HTTP {}: {}", operation, status, detail);
            return Err(Error::backend(operation, status.as_u16(), detail));
        }

        serde_json::from_str(&body).map_err(|e| Error::decode(operation, e))
    }
}

/// Extract the `detail` message of an error body
///
/// Non-string details (validation error lists) are rendered as JSON.
pub fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl RagBackend for HttpBackend {
    async fn upload(&self, task: &UploadTask) -> Result<UploadResponse> {
        let url = self.config.endpoint(&self.config.upload_path);
        let form = Self::upload_form(task)?;

        tracing::debug!(
            "POST {} title={} namespace={:?} ({} bytes)",
            url,
            task.title,
            task.namespace.as_ref().map(|ns| ns.as_str()),
            task.size_bytes()
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::network(Operation::Upload, e))?;

        let fallback = format!("Upload failed for {}", task.title);
        Self::read_json(response, Operation::Upload, &fallback).await
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let url = self.config.endpoint(&self.config.query_path);
        tracing::debug!("POST {} namespace={:?}", url, request.namespace);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::network(Operation::Query, e))?;

        Self::read_json(response, Operation::Query, "Query failed").await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.config.endpoint(&self.config.health_path);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Health check against {} failed: {}", url, e);
                return Ok(false);
            }
        };

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: HealthBody = response
            .json()
            .await
            .map_err(|e| Error::decode(Operation::Health, e))?;
        Ok(body.status.map_or(true, |status| status == "healthy"))
    }

    async fn list_documents(&self) -> Result<IndexSummary> {
        let url = self.config.endpoint(&self.config.documents_path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::network(Operation::ListDocuments, e))?;

        Self::read_json(response, Operation::ListDocuments, "Document listing failed").await
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Answer a single request with a canned response; returns the base URL
    async fn serve_once(status: &'static str, content_type: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    /// Drain one request so the client never sees a reset while sending
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let received = buf.len() - (end + 4);
            let complete = match head.lines().find_map(|l| l.strip_prefix("content-length:")) {
                Some(len) => received >= len.trim().parse::<usize>().unwrap_or(0),
                None if head.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
                None => true,
            };
            if complete {
                return;
            }
        }
    }

    fn backend_at(base_url: String) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url,
            ..BackendConfig::default()
        })
        .unwrap()
    }

    fn question() -> QueryRequest {
        QueryRequest {
            query: "What is it?".to_string(),
            namespace: None,
        }
    }

    #[test]
    fn test_error_detail_string() {
        assert_eq!(
            error_detail(r#"{"detail": "File too large. Max size: 5MB"}"#),
            Some("File too large. Max size: 5MB".to_string())
        );
    }

    #[test]
    fn test_error_detail_absent_or_unparseable() {
        assert_eq!(error_detail(r#"{"error": "boom"}"#), None);
        assert_eq!(error_detail(r#"{"detail": ""}"#), None);
        assert_eq!(error_detail(r#"{"detail": null}"#), None);
        assert_eq!(error_detail("<html>502 Bad Gateway</html>"), None);
        assert_eq!(error_detail(""), None);
    }

    #[test]
    fn test_error_detail_structured() {
        let detail = error_detail(r#"{"detail": [{"loc": ["body", "query"], "msg": "field required"}]}"#)
            .unwrap();
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let backend = HttpBackend::new(&BackendConfig::default()).unwrap();
        assert_eq!(backend.name(), "http");
    }

    #[test]
    fn test_upload_form_builds_for_both_payloads() {
        let file = UploadTask::file("notes.md", b"# Notes".to_vec(), None)
            .with_namespace(crate::Namespace::new("doc_1"));
        assert!(HttpBackend::upload_form(&file).is_ok());

        let text = UploadTask::text("pasted words", None, "Direct Input").unwrap();
        assert!(HttpBackend::upload_form(&text).is_ok());
    }

    #[test]
    fn test_bad_mime_is_request_error() {
        let err = HttpBackend::file_part("a.txt", b"x", "not a mime").unwrap_err();
        assert!(matches!(err, Error::Request { operation: Operation::Upload, .. }));
    }

    #[tokio::test]
    async fn test_error_detail_is_returned_verbatim() {
        let url = serve_once(
            "400 Bad Request",
            "application/json",
            r#"{"detail": "Query must not be empty"}"#,
        )
        .await;

        let err = backend_at(url).query(&question()).await.unwrap_err();
        match err {
            Error::Backend { operation, status, detail } => {
                assert_eq!(operation, Operation::Query);
                assert_eq!(status, 400);
                assert_eq!(detail, "Query must not be empty");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_without_detail_uses_fallback() {
        let url = serve_once("502 Bad Gateway", "text/html", "<html>502 Bad Gateway</html>").await;

        let err = backend_at(url).query(&question()).await.unwrap_err();
        assert!(matches!(err, Error::Backend { status: 502, .. }));
        assert_eq!(err.user_message(), "Query failed");
    }

    #[tokio::test]
    async fn test_upload_without_detail_names_title() {
        let url = serve_once("500 Internal Server Error", "text/html", "<h1>oops</h1>").await;
        let task = UploadTask::file("notes.md", b"# Notes".to_vec(), None);

        let err = backend_at(url).upload(&task).await.unwrap_err();
        assert!(matches!(err, Error::Backend { operation: Operation::Upload, status: 500, .. }));
        assert_eq!(err.to_string(), "Upload failed for notes.md");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let url = serve_once("200 OK", "application/json", r#"{"citations": []}"#).await;

        let err = backend_at(url).query(&question()).await.unwrap_err();
        assert!(matches!(err, Error::Decode { operation: Operation::Query, .. }));
    }

    #[tokio::test]
    async fn test_upload_success_keeps_message() {
        let url = serve_once(
            "200 OK",
            "application/json",
            r#"{"success": true, "message": "Indexed notes.md",
                "stats": {"chunks_created": 3, "namespace": "doc_http"}}"#,
        )
        .await;
        let task = UploadTask::text("pasted words", Some("Notes"), "Direct Input").unwrap();

        let response = backend_at(url).upload(&task).await.unwrap();
        assert_eq!(response.message.as_deref(), Some("Indexed notes.md"));
        assert_eq!(response.stats.chunks_created, 3);
        assert_eq!(response.stats.namespace(), crate::Namespace::new("doc_http"));
    }

    #[tokio::test]
    async fn test_list_documents_parses_summary() {
        let url = serve_once(
            "200 OK",
            "application/json",
            r#"{"total_vectors": 17, "namespaces": ["doc_a"]}"#,
        )
        .await;

        let summary = backend_at(url).list_documents().await.unwrap();
        assert_eq!(summary.total_vectors, 17);
        assert_eq!(summary.namespaces, vec!["doc_a".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();

        let err = backend
            .query(&QueryRequest {
                query: "hello".to_string(),
                namespace: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network { operation: Operation::Query, .. }));
        assert!(!backend.health_check().await.unwrap());
    }
}
