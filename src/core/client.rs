use crate::core::auth::TokenSource;
use crate::domain::model::{ApiResponse, HttpMethod, ServiceRequest};
use crate::domain::ports::{ApiTransport, ConnectionProvider};
use crate::utils::error::{Result, SosError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::io::AsyncWriteExt;

pub const SEC_AUTHTOKEN_HEADER: &str = "X-SDS-AUTH-TOKEN";
pub const REST_CLIENT_HEADER: &str = "X-EMC-REST-CLIENT";

/// 每次呼叫所需的連線資訊，取代全域的 cookie 路徑與 token
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub accept_invalid_certs: bool,
    pub token_source: TokenSource,
}

impl ClientContext {
    /// HTTPS without certificate verification; array management endpoints ship
    /// self-signed certificates.
    pub fn new(host: impl Into<String>, port: u16, token_source: TokenSource) -> Self {
        Self {
            scheme: "https".to_string(),
            host: host.into(),
            port,
            accept_invalid_certs: true,
            token_source,
        }
    }

    pub fn from_provider<C: ConnectionProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self {
            scheme: config.scheme().to_string(),
            host: config.host().to_string(),
            port: config.port(),
            accept_invalid_certs: config.accept_invalid_certs(),
            token_source: config.token_source()?,
        })
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

pub struct RestClient {
    context: ClientContext,
    client: Client,
}

impl RestClient {
    pub fn new(context: ClientContext) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(context.accept_invalid_certs)
            .build()?;
        Ok(Self { context, client })
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    async fn execute(&self, request: &ServiceRequest) -> Result<ApiResponse> {
        let uri = request.effective_uri();
        let url = format!("{}{}", self.context.base_url(), uri);
        let token = self.context.token_source.resolve()?;

        tracing::debug!("📡 {} {}{}", request.method, self.context.base_url(), request.uri);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        builder = builder
            .header("Content-Type", request.content_type.as_str())
            .header("ACCEPT", request.accept.header_value())
            .header(REST_CLIENT_HEADER, "TRUE")
            .header(SEC_AUTHTOKEN_HEADER, token);

        if request.method.sends_body() {
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }
        }

        let mut response = builder.send().await?;
        let status = response.status();
        tracing::debug!("📡 Response status: {}", status);

        if !is_accepted(status) {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("⚠️ Could not read error body for {}: {}", status, e);
                    String::new()
                }
            };
            return Err(http_error(status, request.method, &request.uri, &body));
        }

        let headers = response.headers().clone();

        if let (HttpMethod::Get, Some(path)) = (request.method, &request.download_to) {
            let written = stream_to_file(&mut response, path).await?;
            tracing::info!("💾 Downloaded {} bytes to {}", written, path.display());
            return Ok(ApiResponse {
                status: status.as_u16(),
                body: String::new(),
                headers,
            });
        }

        let body = response.text().await?;
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
            headers,
        })
    }
}

#[async_trait]
impl ApiTransport for RestClient {
    async fn service_json_request(&self, request: ServiceRequest) -> Result<ApiResponse> {
        self.execute(&request).await
    }
}

/// Only 200 and 202 count as success.
fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::ACCEPTED
}

/// I/O failures while saving the body report as HTTP-class errors.
async fn stream_to_file(response: &mut reqwest::Response, path: &Path) -> Result<u64> {
    let file_error = |e: std::io::Error| SosError::request(format!("{} : {}", path.display(), e));

    let mut file = tokio::fs::File::create(path).await.map_err(file_error)?;

    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(file_error)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(file_error)?;
    Ok(written)
}

/// Human readable message for a rejected status; unknown codes echo the body.
pub fn http_error_message(status: u16, method: HttpMethod, uri: &str, body: &str) -> String {
    match status {
        500 => "StorageOS internal server error".to_string(),
        401 => "Access forbidden: Authentication required".to_string(),
        403 => "Access forbidden: You don't have sufficient privileges to perform this operation"
            .to_string(),
        404 => "Requested resource not found".to_string(),
        405 => format!("{} method is not supported by resource: {}", method, uri),
        503 => "Service temporarily unavailable: The server is temporarily unable to service your request"
            .to_string(),
        _ => body.to_string(),
    }
}

pub fn http_error(status: StatusCode, method: HttpMethod, uri: &str, body: &str) -> SosError {
    SosError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
        message: http_error_message(status.as_u16(), method, uri, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_status_messages() {
        assert_eq!(
            http_error_message(404, HttpMethod::Get, "/x", "ignored"),
            "Requested resource not found"
        );
        assert_eq!(
            http_error_message(404, HttpMethod::Delete, "/x", ""),
            "Requested resource not found"
        );
        assert_eq!(
            http_error_message(401, HttpMethod::Post, "/x", ""),
            "Access forbidden: Authentication required"
        );
        assert_eq!(
            http_error_message(405, HttpMethod::Put, "/block/volumes", ""),
            "PUT method is not supported by resource: /block/volumes"
        );
        assert!(http_error_message(503, HttpMethod::Get, "/", "").starts_with("Service temporarily"));
    }

    #[test]
    fn test_unknown_status_echoes_body() {
        let err = http_error(StatusCode::CONFLICT, HttpMethod::Post, "/x", "already exists");
        assert_eq!(
            err.to_string(),
            "HTTP code: 409, Response: Conflict [already exists]"
        );
        assert_eq!(err.code(), 3);
    }

    #[test]
    fn test_accepted_statuses() {
        assert!(is_accepted(StatusCode::OK));
        assert!(is_accepted(StatusCode::ACCEPTED));
        assert!(!is_accepted(StatusCode::CREATED));
        assert!(!is_accepted(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_context_base_url() {
        let context = ClientContext::new("array01", 4443, TokenSource::Static("t".to_string()));
        assert_eq!(context.base_url(), "https://array01:4443");
        assert_eq!(
            context.with_scheme("http").base_url(),
            "http://array01:4443"
        );
    }
}
