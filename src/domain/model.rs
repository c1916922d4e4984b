use crate::utils::error::{Result, SosError};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 一筆 API 資源：欄位名稱到值的對應，保留欄位順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(field.into(), value)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl TryFrom<Value> for Record {
    type Error = SosError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(SosError::value(format!(
                "Expected a JSON object for a record, got: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Only POST and PUT carry a request body.
    pub fn sends_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = SosError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(SosError::UnsupportedMethod {
                message: format!("Unknown/Unsupported HTTP method: {}", other),
            }),
        }
    }
}

/// Payload kind requested through the `ACCEPT` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptKind {
    #[default]
    Json,
    Xml,
}

impl AcceptKind {
    pub fn header_value(self) -> &'static str {
        match self {
            AcceptKind::Json => "application/json, application/octet-stream",
            AcceptKind::Xml => "application/xml, application/octet-stream",
        }
    }
}

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// 單一 REST 呼叫的描述
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub body: Option<String>,
    pub request_token: Option<String>,
    pub content_type: String,
    pub accept: AcceptKind,
    pub download_to: Option<PathBuf>,
}

impl ServiceRequest {
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            body: None,
            request_token: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            accept: AcceptKind::Json,
            download_to: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, uri)
    }

    pub fn post(uri: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, uri).with_body(body)
    }

    pub fn put(uri: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, uri).with_body(body)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, uri)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_request_token(mut self, token: impl Into<String>) -> Self {
        self.request_token = Some(token.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn accept(mut self, accept: AcceptKind) -> Self {
        self.accept = accept;
        self
    }

    pub fn download_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_to = Some(path.into());
        self
    }

    /// URI as sent on the wire, with the pre-fetched token as `requestToken`.
    pub fn effective_uri(&self) -> String {
        match &self.request_token {
            Some(token) => {
                let separator = if self.uri.contains('?') { '&' } else { '?' };
                format!("{}{}requestToken={}", self.uri, separator, token)
            }
            None => self.uri.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Xml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = SosError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "xml" => Ok(OutputFormat::Xml),
            "json" => Ok(OutputFormat::Json),
            other => Err(SosError::InvalidConfigValue {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Valid formats: table, xml, json".to_string(),
            }),
        }
    }
}
