use crate::core::auth::TokenSource;
use crate::domain::model::{ApiResponse, ServiceRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 連線設定來源 (CLI 參數或 TOML 檔)
pub trait ConnectionProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn scheme(&self) -> &str;
    fn accept_invalid_certs(&self) -> bool;
    fn token_source(&self) -> Result<TokenSource>;
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn service_json_request(&self, request: ServiceRequest) -> Result<ApiResponse>;
}
