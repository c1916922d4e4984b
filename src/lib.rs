pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use core::{
    auth::TokenSource,
    client::{ClientContext, RestClient},
    engine::{QueryEngine, ViewOptions},
    markup::{MarkupConverter, MarkupDocument, MarkupOptions},
    table::TableGenerator,
};
pub use domain::model::{ApiResponse, HttpMethod, OutputFormat, Record, ServiceRequest};
pub use domain::ports::{ApiTransport, ConnectionProvider};
pub use utils::error::{ErrorCode, Result, SosError};
