use crate::config::toml_config::TomlConfig;
use crate::core::auth::TokenSource;
use crate::core::client::ClientContext;
use crate::core::engine::ViewOptions;
use crate::domain::model::{AcceptKind, HttpMethod, OutputFormat, ServiceRequest};
use crate::domain::ports::ConnectionProvider;
use crate::utils::error::{Result, SosError};
use crate::utils::validation::{validate_non_empty_string, validate_port_number, validate_url, Validate};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 4443;
const DEFAULT_SCHEME: &str = "https";

fn parse_port(value: &str) -> std::result::Result<u16, String> {
    validate_port_number("port", value).map_err(|e| e.to_string())
}

#[derive(Clone, Parser)]
#[command(name = "sos-utils")]
#[command(about = "Query a storage array management REST API and render the result")]
pub struct CliConfig {
    #[arg(long, help = "TOML file with [server], [auth] and [output] sections")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Management host name or IP address")]
    pub host: Option<String>,

    #[arg(long, value_parser = parse_port, help = "Management port [default: 4443]")]
    pub port: Option<u16>,

    #[arg(long, help = "http or https [default: https]")]
    pub scheme: Option<String>,

    #[arg(long, help = "Verify the server TLS certificate")]
    pub verify_tls: bool,

    #[arg(long, help = "Session file whose first line names the token file")]
    pub cookie_file: Option<PathBuf>,

    #[arg(long, help = "File holding the auth token")]
    pub token_file: Option<PathBuf>,

    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    #[arg(long)]
    pub uri: String,

    #[arg(long)]
    pub body: Option<String>,

    #[arg(long, default_value = "application/json")]
    pub content_type: String,

    #[arg(long, help = "Ask for XML instead of JSON")]
    pub accept_xml: bool,

    #[arg(long, help = "Pre-fetched token, sent as the requestToken query parameter")]
    pub request_token: Option<String>,

    #[arg(long, help = "Stream a GET response into this file")]
    pub download: Option<PathBuf>,

    #[arg(long, help = "table, xml or json")]
    pub format: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long, help = "Field holding the record list in the response")]
    pub root_key: Option<String>,

    #[arg(long, help = "Print identical rows once")]
    pub dedup: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn service_request(&self) -> Result<ServiceRequest> {
        let method: HttpMethod = self.method.parse()?;
        let mut request = ServiceRequest::new(method, self.uri.clone())
            .with_content_type(self.content_type.clone());

        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }
        if let Some(token) = &self.request_token {
            request = request.with_request_token(token.clone());
        }
        if self.accept_xml {
            request = request.accept(AcceptKind::Xml);
        }
        if let Some(path) = &self.download {
            request = request.download_to(path.clone());
        }
        Ok(request)
    }

    /// Connection settings, field by field: command line flag, then the config
    /// file, then the built-in default.
    pub fn client_context(&self, file: Option<&TomlConfig>) -> Result<ClientContext> {
        let Some(file) = file else {
            return ClientContext::from_provider(self);
        };

        let token_source = match self.explicit_token_source() {
            Some(source) => source,
            None => file.token_source()?,
        };

        Ok(ClientContext {
            scheme: self
                .scheme
                .clone()
                .unwrap_or_else(|| file.scheme().to_string()),
            host: self.host.clone().unwrap_or_else(|| file.host().to_string()),
            port: self.port.unwrap_or_else(|| file.port()),
            accept_invalid_certs: !self.verify_tls && file.accept_invalid_certs(),
            token_source,
        })
    }

    fn explicit_token_source(&self) -> Option<TokenSource> {
        self.token_file
            .clone()
            .map(TokenSource::TokenFile)
            .or_else(|| self.cookie_file.clone().map(TokenSource::SessionPointer))
    }

    /// Command line flags win over the `[output]` section of the config file.
    pub fn view_options(&self, file: Option<&TomlConfig>) -> Result<ViewOptions> {
        let output = file.map(TomlConfig::output).unwrap_or_default();

        let format = match &self.format {
            Some(format) => format.parse()?,
            None => output.format.unwrap_or(OutputFormat::Table),
        };
        let columns = if self.columns.is_empty() {
            output.columns.unwrap_or_default()
        } else {
            self.columns.clone()
        };

        Ok(ViewOptions {
            format,
            columns,
            root_key: self.root_key.clone().or(output.root_key),
            dedup_rows: self.dedup || output.dedup_rows.unwrap_or(false),
            markup: file.map(TomlConfig::markup_options).unwrap_or_default(),
        })
    }
}

impl ConnectionProvider for CliConfig {
    fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("")
    }

    fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    fn scheme(&self) -> &str {
        self.scheme.as_deref().unwrap_or(DEFAULT_SCHEME)
    }

    fn accept_invalid_certs(&self) -> bool {
        !self.verify_tls
    }

    fn token_source(&self) -> Result<TokenSource> {
        match self.explicit_token_source() {
            Some(source) => Ok(source),
            None => TokenSource::default_session(),
        }
    }
}

/// Request tokens and bodies may carry credentials and stay out of logs.
impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("CliConfig")
            .field("config", &self.config)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("verify_tls", &self.verify_tls)
            .field("cookie_file", &self.cookie_file)
            .field("token_file", &self.token_file)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("body", &redacted(&self.body))
            .field("content_type", &self.content_type)
            .field("accept_xml", &self.accept_xml)
            .field("request_token", &redacted(&self.request_token))
            .field("download", &self.download)
            .field("format", &self.format)
            .field("columns", &self.columns)
            .field("root_key", &self.root_key)
            .field("dedup", &self.dedup)
            .field("verbose", &self.verbose)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("uri", &self.uri)?;
        self.method.parse::<HttpMethod>()?;
        if let Some(format) = &self.format {
            format.parse::<OutputFormat>()?;
        }

        if self.config.is_none() {
            let host = self.host.as_deref().ok_or_else(|| {
                SosError::command_line("--host is required when no --config file is given")
            })?;
            validate_non_empty_string("host", host)?;
            validate_url(
                "host",
                &format!("{}://{}:{}", self.scheme(), host, self.port()),
            )?;
        }

        if self.download.is_some() && self.method != "GET" {
            return Err(SosError::command_line("--download only applies to GET requests"));
        }
        Ok(())
    }
}
