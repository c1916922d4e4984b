use crate::core::auth::TokenSource;
use crate::core::markup::MarkupOptions;
use crate::domain::model::OutputFormat;
use crate::domain::ports::ConnectionProvider;
use crate::utils::error::{Result, SosError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub auth: Option<AuthConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub scheme: Option<String>,
    pub accept_invalid_certs: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 指向 token 檔路徑的 session 檔
    pub cookie_file: Option<String>,
    pub token_file: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    pub columns: Option<Vec<String>>,
    pub root_key: Option<String>,
    pub dedup_rows: Option<bool>,
    pub excluded_keys: Option<Vec<String>>,
    pub numeric_prefix: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SosError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SOS_HOST})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SosError::ConfigValidation {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn output(&self) -> OutputConfig {
        self.output.clone().unwrap_or_default()
    }

    /// Exclusion set and numeric prefix for the XML/table conversion.
    pub fn markup_options(&self) -> MarkupOptions {
        let output = self.output();
        let mut options = MarkupOptions::new();
        if let Some(keys) = output.excluded_keys {
            options = keys
                .into_iter()
                .fold(options.without_exclusions(), |opts, key| opts.exclude(key));
        }
        if let Some(prefix) = output.numeric_prefix {
            options = options.with_numeric_prefix(prefix);
        }
        options
    }
}

impl ConnectionProvider for TomlConfig {
    fn host(&self) -> &str {
        &self.server.host
    }

    fn port(&self) -> u16 {
        self.server.port
    }

    fn scheme(&self) -> &str {
        self.server.scheme.as_deref().unwrap_or("https")
    }

    fn accept_invalid_certs(&self) -> bool {
        self.server.accept_invalid_certs.unwrap_or(true)
    }

    fn token_source(&self) -> Result<TokenSource> {
        let auth = self.auth.clone().unwrap_or_default();
        if let Some(token) = auth.token {
            return Ok(TokenSource::Static(token));
        }
        if let Some(token_file) = auth.token_file {
            return Ok(TokenSource::TokenFile(PathBuf::from(token_file)));
        }
        if let Some(cookie_file) = auth.cookie_file {
            return Ok(TokenSource::SessionPointer(PathBuf::from(cookie_file)));
        }
        TokenSource::default_session()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_url(
            "server",
            &format!("{}://{}:{}", self.scheme(), self.server.host, self.server.port),
        )?;

        if let Some(auth) = &self.auth {
            if let Some(path) = &auth.cookie_file {
                validate_path("auth.cookie_file", path)?;
            }
            if let Some(path) = &auth.token_file {
                validate_path("auth.token_file", path)?;
            }
        }

        if let Some(columns) = self.output.as_ref().and_then(|o| o.columns.as_ref()) {
            for column in columns {
                validate_non_empty_string("output.columns", column)?;
            }
        }

        Ok(())
    }
}
