use crate::utils::error::{Result, SosError};
use std::fs;
use std::path::{Path, PathBuf};

const COOKIE_DIR: &str = "cookie";

/// Where the `X-SDS-AUTH-TOKEN` value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// A file whose first line is the path of the token file.
    SessionPointer(PathBuf),
    /// The token file itself.
    TokenFile(PathBuf),
    Static(String),
}

impl TokenSource {
    /// `<cwd>/cookie/<parent pid>`, the pointer written by the login command of the
    /// shell session that invoked us.
    pub fn default_session() -> Result<Self> {
        let install_dir = std::env::current_dir()?;
        Ok(TokenSource::SessionPointer(session_pointer_path(&install_dir)))
    }

    pub fn resolve(&self) -> Result<String> {
        match self {
            TokenSource::SessionPointer(pointer) => {
                let token_file = read_pointer(pointer)?;
                read_token_file(&token_file)
            }
            TokenSource::TokenFile(path) => read_token_file(path),
            TokenSource::Static(token) => Ok(token.clone()),
        }
    }
}

pub fn session_pointer_path(install_dir: &Path) -> PathBuf {
    install_dir.join(COOKIE_DIR).join(session_file_name())
}

#[cfg(unix)]
fn session_file_name() -> String {
    std::os::unix::process::parent_id().to_string()
}

#[cfg(not(unix))]
fn session_file_name() -> String {
    "cookiefile".to_string()
}

fn cookie_not_found(path: &Path) -> SosError {
    SosError::not_found(format!(
        "{} : Cookie not found : Please authenticate again",
        path.display()
    ))
}

fn read_pointer(pointer: &Path) -> Result<PathBuf> {
    if !pointer.exists() {
        return Err(cookie_not_found(pointer));
    }

    let content = fs::read_to_string(pointer)
        .map_err(|e| SosError::not_found(format!("{} : read failure: {}", pointer.display(), e)))?;
    let first_line = content.lines().next().unwrap_or("").trim_end();
    if first_line.is_empty() {
        return Err(SosError::not_found(format!(
            "{} : Failed to retrieve the cookie file",
            pointer.display()
        )));
    }

    tracing::debug!("Session pointer {} -> {}", pointer.display(), first_line);
    Ok(PathBuf::from(first_line))
}

fn read_token_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(cookie_not_found(path));
    }
    if !path.is_file() {
        return Err(SosError::not_found(format!(
            "{} : Not a cookie file",
            path.display()
        )));
    }

    let token = fs::read_to_string(path)
        .map_err(|e| SosError::not_found(format!("{} : read failure: {}", path.display(), e)))?;
    Ok(token.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_pointer_resolves_to_token() {
        let mut token_file = NamedTempFile::new().unwrap();
        writeln!(token_file, "secret-token").unwrap();

        let mut pointer = NamedTempFile::new().unwrap();
        writeln!(pointer, "{}", token_file.path().display()).unwrap();

        let source = TokenSource::SessionPointer(pointer.path().to_path_buf());
        assert_eq!(source.resolve().unwrap(), "secret-token");
    }

    #[test]
    fn test_missing_pointer_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("cookie").join("12345");
        let err = TokenSource::SessionPointer(missing).resolve().unwrap_err();
        assert!(matches!(err, SosError::NotFound { .. }));
        assert!(err.to_string().contains("Cookie not found : Please authenticate again"));
    }

    #[test]
    fn test_empty_pointer_is_not_found() {
        let pointer = NamedTempFile::new().unwrap();
        let err = TokenSource::SessionPointer(pointer.path().to_path_buf())
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("Failed to retrieve the cookie file"));
    }

    #[test]
    fn test_pointer_to_missing_token_file() {
        let dir = TempDir::new().unwrap();
        let mut pointer = NamedTempFile::new().unwrap();
        writeln!(pointer, "{}", dir.path().join("gone").display()).unwrap();

        let err = TokenSource::SessionPointer(pointer.path().to_path_buf())
            .resolve()
            .unwrap_err();
        assert_eq!(err.code(), 1);
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_token_file_must_be_regular_file() {
        let dir = TempDir::new().unwrap();
        let err = TokenSource::TokenFile(dir.path().to_path_buf())
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("Not a cookie file"));
    }

    #[test]
    fn test_session_pointer_path_layout() {
        let path = session_pointer_path(Path::new("/opt/sos"));
        assert!(path.starts_with("/opt/sos/cookie"));
        assert!(path.file_name().is_some());
    }

    #[test]
    fn test_static_token() {
        let source = TokenSource::Static("abc".to_string());
        assert_eq!(source.resolve().unwrap(), "abc");
    }
}
