//! File checks and list loading for TLS material and IP allow/deny lists.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Errors raised while checking or loading files.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("no file specified")]
    NoFileSpecified,
    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("is a directory and not a file: {}", .0.display())]
    IsDirectory(PathBuf),
    #[error("specified file is empty: {}", .0.display())]
    Empty(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Check that `path` names an existing, non-empty regular file.
pub fn check_file(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(FileError::NoFileSpecified);
    }
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FileError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(FileError::io(path, e)),
    };
    if metadata.is_dir() {
        return Err(FileError::IsDirectory(path.to_path_buf()));
    }
    if metadata.len() == 0 {
        return Err(FileError::Empty(path.to_path_buf()));
    }
    Ok(())
}

/// Decide whether TLS should be enabled.
///
/// Returns `Ok(false)` when either path is empty. When both are set, both
/// files must be accessible.
pub fn check_tls(cert_file: &str, key_file: &str) -> Result<bool, FileError> {
    if cert_file.is_empty() || key_file.is_empty() {
        return Ok(false);
    }
    if let Err(e) = check_file(cert_file) {
        tracing::error!(path = %cert_file, error = %e, "Cert file is not accessible");
        return Err(e);
    }
    if let Err(e) = check_file(key_file) {
        tracing::error!(path = %key_file, error = %e, "Key file is not accessible");
        return Err(e);
    }
    Ok(true)
}

/// Load the allow and deny lists. An empty path yields an empty list.
pub fn load_filtering(
    allow_list_file: &str,
    deny_list_file: &str,
) -> Result<(Vec<String>, Vec<String>), FileError> {
    let allowed = load_list_file(allow_list_file, "allow")?;
    let denied = load_list_file(deny_list_file, "deny")?;
    Ok((allowed, denied))
}

fn load_list_file(list_file: &str, name: &str) -> Result<Vec<String>, FileError> {
    if list_file.is_empty() {
        return Ok(Vec::new());
    }
    if let Err(e) = check_file(list_file) {
        tracing::error!(list = name, path = %list_file, error = %e, "List file is not accessible");
        return Err(e);
    }
    load_file(list_file)
}

/// Load a file as trimmed lines, skipping blanks and `#` comments.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<String>, FileError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(FileError::NoFileSpecified);
    }
    let file = fs::File::open(path).map_err(|e| FileError::io(path, e))?;

    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| FileError::io(path, e))?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}
