use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("no folder path was provided by the host")]
    MissingPath,

    #[error("{} is not a folder", .0.display())]
    NotAFolder(PathBuf),

    #[error("failed to read folder {}: {source}", .path.display())]
    ReadFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[cfg(windows)]
    #[error("windows call failed: {0}")]
    Windows(#[from] windows::core::Error),
}

#[cfg(windows)]
impl From<PreviewError> for windows::core::Error {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::Windows(inner) => inner,
            other => windows::core::Error::new(
                windows::Win32::Foundation::E_FAIL,
                other.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn read_folder_keeps_source() {
        let err = PreviewError::ReadFolder {
            path: PathBuf::from("C:/nowhere"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("failed to read folder C:/nowhere"));
        assert!(err.source().is_some());
    }

    #[test]
    fn not_a_folder_names_the_path() {
        let err = PreviewError::NotAFolder(PathBuf::from("notes.txt"));
        assert_eq!(err.to_string(), "notes.txt is not a folder");
    }
}
