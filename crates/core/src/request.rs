//! Upload request assembly
//!
//! Validation happens here, synchronously, before anything touches the
//! network. Each file is opened once to prove it is readable and closed right
//! away; the transport reopens it when it streams the body.

use crate::error::{Error, Result};
use http::HeaderMap;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::time::Duration;
use tracing::debug;

/// Form field holding the destination folder
pub const FOLDER_FIELD: &str = "folder";

/// Fallback MIME type
pub const OCTET_STREAM: &str = "application/octet-stream";

/// One file part of the multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Normalized local path
    pub local_path: PathBuf,
    /// MIME type sent with the part
    pub mime_type: String,
    /// Base file name sent with the part
    pub file_name: String,
}

impl FileEntry {
    /// Build an entry for an already validated path
    pub fn from_path(path: PathBuf) -> Self {
        let mime_type = mime_guess::from_path(&path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            local_path: path,
            mime_type,
            file_name,
        }
    }
}

/// A fully assembled, authenticated upload, ready for a [`Transport`](crate::Transport)
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub folder: String,
    pub files: Vec<FileEntry>,
    pub timeout: Duration,
}

impl UploadRequest {
    /// Multipart field name of the `index`-th file
    pub fn file_field(index: usize) -> String {
        format!("files[{}]", index)
    }

    /// `(field name, entry)` pairs in upload order
    pub fn file_parts(&self) -> impl Iterator<Item = (String, &FileEntry)> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, entry)| (Self::file_field(i), entry))
    }
}

/// Validate every path, in order, and turn them into file entries.
///
/// The first malformed, missing or unreadable path aborts with
/// [`Error::InvalidInput`].
pub fn validate_paths<I, P>(paths: I) -> Result<Vec<FileEntry>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut entries = Vec::new();

    for (index, path) in paths.into_iter().enumerate() {
        let original = path.as_ref();

        if is_malformed(original) {
            return Err(Error::InvalidInput(format!(
                "File path at index {} is malformed",
                index
            )));
        }

        let normalized = normalize_path(original);
        if !normalized.is_file() {
            return Err(Error::InvalidInput(format!(
                "File not found: {}",
                original.display()
            )));
        }

        // Dropped immediately; only the open matters
        if let Err(e) = fs::File::open(&normalized) {
            return Err(Error::InvalidInput(format!(
                "File not readable: {} ({})",
                original.display(),
                e
            )));
        }

        let entry = FileEntry::from_path(normalized);
        debug!(index, path = %entry.local_path.display(), mime = %entry.mime_type, "validated upload file");
        entries.push(entry);
    }

    Ok(entries)
}

fn is_malformed(path: &Path) -> bool {
    let raw = path.as_os_str();
    raw.is_empty() || raw.to_string_lossy().contains('\0')
}

/// Rewrite `\` separators to the platform separator.
///
/// Non utf-8 paths are returned unchanged.
pub fn normalize_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if s.contains('\\') => PathBuf::from(s.replace('\\', &MAIN_SEPARATOR.to_string())),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_from_path() {
        let entry = FileEntry::from_path(PathBuf::from("/tmp/dir/report.pdf"));
        assert_eq!(entry.file_name, "report.pdf");
        assert_eq!(entry.mime_type, "application/pdf");

        let entry = FileEntry::from_path(PathBuf::from("/tmp/dir/blob.unknownext"));
        assert_eq!(entry.file_name, "blob.unknownext");
        assert_eq!(entry.mime_type, OCTET_STREAM);

        let entry = FileEntry::from_path(PathBuf::from("noext"));
        assert_eq!(entry.mime_type, OCTET_STREAM);
    }

    #[test]
    fn test_validate_paths_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.png");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let entries = validate_paths([&b, &a]).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "b.png");
        assert_eq!(entries[0].mime_type, "image/png");
        assert_eq!(entries[1].file_name, "a.txt");
        assert_eq!(entries[1].mime_type, "text/plain");
    }

    #[test]
    fn test_validate_paths_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, "x").unwrap();
        let missing = dir.path().join("missing.txt");

        let err = validate_paths([&good, &missing]).unwrap_err();
        match err {
            Error::InvalidInput(msg) => {
                assert!(msg.starts_with("File not found: "));
                assert!(msg.contains("missing.txt"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_paths_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_paths([dir.path()]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_validate_paths_malformed() {
        let err = validate_paths([""]).unwrap_err();
        match err {
            Error::InvalidInput(msg) => assert_eq!(msg, "File path at index 0 is malformed"),
            other => panic!("unexpected error: {:?}", other),
        }

        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, "x").unwrap();
        let good = good.to_string_lossy().into_owned();

        let err = validate_paths([good.as_str(), "bad\0path"]).unwrap_err();
        match err {
            Error::InvalidInput(msg) => assert_eq!(msg, "File path at index 1 is malformed"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_paths_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked.txt");
        fs::write(&locked, "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can open anything; nothing to check then
        if fs::File::open(&locked).is_ok() {
            return;
        }

        match validate_paths([&locked]).unwrap_err() {
            Error::InvalidInput(msg) => {
                assert!(msg.starts_with("File not readable: "));
                assert!(msg.contains("locked.txt"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_validate_paths_write_only_proc_file() {
        // Write-only for everyone, root included
        let path = Path::new("/proc/sys/vm/drop_caches");
        if !path.is_file() {
            return;
        }

        let err = validate_paths([path]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.starts_with("File not readable: ")));
    }

    #[test]
    fn test_validate_paths_empty_list() {
        let paths: Vec<PathBuf> = Vec::new();
        assert!(validate_paths(paths).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize_path(Path::new(r"dir\sub\file.txt")), PathBuf::from("dir/sub/file.txt"));
        assert_eq!(normalize_path(Path::new("dir/file.txt")), PathBuf::from("dir/file.txt"));

        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("f.txt"), "x").unwrap();
        let windowsy = format!("{}\\sub\\f.txt", dir.path().display());

        let entries = validate_paths([windowsy.as_str()]).unwrap();
        assert_eq!(entries[0].file_name, "f.txt");
        assert_eq!(entries[0].local_path, dir.path().join("sub").join("f.txt"));
    }

    #[test]
    fn test_file_fields() {
        let request = UploadRequest {
            url: "https://api.example.com/api/v1/public/upload".to_string(),
            headers: HeaderMap::new(),
            folder: "ghost/up".to_string(),
            files: vec![
                FileEntry::from_path(PathBuf::from("/x/one.txt")),
                FileEntry::from_path(PathBuf::from("/x/two.txt")),
            ],
            timeout: Duration::from_secs(1),
        };

        let parts: Vec<(String, String)> = request
            .file_parts()
            .map(|(field, entry)| (field, entry.file_name.clone()))
            .collect();

        assert_eq!(
            parts,
            vec![
                ("files[0]".to_string(), "one.txt".to_string()),
                ("files[1]".to_string(), "two.txt".to_string()),
            ]
        );
    }
}
