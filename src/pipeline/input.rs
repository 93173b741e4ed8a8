//! Input resolution: classify a source path and work out where its Markdown goes.
//!
//! The checks run cheapest-first (exists → supported extension → readable) so
//! a typo'd path reports "not found" rather than "unsupported". Decoding is
//! strict: documentation sources are expected to be UTF-8 and anything else is
//! a fatal error for that file rather than silently lossy output.

use crate::error::Docs2GfmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions picked up by directory traversal (lower-case, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["html", "htm", "pdf", "docx"];

/// The kinds of source document the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Html,
    Pdf,
    Docx,
}

impl InputKind {
    /// Classify by file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(InputKind::Html),
            "pdf" => Some(InputKind::Pdf),
            "docx" => Some(InputKind::Docx),
            _ => None,
        }
    }

    /// PDF and DOCX go through an extractor before the HTML path.
    pub fn needs_extraction(self) -> bool {
        !matches!(self, InputKind::Html)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::Html => "html",
            InputKind::Pdf => "pdf",
            InputKind::Docx => "docx",
        })
    }
}

/// A validated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub kind: InputKind,
}

/// Validate that `path` is an existing, readable file of a supported kind.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput, Docs2GfmError> {
    if !path.exists() {
        return Err(Docs2GfmError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return Err(Docs2GfmError::InvalidInput {
            path: path.to_path_buf(),
            reason: "expected a file, found a directory".into(),
        });
    }

    let kind = InputKind::from_path(path).ok_or_else(|| Docs2GfmError::UnsupportedInput {
        path: path.to_path_buf(),
    })?;

    match std::fs::File::open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Docs2GfmError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Docs2GfmError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved {} input: {}", kind, path.display());
    Ok(ResolvedInput {
        path: path.to_path_buf(),
        kind,
    })
}

/// Read a file and decode it as strict UTF-8.
pub async fn read_utf8(path: &Path) -> Result<String, Docs2GfmError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Docs2GfmError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Docs2GfmError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    decode_utf8(bytes, &path.display().to_string())
}

/// Decode bytes as strict UTF-8; `origin` names the source in the error.
pub fn decode_utf8(bytes: Vec<u8>, origin: &str) -> Result<String, Docs2GfmError> {
    String::from_utf8(bytes).map_err(|e| Docs2GfmError::InvalidUtf8 {
        origin: origin.to_string(),
        source: e.utf8_error(),
    })
}

/// Work out the output path for a single-file or directory conversion.
///
/// * file input, no output → input with its extension replaced by `.md`
/// * file input, existing directory → `<dir>/<input stem>.md`
/// * file input, anything else → the given path
/// * directory input → the given output, which must not be an existing file
pub fn resolve_output(input: &Path, output: Option<&Path>) -> Result<PathBuf, Docs2GfmError> {
    if input.is_dir() {
        return match output {
            None => Err(Docs2GfmError::InvalidInput {
                path: input.to_path_buf(),
                reason: "directory input requires an output directory".into(),
            }),
            Some(out) if out.is_file() => Err(Docs2GfmError::InvalidInput {
                path: input.to_path_buf(),
                reason: format!(
                    "directory input requires a directory output, '{}' is a file",
                    out.display()
                ),
            }),
            Some(out) => Ok(out.to_path_buf()),
        };
    }

    match output {
        None => Ok(input.with_extension("md")),
        Some(out) if out.is_dir() => Ok(out.join(markdown_file_name(input))),
        Some(out) => Ok(out.to_path_buf()),
    }
}

/// `<stem>.md` for the given source path.
pub fn markdown_file_name(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = PathBuf::from(stem);
    name.set_extension("md");
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(InputKind::from_path(Path::new("a.html")), Some(InputKind::Html));
        assert_eq!(InputKind::from_path(Path::new("a.HTM")), Some(InputKind::Html));
        assert_eq!(InputKind::from_path(Path::new("a.pdf")), Some(InputKind::Pdf));
        assert_eq!(InputKind::from_path(Path::new("dir/a.DOCX")), Some(InputKind::Docx));
        assert_eq!(InputKind::from_path(Path::new("a.txt")), None);
        assert_eq!(InputKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn only_html_skips_extraction() {
        assert!(!InputKind::Html.needs_extraction());
        assert!(InputKind::Pdf.needs_extraction());
        assert!(InputKind::Docx.needs_extraction());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_input(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(err, Docs2GfmError::FileNotFound { .. }));
    }

    #[test]
    fn unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.txt");
        std::fs::write(&p, "x").unwrap();
        let err = resolve_input(&p).unwrap_err();
        assert!(matches!(err, Docs2GfmError::UnsupportedInput { .. }));
    }

    #[test]
    fn directory_is_not_a_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path()).unwrap_err();
        assert!(matches!(err, Docs2GfmError::InvalidInput { .. }));
    }

    #[test]
    fn resolves_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("page.html");
        std::fs::write(&p, "<p>x</p>").unwrap();
        let resolved = resolve_input(&p).unwrap();
        assert_eq!(resolved.kind, InputKind::Html);
        assert_eq!(resolved.path, p);
    }

    #[test]
    fn invalid_utf8_is_fatal() {
        let err = decode_utf8(vec![b'a', 0xff, b'b'], "x.html").unwrap_err();
        assert!(matches!(err, Docs2GfmError::InvalidUtf8 { .. }));
        assert!(err.to_string().contains("x.html"));
    }

    #[tokio::test]
    async fn read_utf8_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("page.html");
        std::fs::write(&p, "héllo").unwrap();
        assert_eq!(read_utf8(&p).await.unwrap(), "héllo");
    }

    #[test]
    fn output_defaults_to_md_sibling() {
        let out = resolve_output(Path::new("docs/setup.html"), None).unwrap();
        assert_eq!(out, PathBuf::from("docs/setup.md"));
    }

    #[test]
    fn output_into_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = resolve_output(Path::new("docs/setup.html"), Some(dir.path())).unwrap();
        assert_eq!(out, dir.path().join("setup.md"));
    }

    #[test]
    fn explicit_output_file_kept() {
        let out = resolve_output(Path::new("a.html"), Some(Path::new("out/b.md"))).unwrap();
        assert_eq!(out, PathBuf::from("out/b.md"));
    }

    #[test]
    fn directory_input_requires_directory_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_output(dir.path(), None).unwrap_err();
        assert!(matches!(err, Docs2GfmError::InvalidInput { .. }));

        let file = dir.path().join("existing.md");
        std::fs::write(&file, "").unwrap();
        let err = resolve_output(dir.path(), Some(&file)).unwrap_err();
        assert!(matches!(err, Docs2GfmError::InvalidInput { .. }));

        let target = dir.path().join("out");
        assert_eq!(resolve_output(dir.path(), Some(&target)).unwrap(), target);
    }
}
