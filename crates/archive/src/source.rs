use std::path::PathBuf;

/// Default document name looked up when none is specified.
pub const TILESET_HINT: &str = "tileset.json";

/// Errors from reading a document out of a tile source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("document not found: {path}")]
    NotFound { path: String },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read access to the documents of one archive.
///
/// Paths are archive-relative URI strings. Implementations must be safe for
/// concurrent reads; the resolver issues `open` calls from multiple tasks at
/// once.
pub trait TileSource {
    /// Read a whole document.
    fn open(&self, path: &str) -> Result<Vec<u8>, SourceError>;

    /// Document name to use when the caller does not name one.
    fn hint(&self) -> &str {
        TILESET_HINT
    }
}

/// Tile source backed by a plain directory tree.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl TileSource for DirSource {
    fn open(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound { path: path.into() },
            _ => SourceError::Io {
                path: path.into(),
                source: e,
            },
        })
    }
}
