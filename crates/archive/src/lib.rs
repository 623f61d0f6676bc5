//! Archive access and external tileset resolution.
//!
//! # Invariants
//! - Every reachable unresolved reference is either spliced or explicitly
//!   left unresolved by the time [`resolve`] returns; no node is visited
//!   twice and no node is mutated by two tasks.
//! - Failures in one subtree never abort sibling resolution; they are
//!   collected and surfaced after the join.

pub mod mesh;
mod resolve;
mod source;

pub use resolve::{ResolveError, ResolveFailure, ResolveReport, resolve};
pub use source::{DirSource, SourceError, TILESET_HINT, TileSource};

use std::path::Path;
use tilespace_codec::CodecError;
use tilespace_model::Tileset;

/// Errors from opening an archive's root document.
///
/// Per-node resolution failures are not errors at this level; they are
/// reported through [`ResolveReport`].
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A tile archive: a source plus its decoded (and optionally resolved)
/// root tileset.
#[derive(Debug)]
pub struct Archive<S> {
    source: S,
    tileset: Tileset,
    tree_size: usize,
    report: ResolveReport,
}

impl<S: TileSource + Sync> Archive<S> {
    /// Open the archive's default document (the source's hint).
    pub fn open(source: S, include_external: bool) -> Result<Self, ArchiveError> {
        let path = source.hint().to_string();
        Self::open_at(source, &path, include_external)
    }

    /// Open a specific document as the archive root.
    ///
    /// With `include_external`, externally referenced tilesets are resolved
    /// and spliced before the archive is returned; partial failures land in
    /// [`Archive::report`], not in the error return.
    pub fn open_at(source: S, path: &str, include_external: bool) -> Result<Self, ArchiveError> {
        let mut tileset = read_document(&source, path)?;
        let report = if include_external {
            resolve(&mut tileset, &source)
        } else {
            ResolveReport::default()
        };
        let tree_size = tileset.tree_size();
        tracing::info!(path, tree_size, "opened tile archive");
        Ok(Self {
            source,
            tileset,
            tree_size,
            report,
        })
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    pub fn into_tileset(self) -> Tileset {
        self.tileset
    }

    /// Node count of the (resolved) tree, cached at open time.
    pub fn tree_size(&self) -> usize {
        self.tree_size
    }

    /// Outcome of the resolution pass; empty when `include_external` was
    /// false.
    pub fn report(&self) -> &ResolveReport {
        &self.report
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read and decode another tileset document from the same source,
    /// without resolving its external references.
    pub fn read_tileset(&self, path: &str) -> Result<Tileset, ArchiveError> {
        read_document(&self.source, path)
    }
}

fn read_document<S: TileSource>(source: &S, path: &str) -> Result<Tileset, ArchiveError> {
    let bytes = source.open(path)?;
    Ok(tilespace_codec::decode(&bytes, Path::new(path))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_docs(dir: &Path) {
        std::fs::write(
            dir.join("tileset.json"),
            json!({
                "asset": { "version": "1.0" },
                "geometricError": 100.0,
                "root": {
                    "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 10.0] },
                    "geometricError": 50.0,
                    "children": [{
                        "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 5.0] },
                        "geometricError": 10.0,
                        "content": { "uri": "external.json" }
                    }]
                }
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join("external.json"),
            json!({
                "asset": { "version": "1.0" },
                "geometricError": 10.0,
                "root": {
                    "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 5.0] },
                    "geometricError": 5.0,
                    "children": [{
                        "boundingVolume": { "sphere": [1.0, 0.0, 0.0, 1.0] },
                        "geometricError": 0.0,
                        "content": { "uri": "leaf.b3dm" }
                    }]
                }
            })
            .to_string(),
        )
        .unwrap();
    }

    #[test]
    fn open_resolves_external_references_by_default_hint() {
        let tmp = tempfile::tempdir().unwrap();
        write_docs(tmp.path());

        let archive = Archive::open(DirSource::new(tmp.path()), true).unwrap();
        assert!(archive.report().is_complete());
        assert_eq!(archive.report().resolved, 1);
        assert_eq!(archive.tree_size(), 3);

        let spliced = &archive.tileset().root.as_ref().unwrap().children[0];
        assert_eq!(spliced.children.len(), 1);
        assert_eq!(
            spliced.children[0].content.as_ref().unwrap().uri,
            "leaf.b3dm"
        );
    }

    #[test]
    fn open_without_resolution_keeps_references() {
        let tmp = tempfile::tempdir().unwrap();
        write_docs(tmp.path());

        let archive = Archive::open(DirSource::new(tmp.path()), false).unwrap();
        assert_eq!(archive.tree_size(), 2);
        let child = &archive.tileset().root.as_ref().unwrap().children[0];
        assert_eq!(child.content.as_ref().unwrap().uri, "external.json");
        assert!(child.children.is_empty());
    }

    #[test]
    fn open_missing_root_document_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Archive::open(DirSource::new(tmp.path()), true).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Source(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn read_tileset_fetches_other_documents() {
        let tmp = tempfile::tempdir().unwrap();
        write_docs(tmp.path());

        let archive = Archive::open(DirSource::new(tmp.path()), false).unwrap();
        let other = archive.read_tileset("external.json").unwrap();
        assert_eq!(other.tree_size(), 2);
    }
}
