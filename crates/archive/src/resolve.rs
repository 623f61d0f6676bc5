//! External tileset resolution.
//!
//! A childless tile whose content URI names another tileset document gets the
//! referenced document decoded and spliced in place: the tile keeps its own
//! bounding volume and frame, and takes over the fetched root's content and
//! children. Absolute URIs are a policy no-op, failures are collected per
//! node, and sibling subtrees resolve on parallel tasks that each own their
//! subtree exclusively.

use crate::source::{SourceError, TileSource};
use rayon::prelude::*;
use std::path::Path;
use tilespace_codec::{CodecError, is_absolute_uri};
use tilespace_model::{Tile, Tileset};

/// Why resolution of one node was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("reference cycle through {path}")]
    Cycle { path: String },
}

/// One abandoned node: the referencing URI and the reason.
///
/// The node's content pointer is left in place so callers can locate and
/// report it.
#[derive(Debug)]
pub struct ResolveFailure {
    pub uri: String,
    pub error: ResolveError,
}

/// Outcome of a resolution pass over one tree.
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Number of external documents spliced into the tree.
    pub resolved: usize,
    /// Absolute references deliberately left unresolved.
    pub skipped_absolute: Vec<String>,
    /// Per-node failures; sibling and ancestor resolution continued past
    /// each of these.
    pub failures: Vec<ResolveFailure>,
}

impl ResolveReport {
    /// Whether every reachable reference was either spliced or skipped by
    /// policy.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, other: ResolveReport) {
        self.resolved += other.resolved;
        self.skipped_absolute.extend(other.skipped_absolute);
        self.failures.extend(other.failures);
    }
}

/// Resolve every reachable external tileset reference in place.
///
/// Blocks until all spawned subtree tasks have completed. The returned report
/// lists skips and failures in document order; the tree itself is left "best
/// effort complete".
pub fn resolve<S: TileSource + Sync>(tileset: &mut Tileset, source: &S) -> ResolveReport {
    let _span = tracing::info_span!("resolve_external").entered();
    let report = match tileset.root.as_mut() {
        Some(root) => resolve_subtree(root, source, &[]),
        None => ResolveReport::default(),
    };
    tracing::info!(
        resolved = report.resolved,
        skipped = report.skipped_absolute.len(),
        failures = report.failures.len(),
        "external resolution complete"
    );
    report
}

fn is_tileset_ref(uri: &str) -> bool {
    let n = uri.len();
    n >= 5 && uri.is_char_boundary(n - 5) && uri[n - 5..].eq_ignore_ascii_case(".json")
}

/// Resolve one exclusively owned subtree. `stack` holds the document URIs
/// spliced along the path from the root, for cycle detection.
fn resolve_subtree<S: TileSource + Sync>(
    tile: &mut Tile,
    source: &S,
    stack: &[String],
) -> ResolveReport {
    let mut report = ResolveReport::default();
    let mut stack = stack.to_vec();

    // Splice until this node is terminal; a fetched root may itself be a
    // bare reference (a chain of documents).
    while tile.children.is_empty() {
        let Some(content) = tile.content.as_ref() else {
            break;
        };
        let uri = content.uri.clone();
        if !is_tileset_ref(&uri) {
            break;
        }
        if is_absolute_uri(&uri) {
            // Cross-archive data is out of reach by policy, not an error.
            tracing::debug!(%uri, "skipping absolute external reference");
            report.skipped_absolute.push(uri);
            break;
        }
        if stack.iter().any(|seen| *seen == uri) {
            report.failures.push(ResolveFailure {
                uri: uri.clone(),
                error: ResolveError::Cycle { path: uri },
            });
            break;
        }
        match fetch(source, &uri) {
            Ok(fetched) => {
                tracing::debug!(%uri, "splicing external tileset");
                splice(tile, fetched);
                report.resolved += 1;
                stack.push(uri);
            }
            Err(error) => {
                tracing::debug!(%uri, %error, "leaving node unresolved");
                report.failures.push(ResolveFailure { uri, error });
                break;
            }
        }
    }

    // Sibling subtrees are resolution-independent; collecting per-child
    // reports keeps the aggregate in document order.
    let child_reports: Vec<ResolveReport> = tile
        .children
        .par_iter_mut()
        .map(|child| resolve_subtree(child, source, &stack))
        .collect();
    for child_report in child_reports {
        report.absorb(child_report);
    }
    report
}

fn fetch<S: TileSource>(source: &S, uri: &str) -> Result<Tileset, ResolveError> {
    let bytes = source.open(uri)?;
    Ok(tilespace_codec::decode(&bytes, Path::new(uri))?)
}

/// Replace the referencing node's content with the fetched root's content and
/// children. The node's own bounding volume, viewer request volume, error and
/// refinement stay as the wrapping frame; transforms compose.
///
/// Metadata of the fetched tileset (asset, properties) is dropped, matching
/// the source format's unspecified behavior here.
fn splice(tile: &mut Tile, fetched: Tileset) {
    let Some(root) = fetched.root else {
        // Empty document: the reference is consumed, nothing replaces it.
        tile.content = None;
        return;
    };
    tile.content = root.content;
    tile.children = root.children;
    tile.transform = match (tile.transform, root.transform) {
        (Some(outer), Some(inner)) => Some(outer * inner),
        (outer, inner) => outer.or(inner),
    };
    if tile.refine.is_none() {
        tile.refine = root.refine;
    }
}
