//! Codec boundary: translates between tileset JSON documents and the typed
//! tree in `tilespace-model`.
//!
//! # Invariants
//! - Encoding is deterministic and round-trip preserving for every field the
//!   model understands; extension/extras payloads round-trip structurally.
//! - `transform` is a 16-element column-major array on the wire. That is a
//!   wire-format contract, independent of the in-memory matrix layout.
//! - Relative content URIs are resolved against the document's own path at
//!   decode time; downstream code never re-resolves paths.

mod raw;

use glam::{DMat4, DVec3};
use std::io::{Read, Write};
use std::path::Path;
use tilespace_model::{
    Asset, BoundingVolume, Content, OrientedBox, Properties, Property, Refine, Region, Sphere,
    Tile, Tileset,
};

use raw::{
    RawAsset, RawBoundingVolume, RawContent, RawProperty, RawRefine, RawTile, RawTileset,
};

/// Errors from decoding or encoding a tileset document.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed tileset document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown bounding volume kind: {found}")]
    UnknownVolumeKind { found: String },
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("field {field} must have {expected} elements, got {actual}")]
    BadArrayLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Decode a tileset document.
///
/// `base_path` is the document's own location; relative content URIs are
/// resolved against its parent directory.
pub fn decode(bytes: &[u8], base_path: impl AsRef<Path>) -> Result<Tileset, CodecError> {
    let base_path = base_path.as_ref();
    tracing::debug!(base = %base_path.display(), "decoding tileset document");
    let raw: RawTileset = serde_json::from_slice(bytes)?;
    let base = base_path.parent().unwrap_or_else(|| Path::new(""));
    tileset_from_raw(raw, base)
}

/// Decode a tileset document from a reader. See [`decode`].
pub fn decode_reader(reader: impl Read, base_path: impl AsRef<Path>) -> Result<Tileset, CodecError> {
    let base_path = base_path.as_ref();
    let raw: RawTileset = serde_json::from_reader(reader)?;
    let base = base_path.parent().unwrap_or_else(|| Path::new(""));
    tileset_from_raw(raw, base)
}

/// Encode a tileset to its JSON document form. Deterministic output.
pub fn encode(tileset: &Tileset) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec_pretty(&tileset_to_raw(tileset))?)
}

/// Encode a tileset to a writer. See [`encode`].
pub fn encode_writer(tileset: &Tileset, writer: impl Write) -> Result<(), CodecError> {
    Ok(serde_json::to_writer_pretty(writer, &tileset_to_raw(tileset))?)
}

/// Whether a URI refers to externally hosted data: it carries a scheme
/// (`https://...`) or is protocol-relative (`//host/...`).
pub fn is_absolute_uri(uri: &str) -> bool {
    if uri.starts_with("//") {
        return true;
    }
    let Some(colon) = uri.find(':') else {
        return false;
    };
    // A ':' inside a path segment does not make a scheme.
    if uri.find('/').is_some_and(|slash| slash < colon) {
        return false;
    }
    let scheme = &uri[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

/// Resolve a content URI against a base directory. Absolute URIs pass
/// through untouched.
pub fn resolve_uri(base: &Path, uri: &str) -> String {
    if is_absolute_uri(uri) || base.as_os_str().is_empty() {
        return uri.to_string();
    }
    base.join(uri).to_string_lossy().replace('\\', "/")
}

fn tileset_from_raw(raw: RawTileset, base: &Path) -> Result<Tileset, CodecError> {
    let asset = raw
        .asset
        .ok_or(CodecError::MissingField { field: "asset" })?;
    let geometric_error = raw
        .geometric_error
        .ok_or(CodecError::MissingField {
            field: "geometricError",
        })?;
    Ok(Tileset {
        asset: asset_from_raw(asset)?,
        properties: properties_from_raw(raw.properties)?,
        geometric_error,
        root: raw.root.map(|t| tile_from_raw(t, base)).transpose()?,
        extensions_used: raw.extensions_used,
        extensions_required: raw.extensions_required,
        extensions: raw.extensions,
        extras: raw.extras,
    })
}

fn asset_from_raw(raw: RawAsset) -> Result<Asset, CodecError> {
    Ok(Asset {
        version: raw.version.ok_or(CodecError::MissingField {
            field: "asset.version",
        })?,
        tileset_version: raw.tileset_version,
        extensions: raw.extensions,
        extras: raw.extras,
    })
}

fn properties_from_raw(
    raw: std::collections::BTreeMap<String, RawProperty>,
) -> Result<Properties, CodecError> {
    raw.into_iter()
        .map(|(name, p)| {
            Ok((
                name,
                Property {
                    minimum: p.minimum.ok_or(CodecError::MissingField {
                        field: "properties.*.minimum",
                    })?,
                    maximum: p.maximum.ok_or(CodecError::MissingField {
                        field: "properties.*.maximum",
                    })?,
                    extensions: p.extensions,
                    extras: p.extras,
                },
            ))
        })
        .collect()
}

fn tile_from_raw(raw: RawTile, base: &Path) -> Result<Tile, CodecError> {
    let bounding_volume = raw.bounding_volume.ok_or(CodecError::MissingField {
        field: "boundingVolume",
    })?;
    let geometric_error = raw.geometric_error.ok_or(CodecError::MissingField {
        field: "geometricError",
    })?;
    Ok(Tile {
        bounding_volume: volume_from_raw(bounding_volume)?,
        viewer_request_volume: raw.viewer_request_volume.map(volume_from_raw).transpose()?,
        geometric_error,
        refine: raw.refine.map(|r| match r {
            RawRefine::Add => Refine::Add,
            RawRefine::Replace => Refine::Replace,
        }),
        transform: raw.transform.map(transform_from_wire).transpose()?,
        content: raw.content.map(|c| content_from_raw(c, base)).transpose()?,
        children: raw
            .children
            .into_iter()
            .map(|c| tile_from_raw(c, base))
            .collect::<Result<_, _>>()?,
        extensions: raw.extensions,
        extras: raw.extras,
    })
}

fn content_from_raw(raw: RawContent, base: &Path) -> Result<Content, CodecError> {
    let uri = raw.uri.ok_or(CodecError::MissingField {
        field: "content.uri",
    })?;
    Ok(Content {
        bounding_volume: raw.bounding_volume.map(volume_from_raw).transpose()?,
        uri: resolve_uri(base, &uri),
        extensions: raw.extensions,
        extras: raw.extras,
    })
}

fn volume_from_raw(raw: RawBoundingVolume) -> Result<BoundingVolume, CodecError> {
    if let Some(b) = raw.box_ {
        let b: [f64; 12] = take_array(b, "boundingVolume.box")?;
        return Ok(BoundingVolume::Box(OrientedBox {
            center: DVec3::new(b[0], b[1], b[2]),
            x: DVec3::new(b[3], b[4], b[5]),
            y: DVec3::new(b[6], b[7], b[8]),
            z: DVec3::new(b[9], b[10], b[11]),
        }));
    }
    if let Some(r) = raw.region {
        let r: [f64; 6] = take_array(r, "boundingVolume.region")?;
        return Ok(BoundingVolume::Region(Region::new(
            r[0], r[1], r[2], r[3], r[4], r[5],
        )));
    }
    if let Some(s) = raw.sphere {
        let s: [f64; 4] = take_array(s, "boundingVolume.sphere")?;
        return Ok(BoundingVolume::Sphere(Sphere::new(
            DVec3::new(s[0], s[1], s[2]),
            s[3],
        )));
    }
    Err(CodecError::UnknownVolumeKind {
        found: raw
            .other
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| "<empty>".into()),
    })
}

fn take_array<const N: usize>(v: Vec<f64>, field: &'static str) -> Result<[f64; N], CodecError> {
    let actual = v.len();
    <[f64; N]>::try_from(v).map_err(|_| CodecError::BadArrayLength {
        field,
        expected: N,
        actual,
    })
}

// glam matrices are themselves column-major, so from_cols_array consumes the
// wire layout directly. The indirection keeps the contract explicit.
fn transform_from_wire(t: Vec<f64>) -> Result<DMat4, CodecError> {
    let cols: [f64; 16] = take_array(t, "transform")?;
    Ok(DMat4::from_cols_array(&cols))
}

fn transform_to_wire(m: &DMat4) -> Vec<f64> {
    m.to_cols_array().to_vec()
}

fn tileset_to_raw(ts: &Tileset) -> RawTileset {
    RawTileset {
        asset: Some(RawAsset {
            version: Some(ts.asset.version.clone()),
            tileset_version: ts.asset.tileset_version.clone(),
            extensions: ts.asset.extensions.clone(),
            extras: ts.asset.extras.clone(),
        }),
        properties: ts
            .properties
            .iter()
            .map(|(name, p)| {
                (
                    name.clone(),
                    RawProperty {
                        minimum: Some(p.minimum),
                        maximum: Some(p.maximum),
                        extensions: p.extensions.clone(),
                        extras: p.extras.clone(),
                    },
                )
            })
            .collect(),
        geometric_error: Some(ts.geometric_error),
        root: ts.root.as_ref().map(tile_to_raw),
        extensions_used: ts.extensions_used.clone(),
        extensions_required: ts.extensions_required.clone(),
        extensions: ts.extensions.clone(),
        extras: ts.extras.clone(),
    }
}

fn tile_to_raw(tile: &Tile) -> RawTile {
    RawTile {
        bounding_volume: Some(volume_to_raw(&tile.bounding_volume)),
        viewer_request_volume: tile.viewer_request_volume.as_ref().map(volume_to_raw),
        geometric_error: Some(tile.geometric_error),
        refine: tile.refine.map(|r| match r {
            Refine::Add => RawRefine::Add,
            Refine::Replace => RawRefine::Replace,
        }),
        transform: tile.transform.as_ref().map(transform_to_wire),
        content: tile.content.as_ref().map(|c| RawContent {
            bounding_volume: c.bounding_volume.as_ref().map(volume_to_raw),
            uri: Some(c.uri.clone()),
            extensions: c.extensions.clone(),
            extras: c.extras.clone(),
        }),
        children: tile.children.iter().map(tile_to_raw).collect(),
        extensions: tile.extensions.clone(),
        extras: tile.extras.clone(),
    }
}

fn volume_to_raw(v: &BoundingVolume) -> RawBoundingVolume {
    let mut raw = RawBoundingVolume::default();
    match v {
        BoundingVolume::Box(b) => {
            raw.box_ = Some(vec![
                b.center.x, b.center.y, b.center.z, //
                b.x.x, b.x.y, b.x.z, //
                b.y.x, b.y.y, b.y.z, //
                b.z.x, b.z.y, b.z.z,
            ]);
        }
        BoundingVolume::Region(r) => {
            raw.region = Some(vec![
                r.west,
                r.south,
                r.east,
                r.north,
                r.min_height,
                r.max_height,
            ]);
        }
        BoundingVolume::Sphere(s) => {
            raw.sphere = Some(vec![s.center.x, s.center.y, s.center.z, s.radius]);
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tileset() -> Tileset {
        let mut root = Tile::new(
            BoundingVolume::Box(OrientedBox::from_extents(
                DVec3::splat(-10.0),
                DVec3::splat(10.0),
            )),
            64.0,
        );
        root.refine = Some(Refine::Replace);
        root.transform = Some(DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0)));
        root.content = Some(Content::new("root.b3dm"));

        let mut child = Tile::new(
            BoundingVolume::Region(Region::new(-0.1, -0.2, 0.1, 0.2, 0.0, 500.0)),
            16.0,
        );
        child.refine = Some(Refine::Add);
        child.viewer_request_volume =
            Some(BoundingVolume::Sphere(Sphere::new(DVec3::ZERO, 100.0)));
        let mut child_content = Content::new("sub/child.json");
        child_content.bounding_volume =
            Some(BoundingVolume::Sphere(Sphere::new(DVec3::ZERO, 50.0)));
        child.content = Some(child_content);
        child
            .extensions
            .insert("VENDOR_example".into(), json!({ "flag": true }));
        child.extras = Some(json!({ "note": "opaque" }));
        root.children.push(child);

        let mut ts = Tileset {
            geometric_error: 128.0,
            root: Some(root),
            extensions_used: vec!["VENDOR_example".into()],
            extensions_required: vec!["VENDOR_example".into()],
            ..Tileset::default()
        };
        ts.asset.tileset_version = Some("2026.1".into());
        ts.properties
            .insert("Height".into(), Property::new(0.0, 88.5));
        ts.extras = Some(json!([1, 2, 3]));
        ts
    }

    #[test]
    fn round_trip_preserves_all_core_fields() {
        let ts = sample_tileset();
        let bytes = encode(&ts).unwrap();
        let decoded = decode(&bytes, "tileset.json").unwrap();
        assert_eq!(decoded, ts);
    }

    #[test]
    fn encode_is_deterministic() {
        let ts = sample_tileset();
        assert_eq!(encode(&ts).unwrap(), encode(&ts).unwrap());
    }

    #[test]
    fn transform_serializes_column_major() {
        let mut ts = Tileset {
            geometric_error: 1.0,
            ..Tileset::default()
        };
        let mut root = Tile::new(
            BoundingVolume::Sphere(Sphere::new(DVec3::ZERO, 1.0)),
            1.0,
        );
        root.transform = Some(DMat4::from_translation(DVec3::new(100.0, 200.0, 300.0)));
        ts.root = Some(root);

        let bytes = encode(&ts).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let t = value["root"]["transform"].as_array().unwrap();
        assert_eq!(t.len(), 16);
        // Translation lives in the fourth column.
        assert_eq!(t[12].as_f64().unwrap(), 100.0);
        assert_eq!(t[13].as_f64().unwrap(), 200.0);
        assert_eq!(t[14].as_f64().unwrap(), 300.0);
        assert_eq!(t[15].as_f64().unwrap(), 1.0);
    }

    #[test]
    fn decode_resolves_relative_content_uris() {
        let doc = json!({
            "asset": { "version": "1.0" },
            "geometricError": 10.0,
            "root": {
                "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 5.0] },
                "geometricError": 5.0,
                "content": { "uri": "child.json" }
            }
        });
        let ts = decode(doc.to_string().as_bytes(), "sub/tileset.json").unwrap();
        assert_eq!(
            ts.root.unwrap().content.unwrap().uri,
            "sub/child.json"
        );
    }

    #[test]
    fn decode_leaves_absolute_uris_untouched() {
        let doc = json!({
            "asset": { "version": "1.0" },
            "geometricError": 10.0,
            "root": {
                "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 5.0] },
                "geometricError": 5.0,
                "content": { "uri": "https://example.com/other/tileset.json" }
            }
        });
        let ts = decode(doc.to_string().as_bytes(), "sub/tileset.json").unwrap();
        assert_eq!(
            ts.root.unwrap().content.unwrap().uri,
            "https://example.com/other/tileset.json"
        );
    }

    #[test]
    fn is_absolute_uri_recognizes_schemes() {
        assert!(is_absolute_uri("https://example.com/a.json"));
        assert!(is_absolute_uri("s3+custom://bucket/a.json"));
        assert!(is_absolute_uri("//cdn.example.com/a.json"));
        assert!(!is_absolute_uri("tiles/a.json"));
        assert!(!is_absolute_uri("a.json"));
        assert!(!is_absolute_uri("dir/odd:name.json"));
        assert!(!is_absolute_uri(":missing-scheme"));
    }

    #[test]
    fn missing_geometric_error_is_reported() {
        let doc = json!({ "asset": { "version": "1.0" } });
        let err = decode(doc.to_string().as_bytes(), "tileset.json").unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingField {
                field: "geometricError"
            }
        ));
    }

    #[test]
    fn missing_asset_version_is_reported() {
        let doc = json!({ "asset": {}, "geometricError": 1.0 });
        let err = decode(doc.to_string().as_bytes(), "tileset.json").unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingField {
                field: "asset.version"
            }
        ));
    }

    #[test]
    fn missing_content_uri_is_reported() {
        let doc = json!({
            "asset": { "version": "1.0" },
            "geometricError": 1.0,
            "root": {
                "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 1.0] },
                "geometricError": 0.5,
                "content": {}
            }
        });
        let err = decode(doc.to_string().as_bytes(), "tileset.json").unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingField {
                field: "content.uri"
            }
        ));
    }

    #[test]
    fn unknown_volume_kind_names_the_key() {
        let doc = json!({
            "asset": { "version": "1.0" },
            "geometricError": 1.0,
            "root": {
                "boundingVolume": { "cylinder": [0.0, 0.0, 0.0, 1.0, 2.0] },
                "geometricError": 0.5
            }
        });
        let err = decode(doc.to_string().as_bytes(), "tileset.json").unwrap_err();
        match err {
            CodecError::UnknownVolumeKind { found } => assert_eq!(found, "cylinder"),
            other => panic!("expected UnknownVolumeKind, got: {other}"),
        }
    }

    #[test]
    fn wrong_array_length_names_the_field() {
        let doc = json!({
            "asset": { "version": "1.0" },
            "geometricError": 1.0,
            "root": {
                "boundingVolume": { "box": [0.0, 0.0, 0.0] },
                "geometricError": 0.5
            }
        });
        let err = decode(doc.to_string().as_bytes(), "tileset.json").unwrap_err();
        match err {
            CodecError::BadArrayLength {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "boundingVolume.box");
                assert_eq!(expected, 12);
                assert_eq!(actual, 3);
            }
            other => panic!("expected BadArrayLength, got: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = decode(b"{ not json", "tileset.json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn invalid_refine_string_is_malformed() {
        let doc = json!({
            "asset": { "version": "1.0" },
            "geometricError": 1.0,
            "root": {
                "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 1.0] },
                "geometricError": 0.5,
                "refine": "MAYBE"
            }
        });
        let err = decode(doc.to_string().as_bytes(), "tileset.json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn region_wire_order_is_west_south_east_north_heights() {
        let doc = json!({
            "asset": { "version": "1.0" },
            "geometricError": 1.0,
            "root": {
                "boundingVolume": { "region": [-1.0, -0.5, 1.0, 0.5, 10.0, 20.0] },
                "geometricError": 0.5
            }
        });
        let ts = decode(doc.to_string().as_bytes(), "tileset.json").unwrap();
        match ts.root.unwrap().bounding_volume {
            BoundingVolume::Region(r) => {
                assert_eq!(r, Region::new(-1.0, -0.5, 1.0, 0.5, 10.0, 20.0));
            }
            other => panic!("expected region, got {other:?}"),
        }
    }

    #[test]
    fn extensions_and_extras_round_trip_structurally() {
        let mut ts = Tileset {
            geometric_error: 2.0,
            ..Tileset::default()
        };
        ts.extensions.insert(
            "VENDOR_payload".into(),
            json!({ "nested": { "values": [1, 2, 3] }, "s": "x" }),
        );
        ts.extras = Some(json!({ "free": ["form", null, 4.5] }));
        ts.root = Some(Tile::new(
            BoundingVolume::Region(Region::new(-0.1, -0.1, 0.1, 0.1, 0.0, 10.0)),
            1.0,
        ));

        let decoded = decode(&encode(&ts).unwrap(), "tileset.json").unwrap();
        assert_eq!(decoded.extensions, ts.extensions);
        assert_eq!(decoded.extras, ts.extras);
    }

    #[test]
    fn empty_optional_keys_are_omitted_from_the_wire() {
        let ts = Tileset {
            geometric_error: 1.0,
            ..Tileset::default()
        };
        let value: serde_json::Value =
            serde_json::from_slice(&encode(&ts).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("properties"));
        assert!(!obj.contains_key("root"));
        assert!(!obj.contains_key("extensionsUsed"));
        assert!(!obj.contains_key("extras"));
    }
}
