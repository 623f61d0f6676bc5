//! Wire-format structs mirroring the tileset JSON schema key for key.
//!
//! These stay private to the codec: required fields are `Option` here so that
//! validation can report precise missing-field errors instead of opaque serde
//! failures, and fixed-length numeric arrays are `Vec<f64>` so length errors
//! name the offending field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) type RawExtensions = BTreeMap<String, Value>;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTileset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<RawAsset>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, RawProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometric_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<RawTile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: RawExtensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tileset_version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: RawExtensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: RawExtensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_volume: Option<RawBoundingVolume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_request_volume: Option<RawBoundingVolume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometric_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine: Option<RawRefine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<RawContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawTile>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: RawExtensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum RawRefine {
    #[serde(rename = "ADD")]
    Add,
    #[serde(rename = "REPLACE")]
    Replace,
}

/// A boundingVolume object carries exactly one of the three shape keys.
/// Unknown keys land in `other` so the error can name them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct RawBoundingVolume {
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub box_: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sphere: Option<Vec<f64>>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_volume: Option<RawBoundingVolume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: RawExtensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}
