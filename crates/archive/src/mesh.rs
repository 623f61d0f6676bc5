//! Mesh-decode boundary.
//!
//! Decoding binary geometry payloads is a collaborator's job; this module
//! only fixes the contract and the transform composition the caller owes the
//! decoder: the content's own transform, the payload's local-origin (RTC)
//! translation, and the Y-up to Z-up axis correction.

use glam::{DMat4, DVec3};

/// Result of decoding one binary geometry payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<M> {
    pub mesh: M,
    /// Local-origin translation the payload's vertices are relative to.
    pub rtc_center: DVec3,
}

/// Collaborator contract for decoding binary geometry payloads.
pub trait MeshDecoder {
    type Mesh;
    type Error;

    fn decode(&self, bytes: &[u8]) -> Result<Decoded<Self::Mesh>, Self::Error>;
}

/// Axis correction from glTF's Y-up convention to the tileset's Z-up frame.
pub fn y_up_to_z_up() -> DMat4 {
    DMat4::from_cols_array(&[
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ])
}

/// Combined transform owed to the decoder: content transform, then the
/// payload's RTC translation, then the axis correction.
pub fn content_transform(base: DMat4, rtc_center: DVec3) -> DMat4 {
    base * DMat4::from_translation(rtc_center) * y_up_to_z_up()
}

/// Decode a payload and return the mesh with its fully composed placement
/// transform.
pub fn decode_content<D: MeshDecoder>(
    decoder: &D,
    bytes: &[u8],
    base: DMat4,
) -> Result<(D::Mesh, DMat4), D::Error> {
    let decoded = decoder.decode(bytes)?;
    let transform = content_transform(base, decoded.rtc_center);
    Ok((decoded.mesh, transform))
}
