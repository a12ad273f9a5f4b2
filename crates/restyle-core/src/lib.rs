#![warn(missing_docs)]
//! # restyle-core
//!
//! ## Purpose
//! Defines the pure data model used across the `restyle` workspace.
//!
//! ## Responsibilities
//! - Represent encoded still images with their MIME type and geometry.
//! - Encode/decode the data-URL transfer form used by session storage.
//! - Model redesign categories and the user's category selection set.
//! - Mint collision-free design identifiers for generated results.
//!
//! ## Data flow
//! Capture code produces [`EncodedImage`] values. Session transfer and
//! display surfaces consume the data-URL form via [`to_data_url`] /
//! [`parse_data_url`]; that conversion is confined to this module so no other
//! crate handles base64 text directly.
//!
//! ## Ownership and lifetimes
//! Images and payloads own their backing buffers (`Vec<u8>`) to avoid hidden
//! borrow/lifetime coupling between pipeline stages.
//!
//! ## Error model
//! Validation failures (empty buffers, malformed data URLs, unknown category
//! identifiers) return [`CoreError`] variants with caller-actionable
//! categorization.
//!
//! ## Security and privacy notes
//! This crate never logs image bytes; data-URL payloads are treated as opaque
//! user content.
//!
//! ## Example
//! ```rust
//! use restyle_core::{CategorySelection, EncodedImage, RedesignCategory, to_data_url};
//!
//! let image = EncodedImage::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg", 4, 3).unwrap();
//! assert!(to_data_url(&image).starts_with("data:image/jpeg;base64,"));
//!
//! let mut selection = CategorySelection::new();
//! selection.toggle(RedesignCategory::Floor);
//! assert_eq!(selection.serialize(), "floor");
//! ```

use std::collections::BTreeSet;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Scheme prefix shared by every transferable image payload.
pub const DATA_URL_SCHEME: &str = "data:";

/// Marker separating the MIME type from the base64 payload in a data URL.
pub const DATA_URL_BASE64_MARKER: &str = ";base64,";

/// One encoded still image plus its self-describing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded image bytes (JPEG, PNG, ...).
    pub bytes: Vec<u8>,
    /// MIME type describing `bytes` (for example `image/jpeg`).
    pub mime: String,
    /// Pixel width of the encoded image.
    pub width: u32,
    /// Pixel height of the encoded image.
    pub height: u32,
}

impl EncodedImage {
    /// Constructs a validated encoded image.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyImageBytes`] when `bytes` is empty.
    /// Returns [`CoreError::BlankMimeType`] when `mime` is blank.
    /// Returns [`CoreError::ZeroDimension`] when either dimension is zero.
    pub fn new(
        bytes: Vec<u8>,
        mime: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Result<Self, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::EmptyImageBytes);
        }

        let mime = mime.into();
        if mime.trim().is_empty() {
            return Err(CoreError::BlankMimeType);
        }

        if width == 0 || height == 0 {
            return Err(CoreError::ZeroDimension { width, height });
        }

        Ok(Self {
            bytes,
            mime,
            width,
            height,
        })
    }

    /// Returns the longer of the two pixel dimensions.
    pub fn longer_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Decoded result of parsing a data-URL payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Raw image bytes recovered from the base64 section.
    pub bytes: Vec<u8>,
    /// MIME type declared in the data-URL header.
    pub mime: String,
}

/// Encodes raw image bytes into their data-URL transfer form.
///
/// Infallible on well-formed input; the output is
/// `data:<mime>;base64,<payload>`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "{DATA_URL_SCHEME}{mime}{DATA_URL_BASE64_MARKER}{}",
        BASE64_STANDARD.encode(bytes)
    )
}

/// Encodes an image into its data-URL transfer form.
pub fn to_data_url(image: &EncodedImage) -> String {
    encode_data_url(&image.mime, &image.bytes)
}

/// Parses and validates a data-URL image payload.
///
/// # Errors
/// Returns [`CoreError::MissingDataUrlPrefix`] when the scheme prefix is
/// absent, [`CoreError::MalformedDataUrl`] when the base64 marker is missing,
/// [`CoreError::UnsupportedPayloadMime`] for non-image MIME types,
/// [`CoreError::PayloadDecode`] for invalid base64 text, and
/// [`CoreError::EmptyImageBytes`] when the decoded payload is empty.
pub fn parse_data_url(raw: &str) -> Result<DecodedPayload, CoreError> {
    let rest = raw
        .strip_prefix(DATA_URL_SCHEME)
        .ok_or(CoreError::MissingDataUrlPrefix)?;

    let marker_position = rest
        .find(DATA_URL_BASE64_MARKER)
        .ok_or(CoreError::MalformedDataUrl)?;
    let mime = &rest[..marker_position];
    let payload = &rest[marker_position + DATA_URL_BASE64_MARKER.len()..];

    if !mime.starts_with("image/") {
        return Err(CoreError::UnsupportedPayloadMime(mime.to_string()));
    }

    let bytes = BASE64_STANDARD
        .decode(payload)
        .map_err(CoreError::PayloadDecode)?;
    if bytes.is_empty() {
        return Err(CoreError::EmptyImageBytes);
    }

    Ok(DecodedPayload {
        bytes,
        mime: mime.to_string(),
    })
}

/// Fixed enumeration of redesignable room aspects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RedesignCategory {
    /// Floor surface and material.
    Floor,
    /// Wall finish and color.
    Walls,
    /// Furniture pieces and placement.
    Furniture,
    /// Light sources and fixtures.
    Lighting,
    /// Decorative elements.
    Decor,
}

impl RedesignCategory {
    /// All supported categories in declaration order.
    pub const ALL: [RedesignCategory; 5] = [
        RedesignCategory::Floor,
        RedesignCategory::Walls,
        RedesignCategory::Furniture,
        RedesignCategory::Lighting,
        RedesignCategory::Decor,
    ];

    /// Returns the stable lowercase identifier for this category.
    pub fn id(&self) -> &'static str {
        match self {
            RedesignCategory::Floor => "floor",
            RedesignCategory::Walls => "walls",
            RedesignCategory::Furniture => "furniture",
            RedesignCategory::Lighting => "lighting",
            RedesignCategory::Decor => "decor",
        }
    }

    /// Resolves a category from its identifier.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownCategory`] for unrecognized identifiers.
    pub fn from_id(id: &str) -> Result<Self, CoreError> {
        match id {
            "floor" => Ok(RedesignCategory::Floor),
            "walls" => Ok(RedesignCategory::Walls),
            "furniture" => Ok(RedesignCategory::Furniture),
            "lighting" => Ok(RedesignCategory::Lighting),
            "decor" => Ok(RedesignCategory::Decor),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }
}

/// Unordered set of selected redesign categories.
///
/// Toggling is idempotent in pairs: toggling the same category twice restores
/// the previous membership state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    selected: BTreeSet<RedesignCategory>,
}

impl CategorySelection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of one category; returns `true` when now selected.
    pub fn toggle(&mut self, category: RedesignCategory) -> bool {
        if self.selected.remove(&category) {
            false
        } else {
            self.selected.insert(category);
            true
        }
    }

    /// Returns `true` when the category is currently selected.
    pub fn contains(&self, category: RedesignCategory) -> bool {
        self.selected.contains(&category)
    }

    /// Returns `true` when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Returns the number of selected categories.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Iterates selected categories in stable order.
    pub fn iter(&self) -> impl Iterator<Item = RedesignCategory> + '_ {
        self.selected.iter().copied()
    }

    /// Serializes the selection as a comma-joined identifier list.
    ///
    /// Downstream consumers treat the result as an unordered tag list; the
    /// stable ordering here only makes output deterministic.
    pub fn serialize(&self) -> String {
        self.selected
            .iter()
            .map(|category| category.id())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parses a comma-joined identifier list back into a selection.
    ///
    /// Whitespace around identifiers and duplicate entries are tolerated;
    /// empty segments are skipped.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownCategory`] for unrecognized identifiers.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut selection = Self::new();
        for segment in raw.split(',') {
            let id = segment.trim();
            if id.is_empty() {
                continue;
            }
            selection.selected.insert(RedesignCategory::from_id(id)?);
        }
        Ok(selection)
    }
}

/// Opaque identifier for one generated design result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DesignId(String);

impl DesignId {
    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DesignId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Mints a design identifier from a request sequence number and result bytes.
///
/// # Semantics
/// The sequence number is monotonic per comparison session, so identifiers
/// never collide with a discarded prior result even when the service returns
/// byte-identical images.
pub fn mint_design_id(sequence: u64, content: &[u8]) -> DesignId {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_be_bytes());
    hasher.update(content);
    let digest = hasher.finalize();

    DesignId(format!("design-{sequence}-{}", &hex::encode(digest)[..12]))
}

/// Error type for core model validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Image byte buffer is empty.
    #[error("image byte buffer is empty")]
    EmptyImageBytes,
    /// MIME type is blank.
    #[error("image mime type is blank")]
    BlankMimeType,
    /// Image geometry contains a zero dimension.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension {
        /// Declared pixel width.
        width: u32,
        /// Declared pixel height.
        height: u32,
    },
    /// Payload does not begin with the data-URL scheme.
    #[error("payload does not start with the data: scheme prefix")]
    MissingDataUrlPrefix,
    /// Payload lacks the `;base64,` section marker.
    #[error("payload is missing the base64 section marker")]
    MalformedDataUrl,
    /// Declared MIME type is not an image type.
    #[error("unsupported payload mime type: {0}")]
    UnsupportedPayloadMime(String),
    /// Base64 section failed to decode.
    #[error("payload base64 decode failure: {0}")]
    PayloadDecode(base64::DecodeError),
    /// Category identifier is not part of the fixed enumeration.
    #[error("unknown redesign category: {0}")]
    UnknownCategory(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for image validation and identifier minting.

    use super::*;

    #[test]
    fn rejects_invalid_image_construction() {
        assert!(matches!(
            EncodedImage::new(Vec::new(), "image/jpeg", 1, 1),
            Err(CoreError::EmptyImageBytes)
        ));
        assert!(matches!(
            EncodedImage::new(vec![1], "  ", 1, 1),
            Err(CoreError::BlankMimeType)
        ));
        assert!(matches!(
            EncodedImage::new(vec![1], "image/jpeg", 0, 4),
            Err(CoreError::ZeroDimension { .. })
        ));
    }

    #[test]
    fn design_ids_differ_across_sequences_for_identical_content() {
        let content = [7_u8; 32];
        let first = mint_design_id(1, &content);
        let second = mint_design_id(2, &content);
        assert_ne!(first, second);
    }
}
