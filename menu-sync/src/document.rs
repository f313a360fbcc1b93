//! Export document format
//!
//! A single-restaurant document is a [`BundleDocument`]: `version`,
//! `exported_at`, `metadata`, then the bundle keys (`restaurant`,
//! `categories`, `items`, `ingredients`) at top level. A multi-restaurant
//! document is a [`CatalogDocument`] holding complete bundle documents under
//! `restaurants`.
//!
//! Decoding goes through [`parse_document`], which checks the version tag and
//! shape before anything touches a database.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::error::ErrorCode;
use shared::models::{Ingredient, MenuCategory, MenuItem, Restaurant};

use crate::error::{SyncError, SyncResult};

/// Version written by this exporter
pub const CURRENT_VERSION: &str = "2.0";
/// Versions accepted by import and compare; "1.0" documents carry no metadata
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0", CURRENT_VERSION];
/// `metadata.exporter`
pub const EXPORTER: &str = "menu-sync";
/// `metadata.export_type` of a multi-restaurant document
pub const EXPORT_TYPE_ALL: &str = "all_restaurants";

/// One restaurant's full record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub restaurant: Restaurant,
    #[serde(default)]
    pub categories: Vec<MenuCategory>,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Bundle {
    pub fn slug(&self) -> &str {
        &self.restaurant.slug
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_slug: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exporter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_count: Option<usize>,
}

/// Single-restaurant document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDocument {
    pub version: String,
    /// RFC 3339; legacy documents carry a naive ISO timestamp, kept verbatim
    pub exported_at: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub bundle: Bundle,
}

/// Multi-restaurant document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub version: String,
    pub exported_at: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub restaurants: Vec<BundleDocument>,
}

/// A decoded bundle, or the reason it could not be decoded
#[derive(Debug)]
pub struct BundleEntry {
    /// Slug when recoverable, else `#<position>`
    pub label: String,
    pub bundle: SyncResult<Bundle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Single,
    Multi,
}

/// Result of [`parse_document`]
#[derive(Debug)]
pub struct ParsedDocument {
    pub version: String,
    pub exported_at: Option<String>,
    pub kind: DocumentKind,
    pub entries: Vec<BundleEntry>,
}

impl ParsedDocument {
    /// Every bundle, failing on the first that did not decode
    pub fn into_bundles(self) -> SyncResult<Vec<Bundle>> {
        self.entries
            .into_iter()
            .map(|entry| {
                entry.bundle.map_err(|e| {
                    SyncError::invalid(
                        e.code(),
                        format!("bundle '{}' is invalid: {e}", entry.label),
                    )
                })
            })
            .collect()
    }
}

/// Validate the version tag and shape of a document and decode its bundles.
///
/// Fails when the document is not a JSON object, the version is missing or
/// unsupported, or neither `restaurant` nor `restaurants` is present. In a
/// multi-restaurant document each bundle decodes on its own; a broken bundle
/// becomes a failed [`BundleEntry`] and its siblings are unaffected. A broken
/// single-restaurant document fails outright.
pub fn parse_document(bytes: &[u8]) -> SyncResult<ParsedDocument> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(mut root) = value else {
        return Err(SyncError::invalid(
            ErrorCode::MalformedDocument,
            "export document must be a JSON object",
        ));
    };

    let version = check_version(&root)?;
    let exported_at = root
        .get("exported_at")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(restaurants) = root.remove("restaurants") {
        let Value::Array(items) = restaurants else {
            return Err(SyncError::invalid(
                ErrorCode::MalformedDocument,
                "'restaurants' must be an array",
            ));
        };
        let entries = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode_entry(index, item))
            .collect();
        return Ok(ParsedDocument {
            version,
            exported_at,
            kind: DocumentKind::Multi,
            entries,
        });
    }

    match root.get("restaurant") {
        None | Some(Value::Null) => Err(SyncError::invalid(
            ErrorCode::RequiredField,
            "export document has neither 'restaurant' nor 'restaurants'",
        )),
        Some(_) => {
            let bundle: Bundle = serde_json::from_value(Value::Object(root))?;
            Ok(ParsedDocument {
                version,
                exported_at,
                kind: DocumentKind::Single,
                entries: vec![BundleEntry {
                    label: bundle.slug().to_string(),
                    bundle: Ok(bundle),
                }],
            })
        }
    }
}

fn check_version(root: &Map<String, Value>) -> SyncResult<String> {
    match root.get("version") {
        None | Some(Value::Null) => Err(SyncError::invalid(
            ErrorCode::UnsupportedVersion,
            "export document has no version tag",
        )),
        Some(Value::String(v)) if SUPPORTED_VERSIONS.contains(&v.as_str()) => Ok(v.clone()),
        Some(other) => Err(SyncError::invalid(
            ErrorCode::UnsupportedVersion,
            format!(
                "export document version {other} is not supported (expected one of {})",
                SUPPORTED_VERSIONS.join(", ")
            ),
        )),
    }
}

fn decode_entry(index: usize, value: Value) -> BundleEntry {
    let label = value
        .get("restaurant")
        .and_then(|r| r.get("slug"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"));

    let shape = match &value {
        Value::Object(map) if map.contains_key("version") => check_version(map).map(|_| ()),
        Value::Object(_) => Ok(()),
        _ => Err(SyncError::invalid(
            ErrorCode::MalformedDocument,
            "bundle must be a JSON object",
        )),
    };
    let bundle = shape.and_then(|()| Ok(serde_json::from_value::<Bundle>(value)?));

    BundleEntry { label, bundle }
}
