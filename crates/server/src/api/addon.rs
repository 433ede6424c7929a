//! Addon protocol handlers: manifest, catalog and meta.
//!
//! Every resource is addressed as `<segment>.json`, so handlers capture the
//! whole last segment and strip the suffix.

use axum::{
    extract::{Path, RawPathParams, State},
    Json,
};
use std::borrow::Cow;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use marquee_core::{AddonConfig, CatalogSummary, MetadataView};

use crate::state::AppState;

/// Content type served by this addon
const MOVIE_TYPE: &str = "movie";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub id_prefixes: Vec<String>,
    pub catalogs: Vec<ManifestCatalog>,
}

#[derive(Debug, Serialize)]
pub struct ManifestCatalog {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub name: String,
    pub extra: Vec<ManifestExtra>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExtra {
    pub name: String,
    pub is_required: bool,
}

impl Manifest {
    pub fn from_config(addon: &AddonConfig, version: &str) -> Self {
        Self {
            id: addon.id.clone(),
            version: version.to_string(),
            name: addon.name.clone(),
            description: addon.description.clone(),
            resources: vec!["catalog".to_string(), "meta".to_string()],
            types: vec![MOVIE_TYPE.to_string()],
            id_prefixes: vec![format!("{}-", addon.id_prefix)],
            catalogs: vec![ManifestCatalog {
                kind: MOVIE_TYPE.to_string(),
                id: addon.catalog_id.clone(),
                name: addon.catalog_name.clone(),
                extra: vec![ManifestExtra {
                    name: "search".to_string(),
                    is_required: false,
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub metas: Vec<CatalogSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub meta: Option<MetadataView>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    Json(Manifest::from_config(
        &state.config().addon,
        env!("CARGO_PKG_VERSION"),
    ))
}

/// `GET /catalog/movie/{catalog_id}.json`
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Path(catalog_file): Path<String>,
) -> Json<CatalogResponse> {
    let catalog_id = strip_json(&catalog_file);
    Json(catalog_response(&state, catalog_id, None))
}

/// `GET /catalog/movie/{catalog_id}/{extra}.json`, where extra is a
/// `&`-separated list of `key=value` pairs such as `search=iron%20man`.
///
/// The segments are taken still percent-encoded: the extra is split on
/// `&` first and each value decoded afterwards, so an encoded `%26` stays
/// part of the search text.
pub async fn catalog_with_extra(
    State(state): State<Arc<AppState>>,
    params: RawPathParams,
) -> Json<CatalogResponse> {
    let mut catalog_id = "";
    let mut extra_file = "";
    for (key, value) in &params {
        match key {
            "catalog_id" => catalog_id = value,
            "extra_file" => extra_file = value,
            _ => {}
        }
    }

    let catalog_id = decode_component(catalog_id);
    let search = search_term(strip_json(extra_file));
    Json(catalog_response(&state, &catalog_id, search.as_deref()))
}

/// `GET /meta/movie/{id}.json`
pub async fn meta(
    State(state): State<Arc<AppState>>,
    Path(meta_file): Path<String>,
) -> Json<MetaResponse> {
    let id = strip_json(&meta_file);
    Json(MetaResponse {
        meta: state.query().get_metadata(id),
    })
}

fn catalog_response(state: &AppState, catalog_id: &str, search: Option<&str>) -> CatalogResponse {
    if catalog_id != state.config().addon.catalog_id {
        debug!("Unknown catalog {:?}", catalog_id);
        return CatalogResponse { metas: Vec::new() };
    }
    CatalogResponse {
        metas: state.query().search_catalog(search),
    }
}

fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

/// Decoded `search` value of a raw (still percent-encoded) extra string.
fn search_term(raw_extra: &str) -> Option<Cow<'_, str>> {
    raw_extra
        .split('&')
        .find_map(|pair| pair.strip_prefix("search="))
        .map(decode_component)
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}
