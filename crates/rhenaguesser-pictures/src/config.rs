//! Configuration types for picture sources.
//!
//! These structs are embedded in the server's YAML configuration under the
//! `pictures` key. Every field has a default so an empty section yields a
//! working Panoramax setup.

use rhenaguesser_types::{Coordinate, Picture};
use serde::Deserialize;

use crate::error::PictureError;

/// Which backend serves pictures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Query the public Panoramax API.
    #[default]
    Panoramax,
    /// Serve pictures from the configured `catalogue`.
    Static,
}

/// Top-level picture source configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PictureSourceConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: BackendKind,

    /// Panoramax API settings.
    #[serde(default)]
    pub panoramax: PanoramaxConfig,

    /// Rectangles random search points are drawn from.
    #[serde(default = "default_search_areas")]
    pub search_areas: Vec<SearchArea>,

    /// Fixed pictures for the static backend.
    #[serde(default)]
    pub catalogue: Vec<Picture>,
}

impl Default for PictureSourceConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            panoramax: PanoramaxConfig::default(),
            search_areas: default_search_areas(),
            catalogue: Vec::new(),
        }
    }
}

impl PictureSourceConfig {
    /// Check the settings the selected backend depends on.
    ///
    /// # Errors
    ///
    /// Returns [`PictureError::Config`] when the Panoramax backend has no
    /// usable search area or nonsensical limits.
    pub fn validate(&self) -> Result<(), PictureError> {
        match self.backend {
            BackendKind::Panoramax => {
                if !self.search_areas.iter().any(SearchArea::is_valid) {
                    return Err(PictureError::Config(
                        "at least one valid search area is required".to_owned(),
                    ));
                }
                if self.panoramax.search_limit == 0 || self.panoramax.points_per_batch == 0 {
                    return Err(PictureError::Config(
                        "search_limit and points_per_batch must be positive".to_owned(),
                    ));
                }
                Ok(())
            }
            BackendKind::Static => Ok(()),
        }
    }
}

/// Panoramax API settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanoramaxConfig {
    /// Base URL of the API, without trailing slash.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Half-width in degrees of the box searched around a random point.
    #[serde(default = "default_search_radius_deg")]
    pub search_radius_deg: f64,

    /// Page size of a search request.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Smallest collection a picture may come from.
    #[serde(default = "default_min_collection_size")]
    pub min_collection_size: u64,

    /// Failed provider queries tolerated before giving up.
    #[serde(default = "default_max_failed_queries")]
    pub max_failed_queries: u32,

    /// Random points generated per batch.
    #[serde(default = "default_points_per_batch")]
    pub points_per_batch: usize,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Required horizontal field of view (360 = panoramas only).
    #[serde(default = "default_field_of_view")]
    pub field_of_view: u32,
}

impl Default for PanoramaxConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            search_radius_deg: default_search_radius_deg(),
            search_limit: default_search_limit(),
            min_collection_size: default_min_collection_size(),
            max_failed_queries: default_max_failed_queries(),
            points_per_batch: default_points_per_batch(),
            request_timeout_ms: default_request_timeout_ms(),
            field_of_view: default_field_of_view(),
        }
    }
}

/// An axis-aligned latitude/longitude rectangle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArea {
    /// Label used in logs.
    pub name: String,
    /// Southern edge in degrees.
    pub min_latitude: f64,
    /// Western edge in degrees.
    pub min_longitude: f64,
    /// Northern edge in degrees.
    pub max_latitude: f64,
    /// Eastern edge in degrees.
    pub max_longitude: f64,
}

impl SearchArea {
    /// Whether the bounds are finite and ordered.
    pub fn is_valid(&self) -> bool {
        [
            self.min_latitude,
            self.min_longitude,
            self.max_latitude,
            self.max_longitude,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.min_latitude <= self.max_latitude
            && self.min_longitude <= self.max_longitude
    }

    /// Whether `point` lies inside the rectangle (edges included).
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_api_url() -> String {
    "https://api.panoramax.xyz/api".to_owned()
}

const fn default_search_radius_deg() -> f64 {
    2.0
}

const fn default_search_limit() -> u32 {
    10
}

const fn default_min_collection_size() -> u64 {
    30
}

const fn default_max_failed_queries() -> u32 {
    10
}

const fn default_points_per_batch() -> usize {
    10
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

const fn default_field_of_view() -> u32 {
    360
}

fn default_search_areas() -> Vec<SearchArea> {
    vec![
        SearchArea {
            name: "Alsace".to_owned(),
            min_latitude: 47.42,
            min_longitude: 6.84,
            max_latitude: 49.08,
            max_longitude: 8.23,
        },
        SearchArea {
            name: "Upper Rhine (Baden)".to_owned(),
            min_latitude: 47.55,
            min_longitude: 7.52,
            max_latitude: 49.02,
            max_longitude: 8.60,
        },
    ]
}
