//! Panoramax API backend.
//!
//! Discovery works by probing the public search endpoint around random
//! points. A candidate only qualifies when it belongs to a collection large
//! enough that the location is not trivially identifiable from a single
//! isolated shot:
//!
//! 1. `POST {api}/search` with a bounding box around the point, panoramas only.
//! 2. If the whole page comes from the first feature's collection, accept it.
//! 3. Otherwise `GET {api}/collections/{id}` and accept when
//!    `stats:items.count` reaches the configured minimum.
//!
//! Probes that produce nothing usable count as failed trials; after
//! `max_failed_queries` of them the source gives up with
//! [`PictureError::NotFound`].

use std::time::Duration;

use rhenaguesser_types::{Coordinate, Picture, PictureId};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{PanoramaxConfig, SearchArea};
use crate::error::PictureError;
use crate::points::random_points;

/// HTTP client for the Panoramax API.
pub struct PanoramaxClient {
    client: reqwest::Client,
    config: PanoramaxConfig,
    search_areas: Vec<SearchArea>,
}

/// First feature of a search page, plus what we need to judge its collection.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    picture: Picture,
    collection: Option<String>,
    page_len: usize,
    same_collection: usize,
}

impl PanoramaxClient {
    /// Create a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PictureError::Config`] if the HTTP client cannot be built.
    pub fn new(config: PanoramaxConfig, search_areas: Vec<SearchArea>) -> Result<Self, PictureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| PictureError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            search_areas,
        })
    }

    /// Find `count` distinct qualifying pictures.
    pub(crate) async fn fetch_pictures(&self, count: usize) -> Result<Vec<Picture>, PictureError> {
        let mut pictures: Vec<Picture> = Vec::with_capacity(count);
        let mut points: Vec<Coordinate> = Vec::new();
        let mut failed: u32 = 0;

        while pictures.len() < count {
            if points.is_empty() {
                points = random_points(
                    &self.search_areas,
                    self.config.points_per_batch,
                    &mut rand::rng(),
                );
            }
            let Some(point) = points.pop() else {
                return Err(PictureError::Config(
                    "no valid search area to draw points from".to_owned(),
                ));
            };

            match self.query_point(point).await {
                Ok(Some(picture)) if !pictures.iter().any(|p| p.id == picture.id) => {
                    debug!(picture = %picture.id, "qualifying picture found");
                    pictures.push(picture);
                }
                Ok(Some(picture)) => {
                    debug!(picture = %picture.id, "duplicate picture skipped");
                    failed = failed.saturating_add(1);
                }
                Ok(None) => {
                    failed = failed.saturating_add(1);
                }
                Err(e) => {
                    warn!(error = %e, "Panoramax probe failed");
                    failed = failed.saturating_add(1);
                }
            }

            if failed >= self.config.max_failed_queries {
                return Err(PictureError::NotFound(format!(
                    "found {} of {count} pictures after {failed} failed queries",
                    pictures.len()
                )));
            }
        }

        Ok(pictures)
    }

    /// Look up where a picture was taken.
    pub(crate) async fn locate(&self, id: &PictureId) -> Result<Coordinate, PictureError> {
        let url = format!("{}/search", self.config.api_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", id.as_str())])
            .send()
            .await
            .map_err(|e| PictureError::Upstream(format!("search request failed: {e}")))?;
        let json = read_json(response).await?;
        extract_position(&json).ok_or_else(|| PictureError::NotFound(format!("no picture with id {id}")))
    }

    /// Probe around one point; `Ok(None)` when nothing qualifies.
    async fn query_point(&self, point: Coordinate) -> Result<Option<Picture>, PictureError> {
        let url = format!("{}/search", self.config.api_url);
        let response = self
            .client
            .post(&url)
            .json(&search_body(point, &self.config))
            .send()
            .await
            .map_err(|e| PictureError::Upstream(format!("search request failed: {e}")))?;
        let json = read_json(response).await?;

        let Some(candidate) = extract_candidate(&json)? else {
            return Ok(None);
        };

        let full_page = usize::try_from(self.config.search_limit).unwrap_or(usize::MAX);
        if candidate.page_len >= full_page && candidate.same_collection == candidate.page_len
        {
            return Ok(Some(candidate.picture));
        }

        let Some(collection) = candidate.collection else {
            return Ok(None);
        };
        let size = self.collection_size(&collection).await?;
        if size.is_some_and(|n| n >= self.config.min_collection_size) {
            Ok(Some(candidate.picture))
        } else {
            debug!(collection, ?size, "collection too small");
            Ok(None)
        }
    }

    /// Number of items in a collection, if the provider reports it.
    async fn collection_size(&self, collection: &str) -> Result<Option<u64>, PictureError> {
        let url = format!("{}/collections/{collection}", self.config.api_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PictureError::Upstream(format!("collection request failed: {e}")))?;
        let json = read_json(response).await?;
        Ok(extract_collection_size(&json))
    }
}

/// Check the status and decode the JSON body of a provider response.
async fn read_json(response: reqwest::Response) -> Result<Value, PictureError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(PictureError::Upstream(format!("Panoramax returned {status}: {body}")));
    }
    response
        .json()
        .await
        .map_err(|e| PictureError::InvalidResponse(format!("response parse failed: {e}")))
}

/// Search request body: a box of `search_radius_deg` around `point`.
fn search_body(point: Coordinate, config: &PanoramaxConfig) -> Value {
    let r = config.search_radius_deg;
    serde_json::json!({
        "limit": config.search_limit,
        "bbox": [
            point.longitude - r,
            point.latitude - r,
            point.longitude + r,
            point.latitude + r,
        ],
        "filter": format!("field_of_view={}", config.field_of_view),
    })
}

/// Read `[lng, lat]` from a GeoJSON feature.
fn feature_position(feature: &Value) -> Option<Coordinate> {
    let coordinates = feature.get("geometry")?.get("coordinates")?;
    let longitude = coordinates.get(0)?.as_f64()?;
    let latitude = coordinates.get(1)?.as_f64()?;
    Some(Coordinate::new(latitude, longitude))
}

/// Extract the first feature of a search page.
///
/// `Ok(None)` for an empty page; an error when the page is not a feature
/// collection or its first feature lacks an id or position.
fn extract_candidate(json: &Value) -> Result<Option<Candidate>, PictureError> {
    let features = json
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| PictureError::InvalidResponse("search response missing features".to_owned()))?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let id = first
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| PictureError::InvalidResponse("feature missing id".to_owned()))?;
    let position = feature_position(first)
        .ok_or_else(|| PictureError::InvalidResponse("feature missing coordinates".to_owned()))?;
    let collection = first.get("collection").and_then(Value::as_str).map(ToOwned::to_owned);

    let same_collection = collection.as_deref().map_or(0, |c| {
        features
            .iter()
            .filter(|f| f.get("collection").and_then(Value::as_str) == Some(c))
            .count()
    });

    Ok(Some(Candidate {
        picture: Picture {
            id: PictureId::from(id),
            position,
        },
        collection,
        page_len: features.len(),
        same_collection,
    }))
}

/// Read `stats:items.count` from a collection document.
fn extract_collection_size(json: &Value) -> Option<u64> {
    json.get("stats:items")?.get("count")?.as_u64()
}

/// Position of the first feature of an id lookup.
fn extract_position(json: &Value) -> Option<Coordinate> {
    json.get("features")?.as_array()?.first().and_then(feature_position)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn feature(id: &str, collection: &str, lng: f64, lat: f64) -> Value {
        serde_json::json!({
            "id": id,
            "collection": collection,
            "geometry": { "type": "Point", "coordinates": [lng, lat] }
        })
    }

    #[test]
    fn search_body_builds_bbox_around_point() {
        let body = search_body(Coordinate::new(48.0, 7.0), &PanoramaxConfig::default());
        assert_eq!(body["limit"], 10);
        assert_eq!(body["bbox"], serde_json::json!([5.0, 46.0, 9.0, 50.0]));
        assert_eq!(body["filter"], "field_of_view=360");
    }

    #[test]
    fn candidate_counts_same_collection() {
        let json = serde_json::json!({
            "features": [
                feature("p1", "c1", 7.75, 48.58),
                feature("p2", "c1", 7.76, 48.59),
                feature("p3", "c2", 7.70, 48.50),
            ]
        });
        let candidate = extract_candidate(&json).ok().flatten();
        let Some(candidate) = candidate else {
            panic!("expected a candidate");
        };
        assert_eq!(candidate.picture.id, PictureId::from("p1"));
        assert_eq!(candidate.picture.position, Coordinate::new(48.58, 7.75));
        assert_eq!(candidate.collection.as_deref(), Some("c1"));
        assert_eq!(candidate.page_len, 3);
        assert_eq!(candidate.same_collection, 2);
    }

    #[test]
    fn empty_page_is_no_candidate() {
        let json = serde_json::json!({ "features": [] });
        assert!(matches!(extract_candidate(&json), Ok(None)));
    }

    #[test]
    fn malformed_page_is_invalid_response() {
        let json = serde_json::json!({ "type": "FeatureCollection" });
        assert!(matches!(extract_candidate(&json), Err(PictureError::InvalidResponse(_))));

        let json = serde_json::json!({ "features": [{ "collection": "c1" }] });
        assert!(matches!(extract_candidate(&json), Err(PictureError::InvalidResponse(_))));
    }

    #[test]
    fn collection_size_reads_stats() {
        let json = serde_json::json!({ "id": "c1", "stats:items": { "count": 42 } });
        assert_eq!(extract_collection_size(&json), Some(42));
        assert_eq!(extract_collection_size(&serde_json::json!({})), None);
    }

    #[test]
    fn position_lookup_reads_lng_lat_order() {
        let json = serde_json::json!({ "features": [feature("p1", "c1", 7.75, 48.58)] });
        assert_eq!(extract_position(&json), Some(Coordinate::new(48.58, 7.75)));
        assert_eq!(extract_position(&serde_json::json!({ "features": [] })), None);
    }
}
