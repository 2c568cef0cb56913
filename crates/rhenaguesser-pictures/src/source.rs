//! Backend dispatch for picture sources.

use rhenaguesser_types::{Coordinate, Picture, PictureId};

use crate::catalogue::StaticCatalogue;
use crate::config::{BackendKind, PictureSourceConfig};
use crate::error::PictureError;
use crate::panoramax::PanoramaxClient;

/// A picture source the coordinator draws rounds from.
///
/// Uses enum dispatch so callers hold a concrete type without boxing an
/// async trait object.
pub enum PictureSource {
    /// Live Panoramax API.
    Panoramax(PanoramaxClient),
    /// Fixed catalogue from configuration.
    Static(StaticCatalogue),
}

impl PictureSource {
    /// Build the backend selected in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PictureError::Config`] if the configuration is unusable.
    pub fn from_config(config: &PictureSourceConfig) -> Result<Self, PictureError> {
        config.validate()?;
        match config.backend {
            BackendKind::Panoramax => Ok(Self::Panoramax(PanoramaxClient::new(
                config.panoramax.clone(),
                config.search_areas.clone(),
            )?)),
            BackendKind::Static => Ok(Self::Static(StaticCatalogue::new(config.catalogue.clone()))),
        }
    }

    /// Fetch `count` distinct pictures for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`PictureError::NotFound`] when not enough qualifying
    /// pictures exist, or a provider error from the live backend.
    pub async fn fetch_pictures(&self, count: usize) -> Result<Vec<Picture>, PictureError> {
        match self {
            Self::Panoramax(client) => client.fetch_pictures(count).await,
            Self::Static(catalogue) => catalogue.fetch_pictures(count),
        }
    }

    /// Fetch a single picture, for the single-player endpoints.
    ///
    /// # Errors
    ///
    /// Same as [`PictureSource::fetch_pictures`].
    pub async fn fetch_one(&self) -> Result<Picture, PictureError> {
        self.fetch_pictures(1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PictureError::NotFound("no picture returned".to_owned()))
    }

    /// Where the picture with `id` was taken.
    ///
    /// # Errors
    ///
    /// Returns [`PictureError::NotFound`] for an unknown id.
    pub async fn locate(&self, id: &PictureId) -> Result<Coordinate, PictureError> {
        match self {
            Self::Panoramax(client) => client.locate(id).await,
            Self::Static(catalogue) => catalogue.locate(id),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Panoramax(_) => "panoramax",
            Self::Static(_) => "static",
        }
    }
}
