//! Static picture catalogue backend.
//!
//! Serves pictures from a fixed list loaded from configuration. Used for
//! offline play, demos and tests where the Panoramax API is unavailable.

use rand::seq::IndexedRandom;
use rhenaguesser_types::{Coordinate, Picture, PictureId};

use crate::error::PictureError;

/// Fixed list of pictures with distinct ids.
#[derive(Debug, Clone)]
pub struct StaticCatalogue {
    pictures: Vec<Picture>,
}

impl StaticCatalogue {
    /// Build a catalogue, dropping later entries that repeat an id.
    pub fn new(pictures: Vec<Picture>) -> Self {
        let mut unique: Vec<Picture> = Vec::with_capacity(pictures.len());
        for picture in pictures {
            if !unique.iter().any(|p| p.id == picture.id) {
                unique.push(picture);
            }
        }
        Self { pictures: unique }
    }

    /// Number of distinct pictures available.
    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    /// Whether the catalogue has no pictures.
    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    /// Pick `count` distinct pictures at random.
    pub(crate) fn fetch_pictures(&self, count: usize) -> Result<Vec<Picture>, PictureError> {
        if self.pictures.len() < count {
            return Err(PictureError::NotFound(format!(
                "catalogue holds {} pictures, {count} requested",
                self.pictures.len()
            )));
        }
        let mut rng = rand::rng();
        Ok(self
            .pictures
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect())
    }

    /// Position of the picture with the given id.
    pub(crate) fn locate(&self, id: &PictureId) -> Result<Coordinate, PictureError> {
        self.pictures
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.position)
            .ok_or_else(|| PictureError::NotFound(format!("no picture with id {id}")))
    }
}
