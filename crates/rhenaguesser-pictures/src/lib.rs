//! Picture sources for the RhenaGuesser game server.
//!
//! A session needs a handful of geo-located street-level pictures up front
//! and, for the single-player endpoints, the position of a picture by id.
//! Two backends provide that:
//!
//! - [`panoramax`] -- probes the public Panoramax API around random points
//! - [`catalogue`] -- serves a fixed list from configuration
//!
//! [`PictureSource`] dispatches between them.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod panoramax;
pub mod points;
pub mod source;

pub use catalogue::StaticCatalogue;
pub use config::{BackendKind, PanoramaxConfig, PictureSourceConfig, SearchArea};
pub use error::PictureError;
pub use panoramax::PanoramaxClient;
pub use source::PictureSource;
