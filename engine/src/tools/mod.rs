//! External lookup tools
//!
//! The turn pipeline consumes a single lookup capability: resolve a place
//! name to coordinates, then fetch a short-range forecast for them. The
//! `LookupTool` trait keeps the orchestrator independent of the concrete
//! weather backend; failures never cross this boundary as errors: place
//! resolution reports not-found, forecasts report failure in-band as text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod weather;

pub use weather::WeatherLookup;

/// Resolved place: coordinates plus the canonical name the resolver knows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Lookup capability consumed by the turn orchestrator
#[async_trait]
pub trait LookupTool: Send + Sync {
    /// Resolve a free-text place name to coordinates. `None` covers both
    /// "no such place" and transport failure.
    async fn resolve_place(&self, name: &str) -> Option<Place>;

    /// Fetch a short-range forecast summary for a resolved place. Always
    /// returns text; failures are represented in-band.
    async fn forecast(&self, place: &Place) -> String;
}
