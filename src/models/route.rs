//! GeoJSON route model and its pollution-scored counterpart

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Coordinate;

/// Property key for the per-coordinate score list
pub const POLLUTION_SCORES_KEY: &str = "pollution_scores";
/// Property key for the aggregate score
pub const AVERAGE_SCORE_KEY: &str = "average_pollution_score";

/// A route as returned by the directions provider: a GeoJSON FeatureCollection
///
/// The first feature is the route. Members this service does not interpret
/// (`bbox`, `metadata`, segment summaries) are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "type", default = "feature_collection")]
    pub kind: String,
    pub features: Vec<RouteFeature>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFeature {
    #[serde(rename = "type", default = "feature")]
    pub kind: String,
    pub geometry: LineString,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type", default = "line_string")]
    pub kind: String,
    pub coordinates: Vec<Coordinate>,
}

fn feature_collection() -> String {
    "FeatureCollection".to_string()
}

fn feature() -> String {
    "Feature".to_string()
}

fn line_string() -> String {
    "LineString".to_string()
}

impl Route {
    /// Single-feature route over the given path, with empty properties
    #[must_use]
    pub fn from_path(coordinates: Vec<Coordinate>) -> Self {
        Self {
            kind: feature_collection(),
            features: vec![RouteFeature {
                kind: feature(),
                geometry: LineString {
                    kind: line_string(),
                    coordinates,
                },
                properties: Map::new(),
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    /// Coordinates of the route feature; empty if the collection has none
    #[must_use]
    pub fn path(&self) -> &[Coordinate] {
        self.features
            .first()
            .map_or(&[], |feature| feature.geometry.coordinates.as_slice())
    }

    /// Property bag of the route feature
    #[must_use]
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.features.first().map(|feature| &feature.properties)
    }
}

/// A route with one pollution score per coordinate and their mean
///
/// Built as a new value; the route it was derived from is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRoute {
    route: Route,
    scores: Vec<Option<f64>>,
    average: Option<f64>,
}

impl ScoredRoute {
    /// Pair a route with its per-coordinate scores; the average is derived
    #[must_use]
    pub fn new(route: Route, scores: Vec<Option<f64>>) -> Self {
        let average = mean_of_present(&scores);
        Self {
            route,
            scores,
            average,
        }
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    #[must_use]
    pub fn scores(&self) -> &[Option<f64>] {
        &self.scores
    }

    /// Mean of the present scores, `None` when every score is absent
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        self.average
    }

    /// Replace the reported average, keeping the scores
    #[must_use]
    pub fn with_average(mut self, average: Option<f64>) -> Self {
        self.average = average;
        self
    }

    /// Write the scores into the route feature's properties, replacing stale values
    #[must_use]
    pub fn into_geojson(self) -> Route {
        let mut route = self.route;
        if let Some(feature) = route.features.first_mut() {
            let scores = self
                .scores
                .iter()
                .map(|score| json_number(*score))
                .collect();
            feature
                .properties
                .insert(POLLUTION_SCORES_KEY.to_string(), Value::Array(scores));
            feature
                .properties
                .insert(AVERAGE_SCORE_KEY.to_string(), json_number(self.average));
        }
        route
    }
}

/// Arithmetic mean of the present values; `None` if there are none
#[must_use]
pub fn mean_of_present(scores: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = scores.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

// serde_json maps non-finite floats to null as well; be explicit about it
fn json_number(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}
