//! Typed views of the server's data payloads.
//!
//! Payloads travel through the hub as opaque JSON. These types describe what
//! the QuakeWatch backend actually sends so subscribers can opt in to typed
//! access with [`crate::RealtimeEvent::decode`].

use serde::{Deserialize, Serialize};

/// An earthquake as sent in `earthquake_update` and `initial_earthquakes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Earthquake {
    pub id: String,
    pub title: String,
    pub date: String,
    pub datetime: String,
    pub magnitude: f64,
    /// Depth in kilometres
    pub depth: f64,
    /// GeoJSON order: `[longitude, latitude]`
    pub coordinates: Vec<f64>,
    #[serde(default)]
    pub closest_city: Option<String>,
    #[serde(default)]
    pub airports: Vec<Airport>,
    /// Attached by the server for strong earthquakes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<AftershockPrediction>,
}

impl Earthquake {
    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.first().copied()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.get(1).copied()
    }
}

/// An airport near an earthquake epicentre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub name: String,
    pub code: String,
    pub distance_km: f64,
}

/// An aftershock prediction as sent in `prediction_result` and
/// `initial_predictions`.
///
/// Failed predictions carry `success: false` plus `error` and `error_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AftershockPrediction {
    pub success: bool,
    /// Id of the mainshock this prediction belongs to
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub input: Option<PredictionInput>,
    #[serde(default)]
    pub predictions: Option<PredictionValues>,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl AftershockPrediction {
    /// Predicted magnitude of the first aftershock.
    pub fn aftershock_magnitude(&self) -> Option<f64> {
        self.predictions
            .as_ref()
            .map(|p| p.aftershock_magnitude.value)
    }

    /// Predicted minutes until the first aftershock.
    pub fn minutes_to_aftershock(&self) -> Option<f64> {
        self.predictions
            .as_ref()
            .map(|p| p.time_to_aftershock.minutes)
    }
}

/// Mainshock parameters the prediction was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub mainshock_magnitude: f64,
    pub mainshock_depth_km: f64,
    pub mainshock_latitude: f64,
    pub mainshock_longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionValues {
    pub aftershock_magnitude: MagnitudeEstimate,
    pub time_to_aftershock: TimeEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeEstimate {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEstimate {
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub algorithm: String,
    pub prediction_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RealtimeEvent;
    use serde_json::json;

    fn prediction_json() -> serde_json::Value {
        json!({
            "success": true,
            "id": "eq-42",
            "timestamp": "2025-04-23 12:49:00",
            "input": {
                "mainshock_magnitude": 6.2,
                "mainshock_depth_km": 7.0,
                "mainshock_latitude": 40.86,
                "mainshock_longitude": 28.18
            },
            "predictions": {
                "aftershock_magnitude": {"value": 4.81},
                "time_to_aftershock": {"minutes": 37.5}
            },
            "model_info": {"algorithm": "LightGBM", "prediction_type": "Regression"},
            "warnings": []
        })
    }

    #[test]
    fn decodes_earthquake_update() {
        let event = RealtimeEvent::EarthquakeUpdate(json!({
            "id": "eq-42",
            "title": "MARMARA DENIZI",
            "date": "2025.04.23 12:49:00",
            "datetime": "2025-04-23 12:49:00",
            "magnitude": 6.2,
            "depth": 7.0,
            "coordinates": [28.18, 40.86],
            "closest_city": "Istanbul",
            "airports": [{"name": "Istanbul Airport", "code": "IST", "distance_km": 61.3}],
            "prediction": prediction_json()
        }));

        let quake: Earthquake = event.decode().unwrap();
        assert_eq!(quake.id, "eq-42");
        assert_eq!(quake.longitude(), Some(28.18));
        assert_eq!(quake.latitude(), Some(40.86));
        assert_eq!(quake.airports[0].code, "IST");

        let prediction = quake.prediction.unwrap();
        assert_eq!(prediction.aftershock_magnitude(), Some(4.81));
        assert_eq!(prediction.minutes_to_aftershock(), Some(37.5));
    }

    #[test]
    fn decodes_initial_earthquakes_without_optional_fields() {
        let event = RealtimeEvent::InitialEarthquakes(json!([{
            "id": "eq-1",
            "title": "AEGEAN SEA",
            "date": "2025.04.23 10:00:00",
            "datetime": "2025-04-23 10:00:00",
            "magnitude": 2.1,
            "depth": 12.4,
            "coordinates": [26.0, 38.5],
            "closest_city": null,
            "prediction": null
        }]));

        let quakes: Vec<Earthquake> = event.decode().unwrap();
        assert_eq!(quakes.len(), 1);
        assert!(quakes[0].closest_city.is_none());
        assert!(quakes[0].airports.is_empty());
        assert!(quakes[0].prediction.is_none());
    }

    #[test]
    fn decodes_failed_prediction() {
        let event = RealtimeEvent::PredictionResult(json!({
            "success": false,
            "error": "Models are not trained yet. Please train the models first.",
            "error_code": "MODEL_NOT_TRAINED"
        }));

        let prediction: AftershockPrediction = event.decode().unwrap();
        assert!(!prediction.success);
        assert_eq!(prediction.error_code.as_deref(), Some("MODEL_NOT_TRAINED"));
        assert_eq!(prediction.aftershock_magnitude(), None);
    }
}
