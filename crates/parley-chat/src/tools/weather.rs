//! Weather tool backed by the open-meteo forecast API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::ChatError;
use crate::tools::Tool;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

/// Current weather and daily sunrise/sunset for a coordinate pair.
pub struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    latitude: f64,
    longitude: f64,
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "getWeather"
    }

    fn description(&self) -> &'static str {
        "Get the current weather at a location"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "latitude": { "type": "number" },
                "longitude": { "type": "number" }
            },
            "required": ["latitude", "longitude"]
        })
    }

    async fn execute(
        &self,
        _user_id: Uuid,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ChatError> {
        let args: WeatherArgs = serde_json::from_value(args)
            .map_err(|e| ChatError::ToolError(format!("Invalid weather arguments: {}", e)))?;

        if !(-90.0..=90.0).contains(&args.latitude) || !(-180.0..=180.0).contains(&args.longitude) {
            return Err(ChatError::ToolError(format!(
                "Coordinates out of range: {}, {}",
                args.latitude, args.longitude
            )));
        }

        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m&hourly=temperature_2m&daily=sunrise,sunset&timezone=auto",
            self.base_url.trim_end_matches('/'),
            args.latitude,
            args.longitude
        );

        debug!(latitude = args.latitude, longitude = args.longitude, "Weather lookup");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::ToolError(format!("Weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChatError::ToolError(format!(
                "Weather API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChatError::ToolError(format!("Invalid weather response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_malformed_arguments() {
        let tool = WeatherTool::new();
        let err = tool
            .execute(Uuid::new_v4(), serde_json::json!({"latitude": "north"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ToolError(_)));
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_coordinates() {
        let tool = WeatherTool::new();
        let err = tool
            .execute(
                Uuid::new_v4(),
                serde_json::json!({"latitude": 91.0, "longitude": 0.0}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_schema_requires_both_coordinates() {
        let tool = WeatherTool::new();
        let schema = tool.parameters();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
    }
}
