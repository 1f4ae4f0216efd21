use serde::{Deserialize, Serialize};

/// Successful lookup payload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationResponse {
    pub country: String,
    pub city: String,
}

/// Error payload shared by every non-2xx response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tracked_clients: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_response_uses_the_wire_field_names() {
        let body = LocationResponse {
            country: "Israel".to_string(),
            city: "Tel-Aviv".to_string(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"country": "Israel", "city": "Tel-Aviv"}));
    }

    #[test]
    fn test_error_body_round_trips() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"IP not found"}"#).unwrap();
        assert_eq!(body.error, "IP not found");
    }
}
