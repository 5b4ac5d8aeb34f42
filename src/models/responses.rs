use serde::Serialize;
use crate::core::error::{ErrorKind, LocatorError};
use crate::core::matcher::MatchResult;
use crate::models::domain::RankedMatch;

/// Outcome of a nearby search, tagged so that an empty list can never be
/// mistaken for a failure
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NearbyResponse {
    Ok {
        matches: Vec<RankedMatch>,
        #[serde(rename = "radiusKm")]
        radius_km: f64,
        #[serde(rename = "totalResults")]
        total_results: usize,
    },
    Error {
        error: ErrorKind,
        message: String,
    },
}

impl NearbyResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, NearbyResponse::Ok { .. })
    }
}

impl From<Result<MatchResult, LocatorError>> for NearbyResponse {
    fn from(result: Result<MatchResult, LocatorError>) -> Self {
        match result {
            Ok(result) => NearbyResponse::Ok {
                total_results: result.matches.len(),
                radius_km: result.radius_km,
                matches: result.matches,
            },
            Err(e) => NearbyResponse::Error {
                error: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

/// Result of handing a donation request to the document store
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub points: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_ok() {
        let result = MatchResult {
            matches: vec![],
            radius_km: 50.0,
            considered: 3,
            skipped: vec![],
        };
        let response = NearbyResponse::from(Ok(result));
        assert!(response.is_ok());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["totalResults"], 0);
        assert_eq!(json["radiusKm"], 50.0);
        assert!(json.get("total_results").is_none());
        assert!(json["matches"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_error_is_tagged() {
        let response = NearbyResponse::from(Err(LocatorError::InvalidCoordinate {
            latitude: 200.0,
            longitude: 0.0,
        }));
        assert!(!response.is_ok());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "invalid_coordinate");
        assert!(json.get("matches").is_none());
    }
}
