use crate::core::scoring::donation_points;
use crate::models::DonationRequest;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Errors that can occur when handing donations to the document store
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid facility id: {0:?}")]
    InvalidFacilityId(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// A validated donation request ready to be stored
#[derive(Debug, Clone, Serialize)]
pub struct DonationRecord {
    pub id: uuid::Uuid,
    #[serde(flatten)]
    pub request: DonationRequest,
    pub points: u64,
    pub submitted_at: DateTime<Utc>,
}

impl DonationRecord {
    pub fn from_request(
        request: DonationRequest,
        points_per_unit: u32,
    ) -> Result<Self, ValidationErrors> {
        request.validate()?;

        Ok(Self {
            id: uuid::Uuid::new_v4(),
            points: donation_points(request.quantity, points_per_unit),
            request,
            submitted_at: Utc::now(),
        })
    }

    /// Typed-value document body understood by the document store
    pub fn to_document(&self) -> Value {
        json!({ "fields": self.fields() })
    }

    fn fields(&self) -> Value {
        let r = &self.request;
        let quantity = match r.quantity {
            Some(q) => json!({ "integerValue": q.to_string() }),
            None => json!({ "nullValue": null }),
        };

        json!({
            "request_id": { "stringValue": self.id.to_string() },
            "food_description": { "stringValue": r.food_description },
            "food_type": { "stringValue": r.food_type },
            "reason": { "stringValue": r.reason },
            "date_leftover": { "stringValue": r.date_leftover },
            "latitude": { "doubleValue": r.latitude },
            "longitude": { "doubleValue": r.longitude },
            "quantity": quantity,
            "points": { "integerValue": self.points.to_string() },
            "timestamp": { "timestampValue": self.submitted_at.to_rfc3339() },
        })
    }
}

/// Where donation documents go
#[derive(Debug, Clone)]
pub struct DocumentStoreTarget {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection: String,
    /// Collection holding one document per food bank
    pub facility_collection: String,
    pub api_key: Option<String>,
}

/// Array field on a food bank document listing the requests sent to it
const FACILITY_REQUESTS_FIELD: &str = "food_requests";

/// REST client for the hosted document store holding donation requests
///
/// The match pipeline never touches this client; it only records what
/// donors submit.
pub struct DocumentStoreClient {
    target: DocumentStoreTarget,
    client: Client,
}

impl DocumentStoreClient {
    pub fn new(target: DocumentStoreTarget, timeout: Duration) -> Result<Self, DocumentStoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { target, client })
    }

    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.target.project_id, self.target.database_id
        )
    }

    fn endpoint(&self) -> &str {
        self.target.endpoint.trim_end_matches('/')
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}/documents/{}",
            self.endpoint(),
            self.database_path(),
            self.target.collection
        )
    }

    fn commit_url(&self) -> String {
        format!("{}/{}/documents:commit", self.endpoint(), self.database_path())
    }

    fn key_query(&self) -> Vec<(&'static str, &str)> {
        self.target
            .api_key
            .as_deref()
            .map(|key| vec![("key", key)])
            .unwrap_or_default()
    }

    async fn check_status(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, DocumentStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Failed to {}: {} - {}", context, status, body);

        Err(DocumentStoreError::ApiError {
            status: status.as_u16(),
            message: body,
        })
    }

    /// Store a donation record, returning the document id
    pub async fn submit(&self, record: &DonationRecord) -> Result<String, DocumentStoreError> {
        let url = self.collection_url();
        let document_id = record.id.to_string();

        tracing::debug!("Submitting donation {} to {}", document_id, url);

        let response = self
            .client
            .post(&url)
            .query(&[("documentId", document_id.as_str())])
            .query(&self.key_query())
            .json(&record.to_document())
            .send()
            .await?;

        let response = Self::check_status(response, "submit donation").await?;
        let json: Value = response.json().await?;

        let name = json
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| DocumentStoreError::InvalidResponse("Missing document name".into()))?;

        let id = name.rsplit('/').next().unwrap_or(name).to_string();

        tracing::info!(donation = %document_id, document = %id, points = record.points, "Donation submitted");

        Ok(id)
    }

    /// Append a donation to a food bank's request list
    ///
    /// Entries already on the list are left alone, so sending the same
    /// record twice is harmless. Returns the commit time.
    pub async fn attach_to_facility(
        &self,
        facility_id: &str,
        record: &DonationRecord,
    ) -> Result<String, DocumentStoreError> {
        if facility_id.is_empty() || facility_id.contains('/') {
            return Err(DocumentStoreError::InvalidFacilityId(facility_id.to_string()));
        }

        let document = format!(
            "{}/documents/{}/{}",
            self.database_path(),
            self.target.facility_collection,
            facility_id
        );
        let body = json!({
            "writes": [{
                "transform": {
                    "document": document,
                    "fieldTransforms": [{
                        "fieldPath": FACILITY_REQUESTS_FIELD,
                        "appendMissingElements": {
                            "values": [{ "mapValue": { "fields": record.fields() } }]
                        }
                    }]
                }
            }]
        });

        tracing::debug!("Attaching donation {} to {}", record.id, document);

        let response = self
            .client
            .post(self.commit_url())
            .query(&self.key_query())
            .json(&body)
            .send()
            .await?;

        let response = Self::check_status(response, "attach donation").await?;
        let json: Value = response.json().await?;

        let commit_time = json
            .get("commitTime")
            .and_then(|t| t.as_str())
            .ok_or_else(|| DocumentStoreError::InvalidResponse("Missing commit time".into()))?
            .to_string();

        tracing::info!(donation = %record.id, facility = facility_id, "Donation sent to food bank");

        Ok(commit_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn create_request() -> DonationRequest {
        DonationRequest {
            food_description: "Chapati and sabzi".to_string(),
            food_type: "cooked".to_string(),
            reason: "office canteen surplus".to_string(),
            date_leftover: "2024-11-02".to_string(),
            latitude: 19.0760,
            longitude: 72.8777,
            quantity: Some(5),
        }
    }

    fn create_client(endpoint: String, api_key: Option<&str>) -> DocumentStoreClient {
        DocumentStoreClient::new(
            DocumentStoreTarget {
                endpoint,
                project_id: "test-project".to_string(),
                database_id: "(default)".to_string(),
                collection: "food_requests".to_string(),
                facility_collection: "food_banks".to_string(),
                api_key: api_key.map(str::to_string),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_record_from_request() {
        let record = DonationRecord::from_request(create_request(), 10).unwrap();
        assert_eq!(record.points, 50);

        let doc = record.to_document();
        assert_eq!(doc["fields"]["food_type"]["stringValue"], "cooked");
        assert_eq!(doc["fields"]["quantity"]["integerValue"], "5");
        assert_eq!(doc["fields"]["latitude"]["doubleValue"], 19.0760);
    }

    #[test]
    fn test_record_rejects_invalid_request() {
        let mut request = create_request();
        request.reason.clear();
        assert!(DonationRecord::from_request(request, 10).is_err());
    }

    #[test]
    fn test_collection_url() {
        let client = create_client("https://docs.test/v1/".to_string(), None);
        assert_eq!(
            client.collection_url(),
            "https://docs.test/v1/projects/test-project/databases/(default)/documents/food_requests"
        );
    }

    #[tokio::test]
    async fn test_submit_returns_document_id() {
        let mut server = mockito::Server::new_async().await;
        let record = DonationRecord::from_request(create_request(), 10).unwrap();
        let name = format!(
            "projects/test-project/databases/(default)/documents/food_requests/{}",
            record.id
        );

        let mock = server
            .mock("POST", Matcher::Regex(r"/documents/food_requests$".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("documentId".into(), record.id.to_string()),
                Matcher::UrlEncoded("key".into(), "secret".into()),
            ]))
            .match_body(Matcher::PartialJson(json!({
                "fields": { "food_type": { "stringValue": "cooked" } }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "name": name }).to_string())
            .create_async()
            .await;

        let client = create_client(server.url(), Some("secret"));
        let id = client.submit(&record).await.unwrap();

        assert_eq!(id, record.id.to_string());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_attach_to_facility() {
        let mut server = mockito::Server::new_async().await;
        let record = DonationRecord::from_request(create_request(), 10).unwrap();

        let mock = server
            .mock("POST", "/projects/test-project/databases/(default)/documents:commit")
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .match_body(Matcher::PartialJson(json!({
                "writes": [{
                    "transform": {
                        "document": "projects/test-project/databases/(default)/documents/food_banks/mumbai-roti-ghar",
                        "fieldTransforms": [{ "fieldPath": "food_requests" }]
                    }
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"writeResults":[{}],"commitTime":"2024-11-02T10:00:00Z"}"#)
            .create_async()
            .await;

        let client = create_client(server.url(), Some("secret"));
        let committed = client.attach_to_facility("mumbai-roti-ghar", &record).await.unwrap();

        assert_eq!(committed, "2024-11-02T10:00:00Z");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_attach_rejects_bad_facility_id() {
        let client = create_client("http://127.0.0.1:9".to_string(), None);
        let record = DonationRecord::from_request(create_request(), 10).unwrap();

        for id in ["", "food_banks/other"] {
            let err = client.attach_to_facility(id, &record).await.unwrap_err();
            assert!(matches!(err, DocumentStoreError::InvalidFacilityId(_)));
        }
    }

    #[tokio::test]
    async fn test_attach_unknown_facility() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(404)
            .with_body("document not found")
            .create_async()
            .await;

        let client = create_client(server.url(), None);
        let record = DonationRecord::from_request(create_request(), 10).unwrap();

        match client.attach_to_facility("nowhere", &record).await {
            Err(DocumentStoreError::ApiError { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(403)
            .with_body("permission denied")
            .create_async()
            .await;

        let client = create_client(server.url(), None);
        let record = DonationRecord::from_request(create_request(), 10).unwrap();

        match client.submit(&record).await {
            Err(DocumentStoreError::ApiError { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "permission denied");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_missing_name() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let client = create_client(server.url(), None);
        let record = DonationRecord::from_request(create_request(), 10).unwrap();

        let err = client.submit(&record).await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidResponse(_)));
    }
}
