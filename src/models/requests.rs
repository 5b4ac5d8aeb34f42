use serde::{Deserialize, Serialize};
use validator::Validate;

/// Donation of leftover food submitted by a donor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DonationRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "foodDescription", alias = "food_description")]
    pub food_description: String,
    #[validate(length(min = 1))]
    #[serde(rename = "foodType", alias = "food_type")]
    pub food_type: String,
    #[validate(length(min = 1))]
    pub reason: String,
    #[serde(rename = "dateLeftover", alias = "date_leftover")]
    pub date_leftover: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub quantity: Option<u32>,
}
