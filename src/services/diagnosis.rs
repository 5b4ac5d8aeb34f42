use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while diagnosing a plant photo
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("No image data provided")]
    EmptyImage,

    #[error("Classifier returned an invalid confidence: {0}")]
    InvalidConfidence(f64),

    #[error("Classifier failed: {0}")]
    Classifier(Box<dyn std::error::Error + Send + Sync>),
}

/// Raw output of an image classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    /// Probability of the winning class, in [0, 1]
    pub confidence: f64,
}

/// Externally provided image classifier
///
/// Model loading and inference live outside this crate; implementors map
/// an image to the label of the most likely class.
pub trait Classifier {
    type Error: std::error::Error + Send + Sync + 'static;

    fn classify(&self, image: &[u8]) -> Result<Classification, Self::Error>;
}

/// Plant and disease names with care advice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub plant: String,
    pub disease: String,
    /// Percent, 0 to 100
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

const UNKNOWN: &str = "Unknown";
const HEALTHY: &str = "Healthy";

const FALLBACK_RECOMMENDATIONS: &[&str] = &[
    "Ensure proper watering and sunlight.",
    "Apply appropriate pesticides/fungicides.",
    "Maintain proper soil health and nutrients.",
];

const RECOMMENDATIONS: &[(&str, &[&str])] = &[
    ("Apple_Apple_scab", &[
        "Disease: Apple Scab, a fungus causing dark, sunken lesions on leaves, fruit and stems.",
        "Watering: keep soil well drained and avoid overhead watering so spores do not splash.",
        "Nutrients: fertilize in balance, watching nitrogen; amend soil pH if needed.",
        "Pest control: watch for aphids and spider mites, which spread the disease.",
        "Treatment: apply neem oil or sulfur-based fungicide in early spring.",
    ]),
    ("Apple_Black_rot", &[
        "Disease: Black Rot, causing black lesions on fruit and early fruit drop.",
        "Watering: ensure good drainage; over-watering raises susceptibility.",
        "Nutrients: keep organic matter high and nitrogen balanced; avoid excess phosphorus.",
        "Pest control: manage aphids with insecticidal soap or horticultural oil.",
        "Treatment: use copper-based fungicide and prune infected parts regularly.",
    ]),
    ("Apple_Cedar_apple_rust", &[
        "Disease: Cedar Apple Rust, producing orange lesions on leaves and fruit.",
        "Watering: keep soil evenly moist without excess water.",
        "Nutrients: use a balanced fertilizer with extra potassium.",
        "Pest control: the disease spreads from cedar trees; remove nearby cedars if possible.",
        "Treatment: apply mancozeb or chlorothalonil during the growing season.",
    ]),
    ("Apple_healthy", &[
        "Healthy apple tree: keep watering and sun exposure steady for good fruit.",
        "Watering: water deeply but infrequently and mulch around the base.",
        "Nutrients: apply a balanced fertilizer in early spring.",
        "Pest control: inspect for codling moths and aphids; use neem oil as needed.",
        "Maintenance: prune to keep shape and remove dead or diseased branches.",
    ]),
    ("Blueberry_healthy", &[
        "Healthy blueberry: keep the soil acidic for a good yield.",
        "Watering: keep moisture consistent, ideally with drip irrigation.",
        "Nutrients: use fertilizer for acid-loving plants; avoid high nitrogen.",
        "Pest control: watch for aphids and spider mites.",
        "Maintenance: mulch to hold acidity and suppress weeds.",
    ]),
    ("Cherry(including_sour)_healthy", &[
        "Healthy cherry tree: give it full sun and well-drained soil.",
        "Watering: water regularly in dry spells without waterlogging.",
        "Nutrients: use a balanced NPK fertilizer and keep soil slightly acidic.",
        "Pest control: monitor aphids and fruit flies; row covers protect fruit.",
        "Maintenance: prune in late winter.",
    ]),
    ("Cherry(including_sour)_Powdery_mildew", &[
        "Disease: Powdery Mildew, a white powdery coating on leaves and stems.",
        "Watering: water at the base and keep leaves dry.",
        "Nutrients: keep nitrogen and potassium sufficient.",
        "Pest control: aphids spread mildew; use horticultural oil or insecticidal soap.",
        "Treatment: use sulfur-based fungicide or neem oil early.",
    ]),
    ("Corn(maize)_Cercospora_leaf_spot Gray_leaf_spot", &[
        "Disease: Cercospora Leaf Spot, irregular gray spots with dark borders.",
        "Watering: water early in the day so leaves dry before night.",
        "Nutrients: keep nitrogen adequate and add organic matter for drainage.",
        "Pest control: monitor aphids closely.",
        "Treatment: use chlorothalonil or copper-based fungicide.",
    ]),
    ("Corn(maize)_Common_rust", &[
        "Disease: Common Rust, orange pustules on leaves and stems.",
        "Watering: water evenly to avoid drought stress but avoid excess moisture.",
        "Nutrients: use a balanced NPK mix and avoid compacted soil.",
        "Pest control: corn borers and aphids spread rust.",
        "Treatment: tebuconazole manages common rust in corn.",
    ]),
];

/// Split a class label such as `Apple_Black_rot` into plant and disease
///
/// The first `_`-separated piece is the plant; the rest is the disease, or
/// `Healthy` when nothing follows.
pub fn split_label(label: &str) -> (String, String) {
    let mut pieces = label.split('_').filter(|p| !p.is_empty());

    let Some(plant) = pieces.next() else {
        return (UNKNOWN.to_string(), UNKNOWN.to_string());
    };

    let disease = pieces.collect::<Vec<_>>().join("_");
    let disease = if disease.is_empty() {
        HEALTHY.to_string()
    } else {
        disease
    };

    (plant.to_string(), disease)
}

/// Care advice for a plant/disease pair, generic advice when unknown
pub fn recommendations_for(plant: &str, disease: &str) -> Vec<String> {
    let key = format!("{}_{}", plant, disease);

    RECOMMENDATIONS
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, advice)| *advice)
        .unwrap_or(FALLBACK_RECOMMENDATIONS)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Classify a plant photo and attach care advice
pub fn diagnose<C: Classifier>(classifier: &C, image: &[u8]) -> Result<Diagnosis, DiagnosisError> {
    if image.is_empty() {
        return Err(DiagnosisError::EmptyImage);
    }

    let classification = classifier
        .classify(image)
        .map_err(|e| DiagnosisError::Classifier(Box::new(e)))?;

    if !(0.0..=1.0).contains(&classification.confidence) {
        return Err(DiagnosisError::InvalidConfidence(classification.confidence));
    }

    let (plant, disease) = split_label(&classification.label);
    let recommendations = recommendations_for(&plant, &disease);

    tracing::debug!(
        label = %classification.label,
        confidence = classification.confidence,
        "Plant diagnosis"
    );

    Ok(Diagnosis {
        plant,
        disease,
        confidence: classification.confidence * 100.0,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("model offline")]
    struct Offline;

    struct FixedClassifier(Result<Classification, ()>);

    impl Classifier for FixedClassifier {
        type Error = Offline;

        fn classify(&self, _image: &[u8]) -> Result<Classification, Self::Error> {
            self.0.clone().map_err(|_| Offline)
        }
    }

    fn fixed(label: &str, confidence: f64) -> FixedClassifier {
        FixedClassifier(Ok(Classification {
            label: label.to_string(),
            confidence,
        }))
    }

    #[test]
    fn test_split_label() {
        assert_eq!(
            split_label("Apple_Cedar_apple_rust"),
            ("Apple".to_string(), "Cedar_apple_rust".to_string())
        );
        assert_eq!(
            split_label("Tomato__Late_blight"),
            ("Tomato".to_string(), "Late_blight".to_string())
        );
        assert_eq!(split_label("Soybean"), ("Soybean".to_string(), "Healthy".to_string()));
        assert_eq!(split_label(""), ("Unknown".to_string(), "Unknown".to_string()));
    }

    #[test]
    fn test_known_recommendations() {
        let advice = recommendations_for("Apple", "Black_rot");
        assert_eq!(advice.len(), 5);
        assert!(advice[0].contains("Black Rot"));
    }

    #[test]
    fn test_fallback_recommendations() {
        let advice = recommendations_for("Tomato", "Leaf_Mold");
        assert_eq!(advice.len(), 3);
        assert_eq!(advice[0], "Ensure proper watering and sunlight.");
    }

    #[test]
    fn test_diagnose() {
        let diagnosis = diagnose(&fixed("Apple_Apple_scab", 0.87), b"jpeg bytes").unwrap();

        assert_eq!(diagnosis.plant, "Apple");
        assert_eq!(diagnosis.disease, "Apple_scab");
        assert!((diagnosis.confidence - 87.0).abs() < 1e-9);
        assert_eq!(diagnosis.recommendations.len(), 5);
    }

    #[test]
    fn test_empty_image_rejected() {
        let err = diagnose(&fixed("Apple_healthy", 0.9), b"").unwrap_err();
        assert!(matches!(err, DiagnosisError::EmptyImage));
    }

    #[test]
    fn test_bad_confidence_rejected() {
        let err = diagnose(&fixed("Apple_healthy", 1.5), b"img").unwrap_err();
        assert!(matches!(err, DiagnosisError::InvalidConfidence(_)));

        let err = diagnose(&fixed("Apple_healthy", f64::NAN), b"img").unwrap_err();
        assert!(matches!(err, DiagnosisError::InvalidConfidence(_)));
    }

    #[test]
    fn test_classifier_failure() {
        let err = diagnose(&FixedClassifier(Err(())), b"img").unwrap_err();
        assert!(matches!(err, DiagnosisError::Classifier(_)));
        assert_eq!(err.to_string(), "Classifier failed: model offline");
    }
}
