// Service exports
pub mod diagnosis;
pub mod donations;

pub use diagnosis::{diagnose, recommendations_for, split_label, Classification, Classifier, Diagnosis, DiagnosisError};
pub use donations::{DocumentStoreClient, DocumentStoreError, DocumentStoreTarget, DonationRecord};
