//! The extraction capability: turn one postal code into records.

use super::error::ExtractionError;
use crate::model::ExtractedRecord;
use crate::types::PostalCode;
use async_trait::async_trait;

/// Looks up clinics for a postal code.
///
/// `known` carries the records the group already holds, so an
/// implementation can steer the service away from repeating them. The
/// orchestrator deduplicates the returned batch regardless.
///
/// # Laws
///
/// - **L1 (Independence)**: calls for different codes may run concurrently
///   and do not observe each other.
/// - **L2 (No side effects on failure)**: an `Err` means no records were
///   produced for this attempt; the caller may simply try again.
///
/// This trait is **object-safe** and can be used as `dyn Extractor`.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        code: &PostalCode,
        known: &[ExtractedRecord],
    ) -> Result<Vec<ExtractedRecord>, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Returns one record per call, addressed after the code.
    struct EchoExtractor;

    #[async_trait]
    impl Extractor for EchoExtractor {
        async fn extract(
            &self,
            code: &PostalCode,
            known: &[ExtractedRecord],
        ) -> Result<Vec<ExtractedRecord>, ExtractionError> {
            if code.as_str() == "000000" {
                return Err(ExtractionError::EmptyResponse { stage: "grounding" });
            }
            Ok(vec![ExtractedRecord::new(
                format!("Clinic {}", known.len()),
                format!("{} Main Rd", code),
            )])
        }
    }

    #[tokio::test]
    async fn law_l1_concurrent_calls_are_independent() {
        let extractor: Arc<dyn Extractor> = Arc::new(EchoExtractor);
        let a = PostalCode::parse("411001").unwrap();
        let b = PostalCode::parse("411002").unwrap();

        let (ra, rb) = tokio::join!(extractor.extract(&a, &[]), extractor.extract(&b, &[]));
        assert_eq!(ra.unwrap()[0].address, "411001 Main Rd");
        assert_eq!(rb.unwrap()[0].address, "411002 Main Rd");
    }

    #[tokio::test]
    async fn law_l2_failure_can_be_retried() {
        let extractor = Arc::new(EchoExtractor);
        let code = PostalCode::parse("000000").unwrap();
        assert!(extractor.extract(&code, &[]).await.is_err());
        assert!(extractor.extract(&code, &[]).await.is_err());
    }
}
