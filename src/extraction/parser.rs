//! Pure parsing of extraction service payloads.

use super::responses::{ErrorEnvelope, GenerateContentResponse};
use crate::algebras::ExtractionError;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::model::ExtractedRecord;
use serde_json::Value;

/// Concatenated text of the first candidate in a `generateContent` body.
pub fn candidate_text(body: &str, stage: &'static str) -> Result<String, ExtractionError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::MalformedResponse {
            reason: format!("{} (body: {})", e, preview(body)),
        })?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ExtractionError::EmptyResponse { stage });
    };
    let finish_reason = candidate.finish_reason;
    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        log::debug!(
            "No text in {} answer (finish reason: {})",
            stage,
            finish_reason.as_deref().unwrap_or("none")
        );
        return Err(ExtractionError::EmptyResponse { stage });
    }
    Ok(text)
}

/// Parses the structured answer into records.
///
/// The answer must be a JSON array of record objects, optionally wrapped in
/// a Markdown code fence. Records without a name or an address are
/// skipped; anything else that does not fit is a malformed response.
pub fn parse_records(text: &str) -> Result<Vec<ExtractedRecord>, ExtractionError> {
    let json = strip_code_fence(text);
    let value: Value = serde_json::from_str(json).map_err(|e| ExtractionError::MalformedResponse {
        reason: format!("not JSON: {} (text: {})", e, preview(text)),
    })?;

    let Value::Array(elements) = value else {
        return Err(ExtractionError::MalformedResponse {
            reason: format!("expected a JSON array, got: {}", preview(text)),
        });
    };

    let mut records = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        let record: ExtractedRecord =
            serde_json::from_value(element).map_err(|e| ExtractionError::MalformedResponse {
                reason: format!("record {}: {}", index, e),
            })?;
        if record.center_name.trim().is_empty() || record.address.trim().is_empty() {
            log::debug!("Skipping record {} without name or address", index);
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

/// Human-readable message for a non-success response body.
pub fn service_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        _ => preview(body),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let head: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_record_array() {
        let text = json!([
            {
                "centerName": "Ruby Hall Clinic",
                "address": "40 Sassoon Rd, Pune 411001",
                "contactDetails": "020 6645 5100",
                "doctorDetails": ["Dr. A. Kulkarni (Cardiology)"],
                "mapLink": "https://maps.google.com/?q=Ruby+Hall",
                "reasoning": "Sassoon Rd is in 411001"
            },
            {"centerName": "Jehangir Hospital", "address": "32 Sassoon Rd"}
        ])
        .to_string();

        let records = parse_records(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].doctor_details, vec!["Dr. A. Kulkarni (Cardiology)"]);
        assert_eq!(records[1], ExtractedRecord::new("Jehangir Hospital", "32 Sassoon Rd"));
    }

    #[test]
    fn accepts_fenced_json() {
        let text = "```json\n[{\"centerName\": \"A\", \"address\": \"1 Main Rd\"}]\n```";
        assert_eq!(parse_records(text).unwrap().len(), 1);
    }

    #[test]
    fn empty_array_is_no_records() {
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn object_is_malformed() {
        let err = parse_records(r#"{"centerName": "A", "address": "B"}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse { .. }));
    }

    #[test]
    fn prose_is_malformed() {
        let err = parse_records("I could not find any clinics.").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse { .. }));
    }

    #[test]
    fn wrong_field_types_are_malformed() {
        let err = parse_records(r#"[{"centerName": 7, "address": "B"}]"#).unwrap_err();
        assert!(err.to_string().contains("record 0"));
    }

    #[test]
    fn records_without_address_are_skipped() {
        let records =
            parse_records(r#"[{"centerName": "A", "address": " "}, {"centerName": "B", "address": "2 Main Rd"}]"#)
                .unwrap();
        assert_eq!(records, vec![ExtractedRecord::new("B", "2 Main Rd")]);
    }

    #[test]
    fn candidate_text_joins_parts() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "Ruby Hall, "}, {"text": "40 Sassoon Rd"}]}}]
        })
        .to_string();
        assert_eq!(candidate_text(&body, "search").unwrap(), "Ruby Hall, 40 Sassoon Rd");
    }

    #[test]
    fn missing_candidates_are_empty() {
        let err = candidate_text(r#"{"candidates": []}"#, "search").unwrap_err();
        assert_eq!(err, ExtractionError::EmptyResponse { stage: "search" });
    }

    #[test]
    fn service_error_prefers_envelope_message() {
        let body = r#"{"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            service_error_message(body),
            "Resource exhausted (RESOURCE_EXHAUSTED)"
        );
        assert_eq!(service_error_message("<html>bad gateway</html>"), "<html>bad gateway</html>");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let message = service_error_message(&body);
        assert_eq!(message.len(), ERROR_BODY_PREVIEW_LENGTH + 3);
    }
}
