//! Prompt templates for the two extraction stages.

use crate::algebras::ExtractionError;
use crate::model::ExtractedRecord;
use crate::types::PostalCode;
use handlebars::Handlebars;
use serde_json::json;

const SEARCH_TEMPLATE: &str = "search";
const STRUCTURE_TEMPLATE: &str = "structure";

const SEARCH_PROMPT: &str = r#"Search the web for medical clinics, hospitals and diagnostic centers located in the area served by Indian postal code (PIN) {{code}}.
For each place give its name, full street address, phone numbers or other contact details, the doctors practising there with their specialities, and a Google Maps link when one exists.
{{#if known}}
These places are already recorded; do not list them again:
{{#each known}}
- {{this}}
{{/each}}
{{/if}}
Only include places whose address is inside PIN {{code}}."#;

const STRUCTURE_PROMPT: &str = r#"Convert the research notes below into a JSON array. Each element must be an object with these keys:
"centerName" (string), "address" (string), "contactDetails" (string), "doctorDetails" (array of strings), "mapLink" (string), "reasoning" (string explaining why the place belongs to PIN {{code}}).
Use an empty string or empty array when a value is unknown. Return [] when the notes contain no places.
{{#if known}}
Leave out any place at one of these addresses:
{{#each known}}
- {{this}}
{{/each}}
{{/if}}
Research notes:
{{notes}}"#;

/// Registered prompt templates. Built once per extractor.
pub struct PromptBook {
    registry: Handlebars<'static>,
}

impl PromptBook {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry.register_template_string(SEARCH_TEMPLATE, SEARCH_PROMPT)?;
        registry.register_template_string(STRUCTURE_TEMPLATE, STRUCTURE_PROMPT)?;
        Ok(Self { registry })
    }

    /// First stage: grounded search for places in `code`.
    pub fn search(
        &self,
        code: &PostalCode,
        known: &[ExtractedRecord],
    ) -> Result<String, ExtractionError> {
        self.render(
            SEARCH_TEMPLATE,
            &json!({ "code": code.as_str(), "known": known_names(known) }),
        )
    }

    /// Second stage: turn the search notes into records.
    pub fn structure(
        &self,
        code: &PostalCode,
        notes: &str,
        known: &[ExtractedRecord],
    ) -> Result<String, ExtractionError> {
        self.render(
            STRUCTURE_TEMPLATE,
            &json!({ "code": code.as_str(), "notes": notes, "known": known_addresses(known) }),
        )
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, ExtractionError> {
        self.registry
            .render(name, data)
            .map_err(|e| ExtractionError::Prompt(e.to_string()))
    }
}

fn known_names(known: &[ExtractedRecord]) -> Vec<String> {
    known
        .iter()
        .map(|r| format!("{}, {}", r.center_name, r.address))
        .collect()
}

fn known_addresses(known: &[ExtractedRecord]) -> Vec<&str> {
    known.iter().map(|r| r.address.as_str()).collect()
}
