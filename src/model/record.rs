use serde::{Deserialize, Serialize};

/// One clinic or center found for a postal code.
///
/// Field names follow the extraction service's JSON so records can be
/// parsed straight from the structured response and echoed back to it as
/// known results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    pub center_name: String,
    pub address: String,
    #[serde(default)]
    pub contact_details: String,
    #[serde(default)]
    pub doctor_details: Vec<String>,
    #[serde(default)]
    pub map_link: String,
    #[serde(default)]
    pub reasoning: String,
}

impl ExtractedRecord {
    /// A record with only the identifying fields set.
    pub fn new(center_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            center_name: center_name.into(),
            address: address.into(),
            contact_details: String::new(),
            doctor_details: Vec::new(),
            map_link: String::new(),
            reasoning: String::new(),
        }
    }
}
