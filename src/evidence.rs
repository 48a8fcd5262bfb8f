//! Evidence loading: structural validation at the engine boundary

use crate::{EvidenceByFamily, Error, Result};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Path value that means "read evidence from stdin"
pub const STDIN_PATH: &str = "-";

/// Parse an evidence document: a JSON object mapping family ids to lists of
/// `{ "base_score": number, "enhancement": string }` records.
///
/// Shape violations are reported as bad input; they are never defaulted.
pub fn parse_evidence(content: &str) -> Result<EvidenceByFamily> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| Error::malformed(e.to_string()))?;
    evidence_from_value(value)
}

/// Convert an already-decoded JSON value into evidence
pub fn evidence_from_value(value: serde_json::Value) -> Result<EvidenceByFamily> {
    match &value {
        serde_json::Value::Object(map) if map.is_empty() => return Err(Error::EmptyAssessment),
        serde_json::Value::Object(_) => {}
        serde_json::Value::Null => return Err(Error::EmptyAssessment),
        other => {
            return Err(Error::malformed(format!(
                "expected an object of control families, got {}",
                json_kind(other)
            )))
        }
    }

    serde_json::from_value(value).map_err(|e| Error::malformed(e.to_string()))
}

/// Read and parse an evidence file, or stdin for `-`
pub fn load_evidence(path: &Path) -> Result<EvidenceByFamily> {
    let content = if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    parse_evidence(&content)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
