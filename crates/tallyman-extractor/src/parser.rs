//! Parse classifier output into record fields

use crate::error::ExtractError;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

/// The five record keys the classifier must return, in contract order
const RECORD_KEYS: [&str; 5] = ["date", "merchant", "amount", "category", "description"];

/// Parsed record fields, before the dedup key and date fallback are applied
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordFields {
    /// `None` when the date value was empty or unparseable; the caller
    /// substitutes the source message's date
    pub date: Option<NaiveDate>,
    pub merchant: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
}

/// Parse a classifier response into record fields
///
/// The response must be a single JSON object with exactly the keys
/// `date, merchant, amount, category, description`. Code-fence markers are
/// stripped defensively first; models occasionally wrap JSON in markdown
/// despite the prompt.
pub(crate) fn parse_response(response: &str) -> Result<RecordFields, ExtractError> {
    let json_str = strip_fences(response);

    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractError::Parse(format!("{}", e)))?;

    let obj = json
        .as_object()
        .ok_or_else(|| ExtractError::Schema("expected a JSON object".to_string()))?;

    // Exactly the five contract keys: nothing missing, nothing extra
    for key in RECORD_KEYS {
        if !obj.contains_key(key) {
            return Err(ExtractError::Schema(format!("missing key '{}'", key)));
        }
    }
    if let Some(extra) = obj.keys().find(|k| !RECORD_KEYS.contains(&k.as_str())) {
        return Err(ExtractError::Schema(format!("unexpected key '{}'", extra)));
    }

    Ok(RecordFields {
        date: parse_date(&obj["date"]),
        merchant: string_field(obj, "merchant")?,
        amount: parse_amount(&obj["amount"])?,
        category: string_field(obj, "category")?,
        description: string_field(obj, "description")?,
    })
}

/// Remove markdown code-fence markers wherever they appear
fn strip_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn string_field(
    obj: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<String, ExtractError> {
    obj[key]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ExtractError::Schema(format!("'{}' is not a string", key)))
}

/// Accept a JSON number or a numeric string; currency symbols are a
/// contract violation
fn parse_amount(value: &Value) -> Result<f64, ExtractError> {
    if let Some(n) = value.as_f64() {
        return Ok(n);
    }
    if let Some(s) = value.as_str() {
        return s
            .trim()
            .parse::<f64>()
            .map_err(|_| ExtractError::Schema(format!("'amount' is not numeric: {:?}", s)));
    }
    Err(ExtractError::Schema("'amount' is not numeric".to_string()))
}

/// Best-effort ISO date; unusable values fall back to the message date
fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Unparseable date '{}' from classifier: {}", s, e);
            None
        }
    }
}
