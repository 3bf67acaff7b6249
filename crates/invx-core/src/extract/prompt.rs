//! Prompt text and model reply parsing.

use serde_json::{Map, Value};

use crate::error::ExtractionError;

/// Default system instruction describing the six target fields.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You extract data from Australian business invoices and receipts.

From the invoice or receipt image, extract:
1. Date - the transaction or invoice date, formatted DD/MM/YYYY
2. ABN - the 11 digit Australian Business Number, spaces allowed
3. Amount (including GST) - the total paid or charged, including GST
4. GST - the GST/tax amount if shown separately
5. Description - a short summary of the items or services purchased
6. Category - an expense category such as Fuel, Food & Dining, Office Supplies, Transport or Accommodation

Answer with a JSON object of exactly this shape:
{
    "date": "DD/MM/YYYY",
    "abn": "XX XXX XXX XXX",
    "amount_inc_gst": "$XX.XX",
    "gst": "$X.XX",
    "description": "Brief description of items/services",
    "category": "Category name"
}

Rules:
- If no ABN is printed, set abn to "Not found"
- If GST is not shown separately, calculate it as total / 11 (10% Australian GST)
- Keep the description short but informative
- Pick the category that best fits the merchant and items
- Write amounts in Australian dollars with a $ sign"#;

/// Default per-image instruction requesting strict JSON.
pub const DEFAULT_USER_PROMPT: &str = r#"Extract the invoice data from this image using the JSON format above.

- Date as DD/MM/YYYY
- ABN (11 digits, usually written XX XXX XXX XXX)
- Total amount including GST
- GST amount, extracted or calculated
- Short summary of the purchase
- Expense category

Return ONLY the JSON object, with no other text."#;

/// Remove a markdown code fence around the model reply, if present.
///
/// Handles ```` ```json ```` and bare ```` ``` ```` fences as well as text
/// before the opening fence. Text without a fence is returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let body = trimmed[open + 3..].trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let end = body.find("```").unwrap_or(body.len());
    body[..end].trim()
}

/// Parse the model reply into a raw field mapping.
pub fn parse_fields_json(text: &str) -> Result<Map<String, Value>, ExtractionError> {
    let json = strip_code_fence(text);
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ExtractionError::Parse {
            raw: json.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"{"date":"01/01/2025","abn":"51 824 753 556","gst":"$1.00"}"#;

    #[test]
    fn test_strip_json_fence() {
        let fenced = format!("```json\n{}\n```", PLAIN);
        assert_eq!(strip_code_fence(&fenced), PLAIN);
    }

    #[test]
    fn test_strip_bare_fence() {
        let fenced = format!("```\n{}\n```\n", PLAIN);
        assert_eq!(strip_code_fence(&fenced), PLAIN);
    }

    #[test]
    fn test_strip_fence_with_preamble() {
        let fenced = format!("Here is the data:\n```json\n{}\n```\nLet me know!", PLAIN);
        assert_eq!(strip_code_fence(&fenced), PLAIN);
    }

    #[test]
    fn test_unfenced_text_is_trimmed() {
        assert_eq!(strip_code_fence(&format!("  {}\n", PLAIN)), PLAIN);
    }

    #[test]
    fn test_fenced_and_plain_parse_identically() {
        let fenced = format!("```json\n{}\n```", PLAIN);
        assert_eq!(parse_fields_json(&fenced).unwrap(), parse_fields_json(PLAIN).unwrap());
    }

    #[test]
    fn test_parse_failure_keeps_raw_text() {
        let err = parse_fields_json("```json\nnot json\n```").unwrap_err();
        match err {
            ExtractionError::Parse { raw } => assert_eq!(raw, "not json"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            parse_fields_json("I could not read this image").unwrap_err().to_string(),
            "Failed to parse JSON response"
        );
    }

    #[test]
    fn test_non_object_json_is_a_parse_failure() {
        assert!(matches!(
            parse_fields_json("[1, 2, 3]"),
            Err(ExtractionError::Parse { .. })
        ));
    }
}
