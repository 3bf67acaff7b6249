//! CSV export of invoice records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{InvxError, Result};
use crate::models::invoice::{CanonicalField, InvoiceFields, InvoiceRecord};

/// One exported CSV line.
///
/// Deserializes from session records and from client payloads, which may
/// send the total as `amount`. Absent or null fields export as empty cells;
/// numbers and booleans export as their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRow {
    #[serde(deserialize_with = "cell")]
    pub date: String,
    #[serde(deserialize_with = "cell")]
    pub abn: String,
    #[serde(alias = "amount", alias = "amountIncGst", deserialize_with = "cell")]
    pub amount_inc_gst: String,
    #[serde(deserialize_with = "cell")]
    pub gst: String,
    #[serde(deserialize_with = "cell")]
    pub description: String,
    #[serde(deserialize_with = "cell")]
    pub category: String,
}

fn cell<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl ExportRow {
    fn cells(&self) -> [&str; 6] {
        [
            &self.date,
            &self.abn,
            &self.amount_inc_gst,
            &self.gst,
            &self.description,
            &self.category,
        ]
    }
}

impl From<&InvoiceFields> for ExportRow {
    fn from(fields: &InvoiceFields) -> Self {
        Self {
            date: fields.date.clone(),
            abn: fields.abn.clone(),
            amount_inc_gst: fields.amount_inc_gst.clone(),
            gst: fields.gst.clone(),
            description: fields.description.clone(),
            category: fields.category.clone(),
        }
    }
}

impl From<&InvoiceRecord> for ExportRow {
    fn from(record: &InvoiceRecord) -> Self {
        Self::from(&record.fields)
    }
}

/// Render rows as CSV text with a header line.
pub fn write_csv(rows: &[ExportRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record(CanonicalField::ALL.iter().map(|f| f.label()))?;
    for row in rows {
        writer.write_record(row.cells())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| InvxError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| InvxError::Validation(e.to_string()))
}

/// Read the `invoices` array from an export request body.
pub fn rows_from_json(body: &Value) -> Result<Vec<ExportRow>> {
    let Some(invoices) = body.get("invoices").and_then(Value::as_array) else {
        return Err(InvxError::Validation(
            "Invoices array is required".to_string(),
        ));
    };

    // Entries that are not objects carry no fields and export as blank rows.
    invoices
        .iter()
        .map(|v| match v {
            Value::Object(_) => serde_json::from_value(v.clone()).map_err(InvxError::from),
            _ => Ok(ExportRow::default()),
        })
        .collect()
}

/// Download name for an export produced at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("invoices-{}.csv", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(description: &str) -> ExportRow {
        ExportRow {
            date: "15/03/2025".to_string(),
            abn: "51 824 753 556".to_string(),
            amount_inc_gst: "$110.00".to_string(),
            gst: "$10.00".to_string(),
            description: description.to_string(),
            category: "Office Supplies".to_string(),
        }
    }

    #[test]
    fn test_header_only() {
        let csv = write_csv(&[]).unwrap();
        assert_eq!(csv, "Date,ABN,Amount (inc. GST),GST,Description,Category\n");
    }

    #[test]
    fn test_plain_row() {
        let csv = write_csv(&[row("Paper")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "15/03/2025,51 824 753 556,$110.00,$10.00,Paper,Office Supplies"
        );
    }

    #[test]
    fn test_quotes_are_doubled() {
        let csv = write_csv(&[row(r#"He said "hi""#)]).unwrap();
        assert!(csv.contains(r#","He said ""hi""",Office Supplies"#));
    }

    #[test]
    fn test_commas_are_quoted() {
        let csv = write_csv(&[row("Pens, paper")]).unwrap();
        assert!(csv.contains(r#","Pens, paper","#));
    }

    #[test]
    fn test_rows_from_json() {
        let body = json!({
            "invoices": [
                {"date": "01/01/2025", "amount": "$5.00", "description": "Coffee"},
                {"amount_inc_gst": "$7.00", "id": "ignored"}
            ]
        });
        let rows = rows_from_json(&body).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount_inc_gst, "$5.00");
        assert_eq!(rows[0].abn, "");
        assert_eq!(rows[1].amount_inc_gst, "$7.00");
    }

    #[test]
    fn test_rows_from_json_tolerates_non_string_cells() {
        let body = json!({
            "invoices": [
                {"date": "01/01/2025", "gst": null, "amount": 5.5, "category": true},
                "not an invoice"
            ]
        });
        let rows = rows_from_json(&body).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].gst, "");
        assert_eq!(rows[0].amount_inc_gst, "5.5");
        assert_eq!(rows[0].category, "true");
        assert_eq!(rows[1], ExportRow::default());

        let csv = write_csv(&rows).unwrap();
        assert_eq!(csv.lines().nth(1).unwrap(), "01/01/2025,,5.5,,,true");
    }

    #[test]
    fn test_rows_from_json_requires_array() {
        for body in [json!({}), json!({"invoices": "nope"}), json!([])] {
            let err = rows_from_json(&body).unwrap_err();
            assert_eq!(err.to_string(), "Invoices array is required");
        }
    }

    #[test]
    fn test_export_file_name() {
        let now = DateTime::from_timestamp_millis(1_736_000_000_123).unwrap();
        assert_eq!(export_file_name(now), "invoices-1736000000123.csv");
    }
}
