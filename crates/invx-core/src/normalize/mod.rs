//! Field normalization for raw model output.
//!
//! The model may answer with either of several key names per field, omit
//! fields, or return amounts as numbers or strings. Normalization maps all
//! of that onto the six canonical fields and never fails.

pub mod currency;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::invoice::{CanonicalField, InvoiceFields, MISSING};

pub use currency::{format_currency, parse_amount};

/// A model output value, classified before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A JSON number.
    Numeric(Decimal),
    /// A non-empty string (trimmed) or any other non-null JSON value.
    Text(String),
    /// Missing, null or blank.
    Absent,
}

impl RawValue {
    /// Classify a JSON value.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawValue::Absent,
            Some(Value::Number(n)) => {
                let text = n.to_string();
                text.parse::<Decimal>()
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(RawValue::Numeric)
                    .unwrap_or(RawValue::Text(text))
            }
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    RawValue::Absent
                } else {
                    RawValue::Text(trimmed.to_string())
                }
            }
            Some(other) => RawValue::Text(other.to_string()),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, RawValue::Absent)
    }
}

/// Keys accepted for each canonical field, tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub date: Vec<String>,
    pub abn: Vec<String>,
    pub amount_inc_gst: Vec<String>,
    pub gst: Vec<String>,
    pub description: Vec<String>,
    pub category: Vec<String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        fn keys(list: &[&str]) -> Vec<String> {
            list.iter().map(|k| k.to_string()).collect()
        }

        Self {
            date: keys(&["date", "invoice_date"]),
            abn: keys(&["abn", "abn_number"]),
            amount_inc_gst: keys(&["amount_inc_gst", "total_amount", "amount"]),
            gst: keys(&["gst", "gst_amount"]),
            description: keys(&["description", "item_description"]),
            category: keys(&["category", "expense_category"]),
        }
    }
}

impl AliasTable {
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Date => &self.date,
            CanonicalField::Abn => &self.abn,
            CanonicalField::AmountIncGst => &self.amount_inc_gst,
            CanonicalField::Gst => &self.gst,
            CanonicalField::Description => &self.description,
            CanonicalField::Category => &self.category,
        }
    }
}

/// Maps raw model output onto [`InvoiceFields`].
#[derive(Debug, Clone, Default)]
pub struct FieldNormalizer {
    aliases: AliasTable,
}

impl FieldNormalizer {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// Normalize a raw mapping. Every field is populated.
    pub fn normalize(&self, raw: &Map<String, Value>) -> InvoiceFields {
        let mut fields = InvoiceFields::missing();
        for field in CanonicalField::ALL {
            fields.set(field, normalize_value(field, self.lookup(raw, field)));
        }
        fields
    }

    /// First alias holding a usable value.
    fn lookup(&self, raw: &Map<String, Value>, field: CanonicalField) -> RawValue {
        self.aliases
            .aliases(field)
            .iter()
            .map(|key| RawValue::from_json(raw.get(key)))
            .find(|value| !value.is_absent())
            .unwrap_or(RawValue::Absent)
    }
}

/// Render one classified value as the stored field text.
pub fn normalize_value(field: CanonicalField, value: RawValue) -> String {
    match value {
        RawValue::Absent => MISSING.to_string(),
        RawValue::Numeric(n) if field.is_currency() => format_currency(n),
        RawValue::Numeric(n) => n.normalize().to_string(),
        RawValue::Text(s) if field.is_currency() && !s.starts_with('$') => {
            parse_amount(&s).map(format_currency).unwrap_or(s)
        }
        RawValue::Text(s) => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty_mapping_is_all_missing() {
        let fields = FieldNormalizer::default().normalize(&Map::new());
        assert_eq!(fields, InvoiceFields::missing());
    }

    #[test]
    fn test_canonical_record_is_unchanged() {
        let raw = map(json!({
            "date": "15/03/2025",
            "abn": "51 824 753 556",
            "amount_inc_gst": "$42.90",
            "gst": "$3.90",
            "description": "Unleaded fuel 25L",
            "category": "Fuel"
        }));

        let fields = FieldNormalizer::default().normalize(&raw);

        assert_eq!(
            fields,
            InvoiceFields {
                date: "15/03/2025".to_string(),
                abn: "51 824 753 556".to_string(),
                amount_inc_gst: "$42.90".to_string(),
                gst: "$3.90".to_string(),
                description: "Unleaded fuel 25L".to_string(),
                category: "Fuel".to_string(),
            }
        );

        let again = FieldNormalizer::default().normalize(&map(serde_json::to_value(&fields).unwrap()));
        assert_eq!(again, fields);
    }

    #[test]
    fn test_currency_coercion() {
        let normalizer = FieldNormalizer::default();

        let fields = normalizer.normalize(&map(json!({ "amount_inc_gst": 42.9, "gst": "3.9" })));
        assert_eq!(fields.amount_inc_gst, "$42.90");
        assert_eq!(fields.gst, "$3.90");

        let fields = normalizer.normalize(&map(json!({ "amount_inc_gst": "42.9", "gst": "N/A" })));
        assert_eq!(fields.amount_inc_gst, "$42.90");
        assert_eq!(fields.gst, "N/A");
    }

    #[test]
    fn test_alias_keys() {
        let raw = map(json!({
            "total_amount": 110,
            "gst_amount": 10,
            "invoice_date": "01/07/2025"
        }));

        let fields = FieldNormalizer::default().normalize(&raw);
        assert_eq!(fields.amount_inc_gst, "$110.00");
        assert_eq!(fields.gst, "$10.00");
        assert_eq!(fields.date, "01/07/2025");
        assert_eq!(fields.abn, MISSING);
    }

    #[test]
    fn test_first_non_empty_alias_wins() {
        let raw = map(json!({ "amount_inc_gst": "", "total_amount": "19.95" }));
        let fields = FieldNormalizer::default().normalize(&raw);
        assert_eq!(fields.amount_inc_gst, "$19.95");
    }

    #[test]
    fn test_blank_and_null_become_missing() {
        let raw = map(json!({ "date": "   ", "abn": null, "category": "Transport" }));
        let fields = FieldNormalizer::default().normalize(&raw);
        assert_eq!(fields.date, MISSING);
        assert_eq!(fields.abn, MISSING);
        assert_eq!(fields.category, "Transport");
    }

    #[test]
    fn test_custom_aliases() {
        let mut aliases = AliasTable::default();
        aliases.description = vec!["summary".to_string()];

        let raw = map(json!({ "description": "ignored", "summary": "Printer paper" }));
        let fields = FieldNormalizer::new(aliases).normalize(&raw);
        assert_eq!(fields.description, "Printer paper");
    }

    #[test]
    fn test_non_currency_numbers_are_rendered_plainly() {
        let raw = map(json!({ "abn": 51824753556u64 }));
        let fields = FieldNormalizer::default().normalize(&raw);
        assert_eq!(fields.abn, "51824753556");
    }

    #[test]
    fn test_raw_value_classification() {
        assert_eq!(RawValue::from_json(None), RawValue::Absent);
        assert_eq!(RawValue::from_json(Some(&json!(null))), RawValue::Absent);
        assert_eq!(
            RawValue::from_json(Some(&json!(" Fuel "))),
            RawValue::Text("Fuel".to_string())
        );
        assert_eq!(
            RawValue::from_json(Some(&json!(true))),
            RawValue::Text("true".to_string())
        );
        assert!(matches!(RawValue::from_json(Some(&json!(1.5))), RawValue::Numeric(_)));
    }
}
