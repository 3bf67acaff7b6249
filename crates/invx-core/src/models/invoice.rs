//! Invoice record models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::StoredFile;

/// Placeholder for a field that could not be determined.
pub const MISSING: &str = "⚠️ MISSING";

/// The six fields every invoice record exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    /// Transaction/invoice date (DD/MM/YYYY).
    Date,
    /// Australian Business Number.
    Abn,
    /// Total amount including GST.
    AmountIncGst,
    /// GST amount.
    Gst,
    /// What was purchased.
    Description,
    /// Expense category.
    Category,
}

impl CanonicalField {
    /// All fields in export column order.
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Date,
        CanonicalField::Abn,
        CanonicalField::AmountIncGst,
        CanonicalField::Gst,
        CanonicalField::Description,
        CanonicalField::Category,
    ];

    /// Canonical JSON key.
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Abn => "abn",
            CanonicalField::AmountIncGst => "amount_inc_gst",
            CanonicalField::Gst => "gst",
            CanonicalField::Description => "description",
            CanonicalField::Category => "category",
        }
    }

    /// Column header used in CSV export.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::Date => "Date",
            CanonicalField::Abn => "ABN",
            CanonicalField::AmountIncGst => "Amount (inc. GST)",
            CanonicalField::Gst => "GST",
            CanonicalField::Description => "Description",
            CanonicalField::Category => "Category",
        }
    }

    /// Whether the field holds a dollar amount.
    pub fn is_currency(&self) -> bool {
        matches!(self, CanonicalField::AmountIncGst | CanonicalField::Gst)
    }

    /// Parse a field key as sent by an editing client.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "date" => Some(CanonicalField::Date),
            "abn" => Some(CanonicalField::Abn),
            "amount_inc_gst" | "amount" | "amountIncGst" => Some(CanonicalField::AmountIncGst),
            "gst" => Some(CanonicalField::Gst),
            "description" => Some(CanonicalField::Description),
            "category" => Some(CanonicalField::Category),
            _ => None,
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The six editable invoice fields.
///
/// Values are free text: extraction may produce placeholders that are not
/// valid numbers or dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    pub date: String,
    pub abn: String,
    pub amount_inc_gst: String,
    pub gst: String,
    pub description: String,
    pub category: String,
}

impl InvoiceFields {
    /// A record with every field set to the sentinel.
    pub fn missing() -> Self {
        Self {
            date: MISSING.to_string(),
            abn: MISSING.to_string(),
            amount_inc_gst: MISSING.to_string(),
            gst: MISSING.to_string(),
            description: MISSING.to_string(),
            category: MISSING.to_string(),
        }
    }

    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Date => &self.date,
            CanonicalField::Abn => &self.abn,
            CanonicalField::AmountIncGst => &self.amount_inc_gst,
            CanonicalField::Gst => &self.gst,
            CanonicalField::Description => &self.description,
            CanonicalField::Category => &self.category,
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CanonicalField::Date => self.date = value,
            CanonicalField::Abn => self.abn = value,
            CanonicalField::AmountIncGst => self.amount_inc_gst = value,
            CanonicalField::Gst => self.gst = value,
            CanonicalField::Description => self.description = value,
            CanonicalField::Category => self.category = value,
        }
    }

    /// Fields a reviewer should look at: sentinel or blank values.
    pub fn flagged(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| {
                let value = self.get(*f).trim();
                value.is_empty() || value == MISSING
            })
            .collect()
    }

    /// True when no field needs review.
    pub fn is_complete(&self) -> bool {
        self.flagged().is_empty()
    }
}

/// Terminal status of a record; failed items never produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Done,
}

/// One successfully extracted invoice, held for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Record identifier, independent of the batch item id.
    pub id: String,

    /// Name assigned by the storage gateway.
    pub stored_file_name: String,

    /// Name of the file as uploaded.
    pub original_name: String,

    /// Path the stored image is served from.
    pub image_ref: String,

    /// Extracted (and possibly user-edited) fields.
    #[serde(flatten)]
    pub fields: InvoiceFields,

    #[serde(default)]
    pub status: RecordStatus,
}

impl InvoiceRecord {
    /// Create a record for a stored file and its extracted fields.
    pub fn new(stored: StoredFile, fields: InvoiceFields) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stored_file_name: stored.unique_name,
            original_name: stored.original_name,
            image_ref: stored.retrieval_path,
            fields,
            status: RecordStatus::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> StoredFile {
        StoredFile {
            unique_name: "0a1b2c3d_receipt.jpg".to_string(),
            original_name: "receipt.jpg".to_string(),
            retrieval_path: "/uploaded_files/0a1b2c3d_receipt.jpg".to_string(),
        }
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in CanonicalField::ALL {
            assert_eq!(CanonicalField::from_key(field.key()), Some(field));
        }
        assert_eq!(CanonicalField::from_key("amount"), Some(CanonicalField::AmountIncGst));
        assert_eq!(CanonicalField::from_key("vendor"), None);
    }

    #[test]
    fn test_flagged_fields() {
        let mut fields = InvoiceFields::missing();
        assert_eq!(fields.flagged().len(), 6);

        fields.set(CanonicalField::Date, "01/02/2025");
        fields.set(CanonicalField::Abn, "  ");
        let flagged = fields.flagged();
        assert!(!flagged.contains(&CanonicalField::Date));
        assert!(flagged.contains(&CanonicalField::Abn));
        assert!(!fields.is_complete());
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut fields = InvoiceFields::missing();
        fields.set(CanonicalField::Gst, "$1.00");
        let record = InvoiceRecord::new(stored(), fields);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["gst"], "$1.00");
        assert_eq!(json["date"], MISSING);
        assert_eq!(json["stored_file_name"], "0a1b2c3d_receipt.jpg");
        assert_eq!(json["image_ref"], "/uploaded_files/0a1b2c3d_receipt.jpg");
        assert_eq!(json["status"], "done");
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = InvoiceRecord::new(stored(), InvoiceFields::missing());
        let b = InvoiceRecord::new(stored(), InvoiceFields::missing());
        assert_ne!(a.id, b.id);
    }
}
