//! Card holder registry entries.

use serde::{Deserialize, Serialize};

use crate::types::CardId;

/// A registered card holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardHolder {
    pub card_id: CardId,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_number: Option<String>,
    /// Manual correction in hours, added to reported business time.
    #[serde(default)]
    pub offset_hours: f64,
}

impl CardHolder {
    /// Creates a non-admin holder with no offset.
    pub fn new(card_id: CardId, name: impl Into<String>) -> Self {
        Self {
            card_id,
            name: name.into(),
            is_admin: false,
            student_number: None,
            offset_hours: 0.0,
        }
    }
}
