//! Wire types for the Sheets REST v4 endpoints in use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::RangeWrite;

/// `GET /v4/spreadsheets/{id}?fields=sheets.properties.title`
#[derive(Debug, Default, Deserialize)]
pub struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SheetProperties {
    pub title: String,
}

/// Body and response of the `values` endpoints.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// `POST /v4/spreadsheets/{id}/values:batchUpdate`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValuesRequest<'a> {
    pub value_input_option: &'static str,
    pub data: &'a [RangeWrite],
}

/// `POST /v4/spreadsheets/{id}:batchUpdate` carrying a single `addSheet`.
#[derive(Debug, Serialize)]
pub struct AddSheetRequest {
    pub requests: Vec<AddSheetEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSheetEntry {
    pub add_sheet: AddSheet,
}

#[derive(Debug, Serialize)]
pub struct AddSheet {
    pub properties: SheetProperties,
}

impl AddSheetRequest {
    #[must_use]
    pub fn titled(title: &str) -> Self {
        Self {
            requests: vec![AddSheetEntry {
                add_sheet: AddSheet {
                    properties: SheetProperties {
                        title: title.to_string(),
                    },
                },
            }],
        }
    }
}

/// Google's error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}
