//! HTTP client for the Google Sheets REST v4 API.
//!
//! Authenticates with a bearer token supplied by the caller; obtaining and
//! refreshing that token is outside this crate. All writes use
//! `valueInputOption=RAW` so counts land as numbers and the sentinel as text.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;

use crate::error::SheetsError;
use crate::store::{RangeWrite, Rows, TabularStore};
use crate::types::{AddSheetRequest, BatchValuesRequest, ErrorEnvelope, SpreadsheetMeta, ValueRange};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

/// Characters escaped when a range or id is placed in a path segment. `!`
/// and `:` stay literal; the API accepts them unescaped.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const RAW: &str = "RAW";

/// Client bound to one spreadsheet.
///
/// Use [`SheetsClient::new`] for production or [`SheetsClient::with_base_url`]
/// to point at a mock server in tests.
pub struct SheetsClient {
    client: Client,
    access_token: String,
    /// `{base}/v4/spreadsheets/{id}` with no trailing slash.
    spreadsheet_url: String,
}

impl SheetsClient {
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(sheet_id: &str, access_token: &str, timeout_secs: u64) -> Result<Self, SheetsError> {
        Self::with_base_url(sheet_id, access_token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SheetsError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        sheet_id: &str,
        access_token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("playcount/0.1")
            .build()?;

        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| SheetsError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let spreadsheet_url = format!(
            "{trimmed}/v4/spreadsheets/{}",
            utf8_percent_encode(sheet_id, SEGMENT)
        );

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            spreadsheet_url,
        })
    }

    /// Titles of every sheet in the spreadsheet, in tab order.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] on transport, API, or decoding failure.
    pub async fn sheet_titles(&self) -> Result<Vec<String>, SheetsError> {
        let url = self.url("", &[("fields", "sheets.properties.title")])?;
        let body = self.send(self.client.get(url), "spreadsheet metadata").await?;
        let meta: SpreadsheetMeta = decode(body, "spreadsheet metadata")?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// # Errors
    ///
    /// Returns [`SheetsError`] on transport or API failure.
    pub async fn add_sheet(&self, title: &str) -> Result<(), SheetsError> {
        let url = self.url(":batchUpdate", &[])?;
        let request = self.client.post(url).json(&AddSheetRequest::titled(title));
        self.send(request, &format!("addSheet({title})")).await?;
        Ok(())
    }

    fn values_url(&self, range: &str, suffix: &str, query: &[(&str, &str)]) -> Result<Url, SheetsError> {
        let path = format!("/values/{}{suffix}", utf8_percent_encode(range, SEGMENT));
        self.url(&path, query)
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, SheetsError> {
        let raw = format!("{}{path}", self.spreadsheet_url);
        let mut url = Url::parse(&raw).map_err(|e| SheetsError::InvalidBaseUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends an authenticated request and parses the JSON body.
    ///
    /// Non-2xx responses become [`SheetsError::Api`] with Google's error
    /// message when one is present.
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Value, SheetsError> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            tracing::warn!(status = status.as_u16(), context, %message, "sheets request failed");
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| SheetsError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: Value, context: &str) -> Result<T, SheetsError> {
    serde_json::from_value(body).map_err(|e| SheetsError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn ensure_sheet(&self, title: &str) -> Result<bool, SheetsError> {
        let titles = self.sheet_titles().await?;
        if titles.iter().any(|t| t == title) {
            return Ok(false);
        }
        self.add_sheet(title).await?;
        tracing::info!(sheet = title, "created missing sheet");
        Ok(true)
    }

    async fn read_range(&self, range: &str) -> Result<Rows, SheetsError> {
        let url = self.values_url(range, "", &[("valueRenderOption", "UNFORMATTED_VALUE")])?;
        let context = format!("values.get({range})");
        let body = self.send(self.client.get(url), &context).await?;
        let parsed: ValueRange = decode(body, &context)?;
        Ok(parsed.values)
    }

    async fn write_range(&self, range: &str, rows: Rows) -> Result<(), SheetsError> {
        let url = self.values_url(range, "", &[("valueInputOption", RAW)])?;
        let body = ValueRange {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: rows,
        };
        self.send(self.client.put(url).json(&body), &format!("values.update({range})"))
            .await?;
        Ok(())
    }

    async fn batch_update(&self, writes: Vec<RangeWrite>) -> Result<(), SheetsError> {
        if writes.is_empty() {
            return Ok(());
        }
        let url = self.url("/values:batchUpdate", &[])?;
        let body = BatchValuesRequest {
            value_input_option: RAW,
            data: &writes,
        };
        self.send(self.client.post(url).json(&body), "values.batchUpdate")
            .await?;
        tracing::debug!(cells = writes.len(), "batch update applied");
        Ok(())
    }

    async fn append_rows(&self, range: &str, rows: Rows) -> Result<(), SheetsError> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.values_url(
            range,
            ":append",
            &[("valueInputOption", RAW), ("insertDataOption", "INSERT_ROWS")],
        )?;
        let count = rows.len();
        let body = ValueRange {
            values: rows,
            ..ValueRange::default()
        };
        self.send(self.client.post(url).json(&body), &format!("values.append({range})"))
            .await?;
        tracing::debug!(range, rows = count, "rows appended");
        Ok(())
    }
}
