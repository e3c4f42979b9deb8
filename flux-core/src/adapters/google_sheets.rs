//! Google Sheets store
//!
//! Talks to the Sheets v4 REST API with a service-account token. Each sheet
//! of the spreadsheet holds one table; saves clear the sheet and rewrite it
//! from A1.

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::domain::result;
use crate::domain::SheetName;
use crate::ports::{SheetData, SheetStore};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME_SECS: u64 = 3600;
/// Refresh the token this long before Google says it expires
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// The fields of a service-account key file we need
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid service account credentials")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SpreadsheetProperties,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Spreadsheet on Google Sheets, accessed with a service account
#[derive(Debug)]
pub struct GoogleSheetsStore {
    client: Client,
    spreadsheet_id: String,
    key: ServiceAccountKey,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsStore {
    /// Authenticate, check the spreadsheet is reachable and make sure it
    /// carries `title`
    pub fn connect(spreadsheet_id: &str, key: ServiceAccountKey, title: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let store = Self {
            client,
            spreadsheet_id: spreadsheet_id.to_string(),
            key,
            token: Mutex::new(None),
        };

        let meta = store
            .metadata()
            .context("Spreadsheet not found or not shared with the service account")?;
        if meta.properties.title != title {
            store.batch_update(json!([{
                "updateSpreadsheetProperties": {
                    "properties": { "title": title },
                    "fields": "title"
                }
            }]))?;
            log::info!("Renamed spreadsheet to {:?}", title);
        }

        log::info!("Connected to Google Sheet {}", spreadsheet_id);
        Ok(store)
    }

    fn access_token(&self) -> Result<String> {
        let mut cached = self
            .token
            .lock()
            .map_err(|e| anyhow::anyhow!("Token cache poisoned: {}", e))?;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_SLACK < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Invalid service account private key")?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .context("Failed to sign token request")?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .context("Failed to reach token endpoint")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Token request failed ({}): {}", status, body);
        }
        let token: TokenResponse = response.json().context("Invalid token response")?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS));
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    /// URL under the spreadsheet, with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Invalid Sheets API base URL"))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response> {
        let response = request
            .bearer_auth(self.access_token()?)
            .send()
            .context("Failed to reach Google Sheets")?;
        Ok(response)
    }

    fn expect_success(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().unwrap_or_default();
        anyhow::bail!("Google Sheets request failed ({}): {}", status, body)
    }

    fn metadata(&self) -> Result<SpreadsheetMeta> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties.title");
        let response = Self::expect_success(self.send(self.client.get(url))?)?;
        Ok(response.json()?)
    }

    fn batch_update(&self, requests: Value) -> Result<()> {
        let mut url = self.url(&[])?;
        let path = format!("{}:batchUpdate", url.path());
        url.set_path(&path);
        let body = json!({ "requests": requests });
        Self::expect_success(self.send(self.client.post(url).json(&body))?)?;
        Ok(())
    }

    fn read_sheet(&self, sheet: SheetName) -> Result<SheetData> {
        let url = self.url(&["values", sheet.as_str()])?;
        let response = self.send(self.client.get(url))?;
        if matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
            log::debug!("Sheet {} does not exist yet", sheet);
            return Ok(SheetData::default());
        }
        let range: ValueRange = Self::expect_success(response)?.json()?;

        let grid = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(value_to_string).collect())
            .collect();
        Ok(SheetData::from_grid(grid))
    }

    fn write_sheet(&self, sheet: SheetName, data: &SheetData) -> Result<()> {
        let meta = self.metadata()?;
        if !meta.sheets.iter().any(|s| s.properties.title == sheet.as_str()) {
            self.batch_update(json!([{
                "addSheet": {
                    "properties": {
                        "title": sheet.as_str(),
                        "gridProperties": { "rowCount": 100, "columnCount": 20 }
                    }
                }
            }]))?;
            log::info!("Added sheet {}", sheet);
        }

        let clear = self.url(&["values", &format!("{}:clear", sheet.as_str())])?;
        Self::expect_success(self.send(self.client.post(clear).json(&json!({})))?)?;

        let range = format!("{}!A1", sheet.as_str());
        let mut update = self.url(&["values", &range])?;
        update
            .query_pairs_mut()
            .append_pair("valueInputOption", "RAW");
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": data.to_grid(),
        });
        Self::expect_success(self.send(self.client.put(update).json(&body))?)?;
        Ok(())
    }
}

impl SheetStore for GoogleSheetsStore {
    fn backend(&self) -> &str {
        "google-sheets"
    }

    fn load(&self, sheet: SheetName) -> result::Result<SheetData> {
        self.read_sheet(sheet)
            .with_context(|| format!("Failed to load sheet {}", sheet))
            .map_err(Into::into)
    }

    fn save(&self, sheet: SheetName, data: &SheetData) -> result::Result<()> {
        self.write_sheet(sheet, data)
            .with_context(|| format!("Failed to save sheet {}", sheet))?;
        log::debug!("Saved {} rows to {}", data.len(), sheet);
        Ok(())
    }
}

/// Cell text as the API returns it; numbers lose an integral ".0"
fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => if b { "1" } else { "0" }.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "svc@example.iam.gserviceaccount.com", "private_key": "x"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_key_rejects_missing_fields() {
        assert!(ServiceAccountKey::from_json(r#"{"client_email": "a"}"#).is_err());
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(json!("AC1001")), "AC1001");
        assert_eq!(value_to_string(json!(12345678901.0)), "12345678901");
        assert_eq!(value_to_string(json!(10.5)), "10.5");
        assert_eq!(value_to_string(Value::Null), "");
    }
}
