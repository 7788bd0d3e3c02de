//! Request field normalization.
//!
//! Bodies arrive either as JSON objects or as `application/x-www-form-urlencoded`
//! data. Both are flattened into one [`FieldMap`] of string values, which the
//! handlers then validate field by field.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::response::ApiError;
use crate::calendar::{day_start, parse_day};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Flat string-to-string view of a request's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(HashMap<String, String>);

impl FieldMap {
    /// Decode a body according to its content type.
    ///
    /// A missing content type or `application/x-www-form-urlencoded` is read
    /// as a form, with URL query parameters filling in keys the body lacks.
    /// Anything else must be a JSON object.
    pub fn decode(content_type: Option<&str>, query: Option<&str>, body: &[u8]) -> Result<Self, ApiError> {
        let is_form = content_type.map_or(true, |ct| {
            let ct = ct.trim();
            ct.is_empty() || ct.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE)
        });

        if is_form {
            Ok(Self::from_form(query, body))
        } else {
            Self::from_json(body)
        }
    }

    /// Parse a JSON object. Strings are kept as-is, numbers and booleans
    /// become their text and `null` counts as absent.
    pub fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        let object: serde_json::Map<String, Value> =
            serde_json::from_slice(body).map_err(|_| ApiError::bad_request("invalid body"))?;

        let mut fields = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ApiError::bad_request("invalid body"));
                }
            };
            fields.insert(key, text);
        }
        Ok(Self(fields))
    }

    /// Parse form data. The first occurrence of a key wins and body values
    /// take precedence over query values.
    pub fn from_form(query: Option<&str>, body: &[u8]) -> Self {
        let mut fields = HashMap::new();
        let query = query.unwrap_or_default().as_bytes();
        for (key, value) in url::form_urlencoded::parse(body).chain(url::form_urlencoded::parse(query)) {
            fields.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self(fields)
    }

    /// Parse URL query parameters.
    pub fn from_query(query: Option<&str>) -> Self {
        Self::from_form(query, &[])
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// A field that must be present and not blank.
    pub fn require(&self, key: &str) -> Result<&str, ApiError> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("{key} is required")))
    }

    /// Required `user_id`.
    pub fn user_id(&self) -> Result<i64, ApiError> {
        parse_user_id(self.get("user_id").unwrap_or_default())
    }

    /// `user_id` if present; present-but-malformed is an error.
    pub fn optional_user_id(&self) -> Result<Option<i64>, ApiError> {
        self.get("user_id").map(parse_user_id).transpose()
    }

    /// Required `date`, as UTC midnight of the given day.
    pub fn date(&self) -> Result<DateTime<Utc>, ApiError> {
        parse_date(self.get("date").unwrap_or_default())
    }

    /// `date` if present; present-but-malformed is an error.
    pub fn optional_date(&self) -> Result<Option<DateTime<Utc>>, ApiError> {
        self.get("date").map(parse_date).transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn parse_user_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("invalid user_id"))
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_day(raw)
        .map(day_start)
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

#[async_trait]
impl<S> FromRequest<S> for FieldMap
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let query = req.uri().query().map(str::to_owned);

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::bad_request("invalid body"))?;

        Self::decode(content_type.as_deref(), query.as_deref(), &body)
    }
}
