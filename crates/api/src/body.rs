//! Request body decoding by content type.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::app::errors::json_error;

/// Largest body accepted on any route.
pub const BODY_LIMIT: usize = 100 * 1024;

/// A request body decoded according to its `Content-Type`.
///
/// Form fields keep their names exactly as sent (`a[b]=c` is the key
/// `a[b]`); a repeated field becomes an array of its values.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Empty,
    Json(Value),
    Form(Map<String, Value>),
    Text(String),
}

impl ParsedBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Json(_) => "json",
            Self::Form(_) => "form",
            Self::Text(_) => "text",
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Json(value) => value,
            Self::Form(fields) => Value::Object(fields),
            Self::Text(text) => Value::String(text),
        }
    }

    fn decode(content_type: Option<&str>, bytes: &[u8]) -> Result<Self, Response> {
        if bytes.is_empty() {
            return Ok(Self::Empty);
        }

        let Some(mime) = content_type.map(essence) else {
            return Ok(Self::Empty);
        };

        if mime == "application/json" || mime.ends_with("+json") {
            serde_json::from_slice(bytes).map(Self::Json).map_err(|e| {
                json_error(StatusCode::BAD_REQUEST, "invalid_json", e.to_string())
            })
        } else if mime == "application/x-www-form-urlencoded" {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes).map_err(|e| {
                json_error(StatusCode::BAD_REQUEST, "invalid_form", e.to_string())
            })?;
            Ok(Self::Form(collect_fields(pairs)))
        } else if mime.starts_with("text/") {
            String::from_utf8(bytes.to_vec()).map(Self::Text).map_err(|_| {
                json_error(StatusCode::BAD_REQUEST, "invalid_text", "body is not valid UTF-8")
            })
        } else {
            tracing::debug!(content_type = %mime, "ignoring body with unsupported content type");
            Ok(Self::Empty)
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        Self::decode(content_type.as_deref(), &bytes)
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn collect_fields(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut fields = Map::new();
    for (name, value) in pairs {
        match fields.get_mut(&name) {
            None => {
                fields.insert(name, Value::String(value));
            }
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    fields
}
