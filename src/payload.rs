use axum::body::Body;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Three non-whitespace, non-`@` runs shaped as `local@domain.tld`.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[^\s@]+)@(?:[^\s@]+)\.(?:[^\s@]+)$").expect("email pattern is valid")
});

const MIN_NAME_CHARS: usize = 2;
const MIN_MESSAGE_CHARS: usize = 4;

type JsonObject = Map<String, Value>;

/// A request body as a host hands it over: possibly already decoded by a body
/// parser, possibly still an unread stream.
#[derive(Debug, Default)]
pub struct RequestBody {
    /// Value produced by an upstream body parser: an object, or the raw text
    /// as a JSON string.
    pub parsed: Option<Value>,
    pub raw: Option<Body>,
}

impl RequestBody {
    pub fn parsed(value: Value) -> Self {
        Self {
            parsed: Some(value),
            raw: None,
        }
    }

    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Self::parsed(Value::String(text.into()))
    }

    pub fn raw(body: Body) -> Self {
        Self {
            parsed: None,
            raw: Some(body),
        }
    }

    /// Try each decoding strategy in order and return the first JSON object.
    pub async fn into_object(self, limit: usize) -> Option<JsonObject> {
        if let Some(obj) = self.parsed.as_ref().and_then(structured) {
            debug!("using pre-parsed body");
            return Some(obj);
        }
        if let Some(obj) = self.parsed.as_ref().and_then(json_string) {
            debug!("parsed body from JSON string");
            return Some(obj);
        }
        if let Some(body) = self.raw {
            let obj = drain(body, limit).await;
            if obj.is_some() {
                debug!("parsed body from raw stream");
            }
            return obj;
        }
        None
    }
}

fn structured(value: &Value) -> Option<JsonObject> {
    value.as_object().cloned()
}

fn json_string(value: &Value) -> Option<JsonObject> {
    let text = value.as_str()?;
    parse_object(text)
}

async fn drain(body: Body, limit: usize) -> Option<JsonObject> {
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("failed to read request body: {e}");
            return None;
        }
    };
    if bytes.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(&bytes);
    parse_object(&text)
}

fn parse_object(text: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Trimmed contact-form fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Which field failed validation, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidField {
    Name,
    Email,
    Message,
}

impl Submission {
    /// Missing or non-string fields read as empty.
    pub fn from_object(obj: Option<&JsonObject>) -> Self {
        let field = |key: &str| {
            obj.and_then(|o| o.get(key))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_owned())
                .unwrap_or_default()
        };
        Self {
            name: field("name"),
            email: field("email"),
            message: field("message"),
        }
    }

    pub fn validate(&self) -> Result<(), InvalidField> {
        if self.name.chars().count() < MIN_NAME_CHARS {
            return Err(InvalidField::Name);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(InvalidField::Email);
        }
        if self.message.chars().count() < MIN_MESSAGE_CHARS {
            return Err(InvalidField::Message);
        }
        Ok(())
    }

    pub fn compose(&self) -> String {
        format!(
            "New portfolio message:\nName: {}\nEmail: {}\nMessage:\n{}",
            self.name, self.email, self.message
        )
    }
}
