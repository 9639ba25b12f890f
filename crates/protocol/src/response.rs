//! Decoded responses and shape normalization

use crate::error::{ProtocolError, Result};
use crate::transport::Headers;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// How a caller wants the decoded body presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Key-ordered map; arrays are keyed by index
    Mapping,
    /// The JSON tree as decoded
    Tree,
    /// Ordered values; object keys are dropped
    Collection,
}

/// A body recast into one [`ResponseShape`]
#[derive(Debug, Clone, PartialEq)]
pub enum Shaped {
    /// Map in the order the server sent the keys
    Mapping(Map<String, Value>),
    /// Untouched tree
    Tree(Value),
    /// Values in order
    Collection(Vec<Value>),
}

impl Shaped {
    /// Recast `value` into `shape`
    pub fn from_value(value: Value, shape: ResponseShape) -> Self {
        match shape {
            ResponseShape::Tree => Shaped::Tree(value),
            ResponseShape::Mapping => Shaped::Mapping(match value {
                Value::Object(map) => map,
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
                Value::Null => Map::new(),
                scalar => std::iter::once(("0".to_string(), scalar)).collect(),
            }),
            ResponseShape::Collection => Shaped::Collection(match value {
                Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                scalar => vec![scalar],
            }),
        }
    }

    /// Which shape this is
    pub fn shape(&self) -> ResponseShape {
        match self {
            Shaped::Mapping(_) => ResponseShape::Mapping,
            Shaped::Tree(_) => ResponseShape::Tree,
            Shaped::Collection(_) => ResponseShape::Collection,
        }
    }

    /// Back to a JSON value
    pub fn into_value(self) -> Value {
        match self {
            Shaped::Mapping(map) => Value::Object(map),
            Shaped::Tree(value) => value,
            Shaped::Collection(items) => Value::Array(items),
        }
    }
}

/// A successful archive response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    url: String,
    headers: Headers,
    body: Value,
}

impl Response {
    /// Decode a raw body; empty bodies decode to `null`
    pub fn decode(status: u16, url: String, headers: Headers, body: &str) -> Result<Self> {
        let body = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).map_err(|e| {
                ProtocolError::Decode(format!(
                    "invalid JSON from {}: {} (body starts with {:?})",
                    url,
                    e,
                    body.chars().take(120).collect::<String>()
                ))
            })?
        };
        Ok(Response {
            status,
            url,
            headers,
            body,
        })
    }

    /// Status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// URL of the final attempt
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Response headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Decoded body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Take the decoded body
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Same status, URL and headers with a replacement body
    pub fn with_body(self, body: Value) -> Self {
        Response { body, ..self }
    }

    /// Continuation URL from the `Link` header
    pub fn next_link(&self) -> Option<String> {
        self.headers.link_next()
    }

    /// Body recast into `shape`
    pub fn shaped(&self, shape: ResponseShape) -> Shaped {
        Shaped::from_value(self.body.clone(), shape)
    }

    /// Deserialize the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ProtocolError::Decode(format!("unexpected body from {}: {}", self.url, e)))
    }
}
