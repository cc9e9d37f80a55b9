use std::fmt::{Display, Formatter};
use std::ops::Deref;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::schema::Table;

/// Numeric key of a table row.
///
/// Stored tables are hand edited, so keys show up both as JSON numbers and as
/// numeric strings. Both forms load into the same value and are always written
/// back as integers, which makes `Id == Id` the only comparison joins need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(pub i64);

impl Id {
    /// The following key, or `None` once the key space is used up.
    pub fn next(self) -> Option<Id> {
        self.0.checked_add(1).map(Id)
    }

    /// Normalizes a raw JSON value (number or numeric string) into a key.
    pub fn from_value(value: &serde_json::Value) -> Option<Id> {
        match value {
            serde_json::Value::Number(n) => number_to_id(n.as_i64(), n.as_f64()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn number_to_id(int: Option<i64>, float: Option<f64>) -> Option<Id> {
    match (int, float) {
        (Some(i), _) => Some(Id(i)),
        (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(Id(f as i64)),
        _ => None,
    }
}

impl std::str::FromStr for Id {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Id)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = Id;

            fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
                f.write_str("an integer or a numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Id, E> {
                Ok(Id(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Id, E> {
                i64::try_from(v)
                    .map(Id)
                    .map_err(|_| E::custom(format!("key {v} is out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Id, E> {
                number_to_id(None, Some(v))
                    .ok_or_else(|| E::custom(format!("key {v} is not an integer")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Id, E> {
                v.parse().map_err(|_| E::custom(format!("key {v:?} is not numeric")))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Free-text cell of a hand-edited row.
///
/// Names, buildings, prices or passwords are sometimes typed as numbers. The
/// cell keeps the JSON it was loaded from, so rewrites store it unchanged, and
/// derefs to its text form for comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    raw: Value,
    text: String,
}

impl Text {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<Value> for Text {
    fn from(raw: Value) -> Self {
        let text = match &raw {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Text { raw, text }
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text::from(text.to_owned())
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text { raw: Value::String(text.clone()), text }
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.text)
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Text::from)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to access table {table}: {source}")]
    Io {
        table: Table,
        #[source]
        source: std::io::Error,
    },

    #[error("table {table} is malformed: {source}")]
    Parse {
        table: Table,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to encode table {table}: {source}")]
    Serialize {
        table: Table,
        #[source]
        source: serde_json::Error,
    },

    #[error("table {table} has no keys left after {last}")]
    KeysExhausted { table: Table, last: Id },

    #[error("changeset commit failed on table {table}: {source}")]
    Commit {
        table: Table,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Error al cargar los datos")]
    Store(#[from] StoreError),

    #[error("Unable to reach the table store: {0}")]
    Mailbox(#[from] actix::MailboxError),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Store(_) => "storage",
            ServiceError::Mailbox(_) => "unavailable",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Store(_) | ServiceError::Mailbox(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Store(err) => tracing::error!("Error al procesar los datos: {err}"),
            ServiceError::Mailbox(err) => tracing::error!("Store actor unreachable: {err}"),
            other => tracing::warn!(kind = other.kind(), "Rejected request: {other}"),
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
