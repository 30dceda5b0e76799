// MIT License
// Copyright 2023--present additive developers

//! Configuration ingestion and process-level setup.
//!
//! The value objects of this crate are built through typed setters, so field
//! names are checked by the compiler. Configuration documents are the one
//! place where names arrive as text; [`from_json`] is the boundary that
//! rejects unknown names with [`Error::UnknownField`]. Objects nested inside
//! a document implement [`ConfigObject`] so an unknown name is reported
//! against the type that lacks it rather than against the whole document.
//!
//! Nothing here runs implicitly. An application that wants the per-user data
//! directory calls [`init_user_data_dir`] itself.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Default host of a locally running server.
pub const DEFAULT_HOST: &str = "localhost";
/// Default port of a locally running server.
pub const DEFAULT_PORT: u16 = 50052;

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "Ansys Inc";
const APP_NAME: &str = "ansys-pyadditive";

/// Connection settings for [`crate::AdditiveClient`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    /// Per-request deadline; `None` lets long simulations run unbounded.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: 5_000,
            request_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Parse a JSON document into `T`.
///
/// `object` names the target in error messages. A field `T` does not declare
/// (with `#[serde(deny_unknown_fields)]`) becomes [`Error::UnknownField`];
/// every other parse failure becomes [`Error::Config`].
pub fn from_json<T: DeserializeOwned>(object: &'static str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| classify(object, source))
}

/// A configuration type that can appear nested inside another document.
pub trait ConfigObject: DeserializeOwned {
    /// Name used for this object in error messages.
    const OBJECT: &'static str;
}

fn classify(object: &'static str, source: serde_json::Error) -> Error {
    match unknown_field(&source.to_string()) {
        Some((nested, field)) => Error::UnknownField {
            object: nested.unwrap_or(object).to_string(),
            field: field.to_string(),
        },
        None => Error::Config { object, source },
    }
}

/// Recognizes serde's own rejection and the message of an
/// [`Error::UnknownField`] raised further down the document.
fn unknown_field(msg: &str) -> Option<(Option<&str>, &str)> {
    if let Some(rest) = msg.strip_prefix("unknown field `") {
        let (field, _) = rest.split_once('`')?;
        return Some((None, field));
    }
    let (object, rest) = msg
        .strip_prefix('\'')?
        .split_once("' object has no attribute '")?;
    let (field, _) = rest.split_once('\'')?;
    Some((Some(object), field))
}

fn nested_value<T: ConfigObject, E: de::Error>(value: serde_json::Value) -> std::result::Result<T, E> {
    serde_json::from_value(value).map_err(|source| E::custom(classify(T::OBJECT, source)))
}

/// `deserialize_with` helper for a nested [`ConfigObject`].
pub(crate) fn object<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: ConfigObject,
{
    nested_value(serde_json::Value::deserialize(deserializer)?)
}

/// `deserialize_with` helper for an optional nested [`ConfigObject`].
pub(crate) fn optional_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: ConfigObject,
{
    Option::<serde_json::Value>::deserialize(deserializer)?
        .map(nested_value)
        .transpose()
}

/// `deserialize_with` helper for an optional list of nested [`ConfigObject`]s.
pub(crate) fn optional_objects<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: ConfigObject,
{
    Option::<Vec<serde_json::Value>>::deserialize(deserializer)?
        .map(|values| {
            values
                .into_iter()
                .map(nested_value)
                .collect::<std::result::Result<Vec<T>, D::Error>>()
        })
        .transpose()
}

/// Create the per-user data directory and its `examples` sub-directory.
///
/// Returns the data directory.
pub fn init_user_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
        .ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not resolve user data directory",
            ))
        })?;
    let base = dirs.data_dir().to_path_buf();
    fs::create_dir_all(base.join("examples"))?;
    tracing::debug!(path = %base.display(), "user data directory ready");
    Ok(base)
}
