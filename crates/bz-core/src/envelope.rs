//! # Envelope
//!
//! Every backend response is wrapped as `{status: "ok", data}` or
//! `{status: "error", error: {code, message}}`. [`decode`] turns a raw
//! status/body pair into the payload or a classified [`ClientError`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Ok {
        #[serde(default)]
        data: Value,
    },
    Error {
        #[serde(default)]
        error: ErrorBody,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Decodes a response body that has already been read as text.
pub fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| ClientError::transport(format!("Server error ({status})"), Some(status)))?;

    match serde_json::from_value::<Envelope>(value.clone()) {
        Ok(Envelope::Ok { data }) => serde_json::from_value(data).map_err(|err| {
            ClientError::transport(format!("Unexpected response shape: {err}"), Some(status))
        }),
        Ok(Envelope::Error { error }) => {
            Err(ClientError::from_backend(status, error.code, error.message))
        }
        Err(_) if !(200..300).contains(&status) => {
            // Framework-level rejections (e.g. a missing JWT) skip the envelope.
            let message = ["message", "msg", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(str::to_owned);
            Err(ClientError::from_backend(status, None, message))
        }
        Err(_) => Err(ClientError::transport(
            format!("Server error ({status})"),
            Some(status),
        )),
    }
}
