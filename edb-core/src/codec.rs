//! Codec for calls and inbound frames
//!
//! The codec only knows the protocol envelope. It never interprets the
//! payload of a result: numbers, nested records and arrays pass through as
//! `serde_json::Value` until a caller asks for a typed result with
//! [`decode_result`].
//!
//! # Decoding rules
//!
//! - Not JSON: `DecodeError::Parse`
//! - Not a JSON object: `DecodeError::Malformed`
//! - A `method` without an id: an unsolicited [`Inbound::Notification`]
//! - Missing or null id: `DecodeError::Malformed`
//! - Non-null `error` object: [`RemoteResult::Failure`]
//! - Otherwise a present `result` (null included): [`RemoteResult::Success`]
//! - Neither: `DecodeError::Malformed`
//!
//! A malformed frame is distinct from a node-reported failure: the former
//! resolves nothing, the latter resolves exactly the request it names.
//!
//! # Examples
//!
//! ```rust
//! use edb_core::{codec, Id, Inbound};
//!
//! let text = codec::encode("erisdb.isListening", None, Id::Number(1)).unwrap();
//! assert!(text.contains("erisdb.isListening"));
//!
//! let frame = codec::decode(r#"{"jsonrpc":"2.0","id":1,"result":{"listening":true}}"#).unwrap();
//! assert!(matches!(frame, Inbound::Response { id: Id::Number(1), .. }));
//! ```

use crate::error::{DecodeError, Error, RemoteError, Result};
use crate::types::{Id, Inbound, RemoteCall, RemoteResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Encode a call into the text of one WebSocket frame
pub fn encode(method: &str, params: Option<Value>, id: Id) -> Result<String> {
    encode_call(&RemoteCall::new(method, params, id))
}

/// Encode an already-built call
pub fn encode_call(call: &RemoteCall) -> Result<String> {
    serde_json::to_string(call).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode the text of one inbound frame
pub fn decode(data: &str) -> std::result::Result<Inbound, DecodeError> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| DecodeError::Parse(e.to_string()))?;

    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err(DecodeError::Malformed(
                "batch frames are not supported".to_string(),
            ))
        }
        _ => {
            return Err(DecodeError::Malformed(
                "frame is not a JSON object".to_string(),
            ))
        }
    };

    let id = decode_id(&object)?;

    let id = match id {
        Some(id) => id,
        None => {
            // An id-less frame naming a method is a push from the node
            if let Some(Value::String(method)) = object.get("method") {
                return Ok(Inbound::Notification {
                    method: method.clone(),
                    params: object.get("params").cloned(),
                });
            }
            return Err(DecodeError::Malformed("missing id".to_string()));
        }
    };

    let result = match (object.get("error"), object.get("result")) {
        (Some(error), _) if !error.is_null() => {
            let error: RemoteError = serde_json::from_value(error.clone())
                .map_err(|e| DecodeError::Malformed(format!("invalid error object: {}", e)))?;
            RemoteResult::Failure(error)
        }
        (_, Some(result)) => RemoteResult::Success(result.clone()),
        _ => {
            return Err(DecodeError::Malformed(
                "missing both result and error".to_string(),
            ))
        }
    };

    Ok(Inbound::Response { id, result })
}

/// Read the `id` member; `Ok(None)` when it is absent or null
fn decode_id(object: &Map<String, Value>) -> std::result::Result<Option<Id>, DecodeError> {
    match object.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| Some(Id::Number(n)))
            .ok_or_else(|| DecodeError::Malformed(format!("invalid id: {}", n))),
        Some(Value::String(s)) => Ok(Some(Id::String(s.clone()))),
        Some(other) => Err(DecodeError::Malformed(format!("invalid id: {}", other))),
    }
}

/// Decode a success payload into a method's result schema
///
/// ```rust
/// use edb_core::codec;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Height { height: u64 }
///
/// let height: Height = codec::decode_result(serde_json::json!({"height": 12})).unwrap();
/// assert_eq!(height.height, 12);
/// ```
pub fn decode_result<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Decode(DecodeError::Schema(e.to_string())))
}
