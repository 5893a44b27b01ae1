//! Bridge wire protocol.
//!
//! Messages follow the msgpack-RPC layout:
//!
//! - request: `[0, msgid, method, params]`
//! - response: `[1, msgid, error, result]`
//! - notification: `[2, method, params]`
//!
//! Host → engine calls are requests; the selection callback is a notification.

use rmpv::Value;

use crate::engine::Rect;

use super::error::BridgeError;

pub const INITIALIZE_GRAPH: &str = "initializeGraph";
pub const CREATE_NODE: &str = "createNode";
pub const CREATE_EDGE: &str = "createEdge";
pub const APPLY_HIERARCHIC_LAYOUT: &str = "applyHierarchicLayout";
pub const SET_SELECTED_PERSON: &str = "SetSelectedPerson";

/// Selection id meaning "nothing selected".
pub const NO_SELECTION: i64 = -1;

const REQUEST: u64 = 0;
const RESPONSE: u64 = 1;
const NOTIFICATION: u64 = 2;

/// Error payload carried by a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: String,
    pub message: String,
}

impl RemoteError {
    fn into_value(self) -> Value {
        Value::Map(vec![
            (Value::from("kind"), Value::from(self.kind)),
            (Value::from("message"), Value::from(self.message)),
        ])
    }

    fn from_value(value: &Value) -> Self {
        let field = |name: &str| map_get(value, name).and_then(Value::as_str).map(str::to_string);
        Self {
            kind: field("kind").unwrap_or_else(|| "remote".to_string()),
            message: field("message").unwrap_or_else(|| value.to_string()),
        }
    }
}

/// A single framed message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request {
        msgid: u32,
        method: String,
        params: Vec<Value>,
    },
    Response {
        msgid: u32,
        error: Option<RemoteError>,
        result: Value,
    },
    Notification {
        method: String,
        params: Vec<Value>,
    },
}

impl Message {
    /// Builds the response to `msgid` from an operation result.
    pub fn response(msgid: u32, outcome: Result<Value, BridgeError>) -> Self {
        match outcome {
            Ok(result) => Message::Response {
                msgid,
                error: None,
                result,
            },
            Err(err) => Message::Response {
                msgid,
                error: Some(RemoteError::from(&err)),
                result: Value::Nil,
            },
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Message::Request {
                msgid,
                method,
                params,
            } => Value::Array(vec![
                Value::from(REQUEST),
                Value::from(msgid),
                Value::from(method),
                Value::Array(params),
            ]),
            Message::Response {
                msgid,
                error,
                result,
            } => Value::Array(vec![
                Value::from(RESPONSE),
                Value::from(msgid),
                error.map(RemoteError::into_value).unwrap_or(Value::Nil),
                result,
            ]),
            Message::Notification { method, params } => Value::Array(vec![
                Value::from(NOTIFICATION),
                Value::from(method),
                Value::Array(params),
            ]),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        let Value::Array(parts) = value else {
            return Err(BridgeError::Decode("message is not an array".to_string()));
        };
        let mut parts = parts.into_iter();
        let kind = parts
            .next()
            .and_then(|v| v.as_u64())
            .ok_or_else(|| BridgeError::Decode("missing message type".to_string()))?;

        match kind {
            REQUEST => {
                let msgid = next_msgid(&mut parts)?;
                let method = next_method(&mut parts)?;
                let params = next_params(&mut parts)?;
                Ok(Message::Request {
                    msgid,
                    method,
                    params,
                })
            }
            RESPONSE => {
                let msgid = next_msgid(&mut parts)?;
                let error = match parts.next() {
                    Some(Value::Nil) | None => None,
                    Some(err) => Some(RemoteError::from_value(&err)),
                };
                let result = parts.next().unwrap_or(Value::Nil);
                Ok(Message::Response {
                    msgid,
                    error,
                    result,
                })
            }
            NOTIFICATION => {
                let method = next_method(&mut parts)?;
                let params = next_params(&mut parts)?;
                Ok(Message::Notification { method, params })
            }
            other => Err(BridgeError::Decode(format!("unknown message type {}", other))),
        }
    }
}

fn next_msgid(parts: &mut impl Iterator<Item = Value>) -> Result<u32, BridgeError> {
    parts
        .next()
        .and_then(|v| v.as_u64())
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| BridgeError::Decode("missing or invalid msgid".to_string()))
}

fn next_method(parts: &mut impl Iterator<Item = Value>) -> Result<String, BridgeError> {
    parts
        .next()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| BridgeError::Decode("missing method name".to_string()))
}

fn next_params(parts: &mut impl Iterator<Item = Value>) -> Result<Vec<Value>, BridgeError> {
    match parts.next() {
        Some(Value::Array(params)) => Ok(params),
        None | Some(Value::Nil) => Ok(Vec::new()),
        Some(_) => Err(BridgeError::Decode("params must be an array".to_string())),
    }
}

/// A host → engine call with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitializeGraph {
        selector: String,
        callback_target: String,
    },
    CreateNode {
        label: String,
        rect: Option<Rect>,
    },
    CreateEdge {
        id1: i64,
        id2: i64,
    },
    ApplyHierarchicLayout,
}

impl Call {
    pub fn method(&self) -> &'static str {
        match self {
            Call::InitializeGraph { .. } => INITIALIZE_GRAPH,
            Call::CreateNode { .. } => CREATE_NODE,
            Call::CreateEdge { .. } => CREATE_EDGE,
            Call::ApplyHierarchicLayout => APPLY_HIERARCHIC_LAYOUT,
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        match self {
            Call::InitializeGraph {
                selector,
                callback_target,
            } => vec![Value::from(selector), Value::from(callback_target)],
            Call::CreateNode { label, rect } => vec![
                Value::from(label),
                rect.map(rect_to_value).unwrap_or(Value::Nil),
            ],
            Call::CreateEdge { id1, id2 } => vec![Value::from(id1), Value::from(id2)],
            Call::ApplyHierarchicLayout => Vec::new(),
        }
    }

    /// Parses a request into a typed call.
    pub fn parse(method: &str, params: Vec<Value>) -> Result<Self, BridgeError> {
        let invalid = |reason: &str| BridgeError::InvalidParams {
            method: method.to_string(),
            reason: reason.to_string(),
        };

        match method {
            INITIALIZE_GRAPH => {
                let [selector, target] = take_params(params).map_err(|r| invalid(&r))?;
                Ok(Call::InitializeGraph {
                    selector: as_string(&selector).ok_or_else(|| invalid("selector must be a string"))?,
                    callback_target: as_string(&target)
                        .ok_or_else(|| invalid("callback target must be a string"))?,
                })
            }
            CREATE_NODE => {
                let [label, rect] = take_params(params).map_err(|r| invalid(&r))?;
                let label = as_string(&label).ok_or_else(|| invalid("label must be a string"))?;
                let rect = match rect {
                    Value::Nil => None,
                    other => Some(rect_from_value(&other).map_err(|r| invalid(&r))?),
                };
                Ok(Call::CreateNode { label, rect })
            }
            CREATE_EDGE => {
                let [id1, id2] = take_params(params).map_err(|r| invalid(&r))?;
                Ok(Call::CreateEdge {
                    id1: id1.as_i64().ok_or_else(|| invalid("id1 must be an integer"))?,
                    id2: id2.as_i64().ok_or_else(|| invalid("id2 must be an integer"))?,
                })
            }
            APPLY_HIERARCHIC_LAYOUT => Ok(Call::ApplyHierarchicLayout),
            other => Err(BridgeError::UnknownMethod(other.to_string())),
        }
    }
}

/// Payload of the `SetSelectedPerson` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPerson {
    pub callback_target: String,
    pub id: i64,
}

impl SelectedPerson {
    pub fn into_message(self) -> Message {
        Message::Notification {
            method: SET_SELECTED_PERSON.to_string(),
            params: vec![Value::from(self.callback_target), Value::from(self.id)],
        }
    }

    pub fn from_params(params: Vec<Value>) -> Result<Self, BridgeError> {
        let invalid = |reason: &str| BridgeError::InvalidParams {
            method: SET_SELECTED_PERSON.to_string(),
            reason: reason.to_string(),
        };
        let [target, id] = take_params(params).map_err(|r| invalid(&r))?;
        Ok(Self {
            callback_target: as_string(&target)
                .ok_or_else(|| invalid("callback target must be a string"))?,
            id: id.as_i64().ok_or_else(|| invalid("id must be an integer"))?,
        })
    }
}

/// Encodes a rectangle as `{ x, y, width, height }`.
pub fn rect_to_value(rect: Rect) -> Value {
    Value::Map(vec![
        (Value::from("x"), Value::from(rect.x)),
        (Value::from("y"), Value::from(rect.y)),
        (Value::from("width"), Value::from(rect.width)),
        (Value::from("height"), Value::from(rect.height)),
    ])
}

/// Decodes a rectangle map. Integer coordinates are accepted as well.
pub fn rect_from_value(value: &Value) -> Result<Rect, String> {
    if !value.is_map() {
        return Err("rect must be a map".to_string());
    }
    let number = |name: &str| {
        map_get(value, name)
            .and_then(as_number)
            .ok_or_else(|| format!("rect.{} must be a number", name))
    };
    Ok(Rect::new(
        number("x")?,
        number("y")?,
        number("width")?,
        number("height")?,
    ))
}

fn map_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .as_map()?
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::F64(f) => Some(*f),
        Value::F32(f) => Some(f64::from(*f)),
        Value::Integer(n) => n.as_f64(),
        _ => None,
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Takes exactly `N` params; missing trailing params count as nil.
fn take_params<const N: usize>(params: Vec<Value>) -> Result<[Value; N], String> {
    if params.len() > N {
        return Err(format!("expected {} params, got {}", N, params.len()));
    }
    let mut params = params;
    params.resize(N, Value::Nil);
    params
        .try_into()
        .map_err(|_| format!("expected {} params", N))
}
