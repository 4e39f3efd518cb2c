//! Typed Bithose wire frames.
//!
//! The console treats every frame as opaque text: the operator's buffer is
//! sent verbatim and inbound frames are logged verbatim. The types here are
//! conveniences on top of that. Outbound requests can be built and loaded into
//! a composer, and inbound frames can be recognised for annotation.
//!
//! # Example
//!
//! ```
//! use bithose_console::frame::{MessageRequest, OutboundFrame, SubscribeRequest};
//!
//! let subscribe = SubscribeRequest::builder()
//!     .criterion("channel", "==", "cool_channel")
//!     .criterion("num_of_chars", ">", 5)
//!     .build()
//!     .unwrap();
//! assert!(subscribe.to_json().unwrap().starts_with(r#"{"type":"subscribe""#));
//!
//! let message = MessageRequest::new("hello").label("channel", "cool_channel");
//! assert!(message.to_json_pretty().is_ok());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FrameError;

/// Comparison operator of a subscription criterion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
}

impl Operator {
    /// Every operator the broker accepts.
    pub const ALL: [Operator; 5] = [Self::Eq, Self::Lt, Self::Le, Self::Gt, Self::Ge];

    /// The wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| FrameError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a label: a string or a number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// A numeric value.
    Number(serde_json::Number),
    /// A string value.
    Text(String),
}

impl LabelValue {
    /// Read a value typed by the operator: anything that parses as a JSON
    /// number is a number, everything else is text.
    pub fn infer(token: &str) -> Self {
        match token.parse::<serde_json::Number>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(token.to_string()),
        }
    }
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LabelValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for LabelValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for LabelValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for LabelValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// A `(name, value)` attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelPair {
    /// Label name.
    pub name: String,
    /// Label value.
    pub value: LabelValue,
}

impl LabelPair {
    /// Create a label pair.
    pub fn new(name: impl Into<String>, value: impl Into<LabelValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One comparison in a subscription filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// How the label value is compared.
    pub operator: Operator,
    /// The label name and the value to compare against.
    pub label_pair: LabelPair,
}

/// A request frame that can be sent to the broker.
pub trait OutboundFrame: Serialize {
    /// Compact JSON encoding.
    fn to_json(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON encoding, for loading into a composer.
    fn to_json_pretty(&self) -> Result<String, FrameError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// `{"type": "subscribe", "criteria": [...]}`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    criteria: Vec<Criterion>,
}

impl SubscribeRequest {
    /// A subscription with already-validated criteria.
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self {
            kind: "subscribe",
            criteria,
        }
    }

    /// Start building a subscription from loosely typed criteria.
    pub fn builder() -> SubscribeBuilder {
        SubscribeBuilder::default()
    }

    /// The criteria, in order.
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }
}

impl OutboundFrame for SubscribeRequest {}

/// Builder for [`SubscribeRequest`].
///
/// Operators are given as strings and checked in [`build`](Self::build),
/// which rejects anything other than `==`, `<`, `<=`, `>` and `>=`.
#[derive(Clone, Debug, Default)]
pub struct SubscribeBuilder {
    criteria: Vec<(String, String, LabelValue)>,
}

impl SubscribeBuilder {
    /// Add a criterion.
    pub fn criterion(
        mut self,
        name: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<LabelValue>,
    ) -> Self {
        self.criteria
            .push((name.into(), operator.into(), value.into()));
        self
    }

    /// Validate operators and build the request.
    pub fn build(self) -> Result<SubscribeRequest, FrameError> {
        let criteria = self
            .criteria
            .into_iter()
            .map(|(name, operator, value)| {
                Ok(Criterion {
                    operator: operator.parse()?,
                    label_pair: LabelPair { name, value },
                })
            })
            .collect::<Result<Vec<_>, FrameError>>()?;
        Ok(SubscribeRequest::new(criteria))
    }
}

/// `{"type": "unsubscribe", "uuid": "..."}`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnsubscribeRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    uuid: String,
}

impl UnsubscribeRequest {
    /// Cancel the subscription acknowledged with `uuid`.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            kind: "unsubscribe",
            uuid: uuid.into(),
        }
    }
}

impl OutboundFrame for UnsubscribeRequest {}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct MessageBody {
    body: String,
    label_pairs: Vec<LabelPair>,
}

/// `{"type": "message", "message": {"body": "...", "label_pairs": [...]}}`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    message: MessageBody,
}

impl MessageRequest {
    /// A message with no labels.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            kind: "message",
            message: MessageBody {
                body: body.into(),
                label_pairs: Vec::new(),
            },
        }
    }

    /// Attach a label.
    pub fn label(mut self, name: impl Into<String>, value: impl Into<LabelValue>) -> Self {
        self.message.label_pairs.push(LabelPair::new(name, value));
        self
    }

    /// The message body.
    pub fn body(&self) -> &str {
        &self.message.body
    }

    /// The attached labels, in order.
    pub fn label_pairs(&self) -> &[LabelPair] {
        &self.message.label_pairs
    }
}

impl OutboundFrame for MessageRequest {}

/// Any outbound request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Request {
    /// A subscription.
    Subscribe(SubscribeRequest),
    /// A publish.
    Message(MessageRequest),
    /// A cancelled subscription.
    Unsubscribe(UnsubscribeRequest),
}

impl Request {
    /// The request's `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Subscribe(r) => r.kind,
            Self::Message(r) => r.kind,
            Self::Unsubscribe(r) => r.kind,
        }
    }
}

impl OutboundFrame for Request {}

impl From<SubscribeRequest> for Request {
    fn from(request: SubscribeRequest) -> Self {
        Self::Subscribe(request)
    }
}

impl From<MessageRequest> for Request {
    fn from(request: MessageRequest) -> Self {
        Self::Message(request)
    }
}

impl From<UnsubscribeRequest> for Request {
    fn from(request: UnsubscribeRequest) -> Self {
        Self::Unsubscribe(request)
    }
}

/// Reply to a subscribe request.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubscribeAck {
    /// Subscription id, used to unsubscribe.
    #[serde(default)]
    pub uuid: String,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

/// Reply to a message request.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SendAck {
    /// Subscribers the message reached.
    pub number_of_sents: u64,
    /// Subscribers that timed out.
    #[serde(default)]
    pub number_of_timeouts: u64,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

/// A message the broker pushed to this subscriber.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DeliveredMessage {
    /// Labels that matched this subscription's criteria.
    #[serde(default)]
    pub label_pairs: Vec<LabelPair>,
    /// Broker timestamp (RFC 3339).
    #[serde(default)]
    pub timestamp: String,
    /// The published body.
    pub body: Value,
}

/// An inbound frame, recognised by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundFrame {
    /// `{uuid, error}`
    SubscribeAck(SubscribeAck),
    /// `{number_of_sents, number_of_timeouts, error}`
    SendAck(SendAck),
    /// `{label_pairs, timestamp, body}`
    Delivered(DeliveredMessage),
    /// Anything else, including text that is not JSON.
    Unrecognized,
}

impl InboundFrame {
    /// Recognise `text` by its fields. Never fails.
    pub fn classify(text: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            return Self::Unrecognized;
        };
        let Some(object) = value.as_object() else {
            return Self::Unrecognized;
        };

        let parsed = if object.contains_key("number_of_sents") {
            serde_json::from_value(value).map(Self::SendAck)
        } else if object.contains_key("uuid") {
            serde_json::from_value(value).map(Self::SubscribeAck)
        } else if object.contains_key("body") {
            serde_json::from_value(value).map(Self::Delivered)
        } else {
            return Self::Unrecognized;
        };
        parsed.unwrap_or(Self::Unrecognized)
    }

    /// One-line human summary, if the frame was recognised.
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::SubscribeAck(ack) if ack.error.is_empty() => {
                Some(format!("subscribed, uuid {}", ack.uuid))
            }
            Self::SubscribeAck(ack) => Some(format!("subscribe failed: {}", ack.error)),
            Self::SendAck(ack) if ack.error.is_empty() => Some(format!(
                "delivered to {}, {} timed out",
                ack.number_of_sents, ack.number_of_timeouts
            )),
            Self::SendAck(ack) => Some(format!("send failed: {}", ack.error)),
            Self::Delivered(message) => {
                let labels = message
                    .label_pairs
                    .iter()
                    .map(|pair| format!("{}={}", pair.name, pair.value))
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!("message [{labels}]: {}", message.body))
            }
            Self::Unrecognized => None,
        }
    }
}
