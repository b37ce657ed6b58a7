//! Request records for the Findify API.
//!
//! # Design
//! Every operation gets its own struct with the fields the API documents,
//! plus a flattened `extra` map so new or rarely used fields still pass
//! through untouched. Required fields are `Option`s on purpose: requests
//! also arrive as JSON (FFI, fixtures), and a missing field must surface as
//! a named validation error rather than a serde failure.
//!
//! `user` is never serialized from these structs; the merger decides which
//! identity goes on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ParamOrigin};
use crate::url::encode_path;

/// A user identity as supplied by the caller, possibly incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserParams {
    #[serde(
        default,
        deserialize_with = "opt_string_or_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub uid: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub sid: Option<String>,
}

impl UserParams {
    pub fn new(uid: impl Into<String>, sid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            sid: Some(sid.into()),
        }
    }

    /// Check both halves are present. `origin` only shapes the error.
    pub fn validate(&self, origin: ParamOrigin) -> Result<User, ApiError> {
        let uid = present(self.uid.as_deref()).ok_or(ApiError::MissingParam {
            name: "user.uid",
            origin,
        })?;
        let sid = present(self.sid.as_deref()).ok_or(ApiError::MissingParam {
            name: "user.sid",
            origin,
        })?;
        Ok(User {
            uid: uid.to_string(),
            sid: sid.to_string(),
        })
    }
}

impl From<User> for UserParams {
    fn from(user: User) -> Self {
        Self {
            uid: Some(user.uid),
            sid: Some(user.sid),
        }
    }
}

/// A complete user identity: user id and session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub sid: String,
}

/// One facet filter, e.g. `{"name":"brand","type":"text","values":[{"value":"Nike"}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

/// Shared behaviour of the per-operation request records.
pub trait ApiRequest: Serialize {
    /// Path of the endpoint, relative to the configured host.
    fn path(&self) -> String;

    /// Identity supplied with this call, if any.
    fn user(&self) -> Option<&UserParams>;

    /// Check operation-specific required fields.
    fn validate(&self) -> Result<(), ApiError>;
}

/// Parameters for `/autocomplete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_limit: Option<u32>,
    #[serde(default, skip_serializing)]
    pub user: Option<UserParams>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AutocompleteRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<UserParams>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl ApiRequest for AutocompleteRequest {
    fn path(&self) -> String {
        "/autocomplete".to_string()
    }

    fn user(&self) -> Option<&UserParams> {
        self.user.as_ref()
    }

    fn validate(&self) -> Result<(), ApiError> {
        require("q", self.q.as_deref())
    }
}

/// Parameters for `/search`. An empty `q` is a valid "browse everything".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Sort>,
    #[serde(default, skip_serializing)]
    pub user: Option<UserParams>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }
}

impl ApiRequest for SearchRequest {
    fn path(&self) -> String {
        "/search".to_string()
    }

    fn user(&self) -> Option<&UserParams> {
        self.user.as_ref()
    }

    fn validate(&self) -> Result<(), ApiError> {
        match self.q {
            Some(_) => Ok(()),
            None => Err(ApiError::MissingParam {
                name: "q",
                origin: ParamOrigin::Request,
            }),
        }
    }
}

/// Parameters for `/smart-collection/{slot}`. `slot` selects the path and is
/// not sent in the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionRequest {
    #[serde(default, skip_serializing)]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Sort>,
    #[serde(default, skip_serializing)]
    pub user: Option<UserParams>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionRequest {
    pub fn new(slot: impl Into<String>) -> Self {
        Self {
            slot: Some(slot.into()),
            ..Self::default()
        }
    }
}

impl ApiRequest for CollectionRequest {
    fn path(&self) -> String {
        let slot = self.slot.as_deref().unwrap_or_default();
        format!("/smart-collection/{}", encode_path(slot.trim_matches('/')))
    }

    fn user(&self) -> Option<&UserParams> {
        self.user.as_ref()
    }

    fn validate(&self) -> Result<(), ApiError> {
        require("slot", self.slot.as_deref())
    }
}

/// Identifiers and keys that arrive as bare numbers or booleans, as the
/// environment provider produces for `FINDIFY_USER__UID=42`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::String(s) => s,
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

pub(crate) fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(String::from)
}

pub(crate) fn opt_string_or_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Scalar>::deserialize(deserializer).map(|v| v.map(String::from))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn require(name: &'static str, value: Option<&str>) -> Result<(), ApiError> {
    present(value).map(|_| ()).ok_or(ApiError::MissingParam {
        name,
        origin: ParamOrigin::Request,
    })
}
