// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The parameter bag passed to each method call.

use crate::Result;
use crate::error::Error;
use crate::error::binding::BindingError;
use crate::transport::SharedTransport;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parameter names with a special meaning. They are never sent as path or
/// query parameters.
///
/// To send a parameter with one of these names, add a trailing underscore,
/// e.g., `resource_`.
pub const RESERVED: [&str; 4] = ["auth", "media", "resource", "headers"];

/// Authenticates a single call.
#[derive(Clone, Debug)]
pub enum Auth {
    /// Sent as the `key` query parameter.
    ApiKey(String),
    /// Executes the request instead of the service transport. Typically a
    /// transport that adds authorization headers.
    Transport(SharedTransport),
}

/// Content uploaded with the request.
#[derive(Clone, Debug, PartialEq)]
pub struct Media {
    mime_type: String,
    body: Bytes,
}

impl Media {
    pub fn new<M: Into<String>, B: Into<Bytes>>(mime_type: M, body: B) -> Self {
        Self {
            mime_type: mime_type.into(),
            body: body.into(),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// The parameters for a single call, or the defaults for many calls.
///
/// Most parameters are simple name/value pairs. Their values are JSON
/// values, strings and numbers are the common case. Path parameters are
/// substituted into the request path, everything else is sent as a query
/// parameter. Arrays repeat the query parameter, objects are flattened as
/// `name.field`, and `null` values are not sent.
///
/// The [RESERVED] names are routed to dedicated slots instead.
///
/// # Example
/// ```
/// # use google_apis_common::params::Params;
/// # use serde_json::json;
/// let params = Params::new()
///     .set("fileId", "abc")
///     .set("mimeType", "text/plain")
///     .set_api_key("my-api-key");
/// assert_eq!(params.get("fileId"), Some(&json!("abc")));
///
/// let params = Params::try_from(json!({"fileId": "abc", "resource": {"name": "n"}}))?;
/// assert_eq!(params.resource(), Some(&json!({"name": "n"})));
/// assert!(params.get("resource").is_none());
/// # Ok::<(), google_apis_common::error::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Params {
    values: BTreeMap<String, Value>,
    auth: Option<Auth>,
    media: Option<Media>,
    resource: Option<Value>,
    headers: HeaderMap,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, see [insert][Params::insert].
    pub fn set<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a parameter.
    ///
    /// Values for the [RESERVED] names are routed to their slots:
    /// - `auth`: a string is used as an API key.
    /// - `resource`: any JSON value, `null` clears the resource.
    /// - `media`: an object with `mimeType` and `body` string fields.
    /// - `headers`: an object with string values.
    ///
    /// Reserved values with any other shape are ignored.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "auth" => match value {
                Value::String(key) => self.auth = Some(Auth::ApiKey(key)),
                v => tracing::warn!("ignoring `auth` parameter, expected a string, got {v}"),
            },
            "resource" => {
                self.resource = match value {
                    Value::Null => None,
                    v => Some(v),
                }
            }
            "media" => match media_from_json(&value) {
                Some(media) => self.media = Some(media),
                None => tracing::warn!("ignoring `media` parameter with unexpected shape {value}"),
            },
            "headers" => match headers_from_json(&value) {
                Some(headers) => self.headers.extend(headers),
                None => {
                    tracing::warn!("ignoring `headers` parameter with unexpected shape {value}")
                }
            },
            _ => {
                self.values.insert(name, value);
            }
        }
    }

    pub fn set_api_key<T: Into<String>>(self, v: T) -> Self {
        self.set_auth(Auth::ApiKey(v.into()))
    }

    /// Sends this call with `v` instead of the service transport.
    pub fn set_transport<T: Into<SharedTransport>>(self, v: T) -> Self {
        self.set_auth(Auth::Transport(v.into()))
    }

    pub fn set_auth(mut self, v: Auth) -> Self {
        self.auth = Some(v);
        self
    }

    pub fn set_media<M: Into<String>, B: Into<Bytes>>(mut self, mime_type: M, body: B) -> Self {
        self.media = Some(Media::new(mime_type, body));
        self
    }

    pub fn set_resource<T: Into<Value>>(mut self, v: T) -> Self {
        self.resource = Some(v.into());
        self
    }

    pub fn set_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the value stored under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the value for the parameter `name`, accepting its aliased
    /// form `name_` too.
    pub fn value_for(&self, name: &str) -> Option<&Value> {
        self.values
            .get(name)
            .or_else(|| self.values.get(&format!("{name}_")))
    }

    /// Returns true if the parameter `name` has a value other than `null`.
    pub fn contains(&self, name: &str) -> bool {
        self.value_for(name).is_some_and(|v| !v.is_null())
    }

    /// Iterates over the parameters, with aliased names resolved.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (unalias(k), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.auth.is_none()
            && self.media.is_none()
            && self.resource.is_none()
            && self.headers.is_empty()
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn media(&self) -> Option<&Media> {
        self.media.as_ref()
    }

    pub fn resource(&self) -> Option<&Value> {
        self.resource.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a new bag with the values in `overrides` layered on top of
    /// the values in `self`.
    pub fn merged(&self, overrides: &Params) -> Params {
        let mut merged = self.clone();
        merged.values.extend(overrides.values.clone());
        if let Some(auth) = &overrides.auth {
            merged.auth = Some(auth.clone());
        }
        if let Some(media) = &overrides.media {
            merged.media = Some(media.clone());
        }
        if let Some(resource) = &overrides.resource {
            merged.resource = Some(resource.clone());
        }
        merged.headers.extend(overrides.headers.clone());
        merged
    }
}

impl TryFrom<Value> for Params {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(Self::from(object)),
            Value::Null => Ok(Self::default()),
            v => Err(Error::binding(BindingError::NotAnObject(v.to_string()))),
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(object: Map<String, Value>) -> Self {
        object
            .into_iter()
            .fold(Self::default(), |params, (k, v)| params.set(k, v))
    }
}

/// Removes the trailing underscore used to alias reserved names.
fn unalias(name: &str) -> &str {
    name.strip_suffix('_').unwrap_or(name)
}

fn media_from_json(value: &Value) -> Option<Media> {
    let mime_type = value.get("mimeType")?.as_str()?;
    let body = value.get("body")?.as_str()?;
    Some(Media::new(mime_type, body.to_string()))
}

fn headers_from_json(value: &Value) -> Option<HeaderMap> {
    value
        .as_object()?
        .iter()
        .map(|(k, v)| {
            let name = HeaderName::from_bytes(k.as_bytes()).ok()?;
            let value = HeaderValue::from_str(v.as_str()?).ok()?;
            Some((name, value))
        })
        .collect()
}
