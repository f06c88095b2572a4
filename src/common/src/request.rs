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

//! Builds request descriptors from a method descriptor and its parameters.
//!
//! Building a request never performs I/O. The resulting [RequestDescriptor]
//! has everything a [Transport][crate::transport::Transport] needs to send
//! the request.

use crate::Result;
use crate::descriptor::{MediaDownload, MethodDescriptor, ServiceDescriptor};
use crate::error::Error;
use crate::params::{Auth, Media, Params};
use bytes::Bytes;
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

/// The default encoding for responses.
pub const UTF8: &str = "utf8";

/// The body of a request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    /// The raw media content, sent with `uploadType=media`.
    Media(Media),
    /// The JSON resource and its media, sent with `uploadType=multipart`.
    Multipart(Multipart),
}

impl Body {
    /// The value for the `Content-Type` header, for single-part bodies.
    ///
    /// Multipart bodies have no fixed value, the boundary is chosen when the
    /// body is encoded.
    pub fn content_type(&self) -> Option<String> {
        match self {
            Self::Empty | Self::Multipart(_) => None,
            Self::Json(_) => Some("application/json".to_string()),
            Self::Media(m) => Some(m.mime_type().to_string()),
        }
    }

    /// Encodes a single-part body.
    ///
    /// Multipart bodies are streamed, use [Multipart::to_form] instead.
    pub fn to_bytes(&self) -> Result<Option<Bytes>> {
        match self {
            Self::Empty => Ok(None),
            Self::Json(v) => serde_json::to_vec(v)
                .map(|b| Some(Bytes::from(b)))
                .map_err(Error::ser),
            Self::Media(m) => Ok(Some(m.body().clone())),
            Self::Multipart(_) => Err(Error::ser(
                "multipart bodies are encoded with `Multipart::to_form()`",
            )),
        }
    }
}

/// The parts of a `multipart/related` upload: the JSON resource, then the
/// media.
#[derive(Clone, Debug, PartialEq)]
pub struct Multipart {
    resource: Value,
    media: Media,
}

impl Multipart {
    pub fn new(resource: Value, media: Media) -> Self {
        Self { resource, media }
    }

    pub fn resource(&self) -> &Value {
        &self.resource
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    /// Creates the form for this upload.
    ///
    /// Send it with a `multipart/related; boundary={form.boundary()}`
    /// content type, the form itself would use `multipart/form-data`.
    pub fn to_form(&self) -> Result<Form> {
        let metadata = Part::text(self.resource.to_string())
            .mime_str("application/json; charset=UTF-8")
            .map_err(Error::ser)?;
        let media = Part::stream(self.media.body().clone())
            .mime_str(self.media.mime_type())
            .map_err(Error::ser)?;
        let form = Form::new().part("metadata", metadata);
        Ok(form.part("media", media))
    }
}

/// Everything needed to send a request.
///
/// `url` is the full URL without the query string, the query parameters are
/// kept separately, in order. An `encoding` of `None` means the response
/// body is returned as raw bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    method: http::Method,
    url: String,
    query: Vec<(String, String)>,
    headers: http::HeaderMap,
    body: Body,
    json: bool,
    encoding: Option<&'static str>,
}

impl RequestDescriptor {
    /// Creates a JSON request for `url` without query parameters or body.
    pub fn new<T: Into<String>>(method: http::Method, url: T) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: http::HeaderMap::new(),
            body: Body::Empty,
            json: true,
            encoding: Some(UTF8),
        }
    }

    pub fn set_query<T, K, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = v.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    pub fn set_headers(mut self, v: http::HeaderMap) -> Self {
        self.headers = v;
        self
    }

    pub fn set_body(mut self, v: Body) -> Self {
        self.body = v;
        self
    }

    pub fn set_json(mut self, v: bool) -> Self {
        self.json = v;
        self
    }

    pub fn set_encoding(mut self, v: Option<&'static str>) -> Self {
        self.encoding = v;
        self
    }

    pub fn method(&self) -> &http::Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the first value of the query parameter `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// True if the request and response bodies are JSON.
    pub fn json(&self) -> bool {
        self.json
    }

    pub fn encoding(&self) -> Option<&'static str> {
        self.encoding
    }

    /// Returns the URL including the query string.
    pub fn full_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.url).map_err(Error::binding)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// Builds the request for a call to `method` with `params`.
///
/// `params` must already include any defaults. Fails if a required
/// parameter is missing.
pub fn build(
    service: &ServiceDescriptor,
    method: &MethodDescriptor,
    params: &Params,
) -> Result<RequestDescriptor> {
    crate::validate::validate(method, params)?;

    let upload = match (method.media_upload(), params.media()) {
        (Some(upload), Some(media)) => Some((upload, media)),
        _ => None,
    };
    let url = match upload {
        Some((upload, _)) => format!(
            "{}{}",
            service.root_url().trim_end_matches('/'),
            expand(upload.path(), params)?
        ),
        None => format!(
            "{}{}{}",
            service.root_url(),
            service.service_path(),
            expand(method.path(), params)?
        ),
    };

    let mut query = Vec::new();
    for (name, value) in params.iter() {
        if method.is_path_param(name) {
            continue;
        }
        flatten(&mut query, name, value);
    }
    if let Some(Auth::ApiKey(key)) = params.auth() {
        if !query.iter().any(|(k, _)| k == "key") {
            query.push(("key".to_string(), key.clone()));
        }
    }

    let mut headers = params.headers().clone();
    let (body, json) = match (upload, params.resource()) {
        (Some((_, media)), Some(resource)) => {
            query.push(("uploadType".to_string(), "multipart".to_string()));
            let multipart = Multipart::new(resource.clone(), media.clone());
            (Body::Multipart(multipart), false)
        }
        (Some((_, media)), None) => {
            query.push(("uploadType".to_string(), "media".to_string()));
            (Body::Media(media.clone()), false)
        }
        (None, Some(resource)) => (Body::Json(resource.clone()), true),
        (None, None)
            if method.http_method() == http::Method::GET
                || method.http_method() == http::Method::DELETE =>
        {
            (Body::Empty, true)
        }
        (None, None) => (Body::Json(Value::Object(Default::default())), true),
    };
    if let Some(content_type) = body.content_type() {
        let value = HeaderValue::from_str(&content_type).map_err(Error::binding)?;
        headers.insert(CONTENT_TYPE, value);
    }

    let raw = match method.media_download() {
        MediaDownload::Always => true,
        MediaDownload::Optional => params.value_for("alt") == Some(&Value::from("media")),
        MediaDownload::None => false,
    };

    Ok(RequestDescriptor {
        method: method.http_method().clone(),
        url,
        query,
        headers,
        body,
        json,
        encoding: (!raw).then_some(UTF8),
    })
}

fn expand(template: &crate::path_template::PathTemplate, params: &Params) -> Result<String> {
    template
        .expand(|name| params.value_for(name).and_then(path_value))
        .ok_or_else(|| {
            Error::missing(
                template
                    .variables()
                    .filter(|v| params.value_for(v).and_then(path_value).is_none()),
            )
        })
}

fn path_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        v => Some(v.to_string()),
    }
}

/// Adds `value` as the query parameter `name`.
///
/// Arrays repeat the parameter, objects are flattened as `name.field`, and
/// `null` values are skipped.
fn flatten(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Object(object) => object
            .iter()
            .for_each(|(k, v)| flatten(query, &format!("{name}.{k}"), v)),
        Value::Array(array) => array.iter().for_each(|v| flatten(query, name, v)),
        Value::Null => {}
        Value::String(s) => query.push((name.to_string(), s.clone())),
        Value::Number(n) => query.push((name.to_string(), format!("{n}"))),
        Value::Bool(b) => query.push((name.to_string(), format!("{b}"))),
    }
}
