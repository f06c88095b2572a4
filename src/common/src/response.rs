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

//! Successful responses, and the conversion of transport responses into
//! responses or errors.

use crate::Result;
use crate::error::Error;
use crate::error::rpc::Status;
use crate::request::RequestDescriptor;
use crate::transport::TransportResponse;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// The payload of a successful response.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// The service returned no content.
    Empty,
    Json(Value),
    /// Media content, returned as-is.
    Raw(Bytes),
}

/// A successful response.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Returns the JSON payload, if any.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Deserializes the JSON payload into `T`.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            ResponseBody::Json(v) => T::deserialize(v).map_err(Error::deser),
            ResponseBody::Empty => T::deserialize(Value::Null).map_err(Error::deser),
            ResponseBody::Raw(b) => serde_json::from_slice(b).map_err(Error::deser),
        }
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }
}

/// Converts what the transport received into a [Response] or an [Error].
///
/// Responses without a successful status code are errors. If the payload is
/// a Google API error envelope the error includes its details.
pub(crate) fn decode(request: &RequestDescriptor, response: TransportResponse) -> Result<Response> {
    let (status, headers, body) = response.into_parts();
    if !status.is_success() {
        return Err(to_http_error(status, headers, body));
    }
    let body = match body {
        b if request.encoding().is_none() => ResponseBody::Raw(b),
        b if b.is_empty() => ResponseBody::Empty,
        b => match serde_json::from_slice::<Value>(&b) {
            Ok(v) => ResponseBody::Json(v),
            Err(_) if !request.json() => ResponseBody::Raw(b),
            Err(e) => return Err(Error::deser(e)),
        },
    };
    Ok(Response {
        status,
        headers,
        body,
    })
}

fn to_http_error(status: StatusCode, headers: HeaderMap, body: Bytes) -> Error {
    let status_code = status.as_u16();
    match Status::try_from(&body) {
        Ok(status) => Error::service_with_http_metadata(status, Some(status_code), Some(headers)),
        Err(_) => Error::http(status_code, headers, body),
    }
}
