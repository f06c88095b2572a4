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

//! Executes requests.
//!
//! The runtime never talks to the network directly. It hands each
//! [RequestDescriptor] to a [Transport], by default a [ReqwestTransport].
//! Applications and tests can provide their own implementation, for example,
//! to add authorization headers or to return canned responses.

use crate::Result;
use crate::error::Error;
use crate::request::{Body, RequestDescriptor};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// The response as received by the transport.
///
/// The transport does not interpret the status code. The runtime turns
/// responses without a successful status into errors.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Default for TransportResponse {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl TransportResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn set_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    pub fn set_body<T: Into<Bytes>>(mut self, v: T) -> Self {
        self.body = v.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

/// Executes a [RequestDescriptor].
///
/// Errors returned by the transport are delivered to the caller unchanged.
/// Only problems sending the request or receiving the response should be
/// errors, the runtime handles unsuccessful status codes.
pub trait Transport: std::fmt::Debug {
    fn execute(
        &self,
        request: RequestDescriptor,
    ) -> impl Future<Output = Result<TransportResponse>> + Send;
}

pub mod dynamic {
    use super::{RequestDescriptor, Result, TransportResponse};

    /// A dyn-compatible version of [Transport][super::Transport].
    #[async_trait::async_trait]
    pub trait Transport: Send + Sync + std::fmt::Debug {
        async fn execute(&self, request: RequestDescriptor) -> Result<TransportResponse>;
    }

    /// All [Transport][super::Transport]s implement the dyn-compatible trait.
    #[async_trait::async_trait]
    impl<T> Transport for T
    where
        T: super::Transport + Send + Sync,
    {
        async fn execute(&self, request: RequestDescriptor) -> Result<TransportResponse> {
            T::execute(self, request).await
        }
    }
}

/// A cloneable, type-erased [Transport].
#[derive(Clone, Debug)]
pub struct SharedTransport {
    inner: Arc<dyn dynamic::Transport>,
}

impl<T> From<T> for SharedTransport
where
    T: Transport + Send + Sync + 'static,
{
    fn from(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl SharedTransport {
    pub async fn execute(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        self.inner.execute(request).await
    }
}

/// The default transport, sends requests over HTTP using [reqwest].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with a new HTTP client.
    pub fn new() -> crate::client_builder::Result<Self> {
        let inner = reqwest::Client::builder()
            .build()
            .map_err(crate::client_builder::Error::transport)?;
        Ok(Self::from_client(inner))
    }

    /// Creates a transport sharing an existing HTTP client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self {
            inner,
            timeout: None,
        }
    }

    /// Sets the timeout for each request, including reading the response.
    pub fn with_timeout(mut self, v: Duration) -> Self {
        self.timeout = Some(v);
        self
    }

    fn map_send_error(err: reqwest::Error) -> Error {
        match err {
            e if e.is_timeout() => Error::timeout(e),
            e => Error::io(e),
        }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        let url = request.full_url()?;
        let mut builder = self
            .inner
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match request.body() {
            Body::Multipart(multipart) => {
                let form = multipart.to_form()?;
                builder
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/related; boundary={}", form.boundary()),
                    )
                    .body(reqwest::Body::wrap_stream(form.into_stream()))
            }
            body => match body.to_bytes()? {
                Some(bytes) => builder.body(bytes),
                None => builder,
            },
        };
        let response = builder.send().await.map_err(Self::map_send_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Self::map_send_error)?;
        Ok(TransportResponse::new(status)
            .set_headers(headers)
            .set_body(body))
    }
}
