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

//! Provide types for service construction.
//!
//! Services can be constructed from a [ServiceDescriptor], from the contents
//! of a discovery document, or from a discovery document fetched at runtime.
//! All these paths share the same configuration, and produce services with
//! identical shapes and behavior.
//!
//! ## Example: configure the defaults for all calls.
//!
//! ```
//! # use google_apis_common::client_builder::{Result, ServiceBuilder};
//! # use google_apis_common::descriptor::ServiceDescriptor;
//! # let descriptor = ServiceDescriptor::new("drive", "v3", "https://www.googleapis.com/", "drive/v3/");
//! let service = ServiceBuilder::new()
//!     .with_endpoint("https://private.googleapis.com")
//!     .with_param("prettyPrint", false)
//!     .with_api_key("my-api-key")
//!     .build(descriptor)?;
//! assert_eq!(service.root_url(), "https://private.googleapis.com/");
//! # Result::<()>::Ok(())
//! ```

use crate::descriptor::ServiceDescriptor;
use crate::discovery::{Document, document_url};
use crate::params::Params;
use crate::reporter::ErrorReporter;
use crate::request::RequestDescriptor;
use crate::response::ResponseBody;
use crate::service::Service;
use crate::transport::{ReqwestTransport, SharedTransport};
use serde_json::Value;
use std::sync::Arc;

/// The root URL for Google APIs, and for the discovery service.
pub const DEFAULT_ROOT_URL: &str = "https://www.googleapis.com/";

pub(crate) const LOGGING_VAR: &str = "GOOGLE_APIS_LOGGING";

/// The result type for this module.
pub type Result<T> = std::result::Result<T, Error>;

/// Indicates a problem while constructing a service.
///
/// Construction either returns a complete service or one of these errors,
/// never a partially initialized service.
///
/// # Example
/// ```
/// # use google_apis_common::client_builder::ServiceBuilder;
/// match ServiceBuilder::new().build_from_json(b"not json") {
///     Err(e) if e.is_descriptor() => println!("bad discovery document: {e}"),
///     Err(e) => println!("other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// If true, the service description is invalid.
    pub fn is_descriptor(&self) -> bool {
        matches!(&self.0, ErrorKind::Descriptor(_))
    }

    /// If true, the service could not initialize the transport client.
    pub fn is_transport(&self) -> bool {
        matches!(&self.0, ErrorKind::Transport(_))
    }

    /// If true, the discovery document could not be fetched.
    pub fn is_discovery(&self) -> bool {
        matches!(&self.0, ErrorKind::Discovery(_))
    }

    pub fn descriptor<T: Into<BoxError>>(source: T) -> Self {
        Self(ErrorKind::Descriptor(source.into()))
    }

    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self(ErrorKind::Transport(source.into()))
    }

    pub fn discovery<T: Into<BoxError>>(source: T) -> Self {
        Self(ErrorKind::Discovery(source.into()))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("invalid service description")]
    Descriptor(#[source] BoxError),
    #[error("could not initialize transport client")]
    Transport(#[source] BoxError),
    #[error("could not fetch the discovery document")]
    Discovery(#[source] BoxError),
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Options shared by all the calls made through a service.
///
/// Services are configured with two sets of options: the global options,
/// typically shared by all the services in an application, and the service
/// options. For parameters the per-call values win over the service options,
/// which win over the global options.
#[derive(Clone, Debug, Default)]
pub struct ServiceOptions {
    endpoint: Option<String>,
    params: Params,
    tracing: bool,
}

impl ServiceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root URL, replacing the one in the service description.
    pub fn with_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Sets a default parameter.
    pub fn with_param<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Replaces all the default parameters.
    pub fn with_params(mut self, v: Params) -> Self {
        self.params = v;
        self
    }

    /// Sends `v` as the API key, unless the call sets the `key` parameter.
    pub fn with_api_key<V: Into<String>>(mut self, v: V) -> Self {
        self.params = self.params.set_api_key(v);
        self
    }

    /// Enables tracing for all the calls.
    pub fn with_tracing(mut self) -> Self {
        self.tracing = true;
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn tracing(&self) -> bool {
        self.tracing
    }
}

/// Builds [Service]s.
#[derive(Clone, Debug, Default)]
pub struct ServiceBuilder {
    pub(crate) options: ServiceOptions,
    pub(crate) global: ServiceOptions,
    pub(crate) transport: Option<SharedTransport>,
    pub(crate) reporter: Option<Arc<dyn ErrorReporter>>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root URL.
    ///
    /// For services built with [discover][ServiceBuilder::discover] this is
    /// also the root URL of the discovery service.
    pub fn with_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.options = self.options.with_endpoint(v);
        self
    }

    /// Sets a default parameter for all calls.
    pub fn with_param<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.options = self.options.with_param(name, value);
        self
    }

    pub fn with_api_key<V: Into<String>>(mut self, v: V) -> Self {
        self.options = self.options.with_api_key(v);
        self
    }

    /// Enables tracing, the `GOOGLE_APIS_LOGGING=true` environment variable
    /// has the same effect.
    pub fn with_tracing(mut self) -> Self {
        self.options = self.options.with_tracing();
        self
    }

    /// Replaces the service options.
    pub fn with_options(mut self, v: ServiceOptions) -> Self {
        self.options = v;
        self
    }

    /// Replaces the global options.
    pub fn with_global_options(mut self, v: ServiceOptions) -> Self {
        self.global = v;
        self
    }

    /// Sets the transport used to send requests, and to fetch discovery
    /// documents.
    pub fn with_transport<T: Into<SharedTransport>>(mut self, v: T) -> Self {
        self.transport = Some(v.into());
        self
    }

    /// Sets the reporter for errors in calls without a callback.
    ///
    /// By default these errors go to the process-wide
    /// [default reporter][crate::reporter::default_reporter].
    pub fn with_reporter(mut self, v: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(v);
        self
    }

    /// Creates a service from its description.
    pub fn build(self, descriptor: ServiceDescriptor) -> Result<Service> {
        let transport = self.resolve_transport()?;
        let descriptor = match self.endpoint() {
            Some(endpoint) => descriptor.set_root_url(endpoint),
            None => descriptor,
        };
        Ok(crate::service::assemble(self, transport, descriptor))
    }

    /// Creates a service from the contents of a discovery document.
    pub fn build_from_json(self, contents: &[u8]) -> Result<Service> {
        let document = Document::from_slice(contents).map_err(Error::descriptor)?;
        let descriptor = ServiceDescriptor::try_from(document).map_err(Error::descriptor)?;
        self.build(descriptor)
    }

    /// Fetches the discovery document for `name` at `version`, and creates a
    /// service from it.
    pub async fn discover(self, name: &str, version: &str) -> Result<Service> {
        let transport = self.resolve_transport()?;
        let url = document_url(self.endpoint().unwrap_or(DEFAULT_ROOT_URL), name, version);
        tracing::debug!(url, "fetching discovery document");
        let request = RequestDescriptor::new(http::Method::GET, url).set_encoding(None);
        let response = transport
            .execute(request.clone())
            .await
            .and_then(|r| crate::response::decode(&request, r))
            .map_err(Error::discovery)?;
        let contents = match response.into_body() {
            ResponseBody::Raw(b) => b,
            other => return Err(Error::discovery(format!("unexpected payload {other:?}"))),
        };
        self.with_transport(transport).build_from_json(&contents)
    }

    fn endpoint(&self) -> Option<&str> {
        self.options.endpoint().or(self.global.endpoint())
    }

    fn resolve_transport(&self) -> Result<SharedTransport> {
        match &self.transport {
            Some(t) => Ok(t.clone()),
            None => Ok(SharedTransport::from(ReqwestTransport::new()?)),
        }
    }
}

// Returns true if the environment or the options enable tracing.
pub(crate) fn tracing_enabled(options: &ServiceOptions, global: &ServiceOptions) -> bool {
    if options.tracing() || global.tracing() {
        return true;
    }
    std::env::var(LOGGING_VAR)
        .map(|v| v == "true")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Auth;
    use scoped_env::ScopedEnv;
    use serde_json::json;

    #[test]
    fn options() {
        let options = ServiceOptions::new()
            .with_endpoint("http://127.0.0.1:1234")
            .with_param("prettyPrint", false)
            .with_api_key("test-key")
            .with_tracing();
        assert_eq!(options.endpoint(), Some("http://127.0.0.1:1234"));
        assert_eq!(options.params().get("prettyPrint"), Some(&json!(false)));
        assert!(
            matches!(options.params().auth(), Some(Auth::ApiKey(k)) if k == "test-key"),
            "{options:?}"
        );
        assert!(options.tracing(), "{options:?}");

        let options = options.with_params(Params::new().set("fields", "id"));
        assert_eq!(options.params().get("prettyPrint"), None);
        assert!(options.params().auth().is_none(), "{options:?}");
    }

    #[test]
    fn endpoint_precedence() {
        let builder = ServiceBuilder::new()
            .with_global_options(ServiceOptions::new().with_endpoint("http://global"));
        assert_eq!(builder.endpoint(), Some("http://global"));
        let builder = builder.with_endpoint("http://service");
        assert_eq!(builder.endpoint(), Some("http://service"));
    }

    #[test]
    fn build_overrides_root_url() -> anyhow::Result<()> {
        let descriptor = ServiceDescriptor::new("drive", "v3", DEFAULT_ROOT_URL, "drive/v3/");
        let service = ServiceBuilder::new()
            .with_endpoint("http://127.0.0.1:8080")
            .build(descriptor.clone())?;
        assert_eq!(service.root_url(), "http://127.0.0.1:8080/");

        let service = ServiceBuilder::new().build(descriptor)?;
        assert_eq!(service.root_url(), DEFAULT_ROOT_URL);
        Ok(())
    }

    #[test]
    fn build_from_json_errors() {
        let err = ServiceBuilder::new()
            .build_from_json(b"not json")
            .unwrap_err();
        assert!(err.is_descriptor(), "{err:?}");
        assert!(!err.is_transport(), "{err:?}");
        assert!(!err.is_discovery(), "{err:?}");

        let contents = json!({"name": "", "version": "v3", "rootUrl": DEFAULT_ROOT_URL});
        let err = ServiceBuilder::new()
            .build_from_json(contents.to_string().as_bytes())
            .unwrap_err();
        assert!(err.is_descriptor(), "{err:?}");
        assert!(
            std::error::Error::source(&err).is_some(),
            "{err:?} should have a source"
        );
    }

    #[test]
    fn error_fmt() {
        let err = Error::transport("no TLS provider");
        assert!(err.is_transport(), "{err:?}");
        assert_eq!(err.to_string(), "could not initialize transport client");
        let err = Error::discovery("connection refused");
        assert!(err.is_discovery(), "{err:?}");
    }

    // This test must run serially because it manipulates the environment.
    #[test]
    #[serial_test::serial]
    fn config_tracing() {
        let _e = ScopedEnv::remove(LOGGING_VAR);
        let none = ServiceOptions::default();
        assert!(
            !tracing_enabled(&none, &none),
            "expected tracing to be disabled"
        );
        let enabled = ServiceOptions::default().with_tracing();
        assert!(
            tracing_enabled(&enabled, &none),
            "expected tracing to be enabled"
        );
        assert!(
            tracing_enabled(&none, &enabled),
            "expected tracing to be enabled"
        );

        let _e = ScopedEnv::set(LOGGING_VAR, "true");
        assert!(
            tracing_enabled(&none, &none),
            "expected tracing to be enabled"
        );

        let _e = ScopedEnv::set(LOGGING_VAR, "not-true");
        assert!(
            !tracing_enabled(&none, &none),
            "expected tracing to be disabled"
        );
    }
}
