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

//! Google APIs Client Library for Rust.
//!
//! This crate bundles the descriptions of Google APIs, and offers a single
//! entry point, [GoogleApis], to create services from them. Services can
//! also be created from discovery documents fetched at runtime.
//!
//! # Example
//! ```
//! # use googleapis::GoogleApis;
//! # use google_apis_common::params::Params;
//! let google = GoogleApis::new();
//! let drive = google.drive("v3")?;
//! let export = drive.lookup("files.export").expect("drive v3 can export files");
//! let request = export.request(
//!     &Params::new().set("fileId", "abc").set("mimeType", "application/pdf"),
//! )?;
//! assert_eq!(request.url(), "https://www.googleapis.com/drive/v3/files/abc/export");
//! # anyhow::Ok(())
//! ```

pub use google_apis_common::client_builder::{ServiceBuilder, ServiceOptions};
pub use google_apis_common::service::{Method, Resource, Service};

use google_apis_common::client_builder::{Error, Result};
use google_apis_common::reporter::ErrorReporter;
use google_apis_common::transport::SharedTransport;
use std::sync::Arc;

mod apis;

/// A service name or version without a bundled description.
#[derive(thiserror::Error, Debug, PartialEq)]
#[error("no bundled description for {name} {version}")]
pub struct UnknownVersion {
    pub name: String,
    pub version: String,
}

/// Creates services, sharing a set of global options.
///
/// The global options apply to all services created after they are set.
/// Each service can have its own options too, those take precedence.
///
/// # Example
/// ```
/// # use googleapis::{GoogleApis, ServiceOptions};
/// let google = GoogleApis::new()
///     .with_options(ServiceOptions::new().with_param("prettyPrint", false));
/// let drive = google.drive("v3")?;
/// assert!(drive.global_options().params().get("prettyPrint").is_some());
/// # anyhow::Ok(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct GoogleApis {
    options: ServiceOptions,
    transport: Option<SharedTransport>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl GoogleApis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the global options.
    pub fn with_options(mut self, v: ServiceOptions) -> Self {
        self.options = v;
        self
    }

    /// Sets the transport for all services.
    pub fn with_transport<T: Into<SharedTransport>>(mut self, v: T) -> Self {
        self.transport = Some(v.into());
        self
    }

    /// Sets the error reporter for all services.
    pub fn with_reporter(mut self, v: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(v);
        self
    }

    /// The global options.
    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Returns a builder initialized with the global configuration.
    pub fn builder(&self) -> ServiceBuilder {
        let builder = ServiceBuilder::new().with_global_options(self.options.clone());
        let builder = match &self.transport {
            Some(t) => builder.with_transport(t.clone()),
            None => builder,
        };
        match &self.reporter {
            Some(r) => builder.with_reporter(r.clone()),
            None => builder,
        }
    }

    /// Creates a Google Drive service from the bundled description.
    pub fn drive(&self, version: &str) -> Result<Service> {
        self.drive_with(version, ServiceOptions::default())
    }

    /// Creates a Google Drive service with its own options.
    pub fn drive_with(&self, version: &str, options: ServiceOptions) -> Result<Service> {
        self.bundled("drive", version, options)
    }

    /// Creates a service for any bundled API.
    pub fn bundled(&self, name: &str, version: &str, options: ServiceOptions) -> Result<Service> {
        let contents = apis::find(name, version).ok_or_else(|| {
            Error::descriptor(UnknownVersion {
                name: name.to_string(),
                version: version.to_string(),
            })
        })?;
        tracing::debug!(name, version, "creating service from bundled description");
        self.builder()
            .with_options(options)
            .build_from_json(contents)
    }

    /// Creates a service from its discovery document, fetched at runtime.
    ///
    /// The document is fetched from the discovery service at the endpoint in
    /// the service options, the global options, or
    /// `https://www.googleapis.com/`, in that order.
    pub async fn discover(&self, name: &str, version: &str) -> Result<Service> {
        self.discover_with(name, version, ServiceOptions::default())
            .await
    }

    /// Like [discover][GoogleApis::discover], with per-service options.
    pub async fn discover_with(
        &self,
        name: &str,
        version: &str,
        options: ServiceOptions,
    ) -> Result<Service> {
        self.builder()
            .with_options(options)
            .discover(name, version)
            .await
    }

    /// The bundled API versions, as `(name, version)` pairs.
    pub fn bundled_apis() -> impl Iterator<Item = (&'static str, &'static str)> {
        apis::BUNDLED.iter().map(|(n, v, _)| (*n, *v))
    }
}

/// Creates a Google Drive service with the default configuration.
///
/// # Example
/// ```
/// let drive = googleapis::drive("v3")?;
/// assert!(drive.lookup("files.export").is_some());
/// # anyhow::Ok(())
/// ```
pub fn drive(version: &str) -> Result<Service> {
    GoogleApis::new().drive(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(GoogleApis: Clone, Send, Sync);

    #[test]
    fn unknown_version() {
        let err = GoogleApis::new().drive("v1beta").unwrap_err();
        assert!(err.is_descriptor(), "{err:?}");
        let source = std::error::Error::source(&err)
            .and_then(|e| e.downcast_ref::<UnknownVersion>())
            .expect("source is UnknownVersion");
        assert_eq!(source.version, "v1beta");
    }

    #[test]
    fn drive_with_defaults() -> anyhow::Result<()> {
        let drive = drive("v3")?;
        assert_eq!(drive.name(), "drive");
        assert!(drive.options().params().is_empty(), "{:?}", drive.options());
        assert!(drive.global_options().params().is_empty());
        let err = super::drive("v0").unwrap_err();
        assert!(err.is_descriptor(), "{err:?}");
        Ok(())
    }

    #[test]
    fn bundled_apis() {
        let got = GoogleApis::bundled_apis().collect::<Vec<_>>();
        assert_eq!(got, vec![("drive", "v3")]);
    }

    #[test]
    fn options_are_global() -> anyhow::Result<()> {
        let google = GoogleApis::new().with_options(
            ServiceOptions::new()
                .with_endpoint("http://127.0.0.1:1")
                .with_param("quotaUser", "global"),
        );
        let options = ServiceOptions::new().with_param("quotaUser", "mine");
        let drive = google.drive_with("v3", options)?;
        assert_eq!(drive.root_url(), "http://127.0.0.1:1/");
        assert_eq!(
            drive.options().params().get("quotaUser"),
            Some(&serde_json::json!("mine"))
        );
        assert_eq!(
            drive.global_options().params().get("quotaUser"),
            Some(&serde_json::json!("global"))
        );
        Ok(())
    }
}
