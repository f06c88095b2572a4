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

//! Immutable descriptions of services, resources, and methods.
//!
//! A [ServiceDescriptor] is created once, either from a bundled discovery
//! document or from one fetched at runtime, and then shared (read-only) by
//! every call made through the service.

use crate::path_template::{PathTemplate, TemplateError};
use std::collections::{BTreeMap, BTreeSet};

/// How a method returns media content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MediaDownload {
    /// The method always returns JSON.
    #[default]
    None,
    /// The method returns media only when called with `alt=media`, e.g.
    /// `files.get`.
    Optional,
    /// The method only returns media, e.g. `files.export`.
    Always,
}

/// The upload endpoint of a method that accepts media.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaUpload {
    path: PathTemplate,
    accept: Vec<String>,
    max_size: Option<String>,
}

impl MediaUpload {
    /// `path` is relative to the root URL of the service, e.g.
    /// `/upload/drive/v3/files/{fileId}`.
    pub fn new(path: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            path: PathTemplate::parse(path)?,
            accept: Vec::new(),
            max_size: None,
        })
    }

    pub fn set_accept<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<String>,
    {
        self.accept = v.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_max_size<T: Into<String>>(mut self, v: T) -> Self {
        self.max_size = Some(v.into());
        self
    }

    pub fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// The accepted media MIME type patterns, e.g. `*/*`.
    pub fn accept(&self) -> &[String] {
        &self.accept
    }

    pub fn max_size(&self) -> Option<&str> {
        self.max_size.as_deref()
    }
}

/// Describes a single method: its HTTP binding and its parameters.
///
/// Path parameters are always required. They are added to the required
/// parameters when the descriptor is created.
///
/// # Example
/// ```
/// # use google_apis_common::descriptor::{MethodDescriptor, MediaDownload};
/// let export = MethodDescriptor::new("drive.files.export", http::Method::GET, "files/{fileId}/export")?
///     .set_required_params(["mimeType"])
///     .set_media_download(MediaDownload::Always);
/// assert_eq!(export.required_params(), &["fileId", "mimeType"]);
/// # Ok::<(), google_apis_common::path_template::TemplateError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDescriptor {
    id: String,
    http_method: http::Method,
    path: PathTemplate,
    required_params: Vec<String>,
    optional_params: BTreeSet<String>,
    media_download: MediaDownload,
    media_upload: Option<MediaUpload>,
}

impl MethodDescriptor {
    pub fn new<T: Into<String>>(
        id: T,
        http_method: http::Method,
        path: &str,
    ) -> Result<Self, TemplateError> {
        let path = PathTemplate::parse(path)?;
        let required_params = path.variables().map(str::to_string).collect();
        Ok(Self {
            id: id.into(),
            http_method,
            path,
            required_params,
            optional_params: BTreeSet::new(),
            media_download: MediaDownload::None,
            media_upload: None,
        })
    }

    /// Adds required parameters, in order, after the path parameters.
    pub fn set_required_params<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<String>,
    {
        for name in v.into_iter().map(Into::into) {
            if !self.required_params.contains(&name) {
                self.optional_params.remove(&name);
                self.required_params.push(name);
            }
        }
        self
    }

    pub fn set_optional_params<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<String>,
    {
        let optional = v
            .into_iter()
            .map(Into::into)
            .filter(|n| !self.required_params.contains(n));
        self.optional_params.extend(optional);
        self
    }

    pub fn set_media_download(mut self, v: MediaDownload) -> Self {
        self.media_download = v;
        self
    }

    pub fn set_media_upload(mut self, v: MediaUpload) -> Self {
        self.media_upload = Some(v);
        self
    }

    /// The method id, e.g. `drive.files.export`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn http_method(&self) -> &http::Method {
        &self.http_method
    }

    /// The path template, relative to the service base URL.
    pub fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// Required parameters, path parameters first.
    pub fn required_params(&self) -> &[String] {
        &self.required_params
    }

    pub fn optional_params(&self) -> &BTreeSet<String> {
        &self.optional_params
    }

    pub fn path_params(&self) -> impl Iterator<Item = &str> {
        self.path.variables()
    }

    pub fn is_path_param(&self, name: &str) -> bool {
        self.path.variables().any(|v| v == name)
    }

    /// Returns true if `name` is declared as a required or optional parameter.
    pub fn is_known_param(&self, name: &str) -> bool {
        self.required_params.iter().any(|p| p == name) || self.optional_params.contains(name)
    }

    pub fn media_download(&self) -> MediaDownload {
        self.media_download
    }

    pub fn media_upload(&self) -> Option<&MediaUpload> {
        self.media_upload.as_ref()
    }
}

/// A named group of methods, possibly containing nested resources.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceDescriptor {
    methods: BTreeMap<String, MethodDescriptor>,
    resources: BTreeMap<String, ResourceDescriptor>,
}

impl ResourceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_method<T: Into<String>>(mut self, name: T, method: MethodDescriptor) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn set_resource<T: Into<String>>(mut self, name: T, resource: ResourceDescriptor) -> Self {
        self.resources.insert(name.into(), resource);
        self
    }

    pub fn methods(&self) -> &BTreeMap<String, MethodDescriptor> {
        &self.methods
    }

    pub fn resources(&self) -> &BTreeMap<String, ResourceDescriptor> {
        &self.resources
    }
}

/// Describes a whole service: where it lives and what it offers.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceDescriptor {
    name: String,
    version: String,
    root_url: String,
    service_path: String,
    methods: BTreeMap<String, MethodDescriptor>,
    resources: BTreeMap<String, ResourceDescriptor>,
}

impl ServiceDescriptor {
    /// Creates a descriptor for the service `name` at `version`.
    ///
    /// The root URL is normalized to end with `/`, and the service path to
    /// not start with one, so `root_url() + service_path()` is always a
    /// well-formed base URL.
    pub fn new<N, V, R, P>(name: N, version: V, root_url: R, service_path: P) -> Self
    where
        N: Into<String>,
        V: Into<String>,
        R: Into<String>,
        P: Into<String>,
    {
        let service_path = service_path.into().trim_start_matches('/').to_string();
        Self {
            name: name.into(),
            version: version.into(),
            root_url: String::new(),
            service_path,
            methods: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
        .set_root_url(root_url)
    }

    /// Replaces the root URL, e.g. to send requests to a private endpoint.
    pub fn set_root_url<T: Into<String>>(mut self, v: T) -> Self {
        let mut root_url = v.into();
        if !root_url.ends_with('/') {
            root_url.push('/');
        }
        self.root_url = root_url;
        self
    }

    pub fn set_method<T: Into<String>>(mut self, name: T, method: MethodDescriptor) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn set_resource<T: Into<String>>(mut self, name: T, resource: ResourceDescriptor) -> Self {
        self.resources.insert(name.into(), resource);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn service_path(&self) -> &str {
        &self.service_path
    }

    /// Methods attached directly to the service, outside any resource.
    pub fn methods(&self) -> &BTreeMap<String, MethodDescriptor> {
        &self.methods
    }

    pub fn resources(&self) -> &BTreeMap<String, ResourceDescriptor> {
        &self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn method_required_params() -> anyhow::Result<()> {
        let m = MethodDescriptor::new(
            "drive.comments.get",
            Method::GET,
            "files/{fileId}/comments/{commentId}",
        )?
        .set_optional_params(["includeDeleted", "fileId"])
        .set_required_params(["commentId", "extra"]);
        assert_eq!(m.required_params(), &["fileId", "commentId", "extra"]);
        assert_eq!(
            m.optional_params().iter().collect::<Vec<_>>(),
            vec!["includeDeleted"]
        );
        assert!(m.is_path_param("fileId"), "{m:?}");
        assert!(!m.is_path_param("extra"), "{m:?}");
        assert!(m.is_known_param("includeDeleted"), "{m:?}");
        assert!(!m.is_known_param("q"), "{m:?}");
        Ok(())
    }

    #[test]
    fn promote_optional_to_required() -> anyhow::Result<()> {
        let m = MethodDescriptor::new("drive.files.export", Method::GET, "files/{fileId}/export")?
            .set_optional_params(["mimeType"])
            .set_required_params(["mimeType"]);
        assert_eq!(m.required_params(), &["fileId", "mimeType"]);
        assert!(m.optional_params().is_empty(), "{m:?}");
        Ok(())
    }

    #[test]
    fn media() -> anyhow::Result<()> {
        let m = MethodDescriptor::new("drive.files.create", Method::POST, "files")?
            .set_media_upload(
                MediaUpload::new("/upload/drive/v3/files")?
                    .set_accept(["*/*"])
                    .set_max_size("5497558138880"),
            );
        assert_eq!(m.media_download(), MediaDownload::None);
        let upload = m.media_upload().expect("upload is set");
        assert_eq!(upload.path().as_str(), "/upload/drive/v3/files");
        assert_eq!(upload.accept(), &["*/*"]);
        assert_eq!(upload.max_size(), Some("5497558138880"));
        Ok(())
    }

    #[test]
    fn service_normalizes_urls() {
        let s = ServiceDescriptor::new("drive", "v3", "https://www.googleapis.com", "/drive/v3/");
        assert_eq!(s.root_url(), "https://www.googleapis.com/");
        assert_eq!(s.service_path(), "drive/v3/");
        assert_eq!(s.name(), "drive");
        assert_eq!(s.version(), "v3");

        let s = s.set_root_url("http://127.0.0.1:8080");
        assert_eq!(s.root_url(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn nested_resources() -> anyhow::Result<()> {
        let list = MethodDescriptor::new("drive.files.list", Method::GET, "files")?;
        let s = ServiceDescriptor::new("drive", "v3", "https://www.googleapis.com/", "drive/v3/")
            .set_resource(
                "files",
                ResourceDescriptor::new()
                    .set_method("list", list.clone())
                    .set_resource("revisions", ResourceDescriptor::new()),
            );
        let files = &s.resources()["files"];
        assert_eq!(files.methods()["list"], list);
        assert!(files.resources().contains_key("revisions"), "{s:?}");
        Ok(())
    }
}
