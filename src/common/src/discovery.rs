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

//! Mappings for a JSON Discovery document, and their conversion into
//! [ServiceDescriptor]s.
//!
//! Only the fields needed to describe how requests are built are mapped.
//! Schemas, scopes, and documentation are ignored.

use crate::descriptor::{
    MediaDownload, MediaUpload, MethodDescriptor, ResourceDescriptor, ServiceDescriptor,
};
use crate::path_template::TemplateError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The path, relative to a root URL, of the discovery service.
const DISCOVERY_PATH: &str = "discovery/v1/apis";

/// Returns the URL of the discovery document for `name` at `version`.
///
/// # Example
/// ```
/// # use google_apis_common::discovery::document_url;
/// assert_eq!(
///     document_url("https://www.googleapis.com/", "drive", "v3"),
///     "https://www.googleapis.com/discovery/v1/apis/drive/v3/rest"
/// );
/// ```
pub fn document_url(root_url: &str, name: &str, version: &str) -> String {
    let root_url = root_url.trim_end_matches('/');
    format!("{root_url}/{DISCOVERY_PATH}/{name}/{version}/rest")
}

/// A discovery document that cannot be turned into a service.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum DiscoveryError {
    #[error("cannot parse the discovery document: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("the discovery document has an empty `{0}` field")]
    EmptyField(&'static str),
    #[error("method `{0}` has no id")]
    MissingId(String),
    #[error("method `{id}` has an invalid HTTP method `{http_method}`")]
    HttpMethod { id: String, http_method: String },
    #[error("method `{id}` has an invalid path: {source}")]
    Path {
        id: String,
        #[source]
        source: TemplateError,
    },
    #[error("method `{id}` uses `{name}` in its path, but does not declare it as a path parameter")]
    UndeclaredPathParameter { id: String, name: String },
    #[error("method `{0}` supports media upload, but has no upload protocol")]
    MissingUploadProtocol(String),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    pub version: String,
    pub root_url: String,
    #[serde(default)]
    pub service_path: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub methods: BTreeMap<String, Method>,
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
}

impl Document {
    pub fn from_slice(contents: &[u8]) -> Result<Self, DiscoveryError> {
        serde_json::from_slice(contents).map_err(DiscoveryError::Parse)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub id: Option<String>,
    pub path: Option<String>,
    pub http_method: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub parameter_order: Vec<String>,
    pub response: Option<SchemaRef>,
    pub media_upload: Option<Upload>,
    pub supports_media_download: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "type")]
    pub parameter_type: Option<String>,
    pub required: Option<bool>,
    pub repeated: Option<bool>,
    pub location: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SchemaRef {
    #[serde(rename = "$ref")]
    pub schema_ref: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    #[serde(default)]
    pub accept: Vec<String>,
    pub max_size: Option<String>,
    #[serde(default)]
    pub protocols: BTreeMap<String, Protocol>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    #[serde(default)]
    pub multipart: bool,
    pub path: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub methods: BTreeMap<String, Method>,
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
}

impl TryFrom<Document> for ServiceDescriptor {
    type Error = DiscoveryError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        if doc.name.is_empty() {
            return Err(DiscoveryError::EmptyField("name"));
        }
        if doc.version.is_empty() {
            return Err(DiscoveryError::EmptyField("version"));
        }
        if doc.root_url.is_empty() {
            return Err(DiscoveryError::EmptyField("rootUrl"));
        }
        // Parameters declared at the document level apply to all methods.
        let globals = doc.parameters.into_keys().collect::<Vec<_>>();
        let service = ServiceDescriptor::new(doc.name, doc.version, doc.root_url, doc.service_path);
        let service = doc
            .methods
            .into_iter()
            .try_fold(service, |s, (name, m)| {
                Ok::<_, DiscoveryError>(s.set_method(name, method_descriptor(m, &globals)?))
            })?;
        doc.resources.into_iter().try_fold(service, |s, (name, r)| {
            Ok(s.set_resource(name, resource_descriptor(r, &globals)?))
        })
    }
}

impl TryFrom<Resource> for ResourceDescriptor {
    type Error = DiscoveryError;

    fn try_from(resource: Resource) -> Result<Self, Self::Error> {
        resource_descriptor(resource, &[])
    }
}

fn resource_descriptor(
    resource: Resource,
    globals: &[String],
) -> Result<ResourceDescriptor, DiscoveryError> {
    let descriptor = resource
        .methods
        .into_iter()
        .try_fold(ResourceDescriptor::new(), |r, (name, m)| {
            Ok::<_, DiscoveryError>(r.set_method(name, method_descriptor(m, globals)?))
        })?;
    resource
        .resources
        .into_iter()
        .try_fold(descriptor, |r, (name, child)| {
            Ok(r.set_resource(name, resource_descriptor(child, globals)?))
        })
}

fn method_descriptor(
    method: Method,
    globals: &[String],
) -> Result<MethodDescriptor, DiscoveryError> {
    let descriptor = MethodDescriptor::try_from(method)?;
    Ok(descriptor.set_optional_params(globals.iter().cloned()))
}

impl TryFrom<Method> for MethodDescriptor {
    type Error = DiscoveryError;

    fn try_from(method: Method) -> Result<Self, Self::Error> {
        let path = method.path.unwrap_or_default();
        let id = method.id.ok_or_else(|| DiscoveryError::MissingId(path.clone()))?;
        let http_method = method.http_method.unwrap_or_else(|| "GET".to_string());
        let http_method = http::Method::from_bytes(http_method.as_bytes()).map_err(|_| {
            DiscoveryError::HttpMethod {
                id: id.clone(),
                http_method: http_method.clone(),
            }
        })?;
        let descriptor = MethodDescriptor::new(id.clone(), http_method, &path)
            .map_err(|source| DiscoveryError::Path {
                id: id.clone(),
                source,
            })?;
        if let Some(name) = descriptor
            .path_params()
            .find(|v| !matches!(method.parameters.get(*v), Some(p) if p.location == "path"))
        {
            return Err(DiscoveryError::UndeclaredPathParameter {
                id,
                name: name.to_string(),
            });
        }

        // `parameterOrder` lists the required parameters in the order
        // callers are expected to provide them, the rest are appended.
        let required = method
            .parameter_order
            .iter()
            .filter(|n| method.parameters.get(*n).and_then(|p| p.required) == Some(true))
            .chain(
                method
                    .parameters
                    .iter()
                    .filter(|(n, p)| {
                        p.required == Some(true) && !method.parameter_order.contains(n)
                    })
                    .map(|(n, _)| n),
            )
            .cloned()
            .collect::<Vec<_>>();
        let optional = method
            .parameters
            .iter()
            .filter(|(_, p)| p.required != Some(true))
            .map(|(n, _)| n.clone())
            .collect::<Vec<_>>();

        let media_download = match (method.supports_media_download, &method.response) {
            (Some(true), None) => MediaDownload::Always,
            (Some(true), Some(_)) => MediaDownload::Optional,
            _ => MediaDownload::None,
        };
        let descriptor = descriptor
            .set_required_params(required)
            .set_optional_params(optional)
            .set_media_download(media_download);

        let Some(upload) = method.media_upload else {
            return Ok(descriptor);
        };
        let protocol = upload
            .protocols
            .get("simple")
            .or_else(|| upload.protocols.values().next())
            .ok_or_else(|| DiscoveryError::MissingUploadProtocol(id.clone()))?;
        let mut media_upload = MediaUpload::new(&protocol.path)
            .map_err(|source| DiscoveryError::Path {
                id: id.clone(),
                source,
            })?
            .set_accept(upload.accept);
        if let Some(max) = upload.max_size {
            media_upload = media_upload.set_max_size(max);
        }
        Ok(descriptor.set_media_upload(media_upload))
    }
}
