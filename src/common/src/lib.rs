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

//! Google APIs Client Library for Rust - runtime for discovery-based APIs.
//!
//! This crate turns a description of a REST service (its resources, methods,
//! and parameters) into a [Service][service::Service] that validates the
//! parameters of each call, builds the HTTP request, and hands it to a
//! pluggable [Transport][transport::Transport].
//!
//! Most applications use this crate through the `googleapis` crate, which
//! bundles the descriptions of specific services.
//!
//! # Example
//! ```no_run
//! # use google_apis_common::client_builder::ServiceBuilder;
//! # use google_apis_common::params::Params;
//! # tokio_test::block_on(async {
//! let drive = ServiceBuilder::new()
//!     .with_api_key("my-api-key")
//!     .discover("drive", "v3")
//!     .await?;
//! let list = drive.lookup("files.list").expect("drive has a files.list method");
//! let response = list.send(Params::new().set("q", "name contains 'report'")).await?;
//! println!("{:?}", response.json());
//! # anyhow::Ok(()) });
//! ```

pub mod client_builder;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod handle;
pub mod params;
pub mod path_template;
pub mod reporter;
pub mod request;
pub mod response;
pub mod service;
pub mod transport;
pub mod validate;

/// The result type for calls.
pub type Result<T> = std::result::Result<T, crate::error::Error>;
