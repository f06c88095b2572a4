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

mod core_error;
pub use core_error::*;

/// Errors and error details related to local parameter validation.
///
/// These errors occur when required parameters in a request are missing. The
/// client fails these requests locally, they never reach the transport.
pub mod binding;

/// Error details returned by Google API services.
///
/// Google APIs report errors using a JSON envelope. The types in this module
/// represent that envelope once it has been parsed.
///
/// # Examples
///
/// ```
/// use google_apis_common::error::Error;
/// fn handle_error(e: Error) {
///     if let Some(status) = e.status() {
///         println!("code={} message={}", status.code, status.message);
///     }
/// }
/// ```
pub mod rpc;
