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

use crate::Result;
use crate::descriptor::MethodDescriptor;
use crate::error::Error;
use crate::params::Params;

/// Verifies `params` has a value for each required parameter of `method`.
///
/// A parameter set to `null` is missing. On failure, the error lists all the
/// missing parameters, in the order the method declares them. Parameters the
/// method does not declare are not an error.
pub fn validate(method: &MethodDescriptor, params: &Params) -> Result<()> {
    let missing = method
        .required_params()
        .iter()
        .filter(|name| !params.contains(name))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        return Ok(());
    }
    tracing::debug!(method = method.id(), ?missing, "missing required parameters");
    Err(Error::missing(missing))
}
