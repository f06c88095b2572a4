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

/// A failure to build a request from its parameters.
///
/// Methods declare which parameters are required. Path parameters are always
/// required. The client cannot build the request URL, or the service would
/// reject the request, when any of them is missing.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum BindingError {
    /// One or more required parameters were not set, or were set to `null`.
    #[error("missing required parameters: {}", .0.join(", "))]
    MissingRequiredParameters(Vec<String>),

    /// A parameter bag was built from a JSON value that is not an object.
    #[error("the request parameters must be a JSON object, got `{0}`")]
    NotAnObject(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_single() {
        let e = BindingError::MissingRequiredParameters(vec!["fileId".to_string()]);
        assert_eq!(e.to_string(), "missing required parameters: fileId");
    }

    #[test]
    fn fmt_multiple() {
        let e = BindingError::MissingRequiredParameters(vec![
            "fileId".to_string(),
            "mimeType".to_string(),
        ]);
        assert_eq!(
            e.to_string(),
            "missing required parameters: fileId, mimeType"
        );
    }

    #[test]
    fn fmt_not_an_object() {
        let e = BindingError::NotAnObject("[1,2]".to_string());
        assert!(e.to_string().contains("[1,2]"), "{e}");
    }
}
