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

//! The bundled discovery documents.

/// `(name, version, contents)` for each bundled API.
pub(crate) const BUNDLED: &[(&str, &str, &[u8])] =
    &[("drive", "v3", include_bytes!("apis/drive/v3.json"))];

pub(crate) fn find(name: &str, version: &str) -> Option<&'static [u8]> {
    BUNDLED
        .iter()
        .find(|(n, v, _)| *n == name && *v == version)
        .map(|(_, _, contents)| *contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_apis_common::descriptor::ServiceDescriptor;
    use google_apis_common::discovery::Document;

    #[test]
    fn all_bundled_parse() -> anyhow::Result<()> {
        for (name, version, contents) in BUNDLED {
            let descriptor = ServiceDescriptor::try_from(Document::from_slice(contents)?)?;
            assert_eq!(descriptor.name(), *name);
            assert_eq!(descriptor.version(), *version);
        }
        Ok(())
    }

    #[test]
    fn find_drive() {
        assert!(find("drive", "v3").is_some());
        assert!(find("drive", "v2").is_none());
        assert!(find("gmail", "v3").is_none());
    }
}
