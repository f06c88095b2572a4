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

//! Parses and expands the path templates used in method descriptors.
//!
//! Discovery documents describe method paths with [RFC 6570] templates. Only
//! two forms appear in practice: simple expansion (`files/{fileId}`), which
//! percent-encodes every reserved character, and reserved expansion
//! (`{+name}`), which keeps `/` so a variable can span several segments.
//!
//! [RFC 6570]: https://www.rfc-editor.org/rfc/rfc6570

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters encoded in simple expansion.
const SIMPLE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Characters encoded in reserved expansion.
const RESERVED: &AsciiSet = &SIMPLE.remove(b'/');

#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("unterminated variable starting at offset {0} in `{1}`")]
    Unterminated(usize, String),
    #[error("empty variable name at offset {0} in `{1}`")]
    EmptyVariable(usize, String),
    #[error("unexpected `}}` at offset {0} in `{1}`")]
    UnexpectedClose(usize, String),
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Literal(String),
    Variable { name: String, reserved: bool },
}

/// A parsed path template, e.g. `files/{fileId}/export`.
///
/// # Example
/// ```
/// # use google_apis_common::path_template::PathTemplate;
/// let template = PathTemplate::parse("files/{fileId}/export")?;
/// assert_eq!(template.variables().collect::<Vec<_>>(), vec!["fileId"]);
/// let path = template.expand(|name| (name == "fileId").then(|| "a b".to_string()));
/// assert_eq!(path.as_deref(), Some("files/a%20b/export"));
/// # Ok::<(), google_apis_common::path_template::TemplateError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = template;
        let mut offset = 0;
        while !rest.is_empty() {
            let open = rest.find('{');
            let close = rest.find('}');
            match (open, close) {
                (None, None) => {
                    segments.push(Segment::Literal(rest.to_string()));
                    break;
                }
                (None, Some(c)) => {
                    return Err(TemplateError::UnexpectedClose(offset + c, template.to_string()));
                }
                (Some(o), Some(c)) if c < o => {
                    return Err(TemplateError::UnexpectedClose(offset + c, template.to_string()));
                }
                (Some(o), None) => {
                    return Err(TemplateError::Unterminated(offset + o, template.to_string()));
                }
                (Some(o), Some(c)) => {
                    if o > 0 {
                        segments.push(Segment::Literal(rest[..o].to_string()));
                    }
                    let expr = &rest[o + 1..c];
                    let (name, reserved) = match expr.strip_prefix('+') {
                        Some(n) => (n, true),
                        None => (expr, false),
                    };
                    if name.is_empty() || name.contains('{') {
                        return Err(TemplateError::EmptyVariable(offset + o, template.to_string()));
                    }
                    segments.push(Segment::Variable {
                        name: name.to_string(),
                        reserved,
                    });
                    offset += c + 1;
                    rest = &rest[c + 1..];
                }
            }
        }
        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The names of the variables in the template, in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Expands the template, returns `None` if any variable has no value.
    pub fn expand<F>(&self, mut value: F) -> Option<String>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut path = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(l) => path.push_str(l),
                Segment::Variable { name, reserved } => {
                    let v = value(name)?;
                    let set = if *reserved { RESERVED } else { SIMPLE };
                    path.push_str(&utf8_percent_encode(&v, set).to_string());
                }
            }
        }
        Some(path)
    }

    /// The template as written in the descriptor.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn values(name: &str) -> Option<String> {
        match name {
            "fileId" => Some("abc".to_string()),
            "name" => Some("projects/p/secrets/s".to_string()),
            "spaced" => Some("a b/c?d".to_string()),
            _ => None,
        }
    }

    #[test_case("files", "files")]
    #[test_case("files/{fileId}", "files/abc")]
    #[test_case("files/{fileId}/export", "files/abc/export")]
    #[test_case("{fileId}", "abc")]
    #[test_case("v1/{+name}:access", "v1/projects/p/secrets/s:access")]
    #[test_case("v1/{name}", "v1/projects%2Fp%2Fsecrets%2Fs")]
    #[test_case("x/{spaced}", "x/a%20b%2Fc%3Fd")]
    #[test_case("x/{+spaced}", "x/a%20b/c%3Fd")]
    fn expand(input: &str, want: &str) -> Result<(), TemplateError> {
        let template = PathTemplate::parse(input)?;
        assert_eq!(template.expand(values).as_deref(), Some(want));
        assert_eq!(template.to_string(), input);
        Ok(())
    }

    #[test]
    fn expand_missing() -> Result<(), TemplateError> {
        let template = PathTemplate::parse("files/{fileId}/comments/{commentId}")?;
        assert_eq!(template.expand(values), None);
        Ok(())
    }

    #[test]
    fn variables() -> Result<(), TemplateError> {
        let template = PathTemplate::parse("files/{fileId}/comments/{+commentId}")?;
        assert_eq!(
            template.variables().collect::<Vec<_>>(),
            vec!["fileId", "commentId"]
        );
        let template = PathTemplate::parse("about")?;
        assert_eq!(template.variables().count(), 0);
        Ok(())
    }

    #[test_case("files/{fileId"; "unterminated")]
    #[test_case("files/{}"; "empty")]
    #[test_case("files/{+}"; "empty reserved")]
    #[test_case("files/fileId}"; "close without open")]
    #[test_case("files/{a{b}"; "nested")]
    fn parse_errors(input: &str) {
        let got = PathTemplate::parse(input);
        assert!(got.is_err(), "{got:?}");
    }
}
