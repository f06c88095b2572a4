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

use super::binding::BindingError;
use super::rpc::Status;
use bytes::Bytes;
use http::HeaderMap;
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The error delivered by every call, to its callback or to the error
/// reporter.
///
/// There are three families of errors:
/// - binding errors: the request could not be built, typically because a
///   required parameter is missing. These never reach the transport.
/// - transport errors: the request was dispatched but failed. The service
///   may have returned an unsuccessful status, possibly with a Google API
///   error envelope, or the transport may have failed or timed out.
/// - (de)serialization errors for payloads that cannot be encoded or decoded.
///
/// Construction errors are not represented here, see
/// [client_builder::Error][crate::client_builder::Error].
///
/// Use [code()][Error::code] for an HTTP-status-like number. The default
/// error reporter logs it.
///
/// # Example
/// ```
/// use google_apis_common::error::Error;
/// fn describe(e: &Error) -> String {
///     match e {
///         e if e.is_binding() => format!("missing {:?}", e.missing_parameters()),
///         e if e.code() == Some(404) => "no such file".to_string(),
///         e => format!("failed: {e}"),
///     }
/// }
/// let e = Error::http(404, http::HeaderMap::new(), bytes::Bytes::from_static(b"NOT FOUND"));
/// assert_eq!(describe(&e), "no such file");
/// let e = Error::missing(["fileId"]);
/// assert!(describe(&e).contains("fileId"));
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

#[derive(Debug)]
enum ErrorKind {
    Binding,
    Serialization,
    Deserialization,
    Timeout,
    Io,
    Http(Box<HttpResponse>),
    Service(Box<ServiceResponse>),
}

#[derive(Debug)]
struct HttpResponse {
    status_code: u16,
    headers: HeaderMap,
    payload: Bytes,
}

#[derive(Debug)]
struct ServiceResponse {
    status: Status,
    status_code: Option<u16>,
    headers: Option<HeaderMap>,
}

impl Error {
    fn new(kind: ErrorKind, source: Option<BoxError>) -> Self {
        Self { kind, source }
    }

    /// Creates an error from a Google API error envelope.
    ///
    /// # Example
    /// ```
    /// use google_apis_common::error::Error;
    /// use google_apis_common::error::rpc::Status;
    /// let status = Status::default().set_code(404).set_message("File not found: abc");
    /// let error = Error::service(status.clone());
    /// assert_eq!(error.status(), Some(&status));
    /// assert_eq!(error.code(), Some(404));
    /// ```
    pub fn service(status: Status) -> Self {
        Self::service_with_http_metadata(status, None, None)
    }

    /// Creates an error from a Google API error envelope and the HTTP
    /// response that carried it.
    pub fn service_with_http_metadata(
        status: Status,
        status_code: Option<u16>,
        headers: Option<HeaderMap>,
    ) -> Self {
        let response = ServiceResponse {
            status,
            status_code,
            headers,
        };
        Self::new(ErrorKind::Service(Box::new(response)), None)
    }

    /// An unsuccessful HTTP response without an error envelope.
    pub fn http(status_code: u16, headers: HeaderMap, payload: Bytes) -> Self {
        let response = HttpResponse {
            status_code,
            headers,
            payload,
        };
        Self::new(ErrorKind::Http(Box::new(response)), None)
    }

    /// The transport failed without a response, e.g. the connection was
    /// refused.
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Io, Some(source.into()))
    }

    /// The transport gave up waiting for the response.
    ///
    /// # Example
    /// ```
    /// use google_apis_common::error::Error;
    /// let error = Error::timeout("simulated timeout");
    /// assert!(error.is_timeout());
    /// assert!(error.is_transport());
    /// ```
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Timeout, Some(source.into()))
    }

    pub fn binding<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Binding, Some(source.into()))
    }

    /// A binding error naming the missing required parameters.
    pub fn missing<I, V>(names: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        Self::binding(BindingError::MissingRequiredParameters(names))
    }

    pub fn ser<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Serialization, Some(source.into()))
    }

    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Deserialization, Some(source.into()))
    }

    /// The request could not be built from the parameters.
    ///
    /// Typically this indicates a problem in the application. Use
    /// [missing_parameters()][Error::missing_parameters] to find out which
    /// parameters need to be set.
    pub fn is_binding(&self) -> bool {
        matches!(self.kind, ErrorKind::Binding)
    }

    /// The request was dispatched and did not succeed.
    ///
    /// True for unsuccessful responses, with or without an error envelope,
    /// for I/O errors, and for timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Http(_) | ErrorKind::Service(_) | ErrorKind::Io | ErrorKind::Timeout
        )
    }

    /// The transport failed before receiving a full response.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// The request did not complete before the transport timeout.
    ///
    /// The service may or may not have processed the request.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// The request body or headers could not be encoded.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization)
    }

    /// The service returned a successful status with a payload that is not
    /// valid JSON.
    ///
    /// Media downloads never produce this error, their payload is returned
    /// as raw bytes.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    /// The names of the missing required parameters, in the order the
    /// method declares them.
    ///
    /// # Example
    /// ```
    /// use google_apis_common::error::Error;
    /// let error = Error::missing(["fileId"]);
    /// assert_eq!(error.missing_parameters(), Some(&["fileId".to_string()][..]));
    /// ```
    pub fn missing_parameters(&self) -> Option<&[String]> {
        if !self.is_binding() {
            return None;
        }
        match self.source.as_ref()?.downcast_ref::<BindingError>()? {
            BindingError::MissingRequiredParameters(names) => Some(names.as_slice()),
            _ => None,
        }
    }

    /// The error envelope returned by the service, if any.
    pub fn status(&self) -> Option<&Status> {
        match &self.kind {
            ErrorKind::Service(r) => Some(&r.status),
            _ => None,
        }
    }

    pub fn http_status_code(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http(r) => Some(r.status_code),
            ErrorKind::Service(r) => r.status_code,
            _ => None,
        }
    }

    pub fn http_headers(&self) -> Option<&HeaderMap> {
        match &self.kind {
            ErrorKind::Http(r) => Some(&r.headers),
            ErrorKind::Service(r) => r.headers.as_ref(),
            _ => None,
        }
    }

    /// The body of an unsuccessful response without an error envelope.
    pub fn http_payload(&self) -> Option<&Bytes> {
        match &self.kind {
            ErrorKind::Http(r) => Some(&r.payload),
            _ => None,
        }
    }

    /// The HTTP-status-like code for this error.
    ///
    /// This is the status code of the response, or the code in the error
    /// envelope if the status code is unknown. Errors without a response
    /// have no code.
    ///
    /// # Example
    /// ```
    /// use google_apis_common::error::Error;
    /// let error = Error::http(501, http::HeaderMap::new(), bytes::Bytes::new());
    /// assert_eq!(error.code(), Some(501));
    /// assert_eq!(Error::io("connection refused").code(), None);
    /// ```
    pub fn code(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Service(r) => r.status_code.or_else(|| u16::try_from(r.status.code).ok()),
            _ => self.http_status_code(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = self
            .source
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        match &self.kind {
            ErrorKind::Binding => write!(f, "cannot build the request: {source}"),
            ErrorKind::Serialization => write!(f, "cannot serialize the request: {source}"),
            ErrorKind::Deserialization => write!(f, "cannot deserialize the response: {source}"),
            ErrorKind::Timeout => write!(f, "the request timed out: {source}"),
            ErrorKind::Io => write!(f, "the transport failed: {source}"),
            ErrorKind::Http(r) => match std::str::from_utf8(&r.payload) {
                Ok(body) => write!(f, "the service returned HTTP {}: {body}", r.status_code),
                Err(_) => write!(
                    f,
                    "the service returned HTTP {}: {:?}",
                    r.status_code, r.payload
                ),
            },
            ErrorKind::Service(r) => write!(
                f,
                "the service returned error {}: {}",
                r.status.code, r.status.message
            ),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        headers
    }

    #[test]
    fn service() {
        let status = Status::default()
            .set_code(404)
            .set_message("File not found: abc");
        let error = Error::service(status.clone());
        assert!(error.is_transport(), "{error:?}");
        assert!(!error.is_io(), "{error:?}");
        assert!(error.source().is_none(), "{error:?}");
        assert_eq!(error.status(), Some(&status));
        assert_eq!(error.code(), Some(404));
        assert!(error.http_status_code().is_none(), "{error:?}");
        let fmt = error.to_string();
        assert!(
            fmt.contains("404") && fmt.contains("File not found"),
            "{fmt}"
        );
    }

    #[test]
    fn service_with_http_metadata() {
        let status = Status::default().set_code(404).set_message("gone");
        let error =
            Error::service_with_http_metadata(status.clone(), Some(410), Some(json_headers()));
        assert_eq!(error.status(), Some(&status));
        assert_eq!(error.http_status_code(), Some(410));
        assert_eq!(error.code(), Some(410));
        assert_eq!(error.http_headers(), Some(&json_headers()));
        assert!(error.http_payload().is_none(), "{error:?}");
    }

    #[test]
    fn http() {
        let payload = Bytes::from_static(br#"{"error": "not a real error"}"#);
        let error = Error::http(501, json_headers(), payload.clone());
        assert!(error.is_transport(), "{error:?}");
        assert!(!error.is_io(), "{error:?}");
        assert!(error.status().is_none(), "{error:?}");
        assert_eq!(error.code(), Some(501));
        assert_eq!(error.http_headers(), Some(&json_headers()));
        assert_eq!(error.http_payload(), Some(&payload));
        let fmt = error.to_string();
        assert!(
            fmt.contains("501") && fmt.contains("not a real error"),
            "{fmt}"
        );
    }

    #[test]
    fn http_binary_payload() {
        let payload = Bytes::from_static(&[0xFF, 0xFE]);
        let error = Error::http(500, HeaderMap::new(), payload.clone());
        let fmt = error.to_string();
        assert!(fmt.contains(&format!("{payload:?}")), "{fmt}");
    }

    #[test]
    fn io_and_timeout() {
        let error = Error::io("connection refused");
        assert!(error.is_io() && error.is_transport(), "{error:?}");
        assert!(!error.is_timeout(), "{error:?}");
        assert!(error.code().is_none(), "{error:?}");
        assert!(error.http_headers().is_none(), "{error:?}");
        assert!(error.to_string().contains("connection refused"), "{error}");

        let error = Error::timeout("deadline exceeded");
        assert!(error.is_timeout() && error.is_transport(), "{error:?}");
        assert!(!error.is_io(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
        assert!(error.code().is_none(), "{error:?}");
    }

    #[test]
    fn missing() {
        let error = Error::missing(["fileId", "mimeType"]);
        assert!(error.is_binding(), "{error:?}");
        assert!(!error.is_transport(), "{error:?}");
        assert_eq!(
            error.missing_parameters(),
            Some(&["fileId".to_string(), "mimeType".to_string()][..])
        );
        assert!(error.code().is_none(), "{error:?}");
        let fmt = error.to_string();
        assert!(fmt.contains("fileId") && fmt.contains("mimeType"), "{fmt}");
    }

    #[test]
    fn binding_without_missing_parameters() {
        let error = Error::binding("invalid URL");
        assert!(error.is_binding(), "{error:?}");
        assert!(error.missing_parameters().is_none(), "{error:?}");

        let error = Error::io(BindingError::MissingRequiredParameters(vec!["x".into()]));
        assert!(error.missing_parameters().is_none(), "{error:?}");
    }

    #[test]
    fn ser_and_deser() {
        let error = Error::ser("bad header");
        assert!(error.is_serialization(), "{error:?}");
        assert!(error.to_string().contains("bad header"), "{error}");

        let error = Error::deser("bad json");
        assert!(error.is_deserialization(), "{error:?}");
        assert!(!error.is_transport(), "{error:?}");
        assert!(error.to_string().contains("bad json"), "{error}");
    }
}
