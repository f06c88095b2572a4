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

//! Services, their resources, and their bound methods.
//!
//! A [Service] is assembled once from a [ServiceDescriptor] and never
//! changes after that. All the types in this module are cheap to clone and
//! only offer read access, so a service can be shared freely across tasks.

use crate::Result;
use crate::client_builder::{ServiceBuilder, ServiceOptions, tracing_enabled};
use crate::descriptor::{MethodDescriptor, ResourceDescriptor, ServiceDescriptor};
use crate::error::Error;
use crate::handle::{RequestHandle, RequestState};
use crate::params::{Auth, Params};
use crate::reporter::{ErrorReporter, default_reporter};
use crate::request::{RequestDescriptor, build};
use crate::response::{Response, decode};
use crate::transport::SharedTransport;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

type Callback = Box<dyn FnOnce(Result<Response>) + Send + 'static>;

/// A service, e.g. Google Drive v3.
///
/// # Example
/// ```
/// # use google_apis_common::client_builder::ServiceBuilder;
/// # use google_apis_common::descriptor::*;
/// # use google_apis_common::params::Params;
/// # let descriptor = ServiceDescriptor::new("drive", "v3", "https://www.googleapis.com/", "drive/v3/")
/// #     .set_resource("files", ResourceDescriptor::new().set_method(
/// #         "list", MethodDescriptor::new("drive.files.list", http::Method::GET, "files")?));
/// let drive = ServiceBuilder::new().build(descriptor)?;
/// let list = drive.lookup("files.list").expect("drive has a files.list method");
/// let request = list.request(&Params::new().set("q", "hello"))?;
/// assert_eq!(request.url(), "https://www.googleapis.com/drive/v3/files");
/// # anyhow::Ok(())
/// ```
#[derive(Clone, Debug)]
pub struct Service {
    inner: Arc<ServiceInner>,
}

#[derive(Debug)]
struct ServiceInner {
    descriptor: Arc<ServiceDescriptor>,
    options: ServiceOptions,
    global: ServiceOptions,
    methods: BTreeMap<String, Method>,
    resources: BTreeMap<String, Resource>,
}

impl Service {
    pub fn name(&self) -> &str {
        self.inner.descriptor.name()
    }

    pub fn version(&self) -> &str {
        self.inner.descriptor.version()
    }

    /// The root URL, after applying any endpoint override.
    pub fn root_url(&self) -> &str {
        self.inner.descriptor.root_url()
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.inner.descriptor
    }

    /// The options this service was created with.
    pub fn options(&self) -> &ServiceOptions {
        &self.inner.options
    }

    /// The global options in effect when this service was created.
    pub fn global_options(&self) -> &ServiceOptions {
        &self.inner.global
    }

    pub fn methods(&self) -> &BTreeMap<String, Method> {
        &self.inner.methods
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.inner.methods.get(name)
    }

    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.inner.resources
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.inner.resources.get(name)
    }

    /// Finds a method by its dotted path, e.g. `files.export` or
    /// `files.revisions.get`.
    pub fn lookup(&self, path: &str) -> Option<&Method> {
        let (resources, method) = match path.rsplit_once('.') {
            None => return self.method(path),
            Some(split) => split,
        };
        let mut names = resources.split('.');
        let first = self.resource(names.next()?)?;
        names
            .try_fold(first, |r, name| r.resource(name))?
            .method(method)
    }
}

/// A group of methods, e.g. `files` in Google Drive.
#[derive(Clone, Debug)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

#[derive(Debug)]
struct ResourceInner {
    methods: BTreeMap<String, Method>,
    resources: BTreeMap<String, Resource>,
}

impl Resource {
    pub fn methods(&self) -> &BTreeMap<String, Method> {
        &self.inner.methods
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.inner.methods.get(name)
    }

    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.inner.resources
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.inner.resources.get(name)
    }
}

/// A method bound to its service.
///
/// Calls return a [RequestHandle] immediately. Invalid requests, e.g. with
/// missing required parameters, are rejected before returning. Valid
/// requests are sent by a background task, which requires a Tokio runtime.
///
/// Each call delivers its outcome exactly once: to the callback if there is
/// one, or, for errors only, to the service [ErrorReporter].
#[derive(Clone, Debug)]
pub struct Method {
    context: Arc<CallContext>,
    descriptor: Arc<MethodDescriptor>,
}

impl Method {
    /// The method id, e.g. `drive.files.list`.
    pub fn id(&self) -> &str {
        self.descriptor.id()
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Calls the method, errors go to the error reporter.
    pub fn call(&self, params: Params) -> RequestHandle {
        self.dispatch(params, None)
    }

    /// Calls the method, the outcome goes to `callback`.
    pub fn call_with<F>(&self, params: Params, callback: F) -> RequestHandle
    where
        F: FnOnce(Result<Response>) + Send + 'static,
    {
        self.dispatch(params, Some(Box::new(callback)))
    }

    /// Calls the method and waits for the outcome.
    ///
    /// Errors are returned to the caller and are not reported.
    pub async fn send(&self, params: Params) -> Result<Response> {
        let params = self.context.defaults.merged(&params);
        let request = build(&self.context.service, &self.descriptor, &params)?;
        let transport = self.context.transport_for(&params);
        execute(&transport, request).await
    }

    /// Builds the request for a call with `params`, without sending it.
    pub fn request(&self, params: &Params) -> Result<RequestDescriptor> {
        let params = self.context.defaults.merged(params);
        build(&self.context.service, &self.descriptor, &params)
    }

    fn dispatch(&self, params: Params, callback: Option<Callback>) -> RequestHandle {
        let (mut handle, state) = RequestHandle::new(self.descriptor.id());
        let params = self.context.defaults.merged(&params);
        let request = match build(&self.context.service, &self.descriptor, &params) {
            Ok(r) => r,
            Err(e) => {
                state.finish(RequestState::Errored, || {
                    self.context.deliver(callback, Err(e))
                });
                return handle;
            }
        };
        handle.set_descriptor(request.clone());
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(r) => r,
            Err(e) => {
                state.finish(RequestState::Errored, || {
                    self.context.deliver(callback, Err(Error::io(e)))
                });
                return handle;
            }
        };

        let id = handle.id();
        tracing::debug!(%id, method = self.id(), url = request.url(), "dispatching request");
        let span = if self.context.tracing {
            tracing::info_span!(
                "google_apis::request",
                %id,
                method = self.id(),
                http.method = %request.method(),
                url = request.url(),
            )
        } else {
            tracing::Span::none()
        };
        let transport = self.context.transport_for(&params);
        let context = self.context.clone();
        state.set(RequestState::Dispatched);
        runtime.spawn(
            async move {
                let result = execute(&transport, request).await;
                let next = match &result {
                    Ok(r) => {
                        tracing::info!(status = r.status().as_u16(), "request completed");
                        RequestState::Completed
                    }
                    Err(e) => {
                        tracing::info!(code = e.code(), "request failed");
                        RequestState::Failed
                    }
                };
                state.finish(next, || context.deliver(callback, result));
            }
            .instrument(span),
        );
        handle
    }
}

#[derive(Debug)]
struct CallContext {
    service: Arc<ServiceDescriptor>,
    defaults: Params,
    transport: SharedTransport,
    reporter: Option<Arc<dyn ErrorReporter>>,
    tracing: bool,
}

impl CallContext {
    fn transport_for(&self, params: &Params) -> SharedTransport {
        match params.auth() {
            Some(Auth::Transport(t)) => t.clone(),
            _ => self.transport.clone(),
        }
    }

    fn deliver(&self, callback: Option<Callback>, result: Result<Response>) {
        match (callback, result) {
            (Some(callback), result) => callback(result),
            (None, Err(e)) => self
                .reporter
                .clone()
                .unwrap_or_else(default_reporter)
                .report(&e),
            (None, Ok(_)) => {}
        }
    }
}

async fn execute(transport: &SharedTransport, request: RequestDescriptor) -> Result<Response> {
    let response = transport.execute(request.clone()).await?;
    decode(&request, response)
}

/// Assembles the service tree.
///
/// Every construction path ends here, with a complete descriptor, so the
/// resulting services have the same shape and behavior.
pub(crate) fn assemble(
    builder: ServiceBuilder,
    transport: SharedTransport,
    descriptor: ServiceDescriptor,
) -> Service {
    let descriptor = Arc::new(descriptor);
    let context = Arc::new(CallContext {
        service: descriptor.clone(),
        defaults: builder.global.params().merged(builder.options.params()),
        transport,
        reporter: builder.reporter,
        tracing: tracing_enabled(&builder.options, &builder.global),
    });
    let methods = bind_methods(&context, descriptor.methods());
    let resources = bind_resources(&context, descriptor.resources());
    Service {
        inner: Arc::new(ServiceInner {
            descriptor,
            options: builder.options,
            global: builder.global,
            methods,
            resources,
        }),
    }
}

fn bind_methods(
    context: &Arc<CallContext>,
    methods: &BTreeMap<String, MethodDescriptor>,
) -> BTreeMap<String, Method> {
    methods
        .iter()
        .map(|(name, m)| {
            let method = Method {
                context: context.clone(),
                descriptor: Arc::new(m.clone()),
            };
            (name.clone(), method)
        })
        .collect()
}

fn bind_resources(
    context: &Arc<CallContext>,
    resources: &BTreeMap<String, ResourceDescriptor>,
) -> BTreeMap<String, Resource> {
    resources
        .iter()
        .map(|(name, r)| {
            let resource = Resource {
                inner: Arc::new(ResourceInner {
                    methods: bind_methods(context, r.methods()),
                    resources: bind_resources(context, r.resources()),
                }),
            };
            (name.clone(), resource)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::tests::RecordingReporter;
    use crate::response::ResponseBody;
    use crate::transport::{Transport, TransportResponse};
    use http::{Method as HttpMethod, StatusCode};
    use serde_json::json;
    use std::sync::Mutex;

    static_assertions::assert_impl_all!(Service: Clone, Send, Sync);
    static_assertions::assert_impl_all!(Resource: Clone, Send, Sync);
    static_assertions::assert_impl_all!(Method: Clone, Send, Sync);

    mockall::mock! {
        #[derive(Debug)]
        Transport {}
        impl Transport for Transport {
            fn execute(&self, request: RequestDescriptor) -> impl Future<Output = Result<TransportResponse>> + Send;
        }
    }

    fn descriptor() -> anyhow::Result<ServiceDescriptor> {
        let files = ResourceDescriptor::new()
            .set_method(
                "list",
                MethodDescriptor::new("drive.files.list", HttpMethod::GET, "files")?
                    .set_optional_params(["q"]),
            )
            .set_method(
                "get",
                MethodDescriptor::new("drive.files.get", HttpMethod::GET, "files/{fileId}")?,
            )
            .set_resource(
                "revisions",
                ResourceDescriptor::new().set_method(
                    "get",
                    MethodDescriptor::new(
                        "drive.revisions.get",
                        HttpMethod::GET,
                        "files/{fileId}/revisions/{revisionId}",
                    )?,
                ),
            );
        let batch = MethodDescriptor::new("drive.batch", HttpMethod::POST, "batch")?;
        let service =
            ServiceDescriptor::new("drive", "v3", "https://www.googleapis.com/", "drive/v3/");
        Ok(service
            .set_resource("files", files)
            .set_method("batch", batch))
    }

    fn ok_transport(times: usize) -> MockTransport {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(times)
            .returning(|_| Box::pin(async { Ok(TransportResponse::default()) }));
        mock
    }

    #[test]
    fn shape() -> anyhow::Result<()> {
        let service = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .build(descriptor()?)?;
        assert_eq!(service.name(), "drive");
        assert_eq!(service.version(), "v3");
        assert_eq!(
            service.resources().keys().collect::<Vec<_>>(),
            vec!["files"]
        );
        assert_eq!(service.methods().keys().collect::<Vec<_>>(), vec!["batch"]);
        let files = service.resource("files").expect("files exists");
        assert_eq!(
            files.methods().keys().collect::<Vec<_>>(),
            vec!["get", "list"]
        );
        assert_eq!(
            service.lookup("files.revisions.get").map(Method::id),
            Some("drive.revisions.get")
        );
        assert_eq!(service.lookup("batch").map(Method::id), Some("drive.batch"));
        assert!(service.lookup("files.missing").is_none());
        assert!(service.lookup("missing.get").is_none());
        Ok(())
    }

    #[test]
    fn same_descriptor_same_shape() -> anyhow::Result<()> {
        fn shape(service: &Service) -> Vec<(String, Vec<String>)> {
            service
                .resources()
                .iter()
                .map(|(n, r)| (n.clone(), r.methods().keys().cloned().collect()))
                .collect()
        }
        let a = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .build(descriptor()?)?;
        let b = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .build(descriptor()?)?;
        assert_eq!(shape(&a), shape(&b));
        assert!(!Arc::ptr_eq(&a.inner, &b.inner));
        Ok(())
    }

    #[test]
    fn missing_param_with_callback() -> anyhow::Result<()> {
        let reporter = Arc::new(RecordingReporter::default());
        let service = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .with_reporter(reporter.clone())
            .build(descriptor()?)?;
        let got = Arc::new(Mutex::new(None));
        let capture = got.clone();
        let handle = service
            .lookup("files.get")
            .expect("files.get exists")
            .call_with(Params::new(), move |r| {
                *capture.lock().expect("never poisoned") = Some(r);
            });
        assert_eq!(handle.state(), RequestState::Errored);
        assert!(handle.descriptor().is_none(), "{handle:?}");
        let result = got.lock().expect("never poisoned").take();
        let err = match result {
            Some(Err(e)) => e,
            r => panic!("expected an error, got {r:?}"),
        };
        assert_eq!(
            err.missing_parameters(),
            Some(["fileId".to_string()].as_slice())
        );
        assert!(reporter.reports().is_empty(), "{reporter:?}");
        Ok(())
    }

    #[test]
    fn missing_param_without_callback() -> anyhow::Result<()> {
        let reporter = Arc::new(RecordingReporter::default());
        let service = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .with_reporter(reporter.clone())
            .build(descriptor()?)?;
        let get = service.lookup("files.get").expect("files.get exists");
        let handle = get.call(Params::new());
        assert_eq!(handle.state(), RequestState::Errored);
        let reports = reporter.reports();
        assert_eq!(reports.len(), 1, "{reports:?}");
        assert!(reports[0].1.contains("fileId"), "{reports:?}");
        Ok(())
    }

    #[test]
    fn no_runtime() -> anyhow::Result<()> {
        let reporter = Arc::new(RecordingReporter::default());
        let service = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .with_reporter(reporter.clone())
            .build(descriptor()?)?;
        let list = service.lookup("files.list").expect("files.list exists");
        let handle = list.call(Params::new().set("q", "hello"));
        assert_eq!(handle.state(), RequestState::Errored);
        assert!(handle.descriptor().is_some(), "{handle:?}");
        assert_eq!(reporter.reports().len(), 1, "{reporter:?}");
        Ok(())
    }

    #[tokio::test]
    async fn dispatch_with_callback() -> anyhow::Result<()> {
        let service = ServiceBuilder::new()
            .with_transport(ok_transport(1))
            .build(descriptor()?)?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        let list = service.lookup("files.list").expect("files.list exists");
        let handle = list.call_with(Params::new().set("q", "hello"), move |r| {
            let _ = tx.send(r);
        });
        assert_eq!(handle.state(), RequestState::Dispatched);
        let request = handle.descriptor().expect("request was built");
        assert_eq!(request.query_value("q"), Some("hello"));

        let response = rx.await??;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &ResponseBody::Empty);
        assert_eq!(handle.wait().await, RequestState::Completed);
        Ok(())
    }

    #[tokio::test]
    async fn dispatch_failure_is_reported() -> anyhow::Result<()> {
        let mut transport = MockTransport::new();
        transport.expect_execute().times(2).returning(|_| {
            Box::pin(async {
                Ok(TransportResponse::new(StatusCode::NOT_IMPLEMENTED)
                    .set_body(r#"{"error": "not a real error"}"#))
            })
        });
        let reporter = Arc::new(RecordingReporter::default());
        let service = ServiceBuilder::new()
            .with_transport(transport)
            .with_reporter(reporter.clone())
            .build(descriptor()?)?;
        let list = service.lookup("files.list").expect("files.list exists");
        let h1 = list.call(Params::new().set("q", "hello"));
        let h2 = list.call(Params::new().set("q", "hello"));
        assert_eq!(h1.wait().await, RequestState::Failed);
        assert_eq!(h2.wait().await, RequestState::Failed);
        let codes = reporter
            .reports()
            .into_iter()
            .map(|(code, _)| code)
            .collect::<Vec<_>>();
        assert_eq!(codes, vec![Some(501), Some(501)]);
        Ok(())
    }

    #[tokio::test]
    async fn success_without_callback_is_silent() -> anyhow::Result<()> {
        let reporter = Arc::new(RecordingReporter::default());
        let service = ServiceBuilder::new()
            .with_transport(ok_transport(1))
            .with_reporter(reporter.clone())
            .build(descriptor()?)?;
        let list = service.lookup("files.list").expect("files.list exists");
        let handle = list.call(Params::new());
        assert_eq!(handle.wait().await, RequestState::Completed);
        assert!(reporter.reports().is_empty(), "{reporter:?}");
        Ok(())
    }

    #[tokio::test]
    async fn callback_panic_ends_call() -> anyhow::Result<()> {
        let service = ServiceBuilder::new()
            .with_transport(ok_transport(1))
            .build(descriptor()?)?;
        let list = service.lookup("files.list").expect("files.list exists");
        let handle = list.call_with(Params::new(), |_| panic!("callback failure"));
        assert_eq!(handle.wait().await, RequestState::Completed);
        Ok(())
    }

    #[test]
    fn callback_panic_on_missing_params() -> anyhow::Result<()> {
        let service = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .build(descriptor()?)?;
        let get = service.lookup("files.get").expect("files.get exists");
        let (tx, rx) = std::sync::mpsc::channel();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            get.call_with(Params::new(), move |_| {
                let _ = tx.send(());
                panic!("callback failure")
            })
        }));
        assert!(result.is_err(), "the panic reaches the caller");
        rx.try_recv()?;
        Ok(())
    }

    #[tokio::test]
    async fn call_transport_override() -> anyhow::Result<()> {
        let mut per_call = MockTransport::new();
        per_call
            .expect_execute()
            .withf(|r| r.url() == "https://www.googleapis.com/drive/v3/files/abc")
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(TransportResponse::default().set_body(r#"{"id": "abc"}"#))
                })
            });
        let service = ServiceBuilder::new()
            .with_transport(MockTransport::new())
            .build(descriptor()?)?;
        let get = service.lookup("files.get").expect("files.get exists");
        let response = get
            .send(Params::new().set("fileId", "abc").set_transport(per_call))
            .await?;
        assert_eq!(response.json(), Some(&json!({"id": "abc"})));
        Ok(())
    }

    #[tokio::test]
    async fn defaults_are_merged() -> anyhow::Result<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|r| {
                r.query_value("q") == Some("call")
                    && r.query_value("fields") == Some("service")
                    && r.query_value("prettyPrint") == Some("false")
                    && r.query_value("key") == Some("global-key")
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(TransportResponse::default()) }));
        let global = ServiceOptions::new()
            .with_param("prettyPrint", false)
            .with_param("fields", "global")
            .with_param("q", "global")
            .with_api_key("global-key");
        let service = ServiceBuilder::new()
            .with_global_options(global)
            .with_param("fields", "service")
            .with_param("q", "service")
            .with_transport(transport)
            .build(descriptor()?)?;
        let list = service.lookup("files.list").expect("files.list exists");
        list.send(Params::new().set("q", "call")).await?;
        assert_eq!(service.options().params().get("q"), Some(&json!("service")));
        assert_eq!(
            service.global_options().params().get("q"),
            Some(&json!("global"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn send_returns_errors() -> anyhow::Result<()> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Box::pin(async { Err(Error::io("connection reset")) }));
        let reporter = Arc::new(RecordingReporter::default());
        let service = ServiceBuilder::new()
            .with_transport(transport)
            .with_reporter(reporter.clone())
            .build(descriptor()?)?;
        let list = service.lookup("files.list").expect("files.list exists");
        let err = list.send(Params::new()).await.unwrap_err();
        assert!(err.is_io(), "{err:?}");
        assert!(reporter.reports().is_empty(), "{reporter:?}");
        Ok(())
    }
}
