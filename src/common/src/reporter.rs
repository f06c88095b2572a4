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

//! Where errors go when nobody is listening.
//!
//! Calls made without a callback report their errors to an [ErrorReporter].
//! Unless a service is configured with its own reporter, that is the
//! process-wide default, which logs each error using [tracing].

use crate::error::Error;
use std::sync::{Arc, RwLock};

/// Receives the errors of calls made without a callback.
///
/// Implementations must not panic. Each failed call is reported exactly
/// once.
pub trait ErrorReporter: Send + Sync + std::fmt::Debug {
    fn report(&self, error: &Error);
}

/// The default [ErrorReporter], logs each error as a `tracing` event.
///
/// The event includes the HTTP status code, if any, as the `code` field.
#[derive(Clone, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &Error) {
        match error.code() {
            Some(code) => tracing::error!(code, "{error}"),
            None => tracing::error!("{error}"),
        }
    }
}

lazy_static::lazy_static! {
    static ref DEFAULT_REPORTER: RwLock<Arc<dyn ErrorReporter>> =
        RwLock::new(Arc::new(TracingReporter));
}

/// Replaces the process-wide default reporter, returning the previous one.
pub fn set_default_reporter(reporter: Arc<dyn ErrorReporter>) -> Arc<dyn ErrorReporter> {
    let mut guard = DEFAULT_REPORTER
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    std::mem::replace(&mut *guard, reporter)
}

/// Returns the process-wide default reporter.
pub fn default_reporter() -> Arc<dyn ErrorReporter> {
    DEFAULT_REPORTER
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
