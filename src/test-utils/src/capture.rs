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

//! Capture `tracing` events to verify what the code under test logs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber, field};
use tracing_subscriber::{Layer, layer::Context, prelude::*};

/// A captured tracing event.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    /// The formatted message, if the event has one.
    pub message: Option<String>,
    /// The remaining fields, formatted as strings.
    pub fields: BTreeMap<String, String>,
}

/// The events captured so far.
#[derive(Clone, Debug, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedEvents {
    /// Returns a copy of the events captured so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the events captured at `level`.
    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }

    fn push(&self, event: CapturedEvent) {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

struct Visitor<'a> {
    message: &'a mut Option<String>,
    fields: &'a mut BTreeMap<String, String>,
}

impl field::Visit for Visitor<'_> {
    fn record_str(&mut self, field: &field::Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_debug(&mut self, field: &field::Field, value: &dyn std::fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_i64(&mut self, field: &field::Field, value: i64) {
        self.record(field, value.to_string());
    }

    fn record_u64(&mut self, field: &field::Field, value: u64) {
        self.record(field, value.to_string());
    }

    fn record_bool(&mut self, field: &field::Field, value: bool) {
        self.record(field, value.to_string());
    }
}

impl Visitor<'_> {
    fn record(&mut self, field: &field::Field, value: String) {
        if field.name() == "message" {
            *self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

struct CaptureLayer(CapturedEvents);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = None;
        let mut fields = BTreeMap::new();
        event.record(&mut Visitor {
            message: &mut message,
            fields: &mut fields,
        });
        self.0.push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields,
        });
    }
}

/// Captures all the events in the current thread, until the guard is
/// dropped.
///
/// # Example
/// ```
/// use google_apis_test_utils::capture::capture_events;
/// let (_guard, events) = capture_events();
/// tracing::error!(code = 501, "boom");
/// assert_eq!(events.events().len(), 1);
/// ```
pub fn capture_events() -> (tracing::subscriber::DefaultGuard, CapturedEvents) {
    let events = CapturedEvents::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer(events.clone()));
    let guard = tracing::subscriber::set_default(subscriber);
    (guard, events)
}
