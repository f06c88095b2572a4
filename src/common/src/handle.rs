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

//! The handle returned by each call.

use crate::request::RequestDescriptor;
use tokio::sync::watch;

/// The lifecycle of a call.
///
/// ```text
/// Created -> Errored
/// Created -> Dispatched -> Completed
///                       -> Failed
/// ```
///
/// A call reaches a final state only after its callback, or the error
/// reporter, has run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
    Created,
    /// The request could not be built or dispatched, e.g. a required
    /// parameter was missing.
    Errored,
    /// The request was handed to the transport.
    Dispatched,
    Completed,
    Failed,
}

impl RequestState {
    /// True for `Errored`, `Completed`, and `Failed`.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Errored | Self::Completed | Self::Failed)
    }
}

/// Represents a call, returned synchronously whether the call succeeds or
/// not, and whether or not it has a callback.
#[derive(Clone, Debug)]
pub struct RequestHandle {
    id: uuid::Uuid,
    method_id: String,
    descriptor: Option<RequestDescriptor>,
    state: watch::Receiver<RequestState>,
}

impl RequestHandle {
    pub(crate) fn new(method_id: &str) -> (Self, StateSender) {
        let (tx, rx) = watch::channel(RequestState::Created);
        let handle = Self {
            id: uuid::Uuid::new_v4(),
            method_id: method_id.to_string(),
            descriptor: None,
            state: rx,
        };
        let tx = StateSender { tx, pending: None };
        (handle, tx)
    }

    pub(crate) fn set_descriptor(&mut self, v: RequestDescriptor) {
        self.descriptor = Some(v);
    }

    /// A unique identifier for the call, included in the logs.
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// The id of the method called, e.g. `drive.files.list`.
    pub fn method_id(&self) -> &str {
        &self.method_id
    }

    /// The request sent to the transport, unless it could not be built.
    pub fn descriptor(&self) -> Option<&RequestDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn state(&self) -> RequestState {
        *self.state.borrow()
    }

    /// Waits until the call reaches a final state.
    pub async fn wait(&self) -> RequestState {
        let mut rx = self.state.clone();
        if let Ok(state) = rx.wait_for(RequestState::is_final).await {
            return *state;
        }
        // The sender is dropped, its last value is final.
        let state = *rx.borrow();
        state
    }
}

/// Updates the state of a [RequestHandle].
#[derive(Debug)]
pub(crate) struct StateSender {
    tx: watch::Sender<RequestState>,
    pending: Option<RequestState>,
}

impl StateSender {
    pub(crate) fn set(&self, state: RequestState) {
        self.tx.send_replace(state);
    }

    /// Runs `deliver`, then moves to the final `state`.
    ///
    /// The final state is published even if `deliver` panics.
    pub(crate) fn finish<F>(mut self, state: RequestState, deliver: F)
    where
        F: FnOnce(),
    {
        self.pending = Some(state);
        deliver();
    }
}

impl Drop for StateSender {
    fn drop(&mut self) {
        if let Some(state) = self.pending.take() {
            self.tx.send_replace(state);
        }
    }
}
