// Copyright 2024 Kafka Client Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An in-memory [`Transport`] for tests, replacing the monkey-patched
//! socket I/O the original test suite relied on (spec.md §9).
//!
//! Responses are queued per endpoint and handed back in order on
//! `receive`; a [`Fault`] can be queued instead of a frame to exercise the
//! retry state machine and the correlation-ID invariant without a socket.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::rc::Rc;

use super::Transport;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub enum Fault {
    Timeout,
    ConnectionReset,
}

#[derive(Debug, Clone)]
enum Queued {
    Frame(Vec<u8>),
    Fault(Fault),
}

#[derive(Default)]
pub struct MockTransport {
    queues: HashMap<String, VecDeque<Queued>>,
    pub sent: Vec<(String, Vec<u8>)>,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport::default()
    }

    /// Queues a response body to be returned by the next `receive` call
    /// against `endpoint`. Like [`super::TcpTransport::receive`], this is
    /// the frame's payload *after* the outer 4-byte length prefix has
    /// already been consumed -- callers build it with
    /// [`crate::protocol::header::ResponseHeader::write`] plus the body,
    /// not with [`crate::protocol::request::encode_request`] (that
    /// includes the length prefix and is what `send` observes instead).
    pub fn queue_response(&mut self, endpoint: impl Into<String>, body: Vec<u8>) {
        self.queues
            .entry(endpoint.into())
            .or_default()
            .push_back(Queued::Frame(body));
    }

    /// Queues a fault to be returned instead of a frame, for retry-path tests.
    pub fn queue_fault(&mut self, endpoint: impl Into<String>, fault: Fault) {
        self.queues
            .entry(endpoint.into())
            .or_default()
            .push_back(Queued::Fault(fault));
    }
}

impl Transport for MockTransport {
    fn send(&mut self, endpoint: &str, frame: &[u8]) -> Result<(), ClientError> {
        self.sent.push((endpoint.to_string(), frame.to_vec()));
        Ok(())
    }

    fn receive(&mut self, endpoint: &str) -> Result<Vec<u8>, ClientError> {
        let queue = self.queues.get_mut(endpoint);
        let next = queue.and_then(VecDeque::pop_front);
        match next {
            None => Err(ClientError::ResponseNotReceived(endpoint.to_string())),
            Some(Queued::Fault(Fault::Timeout)) => Err(ClientError::CannotRecv {
                endpoint: endpoint.to_string(),
                message: "simulated timeout".to_string(),
            }),
            Some(Queued::Fault(Fault::ConnectionReset)) => Err(ClientError::CannotRecv {
                endpoint: endpoint.to_string(),
                message: "simulated connection reset".to_string(),
            }),
            Some(Queued::Frame(frame)) => Ok(frame),
        }
    }
}

/// A Connection's `make_transport` factory builds one `T` per endpoint it
/// talks to; tests that need to pre-populate responses for several
/// endpoints before the Connection exists share one `MockTransport` behind
/// this handle instead, cloning it per endpoint the way `Rc::clone` shares
/// any other interior-mutable fixture.
impl Transport for Rc<RefCell<MockTransport>> {
    fn send(&mut self, endpoint: &str, frame: &[u8]) -> Result<(), ClientError> {
        self.borrow_mut().send(endpoint, frame)
    }

    fn receive(&mut self, endpoint: &str) -> Result<Vec<u8>, ClientError> {
        self.borrow_mut().receive(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_queued_frames_in_order() {
        let mut mock = MockTransport::new();
        mock.queue_response("broker:9092", vec![1, 2, 3]);
        mock.queue_response("broker:9092", vec![4, 5, 6]);
        assert_eq!(mock.receive("broker:9092").unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.receive("broker:9092").unwrap(), vec![4, 5, 6]);
    }

    #[test]
    fn errors_when_queue_is_empty() {
        let mut mock = MockTransport::new();
        assert!(mock.receive("broker:9092").is_err());
    }

    #[test]
    fn injects_fault_before_frame() {
        let mut mock = MockTransport::new();
        mock.queue_fault("broker:9092", Fault::Timeout);
        mock.queue_response("broker:9092", vec![9]);
        assert!(matches!(
            mock.receive("broker:9092"),
            Err(ClientError::CannotRecv { .. })
        ));
        assert_eq!(mock.receive("broker:9092").unwrap(), vec![9]);
    }
}
