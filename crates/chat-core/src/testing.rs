//! In-memory transport double that records what the session asks of it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::endpoint::Endpoint;
use crate::errors::TransportError;
use crate::transport::{ConnectionHandle, Connector};

/// Everything the session did to the transport.
#[derive(Debug, Default)]
pub(crate) struct Wire {
    pub attempts: Vec<String>,
    pub sent: Vec<String>,
    pub closes: usize,
    pub refuse_sends: bool,
}

#[derive(Clone, Default)]
pub(crate) struct RecordingConnector {
    pub wire: Rc<RefCell<Wire>>,
}

impl RecordingConnector {
    pub fn attempts(&self) -> Vec<String> {
        self.wire.borrow().attempts.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.wire.borrow().sent.clone()
    }

    pub fn closes(&self) -> usize {
        self.wire.borrow().closes
    }

    pub fn refuse_sends(&self) {
        self.wire.borrow_mut().refuse_sends = true;
    }
}

impl Connector for RecordingConnector {
    type Handle = RecordingHandle;

    fn connect(&mut self, endpoint: &Endpoint) -> RecordingHandle {
        self.wire.borrow_mut().attempts.push(endpoint.to_string());
        RecordingHandle {
            wire: Rc::clone(&self.wire),
        }
    }
}

pub(crate) struct RecordingHandle {
    wire: Rc<RefCell<Wire>>,
}

impl ConnectionHandle for RecordingHandle {
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError> {
        let mut wire = self.wire.borrow_mut();
        if wire.refuse_sends {
            return Err(TransportError::ConnectionGone);
        }
        wire.sent.push(payload.to_string());
        Ok(())
    }

    fn close(self) {
        self.wire.borrow_mut().closes += 1;
    }
}
