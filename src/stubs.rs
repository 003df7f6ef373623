use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use crate::Error;

/// Replays canned responses in order and records every request.
///
/// Clones share the recorded requests and the response queue, so a test can keep a
/// clone after moving the stub into a dialog.
#[derive(Clone, Default)]
pub(crate) struct TransportStub {
    pub requests: Arc<RwLock<Vec<String>>>,
    pub responses: Arc<Mutex<VecDeque<String>>>,
}

impl TransportStub {
    pub fn new<S: AsRef<str>>(responses: &[S]) -> TransportStub {
        TransportStub {
            requests: Arc::default(),
            responses: Arc::new(Mutex::new(responses.iter().map(|response| response.as_ref().to_owned()).collect())),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    fn reply(&self, message: &str) -> Result<String, Error> {
        self.requests.write().unwrap().push(message.to_owned());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Transport("no response queued".into()))
    }
}

#[cfg(all(feature = "sync", not(feature = "async")))]
impl crate::transport::Transport for TransportStub {
    fn send(&self, message: &str) -> Result<String, Error> {
        self.reply(message)
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl crate::transport::AsyncTransport for TransportStub {
    async fn send(&self, message: &str) -> Result<String, Error> {
        self.reply(message)
    }
}
