//! The MessageRecorder is used to log the messages exchanged with the bank.
//! Recording is enabled by setting the environment variable FINTS_RECORDING_DIR
//! to the directory the messages are stored in
//! e.g.  set to /tmp/logs
//! /tmp/logs/2024-01-15-10-30-0/0001-request.msg
//! /tmp/logs/2024-01-15-10-30-0/0002-response.msg
//!
//! PIN and TAN are masked in recorded requests.

use std::env;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::messages::envelope::redact;

pub(crate) const RECORDING_DIR_VARIABLE: &str = "FINTS_RECORDING_DIR";

static RECORDING_SEQ: AtomicUsize = AtomicUsize::new(0);
static RECORDER_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Debug, Default)]
pub(crate) struct MessageRecorder {
    enabled: bool,
    recording_dir: String,
}

impl MessageRecorder {
    pub fn new(enabled: bool, recording_dir: String) -> Self {
        Self { enabled, recording_dir }
    }

    pub fn from_env() -> Self {
        match env::var(RECORDING_DIR_VARIABLE) {
            Ok(dir) if !dir.is_empty() => {
                let format = format_description!("[year]-[month]-[day]-[hour]-[minute]");
                let now = OffsetDateTime::now_utc();
                let stamp = now.format(&format).unwrap_or_default();
                let instance_id = RECORDER_ID.fetch_add(1, Ordering::SeqCst);
                let recording_dir = format!("{}/{}-{}", dir, stamp, instance_id);

                if let Err(err) = fs::create_dir_all(&recording_dir) {
                    warn!("message recording disabled, cannot create {recording_dir}: {err}");
                    return MessageRecorder::default();
                }

                MessageRecorder::new(true, recording_dir)
            }
            _ => MessageRecorder::default(),
        }
    }

    pub fn record_request(&self, message: &str) {
        if !self.enabled {
            return;
        }

        let record_id = RECORDING_SEQ.fetch_add(1, Ordering::SeqCst);
        self.write(self.request_file(record_id), &redact(message));
    }

    pub fn record_response(&self, message: &str) {
        if !self.enabled {
            return;
        }

        let record_id = RECORDING_SEQ.fetch_add(1, Ordering::SeqCst);
        self.write(self.response_file(record_id), message);
    }

    fn write(&self, file: String, content: &str) {
        if let Err(err) = fs::write(&file, content) {
            warn!("error recording message to {file}: {err}");
        }
    }

    fn request_file(&self, record_id: usize) -> String {
        format!("{}/{:04}-request.msg", self.recording_dir, record_id)
    }

    fn response_file(&self, record_id: usize) -> String {
        format!("{}/{:04}-response.msg", self.recording_dir, record_id)
    }
}
