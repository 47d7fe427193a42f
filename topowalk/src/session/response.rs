//! Result of one command on a remote session.

use std::time::Duration;

/// Output of a single command.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was sent.
    pub command: String,

    /// Output with the command echo and trailing prompt removed.
    pub result: String,

    /// Output as read from the channel, control sequences already stripped.
    pub raw_result: String,

    /// The prompt line the read stopped at.
    pub prompt: String,

    /// Time from sending the command to seeing the prompt.
    pub elapsed: Duration,

    /// Vendor error string found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Mark the response as failed with the vendor error string that matched.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.result)
    }
}
