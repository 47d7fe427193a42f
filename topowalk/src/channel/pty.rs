//! PTY channel for interactive switch sessions.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// How many pager prompts are answered for one command before giving up.
const MAX_PAGES: usize = 500;

/// Interactive shell channel with pattern-based reads.
///
/// Wraps the russh channel and a [`PatternBuffer`]; every read runs until a
/// prompt pattern appears in the buffer tail or the deadline passes.
pub struct PtyChannel {
    channel: Channel<Msg>,
    buffer: PatternBuffer,
}

impl PtyChannel {
    /// Wrap an open shell channel.
    pub fn new(channel: Channel<Msg>, search_depth: usize) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(search_depth),
        }
    }

    /// Send a line of input (a newline is appended).
    pub async fn send(&mut self, input: &str) -> Result<()> {
        let line = format!("{}\n", input);
        self.channel
            .data(line.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `prompt` matches the buffer tail.
    ///
    /// When `pager` matches first, a space is sent to get the next page and
    /// the pager prompt is cut out of the output. Returns everything read,
    /// including the trailing prompt.
    pub async fn read_until_prompt(
        &mut self,
        prompt: &Regex,
        pager: Option<&Regex>,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut pages = 0;

        loop {
            if self.buffer.tail_contains(prompt) {
                return Ok(self.buffer.take());
            }

            if let Some(pager) = pager {
                if pages < MAX_PAGES && self.buffer.remove_tail_match(pager) {
                    pages += 1;
                    trace!("answering pager prompt ({} so far)", pages);
                    self.channel
                        .data(&b" "[..])
                        .await
                        .map_err(ChannelError::Ssh)?;
                    continue;
                }
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { ref data }) => self.buffer.extend(data),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => self.buffer.extend(data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Discard anything buffered so far.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Send EOF and close the channel.
    pub async fn close(self) -> Result<()> {
        // The switch may already have hung up; EOF failing is not an error.
        let _ = self.channel.eof().await;
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}
