//! Incremental, byte-fed STOMP frame parser.
//!
//! Bytes go in through [`StompParser::feed`] in whatever chunks the
//! transport produced them; completed frames and heart-beats come out of
//! [`StompParser::drain`]. The parser never blocks and never looks at a
//! socket, so chunk boundaries are invisible: feeding a stream one byte at
//! a time yields exactly the same items as feeding it whole.

use std::collections::VecDeque;
use std::time::Instant;

use crate::codec::StompItem;
use crate::error::FramingError;
use crate::escape;
use crate::frame::Frame;
use crate::spec::{self, header, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Between frames; EOLs here are heart-beats.
    Idle,
    Command,
    Headers,
    BodyWithLength { remaining: usize },
    BodyUntilNull,
    /// A single EOL directly after a frame's NUL is dressing, not a
    /// heart-beat.
    TrailingEol { saw_cr: bool },
}

pub struct StompParser {
    version: Version,
    state: ParseState,
    line: Vec<u8>,
    command: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    items: VecDeque<StompItem>,
    poisoned: Option<FramingError>,
    offset: u64,
    last_received: Option<Instant>,
}

impl StompParser {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            state: ParseState::Idle,
            line: Vec::new(),
            command: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            items: VecDeque::new(),
            poisoned: None,
            offset: 0,
            last_received: None,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Switch protocol tables, typically right after version negotiation.
    /// Partially parsed input is unaffected.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// When the last inbound byte arrived. Hosts poll this to detect a
    /// silent broker; inbound heart-beats count, since the parser sees them
    /// as bytes like any others.
    pub fn last_received_at(&self) -> Option<Instant> {
        self.last_received
    }

    /// Whether `drain` would currently return anything.
    pub fn can_read(&self) -> bool {
        !self.items.is_empty()
    }

    /// Discard all buffers, queued items and any poisoned state. Used by
    /// hosts when they abandon a broken connection and start a fresh one.
    pub fn reset(&mut self) {
        self.state = ParseState::Idle;
        self.line.clear();
        self.command.clear();
        self.headers.clear();
        self.body.clear();
        self.items.clear();
        self.poisoned = None;
        self.offset = 0;
    }

    /// Consume a chunk of wire data. On a framing error the parser poisons
    /// itself and every subsequent call returns the same error; items that
    /// completed before the offending byte remain drainable.
    pub fn feed(&mut self, data: &[u8]) -> Result<(), FramingError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        if !data.is_empty() {
            self.last_received = Some(Instant::now());
        }
        for &byte in data {
            self.offset += 1;
            if let Err(err) = self.step(byte) {
                tracing::warn!(kind = err.kind(), offset = self.offset, "framing error");
                self.poisoned = Some(err.clone());
                return Err(err);
            }
        }
        Ok(())
    }

    /// Hand out everything parsed so far, in wire order. Heart-beats are
    /// additionally capped at one per call so an idle stretch on the wire
    /// cannot turn into an event storm.
    pub fn drain(&mut self) -> Vec<StompItem> {
        let mut out = Vec::with_capacity(self.items.len());
        let mut seen_heart_beat = false;
        while let Some(item) = self.items.pop_front() {
            if matches!(item, StompItem::Heartbeat) {
                if seen_heart_beat {
                    continue;
                }
                seen_heart_beat = true;
            }
            out.push(item);
        }
        out
    }

    /// Pop a single parsed item, bypassing the per-drain heart-beat cap
    /// (consecutive heart-beats are already coalesced at the queue).
    pub(crate) fn pop(&mut self) -> Option<StompItem> {
        self.items.pop_front()
    }

    fn step(&mut self, byte: u8) -> Result<(), FramingError> {
        match self.state {
            ParseState::Idle => {
                if byte == b'\n' {
                    self.heart_beat();
                } else {
                    self.line.clear();
                    self.line.push(byte);
                    self.state = ParseState::Command;
                }
            }
            ParseState::Command => {
                if byte != b'\n' {
                    self.line.push(byte);
                } else {
                    self.finish_command()?;
                }
            }
            ParseState::Headers => {
                if byte != b'\n' {
                    self.line.push(byte);
                } else {
                    self.finish_header_line()?;
                }
            }
            ParseState::BodyWithLength { remaining } => {
                if remaining > 0 {
                    self.body.push(byte);
                    self.state = ParseState::BodyWithLength {
                        remaining: remaining - 1,
                    };
                } else if byte == 0 {
                    self.finish_frame()?;
                } else {
                    return Err(FramingError::MissingNull {
                        offset: self.offset,
                    });
                }
            }
            ParseState::BodyUntilNull => {
                if byte == 0 {
                    self.finish_frame()?;
                } else {
                    self.body.push(byte);
                }
            }
            ParseState::TrailingEol { saw_cr } => match byte {
                b'\n' => self.state = ParseState::Idle,
                b'\r' if !saw_cr && self.version.strips_trailing_cr() => {
                    self.state = ParseState::TrailingEol { saw_cr: true };
                }
                _ => {
                    self.state = ParseState::Idle;
                    return self.step(byte);
                }
            },
        }
        Ok(())
    }

    fn heart_beat(&mut self) {
        // 1.0 has no heart-beating; idle EOLs are just skipped. Runs of
        // EOLs coalesce into a single queued heart-beat.
        if self.version == Version::V1_0 {
            return;
        }
        if matches!(self.items.back(), Some(StompItem::Heartbeat)) {
            return;
        }
        self.items.push_back(StompItem::Heartbeat);
    }

    fn finish_command(&mut self) -> Result<(), FramingError> {
        let mut line = std::mem::take(&mut self.line);
        if self.version.strips_trailing_cr() && line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.is_empty() {
            // the line was nothing but CRLF dressing: a heart-beat
            self.heart_beat();
            self.state = ParseState::Idle;
            return Ok(());
        }
        let command = String::from_utf8(line).map_err(|_| FramingError::MalformedCommand {
            offset: self.offset,
            detail: "command is not valid UTF-8".to_string(),
        })?;
        if !command.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(FramingError::MalformedCommand {
                offset: self.offset,
                detail: format!("not an uppercase command: {:?}", command),
            });
        }
        if !spec::is_command(self.version, &command) {
            return Err(FramingError::MalformedCommand {
                offset: self.offset,
                detail: format!("invalid command for STOMP {}: {}", self.version, command),
            });
        }
        self.command = command;
        self.headers.clear();
        self.state = ParseState::Headers;
        Ok(())
    }

    fn finish_header_line(&mut self) -> Result<(), FramingError> {
        let mut line = std::mem::take(&mut self.line);
        if self.version.strips_trailing_cr() && line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.is_empty() {
            // blank line: headers are complete, the body follows
            let content_length = self.content_length()?;
            self.body.clear();
            self.state = match content_length {
                Some(n) => ParseState::BodyWithLength { remaining: n },
                None => ParseState::BodyUntilNull,
            };
            return Ok(());
        }
        if self.version == Version::V1_2 && line.contains(&b'\r') {
            return Err(FramingError::BadHeaderLine {
                offset: self.offset,
                detail: "bare carriage return in header line".to_string(),
            });
        }
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| FramingError::BadHeaderLine {
                offset: self.offset,
                detail: format!(
                    "no separator in header line: {:?}",
                    String::from_utf8_lossy(&line)
                ),
            })?;
        let name = self.header_text(&line[..colon])?;
        let value = self.header_text(&line[colon + 1..])?;
        self.headers.push((name, value));
        Ok(())
    }

    fn header_text(&self, raw: &[u8]) -> Result<String, FramingError> {
        let text = std::str::from_utf8(raw).map_err(|_| FramingError::BadHeaderLine {
            offset: self.offset,
            detail: "header is not valid UTF-8".to_string(),
        })?;
        if spec::escape_excluded(self.version, &self.command) {
            return Ok(text.to_string());
        }
        escape::unescape(self.version, text).map_err(|err| FramingError::BadEscape {
            offset: self.offset,
            detail: err.to_string(),
        })
    }

    fn content_length(&self) -> Result<Option<usize>, FramingError> {
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case(header::CONTENT_LENGTH) {
                let length =
                    value
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| FramingError::BadHeaderLine {
                            offset: self.offset,
                            detail: format!("invalid content-length: {:?}", value),
                        })?;
                return Ok(Some(length));
            }
        }
        Ok(None)
    }

    fn finish_frame(&mut self) -> Result<(), FramingError> {
        let command = std::mem::take(&mut self.command);
        let headers = std::mem::take(&mut self.headers);
        let body = std::mem::take(&mut self.body);
        if !body.is_empty() && !spec::body_allowed(&command) {
            return Err(FramingError::BodyOverrun {
                offset: self.offset,
                detail: format!("no body allowed for {}", command),
            });
        }
        self.items.push_back(StompItem::Frame(Frame {
            command,
            headers,
            body,
        }));
        self.state = ParseState::TrailingEol { saw_cr: false };
        Ok(())
    }
}
