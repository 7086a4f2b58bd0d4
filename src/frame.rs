use std::fmt;

/// A STOMP frame: command, ordered headers and a raw byte body.
///
/// Headers keep their insertion order, and a name may repeat; the first
/// occurrence wins for semantic lookup while the remainder are preserved so
/// inbound frames (notably ERROR) round-trip byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Append a header (builder style).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the frame body (builder style).
    pub fn set_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header with the given name, if any.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n == name)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        for (name, value) in &self.headers {
            writeln!(f, "{}: {}", name, value)?;
        }
        writeln!(f, "Body ({} bytes)", self.body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_header_occurrence_wins() {
        let frame = Frame::new("ERROR")
            .header("message", "first")
            .header("message", "second");
        assert_eq!(frame.get_header("message"), Some("first"));
        assert_eq!(frame.headers.len(), 2);
    }

    #[test]
    fn builder_chains() {
        let frame = Frame::new("SEND")
            .header("destination", "/queue/a")
            .set_body(b"payload".to_vec());
        assert_eq!(frame.command, "SEND");
        assert!(frame.has_header("destination"));
        assert_eq!(frame.body, b"payload");
    }
}
