//! Call history
//!
//! An append-only record of the raw request and response texts that went
//! through a server proxy. It is a side channel for debugging and tests;
//! nothing in the call path reads it back.

/// Raw request/response payloads in send order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    requests: Vec<String>,
    responses: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&mut self, request: impl Into<String>) {
        self.requests.push(request.into());
    }

    pub fn add_response(&mut self, response: impl Into<String>) {
        self.responses.push(response.into());
    }

    /// Most recent request text, if any
    pub fn last_request(&self) -> Option<&str> {
        self.requests.last().map(String::as_str)
    }

    /// Most recent response text, if any
    pub fn last_response(&self) -> Option<&str> {
        self.responses.last().map(String::as_str)
    }

    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.responses.clear();
    }
}
