// web-server/src/sse.rs
//! Server-sent event responses in the datastar wire format.
use std::convert::Infallible;

use actix_web::body::BoxBody;
use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponse, Responder};
use actix_web_lab::sse;
use futures_util::stream;
use serde::Serialize;

pub const MERGE_FRAGMENTS: &str = "datastar-merge-fragments";
pub const MERGE_SIGNALS: &str = "datastar-merge-signals";
pub const EXECUTE_SCRIPT: &str = "datastar-execute-script";

/// How a fragment is merged into the target element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    Morph,
    Append,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeMode::Morph => "morph",
            MergeMode::Append => "append",
        }
    }
}

/// Prefix every line of `value` with `key`, one data line each
fn data_lines(lines: &mut Vec<String>, key: &str, value: &str) {
    for line in value.lines() {
        lines.push(format!("{} {}", key, line));
    }
}

/// A finite batch of events, sent as one `text/event-stream` response
#[derive(Default)]
pub struct SseResponse {
    events: Vec<sse::Event>,
    cookies: Vec<Cookie<'static>>,
}

impl SseResponse {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, event: &str, lines: Vec<String>) -> Self {
        self.events
            .push(sse::Data::new(lines.join("\n")).event(event.to_owned()).into());
        self
    }

    /// Merge an HTML fragment into the element matched by `selector`
    pub fn merge_fragments(self, html: &str, selector: Option<&str>, mode: MergeMode) -> Self {
        let mut lines = Vec::new();
        if let Some(selector) = selector {
            lines.push(format!("selector {}", selector));
        }
        if mode != MergeMode::Morph {
            lines.push(format!("mergeMode {}", mode.as_str()));
        }
        data_lines(&mut lines, "fragments", html);
        self.push(MERGE_FRAGMENTS, lines)
    }

    /// Merge a JSON object into the client signal store
    pub fn merge_signals<T: Serialize>(self, signals: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(signals)?;
        Ok(self.push(MERGE_SIGNALS, vec![format!("signals {}", json)]))
    }

    pub fn execute_script(self, script: &str) -> Self {
        let mut lines = vec!["autoRemove true".to_string()];
        data_lines(&mut lines, "script", script);
        self.push(EXECUTE_SCRIPT, lines)
    }

    /// Navigate the browser to `location`
    pub fn redirect(self, location: &str) -> Self {
        let script = format!(
            "window.location = {}",
            serde_json::Value::String(location.to_owned())
        );
        self.execute_script(&script)
    }

    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }
}

impl Responder for SseResponse {
    type Body = BoxBody;

    fn respond_to(self, req: &HttpRequest) -> HttpResponse<Self::Body> {
        let events = stream::iter(self.events.into_iter().map(Ok::<_, Infallible>));
        let mut response = sse::Sse::from_stream(events)
            .respond_to(req)
            .map_into_boxed_body();

        for cookie in &self.cookies {
            if let Err(e) = response.add_cookie(cookie) {
                tracing::warn!("Failed to attach cookie {} to event stream: {}", cookie.name(), e);
            }
        }
        response
    }
}
