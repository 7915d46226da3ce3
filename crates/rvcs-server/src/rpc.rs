use serde::{Deserialize, Serialize};

use rvcs_vcs::Reply;

pub const GREETING: &str = "Connected to rvcs. Type 'help' for available commands.";

/// One client request line.
///
/// `args` may be a list, a single string, or absent. Clients that do not
/// speak JSON can send a bare `verb arg1 arg2` line instead.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Request {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub verb: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
}

/// One reply line. `success` is false for error replies.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: Option<serde_json::Value>,
    pub success: bool,
    pub reply: String,
}

impl Request {
    /// Arguments as plain strings. A scalar becomes a single argument;
    /// non-string list elements are rendered as JSON.
    pub fn args(&self) -> Vec<String> {
        match &self.args {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(other) => vec![other.to_string()],
        }
    }
}

impl Response {
    pub fn from_reply(id: Option<serde_json::Value>, reply: Reply) -> Self {
        Self {
            id,
            success: reply.success,
            reply: reply.text,
        }
    }

    pub fn greeting() -> Self {
        Self {
            id: None,
            success: true,
            reply: GREETING.into(),
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self {
            id: None,
            success: false,
            reply: format!("Parse error: {detail}"),
        }
    }
}

/// Decode one line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Request>, Response> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map(Some)
            .map_err(Response::parse_error);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_string();
    let args: Vec<serde_json::Value> = words.map(|w| serde_json::Value::String(w.to_string())).collect();
    Ok(Some(Request {
        id: None,
        verb,
        args: (!args.is_empty()).then_some(serde_json::Value::Array(args)),
    }))
}
