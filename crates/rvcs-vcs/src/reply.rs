use rvcs_core::Verb;
use tracing::warn;

use crate::error::VcsResult;

/// The single text payload sent back for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub success: bool,
    pub text: String,
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }
}

/// Operation boundary: every outcome, good or bad, becomes a reply.
pub fn reply(verb: Verb, result: VcsResult) -> Reply {
    match result {
        Ok(text) => Reply::ok(text),
        Err(e) => {
            warn!(verb = %verb, error_kind = e.error_kind(), error = %e, "operation failed");
            Reply::error(format!("Error executing '{verb}' command: {e}"))
        }
    }
}
