//! # Response Formatting
//!
//! Response bodies for id-targeted writes.

use serde::{Deserialize, Serialize};

use crate::store::WriteOutcome;

/// `{"msg": "success"}` / `{"msg": "error"}` write acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn success() -> Self {
        Self {
            msg: "success".to_string(),
        }
    }

    pub fn error() -> Self {
        Self {
            msg: "error".to_string(),
        }
    }

    /// Success iff the write targeted exactly one document
    pub fn from_outcome(outcome: WriteOutcome) -> Self {
        if outcome.is_single() {
            Self::success()
        } else {
            Self::error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outcome() {
        assert_eq!(MessageResponse::from_outcome(WriteOutcome::new(1)), MessageResponse::success());
        assert_eq!(MessageResponse::from_outcome(WriteOutcome::new(0)), MessageResponse::error());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&MessageResponse::success()).unwrap();
        assert_eq!(json, r#"{"msg":"success"}"#);
    }
}
