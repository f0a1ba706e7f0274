//! JSON response envelope returned to the caller.

use serde::{Deserialize, Serialize};

/// What the embedding application serializes back to the client:
/// `{"ok": true, "errors": []}` on success, `{"ok": false, "errors": [..]}`
/// after a validation failure (alongside HTTP 422).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub ok: bool,
    pub errors: Vec<String>,
}

impl ResponseEnvelope {
    pub fn ok() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self { ok: false, errors }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_json_shape() {
        assert_eq!(
            ResponseEnvelope::ok().to_json().unwrap(),
            r#"{"ok":true,"errors":[]}"#
        );
    }

    #[test]
    fn invalid_envelope_keeps_error_order() {
        let env = ResponseEnvelope::invalid(vec![
            "name is required".into(),
            "email is required".into(),
        ]);
        assert_eq!(
            env.to_json().unwrap(),
            r#"{"ok":false,"errors":["name is required","email is required"]}"#
        );
    }
}
