//! Token pair handed back to a client after login or refresh.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed access/refresh pair plus expiry hints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuedTokens {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,

    /// Session both tokens belong to
    pub session_id: Uuid,
}

impl IssuedTokens {
    /// Creates a new token pair response
    ///
    /// # Arguments
    ///
    /// * `access_token` - Signed access token
    /// * `refresh_token` - Signed refresh token
    /// * `expires_in` - Access token lifetime in seconds
    /// * `refresh_expires_in` - Refresh token lifetime in seconds
    /// * `session_id` - Session the pair is bound to
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        refresh_expires_in: i64,
        session_id: Uuid,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_expires_in,
            session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_tokens_serialization() {
        let session_id = Uuid::new_v4();
        let tokens = IssuedTokens::new("a".into(), "r".into(), 600, 604800, session_id);

        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 600);
        assert_eq!(json["session_id"], session_id.to_string());
    }
}
