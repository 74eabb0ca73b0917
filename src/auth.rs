//! Caller identity supplied by the authentication gateway.
//!
//! Session issuance lives upstream; this service trusts the `x-user-id` and
//! `x-user-role` headers the gateway forwards with each request. The user id
//! is opaque here, it is only ever used as a key for interaction records.

use hyper::HeaderMap;

use crate::error::StorageError;

/// Role flag forwarded by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Learner,
}

/// Authenticated caller for a single request
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Extract the caller from gateway headers
    ///
    /// A missing or empty `x-user-id` is an unauthenticated request. Any
    /// `x-user-role` value other than `admin` is treated as a learner.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, StorageError> {
        let user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StorageError::Unauthorized("missing x-user-id header".into()))?;

        let role = match headers.get("x-user-role").and_then(|v| v.to_str().ok()) {
            Some("admin") => Role::Admin,
            _ => Role::Learner,
        };

        Ok(Self::new(user_id, role))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the caller carries the admin role
    pub fn require_admin(&self) -> Result<(), StorageError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(StorageError::Forbidden("admin role required".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_extracts_learner() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("user-1"));

        let caller = Caller::from_headers(&headers).unwrap();
        assert_eq!(caller.user_id, "user-1");
        assert_eq!(caller.role, Role::Learner);
        assert!(caller.require_admin().is_err());
    }

    #[test]
    fn test_extracts_admin() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("admin-1"));
        headers.insert("x-user-role", HeaderValue::from_static("admin"));

        let caller = Caller::from_headers(&headers).unwrap();
        assert!(caller.is_admin());
        assert!(caller.require_admin().is_ok());
    }

    #[test]
    fn test_missing_user_id_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            Caller::from_headers(&headers),
            Err(StorageError::Unauthorized(_))
        ));

        let mut empty = HeaderMap::new();
        empty.insert("x-user-id", HeaderValue::from_static(""));
        assert!(Caller::from_headers(&empty).is_err());
    }

    #[test]
    fn test_unknown_role_defaults_to_learner() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("user-2"));
        headers.insert("x-user-role", HeaderValue::from_static("moderator"));

        let caller = Caller::from_headers(&headers).unwrap();
        assert_eq!(caller.role, Role::Learner);
    }
}
