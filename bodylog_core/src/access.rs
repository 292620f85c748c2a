//! Single shared-identity access control.

use crate::config::AccessConfig;
use crate::{Error, Result};

/// Allows everything when no identity is configured, otherwise exactly one
/// caller identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed_identity: Option<String>,
}

impl AccessPolicy {
    pub fn new(allowed_identity: Option<String>) -> Self {
        // An empty configured identity is the same as none configured
        let allowed_identity = allowed_identity.filter(|id| !id.is_empty());
        Self { allowed_identity }
    }

    pub fn is_open(&self) -> bool {
        self.allowed_identity.is_none()
    }

    /// Whether a request carrying `identity` may proceed
    pub fn authorize(&self, identity: Option<&str>) -> bool {
        match &self.allowed_identity {
            None => true,
            Some(allowed) => identity == Some(allowed.as_str()),
        }
    }

    /// Like [`authorize`](Self::authorize) but fails with [`Error::Forbidden`]
    pub fn check(&self, identity: Option<&str>) -> Result<()> {
        if self.authorize(identity) {
            Ok(())
        } else {
            tracing::warn!("Rejected request from identity {:?}", identity);
            Err(Error::Forbidden)
        }
    }
}

impl From<&AccessConfig> for AccessPolicy {
    fn from(config: &AccessConfig) -> Self {
        Self::new(config.allowed_identity.clone())
    }
}
