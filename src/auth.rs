// Resolved caller identity and feature gating

use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// Identity resolved by the auth collaborator before a request reaches the
/// engine. The engine never authenticates; it only consumes this context
/// and enforces feature flags.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthContext {
    pub developer_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub feature_flags: BTreeSet<String>,
}

impl AuthContext {
    pub fn new(developer_id: &str, organization_id: &str) -> Self {
        Self {
            developer_id: developer_id.to_string(),
            organization_id: organization_id.to_string(),
            feature_flags: BTreeSet::new(),
        }
    }

    pub fn with_flag(mut self, flag: &str) -> Self {
        self.feature_flags.insert(flag.to_string());
        self
    }

    pub fn has_feature(&self, flag: &str) -> bool {
        self.feature_flags.contains(flag)
    }

    /// Gate an operation behind a feature flag.
    pub fn require_feature(&self, flag: &str) -> Result<()> {
        if self.has_feature(flag) {
            Ok(())
        } else {
            Err(Error::FeatureDisabled(flag.to_string()))
        }
    }

    /// Namespace for this organization's portals.
    pub fn namespace(&self) -> &str {
        &self.organization_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_feature() {
        let ctx = AuthContext::new("dev-1", "org-1").with_flag("code_intel");

        assert!(ctx.require_feature("code_intel").is_ok());
        let err = ctx.require_feature("billing_export").unwrap_err();
        assert!(matches!(err, Error::FeatureDisabled(ref f) if f == "billing_export"));
    }

    #[test]
    fn test_flags_deserialize_with_default() {
        let ctx: AuthContext =
            serde_json::from_str(r#"{"developer_id": "d", "organization_id": "o"}"#).unwrap();
        assert!(ctx.feature_flags.is_empty());
        assert_eq!(ctx.namespace(), "o");
    }
}
