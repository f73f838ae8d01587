// mem:// URI parsing and formatting

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Grammar: `mem://{namespace}/{portal-id}[/{table}][?{query}]`.
static URI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^mem://(?P<namespace>[A-Za-z0-9_-]+)/(?P<portal_id>[A-Za-z0-9_-]+)(?:/(?P<table>[A-Za-z0-9_-]+))?(?:\?(?P<query>.*))?$",
    )
    .expect("URI pattern is valid")
});

/// A parsed mem:// address.
///
/// Examples:
/// - `mem://conversation/default`
/// - `mem://conversation/default/messages`
/// - `mem://conversation/default/messages?limit=10`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryUri {
    pub namespace: String,
    pub portal_id: String,
    pub table: Option<String>,
    /// Query parameters; on repeated keys the last occurrence wins.
    pub query_params: BTreeMap<String, String>,
}

impl MemoryUri {
    /// Parse a URI string. Pure; no side effects.
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.is_empty() {
            return Err(Error::MalformedUri {
                uri: uri.to_string(),
                reason: "URI cannot be empty".to_string(),
            });
        }

        let caps = URI_PATTERN.captures(uri).ok_or_else(|| Error::MalformedUri {
            uri: uri.to_string(),
            reason: "expected mem://{namespace}/{portal-id}[/{table}][?query]".to_string(),
        })?;

        let mut query_params = BTreeMap::new();
        if let Some(query) = caps.name("query") {
            for pair in query.as_str().split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some((key, value)) if !key.is_empty() => {
                        query_params.insert(key.to_string(), value.to_string());
                    }
                    _ => {
                        return Err(Error::MalformedUri {
                            uri: uri.to_string(),
                            reason: format!("invalid query parameter '{}'", pair),
                        });
                    }
                }
            }
        }

        Ok(Self {
            namespace: caps["namespace"].to_string(),
            portal_id: caps["portal_id"].to_string(),
            table: caps.name("table").map(|m| m.as_str().to_string()),
            query_params,
        })
    }

    /// The base portal URI without table or query params.
    pub fn portal_uri(&self) -> String {
        format!("mem://{}/{}", self.namespace, self.portal_id)
    }

    /// A copy of this URI addressing a different table.
    pub fn with_table(&self, table: &str) -> Self {
        Self {
            namespace: self.namespace.clone(),
            portal_id: self.portal_id.clone(),
            table: Some(table.to_string()),
            query_params: self.query_params.clone(),
        }
    }

    /// A single query parameter value, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(|v| v.as_str())
    }
}

impl fmt::Display for MemoryUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.portal_uri())?;
        if let Some(table) = &self.table {
            write!(f, "/{}", table)?;
        }
        if !self.query_params.is_empty() {
            let query: Vec<String> = self
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "?{}", query.join("&"))?;
        }
        Ok(())
    }
}
