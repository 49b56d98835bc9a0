use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespaced identifier for node attributes, written `namespace:path`
///
/// Serializes as its `namespace:path` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiberId {
    namespace: String,
    path: String,
}

impl FiberId {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for FiberId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, path)) if !namespace.is_empty() && !path.is_empty() => {
                Ok(Self::new(namespace, path))
            }
            _ => Err(Error::InvalidAttribute {
                id: s.to_string(),
                reason: "expected an identifier of the form 'namespace:path'".into(),
            }),
        }
    }
}

impl TryFrom<String> for FiberId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FiberId> for String {
    fn from(id: FiberId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: FiberId = "fabric:comment".parse().unwrap();
        assert_eq!(id.namespace(), "fabric");
        assert_eq!(id.path(), "comment");
        assert_eq!(id.to_string(), "fabric:comment");

        // Only the first colon separates the namespace
        let nested: FiberId = "mod:a:b".parse().unwrap();
        assert_eq!(nested.path(), "a:b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("no-namespace".parse::<FiberId>().is_err());
        assert!(":path".parse::<FiberId>().is_err());
        assert!("ns:".parse::<FiberId>().is_err());
    }

    #[test]
    fn test_serde_string_form() {
        let id = FiberId::new("ui", "order");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""ui:order""#);

        let parsed: FiberId = serde_json::from_str(r#""ui:order""#).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<FiberId>(r#""order""#).is_err());
    }
}
