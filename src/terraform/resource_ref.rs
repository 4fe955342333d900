//! References to resources in a Terraform stack.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::ChartformError;

/// A `<type>.<logical_id>` reference, as used in `depends_on`.
///
/// # Examples
///
/// ```rust
/// use chartform::terraform::ResourceRef;
///
/// let namespace: ResourceRef = "kubernetes_namespace.apps".parse().unwrap();
/// assert_eq!(namespace.resource_type(), "kubernetes_namespace");
/// assert_eq!(namespace.logical_id(), "apps");
/// assert_eq!(namespace.to_string(), "kubernetes_namespace.apps");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceRef {
    resource_type: String,
    logical_id: String,
}

impl ResourceRef {
    pub fn new(resource_type: impl Into<String>, logical_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            logical_id: logical_id.into(),
        }
    }

    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.logical_id)
    }
}

impl FromStr for ResourceRef {
    type Err = ChartformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChartformError::InvalidResourceReference {
            reference: s.to_string(),
        };

        let (resource_type, logical_id) = s.split_once('.').ok_or_else(invalid)?;
        let valid_type = !resource_type.is_empty()
            && resource_type.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_type || logical_id.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(resource_type, logical_id))
    }
}

impl TryFrom<String> for ResourceRef {
    type Error = ChartformError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceRef> for String {
    fn from(value: ResourceRef) -> Self {
        value.to_string()
    }
}
