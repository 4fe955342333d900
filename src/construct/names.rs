//! Stable object names derived from construct paths.
//!
//! Generated names are compatible with cdk8s: the same construct path
//! always produces the same Kubernetes name, so repeated synthesis does not
//! produce spurious diffs.

use sha1::{Digest, Sha1};

/// Maximum length of a DNS-1123 label.
pub const MAX_DNS_LABEL_LEN: usize = 63;

/// Number of address characters appended to generated names.
pub const HASH_LEN: usize = 8;

const ADDRESS_PREFIX: &str = "c8";

/// Compute the address of a construct from the ids of its scopes.
///
/// `ids` must start with the root id (usually empty) and end with the
/// construct's own id. Scopes called `Default` are skipped so a construct
/// can be wrapped in a `Default` child without changing its address.
///
/// # Examples
///
/// ```rust
/// use chartform::construct::names::address_of;
///
/// let address = address_of(&["", "cdk8s-cdktf", "deploy"]);
/// assert!(address.starts_with("c806be9c"));
/// assert_eq!(address.len(), 42);
/// ```
#[must_use]
pub fn address_of(ids: &[&str]) -> String {
    let mut hasher = Sha1::new();
    for id in ids {
        if *id == "Default" {
            continue;
        }
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    format!("{ADDRESS_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// Build a DNS-1123 label from path components and a construct address.
///
/// Components are lowercased and stripped of characters outside
/// `[0-9a-z-]`; consecutive duplicates and components named `default` or
/// `resource` are dropped. When `include_hash` is set the first
/// [`HASH_LEN`] characters of `address` are appended. If the result would
/// exceed [`MAX_DNS_LABEL_LEN`] the human-readable part is truncated from
/// the front; the hash is always kept.
///
/// A single-component path is returned unchanged.
///
/// # Examples
///
/// ```rust
/// use chartform::construct::names::{address_of, to_dns_label};
///
/// let address = address_of(&["", "cdk8s-cdktf", "deploy"]);
/// let name = to_dns_label(&["cdk8s-cdktf", "deploy"], &address, true);
/// assert_eq!(name, "cdk8s-cdktf-deploy-c806be9c");
/// ```
#[must_use]
pub fn to_dns_label(components: &[&str], address: &str, include_hash: bool) -> String {
    if components.len() == 1 {
        return components[0].to_string();
    }

    let mut parts: Vec<String> = Vec::with_capacity(components.len());
    for component in components {
        let normalized = normalize_component(component);
        if normalized.is_empty() || normalized == "default" || normalized == "resource" {
            continue;
        }
        if parts.last() == Some(&normalized) {
            continue;
        }
        parts.push(normalized);
    }

    let mut human = parts.join("-");
    let hash: String = address.chars().take(HASH_LEN).collect();

    let budget = if include_hash {
        MAX_DNS_LABEL_LEN - HASH_LEN - 1
    } else {
        MAX_DNS_LABEL_LEN
    };
    if human.len() > budget {
        // normalized components are ASCII, byte slicing is safe
        human = human[human.len() - budget..].trim_start_matches('-').to_string();
    }

    if !include_hash {
        return human;
    }
    if human.is_empty() {
        return hash;
    }
    format!("{human}-{hash}")
}

fn normalize_component(component: &str) -> String {
    component
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}
