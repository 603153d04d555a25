//! Cache key composition.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// A cache key built from a resource name and the query parameters that
/// affect the response.
///
/// Parameters are kept sorted by name, so the order in which they are added
/// does not change the rendered key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: String,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    /// Start a key for a resource family (e.g. "merchants").
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter. Adding the same name twice keeps the last value.
    pub fn param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Add a parameter only when it is set.
    pub fn param_opt<V: Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// The prefix shared by every key of a resource family.
    pub fn prefix(resource: &str) -> String {
        format!("{}:", escape(resource))
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", escape(&self.resource))?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { ':' } else { '&' };
            write!(f, "{}{}={}", sep, escape(name), escape(value))?;
        }
        Ok(())
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}

/// Percent-escape the separator characters so values cannot forge extra
/// parameters.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            ':' => out.push_str("%3A"),
            _ => out.push(c),
        }
    }
    out
}
