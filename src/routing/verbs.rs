//! Verb set normalization.
//!
//! Handlers accept verbs as a single method, a comma-joined string
//! (`"get, post"`) or any collection of those. Everything is reduced to a
//! de-duplicated, uppercase set of `Method`s.

use axum::http::Method;

use crate::config::schema::DEFAULT_METHODS;
use crate::error::ProxyError;

/// A normalized set of HTTP verbs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerbSet {
    methods: Vec<Method>,
}

impl VerbSet {
    /// Parse verb text: comma-separated, case-insensitive, whitespace tolerant.
    pub fn parse(text: &str) -> Result<Self, ProxyError> {
        let mut set = Self::default();
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let upper = token.to_ascii_uppercase();
            let method = Method::from_bytes(upper.as_bytes())
                .map_err(|_| ProxyError::InvalidVerb(token.to_string()))?;
            set.insert(method);
        }
        Ok(set)
    }

    /// Parse every entry of a list, merging the results.
    pub fn parse_all<I, S>(items: I) -> Result<Self, ProxyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for item in items {
            set.extend(Self::parse(item.as_ref())?);
        }
        Ok(set)
    }

    /// GET, POST, PUT, DELETE, PATCH.
    pub fn standard() -> Self {
        DEFAULT_METHODS
            .iter()
            .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
            .collect()
    }

    /// Add a method, normalizing extension methods to uppercase.
    pub fn insert(&mut self, method: Method) {
        let method = normalize(method);
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }
}

fn normalize(method: Method) -> Method {
    let upper = method.as_str().to_ascii_uppercase();
    if upper == method.as_str() {
        return method;
    }
    Method::from_bytes(upper.as_bytes()).unwrap_or(method)
}

impl From<Method> for VerbSet {
    fn from(method: Method) -> Self {
        std::iter::once(method).collect()
    }
}

impl FromIterator<Method> for VerbSet {
    fn from_iter<T: IntoIterator<Item = Method>>(iter: T) -> Self {
        let mut set = Self::default();
        for method in iter {
            set.insert(method);
        }
        set
    }
}

impl Extend<Method> for VerbSet {
    fn extend<T: IntoIterator<Item = Method>>(&mut self, iter: T) {
        for method in iter {
            self.insert(method);
        }
    }
}

impl IntoIterator for VerbSet {
    type Item = Method;
    type IntoIter = std::vec::IntoIter<Method>;

    fn into_iter(self) -> Self::IntoIter {
        self.methods.into_iter()
    }
}

impl TryFrom<&str> for VerbSet {
    type Error = ProxyError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

impl std::str::FromStr for VerbSet {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
