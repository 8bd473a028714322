//! Handler registry: exact path → verb → handler.
//!
//! # Responsibilities
//! - Store handlers per exact path and normalized verb
//! - Replace on re-registration, remove per path or per verb
//! - Resolve a request by exact path then exact method
//!
//! # Design Decisions
//! - Path comparison is exact and case-sensitive; the query string is ignored
//! - An entry whose last verb is removed disappears
//! - Paths are kept in registration order

use axum::http::Method;

use super::verbs::VerbSet;
use super::HandlerFn;

/// All handlers registered for one path.
#[derive(Clone)]
pub struct HandlerEntry {
    path: String,
    verbs: Vec<(Method, HandlerFn)>,
}

impl HandlerEntry {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn verbs(&self) -> impl Iterator<Item = &Method> {
        self.verbs.iter().map(|(m, _)| m)
    }

    fn get(&self, method: &Method) -> Option<&HandlerFn> {
        self.verbs.iter().find(|(m, _)| m == method).map(|(_, h)| h)
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("path", &self.path)
            .field("verbs", &self.verbs().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry of path handlers.
#[derive(Clone, Default, Debug)]
pub struct HandlerRegistry {
    entries: Vec<HandlerEntry>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every verb in `verbs` on `path`.
    pub fn add(&mut self, path: &str, verbs: &VerbSet, handler: HandlerFn) {
        if verbs.is_empty() {
            return;
        }

        let index = match self.entries.iter().position(|e| e.path == path) {
            Some(index) => index,
            None => {
                self.entries.push(HandlerEntry {
                    path: path.to_string(),
                    verbs: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];

        for method in verbs.iter() {
            match entry.verbs.iter_mut().find(|(m, _)| m == method) {
                Some((_, existing)) => *existing = handler.clone(),
                None => entry.verbs.push((method.clone(), handler.clone())),
            }
        }
    }

    /// Remove the whole path (`None`) or only the given verbs.
    pub fn remove(&mut self, path: &str, verbs: Option<&VerbSet>) {
        match verbs {
            None => self.entries.retain(|e| e.path != path),
            Some(verbs) => {
                if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
                    entry.verbs.retain(|(m, _)| !verbs.contains(m));
                }
                self.entries.retain(|e| !e.verbs.is_empty());
            }
        }
    }

    /// Handler for this exact path and method.
    pub fn lookup(&self, path: &str, method: &Method) -> Option<HandlerFn> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .and_then(|e| e.get(method))
            .cloned()
    }

    pub fn entry(&self, path: &str) -> Option<&HandlerEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn entries(&self) -> &[HandlerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler_fn;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    fn verbs(text: &str) -> VerbSet {
        VerbSet::parse(text).unwrap()
    }

    fn responding(status: StatusCode) -> HandlerFn {
        handler_fn(move |_req| async move { status })
    }

    async fn call(handler: HandlerFn) -> StatusCode {
        let req = Request::builder().body(Body::empty()).unwrap();
        handler(req).await.status()
    }

    #[test]
    fn test_get_post_only() {
        let mut registry = HandlerRegistry::new();
        registry.add("/x", &verbs("GET,POST"), responding(StatusCode::OK));

        assert!(registry.lookup("/x", &Method::GET).is_some());
        assert!(registry.lookup("/x", &Method::POST).is_some());
        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            assert!(registry.lookup("/x", &method).is_none());
        }
        assert!(registry.lookup("/x/", &Method::GET).is_none());
    }

    #[test]
    fn test_remove_whole_path() {
        let mut registry = HandlerRegistry::new();
        registry.add("/x", &verbs("GET,POST"), responding(StatusCode::OK));
        registry.remove("/x", None);
        assert!(registry.lookup("/x", &Method::GET).is_none());
        assert!(registry.lookup("/x", &Method::POST).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_single_verb_keeps_others() {
        let mut registry = HandlerRegistry::new();
        registry.add("/x", &verbs("GET,POST"), responding(StatusCode::OK));
        registry.remove("/x", Some(&verbs("get")));
        assert!(registry.lookup("/x", &Method::GET).is_none());
        assert!(registry.lookup("/x", &Method::POST).is_some());

        registry.remove("/x", Some(&verbs("POST")));
        assert!(registry.entry("/x").is_none());
    }

    #[test]
    fn test_remove_missing_path_is_noop() {
        let mut registry = HandlerRegistry::new();
        registry.add("/x", &verbs("GET"), responding(StatusCode::OK));
        registry.remove("/nope", None);
        registry.remove("/nope", Some(&verbs("GET")));
        assert_eq!(registry.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_verb() {
        let mut registry = HandlerRegistry::new();
        registry.add("/x", &verbs("GET,POST"), responding(StatusCode::OK));
        registry.add("/x", &verbs("post"), responding(StatusCode::CREATED));

        let entry = registry.entry("/x").unwrap();
        assert_eq!(entry.verbs().count(), 2);
        assert_eq!(call(registry.lookup("/x", &Method::POST).unwrap()).await, StatusCode::CREATED);
        assert_eq!(call(registry.lookup("/x", &Method::GET).unwrap()).await, StatusCode::OK);
    }

    #[test]
    fn test_empty_verb_set_registers_nothing() {
        let mut registry = HandlerRegistry::new();
        registry.add("/x", &VerbSet::default(), responding(StatusCode::OK));
        assert!(registry.is_empty());
    }
}
