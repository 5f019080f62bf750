//! Ephemeral playable/display handles for payloads
//!
//! A handle is a process-local url (`/media/<token>`) under which the http
//! server serves a payload. Handles are never persisted. Each [`MediaHandle`]
//! has exactly one owner and revokes its url when dropped.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::domain::media::Payload;

pub const MEDIA_PREFIX: &str = "/media/";

#[derive(Debug, Default)]
struct Entries {
    next_serial: u64,
    payloads: HashMap<String, Arc<Payload>>,
}

/// Table of live handles, shared with the http threads that serve them.
#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    entries: Arc<RwLock<Entries>>,
}

impl HandleRegistry {
    /// Registers a payload and returns the handle owning the registration.
    pub fn issue(&self, payload: Arc<Payload>) -> MediaHandle {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.next_serial += 1;
        let token = format!("{}-{:x}", payload.digest().short(), entries.next_serial);
        entries.payloads.insert(token.clone(), payload);
        log::debug!("issued media handle {token}");
        MediaHandle {
            url: format!("{MEDIA_PREFIX}{token}"),
            token,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, token: &str) -> Option<Arc<Payload>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.payloads.get(token).cloned()
    }

    pub fn resolve_url(&self, url: &str) -> Option<Arc<Payload>> {
        url.strip_prefix(MEDIA_PREFIX)
            .and_then(|token| self.resolve(token))
    }

    /// number of handles currently alive
    pub fn live(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.payloads.len()
    }

    fn revoke(&self, token: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.payloads.remove(token).is_some() {
            log::debug!("revoked media handle {token}");
        }
    }
}

/// Owned registration of a payload in the [`HandleRegistry`].
#[derive(Debug)]
pub struct MediaHandle {
    token: String,
    url: String,
    registry: HandleRegistry,
}

impl MediaHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    #[cfg(test)]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Drop for MediaHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn payload(bytes: &[u8]) -> Arc<Payload> {
        Arc::new(Payload::new("audio/mpeg", bytes.to_vec()))
    }

    #[test]
    fn issued_handle_resolves_until_dropped() {
        let registry = HandleRegistry::default();
        let handle = registry.issue(payload(b"abc"));

        assert!(handle.url().starts_with(MEDIA_PREFIX));
        assert_eq!(registry.resolve(handle.token()).unwrap().bytes(), b"abc");

        let url = handle.url().to_string();
        drop(handle);

        assert!(registry.resolve_url(&url).is_none());
        assert_eq!(registry.live(), 0);
    }

    #[test]
    fn same_payload_gets_distinct_handles() {
        let registry = HandleRegistry::default();
        let p = payload(b"same");
        let a = registry.issue(p.clone());
        let b = registry.issue(p);

        assert_ne!(a.url(), b.url());
        drop(a);
        assert!(registry.resolve(b.token()).is_some());
        assert_eq!(registry.live(), 1);
    }

    #[test]
    fn unknown_urls_do_not_resolve() {
        let registry = HandleRegistry::default();
        assert!(registry.resolve_url("/elsewhere/x").is_none());
        assert!(registry.resolve("nope").is_none());
    }
}
