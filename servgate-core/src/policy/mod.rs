//! Allow/deny evaluation for unit names.

mod source;

pub use source::{FilePolicySource, InlinePolicySource, PolicySource};

use crate::models::AccessVerdict;
use crate::unit::ServiceIdentifier;
use std::sync::Arc;
use tracing::debug;

/// Combines an allow-list and a deny-list. Both are loaded on every call.
#[derive(Clone)]
pub struct AccessPolicy {
    allow: Arc<dyn PolicySource>,
    deny: Arc<dyn PolicySource>,
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicy").finish_non_exhaustive()
    }
}

impl AccessPolicy {
    pub fn new(allow: Arc<dyn PolicySource>, deny: Arc<dyn PolicySource>) -> Self {
        Self { allow, deny }
    }

    /// No restriction at all; every unit is allowed.
    pub fn unrestricted() -> Self {
        Self::new(
            Arc::new(InlinePolicySource::empty()),
            Arc::new(InlinePolicySource::empty()),
        )
    }

    /// A non-empty allow-list must contain the unit; the deny-list always vetoes.
    pub fn is_allowed(&self, unit: &ServiceIdentifier) -> AccessVerdict {
        let allow = self.allow.load();
        if !allow.is_empty() && !allow.contains(unit) {
            debug!(unit = %unit, "not on allow-list");
            return AccessVerdict::Denied;
        }

        let deny = self.deny.load();
        if deny.contains(unit) {
            debug!(unit = %unit, "on deny-list");
            return AccessVerdict::Denied;
        }

        AccessVerdict::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{normalize, SuffixMode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unit(raw: &str) -> ServiceIdentifier {
        normalize(raw, SuffixMode::Optional).unwrap()
    }

    fn inline(raw: &str) -> Arc<dyn PolicySource> {
        Arc::new(InlinePolicySource::parse(raw, SuffixMode::Optional))
    }

    struct CountingSource {
        inner: InlinePolicySource,
        loads: AtomicUsize,
    }

    impl PolicySource for CountingSource {
        fn load(&self) -> Vec<ServiceIdentifier> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load()
        }
    }

    #[test]
    fn deny_list_only() {
        let policy = AccessPolicy::new(inline(""), inline("x.service"));
        assert_eq!(policy.is_allowed(&unit("x")), AccessVerdict::Denied);
        assert_eq!(policy.is_allowed(&unit("y")), AccessVerdict::Allowed);
    }

    #[test]
    fn allow_list_only() {
        let policy = AccessPolicy::new(inline("x.service"), inline(""));
        assert_eq!(policy.is_allowed(&unit("y")), AccessVerdict::Denied);
        assert_eq!(policy.is_allowed(&unit("x")), AccessVerdict::Allowed);
    }

    #[test]
    fn deny_list_vetoes_allow_list() {
        let policy = AccessPolicy::new(inline("x.service"), inline("x.service"));
        assert_eq!(policy.is_allowed(&unit("x.service")), AccessVerdict::Denied);
    }

    #[test]
    fn empty_lists_allow_everything() {
        let policy = AccessPolicy::unrestricted();
        assert_eq!(policy.is_allowed(&unit("anything")), AccessVerdict::Allowed);
    }

    #[test]
    fn short_list_entries_match_full_names() {
        let policy = AccessPolicy::new(inline("nginx"), inline(""));
        assert_eq!(policy.is_allowed(&unit("nginx.service")), AccessVerdict::Allowed);
    }

    #[test]
    fn deny_list_skipped_when_allow_list_rejects() {
        let deny = Arc::new(CountingSource {
            inner: InlinePolicySource::empty(),
            loads: AtomicUsize::new(0),
        });
        let policy = AccessPolicy::new(inline("x"), deny.clone());
        assert_eq!(policy.is_allowed(&unit("y")), AccessVerdict::Denied);
        assert_eq!(deny.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sources_are_loaded_per_decision() {
        let allow = Arc::new(CountingSource {
            inner: InlinePolicySource::empty(),
            loads: AtomicUsize::new(0),
        });
        let policy = AccessPolicy::new(allow.clone(), inline(""));
        policy.is_allowed(&unit("a"));
        policy.is_allowed(&unit("b"));
        assert_eq!(allow.loads.load(Ordering::SeqCst), 2);
    }
}
