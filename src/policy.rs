//! Navigation policy chain.
//!
//! Every prospective navigation is run through a [`PolicyBucket`]: an
//! ordered list of [`NavigationActionPolicy`] trait objects evaluated one
//! at a time, in registration order. The first policy that cancels wins;
//! the policies after it are never invoked. An exhausted (or empty) chain
//! allows the navigation.
//!
//! ```text
//! renderer ──► PolicyBucket::check_policies_for(event)
//!                 ├─ P1.check ─► Allow
//!                 ├─ P2.check ─► Cancel(Some(effect)) ──► stop
//!                 └─ P3 (never called)
//! ```
//!
//! A cancel may carry a [`SideEffect`]. Effects are plain data, consumed by
//! value when performed against the [`NavigationHost`], so they run at most
//! once and only for a cancelled navigation.

use async_trait::async_trait;
use tracing::{debug, trace};
use url::Url;

use crate::event::NavigationEvent;

// ─────────────────────────────────────────────────────────────────────────────
// Decisions and side effects
// ─────────────────────────────────────────────────────────────────────────────

/// How a new tab requested by a side effect should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDisposition {
    /// Command-click: open and switch to the new tab.
    Foreground,
    /// Command+Shift-click: open without leaving the current tab.
    Background,
    /// The page itself asked for a new window (`target="_blank"`).
    OpenedByPage,
}

/// A navigation to start again in the current tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl LoadRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
        }
    }
}

/// Follow-up work to run once the default navigation has been suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Evaluate the script against the current document.
    EvaluateScript(String),
    /// Re-issue the navigation in a new tab.
    OpenTab {
        url: Url,
        disposition: TabDisposition,
    },
    /// Hand the URL to another application (mail client, dialer...).
    OpenExternally(Url),
    /// Reissue the navigation in place, possibly rewritten.
    Load(LoadRequest),
}

impl SideEffect {
    /// Runs the effect against the hosting container.
    pub fn perform(self, host: &dyn NavigationHost) {
        debug!(effect = ?self, "Performing navigation side effect");
        match self {
            Self::EvaluateScript(script) => host.evaluate_script(&script),
            Self::OpenTab { url, disposition } => host.open_tab(&url, disposition),
            Self::OpenExternally(url) => host.open_externally(&url),
            Self::Load(request) => host.load(&request),
        }
    }
}

/// Outcome of judging one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Cancel(Option<SideEffect>),
}

impl PolicyDecision {
    pub fn cancel() -> Self {
        Self::Cancel(None)
    }

    pub fn cancel_with(effect: SideEffect) -> Self {
        Self::Cancel(Some(effect))
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel(_))
    }

    /// Splits into what the renderer applies and what runs afterwards.
    pub fn into_parts(self) -> (NavigationPolicy, Option<SideEffect>) {
        match self {
            Self::Allow => (NavigationPolicy::Allow, None),
            Self::Cancel(effect) => (NavigationPolicy::Cancel, effect),
        }
    }
}

/// The bare allow/cancel answer handed back to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Allow,
    Cancel,
}

// ─────────────────────────────────────────────────────────────────────────────
// Seams
// ─────────────────────────────────────────────────────────────────────────────

/// Narrow callbacks from the navigation core into the hosting UI.
///
/// These are the only outward calls side effects may make.
pub trait NavigationHost {
    fn evaluate_script(&self, script: &str);
    fn open_tab(&self, url: &Url, disposition: TabDisposition);
    fn open_externally(&self, url: &Url);
    fn load(&self, request: &LoadRequest);
}

/// A single judge of prospective navigations.
///
/// Implementations may await I/O before deciding but must eventually
/// resolve: a future that never completes stalls the navigation it was
/// asked about, and nothing upstream times it out. A policy must also be
/// safe to call speculatively and must not assume it is the only check.
#[async_trait(?Send)]
pub trait NavigationActionPolicy {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision;
}

// ─────────────────────────────────────────────────────────────────────────────
// PolicyBucket
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered chain of policies. Registration order is evaluation order.
#[derive(Default)]
pub struct PolicyBucket {
    policies: Vec<Box<dyn NavigationActionPolicy>>,
}

impl PolicyBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a policy. No de-duplication.
    pub fn add(&mut self, policy: impl NavigationActionPolicy + 'static) {
        self.policies.push(Box::new(policy));
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Policy names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// Evaluates the chain against `event`, stopping at the first cancel.
    pub async fn check_policies_for(&self, event: &NavigationEvent) -> PolicyDecision {
        for policy in &self.policies {
            match policy.check(event).await {
                PolicyDecision::Allow => {
                    trace!(policy = policy.name(), url = %event.url(), "Policy allowed navigation");
                }
                cancel @ PolicyDecision::Cancel(_) => {
                    debug!(policy = policy.name(), url = %event.url(), "Navigation cancelled");
                    return cancel;
                }
            }
        }
        PolicyDecision::Allow
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    /// Host that records every call it receives.
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        pub calls: RefCell<Vec<String>>,
    }

    impl NavigationHost for RecordingHost {
        fn evaluate_script(&self, script: &str) {
            self.calls.borrow_mut().push(format!("eval:{script}"));
        }

        fn open_tab(&self, url: &Url, disposition: TabDisposition) {
            self.calls
                .borrow_mut()
                .push(format!("tab:{disposition:?}:{url}"));
        }

        fn open_externally(&self, url: &Url) {
            self.calls.borrow_mut().push(format!("external:{url}"));
        }

        fn load(&self, request: &LoadRequest) {
            let headers: Vec<String> = request
                .headers
                .iter()
                .map(|(n, v)| format!("{n}={v}"))
                .collect();
            self.calls
                .borrow_mut()
                .push(format!("load:{}[{}]", request.url, headers.join(",")));
        }
    }

    struct CountingPolicy {
        calls: Rc<Cell<usize>>,
        decision: PolicyDecision,
    }

    #[async_trait(?Send)]
    impl NavigationActionPolicy for CountingPolicy {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn check(&self, _event: &NavigationEvent) -> PolicyDecision {
            self.calls.set(self.calls.get() + 1);
            self.decision.clone()
        }
    }

    fn counting(decision: PolicyDecision) -> (CountingPolicy, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            CountingPolicy {
                calls: calls.clone(),
                decision,
            },
            calls,
        )
    }

    fn event() -> NavigationEvent {
        NavigationEvent::new(Url::parse("https://example.com").unwrap())
    }

    #[tokio::test]
    async fn test_empty_bucket_allows() {
        let bucket = PolicyBucket::new();
        assert!(bucket.is_empty());
        assert_eq!(bucket.check_policies_for(&event()).await, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_all_allow_runs_every_policy_once() {
        let mut bucket = PolicyBucket::new();
        let (p1, c1) = counting(PolicyDecision::Allow);
        let (p2, c2) = counting(PolicyDecision::Allow);
        bucket.add(p1);
        bucket.add(p2);

        assert_eq!(bucket.check_policies_for(&event()).await, PolicyDecision::Allow);
        assert_eq!(c1.get(), 1);
        assert_eq!(c2.get(), 1);
    }

    #[tokio::test]
    async fn test_first_cancel_short_circuits() {
        let mut bucket = PolicyBucket::new();
        let (p1, c1) = counting(PolicyDecision::Allow);
        let (p2, c2) = counting(PolicyDecision::cancel_with(SideEffect::EvaluateScript(
            "first".into(),
        )));
        let (p3, c3) = counting(PolicyDecision::cancel_with(SideEffect::EvaluateScript(
            "second".into(),
        )));
        let (p4, c4) = counting(PolicyDecision::Allow);
        bucket.add(p1);
        bucket.add(p2);
        bucket.add(p3);
        bucket.add(p4);

        let decision = bucket.check_policies_for(&event()).await;
        assert_eq!(
            decision,
            PolicyDecision::cancel_with(SideEffect::EvaluateScript("first".into()))
        );
        assert_eq!((c1.get(), c2.get(), c3.get(), c4.get()), (1, 1, 0, 0));
    }

    #[tokio::test]
    async fn test_bucket_is_reusable_across_events() {
        let mut bucket = PolicyBucket::new();
        let (p1, c1) = counting(PolicyDecision::Allow);
        bucket.add(p1);
        bucket.check_policies_for(&event()).await;
        bucket.check_policies_for(&event()).await;
        assert_eq!(c1.get(), 2);
    }

    #[test]
    fn test_into_parts() {
        assert_eq!(PolicyDecision::Allow.into_parts(), (NavigationPolicy::Allow, None));
        assert_eq!(PolicyDecision::cancel().into_parts(), (NavigationPolicy::Cancel, None));
        let url = Url::parse("https://example.com").unwrap();
        let (policy, effect) = PolicyDecision::cancel_with(SideEffect::OpenExternally(url.clone()))
            .into_parts();
        assert_eq!(policy, NavigationPolicy::Cancel);
        assert_eq!(effect, Some(SideEffect::OpenExternally(url)));
    }

    #[test]
    fn test_side_effect_dispatch() {
        let host = RecordingHost::default();
        let url = Url::parse("https://example.com/").unwrap();
        SideEffect::EvaluateScript("alert(1)".into()).perform(&host);
        SideEffect::OpenTab {
            url: url.clone(),
            disposition: TabDisposition::Background,
        }
        .perform(&host);
        SideEffect::OpenExternally(Url::parse("mailto:a@b.c").unwrap()).perform(&host);
        SideEffect::Load(LoadRequest::new(url.clone())).perform(&host);

        assert_eq!(
            *host.calls.borrow(),
            vec![
                "eval:alert(1)".to_string(),
                "tab:Background:https://example.com/".to_string(),
                "external:mailto:a@b.c".to_string(),
                "load:https://example.com/[]".to_string(),
            ]
        );
    }
}
