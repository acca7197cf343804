//! Concrete navigation policies.
//!
//! - [`BookmarkletPolicy`] : `javascript:` URLs never load; their script runs
//!   against the current document instead.
//! - [`NewTabPolicy`] : command-click opens a foreground tab, command+shift
//!   a background one.
//! - [`OpenExternallyPolicy`] : `mailto:`, `tel:` & co. go to other apps.
//! - [`TargetBlankPolicy`] : links without a target frame become new tabs.
//! - [`GpcPolicy`] : main-frame loads are reissued with `Sec-GPC: 1`.
//! - [`SmarterEncryptionUpgradePolicy`] : `http://` loads to hosts known to
//!   serve HTTPS are reissued as `https://`.
//!
//! [`standard_bucket`] wires them (plus login detection) in the order the
//! browser uses.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ContentBlockingConfig, NavigationConfig};
use crate::event::{HttpMethod, NavigationEvent, NavigationType, TargetFrame};
use crate::fireproofing::{LoginDetectionPolicy, normalize_domain};
use crate::policy::{
    LoadRequest, NavigationActionPolicy, PolicyBucket, PolicyDecision, SideEffect,
    TabDisposition,
};

const BOOKMARKLET_SCHEME: &str = "javascript";

// ─────────────────────────────────────────────────────────────────────────────
// Bookmarklets
// ─────────────────────────────────────────────────────────────────────────────

/// Decodes the script carried by a `javascript:` URL.
///
/// Returns `None` for any other scheme, for malformed percent escapes,
/// for payloads that are not UTF-8 and for blank scripts.
pub fn decode_bookmarklet(url: &Url) -> Option<String> {
    if url.scheme() != BOOKMARKLET_SCHEME {
        return None;
    }

    // `Url` lower-cases the scheme, so the payload starts right after it.
    let payload = url.as_str().get(BOOKMARKLET_SCHEME.len() + 1..)?;
    if !has_valid_escapes(payload) {
        warn!(url = %url, "Malformed percent escape in bookmarklet");
        return None;
    }

    let script = percent_decode_str(payload).decode_utf8().ok()?;
    if script.trim().is_empty() {
        return None;
    }
    Some(script.into_owned())
}

fn has_valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

pub struct BookmarkletPolicy;

#[async_trait(?Send)]
impl NavigationActionPolicy for BookmarkletPolicy {
    fn name(&self) -> &'static str {
        "bookmarklet"
    }

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
        match decode_bookmarklet(event.url()) {
            Some(script) => PolicyDecision::cancel_with(SideEffect::EvaluateScript(script)),
            None => PolicyDecision::Allow,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Modifier-click → new tab
// ─────────────────────────────────────────────────────────────────────────────

/// Desktop-style modifier clicks on links.
///
/// | modifiers        | decision                    |
/// |------------------|-----------------------------|
/// | none / shift     | allow                       |
/// | command          | cancel + foreground tab     |
/// | command + shift  | cancel + background tab     |
pub struct NewTabPolicy;

#[async_trait(?Send)]
impl NavigationActionPolicy for NewTabPolicy {
    fn name(&self) -> &'static str {
        "new-tab"
    }

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
        let modifiers = event.modifiers();
        if event.navigation_type() != NavigationType::LinkActivated || !modifiers.command {
            return PolicyDecision::Allow;
        }

        let disposition = if modifiers.shift {
            TabDisposition::Background
        } else {
            TabDisposition::Foreground
        };
        PolicyDecision::cancel_with(SideEffect::OpenTab {
            url: event.url().clone(),
            disposition,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// target="_blank"
// ─────────────────────────────────────────────────────────────────────────────

pub struct TargetBlankPolicy;

#[async_trait(?Send)]
impl NavigationActionPolicy for TargetBlankPolicy {
    fn name(&self) -> &'static str {
        "target-blank"
    }

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
        if event.target_frame() == TargetFrame::NewWindow
            && event.navigation_type() == NavigationType::LinkActivated
        {
            return PolicyDecision::cancel_with(SideEffect::OpenTab {
                url: event.url().clone(),
                disposition: TabDisposition::OpenedByPage,
            });
        }
        PolicyDecision::Allow
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// External schemes
// ─────────────────────────────────────────────────────────────────────────────

pub struct OpenExternallyPolicy {
    schemes: Vec<String>,
}

impl OpenExternallyPolicy {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            schemes: schemes
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }
}

#[async_trait(?Send)]
impl NavigationActionPolicy for OpenExternallyPolicy {
    fn name(&self) -> &'static str {
        "open-externally"
    }

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
        let url = event.url();
        if self.schemes.iter().any(|s| s == url.scheme()) {
            return PolicyDecision::cancel_with(SideEffect::OpenExternally(url.clone()));
        }
        PolicyDecision::Allow
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Privacy Control
// ─────────────────────────────────────────────────────────────────────────────

pub const GPC_HEADER: &str = "Sec-GPC";

/// Reissues plain main-frame `GET`s with the GPC header.
///
/// The reissued load carries the header and is allowed on the next pass.
/// Modifier clicks and history navigations are left to other policies.
pub struct GpcPolicy {
    enabled: bool,
}

impl GpcPolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait(?Send)]
impl NavigationActionPolicy for GpcPolicy {
    fn name(&self) -> &'static str {
        "gpc"
    }

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
        let url = event.url();
        if !self.enabled
            || !event.is_main_frame()
            || *event.method() != HttpMethod::Get
            || !event.modifiers().is_empty()
            || event.navigation_type() == NavigationType::BackForward
            || !matches!(url.scheme(), "http" | "https")
            || event.header(GPC_HEADER).is_some()
        {
            return PolicyDecision::Allow;
        }

        let mut headers = event.headers().to_vec();
        headers.push((GPC_HEADER.to_string(), "1".to_string()));
        PolicyDecision::cancel_with(SideEffect::Load(LoadRequest {
            url: url.clone(),
            headers,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTPS upgrade
// ─────────────────────────────────────────────────────────────────────────────

/// Source of truth for "does this host serve the same site over HTTPS".
#[async_trait(?Send)]
pub trait HttpsUpgradeCheck {
    async fn is_upgradeable(&self, url: &Url) -> bool;
}

/// Whether protections apply to a domain (the user may exempt sites).
pub trait ProtectionCheck {
    fn is_protected(&self, domain: &str) -> bool;
}

/// Fixed list of upgradeable hosts, matched after normalisation.
#[derive(Debug, Clone, Default)]
pub struct UpgradeableHosts(BTreeSet<String>);

impl UpgradeableHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(hosts.into_iter().map(|h| normalize_domain(h.as_ref())).collect())
    }
}

#[async_trait(?Send)]
impl HttpsUpgradeCheck for UpgradeableHosts {
    async fn is_upgradeable(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|h| self.0.contains(&normalize_domain(h)))
    }
}

/// Domains exempted from protection; every other domain is protected.
#[derive(Debug, Clone, Default)]
pub struct UnprotectedDomains(BTreeSet<String>);

impl UnprotectedDomains {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(domains.into_iter().map(|d| normalize_domain(d.as_ref())).collect())
    }
}

impl ProtectionCheck for UnprotectedDomains {
    fn is_protected(&self, domain: &str) -> bool {
        !self.0.contains(&normalize_domain(domain))
    }
}

/// Upgrades `http://` main-frame `GET`s to `https://`.
///
/// Once a site has been upgraded, a later `http://` navigation to the same
/// site is let through: that is the site redirecting back, and upgrading it
/// again would loop. Navigating to another site clears the guard.
pub struct SmarterEncryptionUpgradePolicy {
    upgrades: Rc<dyn HttpsUpgradeCheck>,
    protection: Rc<dyn ProtectionCheck>,
    last_upgraded: RefCell<Option<Url>>,
}

impl SmarterEncryptionUpgradePolicy {
    pub fn new(upgrades: Rc<dyn HttpsUpgradeCheck>, protection: Rc<dyn ProtectionCheck>) -> Self {
        Self {
            upgrades,
            protection,
            last_upgraded: RefCell::new(None),
        }
    }

    /// `None` when upgrades are switched off.
    pub fn from_config(
        navigation: &NavigationConfig,
        content_blocking: &ContentBlockingConfig,
    ) -> Option<Self> {
        navigation.https_upgrade.then(|| {
            Self::new(
                Rc::new(UpgradeableHosts::new(&navigation.https_upgradeable_hosts)),
                Rc::new(UnprotectedDomains::new(&content_blocking.unprotected_domains)),
            )
        })
    }

    pub fn last_upgraded(&self) -> Option<Url> {
        self.last_upgraded.borrow().clone()
    }
}

#[async_trait(?Send)]
impl NavigationActionPolicy for SmarterEncryptionUpgradePolicy {
    fn name(&self) -> &'static str {
        "https-upgrade"
    }

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
        if !event.is_main_frame() {
            return PolicyDecision::Allow;
        }
        let url = event.url();
        let Some(domain) = url.host_str().map(normalize_domain) else {
            return PolicyDecision::Allow;
        };

        let same_site_as_last = self
            .last_upgraded
            .borrow()
            .as_ref()
            .and_then(Url::host_str)
            .is_some_and(|h| normalize_domain(h) == domain);
        if !same_site_as_last {
            self.last_upgraded.borrow_mut().take();
        }

        if url.scheme() != "http" || *event.method() != HttpMethod::Get {
            return PolicyDecision::Allow;
        }
        if same_site_as_last {
            debug!(url = %url, "Site already upgraded once, not upgrading again");
            return PolicyDecision::Allow;
        }
        if !self.protection.is_protected(&domain) || !self.upgrades.is_upgradeable(url).await {
            return PolicyDecision::Allow;
        }

        let mut upgraded = url.clone();
        if upgraded.set_scheme("https").is_err() {
            return PolicyDecision::Allow;
        }
        info!(from = %url, to = %upgraded, "Upgrading navigation to HTTPS");
        *self.last_upgraded.borrow_mut() = Some(upgraded.clone());
        PolicyDecision::cancel_with(SideEffect::Load(LoadRequest {
            url: upgraded,
            headers: event.headers().to_vec(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Standard chain
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the browser's policy chain.
///
/// Login detection goes last so cookies are only captured for navigations
/// that every other policy let through.
pub fn standard_bucket(
    config: &NavigationConfig,
    https_upgrade: Option<SmarterEncryptionUpgradePolicy>,
    login_detection: Option<LoginDetectionPolicy>,
) -> PolicyBucket {
    let mut bucket = PolicyBucket::new();
    if config.gpc_enabled {
        bucket.add(GpcPolicy::new(true));
    }
    if config.open_in_new_tab {
        bucket.add(NewTabPolicy);
    }
    bucket.add(BookmarkletPolicy);
    if !config.external_schemes.is_empty() {
        bucket.add(OpenExternallyPolicy::new(&config.external_schemes));
    }
    bucket.add(TargetBlankPolicy);
    if let Some(policy) = https_upgrade {
        bucket.add(policy);
    }
    if let Some(policy) = login_detection {
        bucket.add(policy);
    }
    debug!(policies = ?bucket.names(), "Policy chain assembled");
    bucket
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::event::KeyModifiers;
    use crate::policy::NavigationPolicy;
    use crate::policy::tests::RecordingHost;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn link(s: &str, modifiers: KeyModifiers) -> NavigationEvent {
        NavigationEvent::new(url(s))
            .with_navigation_type(NavigationType::LinkActivated)
            .with_modifiers(modifiers)
    }

    #[test]
    fn test_decode_bookmarklet() {
        let encoded = url("javascript:(function()%20%7B%20alert(1)%20%7D)()");
        assert_eq!(
            decode_bookmarklet(&encoded).as_deref(),
            Some("(function() { alert(1) })()")
        );
    }

    #[test]
    fn test_decode_bookmarklet_scheme_is_case_insensitive() {
        assert_eq!(
            decode_bookmarklet(&url("Javascript:alert(1)")).as_deref(),
            Some("alert(1)")
        );
    }

    #[test]
    fn test_decode_rejects_other_schemes() {
        assert_eq!(decode_bookmarklet(&url("https://duckduckgo.com")), None);
    }

    #[test]
    fn test_decode_rejects_malformed_escapes() {
        assert_eq!(decode_bookmarklet(&url("javascript:alert(%zz)")), None);
        assert_eq!(decode_bookmarklet(&url("javascript:alert(1)%2")), None);
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert_eq!(decode_bookmarklet(&url("javascript:%FF%FE")), None);
    }

    #[test]
    fn test_decode_rejects_blank_script() {
        assert_eq!(decode_bookmarklet(&url("javascript:%20")), None);
    }

    #[tokio::test]
    async fn test_bookmarklet_cancels_and_evaluates() {
        let event = NavigationEvent::new(url("javascript:alert(1)"));
        let expected = PolicyDecision::cancel_with(SideEffect::EvaluateScript("alert(1)".into()));
        // Same answer every time.
        assert_eq!(BookmarkletPolicy.check(&event).await, expected);
        assert_eq!(BookmarkletPolicy.check(&event).await, expected);
    }

    #[tokio::test]
    async fn test_bookmarklet_allows_regular_urls() {
        let event = NavigationEvent::new(url("https://example.com"));
        assert_eq!(BookmarkletPolicy.check(&event).await, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_bookmarklet_malformed_fails_open() {
        let event = NavigationEvent::new(url("javascript:%E0%A4%A"));
        assert_eq!(BookmarkletPolicy.check(&event).await, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_new_tab_command_opens_foreground() {
        let decision = NewTabPolicy
            .check(&link("https://example.com/a", KeyModifiers::COMMAND))
            .await;
        assert_eq!(
            decision,
            PolicyDecision::cancel_with(SideEffect::OpenTab {
                url: url("https://example.com/a"),
                disposition: TabDisposition::Foreground,
            })
        );
    }

    #[tokio::test]
    async fn test_new_tab_command_shift_opens_background() {
        let decision = NewTabPolicy
            .check(&link("https://example.com/a", KeyModifiers::COMMAND_SHIFT))
            .await;
        assert_eq!(
            decision,
            PolicyDecision::cancel_with(SideEffect::OpenTab {
                url: url("https://example.com/a"),
                disposition: TabDisposition::Background,
            })
        );
    }

    #[tokio::test]
    async fn test_new_tab_without_modifiers_allows() {
        let decision = NewTabPolicy
            .check(&link("https://example.com/a", KeyModifiers::NONE))
            .await;
        assert_eq!(decision, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_new_tab_shift_alone_allows() {
        let shift = KeyModifiers {
            command: false,
            shift: true,
        };
        let decision = NewTabPolicy.check(&link("https://example.com", shift)).await;
        assert_eq!(decision, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_new_tab_ignores_non_link_navigations() {
        let event = NavigationEvent::new(url("https://example.com"))
            .with_navigation_type(NavigationType::FormSubmitted)
            .with_modifiers(KeyModifiers::COMMAND);
        assert_eq!(NewTabPolicy.check(&event).await, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_target_blank_opens_tab_for_page() {
        let event = link("https://example.com/popup", KeyModifiers::NONE)
            .with_target_frame(TargetFrame::NewWindow);
        assert_eq!(
            TargetBlankPolicy.check(&event).await,
            PolicyDecision::cancel_with(SideEffect::OpenTab {
                url: url("https://example.com/popup"),
                disposition: TabDisposition::OpenedByPage,
            })
        );
    }

    #[tokio::test]
    async fn test_target_blank_allows_main_frame() {
        let event = link("https://example.com", KeyModifiers::NONE);
        assert_eq!(TargetBlankPolicy.check(&event).await, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_open_externally() {
        let policy = OpenExternallyPolicy::new(["mailto", "TEL"]);
        let mail = NavigationEvent::new(url("mailto:someone@example.com"));
        let tel = NavigationEvent::new(url("tel:+331234"));
        let web = NavigationEvent::new(url("https://example.com"));

        assert_eq!(
            policy.check(&mail).await,
            PolicyDecision::cancel_with(SideEffect::OpenExternally(url(
                "mailto:someone@example.com"
            )))
        );
        assert!(policy.check(&tel).await.is_cancel());
        assert_eq!(policy.check(&web).await, PolicyDecision::Allow);
    }

    /// Wraps a real policy and counts how often the chain reaches it.
    struct Counted<P> {
        inner: P,
        calls: Rc<Cell<usize>>,
    }

    fn counted<P>(inner: P) -> (Counted<P>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Counted {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[async_trait(?Send)]
    impl<P: NavigationActionPolicy> NavigationActionPolicy for Counted<P> {
        fn name(&self) -> &'static str {
            self.inner.name()
        }

        async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
            self.calls.set(self.calls.get() + 1);
            self.inner.check(event).await
        }
    }

    #[tokio::test]
    async fn test_bookmarklet_then_new_tab_plain_link_allows() {
        let (bookmarklet, bookmarklet_calls) = counted(BookmarkletPolicy);
        let (new_tab, new_tab_calls) = counted(NewTabPolicy);
        let mut bucket = PolicyBucket::new();
        bucket.add(bookmarklet);
        bucket.add(new_tab);

        let decision = bucket
            .check_policies_for(&link("https://example.com", KeyModifiers::NONE))
            .await;
        let (policy, effect) = decision.into_parts();
        assert_eq!(policy, NavigationPolicy::Allow);
        assert_eq!((bookmarklet_calls.get(), new_tab_calls.get()), (1, 1));

        let host = RecordingHost::default();
        if let Some(effect) = effect {
            effect.perform(&host);
        }
        assert!(host.calls.borrow().is_empty());
    }

    fn get(s: &str) -> NavigationEvent {
        NavigationEvent::new(url(s))
    }

    #[tokio::test]
    async fn test_gpc_reissues_with_header() {
        let event = get("https://example.com/page").with_header("Accept-Language", "fr");
        assert_eq!(
            GpcPolicy::new(true).check(&event).await,
            PolicyDecision::cancel_with(SideEffect::Load(LoadRequest {
                url: url("https://example.com/page"),
                headers: vec![
                    ("Accept-Language".to_string(), "fr".to_string()),
                    ("Sec-GPC".to_string(), "1".to_string()),
                ],
            }))
        );
    }

    #[tokio::test]
    async fn test_gpc_allows_reissued_load() {
        let event = get("https://example.com/page").with_header("sec-gpc", "1");
        assert_eq!(GpcPolicy::new(true).check(&event).await, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_gpc_leaves_other_navigations_alone() {
        let policy = GpcPolicy::new(true);
        let events = [
            get("https://example.com").with_method(HttpMethod::Post),
            get("https://example.com").with_target_frame(TargetFrame::SubFrame),
            link("https://example.com", KeyModifiers::COMMAND),
            get("https://example.com").with_navigation_type(NavigationType::BackForward),
            get("mailto:someone@example.com"),
        ];
        for event in &events {
            assert_eq!(policy.check(event).await, PolicyDecision::Allow, "{event:?}");
        }
        assert_eq!(
            GpcPolicy::new(false).check(&get("https://example.com")).await,
            PolicyDecision::Allow
        );
    }

    fn upgrade_policy(hosts: &[&str], unprotected: &[&str]) -> SmarterEncryptionUpgradePolicy {
        SmarterEncryptionUpgradePolicy::new(
            Rc::new(UpgradeableHosts::new(hosts)),
            Rc::new(UnprotectedDomains::new(unprotected)),
        )
    }

    fn load(s: &str) -> PolicyDecision {
        PolicyDecision::cancel_with(SideEffect::Load(LoadRequest::new(url(s))))
    }

    #[tokio::test]
    async fn test_https_upgrade() {
        let policy = upgrade_policy(&["example.com"], &[]);
        assert_eq!(
            policy.check(&get("http://www.example.com/a?b=c")).await,
            load("https://www.example.com/a?b=c")
        );
        assert_eq!(policy.last_upgraded(), Some(url("https://www.example.com/a?b=c")));
    }

    #[tokio::test]
    async fn test_https_upgrade_skips_unknown_and_unprotected_hosts() {
        let policy = upgrade_policy(&["example.com", "intranet.example"], &["intranet.example"]);
        assert_eq!(policy.check(&get("http://other.org/")).await, PolicyDecision::Allow);
        assert_eq!(
            policy.check(&get("http://intranet.example/")).await,
            PolicyDecision::Allow
        );
        assert_eq!(
            policy.check(&get("https://example.com/")).await,
            PolicyDecision::Allow
        );
        assert_eq!(
            policy
                .check(&get("http://example.com/").with_method(HttpMethod::Post))
                .await,
            PolicyDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_https_upgrade_does_not_loop_on_downgrade_redirect() {
        let policy = upgrade_policy(&["example.com"], &[]);
        assert!(policy.check(&get("http://example.com/")).await.is_cancel());
        // The upgraded load goes through.
        assert_eq!(policy.check(&get("https://example.com/")).await, PolicyDecision::Allow);
        // The site redirects back to http: let it.
        assert_eq!(policy.check(&get("http://example.com/")).await, PolicyDecision::Allow);
    }

    #[tokio::test]
    async fn test_https_upgrade_guard_resets_on_other_site() {
        let policy = upgrade_policy(&["example.com"], &[]);
        assert!(policy.check(&get("http://example.com/")).await.is_cancel());
        policy.check(&get("https://other.org/")).await;
        assert_eq!(policy.last_upgraded(), None);
        assert!(policy.check(&get("http://example.com/")).await.is_cancel());
    }

    #[test]
    fn test_https_upgrade_from_config() {
        let mut navigation = NavigationConfig::default();
        let content_blocking = ContentBlockingConfig::default();
        assert!(SmarterEncryptionUpgradePolicy::from_config(&navigation, &content_blocking).is_some());
        navigation.https_upgrade = false;
        assert!(SmarterEncryptionUpgradePolicy::from_config(&navigation, &content_blocking).is_none());
    }

    #[test]
    fn test_standard_bucket_order() {
        let bucket = standard_bucket(
            &NavigationConfig::default(),
            Some(upgrade_policy(&[], &[])),
            None,
        );
        assert_eq!(
            bucket.names(),
            vec![
                "gpc",
                "new-tab",
                "bookmarklet",
                "open-externally",
                "target-blank",
                "https-upgrade",
            ]
        );
    }

    #[test]
    fn test_standard_bucket_respects_switches() {
        let config = NavigationConfig {
            open_in_new_tab: false,
            external_schemes: Vec::new(),
            gpc_enabled: false,
            ..NavigationConfig::default()
        };
        let bucket = standard_bucket(&config, None, None);
        assert_eq!(bucket.names(), vec!["bookmarklet", "target-blank"]);
    }
}
