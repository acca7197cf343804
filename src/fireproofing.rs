//! Login detection and fireproofing.
//!
//! Two navigation callbacks drive a small state machine:
//!
//! ```text
//! navigation intent (POST, main frame)
//!     └─ capture cookies for the host ──► PendingLogin
//! other main-frame intent (not a same-site redirect) / navigation failed
//!     └─ drop PendingLogin
//! navigation finished (landing URL)
//!     ├─ no pending capture / no URL ──► nothing
//!     ├─ host or path unchanged        ──► nothing (unless cookie heuristic)
//!     └─ changed ──► domain fireproofed? ──► nothing
//!                            └─ no ──► prompt ──► yes: allow-list + favicon
//! ```
//!
//! The capture happens inside [`LoginDetectionPolicy`], which always allows
//! but awaits the cookie lookup first, so the snapshot is taken before the
//! credential-submitting request goes out.
//!
//! The allow-list ([`AllowedDomains`]) is an explicit store owned by the
//! embedder and persisted as TOML.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::event::{NavigationEvent, NavigationType};
use crate::policy::{NavigationActionPolicy, PolicyDecision};

// ─────────────────────────────────────────────────────────────────────────────
// Cookies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl Cookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
        }
    }

    /// Cookie-domain matching: exact host, or a parent domain of it.
    pub fn applies_to(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        let host = host.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    }
}

/// Access to the renderer's cookie jar.
#[async_trait(?Send)]
pub trait CookieStore {
    async fn all_cookies(&self) -> Vec<Cookie>;
}

/// Cookies visible to `host`, in a canonical order.
async fn cookies_for_host(store: &dyn CookieStore, host: &str) -> Vec<Cookie> {
    let mut cookies: Vec<Cookie> = store
        .all_cookies()
        .await
        .into_iter()
        .filter(|c| c.applies_to(host))
        .collect();
    cookies.sort();
    cookies
}

// ─────────────────────────────────────────────────────────────────────────────
// AllowedDomains
// ─────────────────────────────────────────────────────────────────────────────

/// `a` and `b` are the same domain or one is a subdomain of the other.
fn same_site(a: &str, b: &str) -> bool {
    a == b || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}

/// Lower-cases and drops a leading `www.`.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    match domain.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => domain,
    }
}

/// Persistent set of fireproofed domains plus the login-detection switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowedDomains {
    login_detection_enabled: bool,
    domains: BTreeSet<String>,
}

impl Default for AllowedDomains {
    fn default() -> Self {
        Self {
            login_detection_enabled: true,
            domains: BTreeSet::new(),
        }
    }
}

impl AllowedDomains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the store. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No fireproof store yet");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        let store: Self = toml::from_str(&content).map_err(|source| Error::TomlDe {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), domains = store.domains.len(), "Fireproof store loaded");
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| Error::io(path, e))?;
        debug!(path = %path.display(), "Fireproof store saved");
        Ok(())
    }

    pub fn is_allowed(&self, domain: &str) -> bool {
        self.domains.contains(&normalize_domain(domain))
    }

    /// Returns `false` if the domain was already present.
    pub fn add(&mut self, domain: &str) -> bool {
        self.domains.insert(normalize_domain(domain))
    }

    pub fn remove(&mut self, domain: &str) -> bool {
        self.domains.remove(&normalize_domain(domain))
    }

    pub fn clear_all(&mut self) {
        self.domains.clear();
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn login_detection_enabled(&self) -> bool {
        self.login_detection_enabled
    }

    pub fn set_login_detection_enabled(&mut self, enabled: bool) {
        self.login_detection_enabled = enabled;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoginDetector
// ─────────────────────────────────────────────────────────────────────────────

/// State captured when a credential-submitting navigation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
    pub url: Url,
    pub domain: String,
    pub cookies: Vec<Cookie>,
}

/// Per-tab login detection state.
pub struct LoginDetector {
    cookie_store: Rc<dyn CookieStore>,
    allowed: Rc<RefCell<AllowedDomains>>,
    detect_cookie_changes: bool,
    pending: RefCell<Option<PendingLogin>>,
}

impl LoginDetector {
    pub fn new(
        cookie_store: Rc<dyn CookieStore>,
        allowed: Rc<RefCell<AllowedDomains>>,
        detect_cookie_changes: bool,
    ) -> Self {
        Self {
            cookie_store,
            allowed,
            detect_cookie_changes,
            pending: RefCell::new(None),
        }
    }

    /// Records a navigation intent. Returns `true` when cookies were captured.
    ///
    /// A main-frame non-POST intent keeps an earlier capture only when it
    /// looks like the redirect that follows a login form: an `Other`
    /// navigation to the same site. Anything the user started drops it.
    pub async fn navigation_intent(&self, event: &NavigationEvent) -> bool {
        if !event.is_main_frame() {
            return false;
        }
        if !event.method().submits_credentials() {
            self.discard_unless_redirect(event);
            return false;
        }
        if !self.allowed.borrow().login_detection_enabled() {
            self.pending.borrow_mut().take();
            return false;
        }
        let Some(host) = event.url().host_str().map(str::to_owned) else {
            self.pending.borrow_mut().take();
            return false;
        };

        let cookies = cookies_for_host(self.cookie_store.as_ref(), &host).await;
        debug!(url = %event.url(), cookies = cookies.len(), "Captured cookies ahead of POST");
        *self.pending.borrow_mut() = Some(PendingLogin {
            url: event.url().clone(),
            domain: normalize_domain(&host),
            cookies,
        });
        true
    }

    fn discard_unless_redirect(&self, event: &NavigationEvent) {
        let mut pending = self.pending.borrow_mut();
        let Some(login) = pending.as_ref() else {
            return;
        };
        let redirect = event.navigation_type() == NavigationType::Other
            && event
                .url()
                .host_str()
                .is_some_and(|host| same_site(&normalize_domain(host), &login.domain));
        if !redirect {
            debug!(from = %login.url, to = %event.url(), "Pending login capture dropped");
            *pending = None;
        }
    }

    /// The navigation failed or was abandoned: forget the capture.
    pub fn navigation_failed(&self) {
        if let Some(login) = self.pending.borrow_mut().take() {
            debug!(url = %login.url, "Login navigation failed, capture dropped");
        }
    }

    /// Consumes the pending capture and returns the landing domain if the
    /// navigation looks like a completed login.
    pub async fn navigation_finished(&self, url: Option<&Url>) -> Option<String> {
        let pending = self.pending.borrow_mut().take()?;
        let url = url?;
        let host = url.host_str()?;

        let moved = pending.url.host_str() != Some(host) || pending.url.path() != url.path();
        let detected = if moved {
            true
        } else if self.detect_cookie_changes {
            cookies_for_host(self.cookie_store.as_ref(), host).await != pending.cookies
        } else {
            false
        };

        if detected {
            debug!(from = %pending.url, to = %url, "Possible login detected");
            Some(normalize_domain(host))
        } else {
            None
        }
    }

    pub fn pending(&self) -> Option<PendingLogin> {
        self.pending.borrow().clone()
    }
}

/// Policy wrapper that snapshots cookies and always allows.
pub struct LoginDetectionPolicy {
    detector: Rc<LoginDetector>,
}

impl LoginDetectionPolicy {
    pub fn new(detector: Rc<LoginDetector>) -> Self {
        Self { detector }
    }
}

#[async_trait(?Send)]
impl NavigationActionPolicy for LoginDetectionPolicy {
    fn name(&self) -> &'static str {
        "login-detection"
    }

    async fn check(&self, event: &NavigationEvent) -> PolicyDecision {
        self.detector.navigation_intent(event).await;
        PolicyDecision::Allow
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fireproofing
// ─────────────────────────────────────────────────────────────────────────────

/// UI collaborator asking "fireproof this site?".
#[async_trait(?Send)]
pub trait FireproofPrompt {
    async fn ask_to_fireproof(&self, domain: &str) -> bool;
}

/// Best-effort favicon refresh for a newly fireproofed domain.
pub trait FaviconRefresher {
    fn refresh_favicon(&self, domain: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireproofOutcome {
    NotALogin,
    AlreadyFireproofed(String),
    Declined(String),
    Fireproofed(String),
}

pub struct FireproofingCoordinator {
    detector: Rc<LoginDetector>,
    allowed: Rc<RefCell<AllowedDomains>>,
    prompt: Rc<dyn FireproofPrompt>,
    favicons: Rc<dyn FaviconRefresher>,
}

impl FireproofingCoordinator {
    pub fn new(
        cookie_store: Rc<dyn CookieStore>,
        allowed: Rc<RefCell<AllowedDomains>>,
        prompt: Rc<dyn FireproofPrompt>,
        favicons: Rc<dyn FaviconRefresher>,
        detect_cookie_changes: bool,
    ) -> Self {
        let detector = Rc::new(LoginDetector::new(
            cookie_store,
            allowed.clone(),
            detect_cookie_changes,
        ));
        Self {
            detector,
            allowed,
            prompt,
            favicons,
        }
    }

    /// Policy to register in the tab's chain.
    pub fn login_detection_policy(&self) -> LoginDetectionPolicy {
        LoginDetectionPolicy::new(self.detector.clone())
    }

    pub fn detector(&self) -> &LoginDetector {
        &self.detector
    }

    pub fn allowed_domains(&self) -> Rc<RefCell<AllowedDomains>> {
        self.allowed.clone()
    }

    /// The main-frame navigation failed or was cancelled.
    pub fn did_fail_navigation(&self) {
        self.detector.navigation_failed();
    }

    /// Runs after the page landed; may prompt the user.
    pub async fn did_finish_navigation(&self, url: Option<&Url>) -> FireproofOutcome {
        let Some(domain) = self.detector.navigation_finished(url).await else {
            return FireproofOutcome::NotALogin;
        };

        if self.allowed.borrow().is_allowed(&domain) {
            debug!(domain = %domain, "Login on fireproofed domain, no prompt");
            return FireproofOutcome::AlreadyFireproofed(domain);
        }

        if !self.prompt.ask_to_fireproof(&domain).await {
            debug!(domain = %domain, "Fireproofing declined");
            return FireproofOutcome::Declined(domain);
        }

        if !self.allowed.borrow_mut().add(&domain) {
            warn!(domain = %domain, "Domain fireproofed while the prompt was open");
        }
        info!(domain = %domain, "Domain fireproofed");
        self.favicons.refresh_favicon(&domain);
        FireproofOutcome::Fireproofed(domain)
    }
}
