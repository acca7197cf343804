//! Glue between the renderer's callbacks and the navigation core.
//!
//! [`NavigationDelegate`] is what a tab hands to the web view. It answers
//! three kinds of callbacks:
//!
//! 1. **Navigation decisions** : `decide_policy_for` runs the
//!    [`PolicyBucket`] and completes the renderer's decision handler exactly
//!    once, then performs the cancel's side effect (if any).
//! 2. **Page lifecycle** : `notify_url_changed`, `did_finish_navigation`
//!    and `did_fail_navigation` keep the committed URL current and drive the
//!    fireproofing flow.
//! 3. **Resource loads** : `load_web_resource` consults the attached content
//!    rule lists.
//!
//! All callbacks run on the UI thread; nothing here is `Send`.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};
use url::Url;

use crate::content_rules::ContentRuleListController;
use crate::event::NavigationEvent;
use crate::fireproofing::{FireproofOutcome, FireproofingCoordinator};
use crate::policy::{NavigationHost, NavigationPolicy, PolicyBucket};
use crate::privacy::RendererRuleLists;

/// What to do with a subresource or document request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceVerdict {
    Load,
    Block,
}

pub struct NavigationDelegate {
    bucket: PolicyBucket,
    host: Rc<dyn NavigationHost>,
    fireproofing: Option<FireproofingCoordinator>,
    rule_lists: ContentRuleListController<RendererRuleLists>,
    current_url: RefCell<Option<Url>>,
}

impl NavigationDelegate {
    pub fn new(bucket: PolicyBucket, host: Rc<dyn NavigationHost>) -> Self {
        Self {
            bucket,
            host,
            fireproofing: None,
            rule_lists: ContentRuleListController::new(RendererRuleLists::new()),
            current_url: RefCell::new(None),
        }
    }

    /// Enables the login-detection / fireproofing flow.
    ///
    /// The coordinator's policy must already be registered in the bucket
    /// (see [`crate::policies::standard_bucket`]).
    pub fn with_fireproofing(mut self, coordinator: FireproofingCoordinator) -> Self {
        self.fireproofing = Some(coordinator);
        self
    }

    pub fn bucket(&self) -> &PolicyBucket {
        &self.bucket
    }

    pub fn fireproofing(&self) -> Option<&FireproofingCoordinator> {
        self.fireproofing.as_ref()
    }

    pub fn rule_lists(&self) -> &ContentRuleListController<RendererRuleLists> {
        &self.rule_lists
    }

    /// Mutable access for [`crate::content_rules::ContentBlockingUpdater`].
    pub fn rule_lists_mut(&mut self) -> &mut ContentRuleListController<RendererRuleLists> {
        &mut self.rule_lists
    }

    pub fn current_url(&self) -> Option<Url> {
        self.current_url.borrow().clone()
    }

    /// Decides `event` and completes `decision_handler` exactly once.
    ///
    /// The handler receives the decision before any side effect runs. A side
    /// effect that itself navigates produces a new, independent event.
    pub async fn decide_policy_for(
        &self,
        event: &NavigationEvent,
        decision_handler: impl FnOnce(NavigationPolicy),
    ) {
        let (policy, effect) = self.bucket.check_policies_for(event).await.into_parts();
        trace!(url = %event.url(), ?policy, "Navigation decided");
        decision_handler(policy);

        if let Some(effect) = effect {
            effect.perform(self.host.as_ref());
        }
    }

    /// The committed URL changed (navigation, redirect, history).
    pub fn notify_url_changed(&self, url: Url) {
        debug!(url = %url, "URL changed");
        *self.current_url.borrow_mut() = Some(url);
        self.rule_lists.backend().clear_cache();
    }

    /// A navigation finished loading. `url` is where it landed, if known.
    pub async fn did_finish_navigation(&self, url: Option<&Url>) -> FireproofOutcome {
        if let Some(url) = url {
            self.notify_url_changed(url.clone());
        }
        match &self.fireproofing {
            Some(coordinator) => coordinator.did_finish_navigation(url).await,
            None => FireproofOutcome::NotALogin,
        }
    }

    /// The main-frame navigation failed or the user stopped it.
    pub fn did_fail_navigation(&self) {
        debug!("Navigation failed");
        if let Some(coordinator) = &self.fireproofing {
            coordinator.did_fail_navigation();
        }
    }

    /// Checks a request against the attached regular rule lists.
    pub fn load_web_resource(&self, url: &Url, is_main_frame: bool) -> ResourceVerdict {
        let source_url = self
            .current_url
            .borrow()
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_default();
        let request_type = if is_main_frame { "document" } else { "other" };

        if self
            .rule_lists
            .backend()
            .should_block(url.as_str(), &source_url, request_type)
        {
            debug!(url = %url, "Request blocked by content rules");
            ResourceVerdict::Block
        } else {
            ResourceVerdict::Load
        }
    }
}
