//! Content rule lists attached to the renderer.
//!
//! [`ContentRuleListController`] is the single owner of what the renderer
//! has attached: any number of *regular* lists (tracker and content
//! blocking) and at most one *attributed* list (ad-attribution
//! classification). It exposes exactly two mutations, each an atomic swap:
//!
//! - [`ContentRuleListController::replace_regular_lists`]
//! - [`ContentRuleListController::replace_attributed_list`]
//!
//! The renderer side is abstracted as a [`RuleListBackend`]. Its add/remove
//! methods require a [`MutationToken`], which only this module can create,
//! so no other component can attach or detach a list behind the
//! controller's back. The controller owns its backend and mutates through
//! `&mut self`, so callers are serialised by the borrow checker.
//!
//! [`ContentBlockingUpdater`] sits in front of the controller and turns
//! configuration changes (protection toggled, lists recompiled) into swaps.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use adblock::Engine;
use tracing::{debug, info};

use crate::config::ContentBlockingConfig;

// ─────────────────────────────────────────────────────────────────────────────
// ContentRuleList
// ─────────────────────────────────────────────────────────────────────────────

/// A compiled rule list. Cheap to clone; identity is the identifier.
#[derive(Clone)]
pub struct ContentRuleList {
    identifier: Rc<str>,
    engine: Rc<Engine>,
}

impl ContentRuleList {
    pub fn new(identifier: &str, engine: Engine) -> Self {
        Self {
            identifier: Rc::from(identifier),
            engine: Rc::new(engine),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl PartialEq for ContentRuleList {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for ContentRuleList {}

impl fmt::Debug for ContentRuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentRuleList")
            .field(&self.identifier)
            .finish()
    }
}

/// Which attachment channel a list lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleListKind {
    Regular,
    Attributed,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend seam
// ─────────────────────────────────────────────────────────────────────────────

/// Proof that a mutation comes from [`ContentRuleListController`].
///
/// Not constructible outside this module and not `Clone`.
pub struct MutationToken {
    _private: (),
}

impl MutationToken {
    fn new() -> Self {
        Self { _private: () }
    }
}

/// Renderer-side attachment of rule lists.
pub trait RuleListBackend {
    fn add_content_rule_list(
        &mut self,
        kind: RuleListKind,
        list: &ContentRuleList,
        token: &MutationToken,
    );

    fn remove_content_rule_list(
        &mut self,
        kind: RuleListKind,
        identifier: &str,
        token: &MutationToken,
    );

    /// Identifiers currently attached on `kind`, in any order.
    fn attached_identifiers(&self, kind: RuleListKind) -> Vec<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// ContentRuleListController
// ─────────────────────────────────────────────────────────────────────────────

pub struct ContentRuleListController<B: RuleListBackend> {
    backend: B,
    regular: Vec<ContentRuleList>,
    attributed: Option<ContentRuleList>,
}

impl<B: RuleListBackend> ContentRuleListController<B> {
    /// Takes ownership of a backend with nothing attached.
    pub fn new(backend: B) -> Self {
        debug_assert!(
            backend.attached_identifiers(RuleListKind::Regular).is_empty()
                && backend.attached_identifiers(RuleListKind::Attributed).is_empty(),
            "backend handed to the controller already has rule lists attached"
        );
        Self {
            backend,
            regular: Vec::new(),
            attributed: None,
        }
    }

    /// Lists the controller last attached, in the order given.
    pub fn regular_lists(&self) -> &[ContentRuleList] {
        &self.regular
    }

    pub fn attributed_list(&self) -> Option<&ContentRuleList> {
        self.attributed.as_ref()
    }

    /// Read-only view of the renderer attachment.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replaces every regular list with `new_lists`.
    ///
    /// Lists present in both the old and the new set stay attached; only
    /// the difference is detached/attached. Duplicate identifiers in
    /// `new_lists` keep their first occurrence.
    pub fn replace_regular_lists(&mut self, new_lists: Vec<ContentRuleList>) {
        let mut seen = HashSet::new();
        let new_lists: Vec<ContentRuleList> = new_lists
            .into_iter()
            .filter(|l| seen.insert(l.identifier.clone()))
            .collect();

        let token = MutationToken::new();
        let mut removed = 0;
        for old in &self.regular {
            if !new_lists.contains(old) {
                self.backend
                    .remove_content_rule_list(RuleListKind::Regular, old.identifier(), &token);
                removed += 1;
            }
        }
        let mut added = 0;
        for new in &new_lists {
            if !self.regular.contains(new) {
                self.backend
                    .add_content_rule_list(RuleListKind::Regular, new, &token);
                added += 1;
            }
        }

        self.regular = new_lists;
        self.check_in_sync(RuleListKind::Regular);
        info!(
            active = self.regular.len(),
            added, removed, "Regular content rule lists replaced"
        );
    }

    /// Replaces the attributed list; `None` detaches without replacement.
    pub fn replace_attributed_list(&mut self, new_list: Option<ContentRuleList>) {
        if self.attributed == new_list {
            debug!("Attributed rule list unchanged");
            return;
        }

        let token = MutationToken::new();
        if let Some(old) = &self.attributed {
            self.backend
                .remove_content_rule_list(RuleListKind::Attributed, old.identifier(), &token);
        }
        if let Some(new) = &new_list {
            self.backend
                .add_content_rule_list(RuleListKind::Attributed, new, &token);
        }

        self.attributed = new_list;
        self.check_in_sync(RuleListKind::Attributed);
        info!(
            attributed = ?self.attributed.as_ref().map(ContentRuleList::identifier),
            "Attributed content rule list replaced"
        );
    }

    fn check_in_sync(&self, kind: RuleListKind) {
        if cfg!(debug_assertions) {
            let mut attached = self.backend.attached_identifiers(kind);
            attached.sort();
            let mut expected: Vec<String> = match kind {
                RuleListKind::Regular => self
                    .regular
                    .iter()
                    .map(|l| l.identifier().to_string())
                    .collect(),
                RuleListKind::Attributed => self
                    .attributed
                    .iter()
                    .map(|l| l.identifier().to_string())
                    .collect(),
            };
            expected.sort();
            debug_assert_eq!(
                attached, expected,
                "renderer {kind:?} rule lists diverged from the controller"
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ContentBlockingUpdater
// ─────────────────────────────────────────────────────────────────────────────

/// Latest compiled lists plus the user's protection switches.
pub struct ContentBlockingUpdater {
    tracking_protection: bool,
    attribution: bool,
    regular: Vec<ContentRuleList>,
    attributed: Option<ContentRuleList>,
}

impl ContentBlockingUpdater {
    pub fn new(config: &ContentBlockingConfig) -> Self {
        Self {
            tracking_protection: config.tracking_protection,
            attribution: config.attribution,
            regular: Vec::new(),
            attributed: None,
        }
    }

    pub fn tracking_protection(&self) -> bool {
        self.tracking_protection
    }

    /// New compiled lists arrived from the rule source.
    pub fn update_rules<B: RuleListBackend>(
        &mut self,
        regular: Vec<ContentRuleList>,
        attributed: Option<ContentRuleList>,
        controller: &mut ContentRuleListController<B>,
    ) {
        self.regular = regular;
        self.attributed = attributed;
        self.apply(controller);
    }

    pub fn set_tracking_protection<B: RuleListBackend>(
        &mut self,
        enabled: bool,
        controller: &mut ContentRuleListController<B>,
    ) {
        info!(enabled, "Tracking protection toggled");
        self.tracking_protection = enabled;
        self.apply(controller);
    }

    pub fn set_attribution<B: RuleListBackend>(
        &mut self,
        enabled: bool,
        controller: &mut ContentRuleListController<B>,
    ) {
        info!(enabled, "Attribution rules toggled");
        self.attribution = enabled;
        self.apply(controller);
    }

    fn apply<B: RuleListBackend>(&self, controller: &mut ContentRuleListController<B>) {
        let regular = if self.tracking_protection {
            self.regular.clone()
        } else {
            Vec::new()
        };
        controller.replace_regular_lists(regular);

        let attributed = if self.attribution {
            self.attributed.clone()
        } else {
            None
        };
        controller.replace_attributed_list(attributed);
    }
}
