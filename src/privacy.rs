//! Network filtering backed by Brave's `adblock` engine.
//!
//! Filter lists in Adblock Plus format (EasyList, EasyPrivacy, ...) are
//! compiled into [`ContentRuleList`]s and attached to a
//! [`RendererRuleLists`], the renderer-side [`RuleListBackend`] that
//! answers per-request blocking queries.
//!
//! ## Usage
//!
//! 1. Drop `.txt` filter files into `resources/filters/` (or point
//!    `content_blocking.filters_dir` at a directory)
//! 2. [`load_filter_lists`] compiles them at startup; the file named by
//!    `content_blocking.attribution_list` becomes the attributed list
//! 3. An empty or missing directory disables filtering
//!
//! ## Recommended lists
//!
//! - EasyList : <https://easylist.to/easylist/easylist.txt>
//! - EasyPrivacy : <https://easylist.to/easylist/easyprivacy.txt>

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use adblock::Engine;
use adblock::lists::{FilterSet, ParseOptions};
use tracing::{debug, info, warn};

use crate::config::ContentBlockingConfig;
use crate::content_rules::{ContentRuleList, MutationToken, RuleListBackend, RuleListKind};
use crate::error::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Compilation
// ─────────────────────────────────────────────────────────────────────────────

/// Compiles ABP filter text into a rule list.
///
/// The identifier is `name` plus a fingerprint of the text, so recompiling
/// an unchanged list yields the same identifier and the controller keeps
/// it attached.
pub fn compile_rule_list(name: &str, filter_text: &str) -> ContentRuleList {
    let mut filter_set = FilterSet::new(false);
    filter_set.add_filter_list(filter_text, ParseOptions::default());
    let engine = Engine::from_filter_set(filter_set, true);

    let mut hasher = DefaultHasher::new();
    filter_text.hash(&mut hasher);
    let identifier = format!("{name}-{:016x}", hasher.finish());
    debug!(identifier = %identifier, "Rule list compiled");
    ContentRuleList::new(&identifier, engine)
}

/// Compiled lists found in a filters directory.
#[derive(Debug, Default)]
pub struct FilterLists {
    pub regular: Vec<ContentRuleList>,
    pub attributed: Option<ContentRuleList>,
}

impl FilterLists {
    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.attributed.is_none()
    }
}

/// Reads and compiles every `.txt` list in `dir`.
///
/// Files are taken in name order. The file called `attribution_list`
/// becomes the attributed list; everything else is regular. Unreadable
/// files are skipped with a warning.
pub fn load_filter_lists(dir: &Path, attribution_list: &str) -> Result<FilterLists, Error> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    let mut lists = FilterLists::default();
    for path in &paths {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read filter list");
                continue;
            }
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let list = compile_rule_list(&name, &content);
        info!(
            path = %path.display(),
            lines = content.lines().count(),
            "Filter list loaded"
        );

        if path.file_name().is_some_and(|n| n == attribution_list) {
            lists.attributed = Some(list);
        } else {
            lists.regular.push(list);
        }
    }

    if lists.is_empty() {
        warn!(dir = %dir.display(), "Filters directory is empty, content blocking disabled");
    }
    Ok(lists)
}

/// Locates the filters directory.
///
/// An explicit `filters_dir` wins; otherwise `resources/filters/` is
/// searched under `SURIBROWS_RESOURCES_PATH`, next to the executable (and
/// at the project root when running from `target/`), then in the current
/// directory.
pub fn find_filters_dir(config: &ContentBlockingConfig) -> Option<PathBuf> {
    if !config.filters_dir.is_empty() {
        let path = PathBuf::from(&config.filters_dir);
        if path.is_dir() {
            return Some(path);
        }
        warn!(path = %path.display(), "Configured filters_dir is not a directory");
    }

    if let Ok(path) = std::env::var("SURIBROWS_RESOURCES_PATH") {
        let path = PathBuf::from(path).join("filters");
        if path.is_dir() {
            return Some(path);
        }
    }

    if let Ok(exe_path) = std::env::current_exe()
        && let Ok(canonical) = exe_path.canonicalize()
        && let Some(exe_dir) = canonical.parent()
    {
        let path = exe_dir.join("resources").join("filters");
        if path.is_dir() {
            return Some(path);
        }

        // target/{debug,release}/ → project root
        if let Some(target_dir) = exe_dir.parent()
            && target_dir.file_name().is_some_and(|n| n == "target")
            && let Some(project_root) = target_dir.parent()
        {
            let path = project_root.join("resources").join("filters");
            if path.is_dir() {
                return Some(path);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join("resources").join("filters");
        if path.is_dir() {
            return Some(path);
        }
    }

    warn!("resources/filters/ not found, content blocking disabled");
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer-side attachment
// ─────────────────────────────────────────────────────────────────────────────

/// Rule lists attached to the renderer, queried per request.
///
/// Only a [`crate::content_rules::ContentRuleListController`] can attach or
/// detach lists. Results are cached per (url, source, type) and the cache
/// is dropped on every attachment change.
#[derive(Default)]
pub struct RendererRuleLists {
    regular: Vec<ContentRuleList>,
    attributed: Option<ContentRuleList>,
    cache: RefCell<HashMap<(String, String, String), bool>>,
}

impl RendererRuleLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any regular list blocks the request.
    ///
    /// - `url` : requested resource
    /// - `source_url` : page that initiated the request
    /// - `request_type` : "document", "script", "image", "stylesheet", "other"
    pub fn should_block(&self, url: &str, source_url: &str, request_type: &str) -> bool {
        if self.regular.is_empty() {
            return false;
        }

        let key = (url.to_owned(), source_url.to_owned(), request_type.to_owned());
        if let Some(&cached) = self.cache.borrow().get(&key) {
            return cached;
        }

        let blocked = self
            .regular
            .iter()
            .any(|list| list_matches(list, url, source_url, request_type));
        self.cache.borrow_mut().insert(key, blocked);
        blocked
    }

    /// Whether the attributed list classifies the request. Not cached.
    pub fn attribution_matches(&self, url: &str, source_url: &str, request_type: &str) -> bool {
        self.attributed
            .as_ref()
            .is_some_and(|list| list_matches(list, url, source_url, request_type))
    }

    /// Drops cached results. Call on navigation to bound growth.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

fn list_matches(list: &ContentRuleList, url: &str, source_url: &str, request_type: &str) -> bool {
    match adblock::request::Request::new(url, source_url, request_type)
        .or_else(|_| adblock::request::Request::new(url, "", "other"))
    {
        Ok(request) => list.engine().check_network_request(&request).matched,
        // data:, blob: and friends are never blocked.
        Err(_) => false,
    }
}

impl RuleListBackend for RendererRuleLists {
    fn add_content_rule_list(
        &mut self,
        kind: RuleListKind,
        list: &ContentRuleList,
        _token: &MutationToken,
    ) {
        match kind {
            RuleListKind::Regular => {
                debug_assert!(!self.regular.contains(list), "rule list attached twice");
                self.regular.push(list.clone());
            }
            RuleListKind::Attributed => {
                debug_assert!(self.attributed.is_none(), "attributed slot already taken");
                self.attributed = Some(list.clone());
            }
        }
        self.clear_cache();
    }

    fn remove_content_rule_list(
        &mut self,
        kind: RuleListKind,
        identifier: &str,
        _token: &MutationToken,
    ) {
        match kind {
            RuleListKind::Regular => self.regular.retain(|l| l.identifier() != identifier),
            RuleListKind::Attributed => {
                if self
                    .attributed
                    .as_ref()
                    .is_some_and(|l| l.identifier() == identifier)
                {
                    self.attributed = None;
                }
            }
        }
        self.clear_cache();
    }

    fn attached_identifiers(&self, kind: RuleListKind) -> Vec<String> {
        match kind {
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
        }
    }
}
