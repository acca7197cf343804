//! Point d'entrée de démonstration : simule une navigation dans un onglet.
//!
//! Usage :
//!   suribrows-nav [URL] [--link] [--post] [--cmd] [--shift] [--new-window] [--fail] [--landed=URL]
//!
//! Exemples :
//!   cargo run -- "javascript:alert(1)" --link        → bookmarklet exécuté
//!   cargo run -- example.com --link --cmd --shift    → onglet en arrière-plan
//!   cargo run -- https://site.com/login --post --landed=https://site.com/home
//!                                                     → invite fireproofing
//!
//! `RUST_LOG=debug` pour voir le détail de la chaîne de politiques.

use std::cell::RefCell;
use std::env;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use suribrows_navigation::Error;
use suribrows_navigation::config::Config;
use suribrows_navigation::content_rules::ContentBlockingUpdater;
use suribrows_navigation::delegate::{NavigationDelegate, ResourceVerdict};
use suribrows_navigation::event::{
    HttpMethod, KeyModifiers, NavigationEvent, NavigationType, TargetFrame,
};
use suribrows_navigation::fireproofing::{
    AllowedDomains, Cookie, CookieStore, FaviconRefresher, FireproofOutcome, FireproofPrompt,
    FireproofingCoordinator,
};
use suribrows_navigation::policies::{SmarterEncryptionUpgradePolicy, standard_bucket};
use suribrows_navigation::policy::{LoadRequest, NavigationHost, TabDisposition};
use suribrows_navigation::privacy::{find_filters_dir, load_filter_lists};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── 1. Logging / Tracing ───────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ── 2. Configuration ───────────────────────────────────────────────
    let config = Config::load();
    let store_path = config.fireproof_store_path();
    let allowed = Rc::new(RefCell::new(AllowedDomains::load(&store_path)?));

    // ── 3. Fireproofing + chaîne de politiques ─────────────────────────
    let coordinator = FireproofingCoordinator::new(
        Rc::new(MemoryCookies::default()),
        allowed.clone(),
        Rc::new(StdinPrompt),
        Rc::new(LogFavicons),
        config.fireproofing.detect_cookie_changes,
    );
    let https_upgrade =
        SmarterEncryptionUpgradePolicy::from_config(&config.navigation, &config.content_blocking);
    let bucket = standard_bucket(
        &config.navigation,
        https_upgrade,
        Some(coordinator.login_detection_policy()),
    );
    let mut delegate =
        NavigationDelegate::new(bucket, Rc::new(LogHost)).with_fireproofing(coordinator);

    // ── 4. Listes de règles ────────────────────────────────────────────
    let mut updater = ContentBlockingUpdater::new(&config.content_blocking);
    if let Some(dir) = find_filters_dir(&config.content_blocking) {
        match load_filter_lists(&dir, &config.content_blocking.attribution_list) {
            Ok(lists) => {
                updater.update_rules(lists.regular, lists.attributed, delegate.rule_lists_mut())
            }
            Err(e) => warn!(error = %e, "Filter lists unavailable"),
        }
    }

    // ── 5. Navigation simulée ──────────────────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    let event = event_from_args(&args, &config.general.default_url)?;
    info!(url = %event.url(), method = %event.method(), "Simulating navigation");

    delegate
        .decide_policy_for(&event, |policy| println!("decision: {policy:?}"))
        .await;

    if delegate.load_web_resource(event.url(), true) == ResourceVerdict::Block {
        println!("document blocked by content rules");
    }

    if args.iter().any(|a| a == "--fail") {
        delegate.did_fail_navigation();
    }

    if let Some(landed) = flag_value(&args, "--landed") {
        let landed = parse_url(landed)?;
        match delegate.did_finish_navigation(Some(&landed)).await {
            FireproofOutcome::Fireproofed(domain) => {
                let path = &store_path;
                allowed.borrow().save(path)?;
                println!("fireproofed: {domain} ({})", path.display());
            }
            outcome => println!("finished: {outcome:?}"),
        }
    }

    Ok(())
}

/// Construit l'événement depuis les arguments CLI.
/// Le premier argument sans `--` est l'URL ; sans schéma, `https://` est ajouté.
fn event_from_args(args: &[String], default_url: &str) -> Result<NavigationEvent, Error> {
    let has = |flag: &str| args.iter().any(|a| a == flag);
    let input = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or(default_url);

    let modifiers = KeyModifiers {
        command: has("--cmd"),
        shift: has("--shift"),
    };
    let method = if has("--post") {
        HttpMethod::Post
    } else {
        HttpMethod::Get
    };
    let navigation_type = if has("--post") {
        NavigationType::FormSubmitted
    } else if has("--link") {
        NavigationType::LinkActivated
    } else {
        NavigationType::Other
    };
    let target_frame = if has("--new-window") {
        TargetFrame::NewWindow
    } else {
        TargetFrame::MainFrame
    };

    Ok(NavigationEvent::new(parse_url(input)?)
        .with_method(method)
        .with_navigation_type(navigation_type)
        .with_target_frame(target_frame)
        .with_modifiers(modifiers))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .find_map(|a| a.strip_prefix(flag)?.strip_prefix('='))
}

fn parse_url(input: &str) -> Result<Url, Error> {
    // Essaie de parser directement (fonctionne si l'utilisateur a mis le schéma)
    if let Ok(url) = Url::parse(input) {
        return Ok(url);
    }
    Url::parse(&format!("https://{input}")).map_err(|source| Error::InvalidUrl {
        input: input.to_string(),
        source,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborateurs de démonstration
// ─────────────────────────────────────────────────────────────────────────────

struct LogHost;

impl NavigationHost for LogHost {
    fn evaluate_script(&self, script: &str) {
        println!("evaluate script: {script}");
    }

    fn open_tab(&self, url: &Url, disposition: TabDisposition) {
        println!("open tab ({disposition:?}): {url}");
    }

    fn open_externally(&self, url: &Url) {
        println!("open externally: {url}");
    }

    fn load(&self, request: &LoadRequest) {
        println!("reload in place: {} {:?}", request.url, request.headers);
    }
}

#[derive(Default)]
struct MemoryCookies {
    cookies: RefCell<Vec<Cookie>>,
}

#[async_trait(?Send)]
impl CookieStore for MemoryCookies {
    async fn all_cookies(&self) -> Vec<Cookie> {
        self.cookies.borrow().clone()
    }
}

struct StdinPrompt;

#[async_trait(?Send)]
impl FireproofPrompt for StdinPrompt {
    async fn ask_to_fireproof(&self, domain: &str) -> bool {
        print!("Fireproof {domain}? Cookies for this site will survive clearing data. [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        // stdin is blocking; keep it off the runtime thread.
        let answer = tokio::task::spawn_blocking(|| {
            let mut answer = String::new();
            io::stdin().lock().read_line(&mut answer).map(|_| answer)
        })
        .await;
        match answer {
            Ok(Ok(answer)) => matches!(answer.trim(), "y" | "Y" | "yes"),
            Ok(Err(e)) => {
                warn!(error = %e, "Cannot read answer, not fireproofing");
                false
            }
            Err(e) => {
                warn!(error = %e, "Prompt task failed, not fireproofing");
                false
            }
        }
    }
}

struct LogFavicons;

impl FaviconRefresher for LogFavicons {
    fn refresh_favicon(&self, domain: &str) {
        info!(domain, "Favicon refresh requested");
    }
}
