//! # SuriBrows: Navigation core
//!
//! Décisions de navigation et filtrage de contenu, indépendants du moteur
//! de rendu. Tout tourne sur le thread UI : aucun type n'est `Send`.
//!
//! ## Architecture des modules
//!
//! - [`event`] : Description d'une navigation candidate (URL, méthode HTTP,
//!   type, frame cible, modificateurs clavier).
//!
//! - [`policy`] : Trait [`policy::NavigationActionPolicy`] et chaîne
//!   [`policy::PolicyBucket`] : le premier refus gagne, une chaîne vide autorise.
//!   Les refus peuvent porter un [`policy::SideEffect`].
//!
//! - [`policies`] : Politiques concrètes : bookmarklets, nouvel onglet
//!   (cmd-clic), schémas externes, `target="_blank"`, en-tête GPC et
//!   passage en HTTPS.
//!
//! - [`fireproofing`] : Détection de connexion (capture des cookies avant un
//!   POST), invite « fireproof ce site ? » et store des domaines autorisés.
//!
//! - [`content_rules`] : [`content_rules::ContentRuleListController`], seul
//!   propriétaire des listes de règles attachées au renderer (swap atomique).
//!
//! - [`privacy`] : Compilation des listes Adblock Plus via le crate `adblock`
//!   (Brave) et backend renderer qui répond aux requêtes réseau.
//!
//! - [`delegate`] : Pont entre les callbacks du renderer et le reste.
//!
//! - [`config`] : Configuration TOML.

pub mod config;
pub mod content_rules;
pub mod delegate;
pub mod error;
pub mod event;
pub mod fireproofing;
pub mod policies;
pub mod policy;
pub mod privacy;

pub use error::Error;
