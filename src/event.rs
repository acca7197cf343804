//! Snapshot of a prospective navigation, as handed over by the renderer.
//!
//! A [`NavigationEvent`] is created once per navigation attempt and only
//! borrowed by the policy chain while it is being evaluated.

use std::fmt;

use url::Url;

/// HTTP method of the request backing a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Other(String),
}

impl HttpMethod {
    /// Parses a method name, case-insensitively.
    pub fn parse(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET") {
            Self::Get
        } else if method.eq_ignore_ascii_case("POST") {
            Self::Post
        } else {
            Self::Other(method.to_ascii_uppercase())
        }
    }

    /// `true` for methods that may carry credentials in the request body.
    pub fn submits_credentials(&self) -> bool {
        matches!(self, Self::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
            Self::Other(method) => f.write_str(method),
        }
    }
}

/// What triggered the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationType {
    LinkActivated,
    FormSubmitted,
    FormResubmitted,
    BackForward,
    Reload,
    #[default]
    Other,
}

/// Frame the navigation will load into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFrame {
    #[default]
    MainFrame,
    SubFrame,
    /// No existing frame: `target="_blank"` or `window.open()`.
    NewWindow,
}

/// Modifier keys held when the navigation was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub command: bool,
    pub shift: bool,
}

impl KeyModifiers {
    pub const NONE: Self = Self {
        command: false,
        shift: false,
    };

    pub const COMMAND: Self = Self {
        command: true,
        shift: false,
    };

    pub const COMMAND_SHIFT: Self = Self {
        command: true,
        shift: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.command && !self.shift
    }
}

/// Immutable description of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    url: Url,
    method: HttpMethod,
    navigation_type: NavigationType,
    target_frame: TargetFrame,
    modifiers: KeyModifiers,
    headers: Vec<(String, String)>,
}

impl NavigationEvent {
    /// A plain main-frame `GET` with no modifiers.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: HttpMethod::default(),
            navigation_type: NavigationType::default(),
            target_frame: TargetFrame::default(),
            modifiers: KeyModifiers::NONE,
            headers: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_navigation_type(mut self, navigation_type: NavigationType) -> Self {
        self.navigation_type = navigation_type;
        self
    }

    pub fn with_target_frame(mut self, target_frame: TargetFrame) -> Self {
        self.target_frame = target_frame;
        self
    }

    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Adds a request header. Names keep their case; lookups ignore it.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn navigation_type(&self) -> NavigationType {
        self.navigation_type
    }

    pub fn target_frame(&self) -> TargetFrame {
        self.target_frame
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_main_frame(&self) -> bool {
        self.target_frame == TargetFrame::MainFrame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::parse("Get"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("put"), HttpMethod::Other("PUT".into()));
    }

    #[test]
    fn test_only_post_submits_credentials() {
        assert!(HttpMethod::Post.submits_credentials());
        assert!(!HttpMethod::Get.submits_credentials());
        assert!(!HttpMethod::parse("PUT").submits_credentials());
    }

    #[test]
    fn test_event_defaults() {
        let event = NavigationEvent::new(Url::parse("https://example.com").unwrap());
        assert_eq!(event.method(), &HttpMethod::Get);
        assert_eq!(event.navigation_type(), NavigationType::Other);
        assert!(event.is_main_frame());
        assert!(event.modifiers().is_empty());
    }

    #[test]
    fn test_builder_sets_fields() {
        let event = NavigationEvent::new(Url::parse("https://example.com/a").unwrap())
            .with_method(HttpMethod::Post)
            .with_navigation_type(NavigationType::FormSubmitted)
            .with_target_frame(TargetFrame::SubFrame)
            .with_modifiers(KeyModifiers::COMMAND_SHIFT);
        assert_eq!(event.method(), &HttpMethod::Post);
        assert_eq!(event.navigation_type(), NavigationType::FormSubmitted);
        assert!(!event.is_main_frame());
        assert!(event.modifiers().command && event.modifiers().shift);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let event = NavigationEvent::new(Url::parse("https://example.com").unwrap())
            .with_header("Sec-GPC", "1");
        assert_eq!(event.header("sec-gpc"), Some("1"));
        assert_eq!(event.header("DNT"), None);
        assert_eq!(event.headers().len(), 1);
    }
}
