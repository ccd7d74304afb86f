//! Recovery-link routing.
//!
//! An emailed recovery or invite link lands on the portal carrying its
//! parameters in either the URL query string or the fragment, depending on
//! how the identity provider built the redirect. [`route`] inspects both,
//! classifies the requesting device, and decides where the page should send
//! the user: into the companion app via a custom-scheme deep link, to the
//! in-page set-password form, or to the login page.
//!
//! The whole module is a pure function of (url, user-agent, config); the
//! embedding page performs the navigation and owns the timers.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use url::Url;
use url::form_urlencoded;

/// How long the mobile handoff waits for the app to take over before the
/// page falls back to the in-page form. Heuristic: there is no positive
/// signal that the app opened, only elapsed time.
pub const APP_HANDOFF_FALLBACK: Duration = Duration::from_millis(2500);

/// Parameter names the provider may use for the recovery token, in lookup
/// order.
const TOKEN_KEYS: [&str; 3] = ["access_token", "token_hash", "token"];

/// Fallback text when an error arrives without a description.
const DEFAULT_ERROR_DESCRIPTION: &str = "This link is invalid or has expired";

/// Deep-link scheme and web routes for the routing decision.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Custom URI scheme of the companion mobile app.
    pub app_scheme: String,
    /// Web route rendering the password-set form.
    pub set_password_route: String,
    /// Web login route.
    pub login_route: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            app_scheme: "portal".into(),
            set_password_route: "/set-password".into(),
            login_route: "/login".into(),
        }
    }
}

/// Which flow the link belongs to. Links without a `type` parameter are
/// treated as recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowType {
    #[default]
    Recovery,
    Invite,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Recovery => "recovery",
            FlowType::Invite => "invite",
        }
    }

    fn parse(s: Option<&str>) -> Self {
        match s {
            Some("invite") => FlowType::Invite,
            _ => FlowType::Recovery,
        }
    }
}

/// Parameters extracted from an inbound recovery link. Ephemeral; never
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct RecoveryParams {
    pub token: Option<String>,
    pub email: Option<String>,
    pub flow: FlowType,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
}

impl RecoveryParams {
    /// Extract parameters from the full URL, fragment taking precedence over
    /// the query string per key. When the email is absent but the token is a
    /// structured credential, the email claim is pulled from its payload
    /// best-effort.
    pub fn from_url(url: &Url) -> Self {
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let fragment: HashMap<String, String> = url
            .fragment()
            .map(|f| form_urlencoded::parse(f.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let param = |key: &str| -> Option<String> {
            fragment
                .get(key)
                .or_else(|| query.get(key))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let token = TOKEN_KEYS.iter().find_map(|key| param(key));
        let email = param("email").or_else(|| token.as_deref().and_then(email_claim));

        Self {
            token,
            email,
            flow: FlowType::parse(param("type").as_deref()),
            error: param("error"),
            error_code: param("error_code"),
            error_description: param("error_description"),
        }
    }

    /// Whether the link arrived in an error state.
    pub fn has_error(&self) -> bool {
        self.error.is_some() || self.error_code.is_some()
    }

    /// Human-readable error text with `+`-encoded spaces restored.
    pub fn error_message(&self) -> String {
        self.error_description
            .as_deref()
            .map(|d| d.replace('+', " "))
            .unwrap_or_else(|| DEFAULT_ERROR_DESCRIPTION.to_string())
    }
}

/// Best-effort email claim from a structured credential: base64url-decode
/// the middle segment and read its `email` field. No verification — the
/// token is only being peeked at for display routing, never trusted.
fn email_claim(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("email")?.as_str().map(str::to_string)
}

/// Classify the requesting device from its user-agent string.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ["android", "iphone", "ipad", "ipod", "mobile"]
        .iter()
        .any(|needle| ua.contains(needle))
}

/// Where the recovery page should send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Open the app deep link now; if the app has not taken over after
    /// [`APP_HANDOFF_FALLBACK`], render the web form at `web_fallback`.
    AppHandoff {
        deep_link: String,
        web_fallback: String,
    },
    /// Hand the error off to the app.
    AppError { deep_link: String },
    /// Open the app's login screen.
    AppLogin { deep_link: String },
    /// Render the in-page password-set form.
    WebSetPassword { location: String },
    /// Go to the web login page (optionally carrying an error message).
    WebLogin { location: String },
}

/// Decide the action for an inbound recovery link. Pure: identical inputs
/// always select the same branch.
pub fn route(url: &Url, user_agent: &str, config: &RecoveryConfig) -> RecoveryAction {
    let params = RecoveryParams::from_url(url);
    let mobile = is_mobile_user_agent(user_agent);
    decide(&params, mobile, config)
}

/// The decision table over already-extracted parameters.
pub fn decide(params: &RecoveryParams, mobile: bool, config: &RecoveryConfig) -> RecoveryAction {
    if params.has_error() {
        if mobile {
            return RecoveryAction::AppError {
                deep_link: error_deep_link(params, config),
            };
        }
        let message = params.error_message();
        let query = encode_pairs(&[("error", message.as_str())]);
        return RecoveryAction::WebLogin {
            location: format!("{}?{}", config.login_route, query),
        };
    }

    match &params.token {
        Some(token) => {
            let query = token_query(token, params);
            let web = format!("{}?{}", config.set_password_route, query);
            if mobile {
                RecoveryAction::AppHandoff {
                    deep_link: format!("{}://set-password?{}", config.app_scheme, query),
                    web_fallback: web,
                }
            } else {
                RecoveryAction::WebSetPassword { location: web }
            }
        }
        None => {
            if mobile {
                RecoveryAction::AppLogin {
                    deep_link: format!("{}://login", config.app_scheme),
                }
            } else {
                RecoveryAction::WebLogin {
                    location: config.login_route.clone(),
                }
            }
        }
    }
}

fn token_query(token: &str, params: &RecoveryParams) -> String {
    let mut pairs: Vec<(&str, &str)> = vec![("token", token), ("type", params.flow.as_str())];
    if let Some(email) = &params.email {
        pairs.push(("email", email.as_str()));
    }
    encode_pairs(&pairs)
}

fn error_deep_link(params: &RecoveryParams, config: &RecoveryConfig) -> String {
    let message = params.error_message();
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    if let Some(error) = &params.error {
        pairs.push(("error", error.as_str()));
    }
    if let Some(code) = &params.error_code {
        pairs.push(("error_code", code.as_str()));
    }
    pairs.push(("error_description", message.as_str()));
    if let Some(email) = &params.email {
        pairs.push(("email", email.as_str()));
    }
    format!(
        "{}://set-password?{}",
        config.app_scheme,
        encode_pairs(&pairs)
    )
}

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP_UA: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Safari/537.36";
    const MOBILE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";

    fn config() -> RecoveryConfig {
        RecoveryConfig::default()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }

    #[test]
    fn desktop_with_token_routes_to_web_form() {
        // Scenario: recovery link opened in a desktop browser.
        let action = route(
            &url("https://portal.example.com/auth/reset-password?token=abc123&type=recovery"),
            DESKTOP_UA,
            &config(),
        );
        assert_eq!(
            action,
            RecoveryAction::WebSetPassword {
                location: "/set-password?token=abc123&type=recovery".into()
            }
        );
    }

    #[test]
    fn mobile_with_token_hands_off_with_web_fallback() {
        let action = route(
            &url("https://portal.example.com/auth/reset-password?token=abc123&type=invite"),
            MOBILE_UA,
            &config(),
        );
        match action {
            RecoveryAction::AppHandoff {
                deep_link,
                web_fallback,
            } => {
                assert_eq!(deep_link, "portal://set-password?token=abc123&type=invite");
                assert_eq!(web_fallback, "/set-password?token=abc123&type=invite");
            }
            other => panic!("expected AppHandoff, got {other:?}"),
        }
    }

    #[test]
    fn no_token_routes_to_login() {
        let action = route(
            &url("https://portal.example.com/auth/reset-password"),
            DESKTOP_UA,
            &config(),
        );
        assert_eq!(
            action,
            RecoveryAction::WebLogin {
                location: "/login".into()
            }
        );

        let action = route(
            &url("https://portal.example.com/auth/reset-password"),
            MOBILE_UA,
            &config(),
        );
        assert_eq!(
            action,
            RecoveryAction::AppLogin {
                deep_link: "portal://login".into()
            }
        );
    }

    #[test]
    fn error_on_desktop_carries_decoded_message_to_login() {
        let action = route(
            &url(
                "https://portal.example.com/auth/reset-password?error=access_denied\
                 &error_code=otp_expired&error_description=Email+link+is+expired",
            ),
            DESKTOP_UA,
            &config(),
        );
        assert_eq!(
            action,
            RecoveryAction::WebLogin {
                location: "/login?error=Email+link+is+expired".into()
            }
        );
    }

    #[test]
    fn error_on_mobile_deep_links_with_error_params() {
        let action = route(
            &url("https://portal.example.com/auth/reset-password?error=access_denied&error_code=otp_expired"),
            MOBILE_UA,
            &config(),
        );
        match action {
            RecoveryAction::AppError { deep_link } => {
                assert!(deep_link.starts_with("portal://set-password?"));
                assert!(deep_link.contains("error=access_denied"));
                assert!(deep_link.contains("error_code=otp_expired"));
                // Missing description falls back to the default text.
                assert!(deep_link.contains("error_description=This+link+is+invalid"));
            }
            other => panic!("expected AppError, got {other:?}"),
        }
    }

    #[test]
    fn fragment_wins_over_query() {
        let params = RecoveryParams::from_url(&url(
            "https://portal.example.com/auth/reset-password?token=from-query&type=recovery\
             #token=from-fragment&type=invite",
        ));
        assert_eq!(params.token.as_deref(), Some("from-fragment"));
        assert_eq!(params.flow, FlowType::Invite);
    }

    #[test]
    fn token_aliases_are_checked_in_order() {
        let params = RecoveryParams::from_url(&url(
            "https://portal.example.com/r?token=plain&access_token=jwt-ish",
        ));
        assert_eq!(params.token.as_deref(), Some("jwt-ish"));

        let params =
            RecoveryParams::from_url(&url("https://portal.example.com/r?token_hash=hashed"));
        assert_eq!(params.token.as_deref(), Some("hashed"));
    }

    #[test]
    fn email_claim_is_pulled_from_structured_token() {
        // header.payload.signature with {"email":"claimed@example.com"}
        let payload = URL_SAFE_NO_PAD.encode(r#"{"email":"claimed@example.com"}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig");
        let params =
            RecoveryParams::from_url(&url(&format!("https://portal.example.com/r?token={token}")));
        assert_eq!(params.email.as_deref(), Some("claimed@example.com"));
    }

    #[test]
    fn opaque_token_yields_no_email() {
        let params = RecoveryParams::from_url(&url("https://portal.example.com/r?token=abc123"));
        assert_eq!(params.email, None);
    }

    #[test]
    fn explicit_email_beats_token_claim() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"email":"claimed@example.com"}"#);
        let token = format!("h.{payload}.s");
        let params = RecoveryParams::from_url(&url(&format!(
            "https://portal.example.com/r?token={token}&email=explicit@example.com"
        )));
        assert_eq!(params.email.as_deref(), Some("explicit@example.com"));
    }

    #[test]
    fn missing_type_defaults_to_recovery() {
        let params = RecoveryParams::from_url(&url("https://portal.example.com/r?token=abc"));
        assert_eq!(params.flow, FlowType::Recovery);
    }

    #[test]
    fn classification_is_deterministic() {
        let link = url("https://portal.example.com/auth/reset-password?token=abc123");
        let first = route(&link, MOBILE_UA, &config());
        let second = route(&link, MOBILE_UA, &config());
        assert_eq!(first, second);
    }

    #[test]
    fn user_agent_classification() {
        assert!(is_mobile_user_agent(MOBILE_UA));
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36"
        ));
        assert!(!is_mobile_user_agent(DESKTOP_UA));
    }
}
