//! Admin-only page gate.
//!
//! The identity provider is an external collaborator: it resolves the current
//! session (or none) and exposes the decoded token claims. Access is granted
//! iff the group claim lists [`ADMIN_GROUP`].

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use snafu::Snafu;

pub const ADMIN_GROUP: &str = "admin";
/// Claim carrying the user's group memberships.
pub const GROUPS_CLAIM: &str = "cognito:groups";

pub const WELCOME_TEXT: &str = "Welcome, admin! You have access to this page.";
pub const DENIED_TEXT: &str = "Access denied. You must be an admin to view this page.";

/// Authenticated session as seen through its token claims.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthSession {
    claims: Map<String, Value>,
}

impl AuthSession {
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let groups = groups
            .into_iter()
            .map(|group| Value::String(group.into()))
            .collect();
        let mut claims = Map::new();
        claims.insert(GROUPS_CLAIM.to_string(), Value::Array(groups));
        Self { claims }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Groups listed in the token. A missing or non-array claim means no groups.
    pub fn groups(&self) -> Vec<&str> {
        match self.claims.get(GROUPS_CLAIM) {
            Some(Value::Array(groups)) => groups.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.groups().contains(&ADMIN_GROUP)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AccessError {
    #[snafu(display("failed to resolve auth session on `{stage}`: {details}"))]
    ResolveSession {
        stage: &'static str,
        details: String,
    },
}

pub trait SessionResolver: Send + Sync {
    fn current_session(&self) -> BoxFuture<'_, Result<Option<AuthSession>, AccessError>>;
}

/// What the gated page renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPage {
    Welcome,
    Denied,
}

impl AdminPage {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Welcome => WELCOME_TEXT,
            Self::Denied => DENIED_TEXT,
        }
    }
}

pub fn decide_access(session: Option<&AuthSession>) -> AdminPage {
    match session {
        Some(session) if session.is_admin() => AdminPage::Welcome,
        Some(_) | None => AdminPage::Denied,
    }
}

/// Resolves the session and decides the page. Resolver failures read as "no session".
pub async fn render_admin_page(resolver: &dyn SessionResolver) -> AdminPage {
    let session = match resolver.current_session().await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!("auth session lookup failed, denying access: {error}");
            None
        }
    };

    let page = decide_access(session.as_ref());
    tracing::debug!(?page, "rendered admin page");
    page
}
