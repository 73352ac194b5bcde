use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Global role-prefix configuration used when evaluating role-based
/// expressions such as `hasRole('USER')`.
///
/// There is no `Default` implementation: the prefix must be
/// chosen explicitly. Pass an empty string to compare bare role names, or
/// [`GrantedAuthorityDefaults::CONVENTIONAL_PREFIX`] for `ROLE_`-prefixed
/// authorities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantedAuthorityDefaults {
    role_prefix: String,
}

impl GrantedAuthorityDefaults {
    /// The prefix most identity providers put in front of role names.
    pub const CONVENTIONAL_PREFIX: &'static str = "ROLE_";

    pub fn new(role_prefix: impl Into<String>) -> Self {
        Self {
            role_prefix: role_prefix.into(),
        }
    }

    /// The configured prefix (possibly empty).
    pub fn role_prefix(&self) -> &str {
        &self.role_prefix
    }

    /// The authority string a role name is compared against: `prefix + role`.
    pub fn role_authority(&self, role: &str) -> String {
        let mut authority = String::with_capacity(self.role_prefix.len() + role.len());
        authority.push_str(&self.role_prefix);
        authority.push_str(role);
        authority
    }

    /// Whether `authority` equals `prefix + role`, without allocating.
    pub fn matches_role(&self, authority: &str, role: &str) -> bool {
        authority.len() == self.role_prefix.len() + role.len()
            && authority.starts_with(self.role_prefix.as_str())
            && authority.ends_with(role)
    }
}

/// Opaque credentials attached to an [`Authentication`].
///
/// The value never appears in `Debug` output and is not serialized into
/// the session.
#[derive(Clone, Default)]
pub struct Credentials(Option<String>);

impl Credentials {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Some(secret.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    /// Access the raw secret.
    pub fn expose(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credentials([redacted])"),
            None => f.write_str("Credentials(None)"),
        }
    }
}

/// The principal attached to a request: a name, opaque credentials and the
/// granted-authority strings it holds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Authentication {
    name: String,
    #[serde(skip)]
    credentials: Credentials,
    authorities: BTreeSet<String>,
    authenticated: bool,
}

impl Authentication {
    /// Name given to the principal of anonymous requests.
    pub const ANONYMOUS_NAME: &'static str = "anonymousUser";

    /// Create an authenticated principal.
    ///
    /// ```ignore
    /// let user = Authentication::new("user", Credentials::new("password"), ["USER"]);
    /// ```
    pub fn new<I, S>(name: impl Into<String>, credentials: Credentials, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            credentials,
            authorities: authorities.into_iter().map(Into::into).collect(),
            authenticated: true,
        }
    }

    /// The principal used when no authentication is bound to the session.
    pub fn anonymous() -> Self {
        Self {
            name: Self::ANONYMOUS_NAME.to_string(),
            credentials: Credentials::none(),
            authorities: BTreeSet::new(),
            authenticated: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_anonymous(&self) -> bool {
        !self.authenticated
    }

    /// Exact authority membership (no prefix applied).
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    /// Role membership with the configured prefix applied.
    pub fn has_role(&self, role: &str, defaults: &GrantedAuthorityDefaults) -> bool {
        self.authorities
            .iter()
            .any(|authority| defaults.matches_role(authority, role))
    }

    /// Drop the credentials once authentication has completed.
    pub fn erase_credentials(&mut self) {
        self.credentials = Credentials::none();
    }
}
