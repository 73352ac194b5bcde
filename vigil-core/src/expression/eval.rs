use std::collections::BTreeSet;

use super::AccessExpression;
use crate::authority::{Authentication, GrantedAuthorityDefaults};
use crate::error::SecurityError;

/// Outcome of evaluating an [`AccessExpression`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// Turn a deny into [`SecurityError::AccessDenied`].
    pub fn into_result(self) -> Result<(), SecurityError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(SecurityError::AccessDenied("Access is denied".into())),
        }
    }
}

static NO_AUTHORITIES: BTreeSet<String> = BTreeSet::new();

struct Subject<'a> {
    authorities: &'a BTreeSet<String>,
    authenticated: bool,
}

impl Subject<'_> {
    fn has_role(&self, role: &str, defaults: &GrantedAuthorityDefaults) -> bool {
        self.authorities
            .iter()
            .any(|authority| defaults.matches_role(authority, role))
    }
}

impl AccessExpression {
    /// Evaluate against the principal of a request. `None` is treated as an
    /// anonymous principal without authorities.
    pub fn evaluate(
        &self,
        authentication: Option<&Authentication>,
        defaults: &GrantedAuthorityDefaults,
    ) -> Decision {
        let subject = match authentication {
            Some(auth) => Subject {
                authorities: auth.authorities(),
                authenticated: auth.is_authenticated(),
            },
            None => Subject {
                authorities: &NO_AUTHORITIES,
                authenticated: false,
            },
        };
        Decision::from_bool(self.matches(&subject, defaults))
    }

    fn matches(&self, subject: &Subject<'_>, defaults: &GrantedAuthorityDefaults) -> bool {
        match self {
            AccessExpression::PermitAll => true,
            AccessExpression::DenyAll => false,
            AccessExpression::Authenticated => subject.authenticated,
            AccessExpression::Anonymous => !subject.authenticated,
            AccessExpression::Role(role) => subject.has_role(role, defaults),
            AccessExpression::AnyRole(roles) => {
                roles.iter().any(|role| subject.has_role(role, defaults))
            }
            AccessExpression::Authority(authority) => {
                subject.authorities.contains(authority.as_str())
            }
            AccessExpression::AnyAuthority(authorities) => authorities
                .iter()
                .any(|authority| subject.authorities.contains(authority.as_str())),
            AccessExpression::All(items) => items.iter().all(|item| item.matches(subject, defaults)),
            AccessExpression::Any(items) => items.iter().any(|item| item.matches(subject, defaults)),
            AccessExpression::Not(inner) => !inner.matches(subject, defaults),
        }
    }
}

/// Decide whether a bare set of granted authorities satisfies `expression`.
///
/// The holder of the set is considered authenticated. `hasRole('X')` allows
/// iff `prefix + X` is in `granted`.
pub fn authorize(
    granted: &BTreeSet<String>,
    expression: &AccessExpression,
    defaults: &GrantedAuthorityDefaults,
) -> Decision {
    let subject = Subject {
        authorities: granted,
        authenticated: true,
    };
    Decision::from_bool(expression.matches(&subject, defaults))
}
