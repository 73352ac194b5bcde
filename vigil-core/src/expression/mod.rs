//! Access expressions.
//!
//! Authorization requirements are a small tagged tree evaluated by
//! [`AccessExpression::evaluate`]. The string DSL (`hasRole('USER')`,
//! `hasAnyAuthority('a', 'b') and not isAnonymous()`, ...) is only parsed
//! while the security configuration is assembled; requests never touch the
//! parser.

mod eval;
mod parser;

use std::fmt;
use std::str::FromStr;

pub use eval::{authorize, Decision};
pub use parser::ExpressionError;

/// An authorization requirement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessExpression {
    /// Always allow (`permitAll`).
    PermitAll,
    /// Always deny (`denyAll`).
    DenyAll,
    /// The principal is not anonymous (`isAuthenticated()`).
    Authenticated,
    /// The principal is anonymous (`isAnonymous()`).
    Anonymous,
    /// `hasRole('X')`: the principal holds `prefix + X`.
    Role(String),
    /// `hasAnyRole('X', 'Y')`.
    AnyRole(Vec<String>),
    /// `hasAuthority('X')`: the principal holds `X` verbatim.
    Authority(String),
    /// `hasAnyAuthority('X', 'Y')`.
    AnyAuthority(Vec<String>),
    /// Every sub-expression must allow.
    All(Vec<AccessExpression>),
    /// At least one sub-expression must allow.
    Any(Vec<AccessExpression>),
    /// Negation.
    Not(Box<AccessExpression>),
}

impl AccessExpression {
    /// Parse the string DSL into an expression tree.
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        parser::parse(input)
    }

    pub fn has_role(role: impl Into<String>) -> Self {
        AccessExpression::Role(role.into())
    }

    pub fn has_any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccessExpression::AnyRole(roles.into_iter().map(Into::into).collect())
    }

    pub fn has_authority(authority: impl Into<String>) -> Self {
        AccessExpression::Authority(authority.into())
    }

    pub fn has_any_authority<I, S>(authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccessExpression::AnyAuthority(authorities.into_iter().map(Into::into).collect())
    }

    /// Conjunction. Nested conjunctions are flattened.
    pub fn and(self, other: AccessExpression) -> Self {
        match self {
            AccessExpression::All(mut items) => {
                items.push(other);
                AccessExpression::All(items)
            }
            first => AccessExpression::All(vec![first, other]),
        }
    }

    /// Disjunction. Nested disjunctions are flattened.
    pub fn or(self, other: AccessExpression) -> Self {
        match self {
            AccessExpression::Any(mut items) => {
                items.push(other);
                AccessExpression::Any(items)
            }
            first => AccessExpression::Any(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        AccessExpression::Not(Box::new(self))
    }

    fn is_composite(&self) -> bool {
        matches!(
            self,
            AccessExpression::All(items) | AccessExpression::Any(items) if items.len() > 1
        )
    }
}

impl FromStr for AccessExpression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessExpression::parse(s)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, name: &str, args: &[String]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "'{arg}'")?;
    }
    f.write_str(")")
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    items: &[AccessExpression],
    separator: &str,
    parenthesize: impl Fn(&AccessExpression) -> bool,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        if parenthesize(item) {
            write!(f, "({item})")?;
        } else {
            write!(f, "{item}")?;
        }
    }
    Ok(())
}

/// Renders the canonical DSL form, which parses back to the same tree.
impl fmt::Display for AccessExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessExpression::PermitAll => f.write_str("permitAll"),
            AccessExpression::DenyAll => f.write_str("denyAll"),
            AccessExpression::Authenticated => f.write_str("isAuthenticated()"),
            AccessExpression::Anonymous => f.write_str("isAnonymous()"),
            AccessExpression::Role(role) => write!(f, "hasRole('{role}')"),
            AccessExpression::AnyRole(roles) => write_args(f, "hasAnyRole", roles),
            AccessExpression::Authority(authority) => write!(f, "hasAuthority('{authority}')"),
            AccessExpression::AnyAuthority(authorities) => {
                write_args(f, "hasAnyAuthority", authorities)
            }
            AccessExpression::All(items) if items.is_empty() => f.write_str("permitAll"),
            AccessExpression::Any(items) if items.is_empty() => f.write_str("denyAll"),
            AccessExpression::All(items) => write_joined(f, items, " and ", |item| {
                matches!(item, AccessExpression::Any(inner) if inner.len() > 1)
            }),
            AccessExpression::Any(items) => write_joined(f, items, " or ", |_| false),
            AccessExpression::Not(inner) if inner.is_composite() => write!(f, "!({inner})"),
            AccessExpression::Not(inner) => write!(f, "!{inner}"),
        }
    }
}
