use std::future::Future;

use crate::authority::{Authentication, GrantedAuthorityDefaults};
use crate::context::SecurityContextHolder;
use crate::error::SecurityError;
use crate::expression::{AccessExpression, ExpressionError};

/// Method-level authorization.
///
/// Wraps a service call and checks the principal of the current
/// [`SecurityContextHolder`] scope before running it.
///
/// ```ignore
/// let guard = MethodGuard::pre_authorize("hasRole('USER')", defaults.clone())?;
/// let message = guard.around(|| service.get_message()).await?;
///
/// // JSR-250 style: any of the listed roles
/// let guard = MethodGuard::roles_allowed(["USER"], defaults);
/// guard.check()?;
/// ```
#[derive(Clone, Debug)]
pub struct MethodGuard {
    expression: AccessExpression,
    defaults: GrantedAuthorityDefaults,
}

impl MethodGuard {
    pub fn new(expression: AccessExpression, defaults: GrantedAuthorityDefaults) -> Self {
        Self {
            expression,
            defaults,
        }
    }

    /// Build a guard from a DSL expression. Parse errors surface here, at
    /// wiring time.
    pub fn pre_authorize(
        expression: &str,
        defaults: GrantedAuthorityDefaults,
    ) -> Result<Self, ExpressionError> {
        Ok(Self::new(AccessExpression::parse(expression)?, defaults))
    }

    /// Allow principals holding any of `roles` (role prefix applied).
    pub fn roles_allowed<I, S>(roles: I, defaults: GrantedAuthorityDefaults) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AccessExpression::has_any_role(roles), defaults)
    }

    pub fn expression(&self) -> &AccessExpression {
        &self.expression
    }

    /// Check the principal of the current scope.
    pub fn check(&self) -> Result<(), SecurityError> {
        let authentication = SecurityContextHolder::authentication();
        self.check_authentication(authentication.as_ref())
    }

    /// Check an explicit principal.
    pub fn check_authentication(
        &self,
        authentication: Option<&Authentication>,
    ) -> Result<(), SecurityError> {
        let decision = self.expression.evaluate(authentication, &self.defaults);
        if !decision.is_allowed() {
            tracing::debug!(
                principal = authentication.map(|a| a.name()).unwrap_or(Authentication::ANONYMOUS_NAME),
                expression = %self.expression,
                "Method invocation denied"
            );
        }
        decision.into_result()
    }

    /// Run `next` only if the current principal is allowed.
    pub async fn around<F, Fut, R>(&self, next: F) -> Result<R, SecurityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        self.check()?;
        Ok(next().await)
    }
}
