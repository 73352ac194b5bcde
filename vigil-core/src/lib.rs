pub mod authority;
pub mod config;
pub mod context;
pub mod error;
pub mod exchange;
pub mod expression;
pub mod layers;
pub mod logout;
pub mod method;
pub mod prelude;
pub mod session;

use std::future::Future;
use std::pin::Pin;

pub use authority::{Authentication, Credentials, GrantedAuthorityDefaults};
pub use config::{AccessRuleSetting, ConfigError, ConfigValue, SecuritySettings, VigilConfig};
pub use context::{
    SecurityContext, SecurityContextHolder, SecurityContextRepository,
    SessionSecurityContextRepository, SECURITY_CONTEXT_KEY,
};
pub use error::{error_response, HttpError, SecurityError};
pub use exchange::Exchange;
pub use expression::{authorize, AccessExpression, Decision, ExpressionError};
pub use layers::init_tracing;
pub use logout::{
    DelegatingLogoutHandler, LogoutHandler, SecurityContextLogoutHandler,
    SessionInvalidatingLogoutHandler,
};
pub use method::MethodGuard;
pub use session::{InMemorySessionStore, SessionId, SessionStore};

/// Boxed future returned by the object-safe store and handler traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
