//! Vigil prelude: the types needed to wire and query the security layer.
//!
//! ```ignore
//! use vigil_core::prelude::*;
//! ```

pub use crate::authority::{Authentication, Credentials, GrantedAuthorityDefaults};
pub use crate::config::{SecuritySettings, VigilConfig};
pub use crate::context::{SecurityContext, SecurityContextHolder, SecurityContextRepository};
pub use crate::error::{HttpError, SecurityError};
pub use crate::exchange::Exchange;
pub use crate::expression::{authorize, AccessExpression, Decision};
pub use crate::logout::LogoutHandler;
pub use crate::method::MethodGuard;
pub use crate::session::{SessionId, SessionStore};
