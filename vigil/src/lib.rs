//! Vigil: declarative request authorization and session-bound CSRF
//! protection for Axum.
//!
//! This facade crate re-exports the Vigil sub-crates through a single
//! dependency with feature flags:
//!
//! ```ignore
//! use vigil::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature | Default | Crate        |
//! |---------|---------|--------------|
//! | `csrf`  | **yes** | `vigil-csrf` |
//! | `web`   | **yes** | `vigil-web`  |

pub use vigil_core::*;

#[cfg(feature = "csrf")]
pub use vigil_csrf;

#[cfg(feature = "web")]
pub use vigil_web;

/// Unified prelude. Import everything with `use vigil::prelude::*`.
pub mod prelude {
    pub use vigil_core::prelude::*;

    #[cfg(feature = "csrf")]
    pub use vigil_csrf::{CsrfLogoutHandler, CsrfToken, CsrfTokenRepository, SessionCsrfTokenRepository};

    #[cfg(feature = "web")]
    pub use vigil_web::{HttpSecurity, RequestMatcher, RequestSecurity, SecurityFilterChain};
}
