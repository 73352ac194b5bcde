//! Session-bound CSRF tokens.
//!
//! A [`CsrfTokenRepository`] persists one [`CsrfToken`] per session.
//! [`CsrfProtection`] issues tokens and verifies them on state-changing
//! requests, and [`CsrfLogoutHandler`] discards the token when the
//! principal logs out.

pub mod error;
pub mod logout;
pub mod protection;
pub mod repository;
pub mod token;

pub use error::CsrfError;
pub use logout::CsrfLogoutHandler;
pub use protection::CsrfProtection;
pub use repository::{CsrfTokenRepository, SessionCsrfTokenRepository, CSRF_TOKEN_KEY};
pub use token::CsrfToken;
