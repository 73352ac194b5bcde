pub mod builder;
pub mod chain;
pub mod cookie;
pub mod extract;
pub mod matcher;

pub use builder::HttpSecurity;
pub use chain::{AccessRule, SecurityFilterChain};
pub use extract::RequestSecurity;
pub use matcher::RequestMatcher;
