use crate::authority::GrantedAuthorityDefaults;
use crate::expression::AccessExpression;

use super::value::{ConfigValue, FromConfigValue};
use super::{ConfigError, VigilConfig};

/// One entry of `security.rules`.
///
/// ```yaml
/// security:
///   rules:
///     - pattern: /admin/**
///       method: POST
///       access: hasRole('ADMIN')
/// ```
#[derive(Clone, Debug)]
pub struct AccessRuleSetting {
    pub pattern: String,
    pub method: Option<String>,
    pub access: AccessExpression,
}

fn parse_expression(raw: &str, key: &str) -> Result<AccessExpression, ConfigError> {
    AccessExpression::parse(raw).map_err(|source| ConfigError::InvalidExpression {
        key: key.to_string(),
        source,
    })
}

impl FromConfigValue for AccessRuleSetting {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        let required = |field: &str| -> Result<String, ConfigError> {
            let field_key = format!("{key}.{field}");
            let raw = value
                .field(field)
                .ok_or_else(|| ConfigError::NotFound(field_key.clone()))?;
            String::from_config_value(raw, &field_key)
        };

        let pattern = required("pattern")?;
        let access = parse_expression(&required("access")?, &format!("{key}.access"))?;
        let method = match value.field("method") {
            Some(raw) => Option::<String>::from_config_value(raw, &format!("{key}.method"))?,
            None => None,
        };

        Ok(AccessRuleSetting {
            pattern,
            method,
            access,
        })
    }
}

/// Typed view of the `security.*` configuration section.
///
/// Only `security.role.prefix` is required; an empty string disables
/// prefixing. Unset optional values fall back to the defaults of the
/// component that consumes them.
#[derive(Clone, Debug)]
pub struct SecuritySettings {
    /// `security.role.prefix`
    pub role_prefix: String,
    /// `security.session.cookie`
    pub session_cookie: Option<String>,
    /// `security.session.timeout` (seconds)
    pub session_timeout_secs: Option<u64>,
    /// `security.session.secure` (default `false`)
    pub session_secure: bool,
    /// `security.csrf.enabled` (default `true`)
    pub csrf_enabled: bool,
    /// `security.csrf.header`
    pub csrf_header: Option<String>,
    /// `security.csrf.parameter`
    pub csrf_parameter: Option<String>,
    /// `security.logout.path`
    pub logout_path: Option<String>,
    /// `security.rules`, evaluated in order
    pub rules: Vec<AccessRuleSetting>,
    /// `security.access.default`, applied to requests no rule matches
    pub default_access: Option<AccessExpression>,
}

impl SecuritySettings {
    pub fn from_config(config: &VigilConfig) -> Result<Self, ConfigError> {
        let role_prefix: String = config.get("security.role.prefix")?;

        let default_access = match config.get_or::<Option<String>>("security.access.default", None)? {
            Some(raw) => Some(parse_expression(&raw, "security.access.default")?),
            None => None,
        };

        Ok(SecuritySettings {
            role_prefix,
            session_cookie: config.get_or("security.session.cookie", None)?,
            session_timeout_secs: config.get_or("security.session.timeout", None)?,
            session_secure: config.get_or("security.session.secure", false)?,
            csrf_enabled: config.get_or("security.csrf.enabled", true)?,
            csrf_header: config.get_or("security.csrf.header", None)?,
            csrf_parameter: config.get_or("security.csrf.parameter", None)?,
            logout_path: config.get_or("security.logout.path", None)?,
            rules: config.get_or("security.rules", Vec::new())?,
            default_access,
        })
    }

    pub fn authority_defaults(&self) -> GrantedAuthorityDefaults {
        GrantedAuthorityDefaults::new(self.role_prefix.clone())
    }
}
