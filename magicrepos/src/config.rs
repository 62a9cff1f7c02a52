/// The config oracle: supplies `user.name` / `user.email`. INI-style config
/// file parsing is out of scope for this crate; callers own that layer and
/// hand the engine an implementation of this trait.
pub trait ConfigProvider {
    fn user_name(&self) -> Option<String>;
    fn user_email(&self) -> Option<String>;
}

pub const DEFAULT_USER_NAME: &str = "Unknown";
pub const DEFAULT_USER_EMAIL: &str = "unknown@unknown";

/// A provider that always falls through to the engine's defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConfig;

impl ConfigProvider for NullConfig {
    fn user_name(&self) -> Option<String> {
        None
    }

    fn user_email(&self) -> Option<String> {
        None
    }
}

/// A provider backed by fixed values, handy for tests and for embedding a
/// config already parsed by a caller.
#[derive(Debug, Clone, Default)]
pub struct FixedConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ConfigProvider for FixedConfig {
    fn user_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn user_email(&self) -> Option<String> {
        self.email.clone()
    }
}

/// Reads `MAGICREPOS_AUTHOR_NAME`/`MAGICREPOS_AUTHOR_EMAIL` from the process
/// environment. Convenient for driving the remote-shell binary and tests
/// without a config file, without pulling in the INI parser that is this
/// crate's external config-file collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigProvider for EnvConfig {
    fn user_name(&self) -> Option<String> {
        std::env::var("MAGICREPOS_AUTHOR_NAME").ok()
    }

    fn user_email(&self) -> Option<String> {
        std::env::var("MAGICREPOS_AUTHOR_EMAIL").ok()
    }
}

pub fn resolve_name(config: &dyn ConfigProvider) -> String {
    config.user_name().unwrap_or_else(|| DEFAULT_USER_NAME.to_owned())
}

pub fn resolve_email(config: &dyn ConfigProvider) -> String {
    config.user_email().unwrap_or_else(|| DEFAULT_USER_EMAIL.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_config_falls_back_to_defaults() {
        assert_eq!(resolve_name(&NullConfig), DEFAULT_USER_NAME);
        assert_eq!(resolve_email(&NullConfig), DEFAULT_USER_EMAIL);
    }

    #[test]
    fn fixed_config_overrides_defaults() {
        let cfg = FixedConfig { name: Some("Ada".into()), email: None };
        assert_eq!(resolve_name(&cfg), "Ada");
        assert_eq!(resolve_email(&cfg), DEFAULT_USER_EMAIL);
    }
}
