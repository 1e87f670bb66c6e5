use std::{env, path::PathBuf};

/// Deployment environment, read from `APP_ENV`.
///
/// Anything other than `production` is treated as a local environment so the
/// reCAPTCHA gate can be bypassed while developing without a secret key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Environment {
    Production,
    Local,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Local,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Process-wide application configuration resolved once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub media_root: PathBuf,
    pub recaptcha_secret_key: Option<String>,
    pub recaptcha_site_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = env::var("APP_ENV")
            .map(|value| Environment::parse(&value))
            .unwrap_or(Environment::Local);

        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storage/media"));

        let recaptcha_secret_key = env::var("RECAPTCHA_SECRET_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let recaptcha_site_key = env::var("RECAPTCHA_SITE_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            environment,
            media_root,
            recaptcha_secret_key,
            recaptcha_site_key,
        }
    }

    /// Comment submissions must pass bot verification when a secret is
    /// configured or when running in production.
    pub fn recaptcha_required(&self) -> bool {
        self.environment.is_production() || self.recaptcha_secret_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            environment: Environment::Local,
            media_root: PathBuf::from("storage/media"),
            recaptcha_secret_key: None,
            recaptcha_site_key: None,
        }
    }

    #[test]
    fn environment_parses_production_aliases() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse(" production "), Environment::Production);
    }

    #[test]
    fn environment_defaults_to_local() {
        assert_eq!(Environment::parse("local"), Environment::Local);
        assert_eq!(Environment::parse("staging"), Environment::Local);
        assert_eq!(Environment::parse(""), Environment::Local);
    }

    #[test]
    fn recaptcha_required_when_secret_present() {
        let config = AppConfig {
            recaptcha_secret_key: Some("secret".to_string()),
            ..base_config()
        };
        assert!(config.recaptcha_required());
    }

    #[test]
    fn recaptcha_skipped_locally_without_secret() {
        assert!(!base_config().recaptcha_required());
    }

    #[test]
    fn recaptcha_required_in_production() {
        let config = AppConfig {
            environment: Environment::Production,
            ..base_config()
        };
        assert!(config.recaptcha_required());
    }
}
