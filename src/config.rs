use chrono_tz::Tz;
use serde::Deserialize;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub timezone: Option<String>,
    pub max_body_bytes: Option<usize>,
    pub max_upload_bytes: Option<usize>,
    pub session_ttl_hours: Option<i64>,
    pub bcrypt_cost: Option<u32>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub cors_origin: Option<String>,
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timezone: Some("UTC".to_string()),
            max_body_bytes: None,
            max_upload_bytes: None,
            session_ttl_hours: None,
            bcrypt_cost: None,
            admin_username: None,
            admin_password: None,
            cors_origin: None,
            cookie_secure: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let mut config: Config = cfg.try_deserialize()?;

        if config.timezone.is_none() {
            config.timezone = Some("UTC".to_string());
        }

        config.validate()?;

        Ok(config)
    }

    /// Timezone used when rendering dates for humans.
    pub fn get_timezone(&self) -> Result<Tz, chrono_tz::ParseError> {
        let tz_str = self.timezone.as_deref().unwrap_or("UTC");
        tz_str.parse::<Tz>()
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !self
            .host
            .chars()
            .all(|c| c.is_alphanumeric() || ".:-_".contains(c))
        {
            return Err(config::ConfigError::Message(
                "Invalid host format".to_string(),
            ));
        }

        if self.port < 1024 {
            return Err(config::ConfigError::Message(
                "Port must be 1024 or higher".to_string(),
            ));
        }

        if let Some(tz_str) = &self.timezone {
            if tz_str.parse::<Tz>().is_err() {
                return Err(config::ConfigError::Message(format!(
                    "Invalid timezone: {}",
                    tz_str
                )));
            }
        }

        // 1MB..500MB
        if let Some(limit) = self.max_body_bytes {
            let (min, max) = (MIB, 500 * MIB);
            if limit < min || limit > max {
                return Err(config::ConfigError::Message(format!(
                    "max_body_bytes must be between {} and {} bytes",
                    min, max
                )));
            }
        }

        if let Some(limit) = self.max_upload_bytes {
            if limit == 0 || limit > self.effective_max_body_bytes().max(50 * MIB) {
                return Err(config::ConfigError::Message(
                    "max_upload_bytes must be positive and at most 50MB or max_body_bytes"
                        .to_string(),
                ));
            }
        }

        if let Some(hours) = self.session_ttl_hours {
            if hours <= 0 {
                return Err(config::ConfigError::Message(
                    "session_ttl_hours must be positive".to_string(),
                ));
            }
        }

        if let Some(cost) = self.bcrypt_cost {
            if !(4..=31).contains(&cost) {
                return Err(config::ConfigError::Message(
                    "bcrypt_cost must be between 4 and 31".to_string(),
                ));
            }
        }

        if self.admin_username.is_some() != self.admin_password.is_some() {
            return Err(config::ConfigError::Message(
                "admin_username and admin_password must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

impl Config {
    pub fn effective_max_body_bytes(&self) -> usize {
        self.max_body_bytes.unwrap_or(10 * MIB)
    }

    pub fn effective_max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(5 * MIB)
    }

    pub fn effective_session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours.unwrap_or(24 * 30))
    }

    pub fn effective_bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.unwrap_or(bcrypt::DEFAULT_COST)
    }

    /// Configured admin credentials, if the admin view is enabled.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user.as_str(), pass.as_str()))
            }
            _ => None,
        }
    }
}

/// Pool settings read from the `DATABASE_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default)]
    pub sql_log: bool,
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    8
}

fn default_idle_timeout_secs() -> u64 {
    600
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let settings: DatabaseSettings = config::Config::builder()
            .add_source(config::Environment::with_prefix("DATABASE").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults for everything but the URL.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_timeout_secs(),
            acquire_timeout_secs: default_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sql_log: false,
        }
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(config::ConfigError::Message(
                "DATABASE_URL must be a postgres:// URL".to_string(),
            ));
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(config::ConfigError::Message(format!(
                "Invalid pool size {}..{}",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_privileged_port() {
        let config = Config {
            port: 80,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_timezone() {
        let config = Config {
            timezone: Some("Mars/Olympus".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn admin_credentials_must_come_in_pairs() {
        let config = Config {
            admin_username: Some("admin".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            admin_username: Some("admin".to_string()),
            admin_password: Some("secret".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.admin_credentials(), Some(("admin", "secret")));
    }

    #[test]
    fn bcrypt_cost_bounds() {
        let config = Config {
            bcrypt_cost: Some(3),
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(Config::default().effective_bcrypt_cost(), bcrypt::DEFAULT_COST);
    }

    #[test]
    fn database_settings_defaults() {
        let settings = DatabaseSettings::for_url("postgres://localhost/inkpress");
        assert_eq!(settings.max_connections, 20);
        assert_eq!(settings.min_connections, 2);
        assert!(!settings.sql_log);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn database_settings_reject_bad_values() {
        assert!(DatabaseSettings::for_url("mysql://localhost/inkpress").validate().is_err());

        let settings = DatabaseSettings {
            min_connections: 30,
            ..DatabaseSettings::for_url("postgres://localhost/inkpress")
        };
        assert!(settings.validate().is_err());
    }
}
