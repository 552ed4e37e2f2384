use crate::domain::{
    Identity, LedgerSettings, OperatingState, DEFAULT_STRATEGY_TIMELOCK_SECS,
};
use crate::engine::DEFAULT_PAGE_SIZE_LIMIT;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub admin: Identity,
    pub authorized_agent: Option<Identity>,
    pub minimum_deposit: u128,
    pub page_size_limit: usize,
    pub start_paused: bool,
    pub strategy_timelock_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let admin = env_map
            .get("ADMIN_ID")
            .ok_or_else(|| ConfigError::MissingEnv("ADMIN_ID".to_string()))
            .and_then(|s| parse_identity("ADMIN_ID", s))?;

        let authorized_agent = match env_map.get("AUTHORIZED_AGENT") {
            Some(s) if !s.trim().is_empty() => Some(parse_identity("AUTHORIZED_AGENT", s)?),
            _ => None,
        };

        let minimum_deposit = env_map
            .get("MINIMUM_DEPOSIT_AMOUNT")
            .map(|s| s.as_str())
            .unwrap_or("1")
            .parse::<u128>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "MINIMUM_DEPOSIT_AMOUNT".to_string(),
                    "must be a non-negative integer".to_string(),
                )
            })?;

        let page_size_limit = match env_map.get("PAGE_SIZE_LIMIT") {
            None => DEFAULT_PAGE_SIZE_LIMIT,
            Some(s) => match s.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "PAGE_SIZE_LIMIT".to_string(),
                        format!("must be a positive integer, got {}", s),
                    ))
                }
            },
        };

        let start_paused = match env_map
            .get("START_PAUSED")
            .map(|s| s.as_str())
            .unwrap_or("false")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "START_PAUSED".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let strategy_timelock_secs = match env_map.get("STRATEGY_TIMELOCK_SECS") {
            None => DEFAULT_STRATEGY_TIMELOCK_SECS,
            Some(s) => s.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "STRATEGY_TIMELOCK_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?,
        };

        Ok(Config {
            port,
            database_path,
            admin,
            authorized_agent,
            minimum_deposit,
            page_size_limit,
            start_paused,
            strategy_timelock_secs,
        })
    }

    /// Settings written to the genesis entry of a fresh journal.
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            admin: self.admin.clone(),
            authorized_agent: self.authorized_agent.clone(),
            minimum_deposit: self.minimum_deposit,
            state: OperatingState::from_paused(self.start_paused),
            strategy_timelock_secs: self.strategy_timelock_secs,
        }
    }
}

fn parse_identity(key: &str, value: &str) -> Result<Identity, ConfigError> {
    Identity::from_str(value)
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert("ADMIN_ID".to_string(), "admin".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin, Identity::new("admin"));
        assert_eq!(config.authorized_agent, None);
        assert_eq!(config.minimum_deposit, 1);
        assert_eq!(config.page_size_limit, 100);
        assert!(!config.start_paused);
        assert_eq!(config.strategy_timelock_secs, 172_800);

        let settings = config.ledger_settings();
        assert_eq!(settings, LedgerSettings::new(Identity::new("admin")));
    }

    #[test]
    fn test_overrides_flow_into_settings() {
        let mut env_map = setup_required_env();
        env_map.insert("AUTHORIZED_AGENT".to_string(), "agent-1".to_string());
        env_map.insert("MINIMUM_DEPOSIT_AMOUNT".to_string(), "1000".to_string());
        env_map.insert("START_PAUSED".to_string(), "true".to_string());
        env_map.insert("STRATEGY_TIMELOCK_SECS".to_string(), "60".to_string());

        let settings = Config::from_env_map(env_map).unwrap().ledger_settings();
        assert_eq!(settings.authorized_agent, Some(Identity::new("agent-1")));
        assert_eq!(settings.minimum_deposit, 1000);
        assert_eq!(settings.state, OperatingState::Paused);
        assert_eq!(settings.strategy_timelock_secs, 60);
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_admin() {
        let mut env_map = setup_required_env();
        env_map.remove("ADMIN_ID");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "ADMIN_ID"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("PAGE_SIZE_LIMIT".to_string(), "0".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PAGE_SIZE_LIMIT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_start_paused() {
        let mut env_map = setup_required_env();
        env_map.insert("START_PAUSED".to_string(), "maybe".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "START_PAUSED"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_blank_admin_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("ADMIN_ID".to_string(), "   ".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "ADMIN_ID"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
