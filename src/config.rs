//! Credentials and cleaning lookup tables
//!
//! Database credentials live in a YAML file, one per database:
//! ```yaml
//! RDS_HOST: localhost
//! RDS_PORT: 5432
//! RDS_USER: postgres
//! RDS_PASSWORD: secret
//! RDS_DATABASE: sales_data
//! ```
//!
//! The country and dialing code tables used by the user cleaner have
//! built-in defaults and can be replaced from a mappings file:
//! ```yaml
//! country_codes:
//!   United Kingdom: GB
//!   Germany: DE
//!   United States: US
//! dialing_codes:
//!   GB: "44"
//!   US: "1"
//!   DE: "49"
//! ```

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Connection settings for a PostgreSQL-compatible database
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseCredentials {
    #[serde(rename = "RDS_HOST", alias = "host")]
    pub host: String,
    #[serde(rename = "RDS_PORT", alias = "port", default = "default_port")]
    pub port: u16,
    #[serde(rename = "RDS_USER", alias = "user")]
    pub user: String,
    #[serde(rename = "RDS_PASSWORD", alias = "password")]
    pub password: String,
    #[serde(rename = "RDS_DATABASE", alias = "database")]
    pub database: String,
}

fn default_port() -> u16 {
    5432
}

impl DatabaseCredentials {
    /// Read credentials from a YAML file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Reading database credentials from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", path.display()))
    }

    /// Driver configuration for `tokio-postgres`
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.database);
        config
    }
}

// Never print the password
impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgresql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// Country name to ISO country code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CountryCodes(BTreeMap<String, String>);

impl CountryCodes {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Expected code for a country, `None` when the country is not mapped
    pub fn code_for(&self, country: &str) -> Option<&str> {
        self.0.get(country).map(String::as_str)
    }
}

impl Default for CountryCodes {
    fn default() -> Self {
        Self::new(
            [
                ("United Kingdom", "GB"),
                ("Germany", "DE"),
                ("United States", "US"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }
}

/// Country code to international dialing code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DialingCodes(BTreeMap<String, String>);

impl DialingCodes {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn code_for(&self, country_code: &str) -> Option<&str> {
        self.0.get(country_code).map(String::as_str)
    }
}

impl Default for DialingCodes {
    fn default() -> Self {
        Self::new(
            [("GB", "44"), ("US", "1"), ("DE", "49")].map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }
}

/// Lookup tables consumed by the user cleaner
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CleaningConfig {
    #[serde(default)]
    pub country_codes: CountryCodes,
    #[serde(default)]
    pub dialing_codes: DialingCodes,
}

impl CleaningConfig {
    /// Read lookup tables from a YAML mappings file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mappings file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse mappings file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_credentials() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "RDS_HOST: db.example.com\nRDS_PASSWORD: hunter2\nRDS_USER: etl\nRDS_DATABASE: sales\nRDS_PORT: 6543"
        )
        .unwrap();

        let creds = DatabaseCredentials::read(file.path()).unwrap();
        assert_eq!(creds.host, "db.example.com");
        assert_eq!(creds.port, 6543);
        assert_eq!(creds.to_string(), "postgresql://etl@db.example.com:6543/sales");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_credentials_default_port() {
        let creds: DatabaseCredentials = serde_yaml::from_str(
            "host: localhost\nuser: postgres\npassword: pw\ndatabase: local",
        )
        .unwrap();
        assert_eq!(creds.port, 5432);
    }

    #[test]
    fn test_missing_credentials_file() {
        let result = DatabaseCredentials::read("does/not/exist.yaml");
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    #[test]
    fn test_default_mappings() {
        let config = CleaningConfig::default();
        assert_eq!(config.country_codes.code_for("Germany"), Some("DE"));
        assert_eq!(config.country_codes.code_for("Spain"), None);
        assert_eq!(config.dialing_codes.code_for("US"), Some("1"));
    }

    #[test]
    fn test_read_mappings_extends_tables() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "country_codes:\n  France: FR\ndialing_codes:\n  FR: \"33\""
        )
        .unwrap();

        let config = CleaningConfig::read(file.path()).unwrap();
        assert_eq!(config.country_codes.code_for("France"), Some("FR"));
        assert_eq!(config.dialing_codes.code_for("FR"), Some("33"));
        assert_eq!(config.dialing_codes.code_for("GB"), None);
    }
}
