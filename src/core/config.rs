/// Configuration file loading
///
/// The collector reads an INI-style file: one [INFLUXDB] section describing
/// the sink and one section per SVC appliance. Appliance section keys other
/// than the connection parameters become tags on every point collected from
/// that appliance.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::error::CollectError;
use crate::utils::constants::{DEFAULT_DATABASE, RESERVED_APPLIANCE_KEYS};

/// Connection parameters of the InfluxDB instance.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

/// Immutable descriptor of one SVC appliance.
///
/// `tags` always contains `svc = <section name>` plus every extra key of
/// the section.
#[derive(Debug, Clone)]
pub struct ApplianceConfig {
    pub name: String,
    pub address: String,
    pub login: String,
    pub password: String,
    pub tags: HashMap<String, String>,
}

/// Parsed configuration file, sections in file order.
#[derive(Debug)]
pub struct ConfigFile {
    sections: Vec<(String, HashMap<String, String>)>,
}

impl ConfigFile {
    /// Load and parse the configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CollectError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(CollectError::Config(format!(
                "The configuration file {} must be a regular file",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CollectError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self, CollectError> {
        let mut sections: Vec<(String, HashMap<String, String>)> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();

            // Skip blanks and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim();
                if name.is_empty() {
                    return Err(CollectError::Config(format!(
                        "The format of the configuration file is incorrect (empty section name, line {})",
                        index + 1
                    )));
                }
                sections.push((name.to_string(), HashMap::new()));
            } else if let Some((key, value)) = line.split_once('=') {
                let Some((_, values)) = sections.last_mut() else {
                    return Err(CollectError::Config(format!(
                        "The format of the configuration file is incorrect (key outside a section, line {})",
                        index + 1
                    )));
                };
                values.insert(key.trim().to_string(), value.trim().to_string());
            } else {
                return Err(CollectError::Config(format!(
                    "The format of the configuration file is incorrect (line {})",
                    index + 1
                )));
            }
        }

        Ok(Self { sections })
    }

    fn section(&self, name: &str) -> Option<&HashMap<String, String>> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, values)| values)
    }

    /// Sink connection parameters from the [INFLUXDB] section.
    ///
    /// Empty credentials mean anonymous access; an empty database name
    /// falls back to the default.
    pub fn influxdb(&self) -> Result<InfluxConfig, CollectError> {
        let section = self.section("INFLUXDB").ok_or_else(|| {
            CollectError::Config("The [INFLUXDB] section is missing".to_string())
        })?;

        let address = section
            .get("address")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CollectError::Config("The [INFLUXDB] section has no address".to_string())
            })?;

        let optional = |key: &str| section.get(key).filter(|v| !v.is_empty()).cloned();

        Ok(InfluxConfig {
            address: address.clone(),
            username: optional("username"),
            password: optional("password"),
            database: optional("database").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }

    /// One descriptor per appliance section, in file order.
    pub fn appliances(&self) -> Result<Vec<ApplianceConfig>, CollectError> {
        let mut appliances = Vec::new();

        for (name, values) in &self.sections {
            if name == "INFLUXDB" {
                continue;
            }

            let require = |key: &str| {
                values
                    .get(key)
                    .filter(|value| !value.is_empty())
                    .cloned()
                    .ok_or_else(|| {
                        CollectError::Config(format!("Section [{}] has no {}", name, key))
                    })
            };

            let mut tags = HashMap::new();
            tags.insert("svc".to_string(), name.clone());
            for (key, value) in values {
                if !RESERVED_APPLIANCE_KEYS.contains(&key.as_str()) {
                    tags.insert(key.clone(), value.clone());
                }
            }

            appliances.push(ApplianceConfig {
                name: name.clone(),
                address: require("address")?,
                login: require("login")?,
                password: require("password")?,
                tags,
            });
        }

        Ok(appliances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_full_configuration() {
        let file = write_config(
            "# sink\n\
             [INFLUXDB]\n\
             address = influx.example.com\n\
             username = admin\n\
             password = secret\n\
             database = capacity\n\
             \n\
             [SVC1]\n\
             address = 10.0.0.1\n\
             login = monitor\n\
             password = hunter2\n\
             site = dc1\n",
        );

        let config = ConfigFile::load(file.path()).unwrap();

        let influxdb = config.influxdb().unwrap();
        assert_eq!(influxdb.address, "influx.example.com");
        assert_eq!(influxdb.username.as_deref(), Some("admin"));
        assert_eq!(influxdb.password.as_deref(), Some("secret"));
        assert_eq!(influxdb.database, "capacity");

        let appliances = config.appliances().unwrap();
        assert_eq!(appliances.len(), 1);
        assert_eq!(appliances[0].name, "SVC1");
        assert_eq!(appliances[0].address, "10.0.0.1");
        assert_eq!(appliances[0].login, "monitor");
        assert_eq!(appliances[0].password, "hunter2");
        assert_eq!(appliances[0].tags["svc"], "SVC1");
        assert_eq!(appliances[0].tags["site"], "dc1");
        assert!(!appliances[0].tags.contains_key("address"));
        assert!(!appliances[0].tags.contains_key("password"));
    }

    #[test]
    fn test_database_defaults_when_empty() {
        let file = write_config("[INFLUXDB]\naddress = influx\nusername =\npassword =\ndatabase =\n");
        let influxdb = ConfigFile::load(file.path()).unwrap().influxdb().unwrap();

        assert_eq!(influxdb.database, DEFAULT_DATABASE);
        assert!(influxdb.username.is_none());
        assert!(influxdb.password.is_none());
    }

    #[test]
    fn test_appliances_keep_file_order() {
        let file = write_config(
            "[INFLUXDB]\naddress = influx\n\
             [B]\naddress = 1\nlogin = a\npassword = b\n\
             [A]\naddress = 2\nlogin = a\npassword = b\n",
        );
        let appliances = ConfigFile::load(file.path()).unwrap().appliances().unwrap();
        let names: Vec<&str> = appliances.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let error = ConfigFile::load("/nonexistent/svc2influxdb.conf").unwrap_err();
        assert!(matches!(error, CollectError::Config(_)));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let file = write_config("[INFLUXDB]\naddress influx\n");
        assert!(matches!(
            ConfigFile::load(file.path()),
            Err(CollectError::Config(_))
        ));
    }

    #[test]
    fn test_missing_appliance_key_is_an_error() {
        let file = write_config("[INFLUXDB]\naddress = influx\n[SVC1]\naddress = 10.0.0.1\nlogin = monitor\n");
        let error = ConfigFile::load(file.path()).unwrap().appliances().unwrap_err();
        assert!(error.to_string().contains("SVC1"));
        assert!(error.to_string().contains("password"));
    }

    #[test]
    fn test_missing_influxdb_section_is_an_error() {
        let file = write_config("[SVC1]\naddress = 10.0.0.1\nlogin = a\npassword = b\n");
        assert!(ConfigFile::load(file.path()).unwrap().influxdb().is_err());
    }
}
