use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts below
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_database_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_database_migration_on_startup")]
    pub migration_on_startup: bool,
}

fn default_database_url() -> String {
    "sqlite://./data/subscriptions.db?mode=rwc".to_string()
}

fn default_database_max_connections() -> u32 {
    25
}

fn default_database_migration_on_startup() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            host: None,
            port: None,
            user: None,
            password: None,
            name: None,
            max_connections: default_database_max_connections(),
            migration_on_startup: default_database_migration_on_startup(),
        }
    }
}

impl DatabaseConfig {
    /// Connection URL, composed from host/port/user/name when `url` is empty.
    ///
    /// Returns `None` when neither form is usable.
    pub fn connection_url(&self) -> Option<String> {
        if !self.url.trim().is_empty() {
            return Some(self.url.clone());
        }

        match (&self.host, self.port, &self.user, &self.name) {
            (Some(host), Some(port), Some(user), Some(name))
                if !host.is_empty() && !user.is_empty() && !name.is_empty() =>
            {
                let password = self.password.as_deref().unwrap_or("");
                Some(format!(
                    "postgres://{}:{}@{}:{}/{}?sslmode=disable",
                    user, password, host, port, name
                ))
            }
            _ => None,
        }
    }
}
