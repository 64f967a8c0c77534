//! Where the entity buckets live.
//!
//! Every bucket is named `<prefix>_<entity>`; two deployments pointed at the
//! same JetStream domain stay apart as long as their prefixes differ.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    pub servers: Vec<String>,
    /// Bucket namespace, e.g. `maw` or `maw_dev`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// `.creds` file; takes precedence over username/password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// How the store authenticates, resolved from [`NatsConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NatsAuth<'a> {
    Credentials(&'a str),
    UserPassword { user: &'a str, password: &'a str },
    Anonymous,
}

fn default_prefix() -> String {
    "maw".to_string()
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self::for_prefix(default_prefix())
    }
}

impl NatsConfig {
    /// Local single-server setup under `prefix`
    pub fn for_prefix(prefix: impl Into<String>) -> Self {
        Self {
            servers: vec!["localhost:4222".to_string()],
            prefix: prefix.into(),
            credentials_file: None,
            username: None,
            password: None,
        }
    }

    /// Replace the server list with a comma-separated one. Blank entries are
    /// dropped.
    pub fn set_servers(&mut self, list: &str) {
        self.servers = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    pub fn auth(&self) -> NatsAuth<'_> {
        match (&self.credentials_file, &self.username, &self.password) {
            (Some(file), _, _) => NatsAuth::Credentials(file),
            (None, Some(user), Some(password)) => NatsAuth::UserPassword { user, password },
            _ => NatsAuth::Anonymous,
        }
    }

    /// JetStream bucket names allow only `[A-Za-z0-9_-]`.
    pub fn prefix_is_valid(&self) -> bool {
        !self.prefix.is_empty()
            && self
                .prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// KV bucket name for an entity, e.g. `maw_relationships`
    pub fn bucket(&self, entity: &str) -> String {
        format!("{}_{}", self.prefix, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_local_maw() {
        let cfg = NatsConfig::default();
        assert_eq!(cfg.servers, vec!["localhost:4222"]);
        assert_eq!(cfg.bucket("stats"), "maw_stats");
        assert_eq!(cfg.auth(), NatsAuth::Anonymous);
    }

    #[test]
    fn test_set_servers_trims_and_drops_blanks() {
        let mut cfg = NatsConfig::for_prefix("prod");
        cfg.set_servers("n1:4222 , n2:4222,");
        assert_eq!(cfg.servers, vec!["n1:4222", "n2:4222"]);
    }

    #[test]
    fn test_credentials_take_precedence() {
        let mut cfg = NatsConfig::for_prefix("test");
        cfg.username = Some("alice".into());
        cfg.password = Some("secret".into());
        assert_eq!(
            cfg.auth(),
            NatsAuth::UserPassword {
                user: "alice",
                password: "secret"
            }
        );

        cfg.credentials_file = Some("/creds/maw.creds".into());
        assert_eq!(cfg.auth(), NatsAuth::Credentials("/creds/maw.creds"));
    }

    #[test]
    fn test_username_without_password_is_anonymous() {
        let mut cfg = NatsConfig::for_prefix("test");
        cfg.username = Some("alice".into());
        assert_eq!(cfg.auth(), NatsAuth::Anonymous);
    }

    #[test]
    fn test_prefix_validation() {
        assert!(NatsConfig::for_prefix("maw_dev-2").prefix_is_valid());
        assert!(!NatsConfig::for_prefix("").prefix_is_valid());
        assert!(!NatsConfig::for_prefix("maw.dev").prefix_is_valid());
        assert!(!NatsConfig::for_prefix("maw dev").prefix_is_valid());
    }

    #[test]
    fn test_toml_fields_default() {
        let cfg: NatsConfig = serde_json::from_str(r#"{"servers":["localhost:4222"]}"#).unwrap();
        assert_eq!(cfg.prefix, "maw");
        assert!(cfg.credentials_file.is_none());
    }
}
