//! Process configuration read from the environment.

use std::path::{Path, PathBuf};
use url::Url;

use driveagent_common::{Error, Result, Secret};

pub const AGENT_API_KEY_VAR: &str = "DAEMO_AGENT_API_KEY";
pub const CLIENT_ID_VAR: &str = "GOOGLE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "GOOGLE_CLIENT_SECRET";
pub const REFRESH_TOKEN_VAR: &str = "GOOGLE_REFRESH_TOKEN";
pub const GATEWAY_URL_VAR: &str = "DAEMO_GATEWAY_URL";
pub const SERVICE_NAME_VAR: &str = "DRIVEAGENT_SERVICE_NAME";

/// Variables that must be set (and non-empty) before startup.
pub const REQUIRED_VARS: [&str; 4] = [
    AGENT_API_KEY_VAR,
    CLIENT_ID_VAR,
    CLIENT_SECRET_VAR,
    REFRESH_TOKEN_VAR,
];

pub const DEFAULT_GATEWAY_URL: &str = "https://engine.daemo.ai:50052/";
pub const DEFAULT_SERVICE_NAME: &str = "GoogleDriveKnowledgeAgent";

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Key identifying this agent to the hosting gateway.
    pub agent_api_key: Secret,
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: Secret,
    /// OAuth2 refresh token with Drive scope.
    pub refresh_token: Secret,
    /// Hosting gateway endpoint.
    pub gateway_url: Url,
    /// Name the agent registers under.
    pub service_name: String,
}

impl AgentConfig {
    /// Load configuration from an env file (if any) and the process
    /// environment.
    ///
    /// Variables already present in the environment take precedence over
    /// the env file.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = load_env_file(env_file)? {
            tracing::debug!(path = %path.display(), "Loaded env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// # Errors
    /// - `Config` listing every required variable that is missing or empty
    /// - `Config` if the gateway URL does not parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let required = |key: &str| get(key).unwrap_or_default();

        let gateway = get(GATEWAY_URL_VAR).unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
        let gateway_url = Url::parse(&gateway)
            .map_err(|e| Error::Config(format!("Invalid {}: {}", GATEWAY_URL_VAR, e)))?;

        Ok(Self {
            agent_api_key: Secret::new(required(AGENT_API_KEY_VAR)),
            client_id: required(CLIENT_ID_VAR),
            client_secret: Secret::new(required(CLIENT_SECRET_VAR)),
            refresh_token: Secret::new(required(REFRESH_TOKEN_VAR)),
            gateway_url,
            service_name: get(SERVICE_NAME_VAR)
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        })
    }

    /// Configuration as JSON with secrets replaced by their length.
    pub fn redacted(&self) -> serde_json::Value {
        let hidden = |secret: &Secret| format!("<{} bytes>", secret.len());
        serde_json::json!({
            "serviceName": self.service_name,
            "gatewayUrl": self.gateway_url.as_str(),
            "clientId": self.client_id,
            "clientSecret": hidden(&self.client_secret),
            "refreshToken": hidden(&self.refresh_token),
            "agentApiKey": hidden(&self.agent_api_key),
        })
    }
}

/// Load variables from an env file into the process environment.
///
/// With an explicit path the file must exist. Without one, `.env` is
/// searched for from the current directory upwards and its absence is
/// not an error. Returns the path that was loaded.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => dotenv::from_path(path)
            .map(|_| Some(path.to_path_buf()))
            .map_err(|e| Error::Config(format!("Failed to load {}: {}", path.display(), e))),
        None => match dotenv::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(Error::Config(format!("Failed to load .env: {}", e))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (AGENT_API_KEY_VAR, "agent-key"),
            (CLIENT_ID_VAR, "client.apps.googleusercontent.com"),
            (CLIENT_SECRET_VAR, "client-secret"),
            (REFRESH_TOKEN_VAR, "1//refresh"),
        ])
    }

    fn from_map(env: &HashMap<&'static str, &'static str>) -> Result<AgentConfig> {
        AgentConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_complete_config() {
        let config = from_map(&full_env()).unwrap();

        assert_eq!(config.client_id, "client.apps.googleusercontent.com");
        assert_eq!(config.refresh_token.expose(), "1//refresh");
        assert_eq!(config.gateway_url.as_str(), DEFAULT_GATEWAY_URL);
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn test_missing_variables_reported_together() {
        let mut env = full_env();
        env.remove(AGENT_API_KEY_VAR);
        env.insert(REFRESH_TOKEN_VAR, "");

        match from_map(&env) {
            Err(Error::Config(msg)) => assert_eq!(
                msg,
                "Missing required environment variables: DAEMO_AGENT_API_KEY, GOOGLE_REFRESH_TOKEN"
            ),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_optional_overrides() {
        let mut env = full_env();
        env.insert(GATEWAY_URL_VAR, "https://gateway.example.com:8443/");
        env.insert(SERVICE_NAME_VAR, "DriveHelper");

        let config = from_map(&env).unwrap();
        assert_eq!(config.gateway_url.host_str(), Some("gateway.example.com"));
        assert_eq!(config.service_name, "DriveHelper");

        env.insert(GATEWAY_URL_VAR, "not a url");
        assert!(matches!(from_map(&env), Err(Error::Config(_))));
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let config = from_map(&full_env()).unwrap();
        let text = config.redacted().to_string();

        assert!(!text.contains("client-secret"));
        assert!(!text.contains("1//refresh"));
        assert!(!text.contains("agent-key"));
        assert!(text.contains("client.apps.googleusercontent.com"));
        assert!(!format!("{:?}", config).contains("client-secret"));
    }

    #[test]
    fn test_load_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "DRIVEAGENT_TEST_ENV_FILE_VALUE=loaded").unwrap();

        let loaded = load_env_file(Some(&path)).unwrap();
        assert_eq!(loaded, Some(path));
        assert_eq!(
            std::env::var("DRIVEAGENT_TEST_ENV_FILE_VALUE").unwrap(),
            "loaded"
        );
    }

    #[test]
    fn test_load_missing_env_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_env_file(Some(&dir.path().join("absent.env")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
