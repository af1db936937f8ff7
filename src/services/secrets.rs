use async_trait::async_trait;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{de::DeserializeOwned, Deserialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret {name} unreadable: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("secret {name} malformed: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of startup credentials. Resolution happens once, before any
/// client is built.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<String, SecretError>;
}

/// Resolves a JSON secret into `T`.
pub async fn resolve_json<T: DeserializeOwned>(
    resolver: &dyn SecretResolver,
    name: &str,
) -> Result<T, SecretError> {
    let raw = resolver.resolve(name).await?;
    serde_json::from_str(&raw).map_err(|source| SecretError::Malformed {
        name: name.to_string(),
        source,
    })
}

/// Reads `SECRET_<NAME>` from the process environment.
pub struct EnvSecretResolver;

impl EnvSecretResolver {
    pub fn variable_for(name: &str) -> String {
        let normalized: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("SECRET_{}", normalized)
    }
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    async fn resolve(&self, name: &str) -> Result<String, SecretError> {
        let var = Self::variable_for(name);
        std::env::var(&var).map_err(|_| SecretError::NotFound(var))
    }
}

/// Reads `<dir>/<name>`, the layout written by an injecting secrets agent.
pub struct FileSecretResolver {
    dir: PathBuf,
}

impl FileSecretResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SecretResolver for FileSecretResolver {
    async fn resolve(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SecretError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(SecretError::Unreadable {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

fn default_pg_port() -> u16 {
    5432
}

fn default_redis_port() -> u16 {
    6379
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseCredentials {
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CacheCredentials {
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: bool,
}

impl CacheCredentials {
    /// Built field by field so passwords never pass through URL syntax.
    pub fn connection_info(&self) -> ConnectionInfo {
        let addr = if self.tls {
            ConnectionAddr::TcpTls {
                host: self.host.clone(),
                port: self.port,
                insecure: false,
                tls_params: None,
            }
        } else {
            ConnectionAddr::Tcp(self.host.clone(), self.port)
        };

        ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                db: 0,
                username: None,
                password: self.password.clone().filter(|p| !p.is_empty()),
            },
        }
    }
}
