use anyhow::Context;
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES` (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 366;

/// Upper bound for `DATABASE_MAX_CONNECTIONS`.
pub const MAX_DB_CONNECTIONS: u32 = 1_000;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Tokens never expire unless this is set.
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "postgres".into());
        let store = match backend.trim().to_ascii_lowercase().as_str() {
            "postgres" => StoreConfig::Postgres {
                database_url: lookup("DATABASE_URL")
                    .context("DATABASE_URL is required for the postgres store")?,
                max_connections: parse_max_connections(lookup("DATABASE_MAX_CONNECTIONS"))?,
            },
            "memory" => StoreConfig::Memory,
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };

        let secret = lookup("JWT_SECRET").context("JWT_SECRET is required")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "todo-api".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "todo-api-users".into()),
            ttl_minutes: parse_ttl_minutes(lookup("JWT_TTL_MINUTES"))?,
        };
        Ok(Self { store, jwt })
    }

    /// In-memory configuration with a fixed secret, for tests.
    pub fn for_tests() -> Self {
        Self {
            store: StoreConfig::Memory,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: None,
            },
        }
    }
}

fn parse_max_connections(raw: Option<String>) -> anyhow::Result<u32> {
    let Some(raw) = raw else {
        return Ok(10);
    };
    let n = raw
        .trim()
        .parse::<u32>()
        .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
    anyhow::ensure!(
        (1..=MAX_DB_CONNECTIONS).contains(&n),
        "DATABASE_MAX_CONNECTIONS must be between 1 and {MAX_DB_CONNECTIONS}, got {n}"
    );
    Ok(n)
}

fn parse_ttl_minutes(raw: Option<String>) -> anyhow::Result<Option<i64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let minutes = raw
        .trim()
        .parse::<i64>()
        .context("JWT_TTL_MINUTES must be a positive integer")?;
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}"
    );
    Ok(Some(minutes))
}
