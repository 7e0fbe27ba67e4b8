use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_ms: i64,
    pub refresh_multiplier: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "moneybook".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "moneybook-users".into()),
            // 24 hours
            ttl_ms: std::env::var("JWT_TTL_MS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(86_400_000),
            // refresh tokens live 7x longer than session tokens
            refresh_multiplier: std::env::var("JWT_REFRESH_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        Ok(Self { database_url, jwt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_applies_defaults() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/moneybook");
        std::env::set_var("JWT_SECRET", "a-long-enough-test-secret");
        std::env::remove_var("JWT_TTL_MS");
        std::env::remove_var("JWT_REFRESH_MULTIPLIER");
        let config = AppConfig::from_env().expect("from_env");
        assert_eq!(config.jwt.ttl_ms, 86_400_000);
        assert_eq!(config.jwt.refresh_multiplier, 7);
        assert_eq!(config.jwt.issuer, "moneybook");
        assert_eq!(config.jwt.audience, "moneybook-users");
    }
}
