use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

/// Canonical admin identity enforced by the startup bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    /// When set, the role claim is re-read from storage on every request so
    /// demotions take effect before token expiry.
    pub strict_roles: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://painel.db".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "painel".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "painel-users".into()),
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        let admin = AdminConfig {
            email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@agencia.com".into()),
            name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Diretor Admin".into()),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "123456".into()),
        };
        let strict_roles = std::env::var("STRICT_ROLES")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(Self {
            database_url,
            jwt,
            admin,
            strict_roles,
        })
    }
}
