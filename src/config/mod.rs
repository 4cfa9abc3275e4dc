use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration, built once in `main` and threaded through the
/// router state. There is no global singleton; everything that needs settings
/// receives them explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub mongo: MongoConfig,
    pub security: SecurityConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub url: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Filesystem directory attachments are written under.
    pub dir: String,
    /// URL prefix the stored files are served from.
    pub public_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        if let Ok(v) = env::var("DATABASE_URL") {
            self.postgres.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.postgres.max_connections = v.parse().unwrap_or(self.postgres.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.postgres.connect_timeout_secs =
                v.parse().unwrap_or(self.postgres.connect_timeout_secs);
        }

        if let Ok(v) = env::var("MONGO_URL") {
            self.mongo.url = v;
        }
        if let Ok(v) = env::var("MONGO_DATABASE") {
            self.mongo.database = v;
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.dir = v;
        }
        if let Ok(v) = env::var("UPLOAD_PUBLIC_PREFIX") {
            self.uploads.public_prefix = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 8080 },
            postgres: PostgresConfig {
                url: "postgres://localhost:5432/achievements_dev".to_string(),
                max_connections: 10,
                connect_timeout_secs: 30,
            },
            mongo: MongoConfig {
                url: "mongodb://localhost:27017".to_string(),
                database: "achievements_dev".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: "dev-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7,
            },
            uploads: UploadConfig {
                dir: "./uploads".to_string(),
                public_prefix: "/uploads".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8080 },
            postgres: PostgresConfig {
                url: String::new(),
                max_connections: 20,
                connect_timeout_secs: 10,
            },
            mongo: MongoConfig {
                url: String::new(),
                database: "achievements_staging".to_string(),
            },
            security: SecurityConfig { jwt_secret: String::new(), jwt_expiry_hours: 24 },
            uploads: UploadConfig {
                dir: "/var/lib/achievements/uploads".to_string(),
                public_prefix: "/uploads".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8080 },
            postgres: PostgresConfig {
                url: String::new(),
                max_connections: 50,
                connect_timeout_secs: 5,
            },
            mongo: MongoConfig {
                url: String::new(),
                database: "achievements".to_string(),
            },
            security: SecurityConfig { jwt_secret: String::new(), jwt_expiry_hours: 4 },
            uploads: UploadConfig {
                dir: "/var/lib/achievements/uploads".to_string(),
                public_prefix: "/uploads".to_string(),
            },
        }
    }
}
