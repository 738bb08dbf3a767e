/// Default listening port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|port| {
                    port.trim()
                        .parse::<u16>()
                        .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))
                })
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    Ok(url)
                })?,
            database_name: std::env::var("DATABASE_NAME")
                .map_err(|_| anyhow::anyhow!("DATABASE_NAME environment variable required"))
                .and_then(|name| {
                    if name.trim().is_empty() {
                        anyhow::bail!("DATABASE_NAME cannot be empty");
                    }
                    Ok(name)
                })?,
        };

        // Connection strings carry credentials, only a prefix is logged
        tracing::debug!(
            "Database URL: {}...",
            config.database_url.chars().take(20).collect::<String>()
        );
        tracing::debug!("Database name: {}", config.database_name);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
