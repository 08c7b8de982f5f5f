use core_config::{AppInfo, FromEnv, app_info, env_parse, media::MediaConfig, server::ServerConfig};
use database::postgres::PostgresConfig;
use domain_products::WritePolicy;

pub use core_config::Environment;

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub media: MediaConfig,
    /// PRODUCT_WRITE_POLICY: `any` (default) or `creator`
    pub write_policy: WritePolicy,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?; // DATABASE_URL is required
        let server = ServerConfig::from_env()?;
        let media = MediaConfig::from_env()?;
        let write_policy = env_parse("PRODUCT_WRITE_POLICY", WritePolicy::default())?;

        Ok(Self {
            app: app_info!(),
            database,
            server,
            media,
            write_policy,
            environment,
        })
    }
}
