use axum_helpers::server::{close_postgres, create_production_app, create_router};
use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{LocalImageStore, PgProductRepository, ProductService};
use domain_users::{CreateUser, PgUserRepository, UserService};
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "shop_api", version, about = "Product catalog API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Provision an account that can log in and manage products
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = connect(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::CreateUser {
            username,
            password,
            email,
        } => {
            let users = UserService::new(PgUserRepository::new(db.clone()));
            let result = users
                .create_user(CreateUser {
                    username,
                    password,
                    email,
                })
                .await;
            close_postgres(db, "main").await;

            let user = result.map_err(|e| eyre::eyre!("Failed to create user: {}", e))?;
            info!(user_id = %user.id, username = %user.username, "User created");
            Ok(())
        }
    }
}

async fn connect(config: &Config) -> eyre::Result<DatabaseConnection> {
    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("Failed to connect to database: {}", e))?;

    database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
        .await
        .map_err(|e| eyre::eyre!("Failed to run migrations: {}", e))?;

    Ok(db)
}

async fn serve(config: Config, db: DatabaseConnection) -> eyre::Result<()> {
    info!(
        app = config.app.name,
        version = config.app.version,
        write_policy = %config.write_policy,
        "Starting"
    );

    let users = UserService::new(PgUserRepository::new(db.clone()));
    let products = ProductService::new(
        PgProductRepository::new(db.clone()),
        LocalImageStore::new(&config.media.root),
    )
    .with_policy(config.write_policy);

    let apis = api::routes(config.app.clone(), users, products, config.media.clone());
    let root = api::root_routes(db.clone(), &config.media);
    let router = create_router::<openapi::ApiDoc>(apis, root, &config.server, &config.environment)?;

    create_production_app(router, &config.server, Duration::from_secs(30), async move {
        close_postgres(db, "main").await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["shop_api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_create_user_arguments() {
        let cli = Cli::try_parse_from([
            "shop_api",
            "create-user",
            "--username",
            "alice",
            "--password",
            "s3cret-pass",
        ])
        .unwrap();

        match cli.command {
            Some(Command::CreateUser {
                username,
                password,
                email,
            }) => {
                assert_eq!(username, "alice");
                assert_eq!(password, "s3cret-pass");
                assert_eq!(email, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_create_user_requires_password() {
        assert!(Cli::try_parse_from(["shop_api", "create-user", "--username", "alice"]).is_err());
    }
}
