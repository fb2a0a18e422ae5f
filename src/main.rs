use std::io::{self, Write};

use actix_cors::Cors;
use actix_files::Files;
use actix_governor::Governor;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use diesel::SqliteConnection;
use diesel_migrations::MigrationHarness;
use dotenvy::dotenv;

use homepage::{
    api,
    config::AppConfig,
    initialize_db_pool,
    models::user::{User, UserError, MIN_PASSWORD_LENGTH},
    observability, security,
    session::session_manager,
    state::AppState,
    DbPool, MIGRATIONS,
};

/// CLI options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Create the owner account or change its password, then exit
    #[clap(long)]
    set_password: bool,
}

fn other_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {e}"))
}

fn main() -> io::Result<()> {
    dotenv().ok();
    observability::init_logging();

    let config = AppConfig::from_env().map_err(|e| other_error("Invalid configuration", e))?;
    tracing::info!(database = %config.database_url, "Opening database");

    let db_pool = initialize_db_pool(&config.database_url)
        .map_err(|e| other_error("Failed to open database", e))?;
    let mut conn = db_pool
        .get()
        .map_err(|e| other_error("Failed to get database connection", e))?;
    tracing::info!("Running database migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| other_error("Failed to run migrations", e))?;

    let args = Args::parse();
    if args.set_password {
        return cli_set_password(&mut conn);
    }

    if let Ok(removed) = session_manager::cleanup_expired_sessions(&mut conn) {
        tracing::debug!(removed, "Expired sessions removed");
    }
    drop(conn);

    run_server(config, db_pool)
}

fn cli_set_password(db: &mut SqliteConnection) -> io::Result<()> {
    let current = User::get_owner(db).map(|owner| owner.username);
    match &current {
        Some(name) => print!("\nUsername [{name}]: "),
        None => print!("\nUsername [owner]: "),
    }
    io::stdout().flush()?;
    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = match username.trim() {
        "" => current.unwrap_or_else(|| "owner".to_string()),
        name => name.to_string(),
    };

    println!("Enter password (at least {MIN_PASSWORD_LENGTH} characters):");
    let password = rpassword::read_password()?;
    println!("Enter password again:");
    let password2 = rpassword::read_password()?;

    if password != password2 {
        println!("Passwords do not match");
        return Ok(());
    }

    match User::set_password(db, &username, &password) {
        Ok(user) => println!("Password set for {}", user.username),
        Err(UserError::PasswordTooShort) => {
            println!("Password must be at least {MIN_PASSWORD_LENGTH} characters")
        }
        Err(e) => println!("Failed to set password: {e:?}"),
    }
    Ok(())
}

#[actix_web::main]
async fn run_server(config: AppConfig, db_pool: DbPool) -> io::Result<()> {
    let general_rate_limiter = security::create_rate_limiter()
        .ok_or_else(|| other_error("Rate limiter", "invalid configuration"))?;
    let auth_rate_limiter = security::create_auth_rate_limiter()
        .ok_or_else(|| other_error("Auth rate limiter", "invalid configuration"))?;

    let bind = (config.host.clone(), config.port);
    let public_path = config.public_path.clone();
    let state = web::Data::new(
        AppState::new(config, db_pool.clone())
            .map_err(|e| other_error("Failed to build HTTP clients", e))?,
    );
    let db_pool = web::Data::new(db_pool);

    tracing::info!("Serving static files from {}", public_path);
    tracing::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::new(
                middleware::TrailingSlash::Trim,
            ))
            .wrap(security::SecurityHeaders)
            .wrap(cors)
            .app_data(db_pool.clone())
            .app_data(state.clone())
            .service(api::auth::routes().wrap(Governor::new(&auth_rate_limiter)))
            .service(api::health::routes())
            .service(api::routes().wrap(Governor::new(&general_rate_limiter)))
            .service(Files::new("/", &public_path).index_file("index.html"))
    })
    .bind(bind)?
    .run()
    .await
}
