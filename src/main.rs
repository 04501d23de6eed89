use axum::{routing::get, Router};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod services;

use database::manager::DatabaseManager;
use services::IdentityService;

#[derive(Parser)]
#[command(name = "recipe-api")]
#[command(about = "Recipe catalog API - owner-scoped recipes, tags and ingredients")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API server (default)")]
    Serve,

    #[command(about = "Create a privileged identity")]
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Recipe API in {:?} mode", config.environment);

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::CreateAdmin { email, password } => create_admin(&email, &password).await,
    }
}

async fn serve() {
    DatabaseManager::migrate()
        .await
        .unwrap_or_else(|e| panic!("failed to apply migrations: {}", e));

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("RECIPE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Recipe API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

async fn create_admin(email: &str, password: &str) {
    DatabaseManager::migrate()
        .await
        .unwrap_or_else(|e| panic!("failed to apply migrations: {}", e));

    let service = IdentityService::new().await.expect("identity service");
    match service.create_privileged_identity(email, password).await {
        Ok(identity) => println!("Created admin identity {} ({})", identity.email, identity.id),
        Err(e) => {
            eprintln!("Failed to create admin identity: {}", e);
            std::process::exit(1);
        }
    }
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API behind JWT middleware
        .merge(api_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn api_routes() -> Router {
    use axum::routing::{get, put};
    use handlers::protected::{auth, ingredients, recipes, tags};

    Router::new()
        // Account self-service
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/user", put(auth::user_update).delete(auth::user_delete))
        // Recipe attributes (collection-level only)
        .route("/api/tags", get(tags::list).post(tags::create))
        .route("/api/ingredients", get(ingredients::list).post(ingredients::create))
        // Recipes
        .route("/api/recipes", get(recipes::list).post(recipes::create))
        .route(
            "/api/recipes/:id",
            get(recipes::get)
                .put(recipes::put)
                .patch(recipes::patch)
                .delete(recipes::delete),
        )
        // Reject unauthenticated requests before any handler or store access
        .route_layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Recipe API (Rust)",
            "version": version,
            "description": "Owner-scoped recipe catalog backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "register": "/auth/register (public)",
                "login": "/auth/login (public - token acquisition)",
                "account": "/api/auth/whoami, /api/auth/user (protected)",
                "tags": "/api/tags (protected)",
                "ingredients": "/api/ingredients (protected)",
                "recipes": "/api/recipes[/:id] (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
