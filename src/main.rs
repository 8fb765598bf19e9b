use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use todoforge::config::{sqlite_parent_dir, Config};
use todoforge::db::Database;
use todoforge::routes;
use todoforge::session::{spawn_purge_task, SessionStore, SqliteSessionStore};
use todoforge::state::AppState;
use todoforge::views::ViewComposer;

const SESSION_PURGE_PERIOD: Duration = Duration::from_secs(10 * 60);

fn startup_error<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> io::Error {
    move |e| {
        log::error!("{}: {}", context, e);
        io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
    }
}

fn ensure_sqlite_dir(url: &str) -> io::Result<()> {
    match sqlite_parent_dir(url) {
        Some(dir) => std::fs::create_dir_all(dir),
        None => Ok(()),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if dotenv::from_filename("config/.env").is_err() {
        dotenv::dotenv().ok();
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error("Invalid configuration"))?;

    ensure_sqlite_dir(&config.database_url)?;
    ensure_sqlite_dir(&config.session_database_url)?;

    let db = Database::connect(&config.database_url)
        .await
        .map_err(startup_error("Failed to open the database"))?;
    let session_store: Arc<dyn SessionStore> = Arc::new(
        SqliteSessionStore::connect(&config.session_database_url)
            .await
            .map_err(startup_error("Failed to open the session store"))?,
    );
    spawn_purge_task(Arc::clone(&session_store), SESSION_PURGE_PERIOD);

    let views = ViewComposer::new(config.title.clone())
        .map_err(startup_error("Failed to load templates"))?;

    let state = web::Data::new(AppState::new(
        db,
        session_store,
        views,
        config.cookie_secure,
    ));

    log::info!("Starting {} at {}", config.title, config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
