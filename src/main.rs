use cryptfx_backend::app::app::App;
use cryptfx_backend::util::logger::Logger;
use dotenv::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    match dotenv() {
        Ok(_) => {}
        Err(e) => eprintln!("No .env file loaded: {} (using system env vars)", e),
    }

    let _logger = match Logger::new() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting CryptFX backend");

    let app = match App::new().await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.start().await {
        error!("Server exited with error: {}", e);
        std::process::exit(1);
    }

    info!("Application shut down");
}
