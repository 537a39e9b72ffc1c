use olg_server::{ServerConfig, serve};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = serve(config).await {
        eprintln!("server error: {err}");
        std::process::exit(1);
    }
}
