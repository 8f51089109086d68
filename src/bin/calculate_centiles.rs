//! Run one centile calculation request from the command line
//! Usage: calculate_centiles [request.json]   (reads stdin when no file is given)

use std::io::Read;

use tracing_subscriber::EnvFilter;

use autocentile::calculator::CentileHandler;
use autocentile::config::CentileConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("autocentile=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let body = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let config = CentileConfig::from_env()?;
    let handler = CentileHandler::from_config(&config);
    let handled = handler.handle_json(&body);

    println!("{}", serde_json::to_string_pretty(&handled.body)?);

    if !handled.status.is_success() {
        eprintln!("HTTP {}", handled.status);
        std::process::exit(1);
    }

    Ok(())
}
