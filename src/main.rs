use std::sync::atomic::Ordering;

use mio::Poll;
use serv_log::info;
use webserv::{config::AppConfig, error::Result, server::Server};

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.conf".to_string());

    info!("webserv/1.0 starting");
    info!("loading configuration from {}", config_path);
    let config = AppConfig::load(&config_path)?;
    config.display_config();

    let poll = Poll::new()?;
    let mut server = Server::new(config, &poll)?;

    let running = server.running_flag();
    ctrlc::set_handler(move || {
        running.store(false, Ordering::Release);
    })
    .map_err(|e| format!("failed to install signal handler: {e}"))?;

    server.run(poll)
}
