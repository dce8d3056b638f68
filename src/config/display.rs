use serv_log::info;

use crate::config::types::AppConfig;

impl AppConfig {
    /// Startup summary of the parsed configuration.
    pub fn display_config(&self) {
        info!("loaded {} server(s)", self.servers.len());

        for (index, server) in self.servers.iter().enumerate() {
            let ports: Vec<String> = server.ports.iter().map(|p| p.to_string()).collect();
            info!(
                "server #{}: host {}, ports [{}], max body {} bytes",
                index + 1,
                server.host,
                ports.join(", "),
                server.client_max_body_size
            );

            if !server.server_names.is_empty() {
                info!("  server names: {}", server.server_names.join(", "));
            }

            for route in &server.routes {
                let mut summary = format!("  location {} [{}]", route.path, route.methods.join(" "));
                if let Some(redirect) = &route.redirect {
                    summary.push_str(&format!(" -> {}", redirect));
                }
                if !route.root.is_empty() {
                    summary.push_str(&format!(" root={}", route.root));
                }
                if route.cgi_enabled {
                    summary.push_str(&format!(" cgi={}({})", route.cgi_path, route.cgi_ext));
                }
                if route.upload_enabled {
                    summary.push_str(&format!(" upload={}", route.upload_dir));
                }
                if route.autoindex {
                    summary.push_str(" autoindex");
                }
                info!("{}", summary);
            }
        }
    }
}
