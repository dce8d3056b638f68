use std::collections::HashSet;

use crate::config::ConfigError;
use crate::config::types::AppConfig;

impl AppConfig {
    /// Structural invariants that the directive parser cannot see on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::new(
                "configuration must declare at least one server",
            ));
        }

        for (index, server) in self.servers.iter().enumerate() {
            let label = index + 1;

            if server.ports.is_empty() {
                return Err(ConfigError::new(format!(
                    "server #{label} has no listen port"
                )));
            }

            let mut seen_paths = HashSet::new();
            for route in &server.routes {
                if route.path.is_empty() {
                    return Err(ConfigError::new(format!(
                        "server #{label} has a location with an empty path"
                    )));
                }
                if !seen_paths.insert(route.path.as_str()) {
                    return Err(ConfigError::new(format!(
                        "duplicate location '{}' in server #{label}",
                        route.path
                    )));
                }
                if route.cgi_enabled && (route.cgi_path.is_empty() || route.cgi_ext.is_empty()) {
                    return Err(ConfigError::new(format!(
                        "location '{}' enables CGI but is missing cgi_pass or cgi_ext",
                        route.path
                    )));
                }
                if route.upload_enabled && route.upload_dir.is_empty() {
                    return Err(ConfigError::new(format!(
                        "location '{}' enables uploads but has no upload_store",
                        route.path
                    )));
                }
            }
        }

        Ok(())
    }
}
