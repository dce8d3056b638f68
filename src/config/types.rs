use std::collections::HashMap;
use std::fs;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::config::parser::Parser;
use crate::lexer::Lexer;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MAX_BODY_SIZE: usize = 1_048_576; // 1MiB

#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub path: String,
    pub methods: Vec<String>,
    pub redirect: Option<String>,
    pub root: String,
    pub autoindex: bool,
    pub index_files: Vec<String>,
    pub cgi_enabled: bool,
    pub cgi_path: String,
    pub cgi_ext: String,
    pub upload_enabled: bool,
    pub upload_dir: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            methods: vec!["GET".to_string()],
            redirect: None,
            root: String::new(),
            autoindex: false,
            index_files: Vec::new(),
            cgi_enabled: false,
            cgi_path: String::new(),
            cgi_ext: String::new(),
            upload_enabled: false,
            upload_dir: String::new(),
        }
    }
}

impl RouteConfig {
    pub fn allows_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub ports: Vec<u16>,
    pub server_names: Vec<String>,
    pub client_max_body_size: usize,
    pub error_pages: HashMap<u16, String>,
    pub routes: Vec<RouteConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ports: Vec::new(),
            server_names: Vec::new(),
            client_max_body_size: DEFAULT_MAX_BODY_SIZE,
            error_pages: HashMap::new(),
            routes: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn add_port(&mut self, port: u16) {
        if !self.ports.contains(&port) {
            self.ports.push(port);
        }
    }

    /// Longest-prefix route match. Ties resolve to the first-declared route
    /// (strictly-longer prefixes are required to displace an earlier match);
    /// with no match at all, the `/` route is the fallback if one exists.
    pub fn find_route(&self, path: &str) -> Option<&RouteConfig> {
        let mut best: Option<&RouteConfig> = None;
        let mut best_len = 0;

        for route in &self.routes {
            if path.starts_with(route.path.as_str()) && route.path.len() > best_len {
                best = Some(route);
                best_len = route.path.len();
            }
        }

        best.or_else(|| self.routes.iter().find(|r| r.path == "/"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub servers: Vec<ServerConfig>,
}

impl FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tokens = Lexer::new(input).tokenize();
        let config = Parser::new(tokens).parse()?;
        config.validate()?;
        Ok(config)
    }
}

impl AppConfig {
    pub fn load(path: &str) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("failed to read config file {path}: {e}")))?;
        content.parse()
    }

    /// Server lookup by listener endpoint and requested server name; the
    /// first name match wins, otherwise the default server for host:port.
    pub fn server_for(&self, host: &str, port: u16, server_name: &str) -> Option<&ServerConfig> {
        if !server_name.is_empty() {
            for server in &self.servers {
                if server.host != host || !server.ports.contains(&port) {
                    continue;
                }
                if server.server_names.iter().any(|n| n == server_name) {
                    return Some(server);
                }
            }
        }
        self.default_server(host, port)
    }

    /// The default server for an endpoint is the first one bound to it.
    pub fn default_server(&self, host: &str, port: u16) -> Option<&ServerConfig> {
        self.servers
            .iter()
            .find(|s| s.host == host && s.ports.contains(&port))
    }
}
