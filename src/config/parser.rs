use crate::config::ConfigError;
use crate::config::types::{AppConfig, RouteConfig, ServerConfig};
use crate::lexer::tokens::{Loc, Token, TokenKind};

/// Recursive-descent parser over the token stream produced by the lexer.
/// Grammar: `server { <directive>; ... location <prefix> { <directive>; ... } }`.
/// Unknown directives are hard errors naming the offending token.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Word(w) if w == "server" => {
                    self.pos += 1;
                    let server = self.parse_server()?;
                    config.servers.push(server);
                }
                kind => {
                    return Err(ConfigError::at(
                        format!("unexpected token '{}' (expected 'server')", kind),
                        token.loc,
                    ));
                }
            }
        }

        Ok(config)
    }

    fn parse_server(&mut self) -> Result<ServerConfig, ConfigError> {
        self.expect(TokenKind::LBrace)?;
        let mut server = ServerConfig::default();

        loop {
            let token = self.next_token("'}'")?;
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Word(ref w) if w == "location" => {
                    let route = self.parse_location()?;
                    server.routes.push(route);
                }
                TokenKind::Word(ref directive) => {
                    let directive = directive.clone();
                    let loc = token.loc;
                    self.parse_server_directive(&directive, loc, &mut server)?;
                }
                kind => {
                    return Err(ConfigError::at(
                        format!("unexpected token '{}' in server block", kind),
                        token.loc,
                    ));
                }
            }
        }

        Ok(server)
    }

    fn parse_server_directive(
        &mut self,
        directive: &str,
        loc: Loc,
        server: &mut ServerConfig,
    ) -> Result<(), ConfigError> {
        match directive {
            "listen" => {
                let value = self.word("port or host:port after 'listen'")?;
                if let Some((host, port)) = value.split_once(':') {
                    server.host = host.to_string();
                    server.add_port(parse_port(port, loc)?);
                } else {
                    server.add_port(parse_port(&value, loc)?);
                }
                self.expect(TokenKind::Semicolon)
            }
            "host" => {
                server.host = self.word("host after 'host'")?;
                self.expect(TokenKind::Semicolon)
            }
            "server_name" => {
                server.server_names = self.words_until_semicolon()?;
                Ok(())
            }
            "client_max_body_size" => {
                let value = self.word("size after 'client_max_body_size'")?;
                server.client_max_body_size = parse_size(&value, loc)?;
                self.expect(TokenKind::Semicolon)
            }
            "error_page" => {
                let code = self.word("status code after 'error_page'")?;
                let code = code.parse::<u16>().map_err(|_| {
                    ConfigError::at(format!("invalid status code '{}'", code), loc)
                })?;
                let path = self.word("path after the error_page status code")?;
                server.error_pages.insert(code, path);
                self.expect(TokenKind::Semicolon)
            }
            _ => Err(ConfigError::at(
                format!("unknown server directive '{}'", directive),
                loc,
            )),
        }
    }

    fn parse_location(&mut self) -> Result<RouteConfig, ConfigError> {
        let path = self.word("path after 'location'")?;
        self.expect(TokenKind::LBrace)?;

        let mut route = RouteConfig {
            path,
            ..Default::default()
        };

        loop {
            let token = self.next_token("'}'")?;
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Word(ref directive) => {
                    let directive = directive.clone();
                    let loc = token.loc;
                    self.parse_location_directive(&directive, loc, &mut route)?;
                }
                kind => {
                    return Err(ConfigError::at(
                        format!("unexpected token '{}' in location block", kind),
                        token.loc,
                    ));
                }
            }
        }

        Ok(route)
    }

    fn parse_location_directive(
        &mut self,
        directive: &str,
        loc: Loc,
        route: &mut RouteConfig,
    ) -> Result<(), ConfigError> {
        match directive {
            "allow_methods" | "methods" => {
                route.methods = self.words_until_semicolon()?;
                Ok(())
            }
            "return" | "redirect" => {
                route.redirect = Some(self.word("URL after the redirect directive")?);
                self.expect(TokenKind::Semicolon)
            }
            "root" => {
                route.root = self.word("path after 'root'")?;
                self.expect(TokenKind::Semicolon)
            }
            "autoindex" => {
                route.autoindex = self.on_off(loc)?;
                self.expect(TokenKind::Semicolon)
            }
            "index" => {
                route.index_files = self.words_until_semicolon()?;
                Ok(())
            }
            "cgi_pass" => {
                route.cgi_enabled = true;
                route.cgi_path = self.word("interpreter path after 'cgi_pass'")?;
                self.expect(TokenKind::Semicolon)
            }
            "cgi_ext" => {
                route.cgi_ext = self.word("extension after 'cgi_ext'")?;
                self.expect(TokenKind::Semicolon)
            }
            "upload_enable" => {
                route.upload_enabled = self.on_off(loc)?;
                self.expect(TokenKind::Semicolon)
            }
            "upload_store" | "upload_path" => {
                route.upload_dir = self.word("path after the upload directive")?;
                self.expect(TokenKind::Semicolon)
            }
            _ => Err(ConfigError::at(
                format!("unknown location directive '{}'", directive),
                loc,
            )),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self, expected: &str) -> Result<Token, ConfigError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            ConfigError::new(format!("expected {} but reached end of file", expected))
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ConfigError> {
        let token = self.next_token(&format!("'{}'", kind))?;
        if token.kind != kind {
            return Err(ConfigError::at(
                format!("expected '{}' but got '{}'", kind, token.kind),
                token.loc,
            ));
        }
        Ok(())
    }

    fn word(&mut self, expected: &str) -> Result<String, ConfigError> {
        let token = self.next_token(expected)?;
        match token.kind {
            TokenKind::Word(w) => Ok(w),
            kind => Err(ConfigError::at(
                format!("expected {} but got '{}'", expected, kind),
                token.loc,
            )),
        }
    }

    /// Collects words up to and including the terminating semicolon.
    fn words_until_semicolon(&mut self) -> Result<Vec<String>, ConfigError> {
        let mut words = Vec::new();
        loop {
            let token = self.next_token("';'")?;
            match token.kind {
                TokenKind::Semicolon => break,
                TokenKind::Word(w) => words.push(w),
                kind => {
                    return Err(ConfigError::at(
                        format!("expected value or ';' but got '{}'", kind),
                        token.loc,
                    ));
                }
            }
        }
        Ok(words)
    }

    fn on_off(&mut self, loc: Loc) -> Result<bool, ConfigError> {
        let value = self.word("'on' or 'off'")?;
        match value.as_str() {
            "on" => Ok(true),
            "off" => Ok(false),
            _ => Err(ConfigError::at(
                format!("expected 'on' or 'off' but got '{}'", value),
                loc,
            )),
        }
    }
}

fn parse_port(value: &str, loc: Loc) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::at(
            format!("invalid port number '{}'", value),
            loc,
        )),
    }
}

/// `client_max_body_size` value with optional K/M/G suffix (powers of 1024).
fn parse_size(value: &str, loc: Loc) -> Result<usize, ConfigError> {
    let (number, multiplier) = match value.chars().last() {
        Some('K') | Some('k') => (&value[..value.len() - 1], 1024),
        Some('M') | Some('m') => (&value[..value.len() - 1], 1024 * 1024),
        Some('G') | Some('g') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        _ => (value, 1),
    };

    number
        .parse::<usize>()
        .map(|n| n * multiplier)
        .map_err(|_| ConfigError::at(format!("invalid size '{}'", value), loc))
}
