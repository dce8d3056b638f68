use webserv::config::AppConfig;

const SAMPLE: &str = r#"
# two servers, one with everything on it
server {
    listen 127.0.0.1:8080;
    listen 9090;
    server_name example.com www.example.com;
    client_max_body_size 2M;
    error_page 404 /errors/404.html;
    error_page 500 /errors/500.html;

    location / {
        allow_methods GET POST;
        root /var/www;
        index index.html index.htm;
        autoindex off;
    }

    location /old {
        return https://example.com/new;
    }

    location /cgi {
        methods GET POST;
        root /var/www/cgi;
        cgi_pass /usr/bin/python3;
        cgi_ext .py;
    }

    location /uploads {
        allow_methods GET POST DELETE;
        root /var/www/uploads;
        upload_enable on;
        upload_store /var/tmp/uploads;
        autoindex on;
    }
}

server {
    listen 8081;
    server_name other;

    location / {
        root /srv;
    }
}
"#;

#[test]
fn test_parse_full_config() {
    let config: AppConfig = SAMPLE.parse().unwrap();
    assert_eq!(config.servers.len(), 2);

    let server = &config.servers[0];
    assert_eq!(server.host, "127.0.0.1");
    assert_eq!(server.ports, vec![8080, 9090]);
    assert_eq!(server.server_names, vec!["example.com", "www.example.com"]);
    assert_eq!(server.client_max_body_size, 2 * 1024 * 1024);
    assert_eq!(
        server.error_pages.get(&404).map(String::as_str),
        Some("/errors/404.html")
    );
    assert_eq!(server.routes.len(), 4);

    let root = &server.routes[0];
    assert_eq!(root.path, "/");
    assert_eq!(root.methods, vec!["GET", "POST"]);
    assert_eq!(root.root, "/var/www");
    assert_eq!(root.index_files, vec!["index.html", "index.htm"]);
    assert!(!root.autoindex);
    assert!(!root.cgi_enabled);

    let old = &server.routes[1];
    assert_eq!(old.redirect.as_deref(), Some("https://example.com/new"));

    let cgi = &server.routes[2];
    assert!(cgi.cgi_enabled);
    assert_eq!(cgi.cgi_path, "/usr/bin/python3");
    assert_eq!(cgi.cgi_ext, ".py");

    let uploads = &server.routes[3];
    assert!(uploads.upload_enabled);
    assert_eq!(uploads.upload_dir, "/var/tmp/uploads");
    assert!(uploads.autoindex);

    // second server picks up the defaults
    let other = &config.servers[1];
    assert_eq!(other.host, "0.0.0.0");
    assert_eq!(other.client_max_body_size, 1_048_576);
    assert_eq!(other.routes[0].methods, vec!["GET"]);
}

#[test]
fn test_size_suffixes() {
    for (input, expected) in [
        ("100", 100usize),
        ("10K", 10 * 1024),
        ("10k", 10 * 1024),
        ("3M", 3 * 1024 * 1024),
        ("1G", 1024 * 1024 * 1024),
    ] {
        let source = format!(
            "server {{ listen 8080; client_max_body_size {}; location / {{ root /srv; }} }}",
            input
        );
        let config: AppConfig = source.parse().unwrap();
        assert_eq!(config.servers[0].client_max_body_size, expected);
    }
}

#[test]
fn test_unknown_server_directive_is_an_error() {
    let source = "server { listen 8080; gzip on; }";
    let err = source.parse::<AppConfig>().unwrap_err();
    assert!(err.message.contains("gzip"), "got: {}", err.message);
}

#[test]
fn test_unknown_location_directive_is_an_error() {
    let source = "server { listen 8080; location / { proxy_pass http://x; } }";
    let err = source.parse::<AppConfig>().unwrap_err();
    assert!(err.message.contains("proxy_pass"), "got: {}", err.message);
}

#[test]
fn test_missing_semicolon_is_an_error() {
    let source = "server { listen 8080 }";
    assert!(source.parse::<AppConfig>().is_err());
}

#[test]
fn test_invalid_port_is_an_error() {
    let source = "server { listen 123456; }";
    assert!(source.parse::<AppConfig>().is_err());

    let source = "server { listen 0; }";
    assert!(source.parse::<AppConfig>().is_err());
}

#[test]
fn test_empty_config_is_an_error() {
    assert!("".parse::<AppConfig>().is_err());
    assert!("# only a comment\n".parse::<AppConfig>().is_err());
}

#[test]
fn test_server_without_port_is_an_error() {
    let source = "server { host 127.0.0.1; }";
    let err = source.parse::<AppConfig>().unwrap_err();
    assert!(err.message.contains("listen port"), "got: {}", err.message);
}

#[test]
fn test_duplicate_location_is_an_error() {
    let source = "server { listen 8080; location / { root /a; } location / { root /b; } }";
    let err = source.parse::<AppConfig>().unwrap_err();
    assert!(err.message.contains("duplicate"), "got: {}", err.message);
}

#[test]
fn test_cgi_requires_both_directives() {
    let source = "server { listen 8080; location / { cgi_pass /usr/bin/python3; } }";
    let err = source.parse::<AppConfig>().unwrap_err();
    assert!(err.message.contains("cgi"), "got: {}", err.message);
}

#[test]
fn test_upload_requires_store() {
    let source = "server { listen 8080; location / { upload_enable on; } }";
    let err = source.parse::<AppConfig>().unwrap_err();
    assert!(err.message.contains("upload"), "got: {}", err.message);
}

#[test]
fn test_comments_are_ignored() {
    let source = "# leading\nserver { # inline\n listen 8080; # trailing\n location / { root /srv; } }";
    let config: AppConfig = source.parse().unwrap();
    assert_eq!(config.servers[0].ports, vec![8080]);
}

#[test]
fn test_server_lookup() {
    let source = r#"
server { listen 127.0.0.1:8080; server_name one; location / { root /a; } }
server { listen 127.0.0.1:8080; server_name two; location / { root /b; } }
"#;
    let config: AppConfig = source.parse().unwrap();

    let by_name = config.server_for("127.0.0.1", 8080, "two").unwrap();
    assert_eq!(by_name.routes[0].root, "/b");

    // unknown name and empty name both land on the default (first declared)
    let default = config.server_for("127.0.0.1", 8080, "nope").unwrap();
    assert_eq!(default.routes[0].root, "/a");
    let default = config.default_server("127.0.0.1", 8080).unwrap();
    assert_eq!(default.routes[0].root, "/a");

    assert!(config.default_server("127.0.0.1", 9999).is_none());
}

#[test]
fn test_autoindex_value_must_be_on_or_off() {
    let source = "server { listen 8080; location / { autoindex maybe; } }";
    assert!(source.parse::<AppConfig>().is_err());
}
