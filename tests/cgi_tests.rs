use webserv::prelude::*;

fn tmp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("webserv_cgi_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn sh_route() -> RouteConfig {
    RouteConfig {
        path: "/cgi".to_string(),
        methods: vec!["GET".to_string(), "POST".to_string()],
        cgi_enabled: true,
        cgi_path: "/bin/sh".to_string(),
        cgi_ext: ".sh".to_string(),
        ..Default::default()
    }
}

fn server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        ports: vec![8080],
        server_names: vec!["cgihost".to_string()],
        ..Default::default()
    }
}

fn post_with_body(path: &str, body: &str) -> HttpRequest {
    let raw = format!(
        "POST {} HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    );
    HttpRequest::parse(raw.as_bytes()).unwrap()
}

#[test]
fn test_parse_cgi_output_with_status_line() {
    let raw = b"Status: 202 Accepted\r\nContent-Type: text/plain\r\n\r\nok";
    let response = cgi::parse_cgi_output(raw);

    assert_eq!(response.status_code, 202);
    assert_eq!(response.status_text, "Accepted"); // reason from the table
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.body, b"ok");
}

#[test]
fn test_parse_cgi_output_without_separator() {
    let raw = b"just raw bytes, no headers at all";
    let response = cgi::parse_cgi_output(raw);

    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    assert_eq!(response.body, raw.to_vec());
}

#[test]
fn test_parse_cgi_output_lf_only() {
    let raw = b"Content-Type: text/plain\nX-Script: yes\n\nbody here";
    let response = cgi::parse_cgi_output(raw);

    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.header("X-Script"), Some("yes")); // passthrough
    assert_eq!(response.body, b"body here");
}

#[test]
fn test_build_environment() {
    let request = HttpRequest::parse(
        b"POST /cgi/run.sh?x=1&y=2 HTTP/1.1\r\nHost: x\r\nX-Custom: v\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nabcde",
    )
    .unwrap();
    let server = server_config();
    let env = cgi::build_environment(&request, &server, Path::new("/srv/cgi/run.sh"));

    assert_eq!(env.get("REQUEST_METHOD").unwrap(), "POST");
    assert_eq!(env.get("SERVER_PROTOCOL").unwrap(), "HTTP/1.1");
    assert_eq!(env.get("REQUEST_URI").unwrap(), "/cgi/run.sh?x=1&y=2");
    assert_eq!(env.get("QUERY_STRING").unwrap(), "x=1&y=2");
    assert_eq!(env.get("SERVER_PORT").unwrap(), "8080");
    assert_eq!(env.get("SERVER_NAME").unwrap(), "cgihost");
    assert_eq!(env.get("SERVER_SOFTWARE").unwrap(), "webserv/1.0");
    assert_eq!(env.get("GATEWAY_INTERFACE").unwrap(), "CGI/1.1");
    assert_eq!(env.get("SCRIPT_FILENAME").unwrap(), "/srv/cgi/run.sh");
    assert_eq!(env.get("SCRIPT_NAME").unwrap(), "run.sh");
    assert_eq!(env.get("PATH_INFO").unwrap(), "/cgi/run.sh");
    assert_eq!(env.get("PATH_TRANSLATED").unwrap(), "/srv/cgi/run.sh");
    assert_eq!(env.get("CONTENT_TYPE").unwrap(), "text/plain");
    assert_eq!(env.get("CONTENT_LENGTH").unwrap(), "5");
    assert_eq!(env.get("HTTP_X_CUSTOM").unwrap(), "v");
    assert_eq!(env.get("HTTP_HOST").unwrap(), "x");
    assert_eq!(env.get("REMOTE_ADDR").unwrap(), "127.0.0.1");
    assert_eq!(env.get("REMOTE_HOST").unwrap(), "localhost");

    // Content-Type/Content-Length never show up twice.
    assert!(!env.contains_key("HTTP_CONTENT_TYPE"));
    assert!(!env.contains_key("HTTP_CONTENT_LENGTH"));
}

#[test]
fn test_execute_script_with_status() {
    let dir = tmp_dir("status");
    let script = dir.join("status.sh");
    fs::write(
        &script,
        "printf 'Status: 202 Accepted\\r\\nContent-Type: text/plain\\r\\n\\r\\n'\nprintf 'ok'\n",
    )
    .unwrap();

    let request = post_with_body("/cgi/status.sh", "abcde");
    let response = cgi::execute(&request, &server_config(), &sh_route(), &script);

    assert_eq!(response.status_code, 202);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.body, b"ok");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_execute_script_reads_stdin() {
    let dir = tmp_dir("stdin");
    let script = dir.join("echo.sh");
    // Absolute path: the CGI environment is constructed from scratch and
    // carries no PATH.
    fs::write(&script, "printf 'Content-Type: text/plain\\n\\n'\n/bin/cat\n").unwrap();

    let request = post_with_body("/cgi/echo.sh", "abcde");
    let response = cgi::execute(&request, &server_config(), &sh_route(), &script);

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"abcde");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_execute_script_sees_environment() {
    let dir = tmp_dir("env");
    let script = dir.join("env.sh");
    fs::write(
        &script,
        "printf 'Content-Type: text/plain\\n\\n'\nprintf '%s-%s' \"$REQUEST_METHOD\" \"$QUERY_STRING\"\n",
    )
    .unwrap();

    let raw = "POST /cgi/env.sh?k=v HTTP/1.1\r\nHost: x\r\nContent-Length: 0\r\n\r\n";
    let request = HttpRequest::parse(raw.as_bytes()).unwrap();
    let response = cgi::execute(&request, &server_config(), &sh_route(), &script);

    assert_eq!(response.body, b"POST-k=v");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_execute_headerless_script_output() {
    let dir = tmp_dir("headerless");
    let script = dir.join("raw.sh");
    fs::write(&script, "printf 'raw output with no header block'\n").unwrap();

    let request = post_with_body("/cgi/raw.sh", "");
    let response = cgi::execute(&request, &server_config(), &sh_route(), &script);

    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    assert_eq!(response.body, b"raw output with no header block");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_execute_timeout_kills_child() {
    let dir = tmp_dir("timeout");
    let script = dir.join("slow.sh");
    fs::write(&script, "/bin/sleep 5\nprintf 'too late'\n").unwrap();

    let request = post_with_body("/cgi/slow.sh", "");
    let started = Instant::now();
    let response = cgi::execute_with_timeout(
        &request,
        &server_config(),
        &sh_route(),
        &script,
        Duration::from_millis(500),
    );

    assert_eq!(response.status_code, 500);
    let body = String::from_utf8_lossy(&response.body).into_owned();
    assert!(body.contains("CGI timeout"), "got: {}", body);
    assert!(started.elapsed() < Duration::from_secs(4));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_execute_missing_interpreter_is_500() {
    let dir = tmp_dir("no_interp");
    let script = dir.join("x.sh");
    fs::write(&script, "printf 'never runs'\n").unwrap();

    let mut route = sh_route();
    route.cgi_path = "/no/such/interpreter".to_string();

    let request = post_with_body("/cgi/x.sh", "");
    let response = cgi::execute(&request, &server_config(), &route, &script);
    assert_eq!(response.status_code, 500);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_get_dispatches_to_cgi() {
    let dir = tmp_dir("dispatch");
    let script = dir.join("hello.sh");
    fs::write(
        &script,
        "printf 'Content-Type: text/plain\\n\\n'\nprintf 'hello from cgi'\n",
    )
    .unwrap();

    let mut route = sh_route();
    route.path = "/".to_string();
    route.root = dir.to_string_lossy().into_owned();
    let server = Arc::new(ServerConfig {
        ports: vec![8080],
        routes: vec![route],
        ..Default::default()
    });

    let raw = "GET /hello.sh HTTP/1.1\r\nHost: x\r\n\r\n";
    let request = HttpRequest::parse(raw.as_bytes()).unwrap();
    let response = handle_request(&request, &server);

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"hello from cgi");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_get_missing_cgi_script_is_404() {
    let dir = tmp_dir("missing_script");
    let mut route = sh_route();
    route.path = "/".to_string();
    route.root = dir.to_string_lossy().into_owned();
    let server = Arc::new(ServerConfig {
        ports: vec![8080],
        routes: vec![route],
        ..Default::default()
    });

    let raw = "GET /ghost.sh HTTP/1.1\r\nHost: x\r\n\r\n";
    let request = HttpRequest::parse(raw.as_bytes()).unwrap();
    let response = handle_request(&request, &server);
    assert_eq!(response.status_code, 404);

    fs::remove_dir_all(&dir).unwrap();
}
