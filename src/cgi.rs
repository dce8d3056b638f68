use crate::prelude::*;

const CGI_POLL_INTERVAL: Duration = Duration::from_millis(10);
const CGI_READ_BUF: usize = 4096;

enum CgiOutcome {
    Finished(Vec<u8>),
    TimedOut,
}

/// Runs the route's interpreter on the resolved script and turns its CGI
/// document response into an `HttpResponse`. Blocks the caller until the
/// child finishes or the deadline expires.
pub fn execute(
    request: &HttpRequest,
    server: &ServerConfig,
    route: &RouteConfig,
    script_path: &Path,
) -> HttpResponse {
    execute_with_timeout(request, server, route, script_path, CGI_TIMEOUT)
}

pub fn execute_with_timeout(
    request: &HttpRequest,
    server: &ServerConfig,
    route: &RouteConfig,
    script_path: &Path,
    timeout: Duration,
) -> HttpResponse {
    info!("executing CGI script: {}", script_path.display());

    let Some(script_name) = script_path.file_name() else {
        return HttpResponse::error_response(HTTP_INTERNAL_SERVER_ERROR, "Invalid CGI script path");
    };
    let script_dir = match script_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let environment = build_environment(request, server, script_path);

    // One socketpair per direction; our ends go non-blocking, the child's
    // ends become its stdin/stdout.
    let Ok((stdin_ours, stdin_child)) = UnixStream::pair() else {
        return HttpResponse::error_response(
            HTTP_INTERNAL_SERVER_ERROR,
            "Failed to create pipes for CGI",
        );
    };
    let Ok((stdout_ours, stdout_child)) = UnixStream::pair() else {
        return HttpResponse::error_response(
            HTTP_INTERNAL_SERVER_ERROR,
            "Failed to create pipes for CGI",
        );
    };
    if stdin_ours.set_nonblocking(true).is_err() || stdout_ours.set_nonblocking(true).is_err() {
        return HttpResponse::error_response(
            HTTP_INTERNAL_SERVER_ERROR,
            "Failed to configure CGI pipes",
        );
    }

    let stdin_child = unsafe { File::from_raw_fd(stdin_child.into_raw_fd()) };
    let stdout_child = unsafe { File::from_raw_fd(stdout_child.into_raw_fd()) };

    let spawned = Command::new(&route.cgi_path)
        .arg(script_name)
        .current_dir(script_dir)
        .env_clear()
        .envs(environment)
        .stdin(Stdio::from(stdin_child))
        .stdout(Stdio::from(stdout_child))
        .stderr(Stdio::inherit())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            error!("failed to spawn CGI interpreter {}: {}", route.cgi_path, e);
            return HttpResponse::error_response(
                HTTP_INTERNAL_SERVER_ERROR,
                "Failed to spawn CGI process",
            );
        }
    };

    let output = match supervise(&mut child, stdin_ours, stdout_ours, &request.body, timeout) {
        CgiOutcome::Finished(output) => output,
        CgiOutcome::TimedOut => {
            warn!("CGI timeout - killing process");
            return HttpResponse::error_response(HTTP_INTERNAL_SERVER_ERROR, "CGI timeout");
        }
    };

    match child.wait() {
        Ok(status) => info!("CGI exited with status: {}", status),
        Err(e) => error!("failed to reap CGI child: {}", e),
    }

    if output.is_empty() {
        return HttpResponse::error_response(HTTP_INTERNAL_SERVER_ERROR, "CGI produced no output");
    }

    parse_cgi_output(&output)
}

/// Pumps the request body into the child's stdin and drains its stdout,
/// interleaved so a script that writes before consuming stdin cannot wedge
/// on a full pipe. Sleeps between polls when neither side is ready.
fn supervise(
    child: &mut Child,
    stdin: UnixStream,
    mut stdout: UnixStream,
    body: &[u8],
    timeout: Duration,
) -> CgiOutcome {
    let start = Instant::now();
    let mut stdin = Some(stdin);
    let mut written = 0;
    let mut output = Vec::new();
    let mut buf = [0u8; CGI_READ_BUF];

    loop {
        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            return CgiOutcome::TimedOut;
        }

        if let Some(pipe) = stdin.as_mut() {
            if written < body.len() {
                match pipe.write(&body[written..]) {
                    Ok(0) => stdin = None,
                    Ok(n) => written += n,
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(_) => stdin = None, // child stopped reading
                }
            }
            if written >= body.len() {
                stdin = None; // drop signals EOF
            }
        }

        match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                output.extend_from_slice(&buf[..n]);
                continue;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                match child.try_wait() {
                    Ok(Some(_)) => {
                        // Child exited; drain whatever is left in the pipe.
                        while let Ok(n) = stdout.read(&mut buf) {
                            if n == 0 {
                                break;
                            }
                            output.extend_from_slice(&buf[..n]);
                        }
                        break;
                    }
                    Ok(None) => std::thread::sleep(CGI_POLL_INTERVAL),
                    Err(_) => break,
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }

    CgiOutcome::Finished(output)
}

/// RFC 3875 environment for the child process.
pub fn build_environment(
    request: &HttpRequest,
    server: &ServerConfig,
    script_path: &Path,
) -> HashMap<String, String> {
    let mut env = HashMap::new();

    env.insert("REQUEST_METHOD".to_string(), request.method.to_string());
    env.insert("SERVER_PROTOCOL".to_string(), request.version.clone());
    env.insert("REQUEST_URI".to_string(), request.uri.clone());
    env.insert("QUERY_STRING".to_string(), request.query.clone());

    env.insert(
        "SERVER_PORT".to_string(),
        server
            .ports
            .first()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "8080".to_string()),
    );
    env.insert(
        "SERVER_NAME".to_string(),
        server
            .server_names
            .first()
            .cloned()
            .unwrap_or_else(|| server.host.clone()),
    );
    env.insert("SERVER_SOFTWARE".to_string(), SERVER_SOFTWARE.to_string());
    env.insert("GATEWAY_INTERFACE".to_string(), "CGI/1.1".to_string());

    let script = script_path.display().to_string();
    env.insert("SCRIPT_FILENAME".to_string(), script.clone());
    env.insert(
        "SCRIPT_NAME".to_string(),
        script_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    // PATH_INFO carries the full request path, not the post-script suffix.
    env.insert("PATH_INFO".to_string(), request.path.clone());
    env.insert("PATH_TRANSLATED".to_string(), script);

    if let Some(content_type) = request.header("content-type") {
        env.insert("CONTENT_TYPE".to_string(), content_type.to_string());
    }
    env.insert("CONTENT_LENGTH".to_string(), request.body.len().to_string());

    for (name, value) in &request.headers {
        let env_name = format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"));
        if env_name == "HTTP_CONTENT_TYPE" || env_name == "HTTP_CONTENT_LENGTH" {
            continue;
        }
        env.insert(env_name, value.clone());
    }

    env.insert("REMOTE_ADDR".to_string(), "127.0.0.1".to_string());
    env.insert("REMOTE_HOST".to_string(), "localhost".to_string());

    env
}

/// CGI document response: headers, blank line, body. `Status:` sets the
/// response code (its reason phrase is discarded), `Content-Type:` is
/// propagated, everything else passes through verbatim. Output with no
/// header/body separator is served whole as `text/html`.
pub fn parse_cgi_output(raw: &[u8]) -> HttpResponse {
    let (header_end, separator_len) = match find_subsequence(raw, b"\r\n\r\n", 0) {
        Some(pos) => (pos, 4),
        None => match find_subsequence(raw, b"\n\n", 0) {
            Some(pos) => (pos, 2),
            None => {
                let mut response = HttpResponse::new(HTTP_OK);
                response.set_body(raw.to_vec(), "text/html");
                response.set_keep_alive(false);
                return response;
            }
        },
    };

    let head = String::from_utf8_lossy(&raw[..header_end]);
    let body = raw[header_end + separator_len..].to_vec();

    let mut response = HttpResponse::new(HTTP_OK);
    let mut status = HTTP_OK;
    let mut content_type = "text/html".to_string();

    for line in head.lines() {
        let line = line.trim_end_matches('\r');
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("status") {
            status = value
                .split_whitespace()
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_OK);
        } else if name.eq_ignore_ascii_case("content-type") {
            content_type = value.to_string();
        } else {
            response.set_header(name, value);
        }
    }

    response.set_status(status);
    response.set_body(body, &content_type);
    response.set_keep_alive(false);
    response
}
