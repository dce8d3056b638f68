use crate::prelude::*;

use super::{extension_matches, handle_error, resolve_path};

// Static assets never accept POST; CGI and uploads take precedence.
const STATIC_EXTENSIONS: [&str; 11] = [
    "html", "htm", "css", "js", "jpg", "jpeg", "png", "gif", "txt", "pdf", "ico",
];

pub fn handle_post(
    request: &HttpRequest,
    route: &RouteConfig,
    server: &Arc<ServerConfig>,
) -> HttpResponse {
    let path = resolve_path(&request.path, route);

    if route.cgi_enabled && extension_matches(&path, &route.cgi_ext) {
        if path.is_file() {
            return cgi::execute(request, server, route, &path);
        }
        return handle_error(
            HTTP_NOT_FOUND,
            &format!(
                "The requested URL {} was not found on this server.",
                request.path
            ),
            Some(server),
        );
    }

    if path.is_file() {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if STATIC_EXTENSIONS.contains(&ext) {
                return handle_error(
                    HTTP_METHOD_NOT_ALLOWED,
                    "Method POST is not allowed for this resource.",
                    Some(server),
                );
            }
        }
    }

    if request.is_multipart() {
        if route.upload_enabled {
            return handle_upload(request, route, server);
        }
        return handle_error(
            HTTP_FORBIDDEN,
            "File upload is not allowed for this resource",
            Some(server),
        );
    }

    if request
        .content_type()
        .contains("application/x-www-form-urlencoded")
    {
        return handle_form_data(request);
    }

    generic_post_response(request)
}

fn handle_upload(
    request: &HttpRequest,
    route: &RouteConfig,
    server: &Arc<ServerConfig>,
) -> HttpResponse {
    let Some(boundary) = request.multipart_boundary() else {
        return handle_error(
            HTTP_BAD_REQUEST,
            "Missing boundary in multipart/form-data",
            Some(server),
        );
    };

    info!("file upload - boundary: {}", boundary);
    let files = parse_multipart(&request.body, &boundary);
    if files.is_empty() {
        return handle_error(HTTP_BAD_REQUEST, "No files found in upload", Some(server));
    }

    let upload_dir = PathBuf::from(&route.upload_dir);
    if let Err(e) = ensure_upload_dir(&upload_dir) {
        error!(
            "failed to create upload directory {}: {}",
            upload_dir.display(),
            e
        );
        return handle_error(
            HTTP_INTERNAL_SERVER_ERROR,
            "Failed to create upload directory",
            Some(server),
        );
    }

    let epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let mut saved = Vec::new();
    for file in &files {
        let target = upload_dir.join(format!("{}_{}", epoch, file.filename));
        match fs::write(&target, &file.content) {
            Ok(()) => {
                info!("saved uploaded file: {}", target.display());
                saved.push(target.display().to_string());
            }
            Err(e) => error!("failed to save {}: {}", target.display(), e),
        }
    }

    if saved.is_empty() {
        return handle_error(
            HTTP_INTERNAL_SERVER_ERROR,
            "Failed to store uploaded files",
            Some(server),
        );
    }

    let mut body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Upload Successful</title></head>\n<body>\n<h1>File Upload Successful</h1>\n<p>{} file(s) uploaded:</p>\n<ul>\n",
        saved.len()
    );
    for path in &saved {
        body.push_str(&format!("<li>{}</li>\n", path));
    }
    body.push_str("</ul>\n</body>\n</html>\n");

    let mut response = HttpResponse::new(HTTP_CREATED);
    response.set_body(body.into_bytes(), "text/html");
    response.set_keep_alive(false);
    response
}

fn ensure_upload_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    match fs::DirBuilder::new().recursive(true).mode(0o755).create(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

fn handle_form_data(request: &HttpRequest) -> HttpResponse {
    let fields = request.form_data();
    info!("form data received with {} fields", fields.len());

    let mut body = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Form Received</title></head>\n<body>\n<h1>Form Data Received</h1>\n<table border='1'>\n<tr><th>Field</th><th>Value</th></tr>\n",
    );
    for (name, value) in &fields {
        body.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>\n", name, value));
    }
    body.push_str("</table>\n</body>\n</html>\n");

    let mut response = HttpResponse::new(HTTP_OK);
    response.set_body(body.into_bytes(), "text/html");
    response.set_keep_alive(false);
    response
}

fn generic_post_response(request: &HttpRequest) -> HttpResponse {
    let mut body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>POST Received</title></head>\n<body>\n<h1>POST Request Received</h1>\n<p>Content-Type: {}</p>\n<p>Body size: {} bytes</p>\n",
        request.content_type(),
        request.body.len()
    );
    if request.chunked {
        body.push_str("<p>Transfer-Encoding: chunked</p>\n");
    }
    body.push_str("</body>\n</html>\n");

    let mut response = HttpResponse::new(HTTP_OK);
    response.set_body(body.into_bytes(), "text/html");
    response.set_keep_alive(false);
    response
}
