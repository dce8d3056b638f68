use crate::prelude::*;

use super::{extension_matches, handle_error, resolve_path};

pub fn handle_get(
    request: &HttpRequest,
    route: &RouteConfig,
    server: &Arc<ServerConfig>,
) -> HttpResponse {
    let mut path = resolve_path(&request.path, route);
    debug!("resolved file path: {}", path.display());

    if route.cgi_enabled && extension_matches(&path, &route.cgi_ext) {
        if path.is_file() {
            return cgi::execute(request, server, route, &path);
        }
        return not_found(&request.path, server);
    }

    if !path.exists() {
        return not_found(&request.path, server);
    }

    if path.is_dir() {
        for index in &route.index_files {
            let candidate = path.join(index);
            if candidate.is_file() {
                path = candidate;
                break;
            }
        }
    }

    if path.is_dir() {
        if route.autoindex {
            let listing = generate_autoindex(&path, &request.path);
            let mut response = HttpResponse::new(HTTP_OK);
            response.set_body(listing.into_bytes(), "text/html");
            response.set_keep_alive(false);
            return response;
        }
        return handle_error(HTTP_FORBIDDEN, "Directory listing is disabled", Some(server));
    }

    serve_file(request, &path, server)
}

fn serve_file(request: &HttpRequest, path: &Path, server: &Arc<ServerConfig>) -> HttpResponse {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            return match e.kind() {
                ErrorKind::NotFound => not_found(&request.path, server),
                ErrorKind::PermissionDenied => {
                    handle_error(HTTP_FORBIDDEN, "Permission denied", Some(server))
                }
                _ => handle_error(
                    HTTP_INTERNAL_SERVER_ERROR,
                    "Failed to read file",
                    Some(server),
                ),
            };
        }
    };

    let mut response = HttpResponse::new(HTTP_OK);

    if let Ok(metadata) = fs::metadata(path) {
        let etag = generate_etag(&metadata);

        // Conditional request short-circuit on a matching validator.
        if let Some(client_etag) = request.header("if-none-match") {
            if client_etag == format!("\"{}\"", etag) {
                let mut not_modified = HttpResponse::new(HTTP_NOT_MODIFIED);
                not_modified.set_keep_alive(false);
                return not_modified;
            }
        }

        if let Ok(modified) = metadata.modified() {
            response.set_last_modified(modified);
        }
        response.set_etag(&etag);
        response.set_cache_control("public, max-age=3600");
    }

    let extension = path.extension().and_then(|e| e.to_str());
    let size = content.len();
    response.set_body(content, mime_type(extension));
    response.set_keep_alive(false);

    info!("served file: {} ({} bytes)", path.display(), size);
    response
}

fn generate_etag(metadata: &fs::Metadata) -> String {
    format!(
        "{:x}-{:x}-{:x}",
        metadata.ino(),
        metadata.mtime(),
        metadata.size()
    )
}

fn not_found(request_path: &str, server: &Arc<ServerConfig>) -> HttpResponse {
    handle_error(
        HTTP_NOT_FOUND,
        &format!(
            "The requested URL {} was not found on this server.",
            request_path
        ),
        Some(server),
    )
}
