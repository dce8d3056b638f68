pub mod delete_handler;
pub mod get_handler;
pub mod post_handler;

pub use delete_handler::handle_delete;
pub use get_handler::handle_get;
pub use post_handler::handle_post;

use crate::prelude::*;

/// Top-level dispatch: unrecognized method, route match, method permission,
/// redirect, then the method-specific handler.
pub fn handle_request(request: &HttpRequest, server: &Arc<ServerConfig>) -> HttpResponse {
    if let Method::Other(name) = &request.method {
        warn!("unknown method: {}", name);
        return handle_error(
            HTTP_NOT_IMPLEMENTED,
            &format!("Method {} is not implemented.", name),
            Some(server),
        );
    }

    let Some(route) = server.find_route(&request.path) else {
        warn!("no route found for path: {}", request.path);
        return handle_error(
            HTTP_NOT_FOUND,
            &format!(
                "The requested URL {} was not found on this server.",
                request.path
            ),
            Some(server),
        );
    };

    if !route.allows_method(request.method.as_str()) {
        warn!(
            "method {} not allowed for path: {}",
            request.method, request.path
        );
        return handle_error(
            HTTP_METHOD_NOT_ALLOWED,
            &format!("Method {} is not allowed for this resource.", request.method),
            Some(server),
        );
    }

    if let Some(redirect) = &route.redirect {
        info!("redirecting {} to {}", request.path, redirect);
        return HttpResponse::redirect(redirect, HTTP_MOVED_PERMANENTLY);
    }

    match request.method {
        Method::GET => handle_get(request, route, server),
        Method::POST => handle_post(request, route, server),
        Method::DELETE => handle_delete(request, route, server),
        Method::Other(_) => handle_error(HTTP_NOT_IMPLEMENTED, "", Some(server)),
    }
}

/// Route prefix stripped from the request path, remainder joined to the
/// route's filesystem root.
pub fn resolve_path(request_path: &str, route: &RouteConfig) -> PathBuf {
    let relative = request_path
        .strip_prefix(route.path.as_str())
        .unwrap_or(request_path);

    let mut full = PathBuf::from(&route.root);
    full.push(relative.trim_start_matches('/'));
    full
}

/// Error responses honor a configured `error_page` when its file is
/// readable; otherwise the built-in HTML page is used.
pub fn handle_error(code: u16, message: &str, server: Option<&ServerConfig>) -> HttpResponse {
    if let Some(config) = server {
        if let Some(page) = config.error_pages.get(&code) {
            if let Ok(content) = fs::read(page) {
                let mut response = HttpResponse::new(code);
                response.set_body(content, "text/html");
                response.set_keep_alive(false);
                return response;
            }
        }
    }
    HttpResponse::error_response(code, message)
}

/// Extension comparison for CGI dispatch, leading dot normalized on both
/// sides.
pub fn extension_matches(path: &Path, cgi_ext: &str) -> bool {
    if cgi_ext.is_empty() {
        return false;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = format!(".{}", ext);
    let cgi_ext = if cgi_ext.starts_with('.') {
        cgi_ext.to_string()
    } else {
        format!(".{}", cgi_ext)
    };
    ext == cgi_ext
}
