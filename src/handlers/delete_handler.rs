use crate::prelude::*;

use super::{handle_error, resolve_path};

pub fn handle_delete(
    request: &HttpRequest,
    route: &RouteConfig,
    server: &Arc<ServerConfig>,
) -> HttpResponse {
    let path = resolve_path(&request.path, route);
    debug!("attempting to delete: {}", path.display());

    let Ok(metadata) = fs::metadata(&path) else {
        return handle_error(
            HTTP_NOT_FOUND,
            &format!(
                "The requested URL {} was not found on this server.",
                request.path
            ),
            Some(server),
        );
    };

    if metadata.is_dir() {
        return handle_error(HTTP_FORBIDDEN, "Cannot delete directories", Some(server));
    }

    // Mode-based check: effective-uid `access()` reports writable for root
    // even on read-only files.
    if metadata.permissions().readonly() {
        return handle_error(
            HTTP_FORBIDDEN,
            "Permission denied: cannot delete file",
            Some(server),
        );
    }

    match fs::remove_file(&path) {
        Ok(()) => {
            info!("deleted file: {}", path.display());
            let mut response = HttpResponse::new(HTTP_NO_CONTENT);
            response.set_keep_alive(false);
            response
        }
        Err(e) => match e.kind() {
            ErrorKind::PermissionDenied => handle_error(
                HTTP_FORBIDDEN,
                "Permission denied: cannot delete file",
                Some(server),
            ),
            _ => handle_error(
                HTTP_INTERNAL_SERVER_ERROR,
                "Failed to delete file",
                Some(server),
            ),
        },
    }
}
