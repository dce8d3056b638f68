use crate::prelude::*;

#[derive(Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub chunked: bool,
}

impl HttpResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            status_text: status_text(status_code).to_string(),
            headers: Vec::new(),
            body: Vec::new(),
            chunked: false,
        }
    }

    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.status_text = status_text(code).to_string();
        self
    }

    /// Headers keep insertion order on the wire; setting an existing name
    /// replaces its value in place.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            slot.1 = value.to_string();
        } else {
            self.headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_body(&mut self, body: Vec<u8>, content_type: &str) -> &mut Self {
        self.set_header("Content-Type", content_type);
        if !self.chunked {
            let length = body.len().to_string();
            self.set_header("Content-Length", &length);
        }
        self.body = body;
        self
    }

    /// Chunked framing and `Content-Length` are mutually exclusive.
    pub fn set_chunked(&mut self) -> &mut Self {
        self.chunked = true;
        self.remove_header("Content-Length");
        self.set_header("Transfer-Encoding", "chunked");
        self
    }

    pub fn set_last_modified(&mut self, mtime: SystemTime) -> &mut Self {
        self.set_header("Last-Modified", &httpdate::fmt_http_date(mtime))
    }

    pub fn set_etag(&mut self, tag: &str) -> &mut Self {
        self.set_header("ETag", &format!("\"{}\"", tag))
    }

    pub fn set_cache_control(&mut self, value: &str) -> &mut Self {
        self.set_header("Cache-Control", value)
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) -> &mut Self {
        self.set_header("Connection", if keep_alive { "keep-alive" } else { "close" })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {} {}\r\n", self.status_code, self.status_text).into_bytes();

        let mut wrote_length = false;
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-length") {
                wrote_length = true;
            }
            out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        if !self.chunked && !wrote_length {
            out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }
        out.extend_from_slice(b"\r\n");

        if self.chunked {
            if !self.body.is_empty() {
                out.extend_from_slice(format!("{:x}\r\n", self.body.len()).as_bytes());
                out.extend_from_slice(&self.body);
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(b"0\r\n\r\n");
        } else {
            out.extend_from_slice(&self.body);
        }

        out
    }

    pub fn error_response(code: u16, message: &str) -> HttpResponse {
        let mut response = HttpResponse::new(code);
        let reason = status_text(code);

        let mut body = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{code} {reason}</title></head>\n<body>\n<h1>{code} {reason}</h1>\n"
        );
        if !message.is_empty() {
            body.push_str(&format!("<p>{message}</p>\n"));
        }
        body.push_str("<hr>\n<p><em>webserv/1.0</em></p>\n</body>\n</html>\n");

        response.set_body(body.into_bytes(), "text/html");
        response.set_keep_alive(false);
        response
    }

    pub fn redirect(location: &str, code: u16) -> HttpResponse {
        let mut response = HttpResponse::new(code);
        response.set_header("Location", location);

        let body = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>Redirecting...</title></head>\n<body>\n<h1>Redirecting...</h1>\n<p>You are being redirected to <a href=\"{location}\">{location}</a></p>\n</body>\n</html>\n"
        );
        response.set_body(body.into_bytes(), "text/html");
        response
    }
}

pub fn status_text(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        411 => "Length Required",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "Unknown",
    }
}

pub fn mime_type(extension: Option<&str>) -> &'static str {
    match extension {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// Directory-listing page: `Index of <path>`, parent link when not at the
/// root, directories rendered with a trailing slash. Entry order follows
/// the directory iterator.
pub fn generate_autoindex(dir: &Path, request_path: &str) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Index of {0}</title></head>\n<body>\n<h1>Index of {0}</h1>\n<hr>\n<ul>\n",
        request_path
    );

    if request_path != "/" {
        html.push_str("<li><a href=\"../\">../</a></li>\n");
    }

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                html.push_str(&format!("<li><a href=\"{0}/\">{0}/</a></li>\n", name));
            } else {
                html.push_str(&format!("<li><a href=\"{0}\">{0}</a></li>\n", name));
            }
        }
    }

    html.push_str("</ul>\n<hr>\n<p><em>webserv/1.0</em></p>\n</body>\n</html>\n");
    html
}
