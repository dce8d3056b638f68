use crate::prelude::*;
use std::result::Result;

pub const MAX_URI_LENGTH: usize = 8192;
pub const MAX_HEADER_LINE: usize = 8192;
pub const MAX_HEADER_COUNT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    DELETE,
    Other(String),
}

impl Method {
    /// Method tokens are case-sensitive; anything but the three recognized
    /// verbs parses fine and is answered with 501 by the handler later.
    pub fn from_token(token: &str) -> Method {
        match token {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "DELETE" => Method::DELETE,
            _ => Method::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::DELETE => "DELETE",
            Method::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Method::Other(_))
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::GET
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Incomplete,
    MalformedRequestLine,
    UriTooLong,
    HeaderTooLong,
    TooManyHeaders,
    MalformedHeader,
    InvalidChunkSize,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Incomplete => write!(f, "incomplete request"),
            ParseError::MalformedRequestLine => write!(f, "malformed request line"),
            ParseError::UriTooLong => write!(f, "request URI too long"),
            ParseError::HeaderTooLong => write!(f, "header line too long"),
            ParseError::TooManyHeaders => write!(f, "too many headers"),
            ParseError::MalformedHeader => write!(f, "malformed header"),
            ParseError::InvalidChunkSize => write!(f, "invalid chunk size"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Default)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: String,
    pub path: String,
    pub query: String,
    pub version: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub complete: bool,
    pub chunked: bool,
}

impl HttpRequest {
    /// Parses the inbound buffer as far as it goes. `complete` stays false
    /// while body bytes are still outstanding; the connection keeps reading
    /// and re-parses once more data arrives.
    pub fn parse(raw: &[u8]) -> Result<HttpRequest, ParseError> {
        let headers_end =
            find_subsequence(raw, b"\r\n\r\n", 0).ok_or(ParseError::Incomplete)?;
        let head = String::from_utf8_lossy(&raw[..headers_end]);
        let rest = &raw[headers_end + 4..];

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::MalformedRequestLine)?;
        let mut request = Self::parse_request_line(request_line)?;

        let mut count = 0;
        for line in lines {
            if line.len() > MAX_HEADER_LINE {
                return Err(ParseError::HeaderTooLong);
            }
            count += 1;
            if count > MAX_HEADER_COUNT {
                return Err(ParseError::TooManyHeaders);
            }
            let (name, value) = line.split_once(':').ok_or(ParseError::MalformedHeader)?;
            request
                .headers
                .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        // Body framing precedence: chunked, then content-length, then none.
        if request.transfer_encoding_chunked() {
            request.chunked = true;
            match decode_chunked(rest)? {
                Some(body) => {
                    request.body = body;
                    request.complete = true;
                }
                None => request.complete = false,
            }
        } else if let Some(length) = request.content_length() {
            if rest.len() >= length {
                request.body = rest[..length].to_vec();
                request.complete = true;
            } else {
                request.complete = false;
            }
        } else {
            request.complete = true;
        }

        Ok(request)
    }

    fn parse_request_line(line: &str) -> Result<HttpRequest, ParseError> {
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ParseError::MalformedRequestLine);
        }

        let uri = parts[1];
        if uri.len() > MAX_URI_LENGTH {
            return Err(ParseError::UriTooLong);
        }

        let (raw_path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };

        Ok(HttpRequest {
            method: Method::from_token(parts[0]),
            uri: uri.to_string(),
            path: url_decode(raw_path),
            query: query.to_string(),
            version: parts[2].to_string(),
            ..Default::default()
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length")?.trim().parse().ok()
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type().contains("multipart/form-data")
    }

    pub fn multipart_boundary(&self) -> Option<String> {
        self.content_type()
            .split("boundary=")
            .nth(1)
            .map(|b| b.trim().trim_matches('"').to_string())
            .filter(|b| !b.is_empty())
    }

    /// Fields of an `application/x-www-form-urlencoded` body, in order.
    pub fn form_data(&self) -> Vec<(String, String)> {
        if !self
            .content_type()
            .contains("application/x-www-form-urlencoded")
        {
            return Vec::new();
        }
        parse_query_pairs(&self.body)
    }

    /// Query values stay undecoded in `query`; decoding happens here, lazily.
    pub fn query_param(&self, key: &str) -> Option<String> {
        for pair in self.query.split('&') {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            if url_decode(k) == key {
                return Some(url_decode(v));
            }
        }
        None
    }

    pub fn keep_alive(&self) -> bool {
        let connection = self
            .header("connection")
            .unwrap_or("")
            .to_ascii_lowercase();
        if self.version == "HTTP/1.1" {
            connection != "close"
        } else {
            connection == "keep-alive"
        }
    }

    fn transfer_encoding_chunked(&self) -> bool {
        self.header("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false)
    }
}

impl Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.method, self.uri, self.version)?;
        for (name, value) in &self.headers {
            writeln!(f, "  {}: {}", name, value)?;
        }
        writeln!(f, "  body: {} bytes", self.body.len())
    }
}

pub fn url_decode(input: &str) -> String {
    String::from_utf8_lossy(&url_decode_bytes(input.as_bytes())).into_owned()
}

/// `%HH` becomes the raw byte, `+` becomes space; a stray `%` passes through.
pub fn url_decode_bytes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < input.len() => {
                match (hex_value(input[i + 1]), hex_value(input[i + 2])) {
                    (Some(high), Some(low)) => {
                        out.push(high * 16 + low);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    out
}

pub fn url_encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

pub fn parse_query_pairs(raw: &[u8]) -> Vec<(String, String)> {
    let raw = String::from_utf8_lossy(raw);
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (url_decode(key), url_decode(value))
        })
        .collect()
}

/// Decodes a chunked body. `Ok(None)` means the terminating zero-size chunk
/// has not arrived yet; completion is defined by seeing that terminator.
pub fn decode_chunked(raw: &[u8]) -> Result<Option<Vec<u8>>, ParseError> {
    let mut out = Vec::new();
    let mut pos = 0;

    loop {
        let Some(line_end) = find_subsequence(raw, b"\r\n", pos) else {
            return Ok(None);
        };
        let size_line = std::str::from_utf8(&raw[pos..line_end])
            .map_err(|_| ParseError::InvalidChunkSize)?;
        let size_token = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_token, 16)
            .map_err(|_| ParseError::InvalidChunkSize)?;
        pos = line_end + 2;

        if size == 0 {
            return Ok(Some(out));
        }
        if raw.len() < pos + size + 2 {
            return Ok(None);
        }
        out.extend_from_slice(&raw[pos..pos + size]);
        if &raw[pos + size..pos + size + 2] != b"\r\n" {
            return Err(ParseError::InvalidChunkSize);
        }
        pos += size + 2;
    }
}

pub fn find_subsequence(buffer: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || start > buffer.len() {
        return None;
    }
    buffer[start..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + start)
}
