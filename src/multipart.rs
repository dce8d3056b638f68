use crate::prelude::*;

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Splits a `multipart/form-data` body on `--boundary` markers, terminated
/// by `--boundary--`. Parts without a `filename` in `Content-Disposition`
/// are form fields and are skipped.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Vec<UploadedFile> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut files = Vec::new();

    let Some(mut pos) = find_subsequence(body, &delimiter, 0) else {
        return files;
    };

    loop {
        pos += delimiter.len();

        if body.get(pos..pos + 2) == Some(&b"--"[..]) {
            break; // closing delimiter
        }
        if body.get(pos..pos + 2) == Some(&b"\r\n"[..]) {
            pos += 2;
        } else if body.get(pos) == Some(&b'\n') {
            pos += 1;
        }

        let Some(next) = find_subsequence(body, &delimiter, pos) else {
            break;
        };
        if let Some(file) = parse_part(&body[pos..next]) {
            files.push(file);
        }
        pos = next;
    }

    files
}

fn parse_part(part: &[u8]) -> Option<UploadedFile> {
    // LF LF separators are tolerated alongside the canonical CRLF CRLF.
    let (header_end, separator_len) = match find_subsequence(part, b"\r\n\r\n", 0) {
        Some(pos) => (pos, 4),
        None => (find_subsequence(part, b"\n\n", 0)?, 2),
    };

    let headers = String::from_utf8_lossy(&part[..header_end]);
    let mut content = &part[header_end + separator_len..];

    // The CRLF immediately before the next boundary belongs to the framing,
    // not to the captured content.
    if content.ends_with(b"\r\n") {
        content = &content[..content.len() - 2];
    } else if content.ends_with(b"\n") {
        content = &content[..content.len() - 1];
    }

    let mut filename: Option<String> = None;
    let mut content_type = "application/octet-stream".to_string();

    for line in headers.lines() {
        if line.starts_with("Content-Disposition") {
            if let Some(start) = line.find("filename=\"") {
                let rest = &line[start + 10..];
                if let Some(end) = rest.find('"') {
                    filename = Some(rest[..end].to_string());
                }
            }
        } else if line.to_ascii_lowercase().starts_with("content-type:") {
            if let Some((_, value)) = line.split_once(':') {
                content_type = value.trim().to_string();
            }
        }
    }

    Some(UploadedFile {
        filename: filename?,
        content_type,
        content: content.to_vec(),
    })
}
