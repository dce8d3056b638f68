use webserv::multipart::parse_multipart;

#[test]
fn test_single_file_part() {
    let body = b"--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nHELLO\r\n--B--\r\n";
    let files = parse_multipart(body, "B");

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "a.txt");
    assert_eq!(files[0].content_type, "text/plain");
    assert_eq!(files[0].content, b"HELLO");
}

#[test]
fn test_two_files_in_order() {
    let body = b"--sep\r\nContent-Disposition: form-data; name=\"a\"; filename=\"one.txt\"\r\nContent-Type: text/plain\r\n\r\nfirst\r\n--sep\r\nContent-Disposition: form-data; name=\"b\"; filename=\"two.bin\"\r\nContent-Type: application/octet-stream\r\n\r\nsecond\r\n--sep--\r\n";
    let files = parse_multipart(body, "sep");

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].filename, "one.txt");
    assert_eq!(files[0].content, b"first");
    assert_eq!(files[1].filename, "two.bin");
    assert_eq!(files[1].content, b"second");
}

#[test]
fn test_form_field_without_filename_is_ignored() {
    let body = b"--B\r\nContent-Disposition: form-data; name=\"field\"\r\n\r\nvalue\r\n--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"keep.txt\"\r\n\r\ndata\r\n--B--\r\n";
    let files = parse_multipart(body, "B");

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "keep.txt");
    assert_eq!(files[0].content, b"data");
}

#[test]
fn test_lf_lf_separator_tolerated() {
    let body = b"--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"x.txt\"\nContent-Type: text/plain\n\npayload\r\n--B--\r\n";
    let files = parse_multipart(body, "B");

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, b"payload");
}

#[test]
fn test_default_content_type() {
    let body = b"--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"raw\"\r\n\r\nbits\r\n--B--\r\n";
    let files = parse_multipart(body, "B");

    assert_eq!(files[0].content_type, "application/octet-stream");
}

#[test]
fn test_binary_content_with_crlf_inside() {
    // CRLF inside the payload must survive; only the final CRLF before the
    // boundary is framing.
    let body = b"--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"b.bin\"\r\n\r\nline1\r\nline2\r\n--B--\r\n";
    let files = parse_multipart(body, "B");

    assert_eq!(files[0].content, b"line1\r\nline2");
}

#[test]
fn test_garbage_without_boundary() {
    assert!(parse_multipart(b"no delimiters here", "B").is_empty());
    assert!(parse_multipart(b"", "B").is_empty());
}
