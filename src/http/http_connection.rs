use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    ReadingRequest,
    Processing,
    WritingResponse,
    Closing,
}

#[derive(Debug)]
pub struct HttpConnection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub server: Arc<ServerConfig>,
    pub state: ConnState,
    pub read_buffer: Vec<u8>,
    pub write_buffer: Vec<u8>,
    pub write_offset: usize,
    pub last_activity: Instant,
    pub should_close: bool,
}

impl HttpConnection {
    pub fn new(stream: TcpStream, peer: SocketAddr, server: Arc<ServerConfig>) -> Self {
        Self {
            stream,
            peer,
            server,
            state: ConnState::ReadingRequest,
            read_buffer: Vec::with_capacity(READ_BUF_SIZE),
            write_buffer: Vec::new(),
            write_offset: 0,
            last_activity: Instant::now(),
            should_close: false,
        }
    }

    /// Poll interest follows the state machine: read while a request is
    /// incoming, write while a response is going out, both mid-processing.
    pub fn interests(&self) -> Interest {
        match self.state {
            ConnState::ReadingRequest => Interest::READABLE,
            ConnState::WritingResponse => Interest::WRITABLE,
            ConnState::Processing => Interest::READABLE | Interest::WRITABLE,
            ConnState::Closing => Interest::READABLE,
        }
    }

    /// The event loop drops the connection once this reports true; a queued
    /// response is always flushed first.
    pub fn wants_close(&self) -> bool {
        self.should_close && self.state != ConnState::WritingResponse
    }

    pub fn handle_readable(&mut self) {
        let mut buf = [0u8; READ_BUF_SIZE];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    // Peer closed its end; anything already buffered still
                    // gets parsed and answered before we drop the socket.
                    debug!("peer closed connection ({})", self.peer);
                    self.should_close = true;
                    break;
                }
                Ok(n) => {
                    self.read_buffer.extend_from_slice(&buf[..n]);
                    self.touch();
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("read error on {}: {}", self.peer, e);
                    self.should_close = true;
                    return;
                }
            }
        }

        if self.state == ConnState::ReadingRequest
            && find_subsequence(&self.read_buffer, b"\r\n\r\n", 0).is_some()
        {
            self.process_request();
            // The socket is usually writable right away; flush eagerly
            // instead of waiting for the next poll cycle.
            if self.state == ConnState::WritingResponse {
                self.handle_writable();
            }
        }
    }

    fn process_request(&mut self) {
        self.state = ConnState::Processing;

        let request = match HttpRequest::parse(&self.read_buffer) {
            Ok(request) => request,
            Err(ParseError::Incomplete) => {
                self.state = ConnState::ReadingRequest;
                return;
            }
            Err(e) => {
                warn!("failed to parse request from {}: {}", self.peer, e);
                let response = handle_error(HTTP_BAD_REQUEST, &e.to_string(), Some(&self.server));
                self.should_close = true;
                self.queue_response(response);
                return;
            }
        };

        let limit = self.server.client_max_body_size;
        let declared_too_large = request.content_length().is_some_and(|len| len > limit);
        if declared_too_large || request.body.len() > limit {
            let response = handle_error(
                HTTP_PAYLOAD_TOO_LARGE,
                "Request body exceeds the configured limit",
                Some(&self.server),
            );
            self.should_close = true;
            self.queue_response(response);
            return;
        }

        if !request.complete {
            // Chunked uploads have no up-front length; cap what we buffer.
            if request.chunked && self.read_buffer.len() > limit + MAX_URI_LENGTH {
                let response = handle_error(
                    HTTP_PAYLOAD_TOO_LARGE,
                    "Request body exceeds the configured limit",
                    Some(&self.server),
                );
                self.should_close = true;
                self.queue_response(response);
                return;
            }
            self.state = ConnState::ReadingRequest;
            return;
        }

        info!("{} {} from {}", request.method, request.path, self.peer);
        let response = handle_request(&request, &self.server);
        self.queue_response(response);
    }

    fn queue_response(&mut self, mut response: HttpResponse) {
        // One request per connection; keep-alive is parsed but not honored.
        response.set_keep_alive(false);
        self.write_buffer = response.to_bytes();
        self.write_offset = 0;
        self.state = ConnState::WritingResponse;
    }

    pub fn handle_writable(&mut self) {
        if self.state != ConnState::WritingResponse {
            return;
        }

        while self.write_offset < self.write_buffer.len() {
            match self.stream.write(&self.write_buffer[self.write_offset..]) {
                Ok(0) => break,
                Ok(n) => {
                    self.write_offset += n;
                    self.touch();
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("write error on {}: {}", self.peer, e);
                    self.state = ConnState::Closing;
                    self.should_close = true;
                    return;
                }
            }
        }

        if self.write_offset >= self.write_buffer.len() {
            debug!(
                "response complete ({} bytes to {})",
                self.write_buffer.len(),
                self.peer
            );
            self.state = ConnState::Closing;
            self.should_close = true;
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}
