use crate::prelude::*;
use crate::timeouts;

/// The event loop: one poll multiplexing every listener and connection,
/// single-threaded. Connections are keyed by token and owned here.
pub struct Server {
    listeners: HashMap<Token, Listener>,
    connections: HashMap<Token, HttpConnection>,
    next_token: usize,
    running: Arc<AtomicBool>,
}

impl Server {
    pub fn new(config: AppConfig, poll: &Poll) -> Result<Server> {
        // Write errors are surfaced through the event loop instead.
        unsafe { libc::signal(libc::SIGPIPE, libc::SIG_IGN) };

        let servers: Vec<Arc<ServerConfig>> =
            config.servers.into_iter().map(Arc::new).collect();

        let mut listeners = HashMap::new();
        let mut next_token = 0;
        let mut bound: HashSet<(String, u16)> = HashSet::new();

        for server in &servers {
            for &port in &server.ports {
                // One socket per unique host:port; the first server bound to
                // an endpoint is its default.
                if !bound.insert((server.host.clone(), port)) {
                    continue;
                }

                let mut listener = Listener::bind(&server.host, port, Arc::clone(server))?;
                let token = Token(next_token);
                next_token += 1;
                poll.registry()
                    .register(&mut listener.socket, token, Interest::READABLE)?;

                let display_host = if server.host == "0.0.0.0" {
                    "localhost"
                } else {
                    &server.host
                };
                info!("listening on http://{}:{}", display_host, port);
                listeners.insert(token, listener);
            }
        }

        if listeners.is_empty() {
            return Err("no listening sockets created".into());
        }

        Ok(Server {
            listeners,
            connections: HashMap::new(),
            next_token,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Shared flag flipped by the signal handler to stop the loop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn run(&mut self, mut poll: Poll) -> Result<()> {
        let mut events = Events::with_capacity(1024);
        info!("server running");

        while self.running.load(Ordering::Acquire) {
            if let Err(e) = poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            if events.is_empty() {
                timeouts::reap_timed_out(&mut self.connections, &poll);
                continue;
            }

            for event in events.iter() {
                let token = event.token();
                if self.listeners.contains_key(&token) {
                    self.accept_connections(token, &poll);
                } else {
                    self.handle_connection_event(token, event, &poll);
                }
            }

            let finished: Vec<Token> = self
                .connections
                .iter()
                .filter(|(_, conn)| conn.wants_close())
                .map(|(token, _)| *token)
                .collect();
            for token in finished {
                self.close_connection(token, &poll);
            }
        }

        self.shutdown(&poll);
        Ok(())
    }

    fn accept_connections(&mut self, token: Token, poll: &Poll) {
        let Some(listener) = self.listeners.get(&token) else {
            return;
        };

        loop {
            match listener.socket.accept() {
                Ok((stream, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    let mut conn =
                        HttpConnection::new(stream, peer, Arc::clone(&listener.server));
                    if let Err(e) =
                        poll.registry()
                            .register(&mut conn.stream, token, Interest::READABLE)
                    {
                        error!("failed to register connection: {}", e);
                        continue;
                    }

                    info!(
                        "accepted connection from {} (token {}), total: {}",
                        peer,
                        token.0,
                        self.connections.len() + 1
                    );
                    self.connections.insert(token, conn);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("accept failed: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_connection_event(&mut self, token: Token, event: &Event, poll: &Poll) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        if event.is_error() || (event.is_read_closed() && event.is_write_closed()) {
            debug!("connection error/hangup event (token {})", token.0);
            conn.should_close = true;
            return;
        }

        if event.is_readable() {
            conn.handle_readable();
        }
        if event.is_writable() {
            conn.handle_writable();
        }

        if !conn.wants_close() {
            let interests = conn.interests();
            let _ = poll.registry().reregister(&mut conn.stream, token, interests);
        }
    }

    fn close_connection(&mut self, token: Token, poll: &Poll) {
        if let Some(mut conn) = self.connections.remove(&token) {
            let _ = poll.registry().deregister(&mut conn.stream);
            debug!("closing connection (token {})", token.0);
        }
    }

    fn shutdown(&mut self, poll: &Poll) {
        info!("server stopped");
        for (_, mut conn) in self.connections.drain() {
            let _ = poll.registry().deregister(&mut conn.stream);
        }
        for (_, mut listener) in self.listeners.drain() {
            let _ = poll.registry().deregister(&mut listener.socket);
        }
    }
}
