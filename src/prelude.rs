pub use crate::cgi;
pub use crate::config::{AppConfig, ConfigError, RouteConfig, ServerConfig};
pub use crate::error::{Result, ServerError};
pub use crate::handlers::{handle_error, handle_request};
pub use crate::http::*;
pub use crate::multipart::{UploadedFile, parse_multipart};
pub use crate::socket::Listener;

pub use mio::{
    Events, Interest, Poll, Token,
    event::Event,
    net::{TcpListener, TcpStream},
};
pub use serv_log::{debug, error, info, trace, warn};

pub use std::collections::{HashMap, HashSet};
pub use std::fs::{self, File, OpenOptions};
pub use std::io::{self, ErrorKind, Read, Write};
pub use std::net::SocketAddr;
pub use std::os::unix::fs::MetadataExt;
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
pub use std::sync::atomic::{AtomicBool, Ordering};
pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub use std::{
    fmt::{self, Display},
    os::{
        fd::{FromRawFd, IntoRawFd},
        unix::net::UnixStream,
    },
    process::{Child, Command, Stdio},
    str::FromStr,
};

pub const READ_BUF_SIZE: usize = 4096;
pub const LISTEN_BACKLOG: i32 = 128;
pub const POLL_TIMEOUT: Duration = Duration::from_millis(1000);
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);
pub const CGI_TIMEOUT: Duration = Duration::from_secs(30);
pub const SERVER_SOFTWARE: &str = "webserv/1.0";

// 2xx / 3xx
pub const HTTP_OK: u16 = 200;
pub const HTTP_CREATED: u16 = 201;
pub const HTTP_NO_CONTENT: u16 = 204;
pub const HTTP_MOVED_PERMANENTLY: u16 = 301;
pub const HTTP_FOUND: u16 = 302;
pub const HTTP_NOT_MODIFIED: u16 = 304;

// 4xx client errors
pub const HTTP_BAD_REQUEST: u16 = 400;
pub const HTTP_FORBIDDEN: u16 = 403;
pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_METHOD_NOT_ALLOWED: u16 = 405;
pub const HTTP_PAYLOAD_TOO_LARGE: u16 = 413;
pub const HTTP_URI_TOO_LONG: u16 = 414;

// 5xx server errors
pub const HTTP_INTERNAL_SERVER_ERROR: u16 = 500;
pub const HTTP_NOT_IMPLEMENTED: u16 = 501;
pub const HTTP_GATEWAY_TIMEOUT: u16 = 504;
