use std::mem;
use std::net::Ipv4Addr;
use std::os::fd::RawFd;

use libc::{c_int, c_void, socklen_t};

use crate::prelude::*;

/// One bound, listening, non-blocking endpoint. The mio listener owns the
/// descriptor; dropping the `Listener` closes it.
pub struct Listener {
    pub socket: TcpListener,
    pub host: String,
    pub port: u16,
    pub server: Arc<ServerConfig>,
}

impl Listener {
    pub fn bind(host: &str, port: u16, server: Arc<ServerConfig>) -> Result<Listener> {
        let fd = create_listen_socket(host, port)
            .map_err(|e| format!("failed to bind {}:{}: {}", host, port, e))?;
        let std_listener = unsafe { std::net::TcpListener::from_raw_fd(fd) };

        Ok(Listener {
            socket: TcpListener::from_std(std_listener),
            host: host.to_string(),
            port,
            server,
        })
    }
}

/// TCP listener built by hand so `SO_REUSEADDR`/`SO_REUSEPORT` and the
/// backlog are under our control: socket, options, bind, non-blocking,
/// listen(128).
fn create_listen_socket(host: &str, port: u16) -> io::Result<RawFd> {
    let ip: Ipv4Addr = if host.is_empty() {
        Ipv4Addr::UNSPECIFIED
    } else {
        host.parse().map_err(|_| {
            io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid listen address '{}'", host),
            )
        })?
    };

    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let one: c_int = 1;
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &one as *const _ as *const c_void,
            mem::size_of_val(&one) as socklen_t,
        );
        // SO_REUSEPORT is best-effort; not every platform has it.
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            &one as *const _ as *const c_void,
            mem::size_of_val(&one) as socklen_t,
        );

        #[cfg(target_os = "macos")]
        let addr = libc::sockaddr_in {
            sin_len: mem::size_of::<libc::sockaddr_in>() as u8,
            sin_family: libc::AF_INET as libc::sa_family_t,
            sin_port: port.to_be(),
            sin_addr: libc::in_addr {
                s_addr: u32::from_ne_bytes(ip.octets()),
            },
            sin_zero: [0; 8],
        };
        #[cfg(not(target_os = "macos"))]
        let addr = libc::sockaddr_in {
            sin_family: libc::AF_INET as libc::sa_family_t,
            sin_port: port.to_be(),
            sin_addr: libc::in_addr {
                s_addr: u32::from_ne_bytes(ip.octets()),
            },
            sin_zero: [0; 8],
        };

        if libc::bind(
            fd,
            &addr as *const _ as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as socklen_t,
        ) < 0
        {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        let flags = libc::fcntl(fd, libc::F_GETFL, 0);
        if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        if libc::listen(fd, LISTEN_BACKLOG) < 0 {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        Ok(fd)
    }
}
