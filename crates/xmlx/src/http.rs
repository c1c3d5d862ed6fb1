//! Minimal plain-HTTP fetching for `Document::load_uri`

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

const DEFAULT_PORT: u16 = 80;

/// Blocking HTTP/1.0 GET client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpClient {
    /// Connect, read and write timeout; `None` waits forever
    pub timeout: Option<Duration>,
    /// Redirects followed before giving up
    pub max_redirects: u8,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            max_redirects: 5,
        }
    }
}

/// Parsed `http://host[:port]/path`
#[derive(Clone, Debug, PartialEq, Eq)]
struct Url {
    host: String,
    port: u16,
    path: String,
}

impl Url {
    fn parse(uri: &str) -> Result<Self> {
        let rest = uri.strip_prefix("http://").ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported uri {uri}: only http:// is supported"),
            ))
        })?;
        let (authority, path) = match rest.find('/') {
            Some(i) => rest.split_at(i),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid port in {uri}"),
                    ))
                })?;
                (host, port)
            }
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("missing host in {uri}"),
            )));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

/// Status, headers and body of a response
#[derive(Debug)]
struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    fn parse(raw: Vec<u8>) -> Result<Self> {
        let malformed = || Error::Io(io::Error::new(io::ErrorKind::InvalidData, "malformed http response"));

        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .ok_or_else(malformed)?;
        let head = String::from_utf8_lossy(raw.get(..split).ok_or_else(malformed)?).into_owned();
        let body = raw.get(split + 4..).unwrap_or_default().to_vec();

        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(malformed)?;
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl HttpClient {
    /// Fetch the body of `uri`, following redirects
    pub fn get(&self, uri: &str) -> Result<Vec<u8>> {
        let mut current = uri.to_string();
        for _ in 0..=self.max_redirects {
            let url = Url::parse(&current)?;
            let response = self.request(&url)?;
            debug!(uri = %current, status = response.status, "http response");

            match response.status {
                200..=299 => return Ok(response.body),
                301 | 302 | 303 | 307 | 308 => {
                    let Some(location) = response.header("location") else {
                        return Err(Error::Http {
                            status: response.status,
                            uri: current,
                        });
                    };
                    current = if location.starts_with('/') {
                        format!("http://{}:{}{location}", url.host, url.port)
                    } else {
                        location.to_string()
                    };
                }
                status => return Err(Error::Http { status, uri: current }),
            }
        }
        Err(Error::Http {
            status: 310,
            uri: current,
        })
    }

    fn request(&self, url: &Url) -> Result<Response> {
        let mut stream = self.connect(url)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        let request = format!(
            "GET {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: xmlx/{}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
            url.path,
            url.host,
            env!("CARGO_PKG_VERSION"),
        );
        stream.write_all(request.as_bytes())?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw)?;
        Response::parse(raw)
    }

    fn connect(&self, url: &Url) -> Result<TcpStream> {
        let mut last_err = None;
        for addr in (url.host.as_str(), url.port).to_socket_addrs()? {
            let attempt = match self.timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        Err(Error::Io(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", url.host))
        })))
    }
}
