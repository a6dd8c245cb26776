//! Access to the servers holding SRS files.

use crate::{config::Config, errors::SrsDataErr};
use reqwest::blocking::Client;

/// Something that can tell whether a remote file exists and fetch it.
pub trait RemoteSource {
    /// Check for a file without downloading it.
    ///
    /// `Ok(false)` means the server answered and does not have the file. An error means the
    /// server could not be asked.
    fn probe(&self, url: &str) -> Result<bool, SrsDataErr>;

    /// Retrieve the raw bytes of a file, `Ok(None)` if the server does not have it.
    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, SrsDataErr>;
}

impl<T: RemoteSource + ?Sized> RemoteSource for &T {
    fn probe(&self, url: &str) -> Result<bool, SrsDataErr> {
        (**self).probe(url)
    }

    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, SrsDataErr> {
        (**self).fetch(url)
    }
}

impl<T: RemoteSource + ?Sized> RemoteSource for Box<T> {
    fn probe(&self, url: &str) -> Result<bool, SrsDataErr> {
        (**self).probe(url)
    }

    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, SrsDataErr> {
        (**self).fetch(url)
    }
}

/// The real thing, over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    /// Build a client honoring the timeout and user agent in `config`.
    pub fn new(config: &Config) -> Result<Self, SrsDataErr> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(HttpRemote { client })
    }
}

impl RemoteSource for HttpRemote {
    fn probe(&self, url: &str) -> Result<bool, SrsDataErr> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|err| transport_error(url, err))?;
        let status = response.status();

        debug!("HEAD {} -> {}", url, status);

        if status.is_success() {
            Ok(true)
        } else if status.is_client_error() {
            Ok(false)
        } else {
            Err(SrsDataErr::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            })
        }
    }

    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, SrsDataErr> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| transport_error(url, err))?;
        let status = response.status();

        debug!("GET {} -> {}", url, status);

        if status.is_success() {
            Ok(Some(response.bytes()?.to_vec()))
        } else if status.is_client_error() {
            Ok(None)
        } else {
            Err(SrsDataErr::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            })
        }
    }
}

/// Failing to connect or to hear back in time means the server could not be asked at all.
fn transport_error(url: &str, err: reqwest::Error) -> SrsDataErr {
    if err.is_connect() || err.is_timeout() {
        SrsDataErr::Unreachable(format!("{}: {}", url, err))
    } else {
        SrsDataErr::Http(err)
    }
}

/// An in memory remote for tests.
#[cfg(test)]
pub(crate) mod memory {
    use super::*;

    use std::{cell::RefCell, collections::HashMap};

    #[derive(Default)]
    pub(crate) struct MemoryRemote {
        pub files: HashMap<String, Vec<u8>>,
        pub unreachable: bool,
        pub fetched: RefCell<Vec<String>>,
    }

    impl MemoryRemote {
        pub(crate) fn with_file(mut self, url: &str, data: Vec<u8>) -> Self {
            self.files.insert(url.to_owned(), data);
            self
        }

        pub(crate) fn down() -> Self {
            MemoryRemote {
                unreachable: true,
                ..MemoryRemote::default()
            }
        }
    }

    impl RemoteSource for MemoryRemote {
        fn probe(&self, url: &str) -> Result<bool, SrsDataErr> {
            if self.unreachable {
                return Err(SrsDataErr::Unreachable(url.to_owned()));
            }

            Ok(self.files.contains_key(url))
        }

        fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, SrsDataErr> {
            if self.unreachable {
                return Err(SrsDataErr::Unreachable(url.to_owned()));
            }

            self.fetched.borrow_mut().push(url.to_owned());
            Ok(self.files.get(url).cloned())
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use std::net::TcpListener;

    // A local port with nothing listening on it.
    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        format!("http://127.0.0.1:{}/SRS/2025/LM250110.SRS", port)
    }

    #[test]
    fn test_refused_connection_is_unreachable() {
        let client = Client::builder().no_proxy().build().unwrap();
        let remote = HttpRemote { client };
        let url = closed_port_url();

        let err = remote.probe(&url).unwrap_err();
        assert!(matches!(err, SrsDataErr::Unreachable(ref msg) if msg.starts_with(&url)));
        assert!(err.is_network());

        let err = remote.fetch(&url).unwrap_err();
        assert!(matches!(err, SrsDataErr::Unreachable(_)));
    }
}
