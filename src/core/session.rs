/// SSH transport to the SVC management shell
///
/// The SVC CLI is reached over a plain password-authenticated SSH session.
/// Authentication failures and connect timeouts abort the whole run.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};

use ssh2::Session;

use crate::core::config::ApplianceConfig;
use crate::core::error::CollectError;
use crate::utils::constants::{CONNECT_TIMEOUT, SSH_PORT};

/// Executes one command on a remote appliance and returns its standard
/// output. Collectors are generic over this so tests can substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    fn run_command(&mut self, command: &str) -> Result<String, CollectError>;
}

/// A live SSH session to one appliance.
///
/// The session is established eagerly on construction and torn down when
/// the value drops, so each collector holds exactly one session for exactly
/// its own lifetime.
pub struct SshSession {
    session: Session,
    address: String,
}

impl SshSession {
    pub fn connect(appliance: &ApplianceConfig) -> Result<Self, CollectError> {
        let address = appliance.address.clone();

        let target = if address.contains(':') {
            address.clone()
        } else {
            format!("{}:{}", address, SSH_PORT)
        };

        let socket_addr = target
            .to_socket_addrs()
            .map_err(|e| CollectError::Session {
                address: address.clone(),
                message: format!("cannot resolve address: {}", e),
            })?
            .next()
            .ok_or_else(|| CollectError::Session {
                address: address.clone(),
                message: "cannot resolve address".to_string(),
            })?;

        let tcp = TcpStream::connect_timeout(&socket_addr, CONNECT_TIMEOUT).map_err(|e| {
            match e.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                    CollectError::Timeout {
                        address: address.clone(),
                    }
                }
                _ => CollectError::Session {
                    address: address.clone(),
                    message: e.to_string(),
                },
            }
        })?;

        let mut session = Session::new().map_err(|e| CollectError::Session {
            address: address.clone(),
            message: e.to_string(),
        })?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| CollectError::Session {
            address: address.clone(),
            message: e.to_string(),
        })?;

        session
            .userauth_password(&appliance.login, &appliance.password)
            .map_err(|_| CollectError::Authentication {
                address: address.clone(),
            })?;
        if !session.authenticated() {
            return Err(CollectError::Authentication { address });
        }

        Ok(Self { session, address })
    }

    fn error(&self, message: impl ToString) -> CollectError {
        CollectError::Session {
            address: self.address.clone(),
            message: message.to_string(),
        }
    }
}

impl CommandRunner for SshSession {
    fn run_command(&mut self, command: &str) -> Result<String, CollectError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| self.error(e))?;

        channel.exec(command).map_err(|e| self.error(e))?;

        let mut output = String::new();
        channel
            .read_to_string(&mut output)
            .map_err(|e| self.error(e))?;

        // Best effort: the output is already read, a close failure does not
        // invalidate it.
        let _ = channel.wait_close();

        Ok(output)
    }
}
