//! Blocking service client.
//!
//! `ServiceClient` is the seam between cmdlets and whatever executes calls.
//! `TcpServiceClient` sends each call over its own TCP connection to an
//! endpoint speaking the `wire` envelope; nothing is retried.
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info};
use serde_json::Value;

use crate::error::CmdletError;
use crate::result::Result;
use crate::wire::{ServiceCall, ServiceReply};

/// Executes one service call.
pub trait ServiceClient {
    /// Sends `call` and returns the response body.
    fn call(&self, call: &ServiceCall) -> Result<Value>;
}

impl<C: ServiceClient + ?Sized> ServiceClient for &C {
    fn call(&self, call: &ServiceCall) -> Result<Value> {
        (**self).call(call)
    }
}

/// Client for an endpoint reachable over TCP.
#[derive(Debug, Clone)]
pub struct TcpServiceClient {
    endpoint: String,
    timeout: Duration,
}

impl TcpServiceClient {
    /// Client for `endpoint` (`host:port`, optionally prefixed by `tcp://`).
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let endpoint = endpoint.trim();
        let endpoint = endpoint.strip_prefix("tcp://").unwrap_or(endpoint);
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Endpoint address this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connect(&self) -> Result<TcpStream> {
        let endpoint = &self.endpoint;
        let addr = endpoint
            .to_socket_addrs()
            .map_err(|e| {
                CmdletError::Transport(format!("cannot resolve endpoint {endpoint}: {e}"))
            })?
            .next()
            .ok_or_else(|| {
                CmdletError::Transport(format!("endpoint {endpoint} resolved to nothing"))
            })?;
        let stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| CmdletError::Transport(format!("failed to connect to {endpoint}: {e}")))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        Ok(stream)
    }
}

impl ServiceClient for TcpServiceClient {
    fn call(&self, call: &ServiceCall) -> Result<Value> {
        info!("Calling {}:{} at {}", call.service, call.operation, self.endpoint);
        let mut stream = self.connect()?;
        stream.write_all(&call.to_line()?)?;
        stream.flush()?;

        let mut line = String::new();
        let endpoint = &self.endpoint;
        let read = BufReader::new(stream)
            .read_line(&mut line)
            .map_err(|e| {
                CmdletError::Transport(format!("failed to read reply from {endpoint}: {e}"))
            })?;
        if read == 0 {
            return Err(CmdletError::Transport(format!(
                "{} closed the connection without replying",
                self.endpoint
            )));
        }
        debug!("Reply: {}", line.trim_end());
        let reply: ServiceReply = serde_json::from_str(&line)
            .map_err(|e| CmdletError::Transport(format!("malformed reply from {endpoint}: {e}")))?;
        reply.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdlet::ServiceId;
    use serde_json::json;
    use std::net::TcpListener;
    use std::thread;

    fn serve_once(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            reader.read_line(&mut request).unwrap();
            let mut stream = stream;
            stream.write_all(reply.as_bytes()).unwrap();
        });
        addr
    }

    #[test]
    fn returns_payload_of_ok_reply() {
        let addr = serve_once("{\"status\":\"ok\",\"payload\":{\"Groups\":[]}}\n");
        let client = TcpServiceClient::new(&format!("tcp://{addr}"), Duration::from_secs(5));
        let body = client
            .call(&ServiceCall::new(ServiceId::Greengrass, "ListGroups", "us-east-1"))
            .unwrap();
        assert_eq!(body, json!({"Groups": []}));
    }

    #[test]
    fn garbage_reply_is_a_transport_error() {
        let addr = serve_once("not json\n");
        let client = TcpServiceClient::new(&addr, Duration::from_secs(5));
        let err = client
            .call(&ServiceCall::new(ServiceId::Greengrass, "ListGroups", "us-east-1"))
            .unwrap_err();
        assert!(matches!(err, CmdletError::Transport(_)));
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let client = TcpServiceClient::new(&addr, Duration::from_secs(1));
        let err = client
            .call(&ServiceCall::new(ServiceId::CloudWatch, "ListMetrics", "us-east-1"))
            .unwrap_err();
        assert!(matches!(err, CmdletError::Transport(_)));
    }
}
