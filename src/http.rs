//! # HTTP client
//!
//! Each request opens a TCP connection, streams the request into a single send call, reads back the
//! response and closes the connection again. The response is kept in the capture buffer until the
//! next operation, so the body can be read by `read_http_response()`.
//!
//! Just plain HTTP/1.1 is supported. Responses longer than the capture buffer get truncated.
//!
//! ## Example
//!
//! ````
//! # use nodemcu_wifi_bee::example::{ExampleDelay, ExamplePin, ExampleSerial, ExampleTimer};
//! # use nodemcu_wifi_bee::wifi::Adapter;
//! #
//! let mut adapter: Adapter<_, _, _, _, 1_000, 256> = Adapter::new(
//!     ExampleSerial::default(),
//!     ExamplePin::default(),
//!     ExampleTimer::default(),
//!     ExampleDelay::default(),
//! );
//! adapter.set_credentials("test_wifi", "secret").unwrap();
//!
//! let status = adapter.http_get("example.org", 80, "/index.html", "Accept: text/plain\r\n").unwrap();
//! assert_eq!(200, status);
//!
//! let mut body = [0x0; 64];
//! let (length, _) = adapter.read_http_response(&mut body).unwrap();
//! assert_eq!(b"hello", &body[..length]);
//! ````
use crate::channel::CommandError;
use crate::commands::HttpRequestCommand;
use crate::prompt::Prompt;
use crate::responses::{http_body, parse_status_code};
use crate::stack::{ConnectionKind, Error as StackError};
use crate::wifi::Adapter;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;
use log::{info, warn};

/// Errors of a HTTP request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HttpError {
    /// Opening the TCP connection failed
    ConnectError(StackError),

    /// Sending the request was not confirmed
    SendFailed(CommandError),

    /// Server did not respond in time or no response was captured
    NoResponse,

    /// Reading while waiting for the response failed
    ReceiveFailed(CommandError),

    /// Reading back the response failed
    ResponseError(StackError),

    /// Response did not start with a status line. Contains the length of the body which is available nevertheless.
    InvalidStatusCode(usize),
}

impl<
        'd,
        S: Read + Write + ReadReady,
        P: OutputPin,
        T: Timer<TIMER_HZ>,
        D: DelayNs,
        const TIMER_HZ: u32,
        const RX_SIZE: usize,
    > Adapter<'d, S, P, T, D, TIMER_HZ, RX_SIZE>
{
    /// Sends a HTTP request and returns the status code of the response
    ///
    /// `headers` may contain additional header lines, separated by CRLF. Content-Length is computed from the body.
    /// The connection gets closed in any case.
    pub fn http_action(
        &mut self,
        server: &str,
        port: u16,
        method: &str,
        location: &str,
        headers: &str,
        body: &[u8],
    ) -> Result<u16, HttpError> {
        self.buffer.clear();

        self.open_connection(server, port, ConnectionKind::Tcp).map_err(HttpError::ConnectError)?;

        let result = self.exchange(HttpRequestCommand::new(method, server, location, headers, body));

        if let Err(error) = self.close_connection() {
            warn!("Closing HTTP connection failed: {:?}", error);
        }

        result
    }

    /// Sends a GET request and returns the status code
    pub fn http_get(&mut self, server: &str, port: u16, location: &str, headers: &str) -> Result<u16, HttpError> {
        self.http_action(server, port, "GET", location, headers, &[])
    }

    /// Sends a POST request and returns the status code
    pub fn http_post(
        &mut self,
        server: &str,
        port: u16,
        location: &str,
        headers: &str,
        body: &[u8],
    ) -> Result<u16, HttpError> {
        self.http_action(server, port, "POST", location, headers, body)
    }

    /// Copies the body of the captured response into the given buffer.
    /// Returns the length copied and the status code.
    ///
    /// The body is copied even if the status code can not be parsed.
    pub fn read_http_response(&self, buffer: &mut [u8]) -> Result<(usize, u16), HttpError> {
        let response = self.buffer.as_slice();
        if response.is_empty() {
            return Err(HttpError::NoResponse);
        }

        let body = http_body(response);
        let length = body.len().min(buffer.len());
        buffer[..length].copy_from_slice(&body[..length]);

        let code = parse_status_code(response).ok_or(HttpError::InvalidStatusCode(length))?;
        Ok((length, code))
    }

    /// Sends the request and reads back the response
    fn exchange(&mut self, request: HttpRequestCommand<'_>) -> Result<u16, HttpError> {
        self.send_command(request)?;

        let timeout = self.config.receive_timeout_ms;
        if let Err(error) = self.await_prompt(Prompt::DataReceived, timeout) {
            self.buffer.clear();

            return Err(match error {
                CommandError::Timeout(_) => HttpError::NoResponse,
                other => HttpError::ReceiveFailed(other),
            });
        }

        self.read_server_response().map_err(HttpError::ResponseError)?;

        let response = self.buffer.as_slice();
        let code = parse_status_code(response).ok_or(HttpError::InvalidStatusCode(http_body(response).len()))?;

        info!("HTTP response status {}", code);
        Ok(code)
    }
}
