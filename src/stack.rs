//! # Connection lifecycle
//!
//! The firmware manages a single connection object. Opening powers the bee on, joins the access
//! point, registers the socket callbacks printing the connection prompts and connects to the remote.
//! Closing always powers the bee down again.
//!
//! After sending, the response of the remote (if any) is read back into the capture buffer.
//! [TcpClientStack] of [embedded_nal] is implemented on top, exposing the connection as single socket.
//!
//! ## Example
//!
//! ````
//! # use nodemcu_wifi_bee::example::{ExampleDelay, ExamplePin, ExampleSerial, ExampleTimer};
//! # use nodemcu_wifi_bee::stack::ConnectionKind;
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
//! // Creating a TCP connection
//! adapter.open_connection("10.0.0.1", 21, ConnectionKind::Tcp).unwrap();
//!
//! // Sending some data, the response is captured
//! adapter.send_ascii("hallo!").unwrap();
//! assert_eq!("nice to see you!", adapter.read_response_ascii().unwrap());
//!
//! // Closing the connection powers the bee down
//! adapter.close_connection().unwrap();
//! assert!(!adapter.is_powered());
//! ````
use crate::channel::CommandError;
use crate::commands::{
    CloseCommand, ConnectCommand, CreateConnectionCommand, Encoding, ReadBackCommand, RegisterCallbackCommand,
    SocketEvent, TransmissionCommand,
};
use crate::prompt::Prompt;
use crate::wifi::{Adapter, JoinError};
use core::fmt::Write as _;
use core::net::SocketAddr;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_io::{Read, ReadReady, Write};
use embedded_nal::{TcpClientStack, TcpError, TcpErrorKind};
use fugit_timer::Timer;
use heapless::String;
use log::{debug, info, warn};

/// Transport protocol of the connection
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionKind {
    Tcp,
    Udp,
}

/// Handle of the single connection
#[derive(Debug)]
pub struct Socket(());

/// Network related errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Switching the power pin or draining after power on failed
    PowerError(CommandError),

    /// Joining the access point failed
    JoinFailed(JoinError),

    /// Creating the connection object failed
    CreateConnectionFailed(CommandError),

    /// Registering one of the socket callbacks failed
    RegisterCallbackFailed(CommandError),

    /// Connect command failed or was not confirmed by the remote
    ConnectError(CommandError),

    /// Transmission of data was not confirmed
    SendFailed(CommandError),

    /// Reading while waiting for the response of the remote failed
    ReceiveFailed(CommandError),

    /// Reading back the response failed
    ReadBackFailed(CommandError),

    /// Close command was not confirmed
    CloseError(CommandError),

    /// No response data was captured
    NoResponse,

    /// The single socket is already in use
    NoSocketAvailable,

    /// Socket is already connected. Socket needs to be closed first.
    AlreadyConnected,

    /// Unable to send data if socket is not connected
    SocketUnconnected,
}

impl TcpError for Error {
    fn kind(&self) -> TcpErrorKind {
        match self {
            Error::SocketUnconnected | Error::CloseError(_) => TcpErrorKind::PipeClosed,
            _ => TcpErrorKind::Other,
        }
    }
}

impl<
        'd,
        S: Read + Write + ReadReady,
        P: OutputPin,
        T: Timer<TIMER_HZ>,
        D: DelayNs,
        const TIMER_HZ: u32,
        const RX_SIZE: usize,
    > TcpClientStack for Adapter<'d, S, P, T, D, TIMER_HZ, RX_SIZE>
{
    type TcpSocket = Socket;
    type Error = Error;

    /// Returns the single socket. If the socket is in use [Error::NoSocketAvailable] is returned.
    fn socket(&mut self) -> Result<Self::TcpSocket, Self::Error> {
        if self.socket_allocated {
            return Err(Error::NoSocketAvailable);
        }

        self.socket_allocated = true;
        Ok(Socket(()))
    }

    /// Opens a TCP connection to the given address. Blocks until connected, so WouldBlock is never returned.
    fn connect(&mut self, _socket: &mut Socket, remote: SocketAddr) -> nb::Result<(), Self::Error> {
        if self.connected {
            return nb::Result::Err(nb::Error::Other(Error::AlreadyConnected));
        }

        // 39 chars fit any IPv6 address
        let mut host: String<39> = String::new();
        let _ = write!(host, "{}", remote.ip());

        self.open_connection(host.as_str(), remote.port(), ConnectionKind::Tcp)?;
        nb::Result::Ok(())
    }

    /// Sends the given buffer binary encoded and returns the length (in bytes) sent.
    /// The response of the remote is captured and returned by the next `receive()` call.
    fn send(&mut self, _socket: &mut Socket, buffer: &[u8]) -> nb::Result<usize, Error> {
        if !self.connected {
            return nb::Result::Err(nb::Error::Other(Error::SocketUnconnected));
        }

        self.transmit(buffer, Encoding::Binary)?;
        nb::Result::Ok(buffer.len())
    }

    /// Moves captured response data into the given buffer. Data not fitting stays for the next call.
    /// Returns WouldBlock if no data was captured.
    fn receive(&mut self, _socket: &mut Self::TcpSocket, buffer: &mut [u8]) -> nb::Result<usize, Self::Error> {
        if self.buffer.is_empty() {
            if !self.connected {
                return nb::Result::Err(nb::Error::Other(Error::SocketUnconnected));
            }

            return nb::Result::Err(nb::Error::WouldBlock);
        }

        let length = self.buffer.len().min(buffer.len());
        buffer[..length].copy_from_slice(&self.buffer.as_slice()[..length]);
        self.buffer.consume(length);

        nb::Result::Ok(length)
    }

    /// Closes the connection and releases the socket.
    /// If the socket is not connected, no command is sent but the bee is still powered down.
    fn close(&mut self, _socket: Self::TcpSocket) -> Result<(), Self::Error> {
        self.socket_allocated = false;

        if self.connected {
            return self.close_connection();
        }

        if self.powered {
            self.power_off().map_err(Error::PowerError)?;
        }

        Ok(())
    }
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
    /// Powers on, joins the access point and connects to the remote
    ///
    /// On any error the bee gets powered down again.
    pub fn open_connection(&mut self, server: &str, port: u16, kind: ConnectionKind) -> Result<(), Error> {
        self.connected = false;
        self.power_on().map_err(Error::PowerError)?;

        if let Err(error) = self.join_network() {
            self.power_off().map_err(Error::PowerError)?;
            return Err(Error::JoinFailed(error));
        }

        if let Err(error) = self.connect_remote(server, port, kind) {
            if let Err(power_error) = self.power_off() {
                warn!("Powering off after failed connect failed: {:?}", power_error);
            }

            return Err(error);
        }

        self.connected = true;

        info!("Connected to remote on port {}", port);
        Ok(())
    }

    /// Creates the connection object, registers the callbacks and connects
    fn connect_remote(&mut self, server: &str, port: u16, kind: ConnectionKind) -> Result<(), Error> {
        self.send_command(CreateConnectionCommand::new(kind))?;

        for event in SocketEvent::ALL {
            self.send_command(RegisterCallbackCommand::new(event))?;
        }

        self.send_command(ConnectCommand::new(server, port))
    }

    /// Opens a TCP connection
    pub fn open_tcp(&mut self, server: &str, port: u16) -> Result<(), Error> {
        self.open_connection(server, port, ConnectionKind::Tcp)
    }

    /// Opens a UDP connection
    pub fn open_udp(&mut self, server: &str, port: u16) -> Result<(), Error> {
        self.open_connection(server, port, ConnectionKind::Udp)
    }

    /// Closes the connection. The bee gets powered down regardless of the result.
    pub fn close_connection(&mut self) -> Result<(), Error> {
        let result = self.send_command(CloseCommand);
        self.connected = false;

        self.power_off().map_err(Error::PowerError)?;
        result
    }

    /// Sends the data and captures the response of the remote
    ///
    /// Succeeds as soon as the transmission was confirmed. If the remote does not respond in time, the
    /// capture buffer is left empty, as a remote is not obliged to respond.
    pub fn transmit(&mut self, data: &[u8], encoding: Encoding) -> Result<(), Error> {
        self.buffer.clear();
        self.send_command(TransmissionCommand::new(data, encoding))?;

        let timeout = self.config.receive_timeout_ms;
        match self.await_prompt(Prompt::DataReceived, timeout) {
            Ok(()) => self.read_server_response(),
            Err(CommandError::Timeout(_)) => {
                debug!("Remote did not respond");
                self.buffer.clear();
                Ok(())
            }
            Err(error) => {
                self.buffer.clear();
                Err(Error::ReceiveFailed(error))
            }
        }
    }

    /// Sends the text, escaping control characters, quotes and brackets
    pub fn send_ascii(&mut self, text: &str) -> Result<(), Error> {
        self.transmit(text.as_bytes(), Encoding::Ascii)
    }

    /// Sends the data, escaping every byte
    pub fn send_binary(&mut self, data: &[u8]) -> Result<(), Error> {
        self.transmit(data, Encoding::Binary)
    }

    /// Reads back the last payload received by the firmware into the capture buffer
    pub fn read_server_response(&mut self) -> Result<(), Error> {
        self.buffer.clear();
        self.send_command(ReadBackCommand)?;

        let timeout = self.config.read_back_timeout_ms;
        let length = self
            .capture_until(Prompt::EndOfFrame, timeout)
            .map_err(Error::ReadBackFailed)?;

        if length + 1 >= RX_SIZE {
            warn!("Response may be truncated to {} bytes", length);
        }

        Ok(())
    }

    /// Copies the captured response into the given buffer and returns the length copied
    pub fn read_response(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        if self.buffer.is_empty() {
            return Err(Error::NoResponse);
        }

        let length = self.buffer.len().min(buffer.len());
        buffer[..length].copy_from_slice(&self.buffer.as_slice()[..length]);
        Ok(length)
    }

    /// Returns the captured response as text. Invalid UTF-8 sequences cut the text short.
    pub fn read_response_ascii(&self) -> Result<&str, Error> {
        if self.buffer.is_empty() {
            return Err(Error::NoResponse);
        }

        let data = self.buffer.as_slice();
        match core::str::from_utf8(data) {
            Ok(text) => Ok(text),
            Err(error) => Ok(core::str::from_utf8(&data[..error.valid_up_to()]).unwrap_or_default()),
        }
    }

    /// Discards the captured response
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }
}
