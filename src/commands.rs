use crate::channel::CommandError;
use crate::config::Config;
use crate::http::HttpError;
use crate::prompt::Prompt;
use crate::stack::{ConnectionKind, Error as StackError};
use crate::wifi::JoinError;
use embedded_io::Write;
use numtoa::NumToA;

/// Script line sent to the firmware, confirmed by a prompt
pub(crate) trait Command {
    /// Name used for logging
    const NAME: &'static str;

    /// Prompt confirming the command
    const PROMPT: Prompt;

    /// Time to wait for the prompt
    fn timeout_ms(&self, config: &Config) -> u32;

    /// Writes the script line without line terminator
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error>;
}

/// Trait for mapping command errors
pub trait CommandErrorHandler {
    type Error;

    /// Maps the error of the send/await cycle
    fn command_error(&self, error: CommandError) -> Self::Error;
}

/// Escaping applied to payload bytes embedded in a string literal
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Control characters, backslash, quotes and square brackets get a character escape and `|` the decimal
    /// escape `\124`. Other bytes are sent as is.
    Ascii,
    /// Every byte is sent as decimal escape, e.g. `\007`
    Binary,
}

/// Writes the given data escaped for a double quoted Lua string literal
pub(crate) fn write_escaped<W: Write>(writer: &mut W, data: &[u8], encoding: Encoding) -> Result<(), W::Error> {
    match encoding {
        Encoding::Ascii => {
            let mut start = 0;

            for (position, byte) in data.iter().enumerate() {
                let character = ascii_escape(*byte);
                if character.is_none() && *byte != b'|' {
                    continue;
                }

                writer.write_all(&data[start..position])?;
                match character {
                    Some(character) => writer.write_all(&[b'\\', character])?,
                    // Pipe is never sent verbatim, so an echoed line can not contain a prompt
                    None => writer.write_all(&decimal_escape(*byte))?,
                }
                start = position + 1;
            }

            writer.write_all(&data[start..])
        }
        Encoding::Binary => {
            for byte in data {
                writer.write_all(&decimal_escape(*byte))?;
            }

            Ok(())
        }
    }
}

/// Returns the escape character for bytes which can not be placed verbatim in a string literal
fn ascii_escape(byte: u8) -> Option<u8> {
    match byte {
        0x07 => Some(b'a'),
        0x08 => Some(b'b'),
        0x0C => Some(b'f'),
        b'\n' => Some(b'n'),
        b'\r' => Some(b'r'),
        b'\t' => Some(b't'),
        0x0B => Some(b'v'),
        b'\\' | b'"' | b'\'' | b'[' | b']' => Some(byte),
        _ => None,
    }
}

/// Three digits, so a following digit never extends the escape
fn decimal_escape(byte: u8) -> [u8; 4] {
    [b'\\', b'0' + byte / 100, b'0' + byte / 10 % 10, b'0' + byte % 10]
}

/// Sets the WIFI mode
#[derive(Clone)]
pub struct WifiModeCommand {
    /// Mode constant of the wifi module
    mode: &'static str,
}

impl WifiModeCommand {
    pub fn station_mode() -> Self {
        Self { mode: "wifi.STATION" }
    }
}

impl Command for WifiModeCommand {
    const NAME: &'static str = "wifi.setmode";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifi.setmode(")?;
        writer.write_all(self.mode.as_bytes())?;
        writer.write_all(b")")
    }
}

impl CommandErrorHandler for WifiModeCommand {
    type Error = JoinError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        JoinError::ModeError(error)
    }
}

/// Sets the credentials of the target access point
#[derive(Clone)]
pub struct StationConfigCommand<'a> {
    ssid: &'a str,
    password: &'a str,
}

impl<'a> StationConfigCommand<'a> {
    pub fn new(ssid: &'a str, password: &'a str) -> Self {
        Self { ssid, password }
    }
}

impl Command for StationConfigCommand<'_> {
    const NAME: &'static str = "wifi.sta.config";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifi.sta.config(\"")?;
        write_escaped(writer, self.ssid.as_bytes(), Encoding::Ascii)?;
        writer.write_all(b"\",\"")?;
        write_escaped(writer, self.password.as_bytes(), Encoding::Ascii)?;
        writer.write_all(b"\")")
    }
}

impl CommandErrorHandler for StationConfigCommand<'_> {
    type Error = JoinError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        JoinError::CredentialsError(error)
    }
}

/// Starts joining the configured access point. Acknowledged by the interpreter only.
#[derive(Clone, Default)]
pub struct StationConnectCommand;

impl Command for StationConnectCommand {
    const NAME: &'static str = "wifi.sta.connect";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifi.sta.connect()")
    }
}

impl CommandErrorHandler for StationConnectCommand {
    type Error = JoinError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        JoinError::ConnectError(error)
    }
}

/// Leaves the access point
#[derive(Clone, Default)]
pub struct StationDisconnectCommand;

impl Command for StationDisconnectCommand {
    const NAME: &'static str = "wifi.sta.disconnect";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifi.sta.disconnect()")
    }
}

impl CommandErrorHandler for StationDisconnectCommand {
    type Error = JoinError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        JoinError::DisconnectError(error)
    }
}

/// Prints the status prompt followed by the station status digit
///
/// The prompt literal is split, so the echo of the line never matches.
#[derive(Clone, Default)]
pub struct StatusCommand;

impl Command for StatusCommand {
    const NAME: &'static str = "wifi.sta.status";
    const PROMPT: Prompt = Prompt::Status;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"print(\"|\" .. \"STS|\" .. wifi.sta.status())")
    }
}

impl CommandErrorHandler for StatusCommand {
    type Error = JoinError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        JoinError::StatusError(error)
    }
}

/// Creates the global connection object `wifiConn`
#[derive(Clone)]
pub struct CreateConnectionCommand {
    kind: ConnectionKind,
}

impl CreateConnectionCommand {
    pub fn new(kind: ConnectionKind) -> Self {
        Self { kind }
    }
}

impl Command for CreateConnectionCommand {
    const NAME: &'static str = "net.createConnection";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifiConn=net.createConnection(")?;
        writer.write_all(match self.kind {
            ConnectionKind::Tcp => b"net.TCP",
            ConnectionKind::Udp => b"net.UDP",
        })?;
        writer.write_all(b",false)")
    }
}

impl CommandErrorHandler for CreateConnectionCommand {
    type Error = StackError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        StackError::CreateConnectionFailed(error)
    }
}

/// Socket events a callback printing the matching prompt gets registered for
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SocketEvent {
    Connection,
    Reconnection,
    Disconnection,
    Sent,
    Receive,
}

impl SocketEvent {
    /// All events in registration order
    pub const ALL: [SocketEvent; 5] = [
        SocketEvent::Connection,
        SocketEvent::Reconnection,
        SocketEvent::Disconnection,
        SocketEvent::Sent,
        SocketEvent::Receive,
    ];

    fn name(&self) -> &'static [u8] {
        match self {
            SocketEvent::Connection => b"connection",
            SocketEvent::Reconnection => b"reconnection",
            SocketEvent::Disconnection => b"disconnection",
            SocketEvent::Sent => b"sent",
            SocketEvent::Receive => b"receive",
        }
    }

    /// Inline callback function. The receive callback keeps the payload for reading it back later.
    fn callback(&self) -> &'static [u8] {
        match self {
            SocketEvent::Connection => b"function(s) print(\"|C|\") end",
            SocketEvent::Reconnection => b"function(s) print(\"|RC|\") end",
            SocketEvent::Disconnection => b"function(s) print(\"|DC|\") end",
            SocketEvent::Sent => b"function(s) print(\"|DS|\") end",
            SocketEvent::Receive => b"function(s, d) lastData=d print(\"|DR|\") end",
        }
    }
}

/// Registers a callback on `wifiConn`
#[derive(Clone)]
pub struct RegisterCallbackCommand {
    event: SocketEvent,
}

impl RegisterCallbackCommand {
    pub fn new(event: SocketEvent) -> Self {
        Self { event }
    }
}

impl Command for RegisterCallbackCommand {
    const NAME: &'static str = "wifiConn:on";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifiConn:on(\"")?;
        writer.write_all(self.event.name())?;
        writer.write_all(b"\",")?;
        writer.write_all(self.event.callback())?;
        writer.write_all(b")")
    }
}

impl CommandErrorHandler for RegisterCallbackCommand {
    type Error = StackError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        StackError::RegisterCallbackFailed(error)
    }
}

/// Connects `wifiConn` to the remote, confirmed by the connection callback
#[derive(Clone)]
pub struct ConnectCommand<'a> {
    server: &'a str,
    port: u16,
}

impl<'a> ConnectCommand<'a> {
    pub fn new(server: &'a str, port: u16) -> Self {
        Self { server, port }
    }
}

impl Command for ConnectCommand<'_> {
    const NAME: &'static str = "wifiConn:connect";
    const PROMPT: Prompt = Prompt::Connected;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.server_connect_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        let mut buffer = [0x0; 20];

        writer.write_all(b"wifiConn:connect(")?;
        writer.write_all(self.port.numtoa(10, &mut buffer))?;
        writer.write_all(b",\"")?;
        write_escaped(writer, self.server.as_bytes(), Encoding::Ascii)?;
        writer.write_all(b"\")")
    }
}

impl CommandErrorHandler for ConnectCommand<'_> {
    type Error = StackError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        StackError::ConnectError(error)
    }
}

/// Closes `wifiConn`, confirmed by the disconnection callback
#[derive(Clone, Default)]
pub struct CloseCommand;

impl Command for CloseCommand {
    const NAME: &'static str = "wifiConn:close";
    const PROMPT: Prompt = Prompt::Disconnected;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifiConn:close()")
    }
}

impl CommandErrorHandler for CloseCommand {
    type Error = StackError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        StackError::CloseError(error)
    }
}

/// Sends the payload by `wifiConn`, confirmed by the sent callback
#[derive(Clone)]
pub struct TransmissionCommand<'a> {
    data: &'a [u8],
    encoding: Encoding,
}

impl<'a> TransmissionCommand<'a> {
    pub fn new(data: &'a [u8], encoding: Encoding) -> Self {
        Self { data, encoding }
    }
}

impl Command for TransmissionCommand<'_> {
    const NAME: &'static str = "wifiConn:send";
    const PROMPT: Prompt = Prompt::DataSent;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.send_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"wifiConn:send(\"")?;
        write_escaped(writer, self.data, self.encoding)?;
        writer.write_all(b"\")")
    }
}

impl CommandErrorHandler for TransmissionCommand<'_> {
    type Error = StackError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        StackError::SendFailed(error)
    }
}

/// Writes the last received payload framed by the frame prompts
///
/// The prompt literals are split, so the echo of the line never matches.
#[derive(Clone, Default)]
pub struct ReadBackCommand;

impl Command for ReadBackCommand {
    const NAME: &'static str = "uart.write";
    const PROMPT: Prompt = Prompt::StartOfFrame;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.read_back_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"uart.write(0,\"|\" .. \"SOF|\",lastData,\"|\" .. \"EOF|\")")
    }
}

impl CommandErrorHandler for ReadBackCommand {
    type Error = StackError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        StackError::ReadBackFailed(error)
    }
}

/// Sends a complete HTTP/1.1 request by `wifiConn`
///
/// The request is streamed into the send call, so no request buffer is needed.
#[derive(Clone)]
pub struct HttpRequestCommand<'a> {
    method: &'a str,
    server: &'a str,
    location: &'a str,
    headers: &'a str,
    body: &'a [u8],
}

impl<'a> HttpRequestCommand<'a> {
    pub fn new(method: &'a str, server: &'a str, location: &'a str, headers: &'a str, body: &'a [u8]) -> Self {
        Self {
            method,
            server,
            location,
            headers,
            body,
        }
    }
}

impl Command for HttpRequestCommand<'_> {
    const NAME: &'static str = "wifiConn:send";
    const PROMPT: Prompt = Prompt::DataSent;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.send_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        let mut buffer = [0x0; 20];

        writer.write_all(b"wifiConn:send(\"")?;
        write_escaped(writer, self.method.as_bytes(), Encoding::Ascii)?;
        writer.write_all(b" ")?;
        write_escaped(writer, self.location.as_bytes(), Encoding::Ascii)?;
        writer.write_all(b" HTTP/1.1\\r\\nHost: ")?;
        write_escaped(writer, self.server.as_bytes(), Encoding::Ascii)?;
        writer.write_all(b"\\r\\nContent-Length: ")?;
        writer.write_all(self.body.len().numtoa(10, &mut buffer))?;
        writer.write_all(b"\\r\\n")?;

        if !self.headers.is_empty() {
            write_escaped(writer, self.headers.as_bytes(), Encoding::Ascii)?;

            if !self.headers.ends_with("\r\n") {
                writer.write_all(b"\\r\\n")?;
            }
        }

        writer.write_all(b"\\r\\n")?;
        write_escaped(writer, self.body, Encoding::Ascii)?;
        writer.write_all(b"\")")
    }
}

impl CommandErrorHandler for HttpRequestCommand<'_> {
    type Error = HttpError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        HttpError::SendFailed(error)
    }
}

/// Terminates a script block the interpreter may still wait for
#[derive(Clone, Default)]
pub struct InterpreterResetCommand;

impl Command for InterpreterResetCommand {
    const NAME: &'static str = "end";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(b"end")
    }
}

impl CommandErrorHandler for InterpreterResetCommand {
    type Error = CommandError;

    fn command_error(&self, error: CommandError) -> Self::Error {
        error
    }
}

/// Switches the baud rate of the bee UART. The answer arrives at the new rate.
#[derive(Clone)]
pub struct UartSetupCommand {
    baudrate: u32,
}

impl UartSetupCommand {
    pub fn new(baudrate: u32) -> Self {
        Self { baudrate }
    }
}

impl Command for UartSetupCommand {
    const NAME: &'static str = "uart.setup";
    const PROMPT: Prompt = Prompt::CommandReady;

    fn timeout_ms(&self, config: &Config) -> u32 {
        config.command_timeout_ms
    }

    /// UART 0, 8 data bits, no parity, one stop bit, echo enabled
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        let mut buffer = [0x0; 20];

        writer.write_all(b"uart.setup(0,")?;
        writer.write_all(self.baudrate.numtoa(10, &mut buffer))?;
        writer.write_all(b",8,0,1,1)")
    }
}
