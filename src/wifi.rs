//! # WIFI access point client
//!
//! Joining a network and querying the station status is supported.
//!
//! Note: The firmware keeps trying to join in the background after `wifi.sta.connect()`. Joining
//! therefore polls the station status until the access point either assigned an IP, rejected the
//! attempt or the join timeout elapsed.
//!
//! ## Example
//!
//! ````
//! # use nodemcu_wifi_bee::example::{ExampleDelay, ExamplePin, ExampleSerial, ExampleTimer};
//! # use nodemcu_wifi_bee::responses::JoinStatus;
//! # use nodemcu_wifi_bee::wifi::{Adapter, WifiAdapter};
//! #
//! let mut adapter: Adapter<_, _, _, _, 1_000, 256> = Adapter::new(
//!     ExampleSerial::default(),
//!     ExamplePin::default(),
//!     ExampleTimer::default(),
//!     ExampleDelay::default(),
//! );
//!
//! // Bee is kept powered down while idle
//! adapter.init().unwrap();
//!
//! // Joining the access point blocks until an IP was assigned
//! adapter.power_on().unwrap();
//! adapter.join("test_wifi", "secret").unwrap();
//! assert_eq!(JoinStatus::GotIp, adapter.get_join_status().unwrap());
//!
//! adapter.disconnect().unwrap();
//! adapter.power_off().unwrap();
//! ````
use crate::channel::CommandError;
use crate::commands::{
    InterpreterResetCommand, StationConfigCommand, StationConnectCommand, StationDisconnectCommand, StatusCommand,
    UartSetupCommand, WifiModeCommand,
};
use crate::config::Config;
use crate::prompt::Prompt;
use crate::responses::{CaptureBuffer, JoinStatus};
use core::fmt::{self, Debug};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;
use heapless::String;
use log::{debug, info, warn};

/// Wifi network adapter trait
pub trait WifiAdapter {
    /// Error when joining a WIFI network
    type JoinError: Debug;

    /// Connects to an WIFI access point and blocks until an IP was assigned
    fn join(&mut self, ssid: &str, key: &str) -> Result<(), Self::JoinError>;

    /// Returns the current WIFI connection status
    fn get_join_status(&mut self) -> Result<JoinStatus, Self::JoinError>;

    /// Leaves the access point
    fn disconnect(&mut self) -> Result<(), Self::JoinError>;
}

/// Central client driving a WiFi bee running the NodeMCU Lua firmware
///
/// RX_SIZE: Capacity in bytes of the capture buffer receiving responses. Longer responses get truncated,
/// at most RX_SIZE - 1 bytes are kept.
///
/// All operations block until the awaited prompt arrived or the configured timeout elapsed. The
/// adapter must not be shared between threads, operations are strictly one at a time.
pub struct Adapter<
    'd,
    S: Read + Write + ReadReady,
    P: OutputPin,
    T: Timer<TIMER_HZ>,
    D: DelayNs,
    const TIMER_HZ: u32,
    const RX_SIZE: usize,
> {
    /// Serial connected to the bee
    pub(crate) serial: S,

    /// High => bee suspended, low => bee powered
    pub(crate) power_pin: P,

    /// Clock used for deadlines
    pub(crate) timer: T,

    /// Used for sleeping between polls
    pub(crate) delay: D,

    /// Optional sink every received byte gets echoed to
    pub(crate) diag: Option<&'d mut dyn fmt::Write>,

    /// Timeouts and poll intervals
    pub(crate) config: Config,

    /// Access point credentials, set by `set_credentials()`
    pub(crate) credentials: Option<Credentials>,

    /// Response data captured by the last read back
    pub(crate) buffer: CaptureBuffer<RX_SIZE>,

    /// True if the power pin was set to powered
    pub(crate) powered: bool,

    /// True if the last connection attempt succeeded and the connection was not closed since
    pub(crate) connected: bool,

    /// True if the single socket was handed out by `socket()`
    pub(crate) socket_allocated: bool,
}

/// Access point credentials
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Credentials {
    pub(crate) ssid: String<32>,
    pub(crate) password: String<64>,
}

/// Possible errors when joining an access point
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JoinError {
    /// No credentials were set
    MissingCredentials,

    /// Given SSD is longer then the max. size of 32 chars
    InvalidSSDLength,

    /// Given password is longer then the max. size of 64 chars
    InvalidPasswordLength,

    /// Error while setting WIFI mode to station
    ModeError(CommandError),

    /// Error while setting WIFI credentials
    CredentialsError(CommandError),

    /// Error while starting the connection attempt
    ConnectError(CommandError),

    /// Error while querying the station status
    StatusError(CommandError),

    /// Status digit was outside '0'..'5'
    InvalidStatus(u8),

    /// Access point rejected the connection attempt with the given status
    Rejected(JoinStatus),

    /// Join timeout elapsed, containing the last status reported
    Timeout(JoinStatus),

    /// Error while leaving the access point
    DisconnectError(CommandError),

    /// Error while switching power
    PowerError(CommandError),
}

impl<
        'd,
        S: Read + Write + ReadReady,
        P: OutputPin,
        T: Timer<TIMER_HZ>,
        D: DelayNs,
        const TIMER_HZ: u32,
        const RX_SIZE: usize,
    > WifiAdapter for Adapter<'d, S, P, T, D, TIMER_HZ, RX_SIZE>
{
    type JoinError = JoinError;

    /// Stores the credentials and joins the access point
    fn join(&mut self, ssid: &str, key: &str) -> Result<(), JoinError> {
        self.set_credentials(ssid, key)?;
        self.join_network()
    }

    fn get_join_status(&mut self) -> Result<JoinStatus, JoinError> {
        self.query_status()
    }

    fn disconnect(&mut self) -> Result<(), JoinError> {
        self.disconnect_network()
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
    /// Creates a new adapter. No I/O happens until the first operation, call `init()` for bringing the bee
    /// into a defined state.
    pub fn new(serial: S, power_pin: P, timer: T, delay: D) -> Self {
        Self {
            serial,
            power_pin,
            timer,
            delay,
            diag: None,
            config: Config::default(),
            credentials: None,
            buffer: CaptureBuffer::new(),
            powered: false,
            connected: false,
            socket_allocated: false,
        }
    }

    /// Powers the bee on, terminates any pending script block and powers it down again
    ///
    /// The baud rate is left unchanged, see `set_baudrate()` for switching it.
    pub fn init(&mut self) -> Result<(), CommandError> {
        self.power_off()?;
        self.power_on()?;

        let result = self.reset_interpreter();
        self.power_off()?;
        result
    }

    /// Sets the timing configuration
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Echoes every byte received from the bee to the given sink
    pub fn set_diag(&mut self, diag: &'d mut dyn fmt::Write) {
        self.diag = Some(diag);
    }

    /// Sets the access point credentials used by `join_network()`
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), JoinError> {
        let mut credentials = Credentials {
            ssid: String::new(),
            password: String::new(),
        };

        credentials.ssid.push_str(ssid).map_err(|_| JoinError::InvalidSSDLength)?;
        credentials.password.push_str(password).map_err(|_| JoinError::InvalidPasswordLength)?;

        self.credentials = Some(credentials);
        Ok(())
    }

    /// Releases the suspend line and drains the boot output
    ///
    /// Has no effect if already powered.
    pub fn power_on(&mut self) -> Result<(), CommandError> {
        if self.powered {
            return Ok(());
        }

        self.power_pin.set_low().map_err(|_| CommandError::PinError)?;
        self.powered = true;
        info!("Bee powered on");

        let settle = self.config.power_settle_ms;
        self.read_for_time(settle)?;
        Ok(())
    }

    /// Asserts the suspend line
    pub fn power_off(&mut self) -> Result<(), CommandError> {
        self.power_pin.set_high().map_err(|_| CommandError::PinError)?;
        self.powered = false;
        info!("Bee powered off");
        Ok(())
    }

    /// True if the bee was powered on by `power_on()`
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Switches the UART of the powered bee to the given baud rate
    ///
    /// No prompt is awaited, as the bee answers at the new rate. The output is drained for the command
    /// timeout plus the settle period. Afterwards the host serial has to be reconfigured to the same rate.
    /// The setting lasts until the bee loses power.
    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<(), CommandError> {
        debug!("Switching baud rate to {}", baudrate);
        self.write_command(&UartSetupCommand::new(baudrate))?;

        let duration = self.config.command_timeout_ms.saturating_add(self.config.power_settle_ms);
        self.read_for_time(duration)?;
        Ok(())
    }

    /// Terminates a script block the interpreter may still wait for
    pub fn reset_interpreter(&mut self) -> Result<(), CommandError> {
        self.send_command(InterpreterResetCommand)
    }

    /// Joins the access point using the stored credentials
    ///
    /// The firmware just acknowledges the configuration commands, so the station status is polled until
    /// an IP was assigned, the attempt was rejected or the join timeout elapsed.
    pub fn join_network(&mut self) -> Result<(), JoinError> {
        let credentials = self.credentials.clone().ok_or(JoinError::MissingCredentials)?;

        self.send_command(WifiModeCommand::station_mode())?;
        self.send_command(StationConfigCommand::new(
            credentials.ssid.as_str(),
            credentials.password.as_str(),
        ))?;
        self.send_command(StationConnectCommand)?;

        self.await_join()
    }

    /// Queries the station status
    pub fn query_status(&mut self) -> Result<JoinStatus, JoinError> {
        self.send_command(StatusCommand)?;

        let timeout = self.config.command_timeout_ms;
        let digit = self
            .next_byte(timeout)
            .map_err(JoinError::StatusError)?
            .ok_or(JoinError::StatusError(CommandError::Timeout(Prompt::Status)))?;

        JoinStatus::from_ascii(digit).ok_or(JoinError::InvalidStatus(digit))
    }

    /// Leaves the access point
    pub fn disconnect_network(&mut self) -> Result<(), JoinError> {
        self.send_command(StationDisconnectCommand)
    }

    /// Polls the station status until a terminal status was reported or the join timeout elapsed
    fn await_join(&mut self) -> Result<(), JoinError> {
        let deadline = self.deadline(self.config.join_timeout_ms);
        let mut status = JoinStatus::Connecting;

        loop {
            match self.query_status() {
                Ok(JoinStatus::GotIp) => {
                    info!("Joined access point");
                    return Ok(());
                }
                Ok(reported) if reported.is_terminal() => {
                    warn!("Joining access point failed: {}", reported.description());
                    return Err(JoinError::Rejected(reported));
                }
                Ok(reported) => status = reported,
                Err(error) => debug!("Station status query failed: {:?}", error),
            }

            if self.is_expired(deadline) {
                warn!("Joining access point timed out, last status: {}", status.description());
                return Err(JoinError::Timeout(status));
            }

            self.delay.delay_ms(self.config.status_poll_interval_ms);
        }
    }
}
