use crate::commands::{Command, CommandErrorHandler};
use crate::prompt::{Prompt, PromptScanner};
use crate::wifi::Adapter;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_io::{Read, ReadReady, Write};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer;
use log::{debug, trace, warn};

/// Errors of a single command/prompt exchange
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// Expected prompt did not arrive in time
    Timeout(Prompt),

    /// Reading from or writing to the serial failed
    TransportError,

    /// Power pin could not be switched
    PinError,
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
    /// Sends a command line and waits for its prompt. Errors are mapped by the command.
    ///
    /// Pending input is discarded beforehand, so a prompt of an earlier exchange never confirms the command.
    pub(crate) fn send_command<Cmd: Command + CommandErrorHandler>(&mut self, command: Cmd) -> Result<(), Cmd::Error> {
        debug!("Sending command {}", Cmd::NAME);
        let timeout = command.timeout_ms(&self.config);

        self.write_command(&command)
            .and_then(|_| self.await_prompt(Cmd::PROMPT, timeout))
            .map_err(|error| command.command_error(error))
    }

    /// Writes the command as single line
    pub(crate) fn write_command<Cmd: Command>(&mut self, command: &Cmd) -> Result<(), CommandError> {
        self.flush_input()?;

        command.write(&mut self.serial).map_err(|_| CommandError::TransportError)?;
        self.serial.write_all(b"\r\n").map_err(|_| CommandError::TransportError)?;
        self.serial.flush().map_err(|_| CommandError::TransportError)
    }

    /// Blocks until the prompt was received or the timeout elapsed
    pub(crate) fn await_prompt(&mut self, prompt: Prompt, timeout_ms: u32) -> Result<(), CommandError> {
        self.scan(prompt, timeout_ms, false)?;
        Ok(())
    }

    /// Like `await_prompt()`, but every received byte gets stored in the capture buffer, excluding the prompt.
    /// Returns the number of bytes stored, which is at most `RX_SIZE - 1`.
    ///
    /// On timeout the bytes received so far are kept.
    pub(crate) fn capture_until(&mut self, prompt: Prompt, timeout_ms: u32) -> Result<usize, CommandError> {
        self.buffer.clear();
        let limit = RX_SIZE.saturating_sub(1);

        match self.scan(prompt, timeout_ms, true) {
            Ok(streamed) => {
                // Prompt bytes were stored as well, as a match is known just on the last byte
                self.buffer.truncate(limit.min(streamed - prompt.as_bytes().len()));
                Ok(self.buffer.len())
            }
            Err(error) => {
                self.buffer.truncate(limit);
                Err(error)
            }
        }
    }

    /// Reads bytes until the prompt matched. Returns the number of bytes read including the prompt.
    fn scan(&mut self, prompt: Prompt, timeout_ms: u32, capture: bool) -> Result<usize, CommandError> {
        let deadline = self.deadline(timeout_ms);
        let mut scanner = PromptScanner::new(prompt.as_bytes());
        let mut streamed = 0;

        loop {
            if self.is_expired(deadline) {
                warn!("Timeout while waiting for prompt {:?}", prompt);
                return Err(CommandError::Timeout(prompt));
            }

            match self.read_byte()? {
                Some(byte) => {
                    streamed += 1;

                    if capture {
                        self.buffer.push(byte);
                    }

                    if scanner.feed(byte) {
                        return Ok(streamed);
                    }
                }
                None => self.sleep(),
            }
        }
    }

    /// Waits for a single byte. Returns None on timeout.
    pub(crate) fn next_byte(&mut self, timeout_ms: u32) -> Result<Option<u8>, CommandError> {
        let deadline = self.deadline(timeout_ms);

        loop {
            if let Some(byte) = self.read_byte()? {
                return Ok(Some(byte));
            }

            if self.is_expired(deadline) {
                return Ok(None);
            }

            self.sleep();
        }
    }

    /// Reads and discards everything received in the given time. Returns the number of bytes drained.
    pub fn read_for_time(&mut self, duration_ms: u32) -> Result<usize, CommandError> {
        let deadline = self.deadline(duration_ms);
        let mut count = 0;

        while !self.is_expired(deadline) {
            match self.read_byte()? {
                Some(_) => count += 1,
                None => self.sleep(),
            }
        }

        trace!("Drained {} bytes in {} ms", count, duration_ms);
        Ok(count)
    }

    /// Discards all pending input. Returns the number of bytes drained.
    pub fn flush_input(&mut self) -> Result<usize, CommandError> {
        let mut count = 0;

        while self.read_byte()?.is_some() {
            count += 1;
        }

        if count > 0 {
            trace!("Flushed {} pending bytes", count);
        }

        Ok(count)
    }

    /// Reads a single byte if available and echoes it to the diagnostic sink
    fn read_byte(&mut self) -> Result<Option<u8>, CommandError> {
        if !self.serial.read_ready().map_err(|_| CommandError::TransportError)? {
            return Ok(None);
        }

        let mut byte = [0x0; 1];
        if self.serial.read(&mut byte).map_err(|_| CommandError::TransportError)? == 0 {
            return Ok(None);
        }

        if let Some(diag) = self.diag.as_deref_mut() {
            let _ = core::fmt::Write::write_char(diag, byte[0] as char);
        }

        Ok(Some(byte[0]))
    }

    pub(crate) fn deadline(&mut self, timeout_ms: u32) -> TimerInstantU32<TIMER_HZ> {
        self.timer.now() + TimerDurationU32::<TIMER_HZ>::millis(timeout_ms)
    }

    pub(crate) fn is_expired(&mut self, deadline: TimerInstantU32<TIMER_HZ>) -> bool {
        self.timer.now() >= deadline
    }

    fn sleep(&mut self) {
        self.delay.delay_ms(self.config.poll_quantum_ms);
    }
}
