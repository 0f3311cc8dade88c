//! Mocks for doc examples
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_io::{ErrorType, Read, ReadReady, Write};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer;
use heapless::{Deque, Vec};

/// Serial mock answering every line like a bee running the Lua firmware
#[derive(Default)]
pub struct ExampleSerial {
    /// Currently written line
    line: Vec<u8, 512>,

    /// Output of the firmware not read yet
    output: Deque<u8, 512>,

    /// True if the last sent payload was a HTTP request
    http_request: bool,
}

impl ExampleSerial {
    fn respond(&mut self) {
        let line = self.line.as_slice();

        let response: &[u8] = if line.starts_with(b"print(") {
            b"|STS|5\r\n> "
        } else if line.starts_with(b"wifiConn:connect(") {
            b"\r\n> |C|\r\n"
        } else if line.starts_with(b"wifiConn:close(") {
            b"\r\n> |DC|\r\n"
        } else if line.starts_with(b"wifiConn:send(") {
            self.http_request = line.windows(8).any(|window| window == b"HTTP/1.1");
            b"\r\n> |DS|\r\n|DR|\r\n"
        } else if line.starts_with(b"uart.write(") && self.http_request {
            b"|SOF|HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello|EOF|\r\n> "
        } else if line.starts_with(b"uart.write(") {
            b"|SOF|nice to see you!|EOF|\r\n> "
        } else {
            b"\r\n> "
        };

        for byte in response {
            let _ = self.output.push_back(*byte);
        }
    }
}

impl ErrorType for ExampleSerial {
    type Error = Infallible;
}

impl Write for ExampleSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for byte in buf {
            if *byte == b'\n' {
                self.respond();
                self.line.clear();
            } else {
                let _ = self.line.push(*byte);
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Read for ExampleSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;

        while count < buf.len() {
            match self.output.pop_front() {
                Some(byte) => buf[count] = byte,
                None => break,
            }

            count += 1;
        }

        Ok(count)
    }
}

impl ReadReady for ExampleSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.output.is_empty())
    }
}

/// Power pin mock
#[derive(Default)]
pub struct ExamplePin {
    high: bool,
}

impl ExamplePin {
    /// True if the bee is suspended
    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl PinErrorType for ExamplePin {
    type Error = Infallible;
}

impl OutputPin for ExamplePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// Timer mock advancing one millisecond on every query
#[derive(Default)]
pub struct ExampleTimer {
    ticks: u32,
}

impl Timer<1_000> for ExampleTimer {
    type Error = Infallible;

    fn now(&mut self) -> TimerInstantU32<1_000> {
        self.ticks = self.ticks.wrapping_add(1);
        TimerInstantU32::from_ticks(self.ticks)
    }

    fn start(&mut self, _duration: TimerDurationU32<1_000>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// Delay mock returning immediately
#[derive(Default)]
pub struct ExampleDelay {}

impl DelayNs for ExampleDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
