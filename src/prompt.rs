//! # Firmware prompts
//!
//! The Lua firmware signals the completion of an action by printing a fixed literal. The callbacks
//! registered by [open_connection](crate::wifi::Adapter::open_connection) print the connection
//! related prompts, the interactive interpreter prints [Prompt::CommandReady] after every line.

/// Literal delimiters printed by the firmware, one per event
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    /// Interpreter accepted the line and is ready for the next one
    CommandReady,
    /// Socket connected to the remote
    Connected,
    /// Socket reconnected to the remote
    Reconnected,
    /// Socket disconnected
    Disconnected,
    /// Data was sent by the socket
    DataSent,
    /// Data was received by the socket
    DataReceived,
    /// Station status report, followed by a single status digit
    Status,
    /// Start of a frame written back by the firmware
    StartOfFrame,
    /// End of a frame written back by the firmware
    EndOfFrame,
}

impl Prompt {
    /// Returns the literal printed by the firmware
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            Prompt::CommandReady => b"\r\n> ",
            Prompt::Connected => b"|C|",
            Prompt::Reconnected => b"|RC|",
            Prompt::Disconnected => b"|DC|",
            Prompt::DataSent => b"|DS|",
            Prompt::DataReceived => b"|DR|",
            Prompt::Status => b"|STS|",
            Prompt::StartOfFrame => b"|SOF|",
            Prompt::EndOfFrame => b"|EOF|",
        }
    }
}

/// Streaming matcher detecting a prompt in a sequence of single bytes
///
/// Preceding noise is tolerated. State is just the count of prompt bytes matched so far.
#[derive(Clone, Debug)]
pub struct PromptScanner<'a> {
    prompt: &'a [u8],

    /// Count of prompt bytes matched so far
    index: usize,
}

impl<'a> PromptScanner<'a> {
    pub fn new(prompt: &'a [u8]) -> Self {
        Self { prompt, index: 0 }
    }

    /// Feeds the next byte. Returns true if the byte completed the prompt.
    ///
    /// The scanner starts over after a reported match.
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.prompt.is_empty() {
            return true;
        }

        if self.prompt[self.index] == byte {
            self.index += 1;
        } else {
            self.index = self.fallback(byte);
        }

        if self.index == self.prompt.len() {
            self.index = 0;
            return true;
        }

        false
    }

    /// Count of prompt bytes matched so far
    pub fn index(&self) -> usize {
        self.index
    }

    /// Starts over
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Longest prompt prefix which is a suffix of the matched bytes followed by the mismatching byte.
    ///
    /// The bytes matched so far are always `prompt[..index]`, so no history needs to be kept.
    fn fallback(&self, byte: u8) -> usize {
        for length in (1..=self.index).rev() {
            if self.prompt[length - 1] == byte
                && self.prompt[self.index + 1 - length..self.index] == self.prompt[..length - 1]
            {
                return length;
            }
        }

        0
    }
}
