/// Fixed capacity region receiving the bytes captured while waiting for a prompt
///
/// Bytes beyond the capacity get silently dropped.
pub struct CaptureBuffer<const N: usize> {
    data: [u8; N],

    /// Valid bytes, always <= N
    used: usize,
}

impl<const N: usize> CaptureBuffer<N> {
    pub const fn new() -> Self {
        Self { data: [0x0; N], used: 0 }
    }

    /// Appends a byte. Returns false if the buffer is already full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.used >= N {
            return false;
        }

        self.data[self.used] = byte;
        self.used += 1;
        true
    }

    /// Shortens the valid data to the given length. Has no effect if length is greater than the current length.
    pub fn truncate(&mut self, length: usize) {
        if length < self.used {
            self.used = length;
        }
    }

    /// Removes the given number of bytes from the front
    pub fn consume(&mut self, length: usize) {
        let length = length.min(self.used);

        self.data.copy_within(length..self.used, 0);
        self.used -= length;
    }

    pub fn clear(&mut self) {
        self.used = 0;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.used]
    }

    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for CaptureBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Station status reported by `wifi.sta.status()`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JoinStatus {
    /// 0: No connection attempt in progress
    Idle,
    /// 1: Connection attempt in progress
    Connecting,
    /// 2: Access point rejected the password
    WrongPassword,
    /// 3: Access point with the given SSID not found
    NoAccessPoint,
    /// 4: Connection failed for another reason
    ConnectFailed,
    /// 5: Joined and IP assigned
    GotIp,
}

impl JoinStatus {
    /// Decodes the ASCII status digit. Returns None for anything outside '0'..'5'.
    pub fn from_ascii(digit: u8) -> Option<Self> {
        match digit {
            b'0' => Some(Self::Idle),
            b'1' => Some(Self::Connecting),
            b'2' => Some(Self::WrongPassword),
            b'3' => Some(Self::NoAccessPoint),
            b'4' => Some(Self::ConnectFailed),
            b'5' => Some(Self::GotIp),
            _ => None,
        }
    }

    /// Numeric status code
    pub fn code(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Connecting => 1,
            Self::WrongPassword => 2,
            Self::NoAccessPoint => 3,
            Self::ConnectFailed => 4,
            Self::GotIp => 5,
        }
    }

    /// True if polling may stop. Idle is not terminal, as the station reports it briefly before connecting.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::WrongPassword | Self::NoAccessPoint | Self::ConnectFailed | Self::GotIp)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::WrongPassword => "wrong password",
            Self::NoAccessPoint => "access point not found",
            Self::ConnectFailed => "connect failed",
            Self::GotIp => "got ip",
        }
    }
}

/// Separator between HTTP head and body
const HEAD_END: &[u8] = b"\r\n\r\n";

/// Extracts the status code out of the first line of a HTTP response.
///
/// Takes the first whitespace separated token which parses as a non-zero integer, so both
/// `HTTP/1.1 200 OK` and a bare `200 OK` work.
pub(crate) fn parse_status_code(response: &[u8]) -> Option<u16> {
    let line_end = response.windows(2).position(|window| window == b"\r\n").unwrap_or(response.len());

    response[..line_end]
        .split(|byte| byte.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| core::str::from_utf8(token).ok()?.parse::<u16>().ok())
        .find(|code| *code != 0)
}

/// Returns the body of a HTTP response. Empty if the head is incomplete.
pub(crate) fn http_body(response: &[u8]) -> &[u8] {
    match response.windows(HEAD_END.len()).position(|window| window == HEAD_END) {
        Some(position) => &response[position + HEAD_END.len()..],
        None => &[],
    }
}
