/// Timing of the command/prompt exchanges. All values in milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Waiting for the interpreter prompt and other short acknowledgements
    pub command_timeout_ms: u32,

    /// Overall deadline for joining an access point
    pub join_timeout_ms: u32,

    /// Waiting for the remote server to accept the connection
    pub server_connect_timeout_ms: u32,

    /// Waiting for the sent confirmation of the socket
    pub send_timeout_ms: u32,

    /// Waiting for a response of the remote after sending
    pub receive_timeout_ms: u32,

    /// Waiting for the frame prompts when reading back the last response
    pub read_back_timeout_ms: u32,

    /// Time the firmware needs to boot after powering on. Output is drained meanwhile.
    pub power_settle_ms: u32,

    /// Sleep between two checks for available bytes
    pub poll_quantum_ms: u32,

    /// Sleep between two status queries while joining
    pub status_poll_interval_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_timeout_ms: 2_000,
            join_timeout_ms: 20_000,
            server_connect_timeout_ms: 30_000,
            send_timeout_ms: 5_000,
            receive_timeout_ms: 15_000,
            read_back_timeout_ms: 2_000,
            power_settle_ms: 2_500,
            poll_quantum_ms: 10,
            status_poll_interval_ms: 500,
        }
    }
}
