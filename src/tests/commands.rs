use crate::commands::{
    write_escaped, CloseCommand, Command, ConnectCommand, CreateConnectionCommand, Encoding, HttpRequestCommand,
    InterpreterResetCommand, ReadBackCommand, RegisterCallbackCommand, SocketEvent, StationConfigCommand,
    StationConnectCommand, StationDisconnectCommand, StatusCommand, TransmissionCommand, UartSetupCommand,
    WifiModeCommand,
};
use crate::config::Config;
use crate::prompt::Prompt;
use crate::stack::ConnectionKind;
use crate::tests::mock::MockWriter;
use alloc::string::String;
use alloc::vec::Vec;

fn command_text<Cmd: Command>(command: Cmd) -> String {
    let mut writer = MockWriter::new();
    command.write(&mut writer).unwrap();
    writer.as_string()
}

fn escaped(data: &[u8], encoding: Encoding) -> Vec<u8> {
    let mut writer = MockWriter::new();
    write_escaped(&mut writer, data, encoding).unwrap();
    writer.data
}

/// Decodes the escape sequences of a Lua string literal body
fn lua_unescape(literal: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::new();
    let mut position = 0;

    while position < literal.len() {
        if literal[position] != b'\\' {
            decoded.push(literal[position]);
            position += 1;
            continue;
        }

        let escape = literal[position + 1];
        if escape.is_ascii_digit() {
            let digits = literal[position + 1..]
                .iter()
                .take(3)
                .take_while(|byte| byte.is_ascii_digit())
                .count();
            let value = core::str::from_utf8(&literal[position + 1..position + 1 + digits])
                .unwrap()
                .parse::<u8>()
                .unwrap();

            decoded.push(value);
            position += 1 + digits;
            continue;
        }

        decoded.push(match escape {
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0B,
            other => other,
        });
        position += 2;
    }

    decoded
}

#[test]
fn test_ascii_escaping_plain_text() {
    assert_eq!(b"hallo world!".to_vec(), escaped(b"hallo world!", Encoding::Ascii));
}

#[test]
fn test_ascii_escaping_special_characters() {
    assert_eq!(
        b"\\a\\b\\f\\n\\r\\t\\v\\\\\\\"\\'\\[\\]".to_vec(),
        escaped(b"\x07\x08\x0C\n\r\t\x0B\\\"'[]", Encoding::Ascii)
    );
    assert_eq!(b"a\\\"b\\\"c".to_vec(), escaped(b"a\"b\"c", Encoding::Ascii));
}

#[test]
fn test_binary_escaping() {
    assert_eq!(b"\\000\\065\\255\\010".to_vec(), escaped(&[0, 65, 255, 10], Encoding::Binary));
}

#[test]
fn test_binary_escaping_followed_by_digit() {
    // Lua reads at most three digits, so a payload digit never extends the escape
    let encoded = escaped(&[1, b'2'], Encoding::Binary);
    assert_eq!(b"\\001\\050".to_vec(), encoded);
    assert_eq!(vec![1, b'2'], lua_unescape(&encoded));
}

#[test]
fn test_escaping_decodes_to_payload() {
    let payload: Vec<u8> = (0x07..=0x0D).chain(0x20..=0x7E).collect();

    assert_eq!(payload, lua_unescape(&escaped(&payload, Encoding::Ascii)));

    let payload: Vec<u8> = (0..=255).collect();
    assert_eq!(payload, lua_unescape(&escaped(&payload, Encoding::Binary)));
}

#[test]
fn test_ascii_escaping_never_contains_line_terminator() {
    let payload: Vec<u8> = (0x07..=0x0D).chain(0x20..=0x7E).collect();
    let encoded = escaped(&payload, Encoding::Ascii);

    assert!(!encoded.contains(&b'\r'));
    assert!(!encoded.contains(&b'\n'));
}

#[test]
fn test_ascii_escaping_pipe() {
    let encoded = escaped(b"|DS||DR|", Encoding::Ascii);

    assert_eq!(b"\\124DS\\124\\124DR\\124".to_vec(), encoded);
    assert!(!encoded.contains(&b'|'));
    assert_eq!(b"|DS||DR|".to_vec(), lua_unescape(&encoded));
}

#[test]
fn test_ascii_escaping_pipe_followed_by_digit() {
    let encoded = escaped(b"|1", Encoding::Ascii);

    assert_eq!(b"\\1241".to_vec(), encoded);
    assert_eq!(b"|1".to_vec(), lua_unescape(&encoded));
}

#[test]
fn test_wifi_commands() {
    assert_eq!("wifi.setmode(wifi.STATION)", command_text(WifiModeCommand::station_mode()));
    assert_eq!(
        "wifi.sta.config(\"test_wifi\",\"secret\")",
        command_text(StationConfigCommand::new("test_wifi", "secret"))
    );
    assert_eq!("wifi.sta.connect()", command_text(StationConnectCommand));
    assert_eq!("wifi.sta.disconnect()", command_text(StationDisconnectCommand));
    assert_eq!("end", command_text(InterpreterResetCommand));
}

#[test]
fn test_uart_setup_command() {
    assert_eq!("uart.setup(0,115200,8,0,1,1)", command_text(UartSetupCommand::new(115_200)));
    assert_eq!("uart.setup(0,9600,8,0,1,1)", command_text(UartSetupCommand::new(9_600)));
}

#[test]
fn test_station_config_escapes_credentials() {
    assert_eq!(
        "wifi.sta.config(\"my \\\"home\\\"\",\"pa\\\\ss\")",
        command_text(StationConfigCommand::new("my \"home\"", "pa\\ss"))
    );
}

#[test]
fn test_status_command_echo_contains_no_prompt() {
    let text = command_text(StatusCommand);

    assert_eq!("print(\"|\" .. \"STS|\" .. wifi.sta.status())", text);
    assert!(!text.contains("|STS|"));
}

#[test]
fn test_read_back_command_echo_contains_no_prompt() {
    let text = command_text(ReadBackCommand);

    assert_eq!("uart.write(0,\"|\" .. \"SOF|\",lastData,\"|\" .. \"EOF|\")", text);
    assert!(!text.contains("|SOF|"));
    assert!(!text.contains("|EOF|"));
}

#[test]
fn test_create_connection_command() {
    assert_eq!(
        "wifiConn=net.createConnection(net.TCP,false)",
        command_text(CreateConnectionCommand::new(ConnectionKind::Tcp))
    );
    assert_eq!(
        "wifiConn=net.createConnection(net.UDP,false)",
        command_text(CreateConnectionCommand::new(ConnectionKind::Udp))
    );
}

#[test]
fn test_register_callback_commands() {
    let texts: Vec<String> = SocketEvent::ALL
        .iter()
        .map(|event| command_text(RegisterCallbackCommand::new(*event)))
        .collect();

    assert_eq!(
        vec![
            "wifiConn:on(\"connection\",function(s) print(\"|C|\") end)",
            "wifiConn:on(\"reconnection\",function(s) print(\"|RC|\") end)",
            "wifiConn:on(\"disconnection\",function(s) print(\"|DC|\") end)",
            "wifiConn:on(\"sent\",function(s) print(\"|DS|\") end)",
            "wifiConn:on(\"receive\",function(s, d) lastData=d print(\"|DR|\") end)",
        ],
        texts
    );
}

#[test]
fn test_connect_command() {
    assert_eq!(
        "wifiConn:connect(8080,\"10.0.0.1\")",
        command_text(ConnectCommand::new("10.0.0.1", 8080))
    );
    assert_eq!("wifiConn:connect(0,\"a\")", command_text(ConnectCommand::new("a", 0)));
}

#[test]
fn test_close_command() {
    assert_eq!("wifiConn:close()", command_text(CloseCommand));
}

#[test]
fn test_transmission_command() {
    assert_eq!(
        "wifiConn:send(\"ping\\r\\n\")",
        command_text(TransmissionCommand::new(b"ping\r\n", Encoding::Ascii))
    );
    assert_eq!(
        "wifiConn:send(\"\\001\\002\")",
        command_text(TransmissionCommand::new(&[1, 2], Encoding::Binary))
    );
}

#[test]
fn test_http_request_command_get() {
    assert_eq!(
        "wifiConn:send(\"GET /index.html HTTP/1.1\\r\\nHost: example.org\\r\\nContent-Length: 0\\r\\nAccept: text/plain\\r\\n\\r\\n\")",
        command_text(HttpRequestCommand::new("GET", "example.org", "/index.html", "Accept: text/plain\r\n", &[]))
    );
}

#[test]
fn test_http_request_command_terminates_headers() {
    assert_eq!(
        "wifiConn:send(\"POST /form HTTP/1.1\\r\\nHost: example.org\\r\\nContent-Length: 3\\r\\nX-Test: 1\\r\\n\\r\\na=1\")",
        command_text(HttpRequestCommand::new("POST", "example.org", "/form", "X-Test: 1", b"a=1"))
    );
}

#[test]
fn test_http_request_command_without_headers() {
    assert_eq!(
        "wifiConn:send(\"GET / HTTP/1.1\\r\\nHost: a.b\\r\\nContent-Length: 0\\r\\n\\r\\n\")",
        command_text(HttpRequestCommand::new("GET", "a.b", "/", "", &[]))
    );
}

#[test]
fn test_http_request_content_length_counts_bytes() {
    let body = "{\"k\":\"v\"}";
    let text = command_text(HttpRequestCommand::new("POST", "a.b", "/", "", body.as_bytes()));

    assert!(text.contains("Content-Length: 9\\r\\n"));
    assert!(text.ends_with("{\\\"k\\\":\\\"v\\\"}\")"));
}

#[test]
fn test_command_prompts() {
    assert_eq!(Prompt::CommandReady, WifiModeCommand::PROMPT);
    assert_eq!(Prompt::Status, StatusCommand::PROMPT);
    assert_eq!(Prompt::Connected, <ConnectCommand<'_> as Command>::PROMPT);
    assert_eq!(Prompt::Disconnected, CloseCommand::PROMPT);
    assert_eq!(Prompt::DataSent, <TransmissionCommand<'_> as Command>::PROMPT);
    assert_eq!(Prompt::StartOfFrame, ReadBackCommand::PROMPT);
}

#[test]
fn test_command_timeouts() {
    let config = Config::default();

    assert_eq!(2_000, StationConnectCommand.timeout_ms(&config));
    assert_eq!(30_000, ConnectCommand::new("a", 1).timeout_ms(&config));
    assert_eq!(5_000, TransmissionCommand::new(&[], Encoding::Ascii).timeout_ms(&config));
    assert_eq!(2_000, ReadBackCommand.timeout_ms(&config));
}
