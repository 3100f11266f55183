//! Communicate with a projector

use std::{io::{self, ErrorKind, Read, Write}, net::{TcpStream, ToSocketAddrs}};

use crate::{commands::{Command, ERROR_FRAME_LEN}, proto, ConnectOptions};

/// A trait representing a valid stream to talk to a projector on
pub trait ProjectorStream: Read + Write {}
impl<T: Read + Write> ProjectorStream for T {}

/// Lifecycle of a [Connection]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No stream is open
    Disconnected,
    /// Commands can be sent
    Connected,
}

/// A connection to a single projector.
///
/// The stream is released by [Connection::close] or when the connection is dropped,
/// whichever comes first.
pub struct Connection<S: ProjectorStream = TcpStream> {
    host: String,
    options: ConnectOptions,
    tcp: bool,
    stream: Option<S>,
}

impl Connection<TcpStream> {
    /// Prepare a connection to `host`. Nothing is opened until [Connection::connect].
    pub fn new(host: impl Into<String>, options: ConnectOptions) -> Self {
        Self { host: host.into(), options, tcp: true, stream: None }
    }

    /// Open the TCP stream
    pub fn connect(&mut self) -> Result<(), crate::Error> {
        if self.stream.is_some() {
            tracing::debug!("Already connected to {}:{}", self.host, self.options.port);
            return Ok(());
        }

        let stream = self.open_stream()?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(self.options.read_timeout)?;
        stream.set_write_timeout(self.options.write_timeout)?;

        tracing::debug!("Connected to {}:{}", self.host, self.options.port);
        self.stream = Some(stream);
        Ok(())
    }

    fn open_stream(&self) -> io::Result<TcpStream> {
        let Some(timeout) = self.options.connect_timeout else {
            return TcpStream::connect((self.host.as_str(), self.options.port));
        };

        let mut last_error = None;
        for addr in (self.host.as_str(), self.options.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            io::Error::new(ErrorKind::InvalidInput, format!("{} did not resolve to any address", self.host))
        }))
    }
}

impl<S: ProjectorStream> Connection<S> {
    /// Wrap an already open stream. `peer` is only used in logs.
    pub fn from_stream(peer: impl Into<String>, stream: S) -> Self {
        Self { host: peer.into(), options: ConnectOptions::default(), tcp: false, stream: Some(stream) }
    }

    /// Remote host this connection talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote TCP port, `None` for a connection made with [Connection::from_stream]
    pub fn port(&self) -> Option<u16> {
        self.tcp.then_some(self.options.port)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        match self.stream {
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        }
    }

    fn stream(&mut self) -> Result<&mut S, crate::Error> {
        self.stream.as_mut().ok_or(crate::Error::NotConnected)
    }

    /// Low level method to write a whole frame
    pub fn send_exact(&mut self, bytes: &[u8]) -> Result<(), crate::Error> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        tracing::trace!("Sent {:02x?}", bytes);
        Ok(())
    }

    /// Low level method to receive a frame of at most `max_len` bytes.
    ///
    /// Blocks until enough bytes arrived to tell an error frame from a full answer,
    /// then returns what was read.
    pub fn receive_exact(&mut self, max_len: usize) -> Result<Vec<u8>, crate::Error> {
        let mut frame = Vec::with_capacity(max_len);
        self.read_until(&mut frame, max_len.min(ERROR_FRAME_LEN), max_len)?;
        tracing::trace!("Received {:02x?}", frame);
        Ok(frame)
    }

    /// Receive the whole answer to `command`.
    ///
    /// A frame carrying the success header is read up to the command's response length,
    /// anything else (the error frame) is returned as soon as it is complete.
    pub fn receive_response(&mut self, command: Command) -> Result<Vec<u8>, crate::Error> {
        let len = command.response_len();
        let mut frame = self.receive_exact(len)?;

        if frame.len() < len && proto::has_success_header(command, &frame) {
            self.read_until(&mut frame, len, len)?;
            tracing::trace!("Completed {:02x?}", frame);
        }
        Ok(frame)
    }

    fn read_until(&mut self, frame: &mut Vec<u8>, minimum: usize, max_len: usize) -> Result<(), crate::Error> {
        let stream = self.stream()?;
        let mut buffer = vec![0_u8; max_len.saturating_sub(frame.len())];

        while frame.len() < minimum {
            let room = max_len - frame.len();
            match stream.read(&mut buffer[..room]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("stream ended after {} of {minimum} bytes", frame.len()),
                    ).into());
                }
                Ok(n) => frame.extend_from_slice(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Send a command and wait for its raw answer
    pub fn transact(&mut self, command: Command) -> Result<Vec<u8>, crate::Error> {
        tracing::debug!("Sending {:?} to {}", command, self.host);
        self.send_exact(proto::encode(command))?;
        self.receive_response(command)
    }

    /// Release the stream. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Closed connection to {}", self.host);
        }
    }
}

impl<S: ProjectorStream> Drop for Connection<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::collections::VecDeque;

    use super::*;

    /// In-memory projector: answers reads from queued chunks and records writes
    #[derive(Debug, Default)]
    pub struct MockStream {
        pub chunks: VecDeque<Vec<u8>>,
        pub written: Vec<u8>,
    }

    impl MockStream {
        pub fn answering(chunks: &[&[u8]]) -> Self {
            Self { chunks: chunks.iter().map(|it| it.to_vec()).collect(), written: Vec::new() }
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(mut chunk) = self.chunks.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.chunks.push_front(chunk.split_off(n));
            }
            Ok(n)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    pub fn should_assemble_frame_from_chunks() {
        let mut mock = MockStream::answering(&[&[0x22, 0x00], &[0x01, 0x00, 0x00], &[0x23, 0x00, 0x00]]);
        let mut connection = Connection::from_stream("mock", &mut mock);

        let frame = connection.receive_exact(8).unwrap();
        assert_eq!(frame, vec![0x22, 0x00, 0x01, 0x00, 0x00, 0x23, 0x00, 0x00]);
    }

    fn status_frame(status: u8) -> Vec<u8> {
        let mut frame = vec![0x20, 0x85, 0x01, 0x00, 0x10, 0x00, 0x00, status];
        frame.resize(22, 0x00);
        frame
    }

    #[test]
    pub fn should_stop_receiving_at_error_frame_length() {
        let status = status_frame(0x01);
        let mut mock = MockStream::answering(&[&status[..8], &status[8..]]);
        let mut connection = Connection::from_stream("mock", &mut mock);

        assert_eq!(connection.receive_exact(22).unwrap(), status[..8].to_vec());
    }

    #[test]
    pub fn should_complete_split_status_frame() {
        let status = status_frame(0x00);
        let ack = [0x22, 0x00, 0x01, 0x00, 0x00, 0x23, 0x00, 0x00];
        let mut mock = MockStream::answering(&[&status[..8], &status[8..15], &status[15..], &ack]);
        let mut connection = Connection::from_stream("mock", &mut mock);

        assert_eq!(connection.transact(Command::StatusRead).unwrap(), status);
        assert_eq!(connection.transact(Command::PowerOn).unwrap(), ack.to_vec());
    }

    #[test]
    pub fn should_not_wait_past_error_frame() {
        let error = [0xA0, 0x85, 0x01, 0x00, 0x02, 0x00, 0x01, 0x29];
        let mut mock = MockStream::answering(&[&error]);
        let mut connection = Connection::from_stream("mock", &mut mock);

        assert_eq!(connection.receive_response(Command::StatusRead).unwrap(), error.to_vec());
    }

    #[test]
    pub fn should_fail_when_status_frame_is_cut_short() {
        let status = status_frame(0x01);
        let mut mock = MockStream::answering(&[&status[..12]]);
        let mut connection = Connection::from_stream("mock", &mut mock);

        match connection.receive_response(Command::StatusRead) {
            Err(crate::Error::Connection(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    pub fn should_report_port_only_for_tcp_connections() {
        let options = ConnectOptions::builder().port(1515).build();
        assert_eq!(Connection::new("127.0.0.1", options).port(), Some(1515));
        assert_eq!(Connection::from_stream("mock", MockStream::default()).port(), None);
    }

    #[test]
    pub fn should_fail_on_early_end_of_stream() {
        let mut mock = MockStream::answering(&[&[0x20, 0x85, 0x01]]);
        let mut connection = Connection::from_stream("mock", &mut mock);

        match connection.receive_exact(22) {
            Err(crate::Error::Connection(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    pub fn should_send_opcode_on_transact() {
        let mut mock = MockStream::answering(&[&[0x22, 0x01, 0x01, 0x00, 0x00, 0x24, 0x00, 0x00]]);
        {
            let mut connection = Connection::from_stream("mock", &mut mock);
            connection.transact(Command::PowerOff).unwrap();
        }
        assert_eq!(mock.written, Command::PowerOff.opcode());
    }

    #[test]
    pub fn should_refuse_io_when_disconnected() {
        let mut connection = Connection::new("127.0.0.1", ConnectOptions::default());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(matches!(connection.send_exact(&[0x00]), Err(crate::Error::NotConnected)));
        assert!(matches!(connection.receive_exact(8), Err(crate::Error::NotConnected)));
    }

    #[test]
    pub fn close_is_idempotent() {
        let mut connection = Connection::from_stream("mock", MockStream::default());
        assert_eq!(connection.state(), ConnectionState::Connected);

        connection.close();
        connection.close();
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(matches!(connection.transact(Command::StatusRead), Err(crate::Error::NotConnected)));
    }
}
