//! End-to-end parse/dump through the memory-block stream layer

use core::cell::{Cell, RefCell};

use heapless::String;
use ucini_core::{
    decode_decimal, dump, dump_with_options, parse, parse_stream, Access, DumpError, Field,
    FieldDescriptor, Options, Schema, Section, ValueError,
};
use ucini_stream::{
    BlockId, IoStream, MemoryBlocks, MemoryStream, OpenMode, StreamError, StreamSource,
};

const BLOCK: BlockId = BlockId(3);

/// Host state for a small network device
#[derive(Default)]
struct Device {
    hostname: RefCell<String<16>>,
    port: Cell<u16>,
    retries: Cell<u8>,
    offset: Cell<i8>,
    timeout: Cell<i32>,
    serial: Cell<u32>,
    // bit 0: dhcp, bit 1: verbose, bits 2-4: log level
    flags: Cell<u8>,
}

fn net_entries(device: &Device) -> [FieldDescriptor<'_>; 4] {
    [
        FieldDescriptor::new("hostname", Field::text(&device.hostname)),
        FieldDescriptor::new("port", Field::u16(&device.port)),
        FieldDescriptor::new("dhcp", Field::flag(&device.flags, 0)),
        FieldDescriptor::new("retries", Field::u8(&device.retries)),
    ]
}

fn sys_entries(device: &Device) -> [FieldDescriptor<'_>; 5] {
    [
        FieldDescriptor::new("offset", Field::i8(&device.offset)),
        FieldDescriptor::new("timeout", Field::i32(&device.timeout)),
        FieldDescriptor::new("serial", Field::u32(&device.serial)),
        FieldDescriptor::new("verbose", Field::flag(&device.flags, 1)),
        FieldDescriptor::new("level", Field::bits(&device.flags, 2, 3)),
    ]
}

/// Parse `text` into `device` and return the count
fn parse_text(device: &Device, text: &[u8]) -> usize {
    let net = net_entries(device);
    let sys = sys_entries(device);
    let sections = [Section::new("net", &net), Section::new("sys", &sys)];
    let schema = Schema::new(&sections);

    let mut region = [0u8; 256];
    region[..text.len()].copy_from_slice(text);
    let mut blocks: MemoryBlocks<'_, 1> = MemoryBlocks::new();
    blocks.insert(BLOCK, &mut region).unwrap();
    parse(&schema, &mut blocks, &BLOCK).unwrap()
}

/// Dump `device` with `options`, returning the count and the text
fn dump_text(device: &Device, options: &Options) -> (usize, String<256>) {
    let net = net_entries(device);
    let sys = sys_entries(device);
    let sections = [Section::new("net", &net), Section::new("sys", &sys)];
    let schema = Schema::new(&sections);

    let mut region = [0u8; 256];
    let mut blocks: MemoryBlocks<'_, 1> = MemoryBlocks::new();
    blocks.insert(BLOCK, &mut region).unwrap();
    let count = dump_with_options(&schema, &mut blocks, &BLOCK, options).unwrap();
    let text = String::try_from(blocks.text(BLOCK).unwrap()).unwrap();
    (count, text)
}

fn sample_device() -> Device {
    let device = Device::default();
    *device.hostname.borrow_mut() = String::try_from("node 7").unwrap();
    device.port.set(8080);
    device.retries.set(3);
    device.offset.set(-12);
    device.timeout.set(-300_000);
    device.serial.set(u32::MAX);
    device.flags.set(0b0001_0101);
    device
}

fn snapshot(device: &Device) -> (String<16>, u16, u8, i8, i32, u32, u8) {
    (
        device.hostname.borrow().clone(),
        device.port.get(),
        device.retries.get(),
        device.offset.get(),
        device.timeout.get(),
        device.serial.get(),
        device.flags.get(),
    )
}

#[test]
fn test_net_example() {
    let port = Cell::new(0u16);
    let flags = Cell::new(0u8);
    let net = [
        FieldDescriptor::new("port", Field::u16(&port)),
        FieldDescriptor::new("dhcp", Field::flag(&flags, 0)),
    ];
    let sections = [Section::new("net", &net)];
    let schema = Schema::new(&sections);

    let mut region = *b"[net]\nport=8080\ndhcp=y\n";
    let mut blocks: MemoryBlocks<'_, 1> = MemoryBlocks::new();
    blocks.insert(BLOCK, &mut region).unwrap();

    assert_eq!(parse(&schema, &mut blocks, &BLOCK), Ok(2));
    assert_eq!(port.get(), 8080);
    assert_eq!(flags.get() & 1, 1);
}

#[test]
fn test_unknown_section_changes_nothing() {
    let device = sample_device();
    let before = snapshot(&device);

    assert_eq!(parse_text(&device, b"[wifi]\nport=80\n"), 0);
    assert_eq!(snapshot(&device), before);
}

#[test]
fn test_bad_value_does_not_stop_the_section() {
    let device = Device::default();
    device.port.set(1);

    let count = parse_text(&device, b"[net]\nport=not_a_number\nretries=5\ndhcp=y\n");

    assert_eq!(count, 2);
    assert_eq!(device.port.get(), 1);
    assert_eq!(device.retries.get(), 5);
    assert_eq!(device.flags.get(), 0b0000_0001);
}

#[test]
fn test_comments_blank_lines_and_crlf() {
    let device = Device::default();
    let text = b"; device config\r\n\r\n[net]\r\nhostname=lab bench ; bench unit\r\nport=22\r\n\r\n[sys]\r\nverbose=1";

    assert_eq!(parse_text(&device, text), 3);
    assert_eq!(device.hostname.borrow().as_str(), "lab bench ");
    assert_eq!(device.port.get(), 22);
    assert_eq!(device.flags.get(), 0b0000_0010);
}

#[test]
fn test_dump_format() {
    let device = sample_device();
    let (count, text) = dump_text(&device, &Options::default());

    assert_eq!(count, 9);
    assert_eq!(
        text.as_str(),
        "[net]\nhostname=node 7\nport=8080\ndhcp=y\nretries=3\n\
         [sys]\noffset=-12\ntimeout=-300000\nserial=-1\nverbose=n\nlevel=5\n"
    );
}

#[test]
fn test_dump_exact_unsigned() {
    let device = sample_device();
    let (_, text) = dump_text(&device, &Options::exact());
    assert!(text.contains("serial=4294967295\n"));
}

#[test]
fn test_dump_then_parse_round_trip() {
    for options in [Options::default(), Options::exact()] {
        let original = sample_device();
        let (written, text) = dump_text(&original, &options);

        let restored = Device::default();
        let read = parse_text(&restored, text.as_bytes());

        assert_eq!(read, written);
        assert_eq!(snapshot(&restored), snapshot(&original));
    }
}

#[test]
fn test_key_order_does_not_change_outcome() {
    let forward = b"[net]\nhostname=a\nport=1\ndhcp=y\nretries=2\n\
                    [sys]\noffset=-1\ntimeout=9\nserial=7\nverbose=y\nlevel=6\n";
    let reverse = b"[sys]\nlevel=6\nverbose=y\nserial=7\ntimeout=9\noffset=-1\n\
                    [net]\nretries=2\ndhcp=y\nport=1\nhostname=a\n";

    let a = Device::default();
    let b = Device::default();
    let count_a = parse_text(&a, forward);
    let count_b = parse_text(&b, reverse);

    assert_eq!(count_a, 9);
    assert_eq!(count_a, count_b);
    assert_eq!(snapshot(&a), snapshot(&b));
}

#[test]
fn test_missing_block() {
    let port = Cell::new(0u16);
    let net = [FieldDescriptor::new("port", Field::u16(&port))];
    let sections = [Section::new("net", &net)];
    let schema = Schema::new(&sections);
    let mut blocks: MemoryBlocks<'_, 1> = MemoryBlocks::new();

    assert_eq!(
        parse(&schema, &mut blocks, &BlockId(9)),
        Err(StreamError::NotFound)
    );
    assert_eq!(
        dump(&schema, &mut blocks, &BlockId(9)),
        Err(DumpError {
            stream: StreamError::NotFound,
            written: 0
        })
    );
}

#[test]
fn test_dump_aborts_when_block_is_full() {
    let a = Cell::new(1u8);
    let b = Cell::new(2u8);
    let entries = [
        FieldDescriptor::new("a", Field::u8(&a)),
        FieldDescriptor::new("b", Field::u8(&b)),
    ];
    let sections = [Section::new("s", &entries)];
    let schema = Schema::new(&sections);

    // Room for "[s]\n" and "a=1\n" only
    let mut region = [0u8; 9];
    let mut blocks: MemoryBlocks<'_, 1> = MemoryBlocks::new();
    blocks.insert(BLOCK, &mut region).unwrap();

    assert_eq!(
        dump(&schema, &mut blocks, &BLOCK),
        Err(DumpError {
            stream: StreamError::Full,
            written: 1
        })
    );
}

#[test]
fn test_callback_field() {
    // Temperature stored in tenths of a degree, written as whole degrees
    let tenths = Cell::new(0i32);
    let handler = |access: Access<'_>| -> Result<(), ValueError> {
        match access {
            Access::Read(text) => {
                let degrees = decode_decimal(text)?;
                if !(-40..=125).contains(&degrees) {
                    return Err(ValueError::Rejected);
                }
                tenths.set(degrees as i32 * 10);
                Ok(())
            }
            Access::Write(out) => {
                ucini_core::encode_decimal(out, i64::from(tenths.get() / 10))?;
                Ok(())
            }
        }
    };
    let entries = [FieldDescriptor::new("temp", Field::callback(&handler))];
    let sections = [Section::new("sensor", &entries)];
    let schema = Schema::new(&sections);

    let mut input = *b"[sensor]\ntemp=500\ntemp=21\n";
    let mut stream = MemoryStream::new(&mut input, OpenMode::Read);
    assert_eq!(parse_stream(&schema, &mut stream), 1);
    assert_eq!(tenths.get(), 210);

    let mut region = [0u8; 32];
    let mut blocks: MemoryBlocks<'_, 1> = MemoryBlocks::new();
    blocks.insert(BLOCK, &mut region).unwrap();
    assert_eq!(dump(&schema, &mut blocks, &BLOCK), Ok(1));
    assert_eq!(blocks.text(BLOCK), Some("[sensor]\ntemp=21\n"));
}

#[test]
fn test_parse_over_embedded_io() {
    let port = Cell::new(0u16);
    let net = [FieldDescriptor::new("port", Field::u16(&port))];
    let sections = [Section::new("net", &net)];
    let schema = Schema::new(&sections);

    let mut stream = IoStream::new(Device2Host(b"[net]\nport=443"));
    assert_eq!(parse_stream(&schema, &mut stream), 1);
    assert_eq!(port.get(), 443);
}

#[test]
fn test_overlong_line_is_clipped_not_fatal() {
    let device = Device::default();
    let mut text: heapless::Vec<u8, 256> = heapless::Vec::new();
    text.extend_from_slice(b"[net]\nhostname=").unwrap();
    text.extend_from_slice(&[b'x'; 100]).unwrap();
    text.extend_from_slice(b"\nport=9\n").unwrap();

    // The clipped hostname is still too long for its field, port still applies
    assert_eq!(parse_text(&device, &text), 1);
    assert_eq!(device.port.get(), 9);
    assert!(device.hostname.borrow().is_empty());
}

#[test]
fn test_corrupt_bytes_leave_value_untouched() {
    let device = Device::default();
    device.port.set(80);
    *device.hostname.borrow_mut() = String::try_from("gw").unwrap();

    let count = parse_text(&device, b"[net]\nport=8\xff080\nhostname=caf\xe9 bar\nretries=4\n");

    assert_eq!(count, 1);
    assert_eq!(device.port.get(), 80);
    assert_eq!(device.hostname.borrow().as_str(), "gw");
    assert_eq!(device.retries.get(), 4);
}

#[test]
fn test_read_error_ends_parse_and_closes() {
    let device = Device::default();
    let net = net_entries(&device);
    let sections = [Section::new("net", &net)];
    let schema = Schema::new(&sections);

    // Link drops after "port=7\n", before the retries line
    let input = b"[net]\nport=7\nretries=3\n";
    let mut link = Link::new(input, 13);
    assert_eq!(parse(&schema, &mut link, &()), Ok(1));

    assert_eq!(device.port.get(), 7);
    assert_eq!(device.retries.get(), 0);
    assert_eq!(link.flushes, 1);
}

#[test]
fn test_dump_closes_stream() {
    let device = sample_device();
    let net = net_entries(&device);
    let sections = [Section::new("net", &net)];
    let schema = Schema::new(&sections);

    let mut link = Link::new(b"", usize::MAX);
    assert_eq!(dump(&schema, &mut link, &()), Ok(4));

    assert_eq!(link.flushes, 1);
    assert!(link.output.starts_with(b"[net]\nhostname=node 7\n"));
}

#[test]
fn test_dump_reports_failed_close() {
    let device = sample_device();
    let net = net_entries(&device);
    let sections = [Section::new("net", &net)];
    let schema = Schema::new(&sections);

    let mut link = Link::new(b"", usize::MAX);
    link.fail_flush = true;

    assert_eq!(
        dump(&schema, &mut link, &()),
        Err(DumpError {
            stream: StreamError::Io,
            written: 4
        })
    );
    assert_eq!(link.flushes, 1);
}

#[test]
fn test_write_error_still_closes() {
    let device = sample_device();
    let net = net_entries(&device);
    let sections = [Section::new("net", &net)];
    let schema = Schema::new(&sections);

    // Fails partway through the hostname line
    let mut link = Link::new(b"", 10);

    assert_eq!(
        dump(&schema, &mut link, &()),
        Err(DumpError {
            stream: StreamError::Io,
            written: 0
        })
    );
    assert_eq!(link.flushes, 1);
}

/// Serial link that fails after a fixed number of bytes in either direction
struct Link {
    input: &'static [u8],
    budget: usize,
    output: heapless::Vec<u8, 256>,
    flushes: usize,
    fail_flush: bool,
}

impl Link {
    fn new(input: &'static [u8], budget: usize) -> Self {
        Self {
            input,
            budget,
            output: heapless::Vec::new(),
            flushes: 0,
            fail_flush: false,
        }
    }
}

impl embedded_io::ErrorType for Link {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for Link {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.budget == 0 {
            return Err(embedded_io::ErrorKind::BrokenPipe);
        }
        let n = buf.len().min(self.input.len()).min(self.budget);
        buf[..n].copy_from_slice(&self.input[..n]);
        self.input = &self.input[n..];
        self.budget -= n;
        Ok(n)
    }
}

impl embedded_io::Write for Link {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.budget == 0 {
            return Err(embedded_io::ErrorKind::BrokenPipe);
        }
        let n = buf.len().min(self.budget);
        self.output
            .extend_from_slice(&buf[..n])
            .map_err(|_| embedded_io::ErrorKind::OutOfMemory)?;
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        if self.fail_flush {
            Err(embedded_io::ErrorKind::Other)
        } else {
            Ok(())
        }
    }
}

impl StreamSource for Link {
    type Id = ();
    type Stream<'s>
        = IoStream<&'s mut Link>
    where
        Self: 's;

    fn open(&mut self, _id: &(), _mode: OpenMode) -> Result<Self::Stream<'_>, StreamError> {
        Ok(IoStream::new(self))
    }
}

/// Read-only byte source standing in for a UART
struct Device2Host(&'static [u8]);

impl embedded_io::ErrorType for Device2Host {
    type Error = core::convert::Infallible;
}

impl embedded_io::Read for Device2Host {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.0.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}

impl embedded_io::Write for Device2Host {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_dump_parse_restores_state(
            hostname in "[a-z0-9 ]{0,16}",
            port in any::<u16>(),
            retries in any::<u8>(),
            offset in any::<i8>(),
            timeout in any::<i32>(),
            serial in any::<u32>(),
            flags in 0u8..32,
            exact in any::<bool>(),
        ) {
            let original = Device::default();
            *original.hostname.borrow_mut() = String::try_from(hostname.as_str()).unwrap();
            original.port.set(port);
            original.retries.set(retries);
            original.offset.set(offset);
            original.timeout.set(timeout);
            original.serial.set(serial);
            original.flags.set(flags);

            let options = if exact { Options::exact() } else { Options::default() };
            let (written, text) = dump_text(&original, &options);

            let restored = Device::default();
            prop_assert_eq!(parse_text(&restored, text.as_bytes()), written);
            prop_assert_eq!(snapshot(&restored), snapshot(&original));
        }
    }
}
