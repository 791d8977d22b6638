use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Chain, Cursor, Read};
use std::path::Path;

type PeekedFile = Chain<Cursor<Vec<u8>>, File>;

/// Compression formats a rotated log may come in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
    None,
}

impl Compression {
    /// Detect by magic bytes: gzip (1F 8B 08), zstd (28 B5 2F FD)
    pub fn detect(head: &[u8]) -> Self {
        match head {
            [0x1F, 0x8B, 0x08, ..] => Compression::Gzip,
            [0x28, 0xB5, 0x2F, 0xFD, ..] => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Buffered reader over a log file, decompressing on the fly
pub enum LogStream {
    Gzip(BufReader<MultiGzDecoder<PeekedFile>>),
    Zstd(BufReader<zstd::Decoder<'static, BufReader<PeekedFile>>>),
    Plain(BufReader<PeekedFile>),
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStream::Gzip(_) => write!(f, "LogStream::Gzip"),
            LogStream::Zstd(_) => write!(f, "LogStream::Zstd"),
            LogStream::Plain(_) => write!(f, "LogStream::Plain"),
        }
    }
}

impl LogStream {
    /// Open a log file regardless of whether it is compressed
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut file = File::open(path)?;

        let mut head = [0u8; 4];
        let n = read_head(&mut file, &mut head)?;
        let compression = Compression::detect(&head[..n]);

        // Put the peeked bytes back in front of the rest of the file
        let source = Cursor::new(head[..n].to_vec()).chain(file);

        Ok(match compression {
            Compression::Gzip => LogStream::Gzip(BufReader::new(MultiGzDecoder::new(source))),
            Compression::Zstd => LogStream::Zstd(BufReader::new(zstd::Decoder::new(source)?)),
            Compression::None => LogStream::Plain(BufReader::new(source)),
        })
    }

    pub fn compression(&self) -> Compression {
        match self {
            LogStream::Gzip(_) => Compression::Gzip,
            LogStream::Zstd(_) => Compression::Zstd,
            LogStream::Plain(_) => Compression::None,
        }
    }

    /// Read the next line into `buf`, newline included. Bytes that are not
    /// valid UTF-8 are replaced. Returns 0 at end of stream.
    pub fn read_log_line(&mut self, bytes: &mut Vec<u8>, buf: &mut String) -> io::Result<usize> {
        bytes.clear();
        buf.clear();
        let n = self.read_until(b'\n', bytes)?;
        buf.push_str(&String::from_utf8_lossy(bytes));
        Ok(n)
    }
}

// A short read is fine for tiny files; keep going until the buffer is full or EOF
fn read_head(file: &mut File, head: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < head.len() {
        match file.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl Read for LogStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            LogStream::Gzip(reader) => reader.read(buf),
            LogStream::Zstd(reader) => reader.read(buf),
            LogStream::Plain(reader) => reader.read(buf),
        }
    }
}

impl BufRead for LogStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            LogStream::Gzip(reader) => reader.fill_buf(),
            LogStream::Zstd(reader) => reader.fill_buf(),
            LogStream::Plain(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            LogStream::Gzip(reader) => reader.consume(amt),
            LogStream::Zstd(reader) => reader.consume(amt),
            LogStream::Plain(reader) => reader.consume(amt),
        }
    }
}
