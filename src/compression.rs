use std::io::Write;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;

/// Compression format
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Compression {
    /// The bzip2 format
    Bzip2,
    /// The gzip format with compression level as associated value
    Gzip(u8),
    /// The lz4 format with compression level as associated value
    Lz4(u8),
    /// The zstd format with compression level as associated value
    Zstd(u8),
}

impl Compression {
    /// Conventional file name suffix, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Bzip2 => "bz2",
            Compression::Gzip(_) => "gz",
            Compression::Lz4(_) => "lz4",
            Compression::Zstd(_) => "zst",
        }
    }
}

/// A writer compressing into an underlying writer
///
/// Compressed streams end with a trailer that is only written by
/// [CompressWriter::finish]. Dropping the writer without finishing it
/// leaves an incomplete stream.
pub enum CompressWriter<W: Write> {
    Plain(W),
    Bzip2(BzEncoder<W>),
    Gzip(GzEncoder<W>),
    Lz4(lz4::Encoder<W>),
    Zstd(zstd::Encoder<'static, W>),
}

impl<W: Write> CompressWriter<W> {
    /// Write the end of the compressed stream and return the inner writer
    pub fn finish(self) -> std::io::Result<W> {
        use CompressWriter::*;
        match self {
            Plain(w) => Ok(w),
            Bzip2(encoder) => encoder.finish(),
            Gzip(encoder) => encoder.finish(),
            Lz4(encoder) => {
                let (w, res) = encoder.finish();
                res.map(|_| w)
            }
            Zstd(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for CompressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        use CompressWriter::*;
        match self {
            Plain(w) => w.write(buf),
            Bzip2(encoder) => encoder.write(buf),
            Gzip(encoder) => encoder.write(buf),
            Lz4(encoder) => encoder.write(buf),
            Zstd(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        use CompressWriter::*;
        match self {
            Plain(w) => w.flush(),
            Bzip2(encoder) => encoder.flush(),
            Gzip(encoder) => encoder.flush(),
            Lz4(encoder) => encoder.flush(),
            Zstd(encoder) => encoder.flush(),
        }
    }
}

/// Convert into a writer that compresses to the given format
pub fn compress_writer<W: Write>(
    writer: W,
    compression: Option<Compression>,
) -> Result<CompressWriter<W>, std::io::Error> {
    let writer = match compression {
        Some(Compression::Bzip2) => CompressWriter::Bzip2(BzEncoder::new(
            writer,
            bzip2::Compression::best(),
        )),
        Some(Compression::Gzip(lvl)) => CompressWriter::Gzip(GzEncoder::new(
            writer,
            flate2::Compression::new(lvl.into()),
        )),
        Some(Compression::Lz4(lvl)) => CompressWriter::Lz4(
            lz4::EncoderBuilder::new().level(lvl.into()).build(writer)?,
        ),
        Some(Compression::Zstd(lvl)) => {
            CompressWriter::Zstd(zstd::Encoder::new(writer, lvl.into())?)
        }
        None => CompressWriter::Plain(writer),
    };
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{ErrorKind, Read};

    const ALL: [Compression; 4] = [
        Compression::Bzip2,
        Compression::Gzip(9),
        Compression::Lz4(4),
        Compression::Zstd(19),
    ];

    fn text() -> String {
        "objects: {}\n".repeat(100)
    }

    fn compressed(compression: Compression) -> Vec<u8> {
        let mut writer = compress_writer(Vec::new(), Some(compression)).unwrap();
        writer.write_all(text().as_bytes()).unwrap();
        writer.finish().unwrap()
    }

    // accepts `capacity` bytes, then fails like a full disk
    struct Full {
        capacity: usize,
    }

    impl Write for Full {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.capacity == 0 && !buf.is_empty() {
                return Err(std::io::Error::new(ErrorKind::Other, "no space left"));
            }
            let len = buf.len().min(self.capacity);
            self.capacity -= len;
            Ok(len)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn compressed_round_trip() {
        let text = text();
        for compression in ALL {
            let buf = compressed(compression);
            assert!(buf.len() < text.len(), "{}", compression.extension());
            let mut read = String::new();
            audec::auto_decompress(buf.as_slice())
                .read_to_string(&mut read)
                .unwrap();
            assert_eq!(read, text);
        }
    }

    #[test]
    fn truncated_stream() {
        for compression in ALL {
            let len = compressed(compression).len();
            let full = Full { capacity: len - 1 };
            let Ok(mut writer) = compress_writer(full, Some(compression)) else {
                continue;
            };
            let res = match writer.write_all(text().as_bytes()) {
                Ok(()) => writer.finish().map(|_| ()),
                Err(err) => Err(err),
            };
            assert!(res.is_err(), "{}", compression.extension());
        }
    }
}
