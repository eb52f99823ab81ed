//! Raw Annex-B elementary stream output.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use fbrec_types::{FbrecError, Result};
use tracing::debug;

use crate::encode_error;

/// MPEG end-of-stream marker appended after the last packet.
pub const END_OF_STREAM: [u8; 4] = [0x00, 0x00, 0x01, 0xb7];

/// Owns the output file for the process lifetime. Packets are appended
/// verbatim in emission order; `finish` writes the end-of-stream marker
/// exactly once and flushes.
pub struct BitstreamWriter {
    file: BufWriter<File>,
    path: PathBuf,
    bytes_written: u64,
    finished: bool,
}

impl BitstreamWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref)
            .map_err(|err| FbrecError::FileOpen(format!("{}: {err}", path_ref.display())))?;
        Ok(Self {
            file: BufWriter::new(file),
            path: path_ref.to_path_buf(),
            bytes_written: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn append_packet(&mut self, data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(encode_error("bitstream already terminated"));
        }
        self.file
            .write_all(data)
            .map_err(|err| encode_error(format!("cannot append packet: {err}")))?;
        self.bytes_written += data.len() as u64;
        debug!("appended {}-byte packet", data.len());
        Ok(())
    }

    /// Terminate the stream. Returns the total bytes written, marker
    /// included. Subsequent calls are no-ops returning the same total.
    pub fn finish(&mut self) -> Result<u64> {
        if !self.finished {
            self.file
                .write_all(&END_OF_STREAM)
                .map_err(|err| encode_error(format!("cannot write end-of-stream marker: {err}")))?;
            self.file
                .flush()
                .map_err(|err| encode_error(format!("cannot flush bitstream: {err}")))?;
            self.bytes_written += END_OF_STREAM.len() as u64;
            self.finished = true;
        }
        Ok(self.bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_always_ends_with_the_end_of_stream_marker() {
        let temp_path = std::env::temp_dir().join("fbrec-writer-test.h264");
        let mut writer = BitstreamWriter::create(&temp_path).expect("create writer");
        writer.append_packet(&[1, 2, 3]).expect("append");
        writer.append_packet(&[4, 5]).expect("append");
        let total = writer.finish().expect("finish");
        assert_eq!(total, 5 + 4);

        let bytes = std::fs::read(&temp_path).expect("read output");
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 0x00, 0x00, 0x01, 0xb7]);
        std::fs::remove_file(&temp_path).expect("cleanup output");
    }

    #[test]
    fn finish_is_idempotent_and_blocks_further_packets() {
        let temp_path = std::env::temp_dir().join("fbrec-writer-idempotent.h264");
        let mut writer = BitstreamWriter::create(&temp_path).expect("create writer");
        let first = writer.finish().expect("finish");
        let second = writer.finish().expect("finish again");
        assert_eq!(first, second);
        assert!(writer.append_packet(&[9]).is_err());

        let bytes = std::fs::read(&temp_path).expect("read output");
        assert_eq!(bytes, END_OF_STREAM);
        std::fs::remove_file(&temp_path).expect("cleanup output");
    }

    #[test]
    fn unwritable_path_is_a_file_open_error() {
        let result = BitstreamWriter::create("/nonexistent/dir/out.h264");
        assert!(matches!(result, Err(FbrecError::FileOpen(_))));
    }
}
