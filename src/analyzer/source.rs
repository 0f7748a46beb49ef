//! audio sources that feed the streaming controller
//!
//! The pipeline doesn't care whether samples arrive from a WAV file or a
//! FIFO written by a capture process; it only wants "the next chunk, or
//! nothing ready yet, or the stream ended".  Push-style delivery can be
//! adapted by writing into a pipe and pulling from the other end.
use byteorder::{ByteOrder, LittleEndian};
use hound::{SampleFormat, WavReader};
use log::info;
use simple_error::bail;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};

use crate::common::box_error::BoxError;

#[derive(Debug, PartialEq)]
pub enum ChunkRead {
    /// some samples arrived; length is whatever was available
    Audio(Vec<i16>),
    /// nothing ready this cycle, try again later
    NotReady,
    /// the stream is done, no more data will come
    Finished,
}

#[cfg_attr(test, mockall::automock)]
pub trait BlockSource {
    fn next_chunk(&mut self) -> Result<ChunkRead, BoxError>;
    fn get_sample_rate(&self) -> u32;
}

/// Reads mono 16-bit WAV files, a hop worth of samples at a time.
pub struct WavFileSource {
    reader: WavReader<BufReader<File>>,
    sample_rate: u32,
    chunk_size: usize,
}

impl WavFileSource {
    pub fn open(path: &str, chunk_size: usize) -> Result<WavFileSource, BoxError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        if spec.channels != 1 {
            bail!("{} has {} channels, expected mono", path, spec.channels);
        }
        if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
            bail!("{} is not 16-bit integer PCM", path);
        }
        info!("reading {} at {} Hz", path, spec.sample_rate);
        Ok(WavFileSource {
            reader,
            sample_rate: spec.sample_rate,
            chunk_size,
        })
    }
}

impl BlockSource for WavFileSource {
    fn next_chunk(&mut self) -> Result<ChunkRead, BoxError> {
        let mut chunk: Vec<i16> = Vec::with_capacity(self.chunk_size);
        for sample in self.reader.samples::<i16>().take(self.chunk_size) {
            chunk.push(sample?);
        }
        if chunk.is_empty() {
            return Ok(ChunkRead::Finished);
        }
        Ok(ChunkRead::Audio(chunk))
    }

    fn get_sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Pulls raw little-endian 16-bit PCM from any reader, typically a FIFO fed
/// by a capture process.  A reader in non-blocking mode reports WouldBlock,
/// which maps to NotReady rather than an error.
pub struct RawPcmSource<R: Read> {
    reader: R,
    sample_rate: u32,
    chunk_bytes: usize,
    pending: Vec<u8>,
}

impl<R: Read> RawPcmSource<R> {
    pub fn build(reader: R, sample_rate: u32, chunk_size: usize) -> RawPcmSource<R> {
        RawPcmSource {
            reader,
            sample_rate,
            chunk_bytes: chunk_size * 2,
            pending: vec![],
        }
    }
}

impl<R: Read> BlockSource for RawPcmSource<R> {
    fn next_chunk(&mut self) -> Result<ChunkRead, BoxError> {
        let mut buf = vec![0u8; self.chunk_bytes];
        match self.reader.read(&mut buf) {
            Ok(0) => Ok(ChunkRead::Finished),
            Ok(count) => {
                self.pending.extend_from_slice(&buf[..count]);
                let whole = self.pending.len() / 2;
                if whole == 0 {
                    // a lone byte waits for its other half
                    return Ok(ChunkRead::NotReady);
                }
                let mut chunk = vec![0i16; whole];
                LittleEndian::read_i16_into(&self.pending[..whole * 2], &mut chunk);
                self.pending.drain(..whole * 2);
                Ok(ChunkRead::Audio(chunk))
            }
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::Interrupted => Ok(ChunkRead::NotReady),
                _ => Err(e.into()),
            },
        }
    }

    fn get_sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
