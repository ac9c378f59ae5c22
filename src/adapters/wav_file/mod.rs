// WAV adapter - Streams PCM or float WAV/BW64 sample data through hound

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec};
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{BlockDescription, SampleBlock};
use crate::ports::SampleSource;

/// Reads a WAV file in fixed-size blocks, taking channel count and sample
/// rate from its header. Integer samples are scaled to `[-1.0, 1.0)`.
pub struct WavFileSource<R: Read = BufReader<File>> {
    reader: WavReader<R>,
    spec: WavSpec,
    block_size: usize,
    frames_read: u64,
}

fn wav_error(context: &str, e: hound::Error) -> DomainError {
    match e {
        hound::Error::IoError(io) if io.kind() == ErrorKind::NotFound => {
            DomainError::FileNotFound(context.to_string())
        }
        hound::Error::IoError(io) => {
            DomainError::ProcessingError(format!("Failed to read {}: {}", context, io))
        }
        other => DomainError::InvalidFormat(format!("{}: {}", context, other)),
    }
}

impl WavFileSource<BufReader<File>> {
    /// Open a WAV file
    pub fn open(path: &Path, block_size: usize) -> Result<Self, DomainError> {
        let context = path.display().to_string();
        let reader = WavReader::open(path).map_err(|e| wav_error(&context, e))?;
        Self::from_wav(reader, block_size, &context)
    }
}

impl<R: Read> WavFileSource<R> {
    /// Wrap any reader positioned at the start of a WAV stream
    pub fn from_reader(reader: R, block_size: usize) -> Result<Self, DomainError> {
        let reader = WavReader::new(reader).map_err(|e| wav_error("WAV stream", e))?;
        Self::from_wav(reader, block_size, "WAV stream")
    }

    fn from_wav(reader: WavReader<R>, block_size: usize, context: &str) -> Result<Self, DomainError> {
        let spec = reader.spec();
        if block_size == 0 {
            return Err(DomainError::BadArgs("Block size cannot be zero".to_string()));
        }
        // Validates channel count and rate
        BlockDescription::new(block_size, spec.channels as usize, spec.sample_rate)?;
        debug!(
            source = context,
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            format = ?spec.sample_format,
            block_size,
            "Opened WAV source"
        );
        Ok(Self {
            reader,
            spec,
            block_size,
            frames_read: 0,
        })
    }

    /// Frames delivered so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Total frames declared by the header
    pub fn frame_count(&self) -> u64 {
        u64::from(self.reader.duration())
    }

    fn read_samples(&mut self, wanted: usize) -> Result<Vec<f32>, DomainError> {
        let samples: Result<Vec<f32>, hound::Error> = match self.spec.sample_format {
            SampleFormat::Float => self.reader.samples::<f32>().take(wanted).collect(),
            SampleFormat::Int => {
                let scale = (1u64 << (self.spec.bits_per_sample.saturating_sub(1))) as f32;
                self.reader
                    .samples::<i32>()
                    .take(wanted)
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect()
            }
        };
        samples.map_err(|e| wav_error("WAV samples", e))
    }
}

impl<R: Read> SampleSource for WavFileSource<R> {
    fn next_block(&mut self) -> Result<Option<SampleBlock>, DomainError> {
        let channels = self.spec.channels as usize;
        let data = self.read_samples(self.block_size * channels)?;
        if data.is_empty() {
            return Ok(None);
        }
        if data.len() % channels != 0 {
            return Err(DomainError::InvalidFormat(format!(
                "Sample stream ends inside a frame after {} frames",
                self.frames_read + (data.len() / channels) as u64
            )));
        }

        let frames = data.len() / channels;
        self.frames_read += frames as u64;
        let info = BlockDescription::new(frames, channels, self.spec.sample_rate)?;
        SampleBlock::new(info, data).map(Some)
    }

    fn channel_count(&self) -> usize {
        self.spec.channels as usize
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }
}
