//! Frame sources feeding the pipeline.
//!
//! The detector/tracker runs outside this process. Frames arrive either as
//! newline-delimited JSON records (a file, a pipe, stdin) or through an in-process
//! channel.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sst_models::{Detection, FrameRecord};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::metrics;

/// One frame of detector output, stamped with a monotonic capture time.
#[derive(Debug, Clone)]
pub struct Frame {
    pub detections: Vec<Detection>,
    /// Model inference latency in milliseconds
    pub inference_ms: f64,
    pub captured_at: Instant,
}

impl Frame {
    /// Frame captured now.
    pub fn new(detections: Vec<Detection>, inference_ms: f64) -> Self {
        Self::captured_at(detections, inference_ms, Instant::now())
    }

    /// Frame with an explicit capture time.
    pub fn captured_at(detections: Vec<Detection>, inference_ms: f64, captured_at: Instant) -> Self {
        Self {
            detections,
            inference_ms,
            captured_at,
        }
    }
}

/// Produces frames until the stream ends.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, `Ok(None)` when the stream is exhausted.
    async fn next_frame(&mut self) -> EngineResult<Option<Frame>>;
}

/// Parse one JSON frame record. Undecodable detections are dropped, not fatal.
pub fn parse_record(line: &str) -> EngineResult<FrameRecord> {
    Ok(serde_json::from_str(line)?)
}

/// Reads newline-delimited JSON frame records.
///
/// A record's optional `t` (seconds since stream start) is applied to the instant the
/// source was created, so recorded streams replay with their original timing.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_number: u64,
    origin: Instant,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            origin: Instant::now(),
        }
    }

    /// Lines consumed so far, including blank ones.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Capture time for a record. Offsets the clock cannot represent fall back to now.
    fn timestamp(&self, t: Option<f64>) -> Instant {
        let Some(secs) = t else {
            return Instant::now();
        };
        let at = Duration::try_from_secs_f64(secs.max(0.0))
            .ok()
            .and_then(|offset| self.origin.checked_add(offset));
        match at {
            Some(at) => at,
            None => {
                warn!(line = self.line_number, t = secs, "Frame offset out of range, using arrival time");
                Instant::now()
            }
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a recording or named pipe.
    pub async fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| {
            EngineError::source(format!("cannot open {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Reading frames from file");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonLinesSource<BufReader<Stdin>> {
    /// Read frames piped into this process.
    pub fn stdin() -> Self {
        info!("Reading frames from stdin");
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> FrameSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_frame(&mut self) -> EngineResult<Option<Frame>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                debug!(lines = self.line_number, "Frame stream ended");
                return Ok(None);
            };
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record = parse_record(line)
                .map_err(|e| EngineError::invalid_frame(self.line_number, e.to_string()))?;
            if record.malformed > 0 {
                warn!(
                    line = self.line_number,
                    skipped = record.malformed,
                    "Skipping undecodable detections"
                );
                metrics::record_detection_skipped("undecodable", record.malformed);
            }
            let captured_at = self.timestamp(record.t);

            return Ok(Some(Frame::captured_at(
                record.detections,
                record.inference_ms,
                captured_at,
            )));
        }
    }
}

/// Frames pushed in-process through a channel. Ends when every sender is dropped.
pub struct ChannelSource {
    rx: mpsc::Receiver<Frame>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new(buffer: usize) -> (mpsc::Sender<Frame>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> EngineResult<Option<Frame>> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sst_models::BoundingBox;

    fn source(input: &'static str) -> JsonLinesSource<&'static [u8]> {
        JsonLinesSource::new(input.as_bytes())
    }

    #[tokio::test]
    async fn test_reads_records_and_skips_blank_lines() {
        let mut src = source(
            "{\"detections\":[{\"track_id\":5,\"class_id\":2,\"bbox\":[0,0,10,10]}],\"inference_ms\":12.5}\n\
             \n\
             {\"detections\":[]}\n",
        );

        let first = src.next_frame().await.unwrap().unwrap();
        assert_eq!(first.detections, vec![Detection::new(5, 2, BoundingBox::new(0, 0, 10, 10))]);
        assert_eq!(first.inference_ms, 12.5);

        let second = src.next_frame().await.unwrap().unwrap();
        assert!(second.detections.is_empty());
        assert_eq!(src.line_number(), 3);

        assert!(src.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recorded_offsets_drive_timestamps() {
        let mut src = source("{\"t\":0}\n{\"t\":61.5}\n");
        let a = src.next_frame().await.unwrap().unwrap();
        let b = src.next_frame().await.unwrap().unwrap();
        assert_eq!(b.captured_at - a.captured_at, Duration::from_millis(61_500));
    }

    #[tokio::test]
    async fn test_invalid_json_reports_line() {
        let mut src = source("{\"detections\":[]}\nnot json\n");
        assert!(src.next_frame().await.unwrap().is_some());

        let err = src.next_frame().await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidFrame { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_malformed_detection_keeps_frame_and_stream() {
        let mut src = source(
            "{\"detections\":[{\"track_id\":1,\"class_id\":2,\"bbox\":[0,0,10,10]},{\"track_id\":2,\"class_id\":2,\"bbox\":[0,0,10]}],\"inference_ms\":4.0}\n\
             {\"detections\":[{\"track_id\":3,\"class_id\":0,\"bbox\":[0.5,0.2,10.7,10.1]}]}\n",
        );

        let first = src.next_frame().await.unwrap().unwrap();
        assert_eq!(first.detections, vec![Detection::new(1, 2, BoundingBox::new(0, 0, 10, 10))]);

        let second = src.next_frame().await.unwrap().unwrap();
        assert_eq!(second.detections, vec![Detection::new(3, 0, BoundingBox::new(0, 0, 10, 10))]);
        assert!(src.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unrepresentable_offset_uses_arrival_time() {
        let mut src = source("{\"detections\":[],\"inference_ms\":1.0,\"t\":1e19}\n");
        let before = Instant::now();
        let frame = src.next_frame().await.unwrap().unwrap();
        assert!(frame.captured_at >= before);
        assert!(frame.captured_at <= Instant::now());
    }

    #[tokio::test]
    async fn test_missing_track_id_is_accepted() {
        let mut src = source("{\"detections\":[{\"class_id\":0,\"bbox\":[1,2,3,4]}]}\n");
        let frame = src.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.detections[0].track_id, None);
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut src) = ChannelSource::new(4);
        tx.send(Frame::new(Vec::new(), 3.0)).await.unwrap();
        drop(tx);

        assert!(src.next_frame().await.unwrap().is_some());
        assert!(src.next_frame().await.unwrap().is_none());
    }
}
