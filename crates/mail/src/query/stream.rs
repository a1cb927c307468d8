//! Bounded-memory chunked delivery for "show everything" requests
//!
//! A [`ChunkStream`] hands out fixed-size chunks one at a time. Before each
//! chunk a [`ResourceGuard`] samples process memory; once the limit is
//! crossed the stream yields a single `ResourceExceeded` error and ends.
//! Chunks already handed out stay valid.

use log::{debug, warn};
use std::iter::Peekable;
use std::sync::Arc;

use crate::error::{MailError, Result};

/// Chunk size used when none is configured
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Result counts above this get a one-time warning before streaming
pub const LARGE_RESULT_THRESHOLD: usize = 1000;

const MEMORY_RESOURCE: &str = "Memory (MB)";

/// Whether a result set is large enough to warn about
pub fn is_large_result(total: usize) -> bool {
    total > LARGE_RESULT_THRESHOLD
}

/// Source of the current process's memory usage
pub trait MemoryProbe {
    /// Resident memory in MiB, or `None` if it cannot be measured
    fn resident_mb(&self) -> Option<f64>;
}

impl<P: MemoryProbe + ?Sized> MemoryProbe for Arc<P> {
    fn resident_mb(&self) -> Option<f64> {
        (**self).resident_mb()
    }
}

/// Reads resident set size from procfs; unmeasurable elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemory;

impl MemoryProbe for ProcessMemory {
    #[cfg(target_os = "linux")]
    fn resident_mb(&self) -> Option<f64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
        let kb: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
        Some(kb / 1024.0)
    }

    #[cfg(not(target_os = "linux"))]
    fn resident_mb(&self) -> Option<f64> {
        None
    }
}

/// Memory pre-check run at every chunk boundary
pub struct ResourceGuard {
    max_memory_mb: f64,
    probe: Box<dyn MemoryProbe>,
}

impl ResourceGuard {
    /// Guard backed by the process's own memory usage
    pub fn new(max_memory_mb: f64) -> Self {
        Self::with_probe(max_memory_mb, Box::new(ProcessMemory))
    }

    pub fn with_probe(max_memory_mb: f64, probe: Box<dyn MemoryProbe>) -> Self {
        Self {
            max_memory_mb,
            probe,
        }
    }

    pub fn max_memory_mb(&self) -> f64 {
        self.max_memory_mb
    }

    /// Fail with `ResourceExceeded` if usage is above the limit
    ///
    /// An unmeasurable process always passes.
    pub fn check(&self) -> Result<()> {
        match self.probe.resident_mb() {
            Some(observed) if observed > self.max_memory_mb => {
                warn!(
                    "Memory usage {:.1} MB is above the {:.1} MB limit",
                    observed, self.max_memory_mb
                );
                Err(MailError::ResourceExceeded {
                    resource: MEMORY_RESOURCE,
                    observed,
                    limit: self.max_memory_mb,
                })
            }
            Some(observed) => {
                debug!("Memory check passed: {:.1} MB", observed);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Lazy, non-restartable sequence of chunks
///
/// Yields `Ok(chunk)` until the source is exhausted. A tripped guard yields
/// one `Err` and the stream is finished from then on.
pub struct ChunkStream<I: Iterator> {
    source: Peekable<I>,
    chunk_size: usize,
    guard: Option<ResourceGuard>,
    delivered: usize,
    finished: bool,
}

impl<I: Iterator> ChunkStream<I> {
    /// Fails with `InvalidArgument` when `chunk_size` is 0
    pub fn new<S>(source: S, chunk_size: usize) -> Result<Self>
    where
        S: IntoIterator<IntoIter = I>,
    {
        if chunk_size == 0 {
            return Err(MailError::invalid_argument(
                "Chunk size must be a positive number",
            ));
        }
        Ok(Self {
            source: source.into_iter().peekable(),
            chunk_size,
            guard: None,
            delivered: 0,
            finished: false,
        })
    }

    /// Check `guard` before producing each chunk
    pub fn with_guard(mut self, guard: ResourceGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunks handed out so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl<I: Iterator> Iterator for ChunkStream<I> {
    type Item = Result<Vec<I::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.source.peek().is_none() {
            self.finished = true;
            return None;
        }
        if let Some(guard) = &self.guard
            && let Err(e) = guard.check()
        {
            self.finished = true;
            return Some(Err(e));
        }

        let chunk: Vec<_> = self.source.by_ref().take(self.chunk_size).collect();
        self.delivered += 1;
        debug!("Streaming chunk {} ({} items)", self.delivered, chunk.len());
        Some(Ok(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Reports the next scripted reading on each call
    struct ScriptedProbe {
        readings: Vec<f64>,
        calls: Rc<Cell<usize>>,
    }

    impl MemoryProbe for ScriptedProbe {
        fn resident_mb(&self) -> Option<f64> {
            let i = self.calls.get();
            self.calls.set(i + 1);
            self.readings.get(i).copied()
        }
    }

    fn sizes<T>(stream: ChunkStream<impl Iterator<Item = T>>) -> Vec<usize> {
        stream.map(|c| c.unwrap().len()).collect()
    }

    #[test]
    fn test_even_chunks() {
        let stream = ChunkStream::new(0..100, 50).unwrap();
        assert_eq!(sizes(stream), vec![50, 50]);
    }

    #[test]
    fn test_short_last_chunk() {
        let stream = ChunkStream::new(0..25, 10).unwrap();
        assert_eq!(sizes(stream), vec![10, 10, 5]);
    }

    #[test]
    fn test_order_preserved() {
        let chunks: Vec<Vec<i32>> = ChunkStream::new(1..=5, 2)
            .unwrap()
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_empty_source() {
        let mut stream = ChunkStream::new(Vec::<u8>::new(), DEFAULT_CHUNK_SIZE).unwrap();
        assert!(stream.next().is_none());
        assert_eq!(stream.delivered(), 0);
    }

    #[test]
    fn test_zero_chunk_size_is_invalid() {
        assert!(matches!(
            ChunkStream::new(0..3, 0),
            Err(MailError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_shared_probe() {
        let probe: Arc<dyn MemoryProbe> = Arc::new(ScriptedProbe {
            readings: vec![2048.0],
            calls: Rc::new(Cell::new(0)),
        });
        let guard = ResourceGuard::with_probe(1024.0, Box::new(Arc::clone(&probe)));
        assert!(matches!(
            guard.check(),
            Err(MailError::ResourceExceeded { .. })
        ));
    }

    #[test]
    fn test_guard_trips_between_chunks() {
        let calls = Rc::new(Cell::new(0));
        let probe = ScriptedProbe {
            readings: vec![100.0, 200.0, 900.0, 100.0],
            calls: Rc::clone(&calls),
        };
        let guard = ResourceGuard::with_probe(512.0, Box::new(probe));
        let mut stream = ChunkStream::new(0..100, 10).unwrap().with_guard(guard);

        assert_eq!(stream.next().unwrap().unwrap().len(), 10);
        assert_eq!(stream.next().unwrap().unwrap().len(), 10);

        let err = stream.next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Memory (MB) limit exceeded: 900.0 > 512.0");
        assert!(stream.next().is_none());
        assert_eq!(stream.delivered(), 2);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_guard_not_consulted_after_last_chunk() {
        let calls = Rc::new(Cell::new(0));
        let probe = ScriptedProbe {
            readings: vec![1.0, 1.0],
            calls: Rc::clone(&calls),
        };
        let guard = ResourceGuard::with_probe(512.0, Box::new(probe));
        let stream = ChunkStream::new(0..20, 10).unwrap().with_guard(guard);
        assert_eq!(sizes(stream), vec![10, 10]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_unmeasurable_memory_passes() {
        let probe = ScriptedProbe {
            readings: Vec::new(),
            calls: Rc::new(Cell::new(0)),
        };
        assert!(ResourceGuard::with_probe(0.0, Box::new(probe)).check().is_ok());
    }

    #[test]
    fn test_large_result_threshold() {
        assert!(!is_large_result(LARGE_RESULT_THRESHOLD));
        assert!(is_large_result(LARGE_RESULT_THRESHOLD + 1));
    }
}
