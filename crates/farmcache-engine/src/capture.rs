//! Response capture adapter
//!
//! Thin I/O shim between a response pipeline and the output-cache
//! orchestrator: buffers the finished byte output of a page render and
//! hands it to `set_output` on completion. Capture is refused up front
//! when the page's variation count has already reached the configured
//! ceiling.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use farmcache_domain::error::Result;
use farmcache_domain::ports::OutputCachingCapability;

use crate::output::OutputCacheOrchestrator;

/// Buffers one page response for the output cache
pub struct ResponseCapture {
    output: OutputCacheOrchestrator,
    page_id: i64,
    cache_key: String,
    duration: Duration,
    buffer: Vec<u8>,
    errored: bool,
}

impl ResponseCapture {
    /// Start capturing a page render
    ///
    /// `max_variations` bounds how many variations of one page may be
    /// cached; at the ceiling the capture is created in an errored state
    /// and [`finish`](Self::finish) becomes a no-op.
    pub async fn begin(
        output: &OutputCacheOrchestrator,
        page_id: i64,
        vary_by: &BTreeMap<String, String>,
        duration: Duration,
        max_variations: Option<usize>,
    ) -> Self {
        let cache_key = output.generate_key(page_id, vary_by);
        let errored = match max_variations {
            Some(max) => output.variation_count(page_id).await >= max,
            None => false,
        };
        Self {
            output: output.clone(),
            page_id,
            cache_key,
            duration,
            buffer: Vec::new(),
            errored,
        }
    }

    /// The cache key this capture will store under
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Whether the capture was refused
    pub fn has_errored(&self) -> bool {
        self.errored
    }

    /// Bytes buffered so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been buffered yet
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Hand the buffered response to the output cache
    pub async fn finish(self) -> Result<()> {
        if self.errored {
            return Ok(());
        }
        self.output
            .set_output(self.page_id, &self.cache_key, self.duration, &self.buffer)
            .await
    }
}

impl io::Write for ResponseCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for ResponseCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCapture")
            .field("page_id", &self.page_id)
            .field("cache_key", &self.cache_key)
            .field("buffered", &self.buffer.len())
            .field("errored", &self.errored)
            .finish()
    }
}
