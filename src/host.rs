//! Host-delegated capabilities, injected explicitly rather than looked up
//! ambiently: byte fetching, bitmap decoding and the wall clock.

use std::time::Instant;

use crate::error::{SvgaError, SvgaResult};

/// Fetches raw container bytes for a locator string. Implementations
/// branch on the scheme prefix; the crate ships a local-file loader and
/// hosts provide remote retrieval.
pub trait ResourceLoader {
    fn fetch(&mut self, locator: &str) -> SvgaResult<Vec<u8>>;
}

impl<F> ResourceLoader for F
where
    F: FnMut(&str) -> SvgaResult<Vec<u8>>,
{
    fn fetch(&mut self, locator: &str) -> SvgaResult<Vec<u8>> {
        self(locator)
    }
}

/// Loads `file://` locators and bare filesystem paths. Remote schemes are
/// rejected with a fetch error so a missing network capability surfaces
/// immediately instead of as a decode failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileLoader;

impl ResourceLoader for FileLoader {
    fn fetch(&mut self, locator: &str) -> SvgaResult<Vec<u8>> {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            return Err(SvgaError::fetch(format!(
                "remote locator '{locator}' requires a host-provided loader"
            )));
        }
        let path = locator.strip_prefix("file://").unwrap_or(locator);
        std::fs::read(path).map_err(|e| SvgaError::fetch(format!("{path}: {e}")))
    }
}

/// Decodes raw encoded bitmap bytes into the surface's drawable image type.
pub trait BitmapDecoder {
    type Image;

    fn decode(&mut self, bytes: &[u8]) -> SvgaResult<Self::Image>;
}

/// Millisecond time source for the animator; injected so playback is
/// deterministic under test.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_loader_rejects_remote_schemes() {
        let err = FileLoader.fetch("https://cdn.example.com/anim.svga").unwrap_err();
        assert!(matches!(err, SvgaError::Fetch(_)));
    }

    #[test]
    fn file_loader_reports_missing_files_as_fetch_errors() {
        let err = FileLoader.fetch("file:///nonexistent/anim.svga").unwrap_err();
        assert!(matches!(err, SvgaError::Fetch(_)));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
