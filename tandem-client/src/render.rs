//! Renderer adapter seam
//!
//! Rendering is an external capability: given a page index and a scale,
//! produce a visual surface, and report the page count of a loaded
//! document. The engine only talks to this trait; the bundled
//! [`PageTally`] adapter understands a plain-text page manifest and is
//! enough to drive the synchronization logic end to end.

use tandem_utils::{Result, TandemError};
use tracing::info;

/// External rendering capability
pub trait PageRenderer {
    /// Load a document and return its page count.
    ///
    /// Must not leave partial state behind on failure; the engine keeps
    /// its session untouched when this errors.
    fn load_document(&mut self, bytes: &[u8]) -> Result<u32>;

    /// Render one page at the given scale.
    ///
    /// Failures are reported to the user by the caller; they never end
    /// the session.
    fn render_page(&mut self, page: u32, scale: f32) -> Result<()>;
}

/// Manifest-backed renderer adapter.
///
/// The document format is a UTF-8 manifest whose first non-empty line is
/// the page count. Rendering logs the request; a real backend would draw
/// into a surface here.
#[derive(Debug, Default)]
pub struct PageTally {
    page_count: u32,
    last_rendered: Option<(u32, f32)>,
}

impl PageTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_rendered(&self) -> Option<(u32, f32)> {
        self.last_rendered
    }
}

impl PageRenderer for PageTally {
    fn load_document(&mut self, bytes: &[u8]) -> Result<u32> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| TandemError::document("manifest is not valid UTF-8"))?;

        let first = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| TandemError::document("empty page manifest"))?;

        let pages: u32 = first
            .parse()
            .map_err(|_| TandemError::document(format!("invalid page count: {:?}", first)))?;

        if pages == 0 {
            return Err(TandemError::document("document has no pages"));
        }

        self.page_count = pages;
        Ok(pages)
    }

    fn render_page(&mut self, page: u32, scale: f32) -> Result<()> {
        if page == 0 || page > self.page_count {
            return Err(TandemError::document(format!(
                "page {} out of range (1..={})",
                page, self.page_count
            )));
        }

        self.last_rendered = Some((page, scale));
        info!(page, scale, "rendered page");
        Ok(())
    }
}
