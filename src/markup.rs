//! Top-level block splitting of chapter markup.
//!
//! A chapter arrives as one markup string. Pagination packs whole
//! top-level block nodes, so the splitter walks the markup once and
//! yields each top-level node as an exact byte slice of the source.
//! Slicing (rather than re-serializing events) guarantees that
//! concatenating the produced blocks reproduces the original nodes
//! verbatim, attributes and nested inline markup included.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::PageflowError;

/// Limits for block splitting and markup growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkupLimits {
    /// Maximum number of top-level blocks per chapter.
    pub max_blocks: usize,
    /// Maximum UTF-8 byte length for any single block.
    pub max_block_bytes: usize,
    /// Maximum element nesting depth inside a block.
    pub max_depth: usize,
}

impl Default for MarkupLimits {
    fn default() -> Self {
        Self {
            max_blocks: 4096,
            max_block_bytes: 1024 * 1024,
            max_depth: 64,
        }
    }
}

/// Classification of a top-level block for measurement policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Root element is an image (`img`/`image`); height is clamped
    /// against the viewport before measurement.
    Image,
    /// Bare text run between top-level elements.
    Text,
    /// Any other element (paragraph, heading, list, table, ...).
    Element,
}

/// One top-level block node of chapter markup, the atomic packing unit.
///
/// Borrows from the chapter source; heights are measured per pagination
/// run and never stored here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockNode<'a> {
    /// Exact serialized markup slice for this block.
    pub markup: &'a str,
    /// Measurement classification.
    pub kind: BlockKind,
    /// Ordinal position within the chapter (0-based).
    pub index: usize,
}

/// HTML void elements never open nesting depth, even when written as
/// bare start tags (`<img ...>`) rather than self-closed.
fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "image"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn kind_for_tag(tag: &str) -> BlockKind {
    if matches!(tag, "img" | "image") {
        BlockKind::Image
    } else {
        BlockKind::Element
    }
}

fn reader_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn decode_tag_name(raw: &[u8], offset: usize) -> Result<String, PageflowError> {
    let tag = core::str::from_utf8(raw)
        .map_err(|_| PageflowError::markup("tag name is not valid UTF-8", Some(offset)))?;
    Ok(tag.to_ascii_lowercase())
}

fn slice_block(source: &str, start: usize, end: usize) -> Result<&str, PageflowError> {
    source
        .get(start..end)
        .ok_or_else(|| PageflowError::markup("block span out of bounds", Some(start)))
}

/// Collects top-level blocks while enforcing limits.
struct BlockAccumulator<'a> {
    source: &'a str,
    limits: MarkupLimits,
    blocks: Vec<BlockNode<'a>>,
    // Span of a pending top-level text run (may cover several events).
    text_span: Option<(usize, usize)>,
}

impl<'a> BlockAccumulator<'a> {
    fn new(source: &'a str, limits: MarkupLimits) -> Self {
        Self {
            source,
            limits,
            blocks: Vec::new(),
            text_span: None,
        }
    }

    fn push(&mut self, markup: &'a str, kind: BlockKind) -> Result<(), PageflowError> {
        if self.blocks.len() >= self.limits.max_blocks {
            return Err(PageflowError::LimitExceeded {
                kind: "max_blocks",
                actual: self.blocks.len() + 1,
                limit: self.limits.max_blocks,
            });
        }
        if markup.len() > self.limits.max_block_bytes {
            return Err(PageflowError::LimitExceeded {
                kind: "max_block_bytes",
                actual: markup.len(),
                limit: self.limits.max_block_bytes,
            });
        }
        let index = self.blocks.len();
        self.blocks.push(BlockNode {
            markup,
            kind,
            index,
        });
        Ok(())
    }

    fn push_span(&mut self, start: usize, end: usize, kind: BlockKind) -> Result<(), PageflowError> {
        let slice = slice_block(self.source, start, end)?;
        self.push(slice, kind)
    }

    fn extend_text(&mut self, start: usize, end: usize) {
        match &mut self.text_span {
            Some((_, span_end)) => *span_end = end,
            None => self.text_span = Some((start, end)),
        }
    }

    /// Emit any pending top-level text run; whitespace-only runs are
    /// dropped.
    fn flush_text(&mut self) -> Result<(), PageflowError> {
        if let Some((start, end)) = self.text_span.take() {
            let slice = slice_block(self.source, start, end)?;
            if !slice.trim().is_empty() {
                self.push(slice, BlockKind::Text)?;
            }
        }
        Ok(())
    }
}

/// Split chapter markup into top-level [`BlockNode`]s in document order.
///
/// Non-whitespace text between top-level elements becomes its own
/// [`BlockKind::Text`] block. Comments, processing instructions, and the
/// XML prolog are not content and are skipped. Whitespace between blocks
/// is dropped.
pub fn split_blocks<'a>(
    source: &'a str,
    limits: &MarkupLimits,
) -> Result<Vec<BlockNode<'a>>, PageflowError> {
    let mut reader = Reader::from_reader(source.as_bytes());
    let config = reader.config_mut();
    config.trim_text(false);
    // Name matching would reject the bare void tags real books carry
    // (`<br>` has no `</br>`); depth tracking below catches stray ends.
    config.check_end_names = false;
    let mut buf = Vec::with_capacity(64);

    let mut acc = BlockAccumulator::new(source, *limits);
    let mut depth = 0usize;
    // Start offset and kind of the top-level element currently open.
    let mut open_block: Option<(usize, BlockKind)> = None;

    loop {
        let event_start = reader_offset(&reader);
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = decode_tag_name(e.local_name().as_ref(), event_start)?;
                if is_void_tag(&tag) {
                    // Bare void start tag: complete node, no depth change.
                    if depth == 0 {
                        acc.flush_text()?;
                        let end = reader_offset(&reader);
                        acc.push_span(event_start, end, kind_for_tag(&tag))?;
                    }
                } else {
                    if depth == 0 {
                        acc.flush_text()?;
                        open_block = Some((event_start, kind_for_tag(&tag)));
                    }
                    depth += 1;
                    if depth > limits.max_depth {
                        return Err(PageflowError::LimitExceeded {
                            kind: "max_depth",
                            actual: depth,
                            limit: limits.max_depth,
                        });
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let tag = decode_tag_name(e.local_name().as_ref(), event_start)?;
                if depth == 0 {
                    acc.flush_text()?;
                    let end = reader_offset(&reader);
                    acc.push_span(event_start, end, kind_for_tag(&tag))?;
                }
            }
            Ok(Event::End(e)) => {
                let tag = decode_tag_name(e.local_name().as_ref(), event_start)?;
                // Closing form of a void element; depth never opened.
                if !is_void_tag(&tag) {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        PageflowError::markup("unexpected end tag at top level", Some(event_start))
                    })?;
                    if depth == 0 {
                        let (start, kind) = open_block.take().ok_or_else(|| {
                            PageflowError::markup("end tag without open block", Some(event_start))
                        })?;
                        let end = reader_offset(&reader);
                        acc.push_span(start, end, kind)?;
                    }
                }
            }
            Ok(Event::Text(_)) | Ok(Event::CData(_)) | Ok(Event::GeneralRef(_)) => {
                if depth == 0 {
                    let end = reader_offset(&reader);
                    acc.extend_text(event_start, end);
                }
            }
            Ok(Event::Eof) => {
                if depth > 0 {
                    return Err(PageflowError::markup(
                        "unexpected end of markup inside block",
                        Some(event_start),
                    ));
                }
                acc.flush_text()?;
                break;
            }
            // Prolog, comments, and processing instructions are not content.
            Ok(_) => {}
            Err(err) => {
                return Err(PageflowError::markup(
                    err.to_string(),
                    Some(reader_offset(&reader)),
                ));
            }
        }
        buf.clear();
    }

    Ok(acc.blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_paragraphs() {
        let source = "<p>one</p><p>two</p><h1>title</h1>";
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].markup, "<p>one</p>");
        assert_eq!(blocks[1].markup, "<p>two</p>");
        assert_eq!(blocks[2].markup, "<h1>title</h1>");
        assert!(blocks.iter().all(|b| b.kind == BlockKind::Element));
        assert_eq!(blocks[2].index, 2);
    }

    #[test]
    fn test_split_preserves_nested_inline_markup() {
        let source = r#"<p class="lead">a <em>styled <b>run</b></em> here</p>"#;
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].markup, source);
    }

    #[test]
    fn test_split_detects_images() {
        let source = r#"<p>before</p><img src="cover.png" height="300"/><p>after</p>"#;
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].kind, BlockKind::Image);
        assert_eq!(blocks[1].markup, r#"<img src="cover.png" height="300"/>"#);
    }

    #[test]
    fn test_split_tolerates_bare_void_tags() {
        let source = r#"<img src="a.png"><p>text<br>more</p><hr>"#;
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Image);
        assert_eq!(blocks[1].markup, "<p>text<br>more</p>");
        assert_eq!(blocks[2].markup, "<hr>");
    }

    #[test]
    fn test_split_tolerates_void_closing_forms() {
        // XHTML-style `</br>` after a bare `<br>` must not disturb the
        // blocks that follow it.
        let source = "<p>a<br></br>b</p><p>c</p>";
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].markup, "<p>a<br></br>b</p>");
        assert_eq!(blocks[1].markup, "<p>c</p>");
    }

    #[test]
    fn test_split_rejects_stray_end_tag() {
        let err = split_blocks("<p>a</p></div>", &MarkupLimits::default()).unwrap_err();
        assert!(matches!(err, PageflowError::Markup { .. }), "{err}");
    }

    #[test]
    fn test_split_emits_top_level_text_runs() {
        let source = "<p>a</p>loose words<p>b</p>";
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].kind, BlockKind::Text);
        assert_eq!(blocks[1].markup, "loose words");
    }

    #[test]
    fn test_split_drops_interblock_whitespace() {
        let source = "<p>a</p>\n  \n<p>b</p>\n";
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_split_empty_source() {
        let blocks = split_blocks("", &MarkupLimits::default()).unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_split_concatenation_round_trip() {
        let source = "<p>one</p><div><p>nested</p><ul><li>x</li></ul></div><h2>t</h2>";
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        let joined: String = blocks.iter().map(|b| b.markup).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_split_rejects_unclosed_block() {
        let source = "<p>never closed";
        let err = split_blocks(source, &MarkupLimits::default()).unwrap_err();
        assert!(matches!(err, PageflowError::Markup { .. }), "{err}");
    }

    #[test]
    fn test_split_enforces_max_blocks() {
        let source = "<p>x</p>".repeat(10);
        let limits = MarkupLimits {
            max_blocks: 4,
            ..Default::default()
        };
        let err = split_blocks(&source, &limits).unwrap_err();
        assert!(matches!(
            err,
            PageflowError::LimitExceeded {
                kind: "max_blocks",
                ..
            }
        ));
    }

    #[test]
    fn test_split_enforces_max_depth() {
        let source = "<div><div><div><p>deep</p></div></div></div>";
        let limits = MarkupLimits {
            max_depth: 2,
            ..Default::default()
        };
        let err = split_blocks(source, &limits).unwrap_err();
        assert!(matches!(
            err,
            PageflowError::LimitExceeded {
                kind: "max_depth",
                ..
            }
        ));
    }

    #[test]
    fn test_split_enforces_max_block_bytes() {
        let body = "x".repeat(128);
        let source = format!("<p>{}</p>", body);
        let limits = MarkupLimits {
            max_block_bytes: 64,
            ..Default::default()
        };
        let err = split_blocks(&source, &limits).unwrap_err();
        assert!(matches!(
            err,
            PageflowError::LimitExceeded {
                kind: "max_block_bytes",
                ..
            }
        ));
    }

    #[test]
    fn test_split_skips_prolog_and_comments() {
        let source = "<?xml version=\"1.0\"?><!-- chapter --><p>body</p>";
        let blocks = split_blocks(source, &MarkupLimits::default()).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].markup, "<p>body</p>");
    }
}
