use mupdf::TextPageOptions;

use super::document::PdfDocument;
use super::page_index::PageIndex;
use crate::error::ConversionError;

/// A paragraph of text extracted from a PDF page
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub text: String,
    /// Bounding box in page coordinates (origin top-left)
    pub bbox: BoundingBox,
    /// Font size estimated from line height
    pub font_size: f32,
    pub line_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    fn union(self, other: Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    fn from_quad(quad: &mupdf::Quad) -> Self {
        Self {
            x0: quad.ul.x.min(quad.ur.x).min(quad.ll.x).min(quad.lr.x),
            y0: quad.ul.y.min(quad.ur.y).min(quad.ll.y).min(quad.lr.y),
            x1: quad.ul.x.max(quad.ur.x).max(quad.ll.x).max(quad.lr.x),
            y1: quad.ul.y.max(quad.ur.y).max(quad.ll.y).max(quad.lr.y),
        }
    }
}

/// Text and geometry of one page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    pub blocks: Vec<TextBlock>,
}

/// Text extraction from PDF pages
pub struct TextExtractor<'a> {
    pub doc: &'a PdfDocument,
    /// Join words hyphenated across line and block breaks
    pub dehyphenate: bool,
    /// Blocks shorter than this (in bytes) are dropped
    pub min_length: usize,
}

impl<'a> TextExtractor<'a> {
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self {
            doc,
            dehyphenate: true,
            min_length: 1,
        }
    }

    /// Extract paragraph blocks and page size for `page_num` (zero-based).
    ///
    /// Each MuPDF block is one paragraph; its lines are joined with spaces.
    pub fn extract_page(&self, page_num: usize) -> Result<PageText, ConversionError> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;
        let extraction_error = |reason: String| ConversionError::TextExtraction {
            page: page_num,
            reason,
        };

        let doc = self.doc.open()?;
        let page = doc
            .load_page(page_index.into())
            .map_err(|e| extraction_error(format!("failed to load page: {e}")))?;
        let bounds = page
            .bounds()
            .map_err(|e| extraction_error(format!("failed to read page bounds: {e}")))?;
        let text_page = page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| extraction_error(format!("failed to get text page: {e}")))?;

        let mut blocks = Vec::new();

        for block in text_page.blocks() {
            let mut block_text = String::new();
            let mut block_bbox: Option<BoundingBox> = None;
            let mut line_heights: Vec<f32> = Vec::new();

            for line in block.lines() {
                let mut line_text = String::new();
                let mut line_bbox: Option<BoundingBox> = None;

                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        line_text.push(c);
                    }
                    let char_bbox = BoundingBox::from_quad(&text_char.quad());
                    line_bbox = Some(line_bbox.map_or(char_bbox, |b| b.union(char_bbox)));
                    block_bbox = Some(block_bbox.map_or(char_bbox, |b| b.union(char_bbox)));
                }

                let line_trimmed = line_text.trim();
                if line_trimmed.is_empty() {
                    continue;
                }
                if let Some(lb) = line_bbox {
                    line_heights.push(lb.height());
                }

                if self.dehyphenate && block_text.ends_with('-') {
                    block_text.pop();
                } else if !block_text.is_empty() {
                    block_text.push(' ');
                }
                block_text.push_str(line_trimmed);
            }

            let text = block_text.trim().to_string();
            if text.is_empty() || text.len() < self.min_length {
                continue;
            }
            let Some(bbox) = block_bbox else {
                continue;
            };

            blocks.push(TextBlock {
                text,
                bbox,
                font_size: estimate_font_size(&line_heights),
                line_count: line_heights.len(),
            });
        }

        let blocks = if self.dehyphenate {
            merge_hyphenated_blocks(blocks)
        } else {
            blocks
        };

        Ok(PageText {
            width: bounds.x1 - bounds.x0,
            height: bounds.y1 - bounds.y0,
            blocks,
        })
    }
}

/// Glyph boxes run slightly smaller than the nominal font size.
#[allow(clippy::cast_precision_loss)]
fn estimate_font_size(line_heights: &[f32]) -> f32 {
    if line_heights.is_empty() {
        return 11.0;
    }
    let average = line_heights.iter().sum::<f32>() / line_heights.len() as f32;
    (average * 1.18).clamp(6.0, 36.0)
}

/// Rejoin adjacent blocks that MuPDF split in the middle of a hyphenated word.
///
/// Block order is left as MuPDF produced it.
fn merge_hyphenated_blocks(blocks: Vec<TextBlock>) -> Vec<TextBlock> {
    let mut merged: Vec<TextBlock> = Vec::with_capacity(blocks.len());

    for next in blocks {
        if let Some(current) = merged.last_mut()
            && continues_word(current, &next)
        {
            let trimmed = current.text.trim_end();
            let without_hyphen = trimmed.strip_suffix('-').unwrap_or(trimmed);
            current.text = format!("{}{}", without_hyphen, next.text.trim_start());
            current.bbox = current.bbox.union(next.bbox);
            current.line_count += next.line_count;
            current.font_size = current.font_size.min(next.font_size);
            continue;
        }
        merged.push(next);
    }

    merged
}

fn continues_word(current: &TextBlock, next: &TextBlock) -> bool {
    if !current.text.trim_end().ends_with('-') {
        return false;
    }

    let next_trimmed = next.text.trim_start();
    let starts_lower = next_trimmed.chars().next().is_some_and(char::is_lowercase);
    let is_fragment = next_trimmed.len() < 20 && !next_trimmed.contains(' ');

    let vertical_gap = (next.bbox.y0 - current.bbox.y1).abs();
    let avg_height = (current.bbox.height() + next.bbox.height()) / 2.0;

    (starts_lower || is_fragment) && vertical_gap < avg_height * 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str, y0: f32, y1: f32) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            bbox: BoundingBox::new(72.0, y0, 300.0, y1),
            font_size: 12.0,
            line_count: 1,
        }
    }

    #[test]
    fn test_merge_hyphenated_blocks() {
        let blocks = vec![
            block("an exam-", 100.0, 112.0),
            block("ple of text", 114.0, 126.0),
        ];
        let merged = merge_hyphenated_blocks(blocks);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "an example of text");
        assert_eq!(merged[0].line_count, 2);
        assert!((merged[0].bbox.y1 - 126.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_merge_keeps_order_and_distant_blocks() {
        let blocks = vec![
            block("Second", 300.0, 312.0),
            block("First-", 100.0, 112.0),
            block("continued far away", 600.0, 612.0),
        ];
        let merged = merge_hyphenated_blocks(blocks);
        let texts: Vec<&str> = merged.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["Second", "First-", "continued far away"]);
    }

    #[test]
    fn test_capitalized_sentence_is_not_a_continuation() {
        let blocks = vec![
            block("Range 1-", 100.0, 112.0),
            block("Next paragraph starts here", 114.0, 126.0),
        ];
        assert_eq!(merge_hyphenated_blocks(blocks).len(), 2);
    }

    #[test]
    fn test_estimate_font_size() {
        assert!((estimate_font_size(&[]) - 11.0).abs() < f32::EPSILON);
        assert!((estimate_font_size(&[10.0, 10.0]) - 11.8).abs() < 1e-4);
        assert!((estimate_font_size(&[100.0]) - 36.0).abs() < f32::EPSILON);
        assert!((estimate_font_size(&[1.0]) - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bounding_box_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 20.0, 8.0);
        assert_eq!(a.union(b), BoundingBox::new(0.0, -5.0, 20.0, 10.0));
        assert!((a.union(b).width() - 20.0).abs() < f32::EPSILON);
    }
}
