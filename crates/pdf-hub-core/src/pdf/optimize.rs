//! Lossy PDF size reduction.
//!
//! The pipeline scrubs document metadata, downsamples and recompresses
//! embedded images to a target resolution, then drops every object that is
//! no longer reachable (orphaned fonts included) before saving with
//! compressed streams.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageFormat, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::page_tree::{materialize_page, number, page_size, resolve_dict};
use crate::config::{DEFAULT_IMAGE_DPI, DEFAULT_IMAGE_QUALITY, OptimizeConfig};
use crate::error::OptimizeError;

/// Accepted JPEG quality values
pub const QUALITY_RANGE: RangeInclusive<u8> = 10..=100;
/// Accepted target resolutions
pub const DPI_RANGE: RangeInclusive<u32> = 50..=300;

/// Nested form XObjects deeper than this are not scanned
const MAX_FORM_DEPTH: usize = 8;

/// Validated optimizer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    pub image_quality: u8,
    pub image_dpi: u32,
}

impl OptimizeOptions {
    pub fn new(image_quality: u8, image_dpi: u32) -> Result<Self, OptimizeError> {
        let options = Self {
            image_quality,
            image_dpi,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !QUALITY_RANGE.contains(&self.image_quality) {
            return Err(OptimizeError::InvalidQuality(self.image_quality));
        }
        if !DPI_RANGE.contains(&self.image_dpi) {
            return Err(OptimizeError::InvalidDpi(self.image_dpi));
        }
        Ok(())
    }
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            image_quality: DEFAULT_IMAGE_QUALITY,
            image_dpi: DEFAULT_IMAGE_DPI,
        }
    }
}

/// What an optimization run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeReport {
    pub original_bytes: usize,
    pub optimized_bytes: usize,
    pub images_total: usize,
    pub images_rewritten: usize,
    pub objects_pruned: usize,
}

impl OptimizeReport {
    pub const fn saved_bytes(&self) -> usize {
        self.original_bytes.saturating_sub(self.optimized_bytes)
    }

    /// Output size as a percentage of the input size.
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_of_original(&self) -> f64 {
        if self.original_bytes == 0 {
            return 100.0;
        }
        self.optimized_bytes as f64 / self.original_bytes as f64 * 100.0
    }
}

/// Optimized document plus its report.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub bytes: Vec<u8>,
    pub report: OptimizeReport,
}

/// Lossy size reduction of a single PDF.
pub trait Optimizer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str {
        "optimize"
    }

    fn optimize(&self, pdf: &[u8], options: &OptimizeOptions) -> Result<Optimized, OptimizeError>;
}

/// Optimizer backed by lopdf and the image crate.
#[derive(Debug, Clone, Copy)]
pub struct LopdfOptimizer {
    pub scrub_metadata: bool,
    pub compress_streams: bool,
}

impl LopdfOptimizer {
    pub const fn from_config(config: &OptimizeConfig) -> Self {
        Self {
            scrub_metadata: config.scrub_metadata,
            compress_streams: config.compress_streams,
        }
    }
}

impl Default for LopdfOptimizer {
    fn default() -> Self {
        Self {
            scrub_metadata: true,
            compress_streams: true,
        }
    }
}

impl Optimizer for LopdfOptimizer {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn optimize(&self, pdf: &[u8], options: &OptimizeOptions) -> Result<Optimized, OptimizeError> {
        options.validate()?;

        let mut doc =
            Document::load_mem(pdf).map_err(|e| OptimizeError::InvalidInput(e.to_string()))?;

        if self.scrub_metadata {
            scrub_metadata(&mut doc);
        }

        let display = DisplaySizes::collect(&doc);
        let (images_total, images_rewritten) = rewrite_images(&mut doc, &display, options);

        let objects_pruned = doc.prune_objects().len();
        let empty_streams = doc.delete_zero_length_streams();
        debug!(
            "Pruned {} unreachable objects and {} empty streams",
            objects_pruned,
            empty_streams.len()
        );

        doc.renumber_objects();
        if self.compress_streams {
            doc.compress();
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| OptimizeError::Save(e.to_string()))?;

        let report = OptimizeReport {
            original_bytes: pdf.len(),
            optimized_bytes: bytes.len(),
            images_total,
            images_rewritten,
            objects_pruned,
        };

        info!(
            "Optimized PDF: {} -> {} bytes ({}/{} images rewritten)",
            report.original_bytes, report.optimized_bytes, images_rewritten, images_total
        );

        Ok(Optimized { bytes, report })
    }
}

// =============================================================================
// Metadata
// =============================================================================

/// Remove the Info dictionary, XMP streams, page piece info and thumbnails.
fn scrub_metadata(doc: &mut Document) {
    doc.trailer.remove(b"Info");

    if let Ok(root_id) = doc.trailer.get(b"Root").and_then(Object::as_reference)
        && let Ok(catalog) = doc.get_object_mut(root_id).and_then(Object::as_dict_mut)
    {
        catalog.remove(b"Metadata");
        catalog.remove(b"PieceInfo");
    }

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.remove(b"Metadata");
            page.remove(b"PieceInfo");
            page.remove(b"Thumb");
        }
    }
}

// =============================================================================
// Display sizes
// =============================================================================

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m` applied before `ctm` (the PDF `cm` rule: CTM' = m x CTM).
fn concat(m: &Matrix, ctm: &Matrix) -> Matrix {
    [
        m[0] * ctm[0] + m[1] * ctm[2],
        m[0] * ctm[1] + m[1] * ctm[3],
        m[2] * ctm[0] + m[3] * ctm[2],
        m[2] * ctm[1] + m[3] * ctm[3],
        m[4] * ctm[0] + m[5] * ctm[2] + ctm[4],
        m[4] * ctm[1] + m[5] * ctm[3] + ctm[5],
    ]
}

fn matrix_from(object: &Object) -> Option<Matrix> {
    let values: Vec<f32> = object.as_array().ok()?.iter().filter_map(number).collect();
    <[f32; 6]>::try_from(values.as_slice()).ok()
}

fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    dict.get(key).ok()?.as_name().ok()
}

/// Largest size, in points, at which each image XObject is drawn.
struct DisplaySizes {
    sizes: HashMap<ObjectId, (f32, f32)>,
    largest_page: (f32, f32),
}

impl DisplaySizes {
    fn collect(doc: &Document) -> Self {
        let mut sizes = HashMap::new();
        let mut largest_page = (0.0_f32, 0.0_f32);

        for &page_id in doc.get_pages().values() {
            let (width, height) = page_size(doc, page_id);
            largest_page = (largest_page.0.max(width), largest_page.1.max(height));

            let Ok(page) = materialize_page(doc, page_id) else {
                continue;
            };
            let Some(resources) = page.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r))
            else {
                continue;
            };
            let Ok(content) = doc.get_and_decode_page_content(page_id) else {
                continue;
            };
            scan_content(doc, &content, resources, IDENTITY, 0, &mut sizes);
        }

        if largest_page.0 <= 0.0 || largest_page.1 <= 0.0 {
            largest_page = (612.0, 792.0);
        }

        Self {
            sizes,
            largest_page,
        }
    }

    /// Drawn size, or the largest page when the image was never seen drawn
    /// at a usable size.
    fn get(&self, id: ObjectId) -> (f32, f32) {
        self.sizes
            .get(&id)
            .copied()
            .filter(|&(w, h)| w >= 1.0 && h >= 1.0)
            .unwrap_or(self.largest_page)
    }
}

fn scan_content(
    doc: &Document,
    content: &Content,
    resources: &Dictionary,
    base: Matrix,
    depth: usize,
    sizes: &mut HashMap<ObjectId, (f32, f32)>,
) {
    let xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x));
    let mut stack: Vec<Matrix> = Vec::new();
    let mut ctm = base;

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => {
                if let Some(saved) = stack.pop() {
                    ctm = saved;
                }
            }
            "cm" => {
                let values: Vec<f32> = op.operands.iter().filter_map(number).collect();
                if let Ok(m) = <[f32; 6]>::try_from(values.as_slice()) {
                    ctm = concat(&m, &ctm);
                }
            }
            "Do" => {
                let Some(xobjects) = xobjects else {
                    continue;
                };
                let Some(Object::Name(name)) = op.operands.first() else {
                    continue;
                };
                let Ok(id) = xobjects.get(name).and_then(Object::as_reference) else {
                    continue;
                };
                let Ok(Object::Stream(stream)) = doc.get_object(id) else {
                    continue;
                };

                match name_of(&stream.dict, b"Subtype") {
                    Some(b"Image") => {
                        let width = ctm[0].hypot(ctm[1]);
                        let height = ctm[2].hypot(ctm[3]);
                        let entry = sizes.entry(id).or_insert((0.0, 0.0));
                        *entry = (entry.0.max(width), entry.1.max(height));
                    }
                    Some(b"Form") if depth < MAX_FORM_DEPTH => {
                        let matrix = stream
                            .dict
                            .get(b"Matrix")
                            .ok()
                            .and_then(matrix_from)
                            .unwrap_or(IDENTITY);
                        let form_resources = stream
                            .dict
                            .get(b"Resources")
                            .ok()
                            .and_then(|r| resolve_dict(doc, r))
                            .unwrap_or(resources);
                        let data = stream
                            .decompressed_content()
                            .unwrap_or_else(|_| stream.content.clone());
                        if let Ok(form) = Content::decode(&data) {
                            scan_content(
                                doc,
                                &form,
                                form_resources,
                                concat(&matrix, &ctm),
                                depth + 1,
                                sizes,
                            );
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

// =============================================================================
// Image rewriting
// =============================================================================

/// Recompress every eligible image; returns (images seen, images rewritten).
fn rewrite_images(
    doc: &mut Document,
    display: &DisplaySizes,
    options: &OptimizeOptions,
) -> (usize, usize) {
    // Soft masks are alpha channels; lossy JPEG would smear their edges
    let soft_masks: HashSet<ObjectId> = doc
        .objects
        .values()
        .filter_map(|object| match object {
            Object::Stream(stream) => stream.dict.get(b"SMask").and_then(Object::as_reference).ok(),
            _ => None,
        })
        .collect();

    let image_ids: Vec<ObjectId> = doc
        .objects
        .iter()
        .filter_map(|(id, object)| match object {
            Object::Stream(stream) if matches!(name_of(&stream.dict, b"Subtype"), Some(b"Image")) => {
                Some(*id)
            }
            _ => None,
        })
        .collect();

    let total = image_ids.len();
    let mut rewritten = 0;

    for id in image_ids {
        if soft_masks.contains(&id) {
            continue;
        }
        let Some(Object::Stream(stream)) = doc.objects.get(&id) else {
            continue;
        };

        match recompress_image(doc, stream, display.get(id), options) {
            Ok(Some(replacement)) => {
                doc.objects.insert(id, Object::Stream(replacement));
                rewritten += 1;
            }
            Ok(None) => debug!("Image {:?} already smaller than its recompressed form", id),
            Err(reason) => debug!("Leaving image {:?} untouched: {}", id, reason),
        }
    }

    (total, rewritten)
}

/// Re-encode one image as JPEG at the target resolution.
///
/// Returns `Ok(None)` when the result would not be smaller.
fn recompress_image(
    doc: &Document,
    stream: &Stream,
    display_pt: (f32, f32),
    options: &OptimizeOptions,
) -> Result<Option<Stream>, String> {
    let dict = &stream.dict;

    if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
        return Err("stencil mask".to_string());
    }
    if dict.has(b"Decode") {
        return Err("custom decode array".to_string());
    }
    if matches!(dict.get(b"Mask"), Ok(Object::Array(_))) {
        return Err("color-key mask".to_string());
    }

    let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).ok();
    if bits != Some(8) {
        return Err(format!("unsupported bits per component {bits:?}"));
    }

    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;
    let channels = color_channels(doc, dict)?;

    let decoded = match single_filter(dict)? {
        Some(b"DCTDecode") => {
            image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|e| format!("JPEG decode failed: {e}"))?
        }
        Some(b"FlateDecode") => {
            if dict.has(b"DecodeParms") {
                return Err("predictor-encoded data".to_string());
            }
            let raw = stream
                .decompressed_content()
                .map_err(|e| format!("inflate failed: {e}"))?;
            raw_image(raw, width, height, channels)?
        }
        None => raw_image(stream.content.clone(), width, height, channels)?,
        Some(other) => {
            return Err(format!("unsupported filter {}", String::from_utf8_lossy(other)));
        }
    };

    let (target_w, target_h) = target_dimensions(width, height, display_pt, options.image_dpi);
    let resized = if (target_w, target_h) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_w, target_h, FilterType::Lanczos3)
    };

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, options.image_quality);
    let color_space: &[u8] = if channels == 1 {
        let gray = resized.to_luma8();
        encoder
            .write_image(gray.as_raw(), gray.width(), gray.height(), ExtendedColorType::L8)
            .map_err(|e| format!("JPEG encode failed: {e}"))?;
        b"DeviceGray"
    } else {
        let rgb = resized.to_rgb8();
        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| format!("JPEG encode failed: {e}"))?;
        b"DeviceRGB"
    };

    if jpeg.len() >= stream.content.len() {
        return Ok(None);
    }

    debug!(
        "Image {}x{} -> {}x{}, {} -> {} bytes",
        width,
        height,
        target_w,
        target_h,
        stream.content.len(),
        jpeg.len()
    );

    let mut new_dict = dict.clone();
    new_dict.set("Width", Object::Integer(i64::from(target_w)));
    new_dict.set("Height", Object::Integer(i64::from(target_h)));
    new_dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    new_dict.set("BitsPerComponent", Object::Integer(8));
    new_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    new_dict.remove(b"DecodeParms");

    Ok(Some(Stream::new(new_dict, jpeg).with_compression(false)))
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, String> {
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|&v| v > 0)
        .ok_or_else(|| format!("missing or invalid {}", String::from_utf8_lossy(key)))
}

/// Components per pixel for the color spaces we can re-encode.
fn color_channels(doc: &Document, dict: &Dictionary) -> Result<u8, String> {
    let color_space = dict
        .get(b"ColorSpace")
        .map_err(|_| "no color space".to_string())?;
    let color_space = match color_space {
        Object::Reference(id) => doc.get_object(*id).map_err(|e| e.to_string())?,
        other => other,
    };

    match color_space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" => Ok(3),
            b"DeviceGray" => Ok(1),
            other => Err(format!("color space {}", String::from_utf8_lossy(other))),
        },
        Object::Array(items) => match items.as_slice() {
            [Object::Name(family), Object::Reference(profile)] if family.as_slice() == b"ICCBased" => {
                let components = doc
                    .get_object(*profile)
                    .and_then(Object::as_stream)
                    .and_then(|s| s.dict.get(b"N"))
                    .and_then(Object::as_i64)
                    .ok();
                match components {
                    Some(1) => Ok(1),
                    Some(3) => Ok(3),
                    other => Err(format!("ICC profile with {other:?} components")),
                }
            }
            _ => Err("unsupported color space array".to_string()),
        },
        _ => Err("malformed color space".to_string()),
    }
}

/// The image's only filter, if any. Filter chains are not handled.
fn single_filter(dict: &Dictionary) -> Result<Option<&[u8]>, String> {
    match dict.get(b"Filter") {
        Err(_) => Ok(None),
        Ok(Object::Name(name)) => Ok(Some(name.as_slice())),
        Ok(Object::Array(filters)) => match filters.as_slice() {
            [] => Ok(None),
            [Object::Name(name)] => Ok(Some(name.as_slice())),
            _ => Err("filter chain".to_string()),
        },
        Ok(_) => Err("malformed filter".to_string()),
    }
}

fn raw_image(mut data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<DynamicImage, String> {
    let expected = width as usize * height as usize * usize::from(channels);
    if data.len() < expected {
        return Err(format!(
            "pixel data too short: got {} expected {}",
            data.len(),
            expected
        ));
    }
    data.truncate(expected);

    let image = if channels == 1 {
        GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
    } else {
        RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
    };
    image.ok_or_else(|| "pixel data does not match dimensions".to_string())
}

/// Pixel size that keeps the image at or below `dpi` when drawn at
/// `display_pt`. Never upsamples.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn target_dimensions(width: u32, height: u32, display_pt: (f32, f32), dpi: u32) -> (u32, u32) {
    let max_w = (display_pt.0 / 72.0 * dpi as f32).ceil().max(1.0);
    let max_h = (display_pt.1 / 72.0 * dpi as f32).ceil().max(1.0);
    let scale = (max_w / width as f32).min(max_h / height as f32);

    if scale >= 1.0 {
        return (width, height);
    }

    (
        (width as f32 * scale).round().max(1.0) as u32,
        (height as f32 * scale).round().max(1.0) as u32,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{image_pdf, page_texts, single_page_pdf};

    fn image_widths(doc: &Document) -> Vec<i64> {
        doc.objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream)
                    if matches!(name_of(&stream.dict, b"Subtype"), Some(b"Image")) =>
                {
                    stream.dict.get(b"Width").and_then(Object::as_i64).ok()
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_options_ranges() {
        assert!(OptimizeOptions::new(10, 50).is_ok());
        assert!(OptimizeOptions::new(100, 300).is_ok());
        assert!(matches!(
            OptimizeOptions::new(9, 150),
            Err(OptimizeError::InvalidQuality(9))
        ));
        assert!(matches!(
            OptimizeOptions::new(101, 150),
            Err(OptimizeError::InvalidQuality(101))
        ));
        assert!(matches!(
            OptimizeOptions::new(75, 49),
            Err(OptimizeError::InvalidDpi(49))
        ));
        assert!(matches!(
            OptimizeOptions::new(75, 301),
            Err(OptimizeError::InvalidDpi(301))
        ));
    }

    #[test]
    fn test_invalid_options_rejected_before_parsing() {
        let options = OptimizeOptions {
            image_quality: 0,
            image_dpi: 150,
        };
        let result = LopdfOptimizer::default().optimize(b"not a pdf", &options);
        assert!(matches!(result, Err(OptimizeError::InvalidQuality(0))));
    }

    #[test]
    fn test_invalid_input() {
        let result = LopdfOptimizer::default().optimize(b"not a pdf", &OptimizeOptions::default());
        assert!(matches!(result, Err(OptimizeError::InvalidInput(_))));
    }

    #[test]
    fn test_scrubs_metadata() {
        let input = image_pdf(64, 300);
        let before = Document::load_mem(&input).unwrap();
        assert!(before.trailer.has(b"Info"));

        let optimized = LopdfOptimizer::default()
            .optimize(&input, &OptimizeOptions::default())
            .unwrap();
        let doc = Document::load_mem(&optimized.bytes).unwrap();

        assert!(!doc.trailer.has(b"Info"));
        let root = doc.trailer.get(b"Root").and_then(Object::as_reference).unwrap();
        assert!(!doc.get_dictionary(root).unwrap().has(b"Metadata"));
    }

    #[test]
    fn test_keeps_metadata_when_disabled() {
        let optimizer = LopdfOptimizer {
            scrub_metadata: false,
            compress_streams: true,
        };
        let optimized = optimizer
            .optimize(&image_pdf(64, 300), &OptimizeOptions::default())
            .unwrap();
        let doc = Document::load_mem(&optimized.bytes).unwrap();
        assert!(doc.trailer.has(b"Info"));
    }

    #[test]
    fn test_downsamples_to_display_resolution() {
        // 1200 px drawn over 2 inches is 600 dpi; at 150 dpi that is 300 px
        let input = image_pdf(1200, 144);
        let options = OptimizeOptions::new(60, 150).unwrap();

        let optimized = LopdfOptimizer::default().optimize(&input, &options).unwrap();
        let doc = Document::load_mem(&optimized.bytes).unwrap();

        assert_eq!(image_widths(&doc), vec![300]);
        assert_eq!(optimized.report.images_total, 1);
        assert_eq!(optimized.report.images_rewritten, 1);
        assert!(optimized.bytes.len() < input.len());
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_never_upsamples() {
        let optimized = LopdfOptimizer::default()
            .optimize(&image_pdf(100, 144), &OptimizeOptions::new(30, 300).unwrap())
            .unwrap();
        let doc = Document::load_mem(&optimized.bytes).unwrap();
        assert_eq!(image_widths(&doc), vec![100]);
    }

    #[test]
    fn test_text_pages_survive() {
        let optimized = LopdfOptimizer::default()
            .optimize(&single_page_pdf("Hello"), &OptimizeOptions::default())
            .unwrap();
        let doc = Document::load_mem(&optimized.bytes).unwrap();
        assert_eq!(page_texts(&doc), vec!["Hello"]);
        assert_eq!(optimized.report.images_total, 0);
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(1000, 500, (72.0, 36.0), 100), (100, 50));
        assert_eq!(target_dimensions(50, 50, (72.0, 72.0), 100), (50, 50));
        // Aspect ratio comes from the image, not the display box
        assert_eq!(target_dimensions(400, 200, (72.0, 72.0), 100), (100, 50));
    }

    #[test]
    fn test_concat_scales_and_translates() {
        let scale = [2.0, 0.0, 0.0, 3.0, 0.0, 0.0];
        let translate = [1.0, 0.0, 0.0, 1.0, 10.0, 20.0];
        let m = concat(&scale, &translate);
        assert_eq!(m, [2.0, 0.0, 0.0, 3.0, 10.0, 20.0]);
    }

    #[test]
    fn test_report_percent() {
        let report = OptimizeReport {
            original_bytes: 200,
            optimized_bytes: 50,
            ..OptimizeReport::default()
        };
        assert!((report.percent_of_original() - 25.0).abs() < f64::EPSILON);
        assert_eq!(report.saved_bytes(), 150);
    }
}
