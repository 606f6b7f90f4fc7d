//! In-memory PDF fixtures for unit tests.

use image::{ImageEncoder, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

fn font_dict() -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ])
}

fn text_content(text: &str) -> Vec<u8> {
    Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    }
    .encode()
    .unwrap_or_default()
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap_or_default();
    output
}

/// One Letter-sized page with its own resources, showing `text`.
pub fn single_page_pdf(text: &str) -> Vec<u8> {
    multi_page_pdf_with(&[text], false)
}

/// One page per entry; Resources and MediaBox (A4) live on the Pages node.
pub fn multi_page_pdf(texts: &[&str]) -> Vec<u8> {
    multi_page_pdf_with(texts, true)
}

fn multi_page_pdf_with(texts: &[&str], inherit: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font_dict());
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for text in texts {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), text_content(text)));
        let mut page = Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if !inherit {
            page.set("Resources", Object::Reference(resources_id));
            page.set(
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            );
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(i64::try_from(kids.len()).unwrap_or(0))),
        ("Kids", Object::Array(kids)),
    ]);
    if inherit {
        pages.set("Resources", Object::Reference(resources_id));
        pages.set(
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]),
        );
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    save(doc)
}

/// Like [`multi_page_pdf`], plus one page-tree kid pointing at an object that
/// does not exist (`/Count` includes it).
pub fn dangling_kid_pdf(texts: &[&str]) -> Vec<u8> {
    let Ok(mut doc) = Document::load_mem(&multi_page_pdf(texts)) else {
        return Vec::new();
    };
    let missing = (doc.max_id + 100, 0);
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference);

    if let Ok(pages_id) = pages_id
        && let Ok(pages) = doc.get_dictionary_mut(pages_id)
    {
        if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
            kids.push(Object::Reference(missing));
        }
        pages.set(
            "Count",
            Object::Integer(i64::try_from(texts.len() + 1).unwrap_or(0)),
        );
    }

    save(doc)
}

/// Deterministic gradient so JPEG output is not trivially small.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = u8::try_from((x * 255) / width.max(1)).unwrap_or(255);
        let g = u8::try_from((y * 255) / height.max(1)).unwrap_or(255);
        let b = u8::try_from((x ^ y) & 0xff).unwrap_or(0);
        image::Rgb([r, g, b])
    })
}

/// Encode an image as JPEG (quality 95).
pub fn jpeg_bytes(img: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap_or_default();
    out
}

/// A Letter page drawing one `px` x `px` JPEG at `display_pt` x `display_pt`,
/// with an Info dictionary and an XMP metadata stream attached.
pub fn image_pdf(px: u32, display_pt: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let jpeg = jpeg_bytes(&gradient(px, px));
    let image_id = doc.add_object(
        Stream::new(
            Dictionary::from_iter([
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Image".to_vec())),
                ("Width", Object::Integer(i64::from(px))),
                ("Height", Object::Integer(i64::from(px))),
                ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
                ("BitsPerComponent", Object::Integer(8)),
                ("Filter", Object::Name(b"DCTDecode".to_vec())),
            ]),
            jpeg,
        )
        .with_compression(false),
    );

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    i64::from(display_pt).into(),
                    0.into(),
                    0.into(),
                    i64::from(display_pt).into(),
                    50.into(),
                    50.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().unwrap_or_default(),
    ));

    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        (
            "Resources",
            Object::Dictionary(Dictionary::from_iter([(
                "XObject",
                Object::Dictionary(Dictionary::from_iter([("Im1", Object::Reference(image_id))])),
            )])),
        ),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]));

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ])),
    );

    let metadata_id = doc.add_object(Stream::new(
        Dictionary::from_iter([
            ("Type", Object::Name(b"Metadata".to_vec())),
            ("Subtype", Object::Name(b"XML".to_vec())),
        ]),
        b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"></x:xmpmeta>".to_vec(),
    ));
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
        ("Metadata", Object::Reference(metadata_id)),
    ]));
    let info_id = doc.add_object(Dictionary::from_iter([
        (
            "Author",
            Object::String(b"Jane Doe".to_vec(), StringFormat::Literal),
        ),
        (
            "Producer",
            Object::String(b"Scanner 3000".to_vec(), StringFormat::Literal),
        ),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    save(doc)
}

/// Text shown by each page's `Tj` operators, in page order.
pub fn page_texts(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            doc.get_and_decode_page_content(page_id)
                .map(|content| {
                    content
                        .operations
                        .iter()
                        .filter(|op| op.operator == "Tj")
                        .filter_map(|op| match op.operands.first() {
                            Some(Object::String(bytes, _)) => {
                                Some(String::from_utf8_lossy(bytes).into_owned())
                            }
                            _ => None,
                        })
                        .collect::<String>()
                })
                .unwrap_or_default()
        })
        .collect()
}

/// A structurally valid PDF whose page tree has no pages.
pub fn empty_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![])),
        ("Count", Object::Integer(0)),
    ]));
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    save(doc)
}
