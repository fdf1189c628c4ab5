//! Fixture builders for unit tests

use std::io::Cursor;

use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};

fn letter_media_box() -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ])
}

fn page_content(doc: &mut Document, label: &str) -> Object {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ),
            Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    label.as_bytes().to_vec(),
                    lopdf::StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
    Object::Reference(content_id)
}

fn finish(mut doc: Document, pages_id: lopdf::ObjectId) -> Vec<u8> {
    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A flat single-level PDF with N letter-sized pages labelled "<prefix>-Page-<n>"
pub(crate) fn create_test_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let contents = page_content(&mut doc, &format!("{}-Page-{}", prefix, i + 1));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", letter_media_box()),
            ("Contents", contents),
        ]);
        page_ids.push(Object::Reference(doc.add_object(page)));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        ("Kids", Object::Array(page_ids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    finish(doc, pages_id)
}

/// A PDF whose pages hang under an intermediate Pages node that carries
/// MediaBox, Resources and Rotate for its children
pub(crate) fn create_nested_pdf(num_pages: u32, rotate: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let root_id = doc.new_object_id();
    let branch_id = doc.new_object_id();

    let font = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]);
    let font_id = doc.add_object(font);
    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]);

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let contents = page_content(&mut doc, &format!("Nested-Page-{}", i + 1));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(branch_id)),
            ("Contents", contents),
        ]);
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let branch = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Parent", Object::Reference(root_id)),
        ("Count", Object::Integer(num_pages as i64)),
        ("Kids", Object::Array(kids)),
        ("MediaBox", letter_media_box()),
        ("Resources", Object::Dictionary(resources)),
        ("Rotate", Object::Integer(rotate)),
    ]);
    doc.objects.insert(branch_id, Object::Dictionary(branch));

    let root = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        ("Kids", Object::Array(vec![Object::Reference(branch_id)])),
    ]);
    doc.objects.insert(root_id, Object::Dictionary(root));

    finish(doc, root_id)
}

/// Encode a solid-color RGB image in the given format
pub(crate) fn create_test_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

/// Encode a half-transparent RGBA PNG
pub(crate) fn create_test_rgba_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 120, 200, 128]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Hand-assembled 8x8 four-component (CMYK) baseline JPEG, one flat block per channel
pub(crate) fn create_cmyk_jpeg() -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    // APP14 Adobe, transform 0 (no YCCK)
    jpeg.extend_from_slice(&[0xFF, 0xEE, 0x00, 0x0E]);
    jpeg.extend_from_slice(b"Adobe");
    jpeg.extend_from_slice(&[0x00, 0x64, 0x00, 0x00, 0x00, 0x00, 0x00]);
    // DQT, table 0 all ones
    jpeg.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    jpeg.extend_from_slice(&[0x01; 64]);
    // SOF0: 8-bit, 8x8, four components
    jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x08, 0x00, 0x08, 0x04]);
    for id in 1..=4u8 {
        jpeg.extend_from_slice(&[id, 0x11, 0x00]);
    }
    // DC and AC tables, each a single one-bit code for symbol 0
    for class in [0x00u8, 0x10] {
        jpeg.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, class, 0x01]);
        jpeg.extend_from_slice(&[0x00; 15]);
        jpeg.push(0x00);
    }
    // SOS over all four components
    jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x0E, 0x04]);
    for id in 1..=4u8 {
        jpeg.extend_from_slice(&[id, 0x00]);
    }
    jpeg.extend_from_slice(&[0x00, 0x3F, 0x00]);
    // DC diff 0 then EOB for each block
    jpeg.push(0x00);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}
