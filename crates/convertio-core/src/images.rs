//! Image to PDF conversion
//!
//! Places each image on its own A4 portrait page, scaled to fit and centered.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::ConvertError;
use crate::{save_document, PdfOutput};

/// A4 portrait in points
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// One uploaded image
#[derive(Debug, Clone, Copy)]
pub struct ImageSource<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

/// Where an image lands on the page, in points from the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scale `width` x `height` to fit the page without distortion and center it
pub fn fit_to_page(width: u32, height: u32, page_width: f32, page_height: f32) -> Placement {
    let ratio = (page_width / width as f32).min(page_height / height as f32);
    let scaled_width = width as f32 * ratio;
    let scaled_height = height as f32 * ratio;

    Placement {
        x: (page_width - scaled_width) / 2.0,
        y: (page_height - scaled_height) / 2.0,
        width: scaled_width,
        height: scaled_height,
    }
}

/// Convert images to a PDF with one page per image, in input order
pub fn images_to_pdf(images: &[ImageSource<'_>]) -> Result<PdfOutput, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::NoFiles);
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut page_ids = Vec::with_capacity(images.len());

    for source in images {
        let (image_id, width, height) = embed_image(&mut doc, source)?;
        let placement = fit_to_page(width, height, A4_WIDTH, A4_HEIGHT);
        debug!(
            "Placing {} ({}x{}px) at {:?}",
            source.name, width, height, placement
        );

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(placement.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(placement.height),
                        Object::Real(placement.x),
                        Object::Real(placement.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| ConvertError::OperationError(format!("Content encoding failed: {}", e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Im1",
                Object::Reference(image_id),
            )])),
        )]);

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(A4_WIDTH),
                    Object::Real(A4_HEIGHT),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.compress();

    save_document(&mut doc, page_ids.len() as u32)
}

/// Add an image XObject and return its id with the pixel dimensions
fn embed_image(
    doc: &mut Document,
    source: &ImageSource<'_>,
) -> Result<(ObjectId, u32, u32), ConvertError> {
    let unsupported = |e: image::ImageError| {
        ConvertError::UnsupportedImage(format!("{}: {}", source.name, e))
    };

    let format = image::guess_format(source.bytes).map_err(unsupported)?;
    let decoded = image::load_from_memory_with_format(source.bytes, format).map_err(unsupported)?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(ConvertError::UnsupportedImage(format!(
            "{}: image has no pixels",
            source.name
        )));
    }

    let mut dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("BitsPerComponent", Object::Integer(8)),
    ]);

    // 8-bit gray/RGB JPEG goes in untouched; everything else is re-encoded.
    // The decoder reports CMYK as RGB, so the frame header decides.
    let passthrough = match (format, jpeg_frame(source.bytes)) {
        (ImageFormat::Jpeg, Some((8, 1))) => Some(b"DeviceGray".as_slice()),
        (ImageFormat::Jpeg, Some((8, 3))) => Some(b"DeviceRGB".as_slice()),
        _ => None,
    };

    let content = match passthrough {
        Some(color_space) => {
            dict.set("ColorSpace", Object::Name(color_space.to_vec()));
            dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            source.bytes.to_vec()
        }
        None => {
            if decoded.color().has_alpha() {
                let smask_id = embed_alpha(doc, &decoded, width, height)?;
                dict.set("SMask", Object::Reference(smask_id));
            }
            dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
            dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            deflate(decoded.to_rgb8().as_raw())?
        }
    };

    let id = doc.add_object(Stream::new(dict, content).with_compression(false));
    Ok((id, width, height))
}

/// Sample precision and component count from the first SOF segment
fn jpeg_frame(bytes: &[u8]) -> Option<(u8, u8)> {
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        match marker {
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let precision = *bytes.get(pos + 4)?;
                let components = *bytes.get(pos + 9)?;
                return Some((precision, components));
            }
            0xD9 | 0xDA => return None,
            _ => pos += 2 + length,
        }
    }
    None
}

/// Soft mask carrying the alpha channel as a grayscale image
fn embed_alpha(
    doc: &mut Document,
    decoded: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<ObjectId, ConvertError> {
    let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();

    let dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("BitsPerComponent", Object::Integer(8)),
        ("ColorSpace", Object::Name(b"DeviceGray".to_vec())),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);

    Ok(doc.add_object(Stream::new(dict, deflate(&alpha)?).with_compression(false)))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let compression_failed =
        |e: std::io::Error| ConvertError::OperationError(format!("Compression failed: {}", e));

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(compression_failed)?;
    encoder.finish().map_err(compression_failed)
}
