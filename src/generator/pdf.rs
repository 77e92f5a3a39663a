use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::path_utils::path_to_string_lossy;
use crate::types::{BookMetadata, get_file_info};
use async_trait::async_trait;
use chrono::Utc;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tokio::task::spawn_blocking;

/// A generator for creating a PDF with one page per image.
///
/// The first image becomes page one and every further image is appended after
/// it. Each page is exactly as large as its image, in points.
pub struct Pdf {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    output_path: PathBuf,
}

/// An image XObject ready to be placed on a page.
struct PageImage {
    stream: Stream,
    width: u32,
    height: u32,
}

/// Builds the image XObject for a page.
///
/// JPEG data is embedded untouched behind a `DCTDecode` filter; anything else is
/// decoded to 8-bit RGB and left for [`Document::compress`] to deflate.
fn page_image(bytes: Vec<u8>, is_jpeg: bool) -> Result<PageImage> {
    if is_jpeg {
        let (width, height, color_type) = {
            let decoder = JpegDecoder::new(Cursor::new(&bytes))?;
            let (width, height) = decoder.dimensions();
            (width, height, decoder.color_type())
        };
        let color_space = match color_type {
            ColorType::L8 | ColorType::L16 => "DeviceGray",
            _ => "DeviceRGB",
        };

        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            bytes,
        );
        stream.allows_compression = false;

        return Ok(PageImage {
            stream,
            width,
            height,
        });
    }

    let rgb = image::load_from_memory(&bytes)?.into_rgb8();
    let (width, height) = rgb.dimensions();
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        },
        rgb.into_raw(),
    );

    Ok(PageImage {
        stream,
        width,
        height,
    })
}

/// Encodes text for the document information dictionary.
///
/// ASCII stays a literal string; anything else becomes UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

impl Pdf {
    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }
}

#[async_trait]
impl Generator for Pdf {
    fn new(output_dir: &Path, base_filename: &str) -> Result<Self> {
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        Ok(Pdf {
            doc,
            pages_id,
            page_ids: Vec::new(),
            output_path: output_dir.join(format!("{}.pdf", base_filename)),
        })
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        let (extension, _) = get_file_info(image_path)?;

        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to read image file '{}': {}",
                    path_to_string_lossy(image_path),
                    e
                ),
            ))
        })?;

        let is_jpeg = extension == "jpg";
        let PageImage {
            stream,
            width,
            height,
        } = spawn_blocking(move || page_image(bytes, is_jpeg))
            .await
            .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        let image_id = self.doc.add_object(stream);
        let image_name = format!("X{}", image_id.0);

        // Scale the unit square to the page, then paint the image into it.
        let content = Content {
            operations: vec![
                Operation::new(
                    "cm",
                    vec![
                        i64::from(width).into(),
                        0.into(),
                        0.into(),
                        i64::from(height).into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(image_name.as_bytes().to_vec())]),
            ],
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), i64::from(width).into(), i64::from(height).into()],
        });
        self.doc
            .add_xobject(page_id, image_name.as_bytes(), image_id)?;

        self.page_ids.push(page_id);
        Ok(self)
    }

    async fn set_metadata(
        &mut self,
        metadata: &BookMetadata,
        _total_pages: usize,
    ) -> Result<&mut Self> {
        let created = metadata.release_date.unwrap_or_else(Utc::now);

        let mut info = dictionary! {
            "Title" => text_string(&metadata.title),
            "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
            "CreationDate" => Object::string_literal(created.format("D:%Y%m%d%H%M%SZ").to_string()),
        };
        if let Some(identifier) = &metadata.identifier {
            info.set("Subject", text_string(identifier));
        }

        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);
        Ok(self)
    }

    async fn save(mut self) -> Result<PathBuf> {
        let page_count = self.page_ids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => page_count,
            "Kids" => self.page_ids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut doc = self.doc;
        let output_path = self.output_path;
        let save_path = output_path.clone();

        spawn_blocking(move || -> Result<()> {
            doc.compress();
            doc.save(&save_path)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_string_ascii_is_literal() {
        match text_string("Plain Title") {
            Object::String(bytes, StringFormat::Literal) => {
                assert_eq!(bytes, b"Plain Title".to_vec());
            }
            other => panic!("unexpected object {:?}", other),
        }
    }

    #[test]
    fn test_text_string_unicode_is_utf16() {
        match text_string("é") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(bytes, vec![0xFE, 0xFF, 0x00, 0xE9]);
            }
            other => panic!("unexpected object {:?}", other),
        }
    }
}
