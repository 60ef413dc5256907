//! PDF backend: draws laid-out pages with `printpdf`.

use printpdf::image_crate::{self, ImageFormat};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon, Rgb,
};
use tracing::debug;

use super::block::{Block, RgbColor};
use super::layout::{Element, LaidOutPage, PageGeometry};
use crate::error::AssemblyError;

// ---

const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

fn backend<E: std::fmt::Display>(e: E) -> AssemblyError {
    AssemblyError::Backend(e.to_string())
}

fn pdf_color(c: RgbColor) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(c.0) / 255.0,
        f32::from(c.1) / 255.0,
        f32::from(c.2) / 255.0,
        None,
    ))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Render pages produced by [`super::layout::lay_out`] into PDF bytes.
///
/// `blocks` must be the list the pages were laid out from; image elements
/// refer back into it. Images are decoded one at a time while drawing.
pub fn render_pdf(
    title: &str,
    pages: &[LaidOutPage],
    blocks: &[Block],
    geometry: &PageGeometry,
) -> Result<Vec<u8>, AssemblyError> {
    // ---
    let page_w = Mm(geometry.width);
    let page_h = Mm(geometry.height);
    let (doc, page1, layer1) = PdfDocument::new(title, page_w, page_h, "Layer 1");

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(backend)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(backend)?,
    };

    for (n, page) in pages.iter().enumerate() {
        let layer = if n == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page_idx, layer_idx) = doc.add_page(page_w, page_h, format!("Page {}", n + 1));
            doc.get_page(page_idx).get_layer(layer_idx)
        };

        for element in &page.elements {
            draw(&layer, element, &fonts, blocks, geometry)?;
        }
    }

    let bytes = doc.save_to_bytes().map_err(backend)?;
    debug!("Rendered '{}': {} pages, {} bytes", title, pages.len(), bytes.len());
    Ok(bytes)
}

fn draw(
    layer: &PdfLayerReference,
    element: &Element,
    fonts: &Fonts,
    blocks: &[Block],
    geometry: &PageGeometry,
) -> Result<(), AssemblyError> {
    // ---
    // Layout measures from the top edge, PDF from the bottom.
    let flip = |y: f32| geometry.height - y;

    match element {
        Element::Text {
            x,
            baseline,
            size,
            bold,
            color,
            text,
        } => {
            let font = if *bold { &fonts.bold } else { &fonts.regular };
            layer.set_fill_color(pdf_color(*color));
            layer.begin_text_section();
            layer.set_font(font, *size);
            layer.set_text_cursor(Mm(*x), Mm(flip(*baseline)));
            layer.write_text(text.as_str(), font);
            layer.end_text_section();
        }

        Element::Rect {
            x,
            top,
            w,
            h,
            fill,
            stroke,
        } => {
            let (x0, y0, x1, y1) = (*x, flip(top + h), x + w, flip(*top));
            let ring = vec![
                (Point::new(Mm(x0), Mm(y0)), false),
                (Point::new(Mm(x1), Mm(y0)), false),
                (Point::new(Mm(x1), Mm(y1)), false),
                (Point::new(Mm(x0), Mm(y1)), false),
            ];
            let mode = match (fill, stroke) {
                (Some(f), Some(s)) => {
                    layer.set_fill_color(pdf_color(*f));
                    layer.set_outline_color(pdf_color(*s));
                    PaintMode::FillStroke
                }
                (Some(f), None) => {
                    layer.set_fill_color(pdf_color(*f));
                    PaintMode::Fill
                }
                (None, Some(s)) => {
                    layer.set_outline_color(pdf_color(*s));
                    PaintMode::Stroke
                }
                (None, None) => return Ok(()),
            };
            layer.set_outline_thickness(0.5);
            layer.add_polygon(Polygon {
                rings: vec![ring],
                mode,
                winding_order: WindingOrder::NonZero,
            });
        }

        Element::Image { x, top, w, h, block } => {
            let Some(Block::Image(raster)) = blocks.get(*block) else {
                return Err(AssemblyError::Image {
                    index: *block,
                    reason: "element does not point at an image block".to_string(),
                });
            };

            let decoded = image_crate::load_from_memory_with_format(&raster.png, ImageFormat::Png)
                .map_err(|e| AssemblyError::Image {
                    index: *block,
                    reason: e.to_string(),
                })?;

            let natural_w = decoded.width() as f32 / IMAGE_DPI * MM_PER_INCH;
            let natural_h = decoded.height() as f32 / IMAGE_DPI * MM_PER_INCH;

            Image::from_dynamic_image(&decoded).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(Mm(flip(top + h))),
                    scale_x: Some(w / natural_w),
                    scale_y: Some(h / natural_h),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            );
        }
    }

    Ok(())
}
