//! Document Assembler.
//!
//! A [`Document`] is an ordered list of [`Block`]s. Laying it out is a pure,
//! deterministic step ([`layout::lay_out`]); rendering the laid-out pages to
//! PDF is a separate one ([`render::render_pdf`]), and the only place a
//! backend failure can come from.

pub mod block;
pub mod layout;
pub mod render;

pub use block::{Align, Block, RasterImage, RgbColor, Table, TableStyle, TextBlock, Theme};
pub use layout::{LaidOutPage, PageGeometry};

use crate::error::AssemblyError;

/// Output of a successful render.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    geometry: PageGeometry,
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            geometry: PageGeometry::default(),
            blocks: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = Block>) -> &mut Self {
        self.blocks.extend(blocks);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn layout(&self) -> Vec<LaidOutPage> {
        layout::lay_out(&self.blocks, &self.geometry)
    }

    pub fn render(&self) -> Result<RenderedDocument, AssemblyError> {
        // ---
        let pages = self.layout();
        let bytes = render::render_pdf(&self.title, &pages, &self.blocks, &self.geometry)?;

        Ok(RenderedDocument {
            bytes,
            page_count: pages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn renders_text_and_tables_to_pdf() {
        // ---
        let mut doc = Document::new("Test");
        doc.push(Block::title("FarmIQ", 24.0, RgbColor::GREEN))
            .push(Block::heading("Executive Summary", 16.0))
            .push(Block::table(Table::new(
                &["Metric", "Value"],
                vec![vec!["Total Fields".into(), "2".into()]],
                Theme::Summary,
                TableStyle::Striped,
            )));

        let rendered = doc.render().unwrap();

        assert_eq!(rendered.page_count, 1);
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn page_count_matches_layout() {
        // ---
        let mut doc = Document::new("Long");
        for i in 0..5 {
            if i > 0 {
                doc.push(Block::PageBreak);
            }
            doc.push(Block::heading(format!("Section {i}"), 14.0));
        }

        assert_eq!(doc.layout().len(), 5);
        assert_eq!(doc.render().unwrap().page_count, 5);
    }

    #[test]
    fn corrupt_image_is_an_assembly_error() {
        // ---
        let mut doc = Document::new("Broken");
        doc.push(Block::Image(RasterImage {
            label: "broken".into(),
            caption: None,
            width: 10,
            height: 10,
            png: b"definitely not a png".to_vec(),
        }));

        assert!(matches!(doc.render(), Err(AssemblyError::Image { index: 0, .. })));
    }
}
