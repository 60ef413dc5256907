//! Greedy page layout.
//!
//! Blocks are placed top to bottom. Before a block is placed, if it would
//! cross the bottom margin the page is closed first; nothing is moved back
//! once placed. Tables are the only blocks split across pages, row by row,
//! with the header repeated on each continuation page; a row taller than a
//! page is split between its wrapped lines. Text longer than a whole page
//! continues line by line. An image caption stays with its image. Coordinates are millimetres measured
//! from the top-left corner of the page.

use tracing::warn;

use super::block::{Align, Block, RasterImage, RgbColor, Table, TableStyle, TextBlock};

// ---

pub const PT_TO_MM: f32 = 0.3527;

const TABLE_FONT: f32 = 9.0;
const CELL_PAD: f32 = 1.8;
const TABLE_GAP: f32 = 6.0;
const IMAGE_GAP: f32 = 6.0;
const CAPTION_SIZE: f32 = 12.0;
const CAPTION_GAP: f32 = 2.0;

/// Physical page and margins, in mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with 20 mm margins.
    fn default() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin_x: 20.0,
            margin_top: 20.0,
            margin_bottom: 20.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin_x
    }

    /// Lowest y any block may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin_bottom
    }

    pub fn printable_height(&self) -> f32 {
        self.bottom_limit() - self.margin_top
    }
}

/// A positioned drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        bold: bool,
        color: RgbColor,
        text: String,
    },
    Rect {
        x: f32,
        top: f32,
        w: f32,
        h: f32,
        fill: Option<RgbColor>,
        stroke: Option<RgbColor>,
    },
    /// `block` indexes the [`Block::Image`] in the source block list.
    Image {
        x: f32,
        top: f32,
        w: f32,
        h: f32,
        block: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub elements: Vec<Element>,
}

impl LaidOutPage {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Image { .. }))
    }
}

// --- text metrics

fn char_width(ch: char, bold: bool) -> f32 {
    // ---
    let em = match ch {
        ' ' | 'i' | 'j' | 'l' | 't' | 'f' | 'I' | '.' | ',' | ':' | ';' | '\'' | '|' => 0.278,
        'A'..='Z' | 'm' | 'w' => 0.667,
        c if c.is_ascii() => 0.5,
        _ => 1.0,
    };
    if bold {
        em * 1.08
    } else {
        em
    }
}

/// Estimated rendered width of `text` in mm.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    text.chars().map(|c| char_width(c, bold)).sum::<f32>() * size * PT_TO_MM
}

pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.25
}

fn ascent(size: f32) -> f32 {
    size * PT_TO_MM * 0.8
}

/// Greedy word wrap to `max_width` mm. Words wider than a line are split.
/// Always returns at least one (possibly empty) line.
pub fn wrap_text(text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
    // ---
    let width = |s: &str| text_width(s, size, bold);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                width(word)
            } else {
                width(&current) + width(" ") + width(word)
            };

            if candidate <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if width(word) <= max_width {
                current.push_str(word);
                continue;
            }

            for ch in word.chars() {
                if !current.is_empty() && width(&current) + char_width(ch, bold) * size * PT_TO_MM > max_width {
                    lines.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
        }

        lines.push(current);
    }

    lines
}

// --- layout

struct Row {
    cells: Vec<Vec<String>>,
    height: f32,
}

#[derive(Clone, Copy)]
struct RowStyle {
    fill: Option<RgbColor>,
    text_color: RgbColor,
    bold: bool,
    grid: bool,
}

struct Cursor<'g> {
    geometry: &'g PageGeometry,
    pages: Vec<LaidOutPage>,
    y: f32,
}

impl<'g> Cursor<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![LaidOutPage::default()],
            y: geometry.margin_top,
        }
    }

    fn push(&mut self, element: Element) {
        let last = self.pages.len() - 1;
        self.pages[last].elements.push(element);
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().map_or(true, |p| p.elements.is_empty())
    }

    fn new_page(&mut self) {
        self.pages.push(LaidOutPage::default());
        self.y = self.geometry.margin_top;
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.bottom_limit()
    }

    /// Break the page first if `height` would cross the bottom margin.
    fn ensure(&mut self, height: f32) {
        if !self.fits(height) && !self.page_is_empty() {
            self.new_page();
        }
    }

    fn text(&mut self, block: &TextBlock) {
        // ---
        let width = self.geometry.content_width();
        let lines = wrap_text(&block.text, block.size, block.bold, width);
        let lh = line_height(block.size);

        self.ensure(lh * lines.len() as f32);

        for line in lines {
            // Only text taller than a whole page gets here with no room.
            if !self.fits(lh) && !self.page_is_empty() {
                self.new_page();
            }

            let x = match block.align {
                Align::Left => self.geometry.margin_x,
                Align::Center => {
                    let w = text_width(&line, block.size, block.bold);
                    self.geometry.margin_x + ((width - w) / 2.0).max(0.0)
                }
            };

            self.push(Element::Text {
                x,
                baseline: self.y + ascent(block.size),
                size: block.size,
                bold: block.bold,
                color: block.color,
                text: line,
            });
            self.y += lh;
        }

        self.y += block.space_after;
    }

    fn spacer(&mut self, height: f32) {
        if !self.page_is_empty() {
            self.y += height;
        }
    }

    fn measure(&self, cells: &[String], col_w: &[f32], bold: bool) -> Row {
        // ---
        let cells: Vec<Vec<String>> = col_w
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let text = cells.get(i).map_or("", String::as_str);
                wrap_text(text, TABLE_FONT, bold, (w - 2.0 * CELL_PAD).max(1.0))
            })
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);

        Row {
            cells,
            height: lines as f32 * line_height(TABLE_FONT) + 2.0 * CELL_PAD,
        }
    }

    fn emit_row(&mut self, row: &Row, col_x: &[f32], col_w: &[f32], style: RowStyle) {
        // ---
        let top = self.y;

        if let Some(fill) = style.fill {
            self.push(Element::Rect {
                x: self.geometry.margin_x,
                top,
                w: col_w.iter().sum(),
                h: row.height,
                fill: Some(fill),
                stroke: None,
            });
        }

        if style.grid {
            for (x, w) in col_x.iter().zip(col_w) {
                self.push(Element::Rect {
                    x: *x,
                    top,
                    w: *w,
                    h: row.height,
                    fill: None,
                    stroke: Some(RgbColor::GRID),
                });
            }
        }

        let lh = line_height(TABLE_FONT);
        for (c, lines) in row.cells.iter().enumerate() {
            for (i, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                self.push(Element::Text {
                    x: col_x[c] + CELL_PAD,
                    baseline: top + CELL_PAD + ascent(TABLE_FONT) + i as f32 * lh,
                    size: TABLE_FONT,
                    bold: style.bold,
                    color: style.text_color,
                    text: line.clone(),
                });
            }
        }

        self.y += row.height;
    }

    /// Whole wrapped table lines that still fit below the cursor.
    fn row_room(&self) -> usize {
        let free = self.geometry.bottom_limit() - self.y - 2.0 * CELL_PAD - 1e-3;
        (free / line_height(TABLE_FONT)).floor().max(0.0) as usize
    }

    /// Emit a row too tall for any page in slices, repeating the header on
    /// every continuation page.
    fn split_row(
        &mut self,
        row: &Row,
        header: &Row,
        col_x: &[f32],
        col_w: &[f32],
        styles: (RowStyle, RowStyle),
    ) {
        // ---
        let (header_style, body_style) = styles;
        let lh = line_height(TABLE_FONT);
        let total = row.cells.iter().map(Vec::len).max().unwrap_or(1);
        let mut start = 0;

        while start < total {
            let mut room = self.row_room();
            if room == 0 {
                self.new_page();
                self.emit_row(header, col_x, col_w, header_style);
                room = self.row_room().max(1);
            }

            let end = (start + room).min(total);
            let part = Row {
                cells: row
                    .cells
                    .iter()
                    .map(|lines| lines[start.min(lines.len())..end.min(lines.len())].to_vec())
                    .collect(),
                height: (end - start) as f32 * lh + 2.0 * CELL_PAD,
            };
            self.emit_row(&part, col_x, col_w, body_style);
            start = end;
        }
    }

    fn table(&mut self, table: &Table) {
        // ---
        let width = self.geometry.content_width();
        let col_w: Vec<f32> = table.column_fractions().iter().map(|f| f * width).collect();
        let col_x: Vec<f32> = col_w
            .iter()
            .scan(self.geometry.margin_x, |x, w| {
                let start = *x;
                *x += w;
                Some(start)
            })
            .collect();

        let grid = table.style == TableStyle::Grid;
        let header_style = RowStyle {
            fill: Some(table.theme.header_color()),
            text_color: RgbColor::WHITE,
            bold: true,
            grid,
        };
        let header = self.measure(&table.columns, &col_w, true);
        let rows: Vec<Row> = table
            .rows
            .iter()
            .map(|r| self.measure(r, &col_w, false))
            .collect();

        // Rows taller than this never fit under a header and are split.
        let max_row = self.geometry.printable_height() - header.height;
        let one_line = line_height(TABLE_FONT) + 2.0 * CELL_PAD;

        // Header never sits alone at the bottom of a page.
        let first = rows.first().map_or(0.0, |r| {
            if r.height > max_row {
                one_line
            } else {
                r.height
            }
        });
        self.ensure(header.height + first);
        self.emit_row(&header, &col_x, &col_w, header_style);

        for (i, row) in rows.iter().enumerate() {
            let body_style = RowStyle {
                fill: (table.style == TableStyle::Striped && i % 2 == 1).then_some(RgbColor::STRIPE),
                text_color: RgbColor::BLACK,
                bold: false,
                grid,
            };

            if row.height > max_row {
                self.split_row(row, &header, &col_x, &col_w, (header_style, body_style));
                continue;
            }

            if !self.fits(row.height) {
                self.new_page();
                self.emit_row(&header, &col_x, &col_w, header_style);
            }
            self.emit_row(row, &col_x, &col_w, body_style);
        }

        self.y += TABLE_GAP;
    }

    fn image(&mut self, image: &RasterImage, block: usize) {
        // ---
        if image.width == 0 || image.height == 0 {
            warn!("Skipping image '{}' with empty dimensions", image.label);
            return;
        }

        let content_w = self.geometry.content_width();
        let caption = image
            .caption
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| wrap_text(c, CAPTION_SIZE, true, content_w))
            .unwrap_or_default();
        let caption_h = if caption.is_empty() {
            0.0
        } else {
            caption.len() as f32 * line_height(CAPTION_SIZE) + CAPTION_GAP
        };

        let max_h = (self.geometry.printable_height() - caption_h).max(1.0);
        let mut w = content_w;
        let mut h = w * image.aspect();
        if h > max_h {
            h = max_h;
            w = h / image.aspect();
        }

        self.ensure(caption_h + h);

        for line in caption {
            let line_w = text_width(&line, CAPTION_SIZE, true);
            self.push(Element::Text {
                x: self.geometry.margin_x + ((content_w - line_w) / 2.0).max(0.0),
                baseline: self.y + ascent(CAPTION_SIZE),
                size: CAPTION_SIZE,
                bold: true,
                color: RgbColor::BLACK,
                text: line,
            });
            self.y += line_height(CAPTION_SIZE);
        }
        if caption_h > 0.0 {
            self.y += CAPTION_GAP;
        }

        self.push(Element::Image {
            x: self.geometry.margin_x + (content_w - w) / 2.0,
            top: self.y,
            w,
            h,
            block,
        });
        self.y += h + IMAGE_GAP;
    }
}

/// Lay out `blocks` onto pages. Always yields at least one page.
pub fn lay_out(blocks: &[Block], geometry: &PageGeometry) -> Vec<LaidOutPage> {
    // ---
    let mut cursor = Cursor::new(geometry);

    for (index, block) in blocks.iter().enumerate() {
        match block {
            Block::Text(text) => cursor.text(text),
            Block::Spacer(height) => cursor.spacer(*height),
            Block::PageBreak => {
                if !cursor.page_is_empty() {
                    cursor.new_page();
                }
            }
            Block::Table(table) => cursor.table(table),
            Block::Image(image) => cursor.image(image, index),
        }
    }

    cursor.pages
}
