//! Logical building blocks of a report document.

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor(0, 0, 0);
    pub const WHITE: RgbColor = RgbColor(255, 255, 255);
    pub const GREEN: RgbColor = RgbColor(34, 197, 94);
    pub const BLUE: RgbColor = RgbColor(59, 130, 246);
    pub const PURPLE: RgbColor = RgbColor(168, 85, 247);
    pub const RED: RgbColor = RgbColor(239, 68, 68);
    pub const STRIPE: RgbColor = RgbColor(245, 245, 245);
    pub const GRID: RgbColor = RgbColor(200, 200, 200);
    pub const MUTED: RgbColor = RgbColor(90, 90, 90);
}

/// Section kind a table belongs to; decides the header colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Summary,
    Sensor,
    Advisory,
    Alert,
}

impl Theme {
    pub fn header_color(self) -> RgbColor {
        match self {
            Theme::Summary => RgbColor::GREEN,
            Theme::Sensor => RgbColor::BLUE,
            Theme::Advisory => RgbColor::PURPLE,
            Theme::Alert => RgbColor::RED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    /// Alternate body rows shaded.
    Striped,
    /// Every cell outlined.
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Word-wrapped text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    /// Font size in points.
    pub size: f32,
    pub bold: bool,
    pub align: Align,
    pub color: RgbColor,
    /// Vertical gap after the block, in mm.
    pub space_after: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub theme: Theme,
    pub style: TableStyle,
    /// Relative column widths; equal widths when `None`.
    pub widths: Option<Vec<f32>>,
}

impl Table {
    pub fn new(columns: &[&str], rows: Vec<Vec<String>>, theme: Theme, style: TableStyle) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            theme,
            style,
            widths: None,
        }
    }

    pub fn with_widths(mut self, widths: &[f32]) -> Self {
        self.widths = Some(widths.to_vec());
        self
    }

    /// Normalised column fractions summing to 1.
    pub fn column_fractions(&self) -> Vec<f32> {
        // ---
        let n = self.columns.len().max(1);
        match &self.widths {
            Some(w) if w.len() == self.columns.len() && w.iter().all(|v| *v > 0.0) => {
                let total: f32 = w.iter().sum();
                w.iter().map(|v| v / total).collect()
            }
            _ => vec![1.0 / n as f32; n],
        }
    }
}

/// A rasterised chart, held as PNG bytes until the document is rendered.
///
/// `caption` is the chart's title. Layout keeps it on the same page as the
/// image, directly above it.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub label: String,
    pub caption: Option<String>,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl RasterImage {
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width.max(1) as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    /// Vertical gap in mm; dropped at the top of a page.
    Spacer(f32),
    /// Start a new page unless the current one is still empty.
    PageBreak,
    Table(Table),
    Image(RasterImage),
}

impl Block {
    /// Bold, left aligned section heading.
    pub fn heading(text: impl Into<String>, size: f32) -> Self {
        Block::Text(TextBlock {
            text: text.into(),
            size,
            bold: true,
            align: Align::Left,
            color: RgbColor::BLACK,
            space_after: 4.0,
        })
    }

    /// Centred title line.
    pub fn title(text: impl Into<String>, size: f32, color: RgbColor) -> Self {
        Block::Text(TextBlock {
            text: text.into(),
            size,
            bold: true,
            align: Align::Center,
            color,
            space_after: 5.0,
        })
    }

    pub fn text(text: impl Into<String>, size: f32) -> Self {
        Block::Text(TextBlock {
            text: text.into(),
            size,
            bold: false,
            align: Align::Left,
            color: RgbColor::BLACK,
            space_after: 3.0,
        })
    }

    pub fn centered(text: impl Into<String>, size: f32) -> Self {
        Block::Text(TextBlock {
            text: text.into(),
            size,
            bold: false,
            align: Align::Center,
            color: RgbColor::BLACK,
            space_after: 3.0,
        })
    }

    pub fn table(table: Table) -> Self {
        Block::Table(table)
    }
}
