use crate::color::Rgb;

/// One terminal cell of a braille canvas: 8 dots plus the ink they were drawn with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrailleCell {
    pub bits: u8,
    /// Last pen color that touched the cell. `None` means layer default.
    pub ink: Option<Rgb>,
}

impl BrailleCell {
    pub fn glyph(&self) -> char {
        char::from_u32(0x2800 + self.bits as u32).unwrap_or(' ')
    }

    pub fn is_blank(&self) -> bool {
        self.bits == 0
    }
}

/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell represents a 2x4 pixel grid (8 dots).
/// A terminal cell can only carry one foreground color, so the last pen wins.
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<BrailleCell>,
    pen: Option<Rgb>,
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![BrailleCell::default(); width * height],
            pen: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Color applied to every pixel set from now on
    pub fn set_pen(&mut self, pen: Option<Rgb>) {
        self.pen = pen;
    }

    /// Set a pixel at the given coordinates.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        let cell = &mut self.cells[cy * self.width + cx];
        cell.bits |= bit;
        if self.pen.is_some() {
            cell.ink = self.pen;
        }
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&BrailleCell> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col)
    }

    /// Non-blank cells as `(col, row, cell)`
    pub fn inked(&self) -> impl Iterator<Item = (usize, usize, &BrailleCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_blank())
            .map(|(idx, cell)| (idx % self.width, idx / self.width, cell))
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(BrailleCell::glyph).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
