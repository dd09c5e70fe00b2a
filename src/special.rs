//! Stock special types.
//!
//! These are the composite records game data is full of, each with a compact
//! custom encoding instead of one child per field:
//!
//! - [`Table`]: a 1, 2 or 3 dimensional grid of `i16`
//! - [`Color`]: red, green, blue and alpha channels
//! - [`Tone`]: red, green, blue and gray shifts
//! - [`Rect`]: an integer rectangle
//!
//! All four are registered by [`TypeRegistry::default`](crate::TypeRegistry).

use crate::generator::Generator;
use crate::node::TreeNode;
use crate::parser::Parser;
use crate::registry::{Special, SpecialDecode};
use crate::{Result, Value};
use std::any::Any;

macro_rules! special_any {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn eq_special(&self, other: &dyn Special) -> bool {
            other.as_any().downcast_ref::<Self>() == Some(self)
        }
    };
}

/// A grid of `i16` with up to three dimensions.
///
/// Cells are stored x fastest, then y, then z: the cell `(x, y, z)` lives at
/// `x + xsize * (y + ysize * z)`. The encoded data array uses the same order.
///
/// # Examples
///
/// ```rust
/// use rmxml::special::Table;
///
/// let mut table = Table::new_2d(2, 2);
/// table.set(1, 0, 0, 2);
/// table.set(0, 1, 0, 3);
/// assert_eq!(table.data(), &[0, 2, 3, 0]);
/// assert_eq!(table.get(0, 1, 0), Some(3));
/// assert_eq!(table.get(2, 0, 0), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    dims: u8,
    xsize: usize,
    ysize: usize,
    zsize: usize,
    data: Vec<i16>,
}

impl Table {
    /// Creates a zeroed one-dimensional table.
    pub fn new(xsize: usize) -> Self {
        Self::zeroed(1, xsize, 1, 1)
    }

    pub fn new_2d(xsize: usize, ysize: usize) -> Self {
        Self::zeroed(2, xsize, ysize, 1)
    }

    pub fn new_3d(xsize: usize, ysize: usize, zsize: usize) -> Self {
        Self::zeroed(3, xsize, ysize, zsize)
    }

    fn zeroed(dims: u8, xsize: usize, ysize: usize, zsize: usize) -> Self {
        Table {
            dims,
            xsize,
            ysize,
            zsize,
            data: vec![0; xsize * ysize * zsize],
        }
    }

    /// Builds a two-dimensional table from rows of equal length.
    ///
    /// Returns `None` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<i16>]) -> Option<Self> {
        let xsize = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != xsize) {
            return None;
        }
        Some(Table {
            dims: 2,
            xsize,
            ysize: rows.len(),
            zsize: 1,
            data: rows.concat(),
        })
    }

    /// Builds a table from flattened cells. Returns `None` if `dims` is not
    /// 1 to 3, unused axes are not 1, or `data` has the wrong length.
    pub fn from_data(
        dims: u8,
        xsize: usize,
        ysize: usize,
        zsize: usize,
        data: Vec<i16>,
    ) -> Option<Self> {
        let axes_ok = match dims {
            1 => ysize == 1 && zsize == 1,
            2 => zsize == 1,
            3 => true,
            _ => false,
        };
        let len = xsize.checked_mul(ysize)?.checked_mul(zsize)?;
        if !axes_ok || data.len() != len {
            return None;
        }
        Some(Table {
            dims,
            xsize,
            ysize,
            zsize,
            data,
        })
    }

    pub fn dims(&self) -> u8 {
        self.dims
    }

    pub fn xsize(&self) -> usize {
        self.xsize
    }

    pub fn ysize(&self) -> usize {
        self.ysize
    }

    pub fn zsize(&self) -> usize {
        self.zsize
    }

    /// All cells in storage order.
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.xsize && y < self.ysize && z < self.zsize {
            Some(x + self.xsize * (y + self.ysize * z))
        } else {
            None
        }
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<i16> {
        self.index(x, y, z).map(|i| self.data[i])
    }

    /// Writes a cell. Returns `false` if the coordinates are out of bounds.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: i16) -> bool {
        match self.index(x, y, z) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }
}

impl Special for Table {
    fn class_name(&self) -> &str {
        "Table"
    }

    fn encode(&self, generator: &mut Generator<'_>, node: &mut TreeNode) -> Result<()> {
        generator.add_child(node, &Value::from(self.dims))?;
        generator.add_child(node, &Value::from(self.xsize as u64))?;
        generator.add_child(node, &Value::from(self.ysize as u64))?;
        generator.add_child(node, &Value::from(self.zsize as u64))?;
        let cells = self.data.iter().map(|&cell| Value::from(cell)).collect();
        generator.add_child(node, &Value::Array(cells))
    }

    special_any!();
}

impl SpecialDecode for Table {
    const TAG: &'static str = "table";

    fn decode(parser: &mut Parser<'_>, node: &TreeNode) -> Result<Self> {
        parser.expect_children(node, 5)?;
        let mut header = [0usize; 4];
        for (index, slot) in header.iter_mut().enumerate() {
            let value = parser.child_i64(node, index)?;
            *slot = usize::try_from(value)
                .map_err(|_| parser.malformed(node, "table sizes must not be negative"))?;
        }
        let [dims, xsize, ysize, zsize] = header;

        let cells = match parser.load_child(node, 4)? {
            Value::Array(cells) => cells,
            other => {
                return Err(parser.malformed(
                    node,
                    &format!("table data must be an array, found {}", other.type_name()),
                ))
            }
        };
        let data = cells
            .iter()
            .map(|cell| cell.as_i64().and_then(|i| i16::try_from(i).ok()))
            .collect::<Option<Vec<i16>>>()
            .ok_or_else(|| parser.malformed(node, "table cells must be 16-bit integers"))?;

        let dims = u8::try_from(dims).unwrap_or(0);
        Table::from_data(dims, xsize, ysize, zsize, data)
            .ok_or_else(|| parser.malformed(node, "table shape does not match its data"))
    }
}

/// An RGBA color with channels in `0.0..=255.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Color {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// An opaque color.
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::new(red, green, blue, 255.0)
    }
}

impl Special for Color {
    fn class_name(&self) -> &str {
        "Color"
    }

    fn encode(&self, generator: &mut Generator<'_>, node: &mut TreeNode) -> Result<()> {
        for channel in [self.red, self.green, self.blue, self.alpha] {
            generator.add_child(node, &Value::Float(channel))?;
        }
        Ok(())
    }

    special_any!();
}

impl SpecialDecode for Color {
    const TAG: &'static str = "color";

    fn decode(parser: &mut Parser<'_>, node: &TreeNode) -> Result<Self> {
        parser.expect_children(node, 4)?;
        Ok(Color {
            red: parser.child_f64(node, 0)?,
            green: parser.child_f64(node, 1)?,
            blue: parser.child_f64(node, 2)?,
            alpha: parser.child_f64(node, 3)?,
        })
    }
}

/// A color shift applied to a whole screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tone {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub gray: f64,
}

impl Tone {
    pub fn new(red: f64, green: f64, blue: f64, gray: f64) -> Self {
        Tone {
            red,
            green,
            blue,
            gray,
        }
    }
}

impl Special for Tone {
    fn class_name(&self) -> &str {
        "Tone"
    }

    fn encode(&self, generator: &mut Generator<'_>, node: &mut TreeNode) -> Result<()> {
        for channel in [self.red, self.green, self.blue, self.gray] {
            generator.add_child(node, &Value::Float(channel))?;
        }
        Ok(())
    }

    special_any!();
}

impl SpecialDecode for Tone {
    const TAG: &'static str = "tone";

    fn decode(parser: &mut Parser<'_>, node: &TreeNode) -> Result<Self> {
        parser.expect_children(node, 4)?;
        Ok(Tone {
            red: parser.child_f64(node, 0)?,
            green: parser.child_f64(node, 1)?,
            blue: parser.child_f64(node, 2)?,
            gray: parser.child_f64(node, 3)?,
        })
    }
}

/// An axis-aligned integer rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

impl Special for Rect {
    fn class_name(&self) -> &str {
        "Rect"
    }

    fn encode(&self, generator: &mut Generator<'_>, node: &mut TreeNode) -> Result<()> {
        for part in [self.x, self.y, self.width, self.height] {
            generator.add_child(node, &Value::Integer(part))?;
        }
        Ok(())
    }

    special_any!();
}

impl SpecialDecode for Rect {
    const TAG: &'static str = "rect";

    fn decode(parser: &mut Parser<'_>, node: &TreeNode) -> Result<Self> {
        parser.expect_children(node, 4)?;
        Ok(Rect {
            x: parser.child_i64(node, 0)?,
            y: parser.child_i64(node, 1)?,
            width: parser.child_i64(node, 2)?,
            height: parser.child_i64(node, 3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate, parse, Error};

    #[test]
    fn test_table_storage_order() {
        let mut table = Table::new_3d(2, 3, 2);
        assert!(table.set(1, 2, 1, 9));
        assert_eq!(table.data()[1 + 2 * (2 + 3 * 1)], 9);
        assert!(!table.set(2, 0, 0, 1));
    }

    #[test]
    fn test_table_node_shape() {
        let table = Table::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        let tree = generate(&Value::special(table)).unwrap();
        assert_eq!(tree.tag, "table");
        assert_eq!(tree.attribute("class-name"), Some("Table"));
        let header: Vec<_> = tree.children[..4].iter().map(|c| c.text().unwrap()).collect();
        assert_eq!(header, vec!["2", "2", "2", "1"]);
        let cells: Vec<_> = tree.children[4]
            .children
            .iter()
            .map(|c| c.text().unwrap())
            .collect();
        assert_eq!(cells, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(Table::from_rows(&[vec![1, 2], vec![3]]).is_none());
    }

    #[test]
    fn test_table_with_wrong_length_is_malformed() {
        let table = Table::new_2d(2, 2);
        let mut tree = generate(&Value::special(table)).unwrap();
        tree.children[4].children.pop();
        assert!(matches!(parse(&tree), Err(Error::MalformedNode { .. })));
    }

    #[test]
    fn test_cell_out_of_i16_range_is_malformed() {
        let table = Table::new(1);
        let mut tree = generate(&Value::special(table)).unwrap();
        tree.children[4].children[0].text = Some("40000".to_string());
        assert!(matches!(parse(&tree), Err(Error::MalformedNode { .. })));
    }

    #[test]
    fn test_color_equality_through_value() {
        let a = Value::special(Color::rgb(255.0, 0.0, 0.0));
        let b = Value::special(Color::rgb(255.0, 0.0, 0.0));
        let c = Value::special(Tone::new(255.0, 0.0, 0.0, 255.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
