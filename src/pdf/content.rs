//! Positioned text runs from a page content stream
//!
//! Walks the text operators of a decoded [`Content`] and records where each
//! string is drawn. Only the text origin is tracked; glyph widths are not, so
//! consecutive strings drawn without repositioning are joined into one run.

use lopdf::Object;
use lopdf::content::{Content, Operation};

/// A string drawn at a page position, in user space units
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f64> = operands.iter().filter_map(number).collect();
        let values: [f64; 6] = values.try_into().ok()?;
        Some(Self(values))
    }

    /// `self` followed by `other`
    fn then(self, other: Self) -> Self {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Self([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn translate(self, tx: f64, ty: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty]).then(self)
    }

    fn origin(self) -> (f64, f64) {
        (self.0[4], self.0[5])
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Decode a PDF string: UTF-16BE with a byte order mark, otherwise one byte per character.
fn decode_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Text of a `TJ` array; large negative adjustments read as word gaps.
fn array_text(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&decode_string(bytes)),
            other => {
                if number(other).is_some_and(|gap| gap <= -200.0) && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }
    }
    text
}

#[derive(Debug)]
struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    line: Matrix,
    text: Matrix,
    leading: f64,
    positioned: bool,
    runs: Vec<TextRun>,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            line: Matrix::IDENTITY,
            text: Matrix::IDENTITY,
            leading: 0.0,
            positioned: true,
            runs: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line = self.line.translate(tx, ty);
        self.text = self.line;
        self.positioned = true;
    }

    fn show(&mut self, text: String) {
        if !self.positioned {
            if let Some(last) = self.runs.last_mut() {
                last.text.push_str(&text);
                return;
            }
        }

        let (x, y) = self.text.then(self.ctm).origin();
        self.runs.push(TextRun { x, y, text });
        self.positioned = false;
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = &operation.operands;
        let nums: Vec<f64> = operands.iter().filter_map(number).collect();

        match operation.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => self.ctm = self.saved.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.ctm = m.then(self.ctm);
                }
            }
            "BT" => {
                self.line = Matrix::IDENTITY;
                self.text = Matrix::IDENTITY;
                self.positioned = true;
            }
            "Td" if nums.len() == 2 => self.move_line(nums[0], nums[1]),
            "TD" if nums.len() == 2 => {
                self.leading = -nums[1];
                self.move_line(nums[0], nums[1]);
            }
            "TL" if nums.len() == 1 => self.leading = nums[0],
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.line = m;
                    self.text = m;
                    self.positioned = true;
                }
            }
            "T*" => self.move_line(0.0, -self.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(decode_string(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    self.show(array_text(items));
                }
            }
            "'" | "\"" => {
                self.move_line(0.0, -self.leading);
                if let Some(Object::String(bytes, _)) = operands.last() {
                    self.show(decode_string(bytes));
                }
            }
            _ => {}
        }
    }
}

/// Every text run drawn by `content`, in drawing order.
pub fn text_runs(content: &Content) -> Vec<TextRun> {
    let mut state = TextState::new();
    for operation in &content.operations {
        state.apply(operation);
    }
    state.runs
}
