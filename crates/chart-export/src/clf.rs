//! Common LUT Format (CLF) transform documents holding one matrix.
//!
//! Written documents look like:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <ProcessList id="0f8c..." compCLFversion="3">
//!   <Description>3x3 color matrix fitted from chart patches</Description>
//!   <Matrix inBitDepth="16f" outBitDepth="16f">
//!     <Array dim="3 3 3">1.1 -0.05 -0.05 0 1 0 0 0.02 0.98</Array>
//!   </Matrix>
//! </ProcessList>
//! ```
//!
//! Every document gets a fresh random version-4 UUID as its `id`, so two
//! exports of the same matrix are distinct documents.
//!
//! The reader accepts `dim="3 3"`, `dim="3 3 3"` and the offset forms
//! `dim="3 4"` / `dim="3 4 3"` (offsets must be zero), undoes integer bit
//! depth scaling, and composes consecutive `Matrix` nodes into one.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chart_math::Mat3;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, trace};

use crate::{ExportError, ExportResult, format_value};

/// Description written into every document.
pub const DESCRIPTION: &str = "3x3 color matrix fitted from chart patches";

/// CLF bit depth attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// 8-bit integer
    Int8,
    /// 10-bit integer
    Int10,
    /// 12-bit integer
    Int12,
    /// 16-bit integer
    Int16,
    /// 16-bit float (half)
    #[default]
    Float16,
    /// 32-bit float
    Float32,
}

impl BitDepth {
    /// Maximum code value; 1.0 for float depths.
    pub fn scale(&self) -> f64 {
        match self {
            BitDepth::Int8 => 255.0,
            BitDepth::Int10 => 1023.0,
            BitDepth::Int12 => 4095.0,
            BitDepth::Int16 => 65535.0,
            BitDepth::Float16 | BitDepth::Float32 => 1.0,
        }
    }

    /// Parses a CLF attribute value such as `"16f"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "8i" => Some(BitDepth::Int8),
            "10i" => Some(BitDepth::Int10),
            "12i" => Some(BitDepth::Int12),
            "16i" => Some(BitDepth::Int16),
            "16f" => Some(BitDepth::Float16),
            "32f" => Some(BitDepth::Float32),
            _ => None,
        }
    }

    /// The CLF attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            BitDepth::Int8 => "8i",
            BitDepth::Int10 => "10i",
            BitDepth::Int12 => "12i",
            BitDepth::Int16 => "16i",
            BitDepth::Float16 => "16f",
            BitDepth::Float32 => "32f",
        }
    }
}

/// A single-matrix CLF document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessList {
    /// Document identifier.
    pub id: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Normalized matrix (bit depth scaling removed).
    pub matrix: Mat3,
}

impl ProcessList {
    /// Wraps `matrix` in a document with a fresh random id.
    pub fn new(matrix: Mat3) -> Self {
        Self {
            id: new_process_id(),
            description: Some(DESCRIPTION.to_string()),
            matrix,
        }
    }

    /// Serializes the document as CLF XML into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NonFinite`] for NaN or infinite entries and
    /// [`ExportError::WriteError`] if the writer fails.
    pub fn write_to<W: Write>(&self, writer: W) -> ExportResult<()> {
        if !self.matrix.is_finite() {
            return Err(ExportError::NonFinite);
        }
        let mut xml = Writer::new_with_indent(writer, b' ', 2);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;

        let mut pl_start = BytesStart::new("ProcessList");
        pl_start.push_attribute(("id", self.id.as_str()));
        pl_start.push_attribute(("compCLFversion", "3"));
        xml.write_event(Event::Start(pl_start)).map_err(write_error)?;

        if let Some(ref desc) = self.description {
            xml.write_event(Event::Start(BytesStart::new("Description")))
                .map_err(write_error)?;
            xml.write_event(Event::Text(BytesText::new(desc)))
                .map_err(write_error)?;
            xml.write_event(Event::End(BytesEnd::new("Description")))
                .map_err(write_error)?;
        }

        let depth = BitDepth::Float16.as_str();
        let mut start = BytesStart::new("Matrix");
        start.push_attribute(("inBitDepth", depth));
        start.push_attribute(("outBitDepth", depth));
        xml.write_event(Event::Start(start)).map_err(write_error)?;

        let mut arr = BytesStart::new("Array");
        arr.push_attribute(("dim", "3 3 3"));
        xml.write_event(Event::Start(arr)).map_err(write_error)?;

        let text = self
            .matrix
            .to_row_major()
            .iter()
            .map(|&v| format_value(v))
            .collect::<Vec<_>>()
            .join(" ");
        xml.write_event(Event::Text(BytesText::new(&text)))
            .map_err(write_error)?;

        xml.write_event(Event::End(BytesEnd::new("Array")))
            .map_err(write_error)?;
        xml.write_event(Event::End(BytesEnd::new("Matrix")))
            .map_err(write_error)?;
        xml.write_event(Event::End(BytesEnd::new("ProcessList")))
            .map_err(write_error)?;

        xml.into_inner().flush()?;
        Ok(())
    }

    /// Serializes the document as a CLF XML string.
    pub fn to_xml(&self) -> ExportResult<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| ExportError::WriteError(e.to_string()))
    }
}

fn write_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::WriteError(e.to_string())
}

/// Generates a random version-4 UUID string.
pub fn new_process_id() -> String {
    let mut bytes: [u8; 16] = rand::random();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Renders `m` as a CLF document with a fresh random id.
///
/// # Example
///
/// ```rust
/// use chart_export::clf::to_transform_document;
/// use chart_math::Mat3;
///
/// let xml = to_transform_document(&Mat3::IDENTITY).unwrap();
/// assert!(xml.contains(r#"<Array dim="3 3 3">1 0 0 0 1 0 0 0 1</Array>"#));
/// ```
pub fn to_transform_document(m: &Mat3) -> ExportResult<String> {
    ProcessList::new(*m).to_xml()
}

/// Writes `m` as a CLF document to `path`.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be created.
pub fn write_transform_document<P: AsRef<Path>>(path: P, m: &Mat3) -> ExportResult<()> {
    let path = path.as_ref();
    let doc = ProcessList::new(*m);
    if !doc.matrix.is_finite() {
        return Err(ExportError::NonFinite);
    }
    let file = File::create(path)?;
    doc.write_to(BufWriter::new(file))?;
    debug!(path = %path.display(), id = %doc.id, "Wrote CLF matrix");
    Ok(())
}

/// Reads a single-matrix CLF document from disk.
pub fn read_process_list<P: AsRef<Path>>(path: P) -> ExportResult<ProcessList> {
    let path = path.as_ref();
    trace!(path = %path.display(), "read_process_list");
    let file = File::open(path)?;
    parse_process_list(BufReader::new(file))
}

/// Reads just the matrix of a CLF document.
pub fn read_matrix_clf<P: AsRef<Path>>(path: P) -> ExportResult<Mat3> {
    Ok(read_process_list(path)?.matrix)
}

/// State of the `Matrix` node being read.
#[derive(Default)]
struct MatrixNode {
    in_depth: BitDepth,
    out_depth: BitDepth,
    dim: Vec<usize>,
    values: String,
}

impl MatrixNode {
    fn finish(self) -> ExportResult<Mat3> {
        let values: Vec<f64> = self
            .values
            .split_whitespace()
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| ExportError::ParseError(format!("invalid matrix value '{s}'")))
            })
            .collect::<ExportResult<_>>()?;

        let cols = match self.dim.as_slice() {
            [3, 3] | [3, 3, 3] => 3,
            [3, 4] | [3, 4, 3] => 4,
            other => {
                return Err(ExportError::ParseError(format!(
                    "unsupported Matrix dim {other:?}"
                )));
            }
        };
        if values.len() != 3 * cols {
            return Err(ExportError::ParseError(format!(
                "Matrix dim {:?} needs {} values, found {}",
                self.dim,
                3 * cols,
                values.len()
            )));
        }

        let mut linear = Vec::with_capacity(9);
        for chunk in values.chunks(cols) {
            if cols == 4 && chunk[3] != 0.0 {
                return Err(ExportError::ParseError(
                    "Matrix offsets are not supported".into(),
                ));
            }
            linear.extend_from_slice(&chunk[..3]);
        }
        let m = Mat3::from_row_major(&linear)
            .ok_or_else(|| ExportError::ParseError("Matrix needs 9 coefficients".into()))?;

        // Coefficients carry the in-to-out code value scaling.
        let k = self.in_depth.scale() / self.out_depth.scale();
        Ok(m * k)
    }
}

fn attr_depth(value: &[u8]) -> ExportResult<BitDepth> {
    let s = String::from_utf8_lossy(value);
    BitDepth::parse(&s).ok_or_else(|| ExportError::ParseError(format!("unknown bit depth '{s}'")))
}

/// Parses a CLF document holding one or more `Matrix` nodes.
///
/// Consecutive matrices are composed in document order.
///
/// # Errors
///
/// Returns [`ExportError::ParseError`] for malformed XML, a missing
/// `ProcessList`, any process node other than `Matrix`, or no matrix at all.
pub fn parse_process_list<R: BufRead>(reader: R) -> ExportResult<ProcessList> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut id: Option<String> = None;
    let mut description: Option<String> = None;
    let mut in_description = false;
    let mut node: Option<MatrixNode> = None;
    let mut in_array = false;
    let mut matrix: Option<Mat3> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"ProcessList" => {
                    let mut pl_id = String::new();
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"id" {
                            pl_id = String::from_utf8_lossy(&attr.value).into();
                        }
                    }
                    id = Some(pl_id);
                }
                b"Description" => in_description = true,
                b"Matrix" => {
                    let mut m = MatrixNode::default();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"inBitDepth" => m.in_depth = attr_depth(&attr.value)?,
                            b"outBitDepth" => m.out_depth = attr_depth(&attr.value)?,
                            _ => {}
                        }
                    }
                    node = Some(m);
                }
                b"Array" => {
                    if let Some(ref mut m) = node {
                        in_array = true;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"dim" {
                                m.dim = String::from_utf8_lossy(&attr.value)
                                    .split_whitespace()
                                    .filter_map(|s| s.parse().ok())
                                    .collect();
                            }
                        }
                    }
                }
                b"LUT1D" | b"LUT3D" | b"Range" | b"ASC_CDL" | b"Log" | b"Exponent" => {
                    return Err(ExportError::ParseError(format!(
                        "unsupported process node {}",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = String::from_utf8_lossy(&e);
                if in_array {
                    if let Some(ref mut m) = node {
                        m.values.push(' ');
                        m.values.push_str(&text);
                    }
                } else if in_description {
                    description.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"Description" => in_description = false,
                b"Array" => in_array = false,
                b"Matrix" => {
                    if let Some(m) = node.take() {
                        let next = m.finish()?;
                        matrix = Some(match matrix {
                            Some(prev) => next * prev,
                            None => next,
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExportError::ParseError(format!("XML error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    let id = id.ok_or_else(|| ExportError::ParseError("missing ProcessList element".into()))?;
    let matrix = matrix.ok_or_else(|| ExportError::ParseError("no Matrix node".into()))?;
    Ok(ProcessList {
        id,
        description,
        matrix,
    })
}
