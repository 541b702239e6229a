//! Scalar features of a STEP (ISO 10303-21) text file.
//!
//! Two independent scans run over the text:
//! - entity keywords from [`KEYWORDS`], counted as whole words followed by `(`
//! - coordinate triplets `(a, b, c)` of numeric literals, folded into a bounding box

use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, GeometryResult};

/// Per-keyword cap on counted occurrences.
pub const MAX_KEYWORD_MATCHES: u64 = 250_000;
/// Cap on coordinate triplets folded into the bounding box.
pub const MAX_COORDINATE_MATCHES: u64 = 100_000;

/// Nominal vehicle envelope in millimetres, used when no coordinates are found.
pub const NOMINAL_ENVELOPE: BoundingBox = BoundingBox {
    min_x: 0.0,
    max_x: 210.0,
    min_y: -42.5,
    max_y: 42.5,
    min_z: 0.0,
    max_z: 65.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Point,
    Face,
    Shell,
    Curve,
}

#[derive(Debug, Clone, Copy)]
pub struct KeywordSpec {
    pub keyword: &'static str,
    pub weight: u64,
    pub kind: PrimitiveKind,
}

/// Keyword lookup table. Order is the order of [`GeometryFeatures::keyword_counts`].
pub const KEYWORDS: [KeywordSpec; 9] = [
    KeywordSpec {
        keyword: "CARTESIAN_POINT",
        weight: 1,
        kind: PrimitiveKind::Point,
    },
    KeywordSpec {
        keyword: "VERTEX_POINT",
        weight: 2,
        kind: PrimitiveKind::Point,
    },
    KeywordSpec {
        keyword: "ADVANCED_FACE",
        weight: 7,
        kind: PrimitiveKind::Face,
    },
    KeywordSpec {
        keyword: "FACE_SURFACE",
        weight: 7,
        kind: PrimitiveKind::Face,
    },
    KeywordSpec {
        keyword: "CLOSED_SHELL",
        weight: 13,
        kind: PrimitiveKind::Shell,
    },
    KeywordSpec {
        keyword: "OPEN_SHELL",
        weight: 11,
        kind: PrimitiveKind::Shell,
    },
    KeywordSpec {
        keyword: "B_SPLINE_CURVE_WITH_KNOTS",
        weight: 5,
        kind: PrimitiveKind::Curve,
    },
    KeywordSpec {
        keyword: "LINE",
        weight: 3,
        kind: PrimitiveKind::Curve,
    },
    KeywordSpec {
        keyword: "CIRCLE",
        weight: 3,
        kind: PrimitiveKind::Curve,
    },
];

pub fn keyword_weight(keyword: &str) -> Option<u64> {
    KEYWORDS
        .iter()
        .find(|k| k.keyword == keyword)
        .map(|k| k.weight)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl BoundingBox {
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, p: [f64; 3]) {
        self.min_x = self.min_x.min(p[0]);
        self.max_x = self.max_x.max(p[0]);
        self.min_y = self.min_y.min(p[1]);
        self.max_y = self.max_y.max(p[1]);
        self.min_z = self.min_z.min(p[2]);
        self.max_z = self.max_z.max(p[2]);
    }

    /// Extents along (x, y, z).
    pub fn extents(&self) -> [f64; 3] {
        [
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        ]
    }

    pub fn volume(&self) -> f64 {
        let [dx, dy, dz] = self.extents();
        dx * dy * dz
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveCounts {
    pub points: u64,
    pub faces: u64,
    pub shells: u64,
    pub curves: u64,
}

impl PrimitiveCounts {
    fn add(&mut self, kind: PrimitiveKind, count: u64) {
        match kind {
            PrimitiveKind::Point => self.points += count,
            PrimitiveKind::Face => self.faces += count,
            PrimitiveKind::Shell => self.shells += count,
            PrimitiveKind::Curve => self.curves += count,
        }
    }
}

/// Features derived once per uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryFeatures {
    pub bounds: BoundingBox,
    /// One entry per [`KEYWORDS`] row, in table order.
    pub keyword_counts: Vec<KeywordCount>,
    pub primitives: PrimitiveCounts,
    pub byte_len: u64,
    pub coordinate_matches: u64,
    pub used_fallback_bounds: bool,
}

impl GeometryFeatures {
    pub fn keyword_count(&self, keyword: &str) -> u64 {
        self.keyword_counts
            .iter()
            .find(|k| k.keyword == keyword)
            .map(|k| k.count)
            .unwrap_or(0)
    }
}

/// Extract features from raw file bytes. Invalid UTF-8 is decoded lossily.
pub fn extract_features(bytes: &[u8]) -> GeometryFeatures {
    let text: Cow<'_, str> = String::from_utf8_lossy(bytes);

    let mut keyword_counts = Vec::with_capacity(KEYWORDS.len());
    let mut primitives = PrimitiveCounts::default();
    for spec in &KEYWORDS {
        let count = count_entity(&text, spec.keyword);
        primitives.add(spec.kind, count);
        keyword_counts.push(KeywordCount {
            keyword: spec.keyword.to_string(),
            count,
        });
    }

    let (scanned, coordinate_matches) = scan_coordinates(&text);
    let used_fallback_bounds = coordinate_matches == 0;
    let bounds = if used_fallback_bounds {
        tracing::debug!(
            byte_len = bytes.len(),
            "no coordinates found, using nominal envelope"
        );
        NOMINAL_ENVELOPE
    } else {
        scanned
    };

    GeometryFeatures {
        bounds,
        keyword_counts,
        primitives,
        byte_len: bytes.len() as u64,
        coordinate_matches,
        used_fallback_bounds,
    }
}

/// Read a file and extract its features.
pub fn extract_features_from_path(path: &Path) -> GeometryResult<GeometryFeatures> {
    let bytes = std::fs::read(path).map_err(|source| GeometryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(extract_features(&bytes))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn count_entity(text: &str, keyword: &str) -> u64 {
    let bytes = text.as_bytes();
    let mut count = 0;
    for (at, _) in text.match_indices(keyword) {
        if at > 0 && is_ident_byte(bytes[at - 1]) {
            continue;
        }
        let mut i = at + keyword.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'(' {
            count += 1;
            if count >= MAX_KEYWORD_MATCHES {
                tracing::warn!(keyword, "keyword match cap reached");
                break;
            }
        }
    }
    count
}

fn scan_coordinates(text: &str) -> (BoundingBox, u64) {
    let bytes = text.as_bytes();
    let mut bounds = BoundingBox::empty();
    let mut matches = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'('
            && let Some((point, end)) = parse_triplet(bytes, i + 1)
        {
            bounds.include(point);
            matches += 1;
            if matches >= MAX_COORDINATE_MATCHES {
                tracing::warn!("coordinate match cap reached");
                break;
            }
            i = end;
            continue;
        }
        i += 1;
    }
    (bounds, matches)
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Parse `a , b , c )` starting just after an opening parenthesis.
fn parse_triplet(bytes: &[u8], start: usize) -> Option<([f64; 3], usize)> {
    let mut out = [0.0; 3];
    let mut i = start;
    for (axis, slot) in out.iter_mut().enumerate() {
        i = skip_ws(bytes, i);
        let (value, next) = parse_number(bytes, i)?;
        *slot = value;
        i = skip_ws(bytes, next);
        let expected = if axis < 2 { b',' } else { b')' };
        if bytes.get(i) != Some(&expected) {
            return None;
        }
        i += 1;
    }
    Some((out, i))
}

fn parse_number(bytes: &[u8], start: usize) -> Option<(f64, usize)> {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    let literal = std::str::from_utf8(&bytes[start..i]).ok()?;
    let value: f64 = literal.parse().ok()?;
    value.is_finite().then_some((value, i))
}
