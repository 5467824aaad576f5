use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of capturable surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Window,
    Screen,
}

impl SourceKind {
    /// Kinds offered by the source picker
    pub const ALL: [SourceKind; 2] = [SourceKind::Window, SourceKind::Screen];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Window => f.write_str("window"),
            SourceKind::Screen => f.write_str("screen"),
        }
    }
}

/// A screen or window the host can capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSource {
    /// Host-specific identifier (e.g. "screen:0", "window:0x3a00007")
    pub id: String,

    /// Display label shown in the picker
    pub name: String,

    pub kind: SourceKind,
}

impl CaptureSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// Case-insensitive match against either the id or the display name
    pub fn matches(&self, query: &str) -> bool {
        self.id == query || self.name.eq_ignore_ascii_case(query)
    }
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
