//! Page entries shown in preview and reorder views

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::file::FileId;

/// Identity of one entry in a working set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Quarter-turn rotation, serialized as degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Next clockwise quarter turn; four steps return to the start
    pub fn rotate_cw(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Normalize any angle (negative included) to a quarter turn
    pub fn from_degrees(angle: i32) -> Option<Self> {
        match angle.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Rotation::from_degrees(value as i32)
            .ok_or_else(|| format!("rotation must be a multiple of 90, got {}", value))
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A small PNG preview of one page
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Thumbnail {
    /// `data:` URL suitable for an `<img src>`
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

/// One page of an uploaded file, as arranged by the user.
///
/// The rotation is display metadata only: the thumbnail keeps its original
/// orientation and is turned at presentation time.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    pub id: EntryId,
    pub source: FileId,
    pub source_name: String,
    /// Zero-based index within the source file
    pub page_index: u32,
    pub rotation: Rotation,
    pub thumbnail: Option<Thumbnail>,
}

impl PageEntry {
    /// Short label such as `a.pdf (p.2)`
    pub fn label(&self) -> String {
        format!("{} (p.{})", self.source_name, self.page_index + 1)
    }
}
