//! Named color table.

use crate::column::{col, FromPayload, Payload};
use crate::cursor::{collect_rows, exec, first_row, Cursor};
use crate::db::{Database, Location};
use crate::error::Result;
use crate::traits::{Exportable, Transactional};
use crate::vault::schema;
use cfgvault_repr::codec::{decode_dword, encode_dword, flags_to_string, string_to_flags};
use cfgvault_repr::Element;
use rusqlite::params;

pub const EXPORT_SECTION: &str = "colors";

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColorFlags: u64 {
        const FG_4BIT = 0x0000_0000_0000_0001;
        const BG_4BIT = 0x0000_0000_0000_0002;
        const BOLD = 0x1000_0000_0000_0000;
        const ITALIC = 0x2000_0000_0000_0000;
        const UNDERLINE = 0x4000_0000_0000_0000;
    }
}

/// Names used in the `flags` attribute.
pub const FLAG_NAMES: [(u64, &str); 5] = [
    (ColorFlags::FG_4BIT.bits(), "fg4bit"),
    (ColorFlags::BG_4BIT.bits(), "bg4bit"),
    (ColorFlags::BOLD.bits(), "bold"),
    (ColorFlags::ITALIC.bits(), "italic"),
    (ColorFlags::UNDERLINE.bits(), "underline"),
];

/// Stored as 16 little-endian bytes: flags, background, foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub flags: ColorFlags,
    pub background: u32,
    pub foreground: u32,
}

impl Color {
    pub const SIZE: usize = 16;
    pub const TYPE_TAG: &'static str = "color";

    pub fn new(foreground: u32, background: u32, flags: ColorFlags) -> Self {
        Self {
            flags,
            background,
            foreground,
        }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..8].copy_from_slice(&self.flags.bits().to_le_bytes());
        bytes[8..12].copy_from_slice(&self.background.to_le_bytes());
        bytes[12..].copy_from_slice(&self.foreground.to_le_bytes());
        bytes
    }

    /// `None` unless `bytes` is exactly one record.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; Self::SIZE] = bytes.try_into().ok()?;
        let flags = u64::from_le_bytes(bytes[..8].try_into().ok()?);
        let background = u32::from_le_bytes(bytes[8..12].try_into().ok()?);
        let foreground = u32::from_le_bytes(bytes[12..].try_into().ok()?);
        Some(Self {
            flags: ColorFlags::from_bits_retain(flags),
            background,
            foreground,
        })
    }

    pub fn write_attrs(&self, e: &mut Element) {
        e.set_attr("type", Self::TYPE_TAG);
        e.set_attr("background", encode_dword(self.background));
        e.set_attr("foreground", encode_dword(self.foreground));
        e.set_attr("flags", flags_to_string(self.flags.bits(), &FLAG_NAMES));
    }

    /// All three attributes are required.
    pub fn from_attrs(e: &Element) -> Option<Self> {
        Some(Self {
            background: decode_dword(e.attr("background")?)?,
            foreground: decode_dword(e.attr("foreground")?)?,
            flags: ColorFlags::from_bits_retain(string_to_flags(e.attr("flags")?, &FLAG_NAMES)),
        })
    }
}

impl From<Color> for Payload {
    fn from(color: Color) -> Self {
        Payload::Blob(color.to_bytes().to_vec())
    }
}

impl FromPayload for Color {
    fn from_payload(payload: Payload) -> Option<Self> {
        payload.as_blob().and_then(Color::from_bytes)
    }
}

// ════════════════════════════════════════════════════════════════════
// Store
// ════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct ColorStore {
    db: Database,
}

impl ColorStore {
    pub fn open(location: &Location) -> Result<Self> {
        Ok(Self {
            db: Database::open(location, &schema::COLORS)?,
        })
    }

    pub fn set(&self, name: &str, color: Color) -> Result<()> {
        let blob = color.to_bytes();
        self.db.with(|conn| {
            exec(conn, schema::COLOR_SET, params![name, &blob[..]])?;
            Ok(())
        })
    }

    /// A record of the wrong size reads as absent.
    pub fn get(&self, name: &str) -> Result<Option<Color>> {
        self.db.with(|conn| {
            let value = first_row(conn, schema::COLOR_GET, params![name], |row| {
                col::<Option<Payload>>(row, 0)
            })?;
            Ok(value.flatten().and_then(Color::from_payload))
        })
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, schema::COLOR_DELETE, params![name])?;
            Ok(())
        })
    }

    /// Every readable color, ordered by name.
    pub fn enum_colors(&self) -> Cursor<'_, (String, Color)> {
        Cursor::new(move || {
            Ok(self
                .all_rows()?
                .into_iter()
                .filter_map(|(name, value)| Some((name, Color::from_payload(value?)?)))
                .collect())
        })
    }

    fn all_rows(&self) -> Result<Vec<(String, Option<Payload>)>> {
        self.db.with(|conn| {
            collect_rows(conn, schema::COLOR_ENUM_ALL, [], |row| {
                Ok((col(row, 0)?, col(row, 1)?))
            })
        })
    }
}

impl Transactional for ColorStore {
    fn database(&self) -> &Database {
        &self.db
    }
}

impl Exportable for ColorStore {
    fn export(&self, section: &mut Element) -> Result<()> {
        for (name, value) in self.all_rows()? {
            let Some(color) = value.and_then(Color::from_payload) else {
                tracing::debug!("Not exporting unreadable color {}", name);
                continue;
            };
            let e = section.add_child("object");
            e.set_attr("name", name);
            color.write_attrs(e);
            e.remove_attr("type");
        }
        Ok(())
    }

    fn import(&self, section: &Element) -> Result<()> {
        self.db.transaction(|| {
            for e in section.children_named("object") {
                let Some(name) = e.attr("name") else {
                    tracing::debug!("Skipping color object without a name");
                    continue;
                };
                let complete = ["background", "foreground", "flags"]
                    .iter()
                    .all(|attr| e.attr(attr).is_some());
                if !complete {
                    self.delete(name)?;
                    continue;
                }
                match Color::from_attrs(e) {
                    Some(color) => self.set(name, color)?,
                    None => tracing::debug!("Skipping malformed color {}", name),
                }
            }
            Ok(())
        })
    }
}
