//! File type associations: a weight-ordered list of masks, each with
//! per-kind commands.

use crate::column::col;
use crate::cursor::{collect_rows, exec, first_row, Cursor};
use crate::db::{Database, Location};
use crate::error::Result;
use crate::traits::{Exportable, Transactional};
use crate::vault::schema;
use cfgvault_repr::Element;
use rusqlite::{params, Row};

pub const EXPORT_SECTION: &str = "associations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub id: i64,
    pub mask: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: i32,
    pub enabled: bool,
    pub command: String,
}

#[derive(Debug)]
pub struct AssociationStore {
    db: Database,
}

impl AssociationStore {
    pub fn open(location: &Location) -> Result<Self> {
        Ok(Self {
            db: Database::open(location, &schema::ASSOCIATIONS)?,
        })
    }

    /// Insert a new type right after `after` (`None` puts it first). Every
    /// entry ranked below the insertion point moves down by one.
    pub fn add_type(&self, after: Option<i64>, mask: &str, description: &str) -> Result<i64> {
        let after = after.unwrap_or(0);
        self.db.transaction(|| {
            self.db.with(|conn| {
                exec(conn, schema::TYPE_REORDER, params![after])?;
                exec(conn, schema::TYPE_ADD, params![after, mask, description])?;
                Ok(conn.last_insert_rowid())
            })
        })
    }

    pub fn update_type(&self, id: i64, mask: &str, description: &str) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, schema::TYPE_UPDATE, params![mask, description, id])?;
            Ok(())
        })
    }

    /// Commands go with the type.
    pub fn delete_type(&self, id: i64) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, schema::TYPE_DELETE, params![id])?;
            Ok(())
        })
    }

    /// Exchange the weights of two entries. `false` when either is missing.
    pub fn swap_positions(&self, first: i64, second: i64) -> Result<bool> {
        let (Some(w1), Some(w2)) = (self.weight(first)?, self.weight(second)?) else {
            return Ok(false);
        };
        self.db.transaction(|| {
            self.db.with(|conn| {
                exec(conn, schema::TYPE_SET_WEIGHT, params![w1, second])?;
                exec(conn, schema::TYPE_SET_WEIGHT, params![w2, first])?;
                Ok(true)
            })
        })
    }

    pub fn weight(&self, id: i64) -> Result<Option<i64>> {
        self.db.with(|conn| first_row(conn, schema::TYPE_GET_WEIGHT, params![id], |row| col(row, 0)))
    }

    pub fn get_mask(&self, id: i64) -> Result<Option<String>> {
        self.text_by_id(schema::TYPE_GET_MASK, id)
    }

    pub fn get_description(&self, id: i64) -> Result<Option<String>> {
        self.text_by_id(schema::TYPE_GET_DESCRIPTION, id)
    }

    fn text_by_id(&self, sql: &str, id: i64) -> Result<Option<String>> {
        self.db.with(|conn| {
            let text = first_row(conn, sql, params![id], |row| col::<Option<String>>(row, 0))?;
            Ok(text.map(Option::unwrap_or_default))
        })
    }

    /// The command for `kind` and whether it is enabled.
    pub fn get_command(&self, id: i64, kind: i32) -> Result<Option<(String, bool)>> {
        self.db.with(|conn| {
            first_row(conn, schema::COMMAND_GET, params![id, kind], |row| {
                let command: Option<String> = col(row, 0)?;
                Ok((command.unwrap_or_default(), col::<i64>(row, 1)? != 0))
            })
        })
    }

    pub fn set_command(&self, id: i64, kind: i32, command: &str, enabled: bool) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, schema::COMMAND_SET, params![id, kind, enabled, command])?;
            Ok(())
        })
    }

    /// `(id, description)` in weight order.
    pub fn enum_types(&self) -> Cursor<'_, (i64, String)> {
        self.id_text_cursor(schema::TYPE_ENUM, None)
    }

    /// `(id, mask)` in weight order.
    pub fn enum_masks(&self) -> Cursor<'_, (i64, String)> {
        self.id_text_cursor(schema::TYPE_ENUM_MASKS, None)
    }

    /// Masks that have an enabled command of `kind`, in weight order.
    pub fn enum_masks_for_type(&self, kind: i32) -> Cursor<'_, (i64, String)> {
        self.id_text_cursor(schema::TYPE_ENUM_MASKS_FOR_TYPE, Some(kind))
    }

    fn id_text_cursor(&self, sql: &'static str, kind: Option<i32>) -> Cursor<'_, (i64, String)> {
        Cursor::new(move || {
            self.db.with(|conn| match kind {
                Some(kind) => collect_rows(conn, sql, params![kind], id_and_text),
                None => collect_rows(conn, sql, [], id_and_text),
            })
        })
    }

    pub fn file_types(&self) -> Result<Vec<FileType>> {
        self.db.with(|conn| {
            collect_rows(conn, schema::TYPE_ENUM_ALL, [], |row| {
                Ok(FileType {
                    id: col(row, 0)?,
                    mask: col::<Option<String>>(row, 1)?.unwrap_or_default(),
                    description: col::<Option<String>>(row, 2)?.unwrap_or_default(),
                })
            })
        })
    }

    pub fn commands(&self, id: i64) -> Result<Vec<Command>> {
        self.db.with(|conn| {
            collect_rows(conn, schema::COMMAND_ENUM, params![id], |row| {
                Ok(Command {
                    kind: i32::try_from(col::<i64>(row, 0)?).unwrap_or_default(),
                    enabled: col::<i64>(row, 1)? != 0,
                    command: col::<Option<String>>(row, 2)?.unwrap_or_default(),
                })
            })
        })
    }
}

fn id_and_text(row: &Row<'_>) -> Result<(i64, String)> {
    let text: Option<String> = col(row, 1)?;
    Ok((col(row, 0)?, text.unwrap_or_default()))
}

impl Transactional for AssociationStore {
    fn database(&self) -> &Database {
        &self.db
    }
}

impl Exportable for AssociationStore {
    fn export(&self, section: &mut Element) -> Result<()> {
        for file_type in self.file_types()? {
            let e = section.add_child("filetype");
            e.set_attr("mask", file_type.mask);
            e.set_attr("description", file_type.description);
            for command in self.commands(file_type.id)? {
                let c = e.add_child("command");
                c.set_attr("type", command.kind.to_string());
                c.set_attr("enabled", i32::from(command.enabled).to_string());
                c.set_attr("command", command.command);
            }
        }
        Ok(())
    }

    /// Replaces the whole list, keeping document order.
    fn import(&self, section: &Element) -> Result<()> {
        self.db.transaction(|| {
            self.db.with(|conn| {
                exec(conn, schema::TYPE_DELETE_ALL, [])?;
                Ok(())
            })?;

            let mut last = None;
            for e in section.children_named("filetype") {
                let Some(mask) = e.attr("mask") else {
                    tracing::debug!("Skipping filetype without a mask");
                    continue;
                };
                let id = self.add_type(last, mask, e.attr("description").unwrap_or_default())?;
                last = Some(id);

                for c in e.children_named("command") {
                    let command = c.attr("command");
                    let kind = c.attr("type").and_then(|v| v.trim().parse::<i32>().ok());
                    let enabled = c.attr("enabled").and_then(|v| v.trim().parse::<i32>().ok());
                    match (command, kind, enabled) {
                        (Some(command), Some(kind), Some(enabled)) => {
                            self.set_command(id, kind, command, enabled != 0)?
                        }
                        _ => tracing::debug!("Skipping malformed command of {}", mask),
                    }
                }
            }
            Ok(())
        })
    }
}
