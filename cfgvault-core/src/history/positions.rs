//! Last editor and viewer positions per file, with numbered bookmarks.
//!
//! Saving a position replaces the previous row of that file name, which
//! also drops its bookmarks through the cascading foreign key.

use super::HistoryStore;
use crate::column::col;
use crate::cursor::{exec, first_row};
use crate::error::Result;
use crate::vault::schema;
use rusqlite::params;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorPosition {
    pub line: i64,
    pub line_pos: i64,
    pub screen_line: i64,
    pub left_pos: i64,
    pub codepage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorBookmark {
    pub line: i64,
    pub line_pos: i64,
    pub screen_line: i64,
    pub left_pos: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerPosition {
    pub file_pos: i64,
    pub left_pos: i64,
    pub hex: i32,
    pub codepage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerBookmark {
    pub file_pos: i64,
    pub left_pos: i64,
}

impl HistoryStore {
    // ────────────────────────────────────────────────────────────────
    // Editor
    // ────────────────────────────────────────────────────────────────

    /// Returns the id bookmarks attach to.
    pub fn set_editor_pos(&self, name: &str, pos: &EditorPosition) -> Result<i64> {
        let time = self.clock.now();
        self.read(|conn| {
            exec(
                conn,
                schema::EDITOR_POS_SET,
                params![name, time, pos.line, pos.line_pos, pos.screen_line, pos.left_pos, pos.codepage],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_editor_pos(&self, name: &str) -> Result<Option<(i64, EditorPosition)>> {
        self.read(|conn| {
            first_row(conn, schema::EDITOR_POS_GET, params![name], |row| {
                Ok((
                    col(row, 0)?,
                    EditorPosition {
                        line: col(row, 1)?,
                        line_pos: col(row, 2)?,
                        screen_line: col(row, 3)?,
                        left_pos: col(row, 4)?,
                        codepage: u32::try_from(col::<i64>(row, 5)?).unwrap_or_default(),
                    },
                ))
            })
        })
    }

    pub fn set_editor_bookmark(&self, id: i64, slot: u32, mark: &EditorBookmark) -> Result<()> {
        self.read(|conn| {
            exec(
                conn,
                schema::EDITOR_BOOKMARK_SET,
                params![id, slot, mark.line, mark.line_pos, mark.screen_line, mark.left_pos],
            )?;
            Ok(())
        })
    }

    pub fn get_editor_bookmark(&self, id: i64, slot: u32) -> Result<Option<EditorBookmark>> {
        self.read(|conn| {
            first_row(conn, schema::EDITOR_BOOKMARK_GET, params![id, slot], |row| {
                Ok(EditorBookmark {
                    line: col(row, 0)?,
                    line_pos: col(row, 1)?,
                    screen_line: col(row, 2)?,
                    left_pos: col(row, 3)?,
                })
            })
        })
    }

    // ────────────────────────────────────────────────────────────────
    // Viewer
    // ────────────────────────────────────────────────────────────────

    pub fn set_viewer_pos(&self, name: &str, pos: &ViewerPosition) -> Result<i64> {
        let time = self.clock.now();
        self.read(|conn| {
            exec(
                conn,
                schema::VIEWER_POS_SET,
                params![name, time, pos.file_pos, pos.left_pos, pos.hex, pos.codepage],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_viewer_pos(&self, name: &str) -> Result<Option<(i64, ViewerPosition)>> {
        self.read(|conn| {
            first_row(conn, schema::VIEWER_POS_GET, params![name], |row| {
                Ok((
                    col(row, 0)?,
                    ViewerPosition {
                        file_pos: col(row, 1)?,
                        left_pos: col(row, 2)?,
                        hex: i32::try_from(col::<i64>(row, 3)?).unwrap_or_default(),
                        codepage: u32::try_from(col::<i64>(row, 4)?).unwrap_or_default(),
                    },
                ))
            })
        })
    }

    pub fn set_viewer_bookmark(&self, id: i64, slot: u32, mark: &ViewerBookmark) -> Result<()> {
        self.read(|conn| {
            exec(
                conn,
                schema::VIEWER_BOOKMARK_SET,
                params![id, slot, mark.file_pos, mark.left_pos],
            )?;
            Ok(())
        })
    }

    pub fn get_viewer_bookmark(&self, id: i64, slot: u32) -> Result<Option<ViewerBookmark>> {
        self.read(|conn| {
            first_row(conn, schema::VIEWER_BOOKMARK_GET, params![id, slot], |row| {
                Ok(ViewerBookmark {
                    file_pos: col(row, 0)?,
                    left_pos: col(row, 1)?,
                })
            })
        })
    }

    /// Forget editor and viewer positions older than `days`, keeping the
    /// `min_keep` newest of each.
    pub fn delete_old_positions(&self, days: u32, min_keep: u32) -> Result<()> {
        let older = self.cutoff(days);
        self.read(|conn| {
            exec(conn, schema::EDITOR_DELETE_OLD, params![older, min_keep])?;
            exec(conn, schema::VIEWER_DELETE_OLD, params![older, min_keep])?;
            Ok(())
        })
    }
}
