//! The history writer thread.
//!
//! Callers queue work on an unbounded channel. The thread drains everything
//! available into one batch and applies it inside one transaction, then
//! answers the waiting callers. A barrier is answered only after the batch it
//! arrived in has been committed (or folded into the caller's open
//! transaction), so draining the queue gives read-after-write consistency.

use super::NewRecord;
use crate::cursor::exec;
use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::vault::schema;
use rusqlite::params;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

pub(crate) enum WorkItem {
    /// Optional delete followed by an insert, applied as one unit.
    DeleteAndAppend {
        delete_id: Option<i64>,
        record: NewRecord,
        time: i64,
        reply: Option<oneshot::Sender<Result<i64>>>,
    },
    /// Close the caller's outer transaction.
    Commit,
    /// Answered once everything queued before it has been applied.
    Barrier(oneshot::Sender<()>),
    Stop,
}

#[derive(Debug)]
pub(crate) struct Worker {
    tx: mpsc::UnboundedSender<WorkItem>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn(db: Arc<Database>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = std::thread::Builder::new()
            .name("history-writer".into())
            .spawn(move || run(db, rx))?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    pub(crate) fn send(&self, item: WorkItem) -> Result<()> {
        self.tx.send(item).map_err(|_| StoreError::WorkerGone)
    }

    /// Block until everything queued so far has been applied.
    pub(crate) fn drain(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(WorkItem::Barrier(ack))?;
        done.blocking_recv().map_err(|_| StoreError::WorkerGone)
    }

    /// Queue an insert and wait for its id.
    pub(crate) fn append(&self, delete_id: Option<i64>, record: NewRecord, time: i64) -> Result<i64> {
        let (reply, id) = oneshot::channel();
        self.send(WorkItem::DeleteAndAppend {
            delete_id,
            record,
            time,
            reply: Some(reply),
        })?;
        id.blocking_recv().map_err(|_| StoreError::WorkerGone)?
    }

    /// Two-phase stop: the queue drains first, then the thread exits.
    fn stop(&mut self) {
        if let Err(err) = self.drain() {
            tracing::warn!("History writer did not drain before stop: {}", err);
        }
        let _ = self.tx.send(WorkItem::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("History writer thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(db: Arc<Database>, mut rx: mpsc::UnboundedReceiver<WorkItem>) {
    tracing::debug!("History writer started for {}", db.location());
    while let Some(first) = rx.blocking_recv() {
        let mut batch = vec![first];
        while let Ok(item) = rx.try_recv() {
            batch.push(item);
        }
        if apply_batch(&db, batch) {
            break;
        }
    }
    tracing::debug!("History writer stopped for {}", db.location());
}

/// Returns true once a stop request has been seen.
fn apply_batch(db: &Database, batch: Vec<WorkItem>) -> bool {
    let mut replies = Vec::new();
    let mut acks = Vec::new();
    let mut stop = false;

    let opened = match db.begin_transaction() {
        Ok(()) => true,
        Err(err) => {
            tracing::error!("History writer could not open a transaction: {}", err);
            false
        }
    };

    for item in batch {
        match item {
            WorkItem::DeleteAndAppend {
                delete_id,
                record,
                time,
                reply,
            } => {
                let result = delete_and_append(db, delete_id, &record, time);
                if let Err(err) = &result {
                    tracing::error!("History write failed: {}", err);
                }
                if let Some(reply) = reply {
                    replies.push((reply, result));
                }
            }
            WorkItem::Commit => {
                if let Err(err) = db.end_transaction() {
                    tracing::error!("History commit failed: {}", err);
                }
            }
            WorkItem::Barrier(ack) => acks.push(ack),
            WorkItem::Stop => stop = true,
        }
    }

    if opened {
        if let Err(err) = db.end_transaction() {
            tracing::error!("History batch commit failed: {}", err);
        }
    }

    for (reply, result) in replies {
        let _ = reply.send(result);
    }
    for ack in acks {
        let _ = ack.send(());
    }
    stop
}

fn delete_and_append(db: &Database, delete_id: Option<i64>, record: &NewRecord, time: i64) -> Result<i64> {
    db.with(|conn| {
        if let Some(id) = delete_id {
            exec(conn, schema::HISTORY_DELETE, params![id])?;
        }
        exec(
            conn,
            schema::HISTORY_ADD,
            params![
                record.kind as i64,
                record.key,
                record.record_type,
                record.locked,
                record.name,
                time,
                record.guid,
                record.file,
                record.data
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}
