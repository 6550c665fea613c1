// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Single background thread that owns every index mutation

use super::SpatialIndex;
use crate::error::SpatialError;
use crate::geometry::BoundingBox;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

enum Command<T> {
    Add(T, BoundingBox),
    Update(T, BoundingBox),
    Remove(T),
    Flush(Sender<()>),
}

/// Applies add/update/remove in submission order on one thread.
///
/// Deletion is two-phase: [`SpatialWorker::delete`] condemns the item immediately, so it
/// disappears from queries on return, and the physical removal is queued. Queries go
/// straight to [`SpatialWorker::index`] and never wait on the queue.
pub struct SpatialWorker<T, I>
where
    T: Send + 'static,
    I: SpatialIndex<T> + 'static,
{
    index: Arc<I>,
    sender: Option<Sender<Command<T>>>,
    thread: Option<JoinHandle<()>>,
    _item: PhantomData<fn(T)>,
}

impl<T, I> SpatialWorker<T, I>
where
    T: Clone + Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    I: SpatialIndex<T> + 'static,
{
    pub fn spawn(index: Arc<I>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker_index = Arc::clone(&index);
        let thread = thread::Builder::new()
            .name("spatial-worker".into())
            .spawn(move || run(worker_index, receiver))
            .ok();
        if thread.is_none() {
            warn!("failed to start spatial worker thread");
        }

        Self {
            index,
            sender: thread.as_ref().map(|_| sender),
            thread,
            _item: PhantomData,
        }
    }

    /// Shared index for queries
    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    pub fn add(&self, item: T, bounds: BoundingBox) -> Result<(), SpatialError> {
        self.send(Command::Add(item, bounds))
    }

    pub fn update(&self, item: T, bounds: BoundingBox) -> Result<(), SpatialError> {
        self.send(Command::Update(item, bounds))
    }

    /// Condemn now, remove on the worker.
    ///
    /// Also covers an `add` still waiting in the queue: the item is stored already condemned.
    pub fn delete(&self, item: T) -> Result<(), SpatialError> {
        self.index.condemn_pending(&item);
        self.send(Command::Remove(item))
    }

    /// Block until every command submitted so far has been applied
    pub fn flush(&self) -> Result<(), SpatialError> {
        let (done, wait) = mpsc::channel();
        self.send(Command::Flush(done))?;
        wait.recv().map_err(|_| SpatialError::WorkerStopped)
    }

    fn send(&self, command: Command<T>) -> Result<(), SpatialError> {
        self.sender
            .as_ref()
            .ok_or(SpatialError::WorkerStopped)?
            .send(command)
            .map_err(|_| SpatialError::WorkerStopped)
    }
}

impl<T, I> Drop for SpatialWorker<T, I>
where
    T: Send + 'static,
    I: SpatialIndex<T> + 'static,
{
    fn drop(&mut self) {
        // closing the channel ends the worker loop once the queue drains
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("spatial worker thread panicked");
            }
        }
    }
}

fn run<T, I>(index: Arc<I>, receiver: Receiver<Command<T>>)
where
    T: Clone + std::fmt::Debug,
    I: SpatialIndex<T>,
{
    for command in receiver {
        let outcome = match command {
            Command::Add(item, bounds) => index.add(item.clone(), bounds).map_err(|e| (item, e)),
            Command::Update(item, bounds) => index.update_bounds(&item, bounds).map_err(|e| (item, e)),
            Command::Remove(item) => index.remove(&item).map_err(|e| (item, e)),
            Command::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
        };
        if let Err((item, error)) = outcome {
            warn!(?item, %error, "spatial worker command failed");
        }
    }
    debug!("spatial worker stopped");
}
