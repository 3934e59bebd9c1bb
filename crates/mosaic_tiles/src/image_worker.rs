//! Dedicated worker thread for image-sourced tiles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use mosaic_asset::{AssetKind, SourcePath};

use crate::cache::TileCache;
use crate::codec;
use crate::error::{Result, TileError};
use crate::placeholder::Placeholders;

enum WorkerCommand {
    Generate(SourcePath),
    Shutdown,
}

/// Image tile worker.
///
/// Decodes, resizes and block-compresses image assets to tile files on one
/// dedicated thread, in request order. Failures degrade to the texture
/// placeholder tile and never stop the loop. Dropping the worker lets an
/// in-progress item finish, abandons anything still queued, and joins the
/// thread.
pub struct ImageTileWorker {
    sender: Sender<WorkerCommand>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ImageTileWorker {
    /// Spawn the worker thread.
    pub fn spawn(cache: TileCache, placeholders: Arc<Placeholders>) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_shutdown = shutdown.clone();
        let thread = std::thread::Builder::new()
            .name("tile-image-worker".to_string())
            .spawn(move || {
                let worker = Worker {
                    cache,
                    placeholders,
                };
                worker.run(receiver, worker_shutdown);
            })
            .map_err(TileError::WorkerSpawn)?;

        Ok(Self {
            sender,
            shutdown,
            thread: Some(thread),
        })
    }

    /// Queue one image for tile generation. Never blocks.
    pub fn enqueue(&self, path: SourcePath) {
        if self.sender.send(WorkerCommand::Generate(path)).is_err() {
            log::warn!("image tile worker is gone; dropping request");
        }
    }

    /// Commands queued and not yet picked up.
    pub fn backlog(&self) -> usize {
        self.sender.len()
    }
}

impl Drop for ImageTileWorker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let _ = self.sender.send(WorkerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct Worker {
    cache: TileCache,
    placeholders: Arc<Placeholders>,
}

impl Worker {
    fn run(&self, receiver: Receiver<WorkerCommand>, shutdown: Arc<AtomicBool>) {
        while let Ok(command) = receiver.recv() {
            if shutdown.load(Ordering::Acquire) {
                break;
            }
            match command {
                WorkerCommand::Generate(path) => self.generate(&path),
                WorkerCommand::Shutdown => break,
            }
        }
    }

    fn generate(&self, path: &SourcePath) {
        if let Err(err) = self.try_generate(path) {
            log::error!("tile generation failed for {path}: {err}");
            if let Err(err) = self.write_placeholder(path) {
                log::error!("placeholder tile write failed for {path}: {err}");
            }
        }
    }

    fn try_generate(&self, path: &SourcePath) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|source| TileError::SourceUnreadable {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let decoded = codec::decode_source(path, &bytes)?;
        let tile = codec::resize_to_tile(&decoded);
        let encoded = codec::encode_color_tile(&tile)?;
        self.cache.write(path.cache_key(), &encoded)?;
        log::debug!("tile written for {path}");
        Ok(())
    }

    fn write_placeholder(&self, path: &SourcePath) -> Result<()> {
        self.placeholders
            .write_for(AssetKind::Texture, &self.cache.tile_path_for(path))
    }
}
