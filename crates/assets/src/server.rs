use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::asset::{Asset, AssetError, decode_file};

/// Load state of one named asset.
#[derive(Debug, Clone)]
pub enum AssetState {
    /// Requested; a loader has not reported back yet.
    Pending,
    Ready(Arc<Asset>),
    Failed(AssetError),
}

impl AssetState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

type LoadResult = (String, Result<Asset, AssetError>);

/// An asset that becomes ready after a fixed number of `update` calls.
#[derive(Debug)]
struct Deferred {
    name: String,
    asset: Asset,
    frames_left: u32,
}

/// Named asset cache with background loading.
///
/// `request` starts a load on first use and returns the current state. Results
/// from loader threads are only applied in `update`, which the frame scheduler
/// calls once at the start of every frame.
pub struct AssetServer {
    root: Option<PathBuf>,
    entries: BTreeMap<String, AssetState>,
    deferred: Vec<Deferred>,
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
}

impl AssetServer {
    /// Asset server resolving names relative to `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let mut server = Self::in_memory();
        server.root = Some(root.as_ref().to_path_buf());
        server
    }

    /// Asset server with no backing directory. Only inserted assets resolve.
    pub fn in_memory() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: None,
            entries: BTreeMap::new(),
            deferred: Vec::new(),
            sender,
            receiver,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Current state of `name`, starting a background load on first request.
    pub fn request(&mut self, name: &str) -> &AssetState {
        if !self.entries.contains_key(name) {
            let state = self.start_load(name);
            self.entries.insert(name.to_string(), state);
        }
        &self.entries[name]
    }

    fn start_load(&self, name: &str) -> AssetState {
        let Some(root) = &self.root else {
            return AssetState::Failed(AssetError::NotFound(name.to_string()));
        };
        let path = root.join(name);
        if !path.is_file() {
            tracing::warn!(asset = name, path = %path.display(), "asset file not found");
            return AssetState::Failed(AssetError::NotFound(name.to_string()));
        }

        let sender = self.sender.clone();
        let name = name.to_string();
        tracing::debug!(asset = %name, "starting background load");
        std::thread::spawn(move || {
            let result = decode_file(&name, &path);
            // The server may have been dropped; nothing to report to then.
            let _ = sender.send((name, result));
        });
        AssetState::Pending
    }

    /// Apply finished loads. Returns how many assets settled this call.
    pub fn update(&mut self) -> usize {
        let mut settled = 0;

        while let Ok((name, result)) = self.receiver.try_recv() {
            let state = match result {
                Ok(asset) => AssetState::Ready(Arc::new(asset)),
                Err(err) => {
                    tracing::error!(asset = %name, %err, "asset load failed");
                    AssetState::Failed(err)
                }
            };
            self.entries.insert(name, state);
            settled += 1;
        }

        let mut still_waiting = Vec::with_capacity(self.deferred.len());
        for mut d in self.deferred.drain(..) {
            d.frames_left = d.frames_left.saturating_sub(1);
            if d.frames_left == 0 {
                self.entries
                    .insert(d.name, AssetState::Ready(Arc::new(d.asset)));
                settled += 1;
            } else {
                still_waiting.push(d);
            }
        }
        self.deferred = still_waiting;

        settled
    }

    /// Register an already decoded asset. It is ready immediately.
    pub fn insert(&mut self, name: impl Into<String>, asset: Asset) {
        self.entries
            .insert(name.into(), AssetState::Ready(Arc::new(asset)));
    }

    /// Register an asset that reports ready after `frames` calls to `update`.
    pub fn insert_deferred(&mut self, name: impl Into<String>, asset: Asset, frames: u32) {
        let name = name.into();
        if frames == 0 {
            self.insert(name, asset);
            return;
        }
        self.entries.insert(name.clone(), AssetState::Pending);
        self.deferred.push(Deferred {
            name,
            asset,
            frames_left: frames,
        });
    }

    /// The asset if it is ready. Does not start a load.
    pub fn get(&self, name: &str) -> Option<Arc<Asset>> {
        match self.entries.get(name) {
            Some(AssetState::Ready(asset)) => Some(Arc::clone(asset)),
            _ => None,
        }
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(AssetState::is_ready)
    }

    /// Number of assets still waiting on a loader.
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, AssetState::Pending))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached asset. In-flight loads still land on the next update.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.deferred.clear();
    }
}

impl Default for AssetServer {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for AssetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetServer")
            .field("root", &self.root)
            .field("entries", &self.entries.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
