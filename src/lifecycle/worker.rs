use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::InstallWorker;
use crate::config::FileEntry;
use crate::variables::VariableStore;

/// Progress reported by the install worker to the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallProgress {
    FileWritten {
        path: PathBuf,
        index: usize,
        total: usize,
    },
    Finished {
        success: bool,
        message: String,
    },
}

/// Append-only log of written paths, shared between the worker thread and
/// the lifecycle manager
#[derive(Debug, Clone, Default)]
pub struct InstalledFiles(Arc<Mutex<Vec<PathBuf>>>);

impl InstalledFiles {
    pub fn record(&self, path: PathBuf) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(path);
    }

    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Copies the configured files to their targets on a blocking thread.
///
/// A file being copied cannot be interrupted; the interrupt flag is checked
/// between files.
pub struct UnpackWorker {
    entries: Vec<FileEntry>,
    progress: mpsc::UnboundedSender<InstallProgress>,
    dryrun: bool,
    runtime: Handle,
    files: InstalledFiles,
    interrupt: Arc<AtomicBool>,
    discard: Arc<AtomicBool>,
    done_tx: Option<watch::Sender<bool>>,
    done: watch::Receiver<bool>,
}

impl UnpackWorker {
    pub fn new(
        entries: Vec<FileEntry>,
        progress: mpsc::UnboundedSender<InstallProgress>,
        runtime: Handle,
    ) -> Self {
        let (done_tx, done) = watch::channel(false);
        Self {
            entries,
            progress,
            dryrun: false,
            runtime,
            files: InstalledFiles::default(),
            interrupt: Arc::new(AtomicBool::new(false)),
            discard: Arc::new(AtomicBool::new(false)),
            done_tx: Some(done_tx),
            done,
        }
    }

    pub fn dryrun(mut self, dryrun: bool) -> Self {
        self.dryrun = dryrun;
        self
    }

    fn started(&self) -> bool {
        self.done_tx.is_none()
    }
}

fn copy_file(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    Ok(())
}

impl InstallWorker for UnpackWorker {
    fn start(&mut self, variables: &VariableStore) {
        let Some(done_tx) = self.done_tx.take() else {
            warn!("Unpack worker already started");
            return;
        };

        let jobs: Vec<(PathBuf, PathBuf)> = self
            .entries
            .iter()
            .map(|e| {
                (
                    PathBuf::from(variables.substitute(&e.source)),
                    PathBuf::from(variables.substitute(&e.target)),
                )
            })
            .collect();

        let progress = self.progress.clone();
        let files = self.files.clone();
        let interrupt = self.interrupt.clone();
        let discard = self.discard.clone();
        let dryrun = self.dryrun;

        info!("Installing {} files (dryrun: {})", jobs.len(), dryrun);

        self.runtime.spawn_blocking(move || {
            let total = jobs.len();
            let mut success = true;
            let mut message = format!("Installed {} files", total);

            for (index, (source, target)) in jobs.into_iter().enumerate() {
                if interrupt.load(Ordering::SeqCst) {
                    info!("Install interrupted after {} files", index);
                    success = false;
                    message = "Installation interrupted".to_string();
                    break;
                }

                let result = if dryrun {
                    debug!("Dryrun: would copy {:?} -> {:?}", source, target);
                    Ok(())
                } else {
                    discard.store(true, Ordering::SeqCst);
                    files.record(target.clone());
                    let result = copy_file(&source, &target);
                    discard.store(false, Ordering::SeqCst);
                    result
                };

                match result {
                    Ok(()) => {
                        let _ = progress.send(InstallProgress::FileWritten {
                            path: target,
                            index,
                            total,
                        });
                    }
                    Err(e) => {
                        error!("Failed to copy {:?} -> {:?}: {}", source, target, e);
                        success = false;
                        message = format!("Failed to install {}: {}", target.display(), e);
                        break;
                    }
                }
            }

            let _ = progress.send(InstallProgress::Finished { success, message });
            let _ = done_tx.send(true);
        });
    }

    fn request_interrupt_all(&mut self, timeout: Duration) -> bool {
        if !self.started() {
            return true;
        }

        self.interrupt.store(true, Ordering::SeqCst);
        let mut done = self.done.clone();
        let wait = async move {
            // An error means the job is gone, which is just as stopped
            let _ = done.wait_for(|finished| *finished).await;
        };

        match self.runtime.block_on(tokio::time::timeout(timeout, wait)) {
            Ok(()) => true,
            Err(_) => {
                warn!("Install worker still running after {:?}", timeout);
                false
            }
        }
    }

    fn is_discard_interrupt(&self) -> bool {
        self.discard.load(Ordering::SeqCst)
    }

    fn installed_files(&self) -> Vec<PathBuf> {
        self.files.snapshot()
    }
}
