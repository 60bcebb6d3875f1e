//! A directory-backed event store: one file per thread plus one shared
//! `process_wide` file, with atomic-enough construction and safe
//! concurrent dispatch from any number of mutator threads.

use crate::core::events::{self, ProcessEvent, ThreadEvent};
use crate::core::types::ThreadId;
use crate::error::{CoreError, CoreResult};
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fixed name of the file holding process-wide (`Start`/`Join`) events.
pub const PROCESS_WIDE_FILE_NAME: &str = "process_wide";

/// Either shape of synchronization event, tagged by where it's routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Thread(ThreadEvent),
    Process(ProcessEvent),
}

/// A lazily-opened, line-buffered writer guarded by its own mutex.
type FileHandle = Arc<Mutex<BufWriter<File>>>;

/// A directory holding the persisted synchronization events of one run.
///
/// The same type serves both roles described in the specification: freshly
/// constructed via [`FilesystemStore::create`] it accepts `dispatch` calls
/// from mutator threads; opened via [`FilesystemStore::open_existing`] over
/// a previously populated directory, its `read_*` methods serve the
/// analyzer. The two roles are not meant to be exercised concurrently on
/// the same instance.
pub struct FilesystemStore {
    root: PathBuf,
    thread_files: RwLock<FxHashMap<ThreadId, FileHandle>>,
    process_wide: Mutex<Option<BufWriter<File>>>,
}

impl FilesystemStore {
    /// Construct a store at `path`. `path` must either not exist (it is
    /// then created as a directory) or already be an empty directory;
    /// anything else is [`CoreError::InvalidRepositoryPath`].
    ///
    /// Provides the strong exception-safety guarantee: on failure, no
    /// directory is left behind that wasn't already there, and no store is
    /// constructed.
    pub fn create<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let root = path.as_ref().to_path_buf();
        match fs::metadata(&root) {
            Ok(meta) => {
                if !meta.is_dir() {
                    return Err(CoreError::InvalidRepositoryPath(format!(
                        "{} exists and is not a directory",
                        root.display()
                    )));
                }
                let mut entries = fs::read_dir(&root)?;
                if entries.next().is_some() {
                    return Err(CoreError::InvalidRepositoryPath(format!(
                        "{} is a non-empty directory",
                        root.display()
                    )));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(&root)?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(FilesystemStore {
            root,
            thread_files: RwLock::new(FxHashMap::default()),
            process_wide: Mutex::new(None),
        })
    }

    /// Open an existing directory read-only for analysis. Does not require
    /// the directory to be empty — quite the opposite, it is expected to
    /// hold a previously recorded run.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let root = path.as_ref().to_path_buf();
        let meta = fs::metadata(&root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::InvalidRepositoryPath(format!("{} does not exist", root.display()))
            } else {
                CoreError::Io(e)
            }
        })?;
        if !meta.is_dir() {
            return Err(CoreError::InvalidRepositoryPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(FilesystemStore {
            root,
            thread_files: RwLock::new(FxHashMap::default()),
            process_wide: Mutex::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Route `event` to the correct file, serializing it as one JSON line.
    /// Safe to call concurrently from any thread; writes to a single file
    /// are serialized, writes to different files proceed independently.
    pub fn dispatch(&self, event: Event) -> CoreResult<()> {
        match event {
            Event::Thread(e) => self.dispatch_thread(e),
            Event::Process(e) => self.dispatch_process(e),
        }
    }

    fn dispatch_thread(&self, event: ThreadEvent) -> CoreResult<()> {
        let handle = self.file_for_thread(event.thread_of())?;
        let line = events::to_line(&event)?;
        let mut writer = handle.lock();
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }

    fn dispatch_process(&self, event: ProcessEvent) -> CoreResult<()> {
        let line = events::to_line(&event)?;
        let mut slot = self.process_wide.lock();
        if slot.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.root.join(PROCESS_WIDE_FILE_NAME))?;
            *slot = Some(BufWriter::new(file));
        }
        let writer = slot.as_mut().expect("just initialized above");
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }

    /// Look up (creating lazily if needed) the write handle for `thread`'s
    /// file. Only the brief map lookup/insert is serialized; the file
    /// itself has its own mutex.
    fn file_for_thread(&self, thread: ThreadId) -> CoreResult<FileHandle> {
        if let Some(handle) = self.thread_files.read().get(&thread) {
            return Ok(Arc::clone(handle));
        }
        let mut files = self.thread_files.write();
        if let Some(handle) = files.get(&thread) {
            return Ok(Arc::clone(handle));
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(thread.0.to_string()))?;
        let handle = Arc::new(Mutex::new(BufWriter::new(file)));
        files.insert(thread, Arc::clone(&handle));
        Ok(handle)
    }

    /// Every file entry in the repository, process-wide file included.
    pub fn files(&self) -> CoreResult<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            out.push(entry?.path());
        }
        Ok(out)
    }

    /// Every per-thread file, paired with the `ThreadId` parsed from its
    /// name. The process-wide file is excluded.
    pub fn thread_files(&self) -> CoreResult<Vec<(ThreadId, PathBuf)>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == PROCESS_WIDE_FILE_NAME {
                continue;
            }
            if let Ok(id) = name.parse::<usize>() {
                out.push((ThreadId(id), entry.path()));
            }
        }
        out.sort_by_key(|(tid, _)| *tid);
        Ok(out)
    }

    /// Path to the process-wide file, if it has been written at least once.
    pub fn start_join_file(&self) -> Option<PathBuf> {
        let path = self.root.join(PROCESS_WIDE_FILE_NAME);
        path.exists().then_some(path)
    }

    /// Read and decode every process-wide event, in file order. Empty if
    /// no process-wide events were ever dispatched.
    pub fn read_process_events(&self) -> CoreResult<Vec<ProcessEvent>> {
        match self.start_join_file() {
            None => Ok(Vec::new()),
            Some(path) => read_lines(&path),
        }
    }

    /// Read and decode every thread-scoped event in `path`, in file order.
    pub fn read_thread_events(&self, path: &Path) -> CoreResult<Vec<ThreadEvent>> {
        read_lines(path)
    }
}

fn read_lines<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> CoreResult<Vec<T>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(events::from_line(line)?))
        .collect()
}
