//! 集成测试共用的内存存储和笔记存储
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use notesync_lib::config::{ConfigStore, ServerSettings};
use notesync_lib::core::{SyncEngine, SyncEvent};
use notesync_lib::db::{ExclusiveWindow, NoteStore, WindowLease};
use notesync_lib::storage::{
    normalize_remote_path, ConnectionSettings, RemoteEntry, RemoteStorage, StorageConnector,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio::sync::{broadcast, Notify, Semaphore};

/// 记录所有操作的内存 WebDAV 服务器
#[derive(Default)]
pub struct MockStorage {
    files: Mutex<BTreeMap<String, (Bytes, DateTime<Utc>)>>,
    dirs: Mutex<BTreeSet<String>>,
    ops: Mutex<Vec<String>>,
    fail_puts: Mutex<HashSet<String>>,
    fail_list: AtomicBool,
    /// 设置后 put 会在这里等待许可
    put_gate: Mutex<Option<Arc<Semaphore>>>,
    pub put_started: Notify,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        let storage = Self::default();
        storage.dirs.lock().unwrap().insert("/".to_string());
        Arc::new(storage)
    }

    /// 直接放入一个远程文件（同时补齐父目录）
    pub fn insert_file(&self, path: &str, data: &[u8], modified: DateTime<Utc>) {
        let path = normalize_remote_path(path, false);
        self.add_parents(&path);
        self.files
            .lock()
            .unwrap()
            .insert(path, (Bytes::copy_from_slice(data), modified));
    }

    fn add_parents(&self, path: &str) {
        let mut dirs = self.dirs.lock().unwrap();
        let mut current = String::from("/");
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        for part in &parts[..parts.len().saturating_sub(1)] {
            current.push_str(part);
            current.push('/');
            dirs.insert(current.clone());
        }
    }

    pub fn file(&self, path: &str) -> Option<Bytes> {
        self.files.lock().unwrap().get(path).map(|(data, _)| data.clone())
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    /// 只保留 put/get 操作
    pub fn transfers(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter(|op| op.starts_with("put ") || op.starts_with("get "))
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        let prefix = format!("{} ", kind);
        self.ops().iter().filter(|op| op.starts_with(&prefix)).count()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    pub fn fail_put(&self, path: &str) {
        self.fail_puts.lock().unwrap().insert(path.to_string());
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// 让之后的 put 阻塞，直到向返回的信号量添加许可
    pub fn gate_puts(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.put_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl RemoteStorage for MockStorage {
    async fn list_dir(&self, path: &str, recursive: bool) -> Result<Vec<RemoteEntry>> {
        let dir = normalize_remote_path(path, true);
        self.record(format!("list {}", dir));
        if self.fail_list.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }

        let depth = |p: &str| p.trim_end_matches('/').matches('/').count();
        let base_depth = depth(&dir);
        let visible = |p: &str| {
            p.starts_with(&dir) && (recursive || depth(p) <= base_depth + 1)
        };

        let mut entries = Vec::new();
        for d in self.dirs.lock().unwrap().iter().filter(|d| visible(d)) {
            entries.push(RemoteEntry::dir(d));
        }
        for (p, (_, modified)) in self.files.lock().unwrap().iter() {
            if visible(p) {
                entries.push(RemoteEntry::file(p, *modified));
            }
        }
        Ok(entries)
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        self.record(format!("get {}", path));
        self.file(path)
            .ok_or_else(|| anyhow::anyhow!("404 Not Found: {}", path))
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        self.record(format!("put {}", path));
        self.put_started.notify_one();

        let gate = self.put_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }

        if self.fail_puts.lock().unwrap().contains(path) {
            anyhow::bail!("507 Insufficient Storage");
        }
        let parent = match path.rfind('/') {
            Some(i) => &path[..=i],
            None => "/",
        };
        if !self.has_dir(parent) {
            anyhow::bail!("409 Conflict: {} 不存在", parent);
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (data, Utc::now()));
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let dir = normalize_remote_path(path, true);
        self.record(format!("mkdir {}", dir));
        self.dirs.lock().unwrap().insert(dir);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 总是返回同一个 MockStorage
pub struct MockConnector {
    pub storage: Arc<MockStorage>,
    pub connects: AtomicUsize,
}

impl StorageConnector for MockConnector {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn RemoteStorage>> {
        assert!(!settings.host.is_empty());
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.storage.clone())
    }
}

/// 基于临时目录的笔记存储，只记录打开/关闭
pub struct MemoryNoteStore {
    db_path: PathBuf,
    images_dir: PathBuf,
    open: AtomicBool,
    window: ExclusiveWindow,
    pub fail_reopen: AtomicBool,
    pub open_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl MemoryNoteStore {
    pub fn new(data_dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            db_path: data_dir.join("notes.db"),
            images_dir: data_dir.join("images"),
            open: AtomicBool::new(true),
            window: ExclusiveWindow::default(),
            fail_reopen: AtomicBool::new(false),
            open_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn open_with(&self, _lease: &WindowLease) -> Result<()> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reopen.load(Ordering::SeqCst) {
            anyhow::bail!("database is locked");
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    fn window(&self) -> &ExclusiveWindow {
        &self.window
    }

    fn database_path(&self) -> &Path {
        &self.db_path
    }

    fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}

/// 一个引擎加上它的本地目录、远程服务器和笔记存储
pub struct Fixture {
    pub dir: TempDir,
    pub remote: Arc<MockStorage>,
    pub connector: Arc<MockConnector>,
    pub notes: Arc<MemoryNoteStore>,
    pub engine: Arc<SyncEngine>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config_store(ConfigStore::in_data_dir)
    }

    /// 配置文件放在数据目录下的其他位置
    pub fn with_config_store(store: impl FnOnce(&Path) -> ConfigStore) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let remote = MockStorage::new();
        let connector = Arc::new(MockConnector {
            storage: remote.clone(),
            connects: AtomicUsize::new(0),
        });
        let notes = MemoryNoteStore::new(dir.path());
        let engine = SyncEngine::new(
            store(dir.path()),
            notes.clone(),
            connector.clone(),
        )
        .unwrap();

        Self {
            dir,
            remote,
            connector,
            notes,
            engine,
        }
    }

    /// 已配置好的引擎，远程文件夹为 `/notes/`
    pub fn configured() -> Self {
        Self::new().with_server()
    }

    pub fn with_server(self) -> Self {
        self.engine
            .configure(ServerSettings::new(
                "https://dav.example.com",
                "alice",
                "x",
                "notes",
            ))
            .unwrap();
        self
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// 写本地文件并设置修改时间
    pub fn write_local(&self, relative: &str, data: &[u8], modified: DateTime<Utc>) -> PathBuf {
        let path = self.dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, data).unwrap();
        set_mtime(&path, modified);
        path
    }
}

pub fn set_mtime(path: &Path, modified: DateTime<Utc>) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::from(modified)).unwrap();
}

/// 秒级时间戳
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// 取出通道里已有的全部事件
pub fn drain_events(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// 等待下一次 Finished 事件，返回期间收到的全部事件
pub async fn wait_finished(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(3600), rx.recv())
            .await
            .expect("等待同步结束超时")
            .expect("事件通道已关闭");
        let done = matches!(event, SyncEvent::Finished { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}
