//! 同步协调器

use super::index::RemoteIndex;
use super::queue::{TaskKind, TransferDirection, TransferTask};
use super::resolver::{estimate_time_offset, SyncAction, TimestampPolicy};
use super::scheduler::{interval_from_minutes, AutoSyncScheduler};
use super::session::{SyncEvent, SyncReport, SyncSession, SyncStatus};
use crate::config::{
    sanitize_interval, ConfigStore, ServerSettings, SyncConfig, SyncDirection,
};
use crate::db::{NoteStore, DATABASE_FILE, IMAGES_DIR};
use crate::error::{SyncError, SyncResult};
use crate::storage::local::temp_path_for;
use crate::storage::{ConnectionSettings, RemoteStorage, StorageConnector};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, warn, Instrument};
use walkdir::WalkDir;

/// 事件通道容量
const EVENT_CAPACITY: usize = 256;

/// 引擎内部状态（同一把锁保护）
struct EngineState {
    config: SyncConfig,
    status: SyncStatus,
    progress: u8,
    last_error: Option<String>,
    /// 正在运行的会话，空闲时为 None
    session: Option<SyncSession>,
}

/// 本地图片目录扫描结果
#[derive(Debug, Default)]
struct LocalImages {
    /// `images/` 下的笔记子目录名
    note_dirs: Vec<String>,
    /// (相对 images/ 的路径, 完整路径, 修改时间)
    files: Vec<(String, PathBuf, DateTime<Utc>)>,
}

/// 同步引擎
pub struct SyncEngine {
    config_store: ConfigStore,
    note_store: Arc<dyn NoteStore>,
    connector: Arc<dyn StorageConnector>,
    state: Mutex<EngineState>,
    events: broadcast::Sender<SyncEvent>,
    scheduler: AutoSyncScheduler,
}

impl SyncEngine {
    /// 创建引擎并加载配置；配置中开启了自动同步时同时启动定时器
    pub fn new(
        config_store: ConfigStore,
        note_store: Arc<dyn NoteStore>,
        connector: Arc<dyn StorageConnector>,
    ) -> SyncResult<Arc<Self>> {
        let config = config_store.load()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let engine = Arc::new_cyclic(|weak| Self {
            config_store,
            note_store,
            connector,
            state: Mutex::new(EngineState {
                status: initial_status(&config),
                config,
                progress: 0,
                last_error: None,
                session: None,
            }),
            events,
            scheduler: AutoSyncScheduler::new(weak.clone()),
        });

        engine.apply_auto_sync()?;
        Ok(engine)
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SyncEvent) {
        // 没有订阅者时发送失败，忽略
        let _ = self.events.send(event);
    }

    fn set_progress(&self, percent: u8, message: impl Into<String>) {
        let message = message.into();
        self.state().progress = percent;
        debug!("同步进度 {}%: {}", percent, message);
        self.emit(SyncEvent::Progress { percent, message });
    }

    /// 订阅同步事件
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    // ========== 配置 ==========

    /// 设置服务器连接参数并保存
    ///
    /// 参数不完整时返回 `Configuration` 错误，原有配置和状态保持不变。
    pub fn configure(&self, settings: ServerSettings) -> SyncResult<()> {
        let config = {
            let mut state = self.state();
            if state.status == SyncStatus::Syncing {
                return Err(SyncError::Concurrency);
            }
            let mut candidate = state.config.clone();
            candidate.apply_server(settings);
            candidate.validate()?;

            state.config = candidate;
            state.status = SyncStatus::Idle;
            state.config.clone()
        };

        self.config_store.save(&config)?;
        info!(
            "WebDAV 配置已更新: {} {}",
            config.server_url, config.remote_folder
        );
        self.emit(SyncEvent::StatusChanged(SyncStatus::Idle));
        Ok(())
    }

    /// 同时设置自动同步、间隔和方向
    pub fn set_sync_options(
        &self,
        auto_sync: bool,
        interval_minutes: i64,
        direction: SyncDirection,
    ) -> SyncResult<()> {
        self.update_config(|config| {
            config.auto_sync = auto_sync;
            config.sync_interval_minutes = sanitize_interval(interval_minutes);
            config.sync_direction = direction;
        })?;
        self.apply_auto_sync()
    }

    pub fn set_sync_direction(&self, direction: SyncDirection) -> SyncResult<()> {
        self.update_config(|config| config.sync_direction = direction)
    }

    pub fn enable_auto_sync(&self, enabled: bool) -> SyncResult<()> {
        self.update_config(|config| config.auto_sync = enabled)?;
        self.apply_auto_sync()
    }

    /// 修改间隔（小于 1 分钟时使用默认值），定时器运行中会立即按新间隔重启
    pub fn set_sync_interval(&self, minutes: i64) -> SyncResult<()> {
        self.update_config(|config| config.sync_interval_minutes = sanitize_interval(minutes))?;
        self.apply_auto_sync()
    }

    fn update_config(&self, update: impl FnOnce(&mut SyncConfig)) -> SyncResult<()> {
        let config = {
            let mut state = self.state();
            update(&mut state.config);
            state.config.clone()
        };
        self.config_store.save(&config)
    }

    /// 按当前配置启动或停止定时器
    fn apply_auto_sync(&self) -> SyncResult<()> {
        let (auto_sync, minutes) = {
            let state = self.state();
            (state.config.auto_sync, state.config.sync_interval_minutes)
        };

        if !auto_sync {
            self.scheduler.stop();
            return Ok(());
        }

        let interval = interval_from_minutes(minutes);
        if self.scheduler.is_active() && self.scheduler.interval() == Some(interval) {
            return Ok(());
        }
        self.scheduler.start(interval)
    }

    /// 从配置文件重新加载
    pub fn load_config(&self) -> SyncResult<()> {
        let config = self.config_store.load()?;
        let status = {
            let mut state = self.state();
            state.config = config;
            if state.status != SyncStatus::Syncing {
                state.status = initial_status(&state.config);
            }
            state.status
        };
        self.emit(SyncEvent::StatusChanged(status));
        self.apply_auto_sync()
    }

    pub fn save_config(&self) -> SyncResult<()> {
        let config = self.config();
        self.config_store.save(&config)
    }

    /// 备份配置文件，没有配置文件时返回 false
    pub fn backup_config(&self, backup_dir: &Path) -> SyncResult<bool> {
        self.config_store.backup(backup_dir)
    }

    /// 还原配置文件并重新加载，备份不存在时返回 false
    pub fn restore_config(&self, backup_dir: &Path) -> SyncResult<bool> {
        if self.status() == SyncStatus::Syncing {
            return Err(SyncError::Concurrency);
        }
        if !self.config_store.restore(backup_dir)? {
            return Ok(false);
        }
        self.load_config()?;
        Ok(true)
    }

    /// 停止定时器并保存配置（退出前调用）
    pub fn shutdown(&self) -> SyncResult<()> {
        self.scheduler.stop();
        self.save_config()
    }

    // ========== 查询 ==========

    pub fn config(&self) -> SyncConfig {
        self.state().config.clone()
    }

    pub fn is_configured(&self) -> bool {
        self.state().config.is_configured()
    }

    pub fn status(&self) -> SyncStatus {
        self.state().status
    }

    pub fn progress(&self) -> u8 {
        self.state().progress
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.state().config.last_sync_time
    }

    pub fn pending_uploads(&self) -> Vec<String> {
        self.state()
            .session
            .as_ref()
            .map(|s| s.queue.pending_uploads())
            .unwrap_or_default()
    }

    pub fn pending_downloads(&self) -> Vec<String> {
        self.state()
            .session
            .as_ref()
            .map(|s| s.queue.pending_downloads())
            .unwrap_or_default()
    }

    pub fn is_auto_sync_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// 列出远程文件夹（不递归），返回条目数量；不影响同步状态
    pub async fn test_connection(&self) -> SyncResult<usize> {
        let config = self.config();
        config.validate()?;

        let storage = self.connect(&config)?;
        let entries = storage
            .list_dir(&config.remote_folder, false)
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;

        info!(
            "连接测试成功: {} ({} 个条目)",
            storage.name(),
            entries.len()
        );
        Ok(entries.len())
    }

    fn connect(&self, config: &SyncConfig) -> SyncResult<Arc<dyn RemoteStorage>> {
        let settings = ConnectionSettings::from_config(config)
            .map_err(|e| SyncError::Connection(e.to_string()))?;
        self.connector
            .connect(&settings)
            .map_err(|e| SyncError::Connection(e.to_string()))
    }

    // ========== 同步 ==========

    /// 在后台任务中开始同步，立即返回是否接受
    pub fn start_sync(self: &Arc<Self>) -> SyncResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        self.begin_session()?;

        let engine = Arc::clone(self);
        runtime.spawn(async move {
            if let Err(e) = engine.run_session().await {
                debug!("后台同步结束: {}", e);
            }
        });
        Ok(())
    }

    /// 在当前任务中完成一次同步并返回报告
    pub async fn sync_now(&self) -> SyncResult<SyncReport> {
        self.begin_session()?;
        self.run_session().await
    }

    /// 检查并占用会话槽；被拒绝时不修改任何状态
    fn begin_session(&self) -> SyncResult<()> {
        {
            let mut state = self.state();
            state.config.validate()?;
            if state.status == SyncStatus::Syncing {
                return Err(SyncError::Concurrency);
            }

            state.status = SyncStatus::Syncing;
            state.progress = 0;
            state.last_error = None;
            state.session = Some(SyncSession::new());
        }
        self.emit(SyncEvent::StatusChanged(SyncStatus::Syncing));
        Ok(())
    }

    /// 对当前会话做一次短暂的加锁修改
    fn with_session<R>(&self, f: impl FnOnce(&mut SyncSession) -> R) -> Option<R> {
        self.state().session.as_mut().map(f)
    }

    async fn run_session(&self) -> SyncResult<SyncReport> {
        // 会话 future 被中途丢弃时把状态从同步中改为错误，保证之后可以重新开始
        let _guard = scopeguard::guard((), |_| self.abort_if_running());

        let (config, session_id) = {
            let state = self.state();
            let id = state.session.as_ref().map(|s| s.id).unwrap_or_default();
            (state.config.clone(), id)
        };

        let span = info_span!("sync_session", id = %session_id);
        async {
            info!("开始同步: {}", config.server_url);
            self.set_progress(0, "开始同步");

            let storage = match self.connect(&config) {
                Ok(storage) => storage,
                Err(e) => return Err(self.fail_session(e)),
            };

            let index = match RemoteIndex::build(storage.as_ref(), &config.remote_folder).await {
                Ok(index) => index,
                Err(e) => return Err(self.fail_session(SyncError::Connection(e.to_string()))),
            };
            if index.is_empty() {
                info!("远程文件夹为空: {}", config.remote_folder);
            } else {
                debug!("远程共 {} 个文件", index.file_count());
            }
            self.set_progress(20, "获取远程文件列表完成");

            let offset = estimate_time_offset(&index);
            self.with_session(|s| {
                s.remote = index;
                s.time_offset = offset;
            });
            let policy = TimestampPolicy::new(config.sync_direction, offset);

            self.set_progress(30, "正在同步数据库");
            self.plan_database(&config, &policy).await;

            self.set_progress(50, "正在同步图片");
            self.plan_images(storage.as_ref(), &config, &policy).await;

            let planned = self
                .with_session(|s| {
                    s.planned = s.queue.len();
                    s.planned
                })
                .unwrap_or_default();

            if planned == 0 {
                info!("没有需要传输的文件");
            } else {
                info!("共 {} 个文件需要传输", planned);
                self.drain_queue(storage.as_ref(), &config).await;
                self.set_progress(90, "文件传输完成");
            }

            Ok(self.finish_session().await)
        }
        .instrument(span)
        .await
    }

    /// 数据库文件使用固定的远程路径，先于图片入队
    async fn plan_database(&self, config: &SyncConfig, policy: &TimestampPolicy) {
        let local_path = self.note_store.database_path().to_path_buf();
        let remote_path = config.remote_path(DATABASE_FILE);
        let local = file_mtime(&local_path).await;

        self.with_session(|s| {
            let remote = s.remote.modified(&remote_path);
            let action = policy.decide(local, remote);
            debug!("数据库: 本地 {:?} 远程 {:?} -> {:?}", local, remote, action);
            queue_action(s, action, remote_path, local_path, TaskKind::Database);
        });
    }

    async fn plan_images(
        &self,
        storage: &dyn RemoteStorage,
        config: &SyncConfig,
        policy: &TimestampPolicy,
    ) {
        let images_dir = self.note_store.images_dir().to_path_buf();
        let remote_images = config.remote_path(&format!("{}/", IMAGES_DIR));

        let local = {
            let dir = images_dir.clone();
            tokio::task::spawn_blocking(move || scan_images(&dir))
                .await
                .unwrap_or_else(|e| {
                    warn!("扫描本地图片失败: {}", e);
                    LocalImages::default()
                })
        };

        // 上传前确保远程目录存在（已列出的目录不再创建）
        if policy.direction.allows_upload() {
            let mut dirs = Vec::new();
            if config.remote_folder != "/" {
                dirs.push(config.remote_folder.clone());
            }
            dirs.push(remote_images.clone());
            dirs.extend(
                local
                    .note_dirs
                    .iter()
                    .map(|id| format!("{}{}/", remote_images, id)),
            );
            for dir in dirs {
                self.ensure_remote_dir(storage, &dir).await;
            }
        }

        self.with_session(|s| {
            let mut seen = std::collections::HashSet::new();
            for (relative, path, mtime) in local.files {
                let remote_path = format!("{}{}", remote_images, relative);
                let remote = s.remote.modified(&remote_path);
                let action = policy.decide(Some(mtime), remote);
                debug!("图片 {}: {:?}", relative, action);
                seen.insert(remote_path.clone());
                queue_action(s, action, remote_path, path, TaskKind::Image);
            }

            // 只存在于远程的图片
            let remote_only: Vec<(String, DateTime<Utc>)> = s
                .remote
                .files_under(&remote_images)
                .filter(|(path, _)| !seen.contains(*path))
                .map(|(path, mtime)| (path.to_string(), mtime))
                .collect();
            for (remote_path, mtime) in remote_only {
                let Some(local_path) = local_image_path(&images_dir, &remote_images, &remote_path)
                else {
                    warn!("忽略无法映射到本地的远程路径: {}", remote_path);
                    continue;
                };
                let action = policy.decide(None, Some(mtime));
                queue_action(s, action, remote_path, local_path, TaskKind::Image);
            }
        });
    }

    async fn ensure_remote_dir(&self, storage: &dyn RemoteStorage, dir: &str) {
        let listed = self
            .with_session(|s| s.remote.contains_dir(dir))
            .unwrap_or(false);
        if listed {
            return;
        }

        match storage.mkdir(dir).await {
            Ok(()) => {
                debug!("已创建远程目录: {}", dir);
                self.with_session(|s| s.remote.insert_dir(dir));
            }
            // 目录可能已存在，后续上传失败时会单独记录
            Err(e) => warn!("创建远程目录失败 {}: {}", dir, e),
        }
    }

    /// 逐个执行传输，单个文件失败不影响后续文件
    async fn drain_queue(&self, storage: &dyn RemoteStorage, config: &SyncConfig) {
        let mut done = 0usize;

        loop {
            let Some((task, percent)) = self
                .with_session(|s| s.queue.next().map(|t| (t, s.transfer_progress(done))))
                .flatten()
            else {
                break;
            };

            let display = task
                .remote_path
                .strip_prefix(&config.remote_folder)
                .unwrap_or(&task.remote_path)
                .to_string();
            let message = match task.direction {
                TransferDirection::Upload => format!("上传文件: {}", display),
                TransferDirection::Download => format!("下载文件: {}", display),
            };
            self.set_progress(percent, message);

            if task.direction == TransferDirection::Upload
                && task.local_path == self.config_store.path()
            {
                debug!("跳过配置文件: {:?}", task.local_path);
                done += 1;
                continue;
            }

            let result = match task.kind {
                TaskKind::Database => self.transfer_database(storage, &task).await,
                TaskKind::Image => transfer_file(storage, &task).await,
            };

            match result {
                Ok(()) => {
                    debug!("{} 完成: {}", task.direction, task.remote_path);
                    self.with_session(|s| match task.direction {
                        TransferDirection::Upload => s.uploaded += 1,
                        TransferDirection::Download => s.downloaded += 1,
                    });
                }
                Err(e) => self.record_transfer_error(e),
            }
            done += 1;
        }
    }

    /// 数据库传输：关闭 → 传输 → 重新打开，期间独占笔记存储
    async fn transfer_database(
        &self,
        storage: &dyn RemoteStorage,
        task: &TransferTask,
    ) -> SyncResult<()> {
        // 下载先取回数据，再关闭数据库
        let downloaded = match task.direction {
            TransferDirection::Download => Some(
                storage
                    .get(&task.remote_path)
                    .await
                    .map_err(|e| SyncError::transfer(&task.remote_path, e))?,
            ),
            TransferDirection::Upload => None,
        };

        let lease = self.note_store.window().enter().await;
        let was_open = self.note_store.is_open();
        if was_open {
            self.note_store.close().await;
        }

        let result = match downloaded {
            Some(data) => write_atomic(&task.local_path, &data)
                .await
                .map_err(|e| SyncError::transfer(&task.remote_path, e)),
            None => upload_file(storage, task).await,
        };

        if was_open {
            if let Err(e) = self.note_store.open_with(&lease).await {
                // 传输本身的结果照常返回，重新打开失败单独记录
                self.record_session_error(SyncError::DatabaseLock(e.to_string()), false);
            }
        }

        result
    }

    fn record_transfer_error(&self, err: SyncError) {
        self.record_session_error(err, true);
    }

    fn record_session_error(&self, err: SyncError, counts_as_failed: bool) {
        let message = err.to_string();
        if err.is_recoverable() {
            warn!("{}", message);
        } else {
            error!("{}", message);
        }
        {
            let mut state = self.state();
            state.last_error = Some(message.clone());
            if let Some(session) = state.session.as_mut() {
                if counts_as_failed {
                    session.record_error(message.clone());
                } else {
                    session.errors.push(message.clone());
                }
            }
        }
        self.emit(SyncEvent::Error(message));
    }

    async fn finish_session(&self) -> SyncReport {
        let (config, report) = {
            let mut state = self.state();
            state.status = SyncStatus::Idle;
            state.progress = 100;
            state.config.last_sync_time = Some(Utc::now());
            let report = state
                .session
                .take()
                .map(|s| s.report(true))
                .unwrap_or_else(|| SyncSession::new().report(true));
            (state.config.clone(), report)
        };

        if let Err(e) = self.config_store.save(&config) {
            warn!("保存同步时间失败: {}", e);
        }

        info!(
            "同步完成: 上传 {} 个, 下载 {} 个, 失败 {} 个",
            report.files_uploaded, report.files_downloaded, report.files_failed
        );
        self.emit(SyncEvent::StatusChanged(SyncStatus::Idle));
        self.emit(SyncEvent::Progress {
            percent: 100,
            message: "同步完成".to_string(),
        });
        self.emit(SyncEvent::Finished { success: true });
        report
    }

    /// 整个会话失败：状态改为错误，依次发出 Error 和 Finished(false)
    fn fail_session(&self, err: SyncError) -> SyncError {
        let message = err.to_string();
        error!("同步失败: {}", message);
        {
            let mut state = self.state();
            state.status = SyncStatus::Error;
            state.last_error = Some(message.clone());
            state.session = None;
        }
        self.emit(SyncEvent::StatusChanged(SyncStatus::Error));
        self.emit(SyncEvent::Error(message));
        self.emit(SyncEvent::Finished { success: false });
        err
    }

    fn abort_if_running(&self) {
        {
            let mut state = self.state();
            if state.status != SyncStatus::Syncing {
                return;
            }
            state.status = SyncStatus::Error;
            state.last_error = Some("同步被中断".to_string());
            state.session = None;
        }
        warn!("同步会话被中断");
        self.emit(SyncEvent::StatusChanged(SyncStatus::Error));
        self.emit(SyncEvent::Finished { success: false });
    }
}

fn initial_status(config: &SyncConfig) -> SyncStatus {
    if config.is_configured() {
        SyncStatus::Idle
    } else {
        SyncStatus::NotConfigured
    }
}

fn queue_action(
    session: &mut SyncSession,
    action: SyncAction,
    remote_path: String,
    local_path: PathBuf,
    kind: TaskKind,
) {
    let task = match action {
        SyncAction::Upload => TransferTask::upload(remote_path, local_path, kind),
        SyncAction::Download => TransferTask::download(remote_path, local_path, kind),
        SyncAction::Skip => return,
    };
    if !session.queue.push(task) {
        debug!("路径已在队列中，忽略重复任务");
    }
}

async fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    if !meta.is_file() {
        return None;
    }
    meta.modified().ok().map(DateTime::<Utc>::from)
}

/// 扫描 `images/{note_id}/{file}`
fn scan_images(images_dir: &Path) -> LocalImages {
    let mut local = LocalImages::default();
    if !images_dir.is_dir() {
        return local;
    }

    for entry in WalkDir::new(images_dir)
        .min_depth(1)
        .max_depth(2)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if entry.depth() == 1 {
            if entry.file_type().is_dir() {
                local.note_dirs.push(name.to_string());
            }
            continue;
        }
        if !entry.file_type().is_file() || name.ends_with(".tmp") {
            continue;
        }

        let Some(note_id) = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        else {
            continue;
        };
        let Some(mtime) = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from)
        else {
            continue;
        };

        local.files.push((
            format!("{}/{}", note_id, name),
            entry.path().to_path_buf(),
            mtime,
        ));
    }

    local
}

/// `{remote_images}3/c.png` -> `{images_dir}/3/c.png`，拒绝 `..` 等越界路径
fn local_image_path(images_dir: &Path, remote_images: &str, remote_path: &str) -> Option<PathBuf> {
    let relative = remote_path.strip_prefix(remote_images)?;
    let mut path = images_dir.to_path_buf();
    for part in relative.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return None;
        }
        path.push(part);
    }
    Some(path)
}

async fn transfer_file(storage: &dyn RemoteStorage, task: &TransferTask) -> SyncResult<()> {
    match task.direction {
        TransferDirection::Upload => upload_file(storage, task).await,
        TransferDirection::Download => {
            let data = storage
                .get(&task.remote_path)
                .await
                .map_err(|e| SyncError::transfer(&task.remote_path, e))?;
            write_atomic(&task.local_path, &data)
                .await
                .map_err(|e| SyncError::transfer(&task.remote_path, e))
        }
    }
}

async fn upload_file(storage: &dyn RemoteStorage, task: &TransferTask) -> SyncResult<()> {
    let data = tokio::fs::read(&task.local_path)
        .await
        .map_err(|e| SyncError::transfer(&task.remote_path, e))?;
    storage
        .put(&task.remote_path, Bytes::from(data))
        .await
        .map_err(|e| SyncError::transfer(&task.remote_path, e))
}

/// 写临时文件再重命名，必要时创建父目录
async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temp_path = temp_path_for(path);
    tokio::fs::write(&temp_path, data).await?;
    tokio::fs::rename(&temp_path, path).await
}
