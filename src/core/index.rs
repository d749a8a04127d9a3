//! 远程目录索引

use crate::storage::{normalize_remote_path, RemoteEntry, RemoteStorage};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// 一次递归列表得到的远程快照：文件路径 -> 修改时间，外加已存在的目录集合
#[derive(Debug, Clone, Default)]
pub struct RemoteIndex {
    files: BTreeMap<String, DateTime<Utc>>,
    dirs: HashSet<String>,
}

impl RemoteIndex {
    /// 列出 `folder` 下的全部内容并建立索引
    pub async fn build(storage: &dyn RemoteStorage, folder: &str) -> Result<Self> {
        let entries = storage.list_dir(folder, true).await?;
        let index = Self::from_entries(entries);
        debug!(
            "远程索引: {} 个文件, {} 个目录 ({})",
            index.files.len(),
            index.dirs.len(),
            storage.name()
        );
        Ok(index)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = RemoteEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            if entry.is_dir {
                index.dirs.insert(normalize_remote_path(&entry.path, true));
                continue;
            }
            // 服务器没有返回修改时间时按最旧处理
            let mtime = entry.last_modified.unwrap_or(DateTime::UNIX_EPOCH);
            index
                .files
                .insert(normalize_remote_path(&entry.path, false), mtime);
        }
        index
    }

    /// 远程文件的修改时间，不存在时为 None
    pub fn modified(&self, path: &str) -> Option<DateTime<Utc>> {
        self.files.get(&normalize_remote_path(path, false)).copied()
    }

    pub fn contains_dir(&self, path: &str) -> bool {
        self.dirs.contains(&normalize_remote_path(path, true))
    }

    /// 记录新建的目录，同一会话里不再重复创建
    pub fn insert_dir(&mut self, path: &str) {
        self.dirs.insert(normalize_remote_path(path, true));
    }

    /// `prefix` 下的所有文件（按路径排序）
    pub fn files_under<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, DateTime<Utc>)> + 'a {
        self.files
            .range(prefix.to_string()..)
            .take_while(move |(path, _)| path.starts_with(prefix))
            .map(|(path, mtime)| (path.as_str(), *mtime))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}
