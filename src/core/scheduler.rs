//! 自动同步定时器

use super::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use std::sync::{Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// 按分钟换算定时器间隔
pub fn interval_from_minutes(minutes: u32) -> Duration {
    Duration::from_secs(u64::from(minutes.max(1)) * 60)
}

/// 周期性调用 `SyncEngine::start_sync()`
///
/// 只持有引擎的弱引用，引擎释放后定时任务自行退出。
pub struct AutoSyncScheduler {
    engine: Weak<SyncEngine>,
    timer: Mutex<Option<(JoinHandle<()>, Duration)>>,
}

impl AutoSyncScheduler {
    pub fn new(engine: Weak<SyncEngine>) -> Self {
        Self {
            engine,
            timer: Mutex::new(None),
        }
    }

    /// 启动（或以新间隔重新启动）定时器，第一次触发在一个间隔之后
    pub fn start(&self, interval: Duration) -> SyncResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let engine = self.engine.clone();
        let first_tick = Instant::now() + interval;

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(engine) = engine.upgrade() else {
                    debug!("同步引擎已释放，自动同步定时器退出");
                    break;
                };
                match engine.start_sync() {
                    Ok(()) => info!("自动同步已触发"),
                    Err(e) => debug!("跳过本次自动同步: {}", e),
                }
            }
        });

        let previous = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((task, interval));
        if let Some((previous, _)) = previous {
            previous.abort();
        }

        info!("自动同步已启动，间隔 {} 分钟", interval.as_secs() / 60);
        Ok(())
    }

    pub fn stop(&self) {
        let timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some((task, _)) = timer {
            task.abort();
            info!("自动同步已停止");
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(task, _)| !task.is_finished())
    }

    /// 当前定时器间隔，未启动时为 None
    pub fn interval(&self) -> Option<Duration> {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, interval)| *interval)
    }
}

impl Drop for AutoSyncScheduler {
    fn drop(&mut self) {
        if let Some((task, _)) = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_minutes() {
        assert_eq!(interval_from_minutes(30), Duration::from_secs(1800));
        assert_eq!(interval_from_minutes(0), Duration::from_secs(60));
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let scheduler = AutoSyncScheduler::new(Weak::new());
        assert!(matches!(
            scheduler.start(Duration::from_secs(60)),
            Err(SyncError::NoRuntime)
        ));
        assert!(!scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_restart_and_stop() {
        let scheduler = AutoSyncScheduler::new(Weak::new());
        scheduler.start(Duration::from_secs(60)).unwrap();
        assert!(scheduler.is_active());
        assert_eq!(scheduler.interval(), Some(Duration::from_secs(60)));

        scheduler.start(Duration::from_secs(300)).unwrap();
        assert_eq!(scheduler.interval(), Some(Duration::from_secs(300)));

        scheduler.stop();
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.interval(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_exits_when_engine_is_gone() {
        let scheduler = AutoSyncScheduler::new(Weak::new());
        scheduler.start(Duration::from_secs(60)).unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(!scheduler.is_active());
    }
}
