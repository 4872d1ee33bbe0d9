//! 一次性初始化 - 显式三态的共享记忆化异步建立
//!
//! 状态机：Idle → Pending(共享 future) → Ready。并发调用方 clone
//! 同一个 `Shared` future，观察到同一次成功或失败；失败把状态
//! 退回 Idle，下一次调用从头重试，不会卡死在失败的缓存结果上。

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::error::{MirrorError, Result};

type InitFuture = Shared<BoxFuture<'static, std::result::Result<(), Arc<MirrorError>>>>;

#[derive(Default)]
enum InitState {
    #[default]
    Idle,
    Pending(InitFuture),
    Ready,
}

/// 进程生命周期内至多成功一次的初始化闸门
#[derive(Default)]
pub struct SharedInit {
    state: Mutex<InitState>,
}

impl SharedInit {
    pub fn new() -> Self {
        Self::default()
    }

    /// 确保初始化完成；未完成时所有调用方等待同一次尝试
    pub async fn ensure<F, Fut>(&self, make: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let fut = {
            let mut state = self.state.lock();
            match &*state {
                InitState::Ready => return Ok(()),
                InitState::Pending(f) => f.clone(),
                InitState::Idle => {
                    let f: InitFuture = make().map(|r| r.map_err(Arc::new)).boxed().shared();
                    *state = InitState::Pending(f.clone());
                    f
                }
            }
        };

        let result = fut.clone().await;

        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                *state = InitState::Ready;
                Ok(())
            }
            Err(e) => {
                // 只清掉自己这次失败的尝试，不打断别人新发起的
                if let InitState::Pending(current) = &*state {
                    if current.ptr_eq(&fut) {
                        *state = InitState::Idle;
                    }
                }
                Err(MirrorError::NotInitialized(e.to_string()))
            }
        }
    }

    #[cfg(test)]
    fn is_ready(&self) -> bool {
        matches!(&*self.state.lock(), InitState::Ready)
    }
}
