use serde::Serialize;
use thiserror::Error;

/// 一次请求在界面上的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Requested,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiEvent {
    Submit,      // 用户提交链接
    Start,       // 下载开始
    Succeed,     // 下载完成
    Fail,        // 校验或下载失败
    Save,        // 用户保存了结果
    Dismiss,     // 用户关闭了结果
    Acknowledge, // 用户确认了错误
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("非法的状态转换: {from:?} 不接受 {event:?}")]
pub struct InvalidTransition {
    pub from: RequestState,
    pub event: UiEvent,
}

impl RequestState {
    pub fn next(self, event: UiEvent) -> Result<RequestState, InvalidTransition> {
        use RequestState::*;
        use UiEvent::*;

        let next = match (self, event) {
            // 上一个结果没处理就提交新请求，视为关闭旧结果
            (Idle | Completed | Failed, Submit) => Requested,
            (Requested, Start) => InProgress,
            (Requested | InProgress, Fail) => Failed,
            (InProgress, Succeed) => Completed,
            (Completed, Save | Dismiss) => Idle,
            (Failed, Acknowledge | Dismiss) => Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, Self::Requested | Self::InProgress)
    }
}

/// 持有当前状态，非法事件不改变状态
#[derive(Debug, Default)]
pub struct RequestMachine {
    state: RequestState,
}

impl RequestMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn apply(&mut self, event: UiEvent) -> Result<RequestState, InvalidTransition> {
        self.state = self.state.next(event)?;
        Ok(self.state)
    }
}
