//! Background workers consuming the event bus.

pub mod blocked_notice;

pub use blocked_notice::{BlockedNoticeWorker, NoticeError, WorkerHandle, handle_envelope};
