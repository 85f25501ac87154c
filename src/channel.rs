//! 点击事件的广播通道。
//!
//! 检测任务通过 [`ClickEventPublisher`] 发布完成的点击序列，
//! 日志、网络上报等消费者各自持有一个 [`ClickEventSubscriber`]。
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    pubsub::{PubSubChannel, Publisher, Subscriber},
};

use crate::ClickEvent;

pub type ClickEventChannel<const CAP: usize, const SUBS: usize, const PUBS: usize> =
    PubSubChannel<CriticalSectionRawMutex, ClickEvent, CAP, SUBS, PUBS>;

pub type ClickEventPublisher<'a, const CAP: usize, const SUBS: usize, const PUBS: usize> =
    Publisher<'a, CriticalSectionRawMutex, ClickEvent, CAP, SUBS, PUBS>;

pub type ClickEventSubscriber<'a, const CAP: usize, const SUBS: usize, const PUBS: usize> =
    Subscriber<'a, CriticalSectionRawMutex, ClickEvent, CAP, SUBS, PUBS>;
