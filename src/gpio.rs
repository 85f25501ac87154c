use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::{
    channel::ClickEventPublisher, ActiveLevel, ClickConfig, ClickDetector, ClickEvent, ConfigError,
};

/// 默认轮询间隔。
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// 一个由GPIO输入引脚驱动的点击按钮。
///
/// 它负责采样引脚电平并打上 `Instant::now()` 时间戳，再交给内部的
/// [`ClickDetector`]。检测器本身不接触硬件。
pub struct GpioClickButton<P: InputPin> {
    pin: P,
    detector: ClickDetector,
    poll_interval: Duration,
    last_level: bool,
}

impl<P: InputPin> GpioClickButton<P> {
    /// 创建一个新的GPIO点击按钮。
    ///
    /// # 参数
    /// * `pin`: 一个实现了 `InputPin` 的GPIO引脚。上拉/下拉需由调用方事先配置好。
    /// * `config`: 检测配置，其中 `active_level` 决定按下时的有效电平。
    pub fn new(pin: P, config: ClickConfig) -> Result<Self, ConfigError> {
        let detector = ClickDetector::new(config)?;
        let button = Self {
            pin,
            detector,
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_level: !config.active_level.pressed_level(),
        };
        button.check_poll_interval();
        Ok(button)
    }

    /// 设置 [`next_event`](Self::next_event) 使用的轮询间隔。
    ///
    /// 间隔应明显小于消抖时间；这是调用方的前提条件，这里只记录警告。
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.check_poll_interval();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// 执行一次同步采样并推进检测器。
    pub fn poll(&mut self) -> Option<ClickEvent> {
        let level = self.sample();
        self.detector.update_at(level, Instant::now())
    }

    /// 获取内部检测器的不可变引用
    pub fn detector(&self) -> &ClickDetector {
        &self.detector
    }

    /// 获取内部检测器的可变引用
    pub fn detector_mut(&mut self) -> &mut ClickDetector {
        &mut self.detector
    }

    /// 获取底层引脚的可变引用
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// 释放并返回底层引脚
    pub fn release(self) -> P {
        self.pin
    }

    // 读取失败时沿用上一次的电平，相当于“没有变化”。
    fn sample(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(level) => {
                self.last_level = level;
                level
            }
            Err(_) => {
                warn!("pin read failed, reusing previous level");
                self.last_level
            }
        }
    }

    fn check_poll_interval(&self) {
        let debounce = self.detector.config().debounce;
        if self.poll_interval >= debounce {
            warn!(
                "poll interval {}ms is not shorter than debounce {}ms",
                self.poll_interval.as_millis(),
                debounce.as_millis()
            );
        }
    }
}

impl<P> GpioClickButton<P>
where
    P: InputPin + Wait,
{
    /// 等待下一次完整的点击序列。
    ///
    /// 序列进行中按 `poll_interval` 轮询；检测器空闲时改为异步等待引脚
    /// 到达有效电平，不会空转。
    pub async fn next_event(&mut self) -> ClickEvent {
        loop {
            if self.detector.is_idle() {
                self.wait_for_press().await;
            }
            if let Some(event) = self.poll() {
                return event;
            }
            Timer::after(self.poll_interval).await;
        }
    }

    /// 持续检测，并把每个点击事件发布到事件通道。
    pub async fn run<const CAP: usize, const SUBS: usize, const PUBS: usize>(
        mut self,
        publisher: ClickEventPublisher<'_, CAP, SUBS, PUBS>,
    ) -> ! {
        loop {
            let event = self.next_event().await;
            debug!("publishing click event {:?}", event);
            publisher.publish(event).await;
        }
    }

    async fn wait_for_press(&mut self) {
        let active_level = self.detector.config().active_level;
        match active_level {
            ActiveLevel::Low => self.pin.wait_for_low().await.unwrap_or_default(),
            ActiveLevel::High => self.pin.wait_for_high().await.unwrap_or_default(),
        }
    }
}
