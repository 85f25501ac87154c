#![no_std]

mod fmt;

pub mod channel;
pub mod config;
pub mod gpio;

pub use config::*;
use embassy_time::Instant;

/// 一次点击序列中最后一次按下的时长分类。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDuration {
    Short,
    Long,
}

/// 一次完整点击序列的结果。
///
/// `count` 是序列中的按下次数（不做上限截断），
/// `duration` 只反映序列中**最后一次**按下是否为长按。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub count: u16,
    pub duration: ClickDuration,
}

impl ClickEvent {
    pub const fn short(count: u16) -> Self {
        Self {
            count,
            duration: ClickDuration::Short,
        }
    }

    pub const fn long(count: u16) -> Self {
        Self {
            count,
            duration: ClickDuration::Long,
        }
    }

    pub const fn is_long(&self) -> bool {
        matches!(self.duration, ClickDuration::Long)
    }

    /// 编码为带符号的点击码：短按为 `+count`，长按为 `-count`。
    pub const fn code(&self) -> i32 {
        match self.duration {
            ClickDuration::Short => self.count as i32,
            ClickDuration::Long => -(self.count as i32),
        }
    }

    /// 从带符号的点击码解码。`0` 表示没有结果。
    pub fn from_code(code: i32) -> Option<Self> {
        let count = u16::try_from(code.unsigned_abs()).ok()?;
        match code {
            0 => None,
            c if c > 0 => Some(Self::short(count)),
            _ => Some(Self::long(count)),
        }
    }

    /// 事件对应的点击类型名称（与 IoT 按钮消息中的 `clickType` 一致）。
    ///
    /// 超过三次点击的序列没有对应名称。
    pub const fn click_type(&self) -> Option<&'static str> {
        match (self.count, self.duration) {
            (1, ClickDuration::Short) => Some("SINGLE"),
            (2, ClickDuration::Short) => Some("DOUBLE"),
            (3, ClickDuration::Short) => Some("TRIPLE"),
            (1, ClickDuration::Long) => Some("LONG"),
            (2, ClickDuration::Long) => Some("DOUBLE LONG"),
            (3, ClickDuration::Long) => Some("TRIPLE LONG"),
            _ => None,
        }
    }
}

/// 检测器当前所处的阶段，由内部状态推导而来。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// 没有进行中的序列，按键稳定在释放状态。
    Idle,
    /// 没有进行中的序列，原始电平已变为按下，正在消抖。
    DebouncingPress,
    /// 序列进行中，按键处于（消抖后的）按下状态。
    Pressed,
    /// 序列进行中，按键已释放，等待多击窗口耗尽或下一次按下。
    WaitingForMultiClick,
}

/// 带消抖的多击/长按检测状态机。
///
/// 检测器不持有任何硬件句柄，也不睡眠：调用方以任意节奏采样输入线，
/// 并将原始电平和单调递增的毫秒时间戳交给 [`ClickDetector::update`]。
/// 轮询间隔应明显小于消抖时间，否则消抖和长按计时的精度会下降。
///
/// 所有时间差都使用 `u32` 回绕减法计算，因此时间戳溢出回绕是安全的。
#[derive(Debug, Clone)]
pub struct ClickDetector {
    config: ClickConfig,
    debounce_ms: u32,
    multi_click_window_ms: u32,
    long_press_ms: u32,

    raw_level: bool,
    stable_level: bool,
    last_change_ms: u32,
    last_now_ms: Option<u32>,

    press_start_ms: u32,
    last_release_ms: u32,
    sequence_open: bool,
    clicks: u16,
    last_long: bool,

    result: Option<ClickEvent>,
}

impl Default for ClickDetector {
    fn default() -> Self {
        let config = ClickConfig::default();
        let released = !config.active_level.pressed_level();
        Self {
            config,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            multi_click_window_ms: DEFAULT_MULTI_CLICK_WINDOW_MS,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            raw_level: released,
            stable_level: released,
            last_change_ms: 0,
            last_now_ms: None,
            press_start_ms: 0,
            last_release_ms: 0,
            sequence_open: false,
            clicks: 0,
            last_long: false,
            result: None,
        }
    }
}

impl ClickDetector {
    /// 使用给定配置创建检测器。配置无效时返回错误。
    pub fn new(config: ClickConfig) -> Result<Self, ConfigError> {
        let mut detector = Self::default();
        detector.set_config(config)?;
        detector.reset();
        Ok(detector)
    }

    pub fn config(&self) -> &ClickConfig {
        &self.config
    }

    /// 替换配置。
    ///
    /// 应在两次点击序列之间调用；在序列进行中修改时间参数，
    /// 该序列的结果不作保证。无效配置会被拒绝，检测器保持不变。
    pub fn set_config(&mut self, config: ClickConfig) -> Result<(), ConfigError> {
        let (debounce_ms, multi_click_window_ms, long_press_ms) = config.millis()?;
        self.config = config;
        self.debounce_ms = debounce_ms;
        self.multi_click_window_ms = multi_click_window_ms;
        self.long_press_ms = long_press_ms;
        Ok(())
    }

    /// 丢弃进行中的序列和消抖状态，保留配置。
    pub fn reset(&mut self) {
        let released = !self.config.active_level.pressed_level();
        self.raw_level = released;
        self.stable_level = released;
        self.last_change_ms = 0;
        self.last_now_ms = None;
        self.press_start_ms = 0;
        self.last_release_ms = 0;
        self.sequence_open = false;
        self.clicks = 0;
        self.last_long = false;
        self.result = None;
    }

    /// 推进状态机。
    ///
    /// `raw` 是输入线的瞬时逻辑电平（`true` 为高电平），
    /// `now_ms` 是单调递增的毫秒时间戳。
    ///
    /// 只有在一次点击序列完成的那一次调用中返回 `Some`，
    /// 之后的调用（即使输入没有变化）都会返回 `None`。
    pub fn update(&mut self, raw: bool, now_ms: u32) -> Option<ClickEvent> {
        self.result = None;
        let now = self.rebase_clock(now_ms);

        if raw != self.raw_level {
            self.raw_level = raw;
            self.last_change_ms = now;
        } else if raw != self.stable_level
            && now.wrapping_sub(self.last_change_ms) >= self.debounce_ms
        {
            self.stable_level = raw;
            if self.config.active_level.is_pressed(raw) {
                self.on_press(now);
            } else {
                self.on_release(now);
            }
        }

        if self.sequence_open
            && !self.is_pressed()
            && now.wrapping_sub(self.last_release_ms) >= self.multi_click_window_ms
        {
            let event = ClickEvent {
                count: self.clicks,
                duration: if self.last_long {
                    ClickDuration::Long
                } else {
                    ClickDuration::Short
                },
            };
            self.sequence_open = false;
            self.clicks = 0;
            self.last_long = false;
            self.result = Some(event);
            debug!("click sequence finished: {}", event.code());
        }

        self.result
    }

    /// 与 [`update`](Self::update) 相同，但返回带符号的点击码（`0` 表示没有结果）。
    pub fn update_code(&mut self, raw: bool, now_ms: u32) -> i32 {
        self.update(raw, now_ms).map_or(0, |event| event.code())
    }

    /// 使用 `embassy_time::Instant` 作为时间戳推进状态机。
    ///
    /// 毫秒数被截断为 `u32`，溢出时自然回绕。
    pub fn update_at(&mut self, raw: bool, now: Instant) -> Option<ClickEvent> {
        self.update(raw, now.as_millis() as u32)
    }

    /// 最近一次 `update` 产生的结果，下一次 `update` 时被清除。
    pub fn result(&self) -> Option<ClickEvent> {
        self.result
    }

    /// 最近一次 `update` 产生的带符号点击码。
    pub fn clicks(&self) -> i32 {
        self.result.map_or(0, |event| event.code())
    }

    /// 进行中序列的带符号点击计数；最近完成的一次按下为长按时取负。
    pub fn pending_clicks(&self) -> i32 {
        if self.last_long {
            -i32::from(self.clicks)
        } else {
            i32::from(self.clicks)
        }
    }

    /// 消抖后的按键是否处于按下状态。
    pub fn is_pressed(&self) -> bool {
        self.config.active_level.is_pressed(self.stable_level)
    }

    pub fn phase(&self) -> DetectorPhase {
        match (self.sequence_open, self.is_pressed()) {
            (true, true) => DetectorPhase::Pressed,
            (true, false) => DetectorPhase::WaitingForMultiClick,
            (false, _) if self.config.active_level.is_pressed(self.raw_level) => {
                DetectorPhase::DebouncingPress
            }
            (false, _) => DetectorPhase::Idle,
        }
    }

    /// 没有进行中的序列，且原始电平和稳定电平都处于释放状态。
    pub fn is_idle(&self) -> bool {
        self.phase() == DetectorPhase::Idle && self.raw_level == self.stable_level
    }

    fn on_press(&mut self, now: u32) {
        self.press_start_ms = now;
        if !self.sequence_open {
            self.sequence_open = true;
            self.clicks = 0;
            self.last_long = false;
        }
        self.clicks = self.clicks.saturating_add(1);
        trace!("press #{} at {}ms", self.clicks, now);
    }

    fn on_release(&mut self, now: u32) {
        let held = now.wrapping_sub(self.press_start_ms);
        self.last_long = held >= self.long_press_ms;
        self.last_release_ms = now;
        trace!("release after {}ms at {}ms", held, now);
    }

    // 时钟倒退时接受新的时间戳，并把已记录的时间点移到这一刻，
    // 使负的时长按零计算，后续边沿立即恢复正常计时。
    fn rebase_clock(&mut self, now_ms: u32) -> u32 {
        if let Some(last) = self.last_now_ms {
            if (now_ms.wrapping_sub(last) as i32) < 0 {
                warn!("clock went backwards: {}ms -> {}ms", last, now_ms);
                self.last_change_ms = now_ms;
                self.press_start_ms = now_ms;
                self.last_release_ms = now_ms;
            }
        }
        self.last_now_ms = Some(now_ms);
        now_ms
    }
}
