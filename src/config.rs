use core::fmt;

use embassy_time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u32 = 20;
pub const DEFAULT_MULTI_CLICK_WINDOW_MS: u32 = 250;
pub const DEFAULT_LONG_PRESS_MS: u32 = 1000;

/// 输入线的极性：哪个原始电平代表“按下”。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    /// 上拉接法，按下时输入线被拉到地。
    Low,
    /// 下拉接法，按下时输入线被拉到电源。
    High,
}

impl ActiveLevel {
    /// 返回“按下”对应的原始逻辑电平（`true` 表示高电平）。
    pub const fn pressed_level(self) -> bool {
        matches!(self, ActiveLevel::High)
    }

    /// 判断一个原始电平是否表示按下。
    pub const fn is_pressed(self, level: bool) -> bool {
        level == self.pressed_level()
    }
}

/// [`ClickDetector`](crate::ClickDetector) 的时间参数与极性。
///
/// 三个时间参数在内部以 `u32` 毫秒保存，构造检测器时统一校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClickConfig {
    /// 消抖持续时间。
    ///
    /// 原始电平必须保持不变至少这么久，才会被接受为新的稳定电平，
    /// 以防止物理按键的机械抖动产生误报。
    pub debounce: Duration,

    /// 多次点击的时间窗口。
    ///
    /// 释放后在此窗口内再次按下，会被计入同一次点击序列；
    /// 窗口在释放状态下耗尽时，序列结束并产生结果。
    pub multi_click_window: Duration,

    /// 长按判定阈值。
    ///
    /// 序列中最后一次按下的持续时间达到该值时，结果被标记为长按。
    pub long_press_time: Duration,

    /// 按下时的有效电平。
    pub active_level: ActiveLevel,
}

impl Default for ClickConfig {
    /// 与参考按钮固件相同的取值：
    ///
    /// - 消抖: 20ms
    /// - 多击窗口: 250ms
    /// - 长按阈值: 1000ms
    /// - 有效电平: 低电平（上拉接法）
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS as u64),
            multi_click_window: Duration::from_millis(DEFAULT_MULTI_CLICK_WINDOW_MS as u64),
            long_press_time: Duration::from_millis(DEFAULT_LONG_PRESS_MS as u64),
            active_level: ActiveLevel::Low,
        }
    }
}

impl ClickConfig {
    /// 检查配置是否可用。
    ///
    /// 任何时间参数都不能为零，并且必须能以 `u32` 毫秒表示。
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.millis().map(|_| ())
    }

    /// 将三个时间参数转换为毫秒：(消抖, 多击窗口, 长按阈值)。
    pub(crate) fn millis(&self) -> Result<(u32, u32, u32), ConfigError> {
        Ok((
            to_millis(ConfigField::Debounce, self.debounce)?,
            to_millis(ConfigField::MultiClickWindow, self.multi_click_window)?,
            to_millis(ConfigField::LongPressTime, self.long_press_time)?,
        ))
    }
}

fn to_millis(field: ConfigField, duration: Duration) -> Result<u32, ConfigError> {
    match u32::try_from(duration.as_millis()) {
        Ok(0) => Err(ConfigError::ZeroDuration(field)),
        Ok(ms) => Ok(ms),
        Err(_) => Err(ConfigError::DurationOverflow(field)),
    }
}

/// 配置中的时间字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    Debounce,
    MultiClickWindow,
    LongPressTime,
}

impl ConfigField {
    pub const fn name(self) -> &'static str {
        match self {
            ConfigField::Debounce => "debounce",
            ConfigField::MultiClickWindow => "multi_click_window",
            ConfigField::LongPressTime => "long_press_time",
        }
    }
}

/// 配置校验错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// 时间参数为零（不足 1ms 的值同样按零处理）。
    ZeroDuration(ConfigField),
    /// 时间参数超出 `u32` 毫秒的表示范围。
    DurationOverflow(ConfigField),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroDuration(field) => {
                write!(f, "{} must be at least 1ms", field.name())
            }
            ConfigError::DurationOverflow(field) => {
                write!(f, "{} does not fit in u32 milliseconds", field.name())
            }
        }
    }
}

impl core::error::Error for ConfigError {}
