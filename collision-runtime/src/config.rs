//! # Config 模块
//!
//! 每个 logo 实例的配置。页面加载时一次性读入，初始化后不可变。
//!
//! ## 数值宽松解析
//!
//! 设置存储里的数值经常以字符串形式出现（`"0.8"`、`""`），
//! 所有数值字段都接受：JSON 数字、数字字符串、空字符串或 null。
//! 空字符串与 null 视为"未定义"，在效果参数解析时落到下一级默认值。

use serde::{Deserialize, Deserializer, Serialize};

use crate::effects::EffectKind;
use crate::error::ConfigError;
use crate::viewport::Responsive;

/// 默认的暂停事件名
pub const DEFAULT_PAUSE_EVENT: &str = "logo-collision:pause";
/// 默认的恢复事件名
pub const DEFAULT_RESUME_EVENT: &str = "logo-collision:resume";

/// 效果参数集
///
/// 同一结构既用于实例级存储值，也用于区域映射的覆盖值。
/// 所有字段都是可选的，参数按字段独立解析（见 [`crate::effects::normalize`]）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSettings {
    /// 动画时长（秒）
    #[serde(default, deserialize_with = "lenient::number")]
    pub duration: Option<f32>,
    /// 缓动名称（如 `power2.out`）
    #[serde(default)]
    pub ease: Option<String>,
    /// 起始阈值偏移（px）
    #[serde(default, deserialize_with = "lenient::number")]
    pub offset_start: Option<f32>,
    /// 结束阈值偏移（px）
    #[serde(default, deserialize_with = "lenient::number")]
    pub offset_end: Option<f32>,

    /// 缩放百分比
    #[serde(default, deserialize_with = "lenient::number")]
    pub scale: Option<f32>,
    /// 模糊半径（px）
    #[serde(default, deserialize_with = "lenient::number")]
    pub blur: Option<f32>,
    /// 模糊时的不透明度百分比
    #[serde(default, deserialize_with = "lenient::number")]
    pub blur_opacity: Option<f32>,
    /// 拆字位移（px）
    #[serde(default, deserialize_with = "lenient::number")]
    pub split_distance: Option<f32>,
    /// 拆字错峰间隔（ms）
    #[serde(default, deserialize_with = "lenient::number")]
    pub split_stagger: Option<f32>,
    /// 乱序轮数
    #[serde(default, deserialize_with = "lenient::number")]
    pub shuffle_iterations: Option<f32>,
    /// 乱序错峰间隔（ms）
    #[serde(default, deserialize_with = "lenient::number")]
    pub shuffle_stagger: Option<f32>,
    /// 旋转角度
    #[serde(default, deserialize_with = "lenient::number")]
    pub rotation: Option<f32>,
    /// 滑出距离（logo 高度的百分比）
    #[serde(default, deserialize_with = "lenient::number")]
    pub slide_distance: Option<f32>,
    /// 移开距离：`"120px"`、`"50%"` 或 `"auto"`
    #[serde(default)]
    pub move_distance: Option<String>,
    /// 移开方向：`"left"` / `"right"`
    #[serde(default)]
    pub move_direction: Option<String>,
}

/// 区域映射
///
/// 列表顺序即优先级：直接匹配先于祖先匹配，同一轮内靠前者胜出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMapping {
    /// 区域选择器
    pub selector: String,
    /// 效果编号
    pub effect: u32,
    /// 是否启用参数覆盖
    #[serde(default)]
    pub override_enabled: bool,
    /// 覆盖参数
    #[serde(default)]
    pub settings: Option<EffectSettings>,
}

impl RegionMapping {
    pub fn new(selector: impl Into<String>, effect: u32) -> Self {
        Self {
            selector: selector.into(),
            effect,
            override_enabled: false,
            settings: None,
        }
    }

    /// 附加覆盖参数（同时启用覆盖）
    pub fn with_override(mut self, settings: EffectSettings) -> Self {
        self.override_enabled = true;
        self.settings = Some(settings);
        self
    }
}

/// 实例配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// 实例标识（为空时由 Bootstrap 分配 `logo-<n>`）
    #[serde(default)]
    pub id: String,

    /// logo 元素选择器
    #[serde(default)]
    pub logo_selector: String,

    /// 未被映射命中的区域使用的效果编号
    #[serde(default = "default_effect")]
    pub default_effect: u32,

    /// 区域包含选择器（为空时自动探测）
    #[serde(default, deserialize_with = "lenient::selector_list")]
    pub include_selectors: Vec<String>,

    /// 区域排除选择器
    #[serde(default, deserialize_with = "lenient::selector_list")]
    pub exclude_selectors: Vec<String>,

    /// 全局像素偏移（同时作用于起止阈值）
    #[serde(default)]
    pub global_offset: Responsive<f32>,

    /// 实例级效果参数
    #[serde(default)]
    pub settings: EffectSettings,

    /// 区域映射（有序）
    #[serde(default)]
    pub mappings: Vec<RegionMapping>,

    /// 暂停/恢复事件的派发目标（默认为 logo 本身）
    #[serde(default)]
    pub event_target_selector: Option<String>,

    /// 暂停事件名
    #[serde(default = "default_pause_event")]
    pub pause_event: String,

    /// 恢复事件名
    #[serde(default = "default_resume_event")]
    pub resume_event: String,
}

fn default_effect() -> u32 {
    1
}

fn default_pause_event() -> String {
    DEFAULT_PAUSE_EVENT.to_string()
}

fn default_resume_event() -> String {
    DEFAULT_RESUME_EVENT.to_string()
}

impl InstanceConfig {
    /// 以 logo 选择器创建配置，其余取默认值
    pub fn new(logo_selector: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            logo_selector: logo_selector.into(),
            default_effect: default_effect(),
            include_selectors: Vec::new(),
            exclude_selectors: Vec::new(),
            global_offset: Responsive::default(),
            settings: EffectSettings::default(),
            mappings: Vec::new(),
            event_target_selector: None,
            pause_event: default_pause_event(),
            resume_event: default_resume_event(),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logo_selector.trim().is_empty() {
            return Err(ConfigError::MissingLogoSelector {
                instance: self.id.clone(),
            });
        }
        if EffectKind::from_number(self.default_effect).is_none() {
            return Err(ConfigError::InvalidEffect {
                number: self.default_effect,
            });
        }
        Ok(())
    }

    /// 所有映射选择器（按映射顺序）
    pub fn mapping_selectors(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.selector.as_str())
    }
}

/// 页面级配置：同一页面上的全部实例
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

impl PageConfig {
    /// 从 JSON 文本解析
    ///
    /// 同时接受 `{ "instances": [...] }` 与单个实例对象。
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if value.get("instances").is_some() {
            serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            let instance: InstanceConfig =
                serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(Self {
                instances: vec![instance],
            })
        }
    }
}

/// 宽松反序列化
pub(crate) mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
    }

    /// 数字 / 数字字符串 / 空串 / null → `Option<f32>`
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Loose>::deserialize(deserializer)?;
        Ok(match value {
            None => None,
            Some(Loose::Number(n)) => Some(n as f32),
            Some(Loose::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    match text.parse::<f32>() {
                        Ok(n) => Some(n),
                        Err(_) => {
                            tracing::warn!(value = %text, "无法解析的数值设置，视为未定义");
                            None
                        }
                    }
                }
            }
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SelectorList {
        Joined(String),
        List(Vec<String>),
    }

    /// 逗号分隔的字符串或字符串数组 → 去空白、去空项的列表
    pub fn selector_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<SelectorList>::deserialize(deserializer)?;
        let raw = match value {
            None => Vec::new(),
            Some(SelectorList::Joined(text)) => {
                text.split(',').map(str::to_string).collect::<Vec<_>>()
            }
            Some(SelectorList::List(list)) => list,
        };
        Ok(raw
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}
