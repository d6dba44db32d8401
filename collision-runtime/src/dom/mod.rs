//! # DOM 模块
//!
//! 引擎对页面的全部依赖都收敛在 [`Dom`] trait 上：
//! 结构查询、几何信息、logo 的标记/内联样式读写、自定义事件派发。
//!
//! ## 核心组件
//!
//! - [`Dom`]：页面访问接口（必需方法为原语，选择器查询为提供方法）
//! - [`Selector`]：CSS 选择器子集的解析与匹配
//! - [`MemoryDom`]：内存中的页面实现，供宿主模拟与测试使用
//!
//! ## 坐标约定
//!
//! [`Dom::bounding_rect`] 与浏览器的 `getBoundingClientRect` 一致，返回视口坐标：
//! 普通元素随滚动移动，固定定位元素不随滚动移动。

mod memory;
mod selector;

pub use memory::{DispatchedEvent, MemoryDom, NodeSpec, PageSpec};
pub use selector::Selector;

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// 元素标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// 矩形（px）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// 视口尺寸
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// 页面访问接口
pub trait Dom {
    /// 文档顺序（先序遍历）的全部元素，不含 body 本身
    fn all_elements(&self) -> Vec<ElementId>;

    /// body 的直接子元素
    fn body_children(&self) -> Vec<ElementId>;

    /// 父元素（body 的子元素返回 `None`）
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// 小写标签名
    fn tag_name(&self, element: ElementId) -> &str;

    /// 属性值（`id`、`class` 也通过此方法读取）
    fn attribute(&self, element: ElementId, name: &str) -> Option<&str>;

    /// 元素在文档中的先序位置
    fn document_position(&self, element: ElementId) -> usize;

    /// 视口坐标下的包围盒
    fn bounding_rect(&self, element: ElementId, scroll_y: f32) -> Rect;

    /// 当前视口尺寸
    fn viewport(&self) -> Viewport;

    fn inner_html(&self, element: ElementId) -> String;

    fn set_inner_html(&mut self, element: ElementId, html: &str);

    fn inline_style(&self, element: ElementId) -> String;

    fn set_inline_style(&mut self, element: ElementId, style: &str);

    /// 纯文本内容
    fn text_content(&self, element: ElementId) -> String;

    /// 派发自定义事件
    fn dispatch_event(&mut self, element: ElementId, name: &str);

    // ========== 提供方法 ==========

    /// 渲染高度大于 0
    fn is_visible(&self, element: ElementId) -> bool {
        self.bounding_rect(element, 0.0).height > 0.0
    }

    /// 是否带有某个 class
    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.attribute(element, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// `ancestor` 是否为 `element` 的祖先（不含自身）
    fn is_ancestor(&self, ancestor: ElementId, element: ElementId) -> bool {
        let mut current = self.parent(element);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// 文档顺序下所有匹配的元素
    fn query_all(&self, selector: &str) -> Result<Vec<ElementId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .all_elements()
            .into_iter()
            .filter(|&el| selector.matches(self, el))
            .collect())
    }

    /// 第一个匹配的元素
    fn query(&self, selector: &str) -> Result<Option<ElementId>, SelectorError> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    /// 元素自身是否匹配
    fn matches(&self, element: ElementId, selector: &str) -> Result<bool, SelectorError> {
        Ok(Selector::parse(selector)?.matches(self, element))
    }

    /// 自身或最近的匹配祖先
    fn closest(
        &self,
        element: ElementId,
        selector: &str,
    ) -> Result<Option<ElementId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        let mut current = Some(element);
        while let Some(node) = current {
            if selector.matches(self, node) {
                return Ok(Some(node));
            }
            current = self.parent(node);
        }
        Ok(None)
    }
}
