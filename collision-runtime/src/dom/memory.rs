//! # MemoryDom
//!
//! 内存中的页面实现。宿主模拟器从 JSON 页面描述（[`PageSpec`]）构建，
//! 测试用 [`NodeSpec`] 的链式构造器直接搭建。
//!
//! 几何信息直接写在节点上：普通节点的 `top` 是文档坐标，
//! 固定定位节点（`fixed`）的 `top` 是视口坐标。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Dom, ElementId, Rect, Viewport};

/// 已派发的自定义事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchedEvent {
    pub target: ElementId,
    pub name: String,
}

/// 页面描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// 节点描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    /// 空白分隔的 class 列表
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub width: Option<f32>,
    /// 固定定位（`top`/`left` 为视口坐标）
    #[serde(default)]
    pub fixed: bool,
    /// 内部标记
    #[serde(default)]
    pub html: String,
    /// 内联样式
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// 设置纵向位置与高度
    pub fn at(mut self, top: f32, height: f32) -> Self {
        self.top = top;
        self.height = height;
        self
    }

    /// 设置横向位置与宽度
    pub fn span(mut self, left: f32, width: f32) -> Self {
        self.left = left;
        self.width = Some(width);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    rect: Rect,
    fixed: bool,
    html: String,
    style: String,
}

/// 内存页面
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    viewport: Viewport,
    events: Vec<DispatchedEvent>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

/// body 永远是 0 号节点
const BODY: ElementId = ElementId(0);

impl MemoryDom {
    /// 创建只含 body 的空页面
    pub fn new(viewport: Viewport) -> Self {
        let body = Node {
            tag: "body".to_string(),
            attributes: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            rect: Rect::new(0.0, 0.0, viewport.width, 0.0),
            fixed: false,
            html: String::new(),
            style: String::new(),
        };
        Self {
            nodes: vec![body],
            viewport,
            events: Vec::new(),
        }
    }

    /// 从页面描述构建
    pub fn from_spec(spec: &PageSpec) -> Self {
        let mut dom = Self::new(spec.viewport);
        for node in &spec.nodes {
            dom.append(BODY, node.clone());
        }
        dom
    }

    /// body 元素
    pub fn body(&self) -> ElementId {
        BODY
    }

    /// 追加子树，返回子树根
    pub fn append(&mut self, parent: ElementId, spec: NodeSpec) -> ElementId {
        let id = ElementId(self.nodes.len());

        let mut attributes = spec.attrs;
        if let Some(value) = spec.id {
            attributes.insert("id".to_string(), value);
        }
        if let Some(value) = spec.class {
            attributes.insert("class".to_string(), value);
        }

        let width = spec.width.unwrap_or(self.viewport.width);
        self.nodes.push(Node {
            tag: spec.tag.to_ascii_lowercase(),
            attributes,
            parent: (parent != BODY).then_some(parent),
            children: Vec::new(),
            rect: Rect::new(spec.top, spec.left, width, spec.height.max(0.0)),
            fixed: spec.fixed,
            html: spec.html,
            style: spec.style,
        });
        self.nodes[parent.0].children.push(id);

        for child in spec.children {
            self.append(id, child);
        }

        let bottom = self.nodes[id.0].rect.bottom();
        if !self.nodes[id.0].fixed && bottom > self.nodes[BODY.0].rect.height {
            self.nodes[BODY.0].rect.height = bottom;
        }
        id
    }

    /// 文档总高度
    pub fn document_height(&self) -> f32 {
        self.nodes[BODY.0].rect.height
    }

    /// 最大滚动距离
    pub fn max_scroll(&self) -> f32 {
        (self.document_height() - self.viewport.height).max(0.0)
    }

    /// 修改视口尺寸（模拟 resize）
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// 修改节点的纵向几何（模拟布局变化）
    pub fn set_geometry(&mut self, element: ElementId, top: f32, height: f32) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.rect.top = top;
            node.rect.height = height.max(0.0);
        }
    }

    /// 已派发的事件（按派发顺序）
    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    /// 某个名称的事件派发次数
    pub fn event_count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name == name).count()
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.0)
    }

    fn collect_preorder(&self, element: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.node(element) {
            for &child in &node.children {
                out.push(child);
                self.collect_preorder(child, out);
            }
        }
    }
}

impl Dom for MemoryDom {
    fn all_elements(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect_preorder(BODY, &mut out);
        out
    }

    fn body_children(&self) -> Vec<ElementId> {
        self.nodes[BODY.0].children.clone()
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element).and_then(|n| n.parent)
    }

    fn tag_name(&self, element: ElementId) -> &str {
        self.node(element).map(|n| n.tag.as_str()).unwrap_or("")
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.node(element)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    fn document_position(&self, element: ElementId) -> usize {
        self.all_elements()
            .iter()
            .position(|&e| e == element)
            .unwrap_or(usize::MAX)
    }

    fn bounding_rect(&self, element: ElementId, scroll_y: f32) -> Rect {
        match self.node(element) {
            Some(node) if node.fixed => node.rect,
            Some(node) => Rect {
                top: node.rect.top - scroll_y,
                ..node.rect
            },
            None => Rect::default(),
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn inner_html(&self, element: ElementId) -> String {
        self.node(element).map(|n| n.html.clone()).unwrap_or_default()
    }

    fn set_inner_html(&mut self, element: ElementId, html: &str) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.html = html.to_string();
        }
    }

    fn inline_style(&self, element: ElementId) -> String {
        self.node(element).map(|n| n.style.clone()).unwrap_or_default()
    }

    fn set_inline_style(&mut self, element: ElementId, style: &str) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.style = style.to_string();
        }
    }

    fn text_content(&self, element: ElementId) -> String {
        self.node(element)
            .map(|n| strip_tags(&n.html))
            .unwrap_or_default()
    }

    fn dispatch_event(&mut self, element: ElementId, name: &str) {
        self.events.push(DispatchedEvent {
            target: element,
            name: name.to_string(),
        });
    }
}

/// 去掉标签并解码常见实体
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> PageSpec {
        serde_json::from_str(
            r#"{
                "viewport": {"width": 1280, "height": 800},
                "nodes": [
                    {"tag": "header", "fixed": true, "top": 0, "height": 80, "children": [
                        {"tag": "a", "class": "site-logo", "fixed": true, "top": 20, "height": 40, "left": 24, "width": 160, "html": "<b>Acme</b> &amp; Co"}
                    ]},
                    {"tag": "section", "class": "hero", "top": 0, "height": 900},
                    {"tag": "section", "class": "dark", "top": 900, "height": 600}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_from_spec() {
        let dom = MemoryDom::from_spec(&sample_page());

        assert_eq!(dom.all_elements().len(), 4);
        assert_eq!(dom.body_children().len(), 3);
        assert_eq!(dom.document_height(), 1500.0);
        assert_eq!(dom.max_scroll(), 700.0);
    }

    #[test]
    fn test_query_and_document_order() {
        let dom = MemoryDom::from_spec(&sample_page());
        let sections = dom.query_all("section").unwrap();

        assert_eq!(sections.len(), 2);
        assert!(dom.document_position(sections[0]) < dom.document_position(sections[1]));

        let logo = dom.query(".site-logo").unwrap().unwrap();
        assert_eq!(dom.tag_name(logo), "a");
        assert!(dom.closest(logo, "header").unwrap().is_some());
        assert!(dom.query("div[").is_err());
    }

    #[test]
    fn test_bounding_rect_scroll() {
        let dom = MemoryDom::from_spec(&sample_page());
        let logo = dom.query(".site-logo").unwrap().unwrap();
        let dark = dom.query(".dark").unwrap().unwrap();

        // 固定元素不随滚动移动
        assert_eq!(dom.bounding_rect(logo, 300.0).top, 20.0);
        assert_eq!(dom.bounding_rect(dark, 300.0).top, 600.0);
    }

    #[test]
    fn test_text_content_strips_markup() {
        let dom = MemoryDom::from_spec(&sample_page());
        let logo = dom.query(".site-logo").unwrap().unwrap();

        assert_eq!(dom.text_content(logo), "Acme & Co");
    }

    #[test]
    fn test_events_recorded() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let el = dom.append(body, NodeSpec::new("div"));

        dom.dispatch_event(el, "logo-collision:pause");
        dom.dispatch_event(el, "logo-collision:resume");

        assert_eq!(dom.events().len(), 2);
        assert_eq!(dom.event_count("logo-collision:pause"), 1);
    }
}
