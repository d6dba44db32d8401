//! # Target 模块
//!
//! logo 元素的引擎侧状态表：原始快照、当前活动句柄、拆字状态。
//!
//! 这些状态不挂在元素上，而是由引擎实例持有，元素本身只通过
//! [`Dom`] 的标记 / 内联样式读写接口被修改。
//!
//! ## 呈现规则
//!
//! - 所有整体属性处于静止值、且未拆字时，内联样式与原始快照逐字节一致
//! - 否则在原始样式后追加 `transform` / `filter` / `opacity` 声明
//! - 拆字后，标记被替换为逐字符的 `span.lc-char`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::animation::{AnimationHandle, Animator, Property};
use crate::dom::{Dom, ElementId, Rect};

/// 乱序时使用的字形
const SHUFFLE_GLYPHS: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '#', '%', '&', '*',
    '?', '@',
];

/// 判定属性处于静止值的容差
const REST_EPSILON: f32 = 1e-4;

/// logo 目标
#[derive(Debug, Clone)]
pub struct LogoTarget {
    element: ElementId,
    /// 初始化时记录的原始标记
    pristine_html: String,
    /// 初始化时记录的原始内联样式
    pristine_style: String,
    /// 拆字后的字符（`None` 表示未拆字）
    chars: Option<Vec<char>>,
    /// 乱序轮数（乱序字形按轮数换帧）
    shuffle_steps: u32,
    /// 当前活动句柄（至多一个）
    live: Option<AnimationHandle>,
    /// 完成后需要还原原始状态的句柄
    restore_after: Option<AnimationHandle>,
}

impl LogoTarget {
    /// 记录 logo 的原始状态
    pub fn capture(dom: &dyn Dom, element: ElementId) -> Self {
        Self {
            element,
            pristine_html: dom.inner_html(element),
            pristine_style: dom.inline_style(element),
            chars: None,
            shuffle_steps: 1,
            live: None,
            restore_after: None,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn pristine_html(&self) -> &str {
        &self.pristine_html
    }

    pub fn pristine_style(&self) -> &str {
        &self.pristine_style
    }

    /// logo 当前的包围盒（视口坐标）
    pub fn rect(&self, dom: &dyn Dom, scroll_y: f32) -> Rect {
        dom.bounding_rect(self.element, scroll_y)
    }

    /// 拆字后的字符数
    pub fn char_count(&self) -> Option<usize> {
        self.chars.as_ref().map(Vec::len)
    }

    pub fn live(&self) -> Option<AnimationHandle> {
        self.live
    }

    /// 记录新的活动句柄
    pub fn set_live(&mut self, handle: AnimationHandle) {
        self.live = Some(handle);
    }

    /// 强制停止活动句柄
    ///
    /// 返回被停止的句柄（它在停止前仍在运行时）。
    pub fn kill_live(&mut self, animator: &mut dyn Animator) -> Option<AnimationHandle> {
        let handle = self.live.take()?;
        if self.restore_after == Some(handle) {
            self.restore_after = None;
        }
        animator.kill(handle).then_some(handle)
    }

    /// 句柄完成时还原原始状态
    pub fn restore_on_complete(&mut self, handle: AnimationHandle) {
        self.restore_after = Some(handle);
    }

    /// 处理动画完成事件，返回是否执行了还原
    pub fn on_completed(
        &mut self,
        dom: &mut dyn Dom,
        animator: &mut dyn Animator,
        handle: AnimationHandle,
    ) -> bool {
        if self.live == Some(handle) {
            self.live = None;
        }
        if self.restore_after == Some(handle) {
            self.restore(dom, animator);
            return true;
        }
        false
    }

    /// 还原原始标记与内联样式，并把所有属性归位
    pub fn restore(&mut self, dom: &mut dyn Dom, animator: &mut dyn Animator) {
        animator.reset();
        self.chars = None;
        self.shuffle_steps = 1;
        self.live = None;
        self.restore_after = None;
        dom.set_inner_html(self.element, &self.pristine_html);
        dom.set_inline_style(self.element, &self.pristine_style);
    }

    /// 应用拆字结果
    pub fn split(
        &mut self,
        dom: &mut dyn Dom,
        animator: &dyn Animator,
        chars: Vec<char>,
        shuffle_steps: u32,
    ) {
        self.chars = Some(chars);
        self.shuffle_steps = shuffle_steps.max(1);
        self.render(dom, animator);
    }

    /// 把属性当前值写回元素
    pub fn render(&self, dom: &mut dyn Dom, animator: &dyn Animator) {
        dom.set_inline_style(self.element, &self.compose_style(animator));
        if let Some(chars) = &self.chars {
            dom.set_inner_html(self.element, &self.compose_chars(chars, animator));
        }
    }

    fn compose_style(&self, animator: &dyn Animator) -> String {
        let value = |p: Property| animator.value(p);
        let moved = |p: Property| (value(p) - p.rest_value()).abs() > REST_EPSILON;

        let mut transforms = Vec::new();
        if moved(Property::TranslateX) || moved(Property::TranslateY) {
            transforms.push(format!(
                "translate({}px, {}px)",
                css_number(value(Property::TranslateX)),
                css_number(value(Property::TranslateY))
            ));
        }
        if moved(Property::Rotation) {
            transforms.push(format!("rotate({}deg)", css_number(value(Property::Rotation))));
        }
        if moved(Property::Scale) {
            transforms.push(format!("scale({})", css_number(value(Property::Scale))));
        }

        let mut declarations = Vec::new();
        if !transforms.is_empty() {
            declarations.push(format!("transform: {}", transforms.join(" ")));
        }
        if moved(Property::Blur) {
            declarations.push(format!("filter: blur({}px)", css_number(value(Property::Blur))));
        }
        if moved(Property::Opacity) {
            declarations.push(format!("opacity: {}", css_number(value(Property::Opacity))));
        }

        if declarations.is_empty() {
            return self.pristine_style.clone();
        }
        let base = self.pristine_style.trim().trim_end_matches(';');
        if base.is_empty() {
            format!("{};", declarations.join("; "))
        } else {
            format!("{}; {};", base, declarations.join("; "))
        }
    }

    fn compose_chars(&self, chars: &[char], animator: &dyn Animator) -> String {
        let mut html = String::new();
        for (i, &ch) in chars.iter().enumerate() {
            let offset = animator.value(Property::CharOffsetY(i));
            let opacity = animator.value(Property::CharOpacity(i));
            let shuffle = animator.value(Property::CharShuffle(i));

            let shown = if ch.is_whitespace() || shuffle >= 1.0 - REST_EPSILON {
                ch
            } else {
                let step = (shuffle.max(0.0) * self.shuffle_steps as f32) as u64;
                shuffle_glyph(i, step)
            };

            html.push_str("<span class=\"lc-char\" style=\"display:inline-block");
            if offset.abs() > REST_EPSILON {
                html.push_str(&format!(";transform:translateY({}px)", css_number(offset)));
            }
            if (opacity - 1.0).abs() > REST_EPSILON {
                html.push_str(&format!(";opacity:{}", css_number(opacity)));
            }
            html.push_str("\">");
            push_escaped(&mut html, shown);
            html.push_str("</span>");
        }
        html
    }
}

/// 第 `index` 个字符在第 `step` 帧显示的乱序字形
///
/// 相同输入总是得到相同字形，渲染结果可复现。
fn shuffle_glyph(index: usize, step: u64) -> char {
    let mut rng = StdRng::seed_from_u64(((index as u64) << 32) ^ step);
    SHUFFLE_GLYPHS[rng.gen_range(0..SHUFFLE_GLYPHS.len())]
}

/// 保留三位小数，去掉多余的零
fn css_number(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{}", rounded + 0.0)
}

fn push_escaped(html: &mut String, ch: char) {
    match ch {
        '&' => html.push_str("&amp;"),
        '<' => html.push_str("&lt;"),
        '>' => html.push_str("&gt;"),
        '"' => html.push_str("&quot;"),
        _ => html.push(ch),
    }
}
