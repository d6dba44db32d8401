//! # Effect Resolver
//!
//! 为区域挑选映射：先直接匹配，再祖先匹配。
//!
//! ## 优先级
//!
//! 两轮扫描整个映射列表：
//!
//! 1. 直接匹配：选择器命中区域元素本身，列表中靠前者胜出
//! 2. 祖先匹配：只有第一轮全部落空时才进行，选择器命中区域的某个祖先
//!
//! 也就是说"直接命中"优先于映射顺序，映射顺序优先于祖先的远近。
//! 两轮都落空时返回 `None`，调用方使用实例的默认效果。

use tracing::warn;

use crate::config::{EffectSettings, RegionMapping};
use crate::dom::{Dom, ElementId, Selector};

/// 命中方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Direct,
    Ancestor,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRegion<'a> {
    /// 效果编号
    pub effect_number: u32,
    /// 映射是否启用覆盖
    pub override_enabled: bool,
    /// 映射上的覆盖参数
    pub settings: Option<&'a EffectSettings>,
    /// 命中的映射下标
    pub mapping_index: usize,
    pub match_kind: MatchKind,
}

impl<'a> ResolvedRegion<'a> {
    /// 真正传给效果构建器的覆盖参数
    ///
    /// 只有启用覆盖且带有参数时才有值。
    pub fn override_settings(&self) -> Option<&'a EffectSettings> {
        if self.override_enabled {
            self.settings
        } else {
            None
        }
    }
}

/// 效果解析器
///
/// 构造时一次性编译映射选择器，无效选择器记录警告，之后始终视为不命中。
pub struct EffectResolver<'a> {
    mappings: Vec<(&'a RegionMapping, Option<Selector>)>,
}

impl<'a> EffectResolver<'a> {
    pub fn new(mappings: &'a [RegionMapping]) -> Self {
        let mappings = mappings
            .iter()
            .map(|mapping| {
                let selector = Selector::parse(&mapping.selector)
                    .inspect_err(|e| {
                        warn!(selector = %mapping.selector, error = %e, "映射选择器无效，已忽略");
                    })
                    .ok();
                (mapping, selector)
            })
            .collect();
        Self { mappings }
    }

    /// 解析区域对应的映射
    pub fn resolve(&self, dom: &dyn Dom, region: ElementId) -> Option<ResolvedRegion<'a>> {
        let direct = self.mappings.iter().enumerate().find(|(_, (_, selector))| {
            selector.as_ref().is_some_and(|s| s.matches(dom, region))
        });
        if let Some((index, (mapping, _))) = direct {
            return Some(Self::resolved(index, *mapping, MatchKind::Direct));
        }

        let ancestor = self.mappings.iter().enumerate().find(|(_, (_, selector))| {
            selector
                .as_ref()
                .is_some_and(|s| has_matching_ancestor(dom, region, s))
        });
        ancestor.map(|(index, (mapping, _))| Self::resolved(index, *mapping, MatchKind::Ancestor))
    }

    fn resolved(
        index: usize,
        mapping: &'a RegionMapping,
        match_kind: MatchKind,
    ) -> ResolvedRegion<'a> {
        ResolvedRegion {
            effect_number: mapping.effect,
            override_enabled: mapping.override_enabled,
            settings: mapping.settings.as_ref(),
            mapping_index: index,
            match_kind,
        }
    }
}

fn has_matching_ancestor(dom: &dyn Dom, element: ElementId, selector: &Selector) -> bool {
    let mut current = dom.parent(element);
    while let Some(node) = current {
        if selector.matches(dom, node) {
            return true;
        }
        current = dom.parent(node);
    }
    false
}
