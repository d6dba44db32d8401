//! # 字符类效果集成测试
//!
//! 拆字与乱序效果依赖拆字协作方：请求、轮询、就绪后才开始动画。
//! 等待期间的离开 / 交接必须作废旧请求。

use collision_runtime::{
    CharSplitter, CollisionEngine, DeferredSplitter, Dom, ElementId, InstanceConfig, JournalEvent,
    MemoryDom, NodeSpec, RegionMapping, TextSplitter, TweenEngine, UnavailableSplitter,
};

const PRISTINE_HTML: &str = "<b>Acme</b>";

fn page() -> MemoryDom {
    let mut dom = MemoryDom::default();
    let body = dom.body();
    dom.append(
        body,
        NodeSpec::new("a")
            .id("logo")
            .at(20.0, 40.0)
            .span(24.0, 160.0)
            .fixed()
            .html(PRISTINE_HTML),
    );
    dom.append(body, NodeSpec::new("section").class("split").at(1000.0, 600.0));
    dom.append(body, NodeSpec::new("section").class("shuffle").at(3000.0, 600.0));
    dom
}

fn start(dom: &mut MemoryDom, splitter: Box<dyn TextSplitter>) -> CollisionEngine {
    let mut config = InstanceConfig::new("#logo");
    config.mappings = vec![
        RegionMapping::new(".split", 3),
        RegionMapping::new(".shuffle", 4),
    ];
    CollisionEngine::init(config, dom, 0.0, Box::new(TweenEngine::new()), splitter).unwrap()
}

fn settle(engine: &mut CollisionEngine, dom: &mut MemoryDom, ms: f32) {
    let mut elapsed = 0.0;
    while elapsed < ms {
        engine.advance(dom, 16.0);
        elapsed += 16.0;
    }
}

#[test]
fn test_split_waits_for_splitter() {
    let mut dom = page();
    let mut engine = start(&mut dom, Box::new(DeferredSplitter::new(200.0)));
    let logo = engine.logo();

    engine.on_scroll(&mut dom, 1200.0);
    assert!(engine.is_awaiting_split());
    assert_eq!(dom.inner_html(logo), PRISTINE_HTML);
    assert_eq!(engine.pause_count(), 1);

    settle(&mut engine, &mut dom, 100.0);
    assert!(engine.is_awaiting_split());

    settle(&mut engine, &mut dom, 150.0);
    assert!(!engine.is_awaiting_split());
    let html = dom.inner_html(logo);
    assert_eq!(html.matches("class=\"lc-char\"").count(), 4);

    engine.on_scroll(&mut dom, 2000.0);
    settle(&mut engine, &mut dom, 1000.0);
    assert_eq!(dom.inner_html(logo), PRISTINE_HTML);
    assert_eq!(dom.inline_style(logo), "");
    assert_eq!(engine.resume_count(), 1);
}

#[test]
fn test_leave_during_pending_split_discards_request() {
    let mut dom = page();
    let mut engine = start(&mut dom, Box::new(DeferredSplitter::new(200.0)));
    let logo = engine.logo();

    engine.on_scroll(&mut dom, 1200.0);
    settle(&mut engine, &mut dom, 48.0);
    engine.on_scroll(&mut dom, 0.0);
    assert!(!engine.is_awaiting_split());

    // 模块加载完成后也不会再拆字
    settle(&mut engine, &mut dom, 1000.0);
    assert_eq!(dom.inner_html(logo), PRISTINE_HTML);
    assert_eq!(engine.pause_count(), engine.resume_count());
}

#[test]
fn test_unavailable_splitter_degrades_to_no_effect() {
    let mut dom = page();
    let mut engine = start(&mut dom, Box::new(UnavailableSplitter::new("模块加载失败")));
    let logo = engine.logo();

    engine.on_scroll(&mut dom, 3200.0);
    assert!(!engine.is_awaiting_split());
    assert_eq!(
        engine
            .journal()
            .count(|e| matches!(e, JournalEvent::SplitFailed { .. })),
        1
    );
    assert_eq!(dom.inner_html(logo), PRISTINE_HTML);

    // 离开时照常退场并恢复
    engine.on_scroll(&mut dom, 5000.0);
    settle(&mut engine, &mut dom, 1000.0);
    assert_eq!(engine.pause_count(), 1);
    assert_eq!(engine.resume_count(), 1);
    assert_eq!(dom.inner_html(logo), PRISTINE_HTML);
}

#[test]
fn test_split_to_shuffle_uses_delayed_reenter() {
    let mut dom = page();
    // 两个区域的触发带重叠，向下滚动时直接交接
    dom.set_geometry(ElementId(3), 1500.0, 600.0);
    let mut engine = start(&mut dom, Box::new(CharSplitter::new()));
    let logo = engine.logo();

    engine.on_scroll(&mut dom, 1200.0);
    settle(&mut engine, &mut dom, 800.0);
    assert!(dom.inner_html(logo).contains("lc-char"));

    // split: 940..1580，shuffle: 1440..2080
    engine.on_scroll(&mut dom, 1500.0);
    assert_eq!(
        engine
            .journal()
            .count(|e| matches!(e, JournalEvent::Transition { .. })),
        0
    );
    let enters_before = engine
        .journal()
        .count(|e| matches!(e, JournalEvent::Enter { .. }));

    settle(&mut engine, &mut dom, 32.0);
    assert_eq!(
        engine
            .journal()
            .count(|e| matches!(e, JournalEvent::Enter { .. })),
        enters_before
    );

    settle(&mut engine, &mut dom, 32.0);
    assert_eq!(
        engine
            .journal()
            .count(|e| matches!(e, JournalEvent::Enter { .. })),
        enters_before + 1
    );
    // 同为交互效果，不重复暂停
    assert_eq!(engine.pause_count(), 1);
}
