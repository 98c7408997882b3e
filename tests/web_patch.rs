#![cfg(target_arch = "wasm32")]

use dom_reconcile::{web::WebSurface, Reconciler, Selector, Surface};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init_log() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

fn container() -> web_sys::Element {
	let document = window().unwrap().document().unwrap();
	let container = document.create_element("div").unwrap();
	document.body().unwrap().append_child(&container).unwrap();
	container
}

#[wasm_bindgen_test]
fn merge_by_uid() {
	init_log();
	let container = container();
	let live: web_sys::Node = container.clone().into();
	let mut reconciler = Reconciler::new(WebSurface::new());

	reconciler.patch_markup(r#"<section uid="a" hash="1"><h1 id="web-title">Old</h1></section>"#, &live, false).unwrap();
	reconciler.patch_markup(r#"<section uid="a" hash="2"><h1 id="web-title">New</h1></section>"#, &live, false).unwrap();
	assert_eq!(container.inner_html(), r#"<section uid="a" hash="2"><h1 id="web-title">New</h1></section>"#);

	let stats = reconciler.patch_markup(r#"<section uid="a" hash="2"><h1 id="web-title">Newer</h1></section>"#, &live, false).unwrap();
	assert!(stats.is_noop());
	assert_eq!(container.inner_html(), r#"<section uid="a" hash="2"><h1 id="web-title">New</h1></section>"#);

	container.remove();
}

#[wasm_bindgen_test]
fn structural_equality() {
	init_log();
	let container = container();
	container.set_inner_html("<span>Hi</span>");
	let live: web_sys::Node = container.clone().into();
	let mut reconciler = Reconciler::new(WebSurface::new());

	reconciler.patch_markup("<span>Hi</span>", &live, false).unwrap();
	assert_eq!(container.inner_html(), "<span>Hi</span>");

	reconciler.patch_markup("<span>Bye</span>", &live, false).unwrap();
	assert_eq!(container.inner_html(), "<span>Hi</span><span>Bye</span>");

	container.remove();
}

#[wasm_bindgen_test]
fn comments_take_part_in_structural_equality() {
	init_log();
	let container = container();
	container.set_inner_html("<span>Hi<!--note--></span>");
	let live: web_sys::Node = container.clone().into();
	let mut reconciler = Reconciler::new(WebSurface::new());

	reconciler.patch_markup("<span>Hi</span>", &live, false).unwrap();
	assert_eq!(container.inner_html(), "<span>Hi<!--note--></span><span>Hi</span>");

	container.remove();
}

#[wasm_bindgen_test]
fn text_wrappers_are_unwrapped() {
	init_log();
	let container = container();
	let live: web_sys::Node = container.clone().into();
	let mut reconciler = Reconciler::new(WebSurface::new());

	reconciler.patch_markup("<text>Hello</text><p>x</p>", &live, false).unwrap();
	assert_eq!(container.inner_html(), "Hello<p>x</p>");

	container.remove();
}

#[wasm_bindgen_test]
fn head_only_tags_are_relocated() {
	init_log();
	let container = container();
	let live: web_sys::Node = container.clone().into();
	let mut reconciler = Reconciler::new(WebSurface::new());

	reconciler.patch_markup(r#"<meta uid="web-meta" name="x">"#, &live, false).unwrap();
	reconciler.patch_markup(r#"<meta uid="web-meta" name="y">"#, &live, false).unwrap();
	assert_eq!(container.inner_html(), "");

	let surface = reconciler.surface();
	let head = surface.head().unwrap();
	let metas = surface.query_selector_all(&head, Selector::TagUid { tag: "meta", uid: "web-meta" }).unwrap();
	assert_eq!(metas.len(), 1);
	assert_eq!(surface.get_attribute(&metas[0], "name").as_deref(), Some("y"));

	reconciler.patch_markup(r#"<meta uid="web-meta" NodeRemoved="true">"#, &head, false).unwrap();
	assert!(reconciler.surface().query_selector(&head, Selector::TagUid { tag: "meta", uid: "web-meta" }).unwrap().is_none());

	container.remove();
}
