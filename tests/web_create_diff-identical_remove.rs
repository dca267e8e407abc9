#![cfg(target_arch = "wasm32")]

use arbor_dom::{element, text, web::Mount, DeclaredNode, Patch, Program};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Event, Node};

wasm_bindgen_test_configure!(run_in_browser);

mod web_container_;
use web_container_::container;

#[derive(Clone, Copy)]
enum Shape {
	List(usize),
	Plain,
}

fn view(shape: &Shape) -> DeclaredNode<Event, Shape> {
	match *shape {
		Shape::List(length) => element("ul")
			.children((0..length).map(|i| element("li").on("click", move |_: &Event| Shape::List(i)).child(text(i.to_string())).build().unwrap()))
			.build()
			.unwrap(),
		Shape::Plain => text("plain"),
	}
}

fn program() -> Program<Shape, Shape, Event> {
	Program::new(Shape::List(3), |_: &Shape, shape: Shape| shape, view)
}

#[wasm_bindgen_test]
fn create_diff_identical_remove() {
	let container = container();
	let mount = Mount::new(&container, 0).unwrap();
	let program = program();

	mount.render(&program).unwrap();
	assert_eq!(container.inner_html(), "<ul><li>0</li><li>1</li><li>2</li></ul>");
	assert_eq!(mount.listener_count(), 3);
	let first: Node = container.first_element_child().unwrap().first_element_child().unwrap().into();

	assert_eq!(program.render(), Patch::Skip);
	mount.render(&program).unwrap();
	assert_eq!(container.inner_html(), "<ul><li>0</li><li>1</li><li>2</li></ul>");
	assert_eq!(mount.listener_count(), 3);

	mount.apply(&program.dispatch(Shape::List(1))).unwrap();
	assert_eq!(container.inner_html(), "<ul><li>0</li></ul>");
	assert_eq!(mount.listener_count(), 1);
	let kept: Node = container.first_element_child().unwrap().first_element_child().unwrap().into();
	assert!(kept.is_same_node(Some(&first)));

	mount.apply(&program.dispatch(Shape::List(0))).unwrap();
	assert_eq!(container.inner_html(), "<ul></ul>");
	assert_eq!(mount.listener_count(), 0);
}

#[wasm_bindgen_test]
fn replaced_root_releases_listeners() {
	let container = container();
	let mount = Mount::new(&container, 0).unwrap();
	let program = program();

	mount.render(&program).unwrap();
	assert_eq!(mount.listener_count(), 3);

	mount.apply(&program.dispatch(Shape::Plain)).unwrap();
	assert_eq!(container.inner_html(), "plain");
	assert_eq!(mount.listener_count(), 0);

	mount.apply(&program.dispatch(Shape::List(2))).unwrap();
	assert_eq!(container.inner_html(), "<ul><li>0</li><li>1</li></ul>");
	assert_eq!(mount.listener_count(), 2);
}

#[wasm_bindgen_test]
fn resync_rebuilds_the_dom() {
	let container = container();
	let mount = Mount::new(&container, 0).unwrap();
	let program = program();

	mount.render(&program).unwrap();
	let before: Node = container.first_element_child().unwrap().into();

	mount.apply(&program.resync()).unwrap();
	let after: Node = container.first_element_child().unwrap().into();
	assert!(!after.is_same_node(Some(&before)));
	assert_eq!(container.inner_html(), "<ul><li>0</li><li>1</li><li>2</li></ul>");
	assert_eq!(mount.listener_count(), 3);
}
