#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use web_sys::{window, Element, HtmlBodyElement};

static mut LOG_INITIALIZED: bool = false;

/// A fresh `<div>` at the end of the document body, so tests in the same page don't see each other's nodes.
pub fn container() -> Element {
	unsafe {
		if !LOG_INITIALIZED {
			//TODO: Fail on Warning or Error.
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let container = document.create_element("div").unwrap();
	body.append_child(&container).unwrap();
	container
}
