use arbor_dom::{element, text, DeclareError, DeclaredNode, Fragment};

type Node = DeclaredNode<(), ()>;

fn tags(node: &Node) -> Vec<String> {
	match node {
		DeclaredNode::Element(element) => element
			.children()
			.iter()
			.map(|child| match child {
				DeclaredNode::Element(element) => element.tag().to_owned(),
				DeclaredNode::Text(text) => format!("{:?}", text),
			})
			.collect(),
		DeclaredNode::Text(_) => Vec::new(),
	}
}

#[test]
fn duplicate_attribute_is_rejected() {
	let result: Result<Node, _> = element("img").attribute("src", "a.png").attribute("alt", "").attribute("src", "b.png").build();
	assert_eq!(
		result.unwrap_err(),
		DeclareError::DuplicateAttribute {
			tag: "img".to_owned(),
			name: "src".to_owned()
		}
	);
}

#[test]
fn duplicate_event_is_rejected() {
	let result: Result<Node, _> = element("button").on("click", |_| ()).on("click", |_| ()).build();
	let error = result.unwrap_err();
	assert_eq!(error.to_string(), "duplicate event binding \"click\" on <button>");
}

#[test]
fn empty_tag_is_rejected() {
	let result: Result<Node, _> = element("").build();
	assert_eq!(result.unwrap_err(), DeclareError::EmptyTagName);
}

#[test]
fn same_name_for_attribute_and_event_is_fine() {
	let result: Result<Node, _> = element("div").attribute("click", "yes").on("click", |_| ()).build();
	assert!(result.is_ok());
}

#[test]
fn fragments_flatten_into_siblings() -> Result<(), DeclareError> {
	let nested: Fragment<(), ()> = Fragment::List(vec![
		Fragment::Node(element("a").build()?),
		Fragment::Empty,
		Fragment::List(vec![Fragment::Node(element("b").build()?), Fragment::List(Vec::new())]),
	]);
	let node: Node = element("div")
		.child(nested)
		.child(None::<Node>)
		.child(vec![element("c").build()?, text("d")])
		.children(vec![element("e").build()?])
		.build()?;

	assert_eq!(tags(&node), ["a", "b", "c", "\"d\"", "e"]);
	Ok(())
}

#[test]
fn declared_nodes_share_structure() -> Result<(), DeclareError> {
	let child: Node = element("span").attribute("id", "shared").build()?;
	let parent: Node = element("div").child(child.clone()).child(child.clone()).build()?;

	match (&parent, &child) {
		(DeclaredNode::Element(parent), DeclaredNode::Element(child)) => {
			assert_eq!(parent.children().len(), 2);
			for sibling in parent.children() {
				match sibling {
					DeclaredNode::Element(sibling) => assert!(std::rc::Rc::ptr_eq(sibling, child)),
					DeclaredNode::Text(_) => panic!("expected element"),
				}
			}
		}
		_ => panic!("expected elements"),
	}
	Ok(())
}
