#![cfg(test)]

use core::cmp::Ordering;
use core::error::Error;
use dom::{BoundaryPoint, DOMUpdate, DocumentId, DomTree, NodeKey, TreeMutation, TreeOrder as _};

const BODY: NodeKey = NodeKey(1);
const PARA: NodeKey = NodeKey(2);
const TEXT_A: NodeKey = NodeKey(3);
const SPAN: NodeKey = NodeKey(4);
const TEXT_B: NodeKey = NodeKey(5);

/// `<body><p>"hello "<span>"world"</span></p></body>`
fn sample_tree() -> Result<DomTree, Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut tree = DomTree::new(DocumentId(1));
    for update in [
        DOMUpdate::InsertElement {
            parent: NodeKey::ROOT,
            node: BODY,
            tag: "BODY".into(),
            pos: 0,
        },
        DOMUpdate::InsertElement {
            parent: BODY,
            node: PARA,
            tag: "p".into(),
            pos: 0,
        },
        DOMUpdate::InsertText {
            parent: PARA,
            node: TEXT_A,
            text: "hello ".into(),
            pos: 0,
        },
        DOMUpdate::InsertElement {
            parent: PARA,
            node: SPAN,
            tag: "span".into(),
            pos: 1,
        },
        DOMUpdate::InsertText {
            parent: SPAN,
            node: TEXT_B,
            text: "world".into(),
            pos: 0,
        },
    ] {
        tree.apply(update)?;
    }
    Ok(tree)
}

#[test]
fn mirrors_structure_and_lowercases_tags() -> Result<(), Box<dyn Error>> {
    let tree = sample_tree()?;
    assert_eq!(tree.tag_name(BODY), Some("body"));
    assert_eq!(tree.children(PARA), &[TEXT_A, SPAN]);
    assert_eq!(tree.index_in_parent(SPAN), Some(1));
    assert_eq!(tree.node_length(TEXT_A), Some(6));
    assert_eq!(tree.node_length(PARA), Some(2));
    assert_eq!(tree.text_nodes_in_order(), vec![TEXT_A, TEXT_B]);
    assert_eq!(tree.elements(), vec![BODY, PARA, SPAN]);
    Ok(())
}

#[test]
fn boundary_points_follow_tree_order() -> Result<(), Box<dyn Error>> {
    let tree = sample_tree()?;
    let in_first_text = BoundaryPoint::new(TEXT_A, 3);
    let in_second_text = BoundaryPoint::new(TEXT_B, 0);
    let before_span = BoundaryPoint::new(PARA, 1);
    let after_span = BoundaryPoint::new(PARA, 2);

    assert_eq!(
        tree.compare_points(in_first_text, in_second_text),
        Some(Ordering::Less)
    );
    assert_eq!(
        tree.compare_points(before_span, in_second_text),
        Some(Ordering::Less)
    );
    assert_eq!(
        tree.compare_points(after_span, in_second_text),
        Some(Ordering::Greater)
    );
    assert_eq!(
        tree.compare_points(before_span, in_first_text),
        Some(Ordering::Greater)
    );
    assert_eq!(
        tree.compare_points(in_first_text, in_first_text),
        Some(Ordering::Equal)
    );
    assert_eq!(
        tree.compare_points(in_first_text, BoundaryPoint::new(NodeKey(99), 0)),
        None
    );
    Ok(())
}

#[test]
fn removal_reports_parent_index_and_subtree() -> Result<(), Box<dyn Error>> {
    let mut tree = sample_tree()?;
    let mutations = tree.apply(DOMUpdate::RemoveNode { node: SPAN })?;
    assert_eq!(
        mutations,
        vec![TreeMutation::ChildRemoved {
            parent: PARA,
            index: 1,
            node: SPAN,
            subtree: vec![SPAN, TEXT_B],
        }]
    );
    assert!(!tree.contains(TEXT_B));
    assert_eq!(tree.children(PARA), &[TEXT_A]);
    Ok(())
}

#[test]
fn replace_data_counts_utf16_units() -> Result<(), Box<dyn Error>> {
    let mut tree = sample_tree()?;
    let mutations = tree.apply(DOMUpdate::ReplaceData {
        node: TEXT_A,
        offset: 0,
        count: 5,
        data: "\u{1F600}".into(),
    })?;
    assert_eq!(
        mutations,
        vec![TreeMutation::TextReplaced {
            node: TEXT_A,
            offset: 0,
            removed: 5,
            inserted: 2,
        }]
    );
    assert_eq!(tree.text(TEXT_A), Some("\u{1F600} "));
    assert_eq!(tree.node_length(TEXT_A), Some(3));
    Ok(())
}

#[test]
fn rejects_updates_that_do_not_fit_the_tree() -> Result<(), Box<dyn Error>> {
    let mut tree = sample_tree()?;
    assert!(
        tree.apply(DOMUpdate::InsertText {
            parent: TEXT_A,
            node: NodeKey(50),
            text: "x".into(),
            pos: 0,
        })
        .is_err()
    );
    assert!(tree.apply(DOMUpdate::RemoveNode { node: NodeKey::ROOT }).is_err());
    assert!(
        tree.apply(DOMUpdate::ReplaceData {
            node: TEXT_B,
            offset: 9,
            count: 1,
            data: String::new(),
        })
        .is_err()
    );
    assert!(
        tree.apply(DOMUpdate::SetAttr {
            node: TEXT_B,
            name: "class".into(),
            value: "x".into(),
        })
        .is_err()
    );
    Ok(())
}

#[test]
fn attributes_are_case_insensitive_and_overwrite() -> Result<(), Box<dyn Error>> {
    let mut tree = sample_tree()?;
    tree.apply(DOMUpdate::SetAttr {
        node: SPAN,
        name: "CLASS".into(),
        value: "one".into(),
    })?;
    tree.apply(DOMUpdate::SetAttr {
        node: SPAN,
        name: "class".into(),
        value: "two".into(),
    })?;
    assert_eq!(tree.attribute(SPAN, "Class"), Some("two"));
    Ok(())
}

#[test]
fn insert_positions_past_the_last_child_are_rejected() -> Result<(), Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut empty = DomTree::new(DocumentId(2));
    let outcome = empty.apply(DOMUpdate::InsertElement {
        parent: NodeKey::ROOT,
        node: BODY,
        tag: "body".into(),
        pos: 7,
    });
    assert!(outcome.is_err());
    assert!(!empty.contains(BODY));
    assert!(empty.children(NodeKey::ROOT).is_empty());

    let mut tree = sample_tree()?;
    assert!(
        tree.apply(DOMUpdate::InsertText {
            parent: PARA,
            node: NodeKey(60),
            text: "!".into(),
            pos: 3,
        })
        .is_err()
    );
    tree.apply(DOMUpdate::InsertText {
        parent: PARA,
        node: NodeKey(60),
        text: "!".into(),
        pos: 2,
    })?;
    assert_eq!(tree.children(PARA), &[TEXT_A, SPAN, NodeKey(60)]);
    Ok(())
}
