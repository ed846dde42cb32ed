#![cfg(test)]

use core::error::Error;
use css_cascade::{CascadeSource as _, HighlightStylesheet, Origin};
use css_style_attr::PropertyMap;
use dom::{DOMUpdate, DocumentId, DomTree, NodeKey};

const PARA: NodeKey = NodeKey(10);
const NOTE: NodeKey = NodeKey(11);

/// `<p><span id="n" class="note warn"></span></p>`
fn tree() -> Result<DomTree, Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut tree = DomTree::new(DocumentId(1));
    tree.apply(DOMUpdate::InsertElement {
        parent: NodeKey::ROOT,
        node: PARA,
        tag: "p".into(),
        pos: 0,
    })?;
    tree.apply(DOMUpdate::InsertElement {
        parent: PARA,
        node: NOTE,
        tag: "span".into(),
        pos: 0,
    })?;
    tree.apply(DOMUpdate::SetAttr {
        node: NOTE,
        name: "id".into(),
        value: "n".into(),
    })?;
    tree.apply(DOMUpdate::SetAttr {
        node: NOTE,
        name: "class".into(),
        value: "note warn".into(),
    })?;
    Ok(tree)
}

#[test]
fn universal_rules_apply_to_every_element() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let sheet = HighlightStylesheet::parse(
        Origin::Author,
        "::highlight(found) { background-color: yellow; color: black }",
    );
    let cascade = sheet.bind(&tree);
    for element in [PARA, NOTE] {
        let styles = cascade.cascaded_group_styles(element);
        let found = styles.get("found").ok_or("missing group")?;
        assert_eq!(found.get("background-color"), Some("yellow"));
        assert_eq!(found.get("color"), Some("black"));
    }
    Ok(())
}

#[test]
fn specificity_then_source_order_pick_the_winner() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let sheet = HighlightStylesheet::parse(
        Origin::Author,
        r"
        /* the class rule wins on the span despite coming first */
        span.note::highlight(spell) { color: red }
        ::highlight(spell) { color: green; text-decoration: underline }
        span::highlight(spell) { color: blue }
        ",
    );
    let cascade = sheet.bind(&tree);

    let on_note = cascade.cascaded_group_styles(NOTE);
    let spell = on_note.get("spell").ok_or("missing group")?;
    assert_eq!(spell.get("color"), Some("red"));
    assert_eq!(spell.get("text-decoration"), Some("underline"));

    let on_para = cascade.cascaded_group_styles(PARA);
    assert_eq!(
        on_para.get("spell").and_then(|props| props.get("color")),
        Some("green")
    );
    Ok(())
}

#[test]
fn important_and_extra_sheets() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let author = HighlightStylesheet::parse(
        Origin::Author,
        "#n::highlight(g) { color: red } ::highlight(g) { background: none !important }",
    );
    let user_agent = HighlightStylesheet::parse(
        Origin::UserAgent,
        "::highlight(g) { color: gray; background: yellow }",
    );
    let cascade = author.bind(&tree).with_sheet(&user_agent);
    let styles = cascade.cascaded_group_styles(NOTE);
    let group = styles.get("g").ok_or("missing group")?;
    assert_eq!(group.get("color"), Some("red"));
    assert_eq!(group.get("background"), Some("none"));
    Ok(())
}

#[test]
fn unsupported_rules_and_unmatched_elements() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let sheet = HighlightStylesheet::parse(
        Origin::Author,
        "@media print { ::highlight(a) { color: red } } p span::highlight(a) { color: red } div::highlight(b) { color: red } .warn::highlight(c) {}",
    );
    assert_eq!(sheet.rules.len(), 2);
    let cascade = sheet.bind(&tree);
    let styles = cascade.cascaded_group_styles(NOTE);
    assert!(!styles.mentions("a"));
    assert!(!styles.mentions("b"));
    assert!(styles.mentions("c"));
    assert!(styles.get("c").is_some_and(PropertyMap::is_empty));
    assert!(cascade.cascaded_group_styles(NodeKey(404)).is_empty());
    Ok(())
}

#[test]
fn semicolons_inside_strings_stay_in_the_value() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let sheet = HighlightStylesheet::parse(
        Origin::Author,
        r#"::highlight(a) { --label: "x;y"; color: red }"#,
    );
    let styles = sheet.bind(&tree).cascaded_group_styles(NOTE);
    let group = styles.get("a").ok_or("missing group")?;
    assert_eq!(group.get("--label"), Some(r#""x;y""#));
    assert_eq!(group.get("color"), Some("red"));
    Ok(())
}

#[test]
fn comment_openers_inside_strings_do_not_swallow_rules() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let sheet = HighlightStylesheet::parse(
        Origin::Author,
        r#"::highlight(a) { --x: "/*"; color: red } ::highlight(b) { color: blue }"#,
    );
    assert_eq!(sheet.rules.len(), 2);
    let styles = sheet.bind(&tree).cascaded_group_styles(PARA);
    let first = styles.get("a").ok_or("missing group")?;
    assert_eq!(first.get("--x"), Some(r#""/*""#));
    assert_eq!(first.get("color"), Some("red"));
    assert_eq!(styles.get("b").and_then(|props| props.get("color")), Some("blue"));
    Ok(())
}

#[test]
fn closing_braces_inside_strings_do_not_end_the_block() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let sheet = HighlightStylesheet::parse(
        Origin::Author,
        r#"::highlight(a) { content: "}"; color: red } ::highlight(b) { color: blue }"#,
    );
    assert_eq!(sheet.rules.len(), 2);
    let styles = sheet.bind(&tree).cascaded_group_styles(NOTE);
    let first = styles.get("a").ok_or("missing group")?;
    assert_eq!(first.get("content"), Some(r#""}""#));
    assert_eq!(first.get("color"), Some("red"));
    assert_eq!(styles.get("b").and_then(|props| props.get("color")), Some("blue"));
    Ok(())
}

#[test]
fn importance_comes_from_the_tokens() -> Result<(), Box<dyn Error>> {
    let tree = tree()?;
    let sheet = HighlightStylesheet::parse(
        Origin::Author,
        r#"
        #n::highlight(g) { color: red; --note: "!important" }
        ::highlight(g) { color: blue ! IMPORTANT /* loud */ }
        "#,
    );
    let rule = sheet.rules.get(1).ok_or("missing rule")?;
    let declaration = rule.declarations.first().ok_or("missing declaration")?;
    assert_eq!(declaration.value, "blue");
    assert!(declaration.important);

    let styles = sheet.bind(&tree).cascaded_group_styles(NOTE);
    let group = styles.get("g").ok_or("missing group")?;
    assert_eq!(group.get("color"), Some("blue"));
    assert_eq!(group.get("--note"), Some(r#""!important""#));
    Ok(())
}
