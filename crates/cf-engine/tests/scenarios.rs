//! End-to-end scenarios for cf-engine
//!
//! Each test parses rendered wiki markup, registers it and checks the
//! contexts and view fragments against the post-mutation tree.

use anyhow::{Context as _, Result};
use cf_dom::{Document, NodeId};
use cf_engine::{Engine, FilterConfig, PageIdentity, Registration, view};
use cf_html::HtmlParser;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup(html: &str) -> Result<(Document, Engine, NodeId)> {
    init_tracing();
    let mut doc = cf_html::parse(html)?;
    let content = *doc
        .get_elements_by_class_name("mw-body-content")
        .first()
        .context("fixture has no main content")?;
    let mut engine = Engine::new(FilterConfig::default(), PageIdentity::new("Items", "view"));
    let outcome = engine.register(&mut doc, content)?;
    assert!(outcome.is_registered());
    Ok((doc, engine, content))
}

fn by_id(doc: &Document, id: &str) -> Result<NodeId> {
    doc.get_element_by_id(id)
        .with_context(|| format!("no element #{id}"))
}

#[test]
fn test_section_hidden_under_other_filter() -> Result<()> {
    let (mut doc, mut engine, content) = setup(
        r#"<div class="mw-body-content"><h2 id="s">S</h2><p id="p"><span class="cf-tag cf-val-2" id="t">i</span> Only for the second filter.</p><h2 id="next">Next</h2><p>Always shown.</p></div>"#,
    )?;
    let (s, p, t, next) = (
        by_id(&doc, "s")?,
        by_id(&doc, "p")?,
        by_id(&doc, "t")?,
        by_id(&doc, "next")?,
    );
    let config = engine.config().clone();

    let hidden = engine.compute_view(&mut doc, 0)?;
    let tree = doc.tree();
    assert_eq!(hidden.len(), 1);
    let wrapper = hidden[0];
    assert!(tree.is_tag(wrapper, "div"));
    assert_eq!(tree.parent(s), Some(wrapper));
    assert_eq!(tree.parent(p), Some(wrapper));
    assert!(!tree.contains(wrapper, next));
    assert_eq!(view::view_fragments(tree, &config, content, 0), vec![wrapper]);

    let shown = engine.compute_view(&mut doc, 1)?;
    let tree = doc.tree();
    assert_eq!(shown, vec![t]);
    assert!(!tree.has_class(wrapper, "cf-view-1"));
    assert!(!tree.has_class(p, "cf-view-1"));
    Ok(())
}

#[test]
fn test_definition_term_and_descriptions() -> Result<()> {
    let (mut doc, mut engine, _) = setup(
        r#"<div class="mw-body-content"><dl>
<dt id="dt"><span class="cf-tag cf-val-1" id="t">i</span> Term</dt>
<dd id="dd1">First</dd>
<dd id="dd2">Second</dd>
</dl></div>"#,
    )?;
    let t = by_id(&doc, "t")?;
    let expected = vec![by_id(&doc, "dt")?, by_id(&doc, "dd1")?, by_id(&doc, "dd2")?];
    assert_eq!(engine.context(&mut doc, t)?, expected);
    Ok(())
}

#[test]
fn test_column_header_covers_spanned_data_cells() -> Result<()> {
    let (mut doc, mut engine, _) = setup(
        r#"<div class="mw-body-content"><table>
<tr><th id="h" scope="col" colspan="2"><span class="cf-tag cf-val-1" id="t">i</span> Stats</th><th>Notes</th></tr>
<tr><td id="a1">1</td><td id="a2">2</td><td>n</td></tr>
<tr><td id="b1">3</td><td id="b2">4</td><td>n</td></tr>
<tr><td id="c1">5</td><td id="c2">6</td><td>n</td></tr>
</table></div>"#,
    )?;
    let t = by_id(&doc, "t")?;
    let context = engine.context(&mut doc, t)?;

    let mut expected = Vec::new();
    for id in ["a1", "a2", "b1", "b2", "c1", "c2"] {
        expected.push(by_id(&doc, id)?);
    }
    assert_eq!(context, expected);
    assert!(!context.contains(&by_id(&doc, "h")?));
    Ok(())
}

#[test]
fn test_sibling_contexts_fold_into_list() -> Result<()> {
    let (mut doc, mut engine, _) = setup(
        r#"<div class="mw-body-content"><ul id="u"><li id="a"><span class="cf-tag cf-val-2">i</span> a</li><li id="b"><span class="cf-tag cf-val-2">i</span> b</li></ul><p>Other content.</p></div>"#,
    )?;
    let (a, b) = (by_id(&doc, "a")?, by_id(&doc, "b")?);
    let tags = engine.tags(&doc, by_id(&doc, "u")?);
    assert_eq!(engine.context(&mut doc, tags[0])?, vec![a]);
    assert_eq!(engine.context(&mut doc, tags[1])?, vec![b]);

    let fragments = engine.compute_view(&mut doc, 0)?;
    assert_eq!(fragments, vec![by_id(&doc, "u")?]);
    let tree = doc.tree();
    assert!(!tree.has_class(a, "cf-view-0"));
    assert!(!tree.has_class(b, "cf-view-0"));
    Ok(())
}

#[test]
fn test_nested_container_reports_parent() -> Result<()> {
    let (mut doc, mut engine, content) = setup(
        r#"<div class="mw-body-content"><p><span class="cf-tag cf-val-1">i</span> Main text.</p></div>"#,
    )?;
    engine.compute_view(&mut doc, 0)?;

    let inserted = HtmlParser::new().append_fragment(
        &mut doc,
        content,
        r#"<div id="preview"><p id="pp"><span class="cf-tag cf-val-2">i</span> Preview text.</p></div>"#,
    )?;
    let preview = inserted[0];
    assert_eq!(preview, by_id(&doc, "preview")?);

    let outcome = engine.register(&mut doc, preview)?;
    assert_eq!(
        outcome,
        Registration::Registered {
            container: preview,
            parent: Some(content)
        }
    );
    assert_eq!(engine.containers(&doc), vec![content]);

    // Views of the parent carry over to the new content
    let tree = doc.tree();
    assert!(tree.has_class(preview, "cf-container-view-0"));
    assert!(tree.has_class(by_id(&doc, "pp")?, "cf-view-0"));
    Ok(())
}

#[test]
fn test_reregistration_starts_without_view_marks() -> Result<()> {
    let (mut doc, mut engine, content) = setup(
        r#"<div class="mw-body-content"><p><span class="cf-tag cf-val-2">i</span> Text.</p><h2>H</h2><ul><li><span class="cf-tag cf-val-1">i</span> Item</li><li>Other</li></ul></div>"#,
    )?;
    let config = engine.config().clone();
    engine.compute_view(&mut doc, 0)?;
    engine.compute_view(&mut doc, 3)?;
    engine.activate_view(&mut doc, Some(0))?;
    assert!(view_marks(&doc, &config, content) > 0);

    assert!(engine.release(&mut doc, content));
    assert_eq!(view_marks(&doc, &config, content), 0);

    assert!(engine.register(&mut doc, content)?.is_registered());
    assert_eq!(view_marks(&doc, &config, content), 0);
    assert!(!engine.compute_view(&mut doc, 0)?.is_empty());
    Ok(())
}

#[test]
fn test_release_covers_nested_containers() -> Result<()> {
    let (mut doc, mut engine, content) = setup(
        r#"<div class="mw-body-content"><p><span class="cf-tag cf-val-1">i</span> Main text.</p></div>"#,
    )?;
    let config = engine.config().clone();
    engine.compute_view(&mut doc, 0)?;
    let preview = HtmlParser::new().append_fragment(
        &mut doc,
        content,
        r#"<div id="preview"><p><span class="cf-tag cf-val-2">i</span> Preview text.</p></div>"#,
    )?[0];
    assert!(engine.register(&mut doc, preview)?.is_registered());

    assert!(engine.release(&mut doc, content));
    assert!(!doc.tree().has_class(preview, &config.container_class));
    assert_eq!(view_marks(&doc, &config, content), 0);

    assert_eq!(
        engine.register(&mut doc, content)?,
        Registration::Registered {
            container: content,
            parent: None
        }
    );
    assert_eq!(engine.containers(&doc), vec![content]);
    assert!(!engine.compute_view(&mut doc, 1)?.is_empty());
    Ok(())
}

#[test]
fn test_stale_marks_in_new_content_are_cleaned() -> Result<()> {
    init_tracing();
    let mut doc = cf_html::parse(
        r#"<div class="mw-body-content cf-container-view-1"><p class="cf-view cf-view-1 keep">x</p><li class="cf-view-marker-1">y</li></div>"#,
    )?;
    let content = doc.get_elements_by_class_name("mw-body-content")[0];
    let mut engine = Engine::new(FilterConfig::default(), PageIdentity::new("Items", "view"));
    let config = engine.config().clone();
    assert!(view_marks(&doc, &config, content) >= 4);

    engine.register(&mut doc, content)?;
    assert_eq!(view_marks(&doc, &config, content), 0);
    assert_eq!(doc.get_elements_by_class_name("keep").len(), 1);
    Ok(())
}

fn view_marks(doc: &Document, config: &FilterConfig, root: NodeId) -> usize {
    let tree = doc.tree();
    std::iter::once(root)
        .chain(tree.descendants(root))
        .filter_map(|n| tree.element(n))
        .map(|e| e.classes.iter().filter(|c| config.is_view_mark(c)).count())
        .sum()
}
