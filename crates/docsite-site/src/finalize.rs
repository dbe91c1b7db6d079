//! Post-processing of a rendered page.
//!
//! Runs over the parsed document in this order:
//! 1. `.md` links are resolved to the matching page's `index.html`.
//! 2. Code blocks get a language class, an id and a copy button.
//! 3. `<h2>` sections of the markdown content are wrapped for scrollspy.
//! 4. Image sources are made relative to the page.

use markup5ever_rcdom::{Handle, RcDom};

use crate::dom;
use crate::node::NodeRef;
use crate::page::PageRef;

/// Class added to links that match no page.
pub const BAD_LINK_CLASS: &str = "moose-bad-link";
/// Id of the element wrapping the converted markdown.
pub const CONTENT_ID: &str = "moose-markdown-content";
/// Class of a `div` that receives the copy button instead of its `pre`.
pub const CODE_DIV_CLASS: &str = "moose-code-div";

/// Finalize the rendered HTML of `page`.
pub(crate) fn finalize(page: PageRef<'_>, html: &str) -> std::io::Result<String> {
    let mut doc = dom::parse(html);

    resolve_links(&doc, page);
    decorate_code_blocks(&mut doc);
    wrap_sections(&mut doc);
    fix_media(&doc, page.node());

    dom::to_html(&doc)
}

fn resolve_links(doc: &RcDom, page: PageRef<'_>) {
    let node = page.node();
    let root = node.root();
    for link in dom::elements(&doc.document, "a") {
        let Some(href) = dom::attr(&link, "href") else {
            continue;
        };
        if is_absolute_url(&href) || !href.ends_with(".md") {
            continue;
        }

        let suffix = href.trim_start_matches("./");
        let found = root.find_by_source_suffix(suffix);
        let Some(target) = found.first() else {
            tracing::error!(
                href,
                source = %page.source().display(),
                "Failed to locate page for markdown link"
            );
            dom::add_class(&link, BAD_LINK_CLASS);
            continue;
        };

        if found.len() > 1 {
            let candidates = found
                .iter()
                .map(|n| n.path().display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::error!(
                href,
                source = %page.source().display(),
                candidates,
                "Found multiple pages matching markdown link, using the first"
            );
        }

        let url = target.url(Some(node));
        tracing::debug!(href, url, "Converting link");
        dom::set_attr(&link, "href", url);
    }
}

fn decorate_code_blocks(doc: &mut RcDom) {
    let mut count = 0usize;
    for pre in dom::elements(&doc.document, "pre") {
        let Some(code) = dom::elements(&pre, "code").into_iter().next() else {
            continue;
        };
        let Some(language) = dom::attr(&code, "class")
            .and_then(|class| class.split_whitespace().next().map(str::to_owned))
        else {
            continue;
        };
        let language = language.strip_prefix("language-").unwrap_or(&language);
        dom::set_attr(&pre, "class", format!("language-{language}"));

        let id = if let Some(id) = dom::attr(&code, "id") {
            id
        } else {
            let id = format!("moose-code-block-{count}");
            count += 1;
            dom::set_attr(&code, "id", id.clone());
            id
        };

        let target = format!("#{id}");
        let button = dom::new_element(
            doc,
            "button",
            &[
                ("class", "moose-copy-button btn"),
                ("data-clipboard-target", target.as_str()),
            ],
        );
        dom::append_text(doc, &button, "copy");

        let container: Handle = dom::parent(&pre)
            .filter(|parent| dom::has_class(parent, CODE_DIV_CLASS))
            .unwrap_or(pre);
        dom::prepend(doc, &container, button);
    }
}

fn wrap_sections(doc: &mut RcDom) {
    let Some(content) = dom::elements(&doc.document, "div")
        .into_iter()
        .find(|div| dom::attr(div, "id").as_deref() == Some(CONTENT_ID))
    else {
        return;
    };

    let children: Vec<Handle> = content.children.borrow().clone();
    let mut section: Option<Handle> = None;
    for child in children {
        if dom::is_element(&child, "h2") {
            let id = dom::attr(&child, "id").unwrap_or_else(|| "#".to_owned());
            let div = dom::new_element(doc, "div", &[("class", "section scrollspy"), ("id", id.as_str())]);
            dom::insert_before(doc, &child, div.clone());
            section = Some(div);
        }
        if let Some(section) = &section {
            dom::append(doc, section, child);
        }
    }
}

fn fix_media(doc: &RcDom, node: NodeRef<'_>) {
    for img in dom::elements(&doc.document, "img") {
        let Some(src) = dom::attr(&img, "src") else {
            continue;
        };
        if is_absolute_url(&src) {
            continue;
        }
        dom::set_attr(&img, "src", node.relpath(&src));
    }
}

/// Whether `url` has a scheme (`https:`, `mailto:`) or starts with `/`.
fn is_absolute_url(url: &str) -> bool {
    if url.starts_with('/') {
        return true;
    }
    url.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::node::{NodeKind, SiteTree, SiteTreeBuilder};
    use crate::page::{PageData, test_settings};

    /// Tree with `index.md`, `systems/Kernels.md`, `a/Dup.md` and `b/Dup.md`.
    fn tree(temp_dir: &TempDir) -> SiteTree {
        let content = temp_dir.path();
        for file in ["index.md", "systems/Kernels.md", "a/Dup.md", "b/Dup.md"] {
            let path = content.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "# Page\n").unwrap();
        }
        let settings = test_settings();
        let page = |p: &str| PageData::new(content.join(p), Arc::clone(&settings)).unwrap();

        let mut builder = SiteTreeBuilder::new("/site", NodeKind::Page(page("index.md")));
        let root = builder.root();
        let systems = builder.add_group(root, "systems").unwrap();
        builder
            .add_page(systems, "Kernels", page("systems/Kernels.md"))
            .unwrap();
        let a = builder.add_group(root, "a").unwrap();
        builder.add_page(a, "Dup", page("a/Dup.md")).unwrap();
        let b = builder.add_group(root, "b").unwrap();
        builder.add_page(b, "Dup", page("b/Dup.md")).unwrap();
        builder.build()
    }

    fn finalize_in(tree: &SiteTree, rel_dir: &str, body: &str) -> String {
        let page = tree
            .pages()
            .into_iter()
            .find(|p| p.node().rel_dir() == rel_dir)
            .unwrap();
        let html = format!("<html><head></head><body>{body}</body></html>");
        finalize(page, &html).unwrap()
    }

    fn body(html: &str) -> &str {
        let start = html.find("<body>").unwrap() + "<body>".len();
        let end = html.find("</body>").unwrap();
        &html[start..end]
    }

    #[test]
    fn test_link_resolved_relative_to_page() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);

        let html = finalize_in(&tree, "a/Dup", r#"<a href="Kernels.md">k</a>"#);

        assert_eq!(
            body(&html),
            r#"<a href="../../systems/Kernels/index.html">k</a>"#
        );
    }

    #[test]
    fn test_link_to_root_page() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);

        let html = finalize_in(&tree, "systems/Kernels", r#"<a href="./index.md">home</a>"#);

        assert_eq!(body(&html), r#"<a href="../../index.html">home</a>"#);
    }

    #[test]
    fn test_unresolved_link_marked() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);

        let html = finalize_in(&tree, "", r#"<a href="Missing.md">m</a>"#);

        assert_eq!(
            body(&html),
            r#"<a href="Missing.md" class="moose-bad-link">m</a>"#
        );
    }

    #[test]
    fn test_ambiguous_link_uses_first_found() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);

        let html = finalize_in(&tree, "", r#"<a href="Dup.md">d</a>"#);

        assert_eq!(body(&html), r#"<a href="a/Dup/index.html">d</a>"#);
    }

    #[test]
    fn test_external_and_non_markdown_links_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);
        let input = r##"<a href="https://example.org/x.md">x</a><a href="#top">t</a><a href="file.pdf">f</a>"##;

        let html = finalize_in(&tree, "", input);

        assert_eq!(body(&html), input);
    }

    #[test]
    fn test_links_with_scheme_or_host_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);
        let input = r#"<a href="mailto:docs@example.md">m</a><a href="ftp://example.org/Kernels.md">f</a><a href="//example.org/Kernels.md">h</a>"#;

        let html = finalize_in(&tree, "", input);

        assert_eq!(body(&html), input);
    }

    #[test]
    fn test_code_block_decoration() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);

        let html = finalize_in(&tree, "", r#"<pre><code class="python">x = 1</code></pre>"#);

        assert_eq!(
            body(&html),
            r##"<pre class="language-python"><button class="moose-copy-button btn" data-clipboard-target="#moose-code-block-0">copy</button><code class="python" id="moose-code-block-0">x = 1</code></pre>"##
        );
    }

    #[test]
    fn test_code_block_language_prefix_not_doubled() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);

        let html = finalize_in(&tree, "", r#"<pre><code class="language-cpp">int x;</code></pre>"#);

        assert!(html.contains(r#"<pre class="language-cpp">"#));
    }

    #[test]
    fn test_code_block_ids_count_only_assigned() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);
        let input = concat!(
            r#"<pre><code class="a">1</code></pre>"#,
            r#"<pre><code class="b" id="mine">2</code></pre>"#,
            r#"<pre><code>plain</code></pre>"#,
            r#"<pre><code class="c">3</code></pre>"#,
        );

        let html = finalize_in(&tree, "", input);

        assert!(html.contains(r#"id="moose-code-block-0">1"#));
        assert!(html.contains(r##"data-clipboard-target="#mine""##));
        assert!(html.contains(r#"id="moose-code-block-1">3"#));
        assert!(html.contains("<pre><code>plain</code></pre>"));
    }

    #[test]
    fn test_copy_button_in_code_div() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);

        let html = finalize_in(
            &tree,
            "",
            r#"<div class="moose-code-div"><pre><code class="cpp">x</code></pre></div>"#,
        );

        assert!(html.contains(
            r##"<div class="moose-code-div"><button class="moose-copy-button btn" data-clipboard-target="#moose-code-block-0">copy</button><pre class="language-cpp">"##
        ));
    }

    #[test]
    fn test_sections_wrap_h2_groups() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);
        let input = concat!(
            r#"<div id="moose-markdown-content">"#,
            "<p>intro</p>",
            r#"<h2 id="one">One</h2><p>a</p><p>b</p>"#,
            "<h2>Two</h2><p>c</p>",
            "</div>",
        );

        let html = finalize_in(&tree, "", input);

        assert_eq!(
            body(&html),
            concat!(
                r#"<div id="moose-markdown-content">"#,
                "<p>intro</p>",
                r#"<div class="section scrollspy" id="one"><h2 id="one">One</h2><p>a</p><p>b</p></div>"#,
                r##"<div class="section scrollspy" id="#"><h2>Two</h2><p>c</p></div>"##,
                "</div>",
            )
        );
    }

    #[test]
    fn test_sections_ignore_h2_outside_content() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);
        let input = "<h2 id=\"x\">X</h2><p>y</p>";

        let html = finalize_in(&tree, "", input);

        assert_eq!(body(&html), input);
    }

    #[test]
    fn test_media_relative_to_page() {
        let temp_dir = TempDir::new().unwrap();
        let tree = tree(&temp_dir);
        let input = concat!(
            r#"<img src="media/plot.png">"#,
            r#"<img src="https://example.org/a.png">"#,
            r#"<img src="/static/b.png">"#,
            r#"<img src="data:image/png;base64,AAAA">"#,
        );

        let html = finalize_in(&tree, "systems/Kernels", input);

        assert_eq!(
            body(&html),
            concat!(
                r#"<img src="../../media/plot.png">"#,
                r#"<img src="https://example.org/a.png">"#,
                r#"<img src="/static/b.png">"#,
                r#"<img src="data:image/png;base64,AAAA">"#,
            )
        );
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://example.org"));
        assert!(is_absolute_url("//cdn.example.org/x.js"));
        assert!(is_absolute_url("/media/x.png"));
        assert!(!is_absolute_url("media/x.png"));
        assert!(!is_absolute_url("../x.png"));
    }
}
