// EPUB source: spine text, navigation outline, fragment resolution

use super::{DocumentSource, OutlineNode, markup_to_text};
use crate::error::{DocketError, Result};
use epub::doc::{EpubDoc, NavPoint};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// An opened EPUB file.
pub struct EpubSource {
    path: PathBuf,
    doc: EpubDoc<BufReader<File>>,
    outline: Vec<OutlineNode>,
}

impl EpubSource {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = EpubDoc::new(path).map_err(|e| DocketError::Epub {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let outline = convert_nav_points(&doc.toc);
        log::debug!(
            "Opened EPUB {} ({} spine items, {} top-level outline entries)",
            path.display(),
            doc.spine.len(),
            outline.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            outline,
        })
    }
}

/// Outline anchors pointing into `file`, in no particular order.
fn anchors_in(outline: &[OutlineNode], file: &str) -> Vec<String> {
    let mut anchors = Vec::new();
    let mut stack: Vec<&OutlineNode> = outline.iter().collect();
    while let Some(node) = stack.pop() {
        if let Some((node_file, fragment)) = node.reference.split_once('#') {
            if node_file == file && !fragment.is_empty() {
                anchors.push(fragment.to_string());
            }
        }
        stack.extend(node.children.iter());
    }
    anchors
}

fn convert_nav_points(points: &[NavPoint]) -> Vec<OutlineNode> {
    build_outline(points, |point| {
        let node = OutlineNode::new(
            point.label.trim(),
            point.content.to_string_lossy().into_owned(),
        );
        (node, point.children.as_slice())
    })
}

/// Convert a nested navigation tree into outline nodes without recursion.
/// `split` turns one point into its node and its children.
fn build_outline<'a, T>(
    roots: &'a [T],
    split: impl Fn(&'a T) -> (OutlineNode, &'a [T]),
) -> Vec<OutlineNode> {
    struct Frame<'a, T> {
        node: Option<OutlineNode>,
        children: &'a [T],
        next: usize,
        built: Vec<OutlineNode>,
    }

    let mut stack = vec![Frame {
        node: None,
        children: roots,
        next: 0,
        built: Vec::new(),
    }];
    while let Some(mut frame) = stack.pop() {
        let children = frame.children;
        if let Some(point) = children.get(frame.next) {
            frame.next += 1;
            let (node, grandchildren) = split(point);
            stack.push(frame);
            stack.push(Frame {
                node: Some(node),
                children: grandchildren,
                next: 0,
                built: Vec::new(),
            });
            continue;
        }
        match (frame.node, stack.last_mut()) {
            (Some(node), Some(parent)) => parent.built.push(node.with_children(frame.built)),
            _ => return frame.built,
        }
    }
    Vec::new()
}

impl DocumentSource for EpubSource {
    fn title(&self) -> Option<String> {
        self.doc.mdata("title").map(|m| m.value.clone())
    }

    fn text(&mut self) -> Result<String> {
        let spine = self.doc.spine.clone();
        let mut parts = Vec::new();

        for spine_item in spine.iter() {
            if let Some((content_bytes, _mime)) = self.doc.get_resource(&spine_item.idref) {
                let html = String::from_utf8_lossy(&content_bytes);
                let plain_text = markup_to_text(&html);
                // Skip empty documents
                if !plain_text.trim().is_empty() {
                    parts.push(plain_text);
                }
            } else {
                log::warn!("Spine item {} has no resource", spine_item.idref);
            }
        }

        if parts.is_empty() {
            return Err(DocketError::NoContent(self.path.display().to_string()));
        }
        Ok(parts.join("\n\n"))
    }

    fn outline(&mut self) -> Vec<OutlineNode> {
        self.outline.clone()
    }

    fn resolve(&mut self, reference: &str) -> Result<String> {
        let (file, fragment) = match reference.split_once('#') {
            Some((file, fragment)) => (file, Some(fragment)),
            None => (reference, None),
        };

        let html = self
            .doc
            .get_resource_str_by_path(file)
            .ok_or_else(|| DocketError::UnresolvedReference(reference.to_string()))?;

        let anchors = anchors_in(&self.outline, file);
        select_fragment(&html, fragment, &anchors)
            .map(str::to_string)
            .ok_or_else(|| DocketError::UnresolvedReference(reference.to_string()))
    }
}

/// Byte offset of the tag carrying `id="<anchor>"`.
fn anchor_position(html: &str, anchor: &str) -> Option<usize> {
    [format!("id=\"{}\"", anchor), format!("id='{}'", anchor)]
        .iter()
        .filter_map(|needle| html.find(needle.as_str()))
        .min()
        .map(|attr| html[..attr].rfind('<').unwrap_or(attr))
}

/// Markup a reference covers. A fragment runs to the next outline anchor;
/// a whole file stops at its first outline anchor, so content a nested entry
/// claims is not read twice.
fn select_fragment<'a>(html: &'a str, fragment: Option<&str>, anchors: &[String]) -> Option<&'a str> {
    match fragment.filter(|f| !f.is_empty()) {
        Some(fragment) => {
            let others: Vec<String> = anchors.iter().filter(|a| *a != fragment).cloned().collect();
            narrow_to_fragment(html, fragment, &others)
        }
        None => {
            let end = anchors
                .iter()
                .filter_map(|a| anchor_position(html, a))
                .min()
                .unwrap_or(html.len());
            Some(&html[..end])
        }
    }
}

/// Markup from the `fragment` anchor up to the next of `others` after it.
fn narrow_to_fragment<'a>(html: &'a str, fragment: &str, others: &[String]) -> Option<&'a str> {
    let start = anchor_position(html, fragment)?;
    let end = others
        .iter()
        .filter_map(|a| anchor_position(html, a))
        .filter(|pos| *pos > start)
        .min()
        .unwrap_or(html.len());
    Some(&html[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><body>
<h2 id="one">Chapter 1</h2><p>First text.</p>
<h2 id='two'>Chapter 2</h2><p>Second text.</p>
<h2 id="three">Chapter 3</h2><p>Third text.</p>
</body></html>"#;

    #[test]
    fn test_narrow_to_fragment() {
        let others = vec!["two".to_string(), "three".to_string()];
        let first = narrow_to_fragment(HTML, "one", &others).unwrap();
        assert!(first.starts_with("<h2 id=\"one\">"));
        assert!(first.contains("First text."));
        assert!(!first.contains("Second text."));

        let second = narrow_to_fragment(HTML, "two", &["one".to_string(), "three".to_string()]).unwrap();
        assert!(second.contains("Second text."));
        assert!(!second.contains("Third text."));
    }

    #[test]
    fn test_last_fragment_runs_to_end() {
        let others = vec!["one".to_string(), "two".to_string()];
        let last = narrow_to_fragment(HTML, "three", &others).unwrap();
        assert!(last.contains("Third text."));
        assert!(last.ends_with("</html>"));
    }

    #[test]
    fn test_missing_fragment() {
        assert!(narrow_to_fragment(HTML, "four", &[]).is_none());
    }

    #[test]
    fn test_nested_fragment_not_read_twice() {
        let html = r#"<html><body>
<h1>Chapter 2</h1><p>Opening lines of the chapter.</p>
<h2 id="scene">A Scene</h2><p>The scene itself.</p>
</body></html>"#;
        let outline = vec![
            OutlineNode::new("Chapter 2", "ch2.xhtml")
                .with_children(vec![OutlineNode::new("A Scene", "ch2.xhtml#scene")]),
            OutlineNode::new("Chapter 3", "ch3.xhtml#top"),
        ];
        let anchors = anchors_in(&outline, "ch2.xhtml");
        assert_eq!(anchors, vec!["scene".to_string()]);

        let parent = select_fragment(html, None, &anchors).unwrap();
        assert!(parent.contains("Opening lines"));
        assert!(!parent.contains("The scene itself."));

        let child = select_fragment(html, Some("scene"), &anchors).unwrap();
        assert!(child.contains("The scene itself."));
        assert!(!child.contains("Opening lines"));
    }

    #[test]
    fn test_whole_file_without_anchors() {
        assert_eq!(select_fragment(HTML, None, &[]), Some(HTML));
        assert_eq!(select_fragment(HTML, Some(""), &[]), Some(HTML));
    }

    #[test]
    fn test_build_outline_keeps_shape() {
        let outline = vec![
            OutlineNode::new("Part One", "p1.xhtml").with_children(vec![
                OutlineNode::new("Chapter 1", "c1.xhtml"),
                OutlineNode::new("Chapter 2", "c2.xhtml")
                    .with_children(vec![OutlineNode::new("Scene", "c2.xhtml#s")]),
            ]),
            OutlineNode::new("Part Two", "p2.xhtml"),
        ];
        let rebuilt = build_outline(&outline, |node| {
            (
                OutlineNode::new(&node.title, &node.reference),
                node.children.as_slice(),
            )
        });
        assert_eq!(rebuilt, outline);
    }

    #[test]
    fn test_build_outline_deep_nesting() {
        let mut outline = OutlineNode::new("Level 999", "l999.xhtml");
        for level in (0..999).rev() {
            outline = OutlineNode::new(format!("Level {}", level), format!("l{}.xhtml", level))
                .with_children(vec![outline]);
        }
        let rebuilt = build_outline(std::slice::from_ref(&outline), |node| {
            (
                OutlineNode::new(&node.title, &node.reference),
                node.children.as_slice(),
            )
        });

        let mut depth = 0;
        let mut current = rebuilt.first();
        while let Some(node) = current {
            assert_eq!(node.title, format!("Level {}", depth));
            depth += 1;
            current = node.children.first();
        }
        assert_eq!(depth, 1000);
    }

    #[test]
    fn test_open_invalid_file_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.epub");
        std::fs::write(&path, b"PK not really").unwrap();
        assert!(matches!(
            EpubSource::open(&path),
            Err(DocketError::Epub { .. })
        ));
    }
}
