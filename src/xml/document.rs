use crate::xml::errors::XmlError;
use crate::xml::node::{ConfigNode, SourceSpan};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

const DEFAULT_INDENT: &str = "    ";

/// A parsed XML file whose element tree can be mutated and written back.
///
/// Rendering copies the original bytes of every element whose value and
/// children are unchanged, so comments, attributes, entity spelling and
/// whitespace outside the edited nodes survive exactly.
#[derive(Debug, Clone)]
pub struct PomDocument {
    source: String,
    root: ConfigNode,
}

struct Frame {
    name: String,
    start: usize,
    inner_start: usize,
    text: String,
    text_range: Option<(usize, usize)>,
    children: Vec<ConfigNode>,
}

impl PomDocument {
    pub fn parse(source: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(source);
        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<ConfigNode> = None;

        loop {
            let before = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|err| XmlError::Syntax {
                position: reader.buffer_position() as usize,
                message: err.to_string(),
            })?;
            let after = reader.buffer_position() as usize;

            match event {
                Event::Start(tag) => stack.push(Frame {
                    name: element_name(&tag),
                    start: before,
                    inner_start: after,
                    text: String::new(),
                    text_range: None,
                    children: Vec::new(),
                }),
                Event::Empty(tag) => {
                    let span = SourceSpan {
                        start: before,
                        end: after,
                        inner: None,
                        text: None,
                        value: None,
                        child_spans: Vec::new(),
                    };
                    let node = ConfigNode::parsed(element_name(&tag), None, Vec::new(), span);
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let frame = stack.pop().ok_or_else(|| XmlError::Syntax {
                        position: before,
                        message: "closing tag without a matching opening tag".to_string(),
                    })?;
                    let value = if frame.children.is_empty() {
                        let text = frame.text.trim();
                        (!text.is_empty()).then(|| text.to_string())
                    } else {
                        None
                    };
                    let span = SourceSpan {
                        start: frame.start,
                        end: after,
                        inner: Some((frame.inner_start, before)),
                        text: frame.text_range,
                        value: value.clone(),
                        child_spans: frame
                            .children
                            .iter()
                            .filter_map(|child| child.source().map(|s| (s.start, s.end)))
                            .collect(),
                    };
                    let node = ConfigNode::parsed(frame.name, value, frame.children, span);
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    if let Some(frame) = stack.last_mut() {
                        let unescaped = text.unescape().map_err(|err| XmlError::Syntax {
                            position: before,
                            message: err.to_string(),
                        })?;
                        frame.text.push_str(&unescaped);
                        let raw = &source[before..after];
                        if !raw.trim().is_empty() {
                            let first = before + (raw.len() - raw.trim_start().len());
                            let last = after - (raw.len() - raw.trim_end().len());
                            extend_range(&mut frame.text_range, first, last);
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&data));
                        extend_range(&mut frame.text_range, before, after);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(frame) = stack.pop() {
            return Err(XmlError::Unclosed { name: frame.name });
        }

        let root = root.ok_or(XmlError::MissingRoot)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, XmlError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The text this document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ConfigNode {
        &mut self.root
    }

    /// Serialize the current tree, reusing source bytes for untouched nodes.
    pub fn render(&self) -> String {
        let renderer = Renderer::new(&self.source);
        let mut out = String::with_capacity(self.source.len() + 512);

        match self.root.source() {
            Some(span) => {
                out.push_str(&self.source[..span.start]);
                renderer.node(&self.root, "", &mut out);
                out.push_str(&self.source[span.end..]);
            }
            None => renderer.fresh(&self.root, "", &mut out),
        }

        out
    }

    pub fn is_modified(&self) -> bool {
        self.render() != self.source
    }
}

fn element_name(tag: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).into_owned()
}

fn extend_range(range: &mut Option<(usize, usize)>, start: usize, end: usize) {
    *range = match *range {
        Some((first, _)) => Some((first, end)),
        None => Some((start, end)),
    };
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<ConfigNode>,
    node: ConfigNode,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => return Err(XmlError::MultipleRoots),
        None => *root = Some(node),
    }
    Ok(())
}

struct Renderer<'a> {
    source: &'a str,
    unit: String,
    newline: &'static str,
}

impl<'a> Renderer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            unit: detect_indent_unit(source),
            newline: if source.contains("\r\n") { "\r\n" } else { "\n" },
        }
    }

    /// Render `node`, which sits at `indent`.
    fn node(&self, node: &ConfigNode, indent: &str, out: &mut String) {
        let Some(span) = node.source() else {
            self.fresh(node, indent, out);
            return;
        };

        if span.child_spans.is_empty() && node.children().is_empty() {
            self.leaf(node, span, out);
            return;
        }

        let Some((inner_start, inner_end)) = span.inner else {
            // `<name/>` that gained children.
            out.push_str(&open_tag_from_empty(&self.source[span.start..span.end]));
            self.appended(node.children(), &self.child_indent(indent), out);
            out.push_str(self.newline);
            out.push_str(indent);
            push_close_tag(node.name(), out);
            return;
        };

        out.push_str(&self.source[span.start..inner_start]);

        let parsed = span.child_spans.len().min(node.children().len());
        let mut cursor = inner_start;
        let mut last_indent = None;
        for (child, &(start, end)) in node.children().iter().zip(&span.child_spans) {
            out.push_str(&self.source[cursor..start]);
            let child_indent = line_indent(self.source, start)
                .map(str::to_string)
                .unwrap_or_else(|| self.child_indent(indent));
            self.node(child, &child_indent, out);
            last_indent = Some(child_indent);
            cursor = end;
        }

        let appended = &node.children()[parsed..];
        if !appended.is_empty() {
            let child_indent = last_indent.unwrap_or_else(|| self.child_indent(indent));
            if span.child_spans.is_empty() {
                // Text and comments stay ahead of the new children.
                out.push_str(self.source[inner_start..inner_end].trim_end());
                self.appended(appended, &child_indent, out);
                out.push_str(self.newline);
                out.push_str(indent);
                out.push_str(&self.source[inner_end..span.end]);
                return;
            }
            self.appended(appended, &child_indent, out);
        }

        out.push_str(&self.source[cursor..inner_end]);
        out.push_str(&self.source[inner_end..span.end]);
    }

    fn leaf(&self, node: &ConfigNode, span: &SourceSpan, out: &mut String) {
        if node.value() == span.value.as_deref() {
            out.push_str(&self.source[span.start..span.end]);
            return;
        }

        let value = escape(node.value().unwrap_or(""));
        match (span.inner, span.text) {
            // Only the text is replaced; comments around it are kept.
            (Some(_), Some((text_start, text_end))) => {
                out.push_str(&self.source[span.start..text_start]);
                out.push_str(&value);
                out.push_str(&self.source[text_end..span.end]);
            }
            (Some((inner_start, inner_end)), None) => {
                let raw = &self.source[inner_start..inner_end];
                let kept = raw.trim_end();
                out.push_str(&self.source[span.start..inner_start]);
                out.push_str(kept);
                out.push_str(&value);
                if !kept.is_empty() {
                    out.push_str(&raw[kept.len()..]);
                }
                out.push_str(&self.source[inner_end..span.end]);
            }
            (None, _) => {
                out.push_str(&open_tag_from_empty(&self.source[span.start..span.end]));
                out.push_str(&value);
                push_close_tag(node.name(), out);
            }
        }
    }

    fn appended(&self, children: &[ConfigNode], indent: &str, out: &mut String) {
        for child in children {
            out.push_str(self.newline);
            out.push_str(indent);
            self.node(child, indent, out);
        }
    }

    /// Render a node that has no source text, Maven-writer style.
    fn fresh(&self, node: &ConfigNode, indent: &str, out: &mut String) {
        if node.children().is_empty() {
            match node.value() {
                Some(value) => {
                    out.push('<');
                    out.push_str(node.name());
                    out.push('>');
                    out.push_str(&escape(value));
                    push_close_tag(node.name(), out);
                }
                None => {
                    out.push('<');
                    out.push_str(node.name());
                    out.push_str("/>");
                }
            }
            return;
        }

        out.push('<');
        out.push_str(node.name());
        out.push('>');
        self.appended(node.children(), &self.child_indent(indent), out);
        out.push_str(self.newline);
        out.push_str(indent);
        push_close_tag(node.name(), out);
    }

    fn child_indent(&self, indent: &str) -> String {
        format!("{indent}{}", self.unit)
    }
}

fn push_close_tag(name: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// `<name attr="x"/>` -> `<name attr="x">`
fn open_tag_from_empty(tag: &str) -> String {
    let body = tag.trim_end_matches('>').trim_end_matches('/').trim_end();
    format!("{body}>")
}

/// Whitespace between the start of the line and `pos`, if nothing else precedes it.
fn line_indent(source: &str, pos: usize) -> Option<&str> {
    let line_start = source[..pos].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let prefix = &source[line_start..pos];
    prefix
        .chars()
        .all(|ch| ch == ' ' || ch == '\t')
        .then_some(prefix)
        .filter(|prefix| line_start > 0 || !prefix.is_empty())
}

fn detect_indent_unit(source: &str) -> String {
    source
        .lines()
        .find_map(|line| {
            let trimmed = line.trim_start();
            (trimmed.starts_with('<') && trimmed.len() < line.len())
                .then(|| line[..line.len() - trimmed.len()].to_string())
        })
        .unwrap_or_else(|| DEFAULT_INDENT.to_string())
}
