// src/pipeline/processors/markup.rs

//! `htmlmin` and `svgmin`.
//!
//! HTML goes through `minify-html` (or `lol_html` when only comments are
//! stripped). SVG is streamed through `quick-xml` and re-emitted without
//! its prolog, comments, `<metadata>` and layout whitespace.

use lol_html::{RewriteStrSettings, doc_comments, rewrite_str};
use minify_html::{Cfg, minify};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::errors::TransformError;
use crate::pipeline::asset::{Asset, StepOptions};
use crate::pipeline::registry::Processor;

/// SVG elements whose character data is rendered.
const SVG_TEXT_ELEMENTS: &[&[u8]] = &[
    b"text", b"tspan", b"textPath", b"title", b"desc", b"style", b"script",
];

/// Minify an HTML document.
///
/// `<pre>`, `<textarea>`, `<script>` and `<style>` bodies are left alone.
/// With `collapse_whitespace` off only comments are removed.
pub fn compact_html(
    input: &str,
    remove_comments: bool,
    collapse_whitespace: bool,
) -> Result<String, String> {
    if collapse_whitespace {
        let mut cfg = Cfg::new();
        cfg.keep_comments = !remove_comments;
        cfg.keep_closing_tags = true;
        cfg.keep_html_and_head_opening_tags = true;
        return String::from_utf8(minify(input.as_bytes(), &cfg)).map_err(|e| e.to_string());
    }

    if !remove_comments {
        return Ok(input.to_string());
    }

    rewrite_str(
        input,
        RewriteStrSettings {
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Space {
    /// Whitespace only separates elements.
    Layout,
    /// Rendered text: runs shrink to one space.
    Collapse,
    /// `xml:space="preserve"`.
    Preserve,
}

fn space_for(tag: &BytesStart<'_>, parent: Space) -> Space {
    let preserve = tag
        .attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"xml:space" && a.value.as_ref() == b"preserve");
    if preserve || parent == Space::Preserve {
        Space::Preserve
    } else if parent == Space::Collapse
        || SVG_TEXT_ELEMENTS.contains(&tag.local_name().as_ref())
    {
        Space::Collapse
    } else {
        Space::Layout
    }
}

fn collapse_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// The same tag with single spaces between attributes. `None` keeps the
/// source form (unparsable attributes, or values that need single quotes).
fn compact_tag(tag: &BytesStart<'_>) -> Option<BytesStart<'static>> {
    let attrs = tag.attributes().collect::<Result<Vec<_>, _>>().ok()?;
    if attrs.iter().any(|a| a.value.contains(&b'"')) {
        return None;
    }
    let name = std::str::from_utf8(tag.name().as_ref()).ok()?.to_owned();
    let mut out = BytesStart::new(name);
    for attr in attrs {
        out.push_attribute(attr);
    }
    Some(out)
}

/// Minify an SVG document. Whitespace inside text elements is collapsed,
/// never removed, so rendered words stay apart.
pub fn compact_svg(input: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(input);
    let mut writer = Writer::new(Vec::with_capacity(input.len()));
    let mut spaces: Vec<Space> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            format!("malformed SVG at byte {}: {e}", reader.error_position())
        })?;
        let current = spaces.last().copied().unwrap_or(Space::Layout);

        let written = match event {
            Event::Eof => break,
            Event::Decl(_) | Event::DocType(_) | Event::Comment(_) => Ok(()),
            Event::Start(tag) if tag.local_name().as_ref() == b"metadata" => {
                reader.read_to_end(tag.name()).map_err(|e| e.to_string())?;
                Ok(())
            }
            Event::Empty(tag) if tag.local_name().as_ref() == b"metadata" => Ok(()),
            Event::Start(tag) => {
                spaces.push(space_for(&tag, current));
                match compact_tag(&tag) {
                    Some(compact) => writer.write_event(Event::Start(compact)),
                    None => writer.write_event(Event::Start(tag)),
                }
            }
            Event::Empty(tag) => match compact_tag(&tag) {
                Some(compact) => writer.write_event(Event::Empty(compact)),
                None => writer.write_event(Event::Empty(tag)),
            },
            Event::End(tag) => {
                spaces.pop();
                writer.write_event(Event::End(tag))
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(&text);
                let kept = match current {
                    Space::Preserve => raw.into_owned(),
                    Space::Collapse => collapse_runs(&raw),
                    Space::Layout => collapse_runs(raw.trim()),
                };
                if kept.is_empty() {
                    Ok(())
                } else {
                    writer.write_event(Event::Text(BytesText::from_escaped(kept)))
                }
            }
            other => writer.write_event(other),
        };
        written.map_err(|e| e.to_string())?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

/// `htmlmin`: `remove_comments` and `collapse_whitespace`, both default true.
pub struct HtmlMin;

impl Processor for HtmlMin {
    fn name(&self) -> &'static str {
        "htmlmin"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        let remove_comments = options
            .get_bool("remove_comments")
            .map_err(|e| asset.fail(self.name(), e))?
            .unwrap_or(true);
        let collapse_whitespace = options
            .get_bool("collapse_whitespace")
            .map_err(|e| asset.fail(self.name(), e))?
            .unwrap_or(true);

        let text = asset.text(self.name())?;
        let html = compact_html(&text, remove_comments, collapse_whitespace)
            .map_err(|e| asset.fail(self.name(), e))?;
        asset.contents = html.into_bytes();
        Ok(asset)
    }
}

pub struct SvgMin;

impl Processor for SvgMin {
    fn name(&self) -> &'static str {
        "svgmin"
    }

    fn process(&self, mut asset: Asset, _options: &StepOptions) -> Result<Asset, TransformError> {
        let text = asset.text(self.name())?;
        let svg = compact_svg(&text).map_err(|e| asset.fail(self.name(), e))?;
        asset.contents = svg.into_bytes();
        Ok(asset)
    }
}
