//! The text-extraction state machine.
//!
//! One interpreter executes a page's operator stream; the three output
//! modes (stream text, positioned spans, per-MCID buckets) share the state
//! machine and differ only in their [`TextSink`] handlers.
//!
//! State tracked per frame: CTM, text and line matrices, selected font and
//! size, leading, spacings, and the marked-content stack. `Do`-triggered
//! Form XObject recursion is depth-limited.

use crate::content::operators::{Operator, TextElement};
use crate::content::parser::parse_content_stream;
use crate::document::Document;
use crate::error::{ErrorKind, Result};
use crate::fonts::FontEncoding;
use crate::object::{Dict, Object};
use std::collections::HashMap;
use std::sync::Arc;

/// Form XObject recursion cap.
const MAX_FORM_DEPTH: u32 = 10;

/// Fraction of the font size a baseline shift must exceed to count as a
/// line break.
const LINE_BREAK_FACTOR: f64 = 0.7;

/// TJ adjustment below which a space is injected (stream/structured modes).
const TJ_SPACE_THRESHOLD: f64 = -100.0;

/// TJ adjustment below which the current span is flushed (bounds mode).
const TJ_FLUSH_THRESHOLD: f64 = -150.0;

/// Average glyph advance as a fraction of the font size. Glyph metrics are
/// not consulted on the text path; this approximation sizes span boxes.
const GLYPH_ADVANCE_EM: f64 = 0.5;

/// Per-span buffer cap in structured mode.
const MCID_BUFFER_CAP: usize = 4096;

/// 2D affine transform stored as the six PDF matrix numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// a b c d e f
    pub m: [f64; 6],
}

impl Matrix {
    /// Identity matrix.
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    /// Construct from the six coefficients.
    pub fn new(m: [f64; 6]) -> Self {
        Self { m }
    }

    /// Translation matrix.
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, tx, ty],
        }
    }

    /// `self x other` (apply self first, then other).
    pub fn concat(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.m;
        let [a2, b2, c2, d2, e2, f2] = other.m;
        Matrix {
            m: [
                a1 * a2 + b1 * c2,
                a1 * b2 + b1 * d2,
                c1 * a2 + d1 * c2,
                c1 * b2 + d1 * d2,
                e1 * a2 + f1 * c2 + e2,
                e1 * b2 + f1 * d2 + f2,
            ],
        }
    }

    /// Transform a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.m;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Translation components.
    pub fn origin(&self) -> (f64, f64) {
        (self.m[4], self.m[5])
    }
}

/// A positioned run of text (bounds mode output).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// `[x0, y0, x1, y1]` in user space, origin lower-left
    pub bbox: [f64; 4],
    /// Decoded UTF-8 text
    pub text: String,
    /// Font size at emission time
    pub font_size: f64,
}

/// Context handed to sink callbacks at each emission point.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext {
    /// Pen x in user space
    pub x: f64,
    /// Pen y in user space
    pub y: f64,
    /// Width of the run being emitted, user-space units
    pub advance: f64,
    /// Active font size
    pub font_size: f64,
    /// Innermost non-sentinel MCID, or -1
    pub mcid: i32,
}

/// Output handlers; one implementation per extraction mode.
pub trait TextSink {
    /// A decoded text run at the given position.
    fn show_text(&mut self, text: &str, ctx: &EmitContext);
    /// A line break detected by the positioning predicate.
    fn newline(&mut self, ctx: &EmitContext);
    /// A numeric `TJ` adjustment (raw thousandths value).
    fn tj_adjustment(&mut self, amount: f64, ctx: &EmitContext);
    /// Positioning discontinuity or `ET`; bounds mode closes its span here.
    fn flush(&mut self, _ctx: &EmitContext) {}
}

/// Stream mode: decoded text straight into one growing string.
#[derive(Debug, Default)]
pub struct StreamTextSink {
    out: String,
}

impl StreamTextSink {
    /// New empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the sink, returning accumulated text.
    pub fn finish(self) -> String {
        self.out
    }
}

impl TextSink for StreamTextSink {
    fn show_text(&mut self, text: &str, _ctx: &EmitContext) {
        self.out.push_str(text);
    }

    fn newline(&mut self, _ctx: &EmitContext) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn tj_adjustment(&mut self, amount: f64, _ctx: &EmitContext) {
        if amount < TJ_SPACE_THRESHOLD && !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
            self.out.push(' ');
        }
    }
}

/// Bounds mode: accumulate positioned spans.
#[derive(Debug, Default)]
pub struct BoundsSink {
    spans: Vec<TextSpan>,
    current: Option<SpanBuilder>,
}

#[derive(Debug)]
struct SpanBuilder {
    x0: f64,
    y0: f64,
    x1: f64,
    font_size: f64,
    text: String,
}

impl BoundsSink {
    /// New empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close any open span and return the collected spans.
    pub fn finish(mut self) -> Vec<TextSpan> {
        self.close_current();
        self.spans
    }

    fn close_current(&mut self) {
        if let Some(b) = self.current.take() {
            if !b.text.trim().is_empty() {
                self.spans.push(TextSpan {
                    bbox: [b.x0, b.y0, b.x1, b.y0 + b.font_size],
                    text: b.text,
                    font_size: b.font_size,
                });
            }
        }
    }
}

impl TextSink for BoundsSink {
    fn show_text(&mut self, text: &str, ctx: &EmitContext) {
        // a jump of more than a glyph width starts a new span
        if let Some(b) = &self.current {
            let gap = (ctx.x - b.x1).abs();
            let y_shift = (ctx.y - b.y0).abs();
            if gap > ctx.font_size * GLYPH_ADVANCE_EM || y_shift > 0.01 {
                self.close_current();
            }
        }

        let b = self.current.get_or_insert_with(|| SpanBuilder {
            x0: ctx.x,
            y0: ctx.y,
            x1: ctx.x,
            font_size: ctx.font_size,
            text: String::new(),
        });
        b.text.push_str(text);
        b.x1 = ctx.x + ctx.advance;
    }

    fn newline(&mut self, _ctx: &EmitContext) {
        self.close_current();
    }

    fn tj_adjustment(&mut self, amount: f64, _ctx: &EmitContext) {
        if amount < TJ_FLUSH_THRESHOLD {
            self.close_current();
        }
    }

    fn flush(&mut self, _ctx: &EmitContext) {
        self.close_current();
    }
}

/// Structured mode: text routed to per-MCID buffers.
#[derive(Debug, Default)]
pub struct StructuredSink {
    buffers: HashMap<i32, String>,
}

impl StructuredSink {
    /// New empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-MCID text buckets.
    pub fn finish(self) -> HashMap<i32, String> {
        self.buffers
    }

    fn push(&mut self, mcid: i32, s: &str) {
        let buf = self.buffers.entry(mcid).or_default();
        // fixed-size bucket; overflow truncates silently
        let room = MCID_BUFFER_CAP.saturating_sub(buf.len());
        if room >= s.len() {
            buf.push_str(s);
        } else {
            let mut end = room;
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            buf.push_str(&s[..end]);
        }
    }
}

impl TextSink for StructuredSink {
    fn show_text(&mut self, text: &str, ctx: &EmitContext) {
        self.push(ctx.mcid, text);
    }

    fn newline(&mut self, ctx: &EmitContext) {
        let ends_break = self
            .buffers
            .get(&ctx.mcid)
            .map(|b| b.is_empty() || b.ends_with(['\n', ' ']))
            .unwrap_or(true);
        if !ends_break {
            self.push(ctx.mcid, "\n");
        }
    }

    fn tj_adjustment(&mut self, amount: f64, ctx: &EmitContext) {
        if amount < TJ_SPACE_THRESHOLD {
            let ends_break = self
                .buffers
                .get(&ctx.mcid)
                .map(|b| b.is_empty() || b.ends_with(['\n', ' ']))
                .unwrap_or(true);
            if !ends_break {
                self.push(ctx.mcid, " ");
            }
        }
    }
}

#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    tm: Matrix,
    tlm: Matrix,
    font: Option<Arc<FontEncoding>>,
    font_size: f64,
    last_text_font_size: f64,
    leading: f64,
    char_space: f64,
    word_space: f64,
    h_scale: f64,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            tm: Matrix::identity(),
            tlm: Matrix::identity(),
            font: None,
            font_size: 0.0,
            last_text_font_size: 0.0,
            leading: 0.0,
            char_space: 0.0,
            word_space: 0.0,
            h_scale: 100.0,
        }
    }

    fn wmode(&self) -> u8 {
        self.font.as_ref().map(|f| f.wmode()).unwrap_or(0)
    }
}

/// Executes content streams against a sink.
pub struct Interpreter {
    page_index: usize,
    state: TextState,
    gs_stack: Vec<TextState>,
    // (tag, mcid); -1 is the no-MCID sentinel
    mc_stack: Vec<(String, i32)>,
    // text-space position of the last shown text, for the Tm predicate
    last_show_pos: Option<(f64, f64)>,
    baseline_set: bool,
}

impl Interpreter {
    /// New interpreter for one page.
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            state: TextState::new(),
            gs_stack: Vec::new(),
            mc_stack: Vec::new(),
            last_show_pos: None,
            baseline_set: false,
        }
    }

    /// Execute a page's content stream.
    pub fn run(
        &mut self,
        doc: &mut Document,
        content: &[u8],
        resources: &Dict,
        sink: &mut dyn TextSink,
    ) -> Result<()> {
        self.execute(doc, content, resources, sink, 0)
    }

    fn execute(
        &mut self,
        doc: &mut Document,
        content: &[u8],
        resources: &Dict,
        sink: &mut dyn TextSink,
        depth: u32,
    ) -> Result<()> {
        let operators = parse_content_stream(content)?;

        for op in operators {
            match op {
                Operator::BeginText => {
                    self.state.tm = Matrix::identity();
                    self.state.tlm = Matrix::identity();
                },
                Operator::EndText => {
                    sink.flush(&self.ctx(0.0));
                },

                Operator::SetFont { name, size } => {
                    self.state.font = Some(doc.font_encoding(self.page_index, &name, resources));
                    self.state.font_size = size;
                },
                Operator::SetLeading(l) => self.state.leading = l,
                Operator::SetCharSpacing(v) => self.state.char_space = v,
                Operator::SetWordSpacing(v) => self.state.word_space = v,
                Operator::SetHorizontalScale(v) => self.state.h_scale = v,
                Operator::SetRise(_) => {},

                Operator::MoveText { tx, ty } => self.move_text(tx, ty, sink),
                Operator::MoveTextSetLeading { tx, ty } => {
                    self.state.leading = -ty;
                    self.move_text(tx, ty, sink);
                },
                Operator::SetTextMatrix { matrix } => {
                    let new = Matrix::new(matrix);
                    if let Some((px, py)) = self.last_show_pos {
                        let (nx, ny) = new.origin();
                        let displacement = if self.state.wmode() == 0 { ny - py } else { nx - px };
                        self.maybe_newline(displacement, sink);
                    }
                    self.state.tm = new;
                    self.state.tlm = new;
                },
                Operator::NextLine => self.next_line(sink),

                Operator::ShowText(bytes) => self.show(doc, &bytes, sink)?,
                Operator::ShowTextAdjusted(elements) => {
                    for element in elements {
                        match element {
                            TextElement::Text(bytes) => self.show(doc, &bytes, sink)?,
                            TextElement::Offset(n) => {
                                sink.tj_adjustment(n, &self.ctx(0.0));
                                let shift =
                                    -n / 1000.0 * self.state.font_size * (self.state.h_scale / 100.0);
                                self.state.tm = Matrix::translate(shift, 0.0).concat(&self.state.tm);
                            },
                        }
                    }
                },
                Operator::NextLineShowText(bytes) => {
                    self.next_line(sink);
                    self.show(doc, &bytes, sink)?;
                },
                Operator::NextLineShowTextSpaced {
                    word_space,
                    char_space,
                    text,
                } => {
                    self.state.word_space = word_space;
                    self.state.char_space = char_space;
                    self.next_line(sink);
                    self.show(doc, &text, sink)?;
                },

                Operator::Concat { matrix } => {
                    self.state.ctm = Matrix::new(matrix).concat(&self.state.ctm);
                },
                Operator::SaveState => self.gs_stack.push(self.state.clone()),
                Operator::RestoreState => {
                    if let Some(saved) = self.gs_stack.pop() {
                        self.state = saved;
                    }
                },

                Operator::PaintXObject { name } => {
                    self.paint_xobject(doc, &name, resources, sink, depth)?;
                },

                Operator::BeginMarkedContent { tag } => {
                    self.mc_stack.push((tag, -1));
                },
                Operator::BeginMarkedContentProps { tag, properties } => {
                    let mcid = self.mcid_from_properties(doc, &properties, resources);
                    self.mc_stack.push((tag, mcid));
                },
                Operator::EndMarkedContent => {
                    if self.mc_stack.pop().is_none() {
                        log::debug!("EMC with empty marked-content stack");
                    }
                },

                Operator::InlineImage => {},
                Operator::Other { .. } => {},
            }
        }

        Ok(())
    }

    fn ctx(&self, advance: f64) -> EmitContext {
        let device = self.state.tm.concat(&self.state.ctm);
        let (x, y) = device.origin();
        EmitContext {
            x,
            y,
            advance,
            font_size: self.state.font_size,
            mcid: self.current_mcid(),
        }
    }

    fn current_mcid(&self) -> i32 {
        self.mc_stack
            .iter()
            .rev()
            .find(|(_, mcid)| *mcid >= 0)
            .map(|(_, mcid)| *mcid)
            .unwrap_or(-1)
    }

    /// Line-break predicate shared by `Td` and `Tm`.
    ///
    /// The comparison uses the larger of the active size and the size at the
    /// last shown text, so a small superscript shift does not break lines.
    fn maybe_newline(&mut self, displacement: f64, sink: &mut dyn TextSink) {
        if !self.baseline_set {
            return;
        }
        let reference = self.state.font_size.max(self.state.last_text_font_size);
        if displacement.abs() > reference * LINE_BREAK_FACTOR {
            sink.newline(&self.ctx(0.0));
        }
    }

    fn move_text(&mut self, tx: f64, ty: f64, sink: &mut dyn TextSink) {
        let displacement = if self.state.wmode() == 0 { ty } else { tx };
        self.maybe_newline(displacement, sink);
        self.state.tlm = Matrix::translate(tx, ty).concat(&self.state.tlm);
        self.state.tm = self.state.tlm;
    }

    fn next_line(&mut self, sink: &mut dyn TextSink) {
        if self.baseline_set {
            sink.newline(&self.ctx(0.0));
        }
        self.state.tlm = Matrix::translate(0.0, -self.state.leading).concat(&self.state.tlm);
        self.state.tm = self.state.tlm;
    }

    fn show(&mut self, doc: &mut Document, bytes: &[u8], sink: &mut dyn TextSink) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let font = self
            .state
            .font
            .clone()
            .unwrap_or_else(|| Arc::new(FontEncoding::identity()));
        let decoded = font.decode(bytes);
        if decoded.is_empty() && !bytes.is_empty() {
            doc.sink_report(ErrorKind::EncodingError, 0, "show string decoded to nothing")?;
        }

        let glyphs = font.glyph_count(bytes.len());
        let spaces = bytes.iter().filter(|&&b| b == b' ').count();
        let scale = self.state.h_scale / 100.0;
        let advance = (glyphs as f64 * self.state.font_size * GLYPH_ADVANCE_EM
            + glyphs as f64 * self.state.char_space
            + if font.is_cid() { 0.0 } else { spaces as f64 * self.state.word_space })
            * scale;

        sink.show_text(&decoded, &self.ctx(advance));

        self.state.tm = Matrix::translate(advance, 0.0).concat(&self.state.tm);
        self.state.last_text_font_size = self.state.font_size;
        self.last_show_pos = Some(self.state.tm.origin());
        self.baseline_set = true;
        Ok(())
    }

    fn mcid_from_properties(
        &self,
        doc: &mut Document,
        properties: &Object,
        resources: &Dict,
    ) -> i32 {
        let dict = match properties {
            Object::Dictionary(d) => Some(d.clone()),
            Object::Name(prop_name) => {
                // named property list in /Properties
                resources
                    .get("Properties")
                    .and_then(|p| doc.resolve(p).ok())
                    .and_then(|p| p.as_dict().cloned())
                    .and_then(|props| props.get(prop_name).cloned())
                    .and_then(|entry| doc.resolve(&entry).ok())
                    .and_then(|entry| entry.as_dict().cloned())
            },
            _ => None,
        };

        dict.and_then(|d| d.get("MCID").and_then(|o| o.as_integer()))
            .map(|n| n as i32)
            .unwrap_or(-1)
    }

    fn paint_xobject(
        &mut self,
        doc: &mut Document,
        name: &str,
        resources: &Dict,
        sink: &mut dyn TextSink,
        depth: u32,
    ) -> Result<()> {
        if depth >= MAX_FORM_DEPTH {
            log::warn!("form XObject nesting exceeds {}, skipping /{}", MAX_FORM_DEPTH, name);
            return Ok(());
        }

        let Some(xobjects) = resources.get("XObject") else {
            return Ok(());
        };
        let xobjects = doc.resolve(xobjects)?;
        let Some(entry) = xobjects.as_dict().and_then(|d| d.get(name)).cloned() else {
            return Ok(());
        };
        let xobject = doc.resolve(&entry)?;

        let Some(dict) = xobject.as_dict() else {
            return Ok(());
        };
        if dict.get("Subtype").and_then(|o| o.as_name()) != Some("Form") {
            return Ok(());
        }

        let data = match xobject.decode_stream_data() {
            Ok(data) => data,
            Err(e) => {
                doc.sink_report(
                    ErrorKind::InvalidStream,
                    0,
                    format!("form XObject /{} undecodable: {}", name, e),
                )?;
                return Ok(());
            },
        };

        // the form's own resources, else the caller's
        let form_resources = match dict.get("Resources") {
            Some(r) => doc
                .resolve(r)?
                .as_dict()
                .cloned()
                .unwrap_or_else(|| resources.clone()),
            None => resources.clone(),
        };

        // per-frame state: matrices, font, and the marked-content depth
        let saved_state = self.state.clone();
        let saved_mc_len = self.mc_stack.len();
        if let Some(m) = dict.get("Matrix").and_then(|o| o.as_array()) {
            if m.len() == 6 {
                let mut coeff = [0.0; 6];
                for (i, v) in m.iter().enumerate() {
                    coeff[i] = v.as_number().unwrap_or(0.0);
                }
                self.state.ctm = Matrix::new(coeff).concat(&self.state.ctm);
            }
        }

        let result = self.execute(doc, &data, &form_resources, sink, depth + 1);

        self.state = saved_state;
        self.mc_stack.truncate(saved_mc_len);
        result
    }
}
