//! Minimal PDF builder for integration tests.
//!
//! Produces classic-xref files from explicit object bodies, plus helpers
//! for incremental updates and xref-stream files. Offsets are computed
//! while writing, so the generated files are well-formed enough for the
//! reader under test without depending on any external fixture.

// not every test binary exercises every helper
#![allow(dead_code)]

use std::collections::BTreeMap;

/// A classic-xref PDF under construction.
pub struct PdfFile {
    objects: Vec<(u32, Vec<u8>)>,
    trailer_extra: String,
}

impl PdfFile {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            trailer_extra: String::new(),
        }
    }

    /// Add an object body (the part between `N 0 obj` and `endobj`).
    pub fn add(&mut self, num: u32, body: impl Into<Vec<u8>>) -> &mut Self {
        self.objects.push((num, body.into()));
        self
    }

    /// Extra trailer entries, e.g. `" /Info 9 0 R"`.
    pub fn trailer_extra(&mut self, extra: &str) -> &mut Self {
        self.trailer_extra.push_str(extra);
        self
    }

    /// Serialize with a classic xref table and a `/Root 1 0 R` trailer.
    pub fn build(&self) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets: BTreeMap<u32, usize> = BTreeMap::new();

        for (num, body) in &self.objects {
            offsets.insert(*num, out.len());
            out.extend(format!("{} 0 obj\n", num).into_bytes());
            out.extend(body);
            out.extend(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let max = offsets.keys().max().copied().unwrap_or(0);
        out.extend(format!("xref\n0 {}\n", max + 1).into_bytes());
        out.extend(b"0000000000 65535 f \n");
        for num in 1..=max {
            match offsets.get(&num) {
                Some(off) => out.extend(format!("{:010} 00000 n \n", off).into_bytes()),
                None => out.extend(b"0000000000 65535 f \n"),
            }
        }
        out.extend(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R{} >>\nstartxref\n{}\n%%EOF",
                max + 1,
                self.trailer_extra,
                xref_offset
            )
            .into_bytes(),
        );
        out
    }
}

/// Wrap content-stream text in a stream object body with correct `/Length`.
pub fn stream_body(content: &str) -> Vec<u8> {
    format!(
        "<< /Length {} >>\nstream\n{}\nendstream",
        content.len(),
        content
    )
    .into_bytes()
}

/// One-font single-or-multi-page document; `pages[i]` is that page's
/// content stream.
pub fn simple_pdf(pages: &[&str]) -> Vec<u8> {
    let mut file = PdfFile::new();
    let n = pages.len() as u32;

    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    file.add(1, "<< /Type /Catalog /Pages 2 0 R >>");
    file.add(
        2,
        format!("<< /Type /Pages /Kids [ {} ] /Count {} >>", kids.join(" "), n),
    );

    for (i, content) in pages.iter().enumerate() {
        let page_num = 3 + 2 * i as u32;
        let content_num = page_num + 1;
        file.add(
            page_num,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
                3 + 2 * n,
                content_num
            ),
        );
        file.add(content_num, stream_body(content));
    }

    file.add(
        3 + 2 * n,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    file.build()
}

/// Append an incremental update section redefining `objects`.
pub fn append_update(mut base: Vec<u8>, objects: &[(u32, &[u8])], size: u32) -> Vec<u8> {
    let prev = previous_startxref(&base);
    base.push(b'\n');

    let mut offsets = Vec::new();
    for (num, body) in objects {
        offsets.push((*num, base.len()));
        base.extend(format!("{} 0 obj\n", num).into_bytes());
        base.extend(*body);
        base.extend(b"\nendobj\n");
    }

    let xref_offset = base.len();
    base.extend(b"xref\n");
    for (num, offset) in &offsets {
        base.extend(format!("{} 1\n{:010} 00000 n \n", num, offset).into_bytes());
    }
    base.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Prev {} >>\nstartxref\n{}\n%%EOF",
            size, prev, xref_offset
        )
        .into_bytes(),
    );
    base
}

fn previous_startxref(data: &[u8]) -> usize {
    let keyword = b"startxref";
    let pos = data
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .expect("base file has startxref");
    let rest = &data[pos + keyword.len()..];
    let digits: Vec<u8> = rest
        .iter()
        .copied()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .collect();
    String::from_utf8(digits).unwrap().parse().unwrap()
}

/// Build a PDF 1.5 file addressed by an xref stream.
///
/// `objects` are written at file level; `compressed` lists
/// `(obj_num, container, index)` entries addressed through object streams
/// (the container must be one of `objects`).
pub fn xref_stream_pdf(objects: &[(u32, Vec<u8>)], compressed: &[(u32, u32, u16)]) -> Vec<u8> {
    let mut out = b"%PDF-1.5\n".to_vec();
    let mut offsets: BTreeMap<u32, usize> = BTreeMap::new();

    for (num, body) in objects {
        offsets.insert(*num, out.len());
        out.extend(format!("{} 0 obj\n", num).into_bytes());
        out.extend(body);
        out.extend(b"\nendobj\n");
    }

    let xs_num = objects
        .iter()
        .map(|(n, _)| *n)
        .chain(compressed.iter().map(|(n, _, _)| *n))
        .max()
        .unwrap_or(0)
        + 1;
    let xs_offset = out.len();
    let size = xs_num + 1;

    // W [1 2 1] rows for every object number 0..size
    let mut payload = Vec::new();
    for num in 0..size {
        if num == 0 {
            payload.extend([0u8, 0, 0, 255]);
        } else if num == xs_num {
            payload.extend([1u8]);
            payload.extend((xs_offset as u16).to_be_bytes());
            payload.push(0);
        } else if let Some(off) = offsets.get(&num) {
            payload.extend([1u8]);
            payload.extend((*off as u16).to_be_bytes());
            payload.push(0);
        } else if let Some((_, container, index)) =
            compressed.iter().find(|(n, _, _)| *n == num)
        {
            payload.extend([2u8]);
            payload.extend((*container as u16).to_be_bytes());
            payload.push(*index as u8);
        } else {
            payload.extend([0u8, 0, 0, 255]);
        }
    }

    out.extend(format!("{} 0 obj\n", xs_num).into_bytes());
    out.extend(
        format!(
            "<< /Type /XRef /Size {} /W [1 2 1] /Root 1 0 R /Length {} >>\nstream\n",
            size,
            payload.len()
        )
        .into_bytes(),
    );
    out.extend(&payload);
    out.extend(b"\nendstream\nendobj\n");
    out.extend(format!("startxref\n{}\n%%EOF", xs_offset).into_bytes());
    out
}

/// One-page tagged document whose two marked paragraphs are painted in
/// reverse visual order: MCID 0 shows "SecondPart" low on the page, MCID 1
/// shows "FirstPart" above it. `order` gives the structure tree's child
/// order by MCID, so `&[1, 0]` makes logical order disagree with paint
/// order.
pub fn tagged_pdf(order: &[i32]) -> Vec<u8> {
    let content = "/P << /MCID 0 >> BDC BT /F1 12 Tf 100 600 Td (SecondPart) Tj ET EMC \
                   /P << /MCID 1 >> BDC BT /F1 12 Tf 100 700 Td (FirstPart) Tj ET EMC";

    let kid_refs: Vec<String> = (0..order.len()).map(|i| format!("{} 0 R", 8 + i)).collect();

    let mut file = PdfFile::new();
    file.add(
        1,
        "<< /Type /Catalog /Pages 2 0 R /StructTreeRoot 6 0 R /MarkInfo << /Marked true >> >>",
    );
    file.add(2, "<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>");
    file.add(
        3,
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R /StructParents 0 >>",
    );
    file.add(4, stream_body(content));
    file.add(5, "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>");
    file.add(6, "<< /Type /StructTreeRoot /K 7 0 R >>");
    file.add(
        7,
        format!("<< /Type /StructElem /S /Document /K [ {} ] >>", kid_refs.join(" ")),
    );
    for (i, mcid) in order.iter().enumerate() {
        file.add(
            (8 + i) as u32,
            format!("<< /Type /StructElem /S /P /Pg 3 0 R /K {} >>", mcid),
        );
    }
    file.build()
}

/// Body of an object stream holding the given `(num, serialized)` objects.
pub fn objstm_body(entries: &[(u32, &str)]) -> Vec<u8> {
    let mut pairs = String::new();
    let mut bodies = String::new();
    for (num, body) in entries {
        if !bodies.is_empty() {
            bodies.push(' ');
        }
        pairs.push_str(&format!("{} {} ", num, bodies.len()));
        bodies.push_str(body);
    }
    let first = pairs.len();
    let payload = format!("{}{}", pairs, bodies);
    format!(
        "<< /Type /ObjStm /N {} /First {} /Length {} >>\nstream\n{}\nendstream",
        entries.len(),
        first,
        payload.len(),
        payload
    )
    .into_bytes()
}
