#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

type FixtureResult<T> = Result<T, Box<dyn std::error::Error>>;

const LINE_HEIGHT: i64 = 14;
const TOP_MARGIN: i64 = 800;
const LEFT_MARGIN: i64 = 30;

/// Minimal text-only statement PDF, one Courier line per entry.
#[derive(Debug, Default)]
pub struct StatementPdf {
    pages: Vec<Vec<String>>,
    omit_font_subtype: bool,
}

impl StatementPdf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves `Subtype` out of the font dictionary, which pdf-extract cannot handle.
    pub fn without_font_subtype(mut self) -> Self {
        self.omit_font_subtype = true;
        self
    }

    pub fn page<S: AsRef<str>>(mut self, lines: &[S]) -> Self {
        self.pages
            .push(lines.iter().map(|line| line.as_ref().to_owned()).collect());
        self
    }

    fn page_content(lines: &[String]) -> FixtureResult<Vec<u8>> {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 9.into()]),
            Operation::new("Td", vec![LEFT_MARGIN.into(), TOP_MARGIN.into()]),
        ];
        for (row, line) in lines.iter().enumerate() {
            if row > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-LINE_HEIGHT).into()]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.as_str())],
            ));
        }
        operations.push(Operation::new("ET", vec![]));
        Ok(Content { operations }.encode()?)
    }

    pub fn to_bytes(&self) -> FixtureResult<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let tree_id = doc.new_object_id();
        let mut font = dictionary! {
            "Type" => "Font",
            "BaseFont" => "Courier",
        };
        if !self.omit_font_subtype {
            font.set("Subtype", "Type1");
        }
        let courier = doc.add_object(font);

        let mut kids: Vec<ObjectId> = Vec::with_capacity(self.pages.len());
        for lines in &self.pages {
            let stream = Stream::new(dictionary! {}, Self::page_content(lines)?);
            let contents = doc.add_object(stream);
            kids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => tree_id,
                "Contents" => contents,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => courier } },
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }));
        }

        let count = i64::try_from(kids.len())?;
        doc.objects.insert(
            tree_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
                "Count" => count,
            }),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => tree_id });
        doc.trailer.set("Root", catalog);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn write_to(&self, path: &Path) -> FixtureResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// Builds a PDF with one page per entry; each string is one line.
pub fn statement_pdf_bytes(pages: &[Vec<&str>]) -> FixtureResult<Vec<u8>> {
    pages
        .iter()
        .fold(StatementPdf::new(), |pdf, lines| pdf.page(lines))
        .to_bytes()
}

pub fn write_statement_pdf(path: &Path, pages: &[Vec<&str>]) -> FixtureResult<()> {
    pages
        .iter()
        .fold(StatementPdf::new(), |pdf, lines| pdf.page(lines))
        .write_to(path)
}

/// Seven metadata lines, the table header, then `body`.
pub fn statement_lines<'a>(arn: &'a str, header: &'a str, body: &[&'a str]) -> Vec<&'a str> {
    let mut lines = vec![
        "Account  ACC-001",
        arn,
        "DATE  2024-01-31",
        "Branch  Central",
        "Currency  USD",
        "Period  January",
        "Product  Savings",
        header,
    ];
    lines.extend_from_slice(body);
    lines
}
