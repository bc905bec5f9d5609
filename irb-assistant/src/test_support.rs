//! Fixtures shared by unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Build a PDF in memory. Each inner slice is one page; each string on a
/// page is written as its own text object.
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let pages = pages
        .iter()
        .map(|fragments| {
            let mut operations = Vec::new();
            for (line, fragment) in fragments.iter().enumerate() {
                let y = 720 - 16 * line as i64;
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![72.into(), y.into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(*fragment)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            operations
        })
        .collect();
    pdf_with_content(pages)
}

/// Build a PDF from raw content operations, one vector per page. Font `F1`
/// is Helvetica with WinAnsiEncoding.
pub fn pdf_with_content(pages: Vec<Vec<Operation>>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A response carrying all three section markers, in order.
pub const THREE_SECTION_RESPONSE: &str = "**Compliant Sections:**\nConsent process matches policy 4.2.\n\n**Potential Concerns:**\nData retention period is not stated.\n\n**Recommendations:**\nAdd a data retention statement.";
