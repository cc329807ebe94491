//! Fixture PDFs for tests

use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};

/// Create a valid PDF with N US Letter pages, each showing `"<prefix>-Page-<n>"`
pub fn create_test_pdf(num_pages: u32, content_prefix: &str) -> Vec<u8> {
    build_pdf(num_pages, content_prefix, letter_box())
}

/// Single-page PDF whose page carries the given MediaBox verbatim
pub fn create_test_pdf_with_media_box(media_box: Vec<Object>) -> Vec<u8> {
    build_pdf(1, "Box", media_box)
}

fn letter_box() -> Vec<Object> {
    vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ]
}

fn build_pdf(num_pages: u32, content_prefix: &str, media_box: Vec<Object>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::new();

    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{}-Page-{}", content_prefix, i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("content encodes"),
        ));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", Object::Array(media_box.clone())),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("fixture PDF saves");
    buffer
}
