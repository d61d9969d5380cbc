use super::*;
use crate::document::Table;

fn text(value: &str) -> Paragraph {
    Paragraph::new_text().with_content(vec![Span::new_text(value)])
}

fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(span_text).collect()
}

#[test]
fn imports_headings_and_paragraphs() {
    let document = tdoc::Document::new().with_paragraphs(vec![
        Paragraph::new(ParagraphType::Header2).with_content(vec![Span::new_text("Title")]),
        text("Body"),
    ]);

    let blocks = blocks_from_tdoc(&document);

    assert_eq!(blocks, vec![Block::heading(2, "Title"), Block::paragraph("Body")]);
}

#[test]
fn imports_nested_entries_as_nested_lists() {
    let document = tdoc::Document::new().with_paragraphs(vec![
        Paragraph::new_unordered_list().with_entries(vec![vec![
            text("a"),
            Paragraph::new_ordered_list().with_entries(vec![vec![text("b")]]),
        ]]),
    ]);

    let blocks = blocks_from_tdoc(&document);

    let expected = List::bullet(vec![
        ListItem::new("a").with_nested(List::numbered(vec![ListItem::new("b")])),
    ]);
    assert_eq!(blocks, vec![Block::List(expected)]);
}

#[test]
fn imports_checklists_with_children() {
    let document = tdoc::Document::new().with_paragraphs(vec![
        Paragraph::new_checklist().with_checklist_items(vec![
            ChecklistItem::new(true)
                .with_content(vec![Span::new_text("Parent")])
                .with_children(vec![
                    ChecklistItem::new(false).with_content(vec![Span::new_text("Child")]),
                ]),
        ]),
    ]);

    let blocks = blocks_from_tdoc(&document);

    let expected = List::bullet(vec![
        ListItem::task(true, "Parent")
            .with_nested(List::bullet(vec![ListItem::task(false, "Child")])),
    ]);
    assert_eq!(blocks, vec![Block::List(expected)]);
}

#[test]
fn imports_styles_as_marks() {
    let mut bold = Span::new_text("");
    bold.style = InlineStyle::Bold;
    bold.children = vec![Span::new_text("loud")];
    let mut link = Span::new_text("site");
    link.style = InlineStyle::Link;
    link.link_target = Some("https://example.com".to_string());
    let document = tdoc::Document::new().with_paragraphs(vec![
        Paragraph::new_text().with_content(vec![Span::new_text("a "), bold, link]),
    ]);

    let blocks = blocks_from_tdoc(&document);

    assert_eq!(
        blocks,
        vec![Block::Paragraph(vec![
            Inline::text("a "),
            Inline::mark(MarkStyle::Bold, vec![Inline::text("loud")]),
            Inline::link("https://example.com", vec![Inline::text("site")]),
        ])]
    );
}

#[test]
fn code_block_text_is_split_into_lines() {
    let document = tdoc::Document::new().with_paragraphs(vec![
        Paragraph::new(ParagraphType::CodeBlock).with_content(vec![Span::new_text("x\ny\n")]),
    ]);

    let blocks = blocks_from_tdoc(&document);

    assert_eq!(blocks, vec![Block::code(None, &["x", "y"])]);
}

#[test]
fn quotes_flatten_nested_lists_into_paragraphs() {
    let document = tdoc::Document::new().with_paragraphs(vec![
        Paragraph::new_quote().with_children(vec![
            text("first"),
            Paragraph::new_unordered_list().with_entries(vec![vec![text("second")]]),
        ]),
    ]);

    let blocks = blocks_from_tdoc(&document);

    assert_eq!(blocks, vec![Block::quote(&["first", "second"])]);
}

#[test]
fn mixed_list_exports_runs_separately() {
    let list = List::bullet(vec![
        ListItem::task(false, "todo"),
        ListItem::task(true, "done"),
        ListItem::new("plain"),
    ]);

    let document = tdoc_from_blocks(&[Block::List(list)]);

    assert_eq!(document.paragraphs.len(), 2);
    let Paragraph::Checklist { items } = &document.paragraphs[0] else {
        panic!("expected checklist first");
    };
    assert_eq!(items.len(), 2);
    assert!(!items[0].checked);
    assert!(items[1].checked);
    let Paragraph::UnorderedList { entries } = &document.paragraphs[1] else {
        panic!("expected bullet list second");
    };
    assert_eq!(entries.len(), 1);
}

#[test]
fn heading_levels_beyond_three_export_as_header3() {
    let document = tdoc_from_blocks(&[Block::heading(5, "Deep")]);

    let Paragraph::Header3 { content } = &document.paragraphs[0] else {
        panic!("expected header3");
    };
    assert_eq!(spans_text(content), "Deep");
}

#[test]
fn atomic_blocks_export_as_text() {
    let blocks = vec![
        Block::HorizontalRule,
        Block::Image(Image::new("cat.png", "cat")),
        Block::Table(Table {
            rows: vec![vec!["a".to_string(), "b".to_string()]],
        }),
    ];

    let document = tdoc_from_blocks(&blocks);

    let texts: Vec<String> = document
        .paragraphs
        .iter()
        .map(|paragraph| match paragraph {
            Paragraph::Text { content } => spans_text(content),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(texts, vec!["---", "![cat](cat.png)", "a | b"]);
}

#[test]
fn nested_items_survive_export_and_import() {
    let blocks = vec![Block::List(List::numbered(vec![
        ListItem::new("one").with_nested(List::bullet(vec![ListItem::new("inner")])),
        ListItem::new("two"),
    ]))];

    let back = blocks_from_tdoc(&tdoc_from_blocks(&blocks));

    assert_eq!(back, blocks);
}

#[test]
fn parses_markdown_headings() {
    let blocks = parse_markdown("# Title\n\nHello\n").unwrap();

    assert_eq!(blocks, vec![Block::heading(1, "Title"), Block::paragraph("Hello")]);
}
