// ABOUTME: Integration tests for template document parsing
// ABOUTME: Tests document loading, block list extraction and directive validation

use replacement::parser::{
    Accumulate, Block, Directive, Input, InputKind, ParserError, Source, TemplateDocument, Yield,
};

mod common;
use common::{TemplateBuilder, TestEnvironment};

#[test]
fn test_load_document_from_file() {
    let env = TestEnvironment::new();
    let path = env.write_template(
        "sub/template.yaml",
        &TemplateBuilder::new()
            .text("hello")
            .text_file("data.txt")
            .block("{meta: dict, input: {a: 1}}"),
    );

    let document = TemplateDocument::from_file(&path).unwrap();

    assert_eq!(document.len(), 3);
    assert_eq!(document.path.as_deref(), Some(path.as_path()));
    assert_eq!(document.base_dir(), Some(env.path().join("sub").as_path()));
}

#[test]
fn test_missing_file() {
    let error = TemplateDocument::from_file("/nonexistent/template.yaml").unwrap_err();
    assert!(matches!(error, ParserError::IoError { .. }));
    assert!(error.to_string().contains("/nonexistent/template.yaml"));
}

#[test]
fn test_missing_block_list() {
    let error = TemplateDocument::from_yaml("other:\n  - {text: text, input: x}\n").unwrap_err();
    assert!(matches!(error, ParserError::NoReplacementKey { ref key } if key == "replacement"));

    let error = TemplateDocument::from_yaml("just text").unwrap_err();
    assert!(matches!(error, ParserError::NoReplacementKey { .. }));
}

#[test]
fn test_block_list_forms() {
    assert!(TemplateDocument::from_yaml("replacement:\n").unwrap().is_empty());
    assert_eq!(
        TemplateDocument::from_yaml("- {text: text, input: x}\n").unwrap().len(),
        1
    );
    assert!(matches!(
        TemplateDocument::from_yaml("replacement: nope").unwrap_err(),
        ParserError::InvalidBlock(_)
    ));
    assert!(matches!(
        TemplateDocument::from_yaml("replacement: [unclosed").unwrap_err(),
        ParserError::YamlError(_)
    ));
}

#[test]
fn test_check_reports_block_index() {
    let document = TemplateDocument::from_yaml(
        r#"
replacement:
  - {text: text, input: fine}
  - {text: text, meta: dict, input: {a: 1}}
"#,
    )
    .unwrap();

    let error = document.check().unwrap_err();
    let message = error.to_string();
    assert!(message.contains("block 1"), "{}", message);
    assert!(message.contains("text: text"), "{}", message);
    assert!(message.contains("meta: dict"), "{}", message);
}

#[test]
fn test_check_parses_every_block() {
    let document = TemplateDocument::from_yaml(
        r#"
replacement:
  - text: text
    input: hello
  - dict: file
    key: body
    input: body.txt
  - meta: func
    prep: format
    input: "{module}.build"
    args: {count: 2}
  - text: dict
    input:
      - {text: text, input: nested}
"#,
    )
    .unwrap();

    let blocks = document.check().unwrap();

    assert_eq!(blocks.len(), 4);
    assert_eq!(blocks[1].key.as_deref(), Some("body"));
    assert_eq!(blocks[2].directive.source, Source::Func);
    assert_eq!(blocks[2].args.len(), 1);
    assert_eq!(
        blocks[3].directive,
        Directive {
            yield_kind: Yield::Text,
            source: Source::Nested(Accumulate::Data),
        }
    );
}

#[test]
fn test_source_depends_on_input_shape() {
    let block = Block::from_value(&serde_yaml::from_str("{dict: exec, input: [a]}").unwrap());
    assert!(matches!(
        block.unwrap_err(),
        ParserError::NoValidDirective { valid: 0, .. }
    ));

    let block = Block::from_value(&serde_yaml::from_str("{dict: text, input: {a: 1}}").unwrap())
        .unwrap();
    assert_eq!(block.input.kind(), InputKind::Data);
    assert!(matches!(block.input, Input::Data(_)));

    let block = Block::from_value(&serde_yaml::from_str("{text: text, input: 12}").unwrap())
        .unwrap();
    assert!(matches!(block.input, Input::Scalar(ref text) if text == "12"));
}

#[test]
fn test_missing_input() {
    let block = Block::from_value(&serde_yaml::from_str("{text: text}").unwrap());
    assert!(matches!(block.unwrap_err(), ParserError::MissingInput));
}
