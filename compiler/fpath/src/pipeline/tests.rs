#![allow(clippy::unwrap_used, clippy::expect_used)]

use fpath_codegen::Stmt;
use pretty_assertions::assert_eq;

use super::*;
use crate::fixtures::{functions, lenient, schema, strict};
use crate::Stage;

fn unit_with(template: &str, config: &CompilerConfig) -> Result<Unit, CompileError> {
    compile_unit(template, "User", "text", "render_test", &schema(), &functions(), config)
}

#[test]
fn test_plain_field() {
    let unit = unit_with("Hi ${name}", &strict()).unwrap();
    assert_eq!(unit.name, "render_test");
    assert_eq!(unit.input, "User");
    assert_eq!(unit.accumulator, "text");
    assert_eq!(unit.temps, vec!["input", "field_0"]);
    assert!(unit.source().contains("let field_0 = input.name;"));
}

#[test]
fn test_parse_error_points_at_template() {
    let err = unit_with("Hi ${name", &strict()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Parse));
    assert_eq!(err.template, "Hi ${name");
    let diagnostic = &err.diagnostics[0];
    assert!(diagnostic.message.contains("unterminated"), "{}", diagnostic.message);
    assert!(diagnostic.span.is_some());
}

#[test]
fn test_unknown_member_strict_and_lenient() {
    let err = unit_with("${nmae}", &strict()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Resolve));
    assert!(err.render().starts_with("error[resolve]: "));

    let unit = unit_with("${nmae}", &lenient()).unwrap();
    let mut missing = Vec::new();
    unit.walk(&mut |stmt| {
        if let Stmt::Missing { name } = stmt {
            missing.push(name.clone());
        }
    });
    assert_eq!(missing, vec!["nmae"]);
}

#[test]
fn test_type_error_stage() {
    let err = unit_with("${name + 1}", &strict()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Type));
}

#[test]
fn test_optimizer_shares_navigation() {
    let template = "${address.city}, ${address.zip}";
    let plain = unit_with(template, &strict().with_optimize(false)).unwrap();
    let compacted = unit_with(template, &strict()).unwrap();
    assert_eq!(plain.loads(), 4);
    assert_eq!(compacted.loads(), 3);
}

#[test]
fn test_depth_limit_reported_as_generate_error() {
    let template = "${address.city} ${address.zip}";
    let err = unit_with(template, &strict().with_max_depth(1)).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Generate));
}

#[test]
fn test_deterministic() {
    let template = "${display()} ${age + 1 ?? 0} ${attrs.plan | nick ?? \"-\"}";
    let a = unit_with(template, &strict()).unwrap();
    let b = unit_with(template, &strict()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.source(), b.source());
}
