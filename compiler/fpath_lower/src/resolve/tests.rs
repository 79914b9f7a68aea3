#![allow(clippy::unwrap_used, clippy::expect_used)]

use fpath_ir::{Access, Ast, Const, DefaultValue, FnArg, NodeId, NodeKind, Ty};
use fpath_parse::parse;
use pretty_assertions::assert_eq;

use super::*;
use crate::fixtures::{functions, schema};

fn lower(src: &str, policy: ResolutionPolicy) -> Result<Ast, LowerError> {
    let schema = schema();
    let functions = functions();
    let template = parse(src).expect("template should parse");
    Resolver::new(&schema, &functions, policy).resolve(&template, "Customer", "text")
}

fn strict(src: &str) -> Ast {
    lower(src, ResolutionPolicy::Strict).unwrap()
}

fn strict_err(src: &str) -> LowerError {
    lower(src, ResolutionPolicy::Strict).unwrap_err()
}

/// The body of the dump without the root line.
fn body(ast: &Ast) -> String {
    ast.dump().lines().skip(1).map(|l| format!("{}\n", &l[2..])).collect()
}

fn top(ast: &Ast, i: usize) -> NodeId {
    ast[ast.root()].children[i]
}

#[test]
fn test_text_and_field() {
    let ast = strict("Hi ${name}!");
    assert_eq!(
        body(&ast),
        "Literal \"Hi \" : string\nField name : string\n  Print  : string\nLiteral \"!\" : string\n"
    );
}

#[test]
fn test_optional_field_is_guarded_before_math() {
    let ast = strict("${age + 1 ?? 0}");
    assert_eq!(
        body(&ast),
        "Field age : int?\n  OptionalGuard  : int\n    Math + 1 : int\n      Print ?? 0_i32 : int\n   else\n    Default ?? 0_i32 : int\n"
    );
}

#[test]
fn test_optional_terminal_keeps_flag() {
    let ast = strict("${email}");
    let field = top(&ast, 0);
    let print = ast[field].children[0];
    assert!(matches!(ast[print].kind, NodeKind::Print { default: None }));
    assert!(ast[print].ty.is_optional());
    assert_eq!(ast.count("OptionalGuard"), 0);
}

#[test]
fn test_navigation_through_optional_record() {
    let ast = strict("${address.city ?? \"-\"}");
    assert_eq!(
        body(&ast),
        "Field address : Address?\n  OptionalGuard  : Address\n    Field city : string\n      Print ?? \"-\" : string\n   else\n    Default ?? \"-\" : string\n"
    );
}

#[test]
fn test_every_guard_gets_its_own_default() {
    let ast = strict("${address.zip ?? \"none\"}");
    // One guard for `address`; `zip` is terminal and checked by the print.
    assert_eq!(ast.count("OptionalGuard"), 1);
    assert_eq!(ast.count("Default"), 1);

    // A join's guards fall back to the default as text.
    let ast = strict("${address.{city, zip} ?? 0}");
    let guard = ast[top(&ast, 0)].children[0];
    let otherwise = ast[guard].kind.otherwise().unwrap();
    assert_eq!(
        ast[otherwise[0]].kind,
        NodeKind::Default(DefaultValue::Const(Const::Str("0".into())))
    );
}

#[test]
fn test_map_access_is_nullable() {
    let ast = strict("${attrs[\"plan\"]} ${attrs.region}");
    let access = ast[top(&ast, 0)].children[0];
    assert_eq!(ast[access].kind, NodeKind::MapAccess { key: "plan".into() });
    assert!(ast[access].ty.is_nullable());
    assert_eq!(ast.count("MapAccess"), 2);
}

#[test]
fn test_map_value_guarded_before_math() {
    let err = strict_err("${attrs.x + 1}");
    assert!(matches!(err, LowerError::Type(TypeError::NotNumeric { ty: Ty::Str, .. })));
}

#[test]
fn test_method_call() {
    let ast = strict("${greeting()} ${greeting}");
    let call = top(&ast, 0);
    assert!(matches!(ast[call].kind, NodeKind::Method { .. }));
    assert!(matches!(ast[top(&ast, 2)].kind, NodeKind::Method { .. }));
}

#[test]
fn test_field_is_not_a_method() {
    let err = strict_err("${address.city()}");
    assert!(matches!(err, LowerError::Resolve(ResolveError::UnknownMethod { .. })));
}

#[test]
fn test_function_with_path_argument() {
    let ast = strict("${upper(address.city)}");
    let call = top(&ast, 0);
    let NodeKind::Function { name, args } = &ast[call].kind else {
        panic!("expected a function node, got {:?}", ast[call].kind);
    };
    assert_eq!(name, "upper");
    assert_eq!(
        args,
        &vec![FnArg::Path(vec![
            Access::Field { owner: "Customer".into(), name: "address".into() },
            Access::Field { owner: "Address".into(), name: "city".into() },
        ])]
    );
    assert!(ast[call].ty.is_nullable());
}

#[test]
fn test_function_literal_arguments_are_widened() {
    let ast = strict("${concat(name, 7)}");
    let NodeKind::Function { args, .. } = &ast[top(&ast, 0)].kind else {
        panic!("expected a function node");
    };
    assert_eq!(args[1], FnArg::Const(Const::Long(7)));
}

#[test]
fn test_unknown_function_lists_arities() {
    let err = strict_err("${upper(name, name)}");
    let LowerError::Resolve(ResolveError::UnknownFunction { arity, available, .. }) = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(*arity, 2);
    assert_eq!(available, &vec![1]);
    assert!(err.to_string().contains("registered with 1 argument(s)"));
}

#[test]
fn test_function_argument_must_be_plain() {
    let err = strict_err("${upper(age + 1)}");
    assert!(matches!(err, LowerError::Type(TypeError::InvalidArgument { .. })));
}

#[test]
fn test_untyped_function_rejects_record_arguments() {
    let err = strict_err("${coalesce(address, name)}");
    let LowerError::Type(TypeError::NotPrintable { ty, span }) = err else {
        panic!("expected a printability error, got {err:?}");
    };
    assert_eq!(ty, Ty::Object("Address".into()));
    assert_eq!(span, fpath_ir::Span::new(11, 18));

    assert!(lower("${coalesce(attrs, name)}", ResolutionPolicy::Lenient).is_err());
    assert!(lower("${coalesce(email, name)}", ResolutionPolicy::Strict).is_ok());
}

#[test]
fn test_alternation_builds_fallback() {
    let ast = strict("${email | name ?? \"anon\"}");
    let fallback = top(&ast, 0);
    let node = &ast[fallback];
    assert_eq!(node.kind.name(), "OrFallback");
    assert_eq!(node.children.len(), 2);
    for &alt in &node.children {
        assert_eq!(ast[alt].kind, NodeKind::Concatenation);
    }
    let otherwise = node.kind.otherwise().unwrap();
    assert_eq!(otherwise.len(), 1);
    assert_eq!(
        ast[otherwise[0]].kind,
        NodeKind::Default(DefaultValue::Const(Const::Str("anon".into())))
    );
    // Alternatives carry no defaults of their own.
    assert_eq!(ast.count("Default"), 1);
}

#[test]
fn test_alternation_default_checked_against_every_branch() {
    let err = strict_err("${name | age ?? \"x\"}");
    assert!(matches!(err, LowerError::Type(TypeError::IncompatibleDefault { ty: Ty::Int, .. })));
}

#[test]
fn test_join_resolves_items_relative_to_prefix() {
    let ast = strict("${address.{city, \", \", zip}}");
    assert_eq!(
        body(&ast),
        concat!(
            "Field address : Address?\n",
            "  OptionalGuard  : Address\n",
            "    Concatenation  : string\n",
            "      Field city : string\n",
            "        Print  : string\n",
            "      Literal \", \" : string\n",
            "      Field zip : string?\n",
            "        Print  : string?\n",
        )
    );
}

#[test]
fn test_math_promotion() {
    let ast = strict("${visits * 2} ${score / 2} ${visits + 0.5}");
    let ty_of_math = |i: usize| {
        let mut found = None;
        ast.walk(top(&ast, i), &mut |_, n| {
            if let NodeKind::Math { .. } = n.kind {
                found = Some(n.ty.ty.clone());
            }
        });
        found.unwrap()
    };
    assert_eq!(ty_of_math(0), Ty::Int);
    assert_eq!(ty_of_math(2), Ty::Double);
    assert_eq!(ty_of_math(4), Ty::Double);
}

#[test]
fn test_integral_division_by_zero() {
    let err = strict_err("${visits / 0}");
    assert!(matches!(err, LowerError::Type(TypeError::DivisionByZero { .. })));
    // Floating division by zero is allowed.
    strict("${score / 0}");
}

#[test]
fn test_operand_out_of_range() {
    let err = strict_err("${visits + 3000000000}");
    assert!(matches!(err, LowerError::Type(TypeError::OperandOutOfRange { .. })));
}

#[test]
fn test_casts() {
    strict("${score as int} ${visits as string} ${tier as string}");
    let err = strict_err("${name as int}");
    assert!(matches!(
        err,
        LowerError::Type(TypeError::InvalidCast { from: Ty::Str, to: Ty::Int, .. })
    ));
}

#[test]
fn test_record_is_not_printable() {
    let err = strict_err("${address}");
    assert!(matches!(err, LowerError::Type(TypeError::NotPrintable { .. })));
}

#[test]
fn test_default_typing() {
    let ast = strict("${tier ?? \"Basic\"}");
    let print = ast[top(&ast, 0)].children[0];
    assert_eq!(
        ast[print].kind,
        NodeKind::Print { default: Some(DefaultValue::Const(Const::Enum("Basic".into()))) }
    );

    let err = strict_err("${age ?? 1.5}");
    assert!(matches!(err, LowerError::Type(TypeError::IncompatibleDefault { .. })));

    let err = strict_err("${visits ?? 40000}");
    assert!(matches!(err, LowerError::Type(TypeError::IncompatibleDefault { .. })));

    let ast = strict("${email ?? $fallback}");
    let print = ast[top(&ast, 0)].children[0];
    assert_eq!(
        ast[print].kind,
        NodeKind::Print { default: Some(DefaultValue::Param("fallback".into())) }
    );
}

#[test]
fn test_strict_rejects_unknown_member() {
    let err = strict_err("${nmae}");
    assert_eq!(err.to_string(), "`Customer` has no field or method `nmae`");
    assert_eq!(err.span(), fpath_ir::Span::new(2, 6));
}

#[test]
fn test_lenient_replaces_unknown_member() {
    let ast = lower("a${address.street.x ?? \"-\"}b", ResolutionPolicy::Lenient).unwrap();
    assert_eq!(
        body(&ast),
        concat!(
            "Literal \"a\" : string\n",
            "Field address : Address?\n",
            "  OptionalGuard  : Address\n",
            "    NotFound street : unknown (nullable)\n",
            "      Default ?? \"-\" : string\n",
            "   else\n",
            "    Default ?? \"-\" : string\n",
            "Literal \"b\" : string\n",
        )
    );
}

#[test]
fn test_lenient_keeps_default_of_unknown_head() {
    let ast = lower("${nmae ?? 0}", ResolutionPolicy::Lenient).unwrap();
    assert_eq!(body(&ast), "NotFound nmae : unknown (nullable)\n  Default ?? 0_i64 : string\n");
}

#[test]
fn test_lenient_null_function_argument() {
    let ast = lower("${upper(missing)}", ResolutionPolicy::Lenient).unwrap();
    let NodeKind::Function { args, .. } = &ast[top(&ast, 0)].kind else {
        panic!("expected a function node");
    };
    assert_eq!(args, &vec![FnArg::Null]);
}

#[test]
fn test_lenient_still_rejects_type_errors() {
    let err = lower("${name + 1}", ResolutionPolicy::Lenient).unwrap_err();
    assert!(matches!(err, LowerError::Type(_)));
}

#[test]
fn test_unknown_input_type_is_fatal() {
    let schema = schema();
    let functions = functions();
    let template = parse("x").unwrap();
    let err = Resolver::new(&schema, &functions, ResolutionPolicy::Lenient)
        .resolve(&template, "Nope", "text")
        .unwrap_err();
    assert!(matches!(err, LowerError::Resolve(ResolveError::UnknownType { .. })));
}

#[test]
fn test_policy_from_str() {
    assert_eq!("Lenient".parse::<ResolutionPolicy>(), Ok(ResolutionPolicy::Lenient));
    assert_eq!(" strict ".parse::<ResolutionPolicy>(), Ok(ResolutionPolicy::Strict));
    assert!("loose".parse::<ResolutionPolicy>().is_err());
}
