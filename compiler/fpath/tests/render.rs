#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{ada, bare, partial, Order, User};
use fpath::{
    Accumulator, BinaryAccumulator, CompilerConfig, ObjectAccumulator, Params, ResolutionPolicy,
    TextAccumulator, Value, WireValue,
};
use pretty_assertions::assert_eq;

fn text(template: &str, user: &User) -> String {
    common::strict().compile::<User, TextAccumulator>(template).unwrap().render(user)
}

#[test]
fn test_literal_and_field() {
    let world = User { name: "World".to_owned(), ..ada() };
    assert_eq!(text("Hello, ${name}!", &world), "Hello, World!");
    assert_eq!(text("no expressions", &world), "no expressions");
    assert_eq!(text("cost: $$5", &world), "cost: $5");
}

#[test]
fn test_optional_default() {
    let template = "${age ?? 0}";
    let young = User { age: Some(5), ..bare() };
    assert_eq!(text(template, &young), "5");
    assert_eq!(text(template, &bare()), "0");
}

#[test]
fn test_absent_values_render_nothing() {
    assert_eq!(text("[${nick}]", &bare()), "[]");
    assert_eq!(text("[${address.city}]", &bare()), "[]");
    assert_eq!(text("[${attrs.plan}]", &bare()), "[]");
}

#[test]
fn test_scalar_kinds() {
    let user = ada();
    assert_eq!(text("${id} ${active} ${level} ${tier}", &user), "1 true 3 Gold");
    assert_eq!(text("${joined}", &user), "2021-03-04T05:06:07.000Z");
    assert_eq!(text("${tags}", &user), r#"["math","engines"]"#);
    assert_eq!(text("${attrs.plan} ${attrs[\"plan\"]}", &user), "pro pro");
    assert_eq!(text("${display()}", &user), "Ada #1");
}

#[test]
fn test_math_and_cast() {
    let user = ada();
    assert_eq!(text("${age + 1}", &user), "37");
    assert_eq!(text("${age * 2 as long}", &user), "72");
    assert_eq!(text("${id as string}", &user), "1");
    assert_eq!(text("${age + 1 ?? 0}", &bare()), "0");
}

#[test]
fn test_functions() {
    let user = ada();
    assert_eq!(text("${upper(name)} ${lower(name)}", &user), "ADA ada");
    assert_eq!(text("${len(tags)}", &user), "2");
    assert_eq!(text("${concat(name, \"!\")}", &user), "Ada!");
    assert_eq!(text("${upper(address.city)}", &user), "LONDON");
    assert_eq!(text("[${upper(address.city)}]", &bare()), "[]");
}

#[test]
fn test_alternation_takes_first_non_empty() {
    let template = "${nick | address.city | name ?? \"?\"}";
    assert_eq!(text(template, &ada()), "ada");
    assert_eq!(text(template, &partial()), "Paris");
    assert_eq!(text(template, &bare()), "Bob");
    assert_eq!(text("${nick | address.city ?? \"?\"}", &bare()), "?");
}

#[test]
fn test_join() {
    let template = "${address.{city, \" \", zip}}";
    assert_eq!(text(template, &ada()), "London NW1");
    assert_eq!(text(template, &partial()), "Paris ");
    assert_eq!(text(template, &bare()), "");
}

#[test]
fn test_shared_prefix_renders_else_text() {
    let template = "${address.city ?? \"x\"}/${address.zip ?? \"y\"}";
    assert_eq!(text(template, &ada()), "London/NW1");
    assert_eq!(text(template, &partial()), "Paris/y");
    assert_eq!(text(template, &bare()), "x/y");
}

#[test]
fn test_nested_record_input() {
    let compiler = common::strict();
    let renderer = compiler.compile::<Order, TextAccumulator>("${user.id}-${user.name}").unwrap();
    let order = Order { number: 9, user: User { id: 1, name: "a".to_owned(), ..ada() } };
    assert_eq!(renderer.render(&order), "1-a");

    let optimized = compiler.unit::<Order, TextAccumulator>("${user.id}-${user.name}").unwrap();
    let plain = common::compiler(
        CompilerConfig::new(ResolutionPolicy::Strict).with_optimize(false),
    )
    .unit::<Order, TextAccumulator>("${user.id}-${user.name}")
    .unwrap();
    assert_eq!(optimized.loads(), 3);
    assert_eq!(plain.loads(), 4);
}

#[test]
fn test_defaults_across_accumulators() {
    let compiler = common::strict();
    let template = "${age ?? 0}";

    let text = compiler.compile::<User, TextAccumulator>(template).unwrap();
    assert_eq!(text.render(&ada()), "36");
    assert_eq!(text.render(&bare()), "0");

    let object = compiler.compile::<User, ObjectAccumulator>(template).unwrap();
    assert_eq!(object.render(&ada()), Value::Int(36));
    assert_eq!(object.render(&bare()), Value::Int(0));

    let binary = compiler.compile::<User, BinaryAccumulator>(template).unwrap();
    for (user, expected) in [(ada(), 36), (bare(), 0)] {
        let mut acc = BinaryAccumulator::new();
        binary.render_to(&user, &Params::new(), &mut acc);
        acc.add_eol(true);
        let rows = fpath::decode_records(&acc.build()).unwrap();
        assert_eq!(rows, vec![vec![WireValue::Int(expected)]]);
    }
}

#[test]
fn test_object_accumulator_detaches_value() {
    let renderer = common::strict().compile::<User, ObjectAccumulator>("${address.city}").unwrap();
    let value = {
        let user = ada();
        renderer.render(&user)
    };
    assert_eq!(value, Value::Str("London".into()));
    assert_eq!(renderer.render(&bare()), Value::Null);
}

#[test]
fn test_params_supply_defaults() {
    let renderer =
        common::strict().compile::<User, TextAccumulator>("${nick ?? $fallback}").unwrap();
    let params = Params::new().with_text("fallback", "anon");
    assert_eq!(renderer.render_with(&bare(), &params), "anon");
    assert_eq!(renderer.render_with(&ada(), &params), "ada");
    // An unknown parameter renders nothing.
    assert_eq!(renderer.render(&bare()), "");
}

#[test]
fn test_custom_accumulator_factory() {
    let proto = TextAccumulator::new().with_datetime_format("%Y/%m").unwrap();
    let renderer = common::strict()
        .compile_with::<User, TextAccumulator>("${joined}", Arc::new(move || proto.clone()))
        .unwrap();
    assert_eq!(renderer.render(&ada()), "2021/03");
}

#[test]
fn test_render_batch_preserves_order() {
    let renderer =
        common::strict().compile::<User, TextAccumulator>("${name}:${age ?? 0}").unwrap();
    let users: Vec<User> = (0..64)
        .map(|i| User { name: format!("u{i}"), age: (i % 2 == 0).then_some(i), ..bare() })
        .collect();
    let rendered = renderer.render_batch(&users, &Params::new());
    let expected: Vec<String> = (0..64)
        .map(|i| format!("u{i}:{}", if i % 2 == 0 { i } else { 0 }))
        .collect();
    assert_eq!(rendered, expected);
}

#[test]
fn test_optimizer_does_not_change_output() {
    let corpus = [
        "Hello, ${name}!",
        "${address.city}, ${address.zip}",
        "${address.city ?? \"x\"}/${address.zip ?? \"y\"}/${address.city ?? \"z\"}",
        "${age + 1 ?? 0} ${age + 2 ?? 0} ${age + 2 ?? 0}",
        "${attrs.plan}${attrs.plan}${attrs.region}",
        "${nick | name} ${nick | name}",
        "${address.{city, \"-\", zip}} ${address.city}",
        "${upper(name)} ${name} ${len(tags)}",
        "${tags} ${joined} ${tier} ${active}",
    ];
    let optimized = common::strict();
    let plain =
        common::compiler(CompilerConfig::new(ResolutionPolicy::Strict).with_optimize(false));

    for template in corpus {
        let a = optimized.compile::<User, TextAccumulator>(template).unwrap();
        let b = plain.compile::<User, TextAccumulator>(template).unwrap();
        for user in [ada(), bare(), partial()] {
            assert_eq!(a.render(&user), b.render(&user), "template {template:?}");
        }
    }
}

#[test]
fn test_renders_are_deterministic() {
    let renderer = common::strict()
        .compile::<User, TextAccumulator>("${display()} ${tags} ${nick | name}")
        .unwrap();
    let first = renderer.render(&ada());
    for _ in 0..10 {
        assert_eq!(renderer.render(&ada()), first);
    }
}
