//! Record types shared by the lowering tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use fpath_ir::{
    describe_enum, describe_record, FunctionProvider, FunctionRegistry, Record, SchemaRegistry,
    ShapeBuilder, StdFunctions,
};

pub enum Tier {
    Gold,
    Basic,
}

impl AsRef<str> for Tier {
    fn as_ref(&self) -> &str {
        match self {
            Tier::Gold => "Gold",
            Tier::Basic => "Basic",
        }
    }
}

describe_enum!(Tier);

pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

pub struct Customer {
    pub name: String,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub address: Option<Address>,
    pub tags: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub score: f64,
    pub visits: i16,
    pub tier: Tier,
}

impl Customer {
    fn greeting(&self) -> String {
        format!("Hi {}", self.name)
    }
}

impl Record for Address {
    const NAME: &'static str = "Address";

    fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self> {
        shape.field_ref("city", |a: &Address| &a.city).field_ref("zip", |a: &Address| &a.zip)
    }
}

impl Record for Customer {
    const NAME: &'static str = "Customer";

    fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self> {
        shape
            .field_ref("name", |c: &Customer| &c.name)
            .field_ref("email", |c: &Customer| &c.email)
            .field("age", |c: &Customer| c.age)
            .field_ref("address", |c: &Customer| &c.address)
            .field_ref("tags", |c: &Customer| &c.tags)
            .field_ref("attrs", |c: &Customer| &c.attrs)
            .field("score", |c: &Customer| c.score)
            .field("visits", |c: &Customer| c.visits)
            .field_ref("tier", |c: &Customer| &c.tier)
            .method("greeting", Customer::greeting)
    }
}

describe_record!(Address, Customer);

pub fn schema() -> SchemaRegistry {
    let mut schema = SchemaRegistry::new();
    if let Err(err) = schema.register::<Customer>().and_then(|s| s.register::<Address>()) {
        panic!("fixture schema: {err}");
    }
    schema
}

pub fn functions() -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    if let Err(err) = StdFunctions.provide(&mut functions) {
        panic!("fixture functions: {err}");
    }
    functions
}
