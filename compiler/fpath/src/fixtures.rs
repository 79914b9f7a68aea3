//! Records and registries shared by the driver's unit tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use fpath_ir::{
    describe_record, FunctionProvider, FunctionRegistry, Record, SchemaRegistry, ShapeBuilder,
    StdFunctions,
};
use fpath_lower::ResolutionPolicy;

use crate::CompilerConfig;

pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

pub struct User {
    pub id: i64,
    pub name: String,
    pub nick: Option<String>,
    pub age: Option<i32>,
    pub address: Option<Address>,
    pub attrs: BTreeMap<String, String>,
    pub joined: DateTime<Utc>,
}

impl User {
    fn display(&self) -> String {
        format!("{} <{}>", self.name, self.id)
    }
}

impl Record for Address {
    const NAME: &'static str = "Address";

    fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self> {
        shape.field_ref("city", |a: &Address| &a.city).field_ref("zip", |a: &Address| &a.zip)
    }
}

impl Record for User {
    const NAME: &'static str = "User";

    fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self> {
        shape
            .field("id", |u: &User| u.id)
            .field_ref("name", |u: &User| &u.name)
            .field_ref("nick", |u: &User| &u.nick)
            .field("age", |u: &User| u.age)
            .field_ref("address", |u: &User| &u.address)
            .field_ref("attrs", |u: &User| &u.attrs)
            .field("joined", |u: &User| u.joined)
            .method("display", User::display)
    }
}

describe_record!(Address, User);

pub fn user() -> User {
    User {
        id: 7,
        name: "Ada".to_owned(),
        nick: None,
        age: Some(36),
        address: Some(Address { city: "London".to_owned(), zip: None }),
        attrs: BTreeMap::from([("plan".to_owned(), "pro".to_owned())]),
        joined: Utc.timestamp_millis_opt(1_000).single().unwrap_or_default(),
    }
}

pub fn schema() -> SchemaRegistry {
    let mut schema = SchemaRegistry::new();
    if let Err(err) = schema.register::<User>().and_then(|s| s.register::<Address>()) {
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

pub fn strict() -> CompilerConfig {
    CompilerConfig::new(ResolutionPolicy::Strict)
}

pub fn lenient() -> CompilerConfig {
    CompilerConfig::new(ResolutionPolicy::Lenient)
}
