//! Records, registries and compilers shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use fpath::{
    describe_enum, describe_record, Compiler, CompilerConfig, FunctionProvider, FunctionRegistry,
    Record, ResolutionPolicy, SchemaRegistry, ShapeBuilder, StdFunctions,
};

#[derive(Clone, Copy, Debug)]
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

#[derive(Clone, Debug)]
pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub nick: Option<String>,
    pub age: Option<i32>,
    pub address: Option<Address>,
    pub tags: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub joined: DateTime<Utc>,
    pub active: bool,
    pub level: i8,
    pub tier: Tier,
}

impl User {
    fn display(&self) -> String {
        format!("{} #{}", self.name, self.id)
    }
}

pub struct Order {
    pub number: i32,
    pub user: User,
}

/// Implements `Record` but is never registered.
pub struct Stranger;

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
            .field_ref("tags", |u: &User| &u.tags)
            .field_ref("attrs", |u: &User| &u.attrs)
            .field("joined", |u: &User| u.joined)
            .field("active", |u: &User| u.active)
            .field("level", |u: &User| u.level)
            .field_ref("tier", |u: &User| &u.tier)
            .method("display", User::display)
    }
}

impl Record for Order {
    const NAME: &'static str = "Order";

    fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self> {
        shape.field("number", |o: &Order| o.number).field_ref("user", |o: &Order| &o.user)
    }
}

impl Record for Stranger {
    const NAME: &'static str = "Stranger";

    fn describe(shape: ShapeBuilder<Self>) -> ShapeBuilder<Self> {
        shape
    }
}

describe_record!(Address, User, Order);

pub fn joined() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()
}

/// A fully populated user.
pub fn ada() -> User {
    User {
        id: 1,
        name: "Ada".to_owned(),
        nick: Some("ada".to_owned()),
        age: Some(36),
        address: Some(Address { city: "London".to_owned(), zip: Some("NW1".to_owned()) }),
        tags: vec!["math".to_owned(), "engines".to_owned()],
        attrs: BTreeMap::from([("plan".to_owned(), "pro".to_owned())]),
        joined: joined(),
        active: true,
        level: 3,
        tier: Tier::Gold,
    }
}

/// A user with every optional member absent.
pub fn bare() -> User {
    User {
        id: 2,
        name: "Bob".to_owned(),
        nick: None,
        age: None,
        address: None,
        tags: Vec::new(),
        attrs: BTreeMap::new(),
        joined: joined(),
        active: false,
        level: 0,
        tier: Tier::Basic,
    }
}

/// Address present, zip absent.
pub fn partial() -> User {
    User {
        id: 3,
        name: "Cy".to_owned(),
        nick: None,
        age: Some(5),
        address: Some(Address { city: "Paris".to_owned(), zip: None }),
        tags: vec!["x".to_owned()],
        attrs: BTreeMap::from([("region".to_owned(), "eu".to_owned())]),
        joined: joined(),
        active: true,
        level: -1,
        tier: Tier::Basic,
    }
}

pub fn schema() -> SchemaRegistry {
    let mut schema = SchemaRegistry::new();
    schema
        .register::<User>()
        .and_then(|s| s.register::<Address>())
        .and_then(|s| s.register::<Order>())
        .unwrap();
    schema
}

pub fn functions() -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    StdFunctions.provide(&mut functions).unwrap();
    functions
}

pub fn compiler(config: CompilerConfig) -> Compiler {
    Compiler::new(schema(), functions(), config).unwrap()
}

pub fn strict() -> Compiler {
    compiler(CompilerConfig::new(ResolutionPolicy::Strict))
}

pub fn lenient() -> Compiler {
    compiler(CompilerConfig::new(ResolutionPolicy::Lenient))
}
