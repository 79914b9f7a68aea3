//! Compiled renderers and render parameters.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use fpath_accum::Accumulator;
use fpath_ir::{Record, Value};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::exec;
use crate::Program;

/// Supplies the value of a `$name` default at render time.
pub type ParamFn = Arc<dyn Fn() -> Value<'static> + Send + Sync>;

/// Parameter table for `$name` defaults. A name with no entry renders
/// nothing.
#[derive(Clone, Default)]
pub struct Params {
    values: FxHashMap<String, ParamFn>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<F>(mut self, name: &str, supplier: F) -> Self
    where
        F: Fn() -> Value<'static> + Send + Sync + 'static,
    {
        self.insert(name, supplier);
        self
    }

    /// Parameter with a fixed text value.
    #[must_use]
    pub fn with_text(self, name: &str, text: impl Into<String>) -> Self {
        let text: String = text.into();
        self.with(name, move || Value::Str(text.clone().into()))
    }

    pub fn insert<F>(&mut self, name: &str, supplier: F)
    where
        F: Fn() -> Value<'static> + Send + Sync + 'static,
    {
        self.values.insert(name.to_owned(), Arc::new(supplier));
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<Value<'static>> {
        self.values.get(name).map(|supplier| supplier())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Params").field("names", &names).finish()
    }
}

/// Makes the accumulator each render starts from.
pub type AccumulatorFactory<A> = Arc<dyn Fn() -> A + Send + Sync>;

/// A compiled template for input `T` and accumulator `A`.
///
/// Cheap to clone and safe to share between threads. Every render creates
/// its own accumulator through the factory, so renders never share state.
pub struct Renderer<T, A> {
    program: Arc<Program>,
    factory: AccumulatorFactory<A>,
    _marker: PhantomData<fn(&T)>,
}

impl<T, A> Clone for Renderer<T, A> {
    fn clone(&self) -> Self {
        Renderer {
            program: Arc::clone(&self.program),
            factory: Arc::clone(&self.factory),
            _marker: PhantomData,
        }
    }
}

impl<T, A> fmt::Debug for Renderer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Renderer").field(&self.program).finish()
    }
}

impl<T: Record, A: Accumulator> Renderer<T, A> {
    pub(crate) fn new(program: Arc<Program>, factory: AccumulatorFactory<A>) -> Self {
        Renderer { program, factory, _marker: PhantomData }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Whether both handles run the same linked program.
    pub fn same_program(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.program, &other.program)
    }

    pub fn render(&self, input: &T) -> A::Output {
        self.render_with(input, &Params::default())
    }

    pub fn render_with(&self, input: &T, params: &Params) -> A::Output {
        let mut acc = (self.factory)();
        self.render_to(input, params, &mut acc);
        acc.build()
    }

    /// Append the rendering of `input` to `acc`.
    pub fn render_to(&self, input: &T, params: &Params, acc: &mut A) {
        let input: &dyn Any = input;
        exec::run(&self.program, input, params, acc);
    }

    /// Render every input in parallel, one accumulator each, preserving
    /// order.
    pub fn render_batch(&self, inputs: &[T], params: &Params) -> Vec<A::Output>
    where
        A::Output: Send,
    {
        inputs.par_iter().map(|input| self.render_with(input, params)).collect()
    }
}
