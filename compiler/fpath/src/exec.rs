//! Program execution.
//!
//! Every render gets its own register file; register 0 holds the input
//! record. Values borrow from the input and from the program's constants
//! for the duration of the render only.

use std::any::Any;

use fpath_accum::Accumulator;
use fpath_codegen::EmitCheck;
use fpath_ir::{DefaultValue, MapAccess, MathOp, Number, Ty, Value};
use smallvec::SmallVec;

use crate::link::{Bound, LinkedArg, Op};
use crate::{Params, Program};

type Registers<'a> = SmallVec<[Value<'a>; 16]>;

/// Render `input` into `acc`.
pub(crate) fn run<'a, A: Accumulator>(
    program: &'a Program,
    input: &'a dyn Any,
    params: &Params,
    acc: &mut A,
) {
    let mut regs: Registers<'a> = SmallVec::from_elem(Value::Null, program.registers);
    regs[0] = Value::Object(input);
    let mut exec = Exec { input, params, regs };
    exec.block(&program.body, acc);
}

struct Exec<'a, 'p> {
    input: &'a dyn Any,
    params: &'p Params,
    regs: Registers<'a>,
}

impl<'a> Exec<'a, '_> {
    fn block<A: Accumulator>(&mut self, ops: &'a [Op], acc: &mut A) {
        for op in ops {
            self.op(op, acc);
        }
    }

    fn op<A: Accumulator>(&mut self, op: &'a Op, acc: &mut A) {
        match op {
            Op::Text(text) => acc.accept_str(text),
            Op::Load { dst, src, step } => {
                let value = step_into(&self.regs[*src], step);
                self.regs[*dst] = value;
            }
            Op::Math { dst, src, op, operand, ty } => {
                let value = math(&self.regs[*src], *op, *operand, ty);
                self.regs[*dst] = value;
            }
            Op::Cast { dst, src, to } => {
                let value = cast(&self.regs[*src], to);
                self.regs[*dst] = value;
            }
            Op::Call { dst, function, args } => {
                let args: SmallVec<[Value<'a>; 4]> = args.iter().map(|a| self.arg(a)).collect();
                self.regs[*dst] = function.call(&args);
            }
            Op::IfPresent { value, then, otherwise } => {
                if self.regs[*value].is_null() {
                    self.block(otherwise, acc);
                } else {
                    self.block(then, acc);
                }
            }
            Op::Emit { value, check } => {
                let value = &self.regs[*value];
                match check {
                    EmitCheck::Default(default) if value.is_null() => self.default(default, acc),
                    _ => acc.accept(value),
                }
            }
            Op::EmitDefault(default) => self.default(default, acc),
            Op::Capture { body } => {
                let mut scratch = acc.new_instance();
                self.block(body, &mut scratch);
                acc.accept_acc(&scratch);
            }
            Op::FirstNonEmpty { alternatives, otherwise } => {
                let mut scratch = acc.new_instance();
                for alt in alternatives {
                    scratch.reset();
                    self.block(alt, &mut scratch);
                    if !scratch.is_empty() {
                        acc.accept_acc(&scratch);
                        return;
                    }
                }
                self.block(otherwise, acc);
            }
        }
    }

    fn default<A: Accumulator>(&self, default: &DefaultValue, acc: &mut A) {
        match default {
            DefaultValue::Const(c) => acc.accept(&c.to_value()),
            DefaultValue::Param(name) => {
                if let Some(value) = self.params.get(name) {
                    acc.accept(&value);
                }
            }
        }
    }

    fn arg(&self, arg: &'a LinkedArg) -> Value<'a> {
        match arg {
            LinkedArg::Const(c) => c.to_value(),
            LinkedArg::Null => Value::Null,
            LinkedArg::Path(steps) => {
                let mut value = Value::Object(self.input);
                for step in steps {
                    if value.is_null() {
                        break;
                    }
                    value = step_into(&value, step);
                }
                value
            }
        }
    }
}

fn step_into<'a>(value: &Value<'a>, step: &Bound) -> Value<'a> {
    match (step, value) {
        (Bound::Member(accessor), Value::Object(obj)) => {
            let obj: &'a dyn Any = *obj;
            accessor(obj)
        }
        (Bound::Key(key), Value::Map(map)) => {
            let map: &'a dyn MapAccess = *map;
            map.get(key)
        }
        _ => Value::Null,
    }
}

/// Arithmetic in the promoted type. Integral results wrap; integral
/// division by zero is rejected at compile time and yields null here.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn math(value: &Value<'_>, op: MathOp, operand: Number, ty: &Ty) -> Value<'static> {
    match ty {
        Ty::Int | Ty::Long => {
            let (Some(a), Number::Int(b)) = (value.as_i64(), operand) else {
                return Value::Null;
            };
            if *ty == Ty::Int {
                int_op(a as i32, b as i32, op).map_or(Value::Null, Value::Int)
            } else {
                long_op(a, b, op).map_or(Value::Null, Value::Long)
            }
        }
        Ty::Float | Ty::Double => {
            let Some(a) = value.as_f64() else {
                return Value::Null;
            };
            let b = match operand {
                Number::Int(v) => v as f64,
                Number::Float(v) => v,
            };
            if *ty == Ty::Float {
                Value::Float(float_op(f64::from(a as f32), f64::from(b as f32), op) as f32)
            } else {
                Value::Double(float_op(a, b, op))
            }
        }
        _ => Value::Null,
    }
}

fn int_op(a: i32, b: i32, op: MathOp) -> Option<i32> {
    match op {
        MathOp::Add => Some(a.wrapping_add(b)),
        MathOp::Sub => Some(a.wrapping_sub(b)),
        MathOp::Mul => Some(a.wrapping_mul(b)),
        MathOp::Div => (b != 0).then(|| a.wrapping_div(b)),
        MathOp::Rem => (b != 0).then(|| a.wrapping_rem(b)),
    }
}

fn long_op(a: i64, b: i64, op: MathOp) -> Option<i64> {
    match op {
        MathOp::Add => Some(a.wrapping_add(b)),
        MathOp::Sub => Some(a.wrapping_sub(b)),
        MathOp::Mul => Some(a.wrapping_mul(b)),
        MathOp::Div => (b != 0).then(|| a.wrapping_div(b)),
        MathOp::Rem => (b != 0).then(|| a.wrapping_rem(b)),
    }
}

fn float_op(a: f64, b: f64, op: MathOp) -> f64 {
    match op {
        MathOp::Add => a + b,
        MathOp::Sub => a - b,
        MathOp::Mul => a * b,
        MathOp::Div => a / b,
        MathOp::Rem => a % b,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn cast<'a>(value: &Value<'a>, to: &Ty) -> Value<'a> {
    if value.is_null() {
        return Value::Null;
    }
    match to {
        Ty::Str => value.to_text().map_or(Value::Null, Value::Str),
        Ty::Long => match value {
            Value::DateTime(dt) => Value::Long(dt.timestamp_millis()),
            Value::Float(_) | Value::Double(_) => {
                value.as_f64().map_or(Value::Null, |v| Value::Long(v as i64))
            }
            _ => value.as_i64().map_or(Value::Null, Value::Long),
        },
        Ty::Byte | Ty::Short | Ty::Int => {
            let v = match value {
                Value::Float(_) | Value::Double(_) => value.as_f64().map(|v| v as i64),
                _ => value.as_i64(),
            };
            match (v, to) {
                (Some(v), Ty::Byte) => Value::Byte(v as i8),
                (Some(v), Ty::Short) => Value::Short(v as i16),
                (Some(v), _) => Value::Int(v as i32),
                (None, _) => Value::Null,
            }
        }
        Ty::Float => value.as_f64().map_or(Value::Null, |v| Value::Float(v as f32)),
        Ty::Double => value.as_f64().map_or(Value::Null, Value::Double),
        // Identity casts.
        _ => value.clone(),
    }
}
