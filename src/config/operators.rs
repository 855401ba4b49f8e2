// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Library operators addressable by name from a topology file.
//!
//! | Name | Arguments |
//! |---|---|
//! | `identity`, `dedupe`, `drop_all` | none |
//! | `take`, `drop`, `trailing`, `demultiplex` | integer |
//! | `partition` | `[width, stride]` |
//! | `emit`, `prolog`, `epilog`, `after`, `tag`, `detag` | any value |
//! | `add`, `multiply` | number |
//! | `get` | field name |
//! | `equals`, `not_equals` | any value |
//! | `sum`, `count` | none |

use crate::errors::ConfigError;
use crate::operators;
use crate::reducing::Transducer;
use crate::value::Value;
use serde_json::Value as JsonValue;

struct Args<'a> {
    node: &'a str,
    op: &'a str,
    raw: &'a JsonValue,
}

impl Args<'_> {
    fn invalid(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidArguments {
            node: self.node.to_string(),
            op: self.op.to_string(),
            reason: reason.into(),
        }
    }

    fn int(&self) -> Result<i64, ConfigError> {
        self.raw
            .as_i64()
            .ok_or_else(|| self.invalid("expects an integer argument"))
    }

    fn count(&self) -> Result<usize, ConfigError> {
        usize::try_from(self.int()?).map_err(|_| self.invalid("expects a non-negative integer"))
    }

    fn number(&self) -> Result<f64, ConfigError> {
        self.raw
            .as_f64()
            .ok_or_else(|| self.invalid("expects a numeric argument"))
    }

    fn text(&self) -> Result<String, ConfigError> {
        self.raw
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid("expects a string argument"))
    }

    fn pair(&self) -> Result<(i64, i64), ConfigError> {
        match self.raw.as_array().map(Vec::as_slice) {
            Some([a, b]) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => Ok((a, b)),
                _ => Err(self.invalid("expects two integers")),
            },
            _ => Err(self.invalid("expects a [width, stride] pair")),
        }
    }

    fn value(&self) -> Value {
        Value::from(self.raw.clone())
    }
}

fn arithmetic(v: &Value, operand: f64, apply: fn(f64, f64) -> f64) -> Value {
    match v {
        Value::Int(i) if operand.fract() == 0.0 => {
            let result = apply(*i as f64, operand);
            Value::Int(result as i64)
        }
        other => match other.as_f64() {
            Some(f) => Value::Float(apply(f, operand)),
            None => Value::Null,
        },
    }
}

/// Build the operator `op` for node `node` from its JSON arguments.
pub fn build_operator(node: &str, op: &str, args: &JsonValue) -> Result<Transducer, ConfigError> {
    let args = Args {
        node,
        op,
        raw: args,
    };

    let xf = match op {
        "identity" => Transducer::identity(),
        "dedupe" => operators::dedupe(),
        "drop_all" => operators::drop_all(),
        "take" => operators::take(args.int()?),
        "drop" => operators::drop(args.int()?),
        "trailing" => operators::trailing(args.int()?),
        "demultiplex" => operators::demultiplex(args.count()?),
        "partition" => {
            let (width, stride) = args.pair()?;
            operators::partition(width, stride)
        }
        "emit" => operators::emit(args.value()),
        "prolog" => operators::prolog(args.value()),
        "epilog" => operators::epilog(args.value()),
        "after" => operators::after(args.value()),
        "tag" => operators::tag(args.value()),
        "detag" => operators::detag(args.value()),
        "add" => {
            let operand = args.number()?;
            operators::map(move |v| arithmetic(&v, operand, |a, b| a + b))
        }
        "multiply" => {
            let operand = args.number()?;
            operators::map(move |v| arithmetic(&v, operand, |a, b| a * b))
        }
        "get" => {
            let field = args.text()?;
            operators::map(move |v| v.get(&field).cloned().unwrap_or_default())
        }
        "equals" => {
            let expected = args.value();
            operators::filter(move |v| *v == expected)
        }
        "not_equals" => {
            let expected = args.value();
            operators::filter(move |v| *v != expected)
        }
        "sum" => operators::reductions(
            |total, v| arithmetic(total, v.as_f64().unwrap_or(0.0), |a, b| a + b),
            Value::Int(0),
        ),
        "count" => operators::reductions(
            |total, _| Value::Int(total.as_i64().unwrap_or(0) + 1),
            Value::Int(0),
        ),
        _ => {
            return Err(ConfigError::UnknownOperator {
                node: node.to_string(),
                op: op.to_string(),
            })
        }
    };
    Ok(xf)
}
