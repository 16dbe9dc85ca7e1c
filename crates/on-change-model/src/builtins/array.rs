//! `Array.prototype` methods.
//!
//! Every method reads and writes its receiver element by element through
//! [`Value`], following the generic array algorithms: a mutator moves
//! elements with index assignments and deletes, then assigns `length`.

use std::cell::RefCell;
use std::cmp::Ordering;

use crate::builtins::{arg, define_method, put, remove};
use crate::equality::{same_value_zero, strict_equals};
use crate::error::ModelError;
use crate::object::{Object, PropertyDescriptor};
use crate::value::Value;

pub(crate) fn install(proto: &Object) {
    define_method(proto, "push", push);
    define_method(proto, "pop", pop);
    define_method(proto, "shift", shift);
    define_method(proto, "unshift", unshift);
    define_method(proto, "splice", splice);
    define_method(proto, "sort", sort);
    define_method(proto, "reverse", reverse);
    define_method(proto, "fill", fill);
    define_method(proto, "forEach", for_each);
    define_method(proto, "map", map);
    define_method(proto, "filter", filter);
    define_method(proto, "reduce", reduce);
    define_method(proto, "slice", slice);
    define_method(proto, "concat", concat);
    define_method(proto, "indexOf", index_of);
    define_method(proto, "includes", includes);
    define_method(proto, "join", |this, args| {
        let sep = match arg(args, 0) {
            Value::Undefined => ",".to_string(),
            other => other.to_display_string()?,
        };
        Ok(Value::from(join_values(this, &sep)?))
    });
    define_method(proto, "constructor", |_, args| Ok(Value::Object(Object::array(args.to_vec()))));
}

/// Resolves a relative index argument against `len`: negative values count
/// from the end, everything is clamped to `0..=len`.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    let n = value.to_integer();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn callback_arg(args: &[Value], method: &str) -> Result<Value, ModelError> {
    let callback = arg(args, 0);
    if !callback.is_callable() {
        return Err(ModelError::NotCallable(format!(
            "{} callback {}",
            method,
            callback.type_name()
        )));
    }
    Ok(callback)
}

/// Moves the element at `from` to `to`, deleting `to` when `from` is a hole.
fn move_element(this: &Value, from: usize, to: usize) -> Result<(), ModelError> {
    if this.has(from)? {
        let value = this.get(from)?;
        put(this, to, value)
    } else {
        remove(this, to)
    }
}

// ------------------------------------------------------------------ Mutators

fn push(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    for (offset, item) in args.iter().enumerate() {
        put(this, len + offset, item.clone())?;
    }
    let new_len = len + args.len();
    put(this, "length", new_len)?;
    Ok(Value::from(new_len))
}

fn pop(this: &Value, _args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    if len == 0 {
        put(this, "length", 0)?;
        return Ok(Value::Undefined);
    }
    let index = len - 1;
    let element = this.get(index)?;
    remove(this, index)?;
    put(this, "length", index)?;
    Ok(element)
}

fn shift(this: &Value, _args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    if len == 0 {
        put(this, "length", 0)?;
        return Ok(Value::Undefined);
    }
    let first = this.get(0)?;
    for k in 1..len {
        move_element(this, k, k - 1)?;
    }
    remove(this, len - 1)?;
    put(this, "length", len - 1)?;
    Ok(first)
}

fn unshift(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    let count = args.len();
    if count > 0 {
        for k in (0..len).rev() {
            move_element(this, k, k + count)?;
        }
        for (index, item) in args.iter().enumerate() {
            put(this, index, item.clone())?;
        }
    }
    put(this, "length", len + count)?;
    Ok(Value::from(len + count))
}

fn splice(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    let start = relative_index(&arg(args, 0), len, 0);
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => (args[1].to_integer().max(0.0) as usize).min(len - start),
    };
    let items = args.get(2..).unwrap_or(&[]);

    let removed = Object::array(Vec::new());
    let removed_value = Value::from(&removed);
    for k in 0..delete_count {
        if this.has(start + k)? {
            let value = this.get(start + k)?;
            removed.ordinary_define_own_property(&k.into(), PropertyDescriptor::plain(value))?;
        }
    }
    put(&removed_value, "length", delete_count)?;

    let item_count = items.len();
    if item_count < delete_count {
        for k in start..len - delete_count {
            move_element(this, k + delete_count, k + item_count)?;
        }
        for k in (len - delete_count + item_count..len).rev() {
            remove(this, k)?;
        }
    } else if item_count > delete_count {
        for k in (start..len - delete_count).rev() {
            move_element(this, k + delete_count, k + item_count)?;
        }
    }
    for (offset, item) in items.iter().enumerate() {
        put(this, start + offset, item.clone())?;
    }
    put(this, "length", len - delete_count + item_count)?;
    Ok(removed_value)
}

/// Stable insertion sort whose comparator may fail.
fn insertion_sort_by<F>(items: &mut [Value], mut compare: F) -> Result<(), ModelError>
where
    F: FnMut(&Value, &Value) -> Result<Ordering, ModelError>,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j])? == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}

fn sort(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let comparator = arg(args, 0);
    if !comparator.is_undefined() && !comparator.is_callable() {
        return Err(ModelError::type_error(
            "the comparison function must be either a function or undefined",
        ));
    }
    let len = this.length()?;
    let mut items = Vec::with_capacity(len);
    let mut undefined_count = 0;
    for k in 0..len {
        if this.has(k)? {
            match this.get(k)? {
                Value::Undefined => undefined_count += 1,
                value => items.push(value),
            }
        }
    }

    if comparator.is_undefined() {
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            keyed.push((item.to_display_string()?, item));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        items = keyed.into_iter().map(|(_, item)| item).collect();
    } else {
        insertion_sort_by(&mut items, |a, b| {
            let n = comparator
                .call(&Value::Undefined, &[a.clone(), b.clone()])?
                .to_number();
            Ok(if n > 0.0 {
                Ordering::Greater
            } else if n < 0.0 {
                Ordering::Less
            } else {
                Ordering::Equal
            })
        })?;
    }

    let present = items.len() + undefined_count;
    for (index, item) in items.into_iter().enumerate() {
        put(this, index, item)?;
    }
    for index in present - undefined_count..present {
        put(this, index, Value::Undefined)?;
    }
    for index in present..len {
        remove(this, index)?;
    }
    Ok(this.clone())
}

fn reverse(this: &Value, _args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    let middle = len / 2;
    for lower in 0..middle {
        let upper = len - lower - 1;
        let lower_exists = this.has(lower)?;
        let upper_exists = this.has(upper)?;
        match (lower_exists, upper_exists) {
            (true, true) => {
                let lower_value = this.get(lower)?;
                let upper_value = this.get(upper)?;
                put(this, lower, upper_value)?;
                put(this, upper, lower_value)?;
            }
            (false, true) => {
                let upper_value = this.get(upper)?;
                put(this, lower, upper_value)?;
                remove(this, upper)?;
            }
            (true, false) => {
                let lower_value = this.get(lower)?;
                remove(this, lower)?;
                put(this, upper, lower_value)?;
            }
            (false, false) => {}
        }
    }
    Ok(this.clone())
}

fn fill(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    let value = arg(args, 0);
    let start = relative_index(&arg(args, 1), len, 0);
    let end = relative_index(&arg(args, 2), len, len);
    for k in start..end.max(start) {
        put(this, k, value.clone())?;
    }
    Ok(this.clone())
}

// ------------------------------------------------------------------- Readers

fn for_each(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let callback = callback_arg(args, "forEach")?;
    let this_arg = arg(args, 1);
    let len = this.length()?;
    for k in 0..len {
        if this.has(k)? {
            let value = this.get(k)?;
            callback.call(&this_arg, &[value, Value::from(k), this.clone()])?;
        }
    }
    Ok(Value::Undefined)
}

fn map(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let callback = callback_arg(args, "map")?;
    let this_arg = arg(args, 1);
    let len = this.length()?;
    let mut out = Vec::with_capacity(len);
    for k in 0..len {
        if this.has(k)? {
            let value = this.get(k)?;
            out.push(callback.call(&this_arg, &[value, Value::from(k), this.clone()])?);
        } else {
            out.push(Value::Undefined);
        }
    }
    Ok(Value::Object(Object::array(out)))
}

fn filter(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let callback = callback_arg(args, "filter")?;
    let this_arg = arg(args, 1);
    let len = this.length()?;
    let mut out = Vec::new();
    for k in 0..len {
        if this.has(k)? {
            let value = this.get(k)?;
            let keep = callback
                .call(&this_arg, &[value.clone(), Value::from(k), this.clone()])?
                .to_boolean();
            if keep {
                out.push(value);
            }
        }
    }
    Ok(Value::Object(Object::array(out)))
}

fn reduce(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let callback = callback_arg(args, "reduce")?;
    let len = this.length()?;
    let mut k = 0;
    let mut accumulator = if args.len() >= 2 {
        args[1].clone()
    } else {
        loop {
            if k >= len {
                return Err(ModelError::type_error(
                    "reduce of empty array with no initial value",
                ));
            }
            if this.has(k)? {
                let value = this.get(k)?;
                k += 1;
                break value;
            }
            k += 1;
        }
    };
    while k < len {
        if this.has(k)? {
            let value = this.get(k)?;
            accumulator = callback.call(
                &Value::Undefined,
                &[accumulator, value, Value::from(k), this.clone()],
            )?;
        }
        k += 1;
    }
    Ok(accumulator)
}

fn slice(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let len = this.length()?;
    let start = relative_index(&arg(args, 0), len, 0);
    let end = relative_index(&arg(args, 1), len, len);
    let mut out = Vec::new();
    for k in start..end.max(start) {
        out.push(this.get(k)?);
    }
    Ok(Value::Object(Object::array(out)))
}

fn concat(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let mut out = Vec::new();
    for item in std::iter::once(this).chain(args.iter()) {
        if item.is_array() {
            let len = item.length()?;
            for k in 0..len {
                out.push(item.get(k)?);
            }
        } else {
            out.push(item.clone());
        }
    }
    Ok(Value::Object(Object::array(out)))
}

fn index_of(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let needle = arg(args, 0);
    let len = this.length()?;
    let from = relative_index(&arg(args, 1), len, 0);
    for k in from..len {
        if this.has(k)? && strict_equals(&this.get(k)?, &needle) {
            return Ok(Value::from(k));
        }
    }
    Ok(Value::from(-1))
}

fn includes(this: &Value, args: &[Value]) -> Result<Value, ModelError> {
    let needle = arg(args, 0);
    let len = this.length()?;
    let from = relative_index(&arg(args, 1), len, 0);
    for k in from..len {
        if same_value_zero(&this.get(k)?, &needle) {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

thread_local! {
    static JOINING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Joins the elements of an array-like with `sep`. Nullish elements render
/// as empty strings, as does an array already being joined further up the
/// stack.
pub(crate) fn join_values(this: &Value, sep: &str) -> Result<String, ModelError> {
    let id = this.identity().unwrap_or(0);
    if JOINING.with(|stack| stack.borrow().contains(&id)) {
        return Ok(String::new());
    }
    JOINING.with(|stack| stack.borrow_mut().push(id));
    let result = join_elements(this, sep);
    JOINING.with(|stack| {
        stack.borrow_mut().pop();
    });
    result
}

fn join_elements(this: &Value, sep: &str) -> Result<String, ModelError> {
    let len = this.length()?;
    let mut out = String::new();
    for k in 0..len {
        if k > 0 {
            out.push_str(sep);
        }
        let element = this.get(k)?;
        if !element.is_nullish() {
            out.push_str(&element.to_display_string()?);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(items: &[i32]) -> Value {
        Value::from(Object::array(items.iter().map(|n| Value::from(*n)).collect()))
    }

    fn numbers(value: &Value) -> Vec<f64> {
        (0..value.length().unwrap())
            .map(|k| value.get(k).unwrap().to_number())
            .collect()
    }

    #[test]
    fn push_and_pop() {
        let arr = array(&[1, 2]);
        assert_eq!(arr.invoke("push", &[Value::from(3)]).unwrap(), Value::from(3));
        assert_eq!(numbers(&arr), vec![1.0, 2.0, 3.0]);
        assert_eq!(arr.invoke("pop", &[]).unwrap(), Value::from(3));
        assert_eq!(arr.length().unwrap(), 2);
        let empty = array(&[]);
        assert!(empty.invoke("pop", &[]).unwrap().is_undefined());
    }

    #[test]
    fn shift_and_unshift() {
        let arr = array(&[1, 2, 3]);
        assert_eq!(arr.invoke("shift", &[]).unwrap(), Value::from(1));
        assert_eq!(numbers(&arr), vec![2.0, 3.0]);
        arr.invoke("unshift", &[Value::from(7), Value::from(8)]).unwrap();
        assert_eq!(numbers(&arr), vec![7.0, 8.0, 2.0, 3.0]);
    }

    #[test]
    fn splice_inserts_and_removes() {
        let arr = array(&[2, 3, 1]);
        let removed = arr
            .invoke("splice", &[Value::from(1), Value::from(1), Value::from(9), Value::from(8)])
            .unwrap();
        assert_eq!(numbers(&removed), vec![3.0]);
        assert_eq!(numbers(&arr), vec![2.0, 9.0, 8.0, 1.0]);

        let removed = arr.invoke("splice", &[Value::from(-3)]).unwrap();
        assert_eq!(numbers(&removed), vec![9.0, 8.0, 1.0]);
        assert_eq!(numbers(&arr), vec![2.0]);
    }

    #[test]
    fn default_sort_compares_strings() {
        let arr = array(&[10, 9, 1]);
        arr.invoke("sort", &[]).unwrap();
        assert_eq!(numbers(&arr), vec![1.0, 10.0, 9.0]);
    }

    #[test]
    fn comparator_sort_is_stable() {
        let pairs: Vec<Value> = [(1, "a"), (0, "b"), (1, "c"), (0, "d")]
            .iter()
            .map(|(k, tag)| Value::from(Object::new().with("k", *k).with("tag", *tag)))
            .collect();
        let arr = Value::from(Object::array(pairs));
        let by_k = Object::function("byK", |_, args| {
            Ok(Value::from(
                args[0].get("k")?.to_number() - args[1].get("k")?.to_number(),
            ))
        });
        arr.invoke("sort", &[Value::from(by_k)]).unwrap();
        let tags: Vec<String> = (0..4)
            .map(|k| arr.get(k).unwrap().get("tag").unwrap().to_display_string().unwrap())
            .collect();
        assert_eq!(tags, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn comparator_errors_propagate() {
        let arr = array(&[3, 1, 2]);
        let failing = Object::function("fail", |_, _| Err(ModelError::thrown("boom")));
        let err = arr.invoke("sort", &[Value::from(failing)]).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn reverse_in_place() {
        let arr = array(&[2, 3, 1]);
        arr.invoke("reverse", &[]).unwrap();
        assert_eq!(numbers(&arr), vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn readers_leave_the_receiver_alone() {
        let arr = array(&[1, 2, 3]);
        let double = Object::function("double", |_, args| {
            Ok(Value::from(args[0].to_number() * 2.0))
        });
        let mapped = arr.invoke("map", &[Value::from(double)]).unwrap();
        assert_eq!(numbers(&mapped), vec![2.0, 4.0, 6.0]);
        let sum = Object::function("sum", |_, args| {
            Ok(Value::from(args[0].to_number() + args[1].to_number()))
        });
        assert_eq!(arr.invoke("reduce", &[Value::from(sum), Value::from(0)]).unwrap(), Value::from(6));
        let sliced = arr.invoke("slice", &[Value::from(0), Value::from(1)]).unwrap();
        assert_eq!(numbers(&sliced), vec![1.0]);
        assert_eq!(numbers(&arr), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn search_and_join() {
        let arr = Value::from(Object::array(vec![Value::from(1), Value::from(f64::NAN), Value::Null]));
        assert_eq!(arr.invoke("indexOf", &[Value::from(f64::NAN)]).unwrap(), Value::from(-1));
        assert_eq!(arr.invoke("includes", &[Value::from(f64::NAN)]).unwrap(), Value::Bool(true));
        assert_eq!(arr.invoke("join", &[Value::from("-")]).unwrap(), Value::from("1-NaN-"));
    }

    #[test]
    fn self_containing_arrays_join_without_recursing() {
        let arr = array(&[1]);
        arr.set(1, arr.clone()).unwrap();
        assert_eq!(arr.to_display_string().unwrap(), "1,");
    }

    #[test]
    fn frozen_receivers_make_mutators_fail() {
        let arr = array(&[1]);
        arr.as_object().unwrap().freeze();
        assert!(matches!(
            arr.invoke("push", &[Value::from(2)]),
            Err(ModelError::TypeError(_))
        ));
    }
}
