//! `Date.prototype` methods over the internal time value, in UTC.

use crate::builtins::{arg, define_method};
use crate::error::ModelError;
use crate::object::Object;
use crate::value::Value;

const MS_PER_SECOND: f64 = 1000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;
const MAX_TIME: f64 = 8.64e15;

pub(crate) fn install(proto: &Object) {
    define_method(proto, "getTime", |this, _| Ok(Value::from(time_value(this)?)));
    define_method(proto, "valueOf", |this, _| Ok(Value::from(time_value(this)?)));
    define_method(proto, "setTime", |this, args| {
        let date = date_object(this)?;
        let time = time_clip(arg(args, 0).to_number());
        date.set_date_value(time);
        Ok(Value::from(time))
    });
    define_method(proto, "getMilliseconds", |this, _| {
        Ok(Value::from(component(time_value(this)?, 1.0, 1000.0)))
    });
    define_method(proto, "getSeconds", |this, _| {
        Ok(Value::from(component(time_value(this)?, MS_PER_SECOND, 60.0)))
    });
    define_method(proto, "getMinutes", |this, _| {
        Ok(Value::from(component(time_value(this)?, MS_PER_MINUTE, 60.0)))
    });
    define_method(proto, "getHours", |this, _| {
        Ok(Value::from(component(time_value(this)?, MS_PER_HOUR, 24.0)))
    });
    define_method(proto, "setMilliseconds", |this, args| set_fields(this, Field::Milliseconds, args));
    define_method(proto, "setSeconds", |this, args| set_fields(this, Field::Seconds, args));
    define_method(proto, "setMinutes", |this, args| set_fields(this, Field::Minutes, args));
    define_method(proto, "setHours", |this, args| set_fields(this, Field::Hours, args));
    define_method(proto, "constructor", |_, args| {
        Ok(Value::Object(Object::date(time_clip(arg(args, 0).to_number()))))
    });
}

fn date_object(this: &Value) -> Result<&Object, ModelError> {
    this.as_object()
        .filter(|obj| obj.date_value().is_some())
        .ok_or_else(|| ModelError::type_error("this is not a Date object"))
}

fn time_value(this: &Value) -> Result<f64, ModelError> {
    let date = date_object(this)?;
    Ok(date.date_value().unwrap_or(f64::NAN))
}

fn time_clip(time: f64) -> f64 {
    if !time.is_finite() || time.abs() > MAX_TIME {
        f64::NAN
    } else {
        time.trunc() + 0.0
    }
}

fn component(time: f64, unit: f64, modulo: f64) -> f64 {
    if time.is_nan() {
        return f64::NAN;
    }
    (time / unit).floor().rem_euclid(modulo)
}

#[derive(Clone, Copy, PartialEq, PartialOrd)]
enum Field {
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

/// `setHours(h, m?, s?, ms?)` and its narrower siblings: arguments fill the
/// fields from `first` downwards, missing ones keep their current value.
fn set_fields(this: &Value, first: Field, args: &[Value]) -> Result<Value, ModelError> {
    let date = date_object(this)?;
    let time = date.date_value().unwrap_or(f64::NAN);
    if time.is_nan() {
        return Ok(Value::from(f64::NAN));
    }
    let mut fields = [
        component(time, MS_PER_HOUR, 24.0),
        component(time, MS_PER_MINUTE, 60.0),
        component(time, MS_PER_SECOND, 60.0),
        component(time, 1.0, 1000.0),
    ];
    let offset = first as usize;
    for (i, value) in args.iter().take(fields.len() - offset).enumerate() {
        fields[offset + i] = value.to_number();
    }
    if args.is_empty() {
        fields[offset] = f64::NAN;
    }
    let day = (time / MS_PER_DAY).floor();
    let [hours, minutes, seconds, millis] = fields.map(f64::trunc);
    let new_time = time_clip(
        day * MS_PER_DAY
            + hours * MS_PER_HOUR
            + minutes * MS_PER_MINUTE
            + seconds * MS_PER_SECOND
            + millis,
    );
    date.set_date_value(new_time);
    Ok(Value::from(new_time))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2001-01-01T00:00:00Z
    const NEW_YEAR_2001: f64 = 978_307_200_000.0;

    #[test]
    fn setters_change_only_their_fields() {
        let date = Value::from(Object::date(NEW_YEAR_2001));
        date.invoke("setSeconds", &[Value::from(32)]).unwrap();
        assert_eq!(date.invoke("getSeconds", &[]).unwrap(), Value::from(32));
        date.invoke("setHours", &[Value::from(5)]).unwrap();
        assert_eq!(date.invoke("getHours", &[]).unwrap(), Value::from(5));
        assert_eq!(date.invoke("getSeconds", &[]).unwrap(), Value::from(32));
        assert_eq!(
            date.invoke("getTime", &[]).unwrap(),
            Value::from(NEW_YEAR_2001 + 5.0 * MS_PER_HOUR + 32_000.0)
        );
    }

    #[test]
    fn overflowing_fields_carry_into_the_next_unit() {
        let date = Value::from(Object::date(NEW_YEAR_2001));
        date.invoke("setMinutes", &[Value::from(61)]).unwrap();
        assert_eq!(date.invoke("getHours", &[]).unwrap(), Value::from(1));
        assert_eq!(date.invoke("getMinutes", &[]).unwrap(), Value::from(1));
    }

    #[test]
    fn non_dates_are_rejected() {
        let plain = Value::from(Object::new());
        let get_time = Value::from(Object::date(0.0)).get("getTime").unwrap();
        assert!(matches!(
            get_time.call(&plain, &[]),
            Err(ModelError::TypeError(_))
        ));
    }

    #[test]
    fn set_time_clips_out_of_range_values() {
        let date = Value::from(Object::date(0.0));
        date.invoke("setTime", &[Value::from(1e20)]).unwrap();
        assert!(date.invoke("getTime", &[]).unwrap().to_number().is_nan());
    }
}
