//! Operators, conversions and indexing over runtime values.
//!
//! Every function here is pure: it takes values and returns a value or a
//! [`Fault`]. The evaluator supplies the operands and the source location.

use crate::error::Fault;
use crate::value::{format_number, Value};
use steps_types::ast::{BinOp, TypeName, UnaryOp};
use steps_types::ErrorCode;

// ══════════════════════════════════════════════════════════════════════════════
// Binary operators
// ══════════════════════════════════════════════════════════════════════════════

/// Apply a non-short-circuit binary operator.
///
/// `and` / `or` are handled by the evaluator because the right operand
/// must not be evaluated when the left one decides the result.
pub fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, Fault> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            arithmetic(op, left, right)
        }
        BinOp::Eq => Ok(Value::Boolean(left == right)),
        BinOp::NotEq => Ok(Value::Boolean(left != right)),
        BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
            compare(op, left, right)
        }
        BinOp::AddedTo => Ok(Value::Text(format!("{left}{right}"))),
        BinOp::SplitBy => split_by(left, right),
        BinOp::Contains => contains(left, right, "contains"),
        BinOp::IsIn => contains(right, left, "is in"),
        BinOp::StartsWith => text_test(left, right, "starts with", |s, p| s.starts_with(p)),
        BinOp::EndsWith => text_test(left, right, "ends with", |s, p| s.ends_with(p)),
        BinOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, Fault> {
    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        _ => return Err(arithmetic_mismatch(op, left, right)),
    };
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div | BinOp::Mod if b == 0.0 => {
            let verb = if op == BinOp::Div { "divide" } else { "take the remainder" };
            return Err(Fault::new(
                ErrorCode::DIVISION_BY_ZERO,
                format!("Cannot {verb} by zero."),
            )
            .with_hint("Check that your divisor is not zero before dividing."));
        }
        BinOp::Div => a / b,
        // The remainder takes the sign of the divisor.
        _ => a - b * (a / b).floor(),
    };
    Ok(Value::Number(result))
}

fn arithmetic_mismatch(op: BinOp, left: &Value, right: &Value) -> Fault {
    let (l, r) = (left.type_name(), right.type_name());
    let message = match op {
        BinOp::Add => format!("Cannot add {l} and {r}."),
        BinOp::Sub => format!("Cannot subtract {r} from {l}."),
        BinOp::Mul => format!("Cannot multiply {l} and {r}."),
        BinOp::Div => format!("Cannot divide {l} by {r}."),
        _ => format!("Cannot take the remainder of {l} by {r}."),
    };
    let hint = if op == BinOp::Add && (matches!(left, Value::Text(_)) || matches!(right, Value::Text(_))) {
        "The '+' operator works with numbers. Use 'added to' to join text.".to_string()
    } else {
        format!("The '{}' operator only works with numbers.", op.as_str())
    };
    Fault::new(ErrorCode::INVALID_OPERAND_TYPES, message).with_hint(hint)
}

fn compare(op: BinOp, left: &Value, right: &Value) -> Result<Value, Fault> {
    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        (Value::List(_) | Value::Table(_), _) | (_, Value::List(_) | Value::Table(_)) => {
            return Err(Fault::new(
                ErrorCode::INVALID_COMPARISON,
                format!(
                    "Cannot compare {} and {} with '{}'.",
                    left.type_name(),
                    right.type_name(),
                    op.as_str()
                ),
            )
            .with_hint("Lists and tables can only be checked with 'is equal to'."));
        }
        _ => {
            return Err(Fault::new(
                ErrorCode::INVALID_OPERAND_TYPES,
                format!(
                    "Cannot compare {} and {} with '{}'.",
                    left.type_name(),
                    right.type_name(),
                    op.as_str()
                ),
            )
            .with_hint("Numeric comparisons only work with numbers."));
        }
    };
    let result = match op {
        BinOp::Less => a < b,
        BinOp::Greater => a > b,
        BinOp::LessEq => a <= b,
        _ => a >= b,
    };
    Ok(Value::Boolean(result))
}

fn split_by(text: &Value, delimiter: &Value) -> Result<Value, Fault> {
    let (Value::Text(text), Value::Text(delimiter)) = (text, delimiter) else {
        return Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!(
                "Cannot split {} by {}; 'split by' needs text on both sides.",
                text.type_name(),
                delimiter.type_name()
            ),
        )
        .with_hint("Make sure the value you're splitting is text."));
    };
    let parts = if delimiter.is_empty() {
        text.chars().map(|c| Value::Text(c.to_string())).collect()
    } else {
        text.split(delimiter.as_str()).map(Value::from).collect()
    };
    Ok(Value::list(parts))
}

/// Membership shared by `contains` (collection first) and `is in` (item first).
///
/// Inside text, the item is looked for by its display form, so
/// `5 is in "1456"` holds.
fn contains(collection: &Value, item: &Value, word: &str) -> Result<Value, Fault> {
    match collection {
        Value::List(items) => Ok(Value::Boolean(items.borrow().contains(item))),
        Value::Text(text) => Ok(Value::Boolean(text.contains(item.to_key().as_str()))),
        _ => Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("Cannot use '{word}' with a {}.", collection.type_name()),
        )
        .with_hint(format!("'{word}' works with lists and text."))),
    }
}

fn text_test(
    left: &Value,
    right: &Value,
    word: &str,
    test: fn(&str, &str) -> bool,
) -> Result<Value, Fault> {
    match (left, right) {
        (Value::Text(s), Value::Text(p)) => Ok(Value::Boolean(test(s, p))),
        _ => Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!(
                "Cannot check if {} {word} {}.",
                left.type_name(),
                right.type_name()
            ),
        )
        .with_hint(format!("'{word}' works with text values."))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Unary operators
// ══════════════════════════════════════════════════════════════════════════════

/// Apply a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, Fault> {
    match op {
        UnaryOp::Neg => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(Fault::new(
                ErrorCode::INVALID_OPERAND_TYPES,
                format!("Cannot negate {}.", other.type_name()),
            )
            .with_hint("The unary '-' operator only works with numbers.")),
        },
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
        UnaryOp::LengthOf => {
            let length = match operand {
                Value::Text(s) => s.chars().count(),
                Value::List(items) => items.borrow().len(),
                Value::Table(table) => table.borrow().len(),
                other => {
                    return Err(Fault::new(
                        ErrorCode::INVALID_OPERAND_TYPES,
                        format!("Cannot get length of {}.", other.type_name()),
                    )
                    .with_hint("'length of' works with text, lists, and tables."));
                }
            };
            Ok(Value::Number(length as f64))
        }
        UnaryOp::TypeOf => Ok(Value::from(operand.type_name())),
    }
}

/// `character at index of text`
pub fn character_at(index: &Value, text: &Value) -> Result<Value, Fault> {
    let Value::Text(text) = text else {
        return Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("Cannot get a character from {}, only from text.", text.type_name()),
        )
        .with_hint("'character at' only works with text values."));
    };
    let length = text.chars().count();
    let position = checked_position(index, length, "Character")?;
    let ch = text.chars().nth(position).map(String::from).unwrap_or_default();
    Ok(Value::Text(ch))
}

// ══════════════════════════════════════════════════════════════════════════════
// Indexing
// ══════════════════════════════════════════════════════════════════════════════

/// `target[index]` on a list or table.
pub fn index(target: &Value, key: &Value) -> Result<Value, Fault> {
    match target {
        Value::List(items) => {
            let items = items.borrow();
            let position = checked_position(key, items.len(), "List")?;
            Ok(items[position].clone())
        }
        Value::Table(table) => {
            let table = table.borrow();
            let key = key.to_key();
            table.get(&key).cloned().ok_or_else(|| missing_key(&key, table.keys()))
        }
        Value::Text(_) => Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            "Cannot use square brackets on text.",
        )
        .with_hint("Use 'character at 0 of name' to read one character.")),
        other => Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("Cannot index into {}, only into lists or tables.", other.type_name()),
        )
        .with_hint("Use square brackets only with lists and tables.")),
    }
}

/// `set target[index] to value`: list slots must exist, table keys are upserted.
///
/// The change is made in place, so every name sharing `target` sees it.
pub fn set_index(target: &Value, key: &Value, value: Value) -> Result<(), Fault> {
    if matches!(target, Value::List(_) | Value::Table(_)) && value.reaches(target) {
        return Err(self_containment(target));
    }
    match target {
        Value::List(items) => {
            let position = checked_position(key, items.borrow().len(), "List")?;
            items.borrow_mut()[position] = value;
            Ok(())
        }
        Value::Table(table) => {
            let key = key.to_key();
            table.borrow_mut().insert(key, value);
            Ok(())
        }
        other => Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("Cannot set an index on {}, only on lists and tables.", other.type_name()),
        )
        .with_hint("Use square brackets to set values only on lists and tables.")),
    }
}

/// `add item to list`
pub fn add_to_list(list: &Value, item: Value) -> Result<(), Fault> {
    let Value::List(items) = list else {
        return Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("Cannot add to {}, only to lists.", list.type_name()),
        )
        .with_hint("Make sure you're adding to a list variable."));
    };
    if item.reaches(list) {
        return Err(self_containment(list));
    }
    items.borrow_mut().push(item);
    Ok(())
}

/// `remove item from list`: drops the first equal item. An absent item is
/// not an error.
pub fn remove_from_list(list: &Value, item: &Value) -> Result<(), Fault> {
    let Value::List(items) = list else {
        return Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("Cannot remove from {}, only from lists.", list.type_name()),
        )
        .with_hint("Make sure you're removing from a list variable."));
    };
    let position = items.borrow().iter().position(|v| v == item);
    if let Some(position) = position {
        items.borrow_mut().remove(position);
    }
    Ok(())
}

fn self_containment(container: &Value) -> Fault {
    let kind = container.type_name();
    Fault::new(
        ErrorCode::INVALID_OPERAND_TYPES,
        format!("Cannot put a {kind} inside itself."),
    )
    .with_hint(format!(
        "Store a copy instead, for example by building a new {kind} with the same items."
    ))
}

/// Validate a 0-based position into a sequence of `length` items.
fn checked_position(index: &Value, length: usize, what: &str) -> Result<usize, Fault> {
    let Value::Number(n) = index else {
        return Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("{what} index must be a number, not {}.", index.type_name()),
        )
        .with_hint("Use a whole number such as 0, 1 or 2."));
    };
    match index.as_index() {
        Some(position) if position < length => Ok(position),
        _ => {
            let shown = format_number(*n);
            let noun = if what == "List" { "list" } else { "text" };
            let hint = if length == 0 {
                format!("The {noun} is empty.")
            } else {
                format!("Valid indices are 0 to {}.", length - 1)
            };
            Err(Fault::new(
                ErrorCode::INDEX_OUT_OF_BOUNDS,
                format!("{what} index {shown} is out of bounds for {noun} of length {length}."),
            )
            .with_hint(hint)
            .with_data("index", *n)
            .with_data("length", length))
        }
    }
}

fn missing_key<'a>(key: &str, keys: impl Iterator<Item = &'a str>) -> Fault {
    let available: Vec<String> = keys.map(str::to_string).collect();
    let hint = if available.is_empty() {
        "The table is empty.".to_string()
    } else {
        format!("Available keys: {}", available.join(", "))
    };
    Fault::new(ErrorCode::KEY_NOT_FOUND, format!("Key '{key}' not found in table."))
        .with_hint(hint)
        .with_data("key", key)
        .with_data("available_keys", available)
}

// ══════════════════════════════════════════════════════════════════════════════
// Conversions
// ══════════════════════════════════════════════════════════════════════════════

/// `value as number|text|boolean`
pub fn convert(value: &Value, target: TypeName) -> Result<Value, Fault> {
    match target {
        TypeName::Number => to_number(value),
        TypeName::Text => Ok(Value::Text(value.to_string())),
        TypeName::Boolean => Ok(Value::Boolean(match value {
            Value::Text(s) if s == "true" => true,
            Value::Text(s) if s == "false" => false,
            other => other.is_truthy(),
        })),
        TypeName::List | TypeName::Table => Err(Fault::new(
            ErrorCode::CONVERSION_FAILED,
            format!("Cannot convert {} to {target}.", value.type_name()),
        )
        .with_hint("Values can be converted to number, text or boolean.")),
    }
}

fn to_number(value: &Value) -> Result<Value, Fault> {
    match value {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Boolean(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(|| {
                Fault::new(ErrorCode::CONVERSION_FAILED, format!("Cannot convert \"{s}\" to number."))
                    .with_hint("Only text that looks like a number, such as \"42\" or \"3.5\", can be converted.")
            }),
        other => Err(Fault::new(
            ErrorCode::CONVERSION_FAILED,
            format!("Cannot convert {} value to number.", other.type_name()),
        )
        .with_hint(format!("The value '{other}' cannot be interpreted as a number."))),
    }
}

/// Most decimal places `as decimal(N)` accepts.
pub const MAX_DECIMAL_PLACES: usize = 100;

/// `value as decimal(places)`
pub fn format_decimal(value: &Value, places: &Value) -> Result<Value, Fault> {
    let Value::Number(n) = value else {
        return Err(Fault::new(
            ErrorCode::INVALID_OPERAND_TYPES,
            format!("Cannot format {} as a decimal.", value.type_name()),
        )
        .with_hint("Convert it first, for example 'x as number as decimal(2)'."));
    };
    let places = match places {
        Value::Number(p) if *p >= 0.0 && *p <= MAX_DECIMAL_PLACES as f64 => p.trunc() as usize,
        Value::Number(p) => {
            return Err(Fault::new(
                ErrorCode::INVALID_DECIMAL_PLACES,
                format!("Invalid decimal places: {}.", format_number(*p)),
            )
            .with_hint(format!(
                "The number of decimal places must be between 0 and {MAX_DECIMAL_PLACES}."
            ))
            .with_data("limit", MAX_DECIMAL_PLACES));
        }
        other => {
            return Err(Fault::new(
                ErrorCode::INVALID_DECIMAL_PLACES,
                format!("Decimal places must be a number, not {}.", other.type_name()),
            )
            .with_hint("Write the number of places, for example 'price as decimal(2)'."));
        }
    };
    Ok(Value::Text(format!("{n:.places$}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(binary(BinOp::Add, &num(1.0), &num(2.0)), Ok(num(3.0)));
        assert_eq!(binary(BinOp::Div, &num(7.0), &num(2.0)), Ok(num(3.5)));
        assert_eq!(binary(BinOp::Mod, &num(7.0), &num(3.0)), Ok(num(1.0)));
        assert_eq!(binary(BinOp::Mod, &num(-7.0), &num(3.0)), Ok(num(2.0)));
    }

    #[test]
    fn test_add_text_suggests_added_to() {
        let fault = binary(BinOp::Add, &text("a"), &num(1.0)).unwrap_err();
        assert_eq!(fault.code, ErrorCode::INVALID_OPERAND_TYPES);
        assert!(fault.hint.unwrap().contains("added to"));
    }

    #[test]
    fn test_division_by_zero() {
        for op in [BinOp::Div, BinOp::Mod] {
            let fault = binary(op, &num(1.0), &num(0.0)).unwrap_err();
            assert_eq!(fault.code, ErrorCode::DIVISION_BY_ZERO);
        }
    }

    #[test]
    fn test_comparison_errors() {
        let lists = binary(BinOp::Less, &Value::list(vec![]), &num(1.0)).unwrap_err();
        assert_eq!(lists.code, ErrorCode::INVALID_COMPARISON);
        let texts = binary(BinOp::Greater, &text("a"), &text("b")).unwrap_err();
        assert_eq!(texts.code, ErrorCode::INVALID_OPERAND_TYPES);
        assert_eq!(binary(BinOp::LessEq, &num(2.0), &num(2.0)), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_added_to_uses_display_form() {
        assert_eq!(binary(BinOp::AddedTo, &text("n = "), &num(4.0)), Ok(text("n = 4")));
        assert_eq!(binary(BinOp::AddedTo, &num(1.5), &Value::Boolean(true)), Ok(text("1.5true")));
    }

    #[test]
    fn test_split_by() {
        let parts = binary(BinOp::SplitBy, &text("a,b,,c"), &text(",")).unwrap();
        assert_eq!(parts, Value::list(vec![text("a"), text("b"), text(""), text("c")]));
        let chars = binary(BinOp::SplitBy, &text("hi"), &text("")).unwrap();
        assert_eq!(chars, Value::list(vec![text("h"), text("i")]));
    }

    #[test]
    fn test_membership() {
        let list = Value::list(vec![num(1.0), text("x")]);
        assert_eq!(binary(BinOp::Contains, &list, &text("x")), Ok(Value::Boolean(true)));
        assert_eq!(binary(BinOp::IsIn, &num(2.0), &list), Ok(Value::Boolean(false)));
        assert_eq!(binary(BinOp::IsIn, &text("ell"), &text("hello")), Ok(Value::Boolean(true)));
        assert_eq!(
            binary(BinOp::IsIn, &text("a"), &num(1.0)).unwrap_err().code,
            ErrorCode::INVALID_OPERAND_TYPES
        );
    }

    #[test]
    fn test_text_membership_uses_display_form() {
        assert_eq!(binary(BinOp::IsIn, &num(5.0), &text("1456")), Ok(Value::Boolean(true)));
        assert_eq!(binary(BinOp::Contains, &text("1456"), &num(7.0)), Ok(Value::Boolean(false)));
        assert_eq!(
            binary(BinOp::Contains, &text("it is true"), &Value::Boolean(true)),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn test_length_of() {
        assert_eq!(unary(UnaryOp::LengthOf, &text("héllo")), Ok(num(5.0)));
        assert_eq!(
            unary(UnaryOp::LengthOf, &num(3.0)).unwrap_err().code,
            ErrorCode::INVALID_OPERAND_TYPES
        );
    }

    #[test]
    fn test_list_index_out_of_bounds_reports_index_and_length() {
        let list = Value::list(vec![num(1.0); 5]);
        let fault = index(&list, &num(10.0)).unwrap_err();
        assert_eq!(fault.code, ErrorCode::INDEX_OUT_OF_BOUNDS);
        assert!(fault.message.contains("10") && fault.message.contains('5'));
        assert!(fault.data.contains(&("index".to_string(), serde_json::json!(10.0))));
        assert!(fault.data.contains(&("length".to_string(), serde_json::json!(5))));
        assert_eq!(index(&list, &num(-1.0)).unwrap_err().code, ErrorCode::INDEX_OUT_OF_BOUNDS);
    }

    #[test]
    fn test_missing_key_lists_candidates() {
        let table: crate::value::Table =
            [("a".to_string(), num(1.0)), ("b".to_string(), num(2.0))].into_iter().collect();
        let fault = index(&Value::table(table), &text("c")).unwrap_err();
        assert_eq!(fault.code, ErrorCode::KEY_NOT_FOUND);
        assert!(fault
            .data
            .contains(&("available_keys".to_string(), serde_json::json!(["a", "b"]))));
    }

    #[test]
    fn test_character_at() {
        assert_eq!(character_at(&num(1.0), &text("abc")), Ok(text("b")));
        assert_eq!(
            character_at(&num(3.0), &text("abc")).unwrap_err().code,
            ErrorCode::INDEX_OUT_OF_BOUNDS
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(convert(&text(" 42 "), TypeName::Number), Ok(num(42.0)));
        assert_eq!(convert(&Value::Boolean(true), TypeName::Number), Ok(num(1.0)));
        assert_eq!(
            convert(&text("abc"), TypeName::Number).unwrap_err().code,
            ErrorCode::CONVERSION_FAILED
        );
        assert_eq!(convert(&num(3.0), TypeName::Text), Ok(text("3")));
        assert_eq!(convert(&text("false"), TypeName::Boolean), Ok(Value::Boolean(false)));
        assert_eq!(convert(&text("no"), TypeName::Boolean), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(&num(3.14159), &num(2.0)), Ok(text("3.14")));
        assert_eq!(format_decimal(&num(2.0), &num(0.0)), Ok(text("2")));
        assert_eq!(
            format_decimal(&num(1.0), &num(-1.0)).unwrap_err().code,
            ErrorCode::INVALID_DECIMAL_PLACES
        );
        assert_eq!(
            format_decimal(&text("1"), &num(2.0)).unwrap_err().code,
            ErrorCode::INVALID_OPERAND_TYPES
        );
    }

    #[test]
    fn test_format_decimal_caps_places() {
        assert!(format_decimal(&num(1.0), &num(100.0)).is_ok());
        for places in [101.0, 70000.0, f64::INFINITY, f64::NAN] {
            let fault = format_decimal(&num(1.0), &num(places)).unwrap_err();
            assert_eq!(fault.code, ErrorCode::INVALID_DECIMAL_PLACES);
        }
    }

    #[test]
    fn test_set_index_is_visible_through_every_handle() {
        let list = Value::list(vec![num(1.0), num(2.0)]);
        let alias = list.clone();
        set_index(&alias, &num(0.0), text("a")).unwrap();
        assert_eq!(list.to_string(), "[a, 2]");

        let table = Value::table(crate::value::Table::new());
        set_index(&table.clone(), &text("k"), num(1.0)).unwrap();
        assert_eq!(table.to_string(), "[\"k\": 1]");
    }

    #[test]
    fn test_add_and_remove_in_place() {
        let list = Value::list(vec![num(1.0)]);
        add_to_list(&list.clone(), num(2.0)).unwrap();
        assert_eq!(list.to_string(), "[1, 2]");
        remove_from_list(&list, &num(9.0)).unwrap();
        remove_from_list(&list, &num(1.0)).unwrap();
        assert_eq!(list.to_string(), "[2]");
        assert_eq!(
            add_to_list(&num(1.0), num(2.0)).unwrap_err().code,
            ErrorCode::INVALID_OPERAND_TYPES
        );
    }

    #[test]
    fn test_collections_cannot_contain_themselves() {
        let list = Value::list(vec![]);
        let outer = Value::list(vec![list.clone()]);
        assert!(add_to_list(&list, list.clone()).is_err());
        assert!(add_to_list(&list, outer.clone()).is_err());
        assert!(set_index(&outer, &num(0.0), outer.clone()).is_err());
        assert_eq!(outer.to_string(), "[[]]");
    }
}
