//! S-expression plist helpers shared by config loading and frame records.

use lexpr::Value;

/// Find the value that follows `:key` in a plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a keyword value from a plist, rendered as a string.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "t" } else { "nil" }).to_string(),
        Value::Null => "nil".to_string(),
        _ => val.to_string(),
    })
}

/// Extract an integer value from a plist.
pub fn get_int(value: &Value, key: &str) -> Option<i64> {
    match get_value(value, key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// Extract a floating-point value from a plist.
pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    match get_value(value, key)? {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Elements of a proper list, in order.  Non-lists yield nothing.
pub fn list_items(value: &Value) -> Vec<&Value> {
    let mut items = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        items.push(pair.car());
        current = pair.cdr();
    }
    items
}

/// Numeric value of a list element.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_keyword_from_plist() {
        let v = lexpr::from_str("(:heuristic :curl :hold-threshold-ms 250)").unwrap();
        assert_eq!(get_keyword(&v, "heuristic"), Some("curl".to_string()));
        assert_eq!(get_keyword(&v, "hold-threshold-ms"), Some("250".to_string()));
    }

    #[test]
    fn test_get_keyword_string_value() {
        let v = lexpr::from_str("(:handedness \"Right\")").unwrap();
        assert_eq!(get_keyword(&v, "handedness"), Some("Right".to_string()));
    }

    #[test]
    fn test_get_keyword_missing_key() {
        let v = lexpr::from_str("(:beta 0.5)").unwrap();
        assert_eq!(get_keyword(&v, "nonexistent"), None);
        let empty = lexpr::from_str("()").unwrap();
        assert_eq!(get_keyword(&empty, "beta"), None);
    }

    #[test]
    fn test_numeric_getters() {
        let v = lexpr::from_str("(:timestamp 1200 :beta 0.25 :margin 1)").unwrap();
        assert_eq!(get_int(&v, "timestamp"), Some(1200));
        assert_eq!(get_float(&v, "beta"), Some(0.25));
        assert_eq!(get_float(&v, "margin"), Some(1.0));
        assert_eq!(get_float(&v, "missing"), None);
    }

    #[test]
    fn test_list_items() {
        let v = lexpr::from_str("((0.1 0.2 0.0) (0.3 0.4 -0.5))").unwrap();
        let items = list_items(&v);
        assert_eq!(items.len(), 2);
        let coords: Vec<f64> = list_items(items[1]).into_iter().filter_map(as_number).collect();
        assert_eq!(coords, vec![0.3, 0.4, -0.5]);
    }
}
