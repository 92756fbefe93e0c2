//! Masking of sensitive values before bodies reach the log.

use crate::config::MaskRule;
use serde_json::Value;

/// Keep `keep_prefix` leading and `keep_suffix` trailing characters and replace the
/// rest with `mask_char`. A value no longer than both kept parts is masked entirely.
pub fn mask(s: &str, keep_prefix: usize, keep_suffix: usize, mask_char: char) -> String {
    let len = s.chars().count();
    if keep_prefix + keep_suffix >= len {
        return std::iter::repeat(mask_char).take(len).collect();
    }
    s.chars()
        .enumerate()
        .map(|(i, c)| {
            if i < keep_prefix || i >= len - keep_suffix {
                c
            } else {
                mask_char
            }
        })
        .collect()
}

/// Mask every string value (at any depth) whose key has a rule.
pub fn mask_json(value: &mut Value, rules: &[MaskRule]) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                match (rules.iter().find(|r| &r.field == key), v) {
                    (Some(rule), Value::String(s)) => {
                        *s = mask(s, rule.keep_prefix, rule.keep_suffix, rule.mask_char);
                    }
                    (_, v) => mask_json(v, rules),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| mask_json(v, rules)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_edges() {
        assert_eq!(mask("0912345678", 2, 2, 'x'), "09xxxxxx78");
        assert_eq!(mask("0912345678", 0, 3, '*'), "*******678");
        assert_eq!(mask("abc", 2, 2, '*'), "***");
        assert_eq!(mask("", 1, 1, '*'), "");
    }

    #[test]
    fn masks_nested_fields() {
        let rules = vec![MaskRule {
            field: "phone".into(),
            keep_prefix: 0,
            keep_suffix: 3,
            mask_char: '*',
        }];
        let mut body = json!({"list": [{"id": "u1", "phone": "5550100"}], "phone": 7});
        mask_json(&mut body, &rules);
        assert_eq!(body, json!({"list": [{"id": "u1", "phone": "****100"}], "phone": 7}));
    }
}
