//! 环境变量占位符解析
//!
//! 配置文件中形如 `"${VAR_NAME}"` 的字符串会被替换为对应环境变量的值：
//! - 只替换整个值恰好为占位符的字符串
//! - 递归处理嵌套的表，数组中的值保持原样
//! - 未设置的变量替换为空字符串

use toml::Value;

/// 使用进程环境变量解析占位符
pub fn resolve_placeholders(value: Value) -> Value {
    resolve_placeholders_with(value, &|name: &str| std::env::var(name).ok())
}

/// 使用指定的查找函数解析占位符
pub fn resolve_placeholders_with(value: Value, lookup: &dyn Fn(&str) -> Option<String>) -> Value {
    match value {
        Value::Table(table) => Value::Table(
            table
                .into_iter()
                .map(|(key, value)| (key, resolve_placeholders_with(value, lookup)))
                .collect(),
        ),
        Value::String(s) => match placeholder_name(&s) {
            Some(name) => Value::String(lookup(name).unwrap_or_default()),
            None => Value::String(s),
        },
        other => other,
    }
}

fn placeholder_name(s: &str) -> Option<&str> {
    s.strip_prefix("${")?.strip_suffix('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "LLM_KEY" => Some("sk-123".to_string()),
            "LLM_URL" => Some("https://example.com/v1".to_string()),
            _ => None,
        }
    }

    fn resolve(raw: &str) -> Value {
        resolve_placeholders_with(Value::Table(raw.parse::<toml::Table>().unwrap()), &lookup)
    }

    #[test]
    fn test_nested_tables_resolved() {
        let value = resolve(
            r#"
            [llm]
            provider = "openai"
            [llm.openai]
            base_url = "${LLM_URL}"
            api_key = "${LLM_KEY}"
            "#,
        );
        assert_eq!(value["llm"]["openai"]["api_key"].as_str(), Some("sk-123"));
        assert_eq!(
            value["llm"]["openai"]["base_url"].as_str(),
            Some("https://example.com/v1")
        );
        assert_eq!(value["llm"]["provider"].as_str(), Some("openai"));
    }

    #[test]
    fn test_unset_variable_becomes_empty() {
        let value = resolve(r#"api_key = "${NOT_SET_ANYWHERE}""#);
        assert_eq!(value["api_key"].as_str(), Some(""));
    }

    #[test]
    fn test_arrays_left_untouched() {
        let value = resolve(r#"keys = ["${LLM_KEY}"]"#);
        assert_eq!(value["keys"][0].as_str(), Some("${LLM_KEY}"));
    }

    #[test]
    fn test_partial_placeholder_left_untouched() {
        let value = resolve(r#"url = "http://${LLM_URL}/v1""#);
        assert_eq!(value["url"].as_str(), Some("http://${LLM_URL}/v1"));
    }

    #[test]
    fn test_non_string_values_kept() {
        let value = resolve("port = 8090\nenabled = true");
        assert_eq!(value["port"].as_integer(), Some(8090));
        assert_eq!(value["enabled"].as_bool(), Some(true));
    }
}
