/// Replace `${ENV_VAR}` and `${ENV_VAR:-default}` placeholders in a raw
/// config string.
///
/// Variables that are unset and carry no default are left as-is, so the
/// parse error (or validation error) points at the placeholder.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder; emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };

        let placeholder = &after[..end];
        let (name, default) = match placeholder.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (placeholder, None),
        };

        match lookup(name) {
            Some(value) => result.push_str(&value),
            None => match default {
                Some(default) => result.push_str(default),
                None => {
                    result.push_str("${");
                    result.push_str(placeholder);
                    result.push('}');
                },
            },
        }

        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}
