//! Bean-style method naming.

/// Lowercases the first character unless the first two are both uppercase.
///
/// ```
/// use jm_mapper::access::decapitalize;
///
/// assert_eq!(decapitalize("Name"), "name");
/// assert_eq!(decapitalize("URL"), "URL");
/// assert_eq!(decapitalize("X"), "x");
/// ```
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(char::is_uppercase) && first.is_uppercase() {
        return name.to_owned();
    }
    let mut out = String::with_capacity(name.len());
    out.extend(first.to_lowercase());
    out.push_str(&name[first.len_utf8()..]);
    out
}

/// The property behind `name` with a camel (`getName`) or snake
/// (`get_name`) prefix.
fn strip_accessor(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    if let Some(snake) = rest.strip_prefix('_') {
        return (!snake.is_empty()).then(|| snake.to_owned());
    }
    rest.starts_with(|c: char| c.is_uppercase())
        .then(|| decapitalize(rest))
}

/// The property read by a getter named `name`.
///
/// `is` prefixes only count for boolean getters.
pub fn getter_property(name: &str, is_bool: bool) -> Option<String> {
    strip_accessor(name, "get").or_else(|| {
        if is_bool {
            strip_accessor(name, "is")
        } else {
            None
        }
    })
}

/// The property written by a setter named `name`.
#[inline]
pub fn setter_property(name: &str) -> Option<String> {
    strip_accessor(name, "set")
}

#[cfg(test)]
mod tests {
    use super::{decapitalize, getter_property, setter_property};

    #[test]
    fn camel_and_snake_prefixes() {
        assert_eq!(getter_property("getName", false).as_deref(), Some("name"));
        assert_eq!(getter_property("get_name", false).as_deref(), Some("name"));
        assert_eq!(getter_property("getURL", false).as_deref(), Some("URL"));
        assert_eq!(getter_property("isActive", true).as_deref(), Some("active"));
        assert_eq!(getter_property("is_active", true).as_deref(), Some("active"));
        assert_eq!(setter_property("setName").as_deref(), Some("name"));
        assert_eq!(setter_property("set_name").as_deref(), Some("name"));
    }

    #[test]
    fn non_accessors_are_rejected() {
        assert_eq!(getter_property("isActive", false), None);
        assert_eq!(getter_property("get", false), None);
        assert_eq!(getter_property("get_", false), None);
        assert_eq!(getter_property("getaway", false), None);
        assert_eq!(getter_property("name", false), None);
        assert_eq!(setter_property("settle"), None);
        assert_eq!(decapitalize(""), "");
    }
}
