//! Identifier validation for generated Lua targets

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Lua 5.4 reserved words. None of these may be used as a variable name.
static LUA_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
        "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
    ]
    .into_iter()
    .collect()
});

/// Checks that a string is usable as a Lua identifier: non-empty, starts
/// with a letter or underscore, continues with alphanumerics or
/// underscores, and is not a reserved word.
pub fn is_valid_lua_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let leading_ok = match chars.next() {
        Some(c) => c.is_ascii_alphabetic() || c == '_',
        None => return false,
    };
    leading_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !LUA_KEYWORDS.contains(name)
}
