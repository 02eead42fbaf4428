//! This crate contains small utility functions shared by the `Display`
//! implementations of the other mtlsyn crates.

use std::fmt::Display;

/// Indentation width used when displaying nested structures
pub const TAB_SIZE: usize = 4;

/// Join the items of an iterator into a single string using `sep` between
/// consecutive items
///
/// The separator is not appended after the last item.
///
/// # Example
///
/// ```
/// use mtlsyn_display_utils::join_displayed;
///
/// let items = vec!["l0", "l1", "l2"];
/// assert_eq!(join_displayed(items.iter(), ", "), "l0, l1, l2");
/// ```
pub fn join_displayed<T: Display>(items: impl IntoIterator<Item = T>, sep: &str) -> String {
    let mut result = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            result.push_str(sep);
        }
        result.push_str(&item.to_string());
    }
    result
}

/// Join the items of an iterator after sorting their rendered forms
///
/// Useful for displaying hash-based collections in a stable order.
pub fn join_displayed_sorted<T: Display>(items: impl IntoIterator<Item = T>, sep: &str) -> String {
    let mut rendered: Vec<_> = items.into_iter().map(|i| i.to_string()).collect();
    rendered.sort();
    join_displayed(rendered, sep)
}

/// Indent every non-empty line of `input` by [`TAB_SIZE`] spaces
///
/// A trailing newline of the input is preserved.
///
/// # Example
///
/// ```
/// use mtlsyn_display_utils::indent_lines;
///
/// assert_eq!(indent_lines("a\nb"), "    a\n    b");
/// ```
pub fn indent_lines(input: &str) -> String {
    let tab = " ".repeat(TAB_SIZE);
    let mut output = String::with_capacity(input.len());
    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        if !line.is_empty() {
            output.push_str(&tab);
        }
        output.push_str(line);
    }
    if input.ends_with('\n') {
        output.push('\n');
    }
    output
}
