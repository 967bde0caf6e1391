//! # Class Merge
//!
//! Merges utility class lists the way a utility-first stylesheet expects:
//! an incoming class replaces every existing class that sets the same
//! property under the same variants (`hover:`, `md:`, ...). Classes the
//! rules do not recognise only conflict with exact duplicates.
//!
//! ```text
//! merge_classes("p-2 text-red-500 flex", "px-4 text-blue-500")
//!   => "p-2 flex px-4 text-blue-500"
//! merge_classes("px-2 py-1", "p-4")
//!   => "p-4"
//! ```

use regex::Regex;
use std::sync::OnceLock;

/// Property groups, most specific patterns first
const GROUPS: &[(&str, &str)] = &[
    (r"^(block|inline-block|inline|flex|inline-flex|grid|inline-grid|table|contents|flow-root|hidden)$", "display"),
    (r"^(static|fixed|absolute|relative|sticky)$", "position"),
    (r"^(visible|invisible|collapse)$", "visibility"),
    (r"^p-", "p"),
    (r"^px-", "px"),
    (r"^py-", "py"),
    (r"^pt-", "pt"),
    (r"^pr-", "pr"),
    (r"^pb-", "pb"),
    (r"^pl-", "pl"),
    (r"^m-", "m"),
    (r"^mx-", "mx"),
    (r"^my-", "my"),
    (r"^mt-", "mt"),
    (r"^mr-", "mr"),
    (r"^mb-", "mb"),
    (r"^ml-", "ml"),
    (r"^size-", "size"),
    (r"^w-", "w"),
    (r"^h-", "h"),
    (r"^min-w-", "min-w"),
    (r"^min-h-", "min-h"),
    (r"^max-w-", "max-w"),
    (r"^max-h-", "max-h"),
    (r"^inset-", "inset"),
    (r"^top-", "top"),
    (r"^right-", "right"),
    (r"^bottom-", "bottom"),
    (r"^left-", "left"),
    (r"^z-", "z"),
    (r"^text-(xs|sm|base|lg|xl|[2-9]xl)$", "font-size"),
    (r"^text-(left|center|right|justify|start|end)$", "text-align"),
    (r"^(truncate|text-ellipsis|text-clip)$", "text-overflow"),
    (r"^text-(wrap|nowrap|balance|pretty)$", "text-wrap"),
    (r"^text-", "text-color"),
    (r"^font-(thin|extralight|light|normal|medium|semibold|bold|extrabold|black)$", "font-weight"),
    (r"^font-", "font-family"),
    (r"^leading-", "leading"),
    (r"^tracking-", "tracking"),
    (r"^bg-\[url\(", "bg-image"),
    (r"^bg-none$", "bg-image"),
    (r"^bg-(fixed|local|scroll)$", "bg-attachment"),
    (r"^bg-(auto|cover|contain)$", "bg-size"),
    (r"^bg-(bottom|center|left|left-bottom|left-top|right|right-bottom|right-top|top)$", "bg-position"),
    (r"^bg-(repeat|no-repeat|repeat-x|repeat-y|repeat-round|repeat-space)$", "bg-repeat"),
    (r"^bg-", "bg-color"),
    (r"^rounded(-(none|sm|md|lg|xl|2xl|3xl|full|\[.+\]))?$", "rounded"),
    (r"^rounded-t(-|$)", "rounded-t"),
    (r"^rounded-r(-|$)", "rounded-r"),
    (r"^rounded-b(-|$)", "rounded-b"),
    (r"^rounded-l(-|$)", "rounded-l"),
    (r"^border(-[0-9]+|-\[[0-9.]+px\])?$", "border-w"),
    (r"^border-(solid|dashed|dotted|double|hidden|none)$", "border-style"),
    (r"^border-", "border-color"),
    (r"^opacity-", "opacity"),
    (r"^shadow(-(sm|md|lg|xl|2xl|inner|none|\[.+\]))?$", "shadow"),
    (r"^shadow-", "shadow-color"),
    (r"^flex-(row|row-reverse|col|col-reverse)$", "flex-direction"),
    (r"^flex-(wrap|wrap-reverse|nowrap)$", "flex-wrap"),
    (r"^flex-", "flex"),
    (r"^(grow|grow-0)$", "grow"),
    (r"^(shrink|shrink-0)$", "shrink"),
    (r"^items-", "items"),
    (r"^justify-", "justify"),
    (r"^self-", "self"),
    (r"^gap-x-", "gap-x"),
    (r"^gap-y-", "gap-y"),
    (r"^gap-", "gap"),
    (r"^grid-cols-", "grid-cols"),
    (r"^grid-rows-", "grid-rows"),
    (r"^col-span-", "col-span"),
    (r"^row-span-", "row-span"),
    (r"^overflow-x-", "overflow-x"),
    (r"^overflow-y-", "overflow-y"),
    (r"^overflow-", "overflow"),
    (r"^cursor-", "cursor"),
];

/// Groups that also replace narrower groups
const OVERRIDES: &[(&str, &[&str])] = &[
    ("p", &["px", "py", "pt", "pr", "pb", "pl"]),
    ("px", &["pr", "pl"]),
    ("py", &["pt", "pb"]),
    ("m", &["mx", "my", "mt", "mr", "mb", "ml"]),
    ("mx", &["mr", "ml"]),
    ("my", &["mt", "mb"]),
    ("size", &["w", "h"]),
    ("inset", &["top", "right", "bottom", "left"]),
    ("rounded", &["rounded-t", "rounded-r", "rounded-b", "rounded-l"]),
    ("gap", &["gap-x", "gap-y"]),
    ("overflow", &["overflow-x", "overflow-y"]),
];

fn rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        GROUPS
            .iter()
            .filter_map(|(pattern, group)| Regex::new(pattern).ok().map(|re| (re, *group)))
            .collect()
    })
}

/// A class split into its variant prefix and property group
#[derive(Debug, PartialEq)]
struct ClassKey<'a> {
    variants: &'a str,
    important: bool,
    group: Option<&'static str>,
}

fn classify(class: &str) -> ClassKey<'_> {
    let split = variant_split(class);
    let (variants, base) = class.split_at(split);
    let (important, base) = match base.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, base),
    };
    let base = base.strip_prefix('-').unwrap_or(base);

    let group = rules()
        .iter()
        .find(|(re, _)| re.is_match(base))
        .map(|(_, group)| *group);

    ClassKey {
        variants,
        important,
        group,
    }
}

/// Byte offset just past the last variant separator outside brackets
fn variant_split(class: &str) -> usize {
    let mut depth = 0i32;
    let mut split = 0;
    for (i, c) in class.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ':' if depth == 0 => split = i + 1,
            _ => {}
        }
    }
    split
}

fn group_overrides(incoming: &str, existing: &str) -> bool {
    incoming == existing
        || OVERRIDES
            .iter()
            .any(|(group, narrower)| *group == incoming && narrower.contains(&existing))
}

/// Whether `incoming` makes `existing` redundant
fn conflicts(incoming: &str, existing: &str) -> bool {
    if incoming == existing {
        return true;
    }
    let a = classify(incoming);
    let b = classify(existing);
    match (a.group, b.group) {
        (Some(ga), Some(gb)) => {
            a.variants == b.variants && a.important == b.important && group_overrides(ga, gb)
        }
        _ => false,
    }
}

/// Merge `incoming` into `existing`; later classes win conflicts.
pub fn merge_classes(existing: &str, incoming: &str) -> String {
    let incoming: Vec<&str> = incoming.split_whitespace().collect();
    let mut result: Vec<&str> = Vec::new();

    for class in existing.split_whitespace().chain(incoming.iter().copied()) {
        result.retain(|kept| !conflicts(class, kept));
        result.push(class);
    }

    result.join(" ")
}

/// Remove every class matching `predicate`
pub fn remove_classes(existing: &str, predicate: impl Fn(&str) -> bool) -> String {
    existing
        .split_whitespace()
        .filter(|class| !predicate(class))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the class sets a background image
pub fn is_background_image(class: &str) -> bool {
    classify(class).group == Some("bg-image")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_classes_are_replaced() {
        assert_eq!(
            merge_classes("p-2 text-red-500 flex", "px-4 text-blue-500"),
            "p-2 flex px-4 text-blue-500"
        );
        assert_eq!(merge_classes("px-2 py-1 m-4", "p-4"), "m-4 p-4");
        assert_eq!(merge_classes("flex", "hidden"), "hidden");
    }

    #[test]
    fn test_text_size_and_color_do_not_conflict() {
        assert_eq!(
            merge_classes("text-sm text-gray-700 text-center", "text-lg"),
            "text-gray-700 text-center text-lg"
        );
    }

    #[test]
    fn test_non_color_text_and_shadow_utilities_keep_color() {
        assert_eq!(
            merge_classes("text-red-500 shadow-lg", "text-ellipsis text-nowrap shadow-blue-500"),
            "text-red-500 shadow-lg text-ellipsis text-nowrap shadow-blue-500"
        );
        assert_eq!(
            merge_classes("truncate text-red-500 shadow-sm", "text-clip shadow-md"),
            "text-red-500 text-clip shadow-md"
        );
    }

    #[test]
    fn test_variants_are_separate() {
        assert_eq!(
            merge_classes("bg-white hover:bg-gray-100 md:p-2", "hover:bg-blue-100 p-4"),
            "bg-white md:p-2 hover:bg-blue-100 p-4"
        );
    }

    #[test]
    fn test_arbitrary_values_and_unknown_classes() {
        assert_eq!(
            merge_classes("w-[120px] custom-card custom-card", "w-full custom-card"),
            "w-full custom-card"
        );
        assert_eq!(
            merge_classes("bg-red-500 bg-[url(/images/a.png)]", "bg-[url(/images/b.png)]"),
            "bg-red-500 bg-[url(/images/b.png)]"
        );
    }

    #[test]
    fn test_remove_background_images() {
        assert_eq!(
            remove_classes("p-2 bg-[url(/images/a.png)] bg-cover", is_background_image),
            "p-2 bg-cover"
        );
    }
}
