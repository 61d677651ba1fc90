//! renaming the entry point of a section so several can share one stage

/// entry point every section declares
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// `\bmain\b`, built once
static ENTRY_POINT_REGEX: std::sync::LazyLock<Option<regex::Regex>> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"\bmain\b").ok());

/// How occurrences of the entry point name are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameRule {
    /// only whole identifiers, `mainColor` is left alone
    #[default]
    WordBoundary,
    /// every substring, including inside longer identifiers
    Substring,
}

/// Name given to the entry point of the block with `id`.
///
/// Sections are numbered from 0; the preamble (id -1) gets its own name so
/// that it never collides with the generated dispatcher.
pub fn renamed_entry_point(id: i32) -> String {
    if id < 0 {
        "lx_preamble_main".to_string()
    } else {
        format!("lx_program{id}_main")
    }
}

/// Replaces the entry point in `block`, returning the new text and how many
/// occurrences were replaced.
pub fn rename_entry_point(block: &str, id: i32, rule: RenameRule) -> (String, usize) {
    let to = renamed_entry_point(id);
    match (rule, ENTRY_POINT_REGEX.as_ref()) {
        (RenameRule::WordBoundary, Some(re)) => {
            let count = re.find_iter(block).count();
            (re.replace_all(block, to.as_str()).into_owned(), count)
        }
        (RenameRule::WordBoundary, None) => {
            log::error!("entry point pattern failed to build, renaming every substring");
            rename_substring(block, &to)
        }
        (RenameRule::Substring, _) => rename_substring(block, &to),
    }
}

fn rename_substring(block: &str, to: &str) -> (String, usize) {
    let count = block.matches(DEFAULT_ENTRY_POINT).count();
    (block.replace(DEFAULT_ENTRY_POINT, to), count)
}
