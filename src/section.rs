//! splitting a stage source into named sections
//!
//! A line whose trimmed content is `[name]` starts a new section. The text
//! before the first such line is the preamble: it is shared by all sections
//! and can never be selected. Every section defines its own `main`, which is
//! renamed to `lx_program<index>_main`, and a new `main` is appended that
//! dispatches on the stage selector uniform.
//!
//! ```text
//! uniform vec3 color;       <- preamble
//! [light]
//! void main() { ... }       <- section 0
//! [object]
//! void main() { ... }       <- section 1
//! ```

use crate::rename::{rename_entry_point, RenameRule};
use crate::stage::{StageKind, StagePolicy};

/// A named, selectable body of stage source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// position in declaration order, which is also the dispatch value
    pub order_index: i32,
}

impl Section {
    pub fn new(name: &str, order_index: i32) -> Self {
        Section {
            name: name.to_string(),
            order_index,
        }
    }
}

/// Index of the first section called `name`.
///
/// Later sections with the same name are shadowed.
pub fn find_section(sections: &[Section], name: &str) -> Option<i32> {
    sections
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.order_index)
}

/// A stage source after splitting, ready to be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitStage {
    pub stage: StageKind,
    pub source: String,
    pub sections: Vec<Section>,
}

impl SplitStage {
    pub fn is_multi(&self) -> bool {
        !self.sections.is_empty()
    }
}

/// Line index of the `#version` directive, if it is the first non-blank line.
pub fn version_line(source: &str) -> Option<usize> {
    source
        .lines()
        .enumerate()
        .find(|(_, line)| crate::trim::trimmed(line).is_some())
        .filter(|(_, line)| line.trim_start().starts_with("#version"))
        .map(|(i_line, _)| i_line)
}

/// Splits `source` into sections and generates the dispatching `main`.
///
/// A source without any section marker comes back unchanged, with no
/// injection and no renaming. Injected declarations follow the `#version`
/// directive when the source starts with one, the first line otherwise.
pub fn split(source: &str, stage: StageKind, policy: &StagePolicy, rule: RenameRule) -> SplitStage {
    if !source
        .lines()
        .any(|line| crate::trim::section_marker(line).is_some())
    {
        return SplitStage {
            stage,
            source: source.to_string(),
            sections: vec![],
        };
    }
    let injected = policy.injected_lines(stage);
    let inject_after = version_line(source).unwrap_or(0);
    let mut output = String::new();
    let mut block = String::new();
    let mut sections = Vec::<Section>::new();
    let mut current_id = -1_i32;
    for (i_line, line) in source.lines().enumerate() {
        match crate::trim::section_marker(line) {
            Some(name) => {
                output += &flush(&block, current_id, stage, rule).0;
                block.clear();
                sections.push(Section::new(name, current_id + 1));
                current_id += 1;
            }
            None => {
                block += line;
                block.push('\n');
            }
        }
        if i_line == inject_after {
            for decl in &injected {
                block += decl;
                block.push('\n');
            }
        }
    }
    output += &flush(&block, current_id, stage, rule).0;
    output += &crate::dispatcher::generate(stage, &sections);
    log::debug!(
        "{stage}: split into {} sections {:?}",
        sections.len(),
        sections.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
    );
    SplitStage {
        stage,
        source: output,
        sections,
    }
}

/// Renames the entry point of one block, returning the text and the number
/// of occurrences replaced.
fn flush(block: &str, id: i32, stage: StageKind, rule: RenameRule) -> (String, usize) {
    let (renamed, count) = rename_entry_point(block, id, rule);
    if id >= 0 && count != 1 {
        log::warn!(
            "{stage}: section {id} entry point rewrite matched {count} occurrences, expected exactly 1"
        );
    }
    (renamed, count)
}
