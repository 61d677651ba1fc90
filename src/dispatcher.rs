//! generating the `main` that forwards to the selected section

use crate::rename::{renamed_entry_point, DEFAULT_ENTRY_POINT};
use crate::section::Section;
use crate::stage::StageKind;

/// GLSL source of the stage entry point.
///
/// One `if` per section compares the stage selector against the section's
/// index, calls its renamed entry point and returns. A selector that matches
/// no section falls through and the stage does nothing.
pub fn generate(stage: StageKind, sections: &[Section]) -> String {
    let selector = stage.selector_name();
    let mut src = format!("void {DEFAULT_ENTRY_POINT}() {{\n");
    for section in sections {
        src += &format!(
            "    if ({selector} == {}) {{ {}(); return; }}\n",
            section.order_index,
            renamed_entry_point(section.order_index)
        );
    }
    src += "}\n";
    src
}
