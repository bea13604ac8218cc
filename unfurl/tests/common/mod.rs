#![allow(dead_code)]

use unfurl::{
    Document, Module, parse_html,
    testing::{ModuleTable, StageLog},
};

// ============================================================================
// Fixture Markup
// ============================================================================

pub const COMPONENT_1: &str = "modules/test/component1";
pub const COMPONENT_1_1: &str = "modules/test/component1.1";
pub const COMPONENT_1_2: &str = "modules/test/component1.2";
pub const COMPONENT_1_2_1: &str = "modules/test/component1.2.1";
pub const COMPONENT_2: &str = "modules/test/component2";

pub const ALL_PATHS: [&str; 5] = [
    COMPONENT_1,
    COMPONENT_1_1,
    COMPONENT_1_2,
    COMPONENT_1_2_1,
    COMPONENT_2,
];

/// Five marked nodes over three levels; the last one waits for `test`.
pub const FIXTURE: &str = r#"
<div>
    <div data-ds-component="modules/test/component1">
        <div data-ds-component="modules/test/component1.1"></div>
        <div data-ds-component="modules/test/component1.2">
            <div data-ds-component="modules/test/component1.2.1"></div>
        </div>
    </div>
    <div data-ds-component="modules/test/component2" data-ds-condition="test"></div>
</div>
"#;

/// The same tree without any condition.
pub const UNCONDITIONAL_FIXTURE: &str = r#"
<div>
    <div data-ds-component="modules/test/component1">
        <div data-ds-component="modules/test/component1.1"></div>
        <div data-ds-component="modules/test/component1.2">
            <div data-ds-component="modules/test/component1.2.1"></div>
        </div>
    </div>
    <div data-ds-component="modules/test/component2"></div>
</div>
"#;

pub fn document(html: &str) -> Document {
    parse_html(html).expect("fixture markup parses")
}

// ============================================================================
// Fixture Modules
// ============================================================================

/// Every fixture path mapped to a behavior recording into `log`.
pub fn recording_table(log: &StageLog) -> ModuleTable {
    table_with(ALL_PATHS.iter().map(|path| (*path, log.module())))
}

pub fn table_with<'a>(entries: impl IntoIterator<Item = (&'a str, Module)>) -> ModuleTable {
    entries
        .into_iter()
        .fold(ModuleTable::new(), |table, (path, module)| table.with(path, module))
}

pub fn marked_count(document: &Document, marker: &str) -> usize {
    document
        .root()
        .query_all(|node| node.attribute("data-ds-component").is_some() && node.has_class(marker))
        .len()
}
