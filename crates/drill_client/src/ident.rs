//! Quoting for drill identifiers and literals.

/// Format a dotted `plugin.schema.table` path as a quoted drill identifier.
///
/// Existing backticks are removed first. File names may contain a dot for
/// their extension, so for files with two or three dots the last two
/// segments are quoted together as a single identifier:
///
/// - `dfs.test.data.csv` becomes ``dfs.`test`.`data.csv` ``
/// - `dfs.test.csv` becomes ``dfs.`test.csv` ``
///
/// Every other path has each segment quoted on its own, e.g. `mysql.sales`
/// becomes `` `mysql`.`sales` ``.
pub fn format_table(path: &str, is_file: bool) -> String {
    let path = path.replace('`', "");
    let parts: Vec<&str> = path.split('.').collect();

    match (is_file, parts.as_slice()) {
        (true, [plugin, workspace, stem, ext]) => {
            format!("{plugin}.`{workspace}`.`{stem}.{ext}`")
        }
        (true, [plugin, stem, ext]) => format!("{plugin}.`{stem}.{ext}`"),
        _ => parts
            .iter()
            .map(|part| format!("`{part}`"))
            .collect::<Vec<_>>()
            .join("."),
    }
}

/// Quote a value as a single-quoted sql string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Remove backticks from a name.
pub fn strip_backticks(name: &str) -> String {
    name.replace('`', "")
}
