use crate::error::Result;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

const DDL_SQL: &str = include_str!("../../sql/ddl.sql");

/// Recreate the `igra_data` table from the bundled DDL script.
///
/// Blank lines are dropped and the script is executed one `;`-separated
/// statement at a time.
pub fn create_database(conn: &Connection) -> Result<()> {
    let ddl = DDL_SQL
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    for sql in ddl.split(';').map(str::trim).filter(|sql| !sql.is_empty()) {
        debug!("Executing DDL SQL: \n{}", sql);
        conn.execute_batch(sql)?;
    }

    Ok(())
}

/// Run `sql` and render every row as `column=value` pairs joined by commas.
pub fn query_results(conn: &Connection, sql: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut lines = Vec::new();

    while let Some(row) = rows.next()? {
        let mut fields = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            fields.push(format!("{}={}", column, render_value(row.get_ref(index)?)));
        }
        lines.push(fields.join(","));
    }

    Ok(lines)
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "null".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Blob(blob) => format!("<{} bytes>", blob.len()),
    }
}
