use rusqlite::{
    types::{Value, ValueRef},
    Connection, Row,
};

/// Names of all tables in the store.
pub fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table'
         ORDER BY name",
    )?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Copies every column of `row` out as an owned value.
///
/// TEXT that is not valid UTF-8 comes back as a blob so the plugin can
/// reject the row instead of the read failing.
pub fn read_values(row: &Row<'_>, column_count: usize) -> rusqlite::Result<Vec<Value>> {
    (0..column_count)
        .map(|index| row.get_ref(index).map(owned_value))
        .collect()
}

fn owned_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_string()),
            Err(_) => Value::Blob(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_tables_ignores_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE ZOBJECT (Z_PK INTEGER PRIMARY KEY, ZSTREAMNAME VARCHAR);
             CREATE INDEX ZOBJECT_STREAM ON ZOBJECT (ZSTREAMNAME);
             CREATE TABLE ZSOURCE (Z_PK INTEGER PRIMARY KEY);",
        )
        .unwrap();

        assert_eq!(list_tables(&conn).unwrap(), vec!["ZOBJECT", "ZSOURCE"]);
    }

    #[test]
    fn read_values_keeps_storage_classes() {
        let conn = Connection::open_in_memory().unwrap();
        let values = conn
            .query_row("SELECT 1, 2.5, 'x', NULL, x'00ff'", [], |row| read_values(row, 5))
            .unwrap();

        assert_eq!(
            values,
            vec![
                Value::Integer(1),
                Value::Real(2.5),
                Value::Text("x".into()),
                Value::Null,
                Value::Blob(vec![0x00, 0xff]),
            ]
        );
    }

    #[test]
    fn invalid_utf8_text_reads_as_blob() {
        let conn = Connection::open_in_memory().unwrap();
        let values = conn
            .query_row("SELECT CAST(x'ff41' AS TEXT), 'ok'", [], |row| read_values(row, 2))
            .unwrap();

        assert_eq!(
            values,
            vec![Value::Blob(vec![0xff, 0x41]), Value::Text("ok".into())]
        );
    }
}
