//! Integration tests for statement binding, execution and fetching
//!
//! All tests run against the scripted in-memory driver.

use oracle_adapter::constants::param;
use oracle_adapter::mock::MockDriver;
use oracle_adapter::translate::translate;
use oracle_adapter::{
    Attribute, BindVar, CaseMode, ColumnInfo, Config, Connection, Error, ExecuteMode, FetchMode,
    FetchedRow, NativeError, NullMode, OracleType, ParamId, Row, RowKey, Value,
};

fn fixture_row() -> Row {
    Row::from_pairs([
        ("FNAME", "Test"),
        ("LNAME", "Testerson"),
        ("EMAIL", "tester@testing.com"),
    ])
}

fn fixture_driver() -> MockDriver {
    let driver = MockDriver::new();
    driver.state().borrow_mut().rows = vec![fixture_row()];
    driver
}

fn connect_with(driver: &MockDriver, config: Config) -> Connection {
    Connection::open(driver, "localhost:1521/FREEPDB1", "scott", "tiger", config).unwrap()
}

fn connect(driver: &MockDriver) -> Connection {
    connect_with(driver, Config::default())
}

mod translate_tests {
    use super::*;

    #[test]
    fn test_markers_are_distinct_and_ordered() {
        for n in 0..6usize {
            let sql: String = (0..n).map(|i| format!("c{} = ? and ", i)).collect::<String>() + "1 = 1";
            let t = translate(&sql);
            assert_eq!(t.placeholders, n);

            let mut last = 0;
            for i in 0..n {
                let marker = format!(":{} ", i);
                let pos = t.sql.find(&marker).unwrap();
                assert!(pos >= last);
                last = pos;
            }
            assert!(!t.sql.contains(&format!(":{}", n)));
        }
    }

    #[test]
    fn test_no_placeholders_is_identity() {
        let sql = "  select *   from dual  ";
        assert_eq!(translate(sql).sql, sql);
        assert_eq!(translate(&translate(sql).sql).sql, sql);
    }
}

mod bind_tests {
    use super::*;

    #[test]
    fn test_bind_value_by_ordinal() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from t where id = ?", &[]).unwrap();

        assert!(stmt.bind_value(0usize, 42, param::INT).unwrap());

        let state = driver.state();
        let state = state.borrow();
        let bind = state.last_bind(":0").unwrap();
        assert_eq!(bind.value, Value::Integer(42));
        assert_eq!(bind.native_type, OracleType::BinaryInteger);
        assert_eq!(stmt.params()[0].name, ":0");
        assert!(!stmt.params()[0].by_ref);
    }

    #[test]
    fn test_bind_value_by_name() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from t where email = :email", &[]).unwrap();
        assert!(stmt.bind_value(":email", "tester@testing.com", param::STR).unwrap());
        assert_eq!(
            driver.state().borrow().last_bind(":email").map(|b| b.native_type),
            Some(OracleType::Varchar)
        );
    }

    #[test]
    fn test_bind_value_unknown_type() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from t where id = ?", &[]).unwrap();

        let err = stmt.bind_value(0usize, 1, 12345).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = stmt
            .bind_value(0usize, 1, param::INT | param::INPUT_OUTPUT)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(stmt.params().is_empty());
        assert!(driver.state().borrow().binds.is_empty());
    }

    #[test]
    fn test_type_map_table() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select ?, ?, ?, ?, ? from dual", &[]).unwrap();

        let cases = [
            (param::BOOL, Value::Boolean(true), OracleType::BinaryInteger),
            (param::NULL, Value::Null, OracleType::Varchar),
            (param::INT, Value::Integer(1), OracleType::BinaryInteger),
            (param::STR, Value::from("x"), OracleType::Varchar),
            (param::LOB, Value::from(vec![0u8, 1]), OracleType::Blob),
        ];
        for (i, (tag, value, native)) in cases.into_iter().enumerate() {
            stmt.bind_value(i, value, tag).unwrap();
            assert_eq!(stmt.params()[i].native_type, native);
        }
    }

    #[test]
    fn test_legacy_output_alias_promotes_length() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("begin :out := 1; end;", &[]).unwrap();
        let out = BindVar::new(Value::Null);

        for given in [-1, 0, 12] {
            assert!(stmt
                .bind_param(":out", &out, param::INT | param::INPUT_OUTPUT, given, None)
                .unwrap());
            let bind = driver.state().borrow().last_bind(":out").cloned().unwrap();
            assert_eq!(bind.native_type, OracleType::Varchar);
            assert_eq!(bind.max_length, 40);
        }

        stmt.bind_param(":out", &out, param::INT | param::INPUT_OUTPUT, 100, None)
            .unwrap();
        assert_eq!(driver.state().borrow().last_bind(":out").map(|b| b.max_length), Some(100));
    }

    #[test]
    fn test_bind_param_unknown_type() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select ? from dual", &[]).unwrap();
        let var = BindVar::new(1);
        let err = stmt.bind_param(0usize, &var, 12345, -1, None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!matches!(err, Error::UnknownType(_)));
    }

    #[test]
    fn test_output_param_written_back_after_execute() {
        let driver = MockDriver::new();
        driver
            .state()
            .borrow_mut()
            .out_values
            .insert(":id".into(), Value::Integer(1001));
        let conn = connect(&driver);
        let mut stmt = conn
            .prepare("insert into t (name) values (?) returning id into :id", &[])
            .unwrap();

        let id = BindVar::new(Value::Null);
        stmt.bind_value(0usize, "Test", param::STR).unwrap();
        stmt.bind_param(":id", &id, param::INT, -1, None).unwrap();
        assert!(id.get().is_null());

        assert!(stmt.execute(None).unwrap());
        assert_eq!(id.get(), Value::Integer(1001));
    }

    #[test]
    fn test_bind_value_is_not_written_back() {
        let driver = MockDriver::new();
        driver
            .state()
            .borrow_mut()
            .out_values
            .insert(":0".into(), Value::Integer(9));
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select ? from dual", &[]).unwrap();

        let var = BindVar::new(1);
        stmt.bind_param(0usize, &var, param::INT, -1, None).unwrap();
        stmt.bind_value(0usize, 2, param::INT).unwrap();
        stmt.execute(None).unwrap();
        assert_eq!(var.get(), Value::Integer(1));
    }

    #[test]
    fn test_native_bind_failure_is_false() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().fail_bind =
            Some(NativeError::new(1036, "illegal variable name/number"));
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from t where id = ?", &[]).unwrap();

        assert!(!stmt.bind_value(0usize, 1, param::INT).unwrap());
        let info = stmt.error_info();
        assert_eq!(info.sqlstate, "HY000");
        assert_eq!(info.code, Some(1036));

        let var = BindVar::new(1);
        assert!(!stmt.bind_param(0usize, &var, param::INT, -1, None).unwrap());
        assert_eq!(stmt.error_code(), "HY000");
        assert!(driver.state().borrow().binds.is_empty());
    }

    #[test]
    fn test_registry_is_append_only() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select ? from dual", &[]).unwrap();
        stmt.bind_value(0usize, 1, param::INT).unwrap();
        stmt.bind_value(0usize, 2, param::INT).unwrap();
        let ordinals: Vec<usize> = stmt.params().iter().map(|p| p.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);

        let other = conn.prepare("select ? from dual", &[]).unwrap();
        assert!(other.params().is_empty());
    }
}

mod column_bind_tests {
    use super::*;

    #[test]
    fn test_bind_column_rejects_bad_ordinal() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from people", &[]).unwrap();
        let var = BindVar::default();
        for column in [0, -1, i64::MIN] {
            let err = stmt.bind_column(column, &var, None, 0, None).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_bind_column_rejects_unknown_type() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from people", &[]).unwrap();
        let var = BindVar::default();
        let err = stmt.bind_column(1, &var, Some(12345), 0, None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(stmt.column_binding(1).is_none());
    }

    #[test]
    fn test_bind_column_records_binding() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from people", &[]).unwrap();
        let var = BindVar::default();

        assert!(stmt
            .bind_column(1, &var, Some(param::STR), 30, Some(Value::from("opts")))
            .unwrap());
        let binding = stmt.column_binding(1).unwrap();
        assert!(binding.var.same_slot(&var));
        assert_eq!(binding.data_type, param::STR);
        assert_eq!(binding.max_length, 30);
        assert_eq!(binding.driver_data, Some(Value::from("opts")));
    }

    #[test]
    fn test_bound_columns_updated_by_position() {
        let driver = fixture_driver();
        let conn = connect_with(&driver, Config::new().with_oracle_nulls(NullMode::ToString));
        let mut stmt = conn.prepare("select fname, lname, email from people", &[]).unwrap();

        let first = BindVar::default();
        let email = BindVar::default();
        stmt.bind_column(1, &first, None, 0, None).unwrap();
        stmt.bind_column(3, &email, Some(param::STR), 0, None).unwrap();

        stmt.execute(None).unwrap();
        stmt.fetch(FetchMode::Num).unwrap().unwrap();
        assert_eq!(first.get(), Value::from("Test"));
        assert_eq!(email.get(), Value::from("tester@testing.com"));
    }

    #[test]
    fn test_bound_columns_receive_raw_cells() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().rows = vec![Row::from_pairs([("NOTE", Value::Null)])];
        let conn = connect_with(&driver, Config::new().with_oracle_nulls(NullMode::ToString));
        let mut stmt = conn.prepare("select note from t", &[]).unwrap();
        let note = BindVar::new("unset");
        stmt.bind_column(1, &note, None, 0, None).unwrap();
        stmt.execute(None).unwrap();

        let row = stmt.fetch(FetchMode::Num).unwrap().unwrap();
        assert_eq!(row.get_index(0), Some(&Value::from("")));
        assert!(note.get().is_null());
    }
}

mod execute_tests {
    use super::*;

    #[test]
    fn test_execute_params_bind_by_reference() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from t where id = ? and name = ?", &[]).unwrap();

        let params = [
            (ParamId::from(0usize), Value::Integer(1)),
            (ParamId::from(1usize), Value::from("Test")),
        ];
        assert!(stmt.execute(Some(&params)).unwrap());

        assert!(stmt.params().iter().all(|p| p.by_ref));
        let state = driver.state();
        let state = state.borrow();
        assert_eq!(state.last_bind(":0").map(|b| b.value.clone()), Some(Value::Integer(1)));
        assert_eq!(state.last_bind(":1").map(|b| b.native_type), Some(OracleType::Varchar));
    }

    #[test]
    fn test_execute_failure_returns_false() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().fail_execute =
            Some(NativeError::new(1400, "cannot insert NULL"));
        let conn = connect(&driver);
        let mut stmt = conn.prepare("insert into t (id) values (null)", &[]).unwrap();

        assert!(!stmt.execute(None).unwrap());
        let info = stmt.error_info();
        assert_eq!(info.sqlstate, "07000");
        assert_eq!(info.code, Some(1400));
        assert_eq!(info.message.as_deref(), Some("cannot insert NULL"));
    }

    #[test]
    fn test_execute_stops_on_bind_failure() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().fail_bind =
            Some(NativeError::new(1008, "not all variables bound"));
        let conn = connect(&driver);
        let mut stmt = conn.prepare("select * from t where id = ?", &[]).unwrap();

        let params = [(ParamId::from(0usize), Value::Integer(1))];
        assert!(!stmt.execute(Some(&params)).unwrap());
        assert_eq!(stmt.error_code(), "HY000");
        assert_eq!(stmt.error_info().code, Some(1008));
        assert!(driver.state().borrow().executions.is_empty());
    }

    #[test]
    fn test_execute_resets_error_triple() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.prepare("delete from t", &[]).unwrap();

        driver.state().borrow_mut().fail_execute = Some(NativeError::new(60, "deadlock detected"));
        assert!(!stmt.execute(None).unwrap());
        driver.state().borrow_mut().fail_execute = None;
        assert!(stmt.execute(None).unwrap());
        assert_eq!(stmt.error_code(), "00000");
    }

    #[test]
    fn test_row_count() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().affected_rows = 5;
        let conn = connect(&driver);
        let mut stmt = conn.prepare("update t set x = 1", &[]).unwrap();
        stmt.execute(None).unwrap();
        assert_eq!(stmt.row_count(), 5);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn
            .prepare("select * from t where id = ? and name = ?", &[])
            .unwrap();
        assert!(stmt.translated_sql().contains(":0"));
        assert!(stmt.translated_sql().contains(":1"));

        conn.begin_transaction().unwrap();
        stmt.bind_value(0usize, 1, param::INT).unwrap();
        stmt.bind_value(1usize, "Test", param::STR).unwrap();
        assert!(stmt.execute(None).unwrap());
        assert!(conn.commit().unwrap());

        assert!(!conn.in_transaction());
        assert_eq!(driver.state().borrow().last_execute_mode(), Some(ExecuteMode::NoAutoCommit));
        assert_eq!(driver.state().borrow().commits, 1);
    }
}

mod fetch_tests {
    use super::*;

    fn fetch_names(case: CaseMode, mode: FetchMode) -> Vec<String> {
        let driver = fixture_driver();
        let conn = connect_with(&driver, Config::new().with_case(case));
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        let row = stmt.fetch(mode).unwrap().unwrap();
        row.names().into_iter().map(String::from).collect()
    }

    fn fetch_all_names(case: CaseMode, mode: FetchMode) -> Vec<String> {
        let driver = fixture_driver();
        let conn = connect_with(&driver, Config::new().with_case(case));
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        let rows = stmt.fetch_all(mode).unwrap();
        assert_eq!(rows.len(), 1);
        rows[0].names().into_iter().map(String::from).collect()
    }

    #[test]
    fn test_case_folding_on_fetch() {
        for mode in [FetchMode::Assoc, FetchMode::Class, FetchMode::Both] {
            assert_eq!(fetch_names(CaseMode::Upper, mode), ["FNAME", "LNAME", "EMAIL"]);
            assert_eq!(fetch_names(CaseMode::Lower, mode), ["fname", "lname", "email"]);
            assert_eq!(fetch_names(CaseMode::Natural, mode), ["FNAME", "LNAME", "EMAIL"]);
        }
    }

    #[test]
    fn test_case_folding_on_fetch_all() {
        for mode in [FetchMode::Assoc, FetchMode::Class] {
            assert_eq!(fetch_all_names(CaseMode::Upper, mode), ["FNAME", "LNAME", "EMAIL"]);
            assert_eq!(fetch_all_names(CaseMode::Lower, mode), ["fname", "lname", "email"]);
            assert_eq!(fetch_all_names(CaseMode::Natural, mode), ["FNAME", "LNAME", "EMAIL"]);
        }
    }

    #[test]
    fn test_case_change_applies_to_next_fetch() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().rows = vec![fixture_row(), fixture_row()];
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();

        let first = stmt.fetch(FetchMode::Assoc).unwrap().unwrap();
        assert!(first.get("fname").is_some());

        conn.set_attribute(Attribute::Case, Value::Integer(CaseMode::Upper as i64)).unwrap();
        let second = stmt.fetch(FetchMode::Assoc).unwrap().unwrap();
        assert!(second.get("FNAME").is_some());
    }

    #[test]
    fn test_fetch_shapes() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().rows = vec![fixture_row(); 4];
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();

        match stmt.fetch(FetchMode::Class).unwrap().unwrap() {
            FetchedRow::Object(obj) => assert_eq!(obj.get("lname"), Some(&Value::from("Testerson"))),
            other => panic!("expected object, got {:?}", other),
        }
        assert!(matches!(stmt.fetch(FetchMode::Assoc).unwrap(), Some(FetchedRow::Assoc(_))));
        match stmt.fetch(FetchMode::Num).unwrap().unwrap() {
            FetchedRow::Num(values) => assert_eq!(values[2], Value::from("tester@testing.com")),
            other => panic!("expected list, got {:?}", other),
        }
        match stmt.fetch(FetchMode::Lazy).unwrap().unwrap() {
            FetchedRow::Both(map) => {
                assert_eq!(map.get(&RowKey::Index(0)), Some(&Value::from("Test")));
                assert_eq!(map.get(&RowKey::from("fname")), Some(&Value::from("Test")));
            }
            other => panic!("expected both, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_sets_fetch_mode_attribute() {
        let driver = fixture_driver();
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        assert_eq!(
            stmt.get_attribute(Attribute::DefaultFetchMode),
            Some(Value::Integer(FetchMode::Class as i64))
        );
        stmt.fetch(FetchMode::Num).unwrap();
        assert_eq!(stmt.fetch_mode(), FetchMode::Num);
    }

    #[test]
    fn test_fetch_exhausted() {
        let driver = fixture_driver();
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        assert!(stmt.fetch(FetchMode::Assoc).unwrap().is_some());
        assert!(stmt.fetch(FetchMode::Assoc).unwrap().is_none());
        assert_eq!(stmt.error_code(), "07000");
    }

    #[test]
    fn test_fetch_native_failure() {
        let driver = fixture_driver();
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        driver.state().borrow_mut().fail_fetch = Some(NativeError::new(1013, "user requested cancel"));
        assert!(stmt.fetch(FetchMode::Assoc).unwrap().is_none());
        assert_eq!(stmt.error_info().code, Some(1013));
        assert!(stmt.fetch_all(FetchMode::Assoc).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_all_rejects_other_modes() {
        let driver = fixture_driver();
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        for mode in [FetchMode::Num, FetchMode::Both, FetchMode::Lazy, FetchMode::Column] {
            let err = stmt.fetch_all(mode).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
        assert_eq!(stmt.fetch_all(FetchMode::Assoc).unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_all_empty() {
        let driver = MockDriver::new();
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from empty_table", None).unwrap().unwrap();
        assert!(stmt.fetch_all(FetchMode::Class).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_all_objects() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().rows = vec![fixture_row(), fixture_row()];
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        let rows = stmt.fetch_all(FetchMode::Class).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(FetchedRow::is_object));
    }

    #[test]
    fn test_fetch_column() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().rows = vec![fixture_row(), fixture_row()];
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        assert_eq!(stmt.fetch_column(1).unwrap(), Some(Value::from("Testerson")));
        assert_eq!(stmt.fetch_column(9).unwrap(), None);
        assert_eq!(stmt.fetch_column(0).unwrap(), None);
    }

    #[test]
    fn test_fetch_object_ignores_class() {
        let driver = fixture_driver();
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        let row = stmt
            .fetch_object(Some("Person"), &[Value::from("ignored")])
            .unwrap()
            .unwrap();
        assert!(row.is_object());
        assert_eq!(row.get("email"), Some(&Value::from("tester@testing.com")));
    }

    #[test]
    fn test_null_conversion() {
        let driver = MockDriver::new();
        driver.state().borrow_mut().rows =
            vec![Row::from_pairs([("A", Value::from("")), ("B", Value::Null)])];
        let conn = connect_with(&driver, Config::new().with_oracle_nulls(NullMode::EmptyString));
        let mut stmt = conn.query("select a, b from t", None).unwrap().unwrap();
        let row = stmt.fetch(FetchMode::Assoc).unwrap().unwrap();
        assert_eq!(row.get("a"), Some(&Value::Null));
        assert_eq!(row.get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_column_meta() {
        let driver = fixture_driver();
        driver.state().borrow_mut().columns = vec![
            ColumnInfo::new("FNAME", OracleType::Varchar).with_size(50),
            ColumnInfo::new("LNAME", OracleType::Varchar).with_size(50),
            ColumnInfo::new("EMAIL", OracleType::Varchar).with_size(100).not_null(),
        ];
        let conn = connect(&driver);
        let stmt = conn.query("select * from people", None).unwrap().unwrap();
        assert_eq!(stmt.column_count(), 3);
        let meta = stmt.column_meta(2).unwrap();
        assert_eq!(meta.name, "EMAIL");
        assert_eq!(meta.native_type_name(), "VARCHAR2");
        assert_eq!(meta.generic_type(), param::STR);
        assert!(!meta.nullable);
        assert!(stmt.column_meta(3).is_none());
    }

    #[test]
    fn test_next_rowset_not_supported() {
        let driver = fixture_driver();
        let conn = connect(&driver);
        let mut stmt = conn.query("select * from people", None).unwrap().unwrap();
        let err = stmt.next_rowset().unwrap_err();
        assert_eq!(err.sqlstate(), Some("IM001"));
    }
}
