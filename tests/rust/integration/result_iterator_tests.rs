//! Integration tests for result materialization
//!
//! Drives compiled queries through a mocked executor: placeholder expansion,
//! dialect translation, count memoization and replayable rows.

#[cfg(test)]
mod result_iterator_integration_tests {
    use std::sync::Arc;

    use eagerql::eager_load::StorageNode;
    use eagerql::executor::{Dialect, ExecutorError, Parameters, Row, SqlExecutor};
    use eagerql::query_factory::{FindObjectsFromRawSqlQueryFactory, FindObjectsQueryFactory};
    use eagerql::result_iterator::{IteratorError, ResultError, ResultIterator};
    use eagerql::schema_catalog::{SchemaAnalyzer, SchemaConfig};
    use mockall::mock;
    use serde_json::{json, Value};

    mock! {
        Executor {}
        impl SqlExecutor for Executor {
            fn dialect(&self) -> Dialect;
            fn fetch_all(&self, sql: &str, params: &Parameters) -> Result<Vec<Row>, ExecutorError>;
            fn translate(&self, sql: &str, from: Dialect) -> Result<String, ExecutorError>;
        }
    }

    const ZOO: &str = r#"
tables:
  - name: animal
    primary_key: id
    columns: { id: int, name: varchar(255) }
  - name: dog
    primary_key: id
    columns: { id: int, race: varchar(255) }
    foreign_keys:
      - { columns: id, references: animal }
"#;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("test rows are objects")
    }

    fn analyzer() -> Arc<SchemaAnalyzer> {
        let schema = SchemaConfig::from_yaml_str(ZOO).unwrap().to_schema().unwrap();
        Arc::new(SchemaAnalyzer::new(Arc::new(schema)))
    }

    fn dogs(n: i64) -> Vec<Row> {
        (1..=n)
            .map(|i| row(json!({"dog____id": i, "dog____race": "lab", "animal____id": i, "animal____name": format!("rex{}", i)})))
            .collect()
    }

    /// Test that rows are queried once with the placeholder expanded
    #[test]
    fn test_rows_are_fetched_once_and_replayable() {
        let mut executor = MockExecutor::new();
        executor.expect_dialect().return_const(Dialect::MySql);
        executor
            .expect_fetch_all()
            .withf(|sql, _| {
                !sql.contains("MAGICJOIN")
                    && sql.contains(
                        "FROM (SELECT DISTINCT `dog`.* FROM `dog` JOIN `animal` ON `dog`.`id` = `animal`.`id`) AS `dog`",
                    )
            })
            .times(1)
            .returning(|_, _| Ok(dogs(5)));

        let storage = StorageNode::new();
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "dog");
        let mut results = ResultIterator::new(
            Box::new(factory),
            analyzer(),
            Arc::new(executor),
            Parameters::new(),
            &storage,
        );

        let rows = results.rows().unwrap();
        assert_eq!(rows.get(3).unwrap()["animal____name"], "rex4");
        assert_eq!(rows.to_vec().unwrap().len(), 5);
        // in-memory cursors know their size
        assert_eq!(rows.count(), Ok(5));

        let again = results.rows().unwrap();
        assert_eq!(again.to_vec().unwrap().len(), 5);
        assert!(matches!(
            again.get(5),
            Err(IteratorError::InvalidOffset { .. })
        ));
    }

    /// Test that the count query runs once
    #[test]
    fn test_count_is_memoized() {
        let mut executor = MockExecutor::new();
        executor.expect_dialect().return_const(Dialect::MySql);
        executor
            .expect_fetch_all()
            .withf(|sql, _| sql.starts_with("SELECT COUNT(DISTINCT `dog`.`id`) FROM `dog` JOIN `animal`"))
            .times(1)
            .returning(|_, _| Ok(vec![row(json!({"COUNT(DISTINCT `dog`.`id`)": 42}))]));

        let storage = StorageNode::new();
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "dog");
        let results = ResultIterator::new(
            Box::new(factory),
            analyzer(),
            Arc::new(executor),
            Parameters::new(),
            &storage,
        );
        assert_eq!(results.count(), Ok(42));
        assert_eq!(results.count(), Ok(42));
    }

    /// Test that SQL is translated when the executor speaks another dialect
    #[test]
    fn test_translation_for_foreign_executor() {
        let mut executor = MockExecutor::new();
        executor.expect_dialect().return_const(Dialect::Postgres);
        executor
            .expect_translate()
            .withf(|sql, from| sql.contains("`dog`") && *from == Dialect::MySql)
            .times(1)
            .returning(|sql, _| Ok(sql.replace('`', "\"")));
        executor
            .expect_fetch_all()
            .withf(|sql, _| !sql.contains('`'))
            .times(1)
            .returning(|_, _| Ok(dogs(2)));

        let storage = StorageNode::new();
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "dog");
        let mut results = ResultIterator::new(
            Box::new(factory),
            analyzer(),
            Arc::new(executor),
            Parameters::new(),
            &storage,
        );
        assert_eq!(results.rows().unwrap().to_vec().unwrap().len(), 2);
    }

    /// Test that a rejected query shape never reaches the executor
    #[test]
    fn test_rejected_shape_is_reported_before_execution() {
        let executor = MockExecutor::new();
        let storage = StorageNode::new();
        let factory = FindObjectsFromRawSqlQueryFactory::new(
            analyzer(),
            Dialect::MySql,
            "dog",
            "FROM dog GROUP BY dog.race",
        );
        let mut results = ResultIterator::new(
            Box::new(factory),
            analyzer(),
            Arc::new(executor),
            Parameters::new(),
            &storage,
        );
        assert!(matches!(results.count(), Err(ResultError::QueryFactory(_))));
        assert!(matches!(results.rows(), Err(ResultError::QueryFactory(_))));
        assert!(matches!(results.root_query(), Err(ResultError::QueryFactory(_))));
    }

    /// Test that executor failures surface unchanged
    #[test]
    fn test_executor_failure_propagates() {
        let mut executor = MockExecutor::new();
        executor.expect_dialect().return_const(Dialect::MySql);
        executor
            .expect_fetch_all()
            .returning(|sql, _| Err(ExecutorError::execution(sql, "table is locked")));

        let storage = StorageNode::new();
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "animal");
        let mut results = ResultIterator::new(
            Box::new(factory),
            analyzer(),
            Arc::new(executor),
            Parameters::new(),
            &storage,
        );
        assert!(matches!(results.rows(), Err(ResultError::Executor(_))));
        assert!(matches!(results.count(), Err(ResultError::Executor(_))));
    }
}
