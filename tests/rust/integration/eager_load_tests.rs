//! Integration tests for batched eager loading
//!
//! Hydrates related rows for every base row and checks that each relation
//! path costs exactly one statement, however many rows ask for it.

#[cfg(test)]
mod eager_load_integration_tests {
    use std::sync::Arc;

    use eagerql::eager_load::{EagerLoadError, PartialQuery, StorageNode};
    use eagerql::executor::{Dialect, ExecutorError, Parameters, Row, SqlExecutor};
    use eagerql::query_factory::FindObjectsQueryFactory;
    use eagerql::result_iterator::ResultIterator;
    use eagerql::schema_catalog::{SchemaAnalyzer, SchemaConfig};
    use mockall::mock;
    use serde_json::{json, Value};

    mock! {
        Executor {}
        impl SqlExecutor for Executor {
            fn dialect(&self) -> Dialect;
            fn fetch_all(&self, sql: &str, params: &Parameters) -> Result<Vec<Row>, ExecutorError>;
        }
    }

    const SHOP: &str = r#"
tables:
  - name: country
    primary_key: id
    columns: { id: int, label: varchar(50) }
  - name: users
    primary_key: id
    columns: { id: int, login: varchar(50), country_id: int }
    foreign_keys:
      - { columns: country_id, references: country }
  - name: orders
    primary_key: id
    columns: { id: int, user_id: int, total: 'decimal(10,2)' }
    foreign_keys:
      - { columns: user_id, references: users }
"#;

    const ROW_QUERY: &str = "SELECT DISTINCT `users`.`id` AS `users____id`, `users`.`login` AS `users____login`, \
         `users`.`country_id` AS `users____country_id` FROM `users` WHERE users.login <> :banned";

    const COUNTRY_BATCH: &str = "SELECT DISTINCT `country`.* FROM `country` WHERE `country`.`id` IN \
         (SELECT `users`.`country_id` FROM `users` WHERE users.login <> :banned)";

    const ORDERS_BATCH: &str = "SELECT DISTINCT `orders`.* FROM `orders` WHERE `orders`.`user_id` IN \
         (SELECT `users`.`id` FROM `users` WHERE users.login <> :banned)";

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("test rows are objects")
    }

    fn analyzer() -> Arc<SchemaAnalyzer> {
        let schema = SchemaConfig::from_yaml_str(SHOP).unwrap().to_schema().unwrap();
        Arc::new(SchemaAnalyzer::new(Arc::new(schema)))
    }

    fn parameters() -> Parameters {
        let mut params = Parameters::new();
        params.insert("banned".to_string(), json!("mallory"));
        params
    }

    fn shop_executor() -> MockExecutor {
        let mut executor = MockExecutor::new();
        executor.expect_dialect().return_const(Dialect::MySql);
        executor
            .expect_fetch_all()
            .withf(|sql, params| sql == ROW_QUERY && params["banned"] == json!("mallory"))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    row(json!({"users____id": 1, "users____login": "ada", "users____country_id": 10})),
                    row(json!({"users____id": 2, "users____login": "bob", "users____country_id": 20})),
                    row(json!({"users____id": 3, "users____login": "cy", "users____country_id": 10})),
                ])
            });
        executor
            .expect_fetch_all()
            .withf(|sql, _| sql == COUNTRY_BATCH)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    row(json!({"id": 10, "label": "UK"})),
                    row(json!({"id": 20, "label": "FR"})),
                ])
            });
        executor
            .expect_fetch_all()
            .withf(|sql, _| sql == ORDERS_BATCH)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    row(json!({"id": 100, "user_id": 1, "total": "9.90"})),
                    row(json!({"id": 101, "user_id": 1, "total": "12.00"})),
                    row(json!({"id": 102, "user_id": 3, "total": "1.50"})),
                ])
            });
        executor
    }

    /// Test that hydrating every row costs one statement per relation path
    #[test]
    fn test_hydration_without_n_plus_one() {
        let executor: Arc<dyn SqlExecutor> = Arc::new(shop_executor());
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "users")
            .with_filter("users.login <> :banned");
        let storage = StorageNode::new();
        let mut results = ResultIterator::new(
            Box::new(factory),
            analyzer(),
            Arc::clone(&executor),
            parameters(),
            &storage,
        );

        let root = results.root_query().unwrap();
        let mut hydrated = Vec::new();
        let rows = results.rows().unwrap();
        for user in rows.iter() {
            let user = user.unwrap();
            // a fresh node per row, as hydration code builds them
            let country = root
                .many_to_one("users", "country", "id", "country_id")
                .fetch_many_to_one(&executor, &user["users____country_id"])
                .unwrap();
            let orders = root
                .one_to_many("users", "id", "orders", "user_id")
                .fetch_one_to_many(&executor, &user["users____id"])
                .unwrap();
            hydrated.push((
                user["users____login"].clone(),
                country["label"].clone(),
                orders.len(),
            ));
        }

        assert_eq!(
            hydrated,
            vec![
                (json!("ada"), json!("UK"), 2),
                (json!("bob"), json!("FR"), 0),
                (json!("cy"), json!("UK"), 1),
            ]
        );
        assert_eq!(storage.len(), 2);
    }

    /// Test the missing-entry consistency failure against an unrelated id
    #[test]
    fn test_dangling_reference_is_reported() {
        let mut executor = MockExecutor::new();
        executor.expect_dialect().return_const(Dialect::MySql);
        executor
            .expect_fetch_all()
            .times(1)
            .returning(|_, _| Ok(vec![row(json!({"id": 10, "label": "UK"}))]));
        let executor: Arc<dyn SqlExecutor> = Arc::new(executor);

        let storage = StorageNode::new();
        let root = PartialQuery::root(
            "FROM `users`",
            Default::default(),
            &["users".to_string()],
            &storage,
            Dialect::MySql,
        );
        let countries = root.many_to_one("users", "country", "id", "country_id");
        let err = countries.fetch_many_to_one(&executor, &json!(99)).unwrap_err();
        match err {
            EagerLoadError::MissingBatchEntry { id, sql, .. } => {
                assert_eq!(id, "99");
                assert!(sql.starts_with("SELECT DISTINCT `country`.*"));
            }
            other => panic!("expected MissingBatchEntry, got {:?}", other),
        }
        // the batch stays loaded; known ids still resolve without a new query
        assert_eq!(
            countries.fetch_many_to_one(&executor, &json!(10)).unwrap()["label"],
            "UK"
        );
    }

    /// Test that registering on the root is refused before anything runs
    #[test]
    fn test_root_registration_is_a_programming_error() {
        let executor: Arc<dyn SqlExecutor> = Arc::new(MockExecutor::new());
        let storage = StorageNode::new();
        let root = PartialQuery::root(
            "FROM `users`",
            Default::default(),
            &["users".to_string()],
            &storage,
            Dialect::MySql,
        );
        assert!(root.is_root());
        assert_eq!(
            root.register_data_loader(&executor),
            Err(EagerLoadError::RootQueryMisuse {
                key: "users".to_string()
            })
        );
    }
}
