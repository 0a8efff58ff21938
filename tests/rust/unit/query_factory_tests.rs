//! Unit tests for inheritance-aware query compilation
//!
//! Uses a small zoo schema: labrador is-a dog is-a animal, puppy is-a
//! labrador, cat is-a animal, and labradors have an owner.

#[cfg(test)]
mod query_factory_tests {
    use std::sync::Arc;

    use eagerql::executor::Dialect;
    use eagerql::query_factory::{
        FindObjectsFromRawSqlQueryFactory, FindObjectsQueryFactory, MagicJoin, QueryFactory,
        QueryFactoryError,
    };
    use eagerql::schema_catalog::{SchemaAnalyzer, SchemaConfig};

    const ZOO: &str = r#"
name: zoo
tables:
  - name: person
    primary_key: id
    columns: { id: int, name: varchar(255) }
  - name: animal
    primary_key: id
    columns: { id: int, name: varchar(255) }
  - name: dog
    primary_key: id
    columns: { id: int, race: varchar(255) }
    foreign_keys:
      - { columns: id, references: animal }
  - name: cat
    primary_key: id
    columns: { id: int, cuteness_level: int }
    foreign_keys:
      - { columns: id, references: animal }
  - name: labrador
    primary_key: id
    columns: { id: int, color: varchar(50), owner_id: int }
    foreign_keys:
      - { columns: id, references: dog }
      - { columns: owner_id, references: person }
  - name: puppy
    primary_key: id
    columns: { id: int, weeks: int }
    foreign_keys:
      - { columns: id, references: labrador }
"#;

    fn analyzer() -> Arc<SchemaAnalyzer> {
        let schema = SchemaConfig::from_yaml_str(ZOO)
            .and_then(|c| c.to_schema())
            .expect("zoo schema should load");
        Arc::new(SchemaAnalyzer::new(Arc::new(schema)))
    }

    /// Test that a subtype request joins its whole chain
    #[test]
    fn test_labrador_joins_ancestors_and_descendants() {
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "labrador");
        let sql = factory.magic_sql().unwrap();

        assert!(sql.contains(
            "FROM (SELECT DISTINCT `labrador`.* FROM MAGICJOIN(labrador)) AS `labrador` \
             JOIN `dog` ON `labrador`.`id` = `dog`.`id` \
             JOIN `animal` ON `dog`.`id` = `animal`.`id` \
             LEFT JOIN `puppy` ON `puppy`.`id` = `labrador`.`id`"
        ));
        // siblings are not part of the chain
        assert!(!sql.contains("`cat`"));
        // neither is a plain many-to-one target
        assert!(!sql.contains("`person`"));

        let tables = &factory.compiled().unwrap().tables;
        assert_eq!(tables, &vec!["labrador", "dog", "animal", "puppy"]);
    }

    /// Test that duplicate column names stay distinguishable
    #[test]
    fn test_column_aliases_are_unique_per_table() {
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "labrador");
        let descriptors = factory.column_descriptors().unwrap();

        let ids: Vec<&str> = descriptors
            .iter()
            .filter(|d| d.column == "id")
            .map(|d| d.alias.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["labrador____id", "dog____id", "animal____id", "puppy____id"]
        );
        // one inheritance chain, one group
        assert!(descriptors
            .iter()
            .all(|d| d.table_group == descriptors[0].table_group));
    }

    /// Test that a root table joins descendants only
    #[test]
    fn test_animal_left_joins_every_subtype() {
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::Postgres, "animal")
            .with_filter("animal.name LIKE :name");
        let sql = factory.magic_sql().unwrap();
        assert!(sql.contains("LEFT JOIN \"dog\" ON \"dog\".\"id\" = \"animal\".\"id\""));
        assert!(sql.contains("LEFT JOIN \"cat\" ON \"cat\".\"id\" = \"animal\".\"id\""));
        assert!(sql.contains("LEFT JOIN \"labrador\" ON \"labrador\".\"id\" = \"dog\".\"id\""));
        assert!(sql.contains("LEFT JOIN \"puppy\""));
        assert!(!sql.contains(" JOIN \"animal\""));
        assert_eq!(
            factory.magic_sql_count().unwrap(),
            "SELECT COUNT(DISTINCT \"animal\".\"id\") FROM MAGICJOIN(animal) WHERE animal.name LIKE :name"
        );
    }

    /// Test eager fetching a many-to-one target
    #[test]
    fn test_eager_fetch_owner() {
        let factory = FindObjectsQueryFactory::new(analyzer(), Dialect::MySql, "labrador")
            .with_additional_tables(["person"])
            .with_order_by("person.name, labrador.color DESC");
        let compiled = factory.compiled().unwrap();

        assert!(compiled
            .magic_sql
            .contains("LEFT JOIN `person` ON `labrador`.`owner_id` = `person`.`id`"));
        assert!(compiled.magic_sql.contains(
            "SELECT DISTINCT `labrador`.*, person.name AS `__order_col_0`, labrador.color AS `__order_col_1`"
        ));
        assert!(compiled
            .magic_sql
            .ends_with("ORDER BY `labrador`.`__order_col_0`, `labrador`.`__order_col_1` DESC"));
        assert!(compiled.tables.contains(&"person".to_string()));
    }

    /// Test that the placeholder expands to the same chain
    #[test]
    fn test_magic_join_expansion_of_compiled_query() {
        let analyzer = analyzer();
        let factory = FindObjectsQueryFactory::new(Arc::clone(&analyzer), Dialect::MySql, "dog")
            .with_filter("person.name = :owner");
        let expanded = MagicJoin::new(analyzer, Dialect::MySql)
            .expand(factory.magic_sql_count().unwrap())
            .unwrap();

        assert!(!MagicJoin::contains_placeholder(&expanded));
        assert!(expanded.starts_with(
            "SELECT COUNT(DISTINCT `dog`.`id`) FROM `dog` JOIN `animal` ON `dog`.`id` = `animal`.`id`"
        ));
        assert!(expanded.contains("LEFT JOIN `person` ON `labrador`.`owner_id` = `person`.`id`"));
        assert!(expanded.ends_with("WHERE person.name = :owner"));
    }

    /// Test that eager-fetched tables are joined once, outside the subquery
    #[test]
    fn test_expanded_eager_fetch_joins_owner_once() {
        let analyzer = analyzer();
        let factory = FindObjectsQueryFactory::new(Arc::clone(&analyzer), Dialect::MySql, "labrador")
            .with_additional_tables(["person"]);
        let expanded = MagicJoin::new(analyzer, Dialect::MySql)
            .expand(factory.magic_sql().unwrap())
            .unwrap();

        assert!(expanded.contains(
            "(SELECT DISTINCT `labrador`.* FROM `labrador` \
             JOIN `dog` ON `labrador`.`id` = `dog`.`id` \
             JOIN `animal` ON `dog`.`id` = `animal`.`id` \
             LEFT JOIN `puppy` ON `puppy`.`id` = `labrador`.`id`) AS `labrador`"
        ));
        assert_eq!(expanded.matches("JOIN `person`").count(), 1);
    }

    /// Test that table names inside string literals are not joined
    #[test]
    fn test_filter_literal_mentioning_a_table() {
        let analyzer = analyzer();
        let factory = FindObjectsQueryFactory::new(Arc::clone(&analyzer), Dialect::MySql, "person")
            .with_filter("person.name = 'see cat.log'");
        let expanded = MagicJoin::new(analyzer, Dialect::MySql)
            .expand(factory.magic_sql().unwrap())
            .unwrap();
        assert!(!expanded.contains("`cat`"));
        assert!(expanded.ends_with("FROM `person` WHERE person.name = 'see cat.log'"));
    }

    /// Test raw FROM clauses wrapped with inheritance joins
    #[test]
    fn test_raw_from_keeps_caller_clause_inside() {
        let from = "FROM labrador JOIN person ON person.id = labrador.owner_id";
        let factory =
            FindObjectsFromRawSqlQueryFactory::new(analyzer(), Dialect::MySql, "labrador", from)
                .with_filter("person.name = 'Ada'");
        let sql = factory.magic_sql().unwrap();
        assert!(sql.contains(&format!(
            "(SELECT DISTINCT `labrador`.* {} WHERE person.name = 'Ada') AS `labrador` JOIN `dog`",
            from
        )));
    }

    /// Test that grouped raw queries need an explicit count
    #[test]
    fn test_raw_group_by_requires_count_sql() {
        let from = "FROM labrador GROUP BY labrador.id";
        let rejected =
            FindObjectsFromRawSqlQueryFactory::new(analyzer(), Dialect::MySql, "labrador", from);
        assert!(matches!(
            rejected.magic_sql_count(),
            Err(QueryFactoryError::UnsupportedQueryShape(_))
        ));
        // the row query is rejected too; nothing is half compiled
        assert!(rejected.magic_sql().is_err());

        let accepted =
            FindObjectsFromRawSqlQueryFactory::new(analyzer(), Dialect::MySql, "labrador", from)
                .with_count_sql("SELECT COUNT(*) FROM labrador");
        assert_eq!(
            accepted.magic_sql_count().unwrap(),
            "SELECT COUNT(*) FROM labrador"
        );
    }

    /// Test unreachable eager-fetch targets
    #[test]
    fn test_eager_fetch_without_path() {
        let yaml = r#"
tables:
  - { name: a, primary_key: id, columns: { id: int } }
  - { name: b, primary_key: id, columns: { id: int } }
"#;
        let schema = SchemaConfig::from_yaml_str(yaml).unwrap().to_schema().unwrap();
        let analyzer = Arc::new(SchemaAnalyzer::new(Arc::new(schema)));
        let factory =
            FindObjectsQueryFactory::new(analyzer, Dialect::MySql, "a").with_additional_tables(["b"]);
        assert_eq!(
            factory.compiled().unwrap_err(),
            QueryFactoryError::NoJoinPath {
                from: "a".to_string(),
                to: "b".to_string()
            }
        );
    }
}
