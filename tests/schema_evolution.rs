//! End-to-end schema management against real backends

use kathamo::{
    bootstrap, Database, DatabaseConfig, KathamoError, MySqlSettings, NewUser, SchemaEvolver,
    UserRepository, UserSchema,
};
use kathamo::database::USER_BASE_COLUMNS;
use tempfile::tempdir;

async fn open_file_db(dir: &tempfile::TempDir) -> Database {
    let path = dir.path().join("kathamo.db");
    Database::connect(&DatabaseConfig::Sqlite {
        path: Some(path.to_string_lossy().to_string()),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_first_start_creates_and_seeds_users() {
    let dir = tempdir().unwrap();
    let db = open_file_db(&dir).await;
    let users = UserSchema::default();

    assert_eq!(bootstrap(&db, &[&users]).await.unwrap(), vec![false]);
    assert_eq!(db.table_columns("users").await.unwrap(), USER_BASE_COLUMNS);

    let repo = UserRepository::new(&db);
    assert_eq!(repo.count().await.unwrap(), 1);
    let admin = repo
        .find_by_email("admin@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.username, "admin");
    assert_eq!(admin.password_hash, "!");

    assert_eq!(bootstrap(&db, &[&users]).await.unwrap(), vec![true]);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_schema_survives_reopen() {
    let dir = tempdir().unwrap();
    let users = UserSchema::default();

    {
        let db = open_file_db(&dir).await;
        bootstrap(&db, &[&users]).await.unwrap();
        SchemaEvolver::new(&db, &users)
            .add_column("nickname", "TEXT")
            .await
            .unwrap();
        db.close().await.unwrap();
    }

    let db = open_file_db(&dir).await;
    assert_eq!(bootstrap(&db, &[&users]).await.unwrap(), vec![true]);
    assert_eq!(
        SchemaEvolver::new(&db, &users)
            .custom_columns()
            .await
            .unwrap(),
        vec!["nickname"]
    );
}

#[tokio::test]
async fn test_nickname_lifecycle() {
    let dir = tempdir().unwrap();
    let db = open_file_db(&dir).await;
    let users = UserSchema::default();
    bootstrap(&db, &[&users]).await.unwrap();

    let evolver = SchemaEvolver::new(&db, &users);
    let repo = UserRepository::new(&db);

    evolver.add_column("nickname", "TEXT").await.unwrap();
    let columns = evolver.columns().await.unwrap();
    assert_eq!(columns.last().map(String::as_str), Some("nickname"));

    let id = repo
        .insert(&NewUser::new("bob", "bob@example.com"))
        .await
        .unwrap();
    repo.set_custom_value(&id, "nickname", Some("bobby"))
        .await
        .unwrap();
    let bob = repo.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(bob.custom_value("nickname"), Some("bobby"));

    evolver.delete_column("nickname").await.unwrap();
    assert_eq!(evolver.columns().await.unwrap(), USER_BASE_COLUMNS);

    // every row and base value survives the rebuild
    let all = repo.list().await.unwrap();
    assert_eq!(all.len(), 2);
    let bob_after = repo.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(bob_after.email, "bob@example.com");
    assert!(bob_after.custom.is_empty());
    assert!(repo
        .find_by_email("admin@example.com")
        .await
        .unwrap()
        .is_some());

    // unique constraints are recreated with the table
    assert!(repo
        .insert(&NewUser::new("bob2", "bob@example.com"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_rejected_changes() {
    let dir = tempdir().unwrap();
    let db = open_file_db(&dir).await;
    let users = UserSchema::default();
    bootstrap(&db, &[&users]).await.unwrap();
    let evolver = SchemaEvolver::new(&db, &users);

    for column in USER_BASE_COLUMNS {
        assert!(matches!(
            evolver.add_column(column, "TEXT").await,
            Err(KathamoError::ProtectedColumn(c)) if c == *column
        ));
        assert!(matches!(
            evolver.delete_column(column).await,
            Err(KathamoError::ProtectedColumn(c)) if c == *column
        ));
    }
    assert_eq!(evolver.columns().await.unwrap(), USER_BASE_COLUMNS);

    assert!(matches!(
        evolver.add_column("x", "FUNKYTYPE").await,
        Err(KathamoError::InvalidType(t)) if t == "FUNKYTYPE"
    ));
    assert!(matches!(
        evolver.delete_column("ghost").await,
        Err(KathamoError::ColumnNotFound { .. })
    ));
    assert_eq!(evolver.columns().await.unwrap(), USER_BASE_COLUMNS);
}

#[tokio::test]
async fn test_closed_database_rejects_queries() {
    let db = Database::open_in_memory().await.unwrap();
    db.close().await.unwrap();

    assert!(matches!(
        bootstrap(&db, &[&UserSchema::default()]).await,
        Err(KathamoError::Connection(_))
    ));
}

/// Settings for a disposable MySQL database, e.g.
/// `KATHAMO_TEST_DB_HOST=127.0.0.1 KATHAMO_TEST_DB_NAME=kathamo_test cargo test -- --ignored`
fn mysql_test_settings() -> MySqlSettings {
    let defaults = MySqlSettings::default();
    let var = |name: &str| std::env::var(name).ok();
    MySqlSettings {
        host: var("KATHAMO_TEST_DB_HOST").unwrap_or(defaults.host),
        port: var("KATHAMO_TEST_DB_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port),
        user: var("KATHAMO_TEST_DB_USER").unwrap_or(defaults.user),
        password: var("KATHAMO_TEST_DB_PASSWORD").unwrap_or(defaults.password),
        database: var("KATHAMO_TEST_DB_NAME").unwrap_or_else(|| "kathamo_test".to_string()),
        max_connections: 2,
    }
}

#[tokio::test]
#[ignore = "needs a running MySQL server"]
async fn test_mysql_nickname_lifecycle() {
    let db = Database::connect(&DatabaseConfig::MySql(mysql_test_settings()))
        .await
        .unwrap();
    db.execute("DROP TABLE IF EXISTS `users`", &[]).await.unwrap();

    let users = UserSchema::default();
    assert_eq!(bootstrap(&db, &[&users]).await.unwrap(), vec![false]);
    assert_eq!(bootstrap(&db, &[&users]).await.unwrap(), vec![true]);

    let evolver = SchemaEvolver::new(&db, &users);
    evolver.add_column("nickname", "VARCHAR(64)").await.unwrap();
    let defs = evolver.column_defs().await.unwrap();
    let nickname = defs.iter().find(|d| d.name == "nickname").unwrap();
    assert_eq!(nickname.sql_type.to_lowercase(), "text");

    let repo = UserRepository::new(&db);
    let admin = repo
        .find_by_email("admin@example.com")
        .await
        .unwrap()
        .unwrap();
    repo.set_custom_value(&admin.id, "nickname", Some("root"))
        .await
        .unwrap();

    evolver.delete_column("nickname").await.unwrap();
    assert_eq!(evolver.columns().await.unwrap(), USER_BASE_COLUMNS);
    assert!(matches!(
        evolver.delete_column("nickname").await,
        Err(KathamoError::ColumnNotFound { .. })
    ));
    assert_eq!(repo.count().await.unwrap(), 1);

    db.execute("DROP TABLE `users`", &[]).await.unwrap();
    db.close().await.unwrap();
    assert!(db.is_closed());
}
