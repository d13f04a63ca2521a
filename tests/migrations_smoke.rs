use sqlx::Row;

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();

    std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
}

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("DATABASE_URL is not set; skipping migrations smoke test");
        return Ok(());
    };

    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url).await?;

    let migrations_dir =
        std::env::var("COURSEWARE_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    for table in ["courses", "chapters", "lessons"] {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    let cases = [
        ("ObjectId(\"65A1F0C2E4B0A1B2C3D4E5F6\")", "65a1f0c2e4b0a1b2c3d4e5f6"),
        ("{\"$oid\": \"65a1f0c2e4b0a1b2c3d4e5f6\"}", "65a1f0c2e4b0a1b2c3d4e5f6"),
        ("  user-42 ", "user-42"),
    ];
    for (raw, expected) in cases {
        let canonical: String =
            sqlx::query_scalar("SELECT canonical_ref($1)").bind(raw).fetch_one(&pool).await?;
        assert_eq!(canonical, expected, "canonical_ref({raw})");
    }

    Ok(())
}
