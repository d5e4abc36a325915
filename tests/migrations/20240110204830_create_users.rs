use stepwise::migrate::Executor;

fn description() -> &'static str {
    "create users table"
}

fn up(executor: &mut Executor) -> stepwise::Result<()> {
    executor.add_sql(
        "CREATE TABLE users (id INTEGER NOT NULL PRIMARY KEY, email VARCHAR(255) NOT NULL UNIQUE)",
    );
    Ok(())
}

fn down(executor: &mut Executor) -> stepwise::Result<()> {
    executor.add_sql("DROP TABLE users");
    Ok(())
}
