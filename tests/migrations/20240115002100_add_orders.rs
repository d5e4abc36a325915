use stepwise::Result;
use stepwise::migrate::Executor;

pub fn up(executor: &mut Executor) -> Result<()> {
    executor.add_sql(
        "CREATE TABLE orders (id INTEGER NOT NULL PRIMARY KEY, user_id INTEGER NOT NULL REFERENCES users (id), total INTEGER NOT NULL)",
    );
    executor.add_sql("CREATE INDEX idx_orders_user_id ON orders (user_id)");
    Ok(())
}

pub fn down(executor: &mut Executor) -> Result<()> {
    executor.add_sql("DROP INDEX idx_orders_user_id");
    executor.add_sql("DROP TABLE orders");
    Ok(())
}
