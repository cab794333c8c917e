use shard::error::AppResult;

fn main() -> AppResult<()> {
    shard::run()
}
