use core::time::Duration;

use eyre::{eyre, Result as EyreResult, WrapErr};
use meshtest_primitives::fixtures::{entry_key, entry_value};
use meshtest_store::StoreError;
use tokio::time::sleep;

use crate::scenarios::ScenarioContext;

const TTL: Duration = Duration::from_millis(250);

/// Entries written with a short TTL are readable before expiry and must
/// uniformly report not-found once at least the TTL has elapsed.
pub async fn run(ctx: ScenarioContext) -> EyreResult<()> {
    let region = ctx.node.region("put-ttl").wrap_err("opening region put-ttl")?;

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        if let Err(err) = region.put_with_ttl(&key, &entry_value(index), TTL).await {
            ctx.reporter.record_failure(eyre!("put `{key}` failed: {err}"));
        }
    }

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        match region.get(&key).await {
            Ok(value) if value == entry_value(index) => {}
            Ok(_) => ctx
                .reporter
                .record_failure(eyre!("value is different for `{key}`")),
            Err(err) => ctx
                .reporter
                .record_failure(eyre!("get `{key}` before expiry failed: {err}")),
        }
    }

    sleep(TTL).await;

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        match region.get(&key).await {
            Err(StoreError::KeyNotFound) => {}
            Ok(_) => ctx
                .reporter
                .record_failure(eyre!("expired key `{key}` is still readable")),
            Err(err) => ctx.reporter.record_failure(eyre!(
                "expired key `{key}` reported `{err}` instead of the not-found outcome"
            )),
        }
    }

    Ok(())
}
