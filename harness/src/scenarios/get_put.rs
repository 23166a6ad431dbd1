use eyre::{eyre, Result as EyreResult, WrapErr};
use meshtest_primitives::fixtures::{entry_key, entry_value};
use meshtest_store::StoreError;

use crate::scenarios::ScenarioContext;

/// Bulk put/get over the fixture range, then a probe for an absent key,
/// which must yield the distinct not-found outcome.
pub async fn run(ctx: ScenarioContext) -> EyreResult<()> {
    let region = ctx.node.region("get-put").wrap_err("opening region get-put")?;

    for index in 0..ctx.entries {
        let key = entry_key(index);
        if let Err(err) = region.put(&key, &entry_value(index)).await {
            ctx.reporter.record_failure(eyre!("put `{key}` failed: {err}"));
        }
    }

    for index in 0..ctx.entries {
        let key = entry_key(index);
        match region.get(&key).await {
            Ok(value) if value == entry_value(index) => {}
            Ok(_) => ctx
                .reporter
                .record_failure(eyre!("value is different for `{key}`")),
            Err(err) => ctx.reporter.record_failure(eyre!("get `{key}` failed: {err}")),
        }
    }

    match region.get("foobar").await {
        Err(StoreError::KeyNotFound) => {}
        Ok(_) => ctx
            .reporter
            .record_failure(eyre!("absent key `foobar` returned a value")),
        Err(err) => ctx.reporter.record_failure(eyre!(
            "absent key `foobar` reported `{err}` instead of the not-found outcome"
        )),
    }

    Ok(())
}
