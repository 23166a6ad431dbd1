use eyre::{eyre, Result as EyreResult, WrapErr};
use meshtest_primitives::fixtures::{entry_key, entry_value};
use meshtest_store::StoreError;

use crate::scenarios::ScenarioContext;

/// Bulk put followed by delete; every subsequent get must report the
/// not-found outcome, never a generic error.
pub async fn run(ctx: ScenarioContext) -> EyreResult<()> {
    let region = ctx
        .node
        .region("put-delete")
        .wrap_err("opening region put-delete")?;

    for index in 0..ctx.entries {
        let key = entry_key(index);
        if let Err(err) = region.put(&key, &entry_value(index)).await {
            ctx.reporter.record_failure(eyre!("put `{key}` failed: {err}"));
        }
    }

    for index in 0..ctx.entries {
        let key = entry_key(index);
        if let Err(err) = region.delete(&key).await {
            ctx.reporter
                .record_failure(eyre!("delete `{key}` failed: {err}"));
        }
    }

    for index in 0..ctx.entries {
        let key = entry_key(index);
        match region.get(&key).await {
            Err(StoreError::KeyNotFound) => {}
            Ok(_) => ctx
                .reporter
                .record_failure(eyre!("deleted key `{key}` is still readable")),
            Err(err) => ctx.reporter.record_failure(eyre!(
                "deleted key `{key}` reported `{err}` instead of the not-found outcome"
            )),
        }
    }

    Ok(())
}
