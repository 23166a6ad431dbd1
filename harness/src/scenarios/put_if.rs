use eyre::{eyre, Result as EyreResult, WrapErr};
use meshtest_primitives::fixtures::{entry_key, entry_value};
use meshtest_store::{PutCondition, StoreError};

use crate::scenarios::ScenarioContext;

fn suffixed(index: u64, suffix: &str) -> Vec<u8> {
    let mut value = entry_value(index);
    value.extend_from_slice(suffix.as_bytes());
    value
}

/// Conditional writes: if-absent seeds the region and then silently no-ops
/// against live keys; if-present only ever overwrites. The value observed at
/// the end reflects exactly one of the two conditional writes, never a mix.
pub async fn run(ctx: ScenarioContext) -> EyreResult<()> {
    let region = ctx.node.region("put-if").wrap_err("opening region put-if")?;

    match region
        .put_if("absent-probe", b"never-written", PutCondition::IfPresent)
        .await
    {
        Err(StoreError::KeyNotFound) => {}
        Ok(()) => ctx
            .reporter
            .record_failure(eyre!("if-present created a key out of nothing")),
        Err(err) => ctx.reporter.record_failure(eyre!(
            "if-present on an absent key reported `{err}` instead of the not-found outcome"
        )),
    }
    if region.get("absent-probe").await.is_ok() {
        ctx.reporter
            .record_failure(eyre!("failed if-present left state behind"));
    }

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        if let Err(err) = region
            .put_if(&key, &entry_value(index), PutCondition::IfAbsent)
            .await
        {
            ctx.reporter
                .record_failure(eyre!("seeding put-if `{key}` failed: {err}"));
        }
    }

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        match region.get(&key).await {
            Ok(value) if value == entry_value(index) => {}
            Ok(_) => ctx
                .reporter
                .record_failure(eyre!("value is different for `{key}`")),
            Err(err) => ctx.reporter.record_failure(eyre!("get `{key}` failed: {err}")),
        }
    }

    // A second if-absent pass must signal key-exists and change nothing.
    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        match region
            .put_if(&key, &suffixed(index, "-ifabsent"), PutCondition::IfAbsent)
            .await
        {
            Err(StoreError::KeyExists) => {}
            Ok(()) => ctx
                .reporter
                .record_failure(eyre!("if-absent overwrote live key `{key}`")),
            Err(err) => ctx.reporter.record_failure(eyre!(
                "if-absent on live key `{key}` reported `{err}` instead of key-exists"
            )),
        }
    }

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        match region.get(&key).await {
            Ok(value) if value == entry_value(index) => {}
            Ok(_) => ctx
                .reporter
                .record_failure(eyre!("blocked if-absent mutated `{key}`")),
            Err(err) => ctx.reporter.record_failure(eyre!("get `{key}` failed: {err}")),
        }
    }

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        if let Err(err) = region
            .put_if(&key, &suffixed(index, "-ifpresent"), PutCondition::IfPresent)
            .await
        {
            ctx.reporter
                .record_failure(eyre!("if-present on live key `{key}` failed: {err}"));
        }
    }

    for index in 0..ctx.short_entries {
        let key = entry_key(index);
        match region.get(&key).await {
            Ok(value) if value == suffixed(index, "-ifpresent") => {}
            Ok(_) => ctx
                .reporter
                .record_failure(eyre!("value is different for `{key}`")),
            Err(err) => ctx.reporter.record_failure(eyre!("get `{key}` failed: {err}")),
        }
    }

    Ok(())
}
