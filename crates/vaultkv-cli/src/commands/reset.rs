//! `vaultkv reset` and `vaultkv hard-reset`.

use vaultkv_store::{ResetReport, Vault};

pub async fn reset(vault: &Vault) -> anyhow::Result<()> {
    let report = vault.reset().await?;
    print_report(&report);
    report.ensure_complete()?;
    Ok(())
}

pub async fn hard_reset(vault: &Vault) -> anyhow::Result<()> {
    let report = vault.hard_reset().await;
    print_report(&report);
    report.ensure_complete()?;
    Ok(())
}

fn print_report(report: &ResetReport) {
    for (category, error) in &report.failed_categories {
        eprintln!("  failed to clear {}: {}", category, error);
    }
    if let Some(error) = &report.namespace_error {
        eprintln!("  failed to clear namespace: {}", error);
    }
    for (key, error) in &report.unrestored {
        eprintln!("  failed to restore '{}': {}", key, error);
    }

    if report.is_complete() {
        println!("Reset complete. {} key(s) kept.", report.restored.len());
    }
}
