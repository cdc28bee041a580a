pub mod scan;
pub mod vault;

use anyhow::{bail, Result};

/// Prompt for a new passphrase twice and require the entries to match.
pub fn prompt_new_passphrase() -> Result<String> {
    let first = rpassword::prompt_password("Vault passphrase: ")?;
    if first.trim().is_empty() {
        bail!("Passphrase cannot be empty");
    }
    let second = rpassword::prompt_password("Confirm passphrase: ")?;
    if first != second {
        bail!("Passphrases do not match");
    }
    Ok(first)
}
