use crate::config::Config;
use anyhow::{bail, Result};
use shroud_vault::{Vault, VaultError};
use std::path::{Path, PathBuf};

pub fn encrypt(config: &Config, args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("Usage: shroud encrypt <file> [--owner NAME]");
    };
    let owner = flag_value(args, "--owner").unwrap_or(config.owner.as_str());

    let passphrase = super::prompt_new_passphrase()?;
    let vault = Vault::open(&config.vault_dir)?;
    let entry = vault.encrypt(Path::new(path), passphrase.as_bytes(), owner, "standard")?;

    println!("Encrypted {path}");
    println!("  uuid: {}", entry.uuid);
    println!("  owner: {}", entry.owner);
    Ok(())
}

pub fn decrypt(config: &Config, args: &[String]) -> Result<()> {
    let Some(uuid) = args.first() else {
        bail!("Usage: shroud decrypt <uuid> [--out DIR]");
    };
    let out_dir = flag_value(args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./decrypted"));

    let passphrase = rpassword::prompt_password("Vault passphrase: ")?;
    let vault = Vault::open(&config.vault_dir)?;

    match vault.decrypt_to(uuid, passphrase.as_bytes(), &out_dir) {
        Ok(path) => {
            println!("Decrypted to {}", path.display());
            Ok(())
        }
        Err(VaultError::Auth) => bail!("Wrong passphrase; the entry was left untouched"),
        Err(VaultError::NotFound(_)) => bail!("No vault entry with id {uuid}"),
        Err(VaultError::Corruption(detail)) => {
            bail!("Entry {uuid} is corrupted ({detail}); other entries are unaffected")
        }
        Err(e) => Err(e.into()),
    }
}

pub fn status(config: &Config) -> Result<()> {
    let vault = Vault::open(&config.vault_dir)?;
    let status = vault.status()?;

    println!("Vault: {}", config.vault_dir.display());
    println!("  entries: {}", status.total_entries);
    println!("  total bytes: {}", status.total_bytes);
    if !status.per_owner.is_empty() {
        println!("  per owner:");
        for (owner, count) in &status.per_owner {
            println!("    {owner}: {count}");
        }
    }
    Ok(())
}

pub fn purge(config: &Config, args: &[String]) -> Result<()> {
    let Some(uuid) = args.first() else {
        bail!("Usage: shroud purge <uuid>");
    };

    let vault = Vault::open(&config.vault_dir)?;
    match vault.purge(uuid) {
        Ok(()) => {
            println!("Purged {uuid}");
            Ok(())
        }
        Err(VaultError::NotFound(_)) => bail!("No vault entry with id {uuid}"),
        Err(e) => Err(e.into()),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
