use crate::config::Config;
use crate::error::Result;
use crate::installer::{self, Options};
use crate::platform::Platform;
use crate::store::PackageStore;

pub fn remove(
    package: &str,
    cfg: &Config,
    store: &mut PackageStore,
    opts: &Options,
) -> Result<()> {
    let (owner, repo) = super::find_installed(store, package)?;
    let platform = Platform::current();

    let outcome = installer::remove(&owner, &repo, &platform, cfg, store, opts)?;
    super::report(&outcome);
    Ok(())
}
