use crate::config::Config;
use crate::error::Result;
use crate::github::ReleaseSource;
use crate::installer::{self, Options};
use crate::platform::Platform;
use crate::resolver::{NonInteractive, TerminalPicker};
use crate::store::PackageStore;

pub async fn install(
    package: &str,
    cfg: &Config,
    store: &mut PackageStore,
    source: &impl ReleaseSource,
    opts: &Options,
) -> Result<()> {
    let platform = Platform::current();

    let outcome = if opts.non_interactive {
        installer::install(package, &platform, cfg, store, source, &NonInteractive, opts).await?
    } else {
        installer::install(package, &platform, cfg, store, source, &TerminalPicker, opts).await?
    };

    super::report(&outcome);

    if opts.freeze {
        if let installer::Outcome::Installed { version, .. } = &outcome {
            println!("Package version is frozen at {version}");
        }
    }

    Ok(())
}
