use crate::error::Result;
use crate::store::PackageStore;
use colored::Colorize;

pub fn list(store: &PackageStore) -> Result<()> {
    let packages = store.list();

    if packages.is_empty() {
        println!("No packages installed");
        return Ok(());
    }

    println!("Installed packages:");
    for pkg in packages {
        let frozen = if pkg.frozen {
            " (frozen)".cyan().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}@{}{}  {}",
            format!("{}/{}", pkg.owner, pkg.repo).bold(),
            pkg.version,
            frozen,
            pkg.platform.dimmed()
        );
    }

    Ok(())
}
