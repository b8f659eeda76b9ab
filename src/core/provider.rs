/*!
 * Builder name to Vagrant provider mapping
 */

/// Builders whose Vagrant provider name differs from, or is known to match,
/// the builder name
const PROVIDERS: &[(&str, &str)] = &[
    ("aws", "aws"),
    ("digitalocean", "digitalocean"),
    ("virtualbox", "virtualbox"),
    ("vmware", "vmware_desktop"),
    ("parallels", "parallels"),
];

/// Convert a builder name to the corresponding Vagrant provider
///
/// Unknown builders are passed through unchanged.
pub fn provider_for_builder(builder: &str) -> &str {
    PROVIDERS
        .iter()
        .find(|(name, _)| *name == builder)
        .map(|(_, provider)| *provider)
        .unwrap_or(builder)
}
