//! Declarative sharing policies.
//!
//! Composites declare their sharing policies as manifest-style headers:
//!
//! ```text
//! Bundle-SymbolicName: org.example.app
//! Bundle-Version: 1.0
//! Composite-ImportPackage: org.example.api;version="[1.0,2.0)";peer-symbolic-name:=org.example.lib
//! Composite-ImportService: "(objectClass=org.example.Log)"
//! Composite-ExportPackage: org.example.app.spi
//! ```
//!
//! Each header holds comma-separated clauses. A clause is one or more paths
//! (package names, bundle names, or a service filter) followed by
//! `key=value` attributes and `key:=value` directives. Every clause accepts
//! `peer-symbolic-name` and `peer-version-range`. The peer name `<<parent>>`
//! is only accepted on `Composite-ImportPackage` and
//! `Composite-RequireBundle`.

use composite_core::error::{DeclarationError, Result};
use composite_core::filter::Filter;
use composite_core::utils::{Version, VersionRange};
use std::collections::HashMap;
use tracing::debug;

use crate::model::{
    BundleSpec, ClassSpacePolicy, ClassSpaceSpec, CompositeDescriptor, ImportPackageSpec,
    PeerConstraint, PeerName, PolicySet, ServicePolicy,
};

pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
pub const BUNDLE_VERSION: &str = "Bundle-Version";
pub const BUNDLE_MANIFEST_VERSION: &str = "Bundle-ManifestVersion";

pub const COMPOSITE_IMPORT_PACKAGE: &str = "Composite-ImportPackage";
pub const COMPOSITE_EXPORT_PACKAGE: &str = "Composite-ExportPackage";
pub const COMPOSITE_REQUIRE_BUNDLE: &str = "Composite-RequireBundle";
pub const COMPOSITE_PROVIDE_BUNDLE: &str = "Composite-ProvideBundle";
pub const COMPOSITE_IMPORT_SERVICE: &str = "Composite-ImportService";
pub const COMPOSITE_EXPORT_SERVICE: &str = "Composite-ExportService";

pub const PEER_SYMBOLIC_NAME: &str = "peer-symbolic-name";
pub const PEER_VERSION_RANGE: &str = "peer-version-range";

/// Bundle headers that have no meaning on a composite.
pub const INVALID_COMPOSITE_HEADERS: [&str; 10] = [
    "DynamicImport-Package",
    "Import-Package",
    "Export-Package",
    "Require-Bundle",
    "Fragment-Host",
    "Bundle-NativeCode",
    "Bundle-ClassPath",
    "Bundle-Activator",
    "Bundle-Localization",
    "Bundle-ActivationPolicy",
];

fn header<'h>(headers: &'h HashMap<String, String>, name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Check that a set of headers can describe a composite.
///
/// `Bundle-SymbolicName` is required, headers in
/// [`INVALID_COMPOSITE_HEADERS`] are rejected, and `Bundle-ManifestVersion`
/// must be `2` when present.
pub fn validate_composite_manifest(headers: &HashMap<String, String>) -> Result<()> {
    match header(headers, BUNDLE_SYMBOLIC_NAME) {
        Some(name) if !name.trim().is_empty() => {}
        _ => return Err(DeclarationError::MissingHeader(BUNDLE_SYMBOLIC_NAME.to_string()).into()),
    }

    if let Some(invalid) = INVALID_COMPOSITE_HEADERS
        .iter()
        .find(|name| header(headers, name).is_some())
    {
        return Err(DeclarationError::InvalidHeader(invalid.to_string()).into());
    }

    if let Some(version) = header(headers, BUNDLE_MANIFEST_VERSION) {
        if version.trim() != "2" {
            return Err(DeclarationError::InvalidManifestVersion(version.to_string()).into());
        }
    }

    Ok(())
}

/// Parse a composite manifest into a descriptor.
pub fn parse_composite_descriptor(
    headers: &HashMap<String, String>,
) -> Result<CompositeDescriptor> {
    validate_composite_manifest(headers)?;

    let symbolic_name = header(headers, BUNDLE_SYMBOLIC_NAME).unwrap_or_default();
    let name = parse_clauses(BUNDLE_SYMBOLIC_NAME, symbolic_name)?
        .into_iter()
        .next()
        .and_then(|clause| clause.paths.into_iter().next())
        .ok_or_else(|| DeclarationError::MissingHeader(BUNDLE_SYMBOLIC_NAME.to_string()))?;
    let version = match header(headers, BUNDLE_VERSION) {
        Some(version) => version.parse()?,
        None => Version::empty(),
    };

    let policies = parse_sharing_policy(headers)?;
    debug!(%name, %version, "Parsed composite manifest");
    Ok(CompositeDescriptor::new(name, version).with_policies(policies))
}

/// Parse the six sharing policy headers. Missing headers leave their vector empty.
pub fn parse_sharing_policy(headers: &HashMap<String, String>) -> Result<PolicySet> {
    let mut policies = PolicySet::new();

    if let Some(value) = header(headers, COMPOSITE_IMPORT_PACKAGE) {
        policies.import_package = parse_package_policies(COMPOSITE_IMPORT_PACKAGE, value, true)?;
    }
    if let Some(value) = header(headers, COMPOSITE_EXPORT_PACKAGE) {
        policies.export_package = parse_package_policies(COMPOSITE_EXPORT_PACKAGE, value, false)?;
    }
    if let Some(value) = header(headers, COMPOSITE_REQUIRE_BUNDLE) {
        policies.require_bundle = parse_bundle_policies(COMPOSITE_REQUIRE_BUNDLE, value, true)?;
    }
    if let Some(value) = header(headers, COMPOSITE_PROVIDE_BUNDLE) {
        policies.provide_bundle = parse_bundle_policies(COMPOSITE_PROVIDE_BUNDLE, value, false)?;
    }
    if let Some(value) = header(headers, COMPOSITE_IMPORT_SERVICE) {
        policies.import_service = parse_service_policies(COMPOSITE_IMPORT_SERVICE, value)?;
    }
    if let Some(value) = header(headers, COMPOSITE_EXPORT_SERVICE) {
        policies.export_service = parse_service_policies(COMPOSITE_EXPORT_SERVICE, value)?;
    }

    Ok(policies)
}

fn parse_package_policies(
    header: &str,
    value: &str,
    allow_parent: bool,
) -> Result<Vec<ClassSpacePolicy>> {
    let mut policies = Vec::new();
    for mut clause in parse_clauses(header, value)? {
        let peer = clause.take_peer(header, allow_parent)?;
        let version_range = match clause.take("version") {
            Some(range) => range.parse::<VersionRange>()?,
            None => VersionRange::any(),
        };
        let bundle_symbolic_name = clause.take("bundle-symbolic-name");
        let bundle_version_range = match clause.take("bundle-version") {
            Some(range) => Some(range.parse::<VersionRange>()?),
            None => None,
        };

        for path in &clause.paths {
            let mut spec =
                ImportPackageSpec::new(path.clone()).with_version_range(version_range.clone());
            spec.bundle_symbolic_name = bundle_symbolic_name.clone();
            spec.bundle_version_range = bundle_version_range.clone();
            for (key, value) in &clause.attributes {
                spec = spec.with_attribute(key.clone(), value.clone());
            }
            policies.push(
                ClassSpacePolicy::new(ClassSpaceSpec::ImportPackage(spec)).with_peer(peer.clone()),
            );
        }
    }
    Ok(policies)
}

fn parse_bundle_policies(
    header: &str,
    value: &str,
    allow_parent: bool,
) -> Result<Vec<ClassSpacePolicy>> {
    let mut policies = Vec::new();
    for mut clause in parse_clauses(header, value)? {
        let peer = clause.take_peer(header, allow_parent)?;
        let version_range = match clause.take("bundle-version") {
            Some(range) => range.parse::<VersionRange>()?,
            None => VersionRange::any(),
        };
        for path in &clause.paths {
            let spec = BundleSpec::new(path.clone()).with_version_range(version_range.clone());
            policies.push(
                ClassSpacePolicy::new(ClassSpaceSpec::Bundle(spec)).with_peer(peer.clone()),
            );
        }
    }
    Ok(policies)
}

fn parse_service_policies(header: &str, value: &str) -> Result<Vec<ServicePolicy>> {
    let mut policies = Vec::new();
    for mut clause in parse_clauses(header, value)? {
        let peer = clause.take_peer(header, false)?;
        for path in &clause.paths {
            let filter = Filter::parse(path)?;
            policies.push(ServicePolicy::new(filter).with_peer(peer.clone()));
        }
    }
    Ok(policies)
}

/// One parsed clause of a header.
#[derive(Debug, Default)]
struct Clause {
    paths: Vec<String>,
    attributes: Vec<(String, String)>,
    directives: Vec<(String, String)>,
}

impl Clause {
    /// Remove a parameter, looking at directives first and then attributes.
    fn take(&mut self, key: &str) -> Option<String> {
        for params in [&mut self.directives, &mut self.attributes] {
            if let Some(index) = params.iter().position(|(k, _)| k.eq_ignore_ascii_case(key)) {
                return Some(params.remove(index).1);
            }
        }
        None
    }

    fn take_peer(&mut self, header: &str, allow_parent: bool) -> Result<PeerConstraint> {
        let mut peer = PeerConstraint::none();
        if let Some(name) = self.take(PEER_SYMBOLIC_NAME) {
            let name = PeerName::parse(&name);
            if name == PeerName::Parent && !allow_parent {
                return Err(DeclarationError::IllegalParentPeer {
                    header: header.to_string(),
                }
                .into());
            }
            peer.name = Some(name);
        }
        if let Some(range) = self.take(PEER_VERSION_RANGE) {
            peer.version_range = Some(range.parse()?);
        }
        Ok(peer)
    }
}

fn syntax_error(header: &str, reason: impl Into<String>) -> DeclarationError {
    DeclarationError::Syntax {
        header: header.to_string(),
        reason: reason.into(),
    }
}

/// Split `value` on `separator`, ignoring separators inside quotes or brackets.
fn split_top_level(header: &str, value: &str, separator: char) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quoted = false;

    for c in value.chars() {
        match c {
            '"' => quoted = !quoted,
            '[' | '(' if !quoted => depth += 1,
            ']' | ')' if !quoted => depth -= 1,
            _ => {}
        }
        if c == separator && !quoted && depth == 0 {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    if quoted {
        return Err(syntax_error(header, "unterminated quote").into());
    }
    if depth != 0 {
        return Err(syntax_error(header, "unbalanced brackets").into());
    }
    parts.push(current);
    Ok(parts)
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

fn is_parameter_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn parse_clauses(header: &str, value: &str) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    for raw in split_top_level(header, value, ',')? {
        if raw.trim().is_empty() {
            continue;
        }

        let mut clause = Clause::default();
        for segment in split_top_level(header, &raw, ';')? {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(syntax_error(header, "empty clause segment").into());
            }

            let starts_as_path = segment.starts_with('(') || segment.starts_with('"');
            let parameter = if starts_as_path {
                None
            } else if let Some((key, value)) = segment.split_once(":=") {
                Some((key.trim(), value, true))
            } else {
                segment.split_once('=').map(|(key, value)| (key.trim(), value, false))
            };

            match parameter {
                Some((key, value, directive)) if is_parameter_key(key) => {
                    let entry = (key.to_string(), unquote(value));
                    if directive {
                        clause.directives.push(entry);
                    } else {
                        clause.attributes.push(entry);
                    }
                }
                _ => {
                    if !clause.attributes.is_empty() || !clause.directives.is_empty() {
                        return Err(
                            syntax_error(header, format!("path '{}' after parameters", segment))
                                .into(),
                        );
                    }
                    clause.paths.push(unquote(segment));
                }
            }
        }

        if clause.paths.is_empty() {
            return Err(syntax_error(header, "clause without a path").into());
        }
        clauses.push(clause);
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use composite_core::error::Error;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_split_respects_quotes_and_ranges() {
        let parts = split_top_level("h", r#"a;version="[1,2)",b;version=[1.0,2.0)"#, ',').unwrap();
        assert_eq!(parts.len(), 2);
        assert!(split_top_level("h", r#"a;version="[1,2)"#, ',').is_err());
    }

    #[test]
    fn test_package_clause_with_parameters() {
        let policies = parse_package_policies(
            COMPOSITE_IMPORT_PACKAGE,
            concat!(
                r#"foo;bar;version="[1.0,2.0)";vendor=acme;"#,
                r#"peer-symbolic-name:=A;peer-version-range:="[1.0,2.0)""#,
            ),
            true,
        )
        .unwrap();

        assert_eq!(policies.len(), 2);
        let first = &policies[0];
        assert_eq!(first.peer.name, Some(PeerName::Named("A".to_string())));
        assert!(first.peer.version_range.is_some());
        match &first.spec {
            ClassSpaceSpec::ImportPackage(spec) => {
                assert_eq!(spec.name, "foo");
                assert!(spec.version_range.includes(&Version::new(1, 5, 0)));
                assert_eq!(spec.attributes.get("vendor"), Some(&"acme".to_string()));
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_parent_peer_only_on_imports() {
        let import = parse_package_policies(
            COMPOSITE_IMPORT_PACKAGE,
            "bar;peer-symbolic-name:=<<parent>>",
            true,
        )
        .unwrap();
        assert!(import[0].peer.refers_to_parent());

        let export = parse_package_policies(
            COMPOSITE_EXPORT_PACKAGE,
            "bar;peer-symbolic-name:=<<parent>>",
            false,
        );
        assert!(matches!(
            export,
            Err(Error::Declaration(DeclarationError::IllegalParentPeer { .. }))
        ));

        let service = parse_service_policies(
            COMPOSITE_IMPORT_SERVICE,
            "(objectClass=x.Y);peer-symbolic-name:=<<parent>>",
        );
        assert!(service.is_err());
    }

    #[test]
    fn test_service_filters() {
        let policies = parse_service_policies(
            COMPOSITE_EXPORT_SERVICE,
            r#"(objectClass=a.A), "(&(objectClass=b.B)(x=1))";peer-symbolic-name=S"#,
        )
        .unwrap();
        assert_eq!(policies.len(), 2);
        assert!(!policies[0].peer.is_set());
        assert_eq!(policies[1].peer.name, Some(PeerName::Named("S".to_string())));
        assert_eq!(policies[1].filter.to_string(), "(&(objectClass=b.B)(x=1))");

        assert!(parse_service_policies(COMPOSITE_EXPORT_SERVICE, "(objectClass=").is_err());
    }

    #[test]
    fn test_bundle_clause() {
        let policies = parse_bundle_policies(
            COMPOSITE_REQUIRE_BUNDLE,
            r#"org.example.*;bundle-version="[1.0,2.0)""#,
            true,
        )
        .unwrap();
        match &policies[0].spec {
            ClassSpaceSpec::Bundle(spec) => {
                assert_eq!(spec.name, "org.example.*");
                assert!(!spec.version_range.includes(&Version::new(2, 0, 0)));
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_clause_errors() {
        assert!(parse_clauses("h", "version=1.0").is_err());
        assert!(parse_clauses("h", "foo;version=1.0;bar").is_err());
        assert!(parse_clauses("h", "foo;;bar").is_err());
        assert!(parse_package_policies(COMPOSITE_IMPORT_PACKAGE, "foo;version=x.y", true).is_err());
    }

    #[test]
    fn test_validate_composite_manifest() {
        assert!(validate_composite_manifest(&headers(&[(BUNDLE_SYMBOLIC_NAME, "c")])).is_ok());
        assert!(validate_composite_manifest(&headers(&[(BUNDLE_VERSION, "1.0")])).is_err());
        assert!(validate_composite_manifest(&headers(&[
            (BUNDLE_SYMBOLIC_NAME, "c"),
            ("import-package", "foo"),
        ]))
        .is_err());
        assert!(validate_composite_manifest(&headers(&[
            (BUNDLE_SYMBOLIC_NAME, "c"),
            (BUNDLE_MANIFEST_VERSION, "1"),
        ]))
        .is_err());
    }

    #[test]
    fn test_parse_composite_descriptor() {
        let descriptor = parse_composite_descriptor(&headers(&[
            (BUNDLE_SYMBOLIC_NAME, "org.example.app;singleton:=true"),
            (BUNDLE_VERSION, "1.2.3"),
            (BUNDLE_MANIFEST_VERSION, "2"),
            (COMPOSITE_IMPORT_PACKAGE, "foo"),
            (COMPOSITE_EXPORT_SERVICE, "(objectClass=org.example.Log)"),
        ]))
        .unwrap();

        assert_eq!(descriptor.name, "org.example.app");
        assert_eq!(descriptor.version, Version::new(1, 2, 3));
        assert_eq!(descriptor.policies.import_package.len(), 1);
        assert_eq!(descriptor.policies.export_service.len(), 1);
        assert!(descriptor.policies.export_package.is_empty());
    }
}
