use super::*;

fn v(text: &str) -> ToolVersion {
    ToolVersion::parse(text).expect("version must parse")
}

#[test]
fn version_parses_four_component_tags() {
    let version = v("2.2.3.2");
    assert_eq!(version.components(), &[2, 2, 3, 2]);
    assert_eq!(version.to_string(), "2.2.3.2");
}

#[test]
fn version_tolerates_leading_v_in_tags() {
    let version = v("v3.1.2");
    assert_eq!(version.as_str(), "3.1.2");
    assert_eq!(version, v("3.1.2"));
}

#[test]
fn version_rejects_non_numeric_text() {
    for raw in ["", "v", "system", "3.x", "1..2", "3.1-rc1"] {
        assert!(ToolVersion::parse(raw).is_err(), "'{raw}' must not parse");
    }
}

#[test]
fn version_ordering_is_numeric_not_lexical() {
    assert!(v("2.12") > v("2.9"));
    assert!(v("2.2.3.1") > v("2.2.3"));
    assert!(v("3.1.11.1") > v("3.1.2"));
    assert!(v("3.0") < v("3.0.0.1"));
}

#[test]
fn version_equality_ignores_trailing_zeros() {
    assert_eq!(v("2.12"), v("2.12.0"));
    assert_eq!(v("3"), v("3.0.0"));
    assert_eq!(v("2.12").cmp(&v("2.12.0")), std::cmp::Ordering::Equal);
}

#[test]
fn version_spec_parses_keywords_versions_and_aliases() {
    assert_eq!(VersionSpec::parse("latest"), VersionSpec::Latest);
    assert_eq!(VersionSpec::parse("Nightly"), VersionSpec::Nightly);
    assert_eq!(
        VersionSpec::parse("3.1.2"),
        VersionSpec::Specific(v("3.1.2"))
    );
    assert_eq!(
        VersionSpec::parse("system"),
        VersionSpec::External("system".to_string())
    );
}

#[test]
fn install_slot_round_trips_directory_names() {
    assert_eq!(InstallSlot::from_dir_name("nightly"), Some(InstallSlot::Nightly));
    assert_eq!(
        InstallSlot::from_dir_name("2.11.4").map(|slot| slot.dir_name().to_string()),
        Some("2.11.4".to_string())
    );
    assert_eq!(InstallSlot::from_dir_name(".staging"), None);
}

#[test]
fn install_slots_sort_nightly_first_then_descending() {
    let mut slots = vec![
        InstallSlot::Release(v("2.9")),
        InstallSlot::Release(v("3.1.2")),
        InstallSlot::Nightly,
        InstallSlot::Release(v("2.12")),
    ];
    sort_install_slots(&mut slots);
    let names: Vec<&str> = slots.iter().map(InstallSlot::dir_name).collect();
    assert_eq!(names, vec!["nightly", "3.1.2", "2.12", "2.9"]);
}

#[test]
fn os_from_kernel_maps_known_kernels() {
    assert_eq!(os_from_kernel("Linux").expect("linux"), Os::Linux);
    assert_eq!(os_from_kernel("Darwin").expect("darwin"), Os::MacOs);
    assert_eq!(os_from_kernel("macos").expect("macos"), Os::MacOs);
    assert_eq!(os_from_kernel("Windows").expect("windows"), Os::Windows);
}

#[test]
fn os_from_kernel_rejects_unknown_kernel() {
    let err = os_from_kernel("SunOS").expect_err("must reject");
    assert!(matches!(err, Error::UnsupportedPlatform { .. }));
}

#[test]
fn arch_labels_differ_per_os() {
    assert_eq!(arch_for_os(Os::Linux, "x86_64").expect("linux"), Arch::Amd64);
    assert_eq!(arch_for_os(Os::Windows, "x86_64").expect("win"), Arch::X86_64);
    assert_eq!(arch_for_os(Os::MacOs, "x86_64").expect("mac"), Arch::X86_64);
    assert_eq!(arch_for_os(Os::Linux, "aarch64").expect("linux"), Arch::Arm64);
    assert_eq!(arch_for_os(Os::MacOs, "arm64").expect("mac"), Arch::Arm64);
    assert_eq!(arch_for_os(Os::Windows, "aarch64").expect("win"), Arch::Arm64);
    assert_eq!(arch_for_os(Os::Windows, "ARM64").expect("win"), Arch::Arm64);
}

#[test]
fn arch_not_enumerated_for_os_is_rejected() {
    for (os, machine) in [
        (Os::Windows, "i686"),
        (Os::Linux, "i686"),
        (Os::MacOs, "powerpc"),
    ] {
        let err = arch_for_os(os, machine).expect_err("must reject");
        assert!(
            matches!(err, Error::UnsupportedArchitecture { .. }),
            "{os}/{machine} must be unsupported"
        );
    }
}

#[test]
fn bundle_archive_is_tarball_only_on_linux() {
    assert_eq!(Os::Linux.bundle_archive(), ArchiveType::TarGz);
    assert_eq!(Os::MacOs.bundle_archive(), ArchiveType::Zip);
    assert_eq!(Os::Windows.bundle_archive(), ArchiveType::Zip);
}

#[test]
fn release_snapshot_shape_deserializes() {
    let raw = r#"[{"tag":"3.1.2","assets":[{"name":"pandoc-3.1.2-linux-amd64.tar.gz","download_url":"https://example.test/a"}]}]"#;
    let releases: Vec<Release> = serde_json::from_str(raw).expect("must parse");
    assert_eq!(releases[0].version(), Some(v("3.1.2")));
    assert_eq!(releases[0].assets.len(), 1);
}
