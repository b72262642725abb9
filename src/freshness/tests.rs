//! Unit tests for image freshness classification.

use std::io;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockall::mock;
use rstest::{fixture, rstest};

use super::registry::{TagPage, tags_from_page};
use super::*;
use crate::error::{ImageError, RfswiftError};

mock! {
    Tags {}

    impl TagSource for Tags {
        fn list_tags(&self, repository: &str, architecture: &str) -> TagsFuture<'_>;
    }
}

mock! {
    Local {}

    impl LocalImageSource for Local {
        fn image_created(&self, image: &str) -> CreatedFuture<'_>;
    }
}

type RuntimeFixture = io::Result<tokio::runtime::Runtime>;
type TestResult = Result<(), Box<dyn std::error::Error>>;

#[fixture]
fn runtime() -> RuntimeFixture {
    tokio::runtime::Runtime::new()
}

#[fixture]
fn pushed() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0)
        .single()
        .expect("fixed timestamp should be valid")
}

fn remote(name: &str, pushed: DateTime<Utc>) -> RemoteTag {
    RemoteTag {
        name: String::from(name),
        architecture: String::from("amd64"),
        pushed,
    }
}

#[rstest]
#[case(TimeDelta::hours(-3), ImageStatus::Obsolete)]
#[case(TimeDelta::hours(1), ImageStatus::UpToDate)]
#[case(TimeDelta::hours(-1), ImageStatus::UpToDate)]
#[case(TimeDelta::zero(), ImageStatus::UpToDate)]
fn local_age_is_compared_with_tolerance(
    pushed: DateTime<Utc>,
    #[case] offset: TimeDelta,
    #[case] expected: ImageStatus,
) {
    let tag = remote("latest", pushed);
    assert_eq!(classify(pushed + offset, Some(&tag)), expected);
}

#[rstest]
fn unpublished_tag_is_custom(pushed: DateTime<Utc>) {
    assert_eq!(classify(pushed, None), ImageStatus::Custom);
}

#[rstest]
#[case("x86_64", "amd64")]
#[case("aarch64", "arm64")]
#[case("riscv64", "riscv64")]
#[case("arm", "arm")]
fn host_architectures_map_to_registry_names(#[case] host: &str, #[case] expected: &str) {
    assert_eq!(
        registry_architecture(host).expect("architecture should be known"),
        expected
    );
}

#[rstest]
#[case("mips64")]
#[case("powerpc64")]
fn unknown_architecture_fails_fast(#[case] host: &str) {
    assert!(matches!(
        registry_architecture(host),
        Err(RfswiftError::Image(ImageError::UnsupportedArchitecture { .. }))
    ));
}

#[rstest]
fn duplicate_names_keep_latest_push(pushed: DateTime<Utc>) {
    let newest = pushed + TimeDelta::days(2);
    let latest = latest_per_name(vec![
        remote("sdr_full", pushed),
        remote("sdr_full", newest),
        remote("sdr_full", pushed + TimeDelta::days(1)),
        remote("wifi", pushed),
    ]);

    assert_eq!(latest.len(), 2);
    assert_eq!(latest.get("sdr_full").map(|tag| tag.pushed), Some(newest));
}

#[rstest]
fn page_entries_are_filtered_by_architecture() -> TestResult {
    let page: TagPage = serde_json::from_str(
        r#"{
            "count": 2,
            "next": null,
            "results": [
                {
                    "name": "sdr_light",
                    "tag_last_pushed": "2025-03-14T12:00:00.000000Z",
                    "images": [
                        {"architecture": "amd64", "last_pushed": "2025-03-13T08:00:00Z"},
                        {"architecture": "arm64", "last_pushed": "2025-03-14T12:00:00Z"}
                    ]
                },
                {
                    "name": "bluetooth",
                    "tag_last_pushed": "2025-02-01T00:00:00Z",
                    "images": [{"architecture": "amd64", "last_pushed": null}]
                },
                {
                    "name": "arm_only",
                    "images": [{"architecture": "arm64"}]
                }
            ]
        }"#,
    )?;

    let tags = tags_from_page(page, "amd64");

    let names: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(names, vec!["sdr_light", "bluetooth"]);
    assert_eq!(
        tags.last().map(|tag| tag.pushed.to_rfc3339()),
        Some(String::from("2025-02-01T00:00:00+00:00"))
    );
    Ok(())
}

#[rstest]
fn checker_skips_local_inspect_for_custom_tags(
    runtime: RuntimeFixture,
    pushed: DateTime<Utc>,
) -> TestResult {
    let mut tags = MockTags::new();
    tags.expect_list_tags()
        .withf(|repository, architecture| {
            repository == "penthertz/rfswift" && architecture == "amd64"
        })
        .returning(move |_, _| Box::pin(async move { Ok(vec![remote("sdr_full", pushed)]) }));
    let local = MockLocal::new();

    let checker = FreshnessChecker::for_architecture(tags, local, "x86_64")?;
    let status = runtime?.block_on(checker.status("penthertz/rfswift", "my_build"))?;

    assert_eq!(status, ImageStatus::Custom);
    Ok(())
}

#[rstest]
fn checker_reports_obsolete_local_image(
    runtime: RuntimeFixture,
    pushed: DateTime<Utc>,
) -> TestResult {
    let mut tags = MockTags::new();
    tags.expect_list_tags()
        .returning(move |_, _| Box::pin(async move { Ok(vec![remote("sdr_full", pushed)]) }));
    let mut local = MockLocal::new();
    local
        .expect_image_created()
        .withf(|image| image == "penthertz/rfswift:sdr_full")
        .returning(move |_| Box::pin(async move { Ok(pushed - TimeDelta::hours(3)) }));

    let checker = FreshnessChecker::for_architecture(tags, local, "x86_64")?;
    let status = runtime?.block_on(checker.status("penthertz/rfswift", "sdr_full"))?;

    assert_eq!(status, ImageStatus::Obsolete);
    Ok(())
}

#[rstest]
fn registry_failure_becomes_unknown(runtime: RuntimeFixture) -> TestResult {
    let mut tags = MockTags::new();
    tags.expect_list_tags().returning(|repository, _| {
        let repository_owned = String::from(repository);
        Box::pin(async move {
            Err(RfswiftError::from(ImageError::RegistryFailed {
                repository: repository_owned,
                message: String::from("connection reset"),
            }))
        })
    });

    let checker = FreshnessChecker::for_architecture(tags, MockLocal::new(), "aarch64")?;
    let status = runtime?.block_on(checker.status_or_unknown("penthertz/rfswift", "latest"));

    assert!(matches!(status, ImageStatus::Unknown(ref reason) if reason.contains("connection reset")));
    Ok(())
}

#[rstest]
fn checker_rejects_unknown_architecture() {
    let result = FreshnessChecker::for_architecture(MockTags::new(), MockLocal::new(), "sparc64");
    assert!(result.is_err());
}

#[rstest]
#[case("2025-03-14T12:00:00Z", true)]
#[case("2025-03-14T12:00:00.123456789+02:00", true)]
#[case("yesterday", false)]
fn engine_timestamps_parse_as_rfc3339(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(parse_timestamp(raw).is_ok(), valid);
}

#[rstest]
#[case("penthertz/rfswift", "penthertz/rfswift")]
#[case("docker.io/penthertz/rfswift", "penthertz/rfswift")]
#[case("index.docker.io/penthertz/rfswift", "penthertz/rfswift")]
#[case("docker.io/library/ubuntu", "library/ubuntu")]
#[case("ubuntu", "library/ubuntu")]
fn local_names_map_to_hub_repositories(#[case] local: &str, #[case] expected: &str) {
    assert_eq!(hub_repository(local), expected);
}

#[rstest]
fn qualified_podman_names_query_the_hub_by_bare_name(
    runtime: RuntimeFixture,
    pushed: DateTime<Utc>,
) -> TestResult {
    let mut tags = MockTags::new();
    tags.expect_list_tags()
        .withf(|repository, _| repository == "penthertz/rfswift")
        .times(1)
        .returning(move |_, _| Box::pin(async move { Ok(vec![remote("sdr_full", pushed)]) }));
    let mut local = MockLocal::new();
    local
        .expect_image_created()
        .withf(|image| image == "docker.io/penthertz/rfswift:sdr_full")
        .times(1)
        .returning(move |_| Box::pin(async move { Ok(pushed) }));

    let checker = FreshnessChecker::for_architecture(tags, local, "x86_64")?;
    let status = runtime?.block_on(checker.status("docker.io/penthertz/rfswift", "sdr_full"))?;

    assert_eq!(status, ImageStatus::UpToDate);
    Ok(())
}
