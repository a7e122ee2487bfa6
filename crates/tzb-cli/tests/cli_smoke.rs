use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("tzb-cli-{prefix}-{}-{unique}", std::process::id()));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_tzb<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_tzb");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("tzb command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn read_json(path: &Path) -> Value {
    let bytes = fs::read(path).unwrap_or_else(|e| panic!("{} should be readable: {e}", path.display()));
    serde_json::from_slice(&bytes).expect("file should hold JSON")
}

fn tzids(collection: &Value) -> Vec<String> {
    collection["features"]
        .as_array()
        .expect("features")
        .iter()
        .filter_map(|feature| feature["properties"]["tzid"].as_str().map(str::to_string))
        .collect()
}

fn square(x: f64, y: f64, size: f64) -> Value {
    json!([[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]])
}

/// A small configuration: one zone from a downloaded boundary, one manual
/// zone next to it, sharing an edge.
struct Fixture {
    dir: TempDirGuard,
}

impl Fixture {
    fn new(prefix: &str, second_zone_x: f64) -> Self {
        let dir = TempDirGuard::new(prefix);
        let root = dir.path();
        fs::create_dir_all(root.join("downloads")).expect("downloads dir");
        fs::write(
            root.join("downloads/Test Country.json"),
            json!({ "type": "Polygon", "coordinates": square(0.0, 0.0, 2.0) }).to_string(),
        )
        .expect("download written");
        fs::write(
            root.join("timezones.json"),
            json!({
                "Test/West": [
                    { "op": "init", "source": "overpass", "id": "Test Country" }
                ],
                "Test/East": [
                    { "op": "init", "source": "manual-polygon", "data": square(second_zone_x, 0.0, 2.0) }
                ]
            })
            .to_string(),
        )
        .expect("zones written");
        fs::write(
            root.join("osmBoundarySources.json"),
            json!({ "Test Country": { "ISO3166-1": "TC" } }).to_string(),
        )
        .expect("sources written");
        fs::write(root.join("expectedZoneOverlaps.json"), "{}").expect("overlaps written");
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn path(&self, name: &str) -> String {
        self.root().join(name).display().to_string()
    }

    fn args(&self, command: &str) -> Vec<String> {
        vec![
            command.to_string(),
            "--zones".to_string(),
            self.path("timezones.json"),
            "--sources".to_string(),
            self.path("osmBoundarySources.json"),
            "--expected-overlaps".to_string(),
            self.path("expectedZoneOverlaps.json"),
            "--downloads-dir".to_string(),
            self.path("downloads"),
            "--working-dir".to_string(),
            self.path("working"),
            "--dist-dir".to_string(),
            self.path("dist"),
        ]
    }
}

#[test]
fn build_writes_zone_files_and_combined_outputs() {
    let fixture = Fixture::new("build", 2.0);
    fs::write(
        fixture.root().join("downloads/Test-West-tz.json"),
        json!({ "type": "Polygon", "coordinates": square(0.0, 0.0, 2.0) }).to_string(),
    )
    .expect("timezone download written");
    let mut args = fixture.args("build");
    args.push("--json".to_string());
    let output = run_tzb(&args);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "accepted");
    assert_eq!(payload["build"]["summary"]["zoneCount"], 2);
    assert_eq!(payload["validation"]["result"], "accepted");
    assert_eq!(payload["oceanCount"], 25);
    assert_eq!(payload["osmZonePlaceholders"], 1);

    let working = fixture.root().join("working");
    assert!(working.join("Test__West.json").is_file());
    assert!(working.join("Test__East.json").is_file());
    assert_eq!(tzids(&read_json(&working.join("combined.json"))), vec!["Test/East", "Test/West"]);
    assert_eq!(tzids(&read_json(&working.join("combined-with-oceans.json"))).len(), 27);
    let osm_zones = read_json(&working.join("combined-osm-zones.json"));
    assert_eq!(tzids(&osm_zones), vec!["Test/East", "Test/West"]);
    assert_eq!(osm_zones["features"][0]["geometry"]["coordinates"][0][0], json!([-0.1, -0.1]));
    assert_eq!(osm_zones["features"][1]["geometry"]["coordinates"], square(0.0, 0.0, 2.0));

    let names = read_json(&fixture.root().join("dist/timezone-names.json"));
    let names = names.as_array().expect("names array");
    assert_eq!(names.len(), 27);
    assert_eq!(names[0], "Test/East");
}

#[test]
fn rebuild_reuses_unchanged_zones() {
    let fixture = Fixture::new("rebuild", 2.0);
    let mut args = fixture.args("build");
    args.extend(["--skip-oceans".to_string(), "--json".to_string()]);
    assert_success(&run_tzb(&args));

    let output = run_tzb(&args);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["build"]["summary"]["reusedCount"], 2);
    assert_eq!(payload["build"]["summary"]["builtCount"], 0);
}

#[test]
fn overlapping_zones_fail_validation_with_a_diagnostic() {
    let fixture = Fixture::new("overlap", 1.0);
    let mut args = fixture.args("build");
    args.extend(["--skip-oceans".to_string(), "--json".to_string()]);
    let output = run_tzb(&args);
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "rejected");
    assert_eq!(
        payload["validation"]["failureClasses"],
        json!(["validation.overlap.unexpected"])
    );
    let artifact = fixture
        .root()
        .join("working/diagnostics/Test-East-Test-West-overlap.json");
    assert!(artifact.is_file(), "missing {}", artifact.display());
    assert!(!fixture.root().join("working/combined.json").exists());
}

#[test]
fn validate_rechecks_built_zone_files() {
    let fixture = Fixture::new("validate", 2.0);
    let mut build = fixture.args("build");
    build.push("--skip-validation".to_string());
    assert_success(&run_tzb(&build));

    let mut validate = fixture.args("validate");
    validate.push("--json".to_string());
    let output = run_tzb(&validate);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["checkKind"], "tzb.validation.overlap.v1");
    assert_eq!(payload["summary"]["pairCount"], 1);
}

#[test]
fn missing_download_fails_the_build() {
    let fixture = Fixture::new("missing", 2.0);
    fs::remove_file(fixture.root().join("downloads/Test Country.json")).expect("remove download");
    let mut args = fixture.args("build");
    args.push("--json".to_string());
    let output = run_tzb(&args);
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["build"]["failureClasses"], json!(["build.missing_source_data"]));
    assert_eq!(payload["build"]["summary"]["failedCount"], 1);
}

#[test]
fn unknown_operation_is_rejected_at_load() {
    let fixture = Fixture::new("unknown-op", 2.0);
    fs::write(
        fixture.root().join("timezones.json"),
        json!({ "Test/West": [ { "op": "xor", "source": "overpass", "id": "Test Country" } ] }).to_string(),
    )
    .expect("zones written");
    let output = run_tzb(fixture.args("build"));
    assert_failure(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid recipe for Test/West"), "stderr:\n{stderr}");
}

#[test]
fn lint_reports_unused_sources() {
    let fixture = Fixture::new("lint", 2.0);
    fs::write(
        fixture.root().join("osmBoundarySources.json"),
        json!({
            "Test Country": { "ISO3166-1": "TC" },
            "Never Used": { "name": "Nowhere" }
        })
        .to_string(),
    )
    .expect("sources written");
    let mut args = fixture.args("lint");
    args.push("--json".to_string());
    let output = run_tzb(&args);
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["checkKind"], "tzb.config.lint.v1");
    assert_eq!(payload["failureClasses"], json!(["config.source.unused"]));
    assert_eq!(payload["errors"][0]["subject"], "Never Used");
}

#[test]
fn diff_against_previous_release_writes_additions() {
    let fixture = Fixture::new("diff", 2.0);
    let mut build = fixture.args("build");
    build.push("--skip-oceans".to_string());
    assert_success(&run_tzb(&build));

    let previous = fixture.root().join("previous.json");
    fs::write(
        &previous,
        json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "tzid": "Test/West" },
                  "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 2.0) } },
                { "type": "Feature", "properties": { "tzid": "Test/Retired" },
                  "geometry": { "type": "Polygon", "coordinates": square(10.0, 0.0, 1.0) } }
            ]
        })
        .to_string(),
    )
    .expect("previous release written");

    let mut diff = fixture.args("diff");
    diff.extend([
        "--previous-release".to_string(),
        previous.display().to_string(),
        "--json".to_string(),
    ]);
    let output = run_tzb(&diff);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["additionCount"], 1);
    assert_eq!(payload["removalCount"], 1);

    let working = fixture.root().join("working");
    assert_eq!(tzids(&read_json(&working.join("additions.json"))), vec!["Test/East"]);
    assert_eq!(tzids(&read_json(&working.join("removals.json"))), vec!["Test/Retired"]);
}

#[test]
fn queries_lists_boundary_and_timezone_downloads() {
    let fixture = Fixture::new("queries", 2.0);
    let mut args = fixture.args("queries");
    args.push("--json".to_string());
    let output = run_tzb(&args);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(
        payload["boundaries"]["Test Country"],
        r#"[out:json][timeout:60];(relation["ISO3166-1"="TC"];);out body;>;out meta qt;"#
    );
    let timezones = payload["timezones"].as_object().expect("timezones object");
    assert_eq!(
        timezones.keys().collect::<Vec<_>>(),
        vec!["Test-East-tz", "Test-West-tz"]
    );
    assert_eq!(
        timezones["Test-West-tz"],
        r#"[out:json][timeout:60];(relation["timezone"="Test/West"];);out body;>;out meta qt;"#
    );
}

#[test]
fn settings_file_supplies_paths() {
    let fixture = Fixture::new("settings", 2.0);
    fs::write(
        fixture.root().join("tzb.toml"),
        r#"
zones = "timezones.json"
sources = "osmBoundarySources.json"
expected-overlaps = "expectedZoneOverlaps.json"
dist-dir = "dist"
excluded-zones = ["Test/East"]
"#,
    )
    .expect("settings written");
    let output = run_tzb([
        "names",
        "--settings",
        &fixture.path("tzb.toml"),
    ]);
    assert_success(&output);

    let names = read_json(&fixture.root().join("dist/timezone-names.json"));
    let names = names.as_array().expect("names array");
    assert_eq!(names[0], "Test/West");
    assert_eq!(names.len(), 26);
}
